//! In-memory contact store
//!
//! Profiles keyed by user id in a concurrent map. Each write operates on the
//! profile's entry while holding its shard lock, so the limit and duplicate
//! checks cannot race with a concurrent add for the same user.

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use async_trait::async_trait;

use super::{is_duplicate, ContactInput, ContactStore, MAX_CONTACTS};
use crate::types::{EmergencyContact, Result, UserProfile, WatchtowerError};

/// DashMap-backed store used by the service and tests
#[derive(Default)]
pub struct MemoryContactStore {
    profiles: DashMap<String, UserProfile>,
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.profiles.get(user_id).map(|p| p.value().clone()))
    }

    async fn create_profile(&self, profile: UserProfile) -> Result<()> {
        debug!(uid = %profile.uid, "Creating profile");
        self.profiles.insert(profile.uid.clone(), profile);
        Ok(())
    }

    async fn update_profile(&self, profile: UserProfile) -> Result<()> {
        let mut entry = self
            .profiles
            .get_mut(&profile.uid)
            .ok_or_else(|| WatchtowerError::ProfileNotFound(profile.uid.clone()))?;

        // Contacts are managed through the contact operations; keep the
        // stored list authoritative.
        let contacts = entry.emergency_contacts.clone();
        *entry = profile;
        entry.emergency_contacts = contacts;
        Ok(())
    }

    async fn add_contact(
        &self,
        user_id: &str,
        contact: ContactInput,
    ) -> Result<EmergencyContact> {
        let mut entry = self
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| WatchtowerError::ProfileNotFound(user_id.to_string()))?;

        if entry.emergency_contacts.iter().any(|c| is_duplicate(c, &contact)) {
            return Err(WatchtowerError::DuplicateContact);
        }

        if entry.emergency_contacts.len() >= MAX_CONTACTS {
            return Err(WatchtowerError::ContactLimitExceeded);
        }

        let stored = EmergencyContact {
            id: Uuid::new_v4().to_string(),
            name: contact.name,
            phone_number: contact.phone_number,
            relation: contact.relation,
        };
        entry.emergency_contacts.push(stored.clone());

        debug!(uid = %user_id, contact_id = %stored.id, "Contact added");
        Ok(stored)
    }

    async fn update_contact(
        &self,
        user_id: &str,
        contact_id: &str,
        contact: ContactInput,
    ) -> Result<EmergencyContact> {
        let mut entry = self
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| WatchtowerError::ProfileNotFound(user_id.to_string()))?;

        // Reject edits that collide with a different contact
        if entry
            .emergency_contacts
            .iter()
            .any(|c| c.id != contact_id && is_duplicate(c, &contact))
        {
            return Err(WatchtowerError::DuplicateContact);
        }

        let existing = entry
            .emergency_contacts
            .iter_mut()
            .find(|c| c.id == contact_id)
            .ok_or_else(|| WatchtowerError::ContactNotFound(contact_id.to_string()))?;

        existing.name = contact.name;
        existing.phone_number = contact.phone_number;
        existing.relation = contact.relation;
        Ok(existing.clone())
    }

    async fn remove_contact(&self, user_id: &str, contact_id: &str) -> Result<()> {
        let mut entry = self
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| WatchtowerError::ProfileNotFound(user_id.to_string()))?;

        let before = entry.emergency_contacts.len();
        entry.emergency_contacts.retain(|c| c.id != contact_id);

        if entry.emergency_contacts.len() == before {
            return Err(WatchtowerError::ContactNotFound(contact_id.to_string()));
        }
        Ok(())
    }
}

//! Profile and emergency-contact storage
//!
//! The store is the single place the contact invariants are enforced: at most
//! two contacts per profile and no duplicates, checked at write time. The
//! persisted representation is a canonical ordered list; readers never have to
//! re-normalize shape.

pub mod memory;

use async_trait::async_trait;

use crate::types::{EmergencyContact, Result, UserProfile};

pub use memory::MemoryContactStore;

/// Maximum number of emergency contacts per profile
pub const MAX_CONTACTS: usize = 2;

/// Fields supplied by the caller when creating or editing a contact
///
/// The contact id is store-assigned; callers never choose one.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactInput {
    pub name: String,
    pub phone_number: String,
    pub relation: String,
}

/// CRUD boundary over profiles and their emergency contacts
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Fetch a profile, or None when the user has not created one
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Create a profile record for a user
    async fn create_profile(&self, profile: UserProfile) -> Result<()>;

    /// Apply field updates to an existing profile (contacts are managed
    /// through the contact operations, not here)
    async fn update_profile(&self, profile: UserProfile) -> Result<()>;

    /// Append a contact; fails with `ContactLimitExceeded` at the cap and
    /// `DuplicateContact` when the entry matches an existing one
    async fn add_contact(&self, user_id: &str, contact: ContactInput)
        -> Result<EmergencyContact>;

    /// Replace the fields of an existing contact, keeping its id
    async fn update_contact(
        &self,
        user_id: &str,
        contact_id: &str,
        contact: ContactInput,
    ) -> Result<EmergencyContact>;

    /// Remove a contact by id
    async fn remove_contact(&self, user_id: &str, contact_id: &str) -> Result<()>;
}

/// A new entry duplicates an existing one when the phone number matches, or
/// the name matches case-insensitively with the same relation.
pub(crate) fn is_duplicate(existing: &EmergencyContact, input: &ContactInput) -> bool {
    existing.phone_number == input.phone_number
        || (existing.name.eq_ignore_ascii_case(&input.name) && existing.relation == input.relation)
}

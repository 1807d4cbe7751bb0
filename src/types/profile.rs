//! User profile, emergency contacts, and the dispatch payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single emergency contact on a profile
///
/// The id is store-assigned and unique; callers never supply it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub relation: String,
}

/// User profile record
///
/// `emergency_contacts` is a canonical ordered list of at most two entries;
/// the cap is enforced at write time by the contact store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub name: String,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub medical_conditions: Option<String>,
    pub emergency_contacts: Vec<EmergencyContact>,
}

impl UserProfile {
    /// Create a minimal profile with no contacts
    pub fn new(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            phone: None,
            age: None,
            blood_group: None,
            allergies: None,
            medical_conditions: None,
            emergency_contacts: Vec::new(),
        }
    }
}

/// A location snapshot used to build the dispatch payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: Utc::now(),
        }
    }
}

/// Payload sent to the remote alerting service
///
/// Constructed fresh per dispatch from live snapshots; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub user_id: String,
    pub message: String,
    pub location: LocationFix,
}

impl AlertPayload {
    /// Build the payload with the standard alert message for a profile
    pub fn for_profile(profile: &UserProfile, location: LocationFix) -> Self {
        Self {
            user_id: profile.uid.clone(),
            message: format!(
                "Emergency Alert: {} needs immediate assistance!",
                profile.name
            ),
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_has_no_contacts() {
        let profile = UserProfile::new("uid-1", "Asha");
        assert!(profile.emergency_contacts.is_empty());
        assert_eq!(profile.phone, None);
    }

    #[test]
    fn test_payload_message_includes_name() {
        let profile = UserProfile::new("uid-1", "Asha");
        let payload = AlertPayload::for_profile(&profile, LocationFix::new(12.97, 77.59));
        assert_eq!(payload.user_id, "uid-1");
        assert!(payload.message.contains("Asha"));
        assert!(payload.message.contains("immediate assistance"));
    }
}

//! Shared data model and error types for Watchtower

pub mod error;
pub mod profile;
pub mod signal;
pub mod state;

pub use error::{NetworkErrorKind, Result, WatchtowerError};
pub use profile::{AlertPayload, EmergencyContact, LocationFix, UserProfile};
pub use signal::{AnomalyCode, DetectionSignal};
pub use state::AlertState;

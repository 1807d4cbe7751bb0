//! Watchtower - Emergency alert coordination core
//!
//! "Watchman, what of the night?" - Isaiah 21:11
//!
//! Watchtower owns the SOS lifecycle for a personal-safety deployment: it
//! evaluates detection signals (manual SOS, voice-threat scores, location
//! deviation verdicts), runs the cancellable pre-dispatch countdown, and
//! dispatches the final alert to the remote alerting service.
//!
//! ## Services
//!
//! - **Coordinator**: serialized SOS state machine with countdown and dispatch
//! - **Transport**: authenticated HTTP client for the remote inference endpoints
//! - **Contacts**: profile and emergency-contact store (two-contact cap)
//! - **Location**: last-known-fix snapshot boundary for dispatch payloads
//! - **Monitor**: periodic location-deviation probe feeding the coordinator

pub mod config;
pub mod contacts;
pub mod coordinator;
pub mod location;
pub mod monitor;
pub mod transport;
pub mod types;

pub use config::Args;
pub use coordinator::{AlertCoordinator, CoordinatorConfig, CoordinatorEvent};
pub use types::{Result, WatchtowerError};

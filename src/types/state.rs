//! SOS lifecycle state
//!
//! Exactly one [`AlertState`] is live per coordinator. It is mutated only
//! through the coordinator's transition functions and the machine cycles for
//! the lifetime of the session (no terminal state).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signal::DetectionSignal;

/// Current position in the SOS lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlertState {
    /// No alert in flight; new signals are evaluated
    Idle,
    /// Grace period before auto-dispatch; cancellable
    CountingDown {
        seconds_remaining: u32,
        reason: DetectionSignal,
    },
    /// The alert call is in flight; not cancellable
    Dispatching,
    /// The alert was delivered
    Active { sent_at: DateTime<Utc> },
    /// The user cancelled a countdown before it expired
    Cancelled,
}

impl AlertState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_counting_down(&self) -> bool {
        matches!(self, Self::CountingDown { .. })
    }

    /// Short label for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CountingDown { .. } => "counting_down",
            Self::Dispatching => "dispatching",
            Self::Active { .. } => "active",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Default for AlertState {
    fn default() -> Self {
        Self::Idle
    }
}

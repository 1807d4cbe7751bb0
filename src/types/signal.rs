//! Detection signals consumed by the alert coordinator
//!
//! Signals are produced by collaborators (the SOS button, the voice analyzer,
//! the deviation monitor) and consumed exactly once by the coordinator.

use serde::{Deserialize, Serialize};

/// Verdict of the remote location-deviation model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyCode {
    /// -1: strong anomaly, auto-escalates into a countdown
    Strong,
    /// 0: normal movement pattern
    Normal,
    /// 1: informational anomaly, surfaced but never escalated
    Informational,
}

impl AnomalyCode {
    /// Map the raw wire integer (-1 | 0 | 1) to a verdict
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Self::Strong),
            0 => Some(Self::Normal),
            1 => Some(Self::Informational),
            _ => None,
        }
    }

    pub fn as_code(&self) -> i8 {
        match self {
            Self::Strong => -1,
            Self::Normal => 0,
            Self::Informational => 1,
        }
    }
}

/// A single detection event from one of the signal sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DetectionSignal {
    /// The user pressed the SOS button
    ManualSos,
    /// The voice analyzer scored a recording
    VoiceThreat {
        /// Threat score in 0..=10
        score: f32,
        /// Transcription, when the analyzer produced one
        transcript: Option<String>,
    },
    /// The deviation model scored the current location
    LocationDeviation { anomaly: AnomalyCode },
}

impl DetectionSignal {
    /// Short label for logging and event reporting
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ManualSos => "manual_sos",
            Self::VoiceThreat { .. } => "voice_threat",
            Self::LocationDeviation { .. } => "location_deviation",
        }
    }
}

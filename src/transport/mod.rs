//! Remote inference and alerting endpoints
//!
//! Watchtower owns no wire protocol of its own; it calls four HTTP endpoints
//! (alert, deviation, voice, chatbot) and interprets their verdicts. The
//! [`AlertTransport`] trait is the seam the coordinator and monitor depend on;
//! [`HttpAlertTransport`] is the reqwest implementation used in production.

pub mod http;
pub mod testing;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{AlertPayload, Result};

pub use http::{HttpAlertTransport, StaticToken, TokenSource, TransportConfig};

/// Response from the remote alerting service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertReceipt {
    pub success: bool,
    pub emergency_services_notified: bool,
    #[serde(default)]
    pub contacts_notified: Vec<String>,
}

/// Verdict from the location-deviation model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviationVerdict {
    /// -1 strong anomaly, 0 normal, 1 informational
    pub anomaly: i8,
}

/// Result of analyzing a voice recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceAnalysis {
    pub is_threat: bool,
    pub threat_score: f32,
    #[serde(default)]
    pub transcribed_text: Option<String>,
}

impl VoiceAnalysis {
    /// Convert the analysis into the signal the coordinator evaluates
    pub fn into_signal(self) -> crate::types::DetectionSignal {
        crate::types::DetectionSignal::VoiceThreat {
            score: self.threat_score,
            transcript: self.transcribed_text,
        }
    }
}

/// Reply from the chatbot endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// Boundary contract for the remote services
///
/// Implementations classify failures into the structured network error kinds
/// before they reach the coordinator; no caller inspects message strings.
#[async_trait]
pub trait AlertTransport: Send + Sync {
    /// Deliver an emergency alert. Called at most once per Active transition.
    async fn send_alert(&self, payload: &AlertPayload) -> Result<AlertReceipt>;

    /// Score the current location against the deviation model
    async fn check_location_deviation(&self, latitude: f64, longitude: f64)
        -> Result<DeviationVerdict>;

    /// Submit a voice recording for threat analysis
    async fn analyze_voice(&self, audio: Vec<u8>, file_name: &str) -> Result<VoiceAnalysis>;

    /// Send a message to the chatbot service
    async fn send_chat_message(&self, text: &str) -> Result<ChatReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_receipt_wire_shape() {
        let json = r#"{
            "success": true,
            "emergencyServicesNotified": false,
            "contactsNotified": ["+15550001111", "+15550002222"]
        }"#;
        let receipt: AlertReceipt = serde_json::from_str(json).unwrap();
        assert!(receipt.success);
        assert!(!receipt.emergency_services_notified);
        assert_eq!(receipt.contacts_notified.len(), 2);
    }

    #[test]
    fn test_alert_receipt_missing_contacts_defaults_empty() {
        let json = r#"{"success": true, "emergencyServicesNotified": true}"#;
        let receipt: AlertReceipt = serde_json::from_str(json).unwrap();
        assert!(receipt.contacts_notified.is_empty());
    }

    #[test]
    fn test_voice_analysis_wire_shape() {
        let json = r#"{"is_threat": true, "threat_score": 8.0, "transcribed_text": "help me"}"#;
        let analysis: VoiceAnalysis = serde_json::from_str(json).unwrap();
        assert!(analysis.is_threat);
        assert_eq!(analysis.threat_score, 8.0);
        assert_eq!(analysis.transcribed_text.as_deref(), Some("help me"));
    }

    #[test]
    fn test_voice_analysis_without_transcript() {
        let json = r#"{"is_threat": false, "threat_score": 1.5}"#;
        let analysis: VoiceAnalysis = serde_json::from_str(json).unwrap();
        assert!(analysis.transcribed_text.is_none());
    }

    #[test]
    fn test_deviation_verdict_wire_shape() {
        let verdict: DeviationVerdict = serde_json::from_str(r#"{"anomaly": -1}"#).unwrap();
        assert_eq!(verdict.anomaly, -1);
    }
}

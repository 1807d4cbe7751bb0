//! Scripted transport for unit and integration tests
//!
//! Records every call and answers from a fixed script, so scenario tests can
//! assert exactly how many alert calls were made and with what payload.

use std::sync::atomic::{AtomicI8, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{AlertReceipt, AlertTransport, ChatReply, DeviationVerdict, VoiceAnalysis};
use crate::types::{AlertPayload, NetworkErrorKind, Result, WatchtowerError};

enum AlertScript {
    Succeed,
    /// Deliverable but the service reports success: false
    Reject,
    Fail(NetworkErrorKind),
}

/// Test double for [`AlertTransport`]
pub struct MockTransport {
    alert_script: AlertScript,
    alert_calls: AtomicUsize,
    last_payload: Mutex<Option<AlertPayload>>,
    deviation_anomaly: AtomicI8,
}

impl MockTransport {
    /// Every alert call succeeds
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self::with_script(AlertScript::Succeed))
    }

    /// Every alert call fails with the given network kind
    pub fn failing(kind: NetworkErrorKind) -> Arc<Self> {
        Arc::new(Self::with_script(AlertScript::Fail(kind)))
    }

    /// Alert calls complete but the service reports failure
    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self::with_script(AlertScript::Reject))
    }

    fn with_script(alert_script: AlertScript) -> Self {
        Self {
            alert_script,
            alert_calls: AtomicUsize::new(0),
            last_payload: Mutex::new(None),
            deviation_anomaly: AtomicI8::new(0),
        }
    }

    /// Script the verdict returned by `check_location_deviation`
    pub fn set_deviation_anomaly(&self, anomaly: i8) {
        self.deviation_anomaly.store(anomaly, Ordering::SeqCst);
    }

    /// Number of `send_alert` calls observed
    pub fn alert_calls(&self) -> usize {
        self.alert_calls.load(Ordering::SeqCst)
    }

    /// Payload of the most recent `send_alert` call
    pub async fn last_payload(&self) -> Option<AlertPayload> {
        self.last_payload.lock().await.clone()
    }
}

#[async_trait]
impl AlertTransport for MockTransport {
    async fn send_alert(&self, payload: &AlertPayload) -> Result<AlertReceipt> {
        self.alert_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payload.lock().await = Some(payload.clone());

        match &self.alert_script {
            AlertScript::Succeed => Ok(AlertReceipt {
                success: true,
                emergency_services_notified: true,
                contacts_notified: vec!["+15550001111".to_string()],
            }),
            AlertScript::Reject => Ok(AlertReceipt {
                success: false,
                emergency_services_notified: false,
                contacts_notified: Vec::new(),
            }),
            AlertScript::Fail(kind) => Err(WatchtowerError::Network {
                kind: *kind,
                message: "scripted failure".to_string(),
            }),
        }
    }

    async fn check_location_deviation(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<DeviationVerdict> {
        Ok(DeviationVerdict {
            anomaly: self.deviation_anomaly.load(Ordering::SeqCst),
        })
    }

    async fn analyze_voice(&self, _audio: Vec<u8>, _file_name: &str) -> Result<VoiceAnalysis> {
        Ok(VoiceAnalysis {
            is_threat: false,
            threat_score: 0.0,
            transcribed_text: None,
        })
    }

    async fn send_chat_message(&self, text: &str) -> Result<ChatReply> {
        Ok(ChatReply {
            response: format!("echo: {}", text),
        })
    }
}

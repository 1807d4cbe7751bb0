//! HTTP implementation of the alert transport
//!
//! One reqwest client, bearer token attached per call, non-2xx statuses
//! classified into [`NetworkErrorKind`] at this boundary. The voice endpoint
//! gets a longer timeout than the rest because recordings are large.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use super::{AlertReceipt, AlertTransport, ChatReply, DeviationVerdict, VoiceAnalysis};
use crate::types::error::classify_status;
use crate::types::{AlertPayload, Result, WatchtowerError};

/// Configuration for the HTTP transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub alert_url: String,
    pub deviation_url: String,
    pub voice_url: String,
    pub chatbot_url: String,
    /// Timeout for alert/deviation/chatbot calls
    pub request_timeout: Duration,
    /// Timeout for voice analysis (recordings are large)
    pub voice_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            alert_url: "http://localhost:8090/send-alert".to_string(),
            deviation_url: "http://localhost:8090/check-deviation".to_string(),
            voice_url: "http://localhost:8090/analyze-audio".to_string(),
            chatbot_url: "http://localhost:8090/chatbot".to_string(),
            request_timeout: Duration::from_millis(10_000),
            voice_timeout: Duration::from_millis(60_000),
        }
    }
}

/// Source of the bearer token attached to authenticated calls
///
/// Tokens are fetched per call rather than cached so a rotated credential is
/// picked up without restarting the service.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

/// Fixed token, handed in at startup
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// reqwest-backed transport for the remote endpoints
pub struct HttpAlertTransport {
    config: TransportConfig,
    client: reqwest::Client,
    token: Arc<dyn TokenSource>,
}

impl HttpAlertTransport {
    pub fn new(config: TransportConfig, token: Arc<dyn TokenSource>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| WatchtowerError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            token,
        })
    }

    /// Check the status and decode the body, classifying failures
    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Remote call failed");
            return Err(WatchtowerError::Network {
                kind: classify_status(status),
                message: format!("status {}: {}", status.as_u16(), body),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| WatchtowerError::BadResponse(format!("decode: {}", e)))
    }
}

#[async_trait]
impl AlertTransport for HttpAlertTransport {
    async fn send_alert(&self, payload: &AlertPayload) -> Result<AlertReceipt> {
        let token = self.token.bearer_token().await?;
        debug!(user_id = %payload.user_id, "Sending emergency alert");

        let response = self
            .client
            .post(&self.config.alert_url)
            .bearer_auth(token)
            .json(payload)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn check_location_deviation(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<DeviationVerdict> {
        let response = self
            .client
            .post(&self.config.deviation_url)
            .json(&json!({ "latitude": latitude, "longitude": longitude }))
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn analyze_voice(&self, audio: Vec<u8>, file_name: &str) -> Result<VoiceAnalysis> {
        let part = reqwest::multipart::Part::bytes(audio).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("audio", part);

        debug!(file_name, "Submitting recording for analysis");

        let response = self
            .client
            .post(&self.config.voice_url)
            .timeout(self.config.voice_timeout)
            .multipart(form)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn send_chat_message(&self, text: &str) -> Result<ChatReply> {
        let response = self
            .client
            .post(&self.config.chatbot_url)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        Self::read_json(response).await
    }
}

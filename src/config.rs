//! Configuration for Watchtower
//!
//! CLI arguments and environment variable handling using clap. The four
//! endpoint URLs are required; startup fails fast when one is missing,
//! matching the required-environment check of the client apps.

use std::time::Duration;

use clap::Parser;

use crate::coordinator::CoordinatorConfig;
use crate::transport::TransportConfig;

/// Watchtower - Emergency alert coordination core
///
/// "Watchman, what of the night?" - Isaiah 21:11
#[derive(Parser, Debug, Clone)]
#[command(name = "watchtower")]
#[command(about = "Emergency alert coordination service")]
pub struct Args {
    /// User id this session coordinates alerts for
    #[arg(long, env = "USER_ID")]
    pub user_id: String,

    /// Remote alerting service endpoint
    #[arg(long, env = "ALERT_URL")]
    pub alert_url: String,

    /// Location-deviation model endpoint
    #[arg(long, env = "DEVIATION_URL")]
    pub deviation_url: String,

    /// Voice threat-analysis endpoint
    #[arg(long, env = "VOICE_URL")]
    pub voice_url: String,

    /// Chatbot endpoint
    #[arg(long, env = "CHATBOT_URL")]
    pub chatbot_url: String,

    /// Bearer token attached to authenticated calls
    #[arg(long, env = "API_TOKEN")]
    pub api_token: String,

    /// Voice threat score at or above which dispatch is immediate
    #[arg(long, env = "VOICE_THRESHOLD", default_value = "6.0")]
    pub voice_threshold: f32,

    /// Seconds of cancellable grace before a deviation auto-dispatches
    #[arg(long, env = "COUNTDOWN_SECONDS", default_value = "5")]
    pub countdown_seconds: u32,

    /// Seconds between location-deviation probes
    #[arg(long, env = "POLL_INTERVAL_SECONDS", default_value = "60")]
    pub poll_interval_seconds: u64,

    /// Request timeout in milliseconds for alert/deviation/chatbot calls
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Request timeout in milliseconds for voice analysis (large payloads)
    #[arg(long, env = "VOICE_TIMEOUT_MS", default_value = "60000")]
    pub voice_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Transport configuration derived from the endpoint and timeout args
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            alert_url: self.alert_url.clone(),
            deviation_url: self.deviation_url.clone(),
            voice_url: self.voice_url.clone(),
            chatbot_url: self.chatbot_url.clone(),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            voice_timeout: Duration::from_millis(self.voice_timeout_ms),
        }
    }

    /// Coordinator policy derived from the threshold and countdown args
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            voice_threshold: self.voice_threshold,
            countdown_seconds: self.countdown_seconds,
            auto_tick: true,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=10.0).contains(&self.voice_threshold) {
            return Err("VOICE_THRESHOLD must be within 0..=10".to_string());
        }

        if self.countdown_seconds == 0 {
            return Err("COUNTDOWN_SECONDS must be at least 1".to_string());
        }

        for (name, url) in [
            ("ALERT_URL", &self.alert_url),
            ("DEVIATION_URL", &self.deviation_url),
            ("VOICE_URL", &self.voice_url),
            ("CHATBOT_URL", &self.chatbot_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("{} must be an http(s) URL", name));
            }
        }

        Ok(())
    }
}

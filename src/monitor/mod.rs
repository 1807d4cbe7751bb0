//! Deviation monitor
//!
//! Background loop that periodically snapshots the location source, asks the
//! remote deviation model for a verdict, and feeds the result to the
//! coordinator as a detection signal. A missing fix or a failed probe is
//! logged and skipped; the loop itself never dies over it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::coordinator::AlertCoordinator;
use crate::location::LocationSource;
use crate::transport::AlertTransport;
use crate::types::{AnomalyCode, DetectionSignal, Result, WatchtowerError};

/// Default interval between deviation probes
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Periodic location-deviation probe
pub struct DeviationMonitor {
    transport: Arc<dyn AlertTransport>,
    location: Arc<dyn LocationSource>,
    coordinator: Arc<AlertCoordinator>,
    poll_interval: Duration,
    /// Whether the loop should keep running
    running: Arc<RwLock<bool>>,
}

impl DeviationMonitor {
    pub fn new(
        transport: Arc<dyn AlertTransport>,
        location: Arc<dyn LocationSource>,
        coordinator: Arc<AlertCoordinator>,
    ) -> Self {
        Self {
            transport,
            location,
            coordinator,
            poll_interval: DEFAULT_POLL_INTERVAL,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Set the probe interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run one probe: snapshot the location, fetch a verdict, submit it
    pub async fn probe_once(&self) -> Result<AnomalyCode> {
        let fix = self.location.current_fix().await?;

        let verdict = self
            .transport
            .check_location_deviation(fix.latitude, fix.longitude)
            .await?;

        let anomaly = AnomalyCode::from_code(verdict.anomaly).ok_or_else(|| {
            WatchtowerError::BadResponse(format!(
                "deviation model returned anomaly {}",
                verdict.anomaly
            ))
        })?;

        debug!(anomaly = anomaly.as_code(), "Deviation verdict");
        self.coordinator
            .submit_signal(DetectionSignal::LocationDeviation { anomaly })
            .await;

        Ok(anomaly)
    }

    /// Start the probe loop
    pub async fn start(self: Arc<Self>) {
        {
            let mut running = self.running.write().await;
            if *running {
                warn!("Deviation monitor already running");
                return;
            }
            *running = true;
        }

        info!(interval = ?self.poll_interval, "Starting deviation monitor");

        let monitor = Arc::clone(&self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(monitor.poll_interval);
            interval.tick().await;

            loop {
                interval.tick().await;

                if !*monitor.running.read().await {
                    info!("Deviation monitor stopped");
                    break;
                }

                match monitor.probe_once().await {
                    Ok(_) => {}
                    Err(WatchtowerError::NoLocationAvailable) => {
                        debug!("No location fix yet, skipping probe");
                    }
                    Err(e) => {
                        warn!("Deviation probe failed: {}", e);
                    }
                }
            }
        });
    }

    /// Stop the probe loop at its next wakeup
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        info!("Stopping deviation monitor");
    }

    /// Check if the loop is running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}

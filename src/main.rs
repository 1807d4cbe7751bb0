//! Watchtower - Emergency alert coordination core
//!
//! "Watchman, what of the night?" - Isaiah 21:11

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use watchtower::{
    config::Args,
    contacts::MemoryContactStore,
    coordinator::{AlertCoordinator, CoordinatorEvent},
    location::LastKnownLocation,
    monitor::DeviationMonitor,
    transport::{HttpAlertTransport, StaticToken},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("watchtower={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Watchtower - Alert Coordinator");
    info!("  \"Watchman, what of the night?\"");
    info!("======================================");
    info!("User: {}", args.user_id);
    info!("Alert endpoint: {}", args.alert_url);
    info!("Deviation endpoint: {}", args.deviation_url);
    info!("Voice endpoint: {}", args.voice_url);
    info!("Chatbot endpoint: {}", args.chatbot_url);
    info!("Voice threshold: {}", args.voice_threshold);
    info!("Countdown: {}s", args.countdown_seconds);
    info!("Deviation poll: {}s", args.poll_interval_seconds);
    info!("======================================");

    // Build the transport, stores, and coordinator
    let token = Arc::new(StaticToken(args.api_token.clone()));
    let transport = Arc::new(HttpAlertTransport::new(args.transport_config(), token)?);
    let contacts = Arc::new(MemoryContactStore::new());
    let location = LastKnownLocation::new();

    let coordinator = AlertCoordinator::new(
        args.coordinator_config(),
        args.user_id.clone(),
        transport.clone(),
        contacts,
        location.clone(),
    );

    // Log coordinator outcomes for operators
    let mut events = coordinator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                CoordinatorEvent::AlertDispatched { receipt } => {
                    info!(
                        contacts = receipt.contacts_notified.len(),
                        "Alert dispatched"
                    );
                }
                CoordinatorEvent::DispatchFailed { message, .. } => {
                    warn!(%message, "Alert dispatch failed; manual retry required");
                }
                other => info!(?other, "Coordinator event"),
            }
        }
    });

    // Start the deviation monitor
    let monitor = Arc::new(
        DeviationMonitor::new(transport, location, coordinator)
            .with_poll_interval(args.poll_interval()),
    );
    Arc::clone(&monitor).start().await;

    info!("Watchtower running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    monitor.stop().await;

    Ok(())
}

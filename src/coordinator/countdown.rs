//! Countdown ticker
//!
//! One task per countdown, spawned when the coordinator enters CountingDown
//! and owned by it. The task drives `tick()` once per second and exits on its
//! own when the state leaves CountingDown; cancel aborts it immediately so no
//! timer keeps firing after the state that spawned it is gone.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::AlertCoordinator;

/// Interval between countdown ticks
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn the 1 Hz ticker for a freshly started countdown
pub(super) fn spawn_ticker(coordinator: Arc<AlertCoordinator>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        // The first interval tick completes immediately; skip it so the
        // countdown runs a full second before the first decrement.
        interval.tick().await;

        loop {
            interval.tick().await;
            let state = coordinator.tick().await;
            if !state.is_counting_down() {
                debug!(state = state.name(), "Ticker exiting");
                break;
            }
        }
    })
}

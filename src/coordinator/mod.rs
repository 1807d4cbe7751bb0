//! Alert coordinator - single authority for the SOS lifecycle
//!
//! The coordinator guarantees at most one outstanding alert at a time and that
//! a cancelled countdown cannot resurrect itself. Every transition goes
//! through one async mutex, so submit/tick/cancel/dispatch are serialized and
//! a cancel racing a final tick is resolved by whichever commits first; the
//! loser observes the new state and no-ops.
//!
//! Constructed once per session and shared as `Arc<AlertCoordinator>`; there
//! is no ambient global instance.

mod countdown;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::contacts::ContactStore;
use crate::location::LocationSource;
use crate::transport::{AlertReceipt, AlertTransport};
use crate::types::{
    AlertPayload, AlertState, AnomalyCode, DetectionSignal, NetworkErrorKind, Result,
    WatchtowerError,
};

/// Capacity of the event channel; slow subscribers lag rather than block
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Policy knobs for the coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Voice threat score at or above which dispatch is immediate
    pub voice_threshold: f32,
    /// Grace period before a strong deviation auto-dispatches
    pub countdown_seconds: u32,
    /// Spawn the 1 Hz ticker when a countdown starts. Disabled in tests that
    /// drive `tick()` by hand.
    pub auto_tick: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            voice_threshold: 6.0,
            countdown_seconds: 5,
            auto_tick: true,
        }
    }
}

/// Outcome reported on the coordinator's event channel
///
/// Dispatch-path errors are recovered inside the coordinator and reported
/// here as structured results; nothing escapes as an unobserved task failure.
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    /// A signal arrived while an alert was already in flight; not an error
    SignalIgnored { kind: &'static str },
    CountdownStarted { seconds: u32 },
    CountdownTick { seconds_remaining: u32 },
    CountdownCancelled,
    AlertDispatched { receipt: AlertReceipt },
    DispatchFailed {
        kind: Option<NetworkErrorKind>,
        message: String,
    },
    Reset,
}

struct Inner {
    state: AlertState,
    /// Owned handle of the countdown ticker; aborted on any exit from
    /// CountingDown so no timer outlives the state that spawned it
    ticker: Option<JoinHandle<()>>,
}

/// Serialized SOS state machine
pub struct AlertCoordinator {
    config: CoordinatorConfig,
    user_id: String,
    transport: Arc<dyn AlertTransport>,
    contacts: Arc<dyn ContactStore>,
    location: Arc<dyn LocationSource>,
    inner: Mutex<Inner>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl AlertCoordinator {
    pub fn new(
        config: CoordinatorConfig,
        user_id: String,
        transport: Arc<dyn AlertTransport>,
        contacts: Arc<dyn ContactStore>,
        location: Arc<dyn LocationSource>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            config,
            user_id,
            transport,
            contacts,
            location,
            inner: Mutex::new(Inner {
                state: AlertState::Idle,
                ticker: None,
            }),
            events,
        })
    }

    /// Subscribe to coordinator outcomes (UI layer, tests)
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> AlertState {
        self.inner.lock().await.state.clone()
    }

    fn emit(&self, event: CoordinatorEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Evaluate a detection signal against policy
    ///
    /// ManualSos and VoiceThreat at or above the threshold dispatch
    /// immediately. A strong deviation starts the cancellable countdown.
    /// Normal and informational verdicts, and sub-threshold voice scores, do
    /// not transition. Any signal while not Idle is ignored.
    pub async fn submit_signal(self: &Arc<Self>, signal: DetectionSignal) -> AlertState {
        let mut inner = self.inner.lock().await;

        if !inner.state.is_idle() {
            debug!(
                signal = signal.kind(),
                state = inner.state.name(),
                "Signal ignored, alert already in flight"
            );
            self.emit(CoordinatorEvent::SignalIgnored {
                kind: signal.kind(),
            });
            return inner.state.clone();
        }

        let escalate = match &signal {
            DetectionSignal::ManualSos => true,
            DetectionSignal::VoiceThreat { score, .. } => {
                if *score >= self.config.voice_threshold {
                    true
                } else {
                    debug!(score, "Voice score below threshold, no escalation");
                    return inner.state.clone();
                }
            }
            DetectionSignal::LocationDeviation { anomaly } => match anomaly {
                AnomalyCode::Strong => {
                    let seconds = self.config.countdown_seconds;
                    info!(seconds, "Strong deviation, starting countdown");
                    inner.state = AlertState::CountingDown {
                        seconds_remaining: seconds,
                        reason: signal.clone(),
                    };
                    if self.config.auto_tick {
                        inner.ticker = Some(countdown::spawn_ticker(Arc::clone(self)));
                    }
                    self.emit(CoordinatorEvent::CountdownStarted { seconds });
                    return inner.state.clone();
                }
                AnomalyCode::Informational => {
                    info!("Informational deviation, no escalation");
                    return inner.state.clone();
                }
                AnomalyCode::Normal => return inner.state.clone(),
            },
        };

        if escalate {
            info!(signal = signal.kind(), "High-confidence signal, dispatching");
            inner.state = AlertState::Dispatching;
            tokio::spawn(Arc::clone(self).run_dispatch());
        }
        inner.state.clone()
    }

    /// Advance the countdown by one second
    ///
    /// Called once per second by the ticker (or directly by tests). At zero
    /// the countdown commits to Dispatching and the dispatch pipeline runs.
    /// A no-op outside CountingDown, so a late tick after cancel does nothing.
    pub async fn tick(self: &Arc<Self>) -> AlertState {
        let mut inner = self.inner.lock().await;

        let (seconds_remaining, reason) = match &inner.state {
            AlertState::CountingDown {
                seconds_remaining,
                reason,
            } => (*seconds_remaining, reason.clone()),
            _ => return inner.state.clone(),
        };

        let remaining = seconds_remaining.saturating_sub(1);
        if remaining > 0 {
            debug!(remaining, "Countdown tick");
            inner.state = AlertState::CountingDown {
                seconds_remaining: remaining,
                reason,
            };
            self.emit(CoordinatorEvent::CountdownTick {
                seconds_remaining: remaining,
            });
        } else {
            info!("Countdown expired, dispatching");
            inner.state = AlertState::Dispatching;
            tokio::spawn(Arc::clone(self).run_dispatch());
            // The ticker's loop exits once it observes Dispatching; abort
            // covers the case where a manual tick finished the countdown.
            if let Some(ticker) = inner.ticker.take() {
                ticker.abort();
            }
        }
        inner.state.clone()
    }

    /// Cancel a running countdown
    ///
    /// Valid only from CountingDown; anywhere else this is a no-op, which
    /// guards against late UI taps racing a completed countdown.
    pub async fn cancel(&self) -> AlertState {
        let mut inner = self.inner.lock().await;

        if !inner.state.is_counting_down() {
            debug!(state = inner.state.name(), "Cancel ignored");
            return inner.state.clone();
        }

        info!("Countdown cancelled");
        inner.state = AlertState::Cancelled;
        if let Some(ticker) = inner.ticker.take() {
            ticker.abort();
        }
        self.emit(CoordinatorEvent::CountdownCancelled);
        inner.state.clone()
    }

    /// Dismiss a delivered or cancelled alert, returning to Idle
    pub async fn reset(&self) -> AlertState {
        let mut inner = self.inner.lock().await;

        match inner.state {
            AlertState::Active { .. } | AlertState::Cancelled => {
                info!("Alert dismissed, back to idle");
                inner.state = AlertState::Idle;
                self.emit(CoordinatorEvent::Reset);
            }
            _ => debug!(state = inner.state.name(), "Reset ignored"),
        }
        inner.state.clone()
    }

    /// Snapshot the profile and location into a dispatch payload
    ///
    /// Fails with `NoProfileAvailable` / `NoLocationAvailable` without
    /// touching the alert state, so the caller can retry once the missing
    /// precondition is resolved.
    pub async fn build_payload(&self) -> Result<AlertPayload> {
        let profile = self
            .contacts
            .get_profile(&self.user_id)
            .await?
            .ok_or(WatchtowerError::NoProfileAvailable)?;
        let fix = self.location.current_fix().await?;
        Ok(AlertPayload::for_profile(&profile, fix))
    }

    /// Send the alert payload to the remote service
    ///
    /// Success lands in Active. Failure resets to Idle and reports the
    /// structured cause; there is no automatic retry, because a duplicate
    /// emergency notification is worse than a surfaced failure. The caller
    /// retries by resubmitting a ManualSos signal.
    pub async fn dispatch(&self, payload: AlertPayload) -> AlertState {
        match self.transport.send_alert(&payload).await {
            Ok(receipt) if receipt.success => {
                let mut inner = self.inner.lock().await;
                inner.state = AlertState::Active { sent_at: Utc::now() };
                info!(
                    contacts = receipt.contacts_notified.len(),
                    emergency_services = receipt.emergency_services_notified,
                    "Alert delivered"
                );
                self.emit(CoordinatorEvent::AlertDispatched { receipt });
                inner.state.clone()
            }
            Ok(_) => {
                self.fail_dispatch(None, "alerting service reported failure".to_string())
                    .await
            }
            Err(e) => {
                let kind = e.network_kind();
                self.fail_dispatch(kind, e.to_string()).await
            }
        }
    }

    /// Record a failed dispatch: back to Idle, cause on the event channel
    async fn fail_dispatch(&self, kind: Option<NetworkErrorKind>, message: String) -> AlertState {
        warn!(%message, "Alert dispatch failed");
        let mut inner = self.inner.lock().await;
        inner.state = AlertState::Idle;
        self.emit(CoordinatorEvent::DispatchFailed { kind, message });
        inner.state.clone()
    }

    /// Full dispatch pipeline: build the payload, then send
    ///
    /// Runs as a spawned task after the machine commits to Dispatching. A
    /// payload precondition failure is reported like a dispatch failure and
    /// returns the machine to Idle; the machine is never parked in
    /// Dispatching.
    async fn run_dispatch(self: Arc<Self>) {
        match self.build_payload().await {
            Ok(payload) => {
                self.dispatch(payload).await;
            }
            Err(e) => {
                self.fail_dispatch(e.network_kind(), e.to_string()).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::{ContactStore, MemoryContactStore};
    use crate::location::LastKnownLocation;
    use crate::transport::testing::MockTransport;
    use crate::types::{LocationFix, UserProfile};

    async fn coordinator_with(
        transport: Arc<MockTransport>,
        auto_tick: bool,
    ) -> Arc<AlertCoordinator> {
        let contacts = Arc::new(MemoryContactStore::new());
        contacts
            .create_profile(UserProfile::new("uid-1", "Asha"))
            .await
            .unwrap();

        let location = LastKnownLocation::new();
        location.update(LocationFix::new(12.97, 77.59)).await;

        AlertCoordinator::new(
            CoordinatorConfig {
                auto_tick,
                ..Default::default()
            },
            "uid-1".to_string(),
            transport,
            contacts,
            location,
        )
    }

    /// Wait for a terminal dispatch event, ignoring countdown chatter
    async fn wait_for_dispatch_outcome(
        rx: &mut broadcast::Receiver<CoordinatorEvent>,
    ) -> CoordinatorEvent {
        loop {
            match rx.recv().await.unwrap() {
                ev @ (CoordinatorEvent::AlertDispatched { .. }
                | CoordinatorEvent::DispatchFailed { .. }) => return ev,
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn test_manual_sos_round_trip() {
        let transport = MockTransport::succeeding();
        let coordinator = coordinator_with(Arc::clone(&transport), false).await;
        let mut rx = coordinator.subscribe();

        let state = coordinator.submit_signal(DetectionSignal::ManualSos).await;
        assert_eq!(state, AlertState::Dispatching);

        let ev = wait_for_dispatch_outcome(&mut rx).await;
        assert!(matches!(ev, CoordinatorEvent::AlertDispatched { .. }));
        assert!(matches!(
            coordinator.state().await,
            AlertState::Active { .. }
        ));
        assert_eq!(transport.alert_calls(), 1);

        let state = coordinator.reset().await;
        assert_eq!(state, AlertState::Idle);

        // Ready for a fresh signal
        let state = coordinator.submit_signal(DetectionSignal::ManualSos).await;
        assert_eq!(state, AlertState::Dispatching);
    }

    #[tokio::test]
    async fn test_voice_threat_above_threshold_dispatches_immediately() {
        let transport = MockTransport::succeeding();
        let coordinator = coordinator_with(Arc::clone(&transport), false).await;

        let state = coordinator
            .submit_signal(DetectionSignal::VoiceThreat {
                score: 8.0,
                transcript: Some("help".to_string()),
            })
            .await;
        assert_eq!(state, AlertState::Dispatching);
    }

    #[tokio::test]
    async fn test_voice_threat_below_threshold_is_inert() {
        let transport = MockTransport::succeeding();
        let coordinator = coordinator_with(Arc::clone(&transport), false).await;

        let state = coordinator
            .submit_signal(DetectionSignal::VoiceThreat {
                score: 3.0,
                transcript: None,
            })
            .await;
        assert_eq!(state, AlertState::Idle);
        assert_eq!(transport.alert_calls(), 0);
    }

    #[tokio::test]
    async fn test_strong_deviation_counts_down_five_ticks() {
        let transport = MockTransport::succeeding();
        let coordinator = coordinator_with(Arc::clone(&transport), false).await;
        let mut rx = coordinator.subscribe();

        let state = coordinator
            .submit_signal(DetectionSignal::LocationDeviation {
                anomaly: AnomalyCode::Strong,
            })
            .await;
        assert!(matches!(
            state,
            AlertState::CountingDown {
                seconds_remaining: 5,
                ..
            }
        ));

        // Four ticks are not enough
        for expected in [4u32, 3, 2, 1] {
            let state = coordinator.tick().await;
            assert!(matches!(
                state,
                AlertState::CountingDown { seconds_remaining, .. } if seconds_remaining == expected
            ));
        }
        assert_eq!(transport.alert_calls(), 0);

        // The fifth commits to dispatch
        let state = coordinator.tick().await;
        assert_eq!(state, AlertState::Dispatching);

        let ev = wait_for_dispatch_outcome(&mut rx).await;
        assert!(matches!(ev, CoordinatorEvent::AlertDispatched { .. }));
        assert_eq!(transport.alert_calls(), 1);
    }

    #[tokio::test]
    async fn test_cancel_mid_countdown_never_dispatches() {
        let transport = MockTransport::succeeding();
        let coordinator = coordinator_with(Arc::clone(&transport), false).await;

        coordinator
            .submit_signal(DetectionSignal::LocationDeviation {
                anomaly: AnomalyCode::Strong,
            })
            .await;
        coordinator.tick().await;
        coordinator.tick().await;

        let state = coordinator.cancel().await;
        assert_eq!(state, AlertState::Cancelled);

        // The timer does not resurrect
        for _ in 0..5 {
            let state = coordinator.tick().await;
            assert_eq!(state, AlertState::Cancelled);
        }
        assert_eq!(transport.alert_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_outside_countdown_is_noop() {
        let transport = MockTransport::succeeding();
        let coordinator = coordinator_with(transport, false).await;

        assert_eq!(coordinator.cancel().await, AlertState::Idle);
        assert_eq!(coordinator.state().await, AlertState::Idle);
    }

    #[tokio::test]
    async fn test_signals_ignored_while_counting_down() {
        let transport = MockTransport::succeeding();
        let coordinator = coordinator_with(Arc::clone(&transport), false).await;
        let mut rx = coordinator.subscribe();

        coordinator
            .submit_signal(DetectionSignal::LocationDeviation {
                anomaly: AnomalyCode::Strong,
            })
            .await;

        let before = coordinator.state().await;
        let state = coordinator.submit_signal(DetectionSignal::ManualSos).await;
        assert_eq!(state, before);

        // CountdownStarted, then the ignore report
        assert!(matches!(
            rx.recv().await.unwrap(),
            CoordinatorEvent::CountdownStarted { seconds: 5 }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            CoordinatorEvent::SignalIgnored { kind: "manual_sos" }
        ));
        assert_eq!(transport.alert_calls(), 0);
    }

    #[tokio::test]
    async fn test_informational_and_normal_deviations_are_inert() {
        let transport = MockTransport::succeeding();
        let coordinator = coordinator_with(transport, false).await;

        for anomaly in [AnomalyCode::Informational, AnomalyCode::Normal] {
            let state = coordinator
                .submit_signal(DetectionSignal::LocationDeviation { anomaly })
                .await;
            assert_eq!(state, AlertState::Idle);
        }
    }

    #[tokio::test]
    async fn test_dispatch_failure_resets_to_idle() {
        let transport = MockTransport::failing(NetworkErrorKind::ServerError);
        let coordinator = coordinator_with(Arc::clone(&transport), false).await;
        let mut rx = coordinator.subscribe();

        coordinator.submit_signal(DetectionSignal::ManualSos).await;

        match wait_for_dispatch_outcome(&mut rx).await {
            CoordinatorEvent::DispatchFailed { kind, .. } => {
                assert_eq!(kind, Some(NetworkErrorKind::ServerError));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(coordinator.state().await, AlertState::Idle);
    }

    #[tokio::test]
    async fn test_missing_location_blocks_payload_without_state_change() {
        let transport = MockTransport::succeeding();
        let contacts = Arc::new(MemoryContactStore::new());
        contacts
            .create_profile(UserProfile::new("uid-1", "Asha"))
            .await
            .unwrap();
        let coordinator = AlertCoordinator::new(
            CoordinatorConfig {
                auto_tick: false,
                ..Default::default()
            },
            "uid-1".to_string(),
            transport,
            contacts,
            LastKnownLocation::new(),
        );

        let err = coordinator.build_payload().await.unwrap_err();
        assert!(matches!(err, WatchtowerError::NoLocationAvailable));
        assert_eq!(coordinator.state().await, AlertState::Idle);
    }

    #[tokio::test]
    async fn test_missing_profile_blocks_payload() {
        let transport = MockTransport::succeeding();
        let location = LastKnownLocation::new();
        location.update(LocationFix::new(1.0, 2.0)).await;
        let coordinator = AlertCoordinator::new(
            CoordinatorConfig::default(),
            "ghost".to_string(),
            transport,
            Arc::new(MemoryContactStore::new()),
            location,
        );

        let err = coordinator.build_payload().await.unwrap_err();
        assert!(matches!(err, WatchtowerError::NoProfileAvailable));
    }

    #[tokio::test]
    async fn test_service_reported_failure_resets_to_idle() {
        let transport = MockTransport::rejecting();
        let coordinator = coordinator_with(Arc::clone(&transport), false).await;
        let mut rx = coordinator.subscribe();

        coordinator.submit_signal(DetectionSignal::ManualSos).await;

        match wait_for_dispatch_outcome(&mut rx).await {
            CoordinatorEvent::DispatchFailed { kind, .. } => assert_eq!(kind, None),
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(coordinator.state().await, AlertState::Idle);
    }
}

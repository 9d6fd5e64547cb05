//! Automatic reward claiming under one process-wide cooldown.
//!
//! [`RewardClaimCoordinator::on_event`] never blocks on the network: it
//! checks and updates the cooldown under a lock, then spawns a detached
//! task that waits the debounce delay and claims. Every outcome is logged
//! and sent on the event channel when one is attached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fishpi_client::{ChatApi, ClientError};
use fishpi_core::constants::{CLAIM_COOLDOWN, CLAIM_DEBOUNCE};
use fishpi_settings::RewardSettings;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::events::EventSender;
use crate::types::{ChatEvent, ClaimDecision, ClaimOutcome, Gesture, RewardEvent};

/// What a successful claim call returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimReceipt {
    /// Points won.
    pub amount: i64,
    /// Blessing returned with the claim.
    pub blessing: String,
}

/// Performs the claim call for one reward.
#[async_trait]
pub trait RewardClaimer: Send + Sync + 'static {
    /// Claim reward `id`, playing `gesture` when given.
    async fn claim(&self, id: &str, gesture: Option<Gesture>) -> Result<ClaimReceipt, ClientError>;
}

#[async_trait]
impl RewardClaimer for ChatApi {
    async fn claim(&self, id: &str, gesture: Option<Gesture>) -> Result<ClaimReceipt, ClientError> {
        let claim = self.open_red_packet(id, gesture.map(Gesture::code)).await?;
        Ok(ClaimReceipt {
            amount: claim.money,
            blessing: claim.msg,
        })
    }
}

/// Cooldown and debounce settings for the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClaimConfig {
    /// Whether reward events trigger claims.
    pub enabled: bool,
    /// At most one claim per window.
    pub cooldown: Duration,
    /// Delay before each claim call.
    pub debounce: Duration,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown: CLAIM_COOLDOWN,
            debounce: CLAIM_DEBOUNCE,
        }
    }
}

impl From<&RewardSettings> for ClaimConfig {
    fn from(settings: &RewardSettings) -> Self {
        Self {
            enabled: settings.auto_claim,
            cooldown: settings.cooldown(),
            debounce: settings.debounce(),
        }
    }
}

/// Decides whether a reward is claimed and dispatches the claim.
pub struct RewardClaimCoordinator {
    claimer: Arc<dyn RewardClaimer>,
    config: ClaimConfig,
    last_claim_at: Mutex<Option<Instant>>,
    events: Option<EventSender>,
}

impl RewardClaimCoordinator {
    /// Create a coordinator with no event channel.
    pub fn new(claimer: Arc<dyn RewardClaimer>, config: ClaimConfig) -> Self {
        Self {
            claimer,
            config,
            last_claim_at: Mutex::new(None),
            events: None,
        }
    }

    /// Report skips and outcomes on `events` as well as in logs.
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> ClaimConfig {
        self.config
    }

    /// Time left in the current cooldown window, if one is running.
    pub fn remaining_cooldown(&self) -> Option<Duration> {
        let last = (*self.last_claim_at.lock())?;
        let remaining = self.config.cooldown.saturating_sub(last.elapsed());
        (!remaining.is_zero()).then_some(remaining)
    }

    /// React to one reward event. Must be called inside a Tokio runtime.
    pub fn on_event(&self, event: &RewardEvent) -> ClaimDecision {
        if !self.config.enabled {
            debug!(id = %event.id, "auto-claim disabled");
            return ClaimDecision::Disabled;
        }

        if let Err(remaining) = self.try_start_window() {
            info!(
                id = %event.id,
                remaining_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
                "reward claim skipped, cooldown running"
            );
            self.report(ChatEvent::ClaimSkipped {
                id: event.id.clone(),
                remaining,
            });
            return ClaimDecision::Skipped { remaining };
        }

        let gesture = event.kind.needs_gesture().then(Gesture::random);
        let handle = tokio::spawn(run_claim(
            self.claimer.clone(),
            event.id.clone(),
            gesture,
            self.config.debounce,
            self.events.clone(),
        ));

        ClaimDecision::Dispatched {
            id: event.id.clone(),
            gesture,
            handle,
        }
    }

    /// Open a new cooldown window unless one is running.
    fn try_start_window(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut last = self.last_claim_at.lock();
        if let Some(prev) = *last {
            let elapsed = now.saturating_duration_since(prev);
            if elapsed < self.config.cooldown {
                return Err(self.config.cooldown - elapsed);
            }
        }
        *last = Some(now);
        Ok(())
    }

    fn report(&self, event: ChatEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

async fn run_claim(
    claimer: Arc<dyn RewardClaimer>,
    id: String,
    gesture: Option<Gesture>,
    debounce: Duration,
    events: Option<EventSender>,
) -> ClaimOutcome {
    if !debounce.is_zero() {
        tokio::time::sleep(debounce).await;
    }

    let outcome = match claimer.claim(&id, gesture).await {
        Ok(receipt) => {
            info!(
                %id,
                amount = receipt.amount,
                gesture = gesture.map(Gesture::name),
                blessing = %receipt.blessing,
                "reward claimed"
            );
            ClaimOutcome::Claimed {
                id,
                amount: receipt.amount,
                gesture,
                blessing: receipt.blessing,
            }
        }
        Err(e) => {
            warn!(%id, gesture = gesture.map(Gesture::name), error = %e, "reward claim failed");
            ClaimOutcome::Failed {
                id,
                gesture,
                cause: e.to_string(),
            }
        }
    };

    if let Some(tx) = events {
        let _ = tx.send(ChatEvent::Claim(outcome.clone()));
    }
    outcome
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::frame::ChatTime;
    use crate::types::RewardKind;
    use assert_matches::assert_matches;
    use fishpi_core::capture_logs;
    use crate::events::event_channel;
    use tracing::Level;

    #[derive(Default)]
    struct CountingClaimer {
        calls: AtomicUsize,
        gestures: Mutex<Vec<Option<Gesture>>>,
        fail: bool,
    }

    #[async_trait]
    impl RewardClaimer for CountingClaimer {
        async fn claim(&self, _id: &str, gesture: Option<Gesture>) -> Result<ClaimReceipt, ClientError> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            self.gestures.lock().push(gesture);
            if self.fail {
                return Err(ClientError::RequestFailed {
                    status: -1,
                    body: "already claimed".to_string(),
                });
            }
            Ok(ClaimReceipt {
                amount: 8,
                blessing: "enjoy".to_string(),
            })
        }
    }

    fn reward(id: &str, kind: RewardKind) -> RewardEvent {
        RewardEvent {
            id: id.to_string(),
            author: "bob".to_string(),
            kind,
            blessing: "good luck".to_string(),
            total_amount: 64,
            claimed_count: 0,
            total_count: 4,
            sender_id: String::new(),
            receivers: Vec::new(),
            claimers: Vec::new(),
            timestamp: ChatTime::default(),
        }
    }

    fn coordinator(claimer: Arc<CountingClaimer>) -> RewardClaimCoordinator {
        RewardClaimCoordinator::new(claimer, ClaimConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn many_events_in_one_window_claim_once() {
        let claimer = Arc::new(CountingClaimer::default());
        let coord = coordinator(claimer.clone());

        let mut handles = Vec::new();
        let mut skipped = 0;
        for i in 0..10 {
            match coord.on_event(&reward(&format!("r{i}"), RewardKind::Random)) {
                ClaimDecision::Dispatched { handle, .. } => handles.push(handle),
                ClaimDecision::Skipped { .. } => skipped += 1,
                ClaimDecision::Disabled => unreachable!(),
            }
        }
        for h in handles {
            let _ = h.await.unwrap();
        }

        assert_eq!(claimer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(skipped, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_events_claim_once() {
        let claimer = Arc::new(CountingClaimer::default());
        let coord = Arc::new(coordinator(claimer.clone()));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let coord = coord.clone();
                tokio::spawn(async move {
                    match coord.on_event(&reward(&format!("r{i}"), RewardKind::Average)) {
                        ClaimDecision::Dispatched { handle, .. } => Some(handle.await.unwrap()),
                        _ => None,
                    }
                })
            })
            .collect();

        let mut outcomes = 0;
        for t in tasks {
            if t.await.unwrap().is_some() {
                outcomes += 1;
            }
        }
        assert_eq!(outcomes, 1);
        assert_eq!(claimer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_reports_remaining_time() {
        let coord = coordinator(Arc::new(CountingClaimer::default()));
        let _ = coord.on_event(&reward("a", RewardKind::Random));
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_matches!(
            coord.on_event(&reward("b", RewardKind::Random)),
            ClaimDecision::Skipped { remaining } if remaining == Duration::from_secs(20)
        );
        assert_eq!(coord.remaining_cooldown(), Some(Duration::from_secs(20)));
    }

    #[tokio::test(start_paused = true)]
    async fn window_reopens_after_cooldown() {
        let claimer = Arc::new(CountingClaimer::default());
        let coord = coordinator(claimer.clone());

        let ClaimDecision::Dispatched { handle, .. } = coord.on_event(&reward("a", RewardKind::Random)) else {
            panic!("first event must dispatch");
        };
        let _ = handle.await.unwrap();

        tokio::time::advance(CLAIM_COOLDOWN).await;
        assert!(coord.remaining_cooldown().is_none());
        let ClaimDecision::Dispatched { handle, .. } = coord.on_event(&reward("b", RewardKind::Random)) else {
            panic!("window should have reopened");
        };
        let _ = handle.await.unwrap();
        assert_eq!(claimer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn claim_waits_for_debounce() {
        let claimer = Arc::new(CountingClaimer::default());
        let coord = coordinator(claimer.clone());
        let start = Instant::now();

        let ClaimDecision::Dispatched { handle, .. } = coord.on_event(&reward("a", RewardKind::Random)) else {
            panic!("expected dispatch");
        };
        assert_eq!(claimer.calls.load(Ordering::SeqCst), 0);
        let _ = handle.await.unwrap();
        assert!(start.elapsed() >= CLAIM_DEBOUNCE);
    }

    #[tokio::test(start_paused = true)]
    async fn rock_paper_scissors_sends_gesture() {
        let claimer = Arc::new(CountingClaimer::default());
        let coord = coordinator(claimer.clone());

        let ClaimDecision::Dispatched { gesture, handle, .. } =
            coord.on_event(&reward("a", RewardKind::RockPaperScissors))
        else {
            panic!("expected dispatch");
        };
        assert!(gesture.is_some());
        let outcome = handle.await.unwrap();
        assert_matches!(outcome, ClaimOutcome::Claimed { gesture: Some(_), amount: 8, .. });
        assert_eq!(claimer.gestures.lock().as_slice(), &[gesture]);
    }

    #[tokio::test(start_paused = true)]
    async fn plain_reward_sends_no_gesture() {
        let claimer = Arc::new(CountingClaimer::default());
        let coord = coordinator(claimer.clone());
        let ClaimDecision::Dispatched { gesture, handle, .. } =
            coord.on_event(&reward("a", RewardKind::Heartbeat))
        else {
            panic!("expected dispatch");
        };
        assert!(gesture.is_none());
        let _ = handle.await.unwrap();
        assert_eq!(claimer.gestures.lock().as_slice(), &[None]);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_reported_not_retried() {
        let claimer = Arc::new(CountingClaimer {
            fail: true,
            ..CountingClaimer::default()
        });
        let (tx, mut rx) = event_channel(8);
        let coord = coordinator(claimer.clone()).with_events(tx);

        let ClaimDecision::Dispatched { handle, .. } = coord.on_event(&reward("a", RewardKind::Random)) else {
            panic!("expected dispatch");
        };
        let outcome = handle.await.unwrap();
        assert_matches!(&outcome, ClaimOutcome::Failed { cause, .. } if cause.contains("already claimed"));
        assert_eq!(rx.recv().await, Some(ChatEvent::Claim(outcome)));
        assert_eq!(claimer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_is_sent_on_channel() {
        let (tx, mut rx) = event_channel(8);
        let coord = coordinator(Arc::new(CountingClaimer::default())).with_events(tx);
        let _ = coord.on_event(&reward("a", RewardKind::Random));
        let _ = coord.on_event(&reward("b", RewardKind::Random));
        assert_matches!(
            rx.recv().await,
            Some(ChatEvent::ClaimSkipped { id, .. }) if id == "b"
        );
    }

    #[tokio::test]
    async fn disabled_never_claims_or_starts_window() {
        let claimer = Arc::new(CountingClaimer::default());
        let coord = RewardClaimCoordinator::new(
            claimer.clone(),
            ClaimConfig {
                enabled: false,
                ..ClaimConfig::default()
            },
        );
        assert_matches!(coord.on_event(&reward("a", RewardKind::Random)), ClaimDecision::Disabled);
        assert!(coord.remaining_cooldown().is_none());
        assert_eq!(claimer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn outcome_is_logged() {
        let (logs, _guard) = capture_logs();
        let coord = RewardClaimCoordinator::new(
            Arc::new(CountingClaimer::default()),
            ClaimConfig {
                debounce: Duration::ZERO,
                ..ClaimConfig::default()
            },
        );
        let ClaimDecision::Dispatched { handle, .. } = coord.on_event(&reward("a", RewardKind::Random)) else {
            panic!("expected dispatch");
        };
        let _ = handle.await.unwrap();
        assert!(logs.has_event(Level::INFO, "reward claimed"));
    }

    #[test]
    fn config_from_settings() {
        let settings = RewardSettings {
            auto_claim: false,
            cooldown_ms: 5_000,
            debounce_ms: 0,
        };
        let config = ClaimConfig::from(&settings);
        assert!(!config.enabled);
        assert_eq!(config.cooldown, Duration::from_secs(5));
        assert!(config.debounce.is_zero());
    }
}

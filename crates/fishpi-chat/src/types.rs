//! Events, reward kinds, gestures, and lifecycle state.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;

use crate::frame::{ChatTime, Claimer};

/// Classified inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundEvent {
    /// An ordinary chat message.
    Plain(PlainMessage),
    /// A claimable reward.
    Reward(RewardEvent),
    /// Content looked structured but did not decode as a reward.
    MalformedReward {
        /// Message id.
        id: String,
        /// Author label.
        author: String,
        /// Decoder message.
        error: String,
    },
    /// The frame is not a chat envelope at all.
    Undecodable {
        /// Frame text as received.
        raw: String,
        /// Decoder message.
        error: String,
    },
    /// Nothing to show (presence updates, empty frames).
    Ignorable,
}

/// An ordinary chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlainMessage {
    /// Message id.
    pub id: String,
    /// Author label.
    pub author: String,
    /// Markdown if present, else HTML content.
    pub display_text: String,
    /// When the message was sent.
    pub timestamp: ChatTime,
}

/// A claimable reward announced in the chat room.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewardEvent {
    /// Message id, used to claim.
    pub id: String,
    /// Author label.
    pub author: String,
    /// Reward kind.
    pub kind: RewardKind,
    /// Blessing text.
    pub blessing: String,
    /// Total points.
    pub total_amount: i64,
    /// Shares already taken.
    pub claimed_count: i64,
    /// Total shares.
    pub total_count: i64,
    /// Sender id.
    pub sender_id: String,
    /// Restricted receivers; empty when anyone may claim.
    pub receivers: Vec<String>,
    /// Claimers so far.
    pub claimers: Vec<Claimer>,
    /// When the reward was sent.
    pub timestamp: ChatTime,
}

/// Reward kind, as named on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RewardKind {
    /// Random split.
    Random,
    /// Even split.
    Average,
    /// Restricted to named receivers.
    Specify,
    /// Heartbeat reward.
    Heartbeat,
    /// Claimer must play a gesture.
    RockPaperScissors,
    /// Any kind this client does not know.
    Other(String),
}

impl RewardKind {
    /// Parse the wire `type` string.
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "random" => Self::Random,
            "average" => Self::Average,
            "specify" => Self::Specify,
            "heartbeat" => Self::Heartbeat,
            "rockPaperScissors" => Self::RockPaperScissors,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire `type` string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Random => "random",
            Self::Average => "average",
            Self::Specify => "specify",
            Self::Heartbeat => "heartbeat",
            Self::RockPaperScissors => "rockPaperScissors",
            Self::Other(s) => s,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        match self {
            Self::Random => "lucky draw",
            Self::Average => "even split",
            Self::Specify => "exclusive",
            Self::Heartbeat => "heartbeat",
            Self::RockPaperScissors => "rock-paper-scissors",
            Self::Other(s) => s,
        }
    }

    /// Whether claiming requires a gesture.
    pub fn needs_gesture(&self) -> bool {
        matches!(self, Self::RockPaperScissors)
    }
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rock-paper-scissors move. The discriminant is the wire code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Gesture {
    /// Code 0.
    Rock = 0,
    /// Code 1.
    Scissors = 1,
    /// Code 2.
    Paper = 2,
}

impl Gesture {
    /// All gestures in code order.
    pub const ALL: [Self; 3] = [Self::Rock, Self::Scissors, Self::Paper];

    /// Pick a gesture uniformly at random.
    pub fn random() -> Self {
        Self::random_with(&mut rand::rng())
    }

    /// Pick a gesture uniformly using the given generator.
    pub fn random_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Wire code.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Gesture for a wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Scissors => "scissors",
            Self::Paper => "paper",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one claim attempt. Never retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The remote awarded points.
    Claimed {
        /// Reward id.
        id: String,
        /// Points won.
        amount: i64,
        /// Gesture played, if any.
        gesture: Option<Gesture>,
        /// Blessing returned with the claim.
        blessing: String,
    },
    /// The claim call failed.
    Failed {
        /// Reward id.
        id: String,
        /// Gesture played, if any.
        gesture: Option<Gesture>,
        /// Error description.
        cause: String,
    },
}

impl ClaimOutcome {
    /// Reward id this outcome belongs to.
    pub fn id(&self) -> &str {
        match self {
            Self::Claimed { id, .. } | Self::Failed { id, .. } => id,
        }
    }
}

/// What the coordinator did with a reward event.
#[derive(Debug)]
pub enum ClaimDecision {
    /// A claim task was spawned; its handle yields the outcome.
    Dispatched {
        /// Reward id.
        id: String,
        /// Gesture that will be played.
        gesture: Option<Gesture>,
        /// The detached claim task.
        handle: JoinHandle<ClaimOutcome>,
    },
    /// Another claim happened inside the cooldown window.
    Skipped {
        /// Time left in the window.
        remaining: Duration,
    },
    /// Automatic claiming is turned off.
    Disabled,
}

/// Everything the realtime session reports to its owner.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatEvent {
    /// A classified inbound frame.
    Message(InboundEvent),
    /// A reward was seen during the cooldown window and not claimed.
    ClaimSkipped {
        /// Reward id.
        id: String,
        /// Time left in the window.
        remaining: Duration,
    },
    /// A claim finished.
    Claim(ClaimOutcome),
    /// The inbound pump stopped because the transport ended.
    Disconnected {
        /// What ended it.
        reason: String,
        /// Whether the peer closed cleanly.
        clean: bool,
    },
}

impl ChatEvent {
    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::ClaimSkipped { .. } => "claim_skipped",
            Self::Claim(_) => "claim",
            Self::Disconnected { .. } => "disconnected",
        }
    }
}

/// Lifecycle of a realtime session. `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Not yet opened.
    Idle = 0,
    /// Discovering the endpoint or handshaking.
    Connecting = 1,
    /// Heartbeat and pump are running.
    Open = 2,
    /// Teardown in progress.
    Closing = 3,
    /// Torn down.
    Closed = 4,
}

impl ConnectionState {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Connecting,
            2 => Self::Open,
            3 => Self::Closing,
            _ => Self::Closed,
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn reward_kind_round_trips_known_names() {
        for name in ["random", "average", "specify", "heartbeat", "rockPaperScissors"] {
            assert_eq!(RewardKind::from_wire(name).as_str(), name);
        }
        assert_eq!(
            RewardKind::from_wire("dice"),
            RewardKind::Other("dice".to_string())
        );
    }

    #[test]
    fn only_rock_paper_scissors_needs_gesture() {
        assert!(RewardKind::RockPaperScissors.needs_gesture());
        assert!(!RewardKind::Random.needs_gesture());
        assert!(!RewardKind::Other("rockPaperScissors2".into()).needs_gesture());
    }

    #[test]
    fn gesture_codes_match_wire() {
        assert_eq!(Gesture::Rock.code(), 0);
        assert_eq!(Gesture::Scissors.code(), 1);
        assert_eq!(Gesture::Paper.code(), 2);
        assert_eq!(Gesture::from_code(2), Some(Gesture::Paper));
        assert_eq!(Gesture::from_code(3), None);
    }

    #[test]
    fn thousand_picks_cover_all_gestures() {
        let mut counts = [0_u32; 3];
        for _ in 0..1000 {
            counts[usize::from(Gesture::random().code())] += 1;
        }
        assert_eq!(counts.iter().sum::<u32>(), 1000);
        for (code, count) in counts.iter().enumerate() {
            assert!(*count > 250, "gesture {code} picked only {count} times");
        }
    }

    #[test]
    fn seeded_picks_are_deterministic() {
        let a: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..20).map(|_| Gesture::random_with(&mut rng)).collect()
        };
        let b: Vec<_> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..20).map(|_| Gesture::random_with(&mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn state_u8_round_trip() {
        for state in [
            ConnectionState::Idle,
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Closing,
            ConnectionState::Closed,
        ] {
            assert_eq!(ConnectionState::from_u8(state as u8), state);
        }
    }

    #[test]
    fn claim_outcome_id() {
        let outcome = ClaimOutcome::Failed {
            id: "17".into(),
            gesture: None,
            cause: "x".into(),
        };
        assert_eq!(outcome.id(), "17");
    }
}

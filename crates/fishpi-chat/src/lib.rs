//! # fishpi-chat
//!
//! Realtime side of the FishPi client.
//!
//! - [`RealtimeSession`]: discovers the assigned websocket node and connects
//! - [`RealtimeConnection`]: shared writer, keep-alive, and a single teardown
//! - [`classify`]: turns inbound frames into [`InboundEvent`]s
//! - [`RewardClaimCoordinator`]: claims rewards, at most one per cooldown window
//!
//! Everything the connection observes is reported as a [`ChatEvent`] on the
//! bounded receiver returned by [`RealtimeSession::open`]. A receiver that
//! falls behind loses new events rather than growing without limit.

#![deny(unsafe_code)]

pub mod classifier;
pub mod connection;
pub mod errors;
pub mod events;
pub mod frame;
pub mod heartbeat;
pub mod pump;
pub mod reward;
pub mod session;
pub mod types;

#[cfg(test)]
mod test_support;

pub use classifier::{classify, classify_message};
pub use connection::RealtimeConnection;
pub use errors::{ChatError, Result};
pub use events::{EventSender, event_channel};
pub use frame::{ChatFrame, ChatTime, Claimer};
pub use heartbeat::HeartbeatResult;
pub use pump::PumpExit;
pub use reward::{ClaimConfig, ClaimReceipt, RewardClaimCoordinator, RewardClaimer};
pub use session::{ChatOptions, RealtimeSession};
pub use types::{
    ChatEvent, ClaimDecision, ClaimOutcome, ConnectionState, Gesture, InboundEvent, PlainMessage,
    RewardEvent, RewardKind,
};

//! Wire models for the HTTP API.

pub mod chat;
pub mod json_util;
pub mod user;

pub use chat::{ChatNode, NodeInfo, RedPacketClaim, SendMessageRequest};
pub use user::{CheckIn, Liveness, LivenessCollectedStatus, LivenessReward, Medal, Profile, YesterdayReward};

//! # fishpi-client
//!
//! HTTP side of the FishPi client.
//!
//! - [`RequestDispatcher`]: every request, the session token, and per-path
//!   spacing (two calls to the same path never start closer than the
//!   configured interval)
//! - [`SessionAuthenticator`]: login, token adoption, profile
//! - [`ChatApi`]: websocket node discovery, message send, reward claim
//! - [`AccountApi`]: liveness, check-in, daily rewards, member lookup
//!
//! [`FishpiClient`] bundles all of them over one shared session.

#![deny(unsafe_code)]

pub mod auth;
pub mod chat;
pub mod client;
pub mod dispatcher;
pub mod errors;
pub mod models;
pub mod rate_limit;
pub mod user;

pub use auth::SessionAuthenticator;
pub use chat::ChatApi;
pub use client::FishpiClient;
pub use dispatcher::{AuthMode, DispatcherConfig, Envelope, RequestDispatcher};
pub use errors::{ClientError, Result};
pub use models::{NodeInfo, Profile, RedPacketClaim, YesterdayReward};
pub use rate_limit::PathRateLimiter;
pub use user::AccountApi;

//! Account status calls.

use std::sync::Arc;

use reqwest::Method;
use tracing::info;

use crate::dispatcher::{AuthMode, RequestDispatcher};
use crate::errors::{ClientError, Result};
use crate::models::{
    CheckIn, Liveness, LivenessCollectedStatus, LivenessReward, Profile, YesterdayReward,
};

/// Profile lookups, liveness, check-in, and daily reward calls.
#[derive(Clone)]
pub struct AccountApi {
    dispatcher: Arc<RequestDispatcher>,
}

impl AccountApi {
    /// Wrap a dispatcher.
    pub fn new(dispatcher: Arc<RequestDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Look up another user's public profile.
    ///
    /// Sent with the token when one is held. The response is the bare
    /// profile, not an envelope.
    pub async fn member(&self, username: &str) -> Result<Profile> {
        let username = username.trim();
        if username.is_empty() || username.contains(['/', '?', '#']) {
            return Err(ClientError::InvalidRequest(format!(
                "invalid user name: {username:?}"
            )));
        }
        let auth = if self.dispatcher.has_token() {
            AuthMode::QueryKey
        } else {
            AuthMode::Anonymous
        };
        self.dispatcher
            .issue(Method::GET, &format!("/user/{username}"), None, auth)
            .await
    }

    /// Today's liveness percentage.
    pub async fn liveness(&self) -> Result<f64> {
        let liveness: Liveness = self
            .dispatcher
            .issue(Method::GET, "/user/liveness", None, AuthMode::QueryKey)
            .await?;
        Ok(liveness.liveness)
    }

    /// Whether today's check-in is done.
    pub async fn checked_in(&self) -> Result<bool> {
        let status: CheckIn = self
            .dispatcher
            .issue(Method::GET, "/user/checkedIn", None, AuthMode::QueryKey)
            .await?;
        Ok(status.checked_in)
    }

    /// Claim yesterday's liveness reward.
    pub async fn claim_yesterday_liveness_reward(&self) -> Result<YesterdayReward> {
        let reward: LivenessReward = self
            .dispatcher
            .issue(
                Method::GET,
                "/activity/yesterday-liveness-reward-api",
                None,
                AuthMode::QueryKey,
            )
            .await?;
        let reward = YesterdayReward::from(reward);
        info!(?reward, "yesterday liveness reward");
        Ok(reward)
    }

    /// Whether yesterday's liveness reward was already collected.
    pub async fn yesterday_reward_collected(&self) -> Result<bool> {
        let status: LivenessCollectedStatus = self
            .dispatcher
            .issue(
                Method::GET,
                "/api/activity/is-collected-liveness",
                None,
                AuthMode::QueryKey,
            )
            .await?;
        Ok(status.is_collected_yesterday_liveness_reward)
    }
}

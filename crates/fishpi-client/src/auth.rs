//! Session authentication.
//!
//! Obtains and validates the session token. The token itself lives in the
//! [`RequestDispatcher`]; this type only decides when to set or clear it.

use std::sync::Arc;

use fishpi_core::{legacy_password_digest, mask_token};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::dispatcher::{AuthMode, Envelope, RequestDispatcher};
use crate::errors::{ClientError, Result};
use crate::models::Profile;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    name_or_email: &'a str,
    user_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mfa_code: Option<&'a str>,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    msg: Option<String>,
    #[serde(rename = "Key", default)]
    key: Option<String>,
}

/// Logs in, validates tokens, and fetches the current profile.
#[derive(Clone)]
pub struct SessionAuthenticator {
    dispatcher: Arc<RequestDispatcher>,
}

impl SessionAuthenticator {
    /// Wrap a dispatcher.
    pub fn new(dispatcher: Arc<RequestDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Log in with a name or email and a plain-text password.
    ///
    /// The password is sent as its legacy MD5 hex digest, which the remote
    /// requires. On success the token is stored and returned. A failed login
    /// leaves the stored token untouched.
    #[instrument(skip(self, secret, second_factor), fields(has_mfa = second_factor.is_some_and(|c| !c.is_empty())))]
    pub async fn login(
        &self,
        identifier: &str,
        secret: &str,
        second_factor: Option<&str>,
    ) -> Result<String> {
        let request = LoginRequest {
            name_or_email: identifier,
            user_password: legacy_password_digest(secret),
            mfa_code: second_factor.filter(|c| !c.is_empty()),
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        let response: LoginResponse = self
            .dispatcher
            .issue(Method::POST, "/api/getKey", Some(body), AuthMode::Anonymous)
            .await?;

        if response.code != 0 {
            let message = response.msg.unwrap_or_else(|| format!("login rejected (code {})", response.code));
            warn!(code = response.code, %message, "login rejected");
            return Err(ClientError::Auth { message });
        }

        let token = response
            .key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ClientError::Auth {
                message: "login response carried no token".to_string(),
            })?;

        self.dispatcher.set_token(&token);
        info!(token = %mask_token(&token), "logged in");
        Ok(token)
    }

    /// Adopt an existing token, keeping it only if a profile fetch succeeds.
    ///
    /// On failure the previous token state is restored and the cause is
    /// wrapped in [`ClientError::Auth`].
    #[instrument(skip_all)]
    pub async fn login_with_token(&self, token: &str) -> Result<Profile> {
        if token.trim().is_empty() {
            return Err(ClientError::Auth {
                message: "token is empty".to_string(),
            });
        }

        let previous = self.dispatcher.replace_token(Some(token.to_string()));
        match self.profile().await {
            Ok(profile) => {
                info!(user = %profile.user_name, "token accepted");
                Ok(profile)
            }
            Err(cause) => {
                let _ = self.dispatcher.replace_token(previous);
                warn!(token = %mask_token(token), error = %cause, "token rejected");
                Err(ClientError::Auth {
                    message: format!("token rejected: {cause}"),
                })
            }
        }
    }

    /// Whether the current token still yields a profile.
    ///
    /// Fails with [`ClientError::Auth`] only when no token is set; any other
    /// failure is reported as `false`.
    pub async fn validate(&self) -> Result<bool> {
        if !self.dispatcher.has_token() {
            return Err(ClientError::missing_token());
        }
        match self.profile().await {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!(error = %e, "token validation failed");
                Ok(false)
            }
        }
    }

    /// Fetch the profile of the logged-in user.
    pub async fn profile(&self) -> Result<Profile> {
        self.dispatcher
            .issue::<Envelope<Profile>>(Method::GET, "/api/user", None, AuthMode::QueryKey)
            .await?
            .into_data()
    }

    /// Forget the session token. Nothing is sent to the remote.
    pub fn logout(&self) {
        self.dispatcher.clear_token();
        info!("logged out");
    }

    /// Whether a token is currently held.
    pub fn is_logged_in(&self) -> bool {
        self.dispatcher.has_token()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_request_sends_digest_and_omits_empty_mfa() {
        let req = LoginRequest {
            name_or_email: "bob",
            user_password: legacy_password_digest("password"),
            mfa_code: None,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"nameOrEmail": "bob", "userPassword": "5f4dcc3b5aa765d61d8327deb882cf99"})
        );
    }

    #[test]
    fn login_request_includes_mfa() {
        let req = LoginRequest {
            name_or_email: "bob",
            user_password: String::new(),
            mfa_code: Some("123456"),
        };
        assert_eq!(serde_json::to_value(&req).unwrap()["mfaCode"], "123456");
    }

    #[test]
    fn login_response_reads_capitalized_key() {
        let resp: LoginResponse = serde_json::from_value(json!({"code": 0, "Key": "abc"})).unwrap();
        assert_eq!(resp.key.as_deref(), Some("abc"));
    }

    #[test]
    fn logout_clears_token() {
        let dispatcher = Arc::new(RequestDispatcher::new(Default::default()));
        dispatcher.set_token("abc");
        let auth = SessionAuthenticator::new(dispatcher.clone());
        assert!(auth.is_logged_in());
        auth.logout();
        assert!(!dispatcher.has_token());
    }

    #[tokio::test]
    async fn validate_without_token_is_auth_error() {
        let auth = SessionAuthenticator::new(Arc::new(RequestDispatcher::new(Default::default())));
        assert!(auth.validate().await.unwrap_err().is_auth());
    }

    #[tokio::test]
    async fn empty_token_rejected_without_request() {
        let dispatcher = Arc::new(RequestDispatcher::new(Default::default()));
        let auth = SessionAuthenticator::new(dispatcher.clone());
        assert!(auth.login_with_token("  ").await.unwrap_err().is_auth());
        assert_eq!(dispatcher.limiter().tracked_paths(), 0);
    }
}

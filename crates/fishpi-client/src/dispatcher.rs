//! HTTP request dispatch with session token handling and per-path spacing.
//!
//! Every call to the remote goes through [`RequestDispatcher::issue`]. The
//! dispatcher owns the session: the base URL, the current token, and the
//! per-path rate limiter.

use std::time::Duration;

use fishpi_core::constants::API_KEY_PARAM;
use fishpi_core::mask_token;
use fishpi_settings::ApiSettings;
use parking_lot::RwLock;
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::errors::{ClientError, Result};
use crate::rate_limit::PathRateLimiter;

/// How the session token is attached to a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    /// No token.
    Anonymous,
    /// Token appended as the `apiKey` query parameter.
    QueryKey,
    /// Token inserted as `"apiKey"` into the JSON object body.
    BodyKey,
}

impl AuthMode {
    /// Whether this mode requires a token.
    pub fn needs_token(self) -> bool {
        !matches!(self, Self::Anonymous)
    }
}

/// Standard response envelope: `{code, msg?, data?}`.
///
/// `code == 0` means success.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    /// Zero on success.
    #[serde(default)]
    pub code: i32,
    /// Server message, usually set on failure.
    #[serde(default)]
    pub msg: Option<String>,
    /// Endpoint-specific payload.
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Whether the remote reported success.
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Fail with [`ClientError::RequestFailed`] unless `code == 0`.
    pub fn ensure_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::RequestFailed {
                status: self.code,
                body: self.msg.unwrap_or_default(),
            })
        }
    }

    /// Extract the payload, failing on a non-zero code or a missing `data`.
    pub fn into_data(self) -> Result<T> {
        self.ensure_success()?
            .data
            .ok_or_else(|| ClientError::DecodeFailed {
                raw: String::new(),
                reason: "response envelope has no data".to_string(),
            })
    }
}

/// Connection parameters for a [`RequestDispatcher`].
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Minimum spacing between two starts on the same path.
    pub min_request_interval: Duration,
}

impl From<&ApiSettings> for DispatcherConfig {
    fn from(api: &ApiSettings) -> Self {
        Self {
            base_url: api.base_url.trim_end_matches('/').to_string(),
            user_agent: api.user_agent.clone(),
            request_timeout: api.request_timeout(),
            min_request_interval: api.min_request_interval(),
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from(&ApiSettings::default())
    }
}

/// Issues HTTP calls against the remote and owns the session state.
pub struct RequestDispatcher {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
    token: RwLock<Option<String>>,
    limiter: PathRateLimiter,
}

impl RequestDispatcher {
    /// Create a dispatcher with no token set.
    pub fn new(config: DispatcherConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent,
            token: RwLock::new(None),
            limiter: PathRateLimiter::new(config.min_request_interval),
        }
    }

    /// Create a dispatcher from API settings, adopting a configured token.
    pub fn from_settings(api: &ApiSettings) -> Self {
        let dispatcher = Self::new(DispatcherConfig::from(api));
        if let Some(key) = api.api_key.as_deref() {
            dispatcher.set_token(key);
        }
        dispatcher
    }

    /// Base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// User-Agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Current session token, if any.
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Whether a token is set.
    pub fn has_token(&self) -> bool {
        self.token.read().is_some()
    }

    /// Store a session token. An empty string clears it.
    pub fn set_token(&self, token: &str) {
        let _ = self.replace_token(Some(token.to_string()));
    }

    /// Remove the session token.
    pub fn clear_token(&self) {
        let _ = self.replace_token(None);
    }

    /// Swap the session token, returning the previous value.
    pub fn replace_token(&self, token: Option<String>) -> Option<String> {
        let token = token.filter(|t| !t.is_empty());
        if let Some(t) = token.as_deref() {
            debug!(token = %mask_token(t), "session token set");
        }
        std::mem::replace(&mut *self.token.write(), token)
    }

    /// Clear the token and forget all rate-limit history.
    pub fn reset(&self) {
        self.clear_token();
        self.limiter.reset();
    }

    /// The per-path rate limiter.
    pub fn limiter(&self) -> &PathRateLimiter {
        &self.limiter
    }

    /// Issue one request and decode the JSON body as `T`.
    ///
    /// `path` is both the URL suffix and the rate-limit key, query string
    /// included. Authenticated modes fail with [`ClientError::Auth`] before
    /// anything is sent when no token is set. A failed call still consumes
    /// its rate-limit slot.
    #[instrument(skip(self, body))]
    pub async fn issue<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        auth: AuthMode,
    ) -> Result<T> {
        let token = if auth.needs_token() {
            Some(self.token().ok_or_else(ClientError::missing_token)?)
        } else {
            None
        };

        let body = match (auth, token.as_deref()) {
            (AuthMode::BodyKey, Some(t)) => Some(with_body_key(body, t)?),
            _ => body,
        };

        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let (AuthMode::QueryKey, Some(t)) = (auth, token.as_deref()) {
            request = request.query(&[(API_KEY_PARAM, t)]);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let waited = self.limiter.acquire(path).await;
        if !waited.is_zero() {
            debug!(waited_ms = waited.as_millis(), "waited for rate-limit slot");
        }
        debug!("dispatching request");

        let result = self.execute(request).await;
        self.limiter.complete(path);
        result
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "request returned error status");
            return Err(ClientError::RequestFailed {
                status: i32::from(status.as_u16()),
                body: raw,
            });
        }

        serde_json::from_str(&raw).map_err(|e| {
            warn!(error = %e, "response body did not decode");
            ClientError::DecodeFailed {
                raw,
                reason: e.to_string(),
            }
        })
    }
}

/// Insert the token into a JSON object body.
fn with_body_key(body: Option<Value>, token: &str) -> Result<Value> {
    let mut map = match body {
        None => serde_json::Map::new(),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(ClientError::InvalidRequest(format!(
                "body-key auth needs a JSON object body, got {}",
                json_kind(&other)
            )));
        }
    };
    let _ = map.insert(API_KEY_PARAM.to_string(), Value::String(token.to_string()));
    Ok(Value::Object(map))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a partial
//! settings file only needs the keys it overrides.

use std::time::Duration;

use fishpi_core::constants;
use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "api": { "baseUrl": "https://fishpi.cn" },
///   "rewards": { "autoClaim": false }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FishpiSettings {
    /// HTTP API settings.
    pub api: ApiSettings,
    /// Real-time chat connection settings.
    pub chat: ChatSettings,
    /// Automatic reward claiming.
    pub rewards: RewardSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// HTTP API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Base URL, without trailing slash.
    pub base_url: String,
    /// User-Agent header for HTTP and websocket requests.
    pub user_agent: String,
    /// Client label sent with chat messages.
    pub client_name: String,
    /// Per-request timeout.
    pub request_timeout_ms: u64,
    /// Minimum spacing between two calls to the same endpoint path.
    pub min_request_interval_ms: u64,
    /// Pre-issued session token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_BASE_URL.to_string(),
            user_agent: constants::DEFAULT_USER_AGENT.to_string(),
            client_name: constants::DEFAULT_CLIENT_NAME.to_string(),
            request_timeout_ms: duration_ms(constants::REQUEST_TIMEOUT),
            min_request_interval_ms: duration_ms(constants::MIN_REQUEST_INTERVAL),
            api_key: None,
        }
    }
}

impl ApiSettings {
    /// Per-request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Rate-limit interval as a [`Duration`].
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

/// Real-time chat connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    /// Deadline for the websocket handshake.
    pub connect_timeout_ms: u64,
    /// Heartbeat cadence. Zero disables the heartbeat loop.
    pub heartbeat_interval_ms: u64,
    /// Literal heartbeat frame. Empty disables the heartbeat loop.
    pub heartbeat_payload: String,
    /// Write deadline for a heartbeat frame.
    pub write_timeout_ms: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: duration_ms(constants::CONNECT_TIMEOUT),
            heartbeat_interval_ms: duration_ms(constants::HEARTBEAT_INTERVAL),
            heartbeat_payload: constants::HEARTBEAT_PAYLOAD.to_string(),
            write_timeout_ms: duration_ms(constants::HEARTBEAT_WRITE_TIMEOUT),
        }
    }
}

impl ChatSettings {
    /// Handshake deadline as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Heartbeat cadence as a [`Duration`].
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Heartbeat write deadline as a [`Duration`].
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

/// Automatic reward claiming.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardSettings {
    /// Whether reward events trigger claims at all.
    pub auto_claim: bool,
    /// Global window in which at most one claim is dispatched.
    pub cooldown_ms: u64,
    /// Delay before each claim call.
    pub debounce_ms: u64,
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            auto_claim: true,
            cooldown_ms: duration_ms(constants::CLAIM_COOLDOWN),
            debounce_ms: duration_ms(constants::CLAIM_DEBOUNCE),
        }
    }
}

impl RewardSettings {
    /// Claim cooldown as a [`Duration`].
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Pre-claim delay as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn duration_ms(d: Duration) -> u64 {
    d.as_millis() as u64
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

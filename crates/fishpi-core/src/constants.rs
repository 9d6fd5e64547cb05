//! Defaults shared across the client, chat engine, and settings.

use std::time::Duration;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://fishpi.cn";

/// User-Agent the remote expects from browser-like clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/69.0.3497.100 Safari/537.36";

/// Client label attached to outbound chat messages.
pub const DEFAULT_CLIENT_NAME: &str = "fishpi-rs";

/// Query/body parameter carrying the session token.
pub const API_KEY_PARAM: &str = "apiKey";

/// Minimum spacing between two dispatches to the same endpoint path.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(30);

/// Per-request HTTP timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for establishing the chat websocket.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Heartbeat cadence on the chat websocket.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(3 * 60);

/// Literal heartbeat frame. Not JSON.
pub const HEARTBEAT_PAYLOAD: &str = "-hb-";

/// Write deadline for a single heartbeat frame.
pub const HEARTBEAT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Global window in which at most one reward claim is dispatched.
pub const CLAIM_COOLDOWN: Duration = Duration::from_secs(30);

/// Delay between seeing a reward event and sending its claim.
pub const CLAIM_DEBOUNCE: Duration = Duration::from_millis(100);

/// Chat events buffered for a slow receiver before new ones are dropped.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Author label for chat frames that carry content but no author.
pub const SYSTEM_AUTHOR: &str = "system";

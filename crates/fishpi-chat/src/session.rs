//! Opening a realtime chat connection.
//!
//! [`RealtimeSession::open`] discovers the websocket node, connects, and
//! spawns the heartbeat and inbound pump tasks. The returned
//! [`RealtimeConnection`] owns teardown; events arrive on the returned
//! receiver until the pump stops and every claim task has reported.

use std::sync::Arc;
use std::time::Duration;

use fishpi_client::FishpiClient;
use fishpi_core::constants::{
    CONNECT_TIMEOUT, EVENT_CHANNEL_CAPACITY, HEARTBEAT_INTERVAL, HEARTBEAT_PAYLOAD, HEARTBEAT_WRITE_TIMEOUT,
};
use fishpi_core::mask_token;
use fishpi_settings::{ChatSettings, RewardSettings};
use futures::StreamExt;
use tokio::sync::mpsc::Receiver;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::USER_AGENT;
use tracing::{info, instrument, warn};

use crate::connection::{RealtimeConnection, StateCell, WsStream};
use crate::errors::{ChatError, Result};
use crate::events::event_channel;
use crate::heartbeat::run_heartbeat;
use crate::pump::run_pump;
use crate::reward::{ClaimConfig, RewardClaimCoordinator, RewardClaimer};
use crate::types::{ChatEvent, ConnectionState};

/// Timing and reward options for one session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatOptions {
    /// Bound on the websocket handshake.
    pub connect_timeout: Duration,
    /// Keep-alive cadence; zero disables it.
    pub heartbeat_interval: Duration,
    /// Keep-alive text; empty disables it.
    pub heartbeat_payload: String,
    /// Bound on each outbound write.
    pub write_timeout: Duration,
    /// Reward claiming.
    pub claim: ClaimConfig,
    /// Undelivered events held for the receiver; newer ones are dropped past this.
    pub event_capacity: usize,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            heartbeat_interval: HEARTBEAT_INTERVAL,
            heartbeat_payload: HEARTBEAT_PAYLOAD.to_string(),
            write_timeout: HEARTBEAT_WRITE_TIMEOUT,
            claim: ClaimConfig::default(),
            event_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl ChatOptions {
    /// Build options from the `chat` and `rewards` settings sections.
    pub fn from_settings(chat: &ChatSettings, rewards: &RewardSettings) -> Self {
        Self {
            connect_timeout: chat.connect_timeout(),
            heartbeat_interval: chat.heartbeat_interval(),
            heartbeat_payload: chat.heartbeat_payload.clone(),
            write_timeout: chat.write_timeout(),
            claim: ClaimConfig::from(rewards),
            event_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

/// Opens one realtime connection per session.
///
/// State moves `Idle → Connecting → Open → Closing → Closed`. A failed open
/// returns to `Idle`; `Closed` is terminal.
pub struct RealtimeSession {
    client: FishpiClient,
    options: ChatOptions,
    claimer: Arc<dyn RewardClaimer>,
    state: Arc<StateCell>,
}

impl RealtimeSession {
    /// Create an idle session that claims rewards through the client's chat API.
    pub fn new(client: FishpiClient, options: ChatOptions) -> Self {
        let claimer: Arc<dyn RewardClaimer> = Arc::new(client.chat().clone());
        Self {
            client,
            options,
            claimer,
            state: Arc::new(StateCell::new(ConnectionState::Idle)),
        }
    }

    /// Replace the reward claimer.
    #[must_use]
    pub fn with_claimer(mut self, claimer: Arc<dyn RewardClaimer>) -> Self {
        self.claimer = claimer;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state.load()
    }

    /// Active options.
    pub fn options(&self) -> &ChatOptions {
        &self.options
    }

    /// Discover the assigned node and connect to it.
    #[instrument(skip(self))]
    pub async fn open(&self) -> Result<(RealtimeConnection, Receiver<ChatEvent>)> {
        self.begin()?;
        let result = async {
            self.require_token()?;
            let node = self.client.chat().discover_node().await?;
            self.connect(&node.url).await
        }
        .await;
        self.finish(result)
    }

    /// Connect to an explicit websocket address instead of the assigned node.
    #[instrument(skip(self, url))]
    pub async fn open_url(&self, url: &str) -> Result<(RealtimeConnection, Receiver<ChatEvent>)> {
        self.begin()?;
        let result = async {
            self.require_token()?;
            self.connect(url).await
        }
        .await;
        self.finish(result)
    }

    fn begin(&self) -> Result<()> {
        self.state
            .transition(ConnectionState::Idle, ConnectionState::Connecting)
            .map_err(|actual| ChatError::InvalidState {
                expected: ConnectionState::Idle.as_str(),
                actual: actual.as_str(),
            })
    }

    fn finish<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!(error = %e, "chat open failed");
            self.state.store(ConnectionState::Idle);
        }
        result
    }

    fn require_token(&self) -> Result<()> {
        if self.client.dispatcher().has_token() {
            Ok(())
        } else {
            Err(ChatError::Auth {
                message: "no API key set; log in first".to_string(),
            })
        }
    }

    async fn connect(&self, url: &str) -> Result<(RealtimeConnection, Receiver<ChatEvent>)> {
        let masked = redact_key(url);
        let ws = self.handshake(url, &masked).await?;
        let (sink, source) = ws.split();

        let connection = RealtimeConnection::new(
            sink,
            self.state.clone(),
            self.client.chat().clone(),
            masked.clone(),
            self.options.write_timeout,
        );
        let (tx, rx) = event_channel(self.options.event_capacity);
        let coordinator = Arc::new(
            RewardClaimCoordinator::new(self.claimer.clone(), self.options.claim).with_events(tx.clone()),
        );

        self.state.store(ConnectionState::Open);

        drop(tokio::spawn(run_heartbeat(
            connection.clone(),
            self.options.heartbeat_interval,
            self.options.heartbeat_payload.clone(),
            connection.cancel_token(),
        )));
        drop(tokio::spawn(run_pump(
            source,
            connection.clone(),
            coordinator,
            tx,
            connection.cancel_token(),
        )));

        info!(url = %masked, "chat connection open");
        Ok((connection, rx))
    }

    async fn handshake(&self, url: &str, masked: &str) -> Result<WsStream> {
        let connect_error = |message: String| ChatError::Connect {
            url: masked.to_string(),
            message,
        };

        let mut request = url
            .into_client_request()
            .map_err(|e| connect_error(e.to_string()))?;
        let user_agent = HeaderValue::from_str(self.client.dispatcher().user_agent())
            .map_err(|e| connect_error(format!("invalid user agent: {e}")))?;
        let _ = request.headers_mut().insert(USER_AGENT, user_agent);

        match timeout(self.options.connect_timeout, connect_async(request)).await {
            Ok(Ok((ws, _response))) => Ok(ws),
            Ok(Err(e)) => Err(connect_error(e.to_string())),
            Err(_) => Err(connect_error(format!(
                "timed out after {}ms",
                self.options.connect_timeout.as_millis()
            ))),
        }
    }
}

/// Mask the `apiKey` query value so addresses can be logged.
pub fn redact_key(url: &str) -> String {
    let Some(start) = url.find("apiKey=").map(|i| i + "apiKey=".len()) else {
        return url.to_string();
    };
    let end = url[start..].find('&').map_or(url.len(), |i| start + i);
    format!("{}{}{}", &url[..start], mask_token(&url[start..end]), &url[end..])
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

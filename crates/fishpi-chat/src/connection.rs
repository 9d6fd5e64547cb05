//! One open realtime connection: the shared writer, lifecycle state, and teardown.

use std::fmt;
use std::io::ErrorKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::time::Duration;

use fishpi_client::ChatApi;
use futures::SinkExt;
use futures::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{ChatError, Result};
use crate::types::ConnectionState;

/// Client websocket over plain TCP or TLS.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
/// Write half of [`WsStream`].
pub type WsSink = SplitSink<WsStream, Message>;
/// Read half of [`WsStream`].
pub type WsSource = SplitStream<WsStream>;

/// Lifecycle state shared by a session and the connection it opened.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: ConnectionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move `from → to`; on mismatch returns the state actually observed.
    pub(crate) fn transition(
        &self,
        from: ConnectionState,
        to: ConnectionState,
    ) -> std::result::Result<(), ConnectionState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(ConnectionState::from_u8)
    }
}

/// Handle to an open realtime connection. Cheap to clone; all clones share
/// one transport.
#[derive(Clone)]
pub struct RealtimeConnection {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    sink: Mutex<WsSink>,
    state: Arc<StateCell>,
    cancel: CancellationToken,
    closing: AtomicBool,
    close_result: watch::Sender<Option<std::result::Result<(), String>>>,
    teardowns: AtomicUsize,
    chat: ChatApi,
    write_timeout: Duration,
}

impl RealtimeConnection {
    pub(crate) fn new(
        sink: WsSink,
        state: Arc<StateCell>,
        chat: ChatApi,
        url: String,
        write_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                url,
                sink: Mutex::new(sink),
                state,
                cancel: CancellationToken::new(),
                closing: AtomicBool::new(false),
                close_result: watch::Sender::new(None),
                teardowns: AtomicUsize::new(0),
                chat,
                write_timeout,
            }),
        }
    }

    /// Websocket address with the key masked.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.state.load()
    }

    /// Whether heartbeat and pump may still run.
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Stop signal observed by the heartbeat and the pump.
    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Resolves once teardown has begun.
    pub async fn closed(&self) {
        self.inner.cancel.cancelled().await;
    }

    /// How many times the teardown body ran. Stays at 1 after any number of
    /// `close` calls.
    pub fn teardown_count(&self) -> usize {
        self.inner.teardowns.load(Ordering::SeqCst)
    }

    /// Write a raw text frame, bounded by the write timeout.
    pub async fn send_text(&self, text: &str) -> Result<()> {
        if !self.is_open() {
            return Err(ChatError::Closed);
        }
        let mut sink = self.inner.sink.lock().await;
        if !self.is_open() {
            return Err(ChatError::Closed);
        }

        match timeout(
            self.inner.write_timeout,
            sink.send(Message::Text(text.to_owned().into())),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => Err(ChatError::Closed),
            Ok(Err(e)) => Err(ChatError::Send {
                message: e.to_string(),
            }),
            Err(_) => Err(ChatError::Send {
                message: format!(
                    "write timed out after {}ms",
                    self.inner.write_timeout.as_millis()
                ),
            }),
        }
    }

    /// Post a chat message through the HTTP endpoint.
    pub async fn send_message(&self, content: &str) -> Result<()> {
        if !self.is_open() {
            return Err(ChatError::Closed);
        }
        self.inner.chat.send_message(content).await?;
        Ok(())
    }

    /// Stop heartbeat and pump, then close the write half.
    ///
    /// Safe to call any number of times from any task; the teardown runs once
    /// and every caller gets its result. Teardown is claimed before the first
    /// await and finishes on its own task, so dropping a `close` future midway
    /// does not let a later call run it again.
    pub async fn close(&self) -> Result<()> {
        let mut done = self.inner.close_result.subscribe();
        if !self.inner.closing.swap(true, Ordering::AcqRel) {
            self.inner.begin_teardown();
            let inner = Arc::clone(&self.inner);
            let _ = tokio::spawn(async move {
                let result = inner.finish_teardown().await;
                let _ = inner.close_result.send_replace(Some(result));
            });
        }

        let result = done
            .wait_for(Option::is_some)
            .await
            .map_err(|_| ChatError::Close {
                message: "teardown task dropped".to_string(),
            })?
            .clone();
        match result {
            Some(Ok(())) | None => Ok(()),
            Some(Err(message)) => Err(ChatError::Close { message }),
        }
    }
}

impl fmt::Debug for RealtimeConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeConnection")
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn begin_teardown(&self) {
        let _ = self.teardowns.fetch_add(1, Ordering::SeqCst);
        self.state.store(ConnectionState::Closing);
        self.cancel.cancel();
    }

    async fn finish_teardown(&self) -> std::result::Result<(), String> {
        let result = {
            let mut sink = self.sink.lock().await;
            match timeout(self.write_timeout, sink.close()).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) if is_already_closed(&e) => {
                    debug!(error = %e, "transport already closed");
                    Ok(())
                }
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!(
                    "close timed out after {}ms",
                    self.write_timeout.as_millis()
                )),
            }
        };

        self.state.store(ConnectionState::Closed);
        match &result {
            Ok(()) => info!(url = %self.url, "chat connection closed"),
            Err(e) => warn!(url = %self.url, error = %e, "chat connection closed with error"),
        }
        result
    }
}

fn is_already_closed(err: &WsError) -> bool {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => true,
        WsError::Io(e) => matches!(
            e.kind(),
            ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
        ),
        _ => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

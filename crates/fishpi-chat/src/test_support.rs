//! In-process websocket server for unit tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use fishpi_client::{ChatApi, DispatcherConfig, RequestDispatcher};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, connect_async};

use crate::connection::{RealtimeConnection, StateCell, WsSource};
use crate::types::ConnectionState;

pub(crate) enum ServerCommand {
    Text(String),
    Close,
    Drop,
}

pub(crate) struct TestServer {
    pub addr: SocketAddr,
    received: mpsc::UnboundedReceiver<String>,
    commands: mpsc::UnboundedSender<ServerCommand>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Next text frame the server received, or `None` after two seconds.
    pub async fn next_text(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(2), self.received.recv())
            .await
            .ok()
            .flatten()
    }

    pub fn push(&self, text: &str) {
        let _ = self.commands.send(ServerCommand::Text(text.to_string()));
    }

    pub fn close(&self) {
        let _ = self.commands.send(ServerCommand::Close);
    }

    pub fn drop_connection(&self) {
        let _ = self.commands.send(ServerCommand::Drop);
    }
}

/// Accept one websocket client, record its text frames, and push frames on command.
pub(crate) async fn spawn_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (received_tx, received) = mpsc::unbounded_channel();
    let (commands, mut command_rx) = mpsc::unbounded_channel();

    drop(tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        let (mut tx, mut rx) = ws.split();
        loop {
            tokio::select! {
                msg = rx.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        let _ = received_tx.send(text.to_string());
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
                cmd = command_rx.recv() => match cmd {
                    Some(ServerCommand::Text(text)) => {
                        let _ = tx.send(Message::text(text)).await;
                    }
                    Some(ServerCommand::Close) => {
                        let _ = tx.send(Message::Close(None)).await;
                    }
                    Some(ServerCommand::Drop) | None => return,
                },
            }
        }
    }));

    TestServer {
        addr,
        received,
        commands,
    }
}

pub(crate) fn chat_api() -> ChatApi {
    ChatApi::new(
        Arc::new(RequestDispatcher::new(DispatcherConfig::default())),
        "test",
    )
}

/// Open a client connection to `server` already in the `Open` state.
pub(crate) async fn connect(server: &TestServer) -> (RealtimeConnection, WsSource) {
    let (ws, _) = connect_async(server.url()).await.unwrap();
    let (sink, source) = ws.split();
    let state = Arc::new(StateCell::new(ConnectionState::Open));
    let conn = RealtimeConnection::new(
        sink,
        state,
        chat_api(),
        server.url(),
        Duration::from_secs(2),
    );
    (conn, source)
}

//! Inbound frame loop: classify, forward, hand rewards to the coordinator.

use std::sync::Arc;

use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classifier::classify;
use crate::connection::{RealtimeConnection, WsSource};
use crate::events::EventSender;
use crate::reward::RewardClaimCoordinator;
use crate::types::{ChatEvent, InboundEvent};

/// Why the pump returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpExit {
    /// The stop signal fired.
    Cancelled,
    /// The peer closed the transport.
    PeerClosed(String),
    /// Reading failed.
    ReadFailed(String),
}

/// Read frames until the stop signal fires or the transport ends.
///
/// When the transport ends on its own the pump reports
/// [`ChatEvent::Disconnected`] and closes the connection itself.
pub async fn run_pump(
    mut source: WsSource,
    connection: RealtimeConnection,
    coordinator: Arc<RewardClaimCoordinator>,
    events: EventSender,
    cancel: CancellationToken,
) -> PumpExit {
    let exit = loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => break PumpExit::Cancelled,
            frame = source.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                dispatch(classify(text.as_str()), &coordinator, &events);
            }
            Some(Ok(Message::Close(frame))) => {
                let reason = frame.map_or_else(
                    || "closed by peer".to_string(),
                    |f| format!("closed by peer ({}): {}", u16::from(f.code), f.reason.as_str()),
                );
                break PumpExit::PeerClosed(reason);
            }
            Some(Ok(other)) => {
                debug!(kind = frame_kind(&other), "ignoring non-text frame");
            }
            Some(Err(e)) => break PumpExit::ReadFailed(e.to_string()),
            None => break PumpExit::PeerClosed("stream ended".to_string()),
        }
    };

    match &exit {
        PumpExit::Cancelled => debug!("pump stopped"),
        PumpExit::PeerClosed(reason) => {
            info!(%reason, "chat connection ended by peer");
            let _ = events.send(ChatEvent::Disconnected {
                reason: reason.clone(),
                clean: true,
            });
        }
        PumpExit::ReadFailed(reason) => {
            warn!(%reason, "chat read failed");
            let _ = events.send(ChatEvent::Disconnected {
                reason: reason.clone(),
                clean: false,
            });
        }
    }

    if exit != PumpExit::Cancelled {
        if let Err(e) = connection.close().await {
            warn!(error = %e, "close after disconnect failed");
        }
    }
    exit
}

fn dispatch(
    event: InboundEvent,
    coordinator: &RewardClaimCoordinator,
    events: &EventSender,
) {
    match &event {
        InboundEvent::Reward(reward) => {
            info!(
                id = %reward.id,
                author = %reward.author,
                kind = %reward.kind,
                amount = reward.total_amount,
                "reward announced"
            );
            let _ = events.send(ChatEvent::Message(event.clone()));
            // The claim runs detached; its outcome comes back on `events`.
            let _ = coordinator.on_event(reward);
            return;
        }
        InboundEvent::MalformedReward { id, error, .. } => {
            warn!(%id, %error, "reward payload did not decode");
        }
        InboundEvent::Undecodable { raw, error } => {
            debug!(len = raw.len(), %error, "frame is not a chat envelope");
        }
        InboundEvent::Plain(_) | InboundEvent::Ignorable => {}
    }
    let _ = events.send(ChatEvent::Message(event));
}

fn frame_kind(message: &Message) -> &'static str {
    match message {
        Message::Text(_) => "text",
        Message::Binary(_) => "binary",
        Message::Ping(_) => "ping",
        Message::Pong(_) => "pong",
        Message::Close(_) => "close",
        Message::Frame(_) => "frame",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

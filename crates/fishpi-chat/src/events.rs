//! Bounded delivery of [`ChatEvent`]s to the session owner.
//!
//! Producers never wait on the receiver. When the buffer is full the event is
//! dropped, counted, and logged, so a receiver that is never drained costs a
//! fixed amount of memory.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tracing::{debug, warn};

use crate::types::ChatEvent;

/// Create a sender and receiver holding at most `capacity` undelivered events.
pub fn event_channel(capacity: usize) -> (EventSender, Receiver<ChatEvent>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let sender = EventSender {
        tx,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (sender, rx)
}

/// Non-blocking producer side of the event channel. Clones share one drop counter.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: Sender<ChatEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventSender {
    /// Queue `event`. Returns `false` when it was dropped.
    pub fn send(&self, event: ChatEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(dropped, event = event.label(), "event receiver is full, dropping event");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("event receiver gone");
                false
            }
        }
    }

    /// Events dropped because the receiver fell behind.
    pub fn drop_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InboundEvent;
    use fishpi_core::capture_logs;
    use tracing::Level;

    fn ignorable() -> ChatEvent {
        ChatEvent::Message(InboundEvent::Ignorable)
    }

    #[tokio::test]
    async fn delivers_in_order() {
        let (tx, mut rx) = event_channel(4);
        assert!(tx.send(ignorable()));
        assert!(tx.send(ChatEvent::Disconnected {
            reason: "bye".into(),
            clean: true,
        }));
        assert_eq!(rx.recv().await, Some(ignorable()));
        assert!(matches!(rx.recv().await, Some(ChatEvent::Disconnected { .. })));
    }

    #[tokio::test]
    async fn full_buffer_drops_instead_of_growing() {
        let (logs, _guard) = capture_logs();
        let (tx, mut rx) = event_channel(2);

        let accepted = (0..10).filter(|_| tx.send(ignorable())).count();
        assert_eq!(accepted, 2);
        assert_eq!(tx.drop_count(), 8);
        assert!(logs.has_event(Level::WARN, "event receiver is full"));

        let _ = rx.recv().await;
        assert!(tx.clone().send(ignorable()));
        assert_eq!(tx.drop_count(), 8);
    }

    #[tokio::test]
    async fn dropped_receiver_is_not_counted() {
        let (tx, rx) = event_channel(1);
        drop(rx);
        assert!(!tx.send(ignorable()));
        assert_eq!(tx.drop_count(), 0);
    }
}

//! Client keep-alive frames.

use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::connection::RealtimeConnection;

/// Outcome of the heartbeat loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatResult {
    /// The connection is closing.
    Cancelled,
    /// A heartbeat write failed or timed out. The loop does not retry.
    SendFailed(String),
    /// Interval zero or empty payload; the loop never ran.
    Disabled,
}

/// Send `payload` on `connection` every `interval` until cancelled.
///
/// The first frame goes out one full interval after the call. Each write is
/// bounded by the connection's write timeout.
pub async fn run_heartbeat(
    connection: RealtimeConnection,
    interval: Duration,
    payload: String,
    cancel: CancellationToken,
) -> HeartbeatResult {
    if interval.is_zero() || payload.is_empty() {
        debug!("heartbeat disabled");
        return HeartbeatResult::Disabled;
    }

    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return HeartbeatResult::Cancelled;
            }
            _ = ticker.tick() => {
                if let Err(e) = connection.send_text(&payload).await {
                    if cancel.is_cancelled() {
                        return HeartbeatResult::Cancelled;
                    }
                    warn!(error = %e, "heartbeat failed, stopping keep-alive");
                    return HeartbeatResult::SendFailed(e.to_string());
                }
                debug!("heartbeat sent");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

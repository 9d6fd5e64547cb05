//! Chat engine error types.

use fishpi_client::ClientError;

/// Errors surfaced by the realtime session and connection.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// No token is set, or the remote rejected it.
    #[error("authentication failed: {message}")]
    Auth {
        /// Reason.
        message: String,
    },

    /// The remote refused an HTTP call (non-zero code or error status).
    #[error("request failed ({status}): {body}")]
    RequestFailed {
        /// HTTP status or envelope code.
        status: i32,
        /// Response body or envelope message.
        body: String,
    },

    /// Any other HTTP-side failure.
    #[error(transparent)]
    Client(ClientError),

    /// The websocket handshake failed or timed out.
    #[error("failed to connect to {url}: {message}")]
    Connect {
        /// Target address, token masked.
        url: String,
        /// Failure description.
        message: String,
    },

    /// The connection is closing or closed.
    #[error("connection is closed")]
    Closed,

    /// Writing a frame failed.
    #[error("failed to send frame: {message}")]
    Send {
        /// Failure description.
        message: String,
    },

    /// Tearing down the transport failed. Every `close` caller sees the same error.
    #[error("failed to close connection: {message}")]
    Close {
        /// Failure description.
        message: String,
    },

    /// The operation is not allowed in the current lifecycle state.
    #[error("invalid state: expected {expected}, was {actual}")]
    InvalidState {
        /// State the operation requires.
        expected: &'static str,
        /// State actually observed.
        actual: &'static str,
    },
}

impl From<ClientError> for ChatError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Auth { message } => Self::Auth { message },
            ClientError::RequestFailed { status, body } => Self::RequestFailed { status, body },
            other => Self::Client(other),
        }
    }
}

/// Result type for chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn auth_surfaces_directly() {
        let err = ChatError::from(ClientError::missing_token());
        assert_matches!(err, ChatError::Auth { .. });
    }

    #[test]
    fn request_failed_surfaces_directly() {
        let err = ChatError::from(ClientError::RequestFailed {
            status: -1,
            body: "banned".to_string(),
        });
        assert_matches!(err, ChatError::RequestFailed { status: -1, .. });
    }

    #[test]
    fn other_client_errors_are_wrapped() {
        let err = ChatError::from(ClientError::InvalidRequest("x".to_string()));
        assert_matches!(err, ChatError::Client(ClientError::InvalidRequest(_)));
        assert_eq!(err.to_string(), "invalid request: x");
    }

    #[test]
    fn invalid_state_display() {
        let err = ChatError::InvalidState {
            expected: "idle",
            actual: "open",
        };
        assert_eq!(err.to_string(), "invalid state: expected idle, was open");
    }
}

//! Client error types.

/// Errors returned by the dispatcher and the endpoint wrappers built on it.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No token is set, or the remote rejected the credentials.
    #[error("authentication failed: {message}")]
    Auth {
        /// Reason reported by the remote, or a local description.
        message: String,
    },

    /// Non-2xx HTTP status, or a non-zero envelope `code`.
    #[error("request failed ({status}): {body}")]
    RequestFailed {
        /// HTTP status or envelope code.
        status: i32,
        /// Response body or envelope message.
        body: String,
    },

    /// Network-level failure (DNS, connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON shape.
    #[error("failed to decode response: {reason}")]
    DecodeFailed {
        /// Raw response body.
        raw: String,
        /// Decoder message.
        reason: String,
    },

    /// The request could not be built (bad body shape, bad argument).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// The error returned for authenticated calls made without a token.
    pub fn missing_token() -> Self {
        Self::Auth {
            message: "no session token set, log in first".to_string(),
        }
    }

    /// Whether this is an [`ClientError::Auth`] error.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failed_display() {
        let err = ClientError::RequestFailed {
            status: -1,
            body: "wrong password".to_string(),
        };
        assert_eq!(err.to_string(), "request failed (-1): wrong password");
    }

    #[test]
    fn missing_token_is_auth() {
        let err = ClientError::missing_token();
        assert!(err.is_auth());
        assert!(err.to_string().contains("log in first"));
    }

    #[test]
    fn decode_failed_display_omits_raw() {
        let err = ClientError::DecodeFailed {
            raw: "<html>".to_string(),
            reason: "expected value at line 1 column 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to decode response: expected value at line 1 column 1"
        );
    }

    #[test]
    fn invalid_request_is_not_auth() {
        let err = ClientError::InvalidRequest("body must be an object".to_string());
        assert!(!err.is_auth());
    }
}

//! Credential helpers.
//!
//! The login endpoint expects the password as a lowercase hex MD5 digest. This
//! is a wire format, not a protection: never store or compare passwords with it.

use md5::{Digest, Md5};

/// Hex-encoded MD5 of `secret`, as the login endpoint expects it.
pub fn legacy_password_digest(secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Shorten a token for logs: the first 8 characters followed by `...`.
///
/// Tokens of 8 characters or fewer are fully masked.
pub fn mask_token(token: &str) -> String {
    match token.char_indices().nth(8) {
        Some((idx, _)) => format!("{}...", &token[..idx]),
        None => "***".to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

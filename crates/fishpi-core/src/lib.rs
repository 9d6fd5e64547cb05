//! # fishpi-core
//!
//! Foundation pieces shared by every FishPi crate:
//!
//! - **Constants**: default endpoints, intervals, and wire literals
//! - **Credentials**: the legacy password digest and token masking for logs
//! - **Logging**: `tracing` subscriber setup and an in-memory capture layer for tests

#![deny(unsafe_code)]

pub mod constants;
pub mod credentials;
pub mod logging;

pub use credentials::{legacy_password_digest, mask_token};
pub use logging::{CapturedLogs, capture_logs, init_subscriber};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _digest = legacy_password_digest("x");
        let _masked = mask_token("abcdefghij");
        let _interval = constants::MIN_REQUEST_INTERVAL;
    }
}

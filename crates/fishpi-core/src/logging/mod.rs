//! Structured logging with `tracing`.
//!
//! All crates log through `tracing` macros with structured fields (path,
//! event id, gesture, ...). The binary installs a compact stderr subscriber via
//! [`init_subscriber`]; tests install a thread-local capture layer via
//! [`capture_logs`] and assert on what was reported.

pub mod test_utils;

pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};

/// Initialize the global tracing subscriber with stderr output.
///
/// `RUST_LOG` wins over `level` when set. Subsequent calls are no-ops.
///
/// # Arguments
///
/// * `level` - Minimum log level to display, e.g. `"warn"` or `"fishpi_chat=debug"`.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init fails quietly if a global subscriber is already installed
    let _ = subscriber.try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! # fishpi-settings
//!
//! Configuration for the FishPi client, loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`FishpiSettings::default()`]
//! 2. **User file**: `~/.fishpi/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `FISHPI_*` overrides (highest priority)
//!
//! The crate only reads configuration; it never writes the settings file.
//!
//! # Usage
//!
//! ```no_run
//! use fishpi_settings::load_settings;
//!
//! let settings = load_settings().unwrap_or_default();
//! println!("API host: {}", settings.api.base_url);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{ApiSettings, ChatSettings, FishpiSettings, LoggingSettings, RewardSettings};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

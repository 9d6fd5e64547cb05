//! Settings loading: compiled defaults, then `~/.fishpi/settings.json`, then
//! `FISHPI_*` environment overrides, then validation.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::FishpiSettings;

const MAX_OVERRIDE_MS: u64 = 3_600_000;

/// Resolve the path to the settings file (`~/.fishpi/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".fishpi").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<FishpiSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<FishpiSettings> {
    let mut settings = read_layers(path)?;
    apply_env_overrides(&mut settings);
    validate(settings)
}

fn read_layers(path: &Path) -> Result<FishpiSettings> {
    let defaults = serde_json::to_value(FishpiSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

fn validate(mut settings: FishpiSettings) -> Result<FishpiSettings> {
    let base = settings.api.base_url.trim().trim_end_matches('/').to_string();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(SettingsError::InvalidValue(format!(
            "api.baseUrl must be an http(s) URL, got {:?}",
            settings.api.base_url
        )));
    }
    settings.api.base_url = base;

    if settings.api.user_agent.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "api.userAgent must not be empty".to_string(),
        ));
    }

    if settings.api.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
        settings.api.api_key = None;
    }

    Ok(settings)
}

/// Overlay a settings file onto the compiled defaults.
///
/// Sections merge key by key; a scalar or array in the file replaces the
/// default, and a `null` keeps it.
pub fn deep_merge(defaults: Value, file: Value) -> Value {
    match (defaults, file) {
        (Value::Object(mut merged), Value::Object(file)) => {
            for (key, value) in file.into_iter().filter(|(_, v)| !v.is_null()) {
                let value = match merged.remove(&key) {
                    Some(section) => deep_merge(section, value),
                    None => value,
                };
                let _ = merged.insert(key, value);
            }
            Value::Object(merged)
        }
        (defaults, Value::Null) => defaults,
        (_, file) => file,
    }
}

/// Apply `FISHPI_*` overrides from the process environment.
///
/// Unparsable values are logged and ignored.
pub fn apply_env_overrides(settings: &mut FishpiSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

fn apply_overrides(settings: &mut FishpiSettings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let millis = |name: &str| var(name).and_then(|v| parsed(name, &v, parse_millis));
    let switch = |name: &str| var(name).and_then(|v| parsed(name, &v, parse_switch));

    if let Some(v) = var("FISHPI_BASE_URL") {
        settings.api.base_url = v;
    }
    if let Some(v) = var("FISHPI_USER_AGENT") {
        settings.api.user_agent = v;
    }
    if let Some(v) = var("FISHPI_API_KEY") {
        settings.api.api_key = Some(v);
    }
    if let Some(v) = millis("FISHPI_MIN_REQUEST_INTERVAL_MS") {
        settings.api.min_request_interval_ms = v;
    }
    if let Some(v) = millis("FISHPI_HEARTBEAT_INTERVAL_MS") {
        settings.chat.heartbeat_interval_ms = v;
    }
    if let Some(v) = switch("FISHPI_AUTO_CLAIM") {
        settings.rewards.auto_claim = v;
    }
    if let Some(v) = millis("FISHPI_CLAIM_COOLDOWN_MS") {
        settings.rewards.cooldown_ms = v;
    }
    if let Some(v) = var("FISHPI_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

fn parsed<T>(name: &str, raw: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
    let value = parse(raw);
    if value.is_none() {
        warn!(var = name, value = raw, "ignoring unparsable override");
    }
    value
}

/// On/off switch: `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`.
fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Milliseconds, capped at one hour.
fn parse_millis(raw: &str) -> Option<u64> {
    raw.trim().parse().ok().filter(|ms| *ms <= MAX_OVERRIDE_MS)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

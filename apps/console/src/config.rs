use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use client_core::backend::{BackendConfig, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use listing::StockThresholds;
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub api_base_url: String,
    pub credential_path: PathBuf,
    pub request_timeout_secs: u64,
    pub alert_poll_secs: u64,
    pub low_stock_threshold: i64,
    pub critical_stock_threshold: i64,
}

impl Default for Settings {
    fn default() -> Self {
        let thresholds = StockThresholds::default();
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            credential_path: PathBuf::from(".inventory/credential.json"),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            alert_poll_secs: client_core::DEFAULT_ALERT_POLL_INTERVAL.as_secs(),
            low_stock_threshold: thresholds.low,
            critical_stock_threshold: thresholds.critical,
        }
    }
}

impl Settings {
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.api_base_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }

    pub fn alert_poll_interval(&self) -> Duration {
        Duration::from_secs(self.alert_poll_secs.max(1))
    }

    pub fn thresholds(&self) -> StockThresholds {
        StockThresholds {
            low: self.low_stock_threshold,
            critical: self.critical_stock_threshold,
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_file(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// A missing or unreadable file leaves the defaults in place.
pub fn load_settings_file(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let file = fs::read_to_string(path).ok();
    load_settings_with(file.as_deref(), env)
}

/// Defaults, then the settings file, then the environment. Values that do
/// not parse are ignored.
pub fn load_settings_with(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) {
            apply(&mut settings, |key| file_cfg.get(key).and_then(scalar_text));
        }
    }

    if let Some(v) = env("INVENTORY_API_BASE_URL") {
        settings.api_base_url = v;
    }
    apply(&mut settings, |key| env(&format!("APP__{}", key.to_ascii_uppercase())));

    settings
}

fn scalar_text(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(n) => Some(n.to_string()),
        toml::Value::Float(n) => Some(n.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

fn apply(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("api_base_url") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("credential_path") {
        settings.credential_path = PathBuf::from(v);
    }
    if let Some(parsed) = lookup("request_timeout_secs").and_then(|v| v.trim().parse().ok()) {
        settings.request_timeout_secs = parsed;
    }
    if let Some(parsed) = lookup("alert_poll_secs").and_then(|v| v.trim().parse().ok()) {
        settings.alert_poll_secs = parsed;
    }
    if let Some(parsed) = lookup("low_stock_threshold").and_then(|v| v.trim().parse().ok()) {
        settings.low_stock_threshold = parsed;
    }
    if let Some(parsed) = lookup("critical_stock_threshold").and_then(|v| v.trim().parse().ok()) {
        settings.critical_stock_threshold = parsed;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

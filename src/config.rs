//! Runtime configuration.
//!
//! Every tunable the client uses (endpoint URLs, poll interval, timeouts)
//! is injected from here instead of living in module constants, so tests
//! can run against fake endpoints and a paused clock.

use crate::error::AppError;
use crate::services::review_queue::RollbackPolicy;
use crate::services::talynk_client::TalynkClientConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default review queue refresh interval in seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default duration of the selection highlight in milliseconds.
pub const DEFAULT_HIGHLIGHT_MS: u64 = 2000;

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the Talynk API (e.g. `http://localhost:3000`).
    pub api_base_url: String,

    /// Base URL used to resolve relative media references.
    pub media_base_url: String,

    /// Review queue poll interval in seconds.
    pub refresh_interval_secs: u64,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,

    /// How long a selected post stays highlighted, in milliseconds.
    pub highlight_duration_ms: u64,

    /// Restore an optimistically removed post when its decision fails.
    pub rollback_on_failure: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            media_base_url: "http://localhost:3000".to_string(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            highlight_duration_ms: DEFAULT_HIGHLIGHT_MS,
            rollback_on_failure: false,
        }
    }
}

/// Per-engine settings derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub refresh_interval: Duration,
    pub highlight_duration: Duration,
    pub rollback: RollbackPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        AppConfig::default().queue_config()
    }
}

impl AppConfig {
    /// Load from `TALYNK_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| AppError::config(format!("Invalid config {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = Self::default();

        if let Some(url) = lookup("TALYNK_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Some(url) = lookup("TALYNK_MEDIA_BASE_URL") {
            config.media_base_url = url;
        }
        if let Some(v) = lookup("TALYNK_REFRESH_INTERVAL_SECS") {
            config.refresh_interval_secs = parse_var("TALYNK_REFRESH_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("TALYNK_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_var("TALYNK_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("TALYNK_HIGHLIGHT_MS") {
            config.highlight_duration_ms = parse_var("TALYNK_HIGHLIGHT_MS", &v)?;
        }
        if let Some(v) = lookup("TALYNK_ROLLBACK_ON_FAILURE") {
            config.rollback_on_failure = parse_var("TALYNK_ROLLBACK_ON_FAILURE", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the client cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, url) in [
            ("api_base_url", &self.api_base_url),
            ("media_base_url", &self.media_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AppError::invalid_input_field(
                    format!("{} must be an http(s) URL, got '{}'", field, url),
                    field,
                ));
            }
        }
        if self.refresh_interval_secs == 0 {
            return Err(AppError::invalid_input_field(
                "refresh interval must be at least one second",
                "refresh_interval_secs",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::invalid_input_field(
                "request timeout must be at least one second",
                "request_timeout_secs",
            ));
        }
        Ok(())
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            refresh_interval: Duration::from_secs(self.refresh_interval_secs),
            highlight_duration: Duration::from_millis(self.highlight_duration_ms),
            rollback: if self.rollback_on_failure {
                RollbackPolicy::Restore
            } else {
                RollbackPolicy::KeepRemoved
            },
        }
    }

    pub fn client_config(&self) -> TalynkClientConfig {
        TalynkClientConfig {
            base_url: self.api_base_url.clone(),
            timeout_secs: self.request_timeout_secs,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("{}: {}", key, e)))
}

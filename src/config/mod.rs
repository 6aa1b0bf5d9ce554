//! Run configuration.
//!
//! One JSON document configures the orchestrator and the settings the
//! external feed client reads. Every field has a default so a partial
//! document is valid.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::ApiKey;

/// Upper bound on `max_workers`.
pub const MAX_WORKERS_LIMIT: usize = 64;

fn default_epoch_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn default_max_workers() -> usize {
    4
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Watermark floor for devices with no stored data.
    #[serde(default = "default_epoch_start")]
    pub epoch_start: DateTime<Utc>,

    /// Devices processed concurrently.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    #[serde(default)]
    pub feed: FeedSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            epoch_start: default_epoch_start(),
            max_workers: default_max_workers(),
            feed: FeedSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        if self.max_workers == 0 {
            self.max_workers = 1;
        }
        self.max_workers = self.max_workers.min(MAX_WORKERS_LIMIT);

        if self.feed.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "feed.base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.logging.level_filter().is_none() {
            return Err(ConfigError::Invalid {
                field: "logging.level",
                reason: format!("unknown level {:?}", self.logging.level),
            });
        }
        Ok(self)
    }
}

/// Settings consumed by the external feed client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
    /// Maximum entries per request.
    pub results_limit: u32,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.thingspeak.com".to_string(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_delay_secs: 2,
            results_limit: 8000,
        }
    }
}

impl FeedSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// URL of a single field's feed.
    pub fn fetch_url(&self, channel_id: u64, field_id: u32) -> String {
        format!(
            "{}/channels/{}/fields/{}.json",
            self.base_url.trim_end_matches('/'),
            channel_id,
            field_id
        )
    }

    /// Query parameters for a fetch of entries newer than `since`.
    pub fn query(&self, api_key: &ApiKey, since: DateTime<Utc>) -> Vec<(&'static str, String)> {
        vec![
            ("api_key", api_key.expose().to_string()),
            ("results", self.results_limit.to_string()),
            ("start", since.to_rfc3339()),
        ]
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingSettings {
    pub fn level_filter(&self) -> Option<log::LevelFilter> {
        self.level.trim().parse().ok()
    }
}

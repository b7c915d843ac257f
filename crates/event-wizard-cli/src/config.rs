//! Configuration for the event wizard
//!
//! Defaults are overridden by environment variables, then validated.

use event_wizard_core::{fields, FormValues, GeoLocation, SubmissionDefaults};
use event_wizard_http::{DEFAULT_CREATE_PATH, DEFAULT_PRESIGN_PATH};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is missing
    #[error("{0} is required")]
    Missing(&'static str),

    /// A setting has an unusable value
    #[error("Invalid {key}: {reason}")]
    Invalid {
        /// Environment variable name
        key: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Wizard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Base URL of the event backend
    pub api_url: String,

    /// Path of the presign endpoint
    #[serde(default = "default_presign_path")]
    pub presign_path: String,

    /// Path of the create endpoint
    #[serde(default = "default_create_path")]
    pub create_path: String,

    /// Timeout for each HTTP call, in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Fixed record fields sent on submission
    #[serde(default)]
    pub defaults: SubmissionDefaults,

    /// Identifier of the user creating the event
    pub owner_id: String,

    /// End date pre-filled on the dates step
    #[serde(default)]
    pub default_ending_date: Option<String>,

    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_presign_path() -> String {
    DEFAULT_PRESIGN_PATH.to_string()
}

fn default_create_path() -> String {
    DEFAULT_CREATE_PATH.to_string()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            presign_path: default_presign_path(),
            create_path: default_create_path(),
            http_timeout_secs: default_http_timeout(),
            defaults: SubmissionDefaults::default(),
            owner_id: String::new(),
            default_ending_date: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl WizardConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Start with defaults
        let mut config = Self::default();

        if let Some(api_url) = lookup("EVENT_API_URL") {
            config.api_url = api_url.trim().to_string();
        }

        if let Some(path) = lookup("EVENT_PRESIGN_PATH") {
            config.presign_path = path;
        }

        if let Some(path) = lookup("EVENT_CREATE_PATH") {
            config.create_path = path;
        }

        if let Some(timeout) = lookup("EVENT_HTTP_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout_secs = secs,
                _ => warn!("Invalid EVENT_HTTP_TIMEOUT_SECS value: {}", timeout),
            }
        }

        if let Some(category) = lookup("EVENT_CATEGORY_ID") {
            if let Ok(id) = category.parse::<u32>() {
                config.defaults.category_id = id;
            } else {
                warn!("Invalid EVENT_CATEGORY_ID value: {}", category);
            }
        }

        if let Some(latitude) = lookup("EVENT_DEFAULT_LATITUDE") {
            config.defaults.location.latitude = latitude;
        }

        if let Some(longitude) = lookup("EVENT_DEFAULT_LONGITUDE") {
            config.defaults.location.longitude = longitude;
        }

        if let Some(owner_id) = lookup("EVENT_OWNER_ID") {
            config.owner_id = owner_id.trim().to_string();
        }

        if let Some(ending_date) = lookup("EVENT_DEFAULT_ENDING_DATE") {
            if !ending_date.trim().is_empty() {
                config.default_ending_date = Some(ending_date);
            }
        }

        if let Some(log_level) = lookup("LOG_LEVEL") {
            config.log_level = log_level;
        }

        if let Some(format) = lookup("LOG_FORMAT") {
            match format.parse::<LogFormat>() {
                Ok(format) => config.log_format = format,
                Err(_) => warn!("Invalid LOG_FORMAT value: {}, using pretty", format),
            }
        }

        config.validate()?;

        info!("Loaded wizard configuration");
        Ok(config)
    }

    /// Check required settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.is_empty() {
            return Err(ConfigError::Missing("EVENT_API_URL"));
        }

        let url = Url::parse(&self.api_url).map_err(|e| ConfigError::Invalid {
            key: "EVENT_API_URL",
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "EVENT_API_URL",
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.owner_id.is_empty() {
            return Err(ConfigError::Missing("EVENT_OWNER_ID"));
        }

        if self.defaults.location == GeoLocation::default() {
            warn!("No event location configured, placeholder coordinates will be sent");
        }

        Ok(())
    }

    /// Timeout for each HTTP call
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Values to seed the wizard with
    pub fn initial_values(&self) -> FormValues {
        let mut values = FormValues::new();
        if let Some(ending_date) = &self.default_ending_date {
            values.insert(fields::ENDING_DATE, ending_date.as_str());
        }
        values
    }
}

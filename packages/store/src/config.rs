//! # Application configuration: `geoquest.toml`
//!
//! Every tunable of the GeoQuest core lives in one TOML document. The `api`
//! crate layers environment overrides on top (see `api::settings`); this module
//! only defines the shape and the defaults.
//!
//! ```toml
//! [store]
//! backend = "file"        # "memory" or "file"
//! path = ""               # empty = platform data dir
//!
//! [query]
//! default_limit = 100
//! max_limit = 500
//!
//! [auth]
//! min_password_length = 6
//! google_client_id = ""
//!
//! [logbook]
//! week_start = "monday"
//!
//! [tracking]
//! interval_ms = 5000
//! fastest_interval_ms = 2000
//!
//! [issues]
//! base_url = "https://your-api-url.com/api/"
//! timeout_secs = 30
//! ```
//!
//! All structs derive or implement `Default`, so a missing or empty file is
//! the default configuration.

use std::path::PathBuf;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoQuestConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logbook: LogbookConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub issues: IssuesConfig,
}

/// Which [`crate::DocumentStore`] backs the repositories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    File,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Base directory of the file store. Empty means the platform data dir.
    #[serde(default)]
    pub path: String,
}

impl StoreConfig {
    /// Resolved base directory for [`crate::FileStore`].
    pub fn data_dir(&self) -> PathBuf {
        if self.path.trim().is_empty() {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("geoquest")
        } else {
            PathBuf::from(&self.path)
        }
    }
}

/// Bounds applied to every list query.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

fn default_limit() -> usize {
    100
}

fn default_max_limit() -> usize {
    500
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    /// OAuth client id that Google identity tokens must be issued for.
    #[serde(default)]
    pub google_client_id: String,
}

fn default_min_password_length() -> usize {
    6
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            google_client_id: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogbookConfig {
    /// First day of the calendar week for the "This week" filter.
    #[serde(default = "default_week_start")]
    pub week_start: String,
}

fn default_week_start() -> String {
    "monday".to_string()
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            week_start: default_week_start(),
        }
    }
}

impl LogbookConfig {
    pub fn week_start(&self) -> Result<Weekday, StoreError> {
        self.week_start
            .parse::<Weekday>()
            .map_err(|_| StoreError::InvalidDate(format!("unknown weekday: {}", self.week_start)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Requested fix cadence.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Fixes closer together than this are dropped.
    #[serde(default = "default_fastest_interval_ms")]
    pub fastest_interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_fastest_interval_ms() -> u64 {
    2000
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            fastest_interval_ms: default_fastest_interval_ms(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IssuesConfig {
    #[serde(default = "default_issues_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_issues_base_url() -> String {
    "https://your-api-url.com/api/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for IssuesConfig {
    fn default() -> Self {
        Self {
            base_url: default_issues_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GeoQuestConfig {
    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "geoquest.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

//! Configuration types
//!
//! Layering: built-in defaults, then an optional TOML file, then `BQCI_*`
//! environment variables. Command-line flags are applied last by the binaries.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// DEFAULTS
// ============================================================================

/// Delay between two polls of the same job.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Per-job budget before a job is reported as timed out.
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 1_800;

/// File extension picked up when loading a directory of tests.
pub const DEFAULT_SQL_EXTENSION: &str = "sql";

pub const DEFAULT_BIGQUERY_API_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// DUPLICATE POLICY
// ============================================================================

/// What the loader does when two files produce the same test name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Later file wins (files are visited in name order).
    #[default]
    Overwrite,
    /// Abort loading.
    Error,
    /// Keep both, suffixing the later name with `__2`, `__3`, ...
    Disambiguate,
}

impl FromStr for DuplicatePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "error" => Ok(Self::Error),
            "disambiguate" => Ok(Self::Disambiguate),
            other => Err(ConfigError::InvalidValue {
                field: "on_duplicate".to_string(),
                value: other.to_string(),
                reason: "expected one of overwrite, error, disambiguate".to_string(),
            }),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Overwrite => "overwrite",
            Self::Error => "error",
            Self::Disambiguate => "disambiguate",
        };
        f.write_str(s)
    }
}

// ============================================================================
// HARNESS CONFIG
// ============================================================================

/// Settings for loading and running a test suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub poll_interval_ms: u64,
    pub job_timeout_secs: u64,
    /// Maximum number of jobs in flight. `None` submits everything at once.
    pub max_concurrency: Option<usize>,
    pub on_duplicate: DuplicatePolicy,
    pub sql_extension: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            job_timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
            max_concurrency: None,
            on_duplicate: DuplicatePolicy::default(),
            sql_extension: DEFAULT_SQL_EXTENSION.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Defaults, overlaid with an optional TOML file and then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply environment overrides.
    ///
    /// # Environment Variables
    /// - `BQCI_POLL_INTERVAL_MS`: delay between polls of one job (default: 1000)
    /// - `BQCI_JOB_TIMEOUT_SECS`: per-job timeout (default: 1800)
    /// - `BQCI_MAX_CONCURRENCY`: cap on jobs in flight (default: unbounded)
    /// - `BQCI_ON_DUPLICATE`: `overwrite`, `error` or `disambiguate` (default: overwrite)
    /// - `BQCI_SQL_EXTENSION`: extension loaded from directories (default: sql)
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(v) = env_parse::<u64>("BQCI_POLL_INTERVAL_MS")? {
            self.poll_interval_ms = v;
        }
        if let Some(v) = env_parse::<u64>("BQCI_JOB_TIMEOUT_SECS")? {
            self.job_timeout_secs = v;
        }
        if let Some(v) = env_parse::<usize>("BQCI_MAX_CONCURRENCY")? {
            self.max_concurrency = Some(v);
        }
        if let Ok(v) = std::env::var("BQCI_ON_DUPLICATE") {
            self.on_duplicate = v.parse()?;
        }
        if let Ok(v) = std::env::var("BQCI_SQL_EXTENSION") {
            self.sql_extension = v;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(invalid("poll_interval_ms", "0", "must be > 0"));
        }
        if self.job_timeout_secs == 0 {
            return Err(invalid("job_timeout_secs", "0", "must be > 0"));
        }
        if self.max_concurrency == Some(0) {
            return Err(invalid("max_concurrency", "0", "must be > 0 when set"));
        }
        let ext = self.sql_extension.trim_start_matches('.');
        if ext.is_empty() {
            return Err(invalid("sql_extension", &self.sql_extension, "must not be empty"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}

// ============================================================================
// BIGQUERY CONFIG
// ============================================================================

/// Connection settings for the BigQuery REST backend.
#[derive(Clone, PartialEq, Eq)]
pub struct BigQueryConfig {
    pub project_id: String,
    pub location: Option<String>,
    pub access_token: String,
    pub api_base_url: String,
    pub request_timeout_ms: u64,
}

impl BigQueryConfig {
    pub fn new(project_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: None,
            access_token: access_token.into(),
            api_base_url: DEFAULT_BIGQUERY_API_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "project_id".to_string(),
            });
        }
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "access_token".to_string(),
            });
        }
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(invalid("api_base_url", &self.api_base_url, "must be an http(s) URL"));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms", "0", "must be > 0"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl fmt::Debug for BigQueryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BigQueryConfig")
            .field("project_id", &self.project_id)
            .field("location", &self.location)
            .field("access_token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn invalid(field: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(key, &raw, "not a valid number")),
        Err(_) => Ok(None),
    }
}

//! Error types for bqci operations

use std::path::PathBuf;
use thiserror::Error;

/// Harness errors that abort a run before any statement is submitted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HarnessError {
    #[error("{} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },

    #[error("Duplicate test name {name} (from {})", path.display())]
    DuplicateTestName { name: String, path: PathBuf },
}

/// Errors reported by a query backend.
///
/// `MalformedQuery` is statement-local: the scheduler turns it into an error
/// status for one test and keeps going. Jobs that run and fail are reported
/// through `JobState::Failed` instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Malformed query: {message}")]
    MalformedQuery { message: String },

    #[error("Request to {endpoint} failed with status {status}: {message}")]
    RequestFailed {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Transport error: {reason}")]
    Transport { reason: String },

    #[error("Invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("{resource} already exists")]
    AlreadyExists { resource: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("Failed to parse {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

/// Provisioning errors (create-dev-env).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("Invalid table reference {spec}: {reason}")]
    InvalidTableRef { spec: String, reason: String },

    #[error("Dataset {dataset} already exists. Either choose a non-existing dataset name, or remove the `--create-dataset` flag")]
    DatasetAlreadyExists { dataset: String },

    #[error("Dataset {dataset} does not exist. Either choose an existing dataset name, or add the `--create-dataset` flag to create it")]
    DatasetNotFound { dataset: String },

    #[error("Source table {table} not found")]
    TableNotFound { table: String },

    #[error("No source tables given")]
    NoSourceTables,

    #[error("{} copy job(s) failed: {}", failures.len(), failures.join("; "))]
    CopyFailed { failures: Vec<String> },

    #[error("Invalid point in time {value}: expected YYYY-mm-ddTHH:MM:SS ({reason})")]
    InvalidTimestamp { value: String, reason: String },
}

/// Master error type for all bqci errors.
#[derive(Debug, Clone, Error)]
pub enum BqciError {
    #[error("Harness error: {0}")]
    Harness(#[from] HarnessError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provision error: {0}")]
    Provision(#[from] ProvisionError),
}

/// Result type alias for bqci operations.
pub type BqciResult<T> = Result<T, BqciError>;

// =============================================================================
// TESTS
// =============================================================================

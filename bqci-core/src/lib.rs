//! bqci Core - Shared Types
//!
//! Data model shared by every bqci crate: test cases and their results, job
//! handles for the query backend, table references, the translation map,
//! configuration and the error taxonomy.

pub mod config;
pub mod error;
pub mod table;
pub mod translation;

pub use config::*;
pub use error::*;
pub use table::{DatasetRef, TableRef};
pub use translation::TranslationMap;

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TEST CASES AND RESULTS
// ============================================================================

/// One independently runnable statement, already rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// `<file stem>_<statement index>`
    pub name: String,
    /// Final SQL text sent to the backend.
    pub query: String,
}

impl TestCase {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
        }
    }
}

/// Outcome of a single test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    Ok,
    Error(String),
}

impl TestStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, TestStatus::Ok)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Ok => write!(f, "OK"),
            TestStatus::Error(message) => write!(f, "ERROR {}", message),
        }
    }
}

/// Exactly one per [`TestCase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub status: TestStatus,
}

impl TestResult {
    pub fn ok(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Ok,
        }
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Error(message.into()),
        }
    }
}

// ============================================================================
// JOBS
// ============================================================================

/// Opaque token for one in-flight backend job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
    /// Region the job runs in; some backends need it to look the job up.
    pub location: Option<String>,
}

impl JobHandle {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}:{}", location, self.job_id),
            None => write!(f, "{}", self.job_id),
        }
    }
}

/// Result of polling a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Pending,
    Succeeded,
    Failed(String),
}

impl JobState {
    pub fn is_done(&self) -> bool {
        !matches!(self, JobState::Pending)
    }
}

/// Kind of point-in-time copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CopyOperation {
    /// Read-only logical copy.
    Snapshot,
    /// Writable logical copy.
    Clone,
}

impl CopyOperation {
    /// Wire name of the copy operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyOperation::Snapshot => "SNAPSHOT",
            CopyOperation::Clone => "CLONE",
        }
    }

    /// Prefix of generated table names.
    pub fn table_prefix(&self) -> &'static str {
        match self {
            CopyOperation::Snapshot => "snap",
            CopyOperation::Clone => "clone",
        }
    }
}

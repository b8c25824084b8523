//! bqci Backend - Query Backend Abstraction
//!
//! Traits the harness and the provisioner are written against, plus the
//! BigQuery REST provider. Backends are constructed once per run by the binary
//! and passed down explicitly as `Arc<dyn ...>`; there is no global client.

pub mod providers;
pub mod wait;

pub use providers::BigQueryClient;
pub use wait::{wait_for_job, JobOutcome, PollSettings};

use async_trait::async_trait;
use bqci_core::{BackendError, CopyOperation, DatasetRef, JobHandle, JobState, TableRef};

// ============================================================================
// QUERY BACKEND
// ============================================================================

/// Asynchronous query execution.
///
/// `submit` returns as soon as the backend has accepted the statement; the
/// job's completion is observed through `poll`. Implementations must be safe to
/// call concurrently for different jobs.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Start a query job.
    ///
    /// # Returns
    /// * `Ok(JobHandle)` - The job was accepted
    /// * `Err(BackendError::MalformedQuery)` - The statement was rejected outright
    /// * `Err(_)` - Transport or API failure
    async fn submit(&self, query: &str) -> Result<JobHandle, BackendError>;

    /// Check a job once, without waiting.
    async fn poll(&self, job: &JobHandle) -> Result<JobState, BackendError>;

    /// Ask the backend to stop a job. Best effort; the default does nothing.
    async fn cancel(&self, _job: &JobHandle) -> Result<(), BackendError> {
        Ok(())
    }
}

// ============================================================================
// CATALOG BACKEND
// ============================================================================

/// One point-in-time copy job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub source: TableRef,
    /// Read the source as of this instant (milliseconds since epoch).
    pub snapshot_millis: Option<i64>,
    pub destination: TableRef,
    pub operation: CopyOperation,
}

impl CopyRequest {
    /// Source table id including the point-in-time decorator, if any.
    pub fn source_table_id(&self) -> String {
        match self.snapshot_millis {
            Some(millis) => format!("{}@{}", self.source.table_id, millis),
            None => self.source.table_id.clone(),
        }
    }
}

/// Dataset and table management needed for provisioning.
#[async_trait]
pub trait CatalogBackend: QueryBackend {
    /// Project used when a reference omits one.
    fn default_project(&self) -> &str;

    /// `Err(BackendError::NotFound)` when the dataset does not exist.
    async fn get_dataset(&self, dataset: &DatasetRef) -> Result<(), BackendError>;

    /// `Err(BackendError::AlreadyExists)` when the dataset exists.
    async fn create_dataset(&self, dataset: &DatasetRef) -> Result<(), BackendError>;

    /// `Err(BackendError::NotFound)` when the table does not exist.
    async fn get_table(&self, table: &TableRef) -> Result<(), BackendError>;

    /// Start a copy job; completion is observed with [`QueryBackend::poll`].
    async fn submit_copy(&self, request: &CopyRequest) -> Result<JobHandle, BackendError>;
}

//! bqci Harness - SQL Regression Tests
//!
//! ```text
//! path ──► load_tests ──► TestSuite ──► Scheduler ──► Vec<TestResult> ──► Report
//!              │                            │
//!        split + rewrite              submit + poll
//!       (TranslationMap)             (QueryBackend)
//! ```
//!
//! Only a missing or unreadable input path aborts a run. Every other failure
//! is recorded against the single test it belongs to and surfaces through the
//! report and its exit code.

pub mod loader;
pub mod report;
pub mod scheduler;

pub use loader::{load_file, load_tests, LoadOptions, TestSuite};
pub use report::{Report, EXIT_SUCCESS, EXIT_TEST_FAILURES};
pub use scheduler::{Scheduler, SchedulerConfig};

use bqci_backend::QueryBackend;
use bqci_core::{BqciResult, HarnessConfig, TranslationMap};
use std::path::Path;
use std::sync::Arc;

/// Load the tests under `path`, run them all against `backend` and aggregate.
pub async fn run(
    path: &Path,
    map: &TranslationMap,
    backend: Arc<dyn QueryBackend>,
    config: &HarnessConfig,
) -> BqciResult<Report> {
    let suite = load_tests(path, map, &LoadOptions::from(config))?;
    tracing::info!(path = %path.display(), tests = suite.len(), "Loaded test suite");

    let results = Scheduler::new(backend, SchedulerConfig::from(config))
        .run(&suite)
        .await;
    let report = Report::new(results);

    tracing::info!(
        passed = report.passed(),
        failed = report.failed(),
        "Test run complete"
    );
    Ok(report)
}

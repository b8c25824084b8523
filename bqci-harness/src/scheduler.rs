//! Concurrent execution of a test suite
//!
//! Every test case becomes one future that submits its statement and then
//! polls the resulting job until it settles. The futures are driven together
//! from the calling task (`buffer_unordered`), so no job waits on another and
//! the optional concurrency cap bounds how many jobs are in flight at once.

use crate::loader::TestSuite;
use bqci_backend::{wait_for_job, PollSettings, QueryBackend};
use bqci_core::{HarnessConfig, TestCase, TestResult};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub poll: PollSettings,
    /// `None` starts every job immediately.
    pub max_concurrency: Option<usize>,
}

impl From<&HarnessConfig> for SchedulerConfig {
    fn from(config: &HarnessConfig) -> Self {
        Self {
            poll: PollSettings {
                interval: config.poll_interval(),
                timeout: config.job_timeout(),
            },
            max_concurrency: config.max_concurrency,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&HarnessConfig::default())
    }
}

pub struct Scheduler {
    backend: Arc<dyn QueryBackend>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(backend: Arc<dyn QueryBackend>, config: SchedulerConfig) -> Self {
        Self { backend, config }
    }

    /// Run every case in `suite`, returning one result per case in completion order.
    ///
    /// Statement failures never abort the run: rejected submissions, failed
    /// jobs, poll errors and timeouts all become an error status for that test.
    pub async fn run(&self, suite: &TestSuite) -> Vec<TestResult> {
        if suite.is_empty() {
            return Vec::new();
        }

        let limit = self.config.max_concurrency.unwrap_or(suite.len()).max(1);
        tracing::info!(tests = suite.len(), max_concurrency = limit, "Submitting tests");

        stream::iter(suite.cases())
            .map(|case| self.execute(case))
            .buffer_unordered(limit)
            .collect()
            .await
    }

    async fn execute(&self, case: TestCase) -> TestResult {
        tracing::debug!(test = %case.name, query = %case.query, "Submitting query");

        let job = match self.backend.submit(&case.query).await {
            Ok(job) => job,
            Err(e) => {
                tracing::debug!(test = %case.name, error = %e, "Submission rejected");
                return TestResult::error(case.name, e.to_string());
            }
        };

        let outcome = wait_for_job(self.backend.as_ref(), &job, &self.config.poll).await;
        if outcome.is_success() {
            return TestResult::ok(case.name);
        }
        let message = outcome.failure_message().unwrap_or_default();
        tracing::debug!(test = %case.name, job = %job, error = %message, "Test failed");
        TestResult::error(case.name, message)
    }
}

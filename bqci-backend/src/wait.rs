//! Poll-until-done for a single job.
//!
//! Shared by the test scheduler and the provisioner. One call owns one job
//! handle for its whole life: poll, sleep, poll again, until the backend
//! reports a terminal state or the timeout elapses.

use crate::QueryBackend;
use bqci_core::{JobHandle, JobState};
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// How often to poll and how long to wait in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

/// Terminal outcome of a waited-on job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed(String),
    TimedOut(Duration),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded)
    }

    /// Human-readable failure text, `None` on success.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            JobOutcome::Succeeded => None,
            JobOutcome::Failed(message) => Some(message.clone()),
            JobOutcome::TimedOut(after) => Some(format!("timed out after {:?}", after)),
        }
    }
}

/// Poll `job` until it finishes.
///
/// A poll that errors ends the wait with [`JobOutcome::Failed`]. On timeout the
/// job is cancelled on the backend (errors from the cancel are only logged).
pub async fn wait_for_job<B>(backend: &B, job: &JobHandle, settings: &PollSettings) -> JobOutcome
where
    B: QueryBackend + ?Sized,
{
    let polling = async {
        loop {
            match backend.poll(job).await {
                Ok(JobState::Pending) => sleep(settings.interval).await,
                Ok(JobState::Succeeded) => return JobOutcome::Succeeded,
                Ok(JobState::Failed(message)) => return JobOutcome::Failed(message),
                Err(e) => return JobOutcome::Failed(e.to_string()),
            }
        }
    };

    match timeout(settings.timeout, polling).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(job = %job, timeout = ?settings.timeout, "Job timed out, cancelling");
            if let Err(e) = backend.cancel(job).await {
                tracing::warn!(job = %job, error = %e, "Failed to cancel timed-out job");
            }
            JobOutcome::TimedOut(settings.timeout)
        }
    }
}

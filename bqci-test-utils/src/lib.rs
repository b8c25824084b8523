//! bqci Test Utilities
//!
//! Shared test infrastructure for the bqci workspace:
//! - A scripted in-memory backend implementing both backend traits
//! - Filesystem fixtures for SQL test directories
//! - Proptest generators for test names and statements

pub use bqci_backend::{CatalogBackend, CopyRequest, QueryBackend};
pub use bqci_core::{BackendError, DatasetRef, JobHandle, JobState, TableRef, TranslationMap};
pub use fixtures::{clone_translations, sql_dir, write_files};

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

// ============================================================================
// SCRIPTS
// ============================================================================

/// How the mock backend treats a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    /// Pending for `after_polls` polls, then succeeded.
    Succeed { after_polls: u32 },
    /// Pending for `after_polls` polls, then failed with `message`.
    Fail { after_polls: u32, message: String },
    /// `submit` itself fails with `BackendError::MalformedQuery`.
    Reject { message: String },
    /// Every poll fails with a transport error.
    PollError { message: String },
    /// Pending forever.
    Hang,
}

impl Script {
    pub fn ok() -> Self {
        Script::Succeed { after_polls: 0 }
    }

    pub fn ok_after(after_polls: u32) -> Self {
        Script::Succeed { after_polls }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Script::Fail {
            after_polls: 0,
            message: message.into(),
        }
    }

    pub fn fail_after(after_polls: u32, message: impl Into<String>) -> Self {
        Script::Fail {
            after_polls,
            message: message.into(),
        }
    }

    pub fn reject(message: impl Into<String>) -> Self {
        Script::Reject {
            message: message.into(),
        }
    }

    pub fn poll_error(message: impl Into<String>) -> Self {
        Script::PollError {
            message: message.into(),
        }
    }
}

// ============================================================================
// MOCK BACKEND
// ============================================================================

struct MockJob {
    script: Script,
    polls: u32,
    finished: bool,
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    jobs: HashMap<String, MockJob>,
    submitted: Vec<String>,
    cancelled: Vec<String>,
    in_flight: usize,
    max_in_flight: usize,
    poll_count: u64,
    datasets: BTreeSet<String>,
    tables: BTreeSet<String>,
    copies: Vec<CopyRequest>,
}

impl MockState {
    fn finish(&mut self, job_id: &str) {
        if let Some(job) = self.jobs.get_mut(job_id) {
            if !job.finished {
                job.finished = true;
                self.in_flight -= 1;
            }
        }
    }
}

/// Scripted in-memory backend.
///
/// Each submitted query (or copy destination) is matched against the rules in
/// insertion order by substring; the first match picks its [`Script`],
/// otherwise the default applies. Records everything it sees.
pub struct MockBackend {
    project: String,
    default_script: Script,
    rules: Vec<(String, Script)>,
    state: Mutex<MockState>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Backend where every job succeeds on its first poll.
    pub fn new() -> Self {
        Self {
            project: "test-project".to_string(),
            default_script: Script::ok(),
            rules: Vec::new(),
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn with_default(mut self, script: Script) -> Self {
        self.default_script = script;
        self
    }

    /// Jobs whose query (or copy destination) contains `needle` follow `script`.
    pub fn on(mut self, needle: impl Into<String>, script: Script) -> Self {
        self.rules.push((needle.into(), script));
        self
    }

    /// Register an existing dataset (`project.dataset`).
    pub fn with_dataset(self, dataset: impl Into<String>) -> Self {
        self.state().datasets.insert(dataset.into());
        self
    }

    /// Register an existing table (`project.dataset.table`).
    pub fn with_table(self, table: impl Into<String>) -> Self {
        self.state().tables.insert(table.into());
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn script_for(&self, subject: &str) -> Script {
        self.rules
            .iter()
            .find(|(needle, _)| subject.contains(needle.as_str()))
            .map(|(_, script)| script.clone())
            .unwrap_or_else(|| self.default_script.clone())
    }

    fn start_job(&self, subject: &str) -> Result<JobHandle, BackendError> {
        let script = self.script_for(subject);
        if let Script::Reject { message } = script {
            return Err(BackendError::MalformedQuery { message });
        }

        let mut state = self.state();
        state.next_id += 1;
        let job_id = format!("mock_job_{}", state.next_id);
        state.jobs.insert(
            job_id.clone(),
            MockJob {
                script,
                polls: 0,
                finished: false,
            },
        );
        state.in_flight += 1;
        state.max_in_flight = state.max_in_flight.max(state.in_flight);
        Ok(JobHandle::new(job_id).with_location("MOCK"))
    }

    /// Queries passed to `submit`, in submission order (rejected ones included).
    pub fn submitted(&self) -> Vec<String> {
        self.state().submitted.clone()
    }

    /// Job ids passed to `cancel`.
    pub fn cancelled(&self) -> Vec<String> {
        self.state().cancelled.clone()
    }

    /// Highest number of jobs simultaneously submitted and not yet finished.
    pub fn max_in_flight(&self) -> usize {
        self.state().max_in_flight
    }

    pub fn poll_count(&self) -> u64 {
        self.state().poll_count
    }

    pub fn copies(&self) -> Vec<CopyRequest> {
        self.state().copies.clone()
    }

    pub fn datasets(&self) -> BTreeSet<String> {
        self.state().datasets.clone()
    }
}

#[async_trait]
impl QueryBackend for MockBackend {
    async fn submit(&self, query: &str) -> Result<JobHandle, BackendError> {
        self.state().submitted.push(query.to_string());
        self.start_job(query)
    }

    async fn poll(&self, job: &JobHandle) -> Result<JobState, BackendError> {
        let mut state = self.state();
        state.poll_count += 1;
        let entry = state
            .jobs
            .get_mut(&job.job_id)
            .ok_or_else(|| BackendError::NotFound {
                resource: job.job_id.clone(),
            })?;
        entry.polls += 1;

        let result = match &entry.script {
            Script::Succeed { after_polls } if entry.polls > *after_polls => Ok(JobState::Succeeded),
            Script::Fail {
                after_polls,
                message,
            } if entry.polls > *after_polls => Ok(JobState::Failed(message.clone())),
            Script::PollError { message } => Err(BackendError::Transport {
                reason: message.clone(),
            }),
            _ => Ok(JobState::Pending),
        };

        if !matches!(result, Ok(JobState::Pending)) {
            state.finish(&job.job_id);
        }
        result
    }

    async fn cancel(&self, job: &JobHandle) -> Result<(), BackendError> {
        let mut state = self.state();
        state.cancelled.push(job.job_id.clone());
        state.finish(&job.job_id);
        Ok(())
    }
}

#[async_trait]
impl CatalogBackend for MockBackend {
    fn default_project(&self) -> &str {
        &self.project
    }

    async fn get_dataset(&self, dataset: &DatasetRef) -> Result<(), BackendError> {
        if self.state().datasets.contains(&dataset.to_string()) {
            Ok(())
        } else {
            Err(BackendError::NotFound {
                resource: format!("Dataset {}", dataset),
            })
        }
    }

    async fn create_dataset(&self, dataset: &DatasetRef) -> Result<(), BackendError> {
        if self.state().datasets.insert(dataset.to_string()) {
            Ok(())
        } else {
            Err(BackendError::AlreadyExists {
                resource: format!("Dataset {}", dataset),
            })
        }
    }

    async fn get_table(&self, table: &TableRef) -> Result<(), BackendError> {
        if self.state().tables.contains(&table.to_string()) {
            Ok(())
        } else {
            Err(BackendError::NotFound {
                resource: format!("Table {}", table),
            })
        }
    }

    async fn submit_copy(&self, request: &CopyRequest) -> Result<JobHandle, BackendError> {
        self.state().copies.push(request.clone());
        self.start_job(&request.destination.to_string())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    use super::TranslationMap;
    use std::path::Path;

    /// Temporary directory holding the given `(file name, contents)` pairs.
    pub fn sql_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {}", e));
        write_files(dir.path(), files);
        dir
    }

    pub fn write_files(root: &Path, files: &[(&str, &str)]) {
        for (name, contents) in files {
            let path = root.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .unwrap_or_else(|e| panic!("create {}: {}", parent.display(), e));
            }
            std::fs::write(&path, contents).unwrap_or_else(|e| panic!("write {}: {}", path.display(), e));
        }
    }

    /// Translation map used across harness tests.
    pub fn clone_translations() -> TranslationMap {
        TranslationMap::from_pairs([
            ("ds.t1", "acme.dev.clone_20220101000000_t1"),
            ("acme.ds.t1", "acme.dev.clone_20220101000000_t1"),
        ])
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    use proptest::prelude::*;

    /// File stem usable as a test name prefix.
    pub fn file_stem() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,10}"
    }

    /// Single statement body without a separator.
    pub fn statement_body() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("SELECT 1".to_string()),
            Just("SELECT * FROM $ds.t1".to_string()),
            Just("SELECT COUNT(*) FROM $ds.t2 WHERE x > 0".to_string()),
            "SELECT [a-z]{1,6} FROM \\$[a-z]{1,4}\\.[a-z]{1,4}",
        ]
    }

    /// Outcome for one scripted job: `None` succeeds, `Some(msg)` fails.
    pub fn outcome() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            3 => Just(None),
            1 => "[a-z ]{1,20}".prop_map(Some),
        ]
    }
}

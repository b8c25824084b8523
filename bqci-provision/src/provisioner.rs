//! Running a provisioning plan against a catalog backend

use crate::plan::{plan, ProvisionPlan, ProvisionRequest};
use bqci_backend::{wait_for_job, CatalogBackend, CopyRequest, PollSettings};
use bqci_core::{
    BackendError, BqciResult, ConfigError, DatasetRef, HarnessConfig, ProvisionError, TableRef,
    TranslationMap,
};
use futures_util::future::join_all;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionConfig {
    /// Polling of copy jobs; the timeout applies to each job.
    pub poll: PollSettings,
}

impl From<&HarnessConfig> for ProvisionConfig {
    fn from(config: &HarnessConfig) -> Self {
        Self {
            poll: PollSettings {
                interval: config.poll_interval(),
                timeout: config.job_timeout(),
            },
        }
    }
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self::from(&HarnessConfig::default())
    }
}

/// Result of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub plan: ProvisionPlan,
}

impl ProvisionOutcome {
    pub fn translations(&self) -> &TranslationMap {
        &self.plan.translations
    }

    /// Write the translation map as JSON for `run-tests --translation-file`.
    pub fn write_translation_file(&self, path: &Path) -> Result<(), ConfigError> {
        self.plan.translations.save(path)?;
        tracing::info!(path = %path.display(), entries = self.plan.translations.len(), "Translation file written");
        Ok(())
    }
}

pub struct Provisioner {
    backend: Arc<dyn CatalogBackend>,
    config: ProvisionConfig,
}

impl Provisioner {
    pub fn new(backend: Arc<dyn CatalogBackend>, config: ProvisionConfig) -> Self {
        Self { backend, config }
    }

    /// Create a snapshot and a clone of every source table in the target dataset.
    ///
    /// Source tables and the target dataset are checked before any copy is
    /// started. All copy jobs are submitted first and then awaited together;
    /// if any of them fails, every failure is reported in one
    /// [`ProvisionError::CopyFailed`] once all jobs have settled.
    pub async fn provision(&self, request: &ProvisionRequest) -> BqciResult<ProvisionOutcome> {
        let plan = plan(request)?;

        for table in &request.source_tables {
            self.check_source(table).await?;
        }
        self.resolve_dataset(&request.target_dataset, request.create_dataset)
            .await?;

        let copies = plan.copy_requests();
        let mut failures = Vec::new();
        let mut submitted = Vec::with_capacity(copies.len());
        for copy in &copies {
            tracing::info!(
                source = %copy.source.at_millis(plan.snapshot_millis),
                destination = %copy.destination,
                operation = copy.operation.as_str(),
                "Creating copy"
            );
            match self.backend.submit_copy(copy).await {
                Ok(job) => submitted.push((copy, job)),
                Err(e) => failures.push(describe_failure(copy, &e.to_string())),
            }
        }

        let backend = self.backend.as_ref();
        let outcomes = join_all(
            submitted
                .iter()
                .map(|(_, job)| wait_for_job(backend, job, &self.config.poll)),
        )
        .await;

        for ((copy, job), outcome) in submitted.iter().zip(outcomes) {
            if let Some(message) = outcome.failure_message() {
                tracing::error!(destination = %copy.destination, job = %job, error = %message, "Copy job failed");
                failures.push(describe_failure(copy, &message));
            }
        }

        if !failures.is_empty() {
            return Err(ProvisionError::CopyFailed { failures }.into());
        }

        tracing::info!(tables = plan.tables.len(), "All tables created");
        Ok(ProvisionOutcome { plan })
    }

    async fn check_source(&self, table: &TableRef) -> BqciResult<()> {
        match self.backend.get_table(table).await {
            Ok(()) => Ok(()),
            Err(BackendError::NotFound { .. }) => Err(ProvisionError::TableNotFound {
                table: table.to_string(),
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_dataset(&self, dataset: &DatasetRef, create: bool) -> BqciResult<()> {
        let name = dataset.to_string();
        if create {
            match self.backend.create_dataset(dataset).await {
                Ok(()) => Ok(()),
                Err(BackendError::AlreadyExists { .. }) => {
                    Err(ProvisionError::DatasetAlreadyExists { dataset: name }.into())
                }
                Err(e) => Err(e.into()),
            }
        } else {
            match self.backend.get_dataset(dataset).await {
                Ok(()) => Ok(()),
                Err(BackendError::NotFound { .. }) => {
                    Err(ProvisionError::DatasetNotFound { dataset: name }.into())
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

fn describe_failure(copy: &CopyRequest, message: &str) -> String {
    format!("{} ({}): {}", copy.destination, copy.operation.as_str(), message)
}

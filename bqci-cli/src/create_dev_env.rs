//! `create-dev-env`

use crate::args::{BigQueryArgs, LogArgs};
use bqci_backend::{BigQueryClient, CatalogBackend};
use bqci_core::{BqciResult, HarnessConfig};
use bqci_provision::{parse_when, ProvisionConfig, ProvisionOutcome, ProvisionRequest, Provisioner};
use chrono::{SubsecRound, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "create-dev-env")]
#[command(about = "Create a development environment of point-in-time table snapshots and clones", long_about = None)]
pub struct CreateDevEnvCli {
    /// Table to copy, `dataset.table` or `project.dataset.table`. Repeat for several tables
    #[arg(long = "source-table", required = true)]
    pub source_tables: Vec<String>,

    /// Dataset receiving the copies, `dataset` or `project.dataset`
    #[arg(long)]
    pub target_dataset: String,

    /// Create the target dataset; fails if it already exists.
    /// Without this flag the dataset must already exist
    #[arg(long)]
    pub create_dataset: bool,

    /// Point in time to copy, `YYYY-mm-ddTHH:MM:SS` in UTC (default: now)
    #[arg(long)]
    pub when: Option<String>,

    /// Write the translation map for `run-tests` to this file
    #[arg(long)]
    pub translation_file: Option<PathBuf>,

    /// TOML file with polling settings
    #[arg(long, env = "BQCI_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub bigquery: BigQueryArgs,

    #[command(flatten)]
    pub logging: LogArgs,
}

impl CreateDevEnvCli {
    pub fn request(&self, default_project: &str) -> BqciResult<ProvisionRequest> {
        let when = match &self.when {
            Some(value) => parse_when(value)?,
            None => Utc::now().trunc_subsecs(0),
        };
        Ok(ProvisionRequest::parse(
            self.source_tables.as_slice(),
            &self.target_dataset,
            default_project,
            self.create_dataset,
            when,
        )?)
    }

    pub async fn execute(self) -> BqciResult<ProvisionOutcome> {
        let config = ProvisionConfig::from(&HarnessConfig::load(self.config.as_deref())?);
        let backend: Arc<dyn CatalogBackend> =
            Arc::new(BigQueryClient::new(self.bigquery.clone().into_config()?)?);
        let request = self.request(backend.default_project())?;

        let outcome = Provisioner::new(backend, config).provision(&request).await?;
        if let Some(path) = &self.translation_file {
            outcome.write_translation_file(path)?;
        }
        Ok(outcome)
    }
}

//! Naming of provisioned tables
//!
//! Pure: turns a request into the list of copy jobs and the translation map
//! without talking to a backend.

use bqci_backend::CopyRequest;
use bqci_core::{CopyOperation, DatasetRef, ProvisionError, TableRef, TranslationMap};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Input format of the point in time.
pub const WHEN_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Timestamp embedded in generated table names.
pub const TABLE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Parse a `YYYY-mm-ddTHH:MM:SS` point in time, read as UTC.
pub fn parse_when(value: &str) -> Result<DateTime<Utc>, ProvisionError> {
    NaiveDateTime::parse_from_str(value.trim(), WHEN_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| ProvisionError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

// ============================================================================
// REQUEST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub source_tables: Vec<TableRef>,
    pub target_dataset: DatasetRef,
    /// Create the target dataset (it must not exist) instead of reusing it (it must exist).
    pub create_dataset: bool,
    pub when: DateTime<Utc>,
}

impl ProvisionRequest {
    /// Build a request from command-line style table and dataset specs.
    pub fn parse<S: AsRef<str>>(
        source_tables: &[S],
        target_dataset: &str,
        default_project: &str,
        create_dataset: bool,
        when: DateTime<Utc>,
    ) -> Result<Self, ProvisionError> {
        let source_tables = source_tables
            .iter()
            .map(|spec| TableRef::parse(spec.as_ref(), default_project))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source_tables,
            target_dataset: DatasetRef::parse(target_dataset, default_project)?,
            create_dataset,
            when,
        })
    }
}

// ============================================================================
// PLAN
// ============================================================================

/// Copies made for one source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePlan {
    pub source: TableRef,
    pub snapshot: TableRef,
    pub clone: TableRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub tables: Vec<TablePlan>,
    /// Point in time the sources are read at, in milliseconds since the epoch.
    pub snapshot_millis: i64,
    pub translations: TranslationMap,
}

impl ProvisionPlan {
    /// Snapshot then clone for every table, in request order.
    pub fn copy_requests(&self) -> Vec<CopyRequest> {
        self.tables
            .iter()
            .flat_map(|table| {
                [
                    (table.snapshot.clone(), CopyOperation::Snapshot),
                    (table.clone.clone(), CopyOperation::Clone),
                ]
                .into_iter()
                .map(move |(destination, operation)| CopyRequest {
                    source: table.source.clone(),
                    snapshot_millis: Some(self.snapshot_millis),
                    destination,
                    operation,
                })
            })
            .collect()
    }
}

/// Name the snapshot and clone of every source table and build the map that
/// points the tables' logical names at their clones.
pub fn plan(request: &ProvisionRequest) -> Result<ProvisionPlan, ProvisionError> {
    if request.source_tables.is_empty() {
        return Err(ProvisionError::NoSourceTables);
    }

    let stamp = request.when.format(TABLE_TIMESTAMP_FORMAT).to_string();
    let copy_name = |operation: CopyOperation, source: &TableRef| {
        request.target_dataset.table(format!(
            "{}_{}_{}",
            operation.table_prefix(),
            stamp,
            source.table_id
        ))
    };

    let mut translations = TranslationMap::new();
    let tables = request
        .source_tables
        .iter()
        .map(|source| {
            let clone = copy_name(CopyOperation::Clone, source);
            translations.insert(source.dataset_qualified(), clone.to_string());
            translations.insert(source.to_string(), clone.to_string());
            TablePlan {
                source: source.clone(),
                snapshot: copy_name(CopyOperation::Snapshot, source),
                clone,
            }
        })
        .collect();

    Ok(ProvisionPlan {
        tables,
        snapshot_millis: request.when.timestamp_millis(),
        translations,
    })
}

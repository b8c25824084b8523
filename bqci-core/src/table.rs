//! Table and dataset references in `project.dataset.table` form.

use crate::error::ProvisionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully-qualified table reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

/// Fully-qualified dataset reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetRef {
    pub project_id: String,
    pub dataset_id: String,
}

fn split_parts(spec: &str) -> Result<Vec<&str>, ProvisionError> {
    let parts: Vec<&str> = spec.trim().split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ProvisionError::InvalidTableRef {
            spec: spec.to_string(),
            reason: "empty name component".to_string(),
        });
    }
    Ok(parts)
}

fn arity_error(spec: &str, expected: &str) -> ProvisionError {
    ProvisionError::InvalidTableRef {
        spec: spec.to_string(),
        reason: format!("expected {}", expected),
    }
}

impl TableRef {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }

    /// Parse `dataset.table` or `project.dataset.table`.
    /// A missing project is filled from `default_project`.
    pub fn parse(spec: &str, default_project: &str) -> Result<Self, ProvisionError> {
        match split_parts(spec)?.as_slice() {
            [dataset, table] => Ok(Self::new(default_project, *dataset, *table)),
            [project, dataset, table] => Ok(Self::new(*project, *dataset, *table)),
            _ => Err(arity_error(spec, "dataset.table or project.dataset.table")),
        }
    }

    /// `dataset.table`, the short logical reference used in authored SQL.
    pub fn dataset_qualified(&self) -> String {
        format!("{}.{}", self.dataset_id, self.table_id)
    }

    /// Point-in-time decorator form: `project.dataset.table@<millis>`.
    pub fn at_millis(&self, millis: i64) -> String {
        format!("{}@{}", self, millis)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

impl DatasetRef {
    pub fn new(project_id: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
        }
    }

    /// Parse `dataset` or `project.dataset`.
    pub fn parse(spec: &str, default_project: &str) -> Result<Self, ProvisionError> {
        match split_parts(spec)?.as_slice() {
            [dataset] => Ok(Self::new(default_project, *dataset)),
            [project, dataset] => Ok(Self::new(*project, *dataset)),
            _ => Err(arity_error(spec, "dataset or project.dataset")),
        }
    }

    pub fn table(&self, table_id: impl Into<String>) -> TableRef {
        TableRef::new(&self.project_id, &self.dataset_id, table_id)
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.project_id, self.dataset_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dataset_qualified_uses_default_project() {
        let t = TableRef::parse("sales.orders", "acme").unwrap();
        assert_eq!(t, TableRef::new("acme", "sales", "orders"));
        assert_eq!(t.to_string(), "acme.sales.orders");
        assert_eq!(t.dataset_qualified(), "sales.orders");
    }

    #[test]
    fn test_parse_project_qualified() {
        let t = TableRef::parse("other.sales.orders", "acme").unwrap();
        assert_eq!(t.project_id, "other");
    }

    #[test]
    fn test_parse_rejects_bad_arity_and_empty_parts() {
        assert!(TableRef::parse("orders", "acme").is_err());
        assert!(TableRef::parse("a.b.c.d", "acme").is_err());
        assert!(TableRef::parse("sales..orders", "acme").is_err());
        assert!(DatasetRef::parse("a.b.c", "acme").is_err());
    }

    #[test]
    fn test_point_in_time_decorator() {
        let t = TableRef::new("p", "d", "t");
        assert_eq!(t.at_millis(1_640_995_200_000), "p.d.t@1640995200000");
    }

    #[test]
    fn test_dataset_parse() {
        assert_eq!(
            DatasetRef::parse("dev", "acme").unwrap(),
            DatasetRef::new("acme", "dev")
        );
        assert_eq!(
            DatasetRef::parse("p.dev", "acme").unwrap().to_string(),
            "p.dev"
        );
    }
}

//! Backend provider implementations

pub mod bigquery;

pub use bigquery::BigQueryClient;

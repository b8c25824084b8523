//! BigQuery provider implementation
//!
//! Talks to the BigQuery v2 REST API with a caller-supplied OAuth2 bearer
//! token. Obtaining that token is left to the caller.

pub mod client;
pub mod types;

pub use client::BigQueryClient;

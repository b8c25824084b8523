//! bqci Provision - Development Environments
//!
//! Makes point-in-time snapshot and clone copies of production tables in a
//! development dataset and produces the translation map that `run-tests` uses
//! to point SQL at the clones.

pub mod plan;
pub mod provisioner;

pub use plan::{
    parse_when, plan, ProvisionPlan, ProvisionRequest, TablePlan, TABLE_TIMESTAMP_FORMAT,
    WHEN_FORMAT,
};
pub use provisioner::{ProvisionConfig, ProvisionOutcome, Provisioner};

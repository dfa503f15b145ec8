//! Kusto schema deltas from parameter files.
//!
//! `kql-delta` drives [`kql_delta_core`] from a YAML parameter file. Each
//! job compares a current and a target schema, read from script files or a
//! live database, and acts on the delta:
//!
//! - **Parameters** - Parameter file model with dotted-path overrides
//! - **Gateway** - Cluster access behind a trait, with a per-cluster
//!   provider cache
//! - **Runner** - Loads sources, reconciles, writes delta files and pushes
//!   to the current database
//!
//! # Example
//!
//! ```rust,no_run
//! use kql_delta::prelude::*;
//!
//! # async fn run() -> kql_delta::error::Result<()> {
//! let parameters = MainParameterization::from_yaml(
//!     "jobs:\n  main:\n    target:\n      scripts: [{folderPath: schema}]\n    action:\n      filePath: delta.kql\n",
//!     &["jobs.main.action.filePath=out/delta.kql"],
//! )?;
//! let runner = DeltaRunner::new(parameters, ".", DryRunConnector::new());
//! for report in runner.run().await? {
//!     println!("{}: {} command(s)", report.job, report.delta.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod gateway;
pub mod parameters;
pub mod runner;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{DeltaError, Result};
    pub use crate::gateway::{
        Authentication, ClusterKey, CommandOutcome, CommandResult, DryRunConnector,
        GatewayFactory, ManagementGateway, ProviderConnector,
    };
    pub use crate::parameters::MainParameterization;
    pub use crate::runner::{load_script_path, DeltaRunner, JobReport};
}

//! Reconciliation engine.
//!
//! Compares the schema state declared by a "current" script with the one
//! declared by a "target" script and produces the ordered command sequence
//! that turns the first into the second.
//!
//! # Example
//!
//! ```rust
//! use kql_delta_core::command::{parse_script, ScriptingContext};
//! use kql_delta_core::delta::reconcile;
//!
//! let current = parse_script(".create table T (a:string)").unwrap();
//! let target = parse_script(".create table T (a:string, b:long)").unwrap();
//! let delta = reconcile(&current, &target).unwrap();
//! assert_eq!(
//!     delta[0].to_script(&ScriptingContext::new()),
//!     ".alter-merge table T (b:long)"
//! );
//! ```

mod diff;
mod state;

pub use diff::{rank, reconcile, ColumnTypeChange, ReconcileOptions, Reconciler};
pub use state::{DatabaseState, PolicyKey, PolicyScope, PolicyState, TableState};

use thiserror::Error;

use crate::command::{CommandError, EntityName, EntityType};

/// Errors raised by the reconciliation engine.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The command changes a schema and cannot declare one.
    #[error("`{command}` on {entity_type} `{entity}` can't be part of a schema state")]
    Unsupported {
        command: &'static str,
        entity_type: EntityType,
        entity: EntityName,
    },

    #[error(transparent)]
    Command(#[from] CommandError),
}

//! # kql-delta-core
//!
//! Schema reconciliation for Kusto databases.
//!
//! This crate provides:
//! - A hand-written lexer and recursive descent parser for control-command
//!   scripts (`.create table`, `.create-or-alter function`, policies, ...)
//! - A typed command model that reads statements from the syntax tree and
//!   renders them back into canonical script text
//! - A reconciliation engine computing the ordered delta between a current
//!   and a target schema
//!
//! ## Computing a delta
//!
//! ```rust
//! use kql_delta_core::{parse_script, reconcile, ScriptRenderer, ScriptingContext};
//!
//! let current = parse_script(
//!     ".create table Events (Timestamp:datetime, Level:string)",
//! ).unwrap();
//! let target = parse_script(
//!     ".create table Events (Timestamp:datetime, Level:string, Message:string)\n\
//!      .delete table Events policy retention",
//! ).unwrap();
//!
//! let delta = reconcile(&current, &target).unwrap();
//! let script = ScriptRenderer::new(ScriptingContext::new()).render(&delta);
//! assert_eq!(
//!     script,
//!     ".alter-merge table Events (Message:string)\n\n\
//!      .delete table Events policy retention\n"
//! );
//! ```
//!
//! Scripts are all-or-nothing: a statement the command model does not
//! support fails the whole parse.
//!
//! ```rust
//! use kql_delta_core::parse_script;
//!
//! assert!(parse_script(".create table T (a:string)\n.show tables").is_err());
//! ```

pub mod ast;
pub mod command;
pub mod delta;
pub mod lexer;
pub mod parser;
pub mod script;

pub use command::{
    parse_script, Command, CommandError, CommandKind, EntityName, EntityType, ParseScriptError,
    ScriptingContext,
};
pub use delta::{reconcile, ReconcileError, ReconcileOptions, Reconciler};
pub use script::ScriptRenderer;

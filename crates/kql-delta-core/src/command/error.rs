//! Command model errors.

use thiserror::Error;

use super::entity::EntityType;
use super::policy::PolicyKind;
use crate::ast::SyntaxKind;

/// Errors raised while building a command from a syntax node or from
/// parameters.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A policy command names neither a table nor a database.
    #[error("{command} requires to act on a table or database (cluster isn't supported)")]
    MissingEntityKeyword { command: &'static str },

    /// A statement lacks the name of the entity it acts on.
    #[error("{command} requires an entity name")]
    MissingName { command: &'static str },

    /// A statement lacks a required element.
    #[error("{command} is missing its {element}")]
    MissingElement {
        command: &'static str,
        element: &'static str,
    },

    /// Policies only attach to tables and databases.
    #[error("Policies can't be set on a {entity_type}; only tables and databases are supported")]
    UnsupportedEntityType { entity_type: EntityType },

    #[error("Invalid entity name `{0}`")]
    InvalidName(String),

    #[error("Unknown column type `{0}`")]
    UnknownType(String),

    #[error("Table `{0}` must declare at least one column")]
    NoColumns(String),

    #[error("Column `{column}` is declared twice in table `{table}`")]
    DuplicateColumn { table: String, column: String },

    #[error("Invalid {policy} policy payload: {source}")]
    InvalidPolicy {
        policy: PolicyKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid timespan `{0}`")]
    InvalidTimespan(String),

    /// The syntax node is not a statement the command model supports.
    #[error("Unsupported statement kind {0:?}")]
    UnsupportedStatement(SyntaxKind),
}

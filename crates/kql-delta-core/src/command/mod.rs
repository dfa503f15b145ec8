//! Typed model of the supported control commands.
//!
//! Every statement kind maps to one [`Command`] variant carrying its own
//! parameter struct. Each struct implements [`ControlCommand`], which ties
//! together its syntax-tree reader, its canonical script and its friendly
//! name. Reading a command back from the script it renders yields an equal
//! command.
//!
//! # Example
//!
//! ```rust
//! use kql_delta_core::command::{parse_script, ScriptingContext};
//!
//! let commands = parse_script(".create-merge table T (a:string, b:long)").unwrap();
//! let ctx = ScriptingContext::new();
//! assert_eq!(commands[0].to_script(&ctx), ".create table T (a:string, b:long)");
//! assert_eq!(commands[0].friendly_name(), ".create table");
//! ```

mod context;
mod entity;
mod error;
mod function;
mod parse;
mod policy;
mod table;

pub use context::ScriptingContext;
pub use entity::{EntityName, EntityType};
pub use error::CommandError;
pub use function::{CreateFunctionCommand, DropFunctionCommand, FunctionParameter, ParameterType};
pub use parse::{parse_script, parse_statements, ParseScriptError};
pub use policy::{
    AlterIngestionBatchingPolicyCommand, AlterPolicyCommand, AlterRetentionPolicyCommand,
    DeleteIngestionBatchingPolicyCommand, DeletePolicyCommand, DeleteRetentionPolicyCommand,
    EntityPolicyTarget, IngestionBatchingPolicy, Policy, PolicyKind, Recoverability,
    RetentionPolicy, Timespan,
};
pub use table::{
    AlterColumnTypeCommand, AlterMergeTableColumnsCommand, ColumnType, CreateTableCommand,
    DropTableColumnsCommand, DropTableCommand, TableColumn,
};

use crate::ast::SyntaxNode;

/// A command type that can be read from a statement node and rendered back.
pub trait ControlCommand: Sized {
    /// Fixed human-readable label of the command kind.
    const FRIENDLY_NAME: &'static str;

    /// Reads the command from its statement node.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` when the statement lacks a required element
    /// or carries an invalid value.
    fn from_code(node: &SyntaxNode) -> Result<Self, CommandError>;

    /// Renders the canonical script text.
    fn to_script(&self, ctx: &ScriptingContext) -> String;
}

/// All supported control commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `.create table`
    CreateTable(CreateTableCommand),
    /// `.alter-merge table`
    AlterMergeTableColumns(AlterMergeTableColumnsCommand),
    /// `.drop table`
    DropTable(DropTableCommand),
    /// `.drop table ... columns`
    DropTableColumns(DropTableColumnsCommand),
    /// `.alter column ... type=`
    AlterColumnType(AlterColumnTypeCommand),
    /// `.create-or-alter function`
    CreateFunction(CreateFunctionCommand),
    /// `.drop function`
    DropFunction(DropFunctionCommand),
    /// `.alter <entity> policy retention`
    AlterRetentionPolicy(AlterRetentionPolicyCommand),
    /// `.delete <entity> policy retention`
    DeleteRetentionPolicy(DeleteRetentionPolicyCommand),
    /// `.alter <entity> policy ingestionbatching`
    AlterIngestionBatchingPolicy(AlterIngestionBatchingPolicyCommand),
    /// `.delete <entity> policy ingestionbatching`
    DeleteIngestionBatchingPolicy(DeleteIngestionBatchingPolicyCommand),
}

/// Fieldless mirror of [`Command`]'s variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    CreateTable,
    AlterMergeTableColumns,
    DropTable,
    DropTableColumns,
    AlterColumnType,
    CreateFunction,
    DropFunction,
    AlterRetentionPolicy,
    DeleteRetentionPolicy,
    AlterIngestionBatchingPolicy,
    DeleteIngestionBatchingPolicy,
}

impl CommandKind {
    /// Fixed human-readable label.
    #[must_use]
    pub const fn friendly_name(self) -> &'static str {
        match self {
            Self::CreateTable => CreateTableCommand::FRIENDLY_NAME,
            Self::AlterMergeTableColumns => AlterMergeTableColumnsCommand::FRIENDLY_NAME,
            Self::DropTable => DropTableCommand::FRIENDLY_NAME,
            Self::DropTableColumns => DropTableColumnsCommand::FRIENDLY_NAME,
            Self::AlterColumnType => AlterColumnTypeCommand::FRIENDLY_NAME,
            Self::CreateFunction => CreateFunctionCommand::FRIENDLY_NAME,
            Self::DropFunction => DropFunctionCommand::FRIENDLY_NAME,
            Self::AlterRetentionPolicy => AlterRetentionPolicyCommand::FRIENDLY_NAME,
            Self::DeleteRetentionPolicy => DeleteRetentionPolicyCommand::FRIENDLY_NAME,
            Self::AlterIngestionBatchingPolicy => AlterIngestionBatchingPolicyCommand::FRIENDLY_NAME,
            Self::DeleteIngestionBatchingPolicy => {
                DeleteIngestionBatchingPolicyCommand::FRIENDLY_NAME
            }
        }
    }

    /// Whether applying the command can lose stored data.
    #[must_use]
    pub const fn loses_data(self) -> bool {
        matches!(
            self,
            Self::DropTable | Self::DropTableColumns | Self::AlterColumnType
        )
    }
}

impl Command {
    /// Reads a command from a statement node through the dispatch table.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::UnsupportedStatement` for statements without a
    /// registered reader, or the reader's own error.
    pub fn from_code(node: &SyntaxNode) -> Result<Self, CommandError> {
        let parse =
            parse::parser_for(node.kind).ok_or(CommandError::UnsupportedStatement(node.kind))?;
        parse(node)
    }

    /// Returns the command kind.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::CreateTable(_) => CommandKind::CreateTable,
            Self::AlterMergeTableColumns(_) => CommandKind::AlterMergeTableColumns,
            Self::DropTable(_) => CommandKind::DropTable,
            Self::DropTableColumns(_) => CommandKind::DropTableColumns,
            Self::AlterColumnType(_) => CommandKind::AlterColumnType,
            Self::CreateFunction(_) => CommandKind::CreateFunction,
            Self::DropFunction(_) => CommandKind::DropFunction,
            Self::AlterRetentionPolicy(_) => CommandKind::AlterRetentionPolicy,
            Self::DeleteRetentionPolicy(_) => CommandKind::DeleteRetentionPolicy,
            Self::AlterIngestionBatchingPolicy(_) => CommandKind::AlterIngestionBatchingPolicy,
            Self::DeleteIngestionBatchingPolicy(_) => CommandKind::DeleteIngestionBatchingPolicy,
        }
    }

    /// Fixed human-readable label of the command kind.
    #[must_use]
    pub const fn friendly_name(&self) -> &'static str {
        self.kind().friendly_name()
    }

    /// The type of entity the command acts on.
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        match self {
            Self::CreateTable(_)
            | Self::AlterMergeTableColumns(_)
            | Self::DropTable(_)
            | Self::DropTableColumns(_)
            | Self::AlterColumnType(_) => EntityType::Table,
            Self::CreateFunction(_) | Self::DropFunction(_) => EntityType::Function,
            Self::AlterRetentionPolicy(cmd) => cmd.target().entity_type(),
            Self::DeleteRetentionPolicy(cmd) => cmd.target().entity_type(),
            Self::AlterIngestionBatchingPolicy(cmd) => cmd.target().entity_type(),
            Self::DeleteIngestionBatchingPolicy(cmd) => cmd.target().entity_type(),
        }
    }

    /// The name of the entity the command acts on. Column commands name
    /// their table.
    #[must_use]
    pub const fn entity_name(&self) -> &EntityName {
        match self {
            Self::CreateTable(cmd) => cmd.table(),
            Self::AlterMergeTableColumns(cmd) => cmd.table(),
            Self::DropTable(cmd) => &cmd.table,
            Self::DropTableColumns(cmd) => cmd.table(),
            Self::AlterColumnType(cmd) => &cmd.table,
            Self::CreateFunction(cmd) => cmd.name(),
            Self::DropFunction(cmd) => &cmd.name,
            Self::AlterRetentionPolicy(cmd) => cmd.target().entity_name(),
            Self::DeleteRetentionPolicy(cmd) => cmd.target().entity_name(),
            Self::AlterIngestionBatchingPolicy(cmd) => cmd.target().entity_name(),
            Self::DeleteIngestionBatchingPolicy(cmd) => cmd.target().entity_name(),
        }
    }

    /// Rewrites a database-scoped policy command to act on `database`.
    /// Every other command is returned unchanged.
    #[must_use]
    pub fn with_database(self, database: &EntityName) -> Self {
        match self {
            Self::AlterRetentionPolicy(cmd) => Self::AlterRetentionPolicy(cmd.with_database(database)),
            Self::DeleteRetentionPolicy(cmd) => {
                Self::DeleteRetentionPolicy(cmd.with_database(database))
            }
            Self::AlterIngestionBatchingPolicy(cmd) => {
                Self::AlterIngestionBatchingPolicy(cmd.with_database(database))
            }
            Self::DeleteIngestionBatchingPolicy(cmd) => {
                Self::DeleteIngestionBatchingPolicy(cmd.with_database(database))
            }
            other => other,
        }
    }

    /// Renders the canonical script text.
    #[must_use]
    pub fn to_script(&self, ctx: &ScriptingContext) -> String {
        match self {
            Self::CreateTable(cmd) => cmd.to_script(ctx),
            Self::AlterMergeTableColumns(cmd) => cmd.to_script(ctx),
            Self::DropTable(cmd) => cmd.to_script(ctx),
            Self::DropTableColumns(cmd) => cmd.to_script(ctx),
            Self::AlterColumnType(cmd) => cmd.to_script(ctx),
            Self::CreateFunction(cmd) => cmd.to_script(ctx),
            Self::DropFunction(cmd) => cmd.to_script(ctx),
            Self::AlterRetentionPolicy(cmd) => cmd.to_script(ctx),
            Self::DeleteRetentionPolicy(cmd) => cmd.to_script(ctx),
            Self::AlterIngestionBatchingPolicy(cmd) => cmd.to_script(ctx),
            Self::DeleteIngestionBatchingPolicy(cmd) => cmd.to_script(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friendly_names_are_fixed() {
        let ctx = ScriptingContext::new();
        let cases = [
            (".create table T (a:string)", ".create table"),
            (".alter-merge table T (a:string)", ".alter-merge table"),
            (".drop table T", ".drop table"),
            (".drop table T columns (a)", ".drop table columns"),
            (".alter column T.a type=long", ".alter column type"),
            (".create-or-alter function F() { T }", ".create-or-alter function"),
            (".drop function F", ".drop function"),
            (
                ".alter database D policy retention \"{}\"",
                ".alter <entity> policy retention",
            ),
            (".delete table T policy retention", ".delete <entity> policy retention"),
            (
                ".alter table T policy ingestionbatching '{}'",
                ".alter <entity> policy ingestionbatching",
            ),
            (
                ".delete database D policy ingestionbatching",
                ".delete <entity> policy ingestionbatching",
            ),
        ];
        for (script, friendly) in cases {
            let commands = parse_script(script).unwrap();
            assert_eq!(commands[0].friendly_name(), friendly, "{script}");
            // rendering is stable
            let rendered = commands[0].to_script(&ctx);
            assert_eq!(parse_script(&rendered).unwrap(), commands, "{rendered}");
        }
    }

    #[test]
    fn test_entity_of_commands() {
        let commands = parse_script(
            ".alter column T.c type=long\n.delete database D policy retention\n.drop function F",
        )
        .unwrap();
        let entities: Vec<_> = commands
            .iter()
            .map(|c| (c.entity_type(), c.entity_name().to_string()))
            .collect();
        assert_eq!(
            entities,
            vec![
                (EntityType::Table, "T".to_string()),
                (EntityType::Database, "D".to_string()),
                (EntityType::Function, "F".to_string()),
            ]
        );
    }

    #[test]
    fn test_with_database_moves_database_policies_only() {
        let commands = parse_script(
            ".delete database dev policy retention
             .alter database dev policy ingestionbatching '{\"MaximumNumberOfItems\":5}'
             .delete table dev policy retention
             .drop table dev",
        )
        .unwrap();
        let staging = EntityName::new("staging");
        let ctx = ScriptingContext::new();
        let rendered: Vec<String> = commands
            .into_iter()
            .map(|c| c.with_database(&staging).to_script(&ctx))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ".delete database staging policy retention",
                ".alter database staging policy ingestionbatching ```{\"MaximumNumberOfItems\":5}```",
                ".delete table dev policy retention",
                ".drop table dev",
            ]
        );
    }

    #[test]
    fn test_data_loss_kinds() {
        assert!(CommandKind::DropTable.loses_data());
        assert!(CommandKind::AlterColumnType.loses_data());
        assert!(!CommandKind::DropFunction.loses_data());
        assert!(!CommandKind::DeleteRetentionPolicy.loses_data());
    }
}

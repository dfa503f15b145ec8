//! Schema state declared by a command sequence.

use indexmap::IndexMap;

use super::ReconcileError;
use crate::command::{
    ColumnType, Command, CreateFunctionCommand, EntityName, EntityPolicyTarget, EntityType,
    PolicyKind, TableColumn,
};

/// Columns of a table, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableState {
    columns: IndexMap<EntityName, ColumnType>,
}

impl TableState {
    fn merge(&mut self, columns: &[TableColumn]) {
        for column in columns {
            self.columns.insert(column.name.clone(), column.column_type);
        }
    }

    /// Returns the type of a column.
    #[must_use]
    pub fn column(&self, name: &EntityName) -> Option<ColumnType> {
        self.columns.get(name).copied()
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = TableColumn> + '_ {
        self.columns
            .iter()
            .map(|(name, ty)| TableColumn::new(name.clone(), *ty))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The entity a policy is keyed under.
///
/// A script describes one database, so database policies are keyed without
/// the database's name: a script read from `dev` and one read from `prod`
/// talk about the same database policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PolicyScope {
    Database,
    Table(EntityName),
}

/// Identifies one policy aspect of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyKey {
    pub kind: PolicyKind,
    pub scope: PolicyScope,
}

impl PolicyKey {
    #[must_use]
    pub fn new(kind: PolicyKind, target: &EntityPolicyTarget) -> Self {
        let scope = match target.entity_type() {
            EntityType::Database => PolicyScope::Database,
            _ => PolicyScope::Table(target.entity_name().clone()),
        };
        Self { kind, scope }
    }
}

/// What a script says about a policy aspect. A script that says nothing
/// has no entry at all.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyState {
    /// Set by an alter command, kept as written.
    Set(Command),
    /// Explicitly removed by a delete command, kept as written.
    Deleted(Command),
}

impl PolicyState {
    /// The declaring command.
    #[must_use]
    pub const fn command(&self) -> &Command {
        match self {
            Self::Set(cmd) | Self::Deleted(cmd) => cmd,
        }
    }
}

/// Tables, functions and policies declared by a script, each in first
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseState {
    pub tables: IndexMap<EntityName, TableState>,
    pub functions: IndexMap<EntityName, CreateFunctionCommand>,
    pub policies: IndexMap<PolicyKey, PolicyState>,
}

impl DatabaseState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a command sequence into a state.
    ///
    /// Table commands merge columns into their table; later function and
    /// policy commands replace earlier ones for the same key.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Unsupported` for commands that change a
    /// schema rather than declare it (drops and column type changes).
    pub fn from_commands(commands: &[Command]) -> Result<Self, ReconcileError> {
        let mut state = Self::new();
        for command in commands {
            state.apply(command)?;
        }
        Ok(state)
    }

    fn apply(&mut self, command: &Command) -> Result<(), ReconcileError> {
        match command {
            Command::CreateTable(cmd) => {
                self.tables
                    .entry(cmd.table().clone())
                    .or_default()
                    .merge(cmd.columns());
            }
            Command::AlterMergeTableColumns(cmd) => {
                self.tables
                    .entry(cmd.table().clone())
                    .or_default()
                    .merge(cmd.columns());
            }
            Command::CreateFunction(cmd) => {
                self.functions.insert(cmd.name().clone(), cmd.clone());
            }
            Command::AlterRetentionPolicy(cmd) => self.set_policy(
                PolicyKind::Retention,
                cmd.target(),
                PolicyState::Set(command.clone()),
            ),
            Command::DeleteRetentionPolicy(cmd) => self.set_policy(
                PolicyKind::Retention,
                cmd.target(),
                PolicyState::Deleted(command.clone()),
            ),
            Command::AlterIngestionBatchingPolicy(cmd) => self.set_policy(
                PolicyKind::IngestionBatching,
                cmd.target(),
                PolicyState::Set(command.clone()),
            ),
            Command::DeleteIngestionBatchingPolicy(cmd) => self.set_policy(
                PolicyKind::IngestionBatching,
                cmd.target(),
                PolicyState::Deleted(command.clone()),
            ),
            Command::DropTable(_)
            | Command::DropTableColumns(_)
            | Command::AlterColumnType(_)
            | Command::DropFunction(_) => {
                return Err(ReconcileError::Unsupported {
                    command: command.friendly_name(),
                    entity_type: command.entity_type(),
                    entity: command.entity_name().clone(),
                })
            }
        }
        Ok(())
    }

    fn set_policy(&mut self, kind: PolicyKind, target: &EntityPolicyTarget, state: PolicyState) {
        self.policies.insert(PolicyKey::new(kind, target), state);
    }
}

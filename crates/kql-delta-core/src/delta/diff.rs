//! State comparison and delta ordering.

use tracing::{debug, info};

use super::state::{DatabaseState, PolicyState, TableState};
use super::ReconcileError;
use crate::command::{
    AlterColumnTypeCommand, AlterMergeTableColumnsCommand, Command, CommandKind,
    CreateTableCommand, DeleteIngestionBatchingPolicyCommand, DeleteRetentionPolicyCommand,
    DropFunctionCommand, DropTableColumnsCommand, DropTableCommand, EntityName, TableColumn,
};

/// How a column whose type differs between current and target is changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColumnTypeChange {
    /// `.alter column T.c type=t`, keeping the data where it converts.
    #[default]
    Alter,
    /// Drop the column, then add it back with the new type.
    Recreate,
}

/// Options for the reconciler.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Strategy for column type changes.
    pub column_type_change: ColumnTypeChange,
}

impl ReconcileOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recreates columns whose type changed instead of altering them.
    #[must_use]
    pub const fn with_recreated_columns(mut self) -> Self {
        self.column_type_change = ColumnTypeChange::Recreate;
        self
    }
}

/// Execution rank of each command kind; the delta is stably sorted by it.
///
/// Containers are created before their dependents (tables before columns
/// and policies) and dependents are removed before their containers
/// (columns and policies before tables). Functions are dropped first and
/// created after every table change, so a function never outlives or
/// precedes the columns its body reads.
#[must_use]
pub const fn rank(kind: CommandKind) -> u8 {
    match kind {
        CommandKind::DropFunction => 0,
        CommandKind::DropTableColumns => 1,
        CommandKind::CreateTable => 2,
        CommandKind::AlterMergeTableColumns => 3,
        CommandKind::AlterColumnType => 4,
        CommandKind::CreateFunction => 5,
        CommandKind::AlterRetentionPolicy | CommandKind::AlterIngestionBatchingPolicy => 6,
        CommandKind::DeleteRetentionPolicy | CommandKind::DeleteIngestionBatchingPolicy => 7,
        CommandKind::DropTable => 8,
    }
}

/// Computes deltas between two schema states.
#[derive(Debug, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    /// Creates a reconciler with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reconciler with custom options.
    #[must_use]
    pub const fn with_options(options: ReconcileOptions) -> Self {
        Self { options }
    }

    /// Computes the commands turning `current` into `target`.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Unsupported` when either sequence holds a
    /// command that cannot declare schema state.
    pub fn reconcile(
        &self,
        current: &[Command],
        target: &[Command],
    ) -> Result<Vec<Command>, ReconcileError> {
        let current = DatabaseState::from_commands(current)?;
        let target = DatabaseState::from_commands(target)?;
        self.diff(&current, &target)
    }

    /// Computes the commands turning one state into the other.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Command` if an emitted command cannot be
    /// built, which only happens for states not built from commands.
    pub fn diff(
        &self,
        current: &DatabaseState,
        target: &DatabaseState,
    ) -> Result<Vec<Command>, ReconcileError> {
        let mut delta = Vec::new();
        self.diff_tables(current, target, &mut delta)?;
        diff_functions(current, target, &mut delta);
        diff_policies(current, target, &mut delta);

        // stable: equal ranks keep emission order
        delta.sort_by_key(|command| rank(command.kind()));

        info!(
            tables = target.tables.len(),
            functions = target.functions.len(),
            policies = target.policies.len(),
            commands = delta.len(),
            "Computed delta"
        );
        Ok(delta)
    }

    fn diff_tables(
        &self,
        current: &DatabaseState,
        target: &DatabaseState,
        delta: &mut Vec<Command>,
    ) -> Result<(), ReconcileError> {
        for (name, target_table) in &target.tables {
            match current.tables.get(name) {
                None => {
                    debug!(table = %name, "Table added");
                    let columns = target_table.columns().collect();
                    delta.push(CreateTableCommand::new(name.clone(), columns)?.into());
                }
                Some(current_table) => {
                    self.diff_table(name, current_table, target_table, delta)?;
                }
            }
        }
        for name in current.tables.keys() {
            if !target.tables.contains_key(name) {
                debug!(table = %name, "Table removed");
                delta.push(DropTableCommand::new(name.clone()).into());
            }
        }
        Ok(())
    }

    /// Compares the columns of one table.
    fn diff_table(
        &self,
        name: &EntityName,
        current: &TableState,
        target: &TableState,
        delta: &mut Vec<Command>,
    ) -> Result<(), ReconcileError> {
        let mut added: Vec<TableColumn> = Vec::new();
        let mut dropped: Vec<EntityName> = current
            .columns()
            .filter(|c| target.column(&c.name).is_none())
            .map(|c| c.name)
            .collect();

        for column in target.columns() {
            match current.column(&column.name) {
                None => added.push(column),
                Some(ty) if ty == column.column_type => {}
                Some(ty) => {
                    debug!(
                        table = %name,
                        column = %column.name,
                        from = %ty,
                        to = %column.column_type,
                        "Column type changed"
                    );
                    match self.options.column_type_change {
                        ColumnTypeChange::Alter => delta.push(
                            AlterColumnTypeCommand::new(
                                name.clone(),
                                column.name,
                                column.column_type,
                            )
                            .into(),
                        ),
                        ColumnTypeChange::Recreate => {
                            dropped.push(column.name.clone());
                            added.push(column);
                        }
                    }
                }
            }
        }

        if !dropped.is_empty() {
            debug!(table = %name, columns = dropped.len(), "Columns removed");
            delta.push(DropTableColumnsCommand::new(name.clone(), dropped)?.into());
        }
        if !added.is_empty() {
            debug!(table = %name, columns = added.len(), "Columns added");
            delta.push(AlterMergeTableColumnsCommand::new(name.clone(), added)?.into());
        }
        Ok(())
    }
}

fn diff_functions(current: &DatabaseState, target: &DatabaseState, delta: &mut Vec<Command>) {
    for (name, function) in &target.functions {
        if current.functions.get(name) != Some(function) {
            debug!(function = %name, "Function added or changed");
            delta.push(function.clone().into());
        }
    }
    for name in current.functions.keys() {
        if !target.functions.contains_key(name) {
            debug!(function = %name, "Function removed");
            delta.push(DropFunctionCommand::new(name.clone()).into());
        }
    }
}

fn diff_policies(current: &DatabaseState, target: &DatabaseState, delta: &mut Vec<Command>) {
    for (key, target_policy) in &target.policies {
        let unchanged = current
            .policies
            .get(key)
            .is_some_and(|current_policy| same_policy(current_policy, target_policy));
        if !unchanged {
            debug!(policy = %key.kind, "Policy set or deleted");
            delta.push(target_policy.command().clone());
        }
    }
    for (key, current_policy) in &current.policies {
        if target.policies.contains_key(key) {
            continue;
        }
        // a policy already deleted has nothing left to remove
        if let PolicyState::Set(command) = current_policy {
            if let Some(delete) = delete_equivalent(command) {
                debug!(policy = %key.kind, "Policy removed");
                delta.push(delete);
            }
        }
    }
}

/// Compares policy states of the same key: same variant and same payload.
fn same_policy(a: &PolicyState, b: &PolicyState) -> bool {
    match (a.command(), b.command()) {
        (Command::AlterRetentionPolicy(x), Command::AlterRetentionPolicy(y)) => {
            x.policy() == y.policy()
        }
        (Command::AlterIngestionBatchingPolicy(x), Command::AlterIngestionBatchingPolicy(y)) => {
            x.policy() == y.policy()
        }
        (Command::DeleteRetentionPolicy(_), Command::DeleteRetentionPolicy(_))
        | (Command::DeleteIngestionBatchingPolicy(_), Command::DeleteIngestionBatchingPolicy(_)) => {
            true
        }
        _ => false,
    }
}

fn delete_equivalent(command: &Command) -> Option<Command> {
    match command {
        Command::AlterRetentionPolicy(cmd) => {
            Some(DeleteRetentionPolicyCommand::new(cmd.target().clone()).into())
        }
        Command::AlterIngestionBatchingPolicy(cmd) => {
            Some(DeleteIngestionBatchingPolicyCommand::new(cmd.target().clone()).into())
        }
        _ => None,
    }
}

/// Computes the commands turning `current` into `target` with default
/// options.
///
/// # Errors
///
/// See [`Reconciler::reconcile`].
pub fn reconcile(current: &[Command], target: &[Command]) -> Result<Vec<Command>, ReconcileError> {
    Reconciler::new().reconcile(current, target)
}

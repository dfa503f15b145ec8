//! Table and column commands.

use std::collections::HashSet;
use std::fmt;

use super::context::ScriptingContext;
use super::entity::EntityName;
use super::error::CommandError;
use super::parse::{column_declarations, entity_name_at, name_list, type_reference};
use super::{Command, ControlCommand};
use crate::ast::{SyntaxKind, SyntaxNode};

/// Kusto scalar column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Bool,
    DateTime,
    Decimal,
    Dynamic,
    Guid,
    Int,
    Long,
    Real,
    String,
    TimeSpan,
}

impl ColumnType {
    /// Parses a type name, accepting the usual aliases.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::UnknownType` for anything else.
    pub fn from_code(raw: &str) -> Result<Self, CommandError> {
        let ty = match raw.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Self::Bool,
            "datetime" | "date" => Self::DateTime,
            "decimal" => Self::Decimal,
            "dynamic" => Self::Dynamic,
            "guid" | "uuid" | "uniqueid" => Self::Guid,
            "int" | "int32" => Self::Int,
            "long" | "int64" => Self::Long,
            "real" | "double" => Self::Real,
            "string" => Self::String,
            "timespan" | "time" => Self::TimeSpan,
            _ => return Err(CommandError::UnknownType(raw.trim().to_string())),
        };
        Ok(ty)
    }

    /// Returns the canonical type name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::DateTime => "datetime",
            Self::Decimal => "decimal",
            Self::Dynamic => "dynamic",
            Self::Guid => "guid",
            Self::Int => "int",
            Self::Long => "long",
            Self::Real => "real",
            Self::String => "string",
            Self::TimeSpan => "timespan",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column declaration: `name:type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// Column name.
    pub name: EntityName,
    /// Column type.
    pub column_type: ColumnType,
}

impl TableColumn {
    /// Creates a column declaration.
    #[must_use]
    pub fn new(name: impl Into<EntityName>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    #[must_use]
    pub fn to_script(&self) -> String {
        format!("{}:{}", self.name.to_script(), self.column_type)
    }
}

pub(crate) fn render_columns(columns: &[TableColumn]) -> String {
    columns
        .iter()
        .map(TableColumn::to_script)
        .collect::<Vec<_>>()
        .join(", ")
}

fn validate_columns(table: &EntityName, columns: &[TableColumn]) -> Result<(), CommandError> {
    if columns.is_empty() {
        return Err(CommandError::NoColumns(table.to_string()));
    }
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(&column.name) {
            return Err(CommandError::DuplicateColumn {
                table: table.to_string(),
                column: column.name.to_string(),
            });
        }
    }
    Ok(())
}

/// `.create table T (a:string, ...)`
///
/// Also read from `.create-merge table`, which declares the same state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableCommand {
    table: EntityName,
    columns: Vec<TableColumn>,
}

impl CreateTableCommand {
    /// Creates the command.
    ///
    /// # Errors
    ///
    /// Fails when `columns` is empty or declares a name twice.
    pub fn new(table: impl Into<EntityName>, columns: Vec<TableColumn>) -> Result<Self, CommandError> {
        let table = table.into();
        validate_columns(&table, &columns)?;
        Ok(Self { table, columns })
    }

    #[must_use]
    pub const fn table(&self) -> &EntityName {
        &self.table
    }

    #[must_use]
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }
}

impl ControlCommand for CreateTableCommand {
    const FRIENDLY_NAME: &'static str = ".create table";

    fn from_code(node: &SyntaxNode) -> Result<Self, CommandError> {
        let table = entity_name_at(node, 0, Self::FRIENDLY_NAME)?;
        let list = node
            .first_node(SyntaxKind::ColumnDeclarationList)
            .ok_or(CommandError::MissingElement {
                command: Self::FRIENDLY_NAME,
                element: "column list",
            })?;
        Self::new(table, column_declarations(list)?)
    }

    fn to_script(&self, _ctx: &ScriptingContext) -> String {
        format!(
            ".create table {} ({})",
            self.table.to_script(),
            render_columns(&self.columns)
        )
    }
}

impl From<CreateTableCommand> for Command {
    fn from(cmd: CreateTableCommand) -> Self {
        Self::CreateTable(cmd)
    }
}

/// `.alter-merge table T (c:dynamic)`: adds columns, keeps the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterMergeTableColumnsCommand {
    table: EntityName,
    columns: Vec<TableColumn>,
}

impl AlterMergeTableColumnsCommand {
    /// Creates the command.
    ///
    /// # Errors
    ///
    /// Fails when `columns` is empty or declares a name twice.
    pub fn new(table: impl Into<EntityName>, columns: Vec<TableColumn>) -> Result<Self, CommandError> {
        let table = table.into();
        validate_columns(&table, &columns)?;
        Ok(Self { table, columns })
    }

    #[must_use]
    pub const fn table(&self) -> &EntityName {
        &self.table
    }

    #[must_use]
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }
}

impl ControlCommand for AlterMergeTableColumnsCommand {
    const FRIENDLY_NAME: &'static str = ".alter-merge table";

    fn from_code(node: &SyntaxNode) -> Result<Self, CommandError> {
        let table = entity_name_at(node, 0, Self::FRIENDLY_NAME)?;
        let list = node
            .first_node(SyntaxKind::ColumnDeclarationList)
            .ok_or(CommandError::MissingElement {
                command: Self::FRIENDLY_NAME,
                element: "column list",
            })?;
        Self::new(table, column_declarations(list)?)
    }

    fn to_script(&self, _ctx: &ScriptingContext) -> String {
        format!(
            ".alter-merge table {} ({})",
            self.table.to_script(),
            render_columns(&self.columns)
        )
    }
}

impl From<AlterMergeTableColumnsCommand> for Command {
    fn from(cmd: AlterMergeTableColumnsCommand) -> Self {
        Self::AlterMergeTableColumns(cmd)
    }
}

/// `.drop table T`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTableCommand {
    /// Table name.
    pub table: EntityName,
}

impl DropTableCommand {
    #[must_use]
    pub fn new(table: impl Into<EntityName>) -> Self {
        Self {
            table: table.into(),
        }
    }
}

impl ControlCommand for DropTableCommand {
    const FRIENDLY_NAME: &'static str = ".drop table";

    fn from_code(node: &SyntaxNode) -> Result<Self, CommandError> {
        Ok(Self::new(entity_name_at(node, 0, Self::FRIENDLY_NAME)?))
    }

    fn to_script(&self, _ctx: &ScriptingContext) -> String {
        format!(".drop table {}", self.table.to_script())
    }
}

impl From<DropTableCommand> for Command {
    fn from(cmd: DropTableCommand) -> Self {
        Self::DropTable(cmd)
    }
}

/// `.drop table T columns (a, b)`
///
/// Also read from `.drop column T.c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTableColumnsCommand {
    table: EntityName,
    columns: Vec<EntityName>,
}

impl DropTableColumnsCommand {
    /// Creates the command.
    ///
    /// # Errors
    ///
    /// Fails when `columns` is empty.
    pub fn new(table: impl Into<EntityName>, columns: Vec<EntityName>) -> Result<Self, CommandError> {
        let table = table.into();
        if columns.is_empty() {
            return Err(CommandError::NoColumns(table.to_string()));
        }
        Ok(Self { table, columns })
    }

    #[must_use]
    pub const fn table(&self) -> &EntityName {
        &self.table
    }

    #[must_use]
    pub fn columns(&self) -> &[EntityName] {
        &self.columns
    }
}

impl ControlCommand for DropTableColumnsCommand {
    const FRIENDLY_NAME: &'static str = ".drop table columns";

    fn from_code(node: &SyntaxNode) -> Result<Self, CommandError> {
        let table = entity_name_at(node, 0, Self::FRIENDLY_NAME)?;
        let columns = if node.kind == SyntaxKind::DropColumnCommand {
            vec![entity_name_at(node, 1, Self::FRIENDLY_NAME)?]
        } else {
            let list = node
                .first_node(SyntaxKind::NameList)
                .ok_or(CommandError::MissingElement {
                    command: Self::FRIENDLY_NAME,
                    element: "column list",
                })?;
            name_list(list)?
        };
        Self::new(table, columns)
    }

    fn to_script(&self, _ctx: &ScriptingContext) -> String {
        let columns = self
            .columns
            .iter()
            .map(EntityName::to_script)
            .collect::<Vec<_>>()
            .join(", ");
        format!(".drop table {} columns ({columns})", self.table.to_script())
    }
}

impl From<DropTableColumnsCommand> for Command {
    fn from(cmd: DropTableColumnsCommand) -> Self {
        Self::DropTableColumns(cmd)
    }
}

/// `.alter column T.c type=long`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterColumnTypeCommand {
    /// Table name.
    pub table: EntityName,
    /// Column name.
    pub column: EntityName,
    /// The new type.
    pub column_type: ColumnType,
}

impl AlterColumnTypeCommand {
    #[must_use]
    pub fn new(
        table: impl Into<EntityName>,
        column: impl Into<EntityName>,
        column_type: ColumnType,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            column_type,
        }
    }
}

impl ControlCommand for AlterColumnTypeCommand {
    const FRIENDLY_NAME: &'static str = ".alter column type";

    fn from_code(node: &SyntaxNode) -> Result<Self, CommandError> {
        let table = entity_name_at(node, 0, Self::FRIENDLY_NAME)?;
        let column = entity_name_at(node, 1, Self::FRIENDLY_NAME)?;
        let type_node = node
            .child_nodes(SyntaxKind::TypeReference)
            .next()
            .ok_or(CommandError::MissingElement {
                command: Self::FRIENDLY_NAME,
                element: "column type",
            })?;
        Ok(Self::new(table, column, type_reference(type_node)?))
    }

    fn to_script(&self, _ctx: &ScriptingContext) -> String {
        format!(
            ".alter column {}.{} type={}",
            self.table.to_script(),
            self.column.to_script(),
            self.column_type
        )
    }
}

impl From<AlterColumnTypeCommand> for Command {
    fn from(cmd: AlterColumnTypeCommand) -> Self {
        Self::AlterColumnType(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_aliases() {
        assert_eq!(ColumnType::from_code("boolean").unwrap(), ColumnType::Bool);
        assert_eq!(ColumnType::from_code("double").unwrap(), ColumnType::Real);
        assert_eq!(ColumnType::from_code("Int64").unwrap(), ColumnType::Long);
        assert_eq!(ColumnType::from_code("uuid").unwrap(), ColumnType::Guid);
        assert!(matches!(
            ColumnType::from_code("varchar"),
            Err(CommandError::UnknownType(t)) if t == "varchar"
        ));
    }

    #[test]
    fn test_create_table_rejects_duplicate_columns() {
        let err = CreateTableCommand::new(
            "T",
            vec![
                TableColumn::new("a", ColumnType::String),
                TableColumn::new("a", ColumnType::Long),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::DuplicateColumn { column, .. } if column == "a"));
    }

    #[test]
    fn test_create_table_rejects_no_columns() {
        assert!(CreateTableCommand::new("T", vec![]).is_err());
        assert!(DropTableColumnsCommand::new("T", vec![]).is_err());
    }

    #[test]
    fn test_scripts() {
        let ctx = ScriptingContext::new();
        let create = CreateTableCommand::new(
            "my table",
            vec![
                TableColumn::new("a", ColumnType::String),
                TableColumn::new("b", ColumnType::Long),
            ],
        )
        .unwrap();
        assert_eq!(
            create.to_script(&ctx),
            ".create table ['my table'] (a:string, b:long)"
        );

        let drop = DropTableColumnsCommand::new("T", vec!["a".into(), "b".into()]).unwrap();
        assert_eq!(drop.to_script(&ctx), ".drop table T columns (a, b)");

        let alter = AlterColumnTypeCommand::new("T", "c", ColumnType::Real);
        assert_eq!(alter.to_script(&ctx), ".alter column T.c type=real");
    }
}

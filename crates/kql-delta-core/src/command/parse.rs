//! Parser adapter: from script text to a command sequence.

use thiserror::Error;

use super::entity::EntityName;
use super::error::CommandError;
use super::function::{CreateFunctionCommand, DropFunctionCommand};
use super::policy::{
    AlterIngestionBatchingPolicyCommand, AlterRetentionPolicyCommand,
    DeleteIngestionBatchingPolicyCommand, DeleteRetentionPolicyCommand,
};
use super::table::{
    AlterColumnTypeCommand, AlterMergeTableColumnsCommand, ColumnType, CreateTableCommand,
    DropTableColumnsCommand, DropTableCommand, TableColumn,
};
use super::{Command, ControlCommand};
use crate::ast::{NameReference, SyntaxElement, SyntaxKind, SyntaxNode};
use crate::lexer::{Location, Span, TokenKind};
use crate::parser::{ParseError, Parser};

type ParseFn = fn(&SyntaxNode) -> Result<Command, CommandError>;

fn parse_as<C>(node: &SyntaxNode) -> Result<Command, CommandError>
where
    C: ControlCommand + Into<Command>,
{
    C::from_code(node).map(Into::into)
}

/// Statement kinds and the command each one is read as.
const DISPATCH: &[(SyntaxKind, ParseFn)] = &[
    (SyntaxKind::CreateTableCommand, parse_as::<CreateTableCommand>),
    (SyntaxKind::AlterMergeTableCommand, parse_as::<AlterMergeTableColumnsCommand>),
    (SyntaxKind::DropTableCommand, parse_as::<DropTableCommand>),
    (SyntaxKind::DropTableColumnsCommand, parse_as::<DropTableColumnsCommand>),
    (SyntaxKind::DropColumnCommand, parse_as::<DropTableColumnsCommand>),
    (SyntaxKind::AlterColumnTypeCommand, parse_as::<AlterColumnTypeCommand>),
    (SyntaxKind::CreateFunctionCommand, parse_as::<CreateFunctionCommand>),
    (SyntaxKind::DropFunctionCommand, parse_as::<DropFunctionCommand>),
    (SyntaxKind::AlterRetentionPolicyCommand, parse_as::<AlterRetentionPolicyCommand>),
    (SyntaxKind::DeleteRetentionPolicyCommand, parse_as::<DeleteRetentionPolicyCommand>),
    (
        SyntaxKind::AlterIngestionBatchingPolicyCommand,
        parse_as::<AlterIngestionBatchingPolicyCommand>,
    ),
    (
        SyntaxKind::DeleteIngestionBatchingPolicyCommand,
        parse_as::<DeleteIngestionBatchingPolicyCommand>,
    ),
];

/// Returns the parse function registered for a statement kind.
pub(super) fn parser_for(kind: SyntaxKind) -> Option<ParseFn> {
    DISPATCH
        .iter()
        .find(|(registered, _)| *registered == kind)
        .map(|(_, parse)| *parse)
}

/// Errors from [`parse_script`]. Every variant locates the failing
/// statement in the script.
#[derive(Debug, Error)]
pub enum ParseScriptError {
    #[error("Syntax error at {location}: {source}")]
    Syntax {
        location: Location,
        #[source]
        source: ParseError,
    },

    #[error("Unsupported command at {location}: `{statement}`")]
    UnsupportedCommand {
        location: Location,
        span: Span,
        statement: String,
    },

    #[error("Invalid command at {location}: {source}")]
    InvalidCommand {
        location: Location,
        span: Span,
        statement: String,
        #[source]
        source: CommandError,
    },
}

impl ParseScriptError {
    /// Line and column of the failing statement.
    #[must_use]
    pub const fn location(&self) -> Location {
        match self {
            Self::Syntax { location, .. }
            | Self::UnsupportedCommand { location, .. }
            | Self::InvalidCommand { location, .. } => *location,
        }
    }
}

/// First line of a statement, for messages.
fn statement_excerpt(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or_default().trim();
    if first_line.len() < text.trim().len() {
        format!("{first_line} ...")
    } else {
        first_line.to_string()
    }
}

/// Parses a script into commands, in script order.
///
/// Fails as a whole on the first statement that is malformed or not a
/// supported command; no partial result is returned.
///
/// # Errors
///
/// Returns `ParseScriptError` locating the failing statement.
pub fn parse_script(script: &str) -> Result<Vec<Command>, ParseScriptError> {
    let root = Parser::new(script)
        .parse_script()
        .map_err(|source| ParseScriptError::Syntax {
            location: source.span.location(script),
            source,
        })?;
    parse_statements(&root, script)
}

/// Maps the statements of a parsed script to commands.
///
/// # Errors
///
/// Returns `ParseScriptError` for the first unsupported or invalid
/// statement.
pub fn parse_statements(root: &SyntaxNode, script: &str) -> Result<Vec<Command>, ParseScriptError> {
    root.children
        .iter()
        .filter_map(SyntaxElement::as_node)
        .map(|statement| {
            let location = statement.span.location(script);
            let parse = parser_for(statement.kind).ok_or_else(|| {
                ParseScriptError::UnsupportedCommand {
                    location,
                    span: statement.span,
                    statement: statement_excerpt(&statement.text),
                }
            })?;
            parse(statement).map_err(|source| ParseScriptError::InvalidCommand {
                location,
                span: statement.span,
                statement: statement_excerpt(&statement.text),
                source,
            })
        })
        .collect()
}

// ------------------------------------------------------------
// Syntax helpers shared by the command types
// ------------------------------------------------------------

/// The `index`-th name reference directly below `node`.
pub(super) fn entity_name_at(
    node: &SyntaxNode,
    index: usize,
    command: &'static str,
) -> Result<EntityName, CommandError> {
    let name = node
        .child_nodes(SyntaxKind::NameReference)
        .filter_map(NameReference::cast)
        .nth(index)
        .ok_or(CommandError::MissingName { command })?;
    EntityName::from_code(name.name())
}

/// Reads a type reference node.
pub(super) fn type_reference(node: &SyntaxNode) -> Result<ColumnType, CommandError> {
    let name = node
        .child_tokens()
        .find_map(|t| match &t.kind {
            TokenKind::Identifier(name) => Some(name.as_str()),
            _ => None,
        })
        .unwrap_or(node.text.as_str());
    ColumnType::from_code(name)
}

/// Reads the column declarations directly below `node`.
pub(super) fn column_declarations(node: &SyntaxNode) -> Result<Vec<TableColumn>, CommandError> {
    node.child_nodes(SyntaxKind::ColumnDeclaration)
        .map(|declaration| {
            let name = entity_name_at(declaration, 0, "column declaration")?;
            let type_node = declaration
                .child_nodes(SyntaxKind::TypeReference)
                .next()
                .ok_or(CommandError::MissingElement {
                    command: "column declaration",
                    element: "type",
                })?;
            Ok(TableColumn::new(name, type_reference(type_node)?))
        })
        .collect()
}

/// Reads the names of a name list node.
pub(super) fn name_list(node: &SyntaxNode) -> Result<Vec<EntityName>, CommandError> {
    node.child_nodes(SyntaxKind::NameReference)
        .filter_map(NameReference::cast)
        .map(|name| EntityName::from_code(name.name()))
        .collect()
}

/// Reads a `key=value` property as text.
pub(super) fn property_value(node: &SyntaxNode) -> Option<(String, String)> {
    let mut tokens = node.child_tokens();
    let key = match &tokens.next()?.kind {
        TokenKind::Identifier(key) => key.clone(),
        _ => return None,
    };
    let value = match &tokens.last()?.kind {
        TokenKind::String(value) | TokenKind::Identifier(value) => value.clone(),
        TokenKind::Integer(value) => value.to_string(),
        TokenKind::Real(value) => value.to_string(),
        _ => return None,
    };
    Some((key, value))
}

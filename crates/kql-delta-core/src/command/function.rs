//! Stored function commands.

use tracing::debug;

use super::context::ScriptingContext;
use super::entity::EntityName;
use super::error::CommandError;
use super::parse::{column_declarations, entity_name_at, property_value, type_reference};
use super::table::{render_columns, ColumnType, TableColumn};
use super::{Command, ControlCommand};
use crate::ast::{SyntaxKind, SyntaxNode};
use crate::lexer::TokenKind;

/// The declared type of a function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterType {
    /// A scalar parameter: `x:long`.
    Scalar(ColumnType),
    /// A tabular parameter accepting any schema: `t:(*)`.
    AnyTable,
    /// A tabular parameter with required columns: `t:(a:long)`.
    Table(Vec<TableColumn>),
}

impl ParameterType {
    #[must_use]
    pub fn to_script(&self) -> String {
        match self {
            Self::Scalar(ty) => ty.as_str().to_string(),
            Self::AnyTable => "(*)".to_string(),
            Self::Table(columns) => format!("({})", render_columns(columns)),
        }
    }
}

/// A function parameter: `name:type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParameter {
    pub name: EntityName,
    pub parameter_type: ParameterType,
}

impl FunctionParameter {
    #[must_use]
    pub fn new(name: impl Into<EntityName>, parameter_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            parameter_type,
        }
    }

    fn from_code(node: &SyntaxNode) -> Result<Self, CommandError> {
        let name = entity_name_at(node, 0, CreateFunctionCommand::FRIENDLY_NAME)?;
        let parameter_type = if let Some(ty) = node.child_nodes(SyntaxKind::TypeReference).next() {
            ParameterType::Scalar(type_reference(ty)?)
        } else if let Some(tabular) = node.child_nodes(SyntaxKind::TabularType).next() {
            let any = tabular
                .child_tokens()
                .any(|t| t.kind == TokenKind::Star);
            if any {
                ParameterType::AnyTable
            } else {
                ParameterType::Table(column_declarations(tabular)?)
            }
        } else {
            return Err(CommandError::MissingElement {
                command: CreateFunctionCommand::FRIENDLY_NAME,
                element: "parameter type",
            });
        };
        Ok(Self {
            name,
            parameter_type,
        })
    }

    fn to_script(&self) -> String {
        format!("{}:{}", self.name.to_script(), self.parameter_type.to_script())
    }
}

/// `.create-or-alter function with (folder=..., docstring=...) F(params) { body }`
///
/// Also read from `.create function`. Bodies are kept verbatim and compared
/// with whitespace runs collapsed.
#[derive(Debug, Clone, Eq)]
pub struct CreateFunctionCommand {
    name: EntityName,
    parameters: Vec<FunctionParameter>,
    body: String,
    folder: Option<String>,
    doc_string: Option<String>,
}

impl CreateFunctionCommand {
    /// Creates a function with no folder and no doc string.
    #[must_use]
    pub fn new(
        name: impl Into<EntityName>,
        parameters: Vec<FunctionParameter>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            body: body.into().trim().to_string(),
            folder: None,
            doc_string: None,
        }
    }

    /// Sets the folder. An empty folder is no folder.
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = non_empty(folder.into());
        self
    }

    /// Sets the doc string. An empty doc string is no doc string.
    #[must_use]
    pub fn with_doc_string(mut self, doc_string: impl Into<String>) -> Self {
        self.doc_string = non_empty(doc_string.into());
        self
    }

    #[must_use]
    pub const fn name(&self) -> &EntityName {
        &self.name
    }

    #[must_use]
    pub fn parameters(&self) -> &[FunctionParameter] {
        &self.parameters
    }

    /// The body without its enclosing braces.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    #[must_use]
    pub fn doc_string(&self) -> Option<&str> {
        self.doc_string.as_deref()
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

/// Quotes a property value so the lexer reads it back unchanged.
fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

impl PartialEq for CreateFunctionCommand {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.parameters == other.parameters
            && self.folder == other.folder
            && self.doc_string == other.doc_string
            && self.body.split_whitespace().eq(other.body.split_whitespace())
    }
}

impl ControlCommand for CreateFunctionCommand {
    const FRIENDLY_NAME: &'static str = ".create-or-alter function";

    fn from_code(node: &SyntaxNode) -> Result<Self, CommandError> {
        let name = entity_name_at(node, 0, Self::FRIENDLY_NAME)?;
        let parameters = node
            .first_node(SyntaxKind::FunctionParameterList)
            .map(|list| {
                list.child_nodes(SyntaxKind::FunctionParameter)
                    .map(FunctionParameter::from_code)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();
        let body = node
            .first_node(SyntaxKind::FunctionBody)
            .ok_or(CommandError::MissingElement {
                command: Self::FRIENDLY_NAME,
                element: "body",
            })?;
        let inner = body
            .text
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(&body.text);

        let mut command = Self::new(name, parameters, inner);
        if let Some(properties) = node.first_node(SyntaxKind::PropertyList) {
            for property in properties.child_nodes(SyntaxKind::Property) {
                let Some((key, value)) = property_value(property) else {
                    continue;
                };
                match key.to_ascii_lowercase().as_str() {
                    "folder" => command = command.with_folder(value),
                    "docstring" => command = command.with_doc_string(value),
                    _ => debug!(function = %command.name, property = %key, "Ignoring function property"),
                }
            }
        }
        Ok(command)
    }

    fn to_script(&self, _ctx: &ScriptingContext) -> String {
        let mut properties = Vec::new();
        if let Some(folder) = &self.folder {
            properties.push(format!("folder={}", quote_string(folder)));
        }
        if let Some(doc_string) = &self.doc_string {
            properties.push(format!("docstring={}", quote_string(doc_string)));
        }
        let with = if properties.is_empty() {
            String::new()
        } else {
            format!("with ({}) ", properties.join(", "))
        };
        let parameters = self
            .parameters
            .iter()
            .map(FunctionParameter::to_script)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            ".create-or-alter function {with}{}({parameters}) {{\n{}\n}}",
            self.name.to_script(),
            self.body
        )
    }
}

impl From<CreateFunctionCommand> for Command {
    fn from(cmd: CreateFunctionCommand) -> Self {
        Self::CreateFunction(cmd)
    }
}

/// `.drop function F`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropFunctionCommand {
    /// Function name.
    pub name: EntityName,
}

impl DropFunctionCommand {
    #[must_use]
    pub fn new(name: impl Into<EntityName>) -> Self {
        Self { name: name.into() }
    }
}

impl ControlCommand for DropFunctionCommand {
    const FRIENDLY_NAME: &'static str = ".drop function";

    fn from_code(node: &SyntaxNode) -> Result<Self, CommandError> {
        Ok(Self::new(entity_name_at(node, 0, Self::FRIENDLY_NAME)?))
    }

    fn to_script(&self, _ctx: &ScriptingContext) -> String {
        format!(".drop function {}", self.name.to_script())
    }
}

impl From<DropFunctionCommand> for Command {
    fn from(cmd: DropFunctionCommand) -> Self {
        Self::DropFunction(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_equality_ignores_whitespace() {
        let a = CreateFunctionCommand::new("F", vec![], "T | where x > 1");
        let b = CreateFunctionCommand::new("F", vec![], "\n  T\n  | where x > 1\n");
        let c = CreateFunctionCommand::new("F", vec![], "T | where x > 2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_folder_participates_in_equality() {
        let a = CreateFunctionCommand::new("F", vec![], "T");
        assert_eq!(a.clone().with_folder(""), a);
        assert_ne!(a.clone().with_folder("reports"), a);
    }

    #[test]
    fn test_script() {
        let f = CreateFunctionCommand::new(
            "F",
            vec![
                FunctionParameter::new("x", ParameterType::Scalar(ColumnType::Long)),
                FunctionParameter::new("t", ParameterType::AnyTable),
            ],
            "t | where v > x",
        )
        .with_folder("a\\b")
        .with_doc_string("say \"hi\"");
        assert_eq!(
            f.to_script(&ScriptingContext::new()),
            ".create-or-alter function with (folder=\"a\\\\b\", docstring=\"say \\\"hi\\\"\") F(x:long, t:(*)) {\nt | where v > x\n}"
        );
    }
}

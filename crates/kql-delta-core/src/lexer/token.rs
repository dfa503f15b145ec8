//! Token types for the control-command lexer.

use std::fmt;

use super::Span;

/// Reserved words of the control-command grammar.
///
/// Kusto keywords are case-sensitive, so only the lower-case spelling
/// is recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Table,
    Tables,
    Database,
    Cluster,
    Column,
    Columns,
    Function,
    Policy,
    Retention,
    IngestionBatching,
    With,
    Type,
    IfExists,
}

impl Keyword {
    /// Attempts to parse a keyword from a string.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "table" => Some(Self::Table),
            "tables" => Some(Self::Tables),
            "database" => Some(Self::Database),
            "cluster" => Some(Self::Cluster),
            "column" => Some(Self::Column),
            "columns" => Some(Self::Columns),
            "function" => Some(Self::Function),
            "policy" => Some(Self::Policy),
            "retention" => Some(Self::Retention),
            "ingestionbatching" => Some(Self::IngestionBatching),
            "with" => Some(Self::With),
            "type" => Some(Self::Type),
            "ifexists" => Some(Self::IfExists),
            _ => None,
        }
    }

    /// Returns the keyword as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Tables => "tables",
            Self::Database => "database",
            Self::Cluster => "cluster",
            Self::Column => "column",
            Self::Columns => "columns",
            Self::Function => "function",
            Self::Policy => "policy",
            Self::Retention => "retention",
            Self::IngestionBatching => "ingestionbatching",
            Self::With => "with",
            Self::Type => "type",
            Self::IfExists => "ifexists",
        }
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Integer literal (e.g., 42)
    Integer(i64),
    /// Real literal (e.g., 1.5)
    Real(f64),
    /// String literal with quotes and escapes resolved. Covers `"..."`,
    /// `'...'`, `@"..."` and triple-backtick multi-line strings.
    String(String),

    // Names
    /// Identifier, kept as written. Bracketed forms (`[x]`, `['x']`,
    /// `["x"]`) keep their brackets; stripping belongs to the command
    /// model.
    Identifier(String),
    /// Reserved word
    Keyword(Keyword),
    /// Control command verb following a leading dot, without the dot
    /// (e.g. `create-or-alter`).
    Command(String),

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// {
    LeftBrace,
    /// }
    RightBrace,
    /// [
    LeftBracket,
    /// ]
    RightBracket,
    /// ,
    Comma,
    /// :
    Colon,
    /// ;
    Semicolon,
    /// =
    Eq,
    /// .
    Dot,
    /// *
    Star,
    /// Any other punctuation; only meaningful inside function bodies.
    Symbol(char),

    // Special
    /// End of input
    Eof,
    /// Invalid/unterminated token
    Error(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "integer `{value}`"),
            Self::Real(value) => write!(f, "real `{value}`"),
            Self::String(_) => f.write_str("string literal"),
            Self::Identifier(name) => write!(f, "identifier `{name}`"),
            Self::Keyword(keyword) => write!(f, "keyword `{}`", keyword.as_str()),
            Self::Command(verb) => write!(f, "command `.{verb}`"),
            Self::LeftParen => f.write_str("'('"),
            Self::RightParen => f.write_str("')'"),
            Self::LeftBrace => f.write_str("'{'"),
            Self::RightBrace => f.write_str("'}'"),
            Self::LeftBracket => f.write_str("'['"),
            Self::RightBracket => f.write_str("']'"),
            Self::Comma => f.write_str("','"),
            Self::Colon => f.write_str("':'"),
            Self::Semicolon => f.write_str("';'"),
            Self::Eq => f.write_str("'='"),
            Self::Dot => f.write_str("'.'"),
            Self::Star => f.write_str("'*'"),
            Self::Symbol(c) => write!(f, "'{c}'"),
            Self::Eof => f.write_str("end of input"),
            Self::Error(message) => f.write_str(message),
        }
    }
}

/// A token with its span in the script text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the script text.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }

    /// Returns true if this token is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.as_keyword() == Some(keyword)
    }
}

//! Parser error types.

use crate::lexer::{Span, TokenKind};

/// A grammar-level parse error.
///
/// Positions are byte offsets; the command layer turns them into
/// line/column locations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    /// What the grammar expected, for "unexpected token" errors.
    pub expected: Option<String>,
    pub found: Option<TokenKind>,
}

impl ParseError {
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: None,
            found: None,
        }
    }

    /// Expected `expected`, found the token `found` at `span`.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: TokenKind, span: Span) -> Self {
        let expected = expected.into();
        let message = if found == TokenKind::Eof {
            format!("Expected {expected} before the end of the script")
        } else {
            format!("Expected {expected}, found {found}")
        };
        Self {
            message,
            span,
            expected: Some(expected),
            found: Some(found),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_message() {
        let err = ParseError::unexpected(
            "':'",
            TokenKind::Identifier(String::from("string")),
            Span::new(3, 9),
        );
        assert_eq!(err.to_string(), "Expected ':', found identifier `string`");

        let err = ParseError::unexpected("'}'", TokenKind::Eof, Span::new(9, 9));
        assert_eq!(err.to_string(), "Expected '}' before the end of the script");
        assert_eq!(err.found, Some(TokenKind::Eof));
    }
}

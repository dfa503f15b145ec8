//! Control-command grammar parser.
//!
//! A hand-written recursive descent parser producing an untyped
//! [`SyntaxNode`](crate::ast::SyntaxNode) tree. Statements it recognises but
//! does not model (`.show`, `.set`, other policy kinds, ...) become
//! [`SyntaxKind::UnknownCommand`](crate::ast::SyntaxKind::UnknownCommand)
//! nodes; rejecting them is left to the command model.

mod error;
mod parser;

pub use error::ParseError;
pub use parser::Parser;

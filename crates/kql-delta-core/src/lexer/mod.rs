//! Control-command lexer.
//!
//! Hand-written lexer for Kusto control-command scripts. Function bodies are
//! tokenized too, but only so their extent can be found; their text is
//! recovered from spans.

mod span;
mod token;
mod tokenizer;

pub use span::{Location, Span};
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;

//! Control-command tokenizer implementation.

use super::{Keyword, Span, Token, TokenKind};

/// A lexer that tokenizes Kusto control-command scripts.
pub struct Lexer<'a> {
    /// The input script.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    /// Returns the input being tokenized.
    #[must_use]
    pub const fn source(&self) -> &'a str {
        self.input
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skips whitespace and `//` comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }

            if self.peek() == Some('/') && self.peek_next() == Some('/') {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            break;
        }
    }

    /// Creates a span from start to current position.
    const fn make_span(&self) -> Span {
        Span::new(self.start, self.pos)
    }

    /// Creates a token with the current span.
    const fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    /// Returns true when the character before the current token opens a
    /// new statement (start of input, whitespace or `;`).
    fn at_statement_boundary(&self) -> bool {
        self.input[..self.start]
            .chars()
            .next_back()
            .map_or(true, |c| c.is_whitespace() || c == ';')
    }

    /// Scans an identifier or keyword.
    fn scan_identifier(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let text = &self.input[self.start..self.pos];
        match Keyword::from_str(text) {
            Some(keyword) => self.make_token(TokenKind::Keyword(keyword)),
            None => self.make_token(TokenKind::Identifier(text.to_string())),
        }
    }

    /// Scans a control command verb after its leading dot.
    fn scan_command(&mut self) -> Token {
        let verb_start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            self.advance();
        }
        let verb = self.input[verb_start..self.pos].to_string();
        self.make_token(TokenKind::Command(verb))
    }

    /// Scans a bracketed identifier: `['name']`, `["name"]` or `[name]`.
    ///
    /// Falls back to a plain `[` token when the bracket does not enclose a
    /// name, which happens inside function bodies (`dynamic([1, 2])`).
    fn scan_bracketed(&mut self) -> Token {
        match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                if let Err(message) = self.skip_quoted(quote) {
                    return self.make_token(TokenKind::Error(message));
                }
                if self.peek() == Some(']') {
                    self.advance();
                    let text = self.input[self.start..self.pos].to_string();
                    self.make_token(TokenKind::Identifier(text))
                } else {
                    self.make_token(TokenKind::Error(String::from(
                        "Expected ']' after quoted identifier",
                    )))
                }
            }
            _ => {
                let rest = &self.input[self.pos..];
                let name_len = rest
                    .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | ' ' | '-' | '.')))
                    .unwrap_or(rest.len());
                if name_len > 0 && rest[name_len..].starts_with(']') {
                    self.pos += name_len + 1;
                    let text = self.input[self.start..self.pos].to_string();
                    self.make_token(TokenKind::Identifier(text))
                } else {
                    self.make_token(TokenKind::LeftBracket)
                }
            }
        }
    }

    /// Consumes a backslash-escaped quoted run, including both quotes.
    fn skip_quoted(&mut self, quote: char) -> Result<String, String> {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(c) => value.push(c),
                    None => return Err(String::from("Unterminated string literal")),
                },
                Some(c) if c == quote => return Ok(value),
                Some(c) => value.push(c),
                None => return Err(String::from("Unterminated string literal")),
            }
        }
    }

    /// Scans a `"..."` or `'...'` string literal.
    fn scan_string(&mut self, quote: char) -> Token {
        match self.skip_quoted(quote) {
            Ok(value) => self.make_token(TokenKind::String(value)),
            Err(message) => self.make_token(TokenKind::Error(message)),
        }
    }

    /// Scans a verbatim `@"..."` string, where `""` escapes a quote.
    fn scan_verbatim_string(&mut self) -> Token {
        self.advance(); // @
        let quote = match self.advance() {
            Some(q @ ('"' | '\'')) => q,
            _ => return self.make_token(TokenKind::Symbol('@')),
        };
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.advance();
                        value.push(quote);
                    } else {
                        return self.make_token(TokenKind::String(value));
                    }
                }
                Some(c) => value.push(c),
                None => {
                    return self.make_token(TokenKind::Error(String::from(
                        "Unterminated string literal",
                    )))
                }
            }
        }
    }

    /// Scans a triple-backtick multi-line string.
    fn scan_multiline_string(&mut self) -> Token {
        let body_start = self.start + 3;
        match self.input[body_start..].find("```") {
            Some(offset) => {
                let value = self.input[body_start..body_start + offset].to_string();
                self.pos = body_start + offset + 3;
                self.make_token(TokenKind::String(value))
            }
            None => {
                self.pos = self.input.len();
                self.make_token(TokenKind::Error(String::from(
                    "Unterminated multi-line string literal",
                )))
            }
        }
    }

    /// Scans a number (integer or real).
    fn scan_number(&mut self) -> Token {
        let mut is_real = false;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_real = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = &self.input[self.start..self.pos];
        if is_real {
            match text.parse::<f64>() {
                Ok(f) => self.make_token(TokenKind::Real(f)),
                Err(e) => self.make_token(TokenKind::Error(format!("Invalid real: {e}"))),
            }
        } else {
            match text.parse::<i64>() {
                Ok(i) => self.make_token(TokenKind::Integer(i)),
                Err(e) => self.make_token(TokenKind::Error(format!("Invalid integer: {e}"))),
            }
        }
    }

    /// Scans the next token.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        self.start = self.pos;

        let Some(c) = self.advance() else {
            return self.make_token(TokenKind::Eof);
        };

        match c {
            '(' => self.make_token(TokenKind::LeftParen),
            ')' => self.make_token(TokenKind::RightParen),
            '{' => self.make_token(TokenKind::LeftBrace),
            '}' => self.make_token(TokenKind::RightBrace),
            ']' => self.make_token(TokenKind::RightBracket),
            ',' => self.make_token(TokenKind::Comma),
            ':' => self.make_token(TokenKind::Colon),
            ';' => self.make_token(TokenKind::Semicolon),
            '=' => self.make_token(TokenKind::Eq),
            '*' => self.make_token(TokenKind::Star),
            '[' => self.scan_bracketed(),

            '.' if self.peek().is_some_and(|c| c.is_ascii_alphabetic())
                && self.at_statement_boundary() =>
            {
                self.scan_command()
            }
            '.' => self.make_token(TokenKind::Dot),

            '`' if self.input[self.start..].starts_with("```") => self.scan_multiline_string(),
            '"' | '\'' => {
                self.pos = self.start;
                self.scan_string(c)
            }
            '@' if matches!(self.peek(), Some('"' | '\'')) => {
                self.pos = self.start;
                self.scan_verbatim_string()
            }

            c if c.is_ascii_digit() => {
                self.pos = self.start;
                self.scan_number()
            }

            c if c.is_alphabetic() || c == '_' => {
                self.pos = self.start;
                self.scan_identifier()
            }

            other => self.make_token(TokenKind::Symbol(other)),
        }
    }

    /// Tokenizes the entire input, including the trailing EOF token.
    #[must_use]
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

//! Control-command parser implementation.

use super::error::ParseError;
use crate::ast::{SyntaxElement, SyntaxKind, SyntaxNode};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// Control-command parser.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given script.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Lexer::new(source).tokenize(),
            pos: 0,
        }
    }

    /// Parses the whole script into a [`SyntaxKind::CommandBlock`] node.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` on the first malformed statement; no partial
    /// tree is produced.
    pub fn parse_script(&mut self) -> Result<SyntaxNode, ParseError> {
        let mut root = SyntaxNode::new(
            SyntaxKind::CommandBlock,
            Span::new(0, self.source.len()),
            self.source,
        );
        loop {
            while self.check(&TokenKind::Semicolon) {
                self.advance();
            }
            if self.current().is_eof() {
                break;
            }
            let statement = self.parse_statement()?;
            root.children.push(SyntaxElement::Node(statement));
        }
        Ok(root)
    }

    /// Parses a single control command.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the input does not start with a control
    /// command or if a recognised command is malformed.
    pub fn parse_statement(&mut self) -> Result<SyntaxNode, ParseError> {
        let start = self.pos;
        let verb = match &self.current().kind {
            TokenKind::Command(verb) => verb.clone(),
            _ => return Err(self.error_here("control command")),
        };
        let mut children = vec![self.advance_element()];

        let kind = match verb.as_str() {
            "create" | "create-merge" if self.check_keyword(Keyword::Table) => {
                self.parse_table_declaration(&mut children)?;
                SyntaxKind::CreateTableCommand
            }
            "alter-merge" if self.check_keyword(Keyword::Table) => {
                self.parse_table_declaration(&mut children)?;
                SyntaxKind::AlterMergeTableCommand
            }
            "create" | "create-or-alter" if self.check_keyword(Keyword::Function) => {
                self.parse_function_declaration(&mut children)?;
                SyntaxKind::CreateFunctionCommand
            }
            "alter" if self.check_keyword(Keyword::Column) => {
                self.parse_alter_column_type(&mut children)?;
                SyntaxKind::AlterColumnTypeCommand
            }
            "drop" if self.check_keyword(Keyword::Table) => self.parse_drop_table(&mut children)?,
            "drop" if self.check_keyword(Keyword::Column) => {
                children.push(self.advance_element());
                self.parse_qualified_column(&mut children)?;
                SyntaxKind::DropColumnCommand
            }
            "drop" if self.check_keyword(Keyword::Function) => {
                children.push(self.advance_element());
                children.push(self.parse_name_reference()?);
                self.parse_optional_keyword(Keyword::IfExists, &mut children);
                SyntaxKind::DropFunctionCommand
            }
            "alter" | "delete" => match self.policy_kind_ahead() {
                Some(policy) => {
                    let alter = verb == "alter";
                    self.parse_policy_command(alter, &mut children)?;
                    match (policy, alter) {
                        (Keyword::Retention, true) => SyntaxKind::AlterRetentionPolicyCommand,
                        (Keyword::Retention, false) => SyntaxKind::DeleteRetentionPolicyCommand,
                        (_, true) => SyntaxKind::AlterIngestionBatchingPolicyCommand,
                        (_, false) => SyntaxKind::DeleteIngestionBatchingPolicyCommand,
                    }
                }
                None => return self.parse_unknown_command(start),
            },
            _ => return self.parse_unknown_command(start),
        };

        self.expect_statement_end()?;
        Ok(self.finish(kind, children))
    }

    // ------------------------------------------------------------
    // Tables and columns
    // ------------------------------------------------------------

    /// `table Name (a:type, ...)`
    fn parse_table_declaration(
        &mut self,
        children: &mut Vec<SyntaxElement>,
    ) -> Result<(), ParseError> {
        children.push(self.expect_keyword(Keyword::Table)?);
        children.push(self.parse_name_reference()?);
        children.push(self.parse_column_declaration_list()?);
        Ok(())
    }

    /// `(a:type, b:type)`
    fn parse_column_declaration_list(&mut self) -> Result<SyntaxElement, ParseError> {
        let mut children = vec![self.expect(&TokenKind::LeftParen, "'('")?];
        loop {
            children.push(self.parse_column_declaration()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            children.push(self.advance_element());
        }
        children.push(self.expect(&TokenKind::RightParen, "')'")?);
        Ok(SyntaxElement::Node(
            self.finish(SyntaxKind::ColumnDeclarationList, children),
        ))
    }

    /// `name:type`
    fn parse_column_declaration(&mut self) -> Result<SyntaxElement, ParseError> {
        let children = vec![
            self.parse_name_reference()?,
            self.expect(&TokenKind::Colon, "':'")?,
            self.parse_type_reference()?,
        ];
        Ok(SyntaxElement::Node(
            self.finish(SyntaxKind::ColumnDeclaration, children),
        ))
    }

    /// `column Table.Column type = t`
    fn parse_alter_column_type(
        &mut self,
        children: &mut Vec<SyntaxElement>,
    ) -> Result<(), ParseError> {
        children.push(self.expect_keyword(Keyword::Column)?);
        self.parse_qualified_column(children)?;
        children.push(self.expect_keyword(Keyword::Type)?);
        children.push(self.expect(&TokenKind::Eq, "'='")?);
        children.push(self.parse_type_reference()?);
        Ok(())
    }

    /// `Table.Column`
    fn parse_qualified_column(
        &mut self,
        children: &mut Vec<SyntaxElement>,
    ) -> Result<(), ParseError> {
        children.push(self.parse_name_reference()?);
        children.push(self.expect(&TokenKind::Dot, "'.'")?);
        children.push(self.parse_name_reference()?);
        Ok(())
    }

    /// `table Name [ifexists]` or `table Name columns (a, b)`
    fn parse_drop_table(
        &mut self,
        children: &mut Vec<SyntaxElement>,
    ) -> Result<SyntaxKind, ParseError> {
        children.push(self.expect_keyword(Keyword::Table)?);
        children.push(self.parse_name_reference()?);
        if self.check_keyword(Keyword::Columns) {
            children.push(self.advance_element());
            children.push(self.parse_name_list()?);
            Ok(SyntaxKind::DropTableColumnsCommand)
        } else {
            self.parse_optional_keyword(Keyword::IfExists, children);
            Ok(SyntaxKind::DropTableCommand)
        }
    }

    /// `(a, b)`
    fn parse_name_list(&mut self) -> Result<SyntaxElement, ParseError> {
        let mut children = vec![self.expect(&TokenKind::LeftParen, "'('")?];
        loop {
            children.push(self.parse_name_reference()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            children.push(self.advance_element());
        }
        children.push(self.expect(&TokenKind::RightParen, "')'")?);
        Ok(SyntaxElement::Node(self.finish(SyntaxKind::NameList, children)))
    }

    // ------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------

    /// `function [with (k=v, ...)] Name(params) { body }`
    fn parse_function_declaration(
        &mut self,
        children: &mut Vec<SyntaxElement>,
    ) -> Result<(), ParseError> {
        children.push(self.expect_keyword(Keyword::Function)?);
        if self.check_keyword(Keyword::With) {
            children.push(self.parse_property_list()?);
        }
        children.push(self.parse_name_reference()?);
        children.push(self.parse_function_parameters()?);
        children.push(self.parse_function_body()?);
        Ok(())
    }

    /// `with (k=v, ...)`
    fn parse_property_list(&mut self) -> Result<SyntaxElement, ParseError> {
        let mut children = vec![
            self.expect_keyword(Keyword::With)?,
            self.expect(&TokenKind::LeftParen, "'('")?,
        ];
        loop {
            let mut property = vec![self.expect_identifier("property name")?];
            property.push(self.expect(&TokenKind::Eq, "'='")?);
            match &self.current().kind {
                TokenKind::String(_)
                | TokenKind::Identifier(_)
                | TokenKind::Integer(_)
                | TokenKind::Real(_) => property.push(self.advance_element()),
                _ => return Err(self.error_here("property value")),
            }
            children.push(SyntaxElement::Node(
                self.finish(SyntaxKind::Property, property),
            ));
            if !self.check(&TokenKind::Comma) {
                break;
            }
            children.push(self.advance_element());
        }
        children.push(self.expect(&TokenKind::RightParen, "')'")?);
        Ok(SyntaxElement::Node(
            self.finish(SyntaxKind::PropertyList, children),
        ))
    }

    /// `(x:long, t:(*))`
    fn parse_function_parameters(&mut self) -> Result<SyntaxElement, ParseError> {
        let mut children = vec![self.expect(&TokenKind::LeftParen, "'('")?];
        if !self.check(&TokenKind::RightParen) {
            loop {
                let mut parameter = vec![
                    self.parse_name_reference()?,
                    self.expect(&TokenKind::Colon, "':'")?,
                ];
                if self.check(&TokenKind::LeftParen) {
                    parameter.push(self.parse_tabular_type()?);
                } else {
                    parameter.push(self.parse_type_reference()?);
                }
                children.push(SyntaxElement::Node(
                    self.finish(SyntaxKind::FunctionParameter, parameter),
                ));
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                children.push(self.advance_element());
            }
        }
        children.push(self.expect(&TokenKind::RightParen, "')'")?);
        Ok(SyntaxElement::Node(
            self.finish(SyntaxKind::FunctionParameterList, children),
        ))
    }

    /// `(*)` or `(a:long, ...)`
    fn parse_tabular_type(&mut self) -> Result<SyntaxElement, ParseError> {
        let children = if self.peek_kind(1) == Some(&TokenKind::Star) {
            vec![
                self.advance_element(),
                self.advance_element(),
                self.expect(&TokenKind::RightParen, "')'")?,
            ]
        } else {
            match self.parse_column_declaration_list()? {
                SyntaxElement::Node(list) => list.children,
                token @ SyntaxElement::Token(_) => vec![token],
            }
        };
        Ok(SyntaxElement::Node(
            self.finish(SyntaxKind::TabularType, children),
        ))
    }

    /// `{ ... }` with balanced braces. The body is not parsed further.
    fn parse_function_body(&mut self) -> Result<SyntaxElement, ParseError> {
        let mut children = vec![self.expect(&TokenKind::LeftBrace, "'{'")?];
        let mut depth = 1usize;
        while depth > 0 {
            match &self.current().kind {
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => depth -= 1,
                TokenKind::Eof => return Err(self.error_here("'}'")),
                TokenKind::Error(message) => {
                    return Err(ParseError::new(message.clone(), self.current().span))
                }
                _ => {}
            }
            children.push(self.advance_element());
        }
        Ok(SyntaxElement::Node(
            self.finish(SyntaxKind::FunctionBody, children),
        ))
    }

    // ------------------------------------------------------------
    // Policies
    // ------------------------------------------------------------

    /// Looks ahead for `<entity> [Name] policy <kind>` and returns the
    /// policy keyword when the kind is one the grammar models.
    fn policy_kind_ahead(&self) -> Option<Keyword> {
        let mut i = self.pos;
        match self.tokens.get(i).and_then(Token::as_keyword) {
            Some(Keyword::Table | Keyword::Database) => {
                i += 1;
                if matches!(
                    self.tokens.get(i).map(|t| &t.kind),
                    Some(TokenKind::Identifier(_))
                ) {
                    i += 1;
                }
            }
            Some(Keyword::Cluster) => i += 1,
            _ => return None,
        }
        if !self.tokens.get(i).is_some_and(|t| t.is_keyword(Keyword::Policy)) {
            return None;
        }
        match self.tokens.get(i + 1).and_then(Token::as_keyword) {
            Some(kw @ (Keyword::Retention | Keyword::IngestionBatching)) => Some(kw),
            _ => None,
        }
    }

    /// `<entity> [Name] policy <kind> [payload]`
    fn parse_policy_command(
        &mut self,
        with_payload: bool,
        children: &mut Vec<SyntaxElement>,
    ) -> Result<(), ParseError> {
        // entity keyword, validated by `policy_kind_ahead`
        children.push(self.advance_element());
        if matches!(self.current().kind, TokenKind::Identifier(_)) {
            children.push(self.parse_name_reference()?);
        }
        children.push(self.expect_keyword(Keyword::Policy)?);
        // policy kind, validated by `policy_kind_ahead`
        children.push(self.advance_element());
        if with_payload {
            if !matches!(self.current().kind, TokenKind::String(_)) {
                return Err(self.error_here("policy JSON string"));
            }
            let payload = vec![self.advance_element()];
            children.push(SyntaxElement::Node(
                self.finish(SyntaxKind::PolicyPayload, payload),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------
    // Unknown commands
    // ------------------------------------------------------------

    /// Consumes an unmodelled command up to the next statement.
    fn parse_unknown_command(&mut self, start: usize) -> Result<SyntaxNode, ParseError> {
        self.pos = start;
        let mut children = vec![self.advance_element()];
        let mut depth = 0usize;
        loop {
            match &self.current().kind {
                TokenKind::Eof => break,
                TokenKind::Command(_) | TokenKind::Semicolon if depth == 0 => break,
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace => depth = depth.saturating_sub(1),
                TokenKind::Error(message) => {
                    return Err(ParseError::new(message.clone(), self.current().span))
                }
                _ => {}
            }
            children.push(self.advance_element());
        }
        Ok(self.finish(SyntaxKind::UnknownCommand, children))
    }

    // ------------------------------------------------------------
    // Names and types
    // ------------------------------------------------------------

    fn parse_name_reference(&mut self) -> Result<SyntaxElement, ParseError> {
        let token = self.expect_identifier("name")?;
        Ok(SyntaxElement::Node(
            self.finish(SyntaxKind::NameReference, vec![token]),
        ))
    }

    fn parse_type_reference(&mut self) -> Result<SyntaxElement, ParseError> {
        let token = self.expect_identifier("type name")?;
        Ok(SyntaxElement::Node(
            self.finish(SyntaxKind::TypeReference, vec![token]),
        ))
    }

    fn parse_optional_keyword(&mut self, keyword: Keyword, children: &mut Vec<SyntaxElement>) {
        if self.check_keyword(keyword) {
            children.push(self.advance_element());
        }
    }

    // ------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------

    fn current(&self) -> &Token {
        // the token list always ends with EOF
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    fn advance_element(&mut self) -> SyntaxElement {
        SyntaxElement::Token(self.advance())
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current().is_keyword(keyword)
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<SyntaxElement, ParseError> {
        if self.check(kind) {
            Ok(self.advance_element())
        } else {
            Err(self.error_here(what))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<SyntaxElement, ParseError> {
        if self.check_keyword(keyword) {
            Ok(self.advance_element())
        } else {
            Err(self.error_here(&format!("'{}'", keyword.as_str())))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> Result<SyntaxElement, ParseError> {
        if matches!(self.current().kind, TokenKind::Identifier(_)) {
            Ok(self.advance_element())
        } else {
            Err(self.error_here(what))
        }
    }

    fn expect_statement_end(&self) -> Result<(), ParseError> {
        match self.current().kind {
            TokenKind::Eof | TokenKind::Semicolon | TokenKind::Command(_) => Ok(()),
            _ => Err(self.error_here("end of command")),
        }
    }

    fn error_here(&self, expected: &str) -> ParseError {
        let token = self.current();
        match &token.kind {
            TokenKind::Error(message) => ParseError::new(message.clone(), token.span),
            other => ParseError::unexpected(expected, other.clone(), token.span),
        }
    }

    /// Builds a node spanning its children.
    fn finish(&self, kind: SyntaxKind, children: Vec<SyntaxElement>) -> SyntaxNode {
        let span = match (children.first(), children.last()) {
            (Some(first), Some(last)) => first.span().merge(last.span()),
            _ => Span::new(self.current().span.start, self.current().span.start),
        };
        let mut node = SyntaxNode::new(kind, span, span.slice(self.source));
        node.children = children;
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(script: &str) -> SyntaxNode {
        Parser::new(script)
            .parse_script()
            .unwrap_or_else(|e| panic!("Failed to parse: {script}\nError: {e}"))
    }

    fn statement_kinds(script: &str) -> Vec<SyntaxKind> {
        parse(script)
            .children
            .iter()
            .filter_map(SyntaxElement::as_node)
            .map(|n| n.kind)
            .collect()
    }

    #[test]
    fn test_empty_script() {
        assert!(parse("").children.is_empty());
        assert!(parse("  // only a comment\n").children.is_empty());
    }

    #[test]
    fn test_statement_kinds() {
        let kinds = statement_kinds(
            ".create table T (a:string)\n\
             .create-merge table U (b:long)\n\
             .alter-merge table T (c:int)\n\
             .drop table T columns (a, c)\n\
             .drop column U.b\n\
             .alter column T.a type=long\n\
             .drop table U ifexists\n\
             .create-or-alter function F() { T }\n\
             .drop function F\n\
             .alter table T policy retention \"{}\"\n\
             .delete database D policy ingestionbatching\n\
             .show tables",
        );
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::CreateTableCommand,
                SyntaxKind::CreateTableCommand,
                SyntaxKind::AlterMergeTableCommand,
                SyntaxKind::DropTableColumnsCommand,
                SyntaxKind::DropColumnCommand,
                SyntaxKind::AlterColumnTypeCommand,
                SyntaxKind::DropTableCommand,
                SyntaxKind::CreateFunctionCommand,
                SyntaxKind::DropFunctionCommand,
                SyntaxKind::AlterRetentionPolicyCommand,
                SyntaxKind::DeleteIngestionBatchingPolicyCommand,
                SyntaxKind::UnknownCommand,
            ]
        );
    }

    #[test]
    fn test_unmodelled_policy_is_unknown() {
        assert_eq!(
            statement_kinds(".alter table T policy caching hot = 3d"),
            vec![SyntaxKind::UnknownCommand]
        );
    }

    #[test]
    fn test_cluster_policy_is_recognised_by_grammar() {
        assert_eq!(
            statement_kinds(".delete cluster policy retention"),
            vec![SyntaxKind::DeleteRetentionPolicyCommand]
        );
    }

    #[test]
    fn test_function_body_keeps_source_text() {
        let root = parse(
            ".create-or-alter function with (folder=\"f\") F(x:long, t:(*)) {\n  t | where v > x | extend d = dynamic([1, 2])\n}",
        );
        let stmt = root.children[0].as_node().unwrap();
        let body = stmt.first_node(SyntaxKind::FunctionBody).unwrap();
        assert!(body.text.starts_with('{'));
        assert!(body.text.ends_with('}'));
        assert!(body.text.contains("dynamic([1, 2])"));
        let params = stmt.first_node(SyntaxKind::FunctionParameterList).unwrap();
        assert_eq!(params.child_nodes(SyntaxKind::FunctionParameter).count(), 2);
    }

    #[test]
    fn test_nested_braces_in_body() {
        let root = parse(".create function F() { let g = (a:long) { a + 1 }; T }\n.drop table T");
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn test_statement_text() {
        let root = parse(".drop table ['my table']\n\n.drop function F");
        let first = root.children[0].as_node().unwrap();
        assert_eq!(first.text, ".drop table ['my table']");
        assert_eq!(first.first_name_reference().unwrap().name(), "['my table']");
    }

    #[test]
    fn test_semicolons_separate_statements() {
        assert_eq!(
            statement_kinds(".drop table A; .drop table B;"),
            vec![SyntaxKind::DropTableCommand, SyntaxKind::DropTableCommand]
        );
    }

    #[test]
    fn test_missing_column_type_is_error() {
        let err = Parser::new(".create table T (a)").parse_script().unwrap_err();
        assert_eq!(err.expected.as_deref(), Some("':'"));
    }

    #[test]
    fn test_trailing_tokens_are_error() {
        assert!(Parser::new(".drop table T extra").parse_script().is_err());
    }

    #[test]
    fn test_alter_policy_requires_payload() {
        let err = Parser::new(".alter table T policy retention")
            .parse_script()
            .unwrap_err();
        assert_eq!(err.found, Some(TokenKind::Eof));
    }

    #[test]
    fn test_statement_must_start_with_command() {
        assert!(Parser::new("T | take 10").parse_script().is_err());
    }

    #[test]
    fn test_unterminated_body_is_error() {
        assert!(Parser::new(".create function F() { T")
            .parse_script()
            .is_err());
    }
}

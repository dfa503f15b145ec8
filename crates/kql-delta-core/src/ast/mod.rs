//! Syntax tree for control-command scripts.
//!
//! The tree is deliberately untyped: every statement is a [`SyntaxNode`]
//! tagged with a [`SyntaxKind`], and the command model only walks it with
//! [`SyntaxNode::find_first`] and [`NameReference::name`]. This keeps the
//! command model independent from the grammar's exact shape.

use std::iter;

use crate::lexer::{Keyword, Span, Token, TokenKind};

/// Kinds of syntax nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    /// Root node: the whole script.
    CommandBlock,

    // Statements
    /// `.create table` / `.create-merge table`
    CreateTableCommand,
    /// `.alter-merge table T (...)`
    AlterMergeTableCommand,
    /// `.drop table T`
    DropTableCommand,
    /// `.drop table T columns (a, b)`
    DropTableColumnsCommand,
    /// `.drop column T.c`
    DropColumnCommand,
    /// `.alter column T.c type=t`
    AlterColumnTypeCommand,
    /// `.create function` / `.create-or-alter function`
    CreateFunctionCommand,
    /// `.drop function F`
    DropFunctionCommand,
    /// `.alter <entity> policy retention`
    AlterRetentionPolicyCommand,
    /// `.delete <entity> policy retention`
    DeleteRetentionPolicyCommand,
    /// `.alter <entity> policy ingestionbatching`
    AlterIngestionBatchingPolicyCommand,
    /// `.delete <entity> policy ingestionbatching`
    DeleteIngestionBatchingPolicyCommand,
    /// A control command the grammar does not model.
    UnknownCommand,

    // Inner nodes
    /// A reference to an entity by name.
    NameReference,
    /// `(a:string, b:long)`
    ColumnDeclarationList,
    /// `a:string`
    ColumnDeclaration,
    /// A scalar type name.
    TypeReference,
    /// A tabular parameter type: `(*)` or `(a:long)`.
    TabularType,
    /// `(a, b)`
    NameList,
    /// `with (k=v, ...)`
    PropertyList,
    /// `k=v`
    Property,
    /// `(x:long, t:(*))`
    FunctionParameterList,
    /// `x:long`
    FunctionParameter,
    /// `{ ... }`
    FunctionBody,
    /// The JSON string of a policy.
    PolicyPayload,
}

impl SyntaxKind {
    /// Returns true for statement-level kinds.
    #[must_use]
    pub const fn is_statement(self) -> bool {
        matches!(
            self,
            Self::CreateTableCommand
                | Self::AlterMergeTableCommand
                | Self::DropTableCommand
                | Self::DropTableColumnsCommand
                | Self::DropColumnCommand
                | Self::AlterColumnTypeCommand
                | Self::CreateFunctionCommand
                | Self::DropFunctionCommand
                | Self::AlterRetentionPolicyCommand
                | Self::DeleteRetentionPolicyCommand
                | Self::AlterIngestionBatchingPolicyCommand
                | Self::DeleteIngestionBatchingPolicyCommand
                | Self::UnknownCommand
        )
    }
}

/// A node or a token in the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxElement {
    /// An inner node.
    Node(SyntaxNode),
    /// A leaf token.
    Token(Token),
}

impl SyntaxElement {
    /// Returns the span of the element.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Node(node) => node.span,
            Self::Token(token) => token.span,
        }
    }

    /// Returns the node if this element is one.
    #[must_use]
    pub const fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Token(_) => None,
        }
    }

    /// Returns the token if this element is one.
    #[must_use]
    pub const fn as_token(&self) -> Option<&Token> {
        match self {
            Self::Token(token) => Some(token),
            Self::Node(_) => None,
        }
    }

    /// Returns true if this element is the given keyword token.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.as_token().is_some_and(|t| t.is_keyword(keyword))
    }

    /// Returns true if this element is a node of the given kind.
    #[must_use]
    pub fn is_node(&self, kind: SyntaxKind) -> bool {
        self.as_node().is_some_and(|n| n.kind == kind)
    }
}

/// An inner node of the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    /// The node kind.
    pub kind: SyntaxKind,
    /// The location in the script text.
    pub span: Span,
    /// The exact script text covered by the node.
    pub text: String,
    /// Child elements in source order.
    pub children: Vec<SyntaxElement>,
}

impl SyntaxNode {
    /// Creates a new node.
    #[must_use]
    pub fn new(kind: SyntaxKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
            children: Vec::new(),
        }
    }

    /// Returns all descendants in pre-order, excluding `self`.
    pub fn descendants(&self) -> Box<dyn Iterator<Item = &SyntaxElement> + '_> {
        Box::new(self.children.iter().flat_map(|child| {
            let nested: Box<dyn Iterator<Item = &SyntaxElement> + '_> = match child {
                SyntaxElement::Node(node) => node.descendants(),
                SyntaxElement::Token(_) => Box::new(iter::empty()),
            };
            iter::once(child).chain(nested)
        }))
    }

    /// Finds the first descendant (pre-order) matching `predicate`.
    pub fn find_first<P>(&self, mut predicate: P) -> Option<&SyntaxElement>
    where
        P: FnMut(&SyntaxElement) -> bool,
    {
        self.descendants().find(|e| predicate(*e))
    }

    /// Finds the first descendant node of the given kind.
    #[must_use]
    pub fn first_node(&self, kind: SyntaxKind) -> Option<&Self> {
        self.find_first(|e| e.is_node(kind))
            .and_then(SyntaxElement::as_node)
    }

    /// Finds the first name reference below this node.
    #[must_use]
    pub fn first_name_reference(&self) -> Option<NameReference<'_>> {
        self.first_node(SyntaxKind::NameReference)
            .and_then(NameReference::cast)
    }

    /// Returns the direct child nodes of the given kind.
    pub fn child_nodes(&self, kind: SyntaxKind) -> impl Iterator<Item = &Self> {
        self.children
            .iter()
            .filter_map(SyntaxElement::as_node)
            .filter(move |n| n.kind == kind)
    }

    /// Returns the direct child tokens.
    pub fn child_tokens(&self) -> impl Iterator<Item = &Token> {
        self.children.iter().filter_map(SyntaxElement::as_token)
    }
}

/// Typed view over a [`SyntaxKind::NameReference`] node.
#[derive(Debug, Clone, Copy)]
pub struct NameReference<'a> {
    node: &'a SyntaxNode,
}

impl<'a> NameReference<'a> {
    /// Wraps `node` if it is a name reference.
    #[must_use]
    pub fn cast(node: &'a SyntaxNode) -> Option<Self> {
        (node.kind == SyntaxKind::NameReference).then_some(Self { node })
    }

    /// Returns the name as written, bracket quoting included.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.node
            .child_tokens()
            .find_map(|t| match &t.kind {
                TokenKind::Identifier(name) => Some(name.as_str()),
                _ => None,
            })
            .unwrap_or(self.node.text.as_str())
    }

    /// Returns the span of the reference.
    #[must_use]
    pub const fn span(&self) -> Span {
        self.node.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, start: usize, end: usize) -> SyntaxElement {
        SyntaxElement::Token(Token::new(kind, Span::new(start, end)))
    }

    fn sample() -> SyntaxNode {
        // .delete table T policy retention
        let mut name = SyntaxNode::new(SyntaxKind::NameReference, Span::new(14, 15), "T");
        name.children
            .push(token(TokenKind::Identifier("T".into()), 14, 15));
        let mut stmt = SyntaxNode::new(
            SyntaxKind::DeleteRetentionPolicyCommand,
            Span::new(0, 32),
            ".delete table T policy retention",
        );
        stmt.children = vec![
            token(TokenKind::Command("delete".into()), 0, 7),
            token(TokenKind::Keyword(Keyword::Table), 8, 13),
            SyntaxElement::Node(name),
            token(TokenKind::Keyword(Keyword::Policy), 16, 22),
            token(TokenKind::Keyword(Keyword::Retention), 23, 32),
        ];
        stmt
    }

    #[test]
    fn test_find_first_keyword() {
        let stmt = sample();
        let found = stmt
            .find_first(|e| e.is_keyword(Keyword::Table) || e.is_keyword(Keyword::Database))
            .and_then(SyntaxElement::as_token)
            .and_then(Token::as_keyword);
        assert_eq!(found, Some(Keyword::Table));
    }

    #[test]
    fn test_first_name_reference() {
        let stmt = sample();
        let name = stmt.first_name_reference().unwrap();
        assert_eq!(name.name(), "T");
        assert_eq!(name.span(), Span::new(14, 15));
    }

    #[test]
    fn test_descendants_are_pre_order() {
        let stmt = sample();
        let count = stmt.descendants().count();
        // five direct children plus the identifier inside the name reference
        assert_eq!(count, 6);
        assert!(stmt.find_first(|e| e.is_keyword(Keyword::Database)).is_none());
    }

    #[test]
    fn test_statement_kinds() {
        assert!(SyntaxKind::DropTableCommand.is_statement());
        assert!(!SyntaxKind::NameReference.is_statement());
    }
}

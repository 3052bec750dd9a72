//! The token definition for the filter language.

use std::fmt;

/// A token is a single unit of the language, with a specific kind and location.
///
/// Tokens carry no text of their own; use [`Span::slice`] against the source
/// filter to recover it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The raw source text covered by this token.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.span.slice(source)
    }
}

/// The kind of a token. Exactly one primitive kind per token; group
/// membership is answered by the `is_*` predicates below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A bare identifier, resolved later against the field registry.
    Field,

    // Comparison operators
    Equal,              // eq, =, ==
    NotEqual,           // ne, !=, <>
    LessThan,           // lt, <
    LessThanOrEqual,    // le, <=
    GreaterThan,        // gt, >
    GreaterThanOrEqual, // ge, >=
    In,                 // in

    // Constants
    Value,   // 42, -3.5
    Literal, // 'quoted'
    True,
    False,
    Null,

    // Logical connectives
    And, // and, &&
    Or,  // or, ||
    Not, // not, !

    // Punctuation
    OpenParen,
    CloseParen,
    Comma,

    // String functions
    StartsWith,
    Contains,
    EndsWith,
}

impl TokenKind {
    /// `eq ne lt le gt ge in`
    pub fn is_comparison_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Equal
                | TokenKind::NotEqual
                | TokenKind::LessThan
                | TokenKind::LessThanOrEqual
                | TokenKind::GreaterThan
                | TokenKind::GreaterThanOrEqual
                | TokenKind::In
        )
    }

    pub fn is_equality_operator(self) -> bool {
        matches!(self, TokenKind::Equal | TokenKind::NotEqual)
    }

    pub fn is_constant(self) -> bool {
        matches!(
            self,
            TokenKind::Value | TokenKind::Literal | TokenKind::True | TokenKind::False | TokenKind::Null
        )
    }

    pub fn is_string_function(self) -> bool {
        matches!(self, TokenKind::StartsWith | TokenKind::Contains | TokenKind::EndsWith)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, TokenKind::And | TokenKind::Or | TokenKind::Not)
    }

    /// Any kind that can appear in a field's allowed-operator set.
    pub fn is_operator(self) -> bool {
        self.is_comparison_operator() || self.is_string_function()
    }

    /// The canonical keyword spelling, used in diagnostics and config files.
    pub fn keyword(self) -> &'static str {
        match self {
            TokenKind::Field => "field",
            TokenKind::Equal => "eq",
            TokenKind::NotEqual => "ne",
            TokenKind::LessThan => "lt",
            TokenKind::LessThanOrEqual => "le",
            TokenKind::GreaterThan => "gt",
            TokenKind::GreaterThanOrEqual => "ge",
            TokenKind::In => "in",
            TokenKind::Value => "value",
            TokenKind::Literal => "literal",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::Comma => ",",
            TokenKind::StartsWith => "startswith",
            TokenKind::Contains => "contains",
            TokenKind::EndsWith => "endswith",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn slice(self, source: &str) -> &str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

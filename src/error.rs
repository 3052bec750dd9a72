//! Error surface for filter parsing.
//!
//! Every failure, lexical, syntactic or semantic, is a [`QueryFilterError`]
//! carrying the offending span and its raw text.

use crate::field::FieldType;
use crate::token::{Span, TokenKind};

pub type Result<T, E = QueryFilterError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {span}: '{text}'")]
pub struct QueryFilterError {
    pub kind: ErrorKind,
    pub span: Span,
    /// The raw filter text covered by `span`.
    pub text: String,
}

impl QueryFilterError {
    pub fn new(kind: ErrorKind, span: Span, source: &str) -> Self {
        Self {
            kind,
            span,
            text: span.slice(source).to_string(),
        }
    }

    /// Unterminated literals and illegal characters.
    pub fn is_lexical(&self) -> bool {
        matches!(self.kind, ErrorKind::UnterminatedLiteral | ErrorKind::IllegalCharacter)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("unterminated string literal")]
    UnterminatedLiteral,

    #[error("unrecognized character")]
    IllegalCharacter,

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("operator '{operator}' is not supported for field '{field}'")]
    UnsupportedOperator { field: String, operator: TokenKind },

    #[error("value cannot be converted to {expected} for field '{field}'")]
    TypeMismatch { field: String, expected: FieldType },

    #[error("null is not allowed here")]
    NullNotAllowed,

    #[error("in list must contain at least one value")]
    EmptyInList,

    #[error("too many values in list (max {0})")]
    TooManyInValues(usize),

    #[error("unbalanced parenthesis")]
    UnbalancedParenthesis,

    #[error("incomplete expression")]
    IncompleteExpression,

    #[error("expected '('")]
    ExpectedOpenParen,

    #[error("expected '(' after not")]
    ExpectedOpenParenAfterNot,

    #[error("expected ','")]
    ExpectedComma,

    #[error("expected ')'")]
    ExpectedCloseParen,

    #[error("expected field name")]
    ExpectedField,

    #[error("expected operator")]
    ExpectedOperator,

    #[error("expected constant value")]
    ExpectedConstant,

    #[error("unexpected token")]
    UnexpectedToken,

    #[error("filter exceeds maximum length of {0} bytes")]
    FilterTooLong(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_raw_text() {
        let source = "age gt null";
        let err = QueryFilterError::new(ErrorKind::NullNotAllowed, Span::new(7, 11), source);
        assert_eq!(err.text, "null");
        assert_eq!(err.to_string(), "null is not allowed here at 7..11: 'null'");
    }

    #[test]
    fn test_unsupported_operator_display() {
        let kind = ErrorKind::UnsupportedOperator {
            field: "name".to_string(),
            operator: TokenKind::GreaterThan,
        };
        assert_eq!(kind.to_string(), "operator 'gt' is not supported for field 'name'");
    }

    #[test]
    fn test_is_lexical() {
        let err = QueryFilterError::new(ErrorKind::IllegalCharacter, Span::new(0, 1), "#");
        assert!(err.is_lexical());
        let err = QueryFilterError::new(ErrorKind::EmptyInList, Span::new(0, 1), ")");
        assert!(!err.is_lexical());
    }
}

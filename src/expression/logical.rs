//! `and`, `or`, and `not (`.

use crate::error::{ErrorKind, Result};
use crate::result::ResultBuilder;
use crate::token::{Span, Token, TokenKind};

use super::{Expression, ParseContext, SpanTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingConnective,
    /// `not` must be followed directly by `(`.
    AwaitingOpenParen,
    Complete,
}

#[derive(Debug)]
pub struct LogicalExpression {
    state: State,
    connective: Option<TokenKind>,
    span: SpanTracker,
}

impl Default for LogicalExpression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogicalExpression {
    pub fn new() -> Self {
        Self {
            state: State::AwaitingConnective,
            connective: None,
            span: SpanTracker::default(),
        }
    }

    pub fn is_negation(&self) -> bool {
        self.connective == Some(TokenKind::Not)
    }
}

impl<'a> Expression<'a> for LogicalExpression {
    fn can_add_token(&self, _token: &Token) -> bool {
        self.state != State::Complete
    }

    fn add_token(&mut self, token: Token, cx: &ParseContext<'a>) -> Result<()> {
        self.span.extend(token.span);
        match self.state {
            State::AwaitingConnective => {
                self.state = match token.kind {
                    TokenKind::And | TokenKind::Or => State::Complete,
                    TokenKind::Not => State::AwaitingOpenParen,
                    _ => return Err(cx.error(ErrorKind::UnexpectedToken, token.span)),
                };
                self.connective = Some(token.kind);
                Ok(())
            }
            State::AwaitingOpenParen => {
                if token.kind != TokenKind::OpenParen {
                    return Err(cx.error(ErrorKind::ExpectedOpenParenAfterNot, token.span));
                }
                self.state = State::Complete;
                Ok(())
            }
            State::Complete => Err(cx.error(ErrorKind::UnexpectedToken, token.span)),
        }
    }

    fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    fn write_to_result(&self, out: &mut ResultBuilder) {
        match self.connective {
            Some(TokenKind::And) => out.append_text(" && "),
            Some(TokenKind::Or) => out.append_text(" || "),
            Some(TokenKind::Not) => out.append_text("!"),
            _ => {}
        }
    }

    fn span(&self) -> Span {
        self.span.get()
    }

    fn opens_group(&self) -> bool {
        self.is_negation() && self.state == State::Complete
    }

    fn name(&self) -> &'static str {
        "logical"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::test_support::{feed, registry, render};
    use crate::parser::ParserConfig;

    fn run(input: &str) -> (Result<()>, LogicalExpression) {
        let registry = registry();
        let config = ParserConfig::default();
        let cx = ParseContext {
            source: input,
            registry: &registry,
            config: &config,
        };
        let mut expr = LogicalExpression::new();
        let outcome = feed(&mut expr, input, &cx);
        (outcome, expr)
    }

    #[test]
    fn test_connectives_complete_immediately() {
        let (outcome, expr) = run("and");
        outcome.unwrap();
        assert!(expr.is_complete());
        assert!(!expr.opens_group());
        assert_eq!(render(&expr).predicate, " && ");

        let (_, expr) = run("||");
        assert_eq!(render(&expr).predicate, " || ");
    }

    #[test]
    fn test_not_requires_open_paren() {
        let (outcome, expr) = run("not");
        outcome.unwrap();
        assert!(!expr.is_complete());

        let (outcome, expr) = run("not (");
        outcome.unwrap();
        assert!(expr.is_complete());
        assert!(expr.opens_group());
        assert_eq!(render(&expr).predicate, "!");

        let err = run("not active").0.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExpectedOpenParenAfterNot);
        assert_eq!(err.text, "active");
    }

    #[test]
    fn test_rejects_non_connective() {
        let err = run("eq").0.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedToken);
    }
}

//! `startswith(field, 'text')` and friends.

use crate::error::{ErrorKind, Result};
use crate::field::FieldConfig;
use crate::result::ResultBuilder;
use crate::token::{Span, Token, TokenKind};
use crate::value::FilterValue;

use super::{field_access, write_call, write_guarded, Expression, ParseContext, SpanTracker};

/// Positions of `function ( field , constant )`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingFunction,
    AwaitingOpenParen,
    AwaitingField,
    AwaitingComma,
    AwaitingConstant,
    AwaitingCloseParen,
    Complete,
}

#[derive(Debug)]
pub struct StringFunctionExpression<'a> {
    state: State,
    function: Option<Token>,
    field: Option<(Token, &'a FieldConfig)>,
    value: Option<FilterValue>,
    span: SpanTracker,
}

impl Default for StringFunctionExpression<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> StringFunctionExpression<'a> {
    pub fn new() -> Self {
        Self {
            state: State::AwaitingFunction,
            function: None,
            field: None,
            value: None,
            span: SpanTracker::default(),
        }
    }

    fn bind_field(&mut self, token: Token, cx: &ParseContext<'a>) -> Result<()> {
        if token.kind != TokenKind::Field {
            return Err(cx.error(ErrorKind::ExpectedField, token.span));
        }
        let config = cx.resolve(&token)?;
        if let Some(function) = self.function {
            if !config.permits(function.kind) {
                return Err(cx.unsupported_operator(&token, &function));
            }
        }
        self.field = Some((token, config));
        Ok(())
    }

    fn bind_constant(&mut self, token: Token, cx: &ParseContext<'a>) -> Result<()> {
        let Some((field, config)) = self.field else {
            return Err(cx.error(ErrorKind::ExpectedField, token.span));
        };
        match token.kind {
            TokenKind::Null => Err(cx.error(ErrorKind::NullNotAllowed, token.span)),
            kind if kind.is_constant() => {
                self.value = Some(cx.convert(&token, &field, config)?);
                Ok(())
            }
            _ => Err(cx.error(ErrorKind::ExpectedConstant, token.span)),
        }
    }
}

impl<'a> Expression<'a> for StringFunctionExpression<'a> {
    fn can_add_token(&self, _token: &Token) -> bool {
        self.state != State::Complete
    }

    fn add_token(&mut self, token: Token, cx: &ParseContext<'a>) -> Result<()> {
        self.span.extend(token.span);
        let expect = |ok: bool, kind: ErrorKind| if ok { Ok(()) } else { Err(cx.error(kind, token.span)) };

        self.state = match self.state {
            State::AwaitingFunction => {
                if !token.kind.is_string_function() {
                    return Err(cx.error(ErrorKind::UnexpectedToken, token.span));
                }
                self.function = Some(token);
                State::AwaitingOpenParen
            }
            State::AwaitingOpenParen => {
                expect(token.kind == TokenKind::OpenParen, ErrorKind::ExpectedOpenParen)?;
                State::AwaitingField
            }
            State::AwaitingField => {
                self.bind_field(token, cx)?;
                State::AwaitingComma
            }
            State::AwaitingComma => {
                expect(token.kind == TokenKind::Comma, ErrorKind::ExpectedComma)?;
                State::AwaitingConstant
            }
            State::AwaitingConstant => {
                self.bind_constant(token, cx)?;
                State::AwaitingCloseParen
            }
            State::AwaitingCloseParen => {
                expect(token.kind == TokenKind::CloseParen, ErrorKind::ExpectedCloseParen)?;
                State::Complete
            }
            State::Complete => return Err(cx.error(ErrorKind::UnexpectedToken, token.span)),
        };
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    fn write_to_result(&self, out: &mut ResultBuilder) {
        let (Some(function), Some((_, config)), Some(value)) = (self.function, self.field, self.value.clone()) else {
            return;
        };
        let access = field_access(config);
        write_guarded(out, config, |out| write_call(out, &access, function.kind, value));
    }

    fn span(&self) -> Span {
        self.span.get()
    }

    fn has_open_paren(&self) -> bool {
        !matches!(
            self.state,
            State::AwaitingFunction | State::AwaitingOpenParen | State::Complete
        )
    }

    fn name(&self) -> &'static str {
        "string function"
    }
}

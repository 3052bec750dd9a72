//! `field op constant`, `field in (c1, c2, ...)` and bare boolean fields.

use crate::error::{ErrorKind, Result};
use crate::field::FieldConfig;
use crate::result::ResultBuilder;
use crate::token::{Span, Token, TokenKind};
use crate::value::FilterValue;

use super::{field_access, operator_symbol, write_call, write_guarded, Expression, ParseContext, SpanTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingField,
    AwaitingOperator,
    /// A boolean field on its own. Complete, but still accepts an operator.
    BareBoolean,
    AwaitingOperand,
    AwaitingListOpen,
    AwaitingListItem,
    AwaitingCommaOrClose,
    Complete,
}

#[derive(Debug)]
pub struct ComparisonExpression<'a> {
    state: State,
    token_count: usize,
    field: Option<(Token, &'a FieldConfig)>,
    operator: Option<Token>,
    /// Constant tokens in arrival order, including a `null`.
    constants: Vec<Token>,
    values: Vec<FilterValue>,
    span: SpanTracker,
}

impl Default for ComparisonExpression<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ComparisonExpression<'a> {
    pub fn new() -> Self {
        Self {
            state: State::AwaitingField,
            token_count: 0,
            field: None,
            operator: None,
            constants: Vec::new(),
            values: Vec::new(),
            span: SpanTracker::default(),
        }
    }

    pub fn token_count(&self) -> usize {
        self.token_count
    }

    fn is_null(&self) -> bool {
        self.constants.first().is_some_and(|t| t.kind == TokenKind::Null)
    }

    fn bind_field(&mut self, token: Token, cx: &ParseContext<'a>) -> Result<()> {
        if token.kind != TokenKind::Field {
            return Err(cx.error(ErrorKind::ExpectedField, token.span));
        }
        let config = cx.resolve(&token)?;
        self.field = Some((token, config));
        self.state = if config.is_boolean() {
            State::BareBoolean
        } else {
            State::AwaitingOperator
        };
        Ok(())
    }

    fn bind_operator(&mut self, token: Token, field: Token, config: &FieldConfig, cx: &ParseContext<'a>) -> Result<()> {
        if !token.kind.is_operator() {
            return Err(cx.error(ErrorKind::ExpectedOperator, token.span));
        }
        if !config.permits(token.kind) {
            return Err(cx.unsupported_operator(&field, &token));
        }
        self.operator = Some(token);
        self.state = if token.kind == TokenKind::In {
            State::AwaitingListOpen
        } else {
            State::AwaitingOperand
        };
        Ok(())
    }

    fn bind_operand(&mut self, token: Token, field: Token, config: &FieldConfig, cx: &ParseContext<'a>) -> Result<()> {
        let operator = self.operator.map(|t| t.kind);
        match token.kind {
            TokenKind::Null => {
                if !operator.is_some_and(TokenKind::is_equality_operator) {
                    return Err(cx.error(ErrorKind::NullNotAllowed, token.span));
                }
            }
            kind if kind.is_constant() => {
                let value = cx.convert(&token, &field, config)?;
                self.values.push(value);
            }
            _ => return Err(cx.error(ErrorKind::ExpectedConstant, token.span)),
        }
        self.constants.push(token);
        self.state = State::Complete;
        Ok(())
    }

    fn bind_list_item(&mut self, token: Token, field: Token, config: &FieldConfig, cx: &ParseContext<'a>) -> Result<()> {
        match token.kind {
            TokenKind::CloseParen if self.values.is_empty() => {
                Err(cx.error(ErrorKind::EmptyInList, token.span))
            }
            TokenKind::CloseParen => {
                self.state = State::Complete;
                Ok(())
            }
            TokenKind::Null => Err(cx.error(ErrorKind::NullNotAllowed, token.span)),
            kind if kind.is_constant() => {
                if self.values.len() >= cx.config.max_in_values {
                    return Err(cx.error(ErrorKind::TooManyInValues(cx.config.max_in_values), token.span));
                }
                let value = cx.convert(&token, &field, config)?;
                self.values.push(value);
                self.constants.push(token);
                self.state = State::AwaitingCommaOrClose;
                Ok(())
            }
            _ => Err(cx.error(ErrorKind::ExpectedConstant, token.span)),
        }
    }
}

impl<'a> Expression<'a> for ComparisonExpression<'a> {
    fn can_add_token(&self, token: &Token) -> bool {
        match self.state {
            State::Complete => false,
            State::BareBoolean => token.kind.is_operator(),
            _ => true,
        }
    }

    fn add_token(&mut self, token: Token, cx: &ParseContext<'a>) -> Result<()> {
        self.token_count += 1;
        self.span.extend(token.span);

        let Some((field, config)) = self.field else {
            return self.bind_field(token, cx);
        };

        match self.state {
            State::AwaitingField => self.bind_field(token, cx),
            State::AwaitingOperator | State::BareBoolean => self.bind_operator(token, field, config, cx),
            State::AwaitingOperand => self.bind_operand(token, field, config, cx),
            State::AwaitingListOpen => {
                if token.kind != TokenKind::OpenParen {
                    return Err(cx.error(ErrorKind::ExpectedOpenParen, token.span));
                }
                self.state = State::AwaitingListItem;
                Ok(())
            }
            State::AwaitingListItem => self.bind_list_item(token, field, config, cx),
            State::AwaitingCommaOrClose => match token.kind {
                TokenKind::Comma => {
                    self.state = State::AwaitingListItem;
                    Ok(())
                }
                TokenKind::CloseParen => {
                    self.state = State::Complete;
                    Ok(())
                }
                _ => Err(cx.error(ErrorKind::ExpectedComma, token.span)),
            },
            State::Complete => Err(cx.error(ErrorKind::UnexpectedToken, token.span)),
        }
    }

    fn is_complete(&self) -> bool {
        matches!(self.state, State::BareBoolean | State::Complete)
    }

    fn write_to_result(&self, out: &mut ResultBuilder) {
        let Some((_, config)) = self.field else {
            return;
        };
        if self.state == State::BareBoolean {
            out.append_text(&config.model_name);
            return;
        }
        let Some(operator) = self.operator.map(|t| t.kind) else {
            return;
        };
        let access = field_access(config);

        if operator == TokenKind::In {
            out.append_text(&access);
            out.append_text(" in (");
            out.append_value_list(self.values.iter().cloned());
            out.append_text(")");
            return;
        }

        if self.is_null() {
            out.append_text(&config.model_name);
            out.append_text(" ");
            out.append_text(operator_symbol(operator));
            out.append_text(" null");
            return;
        }

        let Some(value) = self.values.first().cloned() else {
            return;
        };
        write_guarded(out, config, |out| {
            if operator.is_string_function() {
                write_call(out, &access, operator, value);
            } else {
                out.append_text(&access);
                out.append_text(" ");
                out.append_text(operator_symbol(operator));
                out.append_text(" ");
                out.append_value(value);
            }
        });
    }

    fn span(&self) -> Span {
        self.span.get()
    }

    fn has_open_paren(&self) -> bool {
        matches!(self.state, State::AwaitingListItem | State::AwaitingCommaOrClose)
    }

    fn name(&self) -> &'static str {
        "comparison"
    }
}

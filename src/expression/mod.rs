//! Token-consuming expressions.
//!
//! Each filter clause is accumulated by one [`Expression`]: it receives tokens
//! one at a time, validates them against its own state machine and, once
//! complete, writes its fragment into the [`ResultBuilder`].

mod comparison;
mod logical;
mod string_function;

pub use comparison::ComparisonExpression;
pub use logical::LogicalExpression;
pub use string_function::StringFunctionExpression;

use crate::error::{ErrorKind, QueryFilterError, Result};
use crate::field::{FieldConfig, FieldRegistry};
use crate::parser::ParserConfig;
use crate::result::ResultBuilder;
use crate::token::{Span, Token, TokenKind};
use crate::value::FilterValue;

/// Everything an expression may consult while consuming tokens.
pub struct ParseContext<'a> {
    pub source: &'a str,
    pub registry: &'a dyn FieldRegistry,
    pub config: &'a ParserConfig,
}

impl<'a> ParseContext<'a> {
    pub fn error(&self, kind: ErrorKind, span: Span) -> QueryFilterError {
        QueryFilterError::new(kind, span, self.source)
    }

    /// Resolves a field token against the registry.
    pub fn resolve(&self, token: &Token) -> Result<&'a FieldConfig> {
        let name = token.text(self.source);
        self.registry
            .resolve(name)
            .ok_or_else(|| self.error(ErrorKind::UnknownField(name.to_string()), token.span))
    }

    /// Converts a constant token for `field`, failing with `TypeMismatch`.
    pub fn convert(&self, token: &Token, field: &Token, config: &FieldConfig) -> Result<FilterValue> {
        FilterValue::convert(token, self.source, config).ok_or_else(|| {
            self.error(
                ErrorKind::TypeMismatch {
                    field: field.text(self.source).to_string(),
                    expected: config.field_type,
                },
                token.span,
            )
        })
    }

    pub fn unsupported_operator(&self, field: &Token, operator: &Token) -> QueryFilterError {
        self.error(
            ErrorKind::UnsupportedOperator {
                field: field.text(self.source).to_string(),
                operator: operator.kind,
            },
            operator.span,
        )
    }
}

/// The capability set shared by all expression variants.
pub trait Expression<'a> {
    /// Whether `token` continues this expression. Only meaningful once the
    /// expression is complete; an incomplete expression receives every token.
    fn can_add_token(&self, token: &Token) -> bool;

    fn add_token(&mut self, token: Token, cx: &ParseContext<'a>) -> Result<()>;

    fn is_complete(&self) -> bool;

    fn write_to_result(&self, out: &mut ResultBuilder);

    /// Source span covered by the tokens received so far.
    fn span(&self) -> Span;

    /// Inside its own parenthesis (an `in` list or call arguments).
    fn has_open_paren(&self) -> bool {
        false
    }

    /// A completed `not (`: the parser must open a group after writing it.
    fn opens_group(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}

/// Tracks the covered span as tokens arrive.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SpanTracker(Option<Span>);

impl SpanTracker {
    pub(crate) fn extend(&mut self, span: Span) {
        self.0 = Some(match self.0 {
            Some(current) => current.to(span),
            None => span,
        });
    }

    pub(crate) fn get(&self) -> Span {
        self.0.unwrap_or_default()
    }
}

/// `Name` or `Name.ToUpper()` for case-insensitive strings.
pub(crate) fn field_access(config: &FieldConfig) -> String {
    if config.folds_case() {
        format!("{}.ToUpper()", config.model_name)
    } else {
        config.model_name.clone()
    }
}

/// Wraps whatever `body` writes in `(Name != null && ...)` when the field
/// requires it.
pub(crate) fn write_guarded(out: &mut ResultBuilder, config: &FieldConfig, body: impl FnOnce(&mut ResultBuilder)) {
    if config.require_not_null_guard {
        out.append_text("(");
        out.append_text(&config.model_name);
        out.append_text(" != null && ");
        body(out);
        out.append_text(")");
    } else {
        body(out);
    }
}

pub(crate) fn operator_symbol(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Equal => "==",
        TokenKind::NotEqual => "!=",
        TokenKind::LessThan => "<",
        TokenKind::LessThanOrEqual => "<=",
        TokenKind::GreaterThan => ">",
        TokenKind::GreaterThanOrEqual => ">=",
        TokenKind::In => "in",
        _ => "",
    }
}

pub(crate) fn function_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::StartsWith => "StartsWith",
        TokenKind::Contains => "Contains",
        TokenKind::EndsWith => "EndsWith",
        _ => "",
    }
}

/// Writes `access.Function({n})`.
pub(crate) fn write_call(out: &mut ResultBuilder, access: &str, function: TokenKind, value: FilterValue) {
    out.append_text(access);
    out.append_text(".");
    out.append_text(function_name(function));
    out.append_text("(");
    out.append_value(value);
    out.append_text(")");
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::field::{FieldConfigRegistry, FieldType};
    use crate::lexer::tokenize;

    pub fn registry() -> FieldConfigRegistry {
        FieldConfigRegistry::new()
            .with_field("name", FieldConfig::string("Name").not_null_guard())
            .with_field("email", FieldConfig::string("Email").case_insensitive())
            .with_field("age", FieldConfig::new("Age", FieldType::Int32))
            .with_field("active", FieldConfig::new("Active", FieldType::Boolean))
            .with_field(
                "code",
                FieldConfig::string("Code").with_operators(crate::field::OperatorSet::of(&[TokenKind::Equal])),
            )
    }

    /// Feeds every token of `input` to `expr`, stopping at the first error.
    pub fn feed<'a>(expr: &mut dyn Expression<'a>, input: &'a str, cx: &ParseContext<'a>) -> Result<()> {
        for token in tokenize(input)? {
            expr.add_token(token, cx)?;
        }
        Ok(())
    }

    pub fn render(expr: &dyn Expression<'_>) -> crate::result::ParserResult {
        let mut out = ResultBuilder::new();
        expr.write_to_result(&mut out);
        out.finish()
    }
}

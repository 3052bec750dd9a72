//! Filter的语法分析器
//!
//! ## 解析流程图
//!
//! ```text
//! parse(filter)
//!   ├─ 长度检查 (max_filter_length)
//!   ├─ tokenize() 完整分词 (词法错误优先)
//!   ├─ 括号配对检查 → UnbalancedParenthesis
//!   ├─ 逐个 token
//!   │    └─ accept(token)
//!   │         ├─ 当前表达式未完成 → expr.add_token()  (由表达式报告位置相关的错误)
//!   │         ├─ 当前表达式已完成且 can_add_token → expr.add_token()
//!   │         └─ 否则写出当前表达式，按 token 类型开始新的表达式
//!   │              ├─ Field                      → ComparisonExpression
//!   │              ├─ startswith/contains/endswith → StringFunctionExpression
//!   │              ├─ and / or / not             → LogicalExpression
//!   │              ├─ "("                        → 打开分组
//!   │              └─ ")"                        → 关闭分组
//!   └─ finish()
//!        ├─ 仍有未关闭的括号 → UnbalancedParenthesis
//!        └─ 最后的表达式未完成 → IncompleteExpression
//! ```
//!
//! ## 优先级
//!
//! 没有隐式优先级：`and` / `or` 严格按书写顺序从左到右输出，需要时由括号显式分组。
//!
//! ## 解析示例
//!
//! ```text
//! name eq 'bob'               → (Name != null && Name == {0})
//! age in (20,21,22)           → Age in ({0}, {1}, {2})
//! name startswith 'b'         → (Name != null && Name.StartsWith({0}))
//! not (active eq true)        → !(Active == {0})
//! ```

use crate::error::{ErrorKind, QueryFilterError, Result};
use crate::expression::{
    ComparisonExpression, Expression, LogicalExpression, ParseContext, StringFunctionExpression,
};
use crate::field::FieldRegistry;
use crate::lexer;
use crate::result::{ParserResult, ResultBuilder};
use crate::token::{Span, Token, TokenKind};

/// 解析限制配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// 过滤字符串的最大字节数，超过则在分词前拒绝
    pub max_filter_length: usize,
    /// 单个 `in` 列表允许的最大值个数
    pub max_in_values: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_filter_length: 4096,
            max_in_values: 1000,
        }
    }
}

/// 将过滤字符串编译为参数化的谓词片段
///
/// 解析器本身不保存任何跨调用的状态，可以在多个线程间共享。
pub struct QueryFilterParser<'r> {
    registry: &'r dyn FieldRegistry,
    config: ParserConfig,
}

impl<'r> QueryFilterParser<'r> {
    pub fn new(registry: &'r dyn FieldRegistry) -> Self {
        Self::with_config(registry, ParserConfig::default())
    }

    pub fn with_config(registry: &'r dyn FieldRegistry, config: ParserConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn parse(&self, filter: &str) -> Result<ParserResult> {
        let outcome = self.parse_filter(filter);
        match &outcome {
            Ok(result) => tracing::debug!(
                filter_len = filter.len(),
                values = result.values.len(),
                "parsed filter"
            ),
            // 过滤条件错误属于调用方输入错误，只记录 debug 日志
            Err(err) => tracing::debug!(error = %err, "rejected filter"),
        }
        outcome
    }

    fn parse_filter(&self, filter: &str) -> Result<ParserResult> {
        if filter.len() > self.config.max_filter_length {
            // 错误位置必须落在字符边界上
            let mut start = self.config.max_filter_length;
            while !filter.is_char_boundary(start) {
                start -= 1;
            }
            return Err(QueryFilterError::new(
                ErrorKind::FilterTooLong(self.config.max_filter_length),
                Span::new(start, filter.len()),
                filter,
            ));
        }

        let cx = ParseContext {
            source: filter,
            registry: self.registry,
            config: &self.config,
        };
        let tokens = lexer::tokenize(filter)?;
        check_balance(&tokens, &cx)?;

        let mut state = ParseState::new(&cx);
        for token in tokens {
            state.accept(token)?;
        }
        state.finish()
    }
}

/// 括号数量不一致时，在第一个无法配对的括号处报错
fn check_balance(tokens: &[Token], cx: &ParseContext<'_>) -> Result<()> {
    let mut open: Vec<Span> = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::OpenParen => open.push(token.span),
            TokenKind::CloseParen => {
                if open.pop().is_none() {
                    return Err(cx.error(ErrorKind::UnbalancedParenthesis, token.span));
                }
            }
            _ => {}
        }
    }
    match open.first() {
        Some(span) => Err(cx.error(ErrorKind::UnbalancedParenthesis, *span)),
        None => Ok(()),
    }
}

/// 单次解析调用的局部状态
struct ParseState<'a, 'c> {
    cx: &'c ParseContext<'a>,
    current: Option<Box<dyn Expression<'a> + 'a>>,
    /// 尚未关闭的分组，记录其 "(" 的位置
    groups: Vec<Span>,
    /// 下一个 token 应当是操作数（表达式、分组或 not），而不是 and/or
    expect_operand: bool,
    last_span: Span,
    token_count: usize,
    out: ResultBuilder,
}

impl<'a, 'c> ParseState<'a, 'c> {
    fn new(cx: &'c ParseContext<'a>) -> Self {
        Self {
            cx,
            current: None,
            groups: Vec::new(),
            expect_operand: true,
            last_span: Span::default(),
            token_count: 0,
            out: ResultBuilder::new(),
        }
    }

    fn accept(&mut self, token: Token) -> Result<()> {
        self.token_count += 1;
        self.last_span = token.span;

        let routed = match self.current.as_mut() {
            Some(expr) if !expr.is_complete() || expr.can_add_token(&token) => {
                expr.add_token(token, self.cx)?;
                true
            }
            _ => false,
        };
        if routed {
            // "not (" 完成后由解析器打开分组
            if self.current.as_ref().is_some_and(|expr| expr.opens_group()) {
                self.flush();
                self.open_group(token.span);
            }
            return Ok(());
        }

        self.flush();
        self.dispatch(token)
    }

    /// 根据 token 类型开始新的表达式或处理分组
    fn dispatch(&mut self, token: Token) -> Result<()> {
        match token.kind {
            TokenKind::Field => {
                self.require_operand(&token)?;
                self.start(Box::new(ComparisonExpression::new()), token)?;
                self.expect_operand = false;
            }
            kind if kind.is_string_function() => {
                self.require_operand(&token)?;
                self.start(Box::new(StringFunctionExpression::new()), token)?;
                self.expect_operand = false;
            }
            TokenKind::Not => {
                self.require_operand(&token)?;
                self.start(Box::new(LogicalExpression::new()), token)?;
            }
            TokenKind::And | TokenKind::Or => {
                if self.expect_operand {
                    return Err(self.cx.error(ErrorKind::UnexpectedToken, token.span));
                }
                self.start(Box::new(LogicalExpression::new()), token)?;
                self.expect_operand = true;
            }
            TokenKind::OpenParen => {
                self.require_operand(&token)?;
                self.open_group(token.span);
            }
            TokenKind::CloseParen => self.close_group(token)?,
            _ => return Err(self.cx.error(ErrorKind::UnexpectedToken, token.span)),
        }
        Ok(())
    }

    fn start(&mut self, mut expr: Box<dyn Expression<'a> + 'a>, token: Token) -> Result<()> {
        expr.add_token(token, self.cx)?;
        self.current = Some(expr);
        Ok(())
    }

    fn require_operand(&self, token: &Token) -> Result<()> {
        if self.expect_operand {
            Ok(())
        } else {
            Err(self.cx.error(ErrorKind::UnexpectedToken, token.span))
        }
    }

    fn open_group(&mut self, span: Span) {
        self.groups.push(span);
        self.out.open_group();
    }

    fn close_group(&mut self, token: Token) -> Result<()> {
        if self.groups.is_empty() {
            return Err(self.cx.error(ErrorKind::UnbalancedParenthesis, token.span));
        }
        // "()" 或 "(a and )"
        if self.expect_operand {
            return Err(self.cx.error(ErrorKind::IncompleteExpression, token.span));
        }
        self.groups.pop();
        self.out.close_group();
        Ok(())
    }

    /// 将已完成的当前表达式写入结果
    fn flush(&mut self) {
        if let Some(expr) = self.current.take() {
            tracing::trace!(expression = expr.name(), span = %expr.span(), "expression complete");
            expr.write_to_result(&mut self.out);
        }
    }

    fn finish(mut self) -> Result<ParserResult> {
        if let Some(expr) = &self.current {
            if expr.has_open_paren() {
                return Err(self.cx.error(ErrorKind::UnbalancedParenthesis, expr.span()));
            }
        }
        if let Some(open) = self.groups.last() {
            return Err(self.cx.error(ErrorKind::UnbalancedParenthesis, *open));
        }
        if let Some(expr) = &self.current {
            if !expr.is_complete() {
                return Err(self.cx.error(ErrorKind::IncompleteExpression, expr.span()));
            }
        }
        if self.expect_operand && self.token_count > 0 {
            return Err(self.cx.error(ErrorKind::IncompleteExpression, self.last_span));
        }

        self.flush();
        debug_assert_eq!(self.out.depth(), 0);
        Ok(self.out.finish())
    }
}

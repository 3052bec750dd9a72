//! Filter的词法分析器

use crate::error::{ErrorKind, QueryFilterError, Result};
use crate::token::{Span, Token, TokenKind};

/// 惰性的 token 流。遇到第一个错误后不再产生任何 token。
pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
    failed: bool,
}

/// 一次性完成分词；失败时不返回部分结果
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).collect()
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            position: 0,
            failed: false,
        }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 返回下一个位置的字符，不推进位置
    fn peek_next(&self) -> Option<char> {
        self.input[self.position..].chars().nth(1)
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 跳过空白字符
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, Span::new(start, self.position))
    }

    fn error(&self, kind: ErrorKind, start: usize) -> QueryFilterError {
        QueryFilterError::new(kind, Span::new(start, self.position), self.input)
    }

    /// 如果下一个字符是 `expected` 则消费它
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// 读取数字字面量（可带负号和小数部分）
    /// 注意：第一个字符已经被调用者消费
    fn read_number(&mut self, start: usize) -> Token {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') && matches!(self.peek_next(), Some(c) if c.is_ascii_digit()) {
            self.bump(); // 消费 '.'
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        self.token(TokenKind::Value, start)
    }

    /// 读取单引号包围的字符串字面量，`''` 表示一个转义的单引号
    /// 注意：开始的引号已经被调用者消费
    fn read_literal(&mut self, start: usize) -> Result<Token> {
        loop {
            match self.bump() {
                Some('\'') => {
                    if !self.eat('\'') {
                        return Ok(self.token(TokenKind::Literal, start));
                    }
                }
                Some(_) => {}
                None => return Err(self.error(ErrorKind::UnterminatedLiteral, start)),
            }
        }
    }

    /// 读取标识符或关键字
    /// 标识符可以包含字母、数字、下划线和点（用于嵌套属性）
    fn read_identifier(&mut self, start: usize) -> Token {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.bump();
            } else {
                break;
            }
        }
        let literal = &self.input[start..self.position];
        self.token(match_keyword(literal), start)
    }

    fn next_token(&mut self) -> Option<Result<Token>> {
        self.skip_whitespace();
        let start = self.position;

        // 到达输入末尾
        let c = self.bump()?;

        let token = match c {
            '(' => self.token(TokenKind::OpenParen, start),
            ')' => self.token(TokenKind::CloseParen, start),
            ',' => self.token(TokenKind::Comma, start),
            '=' => {
                self.eat('=');
                self.token(TokenKind::Equal, start)
            }
            '<' => {
                if self.eat('=') {
                    self.token(TokenKind::LessThanOrEqual, start)
                } else if self.eat('>') {
                    self.token(TokenKind::NotEqual, start)
                } else {
                    self.token(TokenKind::LessThan, start)
                }
            }
            '>' => {
                if self.eat('=') {
                    self.token(TokenKind::GreaterThanOrEqual, start)
                } else {
                    self.token(TokenKind::GreaterThan, start)
                }
            }
            '!' => {
                if self.eat('=') {
                    self.token(TokenKind::NotEqual, start)
                } else {
                    self.token(TokenKind::Not, start)
                }
            }
            '&' => {
                if !self.eat('&') {
                    return Some(Err(self.error(ErrorKind::IllegalCharacter, start)));
                }
                self.token(TokenKind::And, start)
            }
            '|' => {
                if !self.eat('|') {
                    return Some(Err(self.error(ErrorKind::IllegalCharacter, start)));
                }
                self.token(TokenKind::Or, start)
            }
            '\'' => return Some(self.read_literal(start)),
            '-' if matches!(self.peek(), Some(d) if d.is_ascii_digit()) => self.read_number(start),
            c if c.is_ascii_digit() => self.read_number(start),
            c if c.is_alphabetic() || c == '_' => self.read_identifier(start),
            _ => return Some(Err(self.error(ErrorKind::IllegalCharacter, start))),
        };
        Some(Ok(token))
    }
}

pub(crate) fn match_keyword(s: &str) -> TokenKind {
    match s.to_ascii_lowercase().as_str() {
        "eq" => TokenKind::Equal,
        "ne" => TokenKind::NotEqual,
        "lt" => TokenKind::LessThan,
        "le" => TokenKind::LessThanOrEqual,
        "gt" => TokenKind::GreaterThan,
        "ge" => TokenKind::GreaterThanOrEqual,
        "in" => TokenKind::In,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "startswith" => TokenKind::StartsWith,
        "contains" => TokenKind::Contains,
        "endswith" => TokenKind::EndsWith,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        _ => TokenKind::Field,
    }
}

/// 去掉字面量两端的引号并还原 `''` 转义
pub fn unescape_literal(raw: &str) -> String {
    let inner = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(raw);
    inner.replace("''", "'")
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_token();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

use logos::Logos;
use std::fmt;
use tsg_diagnostics::{Pos, Span};

/// Digits accumulate with wrapping 32-bit arithmetic, so oversized literals
/// wrap instead of failing to lex.
fn parse_number(digits: &str) -> i32 {
    let mut value: i32 = 0;
    for byte in digits.bytes() {
        value = value.wrapping_mul(10).wrapping_add((byte - b'0') as i32);
    }
    value
}

/// Token types for the tsg programming language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Keywords
    #[token("def")]
    Def,
    #[token("val")]
    Val,
    #[token("if")]
    If,
    #[token("else")]
    Else,

    // Operators (compound before single)
    #[token("==")]
    EqEq,
    #[token("=")]
    Assign,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    // Literals
    #[regex(r"[0-9]+", |lex| parse_number(lex.slice()))]
    Number(i32),

    // Identifiers start with a letter; underscores only in the tail
    #[regex(r"[A-Za-z][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    /// Any byte the grammar does not know; reported by the parser through
    /// its expected/found machinery.
    #[regex(r".", priority = 0)]
    Error,
    /// End of input. A stray NUL byte also scans as end-of-input; the
    /// trailing `Eof` is appended by `tokenize` with the final position.
    #[token("\0")]
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Def => "def",
            Token::Val => "val",
            Token::If => "if",
            Token::Else => "else",
            Token::EqEq => "==",
            Token::Assign => "=",
            Token::Lt => "<",
            Token::Gt => ">",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Number(_) => "<NUMBER>",
            Token::Ident(_) => "<IDENTIFIER>",
            Token::LineComment => "<COMMENT>",
            Token::Error => "<ERROR>",
            Token::Eof => "<EOF>",
        };
        f.write_str(text)
    }
}

/// A token together with its source range.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub span: Span,
}

/// Wrapper around the generated lexer that tracks 1-based line/column
/// positions while scanning.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    bytes: &'source [u8],
    cursor: usize,
    line: u32,
    column: u32,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
            bytes: source.as_bytes(),
            cursor: 0,
            line: 1,
            column: 1,
        }
    }

    /// Advance the position tracker to `offset` and return the position there.
    fn advance_to(&mut self, offset: usize) -> Pos {
        while self.cursor < offset {
            if self.bytes[self.cursor] == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.cursor += 1;
        }
        Pos::new(self.line, self.column)
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = TokenSpan;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.inner.next()?;
        let range = self.inner.span();
        let begin = self.advance_to(range.start);
        let end = self.advance_to(range.end);

        let token = result.unwrap_or(Token::Error);
        Some(TokenSpan {
            token,
            span: Span::new(begin, end),
        })
    }
}

/// Scan the whole source, appending an `Eof` token at the final position.
pub fn tokenize(source: &str) -> Vec<TokenSpan> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    for token in &mut lexer {
        tokens.push(token);
    }

    let eof = lexer.advance_to(source.len());
    tokens.push(TokenSpan {
        token: Token::Eof,
        span: Span::point(eof),
    });
    tokens
}

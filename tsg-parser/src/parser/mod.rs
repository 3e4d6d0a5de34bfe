// Parser core: token cursor, recovery helpers and block structure.
// Expression and statement grammars live in the sibling modules.

use tsg_ast::*;
use tsg_diagnostics::{Diagnostics, Pos, Span};
use tsg_lexer::{Token, TokenSpan};

mod expressions;
mod functions;
mod statements;

pub struct Parser {
    pub(crate) tokens: Vec<TokenSpan>,
    pub(crate) current: usize,
    pub(crate) funcs: Vec<Function>,
    pub(crate) diagnostics: Diagnostics,
    /// End line of the most recently consumed token; drives the
    /// missing-semicolon-at-end-of-line tolerance.
    pub(crate) last_line: u32,
    /// Line of the last reported error; at most one diagnostic per line.
    pub(crate) last_error_line: u32,
}

/// Parse a whole source buffer into an [`Ast`] plus the parser diagnostics.
pub fn parse(source: &str) -> (Ast, Diagnostics) {
    Parser::new(source).parse()
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self {
            tokens: tsg_lexer::tokenize(source),
            current: 0,
            funcs: Vec::new(),
            diagnostics: Diagnostics::new(),
            last_line: 0,
            last_error_line: 0,
        }
    }

    /// Parse the source as the body of the synthesized root function and
    /// append the entry call.
    pub fn parse(mut self) -> (Ast, Diagnostics) {
        let mut body = self.parse_block();
        self.expect(&Token::Eof);

        let eof = self.peek_span();
        body.stmts.push(Stmt::Expr {
            expr: Expr {
                kind: ExprKind::Call {
                    callee: Box::new(Expr {
                        kind: ExprKind::Ident {
                            name: Ident {
                                text: "main".to_string(),
                                span: eof,
                            },
                            binding: None,
                        },
                        span: eof,
                        tyvar: None,
                    }),
                    args: Vec::new(),
                },
                span: eof,
                tyvar: None,
            },
        });

        let root = self.push_func(Function {
            decl: Decl {
                name: Ident {
                    text: ROOT_NAME.to_string(),
                    span: Span::point(Pos::new(1, 1)),
                },
                binding: None,
            },
            params: Vec::new(),
            body,
            enclosing: None,
            depth: 0,
            tyset: TySet::default(),
            frame: Frame::default(),
            ftype: None,
        });

        log::debug!(
            "parsed {} function(s), {} diagnostic(s)",
            self.funcs.len(),
            self.diagnostics.len()
        );
        (
            Ast {
                funcs: self.funcs,
                root,
            },
            self.diagnostics,
        )
    }

    /// `{ def … def stmt … stmt }` with declarations and statements freely
    /// interleaved; stops at the first token that starts neither.
    pub(crate) fn parse_block(&mut self) -> Block {
        let begin = self.peek_span().begin;
        let mut block = Block::default();

        loop {
            if self.check(&Token::Def) {
                if let Some(func) = self.parse_func() {
                    block.funcs.push(func);
                }
            } else {
                match self.parse_stmt() {
                    Some(stmt) => block.stmts.push(stmt),
                    None => break,
                }
            }
        }

        let end = self.prev_end().unwrap_or(begin);
        block.span = Span::new(begin, end);
        block
    }

    pub(crate) fn push_func(&mut self, func: Function) -> FuncId {
        let id = FuncId(self.funcs.len() as u32);
        self.funcs.push(func);
        id
    }

    // ==================== Cursor helpers ====================

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.current].token
    }

    pub(crate) fn peek_span(&self) -> Span {
        self.tokens[self.current].span
    }

    fn prev_end(&self) -> Option<Pos> {
        self.current
            .checked_sub(1)
            .map(|i| self.tokens[i].span.end)
    }

    pub(crate) fn check(&self, kind: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    /// Move past the current token; the trailing `Eof` is never left behind.
    pub(crate) fn advance(&mut self) {
        self.last_line = self.tokens[self.current].span.end.line;
        if self.current + 1 < self.tokens.len() {
            self.current += 1;
        }
    }

    pub(crate) fn accept(&mut self, kind: &Token) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &Token) -> bool {
        let ok = self.accept(kind);
        if !ok {
            self.error(format!("expected '{}', found '{}'", kind, self.peek()));
        }
        ok
    }

    /// Report an error at the current token, suppressing further errors on
    /// the same source line.
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let span = self.peek_span();
        if span.begin.line == self.last_error_line {
            return;
        }
        self.last_error_line = span.begin.line;
        self.diagnostics.error(span, message);
    }

    // ==================== Leaf parsers ====================

    pub(crate) fn parse_ident(&mut self) -> Option<Ident> {
        let span = self.peek_span();
        if let Token::Ident(text) = self.peek() {
            let ident = Ident {
                text: text.clone(),
                span,
            };
            self.advance();
            Some(ident)
        } else {
            None
        }
    }

    pub(crate) fn parse_decl(&mut self) -> Option<Decl> {
        let name = self.parse_ident()?;
        Some(Decl {
            name,
            binding: None,
        })
    }

    pub(crate) fn parse_decl_list(&mut self) -> Vec<Decl> {
        let mut decls = Vec::new();
        loop {
            match self.parse_decl() {
                Some(decl) => decls.push(decl),
                None => {
                    if !decls.is_empty() {
                        self.error("expected declare");
                    }
                    break;
                }
            }
            if !self.accept(&Token::Comma) {
                break;
            }
        }
        decls
    }
}

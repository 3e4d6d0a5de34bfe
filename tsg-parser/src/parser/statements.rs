// Statement parsing: `val` bindings and expression statements, with the
// newline-tolerant semicolon rule.

use super::Parser;
use tsg_ast::*;
use tsg_lexer::Token;

impl Parser {
    /// Parse one statement. `None` means the cursor is not on a statement
    /// start (block end, EOF, or garbage handled by the caller).
    pub(crate) fn parse_stmt(&mut self) -> Option<Stmt> {
        let stmt = if self.check(&Token::Val) {
            self.parse_stmt_val()
        } else {
            self.parse_stmt_expr()
        };

        // A missing semicolon is tolerated before `}`, at EOF, and when the
        // next token starts on a new line.
        if !self.accept(&Token::Semicolon)
            && !matches!(self.peek(), Token::Eof | Token::RBrace)
            && self.peek_span().begin.line == self.last_line
        {
            self.error(format!(
                "expected '{}', found '{}'",
                Token::Semicolon,
                self.peek()
            ));
        }

        stmt
    }

    fn parse_stmt_val(&mut self) -> Option<Stmt> {
        if !self.accept(&Token::Val) {
            return None;
        }

        let decl = self.parse_decl();
        if decl.is_none() {
            self.error("expected declare");
        }

        self.expect(&Token::Assign);

        let expr = self.parse_expr();
        if expr.is_none() {
            self.error("expected expression");
        }

        Some(Stmt::Val {
            decl: decl?,
            expr: expr?,
        })
    }

    fn parse_stmt_expr(&mut self) -> Option<Stmt> {
        let expr = self.parse_expr()?;
        Some(Stmt::Expr { expr })
    }
}

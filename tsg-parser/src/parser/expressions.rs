// Expression parsing: precedence climbing over the binary operators, call
// suffixes, and the operand grammar.

use super::Parser;
use tsg_ast::*;
use tsg_diagnostics::Span;
use tsg_lexer::Token;

/// Precedence groups: comparisons bind loosest, then additive, then
/// multiplicative. Anything else is not a binary operator.
fn token_prec(token: &Token) -> i8 {
    match token {
        Token::EqEq | Token::Lt | Token::Gt => 1,
        Token::Plus | Token::Minus => 2,
        Token::Star | Token::Slash => 3,
        _ => -1,
    }
}

fn token_binop(token: &Token) -> Option<BinOp> {
    match token {
        Token::EqEq => Some(BinOp::Eq),
        Token::Lt => Some(BinOp::Lt),
        Token::Gt => Some(BinOp::Gt),
        Token::Plus => Some(BinOp::Add),
        Token::Minus => Some(BinOp::Sub),
        Token::Star => Some(BinOp::Mul),
        Token::Slash => Some(BinOp::Div),
        _ => None,
    }
}

impl Parser {
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_expr_binary(0)
    }

    fn parse_expr_binary(&mut self, lowest_prec: i8) -> Option<Expr> {
        let mut lhs = self.parse_expr_primary()?;

        loop {
            let prec = token_prec(self.peek());
            if prec <= lowest_prec {
                return Some(lhs);
            }

            let Some(op) = token_binop(self.peek()) else {
                return Some(lhs);
            };
            self.advance();

            match self.parse_expr_binary(prec) {
                Some(rhs) => {
                    let span = lhs.span.to(rhs.span);
                    lhs = Expr {
                        kind: ExprKind::Binary {
                            op,
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        },
                        span,
                        tyvar: None,
                    };
                }
                None => self.error("expected expression"),
            }
        }
    }

    fn parse_expr_primary(&mut self) -> Option<Expr> {
        let mut operand = self.parse_expr_operand()?;

        while self.check(&Token::LParen) {
            operand = self.parse_expr_call(operand);
        }
        Some(operand)
    }

    fn parse_expr_call(&mut self, callee: Expr) -> Expr {
        self.accept(&Token::LParen);
        let args = self.parse_expr_list();
        let end = self.peek_span().end;
        self.expect(&Token::RParen);

        let span = Span::new(callee.span.begin, end);
        Expr {
            kind: ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
            tyvar: None,
        }
    }

    fn parse_expr_operand(&mut self) -> Option<Expr> {
        match self.peek() {
            Token::LParen => self.parse_expr_paren(),
            Token::If => self.parse_expr_ifelse(),
            Token::Ident(_) => self.parse_expr_ident(),
            Token::Number(_) => self.parse_expr_number(),
            _ => None,
        }
    }

    fn parse_expr_paren(&mut self) -> Option<Expr> {
        let begin = self.peek_span().begin;
        self.accept(&Token::LParen);

        let expr = self.parse_expr();
        if expr.is_none() {
            self.error("expected expression");
        }
        let end = self.peek_span().end;
        self.expect(&Token::RParen);

        // The parentheses widen the inner expression's range.
        let mut expr = expr?;
        expr.span = Span::new(begin, end);
        Some(expr)
    }

    fn parse_expr_ifelse(&mut self) -> Option<Expr> {
        let begin = self.peek_span().begin;
        self.accept(&Token::If);

        self.expect(&Token::LParen);
        let cond = self.parse_expr();
        if cond.is_none() {
            self.error("expected expression");
        }
        self.expect(&Token::RParen);

        self.expect(&Token::LBrace);
        let thn = self.parse_block();
        if thn.stmts.is_empty() {
            self.error("block is empty");
        }
        self.expect(&Token::RBrace);

        self.expect(&Token::Else);
        self.expect(&Token::LBrace);
        let els = self.parse_block();
        if els.stmts.is_empty() {
            self.error("block is empty");
        }
        let end = self.peek_span().end;
        self.expect(&Token::RBrace);

        Some(Expr {
            kind: ExprKind::IfElse {
                cond: Box::new(cond?),
                thn,
                els,
            },
            span: Span::new(begin, end),
            tyvar: None,
        })
    }

    fn parse_expr_ident(&mut self) -> Option<Expr> {
        let name = self.parse_ident()?;
        let span = name.span;
        Some(Expr {
            kind: ExprKind::Ident {
                name,
                binding: None,
            },
            span,
            tyvar: None,
        })
    }

    fn parse_expr_number(&mut self) -> Option<Expr> {
        let span = self.peek_span();
        let Token::Number(value) = *self.peek() else {
            return None;
        };
        self.advance();
        Some(Expr {
            kind: ExprKind::Number { value },
            span,
            tyvar: None,
        })
    }

    fn parse_expr_list(&mut self) -> Vec<Expr> {
        let mut exprs = Vec::new();
        loop {
            match self.parse_expr() {
                Some(expr) => exprs.push(expr),
                None => {
                    if !exprs.is_empty() {
                        self.error("expected expression");
                    }
                    break;
                }
            }
            if !self.accept(&Token::Comma) {
                break;
            }
        }
        exprs
    }
}

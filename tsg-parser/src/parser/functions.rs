// Function declaration parsing: `def IDENT ( params ) { block }`.

use super::Parser;
use tsg_ast::*;
use tsg_lexer::Token;

impl Parser {
    /// Parse one `def`. Returns `None` only when the cursor is not on `def`.
    pub(crate) fn parse_func(&mut self) -> Option<FuncId> {
        if !self.accept(&Token::Def) {
            return None;
        }

        let name = match self.parse_ident() {
            Some(name) => name,
            None => {
                self.error("expected identifier");
                Ident {
                    text: String::new(),
                    span: self.peek_span(),
                }
            }
        };

        self.expect(&Token::LParen);
        let params = self.parse_decl_list();
        self.expect(&Token::RParen);

        self.expect(&Token::LBrace);
        let body = self.parse_block();
        if body.stmts.is_empty() {
            self.error("block is empty");
        }
        self.expect(&Token::RBrace);

        Some(self.push_func(Function {
            decl: Decl {
                name,
                binding: None,
            },
            params,
            body,
            enclosing: None,
            depth: 0,
            tyset: TySet::default(),
            frame: Frame::default(),
            ftype: None,
        }))
    }
}

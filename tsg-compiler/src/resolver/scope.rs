//! The lexical scope chain: a stack of symbol tables, one per open scope.
//! Declarations go into the innermost table; lookups walk outward.

use super::symtbl::SymTbl;
use tsg_ast::Binding;

#[derive(Debug, Default)]
pub struct Scope {
    tables: Vec<SymTbl>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.tables.push(SymTbl::new());
    }

    pub fn pop(&mut self) {
        self.tables.pop();
    }

    /// Declare in the innermost scope; `false` when the name is already
    /// declared there (shadowing an outer scope is fine).
    pub fn add(&mut self, name: &str, binding: Binding) -> bool {
        self.tables
            .last_mut()
            .map(|table| table.insert(name, binding))
            .unwrap_or(false)
    }

    pub fn find(&self, name: &str) -> Option<Binding> {
        self.tables
            .iter()
            .rev()
            .find_map(|table| table.lookup(name))
    }
}

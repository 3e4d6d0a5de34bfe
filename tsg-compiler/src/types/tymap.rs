//! The call-site map of a polymorphic function value: argument-type tuple →
//! the type environment produced for that instantiation.
//!
//! Keys are compared structurally and stored as copies, so later retyping of
//! a caller-held tuple can never disturb a lookup. Entry counts stay tiny in
//! practice, so lookup is a linear scan.

use super::{arr_equals, TyEnv, Type};
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct CallMap {
    entries: Vec<CallEntry>,
}

#[derive(Debug)]
struct CallEntry {
    key: Vec<Rc<Type>>,
    env: Rc<TyEnv>,
}

impl CallMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &[Rc<Type>]) -> Option<Rc<TyEnv>> {
        self.entries
            .iter()
            .find(|entry| arr_equals(&entry.key, key))
            .map(|entry| entry.env.clone())
    }

    pub fn add(&mut self, key: &[Rc<Type>], env: Rc<TyEnv>) {
        debug_assert!(self.get(key).is_none(), "duplicate call-map key");
        self.entries.push(CallEntry {
            key: key.to_vec(),
            env,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &[Rc<Type>]> {
        self.entries.iter().map(|entry| entry.key.as_slice())
    }
}

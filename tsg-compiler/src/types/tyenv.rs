//! Per-instantiation type environments.
//!
//! An environment is a dense array of slots, one per type variable of the
//! owning type set, chained to the environment of the enclosing
//! instantiation. Reads and writes for a variable of an outer set walk the
//! chain until the owning set is found; each slot is written at most once.

use super::Type;
use std::cell::RefCell;
use std::rc::Rc;
use tsg_ast::{TySet, TyVar};

#[derive(Debug)]
pub struct TyEnv {
    set: u32,
    depth: u32,
    outer: Option<Rc<TyEnv>>,
    slots: RefCell<Vec<Option<Rc<Type>>>>,
}

impl TyEnv {
    pub fn new(tyset: &TySet, outer: Option<Rc<TyEnv>>) -> Self {
        debug_assert_eq!(
            outer.as_ref().map(|env| env.depth + 1).unwrap_or(0),
            tyset.depth,
            "environment chain must mirror the type-set chain"
        );
        Self {
            set: tyset.id,
            depth: tyset.depth,
            outer,
            slots: RefCell::new(vec![None; tyset.len as usize]),
        }
    }

    pub fn outer(&self) -> Option<&Rc<TyEnv>> {
        self.outer.as_ref()
    }

    /// Bind `var` to `ty`. The slot must not have been written before.
    pub fn set(&self, var: TyVar, ty: Rc<Type>) {
        let env = self
            .locate(var)
            .expect("type variable outside the environment chain");
        let mut slots = env.slots.borrow_mut();
        let slot = &mut slots[var.index as usize];
        debug_assert!(slot.is_none(), "type variable bound twice");
        *slot = Some(ty);
    }

    /// Read the binding of `var`, walking the chain to the owning set.
    pub fn get(&self, var: TyVar) -> Option<Rc<Type>> {
        let env = self.locate(var)?;
        let slots = env.slots.borrow();
        slots[var.index as usize].clone()
    }

    fn locate(&self, var: TyVar) -> Option<&TyEnv> {
        let mut env = self;
        loop {
            if env.depth < var.depth {
                return None;
            }
            if env.set == var.set {
                return Some(env);
            }
            env = env.outer.as_deref()?;
        }
    }
}

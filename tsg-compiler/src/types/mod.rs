//! The semantic type model.
//!
//! Types are immutable values shared through `Rc`; the one exception is the
//! return slot of a function type, which starts as a pending placeholder
//! while the body of a recursive instantiation is still being inferred and
//! is replaced in place once the body's type is known.
//!
//! Equality is structural for `Bool`, `Int` and `Func`, by source function
//! for `Poly`, and by identity for `Pend`: two distinct pending placeholders
//! stand for distinct unknowns and never compare equal.

mod tyenv;
mod tymap;

pub use tyenv::TyEnv;
pub use tymap::CallMap;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tsg_ast::{BinOp, FuncId};

#[derive(Debug)]
pub enum Type {
    Bool,
    Int,
    Func(FuncType),
    Poly(PolyType),
    /// Return type of an instantiation whose body is still being inferred.
    Pend,
}

/// A concrete (monomorphic) function type.
#[derive(Debug)]
pub struct FuncType {
    pub params: Vec<Rc<Type>>,
    pub ret: RefCell<Rc<Type>>,
}

/// The type of a named function before a call site fixes its argument
/// types. Holds the environment of the instantiation that declared the
/// function (weakly, since the environment chain owns the poly and not the
/// other way around) and the memoized instantiations keyed by argument
/// tuple.
#[derive(Debug)]
pub struct PolyType {
    pub func: FuncId,
    pub outer: Option<Weak<TyEnv>>,
    pub calls: RefCell<CallMap>,
}

impl PolyType {
    /// The environment this function was declared under. Panics only if the
    /// chain that owns this poly has been dropped, which cannot happen while
    /// the root environment is alive.
    pub fn outer_env(&self) -> Option<Rc<TyEnv>> {
        self.outer
            .as_ref()
            .map(|weak| weak.upgrade().expect("enclosing environment alive"))
    }
}

impl Type {
    pub fn boolean() -> Rc<Self> {
        Rc::new(Type::Bool)
    }

    pub fn int() -> Rc<Self> {
        Rc::new(Type::Int)
    }

    pub fn pending() -> Rc<Self> {
        Rc::new(Type::Pend)
    }

    pub fn is_pend(&self) -> bool {
        matches!(self, Type::Pend)
    }

    pub fn as_func(&self) -> Option<&FuncType> {
        match self {
            Type::Func(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_poly(&self) -> Option<&PolyType> {
        match self {
            Type::Poly(poly) => Some(poly),
            _ => None,
        }
    }

    pub fn equals(a: &Rc<Type>, b: &Rc<Type>) -> bool {
        match (&**a, &**b) {
            (Type::Bool, Type::Bool) | (Type::Int, Type::Int) => true,
            (Type::Func(x), Type::Func(y)) => {
                Type::equals(&x.ret.borrow(), &y.ret.borrow())
                    && arr_equals(&x.params, &y.params)
            }
            (Type::Poly(x), Type::Poly(y)) => x.func == y.func,
            (Type::Pend, Type::Pend) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Merge two types where one side may still be pending; the pending side
    /// absorbs into the concrete one. `None` when the types conflict.
    pub fn unify(a: &Rc<Type>, b: &Rc<Type>) -> Option<Rc<Type>> {
        if Type::equals(a, b) {
            Some(a.clone())
        } else if a.is_pend() && !b.is_pend() {
            Some(b.clone())
        } else if !a.is_pend() && b.is_pend() {
            Some(a.clone())
        } else {
            None
        }
    }

    /// Result type of a binary operator, or `None` on a type violation.
    pub fn binary(op: BinOp, lhs: &Rc<Type>, rhs: &Rc<Type>) -> Option<Rc<Type>> {
        match op {
            BinOp::Eq => binary_eq(lhs, rhs),
            BinOp::Lt | BinOp::Gt => binary_cmp(lhs, rhs),
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => binary_arith(lhs, rhs),
        }
    }
}

fn binary_eq(lhs: &Rc<Type>, rhs: &Rc<Type>) -> Option<Rc<Type>> {
    if Type::equals(lhs, rhs) {
        Some(Type::boolean())
    } else {
        None
    }
}

fn binary_cmp(lhs: &Rc<Type>, rhs: &Rc<Type>) -> Option<Rc<Type>> {
    let comparable = |t: &Type| matches!(t, Type::Int | Type::Pend);
    if comparable(lhs) && comparable(rhs) {
        Some(Type::boolean())
    } else {
        None
    }
}

fn binary_arith(lhs: &Rc<Type>, rhs: &Rc<Type>) -> Option<Rc<Type>> {
    match (&**lhs, &**rhs) {
        (Type::Int, Type::Int) | (Type::Int, Type::Pend) => Some(lhs.clone()),
        (Type::Pend, Type::Int) => Some(rhs.clone()),
        (Type::Pend, Type::Pend) => Some(Type::int()),
        _ => None,
    }
}

/// Pointwise equality of two argument-type tuples.
pub fn arr_equals(a: &[Rc<Type>], b: &[Rc<Type>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Type::equals(x, y))
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => f.write_str("Bool"),
            Type::Int => f.write_str("Int"),
            Type::Func(func) => {
                f.write_str("(")?;
                for (i, param) in func.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {}", func.ret.borrow())
            }
            Type::Poly(poly) => write!(f, "poly#{}", poly.func.0),
            Type::Pend => f.write_str("pend"),
        }
    }
}

/// Render an argument-type tuple for trace output.
pub fn arr_display(types: &[Rc<Type>]) -> String {
    let rendered: Vec<String> = types.iter().map(|ty| ty.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}

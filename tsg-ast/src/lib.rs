//! Abstract syntax tree for the tsg language, plus the semantic skeleton the
//! resolver attaches to it: type variables, type sets, static frames and
//! bindings.
//!
//! The parser builds the tree once; the resolver mutates it in place; the
//! verifier and the code generator consume it read-only. Functions live in a
//! flat arena on [`Ast`] and are addressed by [`FuncId`] everywhere else, so
//! type values can point back at their source function without ownership
//! cycles.

use serde::{Deserialize, Serialize};
use tsg_diagnostics::Span;

/// Name of the synthesized function wrapping the top-level block.
pub const ROOT_NAME: &str = "$main";

/// Index of a function in the [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuncId(pub u32);

impl FuncId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Root of the tree: the function arena and the synthesized root function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ast {
    pub funcs: Vec<Function>,
    pub root: FuncId,
}

impl Ast {
    pub fn func(&self, id: FuncId) -> &Function {
        &self.funcs[id.index()]
    }
}

/// An identifier with its source range. Equality is byte-wise on the text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub text: String,
    pub span: Span,
}

/// A type variable: an index into the type set it was allocated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TyVar {
    /// Identity of the owning type set.
    pub set: u32,
    /// Static nesting depth of the owning type set.
    pub depth: u32,
    pub index: u32,
}

/// Per-function pool of type variables. `depth` equals the function's static
/// nesting depth; `len` is the number of variables allocated so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TySet {
    pub id: u32,
    pub depth: u32,
    pub len: u32,
}

impl TySet {
    /// Allocate the next type variable in this set.
    pub fn fresh(&mut self) -> TyVar {
        let var = TyVar {
            set: self.id,
            depth: self.depth,
            index: self.len,
        };
        self.len += 1;
        var
    }
}

/// One slot of a static frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub index: u32,
    pub tyvar: TyVar,
}

/// Static activation-record layout of one function: parameters first, then
/// every `val` binding of the body in declaration order, across all nested
/// blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub depth: u32,
    pub members: Vec<Member>,
}

/// The link from a name to the frame member holding its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Depth of the frame the member lives in.
    pub depth: u32,
    /// Member index within that frame.
    pub index: u32,
    /// The member's type variable.
    pub tyvar: TyVar,
}

/// A declared name. `binding` is filled by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    pub name: Ident,
    pub binding: Option<Binding>,
}

/// A function declaration. Everything after `body` is resolver state: the
/// type-variable pool, the frame layout, the distinguished variable holding
/// the function's own function-type (always index 0 of `tyset`), and the
/// lexical position among its ancestors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub decl: Decl,
    pub params: Vec<Decl>,
    pub body: Block,
    pub enclosing: Option<FuncId>,
    pub depth: u32,
    pub tyset: TySet,
    pub frame: Frame,
    pub ftype: Option<TyVar>,
}

/// A lexical block: nested function declarations plus statements. Nested
/// functions are visible to every statement of the block regardless of
/// textual order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub funcs: Vec<FuncId>,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `val <name> = <expr>;`
    Val { decl: Decl, expr: Expr },
    /// `<expr>;` whose value is the block's value when it is the last
    /// statement.
    Expr { expr: Expr },
}

impl Stmt {
    pub fn expr(&self) -> &Expr {
        match self {
            Stmt::Val { expr, .. } | Stmt::Expr { expr } => expr,
        }
    }
}

/// Binary operators, in precedence groups `{== < >} < {+ -} < {* /}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Eq,
    Lt,
    Gt,
    Add,
    Sub,
    Mul,
    Div,
}

/// An expression. `tyvar` is allocated by the resolver after the children
/// are resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub tyvar: Option<TyVar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    IfElse {
        cond: Box<Expr>,
        thn: Block,
        els: Block,
    },
    Ident {
        name: Ident,
        binding: Option<Binding>,
    },
    Number {
        value: i32,
    },
}

//! Name resolution.
//!
//! One walk over the AST that opens a type set, a static frame and a scope
//! per function, declares every name as a frame member, binds every
//! identifier expression to the member it references, and allocates a fresh
//! type variable for every expression.
//!
//! Within a block, all nested `def`s are declared before any of their bodies
//! is resolved, so mutual recursion works regardless of textual order. A
//! `val` statement resolves its right-hand side *before* declaring the new
//! name, so `val x = x;` picks up the outer `x`.

mod scope;
mod symtbl;

pub use scope::Scope;
pub use symtbl::SymTbl;

use tsg_ast::*;
use tsg_diagnostics::Diagnostics;

/// State of the function currently being resolved.
struct FnCtx {
    func: FuncId,
    tyset: TySet,
    frame: Frame,
}

pub struct Resolver {
    scope: Scope,
    diagnostics: Diagnostics,
    next_set: u32,
}

/// Resolve a freshly parsed AST in place. Resolving the same AST twice is a
/// bug in the caller and trips debug assertions.
pub fn resolve(ast: &mut Ast) -> Diagnostics {
    let mut resolver = Resolver {
        scope: Scope::new(),
        diagnostics: Diagnostics::new(),
        next_set: 0,
    };
    resolver.resolve_func(ast, ast.root, None);
    resolver.diagnostics
}

impl Resolver {
    fn resolve_func(&mut self, ast: &mut Ast, id: FuncId, enclosing: Option<(FuncId, u32)>) {
        debug_assert!(ast.funcs[id.index()].ftype.is_none(), "AST resolved twice");

        let depth = enclosing.map_or(0, |(_, outer_depth)| outer_depth + 1);
        let mut ctx = FnCtx {
            func: id,
            tyset: TySet {
                id: self.next_set,
                depth,
                len: 0,
            },
            frame: Frame {
                depth,
                members: Vec::new(),
            },
        };
        self.next_set += 1;

        // index 0 of every set names the function's own function-type
        let ftype = ctx.tyset.fresh();

        self.scope.push();

        let mut params = std::mem::take(&mut ast.funcs[id.index()].params);
        for decl in &mut params {
            self.declare(&mut ctx, decl);
        }

        let mut body = std::mem::take(&mut ast.funcs[id.index()].body);
        self.resolve_block(ast, &mut body, &mut ctx);

        self.scope.pop();

        let func = &mut ast.funcs[id.index()];
        func.params = params;
        func.body = body;
        func.tyset = ctx.tyset;
        func.frame = ctx.frame;
        func.ftype = Some(ftype);
        func.depth = depth;
        func.enclosing = enclosing.map(|(outer, _)| outer);
    }

    fn resolve_block(&mut self, ast: &mut Ast, block: &mut Block, ctx: &mut FnCtx) {
        // declare every nested function first
        for fid in &block.funcs {
            let mut decl = std::mem::take(&mut ast.funcs[fid.index()].decl);
            self.declare(ctx, &mut decl);
            ast.funcs[fid.index()].decl = decl;
        }

        for fid in &block.funcs {
            self.resolve_func(ast, *fid, Some((ctx.func, ctx.frame.depth)));
        }

        for stmt in &mut block.stmts {
            match stmt {
                Stmt::Val { decl, expr } => {
                    self.resolve_expr(ast, expr, ctx);
                    self.declare(ctx, decl);
                }
                Stmt::Expr { expr } => self.resolve_expr(ast, expr, ctx),
            }
        }
    }

    fn resolve_expr(&mut self, ast: &mut Ast, expr: &mut Expr, ctx: &mut FnCtx) {
        match &mut expr.kind {
            ExprKind::Binary { lhs, rhs, .. } => {
                self.resolve_expr(ast, lhs, ctx);
                self.resolve_expr(ast, rhs, ctx);
            }
            ExprKind::Call { callee, args } => {
                self.resolve_expr(ast, callee, ctx);
                for arg in args {
                    self.resolve_expr(ast, arg, ctx);
                }
            }
            ExprKind::IfElse { cond, thn, els } => {
                self.resolve_expr(ast, cond, ctx);

                self.scope.push();
                self.resolve_block(ast, thn, ctx);
                self.scope.pop();

                self.scope.push();
                self.resolve_block(ast, els, ctx);
                self.scope.pop();
            }
            ExprKind::Ident { name, binding } => match self.scope.find(&name.text) {
                Some(found) => *binding = Some(found),
                None => self
                    .diagnostics
                    .error(name.span, format!("undeclared '{}'", name.text)),
            },
            ExprKind::Number { .. } => {}
        }

        debug_assert!(expr.tyvar.is_none(), "expression resolved twice");
        expr.tyvar = Some(ctx.tyset.fresh());
    }

    /// Allocate a frame member plus type variable for `decl` and declare it
    /// in the innermost scope.
    fn declare(&mut self, ctx: &mut FnCtx, decl: &mut Decl) {
        debug_assert!(decl.binding.is_none(), "declaration resolved twice");

        let tyvar = ctx.tyset.fresh();
        let index = ctx.frame.members.len() as u32;
        ctx.frame.members.push(Member { index, tyvar });

        let binding = Binding {
            depth: ctx.frame.depth,
            index,
            tyvar,
        };
        if !self.scope.add(&decl.name.text, binding) {
            self.diagnostics.error(
                decl.name.span,
                format!("redefinition '{}'", decl.name.text),
            );
        }
        decl.binding = Some(binding);
    }
}

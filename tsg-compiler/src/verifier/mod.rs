//! The monomorphizing type inferencer.
//!
//! Every named function starts out polymorphic over its parameter types.
//! A call site fixes an argument-type tuple; each distinct tuple produces
//! one instantiation with its own type environment, memoized in the
//! function's call-site map. The map entry is published *before* the body
//! is inferred, with a pending return type, so recursive calls find the
//! in-progress instantiation and terminate; the pending placeholder is
//! replaced by the real return type once the body is done.

use crate::types::{CallMap, FuncType, PolyType, TyEnv, Type};
use std::cell::RefCell;
use std::rc::Rc;
use tsg_ast::*;
use tsg_diagnostics::{Diagnostics, Span};

pub struct Verifier<'a> {
    ast: &'a Ast,
    env: Option<Rc<TyEnv>>,
    diagnostics: Diagnostics,
}

/// Infer the whole program from a fully resolved AST. Returns the root
/// instantiation's environment (attached to the AST's lifetime by the
/// caller) plus the verifier diagnostics.
pub fn verify(ast: &Ast) -> (Option<Rc<TyEnv>>, Diagnostics) {
    let mut verifier = Verifier {
        ast,
        env: None,
        diagnostics: Diagnostics::new(),
    };

    let root_poly = PolyType {
        func: ast.root,
        outer: None,
        calls: RefCell::new(CallMap::new()),
    };
    let root_type = verifier.instantiate(&root_poly, &[]);

    // The program's value is `main()`'s result, so the root instantiation
    // must come out as Int.
    if verifier.diagnostics.is_empty() {
        let ret_is_int = root_type
            .as_func()
            .map(|func| matches!(&**func.ret.borrow(), Type::Int))
            .unwrap_or(false);
        if !ret_is_int {
            let span = verifier.entry_span();
            verifier.diagnostics.error(span, "incompatible type");
        }
    }

    let root_env = root_poly.calls.borrow().get(&[]);
    (root_env, verifier.diagnostics)
}

impl<'a> Verifier<'a> {
    /// Source range of the synthesized entry call.
    fn entry_span(&self) -> Span {
        let root = self.ast.func(self.ast.root);
        root.body
            .stmts
            .last()
            .map(|stmt| stmt.expr().span)
            .unwrap_or(root.body.span)
    }

    fn env(&self) -> &Rc<TyEnv> {
        self.env.as_ref().expect("active type environment")
    }

    fn error(&mut self, span: Span, message: &str) {
        self.diagnostics.error(span, message);
    }

    /// Bind an expression's type variable in the current environment.
    fn bind(&mut self, expr: &Expr, ty: Rc<Type>) {
        let tyvar = expr.tyvar.expect("expression resolved");
        self.env().set(tyvar, ty);
    }

    /// Produce the typed instantiation of `poly`'s function for `args`.
    /// The caller has already checked the arity and the call-site map.
    fn instantiate(&mut self, poly: &PolyType, args: &[Rc<Type>]) -> Rc<Type> {
        let func = self.ast.func(poly.func);
        log::debug!(
            "instantiating '{}' at {}",
            func.decl.name.text,
            crate::types::arr_display(args)
        );

        let env = Rc::new(TyEnv::new(&func.tyset, poly.outer_env()));
        // publish before inferring the body so recursion finds the entry
        poly.calls.borrow_mut().add(args, env.clone());

        let func_type = Rc::new(Type::Func(FuncType {
            params: args.to_vec(),
            ret: RefCell::new(Type::pending()),
        }));
        env.set(func.ftype.expect("function resolved"), func_type.clone());

        for (decl, ty) in func.params.iter().zip(args) {
            env.set(decl.binding.expect("parameter resolved").tyvar, ty.clone());
        }

        let prev = self.env.replace(env);
        let ret = self.infer_block(&func.body);
        self.env = prev;

        // replace the pending placeholder; on an errored body the
        // placeholder stays and the driver halts on the diagnostics
        if let (Some(ret), Type::Func(func_type)) = (ret, &*func_type) {
            *func_type.ret.borrow_mut() = ret;
        }
        func_type
    }

    /// Infer a block: bind a fresh polymorphic value for every nested
    /// function first, then infer the statements in order. The block's type
    /// is the last statement's type.
    fn infer_block(&mut self, block: &Block) -> Option<Rc<Type>> {
        for fid in &block.funcs {
            let func = self.ast.func(*fid);
            let poly = Rc::new(Type::Poly(PolyType {
                func: *fid,
                outer: Some(Rc::downgrade(self.env())),
                calls: RefCell::new(CallMap::new()),
            }));
            self.env()
                .set(func.decl.binding.expect("function resolved").tyvar, poly);
        }

        let mut last = None;
        for stmt in &block.stmts {
            last = self.infer_stmt(stmt);
        }
        last
    }

    fn infer_stmt(&mut self, stmt: &Stmt) -> Option<Rc<Type>> {
        match stmt {
            Stmt::Val { decl, expr } => {
                let ty = self.infer_expr(expr)?;
                self.env()
                    .set(decl.binding.expect("declaration resolved").tyvar, ty.clone());
                Some(ty)
            }
            Stmt::Expr { expr } => self.infer_expr(expr),
        }
    }

    /// Infer one expression, record its type in the current environment and
    /// return it. `None` marks a subtree that already produced a
    /// diagnostic; siblings keep going.
    fn infer_expr(&mut self, expr: &Expr) -> Option<Rc<Type>> {
        match &expr.kind {
            ExprKind::Number { .. } => {
                let ty = Type::int();
                self.bind(expr, ty.clone());
                Some(ty)
            }
            ExprKind::Ident { binding, .. } => {
                let binding = (*binding)?;
                let ty = self
                    .env()
                    .get(binding.tyvar)
                    .expect("binding typed before use");
                self.bind(expr, ty.clone());
                Some(ty)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.infer_expr(lhs);
                let rhs_ty = self.infer_expr(rhs);
                let (lhs_ty, rhs_ty) = (lhs_ty?, rhs_ty?);

                match Type::binary(*op, &lhs_ty, &rhs_ty) {
                    Some(ty) => {
                        self.bind(expr, ty.clone());
                        Some(ty)
                    }
                    None => {
                        self.error(expr.span, "incompatible type");
                        None
                    }
                }
            }
            ExprKind::IfElse { cond, thn, els } => {
                if let Some(cond_ty) = self.infer_expr(cond) {
                    if !matches!(&*cond_ty, Type::Bool) {
                        self.error(cond.span, "cond expr must have boolean type");
                    }
                }

                let thn_ty = self.infer_block(thn);
                let els_ty = self.infer_block(els);
                let (thn_ty, els_ty) = (thn_ty?, els_ty?);

                match Type::unify(&thn_ty, &els_ty) {
                    Some(ty) => {
                        self.bind(expr, ty.clone());
                        Some(ty)
                    }
                    None => {
                        self.error(expr.span, "type miss match with thn_block and els_block");
                        None
                    }
                }
            }
            ExprKind::Call { callee, args } => self.infer_call(expr, callee, args),
        }
    }

    fn infer_call(&mut self, expr: &Expr, callee: &Expr, args: &[Expr]) -> Option<Rc<Type>> {
        let callee_ty = self.infer_expr(callee);

        let mut arg_types = Vec::with_capacity(args.len());
        let mut args_ok = true;
        for arg in args {
            match self.infer_expr(arg) {
                Some(ty) => arg_types.push(ty),
                None => args_ok = false,
            }
        }

        let callee_ty = callee_ty?;
        let Type::Poly(poly) = &*callee_ty else {
            self.error(callee.span, "callee is not a function");
            return None;
        };
        if !args_ok {
            return None;
        }

        let existing = poly.calls.borrow().get(&arg_types);
        let func_type = match existing {
            // already typed (or mid-inference, for recursive calls)
            Some(env) => {
                let ftype = self.ast.func(poly.func).ftype.expect("function resolved");
                env.get(ftype).expect("instantiation typed")
            }
            None => {
                let param_count = self.ast.func(poly.func).params.len();
                if arg_types.len() < param_count {
                    self.error(expr.span, "too few arguments");
                    return None;
                }
                if arg_types.len() > param_count {
                    self.error(expr.span, "too many arguments");
                    return None;
                }
                self.instantiate(poly, &arg_types)
            }
        };

        // a pending return type propagates into the surrounding inference
        let ret = func_type.as_func()?.ret.borrow().clone();
        self.bind(expr, ret.clone());
        Some(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verified(source: &str) -> (Ast, Option<Rc<TyEnv>>, Diagnostics) {
        let (mut ast, parse_diags) = tsg_parser::parse(source);
        assert!(parse_diags.is_empty(), "parse failed: {parse_diags:?}");
        let resolve_diags = crate::resolve(&mut ast);
        assert!(resolve_diags.is_empty(), "resolve failed: {resolve_diags:?}");
        let (env, diags) = verify(&ast);
        (ast, env, diags)
    }

    fn clean(source: &str) -> (Ast, Rc<TyEnv>) {
        let (ast, env, diags) = verified(source);
        assert!(
            diags.is_empty(),
            "unexpected diagnostics: {:?}",
            diags.iter().collect::<Vec<_>>()
        );
        (ast, env.expect("root environment"))
    }

    /// The polymorphic value bound for a top-level function.
    fn top_level_poly(ast: &Ast, env: &Rc<TyEnv>, name: &str) -> Rc<Type> {
        let root = ast.func(ast.root);
        let id = root
            .body
            .funcs
            .iter()
            .copied()
            .find(|id| ast.func(*id).decl.name.text == name)
            .unwrap_or_else(|| panic!("no top-level function '{name}'"));
        env.get(ast.func(id).decl.binding.unwrap().tyvar)
            .unwrap_or_else(|| panic!("'{name}' has no polymorphic type"))
    }

    #[test]
    fn test_simple_program_types() {
        let (ast, env) = clean("def main() { 42; }");
        let main = top_level_poly(&ast, &env, "main");
        let poly = main.as_poly().expect("main is polymorphic");
        assert_eq!(poly.calls.borrow().len(), 1);

        let main_env = poly.calls.borrow().get(&[]).unwrap();
        let ftype_var = ast.func(poly.func).ftype.unwrap();
        let func_type = main_env.get(ftype_var).unwrap();
        let func = func_type.as_func().unwrap();
        assert!(func.params.is_empty());
        assert!(matches!(&**func.ret.borrow(), Type::Int));
    }

    #[test]
    fn test_instantiation_keyed_by_argument_tuple() {
        let (ast, env) = clean("def id(x) { x; } def main() { id(7); id(9); }");
        let id = top_level_poly(&ast, &env, "id");
        let poly = id.as_poly().unwrap();

        // both calls share the [Int] instantiation
        let calls = poly.calls.borrow();
        assert_eq!(calls.len(), 1);
        let key: Vec<_> = calls.keys().next().unwrap().to_vec();
        assert_eq!(key.len(), 1);
        assert!(matches!(&*key[0], Type::Int));
    }

    #[test]
    fn test_recursion_resolves_through_pending() {
        let (ast, env) = clean(
            "def fact(n) { if (n < 2) { 1; } else { n * fact(n - 1); } } \
             def main() { fact(5); }",
        );
        let fact = top_level_poly(&ast, &env, "fact");
        let poly = fact.as_poly().unwrap();
        let calls = poly.calls.borrow();
        assert_eq!(calls.len(), 1);

        let fact_env = calls.get(&[Type::int()]).unwrap();
        let func_type = fact_env.get(ast.func(poly.func).ftype.unwrap()).unwrap();
        let ret = func_type.as_func().unwrap().ret.borrow().clone();
        assert!(
            matches!(&*ret, Type::Int),
            "pending return replaced by Int after inference"
        );
    }

    #[test]
    fn test_function_valued_argument() {
        let (ast, env) = clean(
            "def apply(f) { f(5); } def id(x) { x; } def main() { apply(id); }",
        );
        let apply = top_level_poly(&ast, &env, "apply");
        let calls = apply.as_poly().unwrap().calls.borrow();
        assert_eq!(calls.len(), 1);
        let key: Vec<_> = calls.keys().next().unwrap().to_vec();
        assert!(matches!(&*key[0], Type::Poly(_)));

        let id = top_level_poly(&ast, &env, "id");
        assert_eq!(id.as_poly().unwrap().calls.borrow().len(), 1);
    }

    #[test]
    fn test_all_member_slots_typed() {
        let (ast, env) = clean("def add(a, b) { val c = a + b; c; } def main() { add(2, 3); }");
        let add = top_level_poly(&ast, &env, "add");
        let poly = add.as_poly().unwrap();
        let add_env = poly
            .calls
            .borrow()
            .get(&[Type::int(), Type::int()])
            .unwrap();

        for member in &ast.func(poly.func).frame.members {
            let ty = add_env.get(member.tyvar).expect("member typed");
            assert!(!ty.is_pend());
        }
    }

    #[test]
    fn test_incompatible_type() {
        let (_, _, diags) = verified("def main() { main + 1; }");
        assert!(diags.any_contains("incompatible type"));
    }

    #[test]
    fn test_cond_must_be_boolean() {
        let (_, _, diags) = verified("def main() { if (1) { 1; } else { 2; }; }");
        assert!(diags.any_contains("cond expr must have boolean type"));
    }

    #[test]
    fn test_branch_type_mismatch() {
        let (_, _, diags) = verified("def main() { if (1 < 2) { 1; } else { main; }; }");
        assert!(diags.any_contains("type miss match with thn_block and els_block"));
    }

    #[test]
    fn test_callee_must_be_function() {
        let (_, _, diags) = verified("def main() { val x = 1; x(2); }");
        assert!(diags.any_contains("callee is not a function"));
    }

    #[test]
    fn test_too_many_arguments() {
        let (_, _, diags) = verified("def f(x) { x; } def main() { f(1, 2); }");
        assert!(diags.any_contains("too many arguments"));
    }

    #[test]
    fn test_too_few_arguments() {
        let (_, _, diags) = verified("def f(x) { x; } def main() { f(); }");
        assert!(diags.any_contains("too few arguments"));
    }

    #[test]
    fn test_main_must_return_int() {
        let (_, _, diags) = verified("def main() { 1 < 2; }");
        assert!(diags.any_contains("incompatible type"));
    }

    #[test]
    fn test_errors_do_not_stop_siblings() {
        let (_, _, diags) = verified(
            "def main() { if (1) { 1; } else { 2; }; val x = 1; x(3); 1; }",
        );
        assert!(diags.any_contains("cond expr must have boolean type"));
        assert!(diags.any_contains("callee is not a function"));
    }
}

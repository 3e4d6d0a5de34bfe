// End-to-end pipeline tests: source text through parse, resolve, verify and
// the JIT, checking program results and driver-visible diagnostics.

use std::rc::Rc;
use tsg_ast::Ast;
use tsg_compiler::TyEnv;
use tsg_diagnostics::Diagnostics;

fn compile(source: &str) -> (Ast, Rc<TyEnv>) {
    let (mut ast, diags) = tsg_parser::parse(source);
    assert!(diags.is_empty(), "parse diagnostics: {diags:?}");
    let diags = tsg_compiler::resolve(&mut ast);
    assert!(diags.is_empty(), "resolve diagnostics: {diags:?}");
    let (env, diags) = tsg_compiler::verify(&ast);
    assert!(diags.is_empty(), "verify diagnostics: {diags:?}");
    (ast, env.expect("root environment"))
}

fn run(source: &str) -> i32 {
    let (ast, env) = compile(source);
    tsg_compiler::run_jit(&ast, &env, false).expect("jit run")
}

fn diagnostics_of(source: &str) -> Diagnostics {
    let (mut ast, diags) = tsg_parser::parse(source);
    if !diags.is_empty() {
        return diags;
    }
    let diags = tsg_compiler::resolve(&mut ast);
    if !diags.is_empty() {
        return diags;
    }
    let (_, diags) = tsg_compiler::verify(&ast);
    diags
}

#[test]
fn test_constant_program() {
    assert_eq!(run("def main() { 42; }"), 42);
}

#[test]
fn test_two_argument_call() {
    assert_eq!(run("def add(a, b) { a + b; } def main() { add(2, 3); }"), 5);
}

#[test]
fn test_identity_call() {
    assert_eq!(run("def id(x) { x; } def main() { id(7); }"), 7);
}

#[test]
fn test_recursive_factorial() {
    assert_eq!(
        run("def fact(n) { if (n < 2) { 1; } else { n * fact(n - 1); } } \
             def main() { fact(5); }"),
        120
    );
}

#[test]
fn test_if_else_value() {
    assert_eq!(run("def main() { if (1 < 2) { 10; } else { 20; }; }"), 10);
}

#[test]
fn test_operator_precedence() {
    assert_eq!(run("def main() { val x = 1 + 2 * 3; x; }"), 7);
}

#[test]
fn test_division_and_comparison() {
    assert_eq!(
        run("def main() { if (9 / 3 > 2) { 1; } else { 0; }; }"),
        1
    );
}

#[test]
fn test_block_value_is_last_statement() {
    assert_eq!(run("def main() { 1; 2; 3; }"), 3);
}

#[test]
fn test_static_chain_through_nested_functions() {
    assert_eq!(
        run("def main() { def outer(a) { def inner() { a + 1; } inner(); } outer(41); }"),
        42
    );
}

#[test]
fn test_boolean_returning_nested_function() {
    assert_eq!(
        run("def main() { def flag() { 1 < 2; } if (flag()) { 10; } else { 20; }; }"),
        10
    );
}

#[test]
fn test_function_passed_as_value() {
    assert_eq!(
        run("def apply(f) { f(5); } def id(x) { x; } def main() { apply(id); }"),
        5
    );
}

#[test]
fn test_recursion_through_pending_branch() {
    // countdown: the then-branch carries the value, the else-branch is
    // recursion-only until the base case unifies it
    assert_eq!(
        run("def down(n) { if (n < 1) { 0; } else { down(n - 1); } } \
             def main() { down(3); }"),
        0
    );
}

#[test]
fn test_mutual_recursion() {
    assert_eq!(
        run("def even(n) { if (n == 0) { 1; } else { odd(n - 1); } } \
             def odd(n) { if (n == 0) { 0; } else { even(n - 1); } } \
             def main() { even(10); }"),
        1
    );
}

#[test]
fn test_shadowing_val() {
    assert_eq!(
        run("def main() { val x = 1; if (1 < 2) { val x = x + 1; x; } else { 0; }; }"),
        2
    );
}

#[test]
fn test_one_native_function_per_tuple() {
    // two id calls at the same tuple share one instantiation
    let (ast, env) = compile("def id(x) { x; } def main() { id(7); id(9); }");
    let root = ast.func(ast.root);
    let id = root
        .body
        .funcs
        .iter()
        .copied()
        .find(|f| ast.func(*f).decl.name.text == "id")
        .expect("id function");
    let poly_ty = env
        .get(ast.func(id).decl.binding.expect("resolved").tyvar)
        .expect("id typed");
    let poly = poly_ty.as_poly().expect("id polymorphic");
    assert_eq!(poly.calls.borrow().len(), 1);
    assert_eq!(tsg_compiler::run_jit(&ast, &env, false).expect("jit run"), 9);
}

// ---------------------------------------------------------------- errors

#[test]
fn test_undeclared_diagnostic() {
    let diags = diagnostics_of("def main() { foo; }");
    assert!(diags.any_contains("undeclared 'foo'"));
}

#[test]
fn test_incompatible_type_diagnostic() {
    let diags = diagnostics_of("def main() { main + 1; }");
    assert!(diags.any_contains("incompatible type"));
}

#[test]
fn test_too_many_arguments_diagnostic() {
    let diags = diagnostics_of("def f(x) { x; } def main() { f(1, 2); }");
    assert!(diags.any_contains("too many arguments"));
}

#[test]
fn test_non_boolean_condition_diagnostic() {
    let diags = diagnostics_of("def main() { if (1) { 1; } else { 2; }; }");
    assert!(diags.any_contains("cond expr must have boolean type"));
}

#[test]
fn test_branch_mismatch_diagnostic() {
    let diags = diagnostics_of("def main() { if (1<2) { 1; } else { main; }; }");
    assert!(diags.any_contains("type miss match with thn_block and els_block"));
}

#[test]
fn test_missing_main_diagnostic() {
    let diags = diagnostics_of("def helper() { 1; }");
    assert!(diags.any_contains("undeclared 'main'"));
}

#[test]
fn test_diagnostic_positions() {
    let diags = diagnostics_of("def main() {\n  foo;\n}");
    let printed: Vec<_> = diags.iter().map(|d| d.to_string()).collect();
    assert_eq!(printed, ["2:3: undeclared 'foo'"]);
}

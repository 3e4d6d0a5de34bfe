//! Recursive-descent parser for the tsg language.
//!
//! The whole source file is parsed as the body block of a synthesized root
//! function named `$main`; one `main()` call statement is appended to that
//! block so the entry point flows through resolving, inference and lowering
//! like any other call.

mod parser;

pub use parser::{parse, Parser};

#[cfg(test)]
mod tests {
    use tsg_ast::{BinOp, Expr, ExprKind, Stmt, ROOT_NAME};
    use tsg_diagnostics::Diagnostics;

    fn parse(source: &str) -> (tsg_ast::Ast, Diagnostics) {
        super::parse(source)
    }

    fn parse_clean(source: &str) -> tsg_ast::Ast {
        let (ast, diags) = parse(source);
        assert!(
            diags.is_empty(),
            "unexpected diagnostics: {:?}",
            diags.iter().collect::<Vec<_>>()
        );
        ast
    }

    #[test]
    fn test_root_synthesis() {
        let ast = parse_clean("def main() { 42; }");
        let root = ast.func(ast.root);
        assert_eq!(root.decl.name.text, ROOT_NAME);
        assert!(root.params.is_empty());
        assert_eq!(root.body.funcs.len(), 1);

        // the appended entry call
        assert_eq!(root.body.stmts.len(), 1);
        let Stmt::Expr { expr } = &root.body.stmts[0] else {
            panic!("expected the synthesized entry call");
        };
        let ExprKind::Call { callee, args } = &expr.kind else {
            panic!("expected a call expression");
        };
        assert!(args.is_empty());
        let ExprKind::Ident { name, .. } = &callee.kind else {
            panic!("expected an identifier callee");
        };
        assert_eq!(name.text, "main");
    }

    #[test]
    fn test_function_shape() {
        let ast = parse_clean("def add(a, b) { a + b; }");
        let root = ast.func(ast.root);
        let add = ast.func(root.body.funcs[0]);
        assert_eq!(add.decl.name.text, "add");
        let names: Vec<_> = add.params.iter().map(|p| p.name.text.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(add.body.stmts.len(), 1);
    }

    fn first_stmt_expr(source: &str) -> Expr {
        let ast = parse_clean(source);
        let root = ast.func(ast.root);
        let func = ast.func(root.body.funcs[0]);
        func.body.stmts[0].expr().clone()
    }

    #[test]
    fn test_precedence() {
        let expr = first_stmt_expr("def main() { 1 + 2 * 3; }");
        let ExprKind::Binary { op, rhs, .. } = &expr.kind else {
            panic!("expected a binary expression");
        };
        assert_eq!(*op, BinOp::Add);
        let ExprKind::Binary { op, .. } = &rhs.kind else {
            panic!("expected the multiplication on the right");
        };
        assert_eq!(*op, BinOp::Mul);
    }

    #[test]
    fn test_left_associativity() {
        let expr = first_stmt_expr("def main() { 10 - 2 - 3; }");
        let ExprKind::Binary { op, lhs, .. } = &expr.kind else {
            panic!("expected a binary expression");
        };
        assert_eq!(*op, BinOp::Sub);
        let ExprKind::Binary { op, .. } = &lhs.kind else {
            panic!("expected the first subtraction on the left");
        };
        assert_eq!(*op, BinOp::Sub);
    }

    #[test]
    fn test_comparison_binds_loosest() {
        let expr = first_stmt_expr("def main() { 1 + 2 < 3 * 4; }");
        let ExprKind::Binary { op, .. } = &expr.kind else {
            panic!("expected a binary expression");
        };
        assert_eq!(*op, BinOp::Lt);
    }

    #[test]
    fn test_call_suffix_chain() {
        let expr = first_stmt_expr("def main() { f(1)(2); }");
        let ExprKind::Call { callee, args } = &expr.kind else {
            panic!("expected the outer call");
        };
        assert_eq!(args.len(), 1);
        assert!(matches!(callee.kind, ExprKind::Call { .. }));
    }

    #[test]
    fn test_parenthesized_grouping() {
        let expr = first_stmt_expr("def main() { (1 + 2) * 3; }");
        let ExprKind::Binary { op, .. } = &expr.kind else {
            panic!("expected a binary expression");
        };
        assert_eq!(*op, BinOp::Mul);
    }

    #[test]
    fn test_newline_tolerates_missing_semicolon() {
        let (_, diags) = parse("def main() {\n  41\n  42\n}");
        assert!(
            diags.is_empty(),
            "newline-separated statements need no semicolons"
        );
    }

    #[test]
    fn test_same_line_missing_semicolon() {
        let (_, diags) = parse("def main() { 41 42; }");
        assert!(diags.any_contains("expected ';', found '<NUMBER>'"));
    }

    #[test]
    fn test_empty_if_block() {
        let (_, diags) = parse("def main() { if (1 < 2) { } else { 2; }; }");
        assert!(diags.any_contains("block is empty"));
    }

    #[test]
    fn test_empty_def_body() {
        let (_, diags) = parse("def f() { } def main() { 1; }");
        assert!(diags.any_contains("block is empty"));
    }

    #[test]
    fn test_missing_param_delimiter() {
        let (_, diags) = parse("def f(a b) { 1; } def main() { 1; }");
        assert!(diags.any_contains("expected ')', found '<IDENTIFIER>'"));
    }

    #[test]
    fn test_missing_decl_name() {
        let (_, diags) = parse("def main() { val = 3; }");
        assert!(diags.any_contains("expected declare"));
    }

    #[test]
    fn test_trailing_comma_in_args() {
        let (_, diags) = parse("def main() { f(1, ); }");
        assert!(diags.any_contains("expected expression"));
    }

    #[test]
    fn test_one_diagnostic_per_line() {
        let (_, diags) = parse("def main() { val = = ; 1; }");
        assert_eq!(diags.len(), 1, "cascading errors on one line are suppressed");
    }

    #[test]
    fn test_if_requires_else() {
        let (_, diags) = parse("def main() { if (1 < 2) { 1; }; }");
        assert!(diags.any_contains("expected 'else'"));
    }

    #[test]
    fn test_spans_recorded() {
        let ast = parse_clean("def main() {\n  41 + 1;\n}");
        let root = ast.func(ast.root);
        let main = ast.func(root.body.funcs[0]);
        let expr = main.body.stmts[0].expr();
        assert_eq!(expr.span.begin.line, 2);
        assert_eq!(expr.span.begin.column, 3);
        assert_eq!(expr.span.end.column, 9);
    }
}

// tests/standard_library.rs
//! Coverage that the standard declarations are defined and resolve through
//! the public checker API. Not intended to be exhaustive; the per-module
//! unit tests cover the resolution machinery itself.

use cel::ast::{Ast, Expr, ExprId};
use cel::sema::{CheckerOptions, Env, Severity, TypeChecker, ValidationResult};

fn stdlib_checker(options: CheckerOptions) -> TypeChecker {
    TypeChecker::new(
        Env::builder()
            .options(options)
            .add_standard_library()
            .expect("standard library registers once")
            .build(),
    )
}

fn check(expr: Expr) -> ValidationResult {
    stdlib_checker(CheckerOptions::default())
        .check(Ast::from_expr(expr))
        .expect("no internal error")
}

#[test]
fn type_constants_are_defined() {
    for (index, name) in [
        "bool",
        "int",
        "uint",
        "double",
        "string",
        "bytes",
        "list",
        "map",
        "duration",
        "timestamp",
        "null_type",
    ]
    .iter()
    .enumerate()
    {
        let id = index as i64 + 1;
        let result = check(Expr::ident(id, *name));
        assert!(result.issues().is_empty(), "issues for '{name}'");
        let ast = result.ast().unwrap();
        assert_eq!(ast.reference(ExprId(id)).unwrap().name, *name);
        assert!(ast.is_checked());
    }
}

#[test]
fn string_functions_are_defined() {
    let cases = [
        Expr::member_call(3, "size", Expr::string(1, "123"), vec![]),
        Expr::call(3, "size", vec![Expr::string(1, "123")]),
        Expr::call(3, "_+_", vec![Expr::string(1, "123"), Expr::string(2, "123")]),
        Expr::member_call(3, "endsWith", Expr::string(1, "123"), vec![Expr::string(2, "3")]),
        Expr::member_call(3, "startsWith", Expr::string(1, "123"), vec![Expr::string(2, "1")]),
        Expr::member_call(3, "contains", Expr::string(1, "123"), vec![Expr::string(2, "2")]),
        Expr::member_call(3, "matches", Expr::string(1, "123"), vec![Expr::string(2, "123")]),
        Expr::call(3, "matches", vec![Expr::string(1, "123"), Expr::string(2, "123")]),
    ];
    for expr in cases {
        let result = check(expr);
        assert!(result.is_valid(), "issues: {:?}", result.issues());
    }
}

#[test]
fn conversions_are_defined() {
    let cases = [
        Expr::call(2, "int", vec![Expr::int(1, 1)]),
        Expr::call(2, "uint", vec![Expr::int(1, 1)]),
        Expr::call(2, "double", vec![Expr::int(1, 1)]),
        Expr::call(2, "string", vec![Expr::int(1, 1)]),
        Expr::call(2, "bool", vec![Expr::string(1, "true")]),
        Expr::call(2, "bytes", vec![Expr::string(1, "abc")]),
        Expr::call(2, "timestamp", vec![Expr::int(1, 0)]),
        Expr::call(2, "duration", vec![Expr::string(1, "1s")]),
        Expr::call(2, "dyn", vec![Expr::int(1, 1)]),
        Expr::call(2, "type", vec![Expr::int(1, 1)]),
    ];
    for expr in cases {
        let result = check(expr);
        assert!(result.is_valid(), "issues: {:?}", result.issues());
    }
}

#[test]
fn arithmetic_and_logic_are_defined() {
    let cases = [
        Expr::call(3, "_+_", vec![Expr::int(1, 1), Expr::int(2, 2)]),
        Expr::call(3, "_-_", vec![Expr::int(1, 1), Expr::int(2, 2)]),
        Expr::call(3, "_*_", vec![Expr::int(1, 1), Expr::int(2, 2)]),
        Expr::call(3, "_/_", vec![Expr::int(1, 1), Expr::int(2, 2)]),
        Expr::call(3, "_%_", vec![Expr::int(1, 2), Expr::int(2, 1)]),
        Expr::call(2, "-_", vec![Expr::int(1, 1)]),
        Expr::call(3, "_&&_", vec![Expr::bool(1, true), Expr::bool(2, false)]),
        Expr::call(3, "_||_", vec![Expr::bool(1, true), Expr::bool(2, false)]),
        Expr::call(2, "!_", vec![Expr::bool(1, true)]),
        Expr::call(3, "_==_", vec![Expr::int(1, 1), Expr::int(2, 2)]),
        Expr::call(3, "_!=_", vec![Expr::int(1, 1), Expr::int(2, 2)]),
        Expr::call(
            3,
            "@in",
            vec![Expr::int(1, 1), Expr::list(2, vec![Expr::int(4, 1)])],
        ),
    ];
    for expr in cases {
        let result = check(expr);
        assert!(result.is_valid(), "issues: {:?}", result.issues());
    }
}

#[test]
fn time_arithmetic_and_accessors_are_defined() {
    let timestamp = || Expr::call(2, "timestamp", vec![Expr::int(1, 0)]);
    let duration = || Expr::call(4, "duration", vec![Expr::string(3, "1s")]);
    let cases = [
        Expr::call(5, "_+_", vec![timestamp(), duration()]),
        Expr::call(5, "_-_", vec![timestamp(), duration()]),
        Expr::call(5, "_-_", vec![timestamp(), Expr::call(7, "timestamp", vec![Expr::int(6, 0)])]),
        Expr::call(5, "_<_", vec![duration(), Expr::call(7, "duration", vec![Expr::string(6, "2s")])]),
        Expr::member_call(5, "getFullYear", timestamp(), vec![]),
        Expr::member_call(5, "getFullYear", timestamp(), vec![Expr::string(6, "-08:00")]),
        Expr::member_call(5, "getDayOfWeek", timestamp(), vec![]),
        Expr::member_call(5, "getHours", duration(), vec![]),
        Expr::member_call(5, "getMilliseconds", duration(), vec![]),
    ];
    for expr in cases {
        let result = check(expr);
        assert!(result.is_valid(), "issues: {:?}", result.issues());
    }
}

#[test]
fn cross_numeric_comparisons_are_gated() {
    let expr = || Expr::call(3, "_<_", vec![Expr::uint(1, 1), Expr::int(2, 2)]);

    let strict = check(expr());
    assert!(!strict.is_valid());
    assert_eq!(strict.issues()[0].severity, Severity::Error);

    let relaxed = stdlib_checker(CheckerOptions {
        enable_cross_numeric_comparisons: true,
        ..CheckerOptions::default()
    })
    .check(Ast::from_expr(expr()))
    .unwrap();
    assert!(relaxed.is_valid());
}

#[test]
fn list_concat_is_gated() {
    let expr = || {
        Expr::call(
            5,
            "_+_",
            vec![
                Expr::list(2, vec![Expr::int(1, 1)]),
                Expr::list(4, vec![Expr::int(3, 2)]),
            ],
        )
    };

    let on = check(expr());
    assert!(on.is_valid());

    let off = stdlib_checker(CheckerOptions {
        enable_list_concat: false,
        ..CheckerOptions::default()
    })
    .check(Ast::from_expr(expr()))
    .unwrap();
    assert!(!off.is_valid());
}

#[test]
fn standard_library_cannot_be_added_twice() {
    let err = Env::builder()
        .add_standard_library()
        .unwrap()
        .add_standard_library()
        .unwrap_err();
    // Every declaration conflicts; the first one reported is enough.
    let rendered = err.to_string();
    assert!(rendered.contains("already"), "unexpected error: {rendered}");
}

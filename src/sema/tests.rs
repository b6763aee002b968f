use super::*;
use crate::ast::{AstType, Expr, ExprId, ExprKind, MapEntry, PrimitiveType, StructExprField, WellKnownType};
use crate::sema::provider::TypeRegistry;

fn stdlib_env() -> Env {
    Env::builder().add_standard_library().unwrap().build()
}

fn check_with(env: Env, expr: Expr) -> ValidationResult {
    TypeChecker::new(env).check(Ast::from_expr(expr)).unwrap()
}

fn check(expr: Expr) -> ValidationResult {
    check_with(stdlib_env(), expr)
}

fn root_type(result: &ValidationResult, id: i64) -> &AstType {
    result
        .ast()
        .expect("expected a valid AST")
        .get_type(ExprId(id))
        .expect("expected a type annotation")
}

fn test_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::with_well_known();
    registry.add_struct(
        "test.Msg",
        vec![
            StructFieldInfo {
                name: "name".to_string(),
                ty: Type::String,
            },
            StructFieldInfo {
                name: "count".to_string(),
                ty: Type::Int,
            },
        ],
    );
    registry
}

#[test]
fn string_concatenation() {
    let expr = Expr::call(3, "_+_", vec![Expr::string(1, "123"), Expr::string(2, "123")]);
    let result = check(expr);
    assert!(result.issues().is_empty());
    assert_eq!(root_type(&result, 3), &AstType::Primitive(PrimitiveType::String));
    assert_eq!(
        result.ast().unwrap().reference(ExprId(3)).unwrap().overload_ids,
        vec!["add_string".to_string()]
    );
}

#[test]
fn timestamp_plus_duration() {
    let expr = Expr::call(
        5,
        "_+_",
        vec![
            Expr::call(2, "timestamp", vec![Expr::int(1, 0)]),
            Expr::call(4, "duration", vec![Expr::string(3, "1s")]),
        ],
    );
    let result = check(expr);
    assert!(result.issues().is_empty());
    assert_eq!(root_type(&result, 5), &AstType::WellKnown(WellKnownType::Timestamp));
}

#[test]
fn cross_numeric_comparison_requires_option() {
    let expr = Expr::call(3, "_<_", vec![Expr::uint(1, 1), Expr::int(2, 2)]);

    let strict = check(expr.clone());
    assert!(!strict.is_valid());
    assert_eq!(strict.issues().len(), 1);
    assert_eq!(strict.issues()[0].severity, Severity::Error);
    assert_eq!(
        strict.issues()[0].message,
        "found no matching overload for '_<_' applied to (uint, int)"
    );

    let env = Env::builder()
        .options(CheckerOptions {
            enable_cross_numeric_comparisons: true,
            ..CheckerOptions::default()
        })
        .add_standard_library()
        .unwrap()
        .build();
    let relaxed = check_with(env, expr);
    assert!(relaxed.issues().is_empty());
    assert_eq!(root_type(&relaxed, 3), &AstType::Primitive(PrimitiveType::Bool));
}

#[test]
fn proto_enum_constant_resolves_to_full_name() {
    let expr = Expr::select(
        4,
        Expr::select(
            3,
            Expr::select(2, Expr::ident(1, "google"), "protobuf"),
            "NullValue",
        ),
        "NULL_VALUE",
    );
    let result = check(expr);
    assert!(result.issues().is_empty());
    assert_eq!(root_type(&result, 4), &AstType::Primitive(PrimitiveType::Int64));

    let ast = result.ast().unwrap();
    let reference = ast.reference(ExprId(4)).unwrap();
    assert_eq!(reference.name, "google.protobuf.NullValue.NULL_VALUE");
    // The consumed path segments carry no annotations of their own.
    assert!(ast.reference(ExprId(1)).is_none());
    assert!(ast.get_type(ExprId(2)).is_none());
    // The select chain collapsed into a single identifier.
    assert!(matches!(
        &ast.root.kind,
        ExprKind::Ident(ident) if ident.name == "google.protobuf.NullValue.NULL_VALUE"
    ));
}

#[test]
fn mixed_list_widens_to_dyn() {
    let expr = Expr::list(3, vec![Expr::int(1, 1), Expr::string(2, "a")]);
    let result = check(expr);
    assert!(result.issues().is_empty());
    assert_eq!(root_type(&result, 3), &AstType::List(Box::new(AstType::Dyn)));
}

#[test]
fn mixed_map_widens_to_dyn() {
    let expr = Expr::map(
        7,
        vec![
            MapEntry {
                id: ExprId(5),
                key: Expr::int(1, 1),
                value: Expr::string(2, "a"),
                optional: false,
            },
            MapEntry {
                id: ExprId(6),
                key: Expr::string(3, "b"),
                value: Expr::int(4, 2),
                optional: false,
            },
        ],
    );
    let result = check(expr);
    assert!(result.issues().is_empty());
    assert_eq!(
        root_type(&result, 7),
        &AstType::Map(Box::new(AstType::Dyn), Box::new(AstType::Dyn))
    );
}

#[test]
fn missing_variable_reports_undeclared_reference() {
    let result = check(Expr::ident(1, "missing_var"));
    assert!(!result.is_valid());
    assert_eq!(result.issues().len(), 1);
    assert_eq!(
        result.issues()[0].message,
        "undeclared reference to 'missing_var' (in container '')"
    );
}

#[test]
fn empty_literals_get_free_params_lowered_to_dyn() {
    let result = check(Expr::list(1, vec![]));
    assert_eq!(root_type(&result, 1), &AstType::List(Box::new(AstType::Dyn)));

    let result = check(Expr::map(1, vec![]));
    assert_eq!(
        root_type(&result, 1),
        &AstType::Map(Box::new(AstType::Dyn), Box::new(AstType::Dyn))
    );
}

#[test]
fn size_resolves_globally_and_as_member() {
    let global = check(Expr::call(2, "size", vec![Expr::string(1, "123")]));
    assert!(global.issues().is_empty());
    assert_eq!(root_type(&global, 2), &AstType::Primitive(PrimitiveType::Int64));
    assert_eq!(
        global.ast().unwrap().reference(ExprId(2)).unwrap().overload_ids,
        vec!["size_string".to_string()]
    );

    let member = check(Expr::member_call(2, "size", Expr::string(1, "123"), vec![]));
    assert!(member.issues().is_empty());
    assert_eq!(
        member.ast().unwrap().reference(ExprId(2)).unwrap().overload_ids,
        vec!["string_size".to_string()]
    );
}

#[test]
fn conditional_unifies_branches() {
    let expr = Expr::call(
        4,
        "_?_:_",
        vec![Expr::bool(1, true), Expr::int(2, 1), Expr::int(3, 2)],
    );
    let result = check(expr);
    assert!(result.issues().is_empty());
    assert_eq!(root_type(&result, 4), &AstType::Primitive(PrimitiveType::Int64));
}

#[test]
fn list_index_binds_element_type() {
    let expr = Expr::call(
        4,
        "_[_]",
        vec![
            Expr::list(3, vec![Expr::int(1, 1), Expr::int(2, 2)]),
            Expr::int(5, 0),
        ],
    );
    let result = check(expr);
    assert!(result.issues().is_empty());
    assert_eq!(root_type(&result, 4), &AstType::Primitive(PrimitiveType::Int64));
}

#[test]
fn namespaced_function_demotes_receiver_call() {
    let env = Env::builder()
        .add_standard_library()
        .unwrap()
        .add_function(
            FunctionDecl::with_overloads(
                "a.b.scale",
                vec![OverloadDecl::new("a_b_scale_int", vec![Type::Int], Type::Int)],
            )
            .unwrap(),
        )
        .unwrap()
        .build();

    // a.b.scale(2) parses as a receiver call on the select chain a.b.
    let expr = Expr::member_call(
        4,
        "scale",
        Expr::select(2, Expr::ident(1, "a"), "b"),
        vec![Expr::int(3, 2)],
    );
    let result = check_with(env, expr);
    assert!(result.issues().is_empty());
    assert_eq!(root_type(&result, 4), &AstType::Primitive(PrimitiveType::Int64));

    let ast = result.ast().unwrap();
    let reference = ast.reference(ExprId(4)).unwrap();
    assert_eq!(reference.name, "a.b.scale");
    assert_eq!(reference.overload_ids, vec!["a_b_scale_int".to_string()]);
    let ExprKind::Call(call) = &ast.root.kind else {
        panic!("expected call");
    };
    assert_eq!(call.function, "a.b.scale");
    assert!(call.target.is_none(), "namespaced call keeps no receiver");
}

#[test]
fn receiver_call_falls_back_to_attribute_resolution() {
    let env = Env::builder()
        .add_standard_library()
        .unwrap()
        .add_variable(VariableDecl::new("a", Type::map(Type::String, Type::String)))
        .unwrap()
        .build();

    // a.b.startsWith('x'): no function `a.b.startsWith` exists, so `a.b`
    // resolves as a map access and the call becomes an ordinary member call.
    let expr = Expr::member_call(
        5,
        "startsWith",
        Expr::select(2, Expr::ident(1, "a"), "b"),
        vec![Expr::string(3, "x")],
    );
    let result = check_with(env, expr);
    assert!(result.issues().is_empty());
    assert_eq!(root_type(&result, 5), &AstType::Primitive(PrimitiveType::Bool));

    let ast = result.ast().unwrap();
    assert_eq!(ast.reference(ExprId(1)).unwrap().name, "a");
    assert_eq!(
        ast.get_type(ExprId(2)),
        Some(&AstType::Primitive(PrimitiveType::String))
    );
    assert_eq!(
        ast.reference(ExprId(5)).unwrap().overload_ids,
        vec!["starts_with_string".to_string()]
    );
}

#[test]
fn container_scoped_variable_gets_canonical_name() {
    let env = Env::builder()
        .container("a.b")
        .add_standard_library()
        .unwrap()
        .add_variable(VariableDecl::new("a.b.x", Type::Int))
        .unwrap()
        .build();
    let result = check_with(env, Expr::ident(1, "x"));
    assert!(result.issues().is_empty());

    let ast = result.ast().unwrap();
    // The reference records the candidate that matched, not the spelling.
    assert_eq!(ast.reference(ExprId(1)).unwrap().name, "a.b.x");
    assert!(matches!(
        &ast.root.kind,
        ExprKind::Ident(ident) if ident.name == "a.b.x"
    ));
}

#[test]
fn qualified_identifier_partial_match_leaves_field_selects() {
    let mut registry = test_registry();
    registry.add_struct(
        "holder.Outer",
        vec![StructFieldInfo {
            name: "msg".to_string(),
            ty: Type::strct("test.Msg"),
        }],
    );
    let env = Env::builder()
        .type_provider(registry)
        .add_standard_library()
        .unwrap()
        .add_variable(VariableDecl::new("holder.outer", Type::strct("holder.Outer")))
        .unwrap()
        .build();

    // holder.outer.msg.name: two leading segments name the variable, the
    // trailing two selects are field accesses.
    let expr = Expr::select(
        4,
        Expr::select(3, Expr::select(2, Expr::ident(1, "holder"), "outer"), "msg"),
        "name",
    );
    let result = check_with(env, expr);
    assert!(result.issues().is_empty());
    assert_eq!(root_type(&result, 4), &AstType::Primitive(PrimitiveType::String));

    let ast = result.ast().unwrap();
    assert_eq!(ast.reference(ExprId(2)).unwrap().name, "holder.outer");
    assert_eq!(ast.get_type(ExprId(3)), Some(&AstType::Message("test.Msg".to_string())));
    // The variable node collapsed to an identifier; its select chain is gone.
    let ExprKind::Select(outer) = &ast.root.kind else {
        panic!("expected select");
    };
    let ExprKind::Select(middle) = &outer.operand.kind else {
        panic!("expected select");
    };
    assert!(matches!(
        &middle.operand.kind,
        ExprKind::Ident(ident) if ident.name == "holder.outer"
    ));
}

#[test]
fn select_on_undefined_struct_field_errors() {
    let env = Env::builder()
        .type_provider(test_registry())
        .add_standard_library()
        .unwrap()
        .add_variable(VariableDecl::new("msg", Type::strct("test.Msg")))
        .unwrap()
        .build();
    let expr = Expr::select(2, Expr::ident(1, "msg"), "missing");
    let result = check_with(env, expr);
    assert!(!result.is_valid());
    assert_eq!(
        result.issues()[0].message,
        "undefined field 'missing' not found in struct 'test.Msg'"
    );
}

#[test]
fn select_on_scalar_errors() {
    let env = Env::builder()
        .add_standard_library()
        .unwrap()
        .add_variable(VariableDecl::new("x", Type::Int))
        .unwrap()
        .build();
    let expr = Expr::select(2, Expr::ident(1, "x"), "field");
    let result = check_with(env, expr);
    assert!(!result.is_valid());
    assert_eq!(
        result.issues()[0].message,
        "expression of type 'int' cannot be the operand of a select operation"
    );
}

#[test]
fn has_yields_bool_for_struct_and_map() {
    let env = Env::builder()
        .type_provider(test_registry())
        .add_standard_library()
        .unwrap()
        .add_variable(VariableDecl::new("msg", Type::strct("test.Msg")))
        .unwrap()
        .build();
    let expr = Expr::test_only_select(2, Expr::ident(1, "msg"), "count");
    let result = check_with(env, expr);
    assert!(result.issues().is_empty());
    assert_eq!(root_type(&result, 2), &AstType::Primitive(PrimitiveType::Bool));
}

#[test]
fn select_through_optional_reads_held_type() {
    let env = Env::builder()
        .type_provider(test_registry())
        .add_standard_library()
        .unwrap()
        .add_variable(VariableDecl::new(
            "maybe",
            Type::optional(Type::strct("test.Msg")),
        ))
        .unwrap()
        .build();
    let expr = Expr::select(2, Expr::ident(1, "maybe"), "name");
    let result = check_with(env, expr);
    assert!(result.issues().is_empty());
    assert_eq!(root_type(&result, 2), &AstType::Primitive(PrimitiveType::String));
}

#[test]
fn map_select_requires_string_assignable_key() {
    let env = || {
        Env::builder()
            .add_standard_library()
            .unwrap()
            .add_variable(VariableDecl::new("tags", Type::map(Type::String, Type::Int)))
            .unwrap()
            .add_variable(VariableDecl::new("by_id", Type::map(Type::Int, Type::Int)))
            .unwrap()
            .build()
    };

    let good = check_with(env(), Expr::select(2, Expr::ident(1, "tags"), "env"));
    assert!(good.issues().is_empty());
    assert_eq!(root_type(&good, 2), &AstType::Primitive(PrimitiveType::Int64));

    let bad = check_with(env(), Expr::select(2, Expr::ident(1, "by_id"), "env"));
    assert!(!bad.is_valid());
    assert_eq!(
        bad.issues()[0].message,
        "expression of type 'map(int, int)' cannot be the operand of a select operation"
    );
}

#[test]
fn unsupported_map_key_warns_without_failing() {
    let expr = Expr::map(
        4,
        vec![MapEntry {
            id: ExprId(3),
            key: Expr::list(1, vec![]),
            value: Expr::int(2, 1),
            optional: false,
        }],
    );
    let result = check(expr);
    assert!(result.is_valid());
    assert_eq!(result.issues().len(), 1);
    assert_eq!(result.issues()[0].severity, Severity::Warning);
    assert!(result.issues()[0].message.starts_with("unsupported map key type: list("));
}

#[test]
fn struct_construction_checks_fields() {
    let env = || {
        Env::builder()
            .container("test")
            .type_provider(test_registry())
            .add_standard_library()
            .unwrap()
            .build()
    };

    // Unqualified name resolves through the container.
    let ok = check_with(
        env(),
        Expr::struct_expr(
            1,
            "Msg",
            vec![StructExprField {
                id: ExprId(2),
                name: "name".to_string(),
                value: Expr::string(3, "x"),
                optional: false,
            }],
        ),
    );
    assert!(ok.issues().is_empty());
    assert_eq!(root_type(&ok, 1), &AstType::Message("test.Msg".to_string()));
    let ast = ok.ast().unwrap();
    assert_eq!(ast.reference(ExprId(1)).unwrap().name, "test.Msg");
    let ExprKind::Struct(strct) = &ast.root.kind else {
        panic!("expected struct");
    };
    assert_eq!(strct.name, "test.Msg");

    let bad_type = check_with(
        env(),
        Expr::struct_expr(
            1,
            "Msg",
            vec![StructExprField {
                id: ExprId(2),
                name: "name".to_string(),
                value: Expr::int(3, 7),
                optional: false,
            }],
        ),
    );
    assert!(!bad_type.is_valid());
    assert_eq!(
        bad_type.issues()[0].message,
        "expected type of field 'name' is 'string' but provided type is 'int'"
    );

    let unknown_field = check_with(
        env(),
        Expr::struct_expr(
            1,
            "Msg",
            vec![StructExprField {
                id: ExprId(2),
                name: "nope".to_string(),
                value: Expr::int(3, 7),
                optional: false,
            }],
        ),
    );
    assert!(!unknown_field.is_valid());
    assert_eq!(
        unknown_field.issues()[0].message,
        "undefined field 'nope' not found in struct 'test.Msg'"
    );
}

#[test]
fn non_message_type_rejects_construction() {
    let mut registry = TypeRegistry::with_well_known();
    registry.add_type("test.Alias", Type::Int);
    let env = Env::builder()
        .type_provider(registry)
        .add_standard_library()
        .unwrap()
        .build();
    let result = check_with(env, Expr::struct_expr(1, "test.Alias", vec![]));
    assert!(!result.is_valid());
    assert_eq!(
        result.issues()[0].message,
        "type 'test.Alias' does not support message creation"
    );
}

#[test]
fn well_known_message_creation_yields_wrapper() {
    let result = check(Expr::struct_expr(1, "google.protobuf.Int64Value", vec![]));
    assert!(result.issues().is_empty());
    assert_eq!(root_type(&result, 1), &AstType::Wrapper(PrimitiveType::Int64));
}

fn exists_comprehension(range: Expr) -> Expr {
    // [range].exists(x, x > 0) in expanded form.
    Expr::comprehension(
        10,
        crate::ast::ComprehensionExpr {
            iter_range: range,
            iter_var: "x".to_string(),
            accu_var: "__result__".to_string(),
            accu_init: Expr::bool(3, false),
            loop_condition: Expr::call(5, "!_", vec![Expr::ident(4, "__result__")]),
            loop_step: Expr::call(
                9,
                "_||_",
                vec![
                    Expr::ident(6, "__result__"),
                    Expr::call(8, "_>_", vec![Expr::ident(7, "x"), Expr::int(11, 0)]),
                ],
            ),
            result: Expr::ident(12, "__result__"),
        },
    )
}

#[test]
fn comprehension_types_iterator_and_accumulator() {
    let range = Expr::list(2, vec![Expr::int(1, 1)]);
    let result = check(exists_comprehension(range));
    assert!(result.issues().is_empty());
    assert_eq!(root_type(&result, 10), &AstType::Primitive(PrimitiveType::Bool));

    let ast = result.ast().unwrap();
    // The iterator variable resolved against the iteration scope.
    assert_eq!(ast.get_type(ExprId(7)), Some(&AstType::Primitive(PrimitiveType::Int64)));
    assert_eq!(ast.reference(ExprId(7)).unwrap().name, "x");
    assert_eq!(ast.get_type(ExprId(12)), Some(&AstType::Primitive(PrimitiveType::Bool)));
}

#[test]
fn comprehension_iterates_map_keys() {
    let env = Env::builder()
        .add_standard_library()
        .unwrap()
        .add_variable(VariableDecl::new("tags", Type::map(Type::String, Type::Int)))
        .unwrap()
        .build();
    let result = check_with(env, exists_comprehension(Expr::ident(2, "tags")));
    // x > 0 over string keys has no matching overload.
    assert!(!result.is_valid());
    assert!(
        result.issues()[0]
            .message
            .contains("found no matching overload for '_>_' applied to (string, int)")
    );
}

#[test]
fn comprehension_over_scalar_range_errors() {
    let result = check(exists_comprehension(Expr::int(2, 1)));
    assert!(!result.is_valid());
    assert_eq!(
        result.issues()[0].message,
        "expression of type 'int' cannot be the range of a comprehension (must be list, map, or dynamic)"
    );
}

#[test]
fn iterator_variable_shadows_outer_binding() {
    let env = Env::builder()
        .add_standard_library()
        .unwrap()
        .add_variable(VariableDecl::new("x", Type::String))
        .unwrap()
        .build();
    let range = Expr::list(2, vec![Expr::int(1, 1)]);
    let result = check_with(env, exists_comprehension(range));
    // Were `x` resolved to the outer string binding, `x > 0` would not
    // type check; the iterator binding must win.
    assert!(result.issues().is_empty());
    let ast = result.ast().unwrap();
    assert_eq!(ast.get_type(ExprId(7)), Some(&AstType::Primitive(PrimitiveType::Int64)));
}

#[test]
fn type_constants_have_meta_types() {
    let result = check(Expr::ident(1, "int"));
    assert!(result.issues().is_empty());
    assert_eq!(
        root_type(&result, 1),
        &AstType::Type(Some(Box::new(AstType::Primitive(PrimitiveType::Int64))))
    );
}

#[test]
fn dyn_operand_narrows_by_argument_types() {
    let env = Env::builder()
        .add_standard_library()
        .unwrap()
        .add_variable(VariableDecl::new("anything", Type::Dyn))
        .unwrap()
        .build();
    let expr = Expr::call(
        3,
        "_[_]",
        vec![Expr::ident(1, "anything"), Expr::string(2, "key")],
    );
    let result = check_with(env, expr);
    assert!(result.issues().is_empty());
    // Only the map overload accepts a string index.
    assert_eq!(
        result.ast().unwrap().reference(ExprId(3)).unwrap().overload_ids,
        vec!["index_map".to_string()]
    );
}

#[test]
fn checking_a_checked_ast_is_stable() {
    let checker = TypeChecker::new(stdlib_env());
    let expr = Expr::select(
        4,
        Expr::select(
            3,
            Expr::select(2, Expr::ident(1, "google"), "protobuf"),
            "NullValue",
        ),
        "NULL_VALUE",
    );

    let first = checker.check(Ast::from_expr(expr)).unwrap();
    let checked = first.into_ast().unwrap();
    assert!(checked.is_checked());

    let second = checker.check(checked.clone()).unwrap();
    assert!(second.issues().is_empty());
    let recheck = second.into_ast().unwrap();
    assert_eq!(recheck.reference_map(), checked.reference_map());
    assert_eq!(recheck.type_map(), checked.type_map());
    assert_eq!(recheck.root, checked.root);
}

#[test]
fn every_visited_node_is_typed_on_success() {
    // 'a' + 'b' has three nodes and no deferred name segments.
    let expr = Expr::call(3, "_+_", vec![Expr::string(1, "a"), Expr::string(2, "b")]);
    let result = check(expr);
    let ast = result.ast().unwrap();
    assert_eq!(ast.type_map().len(), 3);
}

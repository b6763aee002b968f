// src/sema/standard.rs
//! Standard CEL declarations: type constants, operators, conversions, and
//! the string/time member functions. Options gate the cross-numeric,
//! heterogeneous-equality, and list-concatenation overloads.

use crate::sema::decl::{FunctionDecl, OverloadDecl, VariableDecl};
use crate::sema::env::CheckerOptions;
use crate::sema::Type;

/// The type-constant identifiers (`int`, `list`, `null_type`, ...).
pub fn standard_variables() -> Vec<VariableDecl> {
    vec![
        VariableDecl::new("bool", Type::type_of(Type::Bool)),
        VariableDecl::new("int", Type::type_of(Type::Int)),
        VariableDecl::new("uint", Type::type_of(Type::Uint)),
        VariableDecl::new("double", Type::type_of(Type::Double)),
        VariableDecl::new("string", Type::type_of(Type::String)),
        VariableDecl::new("bytes", Type::type_of(Type::Bytes)),
        VariableDecl::new("list", Type::type_of(Type::list(Type::Dyn))),
        VariableDecl::new("map", Type::type_of(Type::map(Type::Dyn, Type::Dyn))),
        VariableDecl::new("duration", Type::type_of(Type::Duration)),
        VariableDecl::new("timestamp", Type::type_of(Type::Timestamp)),
        VariableDecl::new("null_type", Type::type_of(Type::Null)),
    ]
}

fn function(name: &str, overloads: Vec<OverloadDecl>) -> FunctionDecl {
    FunctionDecl::with_overloads(name, overloads)
        .expect("duplicate overload id in standard declarations")
}

fn param_a() -> Type {
    Type::type_param("A")
}

fn param_b() -> Type {
    Type::type_param("B")
}

/// The standard function declarations for the given options.
pub fn standard_functions(options: &CheckerOptions) -> Vec<FunctionDecl> {
    let mut functions = vec![
        function(
            "!_",
            vec![OverloadDecl::new("logical_not", vec![Type::Bool], Type::Bool)],
        ),
        function(
            "-_",
            vec![
                OverloadDecl::new("negate_int64", vec![Type::Int], Type::Int),
                OverloadDecl::new("negate_double", vec![Type::Double], Type::Double),
            ],
        ),
        function(
            "_&&_",
            vec![OverloadDecl::new(
                "logical_and",
                vec![Type::Bool, Type::Bool],
                Type::Bool,
            )],
        ),
        function(
            "_||_",
            vec![OverloadDecl::new(
                "logical_or",
                vec![Type::Bool, Type::Bool],
                Type::Bool,
            )],
        ),
        function(
            "_?_:_",
            vec![OverloadDecl::new(
                "conditional",
                vec![Type::Bool, param_a(), param_a()],
                param_a(),
            )],
        ),
        equality("_==_", "equals", options),
        equality("_!=_", "not_equals", options),
        add(options),
        function(
            "_-_",
            vec![
                OverloadDecl::new("subtract_int64", vec![Type::Int, Type::Int], Type::Int),
                OverloadDecl::new("subtract_uint64", vec![Type::Uint, Type::Uint], Type::Uint),
                OverloadDecl::new(
                    "subtract_double",
                    vec![Type::Double, Type::Double],
                    Type::Double,
                ),
                OverloadDecl::new(
                    "subtract_timestamp_timestamp",
                    vec![Type::Timestamp, Type::Timestamp],
                    Type::Duration,
                ),
                OverloadDecl::new(
                    "subtract_timestamp_duration",
                    vec![Type::Timestamp, Type::Duration],
                    Type::Timestamp,
                ),
                OverloadDecl::new(
                    "subtract_duration_duration",
                    vec![Type::Duration, Type::Duration],
                    Type::Duration,
                ),
            ],
        ),
        arithmetic("_*_", "multiply"),
        arithmetic("_/_", "divide"),
        function(
            "_%_",
            vec![
                OverloadDecl::new("modulo_int64", vec![Type::Int, Type::Int], Type::Int),
                OverloadDecl::new("modulo_uint64", vec![Type::Uint, Type::Uint], Type::Uint),
            ],
        ),
        ordering("_<_", "less", options),
        ordering("_<=_", "less_equals", options),
        ordering("_>_", "greater", options),
        ordering("_>=_", "greater_equals", options),
        function(
            "_[_]",
            vec![
                OverloadDecl::new(
                    "index_list",
                    vec![Type::list(param_a()), Type::Int],
                    param_a(),
                ),
                OverloadDecl::new(
                    "index_map",
                    vec![Type::map(param_a(), param_b()), param_a()],
                    param_b(),
                ),
            ],
        ),
        function(
            "@in",
            vec![
                OverloadDecl::new(
                    "in_list",
                    vec![param_a(), Type::list(param_a())],
                    Type::Bool,
                ),
                OverloadDecl::new(
                    "in_map",
                    vec![param_a(), Type::map(param_a(), param_b())],
                    Type::Bool,
                ),
            ],
        ),
        function(
            "size",
            vec![
                OverloadDecl::new("size_string", vec![Type::String], Type::Int),
                OverloadDecl::new("size_bytes", vec![Type::Bytes], Type::Int),
                OverloadDecl::new("size_list", vec![Type::list(param_a())], Type::Int),
                OverloadDecl::new(
                    "size_map",
                    vec![Type::map(param_a(), param_b())],
                    Type::Int,
                ),
                OverloadDecl::member("string_size", vec![Type::String], Type::Int),
                OverloadDecl::member("bytes_size", vec![Type::Bytes], Type::Int),
                OverloadDecl::member("list_size", vec![Type::list(param_a())], Type::Int),
                OverloadDecl::member(
                    "map_size",
                    vec![Type::map(param_a(), param_b())],
                    Type::Int,
                ),
            ],
        ),
        function(
            "contains",
            vec![OverloadDecl::member(
                "contains_string",
                vec![Type::String, Type::String],
                Type::Bool,
            )],
        ),
        function(
            "endsWith",
            vec![OverloadDecl::member(
                "ends_with_string",
                vec![Type::String, Type::String],
                Type::Bool,
            )],
        ),
        function(
            "startsWith",
            vec![OverloadDecl::member(
                "starts_with_string",
                vec![Type::String, Type::String],
                Type::Bool,
            )],
        ),
        function(
            "matches",
            vec![
                OverloadDecl::new("matches", vec![Type::String, Type::String], Type::Bool),
                OverloadDecl::member(
                    "matches_string",
                    vec![Type::String, Type::String],
                    Type::Bool,
                ),
            ],
        ),
        function(
            "int",
            vec![
                OverloadDecl::new("int64_to_int64", vec![Type::Int], Type::Int),
                OverloadDecl::new("uint64_to_int64", vec![Type::Uint], Type::Int),
                OverloadDecl::new("double_to_int64", vec![Type::Double], Type::Int),
                OverloadDecl::new("string_to_int64", vec![Type::String], Type::Int),
                OverloadDecl::new("timestamp_to_int64", vec![Type::Timestamp], Type::Int),
                OverloadDecl::new("duration_to_int64", vec![Type::Duration], Type::Int),
            ],
        ),
        function(
            "uint",
            vec![
                OverloadDecl::new("uint64_to_uint64", vec![Type::Uint], Type::Uint),
                OverloadDecl::new("int64_to_uint64", vec![Type::Int], Type::Uint),
                OverloadDecl::new("double_to_uint64", vec![Type::Double], Type::Uint),
                OverloadDecl::new("string_to_uint64", vec![Type::String], Type::Uint),
            ],
        ),
        function(
            "double",
            vec![
                OverloadDecl::new("double_to_double", vec![Type::Double], Type::Double),
                OverloadDecl::new("int64_to_double", vec![Type::Int], Type::Double),
                OverloadDecl::new("uint64_to_double", vec![Type::Uint], Type::Double),
                OverloadDecl::new("string_to_double", vec![Type::String], Type::Double),
            ],
        ),
        function(
            "string",
            vec![
                OverloadDecl::new("string_to_string", vec![Type::String], Type::String),
                OverloadDecl::new("int64_to_string", vec![Type::Int], Type::String),
                OverloadDecl::new("uint64_to_string", vec![Type::Uint], Type::String),
                OverloadDecl::new("double_to_string", vec![Type::Double], Type::String),
                OverloadDecl::new("bool_to_string", vec![Type::Bool], Type::String),
                OverloadDecl::new("bytes_to_string", vec![Type::Bytes], Type::String),
                OverloadDecl::new("timestamp_to_string", vec![Type::Timestamp], Type::String),
                OverloadDecl::new("duration_to_string", vec![Type::Duration], Type::String),
            ],
        ),
        function(
            "bool",
            vec![
                OverloadDecl::new("bool_to_bool", vec![Type::Bool], Type::Bool),
                OverloadDecl::new("string_to_bool", vec![Type::String], Type::Bool),
            ],
        ),
        function(
            "bytes",
            vec![
                OverloadDecl::new("bytes_to_bytes", vec![Type::Bytes], Type::Bytes),
                OverloadDecl::new("string_to_bytes", vec![Type::String], Type::Bytes),
            ],
        ),
        function(
            "timestamp",
            vec![
                OverloadDecl::new(
                    "timestamp_to_timestamp",
                    vec![Type::Timestamp],
                    Type::Timestamp,
                ),
                OverloadDecl::new("string_to_timestamp", vec![Type::String], Type::Timestamp),
                OverloadDecl::new("int64_to_timestamp", vec![Type::Int], Type::Timestamp),
            ],
        ),
        function(
            "duration",
            vec![
                OverloadDecl::new("duration_to_duration", vec![Type::Duration], Type::Duration),
                OverloadDecl::new("string_to_duration", vec![Type::String], Type::Duration),
            ],
        ),
        function("dyn", vec![OverloadDecl::new("to_dyn", vec![param_a()], Type::Dyn)]),
        function(
            "type",
            vec![OverloadDecl::new(
                "type",
                vec![param_a()],
                Type::type_of(param_a()),
            )],
        ),
    ];
    functions.extend(time_accessors());
    functions
}

fn equality(name: &str, id: &str, options: &CheckerOptions) -> FunctionDecl {
    let rhs = if options.enable_heterogeneous_equality {
        param_b()
    } else {
        param_a()
    };
    function(
        name,
        vec![OverloadDecl::new(id, vec![param_a(), rhs], Type::Bool)],
    )
}

fn add(options: &CheckerOptions) -> FunctionDecl {
    let mut overloads = vec![
        OverloadDecl::new("add_int64", vec![Type::Int, Type::Int], Type::Int),
        OverloadDecl::new("add_uint64", vec![Type::Uint, Type::Uint], Type::Uint),
        OverloadDecl::new("add_double", vec![Type::Double, Type::Double], Type::Double),
        OverloadDecl::new("add_string", vec![Type::String, Type::String], Type::String),
        OverloadDecl::new("add_bytes", vec![Type::Bytes, Type::Bytes], Type::Bytes),
        OverloadDecl::new(
            "add_timestamp_duration",
            vec![Type::Timestamp, Type::Duration],
            Type::Timestamp,
        ),
        OverloadDecl::new(
            "add_duration_timestamp",
            vec![Type::Duration, Type::Timestamp],
            Type::Timestamp,
        ),
        OverloadDecl::new(
            "add_duration_duration",
            vec![Type::Duration, Type::Duration],
            Type::Duration,
        ),
    ];
    if options.enable_list_concat {
        overloads.push(OverloadDecl::new(
            "add_list",
            vec![Type::list(param_a()), Type::list(param_a())],
            Type::list(param_a()),
        ));
    }
    function("_+_", overloads)
}

fn arithmetic(name: &str, id_prefix: &str) -> FunctionDecl {
    function(
        name,
        vec![
            OverloadDecl::new(
                format!("{id_prefix}_int64"),
                vec![Type::Int, Type::Int],
                Type::Int,
            ),
            OverloadDecl::new(
                format!("{id_prefix}_uint64"),
                vec![Type::Uint, Type::Uint],
                Type::Uint,
            ),
            OverloadDecl::new(
                format!("{id_prefix}_double"),
                vec![Type::Double, Type::Double],
                Type::Double,
            ),
        ],
    )
}

fn ordering(name: &str, id_prefix: &str, options: &CheckerOptions) -> FunctionDecl {
    let homogeneous = [
        ("bool", Type::Bool),
        ("int64", Type::Int),
        ("uint64", Type::Uint),
        ("double", Type::Double),
        ("string", Type::String),
        ("bytes", Type::Bytes),
        ("timestamp", Type::Timestamp),
        ("duration", Type::Duration),
    ];
    let mut overloads: Vec<OverloadDecl> = homogeneous
        .iter()
        .map(|(suffix, ty)| {
            OverloadDecl::new(
                format!("{id_prefix}_{suffix}"),
                vec![ty.clone(), ty.clone()],
                Type::Bool,
            )
        })
        .collect();
    if options.enable_cross_numeric_comparisons {
        let cross = [
            ("int64_uint64", Type::Int, Type::Uint),
            ("int64_double", Type::Int, Type::Double),
            ("uint64_int64", Type::Uint, Type::Int),
            ("uint64_double", Type::Uint, Type::Double),
            ("double_int64", Type::Double, Type::Int),
            ("double_uint64", Type::Double, Type::Uint),
        ];
        overloads.extend(cross.iter().map(|(suffix, lhs, rhs)| {
            OverloadDecl::new(
                format!("{id_prefix}_{suffix}"),
                vec![lhs.clone(), rhs.clone()],
                Type::Bool,
            )
        }));
    }
    function(name, overloads)
}

fn time_accessors() -> Vec<FunctionDecl> {
    // Accessors over timestamps take an optional time-zone string; the
    // duration accessors exist only for the sub-day units.
    let timestamp_only = [
        ("getFullYear", "timestamp_to_year"),
        ("getMonth", "timestamp_to_month"),
        ("getDayOfYear", "timestamp_to_day_of_year"),
        ("getDayOfMonth", "timestamp_to_day_of_month"),
        ("getDate", "timestamp_to_day_of_month_1_based"),
        ("getDayOfWeek", "timestamp_to_day_of_week"),
    ];
    let both = [
        ("getHours", "timestamp_to_hours", "duration_to_hours"),
        ("getMinutes", "timestamp_to_minutes", "duration_to_minutes"),
        ("getSeconds", "timestamp_to_seconds", "duration_to_seconds"),
        (
            "getMilliseconds",
            "timestamp_to_milliseconds",
            "duration_to_milliseconds",
        ),
    ];
    let mut functions = Vec::new();
    for (name, id) in timestamp_only {
        functions.push(function(
            name,
            vec![
                OverloadDecl::member(id, vec![Type::Timestamp], Type::Int),
                OverloadDecl::member(
                    format!("{id}_with_tz"),
                    vec![Type::Timestamp, Type::String],
                    Type::Int,
                ),
            ],
        ));
    }
    for (name, timestamp_id, duration_id) in both {
        functions.push(function(
            name,
            vec![
                OverloadDecl::member(timestamp_id, vec![Type::Timestamp], Type::Int),
                OverloadDecl::member(
                    format!("{timestamp_id}_with_tz"),
                    vec![Type::Timestamp, Type::String],
                    Type::Int,
                ),
                OverloadDecl::member(duration_id, vec![Type::Duration], Type::Int),
            ],
        ));
    }
    functions
}

// src/errors/check.rs
//! Internal checker errors (broken invariants) and declaration conflicts.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while assembling a declaration environment.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum DeclError {
    #[error("overload '{id}' already exists for function '{function}'")]
    #[diagnostic(code(cel::decl::overload_exists))]
    OverloadExists { function: String, id: String },

    #[error("variable '{name}' already declared")]
    #[diagnostic(code(cel::decl::variable_exists))]
    VariableExists { name: String },
}

/// Internal errors: impossible states in a correct implementation.
///
/// These abort the whole `check` call and are distinct from user-facing
/// issues, which never do.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("invalid container '{container}'")]
    #[diagnostic(code(cel::check::invalid_container))]
    InvalidContainer { container: String },

    #[error("comprehension scope stack broken at expression {expr_id}")]
    #[diagnostic(code(cel::check::scope_stack))]
    ScopeStackBroken { expr_id: i64 },

    #[error("map has mismatched key and value type inference resolution")]
    #[diagnostic(code(cel::check::map_inference))]
    MapInferenceMismatch,

    #[error("failed to add overload to resolved function declaration: {0}")]
    #[diagnostic(code(cel::check::overload_narrowing))]
    OverloadNarrowing(#[from] DeclError),

    #[error("unsupported type in checked AST: {type_desc}")]
    #[diagnostic(code(cel::check::flatten))]
    UnsupportedType { type_desc: String },
}

// src/sema/mod.rs
//! The type checker core: declaration environment, inference, and the
//! two-pass resolve/rewrite over a parsed AST.

pub mod decl;
pub mod env;
pub mod infer;
pub mod issues;
pub mod namespace;
pub mod provider;
pub mod scope;
pub mod standard;
pub mod types;

mod resolver;
mod rewriter;

#[cfg(test)]
mod tests;

use crate::ast::Ast;
use crate::errors::CheckError;

pub use decl::{FunctionDecl, OverloadDecl, VariableDecl};
pub use env::{CheckerOptions, Env, EnvBuilder};
pub use infer::{InferenceContext, OverloadResolution};
pub use issues::{Issue, Severity};
pub use namespace::NamespaceGenerator;
pub use provider::{EnumConstant, StructFieldInfo, TypeProvider, TypeRegistry};
pub use scope::{ScopeId, VariableScopes};
pub use types::{OpaqueType, Type};

use resolver::Resolver;
use rewriter::Rewriter;

/// Outcome of a `check` call: either an annotated AST (plus any non-error
/// issues) or issues only.
#[derive(Debug)]
pub struct ValidationResult {
    ast: Option<Ast>,
    issues: Vec<Issue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.ast.is_some()
    }

    pub fn ast(&self) -> Option<&Ast> {
        self.ast.as_ref()
    }

    pub fn into_ast(self) -> Option<Ast> {
        self.ast
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }
}

/// Checks parsed ASTs against one immutable environment.
///
/// All per-call state (scopes, inference, side tables) is local to `check`,
/// so one checker can serve concurrent calls.
#[derive(Debug)]
pub struct TypeChecker {
    env: Env,
}

impl TypeChecker {
    pub fn new(env: Env) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Run both walks over `ast`.
    ///
    /// User-level type problems surface as issues in the result; `Err` is
    /// reserved for broken checker invariants and invalid configuration.
    pub fn check(&self, mut ast: Ast) -> Result<ValidationResult, CheckError> {
        let generator = NamespaceGenerator::new(self.env.container())?;
        let mut inference = InferenceContext::new();
        let mut issues = Vec::new();

        let resolution = Resolver::new(
            &self.env,
            &generator,
            &mut inference,
            &mut issues,
            &ast.source_info,
        )
        .resolve(&ast)?;

        if issues.iter().any(|issue| issue.severity == Severity::Error) {
            tracing::debug!(issues = issues.len(), "check failed with errors");
            return Ok(ValidationResult { ast: None, issues });
        }

        // Second pass: the side tables are applied only after the walk above
        // is complete, so tree mutation cannot invalidate resolver state.
        let mut reference_map = std::mem::take(&mut ast.reference_map);
        let mut type_map = std::mem::take(&mut ast.type_map);
        Rewriter::new(&resolution, &inference, &mut reference_map, &mut type_map)
            .rewrite(&mut ast.root)?;
        ast.reference_map = reference_map;
        ast.type_map = type_map;
        ast.is_checked = true;

        Ok(ValidationResult {
            ast: Some(ast),
            issues,
        })
    }
}

// src/sema/env.rs

use rustc_hash::FxHashMap;

use crate::errors::DeclError;
use crate::sema::decl::{FunctionDecl, VariableDecl};
use crate::sema::provider::{
    StructFieldInfo, TypeProvider, TypeRegistry, well_known_type,
};
use crate::sema::standard;
use crate::sema::Type;

/// Feature toggles applied at declaration time.
#[derive(Debug, Clone, Copy)]
pub struct CheckerOptions {
    /// Install ordering overloads across `int`/`uint`/`double`.
    pub enable_cross_numeric_comparisons: bool,
    /// Type the equality operators as `(A, B)` instead of `(A, A)`.
    pub enable_heterogeneous_equality: bool,
    /// Register the list `_+_` overload.
    pub enable_list_concat: bool,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            enable_cross_numeric_comparisons: false,
            enable_heterogeneous_equality: false,
            enable_list_concat: true,
        }
    }
}

/// Immutable declaration environment for a `check` call.
///
/// Construction happens through [`EnvBuilder`]; after `build` the environment
/// is read-only and can back any number of concurrent checks.
pub struct Env {
    variables: FxHashMap<String, VariableDecl>,
    functions: FxHashMap<String, FunctionDecl>,
    container: String,
    options: CheckerOptions,
    provider: Box<dyn TypeProvider>,
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("variables", &self.variables.len())
            .field("functions", &self.functions.len())
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

impl Env {
    pub fn builder() -> EnvBuilder {
        EnvBuilder::new()
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn options(&self) -> &CheckerOptions {
        &self.options
    }

    /// Look up a variable declaration by fully-qualified candidate name,
    /// falling through to the provider's enum constants.
    pub fn lookup_variable(&self, name: &str) -> Option<VariableDecl> {
        if let Some(decl) = self.variables.get(name) {
            return Some(decl.clone());
        }
        self.provider
            .lookup_enum_constant(name)
            .map(|constant| VariableDecl::new(constant.name, constant.ty))
    }

    pub fn lookup_function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.get(name)
    }

    /// Resolve a fully-qualified type name, preferring the well-known
    /// protobuf mappings over the provider.
    pub fn lookup_type_name(&self, name: &str) -> Option<Type> {
        well_known_type(name).or_else(|| self.provider.lookup_type(name))
    }

    pub fn lookup_struct_field(
        &self,
        struct_name: &str,
        field_name: &str,
    ) -> Option<StructFieldInfo> {
        self.provider.lookup_struct_field(struct_name, field_name)
    }
}

/// Builder accumulating declarations before freezing them into an [`Env`].
pub struct EnvBuilder {
    variables: FxHashMap<String, VariableDecl>,
    functions: FxHashMap<String, FunctionDecl>,
    container: String,
    options: CheckerOptions,
    provider: Box<dyn TypeProvider>,
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EnvBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvBuilder")
            .field("variables", &self.variables)
            .field("functions", &self.functions)
            .field("container", &self.container)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self {
            variables: FxHashMap::default(),
            functions: FxHashMap::default(),
            container: String::new(),
            options: CheckerOptions::default(),
            provider: Box::new(TypeRegistry::with_well_known()),
        }
    }

    pub fn container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    pub fn options(mut self, options: CheckerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn type_provider(mut self, provider: impl TypeProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    /// Declare a variable; redeclaring a name is a conflict.
    pub fn add_variable(mut self, decl: VariableDecl) -> Result<Self, DeclError> {
        if self.variables.contains_key(&decl.name) {
            return Err(DeclError::VariableExists { name: decl.name });
        }
        self.variables.insert(decl.name.clone(), decl);
        Ok(self)
    }

    /// Declare a function, merging overloads into any existing declaration
    /// with the same name. A duplicate overload id is a conflict.
    pub fn add_function(mut self, decl: FunctionDecl) -> Result<Self, DeclError> {
        self.merge_function(decl)?;
        Ok(self)
    }

    /// Add the standard CEL declarations, honoring the configured options.
    /// Adding the standard library twice conflicts on every overload id.
    pub fn add_standard_library(mut self) -> Result<Self, DeclError> {
        for variable in standard::standard_variables() {
            if self.variables.contains_key(&variable.name) {
                return Err(DeclError::VariableExists {
                    name: variable.name,
                });
            }
            self.variables.insert(variable.name.clone(), variable);
        }
        for function in standard::standard_functions(&self.options) {
            self.merge_function(function)?;
        }
        Ok(self)
    }

    pub fn build(self) -> Env {
        Env {
            variables: self.variables,
            functions: self.functions,
            container: self.container,
            options: self.options,
            provider: self.provider,
        }
    }

    fn merge_function(&mut self, decl: FunctionDecl) -> Result<(), DeclError> {
        match self.functions.get_mut(decl.name()) {
            Some(existing) => {
                for overload in decl.overloads() {
                    existing.add_overload(overload.clone())?;
                }
            }
            None => {
                self.functions.insert(decl.name().to_string(), decl);
            }
        }
        Ok(())
    }
}

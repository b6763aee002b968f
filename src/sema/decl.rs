// src/sema/decl.rs

use crate::errors::DeclError;
use crate::sema::Type;

/// A named variable (or constant) declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub ty: Type,
}

impl VariableDecl {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// One typed signature of a function.
///
/// `type_params` lists the free type variables appearing in the argument or
/// result types; each use site instantiates them with fresh variables.
#[derive(Debug, Clone, PartialEq)]
pub struct OverloadDecl {
    pub id: String,
    pub member: bool,
    pub args: Vec<Type>,
    pub result: Type,
    pub type_params: Vec<String>,
}

impl OverloadDecl {
    pub fn new(id: impl Into<String>, args: Vec<Type>, result: Type) -> Self {
        Self::with_style(id, false, args, result)
    }

    pub fn member(id: impl Into<String>, args: Vec<Type>, result: Type) -> Self {
        Self::with_style(id, true, args, result)
    }

    fn with_style(id: impl Into<String>, member: bool, args: Vec<Type>, result: Type) -> Self {
        let mut type_params = Vec::new();
        for arg in &args {
            arg.collect_params(&mut type_params);
        }
        result.collect_params(&mut type_params);
        Self {
            id: id.into(),
            member,
            args,
            result,
            type_params,
        }
    }
}

/// A function name together with all of its overloads.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    name: String,
    overloads: Vec<OverloadDecl>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overloads: Vec::new(),
        }
    }

    /// Build a declaration from a full overload set, rejecting duplicate ids.
    pub fn with_overloads(
        name: impl Into<String>,
        overloads: Vec<OverloadDecl>,
    ) -> Result<Self, DeclError> {
        let mut decl = Self::new(name);
        for overload in overloads {
            decl.add_overload(overload)?;
        }
        Ok(decl)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn overloads(&self) -> &[OverloadDecl] {
        &self.overloads
    }

    /// Add an overload; an existing overload with the same id is a conflict.
    pub fn add_overload(&mut self, overload: OverloadDecl) -> Result<(), DeclError> {
        if self.overloads.iter().any(|o| o.id == overload.id) {
            return Err(DeclError::OverloadExists {
                function: self.name.clone(),
                id: overload.id,
            });
        }
        self.overloads.push(overload);
        Ok(())
    }
}

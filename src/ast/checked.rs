// src/ast/checked.rs
//! Annotations attached to a checked AST.
//!
//! `AstType` is the flattened, self-contained type representation stored in
//! the AST's type map. It carries no references into the checker environment,
//! so a checked AST outlives the `Env` that produced it.

use std::fmt;

/// Primitive CEL value kinds, shared by the plain and wrapper forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Bool,
    Int64,
    Uint64,
    Double,
    String,
    Bytes,
}

/// Well-known protobuf types that survive flattening by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownType {
    Any,
    Duration,
    Timestamp,
}

/// Flattened type representation stored per expression id.
#[derive(Debug, Clone, PartialEq)]
pub enum AstType {
    Dyn,
    Error,
    Null,
    Primitive(PrimitiveType),
    Wrapper(PrimitiveType),
    WellKnown(WellKnownType),
    List(Box<AstType>),
    Map(Box<AstType>, Box<AstType>),
    /// A message type referenced by fully-qualified name.
    Message(String),
    /// An abstract (opaque) type with its parameter types.
    Abstract(String, Vec<AstType>),
    /// The type of a type value; `None` when the parameter is unconstrained.
    Type(Option<Box<AstType>>),
}

impl fmt::Display for AstType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstType::Dyn => write!(f, "dyn"),
            AstType::Error => write!(f, "*error*"),
            AstType::Null => write!(f, "null_type"),
            AstType::Primitive(p) => write!(f, "{}", primitive_name(*p)),
            AstType::Wrapper(p) => write!(f, "wrapper({})", primitive_name(*p)),
            AstType::WellKnown(WellKnownType::Any) => write!(f, "any"),
            AstType::WellKnown(WellKnownType::Duration) => write!(f, "google.protobuf.Duration"),
            AstType::WellKnown(WellKnownType::Timestamp) => write!(f, "google.protobuf.Timestamp"),
            AstType::List(elem) => write!(f, "list({elem})"),
            AstType::Map(key, value) => write!(f, "map({key}, {value})"),
            AstType::Message(name) => write!(f, "{name}"),
            AstType::Abstract(name, params) => {
                write!(f, "{name}")?;
                if !params.is_empty() {
                    write!(f, "(")?;
                    for (i, param) in params.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{param}")?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            AstType::Type(None) => write!(f, "type"),
            AstType::Type(Some(param)) => write!(f, "type({param})"),
        }
    }
}

fn primitive_name(p: PrimitiveType) -> &'static str {
    match p {
        PrimitiveType::Bool => "bool",
        PrimitiveType::Int64 => "int",
        PrimitiveType::Uint64 => "uint",
        PrimitiveType::Double => "double",
        PrimitiveType::String => "string",
        PrimitiveType::Bytes => "bytes",
    }
}

/// A resolved declaration reference recorded against an expression id.
///
/// For function calls `overload_ids` lists the surviving candidate overloads
/// in declaration order; for variables and struct types it is empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reference {
    pub name: String,
    pub overload_ids: Vec<String>,
}

impl Reference {
    pub fn to_variable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overload_ids: Vec::new(),
        }
    }

    pub fn to_function(name: impl Into<String>, overload_ids: Vec<String>) -> Self {
        Self {
            name: name.into(),
            overload_ids,
        }
    }
}

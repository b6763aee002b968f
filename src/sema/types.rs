// src/sema/types.rs

use std::fmt;

/// Name of the distinguished opaque type modeling `optional(T)`.
pub const OPTIONAL_TYPE_NAME: &str = "optional_type";

/// An opaque (abstract) type: a name plus parameter types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueType {
    pub name: String,
    pub params: Vec<Type>,
}

/// Resolved types in the CEL type system.
///
/// Equality is structural; singleton kinds (primitives, wrappers) compare
/// equal regardless of provenance. `Dyn` is not equal to any other kind --
/// universal interchangeability is an assignability rule, not an equality
/// rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Deferred-to-runtime typing; assignable to and from everything.
    Dyn,
    /// Error recovery marker.
    Error,
    /// The type of `null`.
    Null,
    Bool,
    Int,
    Uint,
    Double,
    String,
    Bytes,
    Duration,
    Timestamp,
    /// `google.protobuf.Any`.
    Any,
    /// Nullable primitives (`google.protobuf.*Value` wrappers).
    BoolWrapper,
    IntWrapper,
    UintWrapper,
    DoubleWrapper,
    StringWrapper,
    BytesWrapper,
    List(Box<Type>),
    Map(Box<Type>, Box<Type>),
    /// A message type identified by fully-qualified name; the field schema
    /// lives in the environment's type provider.
    Struct(String),
    Opaque(OpaqueType),
    /// A free type variable, meaningful only during inference.
    TypeParam(String),
    /// The meta-type of a type value; `None` when unparameterized.
    Type(Option<Box<Type>>),
}

impl Type {
    pub fn list(elem: Type) -> Type {
        Type::List(Box::new(elem))
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Map(Box::new(key), Box::new(value))
    }

    pub fn strct(name: impl Into<String>) -> Type {
        Type::Struct(name.into())
    }

    pub fn opaque(name: impl Into<String>, params: Vec<Type>) -> Type {
        Type::Opaque(OpaqueType {
            name: name.into(),
            params,
        })
    }

    pub fn type_param(name: impl Into<String>) -> Type {
        Type::TypeParam(name.into())
    }

    /// The meta-type of `param` (what the `type()` function returns).
    pub fn type_of(param: Type) -> Type {
        Type::Type(Some(Box::new(param)))
    }

    /// `optional(inner)`, modeled as a distinguished opaque type.
    pub fn optional(inner: Type) -> Type {
        Type::opaque(OPTIONAL_TYPE_NAME, vec![inner])
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Type::Opaque(o) if o.name == OPTIONAL_TYPE_NAME && o.params.len() == 1)
    }

    /// The held type of an `optional(T)`, if this is one.
    pub fn optional_param(&self) -> Option<&Type> {
        match self {
            Type::Opaque(o) if o.name == OPTIONAL_TYPE_NAME && o.params.len() == 1 => {
                Some(&o.params[0])
            }
            _ => None,
        }
    }

    pub fn is_wrapper(&self) -> bool {
        matches!(
            self,
            Type::BoolWrapper
                | Type::IntWrapper
                | Type::UintWrapper
                | Type::DoubleWrapper
                | Type::StringWrapper
                | Type::BytesWrapper
        )
    }

    /// The primitive a wrapper corresponds to, or `None` for non-wrappers.
    pub fn unwrapped(&self) -> Option<Type> {
        match self {
            Type::BoolWrapper => Some(Type::Bool),
            Type::IntWrapper => Some(Type::Int),
            Type::UintWrapper => Some(Type::Uint),
            Type::DoubleWrapper => Some(Type::Double),
            Type::StringWrapper => Some(Type::String),
            Type::BytesWrapper => Some(Type::Bytes),
            _ => None,
        }
    }

    /// Collect the free type-param names appearing in this type, in order of
    /// first appearance.
    pub fn collect_params(&self, out: &mut Vec<String>) {
        match self {
            Type::TypeParam(name) => {
                if !out.iter().any(|p| p == name) {
                    out.push(name.clone());
                }
            }
            Type::List(elem) => elem.collect_params(out),
            Type::Map(key, value) => {
                key.collect_params(out);
                value.collect_params(out);
            }
            Type::Opaque(o) => {
                for param in &o.params {
                    param.collect_params(out);
                }
            }
            Type::Type(Some(param)) => param.collect_params(out),
            _ => {}
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Dyn => write!(f, "dyn"),
            Type::Error => write!(f, "*error*"),
            Type::Null => write!(f, "null_type"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Uint => write!(f, "uint"),
            Type::Double => write!(f, "double"),
            Type::String => write!(f, "string"),
            Type::Bytes => write!(f, "bytes"),
            Type::Duration => write!(f, "google.protobuf.Duration"),
            Type::Timestamp => write!(f, "google.protobuf.Timestamp"),
            Type::Any => write!(f, "any"),
            Type::BoolWrapper => write!(f, "wrapper(bool)"),
            Type::IntWrapper => write!(f, "wrapper(int)"),
            Type::UintWrapper => write!(f, "wrapper(uint)"),
            Type::DoubleWrapper => write!(f, "wrapper(double)"),
            Type::StringWrapper => write!(f, "wrapper(string)"),
            Type::BytesWrapper => write!(f, "wrapper(bytes)"),
            Type::List(elem) => write!(f, "list({elem})"),
            Type::Map(key, value) => write!(f, "map({key}, {value})"),
            Type::Struct(name) => write!(f, "{name}"),
            Type::Opaque(o) => {
                write!(f, "{}", o.name)?;
                if !o.params.is_empty() {
                    write!(f, "(")?;
                    for (i, param) in o.params.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{param}")?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            Type::TypeParam(name) => write!(f, "{name}"),
            Type::Type(None) => write!(f, "type"),
            Type::Type(Some(param)) => write!(f, "type({param})"),
        }
    }
}

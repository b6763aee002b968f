// src/sema/provider.rs
//
// Type provider interface and the built-in registry implementation.
// Struct field schemas and enum constants come from here; the checker core
// never sees protobuf descriptors directly.

use rustc_hash::FxHashMap;

use crate::sema::Type;

/// Field schema entry for a struct type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructFieldInfo {
    pub name: String,
    pub ty: Type,
}

/// A fully-qualified enum constant (e.g. `google.protobuf.NullValue.NULL_VALUE`).
#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstant {
    /// Canonical fully-qualified name.
    pub name: String,
    /// Enum values are `int` in CEL.
    pub ty: Type,
}

impl EnumConstant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: Type::Int,
        }
    }
}

/// Source of struct/enum/opaque type information, typically backed by
/// protobuf descriptors.
pub trait TypeProvider: Send + Sync {
    /// Resolve a fully-qualified type name to its checker type.
    fn lookup_type(&self, name: &str) -> Option<Type>;

    /// Resolve a field of a struct type by name.
    fn lookup_struct_field(&self, struct_name: &str, field_name: &str) -> Option<StructFieldInfo>;

    /// Resolve a fully-qualified enum constant.
    fn lookup_enum_constant(&self, name: &str) -> Option<EnumConstant>;
}

/// Checker types for the well-known protobuf messages, which do not behave
/// like ordinary structs: the wrapper messages map to wrapper types and the
/// JSON types map to their dynamic equivalents.
pub fn well_known_type(name: &str) -> Option<Type> {
    match name {
        "google.protobuf.BoolValue" => Some(Type::BoolWrapper),
        "google.protobuf.Int32Value" | "google.protobuf.Int64Value" => Some(Type::IntWrapper),
        "google.protobuf.UInt32Value" | "google.protobuf.UInt64Value" => Some(Type::UintWrapper),
        "google.protobuf.FloatValue" | "google.protobuf.DoubleValue" => Some(Type::DoubleWrapper),
        "google.protobuf.StringValue" => Some(Type::StringWrapper),
        "google.protobuf.BytesValue" => Some(Type::BytesWrapper),
        "google.protobuf.Any" => Some(Type::Any),
        "google.protobuf.Duration" => Some(Type::Duration),
        "google.protobuf.Timestamp" => Some(Type::Timestamp),
        "google.protobuf.Value" => Some(Type::Dyn),
        "google.protobuf.ListValue" => Some(Type::list(Type::Dyn)),
        "google.protobuf.Struct" => Some(Type::map(Type::String, Type::Dyn)),
        "google.protobuf.NullValue" => Some(Type::Null),
        _ => None,
    }
}

/// Whether `name` is a well-known protobuf message that supports message
/// creation even though its checker type is not a struct.
pub fn is_well_known_message_type(name: &str) -> bool {
    well_known_type(name).is_some()
}

/// In-memory [`TypeProvider`] used for tests and for environments without
/// descriptor backing. Names are stored fully qualified.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: FxHashMap<String, Type>,
    fields: FxHashMap<String, Vec<StructFieldInfo>>,
    enum_constants: FxHashMap<String, EnumConstant>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the well-known protobuf enum constants.
    pub fn with_well_known() -> Self {
        let mut registry = Self::new();
        registry.add_enum_constant(EnumConstant::new("google.protobuf.NullValue.NULL_VALUE"));
        registry
    }

    /// Register a struct type and its field schema.
    pub fn add_struct(&mut self, name: impl Into<String>, fields: Vec<StructFieldInfo>) {
        let name = name.into();
        self.types.insert(name.clone(), Type::Struct(name.clone()));
        self.fields.insert(name, fields);
    }

    /// Register an opaque or alias type under a fully-qualified name.
    pub fn add_type(&mut self, name: impl Into<String>, ty: Type) {
        self.types.insert(name.into(), ty);
    }

    pub fn add_enum_constant(&mut self, constant: EnumConstant) {
        self.enum_constants.insert(constant.name.clone(), constant);
    }
}

impl TypeProvider for TypeRegistry {
    fn lookup_type(&self, name: &str) -> Option<Type> {
        self.types.get(name).cloned()
    }

    fn lookup_struct_field(&self, struct_name: &str, field_name: &str) -> Option<StructFieldInfo> {
        self.fields
            .get(struct_name)?
            .iter()
            .find(|field| field.name == field_name)
            .cloned()
    }

    fn lookup_enum_constant(&self, name: &str) -> Option<EnumConstant> {
        self.enum_constants.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_structs_and_fields() {
        let mut registry = TypeRegistry::new();
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

        assert_eq!(registry.lookup_type("test.Msg"), Some(Type::strct("test.Msg")));
        assert_eq!(
            registry.lookup_struct_field("test.Msg", "count").map(|f| f.ty),
            Some(Type::Int)
        );
        assert!(registry.lookup_struct_field("test.Msg", "missing").is_none());
        assert!(registry.lookup_type("test.Other").is_none());
    }

    #[test]
    fn well_known_wrappers_map_to_wrapper_types() {
        assert_eq!(well_known_type("google.protobuf.Int64Value"), Some(Type::IntWrapper));
        assert_eq!(well_known_type("google.protobuf.StringValue"), Some(Type::StringWrapper));
        assert_eq!(
            well_known_type("google.protobuf.Struct"),
            Some(Type::map(Type::String, Type::Dyn))
        );
        assert!(is_well_known_message_type("google.protobuf.Any"));
        assert!(!is_well_known_message_type("test.Msg"));
    }

    #[test]
    fn null_value_constant_is_int() {
        let registry = TypeRegistry::with_well_known();
        let constant = registry
            .lookup_enum_constant("google.protobuf.NullValue.NULL_VALUE")
            .unwrap();
        assert_eq!(constant.ty, Type::Int);
        assert_eq!(constant.name, "google.protobuf.NullValue.NULL_VALUE");
    }
}

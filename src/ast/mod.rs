// src/ast/mod.rs
//! The CEL expression tree consumed and annotated by the type checker.
//!
//! The parser (an external collaborator) produces an [`Ast`] with empty
//! annotation maps; a successful check fills `reference_map` and `type_map`
//! and flips `is_checked`.

pub mod checked;
pub mod expr;
pub mod source;

use rustc_hash::FxHashMap;

pub use checked::{AstType, PrimitiveType, Reference, WellKnownType};
pub use expr::{
    CallExpr, ComprehensionExpr, Constant, Expr, ExprId, ExprKind, IdentExpr, ListElement,
    ListExpr, MapEntry, MapExpr, SelectExpr, StructExpr, StructExprField,
};
pub use source::{SourceInfo, SourceLocation};

/// A parsed (and possibly checked) expression together with its source
/// metadata and checker annotations.
#[derive(Debug, Clone, Default)]
pub struct Ast {
    pub root: Expr,
    pub source_info: SourceInfo,
    pub(crate) reference_map: FxHashMap<ExprId, Reference>,
    pub(crate) type_map: FxHashMap<ExprId, AstType>,
    pub(crate) is_checked: bool,
}

impl Ast {
    /// Wrap a parsed root expression with its source info.
    pub fn new(root: Expr, source_info: SourceInfo) -> Self {
        Self {
            root,
            source_info,
            reference_map: FxHashMap::default(),
            type_map: FxHashMap::default(),
            is_checked: false,
        }
    }

    /// Build an AST from a bare expression tree, with no source positions.
    pub fn from_expr(root: Expr) -> Self {
        Self::new(root, SourceInfo::default())
    }

    /// Whether the checker has annotated this tree.
    pub fn is_checked(&self) -> bool {
        self.is_checked
    }

    /// The resolved reference for an expression id, if any.
    pub fn reference(&self, id: ExprId) -> Option<&Reference> {
        self.reference_map.get(&id)
    }

    /// The checked type for an expression id, if any.
    pub fn get_type(&self, id: ExprId) -> Option<&AstType> {
        self.type_map.get(&id)
    }

    /// All reference annotations, keyed by expression id.
    pub fn reference_map(&self) -> &FxHashMap<ExprId, Reference> {
        &self.reference_map
    }

    /// All type annotations, keyed by expression id.
    pub fn type_map(&self) -> &FxHashMap<ExprId, AstType> {
        &self.type_map
    }
}

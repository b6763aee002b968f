// src/sema/rewriter.rs
//! AST walk #2: apply the resolver's findings to the tree.
//!
//! Canonical names replace lexical spellings, call references gain their
//! surviving overload ids, and every recorded type is finalized and
//! flattened into the AST's own representation. Two structural demotions
//! happen here: a fully-matched qualified select collapses into an
//! identifier, and a namespaced receiver call loses its target.

use rustc_hash::FxHashMap;

use crate::ast::{
    AstType, Expr, ExprId, ExprKind, IdentExpr, PrimitiveType, Reference, WellKnownType,
};
use crate::errors::CheckError;
use crate::sema::infer::InferenceContext;
use crate::sema::resolver::Resolution;
use crate::sema::types::Type;

pub(crate) struct Rewriter<'a> {
    resolution: &'a Resolution,
    inference: &'a InferenceContext,
    reference_map: &'a mut FxHashMap<ExprId, Reference>,
    type_map: &'a mut FxHashMap<ExprId, AstType>,
    error: Option<CheckError>,
}

impl<'a> Rewriter<'a> {
    pub fn new(
        resolution: &'a Resolution,
        inference: &'a InferenceContext,
        reference_map: &'a mut FxHashMap<ExprId, Reference>,
        type_map: &'a mut FxHashMap<ExprId, AstType>,
    ) -> Self {
        Self {
            resolution,
            inference,
            reference_map,
            type_map,
            error: None,
        }
    }

    /// Rewrite the tree in place. On a flattening failure the error is
    /// returned, but annotations applied before the failure remain.
    pub fn rewrite(mut self, root: &mut Expr) -> Result<(), CheckError> {
        self.rewrite_expr(root);
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn rewrite_expr(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Const(_) | ExprKind::Ident(_) => {}
            ExprKind::Select(select) => self.rewrite_expr(&mut select.operand),
            ExprKind::Call(call) => {
                if let Some(target) = call.target.as_deref_mut() {
                    self.rewrite_expr(target);
                }
                for arg in &mut call.args {
                    self.rewrite_expr(arg);
                }
            }
            ExprKind::List(list) => {
                for element in &mut list.elements {
                    self.rewrite_expr(&mut element.expr);
                }
            }
            ExprKind::Map(map) => {
                for entry in &mut map.entries {
                    self.rewrite_expr(&mut entry.key);
                    self.rewrite_expr(&mut entry.value);
                }
            }
            ExprKind::Struct(strct) => {
                for field in &mut strct.fields {
                    self.rewrite_expr(&mut field.value);
                }
            }
            ExprKind::Comprehension(comprehension) => {
                self.rewrite_expr(&mut comprehension.iter_range);
                self.rewrite_expr(&mut comprehension.accu_init);
                self.rewrite_expr(&mut comprehension.loop_condition);
                self.rewrite_expr(&mut comprehension.loop_step);
                self.rewrite_expr(&mut comprehension.result);
            }
        }

        if let Some(decl) = self.resolution.attributes.get(&expr.id) {
            self.reference_map
                .insert(expr.id, Reference::to_variable(&decl.name));
            // A qualified name that fully matched a declaration consolidates
            // into a single identifier; the consumed operand chain carries no
            // annotations of its own.
            expr.kind = ExprKind::Ident(IdentExpr {
                name: decl.name.clone(),
            });
        } else if let Some(function) = self.resolution.functions.get(&expr.id) {
            let overload_ids = function
                .decl
                .overloads()
                .iter()
                .map(|overload| overload.id.clone())
                .collect();
            self.reference_map.insert(
                expr.id,
                Reference::to_function(function.decl.name(), overload_ids),
            );
            if let ExprKind::Call(call) = &mut expr.kind {
                call.function = function.decl.name().to_string();
                if function.namespace_rewrite {
                    call.target = None;
                }
            }
        } else if let Some(name) = self.resolution.struct_types.get(&expr.id) {
            self.reference_map
                .insert(expr.id, Reference::to_variable(name));
            if let ExprKind::Struct(strct) = &mut expr.kind {
                strct.name = name.clone();
            }
        }

        if let Some(ty) = self.resolution.types.get(&expr.id) {
            match flatten_type(&self.inference.finalize(ty)) {
                Ok(flattened) => {
                    self.type_map.insert(expr.id, flattened);
                }
                Err(error) => {
                    if self.error.is_none() {
                        self.error = Some(error);
                    }
                }
            }
        }
    }
}

/// Flatten a checker type into the self-contained AST representation.
/// Free type-params were already lowered to `Dyn` by finalization, but the
/// lowering is repeated here so a stray param cannot leak out.
pub(crate) fn flatten_type(ty: &Type) -> Result<AstType, CheckError> {
    Ok(match ty {
        Type::Dyn | Type::TypeParam(_) => AstType::Dyn,
        Type::Error => AstType::Error,
        Type::Null => AstType::Null,
        Type::Bool => AstType::Primitive(PrimitiveType::Bool),
        Type::Int => AstType::Primitive(PrimitiveType::Int64),
        Type::Uint => AstType::Primitive(PrimitiveType::Uint64),
        Type::Double => AstType::Primitive(PrimitiveType::Double),
        Type::String => AstType::Primitive(PrimitiveType::String),
        Type::Bytes => AstType::Primitive(PrimitiveType::Bytes),
        Type::BoolWrapper => AstType::Wrapper(PrimitiveType::Bool),
        Type::IntWrapper => AstType::Wrapper(PrimitiveType::Int64),
        Type::UintWrapper => AstType::Wrapper(PrimitiveType::Uint64),
        Type::DoubleWrapper => AstType::Wrapper(PrimitiveType::Double),
        Type::StringWrapper => AstType::Wrapper(PrimitiveType::String),
        Type::BytesWrapper => AstType::Wrapper(PrimitiveType::Bytes),
        Type::Any => AstType::WellKnown(WellKnownType::Any),
        Type::Duration => AstType::WellKnown(WellKnownType::Duration),
        Type::Timestamp => AstType::WellKnown(WellKnownType::Timestamp),
        Type::List(elem) => AstType::List(Box::new(flatten_type(elem)?)),
        Type::Map(key, value) => AstType::Map(
            Box::new(flatten_type(key)?),
            Box::new(flatten_type(value)?),
        ),
        Type::Struct(name) => AstType::Message(name.clone()),
        Type::Opaque(opaque) => {
            let params = opaque
                .params
                .iter()
                .map(flatten_type)
                .collect::<Result<Vec<_>, _>>()?;
            AstType::Abstract(opaque.name.clone(), params)
        }
        Type::Type(None) => AstType::Type(None),
        Type::Type(Some(param)) => AstType::Type(Some(Box::new(flatten_type(param)?))),
    })
}

// src/sema/resolver.rs
//! AST walk #1: resolve every reference and infer every type.
//!
//! The walk is post-order. Identifiers at the bottom of a dotted path decide,
//! by walking back up the traversal stack, whether the enclosing selects are
//! namespace segments, field accesses, or the receiver of a possibly
//! namespaced call; selects claimed by that walk are deferred out of the
//! default select handling.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::{SmallVec, smallvec};

use crate::ast::{
    Ast, CallExpr, ComprehensionExpr, Constant, Expr, ExprId, ExprKind, IdentExpr, ListExpr,
    MapExpr, SelectExpr, SourceInfo, StructExpr,
};
use crate::errors::CheckError;
use crate::sema::decl::{FunctionDecl, VariableDecl};
use crate::sema::env::Env;
use crate::sema::infer::InferenceContext;
use crate::sema::issues::Issue;
use crate::sema::namespace::NamespaceGenerator;
use crate::sema::provider::is_well_known_message_type;
use crate::sema::scope::{ScopeId, VariableScopes};
use crate::sema::types::Type;

type Qualifiers = SmallVec<[String; 4]>;

/// A narrowed function declaration recorded for a call expression.
#[derive(Debug, Clone)]
pub(crate) struct FunctionResolution {
    pub decl: FunctionDecl,
    /// True when a receiver call was recognized as a namespaced global call;
    /// the rewriter drops the target.
    pub namespace_rewrite: bool,
}

/// Side tables produced by the resolver walk, keyed by expression id.
#[derive(Debug, Default)]
pub(crate) struct Resolution {
    pub types: FxHashMap<ExprId, Type>,
    pub attributes: FxHashMap<ExprId, VariableDecl>,
    pub functions: FxHashMap<ExprId, FunctionResolution>,
    pub struct_types: FxHashMap<ExprId, String>,
}

#[derive(Debug, Clone, Copy)]
struct ComprehensionFrame {
    expr_id: ExprId,
    parent: ScopeId,
    accu: ScopeId,
    iter: ScopeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComprehensionPart {
    IterRange,
    AccuInit,
    LoopCondition,
    LoopStep,
    Result,
}

/// The element type a literal with no elements leaves open.
fn free_list_type() -> Type {
    Type::list(Type::type_param("element_type"))
}

fn free_map_type() -> Type {
    Type::map(Type::type_param("key_type"), Type::type_param("value_type"))
}

fn is_supported_key_type(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Bool | Type::Int | Type::Uint | Type::String | Type::Dyn
    )
}

pub(crate) struct Resolver<'a> {
    env: &'a Env,
    generator: &'a NamespaceGenerator,
    inference: &'a mut InferenceContext,
    issues: &'a mut Vec<Issue>,
    source: &'a SourceInfo,
    scopes: VariableScopes,
    current_scope: ScopeId,
    expr_stack: Vec<&'a Expr>,
    comprehension_scopes: Vec<ComprehensionFrame>,
    deferred_selects: FxHashSet<ExprId>,
    maybe_namespaced_functions: FxHashMap<ExprId, Qualifiers>,
    resolution: Resolution,
    error: Option<CheckError>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        env: &'a Env,
        generator: &'a NamespaceGenerator,
        inference: &'a mut InferenceContext,
        issues: &'a mut Vec<Issue>,
        source: &'a SourceInfo,
    ) -> Self {
        let scopes = VariableScopes::new();
        let current_scope = scopes.root();
        Self {
            env,
            generator,
            inference,
            issues,
            source,
            scopes,
            current_scope,
            expr_stack: Vec::new(),
            comprehension_scopes: Vec::new(),
            deferred_selects: FxHashSet::default(),
            maybe_namespaced_functions: FxHashMap::default(),
            resolution: Resolution::default(),
            error: None,
        }
    }

    pub fn resolve(mut self, ast: &'a Ast) -> Result<Resolution, CheckError> {
        self.visit(&ast.root);
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.resolution),
        }
    }

    fn visit(&mut self, expr: &'a Expr) {
        self.expr_stack.push(expr);
        match &expr.kind {
            ExprKind::Const(_) | ExprKind::Ident(_) => {}
            ExprKind::Select(select) => self.visit(&select.operand),
            ExprKind::Call(call) => {
                if let Some(target) = call.target.as_deref() {
                    self.visit(target);
                }
                for arg in &call.args {
                    self.visit(arg);
                }
            }
            ExprKind::List(list) => {
                for element in &list.elements {
                    self.visit(&element.expr);
                }
            }
            ExprKind::Map(map) => {
                for entry in &map.entries {
                    self.visit(&entry.key);
                    self.visit(&entry.value);
                }
            }
            ExprKind::Struct(strct) => {
                for field in &strct.fields {
                    self.visit(&field.value);
                }
            }
            ExprKind::Comprehension(comprehension) => {
                self.visit_comprehension_children(expr, comprehension);
            }
        }
        // The stack still holds `expr` during its own post-visit; the
        // dotted-path walk-up relies on that.
        match &expr.kind {
            ExprKind::Const(constant) => self.post_visit_const(expr, constant),
            ExprKind::Ident(ident) => self.post_visit_ident(expr, ident),
            ExprKind::Select(select) => self.post_visit_select(expr, select),
            ExprKind::Call(call) => self.post_visit_call(expr, call),
            ExprKind::List(list) => self.post_visit_list(expr, list),
            ExprKind::Map(map) => self.post_visit_map(expr, map),
            ExprKind::Struct(strct) => self.post_visit_struct(expr, strct),
            ExprKind::Comprehension(comprehension) => {
                self.post_visit_comprehension(expr, comprehension);
            }
        }
        self.expr_stack.pop();
    }

    fn type_or_dyn(&self, expr: &Expr) -> Type {
        self.resolution
            .types
            .get(&expr.id)
            .cloned()
            .unwrap_or(Type::Dyn)
    }

    fn internal(&mut self, error: CheckError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn lookup_variable(&self, name: &str) -> Option<VariableDecl> {
        self.scopes
            .lookup(self.current_scope, name)
            .cloned()
            .or_else(|| self.env.lookup_variable(name))
    }

    fn report_missing_reference(&mut self, expr_id: ExprId, name: &str) {
        self.issues.push(Issue::error(
            self.source.location(expr_id),
            format!(
                "undeclared reference to '{}' (in container '{}')",
                name,
                self.env.container()
            ),
        ));
    }

    fn report_undefined_field(&mut self, expr_id: ExprId, field_name: &str, struct_name: &str) {
        self.issues.push(Issue::error(
            self.source.location(expr_id),
            format!("undefined field '{field_name}' not found in struct '{struct_name}'"),
        ));
    }

    // ---- constants and literals ------------------------------------------

    fn post_visit_const(&mut self, expr: &Expr, constant: &Constant) {
        let ty = match constant {
            Constant::Null => Type::Null,
            Constant::Bool(_) => Type::Bool,
            Constant::Int(_) => Type::Int,
            Constant::Uint(_) => Type::Uint,
            Constant::Double(_) => Type::Double,
            Constant::Bytes(_) => Type::Bytes,
            Constant::String(_) => Type::String,
            Constant::Duration(_) => Type::Duration,
            Constant::Timestamp(_) => Type::Timestamp,
        };
        self.resolution.types.insert(expr.id, ty);
    }

    fn post_visit_list(&mut self, expr: &Expr, list: &ListExpr) {
        // Homogeneously typed elements fix the element type; any mismatch
        // widens to dyn and defers enforcement to the runtime.
        let mut overall: Option<Type> = None;
        for element in &list.elements {
            let mut value_type = self.type_or_dyn(&element.expr);
            if element.optional
                && let Some(inner) = value_type.optional_param()
            {
                value_type = inner.clone();
            }
            overall = Some(match overall {
                Some(current) if current == value_type => current,
                Some(_) => Type::Dyn,
                None => value_type,
            });
        }
        let ty = match overall {
            Some(element) => Type::list(element),
            None => self.inference.instantiate(&free_list_type()),
        };
        self.resolution.types.insert(expr.id, ty);
    }

    fn post_visit_map(&mut self, expr: &Expr, map: &MapExpr) {
        let mut overall_key: Option<Type> = None;
        let mut overall_value: Option<Type> = None;
        for entry in &map.entries {
            let key_type = self.type_or_dyn(&entry.key);
            if !is_supported_key_type(&key_type) {
                self.issues.push(Issue::warning(
                    self.source.location(entry.key.id),
                    format!("unsupported map key type: {key_type}"),
                ));
            }
            overall_key = Some(match overall_key {
                Some(current) if current == key_type => current,
                Some(_) => Type::Dyn,
                None => key_type,
            });

            let mut value_type = self.type_or_dyn(&entry.value);
            if entry.optional
                && let Some(inner) = value_type.optional_param()
            {
                value_type = inner.clone();
            }
            overall_value = Some(match overall_value {
                Some(current) if current == value_type => current,
                Some(_) => Type::Dyn,
                None => value_type,
            });
        }
        match (overall_key, overall_value) {
            (Some(key), Some(value)) => {
                self.resolution.types.insert(expr.id, Type::map(key, value));
            }
            (None, None) => {
                let ty = self.inference.instantiate(&free_map_type());
                self.resolution.types.insert(expr.id, ty);
            }
            _ => self.internal(CheckError::MapInferenceMismatch),
        }
    }

    fn post_visit_struct(&mut self, expr: &Expr, strct: &StructExpr) {
        let generator = self.generator;
        let mut resolved: Option<(String, Type)> = None;
        generator.candidates(&strct.name, |candidate| {
            match self.env.lookup_type_name(candidate) {
                Some(ty) => {
                    resolved = Some((candidate.to_string(), ty));
                    false
                }
                None => true,
            }
        });

        let Some((resolved_name, resolved_type)) = resolved else {
            self.report_missing_reference(expr.id, &strct.name);
            return;
        };

        if !matches!(resolved_type, Type::Struct(_)) && !is_well_known_message_type(&resolved_name)
        {
            self.issues.push(Issue::error(
                self.source.location(expr.id),
                format!("type '{resolved_name}' does not support message creation"),
            ));
            return;
        }

        self.resolution.types.insert(expr.id, resolved_type);
        self.resolution
            .struct_types
            .insert(expr.id, resolved_name.clone());
        self.check_field_assignments(strct, &resolved_name);
    }

    fn check_field_assignments(&mut self, strct: &StructExpr, resolved_name: &str) {
        for field in &strct.fields {
            let value_type = self.type_or_dyn(&field.value);
            let Some(info) = self.env.lookup_struct_field(resolved_name, &field.name) else {
                self.report_undefined_field(field.id, &field.name, resolved_name);
                continue;
            };
            let mut field_type = info.ty;
            if field.optional {
                field_type = Type::optional(field_type);
            }
            if !self.inference.is_assignable(&value_type, &field_type) {
                self.issues.push(Issue::error(
                    self.source.location(field.id),
                    format!(
                        "expected type of field '{}' is '{}' but provided type is '{}'",
                        info.name, field_type, value_type
                    ),
                ));
            }
        }
    }

    // ---- identifiers and selects -----------------------------------------

    fn post_visit_ident(&mut self, expr: &'a Expr, ident: &IdentExpr) {
        if self.expr_stack.len() == 1 {
            self.resolve_simple_identifier(expr, &ident.name);
            return;
        }

        // Walk up the stack collecting the select chain rooted at this
        // identifier. If the chain turns out to be the target of a receiver
        // call, defer: the call might be a namespaced global function.
        let mut stack_pos = self.expr_stack.len() - 1;
        let mut qualifiers: Qualifiers = smallvec![ident.name.clone()];
        let mut receiver_call: Option<ExprId> = None;
        let mut root_candidate = self.expr_stack[stack_pos];
        while stack_pos > 0 {
            stack_pos -= 1;
            let parent = self.expr_stack[stack_pos];
            match &parent.kind {
                ExprKind::Call(call)
                    if call
                        .target
                        .as_deref()
                        .is_some_and(|target| target.id == root_candidate.id) =>
                {
                    receiver_call = Some(parent.id);
                    break;
                }
                ExprKind::Select(select) => {
                    qualifiers.push(select.field.clone());
                    self.deferred_selects.insert(parent.id);
                    root_candidate = parent;
                    if select.test_only {
                        break;
                    }
                }
                _ => break,
            }
        }

        match receiver_call {
            Some(call_id) => {
                self.maybe_namespaced_functions.insert(call_id, qualifiers);
            }
            None => self.resolve_qualified_identifier(root_candidate, &qualifiers),
        }
    }

    fn resolve_simple_identifier(&mut self, expr: &Expr, name: &str) {
        let generator = self.generator;
        let mut found: Option<VariableDecl> = None;
        generator.candidates(name, |candidate| {
            match self.lookup_variable(candidate) {
                Some(decl) => {
                    found = Some(decl);
                    false
                }
                None => true,
            }
        });
        match found {
            Some(decl) => {
                let ty = self.inference.instantiate(&decl.ty);
                self.resolution.types.insert(expr.id, ty);
                self.resolution.attributes.insert(expr.id, decl);
            }
            None => self.report_missing_reference(expr.id, name),
        }
    }

    fn resolve_qualified_identifier(&mut self, root: &'a Expr, qualifiers: &[String]) {
        if qualifiers.len() == 1 {
            self.resolve_simple_identifier(root, &qualifiers[0]);
            return;
        }

        let generator = self.generator;
        let mut matched: Option<(VariableDecl, usize)> = None;
        generator.qualified_candidates(qualifiers, |candidate, segment_index| {
            match self.lookup_variable(candidate) {
                Some(decl) => {
                    matched = Some((decl, segment_index));
                    false
                }
                None => true,
            }
        });

        let Some((decl, segment_index)) = matched else {
            self.report_missing_reference(root.id, &qualifiers.join("."));
            return;
        };

        // The first `segment_index + 1` qualifiers name the variable; the
        // remaining outer selects are field accesses, resolved inside-out so
        // each sees its operand's type.
        let num_selects = qualifiers.len() - segment_index - 1;
        let mut node = root;
        let mut selects: Vec<&'a Expr> = Vec::with_capacity(num_selects);
        for _ in 0..num_selects {
            let ExprKind::Select(select) = &node.kind else {
                break;
            };
            selects.push(node);
            node = &select.operand;
        }

        let ty = self.inference.instantiate(&decl.ty);
        self.resolution.types.insert(node.id, ty);
        self.resolution.attributes.insert(node.id, decl);

        for select_expr in selects.into_iter().rev() {
            if let ExprKind::Select(select) = &select_expr.kind {
                self.resolve_select_operation(select_expr, select);
            }
        }
    }

    fn post_visit_select(&mut self, expr: &Expr, select: &SelectExpr) {
        if !self.deferred_selects.contains(&expr.id) {
            self.resolve_select_operation(expr, select);
        }
    }

    fn resolve_select_operation(&mut self, expr: &Expr, select: &SelectExpr) {
        let operand_type = self.type_or_dyn(&select.operand);
        // Short-hand optional chaining: select through optional(T) reads T.
        let held_type = match operand_type.optional_param() {
            Some(inner) => inner.clone(),
            None => operand_type,
        };
        let result_type = self.select_field_type(expr, &held_type, &select.field);
        if let Some(result_type) = result_type {
            let ty = if select.test_only {
                Type::Bool
            } else {
                result_type
            };
            self.resolution.types.insert(expr.id, ty);
        }
    }

    fn select_field_type(&mut self, expr: &Expr, operand_type: &Type, field: &str) -> Option<Type> {
        match operand_type {
            Type::Dyn | Type::Any => Some(Type::Dyn),
            Type::Struct(name) => match self.env.lookup_struct_field(name, field) {
                Some(info) => Some(info.ty),
                None => {
                    self.report_undefined_field(expr.id, field, name);
                    None
                }
            },
            Type::Map(key, value) if self.inference.is_assignable(&Type::String, key) => {
                Some((**value).clone())
            }
            other => {
                self.issues.push(Issue::error(
                    self.source.location(expr.id),
                    format!("expression of type '{other}' cannot be the operand of a select operation"),
                ));
                None
            }
        }
    }

    // ---- calls ------------------------------------------------------------

    fn post_visit_call(&mut self, expr: &'a Expr, call: &'a CallExpr) {
        if let Some(qualifiers) = self.maybe_namespaced_functions.remove(&expr.id) {
            let namespaced_name = format!("{}.{}", qualifiers.join("."), call.function);
            if let Some(decl) =
                self.resolve_function_call_shape(&namespaced_name, call.args.len(), false)
            {
                tracing::debug!(
                    function = %decl.name(),
                    "receiver call resolved as namespaced function"
                );
                self.resolve_function_overloads(expr, call, &decl, false, true);
                return;
            }
            // Not a namespaced function: the chain is an attribute after all,
            // and the call resolves as an ordinary receiver call.
            if let Some(target) = call.target.as_deref() {
                self.resolve_qualified_identifier(target, &qualifiers);
            }
        }

        let is_receiver = call.target.is_some();
        let arg_count = call.args.len() + usize::from(is_receiver);
        match self.resolve_function_call_shape(&call.function, arg_count, is_receiver) {
            Some(decl) => self.resolve_function_overloads(expr, call, &decl, is_receiver, false),
            None => self.report_missing_reference(expr.id, &call.function),
        }
    }

    /// Find the declaration matching the call's name, arity, and call style.
    fn resolve_function_call_shape(
        &self,
        function_name: &str,
        arg_count: usize,
        is_receiver: bool,
    ) -> Option<FunctionDecl> {
        let mut found: Option<FunctionDecl> = None;
        self.generator.candidates(function_name, |candidate| {
            if let Some(decl) = self.env.lookup_function(candidate)
                && decl
                    .overloads()
                    .iter()
                    .any(|o| o.member == is_receiver && o.args.len() == arg_count)
            {
                found = Some(decl.clone());
                return false;
            }
            // Name miss, or a name match with no overload of this shape.
            true
        });
        found
    }

    fn resolve_function_overloads(
        &mut self,
        expr: &Expr,
        call: &CallExpr,
        decl: &FunctionDecl,
        is_receiver: bool,
        is_namespaced: bool,
    ) {
        let mut arg_types: Vec<Type> = Vec::with_capacity(call.args.len() + 1);
        if is_receiver
            && let Some(target) = call.target.as_deref()
        {
            arg_types.push(self.type_or_dyn(target));
        }
        for arg in &call.args {
            arg_types.push(self.type_or_dyn(arg));
        }

        let Some(resolution) = self
            .inference
            .resolve_overload(decl, &arg_types, is_receiver)
        else {
            let rendered = arg_types
                .iter()
                .map(Type::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            self.issues.push(Issue::error(
                self.source.location(expr.id),
                format!(
                    "found no matching overload for '{}' applied to ({rendered})",
                    decl.name()
                ),
            ));
            return;
        };

        let mut narrowed = FunctionDecl::new(decl.name());
        for overload in resolution.overloads {
            // The overloads are a filtered subset of one declaration, so a
            // conflict here is a broken invariant.
            if let Err(conflict) = narrowed.add_overload(overload) {
                self.internal(CheckError::OverloadNarrowing(conflict));
                return;
            }
        }
        self.resolution.functions.insert(
            expr.id,
            FunctionResolution {
                decl: narrowed,
                namespace_rewrite: is_namespaced,
            },
        );
        self.resolution
            .types
            .insert(expr.id, resolution.result_type);
    }

    // ---- comprehensions ----------------------------------------------------

    fn visit_comprehension_children(&mut self, expr: &'a Expr, comprehension: &'a ComprehensionExpr) {
        let parent = self.current_scope;
        let accu = self.scopes.make_nested(parent);
        let iter = self.scopes.make_nested(accu);
        self.comprehension_scopes.push(ComprehensionFrame {
            expr_id: expr.id,
            parent,
            accu,
            iter,
        });

        for part in [
            ComprehensionPart::IterRange,
            ComprehensionPart::AccuInit,
            ComprehensionPart::LoopCondition,
            ComprehensionPart::LoopStep,
            ComprehensionPart::Result,
        ] {
            self.visit_comprehension_part(expr, comprehension, part);
        }
    }

    fn visit_comprehension_part(
        &mut self,
        expr: &'a Expr,
        comprehension: &'a ComprehensionExpr,
        part: ComprehensionPart,
    ) {
        let Some(frame) = self.comprehension_scopes.last().copied() else {
            self.internal(CheckError::ScopeStackBroken { expr_id: expr.id.0 });
            return;
        };
        if frame.expr_id != expr.id {
            self.internal(CheckError::ScopeStackBroken { expr_id: expr.id.0 });
            return;
        }

        // The range and init see the enclosing scope; the loop condition and
        // step see both variables; the result sees only the accumulator.
        self.current_scope = match part {
            ComprehensionPart::IterRange | ComprehensionPart::AccuInit => frame.parent,
            ComprehensionPart::LoopCondition | ComprehensionPart::LoopStep => frame.iter,
            ComprehensionPart::Result => frame.accu,
        };

        let sub_expr = match part {
            ComprehensionPart::IterRange => &comprehension.iter_range,
            ComprehensionPart::AccuInit => &comprehension.accu_init,
            ComprehensionPart::LoopCondition => &comprehension.loop_condition,
            ComprehensionPart::LoopStep => &comprehension.loop_step,
            ComprehensionPart::Result => &comprehension.result,
        };
        self.visit(sub_expr);

        self.current_scope = frame.parent;

        // Binding happens after the defining sub-part is visited; the
        // traversal order guarantees the variables exist before any
        // sub-expression that can reference them.
        match part {
            ComprehensionPart::AccuInit => {
                let ty = self.type_or_dyn(&comprehension.accu_init);
                self.scopes
                    .insert_if_absent(frame.accu, VariableDecl::new(&comprehension.accu_var, ty));
            }
            ComprehensionPart::IterRange => {
                let range_type = self.type_or_dyn(&comprehension.iter_range);
                let iter_type = match &range_type {
                    Type::List(elem) => (**elem).clone(),
                    Type::Map(key, _) => (**key).clone(),
                    Type::Dyn => Type::Dyn,
                    other => {
                        self.issues.push(Issue::error(
                            self.source.location(expr.id),
                            format!(
                                "expression of type '{other}' cannot be the range of a \
                                 comprehension (must be list, map, or dynamic)"
                            ),
                        ));
                        Type::Dyn
                    }
                };
                self.scopes.insert_if_absent(
                    frame.iter,
                    VariableDecl::new(&comprehension.iter_var, iter_type),
                );
            }
            _ => {}
        }
    }

    fn post_visit_comprehension(&mut self, expr: &Expr, comprehension: &ComprehensionExpr) {
        if self.comprehension_scopes.pop().is_none() {
            self.internal(CheckError::ScopeStackBroken { expr_id: expr.id.0 });
            return;
        }
        let ty = self.type_or_dyn(&comprehension.result);
        self.resolution.types.insert(expr.id, ty);
    }
}

// src/sema/infer.rs
//! Parametric type inference for overload resolution.
//!
//! The context owns a grow-only substitution from type-param names to types.
//! Overload candidates are tried against a snapshot of the substitution and
//! rolled back on failure, so a rejected candidate leaves no trace.

use rustc_hash::FxHashMap;

use crate::sema::decl::{FunctionDecl, OverloadDecl};
use crate::sema::types::{OpaqueType, Type};

type Substitution = FxHashMap<String, Type>;

/// Outcome of resolving a function call against a declaration.
#[derive(Debug, Clone)]
pub struct OverloadResolution {
    /// `Dyn` when the surviving candidates disagree on a result type.
    pub result_type: Type,
    /// Surviving candidates, in declaration order.
    pub overloads: Vec<OverloadDecl>,
}

#[derive(Debug, Default)]
pub struct InferenceContext {
    next_param_id: u64,
    substitution: Substitution,
}

impl InferenceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `ty` with every free type-param replaced by a fresh one.
    pub fn instantiate(&mut self, ty: &Type) -> Type {
        let mut params = Vec::new();
        ty.collect_params(&mut params);
        if params.is_empty() {
            return ty.clone();
        }
        let mapping = self.fresh_mapping(&params);
        rename(ty, &mapping)
    }

    /// Instantiate an overload signature with one shared fresh mapping, so a
    /// param appearing in several positions stays unified.
    fn instantiate_overload(&mut self, overload: &OverloadDecl) -> (Vec<Type>, Type) {
        let mapping = self.fresh_mapping(&overload.type_params);
        let args = overload.args.iter().map(|arg| rename(arg, &mapping)).collect();
        let result = rename(&overload.result, &mapping);
        (args, result)
    }

    fn fresh_mapping(&mut self, params: &[String]) -> FxHashMap<String, String> {
        params
            .iter()
            .map(|param| {
                let fresh = format!("{}%{}", param, self.next_param_id);
                self.next_param_id += 1;
                (param.clone(), fresh)
            })
            .collect()
    }

    /// Whether a value of type `from` is usable where `to` is expected,
    /// unifying free type-params on either side. The substitution is updated
    /// only when the whole check succeeds.
    pub fn is_assignable(&mut self, from: &Type, to: &Type) -> bool {
        let mut scratch = self.substitution.clone();
        if assignable(&mut scratch, from, to) {
            self.substitution = scratch;
            return true;
        }
        false
    }

    /// Resolve a call against `decl` per the shape (`arg_types.len()`,
    /// `is_receiver`), returning the surviving overloads and the overall
    /// result type, or `None` when nothing matches.
    pub fn resolve_overload(
        &mut self,
        decl: &FunctionDecl,
        arg_types: &[Type],
        is_receiver: bool,
    ) -> Option<OverloadResolution> {
        let snapshot = self.substitution.clone();
        let mut survivors: Vec<(OverloadDecl, Type, Substitution)> = Vec::new();

        for overload in decl.overloads() {
            if overload.member != is_receiver || overload.args.len() != arg_types.len() {
                continue;
            }
            self.substitution = snapshot.clone();
            let (params, result) = self.instantiate_overload(overload);
            let matched = params
                .iter()
                .zip(arg_types)
                .all(|(param, arg)| self.is_assignable(arg, param));
            if matched {
                let result = substitute(&self.substitution, &result, false);
                survivors.push((overload.clone(), result, std::mem::take(&mut self.substitution)));
            }
        }
        self.substitution = snapshot;

        match survivors.len() {
            0 => {
                tracing::trace!(function = decl.name(), "no overload candidate survived");
                None
            }
            1 => {
                let (overload, result_type, substitution) = survivors.pop()?;
                // A single survivor commits its unifications.
                self.substitution = substitution;
                Some(OverloadResolution {
                    result_type,
                    overloads: vec![overload],
                })
            }
            _ => {
                let mut scratch = self.substitution.clone();
                let mut result_type = survivors[0].1.clone();
                for (_, other, _) in &survivors[1..] {
                    if !assignable(&mut scratch, &result_type, other) {
                        result_type = Type::Dyn;
                        break;
                    }
                }
                if result_type != Type::Dyn {
                    result_type = substitute(&scratch, &result_type, false);
                }
                Some(OverloadResolution {
                    result_type,
                    overloads: survivors.into_iter().map(|(overload, _, _)| overload).collect(),
                })
            }
        }
    }

    /// Apply the substitution to a fixed point; free params become `Dyn`.
    /// Idempotent: finalizing a finalized type is the identity.
    pub fn finalize(&self, ty: &Type) -> Type {
        substitute(&self.substitution, ty, true)
    }
}

fn rename(ty: &Type, mapping: &FxHashMap<String, String>) -> Type {
    match ty {
        Type::TypeParam(name) => match mapping.get(name) {
            Some(fresh) => Type::TypeParam(fresh.clone()),
            None => ty.clone(),
        },
        Type::List(elem) => Type::list(rename(elem, mapping)),
        Type::Map(key, value) => Type::map(rename(key, mapping), rename(value, mapping)),
        Type::Opaque(o) => Type::Opaque(OpaqueType {
            name: o.name.clone(),
            params: o.params.iter().map(|p| rename(p, mapping)).collect(),
        }),
        Type::Type(Some(param)) => Type::type_of(rename(param, mapping)),
        _ => ty.clone(),
    }
}

/// Follow a type-param's binding chain to its root.
fn resolve<'a>(substitution: &'a Substitution, ty: &'a Type) -> &'a Type {
    let mut current = ty;
    while let Type::TypeParam(name) = current {
        match substitution.get(name) {
            Some(bound) => current = bound,
            None => break,
        }
    }
    current
}

fn assignable(substitution: &mut Substitution, from: &Type, to: &Type) -> bool {
    let from = resolve(substitution, from).clone();
    let to = resolve(substitution, to).clone();

    if from == to {
        return true;
    }
    match (&from, &to) {
        (Type::Dyn, _) | (_, Type::Dyn) => true,
        (Type::TypeParam(name), other) | (other, Type::TypeParam(name)) => {
            // `other` cannot be the same param: `from == to` covered that.
            substitution.insert(name.clone(), (*other).clone());
            true
        }
        // A primitive and its wrapper are interchangeable.
        (Type::Bool, Type::BoolWrapper)
        | (Type::BoolWrapper, Type::Bool)
        | (Type::Int, Type::IntWrapper)
        | (Type::IntWrapper, Type::Int)
        | (Type::Uint, Type::UintWrapper)
        | (Type::UintWrapper, Type::Uint)
        | (Type::Double, Type::DoubleWrapper)
        | (Type::DoubleWrapper, Type::Double)
        | (Type::String, Type::StringWrapper)
        | (Type::StringWrapper, Type::String)
        | (Type::Bytes, Type::BytesWrapper)
        | (Type::BytesWrapper, Type::Bytes) => true,
        (Type::Null, to) if to.is_wrapper() => true,
        (Type::Null, Type::Any) => true,
        (Type::List(from_elem), Type::List(to_elem)) => {
            assignable(substitution, from_elem, to_elem)
        }
        (Type::Map(from_key, from_value), Type::Map(to_key, to_value)) => {
            assignable(substitution, from_key, to_key)
                && assignable(substitution, from_value, to_value)
        }
        (Type::Opaque(from_opaque), Type::Opaque(to_opaque))
            if from_opaque.name == to_opaque.name
                && from_opaque.params.len() == to_opaque.params.len() =>
        {
            from_opaque
                .params
                .iter()
                .zip(&to_opaque.params)
                .all(|(f, t)| assignable(substitution, f, t))
        }
        (Type::Type(from_param), Type::Type(to_param)) => match (from_param, to_param) {
            (Some(f), Some(t)) => assignable(substitution, f, t),
            _ => true,
        },
        _ => false,
    }
}

fn substitute(substitution: &Substitution, ty: &Type, free_to_dyn: bool) -> Type {
    let resolved = resolve(substitution, ty);
    match resolved {
        Type::TypeParam(_) => {
            if free_to_dyn {
                Type::Dyn
            } else {
                resolved.clone()
            }
        }
        Type::List(elem) => Type::list(substitute(substitution, elem, free_to_dyn)),
        Type::Map(key, value) => Type::map(
            substitute(substitution, key, free_to_dyn),
            substitute(substitution, value, free_to_dyn),
        ),
        Type::Opaque(o) => Type::Opaque(OpaqueType {
            name: o.name.clone(),
            params: o
                .params
                .iter()
                .map(|p| substitute(substitution, p, free_to_dyn))
                .collect(),
        }),
        Type::Type(Some(param)) => Type::type_of(substitute(substitution, param, free_to_dyn)),
        _ => resolved.clone(),
    }
}

//! Converter validation.
//!
//! Converters are declared once per unit rather than per mapping, so these
//! checks run over the whole analyzed set and anchor at the converter's own
//! declaration.

use super::Finding;
use crate::descriptors::{
    CONVERTER_NULL_HANDLING, INVALID_CONVERTER_IMPLEMENTATION, UNUSED_CONVERTER,
};
use crate::index::MappingIndex;
use crate::shape::{ShapeArena, TypeDescriptor};
use mapcheck_core::LineIndex;
use mapcheck_types::{
    BinaryOp, CompilationUnit, Expr, Literal, Location, MethodDef, Pattern, Stmt, TypeEnv, TypeId,
};
use std::collections::{HashSet, VecDeque};

pub const TYPE_CONVERTER: &str = "AutoMapper.ITypeConverter";
pub const VALUE_CONVERTER: &str = "AutoMapper.IValueConverter";

/// The converter interface a type implements.
struct Contract {
    interface: TypeId,
    source: TypeId,
    destination: TypeId,
    /// Parameter count of `Convert`: `(source, destination, context)` for type
    /// converters, `(sourceMember, context)` for value converters.
    arity: usize,
}

pub fn check_converters(
    env: &dyn TypeEnv,
    units: &[CompilationUnit],
    index: &MappingIndex,
) -> Vec<(Location, Finding)> {
    let mut arena = ShapeArena::new(env);
    let mut out = Vec::new();
    for unit in units {
        if unit.converters.is_empty() {
            continue;
        }
        let line_index = LineIndex::new(&unit.text);
        for converter in &unit.converters {
            let Some(def) = env.type_def(converter.ty) else {
                tracing::debug!(
                    target: "mapcheck.automapper",
                    ty = ?converter.ty,
                    "skipping converter with unknown type"
                );
                continue;
            };
            let location = Location {
                file: unit.file,
                range: converter.range,
                line_col: line_index.line_col(converter.range.start()),
            };
            let name = env.display(converter.ty);

            match find_contract(env, converter.ty) {
                None => out.push((
                    location,
                    Finding::new(
                        &INVALID_CONVERTER_IMPLEMENTATION,
                        vec![
                            name.clone(),
                            "ITypeConverter<TSource, TDestination> or IValueConverter<TSourceMember, TDestinationMember>"
                                .to_string(),
                        ],
                    ),
                )),
                Some(contract) => match find_convert_method(env, converter.ty, &contract) {
                    None => out.push((
                        location,
                        Finding::new(
                            &INVALID_CONVERTER_IMPLEMENTATION,
                            vec![name.clone(), env.display(contract.interface)],
                        ),
                    )),
                    Some(method) => {
                        if let Some(param) = method.params.first() {
                            let nullable = param.ty.annotated_nullable
                                || matches!(
                                    arena.describe(contract.source),
                                    TypeDescriptor::Nullable(_) | TypeDescriptor::String
                                );
                            let unguarded = method
                                .body
                                .as_deref()
                                .is_some_and(|body| first_access(&param.name, body) == Some(Access::Deref));
                            if nullable && unguarded {
                                out.push((
                                    location,
                                    Finding::new(
                                        &CONVERTER_NULL_HANDLING,
                                        vec![name.clone(), env.display_ref(param.ty)],
                                    ),
                                ));
                            }
                        }
                    }
                },
            }

            if !index.is_converter_referenced(&def.name) {
                out.push((location, Finding::new(&UNUSED_CONVERTER, vec![name])));
            }
        }
    }
    out
}

fn find_contract(env: &dyn TypeEnv, ty: TypeId) -> Option<Contract> {
    let mut queue = VecDeque::from([ty]);
    let mut visited = HashSet::new();
    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        let Some(def) = env.type_def(current) else {
            continue;
        };
        let arity = match def.generic_definition.as_deref() {
            Some(TYPE_CONVERTER) => Some(3),
            Some(VALUE_CONVERTER) => Some(2),
            _ => None,
        };
        if let (Some(arity), [source, destination]) = (arity, def.type_args.as_slice()) {
            return Some(Contract {
                interface: current,
                source: *source,
                destination: *destination,
                arity,
            });
        }
        queue.extend(def.interfaces.iter().copied());
        queue.extend(def.base);
    }
    None
}

/// `Convert` with the contract's arity, taking the source type and returning
/// the destination type, on the converter or one of its base classes.
fn find_convert_method<'e>(
    env: &'e dyn TypeEnv,
    ty: TypeId,
    contract: &Contract,
) -> Option<&'e MethodDef> {
    let mut visited = HashSet::new();
    let mut current = Some(ty);
    while let Some(id) = current {
        if !visited.insert(id) {
            break;
        }
        let def = env.type_def(id)?;
        let found = def.methods.iter().find(|method| {
            method.name == "Convert"
                && !method.is_static
                && method.params.len() == contract.arity
                && method.params[0].ty.id == contract.source
                && method.return_type.map(|ret| ret.id) == Some(contract.destination)
        });
        if found.is_some() {
            return found;
        }
        current = def.base;
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Guard,
    Deref,
}

/// Whether the body checks `param` for null before dereferencing it, in
/// evaluation order.
fn first_access(param: &str, body: &[Stmt]) -> Option<Access> {
    let mut first = None;
    for stmt in body {
        stmt.walk(&mut |expr| {
            if first.is_none() {
                first = classify_access(param, expr);
            }
        });
        if first.is_some() {
            break;
        }
    }
    first
}

fn is_param(expr: &Expr, param: &str) -> bool {
    matches!(expr, Expr::Name(name) if name == param)
}

fn is_null(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal(Literal::Null))
}

fn classify_access(param: &str, expr: &Expr) -> Option<Access> {
    match expr {
        Expr::Binary {
            op: BinaryOp::Eq | BinaryOp::NotEq,
            lhs,
            rhs,
        } if (is_param(lhs, param) && is_null(rhs)) || (is_null(lhs) && is_param(rhs, param)) => {
            Some(Access::Guard)
        }
        Expr::Binary {
            op: BinaryOp::Coalesce,
            lhs,
            ..
        } if is_param(lhs, param) => Some(Access::Guard),
        Expr::Is {
            expr,
            pattern: Pattern::Null | Pattern::NotNull,
        } if is_param(expr, param) => Some(Access::Guard),
        Expr::Member {
            receiver,
            name,
            conditional,
        } if is_param(receiver, param) => {
            if *conditional || name == "HasValue" {
                Some(Access::Guard)
            } else {
                Some(Access::Deref)
            }
        }
        Expr::Call {
            receiver,
            method,
            args,
            conditional,
            ..
        } => {
            let passes_param = args.first().is_some_and(|arg| is_param(arg, param));
            match method.as_str() {
                "IsNullOrEmpty" | "IsNullOrWhiteSpace" | "ThrowIfNull" if passes_param => {
                    return Some(Access::Guard)
                }
                "Parse" | "ParseExact" if passes_param => return Some(Access::Deref),
                _ => {}
            }
            match receiver.as_deref() {
                Some(receiver) if is_param(receiver, param) => {
                    if *conditional || method == "GetValueOrDefault" {
                        Some(Access::Guard)
                    } else {
                        Some(Access::Deref)
                    }
                }
                _ => None,
            }
        }
        _ => None,
    }
}

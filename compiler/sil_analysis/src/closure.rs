//! Closure matching.
//!
//! Finds the `partial_apply` that created a closure passed as an argument,
//! looking through the wrappers SILGen puts around closures: optional
//! payloads, function conversions, copies, borrows, and reabstraction
//! thunks that adapt a closure to a different calling convention.

use rustc_hash::FxHashSet;
use sil_ir::{Function, InstEffects, InstId, InstKind, Module, ThunkKind, TypeShape, ValueId};

use crate::strip::{look_through, strip_convert_functions, strip_while};

/// Result of [`find_closure_for_applied_arg`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FindClosureResult {
    /// The closure-creating `partial_apply`, if one was found.
    pub partial_apply: Option<InstId>,
    /// `true` if the closure was found behind at least one reabstraction
    /// thunk.
    pub is_reabstraction_thunk: bool,
}

/// If `pai` is a `partial_apply` of a reabstraction thunk, return the
/// closure it adapts.
///
/// Requires exactly one captured argument, and that argument must be
/// function-typed.
pub fn is_partial_apply_of_reabstraction_thunk(
    module: &Module,
    func: &Function,
    pai: InstId,
) -> Option<ValueId> {
    let inst = func.inst(pai);
    if !inst.effects().contains(InstEffects::PARTIAL_APPLY) {
        return None;
    }
    let &[callee_ref, captured] = inst.operands.as_slice() else {
        return None;
    };
    let InstKind::FunctionRef { callee } = func.producer_kind(callee_ref)? else {
        return None;
    };
    if module.decl(callee).thunk != ThunkKind::ReabstractionThunk {
        return None;
    }
    func.value_type(captured).is_function().then_some(captured)
}

/// Strip the wrappers between an applied argument and its closure.
fn strip_closure_wrappers(func: &Function, value: ValueId) -> ValueId {
    let value = match func.producer(value) {
        Some(inst)
            if matches!(inst.kind, InstKind::Enum { .. })
                && func.value_type(value).shape == TypeShape::Optional =>
        {
            inst.operand(0).unwrap_or(value)
        }
        _ => value,
    };
    strip_while(func, value, "find_closure_for_applied_arg", |v| {
        let converted = strip_convert_functions(func, v);
        if converted == v {
            look_through(func, v, |inst| {
                matches!(inst.kind, InstKind::CopyValue | InstKind::BeginBorrow)
            })
        } else {
            Some(converted)
        }
    })
}

/// Find the `partial_apply` that created the closure `value`.
///
/// If the closure is a reabstraction thunk around another closure, the
/// inner closure is returned instead, with `is_reabstraction_thunk` set.
/// A thunk around something that is not a closure is returned as is.
pub fn find_closure_for_applied_arg(
    module: &Module,
    func: &Function,
    value: ValueId,
) -> FindClosureResult {
    let mut result = FindClosureResult::default();
    let mut seen = FxHashSet::default();
    let mut current = value;

    loop {
        let stripped = strip_closure_wrappers(func, current);
        let Some(pai) = func
            .defining_inst(stripped)
            .filter(|&id| func.inst(id).effects().contains(InstEffects::PARTIAL_APPLY))
        else {
            break;
        };
        if !seen.insert(pai) {
            panic!(
                "find_closure_for_applied_arg: thunk cycle through {pai:?} in function {:?}",
                func.name(),
            );
        }
        if result.partial_apply.is_some() {
            result.is_reabstraction_thunk = true;
        }
        result.partial_apply = Some(pai);

        match is_partial_apply_of_reabstraction_thunk(module, func, pai) {
            Some(inner) => current = inner,
            None => break,
        }
    }

    tracing::trace!(
        value = ?value,
        partial_apply = ?result.partial_apply,
        thunk = result.is_reabstraction_thunk,
        "closure match"
    );
    result
}

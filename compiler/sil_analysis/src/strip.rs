//! Value and address stripping.
//!
//! Every function here reduces a value to a canonical root by repeatedly
//! replacing it with operand 0 of its producer while the producer belongs to
//! some set of transparent kinds. They are total: a value with nothing to
//! strip is returned unchanged.
//!
//! # Termination
//!
//! Fixpoint loops rely on the transparent-producer relation being acyclic,
//! which holds for any function reachable from its entry block. Unreachable
//! blocks can still form argument cycles (`bb1(%a): br bb2(%a)`,
//! `bb2(%b): br bb1(%b)`), so each loop is bounded by the function's value
//! count and panics past it: a longer walk must revisit a value.
//!
//! # Families
//!
//! | Function                              | Looks through                            | Block args |
//! |---------------------------------------|------------------------------------------|------------|
//! | [`strip_casts`]                       | `CAST` kinds                             | yes        |
//! | [`strip_casts_without_mark_dependence`] | `CAST` minus `mark_dependence`         | yes        |
//! | [`strip_upcasts`]                     | `upcast`                                 | yes        |
//! | [`strip_class_casts`]                 | `upcast`, `unconditional_checked_cast`   | no         |
//! | [`strip_address_projections`]         | address projections                      | yes        |
//! | [`strip_value_projections`]           | aggregate extraction                     | yes        |
//! | [`strip_indexing_insts`]              | index arithmetic                         | no         |
//! | [`strip_convert_functions`]           | function conversions                     | no         |
//! | [`underlying_object`]                 | everything transparent                   | yes        |

use sil_ir::{Function, Inst, InstEffects, InstId, InstKind, ValueDef, ValueId};

/// Bounds a fixpoint walk by the function's value count.
struct StepBudget<'f> {
    func: &'f Function,
    remaining: usize,
    what: &'static str,
}

impl<'f> StepBudget<'f> {
    fn new(func: &'f Function, what: &'static str) -> Self {
        Self {
            func,
            remaining: func.num_values(),
            what,
        }
    }

    #[inline]
    fn step(&mut self, from: ValueId) {
        if self.remaining == 0 {
            panic!(
                "{}: transparent producer cycle through {:?} in function {:?}",
                self.what,
                from,
                self.func.name(),
            );
        }
        self.remaining -= 1;
    }
}

/// Repeatedly apply `step` until it yields nothing new.
pub(crate) fn strip_while(
    func: &Function,
    value: ValueId,
    what: &'static str,
    mut step: impl FnMut(ValueId) -> Option<ValueId>,
) -> ValueId {
    let mut budget = StepBudget::new(func, what);
    let mut value = value;
    while let Some(next) = step(value) {
        if next == value {
            break;
        }
        budget.step(value);
        value = next;
    }
    value
}

/// Operand 0 of `value`'s producer, if the producer satisfies `pred`.
#[inline]
pub(crate) fn look_through(
    func: &Function,
    value: ValueId,
    pred: impl FnOnce(&Inst) -> bool,
) -> Option<ValueId> {
    let inst = func.producer(value)?;
    if pred(inst) {
        inst.operand(0)
    } else {
        None
    }
}

/// One step of [`strip_single_predecessor_args`].
fn single_predecessor_incoming(func: &Function, value: ValueId) -> Option<ValueId> {
    let ValueDef::BlockArg { block, index } = func.value(value).def else {
        return None;
    };
    let pred = func.single_predecessor(block)?;
    func.block(pred)
        .terminator
        .incoming_value(block, index as usize)
}

/// Strip with `pred`, stripping single-predecessor block arguments before
/// every test.
fn strip_with_args(
    func: &Function,
    value: ValueId,
    what: &'static str,
    pred: impl Fn(&Inst) -> bool,
) -> ValueId {
    strip_while(func, value, what, |v| {
        single_predecessor_incoming(func, v).or_else(|| look_through(func, v, &pred))
    })
}

/// Strip with `pred` alone.
fn strip_plain(
    func: &Function,
    value: ValueId,
    what: &'static str,
    pred: impl Fn(&Inst) -> bool,
) -> ValueId {
    strip_while(func, value, what, |v| look_through(func, v, &pred))
}

/// Returns `true` if `inst` projects a sub-location out of its operand.
///
/// `index_addr` counts only when its index is a constant: a dynamic index
/// does not name a fixed sub-location.
pub fn is_address_projection(func: &Function, inst: &Inst) -> bool {
    if inst.effects().contains(InstEffects::ADDRESS_PROJECTION) {
        return true;
    }
    inst.kind == InstKind::IndexAddr
        && inst
            .operand(1)
            .is_some_and(|index| func.integer_literal(index).is_some())
}

/// Returns `true` if `inst`'s result has the same category as operand 0.
fn preserves_category(func: &Function, inst: &Inst) -> bool {
    match (inst.operand(0), inst.single_result()) {
        (Some(operand), Some(result)) => {
            func.value_type(operand).category == func.value_type(result).category
        }
        _ => false,
    }
}

/// Returns `true` if [`underlying_object`] looks through `inst`.
///
/// With `through_dependence == false`, `mark_dependence` is opaque.
pub fn is_transparent(func: &Function, inst: &Inst, through_dependence: bool) -> bool {
    let effects = inst.effects();
    if !through_dependence && effects.contains(InstEffects::DEPENDENCE_MARK) {
        return false;
    }
    effects.intersects(
        InstEffects::CAST
            | InstEffects::INDEXING
            | InstEffects::VALUE_PROJECTION
            | InstEffects::BORROW_BEGIN
            | InstEffects::CONVERT_FUNCTION
            | InstEffects::EXPECT_INTRINSIC,
    ) || is_address_projection(func, inst)
}

// ── Underlying objects ──────────────────────────────────────────────

/// Strip off casts, indexing, projections, borrows, function conversions
/// and expect hints until there is nothing left to strip.
pub fn underlying_object(func: &Function, value: ValueId) -> ValueId {
    strip_with_args(func, value, "underlying_object", |inst| {
        is_transparent(func, inst, true)
    })
}

/// Like [`underlying_object`], but never steps to an operand of a different
/// category. An address always yields an address.
pub fn underlying_address_root(func: &Function, value: ValueId) -> ValueId {
    strip_with_args(func, value, "underlying_address_root", |inst| {
        is_transparent(func, inst, true) && preserves_category(func, inst)
    })
}

/// Like [`underlying_object`], but stops at `mark_dependence`.
pub fn underlying_object_stop_at_mark_dependence(func: &Function, value: ValueId) -> ValueId {
    strip_with_args(
        func,
        value,
        "underlying_object_stop_at_mark_dependence",
        |inst| is_transparent(func, inst, false),
    )
}

// ── Block arguments ─────────────────────────────────────────────────

/// While `value` is an argument of a block with a single predecessor that
/// passes exactly one value into it, replace it with that value.
pub fn strip_single_predecessor_args(func: &Function, value: ValueId) -> ValueId {
    strip_while(func, value, "strip_single_predecessor_args", |v| {
        single_predecessor_incoming(func, v)
    })
}

// ── Casts ───────────────────────────────────────────────────────────

/// Strip off all casts, including `mark_dependence`.
pub fn strip_casts(func: &Function, value: ValueId) -> ValueId {
    strip_with_args(func, value, "strip_casts", |inst| {
        inst.effects().contains(InstEffects::CAST)
    })
}

/// Strip off all casts except `mark_dependence`.
pub fn strip_casts_without_mark_dependence(func: &Function, value: ValueId) -> ValueId {
    strip_with_args(func, value, "strip_casts_without_mark_dependence", |inst| {
        let effects = inst.effects();
        effects.contains(InstEffects::CAST) && !effects.contains(InstEffects::DEPENDENCE_MARK)
    })
}

/// Strip off upcasts only.
pub fn strip_upcasts(func: &Function, value: ValueId) -> ValueId {
    strip_with_args(func, value, "strip_upcasts", |inst| {
        inst.effects().contains(InstEffects::UPCAST)
    })
}

/// Strip off class upcasts and checked downcasts.
pub fn strip_class_casts(func: &Function, value: ValueId) -> ValueId {
    strip_plain(func, value, "strip_class_casts", |inst| {
        inst.effects().contains(InstEffects::CLASS_CAST)
    })
}

// ── Projections and indexing ────────────────────────────────────────

/// Strip off all address projections.
pub fn strip_address_projections(func: &Function, value: ValueId) -> ValueId {
    strip_with_args(func, value, "strip_address_projections", |inst| {
        is_address_projection(func, inst)
    })
}

/// Strip off address projections that have a single operand.
pub fn strip_unary_address_projections(func: &Function, value: ValueId) -> ValueId {
    strip_with_args(func, value, "strip_unary_address_projections", |inst| {
        inst.operands.len() == 1 && is_address_projection(func, inst)
    })
}

/// Strip off aggregate projections (`struct_extract`, `tuple_extract`,
/// `unchecked_enum_data`).
pub fn strip_value_projections(func: &Function, value: ValueId) -> ValueId {
    strip_with_args(func, value, "strip_value_projections", |inst| {
        inst.effects().contains(InstEffects::VALUE_PROJECTION)
    })
}

/// Strip off indexing instructions, returning the base.
pub fn strip_indexing_insts(func: &Function, value: ValueId) -> ValueId {
    strip_plain(func, value, "strip_indexing_insts", |inst| {
        inst.effects().contains(InstEffects::INDEXING)
    })
}

// ── Single-step unwraps ─────────────────────────────────────────────

/// If `value` is a `builtin "int_expect"`, return the hinted value.
pub fn strip_expect_intrinsic(func: &Function, value: ValueId) -> ValueId {
    look_through(func, value, |inst| {
        inst.effects().contains(InstEffects::EXPECT_INTRINSIC)
    })
    .unwrap_or(value)
}

/// If `value` is a `begin_borrow`, return the borrowed value.
pub fn strip_borrow(func: &Function, value: ValueId) -> ValueId {
    look_through(func, value, |inst| {
        inst.effects().contains(InstEffects::BORROW_BEGIN)
    })
    .unwrap_or(value)
}

/// Strip off `convert_function` and `convert_escape_to_noescape`.
pub fn strip_convert_functions(func: &Function, value: ValueId) -> ValueId {
    strip_plain(func, value, "strip_convert_functions", |inst| {
        inst.effects().contains(InstEffects::CONVERT_FUNCTION)
    })
}

// ── Copies ──────────────────────────────────────────────────────────

/// Returns the result of `inst` if it merely copies a value, possibly
/// changing its type or ownership, with no other effect.
///
/// Use-walkers recurse into this result when checking that a value is only
/// used in recognizable patterns.
pub fn single_value_copy_or_cast(func: &Function, inst: InstId) -> Option<ValueId> {
    let inst = func.inst(inst);
    if inst.effects().contains(InstEffects::COPY_OR_CAST) {
        inst.single_result()
    } else {
        None
    }
}

#[cfg(test)]
mod tests;

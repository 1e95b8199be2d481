//! Access-base resolution.
//!
//! An access base is the storage location an address ultimately refers to:
//! a stack slot, a global, a class property, a box, or an address argument.
//! Exclusivity enforcement places access markers on formal accesses to
//! such bases, but not on addresses that only exist to initialize a value
//! in place, nor on storage reached through a raw pointer.

use sil_ir::{Function, InstEffects, InstKind, Operand, StoreOwnership, User, ValueId};

use crate::strip::{look_through, strip_while, underlying_address_root};
use crate::uses::{walk_transitive_uses, LookThrough};

/// Find the base of the storage `addr` refers to.
///
/// Looks through everything [`underlying_address_root`] does, plus
/// `begin_access`. Returns `None` if the base is part of an
/// initialization sequence.
pub fn find_accessed_address_base(func: &Function, addr: ValueId) -> Option<ValueId> {
    let base = strip_while(func, addr, "find_accessed_address_base", |v| {
        let root = underlying_address_root(func, v);
        if root == v {
            look_through(func, v, |inst| {
                matches!(inst.kind, InstKind::BeginAccess { .. })
            })
        } else {
            Some(root)
        }
    });

    if is_initialization_sequence(func, base) {
        tracing::trace!(addr = ?addr, base = ?base, "access base is an initialization sequence");
        return None;
    }
    Some(base)
}

/// Returns `true` if `base` may be the target of a formal access.
///
/// Unrecognized bases answer `true`.
pub fn is_possible_formal_access_base(func: &Function, base: ValueId) -> bool {
    if func.is_function_arg(base) {
        return func.value_type(base).is_address();
    }
    let Some(inst) = func.producer(base) else {
        // Arguments of non-entry blocks.
        return true;
    };
    if inst.effects().contains(InstEffects::LOCAL_INIT_ONLY) {
        return false;
    }
    match inst.kind {
        InstKind::GlobalAddr { .. }
        | InstKind::RefElementAddr { .. }
        | InstKind::RefTailAddr
        | InstKind::ProjectBox => true,
        InstKind::PointerToAddress => false,
        InstKind::AllocStack => is_captured(func, base),
        InstKind::MarkUninitialized if is_stack_slot(func, base) => is_captured(func, base),
        _ => true,
    }
}

/// Returns `true` if accesses through `addr` need an access marker.
pub fn needs_access_marker(func: &Function, addr: ValueId) -> bool {
    find_accessed_address_base(func, addr)
        .is_some_and(|base| is_possible_formal_access_base(func, base))
}

/// An `alloc_stack`, optionally behind `mark_uninitialized`.
fn is_stack_slot(func: &Function, value: ValueId) -> bool {
    match func.producer(value) {
        Some(inst) => match inst.kind {
            InstKind::AllocStack => true,
            InstKind::MarkUninitialized => inst
                .operand(0)
                .is_some_and(|slot| func.producer_kind(slot) == Some(InstKind::AllocStack)),
            _ => false,
        },
        None => false,
    }
}

fn is_initialization_sequence(func: &Function, base: ValueId) -> bool {
    if func
        .producer(base)
        .is_some_and(|inst| inst.effects().contains(InstEffects::LOCAL_INIT_ONLY))
    {
        return true;
    }
    is_stack_slot(func, base) && is_only_initialized(func, base)
}

/// The slot's only non-incidental use is a single initializing store.
fn is_only_initialized(func: &Function, slot: ValueId) -> bool {
    let uses = walk_transitive_uses(func, slot, LookThrough::CopiesAndCasts);
    if !uses.ref_count.is_empty() {
        return false;
    }
    match uses.escaping.as_slice() {
        [store] => is_initializing_store(func, *store),
        _ => false,
    }
}

fn is_initializing_store(func: &Function, operand: Operand) -> bool {
    let User::Inst(id) = operand.user else {
        return false;
    };
    // Operand 1 is the destination of both `store` and `copy_addr`.
    operand.index == 1
        && matches!(
            func.inst(id).kind,
            InstKind::Store {
                ownership: StoreOwnership::Init | StoreOwnership::Unqualified,
            } | InstKind::CopyAddr {
                initialize: true,
                ..
            }
        )
}

/// The slot's address reaches a closure capture.
fn is_captured(func: &Function, slot: ValueId) -> bool {
    let captured = walk_transitive_uses(func, slot, LookThrough::CopiesCastsAndProjections)
        .escaping_insts(func)
        .any(|inst| inst.effects().contains(InstEffects::PARTIAL_APPLY));
    tracing::trace!(slot = ?slot, captured, "stack slot capture check");
    captured
}

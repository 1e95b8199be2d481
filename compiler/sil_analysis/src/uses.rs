//! Use classification.
//!
//! Two independent predicates classify a single user:
//!
//! - [`is_incidental_use`]: scope ends, debug info and lifetime markers.
//!   They neither read nor write the value and never make it escape.
//! - [`only_affects_ref_count`]: retains, releases and destroys.
//!
//! No instruction satisfies both. [`walk_transitive_uses`] applies them to
//! every use reachable through copies and casts.

use rustc_hash::FxHashSet;
use sil_ir::{Function, Inst, InstEffects, Operand, User, ValueId};
use smallvec::{smallvec, SmallVec};

use crate::strip::{is_address_projection, single_value_copy_or_cast};

/// Returns `true` if `inst` is a use that does not affect the used value:
/// `end_borrow`, `end_access`, `debug_value`, `debug_value_addr`,
/// `end_lifetime`, `fix_lifetime` or `dealloc_stack`.
pub fn is_incidental_use(inst: &Inst) -> bool {
    inst.results.is_empty() && inst.effects().contains(InstEffects::INCIDENTAL)
}

/// Returns `true` if `inst` only changes a reference count or destroys the
/// used value, producing nothing.
pub fn only_affects_ref_count(inst: &Inst) -> bool {
    inst.results.is_empty() && inst.effects().contains(InstEffects::REFCOUNT_ONLY)
}

/// Which users [`walk_transitive_uses`] follows into their results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookThrough {
    /// Copies, casts, borrows and access scopes
    /// (see [`single_value_copy_or_cast`]).
    CopiesAndCasts,
    /// As above, plus address projections of the walked value.
    CopiesCastsAndProjections,
}

/// All uses reachable from a root value, partitioned by kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitiveUses {
    /// Uses by incidental instructions.
    pub incidental: Vec<Operand>,
    /// Uses by refcount-only instructions.
    pub ref_count: Vec<Operand>,
    /// Every other use, terminator operands included.
    pub escaping: Vec<Operand>,
    /// The root and every value derived from it through followed users,
    /// in visit order.
    pub reached: Vec<ValueId>,
}

impl TransitiveUses {
    #[inline]
    pub fn has_escaping_use(&self) -> bool {
        !self.escaping.is_empty()
    }

    /// Escaping uses that are instruction operands.
    pub fn escaping_insts<'f>(&'f self, func: &'f Function) -> impl Iterator<Item = &'f Inst> + 'f {
        self.escaping.iter().filter_map(|operand| match operand.user {
            User::Inst(id) => Some(func.inst(id)),
            User::Terminator(_) => None,
        })
    }
}

/// The value a use forwards the walk into, if `look` follows it.
fn forwarded(func: &Function, operand: Operand, look: LookThrough) -> Option<ValueId> {
    let User::Inst(id) = operand.user else {
        return None;
    };
    // Only the forwarded operand is a copy of the walked value; an index or
    // dependence base is not.
    if operand.index != 0 {
        return None;
    }
    if let Some(result) = single_value_copy_or_cast(func, id) {
        return Some(result);
    }
    let inst = func.inst(id);
    match look {
        LookThrough::CopiesCastsAndProjections if is_address_projection(func, inst) => {
            inst.single_result()
        }
        _ => None,
    }
}

/// Collect every use of `root`, recursing into the results of the users
/// `look` follows.
///
/// Followed users are not reported themselves. Each value is visited once,
/// so the walk terminates even on cyclic copy chains in unreachable code.
pub fn walk_transitive_uses(func: &Function, root: ValueId, look: LookThrough) -> TransitiveUses {
    let mut result = TransitiveUses::default();
    let mut visited = FxHashSet::default();
    let mut worklist: SmallVec<[ValueId; 8]> = smallvec![root];
    visited.insert(root);

    while let Some(value) = worklist.pop() {
        result.reached.push(value);
        for &operand in func.uses(value) {
            if let Some(next) = forwarded(func, operand, look) {
                if visited.insert(next) {
                    worklist.push(next);
                }
                continue;
            }
            let bucket = match operand.user {
                User::Inst(id) if is_incidental_use(func.inst(id)) => &mut result.incidental,
                User::Inst(id) if only_affects_ref_count(func.inst(id)) => &mut result.ref_count,
                User::Inst(_) | User::Terminator(_) => &mut result.escaping,
            };
            bucket.push(operand);
        }
    }

    tracing::trace!(
        root = ?root,
        reached = result.reached.len(),
        escaping = result.escaping.len(),
        "walked transitive uses"
    );
    result
}

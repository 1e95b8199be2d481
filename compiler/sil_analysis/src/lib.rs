//! Instruction utilities for the SIL optimizer.
//!
//! Optimization passes, alias analyses and ownership verifiers keep asking
//! the same questions about SSA values. This crate answers them once:
//!
//! - **Stripping** ([`strip`]): reduce a value to a canonical root by
//!   looking through casts, projections, indexing, borrows, function
//!   conversions and expect hints. Every stripper is total and idempotent.
//!
//! - **Access bases** ([`access`]): find the storage an address refers to
//!   and decide whether it needs dynamic exclusivity enforcement.
//!
//! - **Closures** ([`closure`]): find the `partial_apply` behind a value
//!   passed to an apply, seeing through reabstraction thunks.
//!
//! - **Uses** ([`uses`]): classify users as incidental or refcount-only, and
//!   walk all transitive uses of a value through copies.
//!
//! - **Ownership** ([`ownership`]): classify a function as
//!   ownership-qualified or not, reporting functions that mix both.
//!
//! # Crate Dependencies
//!
//! Depends only on `sil_ir` for the data model. Everything here is a pure
//! query over an immutable `&Function`, except the ownership evaluator,
//! which owns its per-function state.

pub mod access;
pub mod closure;
pub mod ownership;
pub mod strip;
pub mod uses;

pub use access::{find_accessed_address_base, is_possible_formal_access_base, needs_access_marker};
pub use closure::{
    find_closure_for_applied_arg, is_partial_apply_of_reabstraction_thunk, FindClosureResult,
};
pub use ownership::{
    evaluate_function, FunctionOwnership, FunctionOwnershipEvaluator, OwnershipError,
    OwnershipQualifiedKind,
};
pub use strip::{
    single_value_copy_or_cast, strip_address_projections, strip_borrow, strip_casts,
    strip_casts_without_mark_dependence, strip_class_casts, strip_convert_functions,
    strip_expect_intrinsic, strip_indexing_insts, strip_single_predecessor_args,
    strip_unary_address_projections, strip_upcasts, strip_value_projections, underlying_address_root,
    underlying_object, underlying_object_stop_at_mark_dependence,
};
pub use uses::{
    is_incidental_use, only_affects_ref_count, walk_transitive_uses, LookThrough, TransitiveUses,
};

#[cfg(test)]
mod test_helpers;

//! Shared test utilities for the instruction utilities.
//!
//! Only compiled in test builds.

use sil_ir::{
    Function, FunctionBuilder, InstKind, Name, SilType, StoreOwnership, Terminator, TypeShape,
    ValueId,
};

/// A class reference.
pub(crate) fn class() -> SilType {
    SilType::object(TypeShape::Class)
}

/// A trivial object (integers, booleans).
pub(crate) fn trivial() -> SilType {
    SilType::object(TypeShape::Trivial)
}

/// A function value.
pub(crate) fn function_ty() -> SilType {
    SilType::object(TypeShape::Function)
}

/// The address of an aggregate.
pub(crate) fn aggregate_addr() -> SilType {
    SilType::address(TypeShape::Aggregate)
}

/// A builder for a function with a default name (`Name::from_raw(1)`).
pub(crate) fn builder() -> FunctionBuilder {
    FunctionBuilder::new(Name::from_raw(1))
}

/// Terminate the current block with `unreachable` and finish the body.
pub(crate) fn finish(mut b: FunctionBuilder) -> Function {
    b.terminate(Terminator::Unreachable);
    b.finish().unwrap_or_else(|e| panic!("malformed test function: {e}"))
}

/// Push a single-operand instruction whose result has the operand's type.
pub(crate) fn unary(b: &mut FunctionBuilder, kind: InstKind, operand: ValueId) -> ValueId {
    let ty = b.value_type(operand);
    b.push_value(kind, &[operand], ty)
}

/// Push an `integer_literal`.
pub(crate) fn literal(b: &mut FunctionBuilder, value: i64) -> ValueId {
    b.push_value(InstKind::IntegerLiteral { value }, &[], trivial())
}

/// Push `store [init] value to dest`.
pub(crate) fn store_init(b: &mut FunctionBuilder, value: ValueId, dest: ValueId) {
    b.push_void(
        InstKind::Store {
            ownership: StoreOwnership::Init,
        },
        &[value, dest],
    );
}

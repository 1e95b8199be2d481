use pretty_assertions::assert_eq;
use sil_ir::{
    AccessKind, BuiltinKind, FunctionBuilder, InstKind, SilType, Terminator, TypeShape,
};

use crate::test_helpers::{aggregate_addr, builder, class, finish, function_ty, literal, unary};

use super::*;

// ── Casts ───────────────────────────────────────────────────────

#[test]
fn strip_casts_through_every_cast() {
    let mut b = builder();
    let root = b.push_value(InstKind::AllocRef, &[], class());
    let base = b.push_value(InstKind::AllocRef, &[], class());
    let up = unary(&mut b, InstKind::Upcast, root);
    let dep = b.push_value(InstKind::MarkDependence, &[up, base], class());
    let rc = unary(&mut b, InstKind::UncheckedRefCast, dep);
    let bridged = unary(&mut b, InstKind::RefToBridgeObject, rc);
    let back = unary(&mut b, InstKind::BridgeObjectToRef, bridged);
    let func = finish(b);

    assert_eq!(strip_casts(&func, back), root);
    assert_eq!(strip_casts_without_mark_dependence(&func, back), dep);
    assert_eq!(strip_casts(&func, root), root);
}

#[test]
fn strip_upcasts_stops_at_other_casts() {
    let mut b = builder();
    let root = b.push_value(InstKind::AllocRef, &[], class());
    let rc = unary(&mut b, InstKind::UncheckedRefCast, root);
    let up1 = unary(&mut b, InstKind::Upcast, rc);
    let up2 = unary(&mut b, InstKind::Upcast, up1);
    let func = finish(b);

    assert_eq!(strip_upcasts(&func, up2), rc);
    assert_eq!(strip_casts(&func, up2), root);
}

#[test]
fn strip_class_casts_through_up_and_down_casts() {
    let mut b = builder();
    let root = b.push_value(InstKind::AllocRef, &[], class());
    let rc = unary(&mut b, InstKind::UncheckedRefCast, root);
    let down = unary(&mut b, InstKind::UnconditionalCheckedCast, rc);
    let up = unary(&mut b, InstKind::Upcast, down);
    let func = finish(b);

    assert_eq!(strip_class_casts(&func, up), rc);
    assert_eq!(strip_upcasts(&func, up), down);
}

// ── Projections and indexing ────────────────────────────────────

#[test]
fn address_projections_including_constant_index() {
    let mut b = builder();
    let slot = b.push_value(InstKind::AllocStack, &[], aggregate_addr());
    let field = unary(&mut b, InstKind::StructElementAddr { field: 1 }, slot);
    let elt = unary(&mut b, InstKind::TupleElementAddr { index: 0 }, field);
    let zero = literal(&mut b, 0);
    let indexed = b.push_value(InstKind::IndexAddr, &[elt, zero], aggregate_addr());
    let func = finish(b);

    assert_eq!(strip_address_projections(&func, indexed), slot);
    // index_addr has two operands.
    assert_eq!(strip_unary_address_projections(&func, indexed), indexed);
    assert_eq!(strip_unary_address_projections(&func, elt), slot);
}

#[test]
fn dynamic_index_is_indexing_not_projection() {
    let mut b = builder();
    let dynamic = b.add_function_arg(SilType::object(TypeShape::Trivial));
    let slot = b.push_value(InstKind::AllocStack, &[], aggregate_addr());
    let indexed = b.push_value(InstKind::IndexAddr, &[slot, dynamic], aggregate_addr());
    let tail = b.push_value(InstKind::TailAddr, &[indexed, dynamic], aggregate_addr());
    let func = finish(b);

    assert_eq!(strip_address_projections(&func, indexed), indexed);
    assert_eq!(strip_indexing_insts(&func, tail), slot);
}

#[test]
fn ref_element_addr_changes_category() {
    let mut b = builder();
    let obj = b.push_value(InstKind::AllocRef, &[], class());
    let up = unary(&mut b, InstKind::Upcast, obj);
    let prop = b.push_value(InstKind::RefElementAddr { field: 0 }, &[up], aggregate_addr());
    let field = unary(&mut b, InstKind::StructElementAddr { field: 2 }, prop);
    let func = finish(b);

    assert_eq!(strip_address_projections(&func, field), up);
    assert_eq!(underlying_object(&func, field), obj);
    assert_eq!(underlying_address_root(&func, field), prop);
    assert!(func.value_type(underlying_address_root(&func, field)).is_address());
}

#[test]
fn value_projections() {
    let mut b = builder();
    let agg = b.add_function_arg(SilType::object(TypeShape::Aggregate));
    let inner = unary(&mut b, InstKind::StructExtract { field: 0 }, agg);
    let elt = unary(&mut b, InstKind::TupleExtract { index: 1 }, inner);
    let payload = unary(&mut b, InstKind::UncheckedEnumData { case: 0 }, elt);
    let func = finish(b);

    assert_eq!(strip_value_projections(&func, payload), agg);
    assert_eq!(strip_address_projections(&func, payload), payload);
}

// ── Single-step unwraps ─────────────────────────────────────────

#[test]
fn expect_intrinsic_unwraps_once() {
    let mut b = builder();
    let cond = b.add_function_arg(SilType::object(TypeShape::Trivial));
    let hint = literal(&mut b, 1);
    let expect = InstKind::Builtin {
        builtin: BuiltinKind::Expect,
    };
    let wrapped = b.push_value(expect, &[cond, hint], SilType::object(TypeShape::Trivial));
    let func = finish(b);

    assert_eq!(strip_expect_intrinsic(&func, wrapped), cond);
    assert_eq!(strip_expect_intrinsic(&func, cond), cond);
}

#[test]
fn borrow_unwraps_once() {
    let mut b = builder();
    let obj = b.add_function_arg(class());
    let outer = unary(&mut b, InstKind::BeginBorrow, obj);
    let nested = unary(&mut b, InstKind::BeginBorrow, outer);
    let func = finish(b);

    assert_eq!(strip_borrow(&func, nested), outer);
    assert_eq!(strip_borrow(&func, outer), obj);
    assert_eq!(underlying_object(&func, nested), obj);
}

#[test]
fn convert_functions_to_fixpoint() {
    let mut b = builder();
    let f = b.add_function_arg(function_ty());
    let c1 = unary(&mut b, InstKind::ConvertFunction, f);
    let c2 = unary(&mut b, InstKind::ConvertEscapeToNoEscape, c1);
    let c3 = unary(&mut b, InstKind::ConvertFunction, c2);
    let func = finish(b);

    assert_eq!(strip_convert_functions(&func, c3), f);
}

// ── Composite walks ─────────────────────────────────────────────

#[test]
fn underlying_object_through_everything() {
    let mut b = builder();
    let dynamic = b.add_function_arg(SilType::object(TypeShape::Trivial));
    let obj = b.push_value(InstKind::AllocRef, &[], class());
    let borrowed = unary(&mut b, InstKind::BeginBorrow, obj);
    let up = unary(&mut b, InstKind::Upcast, borrowed);
    let prop = b.push_value(InstKind::RefElementAddr { field: 0 }, &[up], aggregate_addr());
    let field = unary(&mut b, InstKind::StructElementAddr { field: 0 }, prop);
    let indexed = b.push_value(InstKind::IndexAddr, &[field, dynamic], aggregate_addr());
    let cast = unary(&mut b, InstKind::UncheckedAddrCast, indexed);
    let func = finish(b);

    assert_eq!(underlying_object(&func, cast), obj);
    assert_eq!(underlying_address_root(&func, cast), prop);
}

#[test]
fn mark_dependence_is_opaque_when_asked() {
    let mut b = builder();
    let obj = b.push_value(InstKind::AllocRef, &[], class());
    let owner = b.add_function_arg(class());
    let dep = b.push_value(InstKind::MarkDependence, &[obj, owner], class());
    let up = unary(&mut b, InstKind::Upcast, dep);
    let func = finish(b);

    assert_eq!(underlying_object(&func, up), obj);
    assert_eq!(underlying_object_stop_at_mark_dependence(&func, up), dep);
}

#[test]
fn raw_pointer_round_trip_is_opaque() {
    let mut b = builder();
    let slot = b.push_value(InstKind::AllocStack, &[], aggregate_addr());
    let ptr = b.push_value(
        InstKind::AddressToPointer,
        &[slot],
        SilType::object(TypeShape::RawPointer),
    );
    let addr = b.push_value(InstKind::PointerToAddress, &[ptr], aggregate_addr());
    let func = finish(b);

    assert_eq!(underlying_object(&func, addr), addr);
    let producer = func.producer(addr).unwrap_or_else(|| panic!("no producer"));
    assert!(!is_transparent(&func, producer, true));
}

// ── Block arguments ─────────────────────────────────────────────

/// bb0: br bb1(%obj)
/// bb1(%a): %up = upcast %a
fn single_predecessor_body() -> (Function, ValueId, ValueId, ValueId) {
    let mut b = builder();
    let bb1 = b.create_block();
    let obj = b.push_value(InstKind::AllocRef, &[], class());
    b.terminate(Terminator::Branch {
        target: bb1,
        args: vec![obj],
    });
    let a = b.add_block_arg(bb1, class());
    b.switch_to(bb1);
    let up = unary(&mut b, InstKind::Upcast, a);
    (finish(b), obj, a, up)
}

#[test]
fn single_predecessor_args_are_looked_through() {
    let (func, obj, a, up) = single_predecessor_body();
    assert_eq!(strip_single_predecessor_args(&func, a), obj);
    assert_eq!(strip_casts(&func, up), obj);
    assert_eq!(strip_upcasts(&func, up), obj);
    // Class casts and indexing do not look through block arguments.
    assert_eq!(strip_class_casts(&func, up), a);
    assert_eq!(underlying_object(&func, up), obj);
}

#[test]
fn merge_block_args_are_opaque() {
    let mut b = builder();
    let bb1 = b.create_block();
    let bb2 = b.create_block();
    let merge = b.create_block();
    let cond = literal(&mut b, 1);
    let x = b.push_value(InstKind::AllocRef, &[], class());
    b.terminate(Terminator::CondBranch {
        cond,
        true_target: bb1,
        true_args: vec![],
        false_target: bb2,
        false_args: vec![],
    });
    for block in [bb1, bb2] {
        b.switch_to(block);
        b.terminate(Terminator::Branch {
            target: merge,
            args: vec![x],
        });
    }
    let m = b.add_block_arg(merge, class());
    b.switch_to(merge);
    let func = finish(b);

    assert_eq!(strip_single_predecessor_args(&func, m), m);
}

#[test]
fn cond_branch_arguments_follow_the_taken_edge() {
    let mut b = builder();
    let bb1 = b.create_block();
    let bb2 = b.create_block();
    let cond = literal(&mut b, 0);
    let x = b.push_value(InstKind::AllocRef, &[], class());
    let y = b.push_value(InstKind::AllocRef, &[], class());
    b.terminate(Terminator::CondBranch {
        cond,
        true_target: bb1,
        true_args: vec![x],
        false_target: bb2,
        false_args: vec![y],
    });
    let a1 = b.add_block_arg(bb1, class());
    let a2 = b.add_block_arg(bb2, class());
    b.switch_to(bb1);
    b.terminate(Terminator::Unreachable);
    b.switch_to(bb2);
    let func = finish(b);

    assert_eq!(strip_single_predecessor_args(&func, a1), x);
    assert_eq!(strip_single_predecessor_args(&func, a2), y);
}

#[test]
fn self_loop_argument_is_a_fixpoint() {
    let mut b = builder();
    let bb1 = b.create_block();
    let a = b.add_block_arg(bb1, class());
    b.switch_to(bb1);
    b.terminate(Terminator::Branch {
        target: bb1,
        args: vec![a],
    });
    b.switch_to(b.entry_block());
    let func = finish(b);

    assert_eq!(strip_single_predecessor_args(&func, a), a);
}

#[test]
#[should_panic(expected = "transparent producer cycle")]
fn unreachable_argument_cycle_panics() {
    let mut b: FunctionBuilder = builder();
    let bb1 = b.create_block();
    let bb2 = b.create_block();
    let a = b.add_block_arg(bb1, class());
    let c = b.add_block_arg(bb2, class());
    b.switch_to(bb1);
    b.terminate(Terminator::Branch {
        target: bb2,
        args: vec![a],
    });
    b.switch_to(bb2);
    b.terminate(Terminator::Branch {
        target: bb1,
        args: vec![c],
    });
    b.switch_to(b.entry_block());
    let func = finish(b);

    strip_casts(&func, a);
}

// ── Copies ──────────────────────────────────────────────────────

#[test]
fn single_value_copy_or_cast_recognizes_copies() {
    let mut b = builder();
    let obj = b.add_function_arg(class());
    let slot = b.push_value(InstKind::AllocStack, &[], aggregate_addr());
    let copy = b.push(InstKind::CopyValue, &[obj], &[class()]);
    let access = b.push(
        InstKind::BeginAccess {
            access: AccessKind::Read,
        },
        &[slot],
        &[aggregate_addr()],
    );
    let dep = b.push(InstKind::MarkDependence, &[obj, obj], &[class()]);
    let retain = b.push_void(InstKind::StrongRetain, &[obj]);
    let two = b.push(InstKind::Upcast, &[obj], &[class(), class()]);
    let func = finish(b);

    assert_eq!(
        single_value_copy_or_cast(&func, copy),
        func.inst(copy).single_result()
    );
    assert!(single_value_copy_or_cast(&func, access).is_some());
    assert_eq!(single_value_copy_or_cast(&func, dep), None);
    assert_eq!(single_value_copy_or_cast(&func, retain), None);
    assert_eq!(single_value_copy_or_cast(&func, two), None);
}

// ── Property tests ──────────────────────────────────────────────

mod properties {
    use proptest::prelude::*;
    use sil_ir::{BuiltinKind, Function, InstKind, SilType, TypeShape, ValueId};

    use crate::test_helpers::{aggregate_addr, builder, class, finish, literal, unary};

    use super::super::*;

    /// One link of a randomly generated transparent chain. Links that do
    /// not apply to the current category are skipped.
    #[derive(Clone, Copy, Debug)]
    enum Link {
        Upcast,
        RefCast,
        CheckedCast,
        MarkDependence,
        Borrow,
        StructExtract,
        Expect,
        RefElementAddr,
        StructElementAddr,
        TupleElementAddr,
        ConstIndex,
        DynamicIndex,
        AddrCast,
        ViaRawPointer,
    }

    const LINKS: [Link; 14] = [
        Link::Upcast,
        Link::RefCast,
        Link::CheckedCast,
        Link::MarkDependence,
        Link::Borrow,
        Link::StructExtract,
        Link::Expect,
        Link::RefElementAddr,
        Link::StructElementAddr,
        Link::TupleElementAddr,
        Link::ConstIndex,
        Link::DynamicIndex,
        Link::AddrCast,
        Link::ViaRawPointer,
    ];

    /// Build the chain, returning the function and every value on it.
    fn build_chain(links: &[Link]) -> (Function, Vec<ValueId>) {
        let mut b = builder();
        let dynamic = b.add_function_arg(SilType::object(TypeShape::Trivial));
        let root = b.push_value(InstKind::AllocRef, &[], class());
        let constant = literal(&mut b, 2);
        let mut values = vec![root];
        let mut cur = root;

        for &link in links {
            let ty = b.value_type(cur);
            let next = match (link, ty.is_address()) {
                (Link::Upcast, false) => unary(&mut b, InstKind::Upcast, cur),
                (Link::RefCast, false) => unary(&mut b, InstKind::UncheckedRefCast, cur),
                (Link::CheckedCast, false) => {
                    unary(&mut b, InstKind::UnconditionalCheckedCast, cur)
                }
                (Link::MarkDependence, _) => {
                    b.push_value(InstKind::MarkDependence, &[cur, root], ty)
                }
                (Link::Borrow, false) => unary(&mut b, InstKind::BeginBorrow, cur),
                (Link::StructExtract, false) => {
                    unary(&mut b, InstKind::StructExtract { field: 0 }, cur)
                }
                (Link::Expect, false) => b.push_value(
                    InstKind::Builtin {
                        builtin: BuiltinKind::Expect,
                    },
                    &[cur, constant],
                    ty,
                ),
                (Link::RefElementAddr, false) => {
                    b.push_value(InstKind::RefElementAddr { field: 1 }, &[cur], aggregate_addr())
                }
                (Link::StructElementAddr, true) => {
                    unary(&mut b, InstKind::StructElementAddr { field: 0 }, cur)
                }
                (Link::TupleElementAddr, true) => {
                    unary(&mut b, InstKind::TupleElementAddr { index: 1 }, cur)
                }
                (Link::ConstIndex, true) => {
                    b.push_value(InstKind::IndexAddr, &[cur, constant], ty)
                }
                (Link::DynamicIndex, true) => {
                    b.push_value(InstKind::IndexAddr, &[cur, dynamic], ty)
                }
                (Link::AddrCast, true) => unary(&mut b, InstKind::UncheckedAddrCast, cur),
                (Link::ViaRawPointer, true) => {
                    let ptr = b.push_value(
                        InstKind::AddressToPointer,
                        &[cur],
                        SilType::object(TypeShape::RawPointer),
                    );
                    b.push_value(InstKind::PointerToAddress, &[ptr], ty)
                }
                _ => continue,
            };
            values.push(next);
            cur = next;
        }

        (finish(b), values)
    }

    fn chain() -> impl Strategy<Value = Vec<Link>> {
        proptest::collection::vec(proptest::sample::select(LINKS.to_vec()), 0..24)
    }

    type Strip = fn(&Function, ValueId) -> ValueId;

    const FIXPOINT_STRIPS: [(&str, Strip); 12] = [
        ("underlying_object", underlying_object),
        ("underlying_address_root", underlying_address_root),
        (
            "underlying_object_stop_at_mark_dependence",
            underlying_object_stop_at_mark_dependence,
        ),
        ("strip_single_predecessor_args", strip_single_predecessor_args),
        ("strip_casts", strip_casts),
        (
            "strip_casts_without_mark_dependence",
            strip_casts_without_mark_dependence,
        ),
        ("strip_upcasts", strip_upcasts),
        ("strip_class_casts", strip_class_casts),
        ("strip_address_projections", strip_address_projections),
        (
            "strip_unary_address_projections",
            strip_unary_address_projections,
        ),
        ("strip_value_projections", strip_value_projections),
        ("strip_indexing_insts", strip_indexing_insts),
    ];

    proptest! {
        #[test]
        fn stripping_is_idempotent(links in chain()) {
            let (func, values) = build_chain(&links);
            for &v in &values {
                for (name, strip) in FIXPOINT_STRIPS {
                    let once = strip(&func, v);
                    prop_assert_eq!(strip(&func, once), once, "{} not idempotent at {:?}", name, v);
                }
                let converted = strip_convert_functions(&func, v);
                prop_assert_eq!(strip_convert_functions(&func, converted), converted);
            }
        }

        #[test]
        fn underlying_object_is_a_fixpoint(links in chain()) {
            let (func, values) = build_chain(&links);
            for &v in &values {
                let root = underlying_object(&func, v);
                if let Some(inst) = func.producer(root) {
                    prop_assert!(
                        !is_transparent(&func, inst, true),
                        "{:?} stopped at transparent {}",
                        v,
                        inst.kind.mnemonic()
                    );
                }
            }
        }

        #[test]
        fn address_root_preserves_category(links in chain()) {
            let (func, values) = build_chain(&links);
            for &v in &values {
                let root = underlying_address_root(&func, v);
                prop_assert_eq!(func.value_type(root).category, func.value_type(v).category);
                // The root lies on the path to the underlying object.
                prop_assert_eq!(underlying_object(&func, root), underlying_object(&func, v));
            }
        }

        #[test]
        fn narrower_cast_strips_are_prefixes(links in chain()) {
            let (func, values) = build_chain(&links);
            for &v in &values {
                let wide = strip_casts(&func, v);
                prop_assert_eq!(strip_casts(&func, strip_upcasts(&func, v)), wide);
                prop_assert_eq!(strip_casts(&func, strip_class_casts(&func, v)), wide);
                prop_assert_eq!(
                    strip_casts(&func, strip_casts_without_mark_dependence(&func, v)),
                    wide
                );
            }
        }
    }
}

//! Instructions and their effect metadata.
//!
//! [`InstKind`] is a closed enum. Every analysis that needs to know "what
//! kind of thing is this" asks [`InstKind::effects`], an exhaustive match
//! producing an [`InstEffects`] record, rather than testing kinds one by one.
//! Adding a kind forces a decision about its effects in exactly one place.
//!
//! # Operand conventions
//!
//! Operand order is fixed per kind and documented on the variant. Where a
//! kind has a "relevant" operand for look-through purposes, it is always
//! operand 0.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::ids::{BlockId, FuncId, InstId, ValueId};
use crate::interner::Name;

bitflags! {
    /// Effect metadata for an instruction kind.
    ///
    /// Computed by [`InstKind::effects`]. Flags are not mutually exclusive:
    /// `upcast` is a `CAST`, an `UPCAST`, a `CLASS_CAST` and a `COPY_OR_CAST`.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct InstEffects: u32 {
        // === Look-through flags (bits 0-11) ===

        /// Stripped by `strip_casts`: identity-preserving casts and
        /// dependence markers.
        const CAST = 1 << 0;
        /// An upcast to a superclass.
        const UPCAST = 1 << 1;
        /// A class upcast or checked downcast.
        const CLASS_CAST = 1 << 2;
        /// Marks a dependence of operand 0 on operand 1 (`mark_dependence`).
        const DEPENDENCE_MARK = 1 << 3;
        /// Changes function representation only.
        const CONVERT_FUNCTION = 1 << 4;
        /// Projects a sub-location out of an address or reference.
        const ADDRESS_PROJECTION = 1 << 5;
        /// Extracts a field or element out of an aggregate object.
        const VALUE_PROJECTION = 1 << 6;
        /// Pointer/address arithmetic.
        const INDEXING = 1 << 7;
        /// Begins a borrow scope.
        const BORROW_BEGIN = 1 << 8;
        /// Branch-prediction hint wrapping operand 0.
        const EXPECT_INTRINSIC = 1 << 9;

        // === Use flags (bits 12-19) ===

        /// Scope end, debug, or lifetime marker with no effect on the operand.
        const INCIDENTAL = 1 << 12;
        /// Only changes a reference count or destroys the operand.
        const REFCOUNT_ONLY = 1 << 13;
        /// Single-result identity copy, possibly changing type or ownership.
        const COPY_OR_CAST = 1 << 14;
        /// Creates a closure.
        const PARTIAL_APPLY = 1 << 15;
        /// Produces an address that only exists for local initialization.
        const LOCAL_INIT_ONLY = 1 << 16;

        // === Ownership flags (bits 20-21) ===

        /// Only legal in ownership-qualified functions.
        const OWNERSHIP_QUALIFIED = 1 << 20;
        /// Only legal in ownership-unqualified functions.
        const OWNERSHIP_UNQUALIFIED = 1 << 21;
    }
}

/// Ownership qualifier on `load`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadOwnership {
    /// Plain `load` in a function without ownership.
    Unqualified,
    /// `load [take]`: moves the value out.
    Take,
    /// `load [copy]`: copies the value out.
    Copy,
    /// `load [trivial]`: loads a trivial value.
    Trivial,
}

/// Ownership qualifier on `store`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum StoreOwnership {
    /// Plain `store` in a function without ownership.
    Unqualified,
    /// `store [init]`: initializes uninitialized memory.
    Init,
    /// `store [assign]`: replaces an initialized value.
    Assign,
    /// `store [trivial]`: stores a trivial value.
    Trivial,
}

/// Access kind of a `begin_access`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessKind {
    Init,
    Read,
    Modify,
    Deinit,
}

/// Builtin function invoked by a `builtin` instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum BuiltinKind {
    /// `int_expect`: `(value, expected) -> value`.
    Expect,
    /// Any other builtin, by name.
    Other(Name),
}

/// The kind of an instruction, with kind-specific payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum InstKind {
    // ── Allocation and address producers ────────────────────────
    /// `() -> address` of an uninitialized stack slot.
    AllocStack,
    /// `() -> box`.
    AllocBox,
    /// `(box) -> address` of the boxed value.
    ProjectBox,
    /// `() -> class reference`.
    AllocRef,
    /// `() -> existential box`.
    AllocExistentialBox,
    /// `(existential box) -> address`, for initializing the payload.
    ProjectExistentialBox,
    /// `(existential box) -> address` of the opened payload.
    OpenExistentialBox,
    /// `(buffer address) -> address` of a freshly allocated value buffer.
    AllocValueBuffer,
    /// `(buffer address) -> address` of the buffer's value.
    ProjectValueBuffer,
    /// `() -> address` of a global variable.
    GlobalAddr { global: Name },
    /// `(raw pointer) -> address`.
    PointerToAddress,
    /// `(address) -> address` marking a variable that must be initialized
    /// before use.
    MarkUninitialized,
    /// `(enum address) -> payload address`, for initializing a case payload.
    InitEnumDataAddr { case: u32 },
    /// `(existential address) -> payload address`, for initialization.
    InitExistentialAddr,

    // ── Literals and references ─────────────────────────────────
    IntegerLiteral { value: i64 },
    FunctionRef { callee: FuncId },

    // ── Casts ───────────────────────────────────────────────────
    /// `(class) -> superclass`.
    Upcast,
    UncheckedRefCast,
    /// `(class) -> subclass`, trapping on failure.
    UnconditionalCheckedCast,
    RefToBridgeObject,
    BridgeObjectToRef,
    UncheckedTrivialBitCast,
    UncheckedBitwiseCast,
    /// `(address) -> address` of a different type.
    UncheckedAddrCast,
    AddressToPointer,
    RefToRawPointer,
    RawPointerToRef,
    ThinToThickFunction,
    /// `(value, base) -> value`: value depends on base staying alive.
    MarkDependence,
    ConvertFunction,
    ConvertEscapeToNoEscape,

    // ── Projections ─────────────────────────────────────────────
    StructElementAddr { field: u32 },
    TupleElementAddr { index: u32 },
    UncheckedTakeEnumDataAddr { case: u32 },
    /// `(class reference) -> address` of a stored property.
    RefElementAddr { field: u32 },
    /// `(class reference) -> address` of tail-allocated elements.
    RefTailAddr,
    StructExtract { field: u32 },
    TupleExtract { index: u32 },
    UncheckedEnumData { case: u32 },

    // ── Indexing ────────────────────────────────────────────────
    /// `(base address, index) -> address`.
    IndexAddr,
    /// `(base pointer, index) -> pointer`.
    IndexRawPointer,
    /// `(base address, count) -> address` past `count` elements.
    TailAddr,

    // ── Aggregates ──────────────────────────────────────────────
    Struct,
    Tuple,
    /// `(payload?) -> enum`.
    Enum { case: u32 },

    // ── Scopes ──────────────────────────────────────────────────
    BeginBorrow,
    EndBorrow,
    BeginAccess { access: AccessKind },
    EndAccess,

    // ── Memory ──────────────────────────────────────────────────
    /// `(address) -> value`.
    Load { ownership: LoadOwnership },
    /// `(address) -> borrowed value`.
    LoadBorrow,
    /// `(value, destination address)`.
    Store { ownership: StoreOwnership },
    /// `(source address, destination address)`.
    CopyAddr { take: bool, initialize: bool },
    DestroyAddr,
    DeallocStack,
    DeallocBox,

    // ── Ownership and reference counting ────────────────────────
    CopyValue,
    CopyUnownedValue,
    CopyBlock,
    DestroyValue,
    StrongRetain,
    StrongRelease,
    RetainValue,
    ReleaseValue,
    UnownedRetain,
    UnownedRelease,

    // ── Lifetime and debug markers ──────────────────────────────
    DebugValue,
    DebugValueAddr,
    EndLifetime,
    FixLifetime,

    // ── Calls ───────────────────────────────────────────────────
    /// `(callee, args...) -> result`.
    Apply,
    /// `(callee, captured...) -> closure`.
    PartialApply,
    /// `(args...) -> result`.
    Builtin { builtin: BuiltinKind },
}

impl InstKind {
    /// Effect metadata for this kind.
    pub fn effects(self) -> InstEffects {
        use InstEffects as E;

        match self {
            // Producers with no look-through behavior.
            InstKind::AllocStack
            | InstKind::AllocBox
            | InstKind::AllocRef
            | InstKind::GlobalAddr { .. }
            | InstKind::MarkUninitialized
            | InstKind::IntegerLiteral { .. }
            | InstKind::FunctionRef { .. }
            | InstKind::Struct
            | InstKind::Tuple
            | InstKind::Enum { .. }
            | InstKind::Apply => E::empty(),

            InstKind::AllocExistentialBox
            | InstKind::ProjectExistentialBox
            | InstKind::OpenExistentialBox
            | InstKind::AllocValueBuffer
            | InstKind::ProjectValueBuffer
            | InstKind::InitEnumDataAddr { .. }
            | InstKind::InitExistentialAddr => E::LOCAL_INIT_ONLY,

            // Conversions that change category are copies, but never
            // stripped: the operand is a different kind of thing.
            InstKind::PointerToAddress
            | InstKind::AddressToPointer
            | InstKind::RefToRawPointer
            | InstKind::RawPointerToRef
            | InstKind::UncheckedBitwiseCast
            | InstKind::ThinToThickFunction => E::COPY_OR_CAST,

            InstKind::Upcast => E::CAST | E::UPCAST | E::CLASS_CAST | E::COPY_OR_CAST,
            InstKind::UnconditionalCheckedCast => E::CAST | E::CLASS_CAST | E::COPY_OR_CAST,
            InstKind::UncheckedRefCast
            | InstKind::RefToBridgeObject
            | InstKind::BridgeObjectToRef
            | InstKind::UncheckedTrivialBitCast
            | InstKind::UncheckedAddrCast => E::CAST | E::COPY_OR_CAST,
            InstKind::MarkDependence => E::CAST | E::DEPENDENCE_MARK,
            InstKind::ConvertFunction | InstKind::ConvertEscapeToNoEscape => {
                E::CONVERT_FUNCTION | E::COPY_OR_CAST
            }

            InstKind::StructElementAddr { .. }
            | InstKind::TupleElementAddr { .. }
            | InstKind::UncheckedTakeEnumDataAddr { .. }
            | InstKind::RefElementAddr { .. }
            | InstKind::RefTailAddr
            | InstKind::ProjectBox => E::ADDRESS_PROJECTION,
            InstKind::StructExtract { .. }
            | InstKind::TupleExtract { .. }
            | InstKind::UncheckedEnumData { .. } => E::VALUE_PROJECTION,

            // `index_addr` with a constant index is also an address
            // projection; that depends on the operand, see `Function`.
            InstKind::IndexAddr | InstKind::IndexRawPointer | InstKind::TailAddr => E::INDEXING,

            InstKind::BeginBorrow => E::BORROW_BEGIN | E::COPY_OR_CAST,
            InstKind::BeginAccess { .. } => E::COPY_OR_CAST,
            InstKind::EndBorrow => E::INCIDENTAL | E::OWNERSHIP_QUALIFIED,
            InstKind::EndAccess
            | InstKind::DebugValue
            | InstKind::DebugValueAddr
            | InstKind::EndLifetime
            | InstKind::FixLifetime
            | InstKind::DeallocStack => E::INCIDENTAL,

            InstKind::Load { ownership } => match ownership {
                LoadOwnership::Unqualified => E::OWNERSHIP_UNQUALIFIED,
                LoadOwnership::Take | LoadOwnership::Copy | LoadOwnership::Trivial => {
                    E::OWNERSHIP_QUALIFIED
                }
            },
            InstKind::Store { ownership } => match ownership {
                StoreOwnership::Unqualified => E::OWNERSHIP_UNQUALIFIED,
                StoreOwnership::Init | StoreOwnership::Assign | StoreOwnership::Trivial => {
                    E::OWNERSHIP_QUALIFIED
                }
            },
            InstKind::LoadBorrow => E::OWNERSHIP_QUALIFIED,
            InstKind::CopyAddr { .. } | InstKind::DeallocBox => E::empty(),
            InstKind::DestroyAddr => E::REFCOUNT_ONLY,

            InstKind::CopyValue | InstKind::CopyUnownedValue => {
                E::COPY_OR_CAST | E::OWNERSHIP_QUALIFIED
            }
            InstKind::CopyBlock => E::COPY_OR_CAST,
            InstKind::DestroyValue => E::REFCOUNT_ONLY | E::OWNERSHIP_QUALIFIED,
            InstKind::StrongRetain
            | InstKind::StrongRelease
            | InstKind::RetainValue
            | InstKind::ReleaseValue
            | InstKind::UnownedRetain
            | InstKind::UnownedRelease => E::REFCOUNT_ONLY | E::OWNERSHIP_UNQUALIFIED,

            InstKind::PartialApply => E::PARTIAL_APPLY,
            InstKind::Builtin { builtin } => match builtin {
                BuiltinKind::Expect => E::EXPECT_INTRINSIC,
                BuiltinKind::Other(_) => E::empty(),
            },
        }
    }

    /// The textual mnemonic of this kind, for diagnostics.
    pub fn mnemonic(self) -> &'static str {
        match self {
            InstKind::AllocStack => "alloc_stack",
            InstKind::AllocBox => "alloc_box",
            InstKind::ProjectBox => "project_box",
            InstKind::AllocRef => "alloc_ref",
            InstKind::AllocExistentialBox => "alloc_existential_box",
            InstKind::ProjectExistentialBox => "project_existential_box",
            InstKind::OpenExistentialBox => "open_existential_box",
            InstKind::AllocValueBuffer => "alloc_value_buffer",
            InstKind::ProjectValueBuffer => "project_value_buffer",
            InstKind::GlobalAddr { .. } => "global_addr",
            InstKind::PointerToAddress => "pointer_to_address",
            InstKind::MarkUninitialized => "mark_uninitialized",
            InstKind::InitEnumDataAddr { .. } => "init_enum_data_addr",
            InstKind::InitExistentialAddr => "init_existential_addr",
            InstKind::IntegerLiteral { .. } => "integer_literal",
            InstKind::FunctionRef { .. } => "function_ref",
            InstKind::Upcast => "upcast",
            InstKind::UncheckedRefCast => "unchecked_ref_cast",
            InstKind::UnconditionalCheckedCast => "unconditional_checked_cast",
            InstKind::RefToBridgeObject => "ref_to_bridge_object",
            InstKind::BridgeObjectToRef => "bridge_object_to_ref",
            InstKind::UncheckedTrivialBitCast => "unchecked_trivial_bit_cast",
            InstKind::UncheckedBitwiseCast => "unchecked_bitwise_cast",
            InstKind::UncheckedAddrCast => "unchecked_addr_cast",
            InstKind::AddressToPointer => "address_to_pointer",
            InstKind::RefToRawPointer => "ref_to_raw_pointer",
            InstKind::RawPointerToRef => "raw_pointer_to_ref",
            InstKind::ThinToThickFunction => "thin_to_thick_function",
            InstKind::MarkDependence => "mark_dependence",
            InstKind::ConvertFunction => "convert_function",
            InstKind::ConvertEscapeToNoEscape => "convert_escape_to_noescape",
            InstKind::StructElementAddr { .. } => "struct_element_addr",
            InstKind::TupleElementAddr { .. } => "tuple_element_addr",
            InstKind::UncheckedTakeEnumDataAddr { .. } => "unchecked_take_enum_data_addr",
            InstKind::RefElementAddr { .. } => "ref_element_addr",
            InstKind::RefTailAddr => "ref_tail_addr",
            InstKind::StructExtract { .. } => "struct_extract",
            InstKind::TupleExtract { .. } => "tuple_extract",
            InstKind::UncheckedEnumData { .. } => "unchecked_enum_data",
            InstKind::IndexAddr => "index_addr",
            InstKind::IndexRawPointer => "index_raw_pointer",
            InstKind::TailAddr => "tail_addr",
            InstKind::Struct => "struct",
            InstKind::Tuple => "tuple",
            InstKind::Enum { .. } => "enum",
            InstKind::BeginBorrow => "begin_borrow",
            InstKind::EndBorrow => "end_borrow",
            InstKind::BeginAccess { .. } => "begin_access",
            InstKind::EndAccess => "end_access",
            InstKind::Load { .. } => "load",
            InstKind::LoadBorrow => "load_borrow",
            InstKind::Store { .. } => "store",
            InstKind::CopyAddr { .. } => "copy_addr",
            InstKind::DestroyAddr => "destroy_addr",
            InstKind::DeallocStack => "dealloc_stack",
            InstKind::DeallocBox => "dealloc_box",
            InstKind::CopyValue => "copy_value",
            InstKind::CopyUnownedValue => "copy_unowned_value",
            InstKind::CopyBlock => "copy_block",
            InstKind::DestroyValue => "destroy_value",
            InstKind::StrongRetain => "strong_retain",
            InstKind::StrongRelease => "strong_release",
            InstKind::RetainValue => "retain_value",
            InstKind::ReleaseValue => "release_value",
            InstKind::UnownedRetain => "unowned_retain",
            InstKind::UnownedRelease => "unowned_release",
            InstKind::DebugValue => "debug_value",
            InstKind::DebugValueAddr => "debug_value_addr",
            InstKind::EndLifetime => "end_lifetime",
            InstKind::FixLifetime => "fix_lifetime",
            InstKind::Apply => "apply",
            InstKind::PartialApply => "partial_apply",
            InstKind::Builtin { .. } => "builtin",
        }
    }
}

/// A single instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Inst {
    pub kind: InstKind,
    /// Operand values, in the order documented on [`InstKind`].
    pub operands: SmallVec<[ValueId; 2]>,
    /// Result values. Most instructions have zero or one.
    pub results: SmallVec<[ValueId; 1]>,
    /// The block containing this instruction.
    pub block: BlockId,
}

impl Inst {
    #[inline]
    pub fn effects(&self) -> InstEffects {
        self.kind.effects()
    }

    /// The operand at `index`, if present.
    #[inline]
    pub fn operand(&self, index: usize) -> Option<ValueId> {
        self.operands.get(index).copied()
    }

    /// The only result of a single-result instruction.
    #[inline]
    pub fn single_result(&self) -> Option<ValueId> {
        match self.results.as_slice() {
            [result] => Some(*result),
            _ => None,
        }
    }
}

/// Where a value is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum User {
    /// An instruction operand.
    Inst(InstId),
    /// A terminator operand (branch argument, condition, return value).
    Terminator(BlockId),
}

/// A use edge: the user and the operand position within it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Operand {
    pub user: User,
    pub index: u32,
}

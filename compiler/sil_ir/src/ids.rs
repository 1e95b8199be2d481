//! Index newtypes for values, instructions, blocks, and functions.
//!
//! Values, instructions, and blocks are numbered densely per
//! [`Function`](crate::Function); function IDs are numbered per
//! [`Module`](crate::Module). All IDs are allocated sequentially from 0.

/// Define `u32` index newtypes.
///
/// Each generated type has `new()`, `raw()`, `index()` and a compact
/// `Debug` implementation with the given sigil (`%3`, `bb1`, ...).
macro_rules! define_id {
    ($($(#[$meta:meta])* $name:ident => $prefix:literal),* $(,)?) => { $(
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create an ID from a raw index.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw `u32` value.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Get the index as `usize` (for indexing into `Vec`s).
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    )* };
}

define_id!(
    /// An SSA value: an instruction result or a block argument.
    ValueId => "%",
    /// An instruction within a function.
    InstId => "inst",
    /// A basic block within a function.
    BlockId => "bb",
    /// A function declaration within a module.
    FuncId => "@",
);

/// Convert a container length into the next sequential raw ID.
///
/// # Panics
///
/// Panics if `len` exceeds `u32::MAX`; IR that large is a compiler bug.
#[inline]
pub(crate) fn next_raw(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("{what} count exceeds u32::MAX"))
}

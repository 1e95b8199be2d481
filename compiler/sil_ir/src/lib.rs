//! SSA intermediate representation substrate.
//!
//! This crate provides the data model that the instruction utilities in
//! `sil_analysis` read:
//!
//! - **Values** ([`ValueId`], [`ValueData`]): each has exactly one producer,
//!   an instruction result or a block argument, and a [`SilType`] that is
//!   either an object or an address.
//! - **Instructions** ([`Inst`], [`InstKind`]): a closed set of kinds, each
//!   mapped to an [`InstEffects`] record by one exhaustive match.
//! - **Blocks and terminators** ([`Block`], [`Terminator`]): block
//!   arguments are fed by branch arguments of predecessors.
//! - **Functions and modules** ([`Function`], [`Module`]): immutable bodies
//!   with precomputed use and predecessor lists, and a declaration table
//!   carrying thunk tags.
//!
//! Bodies are built with [`FunctionBuilder`]. There is no parser or printer
//! here; those belong to the surrounding compiler.

mod builder;
mod function;
mod ids;
mod inst;
mod interner;
mod module;
mod types;

pub use builder::{BuildError, FunctionBuilder};
pub use function::{Block, Function, Terminator, ValueData, ValueDef};
pub use ids::{BlockId, FuncId, InstId, ValueId};
pub use inst::{
    AccessKind, BuiltinKind, Inst, InstEffects, InstKind, LoadOwnership, Operand,
    StoreOwnership, User,
};
pub use interner::{InternError, Name, StringInterner};
pub use module::{FunctionDecl, Module, ThunkKind};
pub use types::{SilType, TypeShape, ValueCategory};

//! Function bodies: values, instructions, blocks, and terminators.
//!
//! A [`Function`] is immutable once built by
//! [`FunctionBuilder`](crate::FunctionBuilder). The builder computes the
//! derived def-use lists and predecessor lists up front, so every query here
//! is a slice lookup and analyses can run concurrently on `&Function`.

use smallvec::{smallvec, SmallVec};

use crate::ids::{BlockId, InstId, ValueId};
use crate::inst::{Inst, InstKind, Operand};
use crate::interner::Name;
use crate::types::SilType;

// ── Values ──────────────────────────────────────────────────────────

/// The single producer of a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueDef {
    /// Result `index` of instruction `inst`.
    Inst { inst: InstId, index: u32 },
    /// Argument `index` of block `block`. Arguments of the entry block are
    /// the function's arguments.
    BlockArg { block: BlockId, index: u32 },
}

/// Per-value data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueData {
    pub ty: SilType,
    pub def: ValueDef,
}

// ── Terminators ─────────────────────────────────────────────────────

/// Block terminator: how control leaves a basic block.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Terminator {
    /// Unconditional branch, passing `args` to the target's arguments.
    Branch { target: BlockId, args: Vec<ValueId> },

    /// Two-way branch on a boolean.
    CondBranch {
        cond: ValueId,
        true_target: BlockId,
        true_args: Vec<ValueId>,
        false_target: BlockId,
        false_args: Vec<ValueId>,
    },

    /// Multi-way branch on an integer. Targets take no arguments.
    Switch {
        scrutinee: ValueId,
        cases: Vec<(i64, BlockId)>,
        default: BlockId,
    },

    Return { value: ValueId },

    Unreachable,
}

impl Terminator {
    /// Successor blocks, in operand order. May contain duplicates.
    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            Terminator::Branch { target, .. } => smallvec![*target],
            Terminator::CondBranch {
                true_target,
                false_target,
                ..
            } => smallvec![*true_target, *false_target],
            Terminator::Switch { cases, default, .. } => {
                let mut targets = SmallVec::with_capacity(cases.len() + 1);
                for &(_, block) in cases {
                    targets.push(block);
                }
                targets.push(*default);
                targets
            }
            Terminator::Return { .. } | Terminator::Unreachable => SmallVec::new(),
        }
    }

    /// All values read by this terminator. Positions in this list are the
    /// operand indices recorded in use lists.
    pub fn operands(&self) -> SmallVec<[ValueId; 4]> {
        match self {
            Terminator::Branch { args, .. } => args.iter().copied().collect(),
            Terminator::CondBranch {
                cond,
                true_args,
                false_args,
                ..
            } => {
                let mut ops = SmallVec::with_capacity(1 + true_args.len() + false_args.len());
                ops.push(*cond);
                ops.extend_from_slice(true_args);
                ops.extend_from_slice(false_args);
                ops
            }
            Terminator::Switch { scrutinee, .. } => smallvec![*scrutinee],
            Terminator::Return { value } => smallvec![*value],
            Terminator::Unreachable => SmallVec::new(),
        }
    }

    /// The value this terminator passes into argument `index` of `target`.
    ///
    /// Returns `None` unless exactly one value flows along the edge: a
    /// conditional branch whose two targets are the same block is
    /// ambiguous, and switches pass no arguments.
    pub fn incoming_value(&self, target: BlockId, index: usize) -> Option<ValueId> {
        match self {
            Terminator::Branch { target: t, args } if *t == target => args.get(index).copied(),
            Terminator::CondBranch {
                true_target,
                true_args,
                false_target,
                false_args,
                ..
            } => {
                if true_target == false_target {
                    None
                } else if *true_target == target {
                    true_args.get(index).copied()
                } else if *false_target == target {
                    false_args.get(index).copied()
                } else {
                    None
                }
            }
            Terminator::Branch { .. }
            | Terminator::Switch { .. }
            | Terminator::Return { .. }
            | Terminator::Unreachable => None,
        }
    }
}

// ── Blocks ──────────────────────────────────────────────────────────

/// A basic block.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub id: BlockId,
    /// Block arguments (phi-like values passed by predecessors).
    pub args: Vec<ValueId>,
    /// Instructions in execution order.
    pub insts: Vec<InstId>,
    pub terminator: Terminator,
}

// ── Functions ───────────────────────────────────────────────────────

/// A complete function body.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    pub(crate) name: Name,
    pub(crate) blocks: Vec<Block>,
    pub(crate) insts: Vec<Inst>,
    pub(crate) values: Vec<ValueData>,
    /// Use list of each value, indexed by `ValueId::index()`.
    pub(crate) uses: Vec<SmallVec<[Operand; 2]>>,
    /// Distinct predecessors of each block, indexed by `BlockId::index()`.
    pub(crate) preds: Vec<SmallVec<[BlockId; 2]>>,
}

impl Function {
    #[inline]
    pub fn name(&self) -> Name {
        self.name
    }

    /// The entry block. Always `bb0`.
    #[inline]
    pub fn entry(&self) -> BlockId {
        BlockId::new(0)
    }

    #[inline]
    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn num_insts(&self) -> usize {
        self.insts.len()
    }

    /// Look up a value.
    ///
    /// # Panics
    ///
    /// Panics if `value` does not belong to this function.
    #[inline]
    pub fn value(&self, value: ValueId) -> &ValueData {
        &self.values[value.index()]
    }

    #[inline]
    pub fn value_type(&self, value: ValueId) -> SilType {
        self.value(value).ty
    }

    #[inline]
    pub fn inst(&self, inst: InstId) -> &Inst {
        &self.insts[inst.index()]
    }

    #[inline]
    pub fn block(&self, block: BlockId) -> &Block {
        &self.blocks[block.index()]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The instruction producing `value`, if it is an instruction result.
    #[inline]
    pub fn defining_inst(&self, value: ValueId) -> Option<InstId> {
        match self.value(value).def {
            ValueDef::Inst { inst, .. } => Some(inst),
            ValueDef::BlockArg { .. } => None,
        }
    }

    /// The instruction data producing `value`, if it is an instruction result.
    #[inline]
    pub fn producer(&self, value: ValueId) -> Option<&Inst> {
        self.defining_inst(value).map(|inst| self.inst(inst))
    }

    /// The kind of the instruction producing `value`, if any.
    #[inline]
    pub fn producer_kind(&self, value: ValueId) -> Option<InstKind> {
        self.producer(value).map(|inst| inst.kind)
    }

    /// Returns `true` if `value` is an argument of the entry block.
    pub fn is_function_arg(&self, value: ValueId) -> bool {
        matches!(
            self.value(value).def,
            ValueDef::BlockArg { block, .. } if block == self.entry()
        )
    }

    /// All uses of `value`, in instruction-then-terminator creation order.
    #[inline]
    pub fn uses(&self, value: ValueId) -> &[Operand] {
        &self.uses[value.index()]
    }

    /// Distinct predecessor blocks of `block`.
    #[inline]
    pub fn predecessors(&self, block: BlockId) -> &[BlockId] {
        &self.preds[block.index()]
    }

    /// The unique predecessor of `block`, if it has exactly one.
    pub fn single_predecessor(&self, block: BlockId) -> Option<BlockId> {
        match self.predecessors(block) {
            [pred] => Some(*pred),
            _ => None,
        }
    }

    /// The value of an integer literal.
    pub fn integer_literal(&self, value: ValueId) -> Option<i64> {
        match self.producer_kind(value)? {
            InstKind::IntegerLiteral { value } => Some(value),
            _ => None,
        }
    }

    /// Instructions in block layout order.
    pub fn instructions(&self) -> impl Iterator<Item = (InstId, &Inst)> + '_ {
        self.blocks
            .iter()
            .flat_map(|block| block.insts.iter())
            .map(|&id| (id, self.inst(id)))
    }
}

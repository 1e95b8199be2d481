//! Incremental construction of [`Function`] bodies.
//!
//! The builder appends instructions to a current block and defers every
//! cross-reference check to [`FunctionBuilder::finish`], which validates
//! operands and branch targets and then derives use and predecessor lists.

use std::fmt;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::function::{Block, Function, Terminator, ValueData, ValueDef};
use crate::ids::{next_raw, BlockId, InstId, ValueId};
use crate::inst::{Inst, InstKind, Operand, User};
use crate::interner::Name;
use crate::types::SilType;

/// Error produced when a built function is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A block was never given a terminator.
    UnterminatedBlock { block: BlockId },
    /// An operand refers to a value that was never created.
    UnknownValue { value: ValueId },
    /// A terminator targets a block that was never created.
    UnknownBlock { block: BlockId },
    /// A branch passes the wrong number of arguments to its target.
    ArgCountMismatch {
        from: BlockId,
        to: BlockId,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnterminatedBlock { block } => {
                write!(f, "block {block:?} has no terminator")
            }
            BuildError::UnknownValue { value } => write!(f, "operand {value:?} is not defined"),
            BuildError::UnknownBlock { block } => {
                write!(f, "branch target {block:?} does not exist")
            }
            BuildError::ArgCountMismatch {
                from,
                to,
                expected,
                found,
            } => write!(
                f,
                "branch from {from:?} to {to:?} passes {found} arguments, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for BuildError {}

struct BlockBuilder {
    args: Vec<ValueId>,
    insts: Vec<InstId>,
    terminator: Option<Terminator>,
}

/// Builder for a single [`Function`].
///
/// A new builder starts with the entry block (`bb0`) current.
pub struct FunctionBuilder {
    name: Name,
    blocks: Vec<BlockBuilder>,
    insts: Vec<Inst>,
    values: Vec<ValueData>,
    current: BlockId,
}

impl FunctionBuilder {
    pub fn new(name: Name) -> Self {
        let mut builder = Self {
            name,
            blocks: Vec::new(),
            insts: Vec::new(),
            values: Vec::new(),
            current: BlockId::new(0),
        };
        builder.create_block();
        builder
    }

    #[inline]
    pub fn entry_block(&self) -> BlockId {
        BlockId::new(0)
    }

    #[inline]
    pub fn current_block(&self) -> BlockId {
        self.current
    }

    /// Append a new, empty block. Does not change the current block.
    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId::new(next_raw(self.blocks.len(), "block"));
        self.blocks.push(BlockBuilder {
            args: Vec::new(),
            insts: Vec::new(),
            terminator: None,
        });
        id
    }

    /// Make `block` the insertion point for subsequent instructions.
    pub fn switch_to(&mut self, block: BlockId) {
        debug_assert!(block.index() < self.blocks.len(), "unknown block {block:?}");
        self.current = block;
    }

    fn fresh_value(&mut self, ty: SilType, def: ValueDef) -> ValueId {
        let id = ValueId::new(next_raw(self.values.len(), "value"));
        self.values.push(ValueData { ty, def });
        id
    }

    /// The type of a value created by this builder.
    #[inline]
    pub fn value_type(&self, value: ValueId) -> SilType {
        self.values[value.index()].ty
    }

    /// Add an argument to `block`.
    pub fn add_block_arg(&mut self, block: BlockId, ty: SilType) -> ValueId {
        let index = next_raw(self.blocks[block.index()].args.len(), "block argument");
        let value = self.fresh_value(ty, ValueDef::BlockArg { block, index });
        self.blocks[block.index()].args.push(value);
        value
    }

    /// Add a function argument (an argument of the entry block).
    pub fn add_function_arg(&mut self, ty: SilType) -> ValueId {
        self.add_block_arg(self.entry_block(), ty)
    }

    /// Append an instruction with the given result types to the current block.
    pub fn push(&mut self, kind: InstKind, operands: &[ValueId], result_types: &[SilType]) -> InstId {
        let id = InstId::new(next_raw(self.insts.len(), "instruction"));
        let mut results = SmallVec::with_capacity(result_types.len());
        for (index, &ty) in result_types.iter().enumerate() {
            let index = next_raw(index, "result");
            results.push(self.fresh_value(ty, ValueDef::Inst { inst: id, index }));
        }
        self.insts.push(Inst {
            kind,
            operands: operands.iter().copied().collect(),
            results,
            block: self.current,
        });
        self.blocks[self.current.index()].insts.push(id);
        id
    }

    /// Append a single-result instruction and return its result.
    pub fn push_value(&mut self, kind: InstKind, operands: &[ValueId], ty: SilType) -> ValueId {
        let inst = self.push(kind, operands, &[ty]);
        self.insts[inst.index()].results[0]
    }

    /// Append a zero-result instruction.
    pub fn push_void(&mut self, kind: InstKind, operands: &[ValueId]) -> InstId {
        self.push(kind, operands, &[])
    }

    /// Terminate the current block, replacing any previous terminator.
    pub fn terminate(&mut self, terminator: Terminator) {
        self.blocks[self.current.index()].terminator = Some(terminator);
    }

    /// Validate the body and derive use and predecessor lists.
    pub fn finish(self) -> Result<Function, BuildError> {
        let num_values = self.values.len();
        let num_blocks = self.blocks.len();
        let check_value = |value: ValueId| {
            if value.index() < num_values {
                Ok(())
            } else {
                Err(BuildError::UnknownValue { value })
            }
        };

        let mut blocks = Vec::with_capacity(num_blocks);
        for (idx, bb) in self.blocks.into_iter().enumerate() {
            let id = BlockId::new(next_raw(idx, "block"));
            let terminator = bb
                .terminator
                .ok_or(BuildError::UnterminatedBlock { block: id })?;
            blocks.push(Block {
                id,
                args: bb.args,
                insts: bb.insts,
                terminator,
            });
        }

        let mut uses: Vec<SmallVec<[Operand; 2]>> = vec![SmallVec::new(); num_values];
        for (idx, inst) in self.insts.iter().enumerate() {
            let user = User::Inst(InstId::new(next_raw(idx, "instruction")));
            for (index, &value) in inst.operands.iter().enumerate() {
                check_value(value)?;
                uses[value.index()].push(Operand {
                    user,
                    index: next_raw(index, "operand"),
                });
            }
        }

        let mut preds: Vec<SmallVec<[BlockId; 2]>> = vec![SmallVec::new(); num_blocks];
        for block in &blocks {
            let user = User::Terminator(block.id);
            for (index, value) in block.terminator.operands().into_iter().enumerate() {
                check_value(value)?;
                uses[value.index()].push(Operand {
                    user,
                    index: next_raw(index, "operand"),
                });
            }

            let mut seen = FxHashSet::default();
            for succ in block.terminator.successors() {
                let Some(target) = blocks.get(succ.index()) else {
                    return Err(BuildError::UnknownBlock { block: succ });
                };
                if seen.insert(succ) {
                    preds[succ.index()].push(block.id);
                }
                check_branch_args(block, target)?;
            }
        }

        Ok(Function {
            name: self.name,
            blocks,
            insts: self.insts,
            values: self.values,
            uses,
            preds,
        })
    }
}

fn check_branch_args(from: &Block, to: &Block) -> Result<(), BuildError> {
    let passed = match &from.terminator {
        Terminator::Branch { args, .. } => args.len(),
        Terminator::CondBranch {
            true_target,
            true_args,
            false_args,
            ..
        } => {
            if *true_target == to.id {
                true_args.len()
            } else {
                false_args.len()
            }
        }
        Terminator::Switch { .. } | Terminator::Return { .. } | Terminator::Unreachable => 0,
    };
    if passed == to.args.len() {
        Ok(())
    } else {
        Err(BuildError::ArgCountMismatch {
            from: from.id,
            to: to.id,
            expected: to.args.len(),
            found: passed,
        })
    }
}

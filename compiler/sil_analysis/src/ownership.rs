//! Function ownership classification.
//!
//! A function body is either ownership-qualified (it uses `copy_value`,
//! `load [copy]`, `end_borrow` and friends) or unqualified (it uses
//! `strong_retain`, plain `load`, and so on), never both. The
//! [`FunctionOwnershipEvaluator`] is fed a function's instructions one at
//! a time and reports the classification, treating a mix as an
//! internal-consistency error.
//!
//! One evaluator is reused across all functions of a scan: [`reset`]
//! rebinds it and discards everything seen so far.
//!
//! [`reset`]: FunctionOwnershipEvaluator::reset

use sil_ir::{Function, Inst, InstEffects, InstId, InstKind, Name, StringInterner};
use thiserror::Error;

/// Which ownership regime an instruction requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OwnershipQualifiedKind {
    /// Only legal in ownership-qualified functions.
    Qualified,
    /// Only legal in unqualified functions.
    Unqualified,
    /// Legal in both.
    NotApplicable,
}

impl OwnershipQualifiedKind {
    pub fn of(inst: &Inst) -> Self {
        let effects = inst.effects();
        if effects.contains(InstEffects::OWNERSHIP_QUALIFIED) {
            OwnershipQualifiedKind::Qualified
        } else if effects.contains(InstEffects::OWNERSHIP_UNQUALIFIED) {
            OwnershipQualifiedKind::Unqualified
        } else {
            OwnershipQualifiedKind::NotApplicable
        }
    }
}

/// The ownership classification of a whole function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionOwnership {
    Qualified,
    Unqualified,
    /// Only instructions legal in both regimes were seen.
    NoOwnershipSemantics,
}

/// Fatal ownership evaluation errors.
///
/// A mixed function means the IR was malformed upstream. Callers abort
/// processing of the compilation unit.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum OwnershipError {
    #[error(
        "function {function:?} mixes ownership-qualified and unqualified instructions: \
         `{mnemonic}` at {inst:?}",
        mnemonic = .kind.mnemonic()
    )]
    MixedOwnership {
        function: Name,
        inst: InstId,
        kind: InstKind,
    },

    #[error("ownership evaluator is not bound to a function")]
    Unbound,
}

impl OwnershipError {
    /// Render with the function's source name.
    pub fn render(&self, interner: &StringInterner) -> String {
        match self {
            OwnershipError::MixedOwnership {
                function,
                inst,
                kind,
            } => format!(
                "function `{}` mixes ownership-qualified and unqualified instructions: \
                 `{}` at {inst:?}",
                interner.lookup(*function),
                kind.mnemonic(),
            ),
            OwnershipError::Unbound => self.to_string(),
        }
    }
}

/// Incremental ownership classifier for one function at a time.
#[derive(Clone, Debug, Default)]
pub struct FunctionOwnershipEvaluator {
    function: Option<Name>,
    has_qualified: bool,
    has_unqualified: bool,
}

impl FunctionOwnershipEvaluator {
    /// An evaluator not yet bound to any function.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound_to(function: Name) -> Self {
        let mut evaluator = Self::new();
        evaluator.reset(function);
        evaluator
    }

    /// Bind to `function`, clearing all state.
    pub fn reset(&mut self, function: Name) {
        tracing::trace!(function = ?function, "ownership evaluator reset");
        self.function = Some(function);
        self.has_qualified = false;
        self.has_unqualified = false;
    }

    #[inline]
    pub fn function(&self) -> Option<Name> {
        self.function
    }

    /// `true` once an ownership-qualified instruction has been seen.
    #[inline]
    pub fn has_qualified_ownership(&self) -> bool {
        self.has_qualified
    }

    pub fn classification(&self) -> FunctionOwnership {
        if self.has_qualified {
            FunctionOwnership::Qualified
        } else if self.has_unqualified {
            FunctionOwnership::Unqualified
        } else {
            FunctionOwnership::NoOwnershipSemantics
        }
    }

    /// Feed the next instruction of the bound function.
    ///
    /// Returns whether the function is ownership-qualified so far.
    ///
    /// # Errors
    ///
    /// [`OwnershipError::MixedOwnership`] if `inst` belongs to the other
    /// regime than an earlier instruction, in either order.
    /// [`OwnershipError::Unbound`] if [`reset`](Self::reset) was never
    /// called.
    pub fn evaluate(&mut self, id: InstId, inst: &Inst) -> Result<bool, OwnershipError> {
        let Some(function) = self.function else {
            return Err(OwnershipError::Unbound);
        };

        let conflict = match OwnershipQualifiedKind::of(inst) {
            OwnershipQualifiedKind::Qualified => {
                self.has_qualified = true;
                self.has_unqualified
            }
            OwnershipQualifiedKind::Unqualified => {
                self.has_unqualified = true;
                self.has_qualified
            }
            OwnershipQualifiedKind::NotApplicable => false,
        };

        if conflict {
            tracing::error!(
                function = ?function,
                inst = ?id,
                kind = inst.kind.mnemonic(),
                "function mixes qualified and unqualified ownership"
            );
            return Err(OwnershipError::MixedOwnership {
                function,
                inst: id,
                kind: inst.kind,
            });
        }
        Ok(self.has_qualified)
    }
}

/// Classify every instruction of `func`, in block layout order.
///
/// # Errors
///
/// Returns the first [`OwnershipError::MixedOwnership`] violation.
pub fn evaluate_function(func: &Function) -> Result<FunctionOwnership, OwnershipError> {
    let mut evaluator = FunctionOwnershipEvaluator::bound_to(func.name());
    for (id, inst) in func.instructions() {
        evaluator.evaluate(id, inst)?;
    }
    let classification = evaluator.classification();
    tracing::debug!(
        function = ?func.name(),
        ?classification,
        "ownership classified"
    );
    Ok(classification)
}

//! Modules: function declarations, their bodies, and the name interner.

use rustc_hash::FxHashMap;

use crate::function::Function;
use crate::ids::{next_raw, FuncId};
use crate::interner::{Name, StringInterner};

/// Whether a function is a compiler-synthesized thunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ThunkKind {
    /// An ordinary function.
    #[default]
    NotThunk,
    /// A thunk with some other purpose (e.g. a protocol witness).
    Thunk,
    /// A thunk whose only effect is converting between two abstraction
    /// levels of the same function type.
    ReabstractionThunk,
}

/// A function declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionDecl {
    pub name: Name,
    pub thunk: ThunkKind,
}

/// A compilation unit.
///
/// Declarations are numbered by [`FuncId`]; bodies are optional (external
/// functions have none).
#[derive(Default)]
pub struct Module {
    interner: StringInterner,
    decls: Vec<FunctionDecl>,
    by_name: FxHashMap<Name, FuncId>,
    bodies: FxHashMap<FuncId, Function>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    /// Declare a function, or return the existing declaration of that name.
    ///
    /// Redeclaring an existing name keeps the original thunk kind.
    pub fn declare(&mut self, name: &str, thunk: ThunkKind) -> FuncId {
        let name = self.interner.intern(name);
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }
        let id = FuncId::new(next_raw(self.decls.len(), "function"));
        self.decls.push(FunctionDecl { name, thunk });
        self.by_name.insert(name, id);
        id
    }

    /// Look up a declaration.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this module.
    #[inline]
    pub fn decl(&self, id: FuncId) -> &FunctionDecl {
        &self.decls[id.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<FuncId> {
        let name = self.interner.try_intern(name).ok()?;
        self.by_name.get(&name).copied()
    }

    /// The source name of a declared function.
    pub fn function_name(&self, id: FuncId) -> &'static str {
        self.interner.lookup(self.decl(id).name)
    }

    /// Attach a body to a declaration, returning any body it replaces.
    pub fn define(&mut self, id: FuncId, body: Function) -> Option<Function> {
        debug_assert_eq!(
            self.decl(id).name,
            body.name(),
            "body name does not match declaration"
        );
        self.bodies.insert(id, body)
    }

    pub fn body(&self, id: FuncId) -> Option<&Function> {
        self.bodies.get(&id)
    }

    /// All declarations, in declaration order.
    pub fn decls(&self) -> impl Iterator<Item = (FuncId, &FunctionDecl)> + '_ {
        self.decls
            .iter()
            .enumerate()
            .map(|(idx, decl)| (FuncId::new(next_raw(idx, "function")), decl))
    }
}

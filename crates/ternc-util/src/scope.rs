//! Lexical scope tree for name resolution.
//!
//! Scopes are stored as ribs in a flat arena. The parser and the LLVM
//! lowerer each keep their own tree, differing only in the per-rib info
//! payload `I` (enclosing-function context vs. basic-block wiring) and the
//! per-symbol payload `P` (type info vs. LLVM value slots).

use rustc_hash::FxHashMap;

/// Rib ID into the scope arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RibId(pub u32);

impl RibId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of rib.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RibKind {
    Root,
    Function,
    If,
    While,
}

/// Kind of symbol stored in a rib.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Arg,
    Function,
    Type,
}

/// A named binding with its phase-specific payload.
#[derive(Debug, Clone)]
pub struct Symbol<P> {
    pub kind: SymbolKind,
    pub payload: P,
}

/// A single scope (rib).
#[derive(Debug)]
pub struct Rib<I, P> {
    /// Bindings declared in this scope.
    bindings: FxHashMap<String, Symbol<P>>,
    /// Parent rib, `None` only for the root.
    parent: Option<RibId>,
    /// Kind of rib.
    pub kind: RibKind,
    /// Phase-specific payload.
    pub info: I,
}

/// Scope tree with a current-rib cursor.
///
/// Popped ribs stay in the arena (the tree owns them until it is dropped);
/// only the cursor moves. Shadowing across ribs is permitted, duplicate
/// names within one rib are rejected.
pub struct ScopeTree<I, P> {
    ribs: Vec<Rib<I, P>>,
    current: RibId,
}

impl<I, P> ScopeTree<I, P> {
    /// Create a tree containing only the root rib.
    pub fn new(root_info: I) -> Self {
        let root = Rib {
            bindings: FxHashMap::default(),
            parent: None,
            kind: RibKind::Root,
            info: root_info,
        };
        Self {
            ribs: vec![root],
            current: RibId(0),
        }
    }

    /// Enter a new scope below the current one.
    pub fn push(&mut self, kind: RibKind, info: I) -> RibId {
        let id = RibId(self.ribs.len() as u32);
        self.ribs.push(Rib {
            bindings: FxHashMap::default(),
            parent: Some(self.current),
            kind,
            info,
        });
        self.current = id;
        id
    }

    /// Leave the current scope. The root rib is never popped.
    pub fn pop(&mut self) {
        if let Some(parent) = self.ribs[self.current.index()].parent {
            self.current = parent;
        }
    }

    /// Insert a symbol into the current rib.
    ///
    /// Returns `false` if the name is already bound in this rib.
    pub fn insert(&mut self, name: &str, kind: SymbolKind, payload: P) -> bool {
        let rib = &mut self.ribs[self.current.index()];
        if rib.bindings.contains_key(name) {
            return false;
        }
        rib.bindings.insert(name.to_string(), Symbol { kind, payload });
        true
    }

    /// Insert a symbol into the parent of the current rib.
    ///
    /// Function symbols land in the scope enclosing the function's own rib.
    /// Falls back to the current rib when it is the root.
    pub fn insert_in_parent(&mut self, name: &str, kind: SymbolKind, payload: P) -> bool {
        let target = self.ribs[self.current.index()].parent.unwrap_or(self.current);
        let rib = &mut self.ribs[target.index()];
        if rib.bindings.contains_key(name) {
            return false;
        }
        rib.bindings.insert(name.to_string(), Symbol { kind, payload });
        true
    }

    /// Resolve a name by walking the parent chain, nearest rib first.
    pub fn resolve(&self, name: &str) -> Option<&Symbol<P>> {
        let mut rib_id = self.current;
        loop {
            let rib = &self.ribs[rib_id.index()];
            if let Some(symbol) = rib.bindings.get(name) {
                return Some(symbol);
            }
            match rib.parent {
                Some(parent) => rib_id = parent,
                None => return None,
            }
        }
    }

    /// Mutable variant of [`ScopeTree::resolve`].
    pub fn resolve_mut(&mut self, name: &str) -> Option<&mut Symbol<P>> {
        let mut rib_id = self.current;
        loop {
            if self.ribs[rib_id.index()].bindings.contains_key(name) {
                return self.ribs[rib_id.index()].bindings.get_mut(name);
            }
            match self.ribs[rib_id.index()].parent {
                Some(parent) => rib_id = parent,
                None => return None,
            }
        }
    }

    /// Info of the nearest enclosing rib of the given kind, current rib
    /// included.
    pub fn enclosing_info(&self, kind: RibKind) -> Option<&I> {
        let mut rib_id = self.current;
        loop {
            let rib = &self.ribs[rib_id.index()];
            if rib.kind == kind {
                return Some(&rib.info);
            }
            match rib.parent {
                Some(parent) => rib_id = parent,
                None => return None,
            }
        }
    }

    /// Mutable variant of [`ScopeTree::enclosing_info`].
    pub fn enclosing_info_mut(&mut self, kind: RibKind) -> Option<&mut I> {
        let mut rib_id = self.current;
        loop {
            if self.ribs[rib_id.index()].kind == kind {
                return Some(&mut self.ribs[rib_id.index()].info);
            }
            match self.ribs[rib_id.index()].parent {
                Some(parent) => rib_id = parent,
                None => return None,
            }
        }
    }

    /// Returns true when the current rib is the root.
    pub fn at_root(&self) -> bool {
        self.ribs[self.current.index()].parent.is_none()
    }

    /// Kind of the current rib.
    pub fn current_kind(&self) -> RibKind {
        self.ribs[self.current.index()].kind
    }

    /// Info payload of the current rib.
    pub fn current_info(&self) -> &I {
        &self.ribs[self.current.index()].info
    }

    /// Mutable info payload of the current rib.
    pub fn current_info_mut(&mut self) -> &mut I {
        &mut self.ribs[self.current.index()].info
    }
}

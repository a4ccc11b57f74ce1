//! Scope management for the analysis pipeline.
//!
//! Scopes form a tree rooted at the global scope. During analysis only the
//! chain from the current scope to the root is live for lookup, but exited
//! scopes are retained so the resolved symbol index can be built once the
//! whole unit has been analysed.
//!
//! Division of labour: the semantic actions call [`ScopeTable::enter_scope`]
//! and [`ScopeTable::exit_scope`]; the lexer calls [`ScopeTable::define`] and
//! [`ScopeTable::lookup`]. Both sides hold the table through `Rc<RefCell<_>>`;
//! the discipline is contractual, not enforced by locks.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::span::Span;
use crate::symbols::{Symbol, SymbolRef};

/// Name of the root scope.
pub const GLOBAL_SCOPE: &str = "GLOBAL";

/// Index of a scope in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(pub usize);

/// One lexical scope: a case-insensitive name map plus tree links.
#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub name: String,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    symbols: HashMap<String, SymbolRef>,
    /// Definition order, for stable enumeration.
    order: Vec<SymbolRef>,
}

impl Scope {
    /// Symbols in definition order.
    pub fn symbols(&self) -> &[SymbolRef] {
        &self.order
    }
}

/// Stack of lexical scopes with case-insensitive name resolution.
#[derive(Debug)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTable {
    pub fn new() -> Self {
        let global = Scope {
            id: ScopeId(0),
            name: GLOBAL_SCOPE.to_string(),
            parent: None,
            children: Vec::new(),
            symbols: HashMap::new(),
            order: Vec::new(),
        };
        Self {
            scopes: vec![global],
            current: ScopeId(0),
        }
    }

    /// Drop every scope and symbol and return to a fresh global scope.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Open a child of the current scope and make it current.
    pub fn enter_scope(&mut self, name: &str) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        let scope = Scope {
            id,
            name: name.to_ascii_uppercase(),
            parent: Some(self.current),
            children: Vec::new(),
            symbols: HashMap::new(),
            order: Vec::new(),
        };
        self.scopes[self.current.0].children.push(id);
        self.scopes.push(scope);
        self.current = id;
        id
    }

    /// Return to the parent scope. The global scope is never popped.
    pub fn exit_scope(&mut self) -> Option<ScopeId> {
        let parent = self.scopes[self.current.0].parent?;
        self.current = parent;
        Some(parent)
    }

    pub fn current_scope_name(&self) -> &str {
        &self.scopes[self.current.0].name
    }

    pub fn at_global_scope(&self) -> bool {
        self.current == ScopeId(0)
    }

    /// Define a fresh `Unknown` symbol in the current scope. Returns `None`
    /// when a symbol with the same (case-insensitive) name already exists
    /// there; shadowing outer scopes is allowed.
    pub fn define(&mut self, lexeme: &str, definition: Span) -> Option<SymbolRef> {
        let key = lexeme.to_ascii_uppercase();
        let scope = &mut self.scopes[self.current.0];
        if scope.symbols.contains_key(&key) {
            return None;
        }
        let symbol: SymbolRef = Rc::new(RefCell::new(Symbol::unknown(
            lexeme,
            scope.name.clone(),
            definition,
        )));
        scope.symbols.insert(key, Rc::clone(&symbol));
        scope.order.push(Rc::clone(&symbol));
        Some(symbol)
    }

    /// Resolve a name, walking from the current scope outward. Marks the
    /// found symbol as used.
    pub fn lookup(&self, name: &str) -> Option<SymbolRef> {
        let key = name.to_ascii_uppercase();
        let mut scope_id = self.current;
        loop {
            let scope = &self.scopes[scope_id.0];
            if let Some(symbol) = scope.symbols.get(&key) {
                symbol.borrow_mut().used = true;
                return Some(Rc::clone(symbol));
            }
            match scope.parent {
                Some(parent) => scope_id = parent,
                None => return None,
            }
        }
    }

    /// Resolve a name in the current scope only. Does not mark usage.
    pub fn lookup_current_scope(&self, name: &str) -> Option<SymbolRef> {
        let key = name.to_ascii_uppercase();
        self.scopes[self.current.0].symbols.get(&key).map(Rc::clone)
    }

    /// Every scope created so far, global first, in creation order.
    pub fn all_scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Symbols of the current scope in definition order.
    pub fn current_scope_symbols(&self) -> Vec<SymbolRef> {
        self.scopes[self.current.0].order.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolKind;

    fn span() -> Span {
        Span::new(0, 1, 0, 1)
    }

    #[test]
    fn test_new_table_is_global() {
        let table = ScopeTable::new();
        assert_eq!(table.current_scope_name(), GLOBAL_SCOPE);
        assert!(table.at_global_scope());
    }

    #[test]
    fn test_enter_exit() {
        let mut table = ScopeTable::new();
        table.enter_scope("P");
        assert_eq!(table.current_scope_name(), "P");
        assert!(!table.at_global_scope());

        table.exit_scope();
        assert!(table.at_global_scope());
    }

    #[test]
    fn test_global_never_pops() {
        let mut table = ScopeTable::new();
        assert!(table.exit_scope().is_none());
        assert!(table.at_global_scope());
    }

    #[test]
    fn test_define_and_lookup() {
        let mut table = ScopeTable::new();
        let sym = table.define("Counter", span()).expect("fresh name");
        assert_eq!(sym.borrow().name, "COUNTER");
        assert_eq!(sym.borrow().scope, GLOBAL_SCOPE);

        let found = table.lookup("counter").expect("case-insensitive");
        assert!(Rc::ptr_eq(&sym, &found));
    }

    #[test]
    fn test_duplicate_in_same_scope() {
        let mut table = ScopeTable::new();
        assert!(table.define("x", span()).is_some());
        assert!(table.define("X", span()).is_none());
    }

    #[test]
    fn test_shadowing_across_scopes() {
        let mut table = ScopeTable::new();
        let outer = table.define("x", span()).expect("fresh");
        table.enter_scope("F");
        let inner = table.define("x", span()).expect("shadowing allowed");
        assert!(!Rc::ptr_eq(&outer, &inner));

        let found = table.lookup("x").expect("resolves");
        assert!(Rc::ptr_eq(&inner, &found));

        table.exit_scope();
        let found = table.lookup("x").expect("resolves");
        assert!(Rc::ptr_eq(&outer, &found));
    }

    #[test]
    fn test_lookup_walks_outward() {
        let mut table = ScopeTable::new();
        table.define("g", span());
        table.enter_scope("F");
        assert!(table.lookup("g").is_some());
        assert!(table.lookup_current_scope("g").is_none());
    }

    #[test]
    fn test_lookup_marks_used() {
        let mut table = ScopeTable::new();
        let sym = table.define("x", span()).expect("fresh");
        assert!(!sym.borrow().used);
        table.lookup("x");
        assert!(sym.borrow().used);
    }

    #[test]
    fn test_exited_scopes_are_retained() {
        let mut table = ScopeTable::new();
        table.enter_scope("F");
        table.define("local", span());
        table.exit_scope();

        let names: Vec<_> = table.all_scopes().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["GLOBAL", "F"]);
        assert_eq!(table.all_scopes()[1].symbols().len(), 1);
    }

    #[test]
    fn test_reset() {
        let mut table = ScopeTable::new();
        table.define("x", span());
        table.enter_scope("F");
        table.reset();
        assert!(table.at_global_scope());
        assert!(table.lookup("x").is_none());
        assert_eq!(table.all_scopes().len(), 1);
    }

    #[test]
    fn test_symbol_mutation_through_handle() {
        let mut table = ScopeTable::new();
        let sym = table.define("p", span()).expect("fresh");
        sym.borrow_mut().claim(SymbolKind::Procedure);
        let found = table.lookup("P").expect("resolves");
        assert_eq!(found.borrow().kind, SymbolKind::Procedure);
    }
}

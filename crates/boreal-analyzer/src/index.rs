//! Resolved symbol index handed to the editor integration.
//!
//! Built once per analysis from the retained scope tree: global symbols in
//! one map, locals keyed by their owning scope. Thread-safe so the editor
//! side can query it from wherever it likes; the analysis itself writes it
//! single-threaded.

use dashmap::DashMap;

use boreal_syntax::{ScopeTable, Symbol};

/// Snapshot index of every symbol the analysis resolved.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    globals: DashMap<String, Symbol>,
    locals: DashMap<String, Vec<Symbol>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every scope of a finished analysis.
    pub fn from_scopes(table: &ScopeTable) -> Self {
        let index = Self::new();
        for scope in table.all_scopes() {
            for symbol in scope.symbols() {
                let snapshot = symbol.borrow().clone();
                if scope.parent.is_none() {
                    index.add_global(snapshot);
                } else {
                    index.add_local(&scope.name, snapshot);
                }
            }
        }
        index
    }

    pub fn add_global(&self, symbol: Symbol) {
        self.globals.insert(symbol.name.clone(), symbol);
    }

    pub fn add_local(&self, scope: &str, symbol: Symbol) {
        self.locals
            .entry(scope.to_ascii_uppercase())
            .or_default()
            .push(symbol);
    }

    /// Get a global symbol by (case-insensitive) name.
    pub fn get_global(&self, name: &str) -> Option<Symbol> {
        self.globals
            .get(&name.to_ascii_uppercase())
            .map(|r| r.clone())
    }

    pub fn all_globals(&self) -> Vec<Symbol> {
        self.globals.iter().map(|r| r.value().clone()).collect()
    }

    /// Local symbols of one scope, in definition order.
    pub fn get_locals(&self, scope: &str) -> Vec<Symbol> {
        self.locals
            .get(&scope.to_ascii_uppercase())
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Find the symbol whose definition covers an absolute offset.
    pub fn find_at_position(&self, position: usize) -> Option<Symbol> {
        for entry in &self.globals {
            if entry.value().definition.contains(position) {
                return Some(entry.value().clone());
            }
        }
        for entry in &self.locals {
            for symbol in entry.value() {
                if symbol.definition.contains(position) {
                    return Some(symbol.clone());
                }
            }
        }
        None
    }

    pub fn clear(&self) {
        self.globals.clear();
        self.locals.clear();
    }
}

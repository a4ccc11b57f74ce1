//! Parse tables: the ACTION/GOTO data the shift/reduce driver runs on.
//!
//! Tables reach the parser through the text loader ([`loader`]) or are
//! constructed from the grammar ([`slr`]). Either way they are immutable
//! after load and shared by reference across analyses.

pub mod loader;
pub mod slr;

use thiserror::Error;

use crate::grammar::{Grammar, SymbolId};

/// One ACTION cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseAction {
    Shift(u16),
    Reduce(u16),
    Accept,
}

/// Errors from table construction or loading.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("state {state}: conflict on '{symbol}' between {existing} and {incoming}")]
    Conflict {
        state: usize,
        symbol: String,
        existing: String,
        incoming: String,
    },
    #[error("table header is missing the FIN sentinel")]
    MissingFin,
    #[error("unknown symbol '{name}' in table header")]
    UnknownHeaderSymbol { name: String },
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("row {row}: cell '{cell}' is not a valid entry")]
    BadCell { row: usize, cell: String },
}

/// The ACTION and GOTO halves, indexed `[state][column]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTable {
    pub(crate) action: Vec<Vec<Option<ParseAction>>>,
    pub(crate) goto_table: Vec<Vec<Option<u16>>>,
}

impl ParseTable {
    pub fn state_count(&self) -> usize {
        self.action.len()
    }

    /// ACTION cell for a terminal in a state; `None` is a syntax error.
    pub fn action(&self, state: usize, terminal: SymbolId) -> Option<ParseAction> {
        self.action[state][terminal as usize]
    }

    /// GOTO cell for a non-terminal in a state.
    pub fn goto(&self, state: usize, grammar: &Grammar, nonterminal: SymbolId) -> Option<u16> {
        self.goto_table[state][grammar.nonterminal_index(nonterminal)]
    }

    /// Terminals with a non-empty ACTION cell in a state, in column order.
    /// This is the "expected set" reported with a syntax error.
    pub fn expected_terminals(&self, state: usize, grammar: &Grammar) -> Vec<String> {
        self.action[state]
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| {
                cell.map(|_| grammar.symbol_name(i as SymbolId).to_string())
            })
            .collect()
    }
}

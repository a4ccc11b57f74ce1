//! Lexical layer for the Boreal front-end.
//!
//! This crate owns everything the scanner needs: source spans, the token
//! vocabulary, the character-class alphabet and DFA tables, the lexer driver,
//! the scoped symbol table the lexer consults while scanning identifiers, and
//! the diagnostic type shared with the analyzer.

pub mod char_class;
pub mod dfa;
pub mod diagnostics;
pub mod lexer;
pub mod scope;
pub mod span;
pub mod symbols;
pub mod token;

pub use diagnostics::{Diagnostic, Severity};
pub use lexer::Lexer;
pub use scope::ScopeTable;
pub use span::Span;
pub use symbols::{DataType, Parameter, Symbol, SymbolKind, SymbolRef};
pub use token::{Token, TokenKind};

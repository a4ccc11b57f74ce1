//! Semantic-token stream for editor highlighting.

use serde::{Deserialize, Serialize};

use boreal_syntax::{Span, SymbolKind};

/// Highlight class of an identifier occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemTokenKind {
    Variable,
    Function,
}

impl SemTokenKind {
    /// Map a resolved symbol kind onto its highlight class.
    pub fn for_symbol(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Function | SymbolKind::Procedure | SymbolKind::Program => {
                SemTokenKind::Function
            }
            SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Unknown => {
                SemTokenKind::Variable
            }
        }
    }
}

/// One identifier occurrence, resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticToken {
    pub line: usize,
    pub column: usize,
    pub length: usize,
    pub kind: SemTokenKind,
    /// Set at the definition site only.
    pub definition: bool,
}

impl SemanticToken {
    pub fn new(span: Span, kind: SemTokenKind, definition: bool) -> Self {
        Self {
            line: span.line,
            column: span.column,
            length: span.length,
            kind,
            definition,
        }
    }
}

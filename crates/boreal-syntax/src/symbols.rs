//! Symbol records attached to identifier tokens and scope entries.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Shared handle to a symbol. The lexer attaches these to identifier tokens;
/// the semantic actions mutate the record as declarations complete.
pub type SymbolRef = Rc<RefCell<Symbol>>;

/// What a name denotes. A symbol is born `Unknown` when the lexer defines it
/// and moves to a concrete kind exactly once, when its declaration reduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Unknown,
    Variable,
    Parameter,
    Function,
    Procedure,
    Program,
}

/// The scalar types of Boreal plus the absence of one. `REAL` and `CHAR`
/// are reserved words but not admitted types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Integer,
    Boolean,
    String,
    Void,
}

impl DataType {
    /// Memory cells occupied by a value of this type.
    pub fn size(self) -> usize {
        match self {
            DataType::Integer | DataType::Boolean => 1,
            DataType::String => 64,
            DataType::Void => 0,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "integer",
            DataType::Boolean => "boolean",
            DataType::String => "string",
            DataType::Void => "void",
        };
        write!(f, "{name}")
    }
}

/// A formal parameter of a procedure or function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub data_type: DataType,
    pub by_reference: bool,
}

/// A named entity: variable, parameter, subprogram or the program itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    /// Upper-cased lookup key.
    pub name: String,
    /// The identifier as written at the definition site.
    pub lexeme: String,
    pub kind: SymbolKind,
    pub data_type: DataType,
    /// Name of the scope the symbol was defined in.
    pub scope: String,
    /// Displacement inside the owning activation record.
    pub offset: usize,
    pub params: Vec<Parameter>,
    /// Functions only.
    pub return_type: Option<DataType>,
    /// Reserved for code generation.
    pub label: Option<usize>,
    /// Set by every successful lookup.
    pub used: bool,
    pub definition: Span,
}

impl Symbol {
    /// A freshly scanned identifier, not yet claimed by any declaration.
    pub fn unknown(lexeme: impl Into<String>, scope: impl Into<String>, definition: Span) -> Self {
        let lexeme = lexeme.into();
        Self {
            name: lexeme.to_ascii_uppercase(),
            lexeme,
            kind: SymbolKind::Unknown,
            data_type: DataType::Void,
            scope: scope.into(),
            offset: 0,
            params: Vec::new(),
            return_type: None,
            label: None,
            used: false,
            definition,
        }
    }

    /// Move from `Unknown` to a concrete kind. Returns false (and leaves the
    /// record alone) if the symbol was already claimed.
    pub fn claim(&mut self, kind: SymbolKind) -> bool {
        if self.kind != SymbolKind::Unknown {
            return false;
        }
        self.kind = kind;
        true
    }

    pub fn is_subprogram(&self) -> bool {
        matches!(self.kind, SymbolKind::Function | SymbolKind::Procedure)
    }

    pub fn is_value(&self) -> bool {
        matches!(self.kind, SymbolKind::Variable | SymbolKind::Parameter)
    }

    /// Parameter types, space-joined, for display and arity messages.
    pub fn param_type_string(&self) -> String {
        self.params
            .iter()
            .map(|p| p.data_type.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Parameter passing modes, space-joined (`value` / `reference`).
    pub fn param_mode_string(&self) -> String {
        self.params
            .iter()
            .map(|p| if p.by_reference { "reference" } else { "value" })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 1, 0, 3)
    }

    #[test]
    fn test_unknown_symbol() {
        let sym = Symbol::unknown("Foo", "GLOBAL", span());
        assert_eq!(sym.name, "FOO");
        assert_eq!(sym.lexeme, "Foo");
        assert_eq!(sym.kind, SymbolKind::Unknown);
        assert_eq!(sym.data_type, DataType::Void);
        assert!(!sym.used);
    }

    #[test]
    fn test_claim_once() {
        let mut sym = Symbol::unknown("x", "GLOBAL", span());
        assert!(sym.claim(SymbolKind::Variable));
        assert_eq!(sym.kind, SymbolKind::Variable);
        // A second claim must not move the kind backwards or sideways.
        assert!(!sym.claim(SymbolKind::Function));
        assert_eq!(sym.kind, SymbolKind::Variable);
    }

    #[test]
    fn test_type_sizes() {
        assert_eq!(DataType::Integer.size(), 1);
        assert_eq!(DataType::Boolean.size(), 1);
        assert_eq!(DataType::String.size(), 64);
        assert_eq!(DataType::Void.size(), 0);
    }

    #[test]
    fn test_param_strings() {
        let mut sym = Symbol::unknown("f", "GLOBAL", span());
        sym.params = vec![
            Parameter {
                name: "A".into(),
                data_type: DataType::Integer,
                by_reference: false,
            },
            Parameter {
                name: "B".into(),
                data_type: DataType::String,
                by_reference: true,
            },
        ];
        assert_eq!(sym.param_type_string(), "integer string");
        assert_eq!(sym.param_mode_string(), "value reference");
    }

    #[test]
    fn test_kind_predicates() {
        let mut sym = Symbol::unknown("p", "GLOBAL", span());
        sym.claim(SymbolKind::Procedure);
        assert!(sym.is_subprogram());
        assert!(!sym.is_value());
    }
}

//! Synthesised attributes flowing up the parse.
//!
//! Every grammar symbol on the stacks carries one [`Attributes`] record. The
//! hundred-odd semantic actions share many fields — type tag, span, return
//! and exit propagation, sizes — so a single struct of optional fields keeps
//! the action code uniform at the cost of a few unused slots per reduction.

use boreal_syntax::{DataType, Span, SymbolRef, Token, TokenKind};

use crate::types::TypeTag;

/// A formal parameter synthesised by the header productions.
#[derive(Debug, Clone)]
pub struct ParamAttr {
    pub name: String,
    pub data_type: DataType,
    pub by_reference: bool,
    pub span: Span,
}

/// A call or write argument synthesised by the list productions.
#[derive(Debug, Clone)]
pub struct ArgAttr {
    pub tag: TypeTag,
    pub span: Span,
}

/// A `return` observed somewhere in a statement subtree.
#[derive(Debug, Clone, Copy)]
pub struct ReturnAttr {
    pub tag: TypeTag,
    pub site: Span,
}

/// Attributes of one stack entry.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    /// Synthesised expression type.
    pub tag: TypeTag,
    /// Resolved symbol, for identifier tokens and name non-terminals.
    pub symbol: Option<SymbolRef>,
    /// Integer literal value.
    pub value: i64,
    /// Token text, carried for messages.
    pub lexeme: String,
    /// Declared data type, for `type_spec`.
    pub data_type: Option<DataType>,
    /// Parameter list fragments.
    pub params: Vec<ParamAttr>,
    /// Argument list fragments.
    pub args: Vec<ArgAttr>,
    /// Return propagation: whether and where the subtree returns.
    pub ret: Option<ReturnAttr>,
    /// `exit when` occurrences not yet absorbed by a loop.
    pub exits: usize,
    /// Earliest unabsorbed exit site.
    pub exit_site: Option<Span>,
    /// `program` declarations seen in the subtree.
    pub programs: usize,
    /// Memory size of a declaration.
    pub size: usize,
    /// Source range covered by the symbol.
    pub span: Span,
}

impl Attributes {
    /// Attributes for a freshly shifted token.
    pub fn from_token(token: &Token) -> Self {
        let value = if token.kind == TokenKind::IntLiteral {
            token.lexeme.parse().unwrap_or(0)
        } else {
            0
        };
        Self {
            symbol: token.symbol.clone(),
            value,
            lexeme: token.lexeme.clone(),
            span: token.span,
            ..Self::default()
        }
    }

    /// A result carrying just a type tag.
    pub fn tagged(tag: TypeTag) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }

    /// Merge a child's return/exit propagation into this record, preferring
    /// the earliest informative sites. Returns a conflicting child return,
    /// if any, for the caller to report.
    pub fn absorb_flow(&mut self, child: &Attributes) -> Option<(ReturnAttr, ReturnAttr)> {
        let mut conflict = None;
        if let Some(child_ret) = child.ret {
            match self.ret {
                None => self.ret = Some(child_ret),
                Some(mine) => {
                    if mine.tag != child_ret.tag
                        && !mine.tag.is_error()
                        && !child_ret.tag.is_error()
                    {
                        conflict = Some((mine, child_ret));
                    }
                }
            }
        }
        self.exits += child.exits;
        if self.exit_site.is_none() {
            self.exit_site = child.exit_site;
        }
        self.programs += child.programs;
        conflict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_token_parses_int_value() {
        let token = Token::new(TokenKind::IntLiteral, "32767", Span::new(0, 1, 0, 5));
        let attrs = Attributes::from_token(&token);
        assert_eq!(attrs.value, 32_767);
        assert_eq!(attrs.lexeme, "32767");
        assert_eq!(attrs.span.length, 5);
    }

    #[test]
    fn test_from_token_non_literal() {
        let token = Token::new(TokenKind::Identifier, "x", Span::new(3, 1, 3, 1));
        let attrs = Attributes::from_token(&token);
        assert_eq!(attrs.value, 0);
        assert_eq!(attrs.tag, TypeTag::Empty);
    }

    #[test]
    fn test_absorb_flow_sums_exits() {
        let mut parent = Attributes::default();
        let mut child = Attributes::default();
        child.exits = 1;
        child.exit_site = Some(Span::new(5, 1, 5, 4));
        parent.absorb_flow(&child);
        let mut second = Attributes::default();
        second.exits = 1;
        second.exit_site = Some(Span::new(20, 2, 0, 4));
        parent.absorb_flow(&second);

        assert_eq!(parent.exits, 2);
        // The earliest site wins.
        assert_eq!(parent.exit_site.map(|s| s.position), Some(5));
    }

    #[test]
    fn test_absorb_flow_keeps_first_return() {
        let mut parent = Attributes::default();
        let mut first = Attributes::default();
        first.ret = Some(ReturnAttr {
            tag: TypeTag::Integer,
            site: Span::new(2, 1, 2, 6),
        });
        assert!(parent.absorb_flow(&first).is_none());

        let mut same = Attributes::default();
        same.ret = Some(ReturnAttr {
            tag: TypeTag::Integer,
            site: Span::new(30, 3, 0, 6),
        });
        assert!(parent.absorb_flow(&same).is_none());
        assert_eq!(parent.ret.map(|r| r.site.position), Some(2));
    }

    #[test]
    fn test_absorb_flow_reports_conflict() {
        let mut parent = Attributes::default();
        let mut first = Attributes::default();
        first.ret = Some(ReturnAttr {
            tag: TypeTag::Integer,
            site: Span::new(2, 1, 2, 6),
        });
        parent.absorb_flow(&first);

        let mut clash = Attributes::default();
        clash.ret = Some(ReturnAttr {
            tag: TypeTag::Str,
            site: Span::new(40, 4, 0, 6),
        });
        let conflict = parent.absorb_flow(&clash);
        let (mine, theirs) = conflict.expect("tags disagree");
        assert_eq!(mine.tag, TypeTag::Integer);
        assert_eq!(theirs.tag, TypeTag::Str);
    }

    #[test]
    fn test_absorb_flow_error_tag_is_quiet() {
        let mut parent = Attributes::default();
        let mut first = Attributes::default();
        first.ret = Some(ReturnAttr {
            tag: TypeTag::Error,
            site: Span::default(),
        });
        parent.absorb_flow(&first);

        let mut second = Attributes::default();
        second.ret = Some(ReturnAttr {
            tag: TypeTag::Integer,
            site: Span::default(),
        });
        assert!(parent.absorb_flow(&second).is_none());
    }
}

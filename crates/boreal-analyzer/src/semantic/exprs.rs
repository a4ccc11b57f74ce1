//! Actions for expressions: type synthesis against the operator matrix,
//! name references and call checking.

use boreal_syntax::SymbolKind;

use crate::attributes::Attributes;
use crate::parser::StackView;
use crate::types::{BinaryOp, TypeTag, UnaryOp};

use super::SemanticActions;

impl SemanticActions {
    /// Binary operator productions: left operand at position 3, right at 1.
    ///
    /// An operand already tagged `type_error` keeps the node quiet; one
    /// diagnostic per offending leaf is enough.
    pub(super) fn binary(&mut self, stack: &StackView<'_>, op: BinaryOp) -> Attributes {
        let left = stack.attr(3);
        let right = stack.attr(1);
        let span = left.span.to(right.span);

        if left.tag.is_error()
            || right.tag.is_error()
            || left.tag == TypeTag::Empty
            || right.tag == TypeTag::Empty
        {
            return Attributes {
                tag: TypeTag::Error,
                span,
                ..Attributes::default()
            };
        }
        let tag = match op.result(left.tag, right.tag) {
            Some(tag) => tag,
            None => {
                self.error(
                    format!(
                        "Operator '{}' is not defined for {} and {}",
                        op.symbol(),
                        left.tag,
                        right.tag
                    ),
                    span,
                    "E0402",
                );
                TypeTag::Error
            }
        };
        Attributes {
            tag,
            span,
            ..Attributes::default()
        }
    }

    /// Unary operator productions: operand at position 1.
    pub(super) fn unary(&mut self, stack: &StackView<'_>, op: UnaryOp) -> Attributes {
        let operand = stack.attr(1);
        let span = stack.attr(2).span.to(operand.span);

        if operand.tag.is_error() || operand.tag == TypeTag::Empty {
            return Attributes {
                tag: TypeTag::Error,
                span,
                ..Attributes::default()
            };
        }
        let tag = match op.result(operand.tag) {
            Some(tag) => tag,
            None => {
                self.error(
                    format!(
                        "Operator '{}' is not defined for {}",
                        op.symbol(),
                        operand.tag
                    ),
                    span,
                    "E0402",
                );
                TypeTag::Error
            }
        };
        Attributes {
            tag,
            span,
            ..Attributes::default()
        }
    }

    /// `primary -> id`: a value reference, or a call without arguments.
    pub(super) fn value_reference(&mut self, stack: &StackView<'_>) -> Attributes {
        let id = stack.attr(1).clone();
        self.emit_use(&id);

        let Some(symbol) = id.symbol.clone() else {
            // Resolution failed earlier; the scanner already reported it.
            return Attributes {
                tag: TypeTag::Error,
                span: id.span,
                ..Attributes::default()
            };
        };
        let (kind, data_type, return_type, lexeme) = {
            let sym = symbol.borrow();
            (sym.kind, sym.data_type, sym.return_type, sym.lexeme.clone())
        };
        let tag = match kind {
            SymbolKind::Variable | SymbolKind::Parameter => TypeTag::from(data_type),
            SymbolKind::Function => {
                self.check_arguments(&symbol, &[], id.span);
                return_type.map_or(TypeTag::Error, TypeTag::from)
            }
            SymbolKind::Procedure => {
                self.error(
                    format!("Procedure '{lexeme}' cannot appear in an expression"),
                    id.span,
                    "E0412",
                );
                TypeTag::Error
            }
            SymbolKind::Program => {
                self.error("The main program cannot be called", id.span, "E0604");
                TypeTag::Error
            }
            SymbolKind::Unknown => TypeTag::Error,
        };
        Attributes {
            tag,
            symbol: Some(symbol),
            span: id.span,
            ..Attributes::default()
        }
    }

    /// `primary -> id ( arg_list )`: a function call in an expression.
    pub(super) fn call_expression(&mut self, stack: &StackView<'_>) -> Attributes {
        let id = stack.attr(4).clone();
        let args = stack.attr(2).args.clone();
        let span = id.span.to(stack.attr(1).span);
        self.emit_use(&id);

        let Some(symbol) = id.symbol.clone() else {
            return Attributes {
                tag: TypeTag::Error,
                span,
                ..Attributes::default()
            };
        };
        let (kind, return_type, lexeme) = {
            let sym = symbol.borrow();
            (sym.kind, sym.return_type, sym.lexeme.clone())
        };
        let tag = match kind {
            SymbolKind::Function => {
                self.check_arguments(&symbol, &args, id.span);
                return_type.map_or(TypeTag::Error, TypeTag::from)
            }
            SymbolKind::Procedure => {
                self.error(
                    format!("Procedure '{lexeme}' cannot appear in an expression"),
                    id.span,
                    "E0412",
                );
                TypeTag::Error
            }
            SymbolKind::Program => {
                self.error("The main program cannot be called", id.span, "E0604");
                TypeTag::Error
            }
            SymbolKind::Unknown => TypeTag::Error,
            _ => {
                self.error(format!("'{lexeme}' is not a function"), id.span, "E0413");
                TypeTag::Error
            }
        };
        Attributes {
            tag,
            span,
            ..Attributes::default()
        }
    }

    /// `relation -> simple_expr in ( arg_list )`
    pub(super) fn in_list(&mut self, stack: &StackView<'_>) -> Attributes {
        let left = stack.attr(5);
        let args = stack.attr(2).args.clone();
        let span = left.span.to(stack.attr(1).span);
        let mut ok = true;

        if left.tag.is_error() || left.tag == TypeTag::Empty {
            ok = false;
        } else if left.tag != TypeTag::Integer {
            self.error("IN operand must be integer", left.span, "E0402");
            ok = false;
        }
        for arg in &args {
            if arg.tag.is_error() || arg.tag == TypeTag::Empty {
                continue;
            }
            if arg.tag != TypeTag::Integer {
                self.error("IN list elements must be integer", arg.span, "E0402");
                ok = false;
            }
        }
        Attributes {
            tag: if ok { TypeTag::Logical } else { TypeTag::Error },
            span,
            ..Attributes::default()
        }
    }

    /// `primary -> max ( arg_list ) | min ( arg_list )`
    pub(super) fn extremum(&mut self, stack: &StackView<'_>, name: &str) -> Attributes {
        let args = stack.attr(2).args.clone();
        let span = stack.attr(4).span.to(stack.attr(1).span);
        for arg in &args {
            if arg.tag.is_error() || arg.tag == TypeTag::Empty {
                continue;
            }
            if arg.tag != TypeTag::Integer {
                self.error(
                    format!("{name} argument must be integer"),
                    arg.span,
                    "E0402",
                );
            }
        }
        Attributes {
            tag: TypeTag::Integer,
            span,
            ..Attributes::default()
        }
    }
}

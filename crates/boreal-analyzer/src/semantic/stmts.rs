//! Actions for statements: assignment, calls, I/O, and the control-flow
//! checks with their return/exit propagation.

use boreal_syntax::{DataType, SymbolKind};

use crate::attributes::{ArgAttr, Attributes, ReturnAttr};
use crate::parser::StackView;
use crate::types::TypeTag;

use super::SemanticActions;

impl SemanticActions {
    /// `stmt_seq -> stmt_seq statement ;`
    pub(super) fn stmt_seq(&mut self, stack: &StackView<'_>) -> Attributes {
        self.combine(stack, &[3, 2])
    }

    /// `assign_stmt -> id := expression`
    pub(super) fn assign(&mut self, stack: &StackView<'_>) -> Attributes {
        let id = stack.attr(3).clone();
        let expr = stack.attr(1).clone();
        self.emit_use(&id);

        if let Some(symbol) = &id.symbol {
            let (kind, data_type, lexeme) = {
                let sym = symbol.borrow();
                (sym.kind, sym.data_type, sym.lexeme.clone())
            };
            match kind {
                SymbolKind::Function | SymbolKind::Procedure | SymbolKind::Program => {
                    self.error(format!("Cannot assign to '{lexeme}'"), id.span, "E0603");
                }
                SymbolKind::Variable | SymbolKind::Parameter => {
                    let expected = TypeTag::from(data_type);
                    if !expr.tag.is_error()
                        && expr.tag != TypeTag::Empty
                        && expr.tag != expected
                    {
                        self.error(
                            format!("{expected} is not compatible with {}", expr.tag),
                            expr.span,
                            "E0401",
                        );
                    }
                }
                SymbolKind::Unknown => {}
            }
        }
        Attributes::default()
    }

    /// `call_stmt -> id` / `call_stmt -> id ( arg_list )`
    pub(super) fn call_statement(
        &mut self,
        stack: &StackView<'_>,
        id_at: usize,
        args: &[ArgAttr],
    ) -> Attributes {
        let id = stack.attr(id_at).clone();
        self.emit_use(&id);

        let Some(symbol) = id.symbol.clone() else {
            return Attributes::default();
        };
        let (kind, lexeme) = {
            let sym = symbol.borrow();
            (sym.kind, sym.lexeme.clone())
        };
        match kind {
            SymbolKind::Procedure => self.check_arguments(&symbol, args, id.span),
            SymbolKind::Program => {
                self.error("The main program cannot be called", id.span, "E0604");
            }
            SymbolKind::Unknown => {}
            _ => {
                self.error(format!("'{lexeme}' is not a procedure"), id.span, "E0407");
            }
        }
        Attributes::default()
    }

    /// `repeat_stmt -> repeat stmt_seq until expression`
    ///
    /// The until-condition must be logical; a repeat block absorbs the exit
    /// counts of its body the way a loop does.
    pub(super) fn repeat_stmt(&mut self, stack: &StackView<'_>) -> Attributes {
        self.expect_logical(stack.attr(1), "UNTIL condition must be logical");
        let mut result = self.combine(stack, &[3]);
        result.exits = 0;
        result.exit_site = None;
        result
    }

    /// `for_stmt -> for id := expression to expression do statement`
    pub(super) fn for_stmt(&mut self, stack: &StackView<'_>) -> Attributes {
        let id = stack.attr(7).clone();
        self.emit_use(&id);
        if let Some(symbol) = &id.symbol {
            let data_type = symbol.borrow().data_type;
            let is_value = symbol.borrow().is_value();
            if is_value && data_type != DataType::Integer {
                self.error("FOR control variable must be integer", id.span, "E0408");
            }
        }
        for bound_at in [5, 3] {
            let bound = stack.attr(bound_at);
            if !bound.tag.is_error()
                && bound.tag != TypeTag::Empty
                && bound.tag != TypeTag::Integer
            {
                self.error("FOR bound must be integer", bound.span, "E0408");
            }
        }
        self.combine(stack, &[1])
    }

    /// `case_stmt -> case expression of case_arm_seq case_else end`
    pub(super) fn case_stmt(&mut self, stack: &StackView<'_>) -> Attributes {
        let selector = stack.attr(5);
        if !selector.tag.is_error()
            && selector.tag != TypeTag::Empty
            && selector.tag != TypeTag::Integer
        {
            self.error("CASE selector must be integer", selector.span, "E0406");
        }
        self.combine(stack, &[3, 2])
    }

    /// `loop_stmt -> loop stmt_seq end`
    ///
    /// A loop must contain at least one exit; whatever it contains is
    /// absorbed here and does not propagate further.
    pub(super) fn loop_stmt(&mut self, stack: &StackView<'_>) -> Attributes {
        let keyword = stack.attr(3).span;
        let mut result = self.combine(stack, &[2]);
        if result.exits == 0 {
            self.error("Loop must contain at least one exit", keyword, "E0501");
        }
        result.exits = 0;
        result.exit_site = None;
        result
    }

    /// `exit_stmt -> exit when expression`
    pub(super) fn exit_stmt(&mut self, stack: &StackView<'_>) -> Attributes {
        self.expect_logical(stack.attr(1), "EXIT WHEN condition must be logical");
        Attributes {
            exits: 1,
            exit_site: Some(stack.attr(3).span),
            ..Attributes::default()
        }
    }

    /// `return_stmt -> return`
    pub(super) fn return_bare(&mut self, stack: &StackView<'_>) -> Attributes {
        let site = stack.attr(1).span;
        let mut tag = TypeTag::Empty;
        if let Some(unit) = self.current_unit().cloned() {
            if unit.borrow().kind == SymbolKind::Function {
                self.error("RETURN in a function must return a value", site, "E0605");
                tag = TypeTag::Error;
            }
        }
        Attributes {
            ret: Some(ReturnAttr { tag, site }),
            ..Attributes::default()
        }
    }

    /// `return_stmt -> return expression`
    pub(super) fn return_value(&mut self, stack: &StackView<'_>) -> Attributes {
        let expr = stack.attr(1).clone();
        let site = stack.attr(2).span.to(expr.span);
        let mut tag = expr.tag;

        match self.current_unit().cloned() {
            Some(unit) if unit.borrow().kind == SymbolKind::Function => {
                let expected = TypeTag::from(
                    unit.borrow().return_type.unwrap_or(DataType::Void),
                );
                if expr.tag.is_error() || expr.tag == TypeTag::Empty {
                    tag = TypeTag::Error;
                } else if expr.tag != expected {
                    self.error(
                        format!("{expected} is not compatible with {}", expr.tag),
                        expr.span,
                        "E0409",
                    );
                    tag = TypeTag::Error;
                } else {
                    tag = expected;
                }
            }
            _ => {
                self.error("Only a function may return a value", site, "E0605");
                tag = TypeTag::Error;
            }
        }
        Attributes {
            ret: Some(ReturnAttr { tag, site }),
            ..Attributes::default()
        }
    }

    /// One identifier of a `read` list.
    pub(super) fn read_item(&mut self, stack: &StackView<'_>, id_at: usize) -> Attributes {
        let id = stack.attr(id_at).clone();
        self.emit_use(&id);
        if let Some(symbol) = &id.symbol {
            let sym = symbol.borrow();
            let readable = sym.is_value()
                && matches!(sym.data_type, DataType::Integer | DataType::String);
            if sym.kind != SymbolKind::Unknown && !readable {
                drop(sym);
                self.error("READ argument must be integer or string", id.span, "E0410");
            }
        }
        Attributes::default()
    }

    /// `write_stmt -> write write_args | writeln write_args`
    pub(super) fn write_stmt(&mut self, stack: &StackView<'_>) -> Attributes {
        let args = stack.attr(1).args.clone();
        for arg in &args {
            if arg.tag.is_error() || arg.tag == TypeTag::Empty {
                continue;
            }
            if !matches!(arg.tag, TypeTag::Integer | TypeTag::Str) {
                self.error("WRITE argument must be integer or string", arg.span, "E0411");
            }
        }
        Attributes::default()
    }
}

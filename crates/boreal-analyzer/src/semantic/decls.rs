//! Actions for headers and declarations: scope entry and exit, the lexer's
//! declaring flag, offsets and labels.

use boreal_syntax::{DataType, Lexer, Parameter, SymbolKind};

use crate::attributes::{Attributes, ParamAttr};
use crate::parser::StackView;
use crate::semantic_tokens::SemTokenKind;

use super::SemanticActions;

impl SemanticActions {
    /// `program_name -> program id`
    ///
    /// The program symbol takes label 1 and opens its scope; declarations
    /// that follow the header land inside it. The declaring flag stays on.
    pub(super) fn program_name(&mut self, stack: &StackView<'_>, lexer: &mut Lexer) -> Attributes {
        let id = stack.attr(1);
        let mut result = Attributes {
            programs: 1,
            ..Attributes::default()
        };
        self.program_sites.push(id.span);

        if let Some(symbol) = &id.symbol {
            if symbol.borrow_mut().claim(SymbolKind::Program) {
                symbol.borrow_mut().label = Some(1);
            }
            self.emit_definition(id.span, SemTokenKind::Function);
            self.symbols.borrow_mut().enter_scope(&id.lexeme);
            self.displacement.push(0);
            self.unit_stack.push(symbol.clone());
            result.symbol = Some(symbol.clone());
        }
        lexer.set_declaring(true);
        result
    }

    /// `procedure_name -> procedure id` / `function_name -> function id`
    pub(super) fn subprogram_name(
        &mut self,
        stack: &StackView<'_>,
        lexer: &mut Lexer,
        kind: SymbolKind,
    ) -> Attributes {
        let id = stack.attr(1);
        let mut result = Attributes::default();

        if let Some(symbol) = &id.symbol {
            if symbol.borrow_mut().claim(kind) {
                symbol.borrow_mut().label = Some(self.next_label);
                self.next_label += 1;
            }
            self.emit_definition(id.span, SemTokenKind::Function);
            self.symbols.borrow_mut().enter_scope(&id.lexeme);
            self.displacement.push(0);
            self.unit_stack.push(symbol.clone());
            result.symbol = Some(symbol.clone());
        }
        lexer.set_declaring(true);
        result
    }

    /// `procedure_header -> procedure_name param_clause ;` and the function
    /// variant: attach the synthesised signature to the unit symbol before
    /// the body parses, so recursive calls check against it.
    pub(super) fn subprogram_header(
        &mut self,
        stack: &StackView<'_>,
        name_at: usize,
        clause_at: usize,
        return_type: Option<DataType>,
    ) -> Attributes {
        let name = stack.attr(name_at);
        let clause = stack.attr(clause_at);
        if let Some(symbol) = &name.symbol {
            let mut sym = symbol.borrow_mut();
            sym.params = clause
                .params
                .iter()
                .map(|p| Parameter {
                    name: p.name.clone(),
                    data_type: p.data_type,
                    by_reference: p.by_reference,
                })
                .collect();
            if let Some(return_type) = return_type {
                sym.return_type = Some(return_type);
                sym.data_type = return_type;
            }
        }
        Attributes {
            symbol: name.symbol.clone(),
            ..Attributes::default()
        }
    }

    /// `param -> id : type_spec` / `param -> var id : type_spec`
    pub(super) fn param(
        &mut self,
        stack: &StackView<'_>,
        id_at: usize,
        type_at: usize,
        by_reference: bool,
    ) -> Attributes {
        let id = stack.attr(id_at);
        let data_type = stack.attr(type_at).data_type.unwrap_or(DataType::Integer);

        if let Some(symbol) = &id.symbol {
            let mut sym = symbol.borrow_mut();
            if sym.claim(SymbolKind::Parameter) {
                sym.data_type = data_type;
                let counter = self.displacement.last_mut().expect("counter per scope");
                sym.offset = *counter;
                *counter += data_type.size();
            }
        }
        self.emit_definition(id.span, SemTokenKind::Variable);

        Attributes {
            params: vec![ParamAttr {
                name: id.lexeme.clone(),
                data_type,
                by_reference,
                span: id.span,
            }],
            ..Attributes::default()
        }
    }

    /// `var_decl -> var id : type_spec ;`
    pub(super) fn var_decl(&mut self, stack: &StackView<'_>) -> Attributes {
        let id = stack.attr(4);
        let data_type = stack.attr(2).data_type.unwrap_or(DataType::Integer);
        let size = data_type.size();

        if let Some(symbol) = &id.symbol {
            let mut sym = symbol.borrow_mut();
            if sym.claim(SymbolKind::Variable) {
                sym.data_type = data_type;
                let counter = self.displacement.last_mut().expect("counter per scope");
                sym.offset = *counter;
                *counter += size;
            }
        }
        self.emit_definition(id.span, SemTokenKind::Variable);

        Attributes {
            symbol: id.symbol.clone(),
            size,
            ..Attributes::default()
        }
    }

    /// `type_spec -> integer | boolean | string` by production number.
    pub(super) fn type_spec(&mut self, production: usize) -> Attributes {
        let data_type = match production {
            11 => DataType::Integer,
            12 => DataType::Boolean,
            _ => DataType::String,
        };
        Attributes {
            data_type: Some(data_type),
            ..Attributes::default()
        }
    }

    /// `procedure_decl -> procedure_header sub_body ;` and the function
    /// variant: body-level checks, then back to the enclosing scope with the
    /// declaring flag on for whatever declarations follow.
    pub(super) fn subprogram_decl(&mut self, stack: &StackView<'_>, lexer: &mut Lexer) -> Attributes {
        let header = stack.attr(3);
        let body = stack.attr(2).clone();

        if body.exits > 0 {
            let site = body.exit_site.unwrap_or(body.span);
            self.error("Exit statement outside of loop", site, "E0502");
        }
        if let Some(symbol) = &header.symbol {
            let sym = symbol.borrow();
            if sym.kind == SymbolKind::Function && body.ret.is_none() {
                let span = sym.definition;
                let name = sym.lexeme.clone();
                drop(sym);
                self.warn(
                    format!("Function '{name}' may not return a value"),
                    span,
                    "W0501",
                );
            }
        }

        self.symbols.borrow_mut().exit_scope();
        self.displacement.pop();
        self.unit_stack.pop();
        lexer.set_declaring(true);
        Attributes::default()
    }

    /// `goal -> decl_seq main_body`: checks over the whole unit, then the
    /// scope stack is unwound to the global scope.
    pub(super) fn goal(&mut self, stack: &StackView<'_>) -> Attributes {
        let mut result = self.combine(stack, &[2]);
        let main = stack.attr(1).clone();

        if main.exits > 0 {
            let site = main.exit_site.unwrap_or(main.span);
            self.error("Exit statement outside of loop", site, "E0502");
        }
        result.programs += main.programs;

        let mut symbols = self.symbols.borrow_mut();
        while !symbols.at_global_scope() {
            symbols.exit_scope();
        }
        drop(symbols);
        self.unit_stack.clear();
        self.displacement.truncate(1);
        result
    }
}

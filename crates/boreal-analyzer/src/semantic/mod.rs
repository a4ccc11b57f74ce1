//! Semantic actions: one per grammar production.
//!
//! The parser invokes [`SemanticActions::reduce`] on every reduction. The
//! dispatch below is numbered by production; the declaration, statement and
//! expression groups live in their own files as `impl` blocks.
//!
//! The actions own the analysis-wide state the grammar cannot carry: the
//! scope discipline (enter/exit, the lexer's declaring flag), displacement
//! counters, the label counter, and the diagnostic and semantic-token sinks.

mod decls;
mod exprs;
mod stmts;

use std::cell::RefCell;
use std::rc::Rc;

use boreal_syntax::{Diagnostic, Lexer, ScopeTable, Span, SymbolKind, SymbolRef};

use crate::attributes::{ArgAttr, Attributes};
use crate::parser::{Reductions, StackView};
use crate::semantic_tokens::{SemTokenKind, SemanticToken};
use crate::types::TypeTag;

pub struct SemanticActions {
    symbols: Rc<RefCell<ScopeTable>>,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    tokens: Vec<SemanticToken>,
    /// Program/procedure/function owning the scope we are inside.
    unit_stack: Vec<SymbolRef>,
    /// Displacement counter per open scope; index 0 is the global counter.
    displacement: Vec<usize>,
    /// Subprogram labels count up from 2; label 1 is the program's.
    next_label: usize,
    /// Definition sites of every `program` header, for the uniqueness check.
    program_sites: Vec<Span>,
}

impl SemanticActions {
    pub fn new(symbols: Rc<RefCell<ScopeTable>>) -> Self {
        Self {
            symbols,
            errors: Vec::new(),
            warnings: Vec::new(),
            tokens: Vec::new(),
            unit_stack: Vec::new(),
            displacement: vec![0],
            next_label: 2,
            program_sites: Vec::new(),
        }
    }

    pub fn take_errors(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.errors)
    }

    pub fn take_warnings(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.warnings)
    }

    pub fn take_tokens(&mut self) -> Vec<SemanticToken> {
        std::mem::take(&mut self.tokens)
    }

    pub fn program_sites(&self) -> &[Span] {
        &self.program_sites
    }

    // ----- shared helpers -------------------------------------------------

    fn error(&mut self, message: impl Into<String>, span: Span, code: &str) {
        self.errors
            .push(Diagnostic::error(message, span).with_code(code));
    }

    fn warn(&mut self, message: impl Into<String>, span: Span, code: &str) {
        self.warnings
            .push(Diagnostic::warning(message, span).with_code(code));
    }

    fn current_unit(&self) -> Option<&SymbolRef> {
        self.unit_stack.last()
    }

    /// Record a resolved identifier occurrence for highlighting.
    fn emit_use(&mut self, attrs: &Attributes) {
        if let Some(symbol) = &attrs.symbol {
            let kind = SemTokenKind::for_symbol(symbol.borrow().kind);
            self.tokens.push(SemanticToken::new(attrs.span, kind, false));
        }
    }

    fn emit_definition(&mut self, span: Span, kind: SemTokenKind) {
        self.tokens.push(SemanticToken::new(span, kind, true));
    }

    /// Condition check shared by the structured statements.
    fn expect_logical(&mut self, expr: &Attributes, message: &str) {
        if expr.tag.is_error() || expr.tag == TypeTag::Empty {
            return;
        }
        if expr.tag != TypeTag::Logical {
            self.error(message, expr.span, "E0405");
        }
    }

    /// Arity and argument typing for a call of `symbol` with `args`.
    fn check_arguments(&mut self, symbol: &SymbolRef, args: &[ArgAttr], call_span: Span) {
        let (name, params) = {
            let sym = symbol.borrow();
            (sym.lexeme.clone(), sym.params.clone())
        };
        if args.len() != params.len() {
            self.error(
                format!(
                    "'{name}' expects {} arguments, got {}",
                    params.len(),
                    args.len()
                ),
                call_span,
                "E0403",
            );
            return;
        }
        for (arg, param) in args.iter().zip(&params) {
            if arg.tag.is_error() || arg.tag == TypeTag::Empty {
                continue;
            }
            let expected = TypeTag::from(param.data_type);
            if arg.tag != expected {
                self.error(
                    format!("{expected} is not compatible with {}", arg.tag),
                    arg.span,
                    "E0404",
                );
            }
        }
    }
}

impl Reductions for SemanticActions {
    fn reduce(&mut self, production: usize, stack: StackView<'_>, lexer: &mut Lexer) -> Attributes {
        match production {
            // goal -> decl_seq main_body
            1 => self.goal(&stack),
            // decl_seq -> decl_seq decl
            2 => self.combine(&stack, &[2, 1]),
            // decl_seq -> Lambda
            3 => Attributes::default(),
            // decl -> program_header | var_decl | procedure_decl | function_decl
            4..=7 => self.combine(&stack, &[1]),
            // program_header -> program_name ;
            8 => self.combine(&stack, &[2]),
            // program_name -> program id
            9 => self.program_name(&stack, lexer),
            // var_decl -> var id : type_spec ;
            10 => self.var_decl(&stack),
            // type_spec -> integer | boolean | string
            11..=13 => self.type_spec(production),
            // procedure_decl -> procedure_header sub_body ;
            14 => self.subprogram_decl(&stack, lexer),
            // procedure_header -> procedure_name param_clause ;
            15 => self.subprogram_header(&stack, 3, 2, None),
            // procedure_name -> procedure id
            16 => self.subprogram_name(&stack, lexer, SymbolKind::Procedure),
            // function_decl -> function_header sub_body ;
            17 => self.subprogram_decl(&stack, lexer),
            // function_header -> function_name param_clause : type_spec ;
            18 => {
                let return_type = stack.attr(2).data_type;
                self.subprogram_header(&stack, 5, 4, return_type)
            }
            // function_name -> function id
            19 => self.subprogram_name(&stack, lexer, SymbolKind::Function),
            // param_clause -> ( param_list )
            20 => Attributes {
                params: stack.attr(2).params.clone(),
                ..Attributes::default()
            },
            // param_clause -> Lambda
            21 => Attributes::default(),
            // param_list -> param_list , param
            22 => {
                let mut params = stack.attr(3).params.clone();
                params.extend(stack.attr(1).params.iter().cloned());
                Attributes {
                    params,
                    ..Attributes::default()
                }
            }
            // param_list -> param
            23 => stack.attr(1).clone(),
            // param -> id : type_spec
            24 => self.param(&stack, 3, 1, false),
            // param -> var id : type_spec
            25 => self.param(&stack, 3, 1, true),
            // sub_body -> local_seq compound_stmt
            26 => self.combine(&stack, &[1]),
            // local_seq -> local_seq var_decl
            27 => self.combine(&stack, &[2, 1]),
            // local_seq -> Lambda
            28 => Attributes::default(),
            // main_body -> compound_stmt ;
            29 => self.combine(&stack, &[2]),
            // compound_stmt -> begin_mark begin stmt_seq end
            30 => self.combine(&stack, &[2]),
            // begin_mark -> Lambda
            31 => {
                lexer.set_declaring(false);
                Attributes::default()
            }
            // stmt_seq -> stmt_seq statement ;
            32 => self.stmt_seq(&stack),
            // stmt_seq -> Lambda
            33 => Attributes::default(),
            // statement -> <one of thirteen statement kinds>
            34..=46 => self.combine(&stack, &[1]),
            // assign_stmt -> id := expression
            47 => self.assign(&stack),
            // call_stmt -> id
            48 => self.call_statement(&stack, 1, &[]),
            // call_stmt -> id ( arg_list )
            49 => {
                let args = stack.attr(2).args.clone();
                self.call_statement(&stack, 4, &args)
            }
            // if_stmt -> if expression then statement
            50 => {
                self.expect_logical(stack.attr(3), "IF condition must be logical");
                self.combine(&stack, &[1])
            }
            // while_stmt -> while expression do statement
            51 => {
                self.expect_logical(stack.attr(3), "WHILE condition must be logical");
                self.combine(&stack, &[1])
            }
            // repeat_stmt -> repeat stmt_seq until expression
            52 => self.repeat_stmt(&stack),
            // for_stmt -> for id := expression to expression do statement
            53 => self.for_stmt(&stack),
            // case_stmt -> case expression of case_arm_seq case_else end
            54 => self.case_stmt(&stack),
            // case_arm_seq -> case_arm_seq case_arm
            55 => self.combine(&stack, &[2, 1]),
            // case_arm_seq -> case_arm
            56 => self.combine(&stack, &[1]),
            // case_arm -> intlit : statement ;
            57 => self.combine(&stack, &[2]),
            // case_else -> otherwise : statement ;
            58 => self.combine(&stack, &[2]),
            // case_else -> Lambda
            59 => Attributes::default(),
            // loop_stmt -> loop stmt_seq end
            60 => self.loop_stmt(&stack),
            // exit_stmt -> exit when expression
            61 => self.exit_stmt(&stack),
            // return_stmt -> return
            62 => self.return_bare(&stack),
            // return_stmt -> return expression
            63 => self.return_value(&stack),
            // read_stmt -> read ( read_list )
            64 => Attributes::default(),
            // read_list -> read_list , id
            65 => self.read_item(&stack, 1),
            // read_list -> id
            66 => self.read_item(&stack, 1),
            // write_stmt -> write write_args | writeln write_args
            67 | 68 => self.write_stmt(&stack),
            // write_args -> ( arg_list )
            69 => Attributes {
                args: stack.attr(2).args.clone(),
                ..Attributes::default()
            },
            // write_args -> Lambda
            70 => Attributes::default(),
            // arg_list -> arg_list , expression
            71 => {
                let mut args = stack.attr(3).args.clone();
                let expr = stack.attr(1);
                args.push(ArgAttr {
                    tag: expr.tag,
                    span: expr.span,
                });
                Attributes {
                    args,
                    ..Attributes::default()
                }
            }
            // arg_list -> expression
            72 => {
                let expr = stack.attr(1);
                Attributes {
                    args: vec![ArgAttr {
                        tag: expr.tag,
                        span: expr.span,
                    }],
                    ..Attributes::default()
                }
            }
            // expression -> expression or conjunction | expression xor conjunction
            73 => self.binary(&stack, crate::types::BinaryOp::Or),
            74 => self.binary(&stack, crate::types::BinaryOp::Xor),
            // expression -> conjunction
            75 => stack.attr(1).clone(),
            // conjunction -> conjunction and negation
            76 => self.binary(&stack, crate::types::BinaryOp::And),
            // conjunction -> negation
            77 => stack.attr(1).clone(),
            // negation -> not negation
            78 => self.unary(&stack, crate::types::UnaryOp::Not),
            // negation -> relation
            79 => stack.attr(1).clone(),
            // relation -> simple_expr <relop> simple_expr
            80 => self.binary(&stack, crate::types::BinaryOp::Eq),
            81 => self.binary(&stack, crate::types::BinaryOp::Ne),
            82 => self.binary(&stack, crate::types::BinaryOp::Lt),
            83 => self.binary(&stack, crate::types::BinaryOp::Le),
            84 => self.binary(&stack, crate::types::BinaryOp::Gt),
            85 => self.binary(&stack, crate::types::BinaryOp::Ge),
            // relation -> simple_expr in ( arg_list )
            86 => self.in_list(&stack),
            // relation -> simple_expr
            87 => stack.attr(1).clone(),
            // simple_expr -> simple_expr + term | simple_expr - term
            88 => self.binary(&stack, crate::types::BinaryOp::Add),
            89 => self.binary(&stack, crate::types::BinaryOp::Sub),
            // simple_expr -> term
            90 => stack.attr(1).clone(),
            // term -> term * factor | term / factor | term mod factor
            91 => self.binary(&stack, crate::types::BinaryOp::Mul),
            92 => self.binary(&stack, crate::types::BinaryOp::Div),
            93 => self.binary(&stack, crate::types::BinaryOp::Mod),
            // term -> factor
            94 => stack.attr(1).clone(),
            // factor -> unary ** factor
            95 => self.binary(&stack, crate::types::BinaryOp::Pow),
            // factor -> unary
            96 => stack.attr(1).clone(),
            // unary -> + unary | - unary
            97 => self.unary(&stack, crate::types::UnaryOp::Plus),
            98 => self.unary(&stack, crate::types::UnaryOp::Minus),
            // unary -> primary
            99 => stack.attr(1).clone(),
            // primary -> id
            100 => self.value_reference(&stack),
            // primary -> id ( arg_list )
            101 => self.call_expression(&stack),
            // primary -> intlit
            102 => {
                let lit = stack.attr(1);
                Attributes {
                    tag: TypeTag::Integer,
                    value: lit.value,
                    span: lit.span,
                    ..Attributes::default()
                }
            }
            // primary -> strlit
            103 => Attributes {
                tag: TypeTag::Str,
                span: stack.attr(1).span,
                ..Attributes::default()
            },
            // primary -> true | false
            104 | 105 => Attributes {
                tag: TypeTag::Logical,
                span: stack.attr(1).span,
                ..Attributes::default()
            },
            // primary -> ( expression )
            106 => {
                let mut inner = stack.attr(2).clone();
                inner.span = stack.attr(3).span.to(stack.attr(1).span);
                inner
            }
            // primary -> max ( arg_list ) | min ( arg_list )
            107 => self.extremum(&stack, "MAX"),
            108 => self.extremum(&stack, "MIN"),
            _ => Attributes::default(),
        }
    }
}

impl SemanticActions {
    /// Fold the flow of the listed right-hand-side positions into a fresh
    /// record, reporting a return-type conflict at the later site.
    fn combine(&mut self, stack: &StackView<'_>, positions: &[usize]) -> Attributes {
        let mut result = Attributes::default();
        for &i in positions {
            let child = stack.attr(i);
            if let Some((mine, theirs)) = result.absorb_flow(child) {
                self.error(
                    format!(
                        "Return type {} is not compatible with {}",
                        theirs.tag, mine.tag
                    ),
                    theirs.site,
                    "E0409",
                );
            }
        }
        result
    }
}

//! The SLR(1) shift/reduce driver.
//!
//! Two stacks evolve in lockstep: the state stack interleaves LR(0) state
//! numbers with grammar-symbol ids, and the attribute stack carries one
//! [`Attributes`] record per grammar symbol plus a placeholder per state.
//! Every reduction invokes the evaluator, then pops two entries per
//! right-hand-side symbol from each stack.

use boreal_syntax::{Diagnostic, Lexer, Span, Token, TokenKind};
use tracing::debug;

use crate::attributes::Attributes;
use crate::grammar::Grammar;
use crate::tables::{ParseAction, ParseTable};

/// Read-only view of the attribute stack during a reduction. Attribute `i`
/// is the i-th right-hand-side symbol counting from the right, 1-based,
/// accounting for the interleaved state placeholders.
pub struct StackView<'a> {
    attrs: &'a [Attributes],
}

impl StackView<'_> {
    pub fn attr(&self, i: usize) -> &Attributes {
        &self.attrs[self.attrs.len() - 2 * i]
    }
}

/// The evaluator invoked on every reduction.
pub trait Reductions {
    fn reduce(&mut self, production: usize, stack: StackView<'_>, lexer: &mut Lexer) -> Attributes;
}

/// A syntax error: the offending token plus the terminals the state admits.
#[derive(Debug, Clone)]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
    pub expected: Vec<String>,
    pub found: String,
}

impl SyntaxError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.message.clone(), self.span).with_code("E0200")
    }
}

/// How a parse ended.
#[derive(Debug)]
pub enum ParseOutcome {
    /// Input accepted; the root attributes are returned.
    Accepted(Attributes),
    /// First syntax error; parsing does not recover.
    Failed(SyntaxError),
    /// The lexer's stop point ended the stream early; not an error.
    Stopped,
}

pub struct Parser<'t> {
    grammar: &'t Grammar,
    table: &'t ParseTable,
}

impl<'t> Parser<'t> {
    pub fn new(grammar: &'t Grammar, table: &'t ParseTable) -> Self {
        Self { grammar, table }
    }

    /// Drive the parse to acceptance, the first syntax error, or the armed
    /// stop point.
    pub fn run(&self, lexer: &mut Lexer, actions: &mut dyn Reductions) -> ParseOutcome {
        let mut states: Vec<u16> = vec![0];
        let mut attrs: Vec<Attributes> = vec![Attributes::default()];
        let mut lookahead = lexer.next_token();
        let mut reductions = 0usize;

        loop {
            let state = *states.last().expect("state stack never empties") as usize;
            let terminal = self
                .grammar
                .symbol_id(lookahead.kind.terminal_name())
                .expect("every token kind is a grammar terminal");

            match self.table.action(state, terminal) {
                None => {
                    if lexer.stopped() {
                        // A definition query ended the stream; the parser
                        // treats it as end of input and stays quiet.
                        return ParseOutcome::Stopped;
                    }
                    return ParseOutcome::Failed(self.syntax_error(state, &lookahead));
                }
                Some(ParseAction::Shift(next)) => {
                    states.push(terminal);
                    states.push(next);
                    attrs.push(Attributes::from_token(&lookahead));
                    attrs.push(Attributes::default());
                    lookahead = lexer.next_token();
                }
                Some(ParseAction::Reduce(production)) => {
                    reductions += 1;
                    let rhs_len = self.grammar.productions[production as usize].rhs.len();
                    let lhs = self.grammar.productions[production as usize].lhs;

                    let mut result =
                        actions.reduce(production as usize, StackView { attrs: &attrs }, lexer);
                    self.fill_span(&mut result, &attrs, rhs_len, &lookahead);

                    states.truncate(states.len() - 2 * rhs_len);
                    attrs.truncate(attrs.len() - 2 * rhs_len);
                    debug_assert_eq!(states.len(), attrs.len());

                    let top = *states.last().expect("state stack never empties") as usize;
                    let target = self
                        .table
                        .goto(top, self.grammar, lhs)
                        .expect("goto entry for reduced non-terminal");
                    states.push(lhs);
                    states.push(target);
                    attrs.push(result);
                    attrs.push(Attributes::default());
                }
                Some(ParseAction::Accept) => {
                    debug_assert_eq!(states.len(), 3);
                    debug_assert_eq!(attrs.len(), 3);
                    debug!(reductions, "parse accepted");
                    let root = attrs[attrs.len() - 2].clone();
                    return ParseOutcome::Accepted(root);
                }
            }
        }
    }

    /// Give the reduced non-terminal the covering span of its right-hand
    /// side, unless the action already set one.
    fn fill_span(
        &self,
        result: &mut Attributes,
        attrs: &[Attributes],
        rhs_len: usize,
        lookahead: &Token,
    ) {
        if result.span.line != 0 {
            return;
        }
        if rhs_len == 0 {
            result.span = Span::point(
                lookahead.span.position,
                lookahead.span.line,
                lookahead.span.column,
            );
            return;
        }
        let first = &attrs[attrs.len() - 2 * rhs_len].span;
        let last = &attrs[attrs.len() - 2].span;
        result.span = first.to(*last);
    }

    fn syntax_error(&self, state: usize, lookahead: &Token) -> SyntaxError {
        let expected = self.table.expected_terminals(state, self.grammar);
        let found = if lookahead.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", lookahead.lexeme)
        };
        let message = format!("Unexpected {found}; expected one of: {}", expected.join(", "));
        SyntaxError {
            message,
            span: lookahead.span,
            expected,
            found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::slr;
    use boreal_syntax::ScopeTable;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Evaluator that synthesises nothing; driver tests only.
    struct NoActions;

    impl Reductions for NoActions {
        fn reduce(&mut self, _: usize, _: StackView<'_>, _: &mut Lexer) -> Attributes {
            Attributes::default()
        }
    }

    fn run(source: &str) -> ParseOutcome {
        let grammar = Grammar::boreal().expect("grammar should parse");
        let table = slr::build(&grammar).expect("SLR(1)");
        let parser = Parser::new(&grammar, &table);
        let mut lexer = Lexer::new(source, Rc::new(RefCell::new(ScopeTable::new())));
        parser.run(&mut lexer, &mut NoActions)
    }

    #[test]
    fn test_accepts_minimal_program() {
        let outcome = run("program p; begin end;");
        assert!(matches!(outcome, ParseOutcome::Accepted(_)));
    }

    #[test]
    fn test_accepts_declarations_and_statements() {
        let outcome = run(
            "program p;\n\
             var x: integer;\n\
             begin\n\
               x := 1 + 2 * 3;\n\
               if x < 10 then x := 0;\n\
               while x < 5 do x := x + 1;\n\
             end;",
        );
        assert!(matches!(outcome, ParseOutcome::Accepted(_)));
    }

    #[test]
    fn test_accepts_subprograms() {
        let outcome = run(
            "program p;\n\
             function f(a: integer): integer;\n\
             begin return a + 1; end;\n\
             procedure q(var b: string);\n\
             var t: integer;\n\
             begin t := 1; end;\n\
             begin end;",
        );
        assert!(matches!(outcome, ParseOutcome::Accepted(_)));
    }

    #[test]
    fn test_accepts_structured_statements() {
        let outcome = run(
            "program p;\n\
             var x: integer;\n\
             begin\n\
               loop x := x + 1; exit when x > 3; end;\n\
               repeat x := x - 1; until x = 0;\n\
               for x := 1 to 10 do write(x);\n\
               case x of 1: x := 2; 2: x := 3; otherwise: x := 0; end;\n\
               read(x);\n\
               writeln('done');\n\
             end;",
        );
        assert!(matches!(outcome, ParseOutcome::Accepted(_)));
    }

    #[test]
    fn test_syntax_error_reports_expected_set() {
        let outcome = run("program p; begin x := ; end;");
        let ParseOutcome::Failed(err) = outcome else {
            panic!("expected a syntax error");
        };
        assert_eq!(err.found, "';'");
        assert!(err.expected.contains(&"id".to_string()));
        assert!(err.expected.contains(&"intlit".to_string()));
        assert!(err.message.contains("expected one of"));
    }

    #[test]
    fn test_first_error_is_fatal() {
        // The parse halts at the first bad token; no recovery.
        let outcome = run("program p; begin := := end;");
        assert!(matches!(outcome, ParseOutcome::Failed(_)));
    }

    #[test]
    fn test_error_at_end_of_input() {
        let outcome = run("program p; begin end");
        let ParseOutcome::Failed(err) = outcome else {
            panic!("expected a syntax error");
        };
        assert_eq!(err.found, "end of input");
    }

    #[test]
    fn test_stop_point_is_not_an_error() {
        let grammar = Grammar::boreal().expect("grammar should parse");
        let table = slr::build(&grammar).expect("SLR(1)");
        let parser = Parser::new(&grammar, &table);
        let mut lexer = Lexer::new(
            "program p; var x: integer; begin x := 1; end;",
            Rc::new(RefCell::new(ScopeTable::new())),
        );
        // Stop inside the assignment's left-hand side.
        lexer.arm_stop(1, 34);
        let outcome = parser.run(&mut lexer, &mut NoActions);
        assert!(matches!(outcome, ParseOutcome::Stopped));
    }
}

//! Public entry points: whole-buffer analysis and definition lookup.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::OnceLock;

use tracing::debug;

use boreal_syntax::{Diagnostic, Lexer, ScopeTable, Span};

use crate::attributes::Attributes;
use crate::grammar::Grammar;
use crate::index::SymbolIndex;
use crate::parser::{ParseOutcome, Parser};
use crate::semantic::SemanticActions;
use crate::semantic_tokens::SemanticToken;
use crate::tables::{slr, ParseTable};

/// Everything one analysis produces for the editor integration.
#[derive(Debug)]
pub struct Analysis {
    /// Root attributes of an accepted parse.
    pub root: Option<Attributes>,
    pub lexical_errors: Vec<Diagnostic>,
    pub syntax_errors: Vec<Diagnostic>,
    pub semantic_errors: Vec<Diagnostic>,
    pub semantic_warnings: Vec<Diagnostic>,
    pub semantic_tokens: Vec<SemanticToken>,
    pub symbols: SymbolIndex,
}

impl Analysis {
    /// Whether any error-severity diagnostic was recorded.
    pub fn has_errors(&self) -> bool {
        !self.lexical_errors.is_empty()
            || !self.syntax_errors.is_empty()
            || !self.semantic_errors.is_empty()
    }
}

/// The grammar and its tables, built once per process and shared read-only.
fn tables() -> &'static (Grammar, ParseTable) {
    static TABLES: OnceLock<(Grammar, ParseTable)> = OnceLock::new();
    TABLES.get_or_init(|| {
        let grammar = Grammar::boreal().expect("built-in grammar must parse");
        let table = slr::build(&grammar).expect("built-in grammar must be SLR(1)");
        (grammar, table)
    })
}

/// Analyse a whole source buffer.
pub fn analyze(source: &str) -> Analysis {
    run(source, None).0
}

/// Resolve the definition site of the identifier under `(line, column)`;
/// `line` is 1-based, `column` 0-based. Only answers when no lexical or
/// syntax error precedes the query point.
pub fn find_definition(source: &str, line: usize, column: usize) -> Option<Span> {
    let (analysis, lexer) = run(source, Some((line, column)));
    if !analysis.lexical_errors.is_empty() || !analysis.syntax_errors.is_empty() {
        return None;
    }
    let token = lexer.last_token()?;
    let inside = token.span.line == line
        && column >= token.span.column
        && column < token.span.column + token.span.length;
    if !inside {
        return None;
    }
    let symbol = token.symbol.as_ref()?;
    let definition = symbol.borrow().definition;
    Some(definition)
}

fn run(source: &str, stop: Option<(usize, usize)>) -> (Analysis, Lexer) {
    debug!(len = source.len(), "analysis started");
    let symbols = Rc::new(RefCell::new(ScopeTable::new()));
    let mut lexer = Lexer::new(source, Rc::clone(&symbols));
    if let Some((line, column)) = stop {
        lexer.arm_stop(line, column);
    }
    let mut actions = SemanticActions::new(Rc::clone(&symbols));
    let (grammar, table) = tables();
    let parser = Parser::new(grammar, table);

    let outcome = parser.run(&mut lexer, &mut actions);

    let lexical_errors = lexer.take_scan_errors();
    let mut semantic_errors = lexer.take_declaration_errors();
    semantic_errors.extend(actions.take_errors());
    let mut semantic_warnings = actions.take_warnings();
    let mut syntax_errors = Vec::new();
    let mut root = None;

    match outcome {
        ParseOutcome::Accepted(accepted) => {
            check_program_uniqueness(&accepted, &actions, &mut semantic_errors);
            collect_unused(&symbols.borrow(), &mut semantic_warnings);
            root = Some(accepted);
        }
        ParseOutcome::Failed(error) => syntax_errors.push(error.to_diagnostic()),
        ParseOutcome::Stopped => {}
    }

    semantic_errors.sort_by_key(|d| d.span.position);
    semantic_warnings.sort_by_key(|d| d.span.position);
    let mut semantic_tokens = actions.take_tokens();
    semantic_tokens.sort_by_key(|t| (t.line, t.column));

    let analysis = Analysis {
        root,
        lexical_errors,
        syntax_errors,
        semantic_errors,
        semantic_warnings,
        semantic_tokens,
        symbols: SymbolIndex::from_scopes(&symbols.borrow()),
    };
    debug!(
        lexical = analysis.lexical_errors.len(),
        syntax = analysis.syntax_errors.len(),
        semantic = analysis.semantic_errors.len(),
        "analysis finished"
    );
    (analysis, lexer)
}

/// The translation unit must declare exactly one program.
fn check_program_uniqueness(
    root: &Attributes,
    actions: &SemanticActions,
    errors: &mut Vec<Diagnostic>,
) {
    if root.programs == 0 {
        errors.push(
            Diagnostic::error("Missing program declaration", Span::point(0, 1, 0))
                .with_code("E0601"),
        );
    } else if root.programs > 1 {
        let site = actions
            .program_sites()
            .get(1)
            .copied()
            .unwrap_or(Span::point(0, 1, 0));
        errors.push(
            Diagnostic::error("Multiple program declarations", site).with_code("E0602"),
        );
    }
}

/// Variables and parameters nobody ever touched.
fn collect_unused(table: &ScopeTable, warnings: &mut Vec<Diagnostic>) {
    for scope in table.all_scopes() {
        for symbol in scope.symbols() {
            let sym = symbol.borrow();
            if sym.is_value() && !sym.used {
                warnings.push(
                    Diagnostic::warning(
                        format!("'{}' is never used", sym.lexeme),
                        sym.definition,
                    )
                    .with_code("W0301"),
                );
            }
        }
    }
}

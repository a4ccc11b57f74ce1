//! Text form of the parse tables.
//!
//! The first row names the terminal columns, then the `FIN` sentinel, then
//! the non-terminal columns. Each following row holds one state's cells:
//! `%` for an empty cell, `accept`, `s<N>` to shift to state N, `r<N>` to
//! reduce by production N, or a bare state number in a goto column. Rows are
//! indexed by their position in the file.

use super::{ParseAction, ParseTable, TableError};
use crate::grammar::{Grammar, SymbolId};

/// Sentinel separating terminal and non-terminal columns in the header.
pub const FIN: &str = "FIN";

/// Empty-cell marker.
pub const EMPTY: &str = "%";

/// Parse table text against a grammar.
pub fn parse(text: &str, grammar: &Grammar) -> Result<ParseTable, TableError> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let header = lines.next().ok_or(TableError::MissingFin)?;

    let mut terminal_columns: Vec<SymbolId> = Vec::new();
    let mut nonterminal_columns: Vec<SymbolId> = Vec::new();
    let mut seen_fin = false;
    for name in header.split_whitespace() {
        if name == FIN {
            seen_fin = true;
            continue;
        }
        let id = grammar
            .symbol_id(name)
            .ok_or_else(|| TableError::UnknownHeaderSymbol {
                name: name.to_string(),
            })?;
        if seen_fin {
            nonterminal_columns.push(id);
        } else {
            terminal_columns.push(id);
        }
    }
    if !seen_fin {
        return Err(TableError::MissingFin);
    }

    let width = terminal_columns.len() + nonterminal_columns.len();
    let mut action = Vec::new();
    let mut goto_table = Vec::new();

    for (row, line) in lines.enumerate() {
        let cells: Vec<&str> = line.split_whitespace().collect();
        if cells.len() != width {
            return Err(TableError::RowWidth {
                row,
                found: cells.len(),
                expected: width,
            });
        }
        let mut action_row = vec![None; grammar.terminal_count()];
        let mut goto_row = vec![None; grammar.nonterminal_count()];

        for (column, cell) in cells.iter().enumerate() {
            if *cell == EMPTY {
                continue;
            }
            let bad = || TableError::BadCell {
                row,
                cell: (*cell).to_string(),
            };
            if column < terminal_columns.len() {
                let terminal = terminal_columns[column];
                let parsed = if *cell == "accept" {
                    ParseAction::Accept
                } else if let Some(n) = cell.strip_prefix('s') {
                    ParseAction::Shift(n.parse().map_err(|_| bad())?)
                } else if let Some(n) = cell.strip_prefix('r') {
                    ParseAction::Reduce(n.parse().map_err(|_| bad())?)
                } else {
                    return Err(bad());
                };
                action_row[terminal as usize] = Some(parsed);
            } else {
                let nonterminal = nonterminal_columns[column - terminal_columns.len()];
                let state: u16 = cell.parse().map_err(|_| bad())?;
                goto_row[grammar.nonterminal_index(nonterminal)] = Some(state);
            }
        }
        action.push(action_row);
        goto_table.push(goto_row);
    }

    Ok(ParseTable { action, goto_table })
}

/// Render a table to the text form, columns in grammar order.
pub fn render(table: &ParseTable, grammar: &Grammar) -> String {
    let mut out = String::new();
    let mut header: Vec<&str> = grammar.terminal_names().collect();
    header.push(FIN);
    header.extend(grammar.nonterminal_names());
    out.push_str(&header.join(" "));
    out.push('\n');

    for state in 0..table.state_count() {
        let mut cells: Vec<String> = Vec::with_capacity(grammar.symbol_count());
        for terminal in 0..grammar.terminal_count() {
            let cell = match table.action[state][terminal] {
                None => EMPTY.to_string(),
                Some(ParseAction::Accept) => "accept".to_string(),
                Some(ParseAction::Shift(n)) => format!("s{n}"),
                Some(ParseAction::Reduce(n)) => format!("r{n}"),
            };
            cells.push(cell);
        }
        // Skip the augmented start: it has no goto column in the text form.
        for nonterminal in 1..grammar.nonterminal_count() {
            let cell = match table.goto_table[state][nonterminal] {
                None => EMPTY.to_string(),
                Some(n) => n.to_string(),
            };
            cells.push(cell);
        }
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::slr;

    fn tiny_grammar() -> Grammar {
        Grammar::parse(
            &["a", "+", "*", "(", ")", "$"],
            "e -> e + t\ne -> t\nt -> t * f\nt -> f\nf -> ( e )\nf -> a\n",
        )
        .expect("grammar should parse")
    }

    #[test]
    fn test_round_trip_tiny() {
        let grammar = tiny_grammar();
        let built = slr::build(&grammar).expect("SLR(1)");
        let text = render(&built, &grammar);
        let loaded = parse(&text, &grammar).expect("rendered text should load");
        assert_eq!(built, loaded);
    }

    #[test]
    fn test_round_trip_boreal() {
        let grammar = Grammar::boreal().expect("grammar should parse");
        let built = slr::build(&grammar).expect("SLR(1)");
        let text = render(&built, &grammar);
        let loaded = parse(&text, &grammar).expect("rendered text should load");
        assert_eq!(built, loaded);
    }

    #[test]
    fn test_header_names_all_columns() {
        let grammar = tiny_grammar();
        let built = slr::build(&grammar).expect("SLR(1)");
        let text = render(&built, &grammar);
        let header = text.lines().next().expect("header row");
        assert_eq!(header, "a + * ( ) $ FIN e t f");
    }

    #[test]
    fn test_missing_fin() {
        let grammar = tiny_grammar();
        let err = parse("a + * ( ) $ e t f\n", &grammar);
        assert!(matches!(err, Err(TableError::MissingFin)));
    }

    #[test]
    fn test_unknown_header_symbol() {
        let grammar = tiny_grammar();
        let err = parse("a b $ FIN e\n", &grammar);
        assert!(matches!(err, Err(TableError::UnknownHeaderSymbol { name }) if name == "b"));
    }

    #[test]
    fn test_row_width_checked() {
        let grammar = tiny_grammar();
        let err = parse("a $ FIN e\ns1 %\n", &grammar);
        assert!(matches!(
            err,
            Err(TableError::RowWidth {
                row: 0,
                found: 2,
                expected: 3
            })
        ));
    }

    #[test]
    fn test_bad_cell() {
        let grammar = tiny_grammar();
        let err = parse("a $ FIN e\nxyz % %\n", &grammar);
        assert!(matches!(err, Err(TableError::BadCell { row: 0, cell }) if cell == "xyz"));
    }

    #[test]
    fn test_goto_column_takes_bare_numbers() {
        let grammar = tiny_grammar();
        let text = "a $ FIN e\ns1 % 2\n";
        let table = parse(text, &grammar).expect("should load");
        let e = grammar.symbol_id("e").expect("symbol");
        assert_eq!(table.goto(0, &grammar, e), Some(2));
        let a = grammar.symbol_id("a").expect("symbol");
        assert_eq!(table.action(0, a), Some(ParseAction::Shift(1)));
    }
}

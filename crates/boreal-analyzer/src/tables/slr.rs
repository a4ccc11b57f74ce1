//! SLR(1) table construction.
//!
//! Standard pipeline: nullable / FIRST / FOLLOW sets, the canonical LR(0)
//! collection, then ACTION and GOTO filling with conflict detection. The
//! result is the same [`ParseTable`] the text loader produces, so generated
//! and shipped tables are interchangeable.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use super::{ParseAction, ParseTable, TableError};
use crate::grammar::{Grammar, SymbolId};

/// An LR(0) item: production number and dot position.
type Item = (u16, u16);

/// Build the SLR(1) ACTION/GOTO tables for a grammar.
pub fn build(grammar: &Grammar) -> Result<ParseTable, TableError> {
    let nullable = compute_nullable(grammar);
    let first = compute_first(grammar, &nullable);
    let follow = compute_follow(grammar, &nullable, &first);

    // Canonical LR(0) collection.
    let initial = closure(grammar, BTreeSet::from([(0u16, 0u16)]));
    let mut states: Vec<BTreeSet<Item>> = vec![initial.clone()];
    let mut index: HashMap<BTreeSet<Item>, usize> = HashMap::from([(initial, 0)]);
    let mut transitions: Vec<BTreeMap<SymbolId, usize>> = vec![BTreeMap::new()];

    let mut work = vec![0usize];
    while let Some(s) = work.pop() {
        let mut moves: BTreeMap<SymbolId, BTreeSet<Item>> = BTreeMap::new();
        for &(p, dot) in &states[s] {
            let prod = &grammar.productions[p as usize];
            if let Some(&sym) = prod.rhs.get(dot as usize) {
                moves.entry(sym).or_default().insert((p, dot + 1));
            }
        }
        for (sym, kernel) in moves {
            let closed = closure(grammar, kernel);
            let target = if let Some(&t) = index.get(&closed) {
                t
            } else {
                let t = states.len();
                states.push(closed.clone());
                index.insert(closed, t);
                transitions.push(BTreeMap::new());
                work.push(t);
                t
            };
            transitions[s].insert(sym, target);
        }
    }

    // Fill the tables.
    let mut action = vec![vec![None; grammar.terminal_count()]; states.len()];
    let mut goto_table = vec![vec![None; grammar.nonterminal_count()]; states.len()];

    for (s, items) in states.iter().enumerate() {
        for (&sym, &t) in &transitions[s] {
            if grammar.is_terminal(sym) {
                set_action(grammar, &mut action, s, sym, ParseAction::Shift(t as u16))?;
            } else {
                goto_table[s][grammar.nonterminal_index(sym)] = Some(t as u16);
            }
        }
        for &(p, dot) in items {
            let prod = &grammar.productions[p as usize];
            if dot as usize != prod.rhs.len() {
                continue;
            }
            if p == 0 {
                set_action(grammar, &mut action, s, grammar.eof(), ParseAction::Accept)?;
            } else if let Some(follow_set) = follow.get(&prod.lhs) {
                for &a in follow_set {
                    set_action(grammar, &mut action, s, a, ParseAction::Reduce(p))?;
                }
            }
        }
    }

    debug!(states = states.len(), "SLR tables built");
    Ok(ParseTable { action, goto_table })
}

fn describe(action: ParseAction) -> String {
    match action {
        ParseAction::Shift(n) => format!("shift {n}"),
        ParseAction::Reduce(p) => format!("reduce {p}"),
        ParseAction::Accept => "accept".to_string(),
    }
}

fn set_action(
    grammar: &Grammar,
    table: &mut [Vec<Option<ParseAction>>],
    state: usize,
    terminal: SymbolId,
    incoming: ParseAction,
) -> Result<(), TableError> {
    let cell = &mut table[state][terminal as usize];
    match *cell {
        None => {
            *cell = Some(incoming);
            Ok(())
        }
        Some(existing) if existing == incoming => Ok(()),
        Some(existing) => Err(TableError::Conflict {
            state,
            symbol: grammar.symbol_name(terminal).to_string(),
            existing: describe(existing),
            incoming: describe(incoming),
        }),
    }
}

fn closure(grammar: &Grammar, kernel: BTreeSet<Item>) -> BTreeSet<Item> {
    let mut set = kernel;
    let mut stack: Vec<Item> = set.iter().copied().collect();
    while let Some((p, dot)) = stack.pop() {
        let prod = &grammar.productions[p as usize];
        let Some(&sym) = prod.rhs.get(dot as usize) else {
            continue;
        };
        if grammar.is_terminal(sym) {
            continue;
        }
        for (pi, candidate) in grammar.productions.iter().enumerate() {
            if candidate.lhs == sym {
                let item = (pi as u16, 0);
                if set.insert(item) {
                    stack.push(item);
                }
            }
        }
    }
    set
}

fn compute_nullable(grammar: &Grammar) -> BTreeSet<SymbolId> {
    let mut nullable = BTreeSet::new();
    let mut changed = true;
    while changed {
        changed = false;
        for prod in &grammar.productions {
            if nullable.contains(&prod.lhs) {
                continue;
            }
            if prod.rhs.iter().all(|s| nullable.contains(s)) {
                nullable.insert(prod.lhs);
                changed = true;
            }
        }
    }
    nullable
}

fn compute_first(
    grammar: &Grammar,
    nullable: &BTreeSet<SymbolId>,
) -> HashMap<SymbolId, BTreeSet<SymbolId>> {
    let mut first: HashMap<SymbolId, BTreeSet<SymbolId>> = HashMap::new();
    for id in 0..grammar.symbol_count() {
        let id = id as SymbolId;
        let set = if grammar.is_terminal(id) {
            BTreeSet::from([id])
        } else {
            BTreeSet::new()
        };
        first.insert(id, set);
    }

    let mut changed = true;
    while changed {
        changed = false;
        for prod in &grammar.productions {
            let mut addition = BTreeSet::new();
            for sym in &prod.rhs {
                addition.extend(first[sym].iter().copied());
                if !nullable.contains(sym) {
                    break;
                }
            }
            let target = first.get_mut(&prod.lhs).expect("interned symbol");
            let before = target.len();
            target.extend(addition);
            if target.len() != before {
                changed = true;
            }
        }
    }
    first
}

fn compute_follow(
    grammar: &Grammar,
    nullable: &BTreeSet<SymbolId>,
    first: &HashMap<SymbolId, BTreeSet<SymbolId>>,
) -> HashMap<SymbolId, BTreeSet<SymbolId>> {
    let mut follow: HashMap<SymbolId, BTreeSet<SymbolId>> = HashMap::new();
    follow.insert(grammar.augmented_start(), BTreeSet::from([grammar.eof()]));

    let mut changed = true;
    while changed {
        changed = false;
        for prod in &grammar.productions {
            for (i, &sym) in prod.rhs.iter().enumerate() {
                if grammar.is_terminal(sym) {
                    continue;
                }
                let mut addition = BTreeSet::new();
                let mut suffix_nullable = true;
                for rest in &prod.rhs[i + 1..] {
                    addition.extend(first[rest].iter().copied());
                    if !nullable.contains(rest) {
                        suffix_nullable = false;
                        break;
                    }
                }
                if suffix_nullable {
                    if let Some(lhs_follow) = follow.get(&prod.lhs) {
                        addition.extend(lhs_follow.iter().copied());
                    }
                }
                let target = follow.entry(sym).or_default();
                let before = target.len();
                target.extend(addition);
                if target.len() != before {
                    changed = true;
                }
            }
        }
    }
    follow
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boreal_grammar_is_slr1() {
        let grammar = Grammar::boreal().expect("grammar should parse");
        let table = build(&grammar).expect("grammar must be conflict-free");
        assert!(table.state_count() > 100);
    }

    #[test]
    fn test_tiny_expression_grammar() {
        // The textbook grammar: E -> E + T | T ; T -> T * F | F ; F -> ( E ) | a
        let grammar = Grammar::parse(
            &["a", "+", "*", "(", ")", "$"],
            "e -> e + t\ne -> t\nt -> t * f\nt -> f\nf -> ( e )\nf -> a\n",
        )
        .expect("grammar should parse");
        let table = build(&grammar).expect("SLR(1)");
        // The classic construction yields twelve states.
        assert_eq!(table.state_count(), 12);
    }

    #[test]
    fn test_ambiguous_grammar_conflicts() {
        let grammar =
            Grammar::parse(&["a", "$"], "s -> s s\ns -> a\n").expect("grammar should parse");
        let err = build(&grammar);
        assert!(matches!(err, Err(TableError::Conflict { .. })));
    }

    #[test]
    fn test_nullable_and_follow_through_markers() {
        // A marker non-terminal before a keyword reduces exactly on that
        // keyword, the pattern the statement grammar relies on.
        let grammar = Grammar::parse(
            &["b", "x", "$"],
            "s -> m b x\nm -> Lambda\n",
        )
        .expect("grammar should parse");
        let table = build(&grammar).expect("SLR(1)");
        let m = grammar.symbol_id("m").expect("symbol");
        let b = grammar.symbol_id("b").expect("symbol");
        // In the start state the only action on 'b' is the marker reduction.
        assert_eq!(table.action(0, b), Some(ParseAction::Reduce(2)));
        assert!(table.goto(0, &grammar, m).is_some());
    }

    #[test]
    fn test_expected_terminals() {
        let grammar = Grammar::parse(
            &["a", "+", "*", "(", ")", "$"],
            "e -> e + t\ne -> t\nt -> t * f\nt -> f\nf -> ( e )\nf -> a\n",
        )
        .expect("grammar should parse");
        let table = build(&grammar).expect("SLR(1)");
        let expected = table.expected_terminals(0, &grammar);
        assert_eq!(expected, vec!["a".to_string(), "(".to_string()]);
    }
}

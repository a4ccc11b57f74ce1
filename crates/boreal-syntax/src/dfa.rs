//! Transition tables of the scanner DFA.
//!
//! The matrix is 13 states by 22 character classes. Each row enumerates the
//! columns it cares about explicitly; every remaining column folds onto the
//! row's `other` entry, which keeps the tables compact. An entry names the
//! next state plus a semantic action; entries that finish a token or record
//! an error use the terminal sentinel [`TERMINAL`] as their next state.

use crate::char_class::CharClass;
use crate::token::TokenKind;

/// Sentinel next-state for entries that end the current scan.
pub const TERMINAL: u16 = 888;

pub const STATE_START: u16 = 0;
pub const STATE_IDENT: u16 = 1;
pub const STATE_NUMBER: u16 = 2;
pub const STATE_STAR: u16 = 3;
pub const STATE_LESS: u16 = 4;
pub const STATE_GREATER: u16 = 5;
pub const STATE_COLON: u16 = 6;
pub const STATE_STRING: u16 = 7;
pub const STATE_COMMENT: u16 = 8;
pub const STATE_CR: u16 = 9;
pub const STATE_CR_COMMENT: u16 = 10;
pub const STATE_IDENT_OVERFLOW: u16 = 11;
pub const STATE_NUMBER_OVERFLOW: u16 = 12;

/// Which token a terminal entry produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Identifier,
    Number,
    StringLit,
    Fixed(TokenKind),
}

/// Scan-level error families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    UnexpectedChar,
    StrayRightBrace,
    StringNewline,
    StringEof,
    CommentEof,
    IdentifierTooLong,
    IntegerOverflow,
    StringTooLong,
}

/// Semantic action attached to a transition. `Hold*` variants leave the
/// current character in place so the next scan step reprocesses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Consume the character.
    Read,
    /// Consume the character and count a line break.
    ReadEol,
    /// Count a line break without consuming.
    HoldEol,
    /// Finish a token; the character belongs to it.
    Emit(TokenClass),
    /// Finish a token; the character starts the next one.
    HoldEmit(TokenClass),
    /// Record an error; the character is consumed.
    Error(ScanErrorKind),
    /// Record an error; the character is reprocessed.
    HoldError(ScanErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub next: u16,
    pub action: Action,
}

const fn entry(next: u16, action: Action) -> Entry {
    Entry { next, action }
}

const fn emit(kind: TokenKind) -> Entry {
    entry(TERMINAL, Action::Emit(TokenClass::Fixed(kind)))
}

const fn hold_emit(kind: TokenKind) -> Entry {
    entry(TERMINAL, Action::HoldEmit(TokenClass::Fixed(kind)))
}

/// One DFA row: the explicitly handled columns plus the fold-all entry.
pub struct StateRow {
    pub entries: &'static [(CharClass, Entry)],
    pub other: Entry,
}

use Action::{Emit as Em, Error as Err, HoldEmit as HoldEm, HoldEol, HoldError, Read, ReadEol};
use CharClass as C;
use ScanErrorKind as E;
use TokenClass as T;

pub static DFA: [StateRow; 13] = [
    // 0: start
    StateRow {
        entries: &[
            (C::Letter, entry(STATE_IDENT, Read)),
            (C::Digit, entry(STATE_NUMBER, Read)),
            (C::Space, entry(STATE_START, Read)),
            (C::LineFeed, entry(STATE_START, ReadEol)),
            (C::CarriageReturn, entry(STATE_CR, Read)),
            (C::Plus, emit(TokenKind::Plus)),
            (C::Minus, emit(TokenKind::Minus)),
            (C::Star, entry(STATE_STAR, Read)),
            (C::Slash, emit(TokenKind::Slash)),
            (C::Equal, emit(TokenKind::Equal)),
            (C::Less, entry(STATE_LESS, Read)),
            (C::Greater, entry(STATE_GREATER, Read)),
            (C::LParen, emit(TokenKind::LParen)),
            (C::RParen, emit(TokenKind::RParen)),
            (C::LBrace, entry(STATE_COMMENT, Read)),
            (C::RBrace, entry(TERMINAL, Err(E::StrayRightBrace))),
            (C::Quote, entry(STATE_STRING, Read)),
            (C::Semicolon, emit(TokenKind::Semicolon)),
            (C::Colon, entry(STATE_COLON, Read)),
            (C::Comma, emit(TokenKind::Comma)),
            (C::Eof, hold_emit(TokenKind::Eof)),
        ],
        other: entry(TERMINAL, Err(E::UnexpectedChar)),
    },
    // 1: inside an identifier
    StateRow {
        entries: &[
            (C::Letter, entry(STATE_IDENT, Read)),
            (C::Digit, entry(STATE_IDENT, Read)),
        ],
        other: entry(TERMINAL, HoldEm(T::Identifier)),
    },
    // 2: inside an integer literal
    StateRow {
        entries: &[(C::Digit, entry(STATE_NUMBER, Read))],
        other: entry(TERMINAL, HoldEm(T::Number)),
    },
    // 3: after '*'
    StateRow {
        entries: &[(C::Star, emit(TokenKind::Power))],
        other: hold_emit(TokenKind::Star),
    },
    // 4: after '<'
    StateRow {
        entries: &[
            (C::Equal, emit(TokenKind::LessEqual)),
            (C::Greater, emit(TokenKind::NotEqual)),
        ],
        other: hold_emit(TokenKind::Less),
    },
    // 5: after '>'
    StateRow {
        entries: &[(C::Equal, emit(TokenKind::GreaterEqual))],
        other: hold_emit(TokenKind::Greater),
    },
    // 6: after ':'
    StateRow {
        entries: &[(C::Equal, emit(TokenKind::Assign))],
        other: hold_emit(TokenKind::Colon),
    },
    // 7: inside a string literal (single physical line)
    StateRow {
        entries: &[
            (C::Quote, entry(TERMINAL, Em(T::StringLit))),
            (C::LineFeed, entry(TERMINAL, HoldError(E::StringNewline))),
            (C::CarriageReturn, entry(TERMINAL, HoldError(E::StringNewline))),
            (C::Eof, entry(TERMINAL, HoldError(E::StringEof))),
        ],
        other: entry(STATE_STRING, Read),
    },
    // 8: inside a comment (multi-line, no nesting)
    StateRow {
        entries: &[
            (C::RBrace, entry(STATE_START, Read)),
            (C::LineFeed, entry(STATE_COMMENT, ReadEol)),
            (C::CarriageReturn, entry(STATE_CR_COMMENT, Read)),
            (C::Eof, entry(TERMINAL, HoldError(E::CommentEof))),
        ],
        other: entry(STATE_COMMENT, Read),
    },
    // 9: carriage return seen in code; fold CRLF into one break
    StateRow {
        entries: &[
            (C::LineFeed, entry(STATE_START, ReadEol)),
            (C::CarriageReturn, entry(STATE_CR, ReadEol)),
        ],
        other: entry(STATE_START, HoldEol),
    },
    // 10: carriage return seen in a comment
    StateRow {
        entries: &[
            (C::LineFeed, entry(STATE_COMMENT, ReadEol)),
            (C::CarriageReturn, entry(STATE_CR_COMMENT, ReadEol)),
        ],
        other: entry(STATE_COMMENT, HoldEol),
    },
    // 11: identifier past the length limit; one error for the whole run
    StateRow {
        entries: &[
            (C::Letter, entry(STATE_IDENT_OVERFLOW, Read)),
            (C::Digit, entry(STATE_IDENT_OVERFLOW, Read)),
        ],
        other: entry(TERMINAL, HoldError(E::IdentifierTooLong)),
    },
    // 12: integer past the value limit; one error for the whole run
    StateRow {
        entries: &[(C::Digit, entry(STATE_NUMBER_OVERFLOW, Read))],
        other: entry(TERMINAL, HoldError(E::IntegerOverflow)),
    },
];

/// Look up the transition for `(state, class)`, folding unlisted columns
/// onto the row's `other` entry.
pub fn transition(state: u16, class: CharClass) -> Entry {
    let row = &DFA[state as usize];
    row.entries
        .iter()
        .find(|(c, _)| *c == class)
        .map(|(_, e)| *e)
        .unwrap_or(row.other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_dispatch() {
        let e = transition(STATE_START, C::Letter);
        assert_eq!(e.next, STATE_IDENT);
        assert_eq!(e.action, Read);

        let e = transition(STATE_START, C::Semicolon);
        assert_eq!(e.next, TERMINAL);
        assert_eq!(e.action, Em(T::Fixed(TokenKind::Semicolon)));
    }

    #[test]
    fn test_other_fold() {
        let e = transition(STATE_START, C::Other);
        assert_eq!(e.action, Err(E::UnexpectedChar));

        // '+' is not listed in the identifier row, so it ends the token.
        let e = transition(STATE_IDENT, C::Plus);
        assert_eq!(e.action, HoldEm(T::Identifier));
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            transition(STATE_STAR, C::Star).action,
            Em(T::Fixed(TokenKind::Power))
        );
        assert_eq!(
            transition(STATE_LESS, C::Greater).action,
            Em(T::Fixed(TokenKind::NotEqual))
        );
        assert_eq!(
            transition(STATE_COLON, C::Equal).action,
            Em(T::Fixed(TokenKind::Assign))
        );
        assert_eq!(
            transition(STATE_COLON, C::Space).action,
            HoldEm(T::Fixed(TokenKind::Colon))
        );
    }

    #[test]
    fn test_string_rejects_newline() {
        assert_eq!(
            transition(STATE_STRING, C::LineFeed).action,
            HoldError(E::StringNewline)
        );
        assert_eq!(
            transition(STATE_STRING, C::Eof).action,
            HoldError(E::StringEof)
        );
    }

    #[test]
    fn test_comment_tracks_lines() {
        assert_eq!(transition(STATE_COMMENT, C::LineFeed).action, ReadEol);
        assert_eq!(transition(STATE_COMMENT, C::RBrace).next, STATE_START);
        // An inner '{' is plain comment content.
        assert_eq!(transition(STATE_COMMENT, C::LBrace).next, STATE_COMMENT);
    }

    #[test]
    fn test_crlf_counts_once() {
        // CR enters state 9 without counting; the LF half counts.
        assert_eq!(transition(STATE_START, C::CarriageReturn).action, Read);
        assert_eq!(transition(STATE_CR, C::LineFeed).action, ReadEol);
        // A lone CR counts when the follower is not LF, without consuming it.
        assert_eq!(transition(STATE_CR, C::Letter).action, HoldEol);
    }

    #[test]
    fn test_terminal_sentinel() {
        for row in &DFA {
            for (_, e) in row.entries {
                let ends = matches!(
                    e.action,
                    Em(_) | HoldEm(_) | Err(_) | HoldError(_)
                );
                assert_eq!(ends, e.next == TERMINAL);
            }
        }
    }
}

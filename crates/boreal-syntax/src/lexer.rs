//! The scanner: a table-driven DFA with symbol-table coupling.
//!
//! Tokens are produced one at a time on demand. When a complete identifier
//! is about to be emitted and is not a reserved word, the scanner consults
//! the shared [`ScopeTable`]: in *declaring* mode it defines a fresh symbol
//! in the current scope, otherwise it resolves the name through the scope
//! chain. The declaring flag is flipped by the semantic actions as the
//! parser reduces declaration regions.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::char_class::classify;
use crate::dfa::{
    transition, Action, Entry, ScanErrorKind, TokenClass, STATE_IDENT, STATE_IDENT_OVERFLOW,
    STATE_NUMBER, STATE_NUMBER_OVERFLOW, STATE_START,
};
use crate::diagnostics::Diagnostic;
use crate::scope::ScopeTable;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Longest accepted identifier.
pub const MAX_IDENTIFIER_LEN: usize = 32;
/// Largest accepted integer literal.
pub const MAX_INTEGER: i64 = 32_767;
/// Longest accepted string-literal content.
pub const MAX_STRING_LEN: usize = 64;

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    symbols: Rc<RefCell<ScopeTable>>,
    declaring: bool,
    scan_errors: Vec<Diagnostic>,
    declaration_errors: Vec<Diagnostic>,
    stop_at: Option<(usize, usize)>,
    stopped: bool,
    last_token: Option<Token>,
}

impl Lexer {
    pub fn new(source: &str, symbols: Rc<RefCell<ScopeTable>>) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 0,
            symbols,
            declaring: true,
            scan_errors: Vec::new(),
            declaration_errors: Vec::new(),
            stop_at: None,
            stopped: false,
            last_token: None,
        }
    }

    /// Flip identifier handling between define and look-up. Called only by
    /// the semantic actions.
    pub fn set_declaring(&mut self, declaring: bool) {
        self.declaring = declaring;
    }

    pub fn declaring(&self) -> bool {
        self.declaring
    }

    /// Arm the stop point for definition queries: once a produced token ends
    /// past `(line, column)` the stream reports end of input.
    pub fn arm_stop(&mut self, line: usize, column: usize) {
        self.stop_at = Some((line, column));
    }

    /// Whether the armed stop point has been reached.
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// The most recently produced token, retained across the stop point.
    pub fn last_token(&self) -> Option<&Token> {
        self.last_token.as_ref()
    }

    /// Scan-level diagnostics (unknown characters, unterminated literals, …).
    pub fn scan_errors(&self) -> &[Diagnostic] {
        &self.scan_errors
    }

    pub fn take_scan_errors(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.scan_errors)
    }

    /// Declaration-discipline diagnostics (not declared / already declared).
    pub fn take_declaration_errors(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.declaration_errors)
    }

    /// Produce the next token. Offending input records a diagnostic and the
    /// scan continues, so the caller always receives a token (ultimately
    /// end-of-input).
    pub fn next_token(&mut self) -> Token {
        loop {
            if self.stopped {
                return self.eof_token();
            }
            let Some(token) = self.scan() else {
                continue;
            };
            self.last_token = Some(token.clone());
            if let Some((stop_line, stop_column)) = self.stop_at {
                let ends_past = token.span.line > stop_line
                    || (token.span.line == stop_line
                        && token.span.column + token.span.length > stop_column);
                if ends_past {
                    self.stopped = true;
                    return self.eof_token();
                }
            }
            return token;
        }
    }

    fn eof_token(&self) -> Token {
        Token::new(
            TokenKind::Eof,
            "",
            Span::point(self.pos, self.line, self.column),
        )
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.chars.len() {
            self.pos += 1;
            self.column += 1;
        }
    }

    fn break_line(&mut self) {
        self.line += 1;
        self.column = 0;
    }

    /// One run of the DFA: from the start state to a terminal entry.
    /// Returns `None` when the run ended in an error or a dropped lexeme.
    fn scan(&mut self) -> Option<Token> {
        let mut state = STATE_START;
        let mut start = (self.pos, self.line, self.column);
        let mut value: i64 = 0;

        loop {
            if state == STATE_START {
                start = (self.pos, self.line, self.column);
            }
            let ch = self.peek();
            let class = classify(ch);
            let mut entry = transition(state, class);

            // Two value-dependent transitions the matrix cannot encode: a
            // 33rd identifier character and an integer digit that would push
            // the value past the limit divert into the skip states, which
            // report once for the whole lexeme.
            if state == STATE_IDENT
                && entry.next == STATE_IDENT
                && self.pos - start.0 == MAX_IDENTIFIER_LEN
            {
                entry = Entry {
                    next: STATE_IDENT_OVERFLOW,
                    ..entry
                };
            }
            let digit = ch.and_then(|c| c.to_digit(10)).map_or(0, i64::from);
            if state == STATE_NUMBER && entry.next == STATE_NUMBER && value * 10 + digit > MAX_INTEGER
            {
                entry = Entry {
                    next: STATE_NUMBER_OVERFLOW,
                    ..entry
                };
            }
            if entry.next == STATE_NUMBER {
                value = value * 10 + digit;
            }

            match entry.action {
                Action::Read => self.advance(),
                Action::ReadEol => {
                    self.advance();
                    self.break_line();
                }
                Action::HoldEol => self.break_line(),
                Action::Emit(class) => {
                    self.advance();
                    return self.finish(class, start);
                }
                Action::HoldEmit(class) => {
                    return self.finish(class, start);
                }
                Action::Error(kind) => {
                    self.advance();
                    self.record_scan_error(kind, start);
                    return None;
                }
                Action::HoldError(kind) => {
                    self.record_scan_error(kind, start);
                    return None;
                }
            }
            state = entry.next;
        }
    }

    fn finish(&mut self, class: TokenClass, start: (usize, usize, usize)) -> Option<Token> {
        let (pos, line, column) = start;
        let span = Span::new(pos, line, column, self.pos - pos);
        let lexeme: String = self.chars[pos..self.pos].iter().collect();

        match class {
            TokenClass::Fixed(kind) => Some(Token::new(kind, lexeme, span)),
            TokenClass::Number => Some(Token::new(TokenKind::IntLiteral, lexeme, span)),
            TokenClass::StringLit => {
                let content_len = lexeme.chars().count().saturating_sub(2);
                if content_len > MAX_STRING_LEN {
                    self.record_scan_error(ScanErrorKind::StringTooLong, start);
                    return None;
                }
                Some(Token::new(TokenKind::StrLiteral, lexeme, span))
            }
            TokenClass::Identifier => {
                let canonical = lexeme.to_ascii_lowercase();
                if let Some(keyword) = TokenKind::keyword(&canonical) {
                    return Some(Token::new(keyword, lexeme, span));
                }
                Some(self.identifier_token(lexeme, span))
            }
        }
    }

    /// Symbol-table coupling for a completed identifier.
    fn identifier_token(&mut self, lexeme: String, span: Span) -> Token {
        let mut symbols = self.symbols.borrow_mut();
        if self.declaring {
            match symbols.define(&lexeme, span) {
                Some(symbol) => Token::new(TokenKind::Identifier, lexeme, span).with_symbol(symbol),
                None => {
                    trace!(name = %lexeme, "duplicate declaration");
                    self.declaration_errors.push(
                        Diagnostic::error(
                            format!("'{lexeme}' already declared in current scope"),
                            span,
                        )
                        .with_code("E0301"),
                    );
                    // Attach the original so the parse and definition
                    // queries keep working past the duplicate.
                    let mut token = Token::new(TokenKind::Identifier, lexeme, span);
                    if let Some(existing) = symbols.lookup_current_scope(&token.lexeme) {
                        token = token.with_symbol(existing);
                    }
                    token
                }
            }
        } else {
            match symbols.lookup(&lexeme) {
                Some(symbol) => Token::new(TokenKind::Identifier, lexeme, span).with_symbol(symbol),
                None => {
                    trace!(name = %lexeme, "undeclared identifier");
                    self.declaration_errors.push(
                        Diagnostic::error(format!("Variable '{lexeme}' not declared"), span)
                            .with_code("E0302"),
                    );
                    Token::new(TokenKind::Identifier, lexeme, span)
                }
            }
        }
    }

    fn record_scan_error(&mut self, kind: ScanErrorKind, start: (usize, usize, usize)) {
        let (pos, line, column) = start;
        let run = Span::new(pos, line, column, (self.pos - pos).max(1));
        let cursor = Span::new(
            self.pos.saturating_sub(1),
            self.line,
            self.column.saturating_sub(1),
            1,
        );
        let (message, span, code) = match kind {
            ScanErrorKind::UnexpectedChar => {
                let offending = self.chars.get(self.pos.saturating_sub(1)).copied();
                (
                    format!(
                        "Unexpected character '{}'",
                        offending.map_or(String::new(), |c| c.to_string())
                    ),
                    cursor,
                    "E0101",
                )
            }
            ScanErrorKind::StrayRightBrace => (
                "Illegal '}' outside of comment".to_string(),
                cursor,
                "E0102",
            ),
            ScanErrorKind::StringNewline => (
                "String literal crosses end of line".to_string(),
                run,
                "E0103",
            ),
            ScanErrorKind::StringEof => {
                ("String literal is not terminated".to_string(), run, "E0104")
            }
            ScanErrorKind::CommentEof => ("Comment is not terminated".to_string(), run, "E0105"),
            ScanErrorKind::IdentifierTooLong => (
                format!("Identifier exceeds {MAX_IDENTIFIER_LEN} characters"),
                run,
                "E0106",
            ),
            ScanErrorKind::IntegerOverflow => (
                format!("Integer literal exceeds {MAX_INTEGER}"),
                run,
                "E0107",
            ),
            ScanErrorKind::StringTooLong => (
                format!("String literal exceeds {MAX_STRING_LEN} characters"),
                run,
                "E0108",
            ),
        };
        self.scan_errors
            .push(Diagnostic::error(message, span).with_code(code));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexer(source: &str) -> Lexer {
        Lexer::new(source, Rc::new(RefCell::new(ScopeTable::new())))
    }

    /// Collect every token up to and including end of input.
    fn scan_all(source: &str) -> (Vec<Token>, Lexer) {
        let mut lx = lexer(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lx.next_token();
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        (tokens, lx)
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_punctuation() {
        let (tokens, lx) = scan_all("program Demo;");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Program,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
        assert!(lx.scan_errors().is_empty());
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let (tokens, _) = scan_all("BEGIN End beGIn");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Begin,
                TokenKind::End,
                TokenKind::Begin,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        let (tokens, _) = scan_all(":= <= <> >= ** < > = : *");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Assign,
                TokenKind::LessEqual,
                TokenKind::NotEqual,
                TokenKind::GreaterEqual,
                TokenKind::Power,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Equal,
                TokenKind::Colon,
                TokenKind::Star,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_spans_reproduce_source() {
        let source = "program P; { note } var x: integer;";
        let (tokens, _) = scan_all(source);
        let chars: Vec<char> = source.chars().collect();
        for tok in tokens.iter().filter(|t| t.kind != TokenKind::Eof) {
            let slice: String = chars[tok.span.position..tok.span.end()].iter().collect();
            assert_eq!(slice, tok.lexeme, "span should cover the lexeme exactly");
        }
    }

    #[test]
    fn test_line_and_column_tracking() {
        let (tokens, _) = scan_all("var\n  x;");
        assert_eq!(tokens[0].span, Span::new(0, 1, 0, 3));
        assert_eq!(tokens[1].span, Span::new(6, 2, 2, 1));
    }

    #[test]
    fn test_crlf_counts_one_line() {
        let (tokens, _) = scan_all("var\r\nx");
        assert_eq!(tokens[1].span.line, 2);
    }

    #[test]
    fn test_lone_cr_counts_one_line() {
        let (tokens, _) = scan_all("var\rx");
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 0);
    }

    #[test]
    fn test_comment_spans_lines() {
        let (tokens, lx) = scan_all("{ first\nsecond }var");
        assert_eq!(tokens[0].kind, TokenKind::Var);
        assert_eq!(tokens[0].span.line, 2);
        assert!(lx.scan_errors().is_empty());
    }

    #[test]
    fn test_unclosed_comment() {
        let (tokens, lx) = scan_all("begin { runs off");
        assert_eq!(kinds(&tokens), vec![TokenKind::Begin, TokenKind::Eof]);
        assert_eq!(lx.scan_errors().len(), 1);
        assert_eq!(lx.scan_errors()[0].code.as_deref(), Some("E0105"));
    }

    #[test]
    fn test_stray_right_brace() {
        let (_, lx) = scan_all("begin } end");
        assert_eq!(lx.scan_errors()[0].code.as_deref(), Some("E0102"));
    }

    #[test]
    fn test_unexpected_character() {
        let (_, lx) = scan_all("begin @ end");
        assert_eq!(lx.scan_errors()[0].code.as_deref(), Some("E0101"));
        assert!(lx.scan_errors()[0].message.contains('@'));
    }

    #[test]
    fn test_string_literal() {
        let (tokens, lx) = scan_all("'hello world'");
        assert_eq!(tokens[0].kind, TokenKind::StrLiteral);
        assert_eq!(tokens[0].lexeme, "'hello world'");
        assert!(lx.scan_errors().is_empty());
    }

    #[test]
    fn test_string_backslash_is_literal() {
        let (tokens, lx) = scan_all(r"'a\n'");
        assert_eq!(tokens[0].kind, TokenKind::StrLiteral);
        assert_eq!(tokens[0].lexeme, r"'a\n'");
        assert!(lx.scan_errors().is_empty());
    }

    #[test]
    fn test_string_crossing_newline() {
        let (_, lx) = scan_all("'broken\nrest'");
        assert_eq!(lx.scan_errors()[0].code.as_deref(), Some("E0103"));
    }

    #[test]
    fn test_string_hitting_eof() {
        let (_, lx) = scan_all("'broken");
        assert_eq!(lx.scan_errors()[0].code.as_deref(), Some("E0104"));
    }

    #[test]
    fn test_string_length_boundary() {
        let ok = format!("'{}'", "a".repeat(64));
        let (tokens, lx) = scan_all(&ok);
        assert_eq!(tokens[0].kind, TokenKind::StrLiteral);
        assert!(lx.scan_errors().is_empty());

        let over = format!("'{}'", "a".repeat(65));
        let (tokens, lx) = scan_all(&over);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(lx.scan_errors()[0].code.as_deref(), Some("E0108"));
    }

    #[test]
    fn test_identifier_length_boundary() {
        let ok = "a".repeat(32);
        let (tokens, lx) = scan_all(&ok);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert!(lx.scan_errors().is_empty());

        let over = "a".repeat(33);
        let (tokens, lx) = scan_all(&over);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(lx.scan_errors().len(), 1, "one error for the whole run");
        assert_eq!(lx.scan_errors()[0].code.as_deref(), Some("E0106"));
    }

    #[test]
    fn test_integer_boundary() {
        let (tokens, lx) = scan_all("32767");
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        assert!(lx.scan_errors().is_empty());

        let (tokens, lx) = scan_all("32768");
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(lx.scan_errors().len(), 1);
        assert_eq!(lx.scan_errors()[0].code.as_deref(), Some("E0107"));
    }

    #[test]
    fn test_declaring_mode_defines() {
        let symbols = Rc::new(RefCell::new(ScopeTable::new()));
        let mut lx = Lexer::new("alpha", Rc::clone(&symbols));
        let tok = lx.next_token();
        assert!(tok.symbol.is_some());
        assert!(symbols.borrow().lookup_current_scope("ALPHA").is_some());
    }

    #[test]
    fn test_duplicate_declaration() {
        let symbols = Rc::new(RefCell::new(ScopeTable::new()));
        let mut lx = Lexer::new("x x", Rc::clone(&symbols));
        let first = lx.next_token();
        let second = lx.next_token();
        let errors = lx.take_declaration_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code.as_deref(), Some("E0301"));
        // Both tokens resolve to the original definition.
        let (a, b) = (first.symbol.expect("first"), second.symbol.expect("second"));
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_use_mode_resolves() {
        let symbols = Rc::new(RefCell::new(ScopeTable::new()));
        symbols.borrow_mut().define("count", Span::default());
        let mut lx = Lexer::new("Count", Rc::clone(&symbols));
        lx.set_declaring(false);
        let tok = lx.next_token();
        assert!(tok.symbol.is_some());
    }

    #[test]
    fn test_use_mode_undeclared() {
        let symbols = Rc::new(RefCell::new(ScopeTable::new()));
        let mut lx = Lexer::new("ghost", Rc::clone(&symbols));
        lx.set_declaring(false);
        let tok = lx.next_token();
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert!(tok.symbol.is_none());
        let errors = lx.take_declaration_errors();
        assert_eq!(errors[0].message, "Variable 'ghost' not declared");
        assert_eq!(errors[0].code.as_deref(), Some("E0302"));
    }

    #[test]
    fn test_stop_at_ends_stream() {
        let symbols = Rc::new(RefCell::new(ScopeTable::new()));
        let mut lx = Lexer::new("alpha beta gamma", Rc::clone(&symbols));
        // Stop inside "beta" (line 1, column 7).
        lx.arm_stop(1, 7);
        assert_eq!(lx.next_token().lexeme, "alpha");
        let tok = lx.next_token();
        assert_eq!(tok.kind, TokenKind::Eof, "crossing token is withheld");
        assert!(lx.stopped());
        assert_eq!(lx.last_token().expect("retained").lexeme, "beta");
        // Stream stays ended.
        assert_eq!(lx.next_token().kind, TokenKind::Eof);
    }
}

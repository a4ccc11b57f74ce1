//! Character classes: the column alphabet of the scanner DFA.

/// The 22 input columns of the transition matrix. Every input character maps
/// onto exactly one class; anything without a class of its own folds onto
/// [`CharClass::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Letter,
    Digit,
    Space,
    LineFeed,
    Plus,
    Minus,
    Star,
    Slash,
    Equal,
    Less,
    Greater,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Quote,
    Semicolon,
    Colon,
    Comma,
    Eof,
    Other,
    CarriageReturn,
}

/// Classify one input character. `None` marks end of input.
pub fn classify(ch: Option<char>) -> CharClass {
    let Some(ch) = ch else {
        return CharClass::Eof;
    };
    match ch {
        'a'..='z' | 'A'..='Z' | '_' => CharClass::Letter,
        '0'..='9' => CharClass::Digit,
        ' ' | '\t' => CharClass::Space,
        '\n' => CharClass::LineFeed,
        '\r' => CharClass::CarriageReturn,
        '+' => CharClass::Plus,
        '-' => CharClass::Minus,
        '*' => CharClass::Star,
        '/' => CharClass::Slash,
        '=' => CharClass::Equal,
        '<' => CharClass::Less,
        '>' => CharClass::Greater,
        '(' => CharClass::LParen,
        ')' => CharClass::RParen,
        '{' => CharClass::LBrace,
        '}' => CharClass::RBrace,
        '\'' => CharClass::Quote,
        ';' => CharClass::Semicolon,
        ':' => CharClass::Colon,
        ',' => CharClass::Comma,
        _ => CharClass::Other,
    }
}

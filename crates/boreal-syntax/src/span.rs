use serde::{Deserialize, Serialize};

/// Source range: absolute char offset, 1-based line, 0-based column, length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub position: usize,
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

impl Span {
    pub fn new(position: usize, line: usize, column: usize, length: usize) -> Self {
        Self {
            position,
            line,
            column,
            length,
        }
    }

    /// Zero-length span at a point.
    pub fn point(position: usize, line: usize, column: usize) -> Self {
        Self::new(position, line, column, 0)
    }

    /// One past the last covered offset.
    pub fn end(&self) -> usize {
        self.position + self.length
    }

    /// Whether an absolute offset falls inside this span.
    pub fn contains(&self, position: usize) -> bool {
        position >= self.position && position < self.end()
    }

    /// Covering span: starts where `self` starts, ends where `other` ends.
    pub fn to(self, other: Span) -> Span {
        let end = other.end().max(self.end());
        Span {
            length: end - self.position,
            ..self
        }
    }
}

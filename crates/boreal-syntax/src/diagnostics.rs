use serde::{Deserialize, Serialize};

use crate::span::Span;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic message with a source span and a stable code.
///
/// Code ranges: `E01xx` lexical, `E0200` syntax, `E03xx` declarations,
/// `E04xx` types, `E05xx` control flow, `E06xx` program structure,
/// `W0xxx` warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
            code: None,
        }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span,
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructor() {
        let d = Diagnostic::error("bad thing", Span::new(3, 1, 3, 4));
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "bad thing");
        assert_eq!(d.span.position, 3);
        assert!(d.code.is_none());
    }

    #[test]
    fn test_with_code() {
        let d = Diagnostic::warning("unused", Span::default()).with_code("W0301");
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.code.as_deref(), Some("W0301"));
    }

    #[test]
    fn test_wire_shape() {
        let d = Diagnostic::error("boom", Span::new(0, 1, 0, 1)).with_code("E0101");
        let json = serde_json::to_string(&d).expect("should serialize");
        assert!(json.contains("\"severity\":\"error\""));
        assert!(json.contains("\"code\":\"E0101\""));
    }
}

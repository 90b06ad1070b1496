//! Diagnostics attached to a parsed tree

use std::fmt;

use crate::base::{LineIndex, Span, TextRange, TextSize};

use super::codes::ErrorCode;
use super::context::ParseContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Error,
    /// The tree is still what the author meant, e.g. a `/-` with nothing to
    /// comment out
    Warning,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
        })
    }
}

/// A second location that explains a diagnostic, such as the `{` a missing
/// `}` belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub message: String,
    pub range: TextRange,
}

impl RelatedInfo {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// One problem found while parsing. The tree marks the same region with an
/// `ERROR` node or a missing token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
    /// Line/column form of `range`, filled in when the tree is finished
    pub span: Span,
    pub code: ErrorCode,
    pub severity: Severity,
    pub hint: Option<String>,
    pub related: Vec<RelatedInfo>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            range,
            span: Span::default(),
            code,
            severity: code.severity(),
            hint: None,
            related: Vec::new(),
        }
    }

    /// Zero-width error at `offset`
    pub fn at_offset(message: impl Into<String>, offset: TextSize, code: ErrorCode) -> Self {
        Self::new(message, TextRange::empty(offset), code)
    }

    /// Error with the code's default message
    pub fn from_code(code: ErrorCode, range: TextRange) -> Self {
        Self::new(code.default_message(), range, code)
    }

    /// "unexpected X in Y, expected Z"
    pub fn unexpected(found: &str, context: ParseContext, range: TextRange, code: ErrorCode) -> Self {
        let message = format!(
            "unexpected {found} {}, expected {}",
            context.description(),
            context.expected_description()
        );
        Self::new(message, range, code)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn has_hint(&self) -> bool {
        self.hint.is_some()
    }

    pub fn has_related(&self) -> bool {
        !self.related.is_empty()
    }

    pub(crate) fn locate(&mut self, lines: &LineIndex) {
        self.span = Span::new(lines.line_col(self.range.start()), lines.line_col(self.range.end()));
    }

    /// Multi-line report with 1-based positions, hint and notes
    pub fn report(&self) -> String {
        let mut out = format!(
            "{}:{}: {} {}: {}",
            self.span.start.line + 1,
            self.span.start.col + 1,
            self.severity,
            self.code,
            self.message
        );
        if let Some(hint) = &self.hint {
            out.push_str("\n  hint: ");
            out.push_str(hint);
        }
        for related in &self.related {
            out.push_str(&format!(
                "\n  note: {} at {}..{}",
                related.message,
                u32::from(related.range.start()),
                u32::from(related.range.end())
            ));
        }
        out
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

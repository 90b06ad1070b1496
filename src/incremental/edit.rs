//! Text edits between two versions of a document

use thiserror::Error;

use crate::base::{LineCol, LineIndex, MAX_TEXT_LEN, TextRange, TextSize, text_size};

/// One replacement, in the coordinates of the previous text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edit {
    pub start: TextSize,
    /// End of the replaced text in the previous document
    pub old_end: TextSize,
    /// Length of the text that replaced it
    pub new_len: TextSize,
    /// Line/column where the inserted text ends in the new text, if known
    pub new_end: Option<LineCol>,
}

impl Edit {
    pub fn new(range: TextRange, new_len: TextSize) -> Self {
        Self {
            start: range.start(),
            old_end: range.end(),
            new_len,
            new_end: None,
        }
    }

    /// Replace `range` with `text`
    pub fn replace(range: TextRange, text: &str) -> Self {
        Self::new(range, text_size(text.len()))
    }

    pub fn insert(at: TextSize, text: &str) -> Self {
        Self::replace(TextRange::empty(at), text)
    }

    pub fn delete(range: TextRange) -> Self {
        Self::new(range, TextSize::new(0))
    }

    pub fn with_new_end(mut self, end: LineCol) -> Self {
        self.new_end = Some(end);
        self
    }

    /// The replaced range, `None` if the edit is inverted
    pub fn old_range(&self) -> Option<TextRange> {
        (self.start <= self.old_end).then(|| TextRange::new(self.start, self.old_end))
    }

    /// Signed change in document length
    pub fn delta(&self) -> i64 {
        i64::from(u32::from(self.new_len)) - i64::from(u32::from(self.old_end))
            + i64::from(u32::from(self.start))
    }
}

/// Why an edit list cannot describe a change to the previous text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum InvalidEditKind {
    #[error("edit range ends before it starts")]
    Inverted,
    #[error("edit range extends past the end of the previous text")]
    OutOfBounds,
    #[error("edit overlaps or precedes the edit before it")]
    Overlapping,
    #[error("reported end position does not match the new text")]
    EndPosition,
}

/// Errors surfaced by incremental re-parsing; source problems never are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReparseError {
    #[error("edit {index} is invalid: {kind}")]
    InvalidEdit { index: usize, kind: InvalidEditKind },
    #[error("edits produce a text of {expected:?} bytes, but the new text has {actual:?}")]
    LengthMismatch { expected: TextSize, actual: TextSize },
    #[error("new text is {len} bytes, more than offsets can address")]
    TooLong { len: usize },
}

/// Check `edits` against the previous text length and the new text
pub(crate) fn validate(old_len: TextSize, edits: &[Edit], new_text: &str) -> Result<(), ReparseError> {
    let invalid = |index, kind| ReparseError::InvalidEdit { index, kind };
    if new_text.len() > MAX_TEXT_LEN {
        return Err(ReparseError::TooLong { len: new_text.len() });
    }

    let mut previous_end = TextSize::new(0);
    let mut delta: i64 = 0;
    // Built lazily; most callers do not report end positions
    let mut lines: Option<LineIndex> = None;

    for (index, edit) in edits.iter().enumerate() {
        let Some(range) = edit.old_range() else {
            return Err(invalid(index, InvalidEditKind::Inverted));
        };
        if range.end() > old_len {
            return Err(invalid(index, InvalidEditKind::OutOfBounds));
        }
        if index > 0 && range.start() < previous_end {
            return Err(invalid(index, InvalidEditKind::Overlapping));
        }

        if let Some(reported) = edit.new_end {
            let start = i64::from(u32::from(range.start())) + delta;
            let end = start + i64::from(u32::from(edit.new_len));
            let lines = lines.get_or_insert_with(|| LineIndex::new(new_text));
            let fits = u32::try_from(end)
                .ok()
                .map(TextSize::new)
                .filter(|&end| end <= TextSize::of(new_text))
                .is_some_and(|end| lines.line_col(end) == reported);
            if !fits {
                return Err(invalid(index, InvalidEditKind::EndPosition));
            }
        }

        previous_end = range.end();
        delta += edit.delta();
    }

    let expected = i64::from(u32::from(old_len)) + delta;
    let actual = TextSize::of(new_text);
    if expected != i64::from(u32::from(actual)) {
        return Err(ReparseError::LengthMismatch {
            expected: TextSize::new(u32::try_from(expected.max(0)).unwrap_or(u32::MAX)),
            actual,
        });
    }
    Ok(())
}

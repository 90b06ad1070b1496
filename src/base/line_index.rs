//! Byte offset to line/column mapping.
//!
//! Line breaks follow KDL: CRLF, CR, LF, NEL, FF, LS and PS each end a line.

use super::position::LineCol;
use text_size::TextSize;

/// Longest text that `u32` offsets can address
pub const MAX_TEXT_LEN: usize = u32::MAX as usize;

/// The part of `text` positions can address: all of it, or its longest
/// prefix within [`MAX_TEXT_LEN`] that ends on a character boundary
pub fn addressable(text: &str) -> &str {
    prefix_within(text, MAX_TEXT_LEN)
}

fn prefix_within(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Offset into an [`addressable`] text
pub(crate) fn text_size(offset: usize) -> TextSize {
    TextSize::new(u32::try_from(offset).unwrap_or(u32::MAX))
}

/// Length in bytes of the newline sequence at the start of `s`, if any
pub(crate) fn newline_len(s: &str) -> Option<usize> {
    match s.chars().next()? {
        '\r' if s[1..].starts_with('\n') => Some(2),
        c @ ('\r' | '\n' | '\u{85}' | '\u{C}' | '\u{2028}' | '\u{2029}') => Some(c.len_utf8()),
        _ => None,
    }
}

/// Sorted start offsets of every line in a text.
///
/// An empty text has exactly one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let text = addressable(text);
        let mut starts = vec![TextSize::new(0)];
        let mut offset = 0;
        while offset < text.len() {
            let rest = &text[offset..];
            match newline_len(rest) {
                Some(len) => {
                    offset += len;
                    starts.push(text_size(offset));
                }
                None => offset += rest.chars().next().map_or(1, char::len_utf8),
            }
        }
        Self {
            starts,
            len: text_size(text.len()),
        }
    }

    /// Line and byte column of `offset`. Offsets past the end clamp to the end.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(self.len);
        let line = match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        LineCol::new(line as u32, u32::from(offset - self.starts[line]))
    }

    /// Byte offset of a line/column position, if the line exists
    pub fn offset(&self, position: LineCol) -> Option<TextSize> {
        let start = *self.starts.get(position.line as usize)?;
        let offset = start + TextSize::new(position.col);
        (offset <= self.len).then_some(offset)
    }

    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        self.starts.get(line as usize).copied()
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    pub fn len(&self) -> TextSize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == TextSize::new(0)
    }
}

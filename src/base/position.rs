/// Line/column positions for tokens, nodes and diagnostics.
///
/// Lines and columns are 0-indexed; columns count UTF-8 bytes from the start
/// of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// A line/column range in source code (end exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: LineCol,
    pub end: LineCol,
}

impl LineCol {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl Span {
    pub fn new(start: LineCol, end: LineCol) -> Self {
        Self { start, end }
    }

    /// Create a span from line/column coordinates
    pub fn from_coords(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start: LineCol::new(start_line, start_col),
            end: LineCol::new(end_line, end_col),
        }
    }

    /// Check if a position falls within this span
    pub fn contains(&self, position: LineCol) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }
}

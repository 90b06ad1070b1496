//! Foundation types for the KDL parser.
//!
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineCol`], [`LineIndex`] - Line/column conversion
//! - [`Span`] - Line/column ranges for diagnostics and tree nodes
//!
//! This module has NO dependencies on other crate modules.

mod line_index;
mod position;

pub use line_index::{LineIndex, MAX_TEXT_LEN, addressable};
pub(crate) use line_index::{newline_len, text_size};
pub use position::{LineCol, Span};
pub use ::text_size::{TextRange, TextSize};

// Re-export text-size for convenience
pub use ::text_size;

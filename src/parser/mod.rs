//! Table-driven parser for KDL
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos + string modes) → Tokens with SyntaxKind and ScanState
//!     ↓
//! Engine (LALR(1) table) → shift/reduce with error recovery
//!     ↓
//! TreeBuilder → arena-backed Tree (lossless, every byte covered)
//! ```
//!
//! The grammar is data (`grammar::kdl`); the table is computed from it once
//! per process and shared by every parse.
//!
//! ## Error Recovery
//!
//! Parsing never fails. Missing closing tokens are synthesised as zero-width
//! leaves; anything else is wrapped in `ERROR` nodes at the nearest point
//! where the grammar accepts the `error` pseudo-terminal.

mod engine;
pub mod errors;
pub mod grammar;
mod lexer;
mod options;
pub(crate) mod syntax_kind;
pub mod table;

pub use engine::{parse, parse_with_options};
pub(crate) use engine::parse_reusing;
pub use errors::{ErrorCode, ParseContext, SyntaxError};
pub use lexer::{LexError, Lexer, LexerSnapshot, ScanState, Token, tokenize};
pub use options::ParseOptions;
pub use syntax_kind::{SyntaxKind, kind_to_name};
pub use table::{ParseTable, kdl_table};

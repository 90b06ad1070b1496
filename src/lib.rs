//! # kdl-sitter
//!
//! Grammar-driven incremental parser for the KDL document language.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! incremental → edit validation, subtree reuse, re-parse
//!   ↓
//! syntax      → arena-backed tree, builder, navigation
//!   ↓
//! parser      → lexer, grammar, LALR(1) table, shift-reduce engine
//!   ↓
//! base        → TextRange/TextSize, LineCol, LineIndex
//! ```
//!
//! ## Example
//!
//! ```
//! use kdl_sitter::{Edit, TextSize, parse, reparse};
//!
//! let tree = parse("node \"value\"\n");
//! assert_eq!(tree.to_sexp(), "(document (node (identifier) (argument (string))))");
//!
//! let edit = Edit::insert(TextSize::new(12), " 2");
//! let tree = reparse(&tree, &[edit], "node \"value\" 2\n").unwrap();
//! assert!(!tree.has_error());
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → syntax → incremental)
// ============================================================================

/// Foundation types: TextRange, LineCol, LineIndex
pub mod base;

/// Parser: lexer, grammar description, parse table, engine
pub mod parser;

/// Syntax: tree arena, builder, node navigation
pub mod syntax;

/// Incremental re-parsing after edits
pub mod incremental;

// Re-export the everyday surface
pub use base::{LineCol, LineIndex, Span, TextRange, TextSize};
pub use incremental::{Edit, InvalidEditKind, ReparseError, reparse, reparse_with_options};
pub use parser::{ParseOptions, SyntaxError, SyntaxKind, parse, parse_with_options};
pub use syntax::{NodeId, NodeRef, Tree};

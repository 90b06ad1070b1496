//! Incremental re-parsing
//!
//! A re-parse runs the ordinary engine over the whole new text, but at every
//! node boundary it first asks a [`ReusePlan`] whether an untouched node of
//! the previous tree starts at the current offset. If it does, and the
//! scanner is in the state that node was lexed in, the node is copied into
//! the new arena (ranges shifted) and the lexer jumps past it.
//!
//! The previous tree is only read. Reuse decisions never change the result:
//! a re-parse yields the same kinds and ranges as a fresh parse of the new
//! text.

mod edit;
mod reuse;

pub use edit::{Edit, InvalidEditKind, ReparseError};
pub(crate) use reuse::ReusePlan;

use crate::parser::{ParseOptions, parse_reusing};
use crate::syntax::Tree;

/// Re-parse `new_text`, which is `previous` with `edits` applied
pub fn reparse(previous: &Tree, edits: &[Edit], new_text: &str) -> Result<Tree, ReparseError> {
    reparse_with_options(previous, edits, new_text, &ParseOptions::default())
}

pub fn reparse_with_options(
    previous: &Tree,
    edits: &[Edit],
    new_text: &str,
    options: &ParseOptions,
) -> Result<Tree, ReparseError> {
    edit::validate(previous.len(), edits, new_text)?;

    let plan = ReusePlan::new(previous, edits);
    let tree = parse_reusing(new_text, options, &plan);

    let stats = tree.stats();
    tracing::debug!(
        edits = edits.len(),
        candidates = plan.len(),
        reused_nodes = stats.reused_nodes,
        reused_bytes = stats.reused_bytes,
        len = new_text.len(),
        "reparsed document"
    );
    Ok(tree)
}

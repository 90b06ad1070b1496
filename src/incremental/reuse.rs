//! Subtrees of a previous tree that a re-parse may copy instead of re-lexing

use rustc_hash::FxHashMap;

use super::edit::Edit;
use crate::base::{TextRange, TextSize};
use crate::parser::grammar::kdl;
use crate::parser::{ScanState, SyntaxKind};
use crate::syntax::{NodeId, NodeRef, Tree, shift};

/// A complete node that no edit touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub node: NodeId,
    /// Byte shift from the previous text to the new one
    pub delta: i64,
    /// Kind of the node's first token
    pub first: SyntaxKind,
    /// Scanner state before the node's first token
    pub state: ScanState,
    pub len: TextSize,
}

/// Reuse candidates of a previous tree, keyed by start offset in the new text
#[derive(Debug)]
pub(crate) struct ReusePlan<'t> {
    old: &'t Tree,
    by_start: FxHashMap<TextSize, Candidate>,
}

impl<'t> ReusePlan<'t> {
    /// Collect every undamaged, error-free `NODE` of `old` that ends with its
    /// own terminator. `edits` must already be validated.
    pub fn new(old: &'t Tree, edits: &[Edit]) -> Self {
        let damage: Vec<(TextRange, i64)> = edits
            .iter()
            .filter_map(|edit| edit.old_range().map(|range| (range, edit.delta())))
            .collect();

        let mut by_start = FxHashMap::default();
        let mut stack = vec![old.root()];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                continue;
            }
            let range = node.range();
            let damaged = damage.iter().any(|(edit, _)| touches(range, *edit));
            if !damaged && is_reusable(node) {
                if let Some(candidate) = candidate(node, &damage) {
                    let start = shift(range, candidate.delta).start();
                    by_start.insert(start, candidate);
                }
            }
            // Nested nodes stay candidates in case the outer one is rejected
            stack.extend(node.children());
        }

        tracing::debug!(
            candidates = by_start.len(),
            edits = edits.len(),
            "collected reusable nodes"
        );
        Self { old, by_start }
    }

    pub fn old(&self) -> &'t Tree {
        self.old
    }

    pub fn candidate(&self, offset: TextSize) -> Option<&Candidate> {
        self.by_start.get(&offset)
    }

    pub fn len(&self) -> usize {
        self.by_start.len()
    }
}

/// Closed-interval overlap, so an edit right at a node's edge touches it
fn touches(node: TextRange, edit: TextRange) -> bool {
    node.start() <= edit.end() && node.end() >= edit.start()
}

fn is_reusable(node: NodeRef<'_>) -> bool {
    node.kind() == SyntaxKind::NODE
        && !node.has_error()
        // A nested marker becomes `VERSION` if an edit moves it to the top level
        && !kdl::is_version_marker(node.children().map(|c| (c.kind(), c.text())))
        && node
            .last_child()
            .is_some_and(|c| matches!(c.kind(), SyntaxKind::NEWLINE | SyntaxKind::SEMICOLON))
}

fn candidate(node: NodeRef<'_>, damage: &[(TextRange, i64)]) -> Option<Candidate> {
    let range = node.range();
    let delta = damage
        .iter()
        .take_while(|(edit, _)| edit.end() < range.start())
        .map(|(_, delta)| delta)
        .sum();
    let first = node.tokens().next()?;
    Some(Candidate {
        node: node.id(),
        delta,
        first: first.kind(),
        state: first.scan_state(),
        len: range.len(),
    })
}

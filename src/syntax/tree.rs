//! Immutable syntax trees and node handles

use std::fmt::Write as _;

use super::arena::{Arena, NodeData, NodeFlags, NodeId};
use crate::base::{LineIndex, Span, TextRange, TextSize};
use crate::parser::errors::SyntaxError;
use crate::parser::{ScanState, SyntaxKind};

/// Counters collected while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseStats {
    /// Tokens produced by the lexer, trivia included
    pub tokens: usize,
    pub shifts: usize,
    pub reductions: usize,
    pub recoveries: usize,
    /// Subtrees copied from a previous tree
    pub reused_nodes: usize,
    /// Source bytes covered by reused subtrees
    pub reused_bytes: usize,
}

/// A parsed document: the source text plus an arena of nodes
#[derive(Debug, Clone)]
pub struct Tree {
    text: String,
    arena: Arena,
    root: NodeId,
    lines: LineIndex,
    diagnostics: Vec<SyntaxError>,
    stats: ParseStats,
}

impl Tree {
    pub(crate) fn new(
        text: String,
        arena: Arena,
        root: NodeId,
        lines: LineIndex,
        diagnostics: Vec<SyntaxError>,
        stats: ParseStats,
    ) -> Self {
        Self {
            text,
            arena,
            root,
            lines,
            diagnostics,
            stats,
        }
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: self.root,
        }
    }

    /// Handle for `id`, if it belongs to this tree
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.arena.get(id).map(|_| NodeRef { tree: self, id })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> TextSize {
        TextSize::of(self.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of nodes in the arena, token leaves included
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn has_error(&self) -> bool {
        self.root().has_error()
    }

    pub fn diagnostics(&self) -> &[SyntaxError] {
        &self.diagnostics
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// Deepest node whose range contains `offset`
    pub fn covering_node(&self, offset: TextSize) -> NodeRef<'_> {
        let mut node = self.root();
        while let Some(child) = node
            .children()
            .find(|c| c.range().contains(offset) || (c.range().is_empty() && c.range().start() == offset))
        {
            node = child;
        }
        node
    }

    /// Named nodes as an s-expression, e.g. `(document (node (identifier)))`.
    /// Missing tokens appear as `(MISSING name)`.
    pub fn to_sexp(&self) -> String {
        enum Step {
            Enter(NodeId),
            Exit,
        }

        let mut out = String::new();
        let mut stack = vec![Step::Enter(self.root)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Exit => out.push(')'),
                Step::Enter(id) => {
                    let node = NodeRef { tree: self, id };
                    if !node.is_missing() && !node.kind().is_node() {
                        continue;
                    }
                    if !out.is_empty() && !out.ends_with('(') {
                        out.push(' ');
                    }
                    if node.is_missing() {
                        let _ = write!(out, "(MISSING {})", node.kind().sexp_name());
                        continue;
                    }
                    out.push('(');
                    out.push_str(node.kind().sexp_name());
                    stack.push(Step::Exit);
                    stack.extend(node.children().rev().map(|c| Step::Enter(c.id)));
                }
            }
        }
        out
    }

    /// Every node, one per line, indented by depth
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = NodeRef { tree: self, id };
            let range = node.range();
            let _ = write!(
                out,
                "{:indent$}{:?}@{}..{}",
                "",
                node.kind(),
                u32::from(range.start()),
                u32::from(range.end()),
                indent = depth * 2
            );
            if node.is_missing() {
                out.push_str(" MISSING");
            } else if node.is_leaf() {
                let _ = write!(out, " {:?}", node.text());
            }
            if node.is_slashdashed() {
                out.push_str(" SLASHDASHED");
            }
            out.push('\n');
            stack.extend(node.children().rev().map(|c| (c.id, depth + 1)));
        }
        out
    }

    /// Same kinds, ranges and flags in the same pre-order
    pub fn same_shape(&self, other: &Tree) -> bool {
        let mut ours = self.root().descendants();
        let mut theirs = other.root().descendants();
        loop {
            match (ours.next(), theirs.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) => {
                    let (a, b) = (a.data(), b.data());
                    if a.kind != b.kind || a.range != b.range || a.flags != b.flags {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

/// Borrowed handle to one node of a [`Tree`]
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.range())
    }
}

impl<'t> NodeRef<'t> {
    fn data(&self) -> &'t NodeData {
        self.tree.arena.data(self.id)
    }

    fn at(&self, id: NodeId) -> NodeRef<'t> {
        NodeRef { tree: self.tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn range(&self) -> TextRange {
        self.data().range
    }

    pub fn text(&self) -> &'t str {
        &self.tree.text[self.range()]
    }

    pub fn flags(&self) -> NodeFlags {
        self.data().flags
    }

    /// Line/column extent of the node
    pub fn span(&self) -> Span {
        let range = self.range();
        Span::new(
            self.tree.lines.line_col(range.start()),
            self.tree.lines.line_col(range.end()),
        )
    }

    /// Scanner state the lexer was in before this node's first token
    pub fn scan_state(&self) -> ScanState {
        self.data().state
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.data().parent.map(|id| self.at(id))
    }

    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'t>> + use<'t> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = NodeRef<'t>> + ExactSizeIterator + use<'t> {
        let tree = self.tree;
        tree.arena
            .children(self.id)
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    /// Children that are not trivia tokens
    pub fn significant_children(&self) -> impl Iterator<Item = NodeRef<'t>> + use<'t> {
        self.children().filter(|c| !c.is_trivia())
    }

    pub fn child_count(&self) -> usize {
        self.data().child_count as usize
    }

    pub fn first_child(&self) -> Option<NodeRef<'t>> {
        self.tree.arena.children(self.id).first().map(|&id| self.at(id))
    }

    pub fn last_child(&self) -> Option<NodeRef<'t>> {
        self.tree.arena.children(self.id).last().map(|&id| self.at(id))
    }

    /// First child of the given kind
    pub fn child_of_kind(&self, kind: SyntaxKind) -> Option<NodeRef<'t>> {
        self.children().find(|c| c.kind() == kind)
    }

    fn sibling(&self, offset: isize) -> Option<NodeRef<'t>> {
        let parent = self.data().parent?;
        let index = self.data().index_in_parent as isize + offset;
        let siblings = self.tree.arena.children(parent);
        usize::try_from(index)
            .ok()
            .and_then(|i| siblings.get(i))
            .map(|&id| self.at(id))
    }

    pub fn next_sibling(&self) -> Option<NodeRef<'t>> {
        self.sibling(1)
    }

    pub fn prev_sibling(&self) -> Option<NodeRef<'t>> {
        self.sibling(-1)
    }

    /// This node and everything below it, in pre-order
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            stack: vec![self.id],
        }
    }

    /// Token leaves below this node, in source order
    pub fn tokens(&self) -> impl Iterator<Item = NodeRef<'t>> + use<'t> {
        self.descendants().filter(|n| n.is_leaf())
    }

    pub fn is_leaf(&self) -> bool {
        self.data().child_count == 0 && self.kind().is_token()
    }

    pub fn is_token(&self) -> bool {
        self.is_leaf()
    }

    pub fn is_trivia(&self) -> bool {
        self.kind().is_trivia()
    }

    pub fn is_error(&self) -> bool {
        self.kind() == SyntaxKind::ERROR
    }

    pub fn is_missing(&self) -> bool {
        self.data().flags.contains(NodeFlags::MISSING)
    }

    /// This node is, or contains, an error or missing token
    pub fn has_error(&self) -> bool {
        self.data().flags.contains(NodeFlags::HAS_ERROR)
    }

    /// Commented out by a leading `/-`
    pub fn is_slashdashed(&self) -> bool {
        self.data().flags.contains(NodeFlags::SLASHDASHED)
    }

    /// Neither this node nor any ancestor is slashdashed
    pub fn is_active(&self) -> bool {
        !self.is_slashdashed() && self.ancestors().all(|a| !a.is_slashdashed())
    }
}

/// Pre-order walk using an explicit stack
pub struct Descendants<'t> {
    tree: &'t Tree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = NodeRef<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.arena.children(id).iter().rev().copied());
        Some(NodeRef {
            tree: self.tree,
            id,
        })
    }
}

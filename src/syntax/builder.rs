//! Bottom-up tree construction
//!
//! Leaves are added first; interior nodes are then formed over existing
//! nodes. The public entry points check the arena invariants, the engine uses
//! the unchecked crate-internal path because its stacks already guarantee
//! them.

use thiserror::Error;

use super::arena::{Arena, NodeFlags, NodeId, shift};
use super::tree::{ParseStats, Tree};
use crate::base::{LineIndex, TextRange, TextSize};
use crate::parser::errors::SyntaxError;
use crate::parser::{ScanState, SyntaxKind, Token};

/// Misuse of [`TreeBuilder`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} already has a parent")]
    AlreadyAttached(NodeId),
    #[error("node {child} starts at {start:?}, before the previous child ends at {previous_end:?}")]
    OutOfOrder {
        child: NodeId,
        start: TextSize,
        previous_end: TextSize,
    },
    #[error("{0:?} node has no children")]
    EmptyNode(SyntaxKind),
    #[error("{0:?} is not a node kind")]
    NotANode(SyntaxKind),
    #[error("root range {range:?} does not fit in a text of length {len:?}")]
    RootOutOfBounds { range: TextRange, len: TextSize },
}

/// A node whose children are still being collected
#[derive(Debug, Clone)]
pub struct PendingNode {
    kind: SyntaxKind,
    children: Vec<NodeId>,
}

impl PendingNode {
    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Default)]
pub struct TreeBuilder {
    arena: Arena,
    /// Nodes claimed by a pending node but not yet finished
    claimed: Vec<bool>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    fn track(&mut self, id: NodeId) -> NodeId {
        self.claimed.push(false);
        id
    }

    /// Add a lexed token as a leaf
    pub fn token(&mut self, token: &Token) -> NodeId {
        let flags = if token.kind == SyntaxKind::ERROR {
            NodeFlags::HAS_ERROR
        } else {
            NodeFlags::NONE
        };
        let id = self.arena.leaf(token.kind, token.range, flags, token.state);
        self.track(id)
    }

    /// Add a zero-width token that recovery synthesised at `at`
    pub fn missing(&mut self, kind: SyntaxKind, at: TextSize, state: ScanState) -> NodeId {
        let id = self.arena.leaf(
            kind,
            TextRange::empty(at),
            NodeFlags::MISSING | NodeFlags::HAS_ERROR,
            state,
        );
        self.track(id)
    }

    pub fn start_node(&self, kind: SyntaxKind) -> PendingNode {
        PendingNode {
            kind,
            children: Vec::new(),
        }
    }

    /// Append `child` to `pending`, checking it is unattached and in order
    pub fn add_child(&mut self, pending: &mut PendingNode, child: NodeId) -> Result<(), BuildError> {
        let data = self.arena.get(child).ok_or(BuildError::UnknownNode(child))?;
        if data.parent.is_some() || self.claimed[child.index()] {
            return Err(BuildError::AlreadyAttached(child));
        }
        if let Some(&previous) = pending.children.last() {
            let previous_end = self.arena.data(previous).range.end();
            if data.range.start() < previous_end {
                return Err(BuildError::OutOfOrder {
                    child,
                    start: data.range.start(),
                    previous_end,
                });
            }
        }
        self.claimed[child.index()] = true;
        pending.children.push(child);
        Ok(())
    }

    /// Turn `pending` into a node spanning its children
    pub fn finish_node(&mut self, pending: PendingNode) -> Result<NodeId, BuildError> {
        if !pending.kind.is_node() {
            return Err(BuildError::NotANode(pending.kind));
        }
        if pending.children.is_empty() {
            return Err(BuildError::EmptyNode(pending.kind));
        }
        Ok(self.node_from_children(pending.kind, &pending.children, TextSize::new(0)))
    }

    pub(crate) fn node_from_children(
        &mut self,
        kind: SyntaxKind,
        children: &[NodeId],
        at: TextSize,
    ) -> NodeId {
        for &child in children {
            self.claimed[child.index()] = false;
        }
        let id = self.arena.node(kind, children, at);
        self.track(id)
    }

    pub(crate) fn range(&self, id: NodeId) -> TextRange {
        self.arena.data(id).range
    }

    pub(crate) fn kind(&self, id: NodeId) -> SyntaxKind {
        self.arena.data(id).kind
    }

    /// Copy the subtree of `old_tree` rooted at `old_id`, moving every range
    /// by `delta` bytes. Returns the id of the copy's root.
    pub fn graft(&mut self, old_tree: &Tree, old_id: NodeId, delta: i64) -> NodeId {
        let old = old_tree.arena();
        let mut copied: Vec<NodeId> = Vec::new();
        let mut stack = vec![(old_id, false)];
        while let Some((id, visited)) = stack.pop() {
            let children = old.children(id);
            if !visited && !children.is_empty() {
                stack.push((id, true));
                stack.extend(children.iter().rev().map(|&c| (c, false)));
                continue;
            }
            let data = old.data(id);
            let own_children = copied.split_off(copied.len() - children.len());
            let new_id = self.arena.push(
                data.kind,
                shift(data.range, delta),
                data.flags,
                data.state,
                &own_children,
            );
            copied.push(self.track(new_id));
        }
        copied.pop().unwrap_or(NodeId(0))
    }

    /// Finish the tree with `root` spanning (part of) `text`
    pub fn finish(self, root: NodeId, text: impl Into<String>) -> Result<Tree, BuildError> {
        let text = text.into();
        let data = self.arena.get(root).ok_or(BuildError::UnknownNode(root))?;
        if data.parent.is_some() {
            return Err(BuildError::AlreadyAttached(root));
        }
        let len = TextSize::of(text.as_str());
        if data.range.end() > len {
            return Err(BuildError::RootOutOfBounds {
                range: data.range,
                len,
            });
        }
        let lines = LineIndex::new(&text);
        Ok(self.into_tree(root, text, lines, Vec::new(), ParseStats::default()))
    }

    pub(crate) fn into_tree(
        self,
        root: NodeId,
        text: String,
        lines: LineIndex,
        diagnostics: Vec<SyntaxError>,
        stats: ParseStats,
    ) -> Tree {
        Tree::new(text, self.arena, root, lines, diagnostics, stats)
    }
}

//! Flat storage for tree nodes
//!
//! Every node, token leaves included, lives in one `Vec`. A node's children
//! are a contiguous slice of a second `Vec`, so a subtree never owns memory
//! and ids stay valid for the lifetime of the tree.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::base::{TextRange, TextSize};
use crate::parser::{ScanState, SyntaxKind};

/// Index of a node in its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-node markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeFlags(u8);

impl NodeFlags {
    pub const NONE: NodeFlags = NodeFlags(0);
    /// The node is, or contains, an error or missing token
    pub const HAS_ERROR: NodeFlags = NodeFlags(1);
    /// Zero-width token synthesised during recovery
    pub const MISSING: NodeFlags = NodeFlags(1 << 1);
    /// The node starts with `/-`
    pub const SLASHDASHED: NodeFlags = NodeFlags(1 << 2);

    pub fn contains(self, other: NodeFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for NodeFlags {
    type Output = NodeFlags;

    fn bitor(self, rhs: NodeFlags) -> NodeFlags {
        NodeFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for NodeFlags {
    fn bitor_assign(&mut self, rhs: NodeFlags) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub kind: SyntaxKind,
    pub range: TextRange,
    pub parent: Option<NodeId>,
    pub index_in_parent: u32,
    pub first_child: u32,
    pub child_count: u32,
    pub flags: NodeFlags,
    /// Scanner state before the first token
    pub state: ScanState,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Arena {
    pub nodes: Vec<NodeData>,
    pub children: Vec<NodeId>,
}

impl Arena {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index())
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        let data = self.data(id);
        let start = data.first_child as usize;
        &self.children[start..start + data.child_count as usize]
    }

    pub fn leaf(
        &mut self,
        kind: SyntaxKind,
        range: TextRange,
        flags: NodeFlags,
        state: ScanState,
    ) -> NodeId {
        self.push(kind, range, flags, state, &[])
    }

    /// Interior node over `children`, which must already be in order.
    /// A node without children is empty at `at`.
    pub fn node(&mut self, kind: SyntaxKind, children: &[NodeId], at: TextSize) -> NodeId {
        let (range, state) = match (children.first(), children.last()) {
            (Some(&first), Some(&last)) => (
                TextRange::new(self.data(first).range.start(), self.data(last).range.end()),
                self.data(first).state,
            ),
            _ => (TextRange::empty(at), ScanState::Normal),
        };

        let mut flags = NodeFlags::NONE;
        if kind == SyntaxKind::ERROR
            || children
                .iter()
                .any(|&c| self.data(c).flags.contains(NodeFlags::HAS_ERROR))
        {
            flags |= NodeFlags::HAS_ERROR;
        }
        if kind.can_be_slashdashed() {
            let first_significant = children
                .iter()
                .map(|&c| self.data(c).kind)
                .find(|kind| !kind.is_trivia());
            if first_significant == Some(SyntaxKind::SLASHDASH) {
                flags |= NodeFlags::SLASHDASHED;
            }
        }

        self.push(kind, range, flags, state, children)
    }

    /// Append a node with every field given; used when copying subtrees
    pub fn push(
        &mut self,
        kind: SyntaxKind,
        range: TextRange,
        flags: NodeFlags,
        state: ScanState,
        children: &[NodeId],
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let first_child = self.children.len() as u32;
        for (i, &child) in children.iter().enumerate() {
            let data = &mut self.nodes[child.index()];
            data.parent = Some(id);
            data.index_in_parent = i as u32;
        }
        self.children.extend_from_slice(children);
        self.nodes.push(NodeData {
            kind,
            range,
            parent: None,
            index_in_parent: 0,
            first_child,
            child_count: children.len() as u32,
            flags,
            state,
        });
        id
    }
}

/// Move a range by a signed byte delta
pub(crate) fn shift(range: TextRange, delta: i64) -> TextRange {
    let moved = |offset: TextSize| TextSize::new((i64::from(u32::from(offset)) + delta).max(0) as u32);
    TextRange::new(moved(range.start()), moved(range.end()))
}

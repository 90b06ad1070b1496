//! Syntax trees
//!
//! A [`Tree`] owns its source text and a flat arena of nodes. Tokens are
//! leaves in the same arena as interior nodes; all navigation goes through
//! [`NodeRef`], a copyable `(tree, id)` pair. Trees are immutable once built,
//! so they can be shared across threads and reused by incremental parsing.

mod arena;
mod builder;
mod tree;

pub use arena::{NodeFlags, NodeId};
pub use builder::{BuildError, PendingNode, TreeBuilder};
pub use tree::{Descendants, NodeRef, ParseStats, Tree};

pub(crate) use arena::shift;

use std::fmt::Display;

/// A broken structural invariant, reported by [`Rbtree::validate`](crate::Rbtree::validate).
///
/// These are never produced by correct use of the tree. They point at an element whose ordering
/// changed while it was stored, or at an [`Ord`] implementation that is not a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The root node is red.
    RedRoot,
    /// A red node has a red child.
    RedChild,
    /// Two sibling subtrees have a different number of black nodes on their paths to a leaf.
    BlackHeight {
        /// Black height of the left subtree.
        left: usize,
        /// Black height of the right subtree.
        right: usize,
    },
    /// An in-order walk did not produce strictly ascending elements.
    Order,
    /// A child's parent link does not point back at its parent, or the root has a parent.
    ParentLink,
    /// The number of reachable nodes does not match the recorded length.
    Size {
        /// Nodes reachable from the root.
        counted: usize,
        /// Length the tree believes it has.
        recorded: usize,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RedRoot => f.write_str("root node is red"),
            Self::RedChild => f.write_str("red node has a red child"),
            Self::BlackHeight { left, right } => {
                write!(f, "black height mismatch: left subtree {left}, right subtree {right}")
            }
            Self::Order => f.write_str("elements are not in strictly ascending order"),
            Self::ParentLink => f.write_str("parent link does not match tree structure"),
            Self::Size { counted, recorded } => {
                write!(f, "found {counted} nodes but length is {recorded}")
            }
        }
    }
}

impl std::error::Error for Error {}

// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural errors reported by [`Celltree::check`](crate::Celltree::check).

use core::fmt;

/// A structural defect in a celltree's node or cell arrays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CelltreeError {
    /// The tree has no root, or more nodes than it indexes cells.
    BadNodeCount {
        /// Number of nodes.
        nodes: usize,
        /// Number of cells.
        cells: usize,
    },
    /// A leaf's cell range runs past the end of the cell array.
    LeafOutOfRange {
        /// Offending node.
        node: usize,
        /// First cell slot of the leaf.
        start: usize,
        /// Number of cells in the leaf.
        count: usize,
    },
    /// An inner node's children are not stored after it.
    ChildOutOfRange {
        /// Offending node.
        node: usize,
        /// Index of the left child.
        child: usize,
    },
    /// An inner node splits along a dimension the tree does not have.
    BadSplitDimension {
        /// Offending node.
        node: usize,
        /// Recorded split dimension.
        dim: usize,
    },
    /// The cell array is not a permutation of `0..cells`.
    NotAPermutation {
        /// First cell index that is out of range or repeated.
        cell: usize,
    },
}

impl fmt::Display for CelltreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadNodeCount { nodes, cells } => {
                write!(f, "celltree has {nodes} nodes for {cells} cells")
            }
            Self::LeafOutOfRange { node, start, count } => write!(
                f,
                "leaf {node} covers cells {start}..{} outside the cell array",
                start + count
            ),
            Self::ChildOutOfRange { node, child } => {
                write!(f, "inner node {node} has children at invalid index {child}")
            }
            Self::BadSplitDimension { node, dim } => {
                write!(f, "inner node {node} splits along dimension {dim}")
            }
            Self::NotAPermutation { cell } => {
                write!(f, "cell {cell} is repeated or out of range")
            }
        }
    }
}

impl core::error::Error for CelltreeError {}

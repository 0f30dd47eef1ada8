// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The celltree container and its traversal.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::error::CelltreeError;
use crate::types::{Aabb, Scalar};
use crate::visit::{NodeVisitor, Split, VisitOrder};

/// A node of the hierarchy.
///
/// Inner nodes store the index of their left child; the right child always
/// directly follows it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Node<T> {
    /// A contiguous run of the cell array.
    Leaf {
        /// First slot in [`Celltree::cells`].
        start: usize,
        /// Number of cells.
        count: usize,
    },
    /// A split along one axis into two possibly overlapping halves.
    Inner {
        /// Split axis.
        dim: usize,
        /// Upper bound of all cells in the left child along `dim`.
        lmax: T,
        /// Lower bound of all cells in the right child along `dim`.
        rmin: T,
        /// Index of the left child.
        child: usize,
    },
}

impl<T: Copy> Node<T> {
    /// Whether this node is a leaf.
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    /// Children of an inner node.
    pub const fn children(&self) -> Option<(usize, usize)> {
        match *self {
            Self::Leaf { .. } => None,
            Self::Inner { child, .. } => Some((child, child + 1)),
        }
    }

    pub(crate) const fn leaf(start: usize, count: usize) -> Self {
        Self::Leaf { start, count }
    }
}

/// A bounding interval hierarchy over the cells of a mesh.
///
/// The tree only knows about cell indices and their bounding boxes; it is
/// built once by [`Celltree::build`] and is immutable afterwards.
pub struct Celltree<T: Scalar, const N: usize> {
    pub(crate) bounds: Aabb<T, N>,
    pub(crate) nodes: Vec<Node<T>>,
    pub(crate) cells: Vec<usize>,
    traversals: AtomicUsize,
}

impl<T: Scalar, const N: usize> Celltree<T, N> {
    pub(crate) fn from_parts(bounds: Aabb<T, N>, nodes: Vec<Node<T>>, cells: Vec<usize>) -> Self {
        Self {
            bounds,
            nodes,
            cells,
            traversals: AtomicUsize::new(0),
        }
    }

    /// Global bounds the tree was built for.
    pub const fn bounds(&self) -> &Aabb<T, N> {
        &self.bounds
    }

    /// Node array; index 0 is the root.
    pub fn nodes(&self) -> &[Node<T>] {
        &self.nodes
    }

    /// Permutation of cell indices referenced by the leaves.
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of indexed cells.
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Whether the tree indexes no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells stored in the leaf `node`, or an empty slice for inner nodes.
    pub fn leaf_cells(&self, node: usize) -> &[usize] {
        match self.nodes.get(node) {
            Some(Node::Leaf { start, count }) => &self.cells[*start..*start + *count],
            _ => &[],
        }
    }

    /// Length of the longest root-to-leaf path, counting the root as depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0_usize, 1_usize)];
        while let Some((idx, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Some((l, r)) = self.nodes.get(idx).and_then(Node::children) {
                stack.push((l, depth + 1));
                stack.push((r, depth + 1));
            }
        }
        deepest
    }

    /// Number of traversals started on this tree since it was built.
    pub fn traversal_count(&self) -> usize {
        self.traversals.load(Ordering::Relaxed)
    }

    /// Walk the tree, letting `visitor` prune and order subtrees, and call
    /// `leaf_fn` for every cell of every reached leaf.
    ///
    /// Returns false if `leaf_fn` requested an early stop by returning false.
    pub fn traverse<V, F>(&self, visitor: &mut V, mut leaf_fn: F) -> bool
    where
        V: NodeVisitor<T, N>,
        F: FnMut(usize) -> bool,
    {
        self.traversals.fetch_add(1, Ordering::Relaxed);
        if self.cells.is_empty() || !visitor.check_bounds(&self.bounds) {
            return true;
        }

        let mut stack = vec![(0_usize, self.bounds)];
        while let Some((idx, region)) = stack.pop() {
            match self.nodes[idx] {
                Node::Leaf { start, count } => {
                    for &cell in &self.cells[start..start + count] {
                        if !leaf_fn(cell) {
                            return false;
                        }
                    }
                }
                Node::Inner {
                    dim,
                    lmax,
                    rmin,
                    child,
                } => {
                    let split = Split { dim, lmax, rmin };
                    let mut left = region;
                    left.max[dim] = lmax;
                    let mut right = region;
                    right.min[dim] = rmin;
                    // The stack is LIFO, so the first child to visit goes on last.
                    match visitor.visit(&split, &region) {
                        VisitOrder::None => {}
                        VisitOrder::Left => stack.push((child, left)),
                        VisitOrder::Right => stack.push((child + 1, right)),
                        VisitOrder::LeftRight => {
                            stack.push((child + 1, right));
                            stack.push((child, left));
                        }
                        VisitOrder::RightLeft => {
                            stack.push((child, left));
                            stack.push((child + 1, right));
                        }
                    }
                }
            }
        }
        true
    }

    /// Check the structural consistency of the node and cell arrays.
    ///
    /// This does not look at cell geometry; see [`Celltree::validate`] for that.
    pub fn check(&self) -> Result<(), CelltreeError> {
        let nodes = self.nodes.len();
        let cells = self.cells.len();
        if nodes == 0 || nodes > cells.max(1) {
            return Err(CelltreeError::BadNodeCount { nodes, cells });
        }

        for (node, n) in self.nodes.iter().enumerate() {
            match *n {
                Node::Leaf { start, count } => {
                    if start + count > cells {
                        return Err(CelltreeError::LeafOutOfRange { node, start, count });
                    }
                }
                Node::Inner { dim, child, .. } => {
                    if dim >= N {
                        return Err(CelltreeError::BadSplitDimension { node, dim });
                    }
                    if child <= node || child + 1 >= nodes {
                        return Err(CelltreeError::ChildOutOfRange { node, child });
                    }
                }
            }
        }

        let mut seen = vec![false; cells];
        for &cell in &self.cells {
            match seen.get_mut(cell) {
                Some(s) if !*s => *s = true,
                _ => return Err(CelltreeError::NotAPermutation { cell }),
            }
        }
        Ok(())
    }
}

impl<T: Scalar, const N: usize> Clone for Celltree<T, N> {
    fn clone(&self) -> Self {
        Self::from_parts(self.bounds, self.nodes.clone(), self.cells.clone())
    }
}

impl<T: Scalar, const N: usize> Debug for Celltree<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Celltree")
            .field("bounds", &self.bounds)
            .field("nodes", &self.nodes.len())
            .field("cells", &self.cells.len())
            .finish_non_exhaustive()
    }
}

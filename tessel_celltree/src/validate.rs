// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometric consistency check of a built tree against its cell bounds.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::tree::{Celltree, Node};
use crate::types::{Aabb, Scalar, lt};

/// One geometric inconsistency found by [`Celltree::validate`].
#[derive(Clone, Debug, PartialEq)]
pub enum Violation<T> {
    /// A cell's bounding box pokes out of the region of the leaf holding it.
    CellOutsideRegion {
        /// Leaf node index.
        node: usize,
        /// Cell index.
        cell: usize,
        /// Axis on which the cell leaves the region.
        dim: usize,
        /// Cell extent on that axis.
        cell_extent: (T, T),
        /// Region extent on that axis.
        region: (T, T),
    },
    /// A split plane of an inner node lies outside the node's own region.
    SplitOutsideRegion {
        /// Inner node index.
        node: usize,
        /// Split axis.
        dim: usize,
        /// `(lmax, rmin)` of the node.
        planes: (T, T),
        /// Region extent on the split axis.
        region: (T, T),
    },
}

/// The outcome of [`Celltree::validate`].
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationReport<T> {
    violations: Vec<Violation<T>>,
}

impl<T> ValidationReport<T> {
    /// Whether no violation was found.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// All violations, in traversal order.
    pub fn violations(&self) -> &[Violation<T>] {
        &self.violations
    }
}

impl<T: fmt::Debug> fmt::Display for Violation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CellOutsideRegion {
                node,
                cell,
                dim,
                cell_extent,
                region,
            } => write!(
                f,
                "leaf {node}: cell {cell} spans {cell_extent:?} on axis {dim}, region is {region:?}"
            ),
            Self::SplitOutsideRegion {
                node,
                dim,
                planes,
                region,
            } => write!(
                f,
                "node {node}: split planes {planes:?} on axis {dim} outside region {region:?}"
            ),
        }
    }
}

impl<T: fmt::Debug> fmt::Display for ValidationReport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return f.write_str("celltree is consistent");
        }
        for v in &self.violations {
            writeln!(f, "{v}")?;
        }
        Ok(())
    }
}

fn outside<T: Scalar>(lo: T, hi: T, region: (T, T)) -> bool {
    lt(lo, region.0) || lt(region.1, hi)
}

impl<T: Scalar, const N: usize> Celltree<T, N> {
    /// Check that every cell lies within the region of its leaf and that every
    /// split plane lies within the region of its node.
    ///
    /// `cell_bounds` returns the bounding box of a cell index. Problems are
    /// collected rather than reported one at a time and are also logged as warnings.
    pub fn validate<F>(&self, mut cell_bounds: F) -> ValidationReport<T>
    where
        F: FnMut(usize) -> Aabb<T, N>,
    {
        let mut violations = Vec::new();
        if self.cells.is_empty() {
            return ValidationReport { violations };
        }

        let mut stack = vec![(0_usize, self.bounds)];
        while let Some((node, region)) = stack.pop() {
            match self.nodes[node] {
                Node::Leaf { .. } => {
                    for &cell in self.leaf_cells(node) {
                        let b = cell_bounds(cell);
                        for dim in 0..N {
                            let r = (region.min[dim], region.max[dim]);
                            if outside(b.min[dim], b.max[dim], r) {
                                violations.push(Violation::CellOutsideRegion {
                                    node,
                                    cell,
                                    dim,
                                    cell_extent: (b.min[dim], b.max[dim]),
                                    region: r,
                                });
                            }
                        }
                    }
                }
                Node::Inner {
                    dim,
                    lmax,
                    rmin,
                    child,
                } => {
                    let r = (region.min[dim], region.max[dim]);
                    if outside(lmax, lmax, r) || outside(rmin, rmin, r) {
                        violations.push(Violation::SplitOutsideRegion {
                            node,
                            dim,
                            planes: (lmax, rmin),
                            region: r,
                        });
                    }
                    let mut left = region;
                    left.max[dim] = lmax;
                    let mut right = region;
                    right.min[dim] = rmin;
                    stack.push((child + 1, right));
                    stack.push((child, left));
                }
            }
        }

        for v in &violations {
            log::warn!("celltree validation: {v}");
        }
        ValidationReport { violations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn shifted_cell_is_reported() {
        let mut boxes: Vec<Aabb<f32, 2>> = (0..20)
            .map(|i| {
                #[allow(clippy::cast_precision_loss, reason = "small test input")]
                let x = i as f32;
                Aabb::new([x, 0.0], [x + 1.0, 1.0])
            })
            .collect();
        let tree = Celltree::from_cell_bounds(&boxes);
        assert!(tree.validate(|c| boxes[c]).is_valid());

        // Move the first cell far to the right after the build.
        boxes[0] = Aabb::new([50.0, 0.0], [51.0, 1.0]);
        let report = tree.validate(|c| boxes[c]);
        assert!(!report.is_valid());
        assert!(report.violations().iter().any(|v| matches!(
            v,
            Violation::CellOutsideRegion { cell: 0, dim: 0, .. }
        )));
        assert!(report.to_string().contains("cell 0"));
    }
}

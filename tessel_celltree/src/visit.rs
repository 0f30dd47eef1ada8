// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Traversal policies.
//!
//! A [`NodeVisitor`] decides, for every inner node reached during
//! [`Celltree::traverse`](crate::Celltree::traverse), which children are worth
//! descending into and in which order.

use crate::types::{Aabb, Scalar, le, lt};

/// Which children of an inner node to visit, and in which order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VisitOrder {
    /// Skip both children.
    None,
    /// Visit only the left child.
    Left,
    /// Visit only the right child.
    Right,
    /// Visit the left child first, then the right child.
    LeftRight,
    /// Visit the right child first, then the left child.
    RightLeft,
}

/// The splitting planes of an inner node as seen by a visitor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Split<T> {
    /// Axis along which the node was split.
    pub dim: usize,
    /// Maximum coordinate of any cell in the left child along `dim`.
    pub lmax: T,
    /// Minimum coordinate of any cell in the right child along `dim`.
    pub rmin: T,
}

impl<T: Scalar> Split<T> {
    /// Midpoint between the two planes, used to order overlapping visits.
    #[inline]
    pub fn mean(&self) -> T {
        T::mid(self.lmax, self.rmin)
    }

    /// Shared point/segment classification over the closed interval `[lo, hi]`.
    ///
    /// `key` picks the preferred side when both children must be visited.
    fn classify(&self, lo: T, hi: T, key: T) -> VisitOrder {
        let left = le(lo, self.lmax);
        let right = le(self.rmin, hi);
        match (left, right) {
            (false, false) => VisitOrder::None,
            (true, false) => VisitOrder::Left,
            (false, true) => VisitOrder::Right,
            (true, true) => {
                if lt(key, self.mean()) {
                    VisitOrder::LeftRight
                } else {
                    VisitOrder::RightLeft
                }
            }
        }
    }
}

/// Traversal policy consulted by [`Celltree::traverse`](crate::Celltree::traverse).
pub trait NodeVisitor<T: Scalar, const N: usize> {
    /// Called once with the global bounds. Returning false skips the traversal.
    fn check_bounds(&mut self, bounds: &Aabb<T, N>) -> bool {
        let _ = bounds;
        true
    }

    /// Decide how to descend into an inner node whose subtree covers `region`.
    fn visit(&mut self, split: &Split<T>, region: &Aabb<T, N>) -> VisitOrder;
}

/// Visits the leaves whose region may contain a point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointVisitor<T, const N: usize> {
    point: [T; N],
}

impl<T: Scalar, const N: usize> PointVisitor<T, N> {
    /// Create a visitor for `point`.
    pub const fn new(point: [T; N]) -> Self {
        Self { point }
    }

    /// The query point.
    pub const fn point(&self) -> &[T; N] {
        &self.point
    }
}

impl<T: Scalar, const N: usize> NodeVisitor<T, N> for PointVisitor<T, N> {
    fn check_bounds(&mut self, bounds: &Aabb<T, N>) -> bool {
        bounds.contains_point(&self.point)
    }

    fn visit(&mut self, split: &Split<T>, _region: &Aabb<T, N>) -> VisitOrder {
        let c = self.point[split.dim];
        split.classify(c, c, c)
    }
}

/// Visits the leaves whose region may intersect the segment from `p0` to `p1`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SegmentVisitor<T, const N: usize> {
    p0: [T; N],
    p1: [T; N],
}

impl<T: Scalar, const N: usize> SegmentVisitor<T, N> {
    /// Create a visitor for the closed segment between `p0` and `p1`.
    pub const fn new(p0: [T; N], p1: [T; N]) -> Self {
        Self { p0, p1 }
    }
}

impl<T: Scalar, const N: usize> NodeVisitor<T, N> for SegmentVisitor<T, N> {
    fn check_bounds(&mut self, bounds: &Aabb<T, N>) -> bool {
        (0..N).all(|d| {
            let (lo, hi) = ordered(self.p0[d], self.p1[d]);
            le(bounds.min[d], hi) && le(lo, bounds.max[d])
        })
    }

    fn visit(&mut self, split: &Split<T>, _region: &Aabb<T, N>) -> VisitOrder {
        let (lo, hi) = ordered(self.p0[split.dim], self.p1[split.dim]);
        split.classify(lo, hi, T::mid(lo, hi))
    }
}

fn ordered<T: Scalar>(a: T, b: T) -> (T, T) {
    if lt(b, a) { (b, a) } else { (a, b) }
}

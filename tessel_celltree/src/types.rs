// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::cmp::Ordering;
use core::fmt::Debug;

/// Numeric scalar abstraction for celltree bounds.
///
/// Bounds are stored in the scalar's own precision, while split costs and bucket
/// assignment are evaluated in a widened `f64` accumulator so that `f32` meshes with
/// large coordinate ranges do not lose ordering information during the build.
pub trait Scalar: Copy + PartialOrd + Debug {
    /// Largest finite value, used to seed running minima.
    const MAX: Self;

    /// Smallest finite value, used to seed running maxima.
    const LOWEST: Self;

    /// Zero value for the scalar type.
    fn zero() -> Self;

    /// Midpoint between a and b (used for cell centers and visit ordering).
    fn mid(a: Self, b: Self) -> Self;

    /// Convert a scalar to the accumulator type.
    fn widen(v: Self) -> f64;
}

impl Scalar for f32 {
    const MAX: Self = Self::MAX;
    const LOWEST: Self = Self::MIN;

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline]
    fn widen(v: Self) -> f64 {
        f64::from(v)
    }
}

impl Scalar for f64 {
    const MAX: Self = Self::MAX;
    const LOWEST: Self = Self::MIN;

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline]
    fn widen(v: Self) -> f64 {
        v
    }
}

/// Axis-aligned bounding box in `N` dimensions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb<T, const N: usize> {
    /// Minimum corner.
    pub min: [T; N],
    /// Maximum corner.
    pub max: [T; N],
}

impl<T, const N: usize> Aabb<T, N> {
    /// Create a new AABB from min/max corners.
    pub const fn new(min: [T; N], max: [T; N]) -> Self {
        Self { min, max }
    }
}

impl<T: Scalar, const N: usize> Aabb<T, N> {
    /// An inverted box that any call to [`Aabb::extend`] or [`Aabb::union`] replaces.
    pub const fn inverted() -> Self {
        Self {
            min: [T::MAX; N],
            max: [T::LOWEST; N],
        }
    }

    /// A degenerate box containing exactly one point.
    pub const fn from_point(p: [T; N]) -> Self {
        Self { min: p, max: p }
    }

    /// Bounding box of a set of points; inverted if the iterator is empty.
    pub fn from_points<I: IntoIterator<Item = [T; N]>>(points: I) -> Self {
        let mut b = Self::inverted();
        for p in points {
            b.extend(&p);
        }
        b
    }

    /// Grow the box so that it contains `p`.
    pub fn extend(&mut self, p: &[T; N]) {
        for d in 0..N {
            self.min[d] = min_t(self.min[d], p[d]);
            self.max[d] = max_t(self.max[d], p[d]);
        }
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        for d in 0..N {
            out.min[d] = min_t(self.min[d], other.min[d]);
            out.max[d] = max_t(self.max[d], other.max[d]);
        }
        out
    }

    /// Whether this AABB contains the point (boundary inclusive).
    pub fn contains_point(&self, p: &[T; N]) -> bool {
        (0..N).all(|d| le(self.min[d], p[d]) && le(p[d], self.max[d]))
    }

    /// Whether `other` lies entirely inside this box (boundary inclusive).
    pub fn contains(&self, other: &Self) -> bool {
        (0..N).all(|d| le(self.min[d], other.min[d]) && le(other.max[d], self.max[d]))
    }

    /// Center of the box along dimension `d`.
    #[inline]
    pub fn center(&self, d: usize) -> T {
        T::mid(self.min[d], self.max[d])
    }

    /// Return true if the box is inverted along any axis. Assumes no NaN.
    pub fn is_empty(&self) -> bool {
        (0..N).any(|d| lt(self.max[d], self.min[d]))
    }
}

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

pub(crate) fn le<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o != Ordering::Greater)
        .unwrap_or(false)
}

pub(crate) fn lt<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o == Ordering::Less)
        .unwrap_or(false)
}

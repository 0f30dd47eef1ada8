// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=tessel_celltree --heading-base-level=0

//! Tessel Celltree: a bounding interval hierarchy over mesh cells.
//!
//! A celltree indexes `N`-dimensional cells by their axis-aligned bounding boxes
//! so that point and segment queries only have to test a handful of candidates.
//!
//! - Build once from a slice of cell bounds with [`Celltree::build`].
//! - Walk the tree with a [`NodeVisitor`] such as [`PointVisitor`] or [`SegmentVisitor`].
//! - Check structure with [`Celltree::check`] and geometry with [`Celltree::validate`].
//!
//! Each inner node splits its cells along one axis into a left and a right group.
//! Unlike a k-d tree the groups may overlap: the node records the largest coordinate of
//! any left cell (`lmax`) and the smallest of any right cell (`rmin`), so every cell lives
//! in exactly one leaf and no cell is ever duplicated.
//!
//! # Example
//!
//! ```rust
//! use tessel_celltree::{Aabb, Celltree, PointVisitor};
//!
//! // A row of ten unit squares.
//! let squares: Vec<Aabb<f32, 2>> = (0..10)
//!     .map(|i| Aabb::new([i as f32, 0.0], [i as f32 + 1.0, 1.0]))
//!     .collect();
//! let tree = Celltree::from_cell_bounds(&squares);
//!
//! // Find the square containing (7.5, 0.5).
//! let p = [7.5, 0.5];
//! let mut found = None;
//! tree.traverse(&mut PointVisitor::new(p), |cell| {
//!     if squares[cell].contains_point(&p) {
//!         found = Some(cell);
//!         return false;
//!     }
//!     true
//! });
//! assert_eq!(found, Some(7));
//! ```
//!
//! ## Build heuristic
//!
//! Cells are sorted into a small number of buckets by the center of their bounding box
//! on each axis. For every bucket boundary the cost is the number of cells on each side
//! weighted by the extent that side would cover. The cheapest boundary over all axes
//! wins; ties go to the lowest axis and boundary. A node that cannot be split so that
//! both sides are non-empty stays a leaf even if it is larger than the leaf threshold.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs in cell bounds or query coordinates.

#![no_std]

extern crate alloc;

mod build;
mod error;
mod tree;
mod types;
mod validate;
mod visit;

pub use build::BuildConfig;
pub use error::CelltreeError;
pub use tree::{Celltree, Node};
pub use types::{Aabb, Scalar};
pub use validate::{ValidationReport, Violation};
pub use visit::{NodeVisitor, PointVisitor, SegmentVisitor, Split, VisitOrder};

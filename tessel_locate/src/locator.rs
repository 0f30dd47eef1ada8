// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The point location contract shared by all grid kinds.

use std::sync::OnceLock;

use glam::Vec3;
use tessel_celltree::{Aabb, Celltree, PointVisitor, ValidationReport};

use crate::config::LocateConfig;
use crate::geometry::{FaceSet, exit_distance};
use crate::interp::{InterpolationMode, Interpolator, Mapping, closed_form};

/// Axis-aligned bounds of a cell or grid.
pub type CellBounds = Aabb<f32, 3>;

/// The spatial index type built over grid cells.
pub type CellIndex = Celltree<f32, 3>;

bitflags::bitflags! {
    /// Options for [`CellLocator::find_cell`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FindFlags: u8 {
        /// Ghost cells may be returned.
        const ACCEPT_GHOST   = 0b0001;
        /// Build the celltree if it does not exist yet and search with it.
        const FORCE_CELLTREE = 0b0010;
        /// Do not use an existing celltree; scan all cells instead.
        ///
        /// Ignored when [`FindFlags::FORCE_CELLTREE`] is also set.
        const NO_CELLTREE    = 0b0100;
    }
}

/// Lazily computed global bounds and celltree of one grid.
///
/// Each is computed at most once, even with concurrent callers, until
/// [`IndexCache::clear`] drops them.
#[derive(Clone, Debug, Default)]
pub struct IndexCache {
    bounds: OnceLock<CellBounds>,
    tree: OnceLock<CellIndex>,
}

impl IndexCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The celltree, if it has been built.
    pub fn tree(&self) -> Option<&CellIndex> {
        self.tree.get()
    }

    /// The celltree, building it with `build` on first use.
    pub fn tree_or_build(&self, build: impl FnOnce() -> CellIndex) -> &CellIndex {
        self.tree.get_or_init(build)
    }

    /// The global bounds, computing them with `compute` on first use.
    pub fn bounds_or_compute(&self, compute: impl FnOnce() -> CellBounds) -> CellBounds {
        *self.bounds.get_or_init(compute)
    }

    /// Drop the cached bounds and celltree.
    pub fn clear(&mut self) {
        self.bounds = OnceLock::new();
        self.tree = OnceLock::new();
    }
}

/// Point location and interpolation over the cells of one grid.
///
/// Implementors provide cell geometry; queries, index management and the
/// shape-independent interpolation modes come with default implementations.
pub trait CellLocator {
    /// Tuning knobs of this grid.
    fn config(&self) -> &LocateConfig;

    /// Number of cells.
    fn num_elements(&self) -> usize;

    /// Position of a vertex.
    fn vertex(&self, vertex: usize) -> Vec3;

    /// Whether `cell` is a halo cell owned by another partition.
    fn is_ghost(&self, cell: usize) -> bool;

    /// Distinct vertices of `cell`, in order of first appearance.
    fn cell_vertices(&self, cell: usize) -> Vec<usize>;

    /// Replace the contents of `faces` by the faces of `cell`.
    ///
    /// Planar cells have a single face.
    fn cell_faces(&self, cell: usize, faces: &mut FaceSet);

    /// Whether `point` lies in `cell`.
    fn inside(&self, cell: usize, point: Vec3) -> bool;

    /// Shape-function interpolation weights of `point` in `cell`.
    fn linear_interpolator(&self, cell: usize, point: Vec3) -> Interpolator;

    /// Cells sharing at least one vertex with `cell`, sorted.
    fn get_neighbor_elements(&self, cell: usize) -> Vec<usize>;

    /// Storage for the lazily built bounds and index.
    fn index_cache(&self) -> &IndexCache;

    /// Mutable access to the index storage.
    fn index_cache_mut(&mut self) -> &mut IndexCache;

    /// Axis-aligned bounds of `cell`.
    fn cell_bounds(&self, cell: usize) -> CellBounds {
        CellBounds::from_points(
            self.cell_vertices(cell)
                .into_iter()
                .map(|v| self.vertex(v).to_array()),
        )
    }

    /// Minimum and maximum corner of `cell`.
    fn element_bounds(&self, cell: usize) -> (Vec3, Vec3) {
        let b = self.cell_bounds(cell);
        (Vec3::from_array(b.min), Vec3::from_array(b.max))
    }

    /// Bounds of all cells.
    fn bounds(&self) -> CellBounds {
        self.index_cache().bounds_or_compute(|| {
            (0..self.num_elements()).fold(CellBounds::inverted(), |acc, c| {
                acc.union(&self.cell_bounds(c))
            })
        })
    }

    /// Whether the celltree has been built.
    fn has_index(&self) -> bool {
        self.index_cache().tree().is_some()
    }

    /// The celltree over all cells, built on first use.
    fn get_or_build_index(&self) -> &CellIndex {
        self.index_cache().tree_or_build(|| {
            let cell_bounds: Vec<CellBounds> = (0..self.num_elements())
                .map(|c| self.cell_bounds(c))
                .collect();
            let tree = Celltree::build(&cell_bounds, self.bounds(), &self.config().celltree);
            if self.config().validate_index {
                let report = tree.validate(|c| cell_bounds[c]);
                if !report.is_valid() {
                    log::warn!(
                        "celltree failed validation with {} problems",
                        report.violations().len()
                    );
                }
            }
            tree
        })
    }

    /// Drop the celltree and global bounds; they are rebuilt on next use.
    fn invalidate_index(&mut self) {
        self.index_cache_mut().clear();
    }

    /// Validate the celltree against current cell bounds, if it has been built.
    fn validate_index(&self) -> Option<ValidationReport<f32>> {
        self.index_cache()
            .tree()
            .map(|tree| tree.validate(|c| self.cell_bounds(c)))
    }

    /// The cell containing `point`.
    ///
    /// A `hint` that contains the point is returned without consulting the
    /// index. Ghost cells are only returned with [`FindFlags::ACCEPT_GHOST`].
    fn find_cell(&self, point: Vec3, hint: Option<usize>, flags: FindFlags) -> Option<usize> {
        search_cells(self, point, hint, flags)
    }

    /// Interpolation weights for a field with the given `mapping` at `point` in `cell`.
    fn get_interpolator(
        &self,
        cell: usize,
        point: Vec3,
        mapping: Mapping,
        mode: InterpolationMode,
    ) -> Interpolator {
        match (mapping, mode) {
            (Mapping::Element, _) => Interpolator::single(cell),
            (Mapping::Vertex, InterpolationMode::Linear) => self.linear_interpolator(cell, point),
            (Mapping::Vertex, mode) => {
                closed_form(mode, point, &self.cell_vertices(cell), |v| self.vertex(v))
            }
        }
    }

    /// Mean of the distinct vertices of `cell`.
    fn cell_center(&self, cell: usize) -> Vec3 {
        let verts = self.cell_vertices(cell);
        if verts.is_empty() {
            return Vec3::ZERO;
        }
        #[allow(clippy::cast_precision_loss, reason = "cells have few vertices")]
        let n = verts.len() as f32;
        verts.into_iter().map(|v| self.vertex(v)).sum::<Vec3>() / n
    }

    /// Length of the diagonal of the cell's bounds.
    fn cell_diameter(&self, cell: usize) -> f32 {
        let (lo, hi) = self.element_bounds(cell);
        lo.distance(hi)
    }

    /// Number of faces of `cell`.
    fn cell_num_faces(&self, cell: usize) -> usize {
        let mut faces = FaceSet::new();
        self.cell_faces(cell, &mut faces);
        faces.len()
    }

    /// Distance from `point` inside `cell` along `dir` to where the ray leaves the cell.
    fn exit_distance(&self, cell: usize, point: Vec3, dir: Vec3) -> Option<f32> {
        let mut faces = FaceSet::new();
        self.cell_faces(cell, &mut faces);
        exit_distance(point, dir, &faces)
    }
}

/// Whether `p` lies within `b` grown by `tolerance` on every side.
pub(crate) fn near_bounds(b: &CellBounds, p: Vec3, tolerance: f32) -> bool {
    (0..3).all(|d| b.min[d] - tolerance <= p[d] && p[d] <= b.max[d] + tolerance)
}

/// Hint check, bounds rejection, then a celltree or linear search.
///
/// The celltree is used if [`FindFlags::FORCE_CELLTREE`] is set, or if it
/// already exists and [`FindFlags::NO_CELLTREE`] is not set.
///
/// This is the body of [`CellLocator::find_cell`], available to grids that
/// override it with a faster direct path.
pub fn search_cells<L>(
    grid: &L,
    point: Vec3,
    hint: Option<usize>,
    flags: FindFlags,
) -> Option<usize>
where
    L: CellLocator + ?Sized,
{
    let accept = |c: usize| flags.contains(FindFlags::ACCEPT_GHOST) || !grid.is_ghost(c);
    let hint = hint.filter(|&h| h < grid.num_elements());
    if let Some(h) = hint
        && accept(h)
        && grid.inside(h, point)
    {
        return Some(h);
    }

    let p = point.to_array();
    if !grid.bounds().contains_point(&p) {
        return None;
    }

    let use_tree = flags.contains(FindFlags::FORCE_CELLTREE)
        || (!flags.contains(FindFlags::NO_CELLTREE) && grid.has_index());
    if use_tree {
        let tree = grid.get_or_build_index();
        let mut found = None;
        tree.traverse(&mut PointVisitor::new(p), |c| {
            if accept(c) && grid.inside(c, point) {
                found = Some(c);
                return false;
            }
            true
        });
        return found;
    }

    (0..grid.num_elements()).find(|&c| Some(c) != hint && accept(c) && grid.inside(c, point))
}

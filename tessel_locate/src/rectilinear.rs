// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectilinear grids: axis-aligned boxes given by one coordinate array per axis.

use glam::Vec3;

use crate::config::LocateConfig;
use crate::error::MeshError;
use crate::geometry::FaceSet;
use crate::interp::Interpolator;
use crate::lattice::Lattice;
use crate::locator::{CellBounds, CellLocator, FindFlags, IndexCache, search_cells};
use crate::mapping::trilinear_weights;
use crate::shape::CellShape;

/// A grid whose vertices are the tensor product of three increasing coordinate arrays.
///
/// Point location works by binary search on each axis; the celltree is only
/// used when asked for with [`FindFlags::FORCE_CELLTREE`].
#[derive(Clone, Debug)]
pub struct RectilinearGrid {
    coords: [Vec<f32>; 3],
    lattice: Lattice,
    config: LocateConfig,
    index: IndexCache,
}

impl RectilinearGrid {
    /// Assemble a grid from strictly increasing axis coordinates.
    pub fn new(coords: [Vec<f32>; 3], config: LocateConfig) -> Result<Self, MeshError> {
        let dims = [coords[0].len(), coords[1].len(), coords[2].len()];
        let grid = Self {
            coords,
            lattice: Lattice::new(dims),
            config,
            index: IndexCache::new(),
        };
        grid.check()?;
        Ok(grid)
    }

    /// Mark `[before, after]` cell layers on each axis as ghosts.
    ///
    /// At least one owned cell must remain along every axis that has ghosts.
    pub fn with_ghost_layers(mut self, layers: [[usize; 2]; 3]) -> Result<Self, MeshError> {
        self.lattice = self.lattice.with_ghost_layers(layers)?;
        Ok(self)
    }

    /// Check that every axis increases strictly.
    pub fn check(&self) -> Result<(), MeshError> {
        for (axis, c) in self.coords.iter().enumerate() {
            if let Some(i) = c.windows(2).position(|w| w[1] <= w[0]) {
                return Err(MeshError::NonIncreasingAxis { axis, index: i + 1 });
            }
        }
        Ok(())
    }

    /// Coordinates along `axis`.
    pub fn axis(&self, axis: usize) -> &[f32] {
        &self.coords[axis]
    }

    /// Cell index along `axis` containing the coordinate `x`.
    ///
    /// Coordinates on an inner grid plane belong to the lower cell.
    fn axis_cell(&self, axis: usize, x: f32) -> Option<usize> {
        let c = &self.coords[axis];
        let (&first, &last) = (c.first()?, c.last()?);
        if c.len() < 2 || x < first || x > last {
            return None;
        }
        Some(c.partition_point(|&v| v < x).saturating_sub(1).min(c.len() - 2))
    }

    /// The cell containing `point`, found by binary search.
    fn locate(&self, point: Vec3) -> Option<usize> {
        let i = self.axis_cell(0, point.x)?;
        let j = self.axis_cell(1, point.y)?;
        let k = self.axis_cell(2, point.z)?;
        Some(self.lattice.cell_index([i, j, k]))
    }

    /// Parametric coordinates of `point` in `cell`, clamped to the unit cube.
    fn local_coords(&self, cell: usize, point: Vec3) -> [f64; 3] {
        let ijk = self.lattice.cell_coords(cell);
        let mut s = [0.0; 3];
        for axis in 0..3 {
            let c = &self.coords[axis];
            let (lo, hi) = (c[ijk[axis]], c[ijk[axis] + 1]);
            s[axis] = (f64::from(point[axis] - lo) / f64::from(hi - lo)).clamp(0.0, 1.0);
        }
        s
    }
}

impl CellLocator for RectilinearGrid {
    fn config(&self) -> &LocateConfig {
        &self.config
    }

    fn num_elements(&self) -> usize {
        self.lattice.num_cells()
    }

    fn vertex(&self, vertex: usize) -> Vec3 {
        let [i, j, k] = self.lattice.vertex_coords(vertex);
        Vec3::new(self.coords[0][i], self.coords[1][j], self.coords[2][k])
    }

    fn is_ghost(&self, cell: usize) -> bool {
        self.lattice.is_ghost(cell)
    }

    fn cell_vertices(&self, cell: usize) -> Vec<usize> {
        self.lattice.cell_corners(cell).to_vec()
    }

    fn cell_faces(&self, cell: usize, faces: &mut FaceSet) {
        faces.clear();
        let corners = self.lattice.cell_corners(cell).map(|v| self.vertex(v));
        for face in CellShape::Hexahedron.faces() {
            faces.push_face(face.iter().map(|&i| corners[i]));
        }
    }

    fn inside(&self, cell: usize, point: Vec3) -> bool {
        self.cell_bounds(cell).contains_point(&point.to_array())
    }

    fn linear_interpolator(&self, cell: usize, point: Vec3) -> Interpolator {
        let [s, t, w] = self.local_coords(cell, point);
        #[allow(clippy::cast_possible_truncation, reason = "weights are stored in f32")]
        let weights = trilinear_weights(s, t, w).map(|x| x as f32);
        Interpolator::new(self.lattice.cell_corners(cell), weights)
    }

    fn get_neighbor_elements(&self, cell: usize) -> Vec<usize> {
        self.lattice.neighbors(cell)
    }

    fn index_cache(&self) -> &IndexCache {
        &self.index
    }

    fn index_cache_mut(&mut self) -> &mut IndexCache {
        &mut self.index
    }

    fn cell_bounds(&self, cell: usize) -> CellBounds {
        let [i, j, k] = self.lattice.cell_coords(cell);
        let [x, y, z] = &self.coords;
        CellBounds::new([x[i], y[j], z[k]], [x[i + 1], y[j + 1], z[k + 1]])
    }

    fn bounds(&self) -> CellBounds {
        if self.num_elements() == 0 {
            return CellBounds::inverted();
        }
        let [x, y, z] = &self.coords;
        CellBounds::new(
            [x[0], y[0], z[0]],
            [x[x.len() - 1], y[y.len() - 1], z[z.len() - 1]],
        )
    }

    fn cell_num_faces(&self, _cell: usize) -> usize {
        6
    }

    fn find_cell(&self, point: Vec3, hint: Option<usize>, flags: FindFlags) -> Option<usize> {
        if flags.contains(FindFlags::FORCE_CELLTREE) {
            return search_cells(self, point, hint, flags);
        }
        let accept = |c: usize| flags.contains(FindFlags::ACCEPT_GHOST) || !self.is_ghost(c);
        if let Some(h) = hint.filter(|&h| h < self.num_elements())
            && accept(h)
            && self.inside(h, point)
        {
            return Some(h);
        }
        self.locate(point).filter(|&c| accept(c))
    }
}

// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Curvilinear grids: hexahedral cells with implicit connectivity.

use glam::Vec3;

use crate::config::LocateConfig;
use crate::error::MeshError;
use crate::geometry::{FaceSet, cell_is_convex, point_in_convex_cell, point_in_general_cell};
use crate::interp::{Interpolator, hexahedron_weights};
use crate::lattice::Lattice;
use crate::locator::{CellLocator, IndexCache, near_bounds};
use crate::shape::CellShape;

/// A grid of `nx * ny * nz` vertices at arbitrary positions, connected as a
/// lattice of hexahedra.
///
/// Vertex `(i, j, k)` is stored at `(i * ny + j) * nz + k`.
#[derive(Clone, Debug)]
pub struct StructuredGrid {
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
    lattice: Lattice,
    convex: Vec<bool>,
    config: LocateConfig,
    index: IndexCache,
}

impl StructuredGrid {
    /// Assemble a grid of `dims` vertices per axis from coordinate arrays.
    pub fn new(
        dims: [usize; 3],
        [x, y, z]: [Vec<f32>; 3],
        config: LocateConfig,
    ) -> Result<Self, MeshError> {
        let grid = Self {
            x,
            y,
            z,
            lattice: Lattice::new(dims),
            convex: Vec::new(),
            config,
            index: IndexCache::new(),
        };
        grid.check()?;
        Ok(grid)
    }

    /// Assemble a grid from vertex positions in storage order.
    pub fn from_vertices(
        dims: [usize; 3],
        vertices: &[Vec3],
        config: LocateConfig,
    ) -> Result<Self, MeshError> {
        let coords = [
            vertices.iter().map(|v| v.x).collect(),
            vertices.iter().map(|v| v.y).collect(),
            vertices.iter().map(|v| v.z).collect(),
        ];
        Self::new(dims, coords, config)
    }

    /// Mark `[before, after]` cell layers on each axis as ghosts.
    ///
    /// At least one owned cell must remain along every axis that has ghosts.
    pub fn with_ghost_layers(mut self, layers: [[usize; 2]; 3]) -> Result<Self, MeshError> {
        self.lattice = self.lattice.with_ghost_layers(layers)?;
        Ok(self)
    }

    /// Check that the coordinate arrays match the dimensions.
    pub fn check(&self) -> Result<(), MeshError> {
        let (x, y, z) = (self.x.len(), self.y.len(), self.z.len());
        if x != y || x != z {
            return Err(MeshError::CoordinateLength { x, y, z });
        }
        let expected = self.lattice.num_vertices();
        if expected != x {
            return Err(MeshError::StructuredDimensions {
                dims: self.lattice.dims(),
                expected,
                found: x,
            });
        }
        Ok(())
    }

    /// Vertices per axis.
    pub fn dims(&self) -> [usize; 3] {
        self.lattice.dims()
    }

    /// Ghost cell layers per axis.
    pub fn ghost_layers(&self) -> [[usize; 2]; 3] {
        self.lattice.ghost_layers()
    }

    /// Flag every convex cell so that it uses the half-space test.
    ///
    /// Returns the number of convex cells.
    pub fn check_convexity(&mut self) -> usize {
        let mut faces = FaceSet::new();
        let convex: Vec<bool> = (0..self.num_elements())
            .map(|cell| {
                self.cell_faces(cell, &mut faces);
                cell_is_convex(&faces, self.config.convex_tolerance)
            })
            .collect();
        let count = convex.iter().filter(|&&c| c).count();
        log::debug!("{count} of {} structured cells are convex", convex.len());
        self.convex = convex;
        count
    }

    fn corner_positions(&self, cell: usize) -> [Vec3; 8] {
        self.lattice.cell_corners(cell).map(|v| self.vertex(v))
    }
}

impl CellLocator for StructuredGrid {
    fn config(&self) -> &LocateConfig {
        &self.config
    }

    fn num_elements(&self) -> usize {
        self.lattice.num_cells()
    }

    fn vertex(&self, vertex: usize) -> Vec3 {
        Vec3::new(self.x[vertex], self.y[vertex], self.z[vertex])
    }

    fn is_ghost(&self, cell: usize) -> bool {
        self.lattice.is_ghost(cell)
    }

    fn cell_vertices(&self, cell: usize) -> Vec<usize> {
        self.lattice.cell_corners(cell).to_vec()
    }

    fn cell_faces(&self, cell: usize, faces: &mut FaceSet) {
        faces.clear();
        let corners = self.corner_positions(cell);
        for face in CellShape::Hexahedron.faces() {
            faces.push_face(face.iter().map(|&i| corners[i]));
        }
    }

    fn inside(&self, cell: usize, point: Vec3) -> bool {
        let tolerance = self.config.convex_tolerance;
        if !near_bounds(&self.cell_bounds(cell), point, tolerance) {
            return false;
        }
        let mut faces = FaceSet::new();
        self.cell_faces(cell, &mut faces);
        if self.convex.get(cell).copied().unwrap_or(false) {
            point_in_convex_cell(point, &faces, tolerance)
        } else {
            point_in_general_cell(point, &faces)
        }
    }

    fn linear_interpolator(&self, cell: usize, point: Vec3) -> Interpolator {
        let weights = hexahedron_weights(point, &self.corner_positions(cell));
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

    fn cell_num_faces(&self, _cell: usize) -> usize {
        6
    }
}

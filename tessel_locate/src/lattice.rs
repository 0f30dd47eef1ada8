// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Index arithmetic for grids with implicit hexahedral topology.
//!
//! Vertices are numbered with the first axis varying slowest:
//! `vertex(i, j, k) = (i * ny + j) * nz + k`, and cells likewise over the
//! `(nx - 1) * (ny - 1) * (nz - 1)` cell lattice.

use crate::error::MeshError;

/// Vertex counts and ghost layers of a structured grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Lattice {
    dims: [usize; 3],
    ghost: [[usize; 2]; 3],
}

impl Lattice {
    /// A lattice of `dims` vertices per axis.
    pub(crate) fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            ghost: [[0; 2]; 3],
        }
    }

    /// Cell layers at the low and high end of each axis that belong to neighbors.
    pub(crate) fn with_ghost_layers(mut self, ghost: [[usize; 2]; 3]) -> Result<Self, MeshError> {
        let cells = self.cell_dims();
        for axis in 0..3 {
            let [before, after] = ghost[axis];
            // At least one owned cell must remain along every axis with ghosts.
            if before + after > 0 && before + after >= cells[axis] {
                return Err(MeshError::GhostLayers {
                    axis,
                    before,
                    after,
                    cells: cells[axis],
                });
            }
        }
        self.ghost = ghost;
        Ok(self)
    }

    pub(crate) fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub(crate) fn ghost_layers(&self) -> [[usize; 2]; 3] {
        self.ghost
    }

    pub(crate) fn num_vertices(&self) -> usize {
        self.dims.iter().product()
    }

    /// Cells per axis.
    pub(crate) fn cell_dims(&self) -> [usize; 3] {
        self.dims.map(|n| n.saturating_sub(1))
    }

    pub(crate) fn num_cells(&self) -> usize {
        self.cell_dims().iter().product()
    }

    pub(crate) fn vertex_index(&self, [i, j, k]: [usize; 3]) -> usize {
        (i * self.dims[1] + j) * self.dims[2] + k
    }

    pub(crate) fn vertex_coords(&self, vertex: usize) -> [usize; 3] {
        let d = self.dims;
        [vertex / (d[1] * d[2]), (vertex / d[2]) % d[1], vertex % d[2]]
    }

    pub(crate) fn cell_index(&self, [i, j, k]: [usize; 3]) -> usize {
        let c = self.cell_dims();
        (i * c[1] + j) * c[2] + k
    }

    pub(crate) fn cell_coords(&self, cell: usize) -> [usize; 3] {
        let c = self.cell_dims();
        [cell / (c[1] * c[2]), (cell / c[2]) % c[1], cell % c[2]]
    }

    /// Corner vertices of a cell in hexahedron order.
    pub(crate) fn cell_corners(&self, cell: usize) -> [usize; 8] {
        let [i, j, k] = self.cell_coords(cell);
        [
            [i, j, k],
            [i + 1, j, k],
            [i + 1, j + 1, k],
            [i, j + 1, k],
            [i, j, k + 1],
            [i + 1, j, k + 1],
            [i + 1, j + 1, k + 1],
            [i, j + 1, k + 1],
        ]
        .map(|ijk| self.vertex_index(ijk))
    }

    pub(crate) fn is_ghost(&self, cell: usize) -> bool {
        let ijk = self.cell_coords(cell);
        let cells = self.cell_dims();
        (0..3).any(|a| ijk[a] < self.ghost[a][0] || ijk[a] >= cells[a] - self.ghost[a][1])
    }

    /// Cells sharing a vertex with `cell`, excluding `cell` itself, sorted.
    pub(crate) fn neighbors(&self, cell: usize) -> Vec<usize> {
        let ijk = self.cell_coords(cell);
        let cells = self.cell_dims();
        let range = |a: usize| ijk[a].saturating_sub(1)..=(ijk[a] + 1).min(cells[a] - 1);
        let mut out = Vec::with_capacity(26);
        for i in range(0) {
            for j in range(1) {
                for k in range(2) {
                    if [i, j, k] != ijk {
                        out.push(self.cell_index([i, j, k]));
                    }
                }
            }
        }
        out
    }
}

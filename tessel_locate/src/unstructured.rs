// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Indexed grids of mixed cell shapes.

use std::sync::OnceLock;

use glam::Vec3;
use tessel_celltree::SegmentVisitor;

use crate::adjacency::VertexOwnerList;
use crate::config::LocateConfig;
use crate::error::MeshError;
use crate::geometry::{
    FaceSet, cell_is_convex, face_normal_and_center, inside_polygon, point_in_convex_cell,
    point_in_general_cell, segment_plane_intersection,
};
use crate::interp::{
    InterpolationMode, Interpolator, closed_form, linear_weights, polyhedron_interpolator,
};
use crate::locator::{CellLocator, FindFlags, IndexCache, near_bounds};
use crate::shape::{CellFlags, CellShape, CellType};

/// A grid with explicit connectivity: cell `c` uses the corners
/// `cl[el[c]..el[c + 1]]`, each an index into the coordinate arrays.
///
/// Polyhedral cells store a face list in their corner range, laid out as
/// configured by [`LocateConfig::polyhedron_encoding`].
#[derive(Clone, Debug)]
pub struct UnstructuredGrid {
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
    el: Vec<usize>,
    cl: Vec<usize>,
    types: Vec<CellType>,
    ghost: Vec<u8>,
    config: LocateConfig,
    index: IndexCache,
    owners: OnceLock<VertexOwnerList>,
}

impl UnstructuredGrid {
    /// Assemble a grid from raw arrays and check their consistency.
    ///
    /// `types` holds one type byte per cell. `ghost` holds one byte per cell,
    /// non-zero for ghosts; an empty `ghost` marks every cell as owned.
    pub fn new(
        [x, y, z]: [Vec<f32>; 3],
        el: Vec<usize>,
        cl: Vec<usize>,
        types: Vec<u8>,
        ghost: Vec<u8>,
        config: LocateConfig,
    ) -> Result<Self, MeshError> {
        let types = types
            .into_iter()
            .enumerate()
            .map(|(element, byte)| {
                CellType::from_byte(byte)
                    .map_err(|source| MeshError::UnknownShape { element, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let ghost = if ghost.is_empty() {
            vec![0; types.len()]
        } else {
            ghost
        };
        let grid = Self {
            x,
            y,
            z,
            el,
            cl,
            types,
            ghost,
            config,
            index: IndexCache::new(),
            owners: OnceLock::new(),
        };
        grid.check()?;
        Ok(grid)
    }

    /// Assemble a grid from vertex positions and cell shapes, without ghosts.
    pub fn from_vertices(
        vertices: &[Vec3],
        el: Vec<usize>,
        cl: Vec<usize>,
        shapes: &[CellShape],
        config: LocateConfig,
    ) -> Result<Self, MeshError> {
        let coords = [
            vertices.iter().map(|v| v.x).collect(),
            vertices.iter().map(|v| v.y).collect(),
            vertices.iter().map(|v| v.z).collect(),
        ];
        let types = shapes.iter().map(|&s| CellType::new(s).byte()).collect();
        Self::new(coords, el, cl, types, Vec::new(), config)
    }

    /// Check that offsets, corners, types and face lists are consistent.
    pub fn check(&self) -> Result<(), MeshError> {
        let (x, y, z) = (self.x.len(), self.y.len(), self.z.len());
        if x != y || x != z {
            return Err(MeshError::CoordinateLength { x, y, z });
        }
        if self.el.first() != Some(&0) {
            return Err(MeshError::FirstOffset);
        }
        let elements = self.el.len() - 1;
        for (array, len) in [("types", self.types.len()), ("ghost", self.ghost.len())] {
            if len != elements {
                return Err(MeshError::PerElementLength {
                    array,
                    len,
                    elements,
                });
            }
        }
        if let Some(element) = self.el.windows(2).position(|w| w[1] < w[0]) {
            return Err(MeshError::NonMonotonicOffsets { element });
        }
        let last = self.el[elements];
        if last != self.cl.len() {
            return Err(MeshError::CornerCount {
                last,
                corners: self.cl.len(),
            });
        }

        let vertices = x;
        for element in 0..elements {
            let start = self.el[element];
            let corners = &self.cl[start..self.el[element + 1]];
            let shape = self.types[element].shape();
            let slots: Vec<usize> = match shape {
                CellShape::Polyhedron => {
                    let encoding = self.config.polyhedron_encoding;
                    encoding
                        .check(corners)
                        .map_err(|source| MeshError::FaceStream { element, source })?;
                    encoding.vertex_slots(corners).collect()
                }
                CellShape::Polygon if corners.len() < 3 => {
                    return Err(MeshError::WrongCornerCount {
                        element,
                        expected: 3,
                        found: corners.len(),
                    });
                }
                CellShape::Polygon => (0..corners.len()).collect(),
                fixed => {
                    let expected = fixed.num_vertices().unwrap_or(0);
                    if corners.len() != expected {
                        return Err(MeshError::WrongCornerCount {
                            element,
                            expected,
                            found: corners.len(),
                        });
                    }
                    (0..corners.len()).collect()
                }
            };
            if let Some(&slot) = slots.iter().find(|&&s| corners[s] >= vertices) {
                return Err(MeshError::CornerOutOfRange {
                    corner: start + slot,
                    vertex: corners[slot],
                    vertices,
                });
            }
        }
        Ok(())
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.x.len()
    }

    /// Element offsets.
    pub fn el(&self) -> &[usize] {
        &self.el
    }

    /// Corner list.
    pub fn cl(&self) -> &[usize] {
        &self.cl
    }

    /// Type of `cell`, including cached flags.
    pub fn cell_type(&self, cell: usize) -> CellType {
        self.types[cell]
    }

    /// Shape of `cell`.
    pub fn shape(&self, cell: usize) -> CellShape {
        self.types[cell].shape()
    }

    /// The raw corner range of `cell`, including face sizes of size-prefixed polyhedra.
    pub fn corners(&self, cell: usize) -> &[usize] {
        &self.cl[self.el[cell]..self.el[cell + 1]]
    }

    /// Mark or unmark `cell` as a ghost.
    pub fn set_ghost(&mut self, cell: usize, ghost: bool) {
        self.ghost[cell] = u8::from(ghost);
        self.types[cell] = self.types[cell].with(CellFlags::GHOST, ghost);
    }

    /// Set or clear the convex flag of every solid cell from its geometry.
    ///
    /// Returns the number of cells flagged convex.
    pub fn check_convexity(&mut self) -> usize {
        let mut faces = FaceSet::new();
        let mut convex = 0;
        for cell in 0..self.num_elements() {
            let shape = self.shape(cell);
            if shape.dimension() != 3 || shape.is_always_convex() {
                continue;
            }
            self.cell_faces(cell, &mut faces);
            let is_convex = cell_is_convex(&faces, self.config.convex_tolerance);
            self.types[cell] = self.types[cell].with(CellFlags::CONVEX, is_convex);
            convex += usize::from(is_convex);
        }
        log::debug!("{convex} of {} cells are convex", self.num_elements());
        convex
    }

    /// Vertex-to-cell adjacency, built on first use.
    pub fn vertex_owner_list(&self) -> &VertexOwnerList {
        self.owners.get_or_init(|| {
            VertexOwnerList::from_cells(
                self.num_vertices(),
                (0..self.num_elements()).map(|c| self.cell_vertices(c)),
            )
        })
    }

    /// Drop the vertex-to-cell adjacency; it is rebuilt on next use.
    pub fn invalidate_vertex_owner_list(&mut self) {
        self.owners = OnceLock::new();
    }

    /// The cell other than `cell` sharing the face through `v1`, `v2` and `v3`.
    pub fn get_neighbor_element(
        &self,
        cell: usize,
        v1: usize,
        v2: usize,
        v3: usize,
    ) -> Option<usize> {
        self.vertex_owner_list().face_neighbor(cell, v1, v2, v3)
    }

    /// Planar cells crossed by the segment from `p0` to `p1`, sorted.
    ///
    /// Searches with the celltree, building it if needed, unless
    /// [`FindFlags::NO_CELLTREE`] is given without [`FindFlags::FORCE_CELLTREE`].
    pub fn intersect_segment(&self, p0: Vec3, p1: Vec3, flags: FindFlags) -> Vec<usize> {
        let mut hits = Vec::new();
        let mut test = |cell: usize| {
            if self.shape(cell).dimension() == 2
                && (flags.contains(FindFlags::ACCEPT_GHOST) || !self.is_ghost(cell))
            {
                let corners = self.corner_positions(cell);
                let (normal, center) = face_normal_and_center(&corners);
                if let Some(x) = segment_plane_intersection(p0, p1, center, normal)
                    && inside_polygon(x, &corners, normal)
                {
                    hits.push(cell);
                }
            }
            true
        };
        if flags.contains(FindFlags::NO_CELLTREE) && !flags.contains(FindFlags::FORCE_CELLTREE) {
            for cell in 0..self.num_elements() {
                test(cell);
            }
        } else {
            let mut visitor = SegmentVisitor::new(p0.to_array(), p1.to_array());
            self.get_or_build_index().traverse(&mut visitor, test);
        }
        hits.sort_unstable();
        hits
    }

    fn corner_positions(&self, cell: usize) -> Vec<Vec3> {
        self.corners(cell).iter().map(|&v| self.vertex(v)).collect()
    }
}

impl CellLocator for UnstructuredGrid {
    fn config(&self) -> &LocateConfig {
        &self.config
    }

    fn num_elements(&self) -> usize {
        self.types.len()
    }

    fn vertex(&self, vertex: usize) -> Vec3 {
        Vec3::new(self.x[vertex], self.y[vertex], self.z[vertex])
    }

    fn is_ghost(&self, cell: usize) -> bool {
        self.ghost[cell] != 0 || self.types[cell].is_ghost()
    }

    fn cell_vertices(&self, cell: usize) -> Vec<usize> {
        let corners = self.corners(cell);
        let mut out = Vec::with_capacity(corners.len());
        let mut push = |v: usize| {
            if !out.contains(&v) {
                out.push(v);
            }
        };
        if self.shape(cell) == CellShape::Polyhedron {
            for slot in self.config.polyhedron_encoding.vertex_slots(corners) {
                push(corners[slot]);
            }
        } else {
            corners.iter().for_each(|&v| push(v));
        }
        out
    }

    fn cell_faces(&self, cell: usize, faces: &mut FaceSet) {
        faces.clear();
        let corners = self.corners(cell);
        match self.shape(cell) {
            CellShape::None => {}
            CellShape::Polygon => faces.push_face(corners.iter().map(|&v| self.vertex(v))),
            CellShape::Polyhedron => {
                for face in self.config.polyhedron_encoding.faces(corners) {
                    faces.push_face(face.iter().map(|&v| self.vertex(v)));
                }
            }
            fixed => {
                for face in fixed.faces() {
                    faces.push_face(face.iter().map(|&i| self.vertex(corners[i])));
                }
            }
        }
    }

    fn inside(&self, cell: usize, point: Vec3) -> bool {
        let shape = self.shape(cell);
        match shape.dimension() {
            2 => {
                let corners = self.corner_positions(cell);
                let (normal, center) = face_normal_and_center(&corners);
                normal != Vec3::ZERO
                    && normal.dot(point - center).abs() <= self.config.plane_tolerance
                    && inside_polygon(point, &corners, normal)
            }
            3 => {
                let tolerance = self.config.convex_tolerance;
                if !near_bounds(&self.cell_bounds(cell), point, tolerance) {
                    return false;
                }
                let mut faces = FaceSet::new();
                self.cell_faces(cell, &mut faces);
                if self.types[cell].is_convex() {
                    point_in_convex_cell(point, &faces, tolerance)
                } else {
                    point_in_general_cell(point, &faces)
                }
            }
            _ => false,
        }
    }

    fn linear_interpolator(&self, cell: usize, point: Vec3) -> Interpolator {
        let corners = self.corners(cell);
        match self.shape(cell) {
            CellShape::Polyhedron => polyhedron_interpolator(
                point,
                self.config.polyhedron_encoding.faces(corners),
                |v| self.vertex(v),
            ),
            shape => match linear_weights(shape, point, &self.corner_positions(cell)) {
                Some(weights) => Interpolator::new(corners.iter().copied(), weights),
                None => closed_form(
                    InterpolationMode::Mean,
                    point,
                    &self.cell_vertices(cell),
                    |v| self.vertex(v),
                ),
            },
        }
    }

    fn get_neighbor_elements(&self, cell: usize) -> Vec<usize> {
        self.vertex_owner_list().neighbors(cell, &self.cell_vertices(cell))
    }

    fn index_cache(&self) -> &IndexCache {
        &self.index
    }

    fn index_cache_mut(&mut self) -> &mut IndexCache {
        &mut self.index
    }

    fn cell_num_faces(&self, cell: usize) -> usize {
        let shape = self.shape(cell);
        match shape.num_faces() {
            Some(n) => n,
            None => self
                .config
                .polyhedron_encoding
                .faces(self.corners(cell))
                .count(),
        }
    }
}

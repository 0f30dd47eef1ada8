// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=tessel_locate --heading-base-level=0

//! Tessel Locate: point location and field interpolation on polyhedral meshes.
//!
//! Given a mesh of tetrahedra, pyramids, prisms, hexahedra, polygons and general
//! polyhedra, this crate answers two questions for a query point: which cell
//! contains it, and which weighted combination of vertex values interpolates a
//! field there.
//!
//! - [`UnstructuredGrid`]: explicit connectivity, mixed shapes, polyhedral face lists.
//! - [`StructuredGrid`]: curvilinear hexahedra with implicit connectivity and ghost layers.
//! - [`RectilinearGrid`]: axis-aligned boxes located by binary search.
//!
//! All three implement [`CellLocator`], which provides
//! [`find_cell`](CellLocator::find_cell), [`get_interpolator`](CellLocator::get_interpolator)
//! and index management on top of a handful of per-grid geometry methods.
//!
//! ## Indexing
//!
//! Cell bounds are indexed by a [`tessel_celltree::Celltree`], built on first use
//! and cached on the grid. Queries on a grid without an index scan all cells,
//! unless [`FindFlags::FORCE_CELLTREE`] asks for the index to be built. The
//! index is not updated when the grid changes; call
//! [`invalidate_index`](CellLocator::invalidate_index) after editing geometry.
//!
//! ## Ghost cells
//!
//! Ghost cells belong to a neighboring partition. They take part in geometry
//! tests but are only returned by [`find_cell`](CellLocator::find_cell) with
//! [`FindFlags::ACCEPT_GHOST`].
//!
//! ## Example
//!
//! ```rust
//! use glam::Vec3;
//! use tessel_locate::{
//!     CellLocator, CellShape, FindFlags, InterpolationMode, LocateConfig, Mapping,
//!     UnstructuredGrid,
//! };
//!
//! let corners = [
//!     Vec3::new(0.0, 0.0, 0.0),
//!     Vec3::new(1.0, 0.0, 0.0),
//!     Vec3::new(1.0, 1.0, 0.0),
//!     Vec3::new(0.0, 1.0, 0.0),
//!     Vec3::new(0.0, 0.0, 1.0),
//!     Vec3::new(1.0, 0.0, 1.0),
//!     Vec3::new(1.0, 1.0, 1.0),
//!     Vec3::new(0.0, 1.0, 1.0),
//! ];
//! let grid = UnstructuredGrid::from_vertices(
//!     &corners,
//!     vec![0, 8],
//!     (0..8).collect(),
//!     &[CellShape::Hexahedron],
//!     LocateConfig::default(),
//! )
//! .unwrap();
//!
//! let p = Vec3::splat(0.5);
//! let cell = grid.find_cell(p, None, FindFlags::empty()).unwrap();
//! let interp = grid.get_interpolator(cell, p, Mapping::Vertex, InterpolationMode::Linear);
//! let field = [0.0_f32, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
//! assert!((interp.apply(&field) - 3.5).abs() < 1e-5);
//! ```
//!
//! ### Float semantics
//!
//! Coordinates are stored as `f32`. Inverse mappings are solved in `f64` and are
//! best effort for strongly distorted cells. Inputs are assumed to contain no NaNs.

mod adjacency;
mod config;
mod error;
pub mod geometry;
mod interp;
mod lattice;
mod locator;
pub mod mapping;
mod polyhedron;
mod rectilinear;
mod shape;
mod structured;
mod unstructured;

#[cfg(test)]
mod test_util;

pub use adjacency::VertexOwnerList;
pub use config::LocateConfig;
pub use error::MeshError;
pub use interp::{
    InterpolationMode, Interpolator, Mapping, closed_form, hexahedron_weights, linear_weights,
    nearest_corner, polygon_weights, polyhedron_interpolator, prism_weights, pyramid_weights,
    quad_weights, tetrahedron_weights, triangle_weights,
};
pub use locator::{CellBounds, CellIndex, CellLocator, FindFlags, IndexCache, search_cells};
pub use polyhedron::{FaceStreamError, Faces, PolyhedronEncoding};
pub use rectilinear::RectilinearGrid;
pub use shape::{CellFlags, CellShape, CellType, UnknownShape};
pub use structured::StructuredGrid;
pub use unstructured::UnstructuredGrid;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{
        random_affine, random_convex_combination, unit_cube, unit_prism, unit_pyramid,
        unit_tetrahedron,
    };
    use glam::Vec3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// One cell of every solid shape, each moved to its own slot along x.
    fn zoo() -> (UnstructuredGrid, Vec<Vec<Vec3>>) {
        let terminated: Vec<usize> = CellShape::Hexahedron
            .faces()
            .iter()
            .flat_map(|f| f.iter().copied().chain([f[0]]))
            .collect();
        let cells: Vec<(CellShape, Vec<Vec3>, Vec<usize>)> = vec![
            (CellShape::Hexahedron, unit_cube().to_vec(), (0..8).collect()),
            (CellShape::Tetrahedron, unit_tetrahedron().to_vec(), (0..4).collect()),
            (CellShape::Pyramid, unit_pyramid().to_vec(), (0..5).collect()),
            (CellShape::Prism, unit_prism().to_vec(), (0..6).collect()),
            (CellShape::Polyhedron, unit_cube().to_vec(), terminated),
        ];

        let mut vertices = Vec::new();
        let mut el = vec![0];
        let mut cl = Vec::new();
        let mut shapes = Vec::new();
        let mut positions = Vec::new();
        for (slot, (shape, corners, conn)) in cells.into_iter().enumerate() {
            #[allow(clippy::cast_precision_loss, reason = "a handful of slots")]
            let offset = Vec3::X * (2.0 * slot as f32);
            let base = vertices.len();
            let moved: Vec<Vec3> = corners.iter().map(|&c| c + offset).collect();
            vertices.extend_from_slice(&moved);
            cl.extend(conn.iter().map(|&v| v + base));
            el.push(cl.len());
            shapes.push(shape);
            positions.push(moved);
        }
        let grid =
            UnstructuredGrid::from_vertices(&vertices, el, cl, &shapes, LocateConfig::default())
                .unwrap();
        (grid, positions)
    }

    #[test]
    fn every_shape_locates_and_interpolates() {
        let (grid, positions) = zoo();
        let mut rng = StdRng::seed_from_u64(2024);
        for round in 0..200 {
            for (cell, corners) in positions.iter().enumerate() {
                let p = random_convex_combination(&mut rng, corners);
                let flags = if round % 2 == 0 {
                    FindFlags::empty()
                } else {
                    FindFlags::FORCE_CELLTREE
                };
                assert_eq!(grid.find_cell(p, None, flags), Some(cell), "{p}");
                for mode in [InterpolationMode::Linear, InterpolationMode::Mean] {
                    let interp = grid.get_interpolator(cell, p, Mapping::Vertex, mode);
                    let sum = interp.weight_sum();
                    assert!((sum - 1.0).abs() <= 1e-4, "{mode:?} sum {sum} in cell {cell}");
                    assert!(interp.weights().iter().all(|&w| w >= -1e-4), "{interp:?}");
                    let verts = grid.cell_vertices(cell);
                    assert!(interp.indices().iter().all(|i| verts.contains(i)));
                }
            }
        }
    }

    #[test]
    fn linear_interpolation_reproduces_affine_fields() {
        let f = |p: Vec3| 1.5 * p.x - 2.0 * p.y + 0.25 * p.z - 4.0;
        let mut rng = StdRng::seed_from_u64(77);
        for _ in 0..50 {
            let map = random_affine(&mut rng);
            let corners = unit_cube().map(|c| map.transform_point3(c));
            let grid = UnstructuredGrid::from_vertices(
                &corners,
                vec![0, 8],
                (0..8).collect(),
                &[CellShape::Hexahedron],
                LocateConfig::default(),
            )
            .unwrap();
            let field = corners.map(f);
            let p = random_convex_combination(&mut rng, &corners);
            let cell = grid.find_cell(p, None, FindFlags::empty()).unwrap();
            let got = grid
                .get_interpolator(cell, p, Mapping::Vertex, InterpolationMode::Linear)
                .apply(&field);
            assert!((got - f(p)).abs() < 1e-3, "{got} vs {}", f(p));
        }
    }

    #[test]
    fn index_is_built_once_and_can_be_dropped() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<UnstructuredGrid>();
        assert_send_sync::<StructuredGrid>();
        assert_send_sync::<RectilinearGrid>();

        let (mut grid, _) = zoo();
        assert!(!grid.has_index());
        let trees: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| core::ptr::from_ref(grid.get_or_build_index()) as usize))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(trees.windows(2).all(|w| w[0] == w[1]));
        assert!(grid.has_index());
        assert_eq!(grid.get_or_build_index().num_cells(), grid.num_elements());

        grid.invalidate_index();
        assert!(!grid.has_index());
        assert!(grid.validate_index().is_none());
        assert_eq!(grid.find_cell(Vec3::splat(0.5), None, FindFlags::empty()), Some(0));
        assert!(!grid.has_index());
    }

    #[test]
    fn outside_points_are_not_found() {
        let (grid, _) = zoo();
        for p in [
            Vec3::new(1.5, 0.5, 0.5),
            Vec3::new(0.5, 0.5, 1.5),
            Vec3::new(-0.5, 0.5, 0.5),
            Vec3::new(2.9, 0.9, 0.9),
        ] {
            assert_eq!(grid.find_cell(p, None, FindFlags::empty()), None, "{p}");
            assert_eq!(grid.find_cell(p, None, FindFlags::FORCE_CELLTREE), None, "{p}");
        }
    }
}

// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Field interpolation on a mixed unstructured mesh.
//!
//! A hexahedron, a prism, a tetrahedron and a polyhedral cube side by side.
//! Sample a vertex field with every interpolation mode and list neighbors.
//!
//! Run:
//! - `cargo run -p tessel_demos --example interpolate_field`

use glam::Vec3;
use tessel_locate::{
    CellLocator, CellShape, FindFlags, InterpolationMode, LocateConfig, Mapping,
    UnstructuredGrid,
};

fn cube(origin: Vec3) -> [Vec3; 8] {
    [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(0.0, 1.0, 1.0),
    ]
    .map(|c| c + origin)
}

fn main() {
    // Two cubes sharing the face x = 1, then a prism and a tet on top of the first.
    // Vertices 8..12 close the second cube, 12..15 cap the prism, 15 is the apex.
    let mut vertices = cube(Vec3::ZERO).to_vec();
    vertices.extend(&cube(Vec3::X)[1..3]);
    vertices.extend(&cube(Vec3::X)[5..7]);
    vertices.extend([
        Vec3::new(0.0, 0.0, 2.0),
        Vec3::new(1.0, 0.0, 2.0),
        Vec3::new(0.0, 1.0, 2.0),
        Vec3::new(0.3, 0.3, 2.8),
    ]);

    // Hex over the first cube
    let mut cl = vec![0, 1, 2, 3, 4, 5, 6, 7];
    let mut el = vec![0, 8];
    // Polyhedral second cube, each face closed by repeating its first vertex
    let faces: [[usize; 4]; 6] = [
        [1, 2, 9, 8],
        [5, 10, 11, 6],
        [1, 8, 10, 5],
        [6, 11, 9, 2],
        [8, 9, 11, 10],
        [5, 6, 2, 1],
    ];
    for face in faces {
        cl.extend(face);
        cl.push(face[0]);
    }
    el.push(cl.len());
    // Prism between the top of the first cube and z = 2
    cl.extend([4, 5, 7, 12, 13, 14]);
    el.push(cl.len());
    // Tet above the prism
    cl.extend([12, 13, 14, 15]);
    el.push(cl.len());

    let shapes = [
        CellShape::Hexahedron,
        CellShape::Polyhedron,
        CellShape::Prism,
        CellShape::Tetrahedron,
    ];
    let mut grid =
        UnstructuredGrid::from_vertices(&vertices, el, cl, &shapes, LocateConfig::default())
            .expect("valid mesh");
    println!("{} of {} cells are convex", grid.check_convexity(), grid.num_elements());

    let field: Vec<f32> = vertices.iter().map(|p| p.x + 2.0 * p.y - p.z).collect();
    let probes = [
        Vec3::new(0.3, 0.4, 0.5),
        Vec3::new(1.5, 0.5, 0.5),
        Vec3::new(0.4, 0.2, 1.5),
        Vec3::new(0.3, 0.3, 2.2),
        Vec3::new(3.0, 0.0, 0.0),
    ];
    for p in probes {
        let Some(cell) = grid.find_cell(p, None, FindFlags::FORCE_CELLTREE) else {
            println!("{p}: outside the mesh");
            continue;
        };
        print!("{p}: cell {cell} ({:?}), exact {:.3}", shapes[cell], p.x + 2.0 * p.y - p.z);
        for mode in [
            InterpolationMode::Linear,
            InterpolationMode::Mean,
            InterpolationMode::Nearest,
            InterpolationMode::First,
        ] {
            let value = grid
                .get_interpolator(cell, p, Mapping::Vertex, mode)
                .apply(&field);
            print!(", {mode:?} {value:.3}");
        }
        println!();
    }

    for cell in 0..grid.num_elements() {
        println!(
            "cell {cell}: {} faces, neighbors {:?}",
            grid.cell_num_faces(cell),
            grid.get_neighbor_elements(cell)
        );
    }

    // Segment through the whole stack
    let hits = grid.intersect_segment(
        Vec3::new(0.2, 0.3, -1.0),
        Vec3::new(0.2, 0.3, 3.0),
        FindFlags::empty(),
    );
    println!("vertical segment crosses cells {hits:?}");
}

// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Particle tracing through a curvilinear grid.
//!
//! Build a bent structured grid with one ghost layer, move a few particles
//! through a swirling velocity field, and reuse the previous cell as a hint.
//!
//! Run:
//! - `cargo run -p tessel_demos --example locate_particles`

use glam::Vec3;
use tessel_locate::{
    CellLocator, FindFlags, InterpolationMode, LocateConfig, Mapping, StructuredGrid,
};

const N: usize = 12;

fn main() {
    // Bend a lattice around the z axis
    let mut vertices = Vec::with_capacity(N * N * N);
    for i in 0..N {
        for j in 0..N {
            for k in 0..N {
                let (r, theta) = (2.0 + i as f32 * 0.25, j as f32 * 0.12);
                vertices.push(Vec3::new(r * theta.cos(), r * theta.sin(), k as f32 * 0.25));
            }
        }
    }
    let mut grid = StructuredGrid::from_vertices([N; 3], &vertices, LocateConfig::default())
        .expect("dimensions match")
        .with_ghost_layers([[0, 1], [0, 0], [0, 0]])
        .expect("ghost layers fit");
    println!(
        "{} cells, {} convex",
        grid.num_elements(),
        grid.check_convexity()
    );

    // Tangential velocity per vertex
    let velocity: Vec<Vec3> = vertices
        .iter()
        .map(|p| Vec3::new(-p.y, p.x, 0.3) * 0.05)
        .collect();

    let seeds = [
        Vec3::new(2.6, 0.1, 0.4),
        Vec3::new(3.5, 0.2, 1.1),
        Vec3::new(4.2, 0.05, 2.0),
    ];
    for (n, seed) in seeds.into_iter().enumerate() {
        let mut p = seed;
        let mut hint = None;
        let mut steps = 0;
        let mut hinted = 0;
        while let Some(cell) = grid.find_cell(p, hint, FindFlags::empty()) {
            if hint == Some(cell) {
                hinted += 1;
            }
            let interp = grid.get_interpolator(cell, p, Mapping::Vertex, InterpolationMode::Linear);
            let v: Vec3 = interp
                .indices()
                .iter()
                .zip(interp.weights())
                .map(|(&i, &w)| velocity[i] * w)
                .sum();
            // Never step further than the cell lets us
            let dt = grid
                .exit_distance(cell, p, v.normalize_or_zero())
                .map_or(1.0, |d| (d / v.length()).clamp(0.05, 1.0));
            p += v * dt;
            hint = Some(cell);
            steps += 1;
            if steps == 500 {
                break;
            }
        }
        println!(
            "particle {n}: {steps} steps ({hinted} reused the hint), stopped at {p:.3}"
        );
    }

    // Ghost cells are only returned on request
    let outer = Vec3::new(4.65, 0.3, 1.0);
    println!(
        "outer point: owned {:?}, with ghosts {:?}",
        grid.find_cell(outer, None, FindFlags::empty()),
        grid.find_cell(outer, None, FindFlags::ACCEPT_GHOST)
    );
}

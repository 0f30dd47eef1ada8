// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use tessel_locate::{
    CellLocator, CellShape, FindFlags, InterpolationMode, LocateConfig, Mapping, RectilinearGrid,
    StructuredGrid, UnstructuredGrid,
};

/// A wavy lattice of `n^3` vertices.
fn wavy_vertices(n: usize) -> Vec<Vec3> {
    let mut out = Vec::with_capacity(n * n * n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let (x, y, z) = (i as f32, j as f32, k as f32);
                out.push(Vec3::new(x + 0.2 * (0.5 * z).sin(), y, z + 0.2 * (0.5 * x).cos()));
            }
        }
    }
    out
}

fn structured(n: usize) -> StructuredGrid {
    StructuredGrid::from_vertices([n; 3], &wavy_vertices(n), LocateConfig::default())
        .expect("valid lattice")
}

fn unstructured(n: usize) -> UnstructuredGrid {
    let vertices = wavy_vertices(n);
    let v = |i: usize, j: usize, k: usize| (i * n + j) * n + k;
    let mut el = vec![0];
    let mut cl = Vec::new();
    for i in 0..n - 1 {
        for j in 0..n - 1 {
            for k in 0..n - 1 {
                cl.extend([
                    v(i, j, k),
                    v(i + 1, j, k),
                    v(i + 1, j + 1, k),
                    v(i, j + 1, k),
                    v(i, j, k + 1),
                    v(i + 1, j, k + 1),
                    v(i + 1, j + 1, k + 1),
                    v(i, j + 1, k + 1),
                ]);
                el.push(cl.len());
            }
        }
    }
    let shapes = vec![CellShape::Hexahedron; el.len() - 1];
    UnstructuredGrid::from_vertices(&vertices, el, cl, &shapes, LocateConfig::default())
        .expect("valid mesh")
}

fn probe_points(n: usize, count: usize) -> Vec<Vec3> {
    let mut state = 0x9e37_79b9_u32;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state >> 8) as f32 / (1u32 << 24) as f32
    };
    let extent = (n - 1) as f32;
    (0..count)
        .map(|_| Vec3::new(next() * extent, next() * extent, next() * extent))
        .collect()
}

fn bench_find_cell(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_cell");
    for &n in &[17usize, 33] {
        let points = probe_points(n, 1024);
        group.throughput(Throughput::Elements(points.len() as u64));

        let grid = unstructured(n);
        grid.get_or_build_index();
        group.bench_function(format!("unstructured_celltree_n{}", n), |b| {
            b.iter(|| {
                for p in &points {
                    black_box(grid.find_cell(*p, None, FindFlags::empty()));
                }
            });
        });

        let mut grid = structured(n);
        grid.check_convexity();
        grid.get_or_build_index();
        group.bench_function(format!("structured_celltree_n{}", n), |b| {
            b.iter(|| {
                for p in &points {
                    black_box(grid.find_cell(*p, None, FindFlags::empty()));
                }
            });
        });

        let axis: Vec<f32> = (0..n).map(|i| i as f32).collect();
        let grid = RectilinearGrid::new([axis.clone(), axis.clone(), axis], LocateConfig::default())
            .expect("increasing axes");
        group.bench_function(format!("rectilinear_direct_n{}", n), |b| {
            b.iter(|| {
                for p in &points {
                    black_box(grid.find_cell(*p, None, FindFlags::empty()));
                }
            });
        });
    }

    // A particle moving in small steps keeps hitting its previous cell.
    let grid = unstructured(17);
    grid.get_or_build_index();
    let path: Vec<Vec3> = (0..1024)
        .map(|i| Vec3::new(0.5 + i as f32 * 0.015, 3.3, 7.7))
        .collect();
    group.bench_function("unstructured_hinted_path", |b| {
        b.iter(|| {
            let mut hint = None;
            for p in &path {
                hint = grid.find_cell(*p, hint, FindFlags::empty()).or(hint);
            }
            black_box(hint)
        });
    });
    group.finish();
}

fn bench_interpolate(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_interpolator");
    let grid = unstructured(17);
    let points = probe_points(17, 1024);
    let located: Vec<(usize, Vec3)> = points
        .iter()
        .filter_map(|&p| grid.find_cell(p, None, FindFlags::FORCE_CELLTREE).map(|c| (c, p)))
        .collect();
    group.throughput(Throughput::Elements(located.len() as u64));
    for mode in [InterpolationMode::Linear, InterpolationMode::Mean, InterpolationMode::Nearest] {
        group.bench_function(format!("{mode:?}"), |b| {
            b.iter(|| {
                for &(cell, p) in &located {
                    black_box(grid.get_interpolator(cell, p, Mapping::Vertex, mode));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_find_cell, bench_interpolate);
criterion_main!(benches);

// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tessel_celltree::{Aabb, BuildConfig, Celltree, PointVisitor};

fn gen_grid_boxes(n: usize, cell: f32) -> Vec<Aabb<f32, 3>> {
    let mut out = Vec::with_capacity(n * n * n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let lo = [i as f32 * cell, j as f32 * cell, k as f32 * cell];
                out.push(Aabb::new(lo, lo.map(|x| x + cell)));
            }
        }
    }
    out
}

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32)
    }
}

fn gen_random_boxes(count: usize, extent: f32, max_size: f32) -> Vec<Aabb<f32, 3>> {
    let mut rng = Rng::new(0x5eed);
    (0..count)
        .map(|_| {
            let lo = [(); 3].map(|()| rng.next_f32() * extent);
            let size = [(); 3].map(|()| rng.next_f32() * max_size);
            Aabb::new(lo, [lo[0] + size[0], lo[1] + size[1], lo[2] + size[2]])
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("celltree_build");
    for &n in &[16usize, 32, 64] {
        let boxes = gen_grid_boxes(n, 1.0);
        group.throughput(Throughput::Elements((n * n * n) as u64));
        group.bench_function(format!("grid_n{}", n), |b| {
            b.iter_batched(
                || boxes.clone(),
                |boxes| black_box(Celltree::from_cell_bounds(&boxes)),
                BatchSize::SmallInput,
            );
        });
    }
    let random = gen_random_boxes(50_000, 100.0, 4.0);
    for &leaf in &[4usize, 8, 16] {
        let config = BuildConfig::default().with_max_leaf_size(leaf);
        let bounds = random.iter().fold(Aabb::inverted(), |acc, b| acc.union(b));
        group.bench_function(format!("random_leaf{}", leaf), |b| {
            b.iter(|| black_box(Celltree::build(&random, bounds, &config)));
        });
    }
    group.finish();
}

fn bench_point_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("celltree_point_query");
    let boxes = gen_random_boxes(50_000, 100.0, 4.0);
    let tree = Celltree::from_cell_bounds(&boxes);
    let mut rng = Rng::new(7);
    let points: Vec<[f32; 3]> = (0..1024)
        .map(|_| [(); 3].map(|()| rng.next_f32() * 100.0))
        .collect();
    group.throughput(Throughput::Elements(points.len() as u64));
    group.bench_function("random_1024", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for p in &points {
                tree.traverse(&mut PointVisitor::new(*p), |c| {
                    if boxes[c].contains_point(p) {
                        hits += 1;
                    }
                    true
                });
            }
            black_box(hits)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_point_queries);
criterion_main!(benches);

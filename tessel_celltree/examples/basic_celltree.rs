// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Basic usage of Tessel Celltree: build over a grid of squares, query a point and a segment.

use tessel_celltree::{Aabb, Celltree, PointVisitor, SegmentVisitor};

fn main() {
    let mut squares = Vec::new();
    for i in 0..16_u8 {
        for j in 0..16_u8 {
            let (x, y) = (f32::from(i), f32::from(j));
            squares.push(Aabb::new([x, y], [x + 1.0, y + 1.0]));
        }
    }
    let tree = Celltree::from_cell_bounds(&squares);
    println!(
        "{} cells, {} nodes, depth {}",
        tree.num_cells(),
        tree.num_nodes(),
        tree.depth()
    );

    // Point query
    let p = [3.25, 9.75];
    let mut candidates = Vec::new();
    tree.traverse(&mut PointVisitor::new(p), |c| {
        candidates.push(c);
        true
    });
    let hit: Vec<_> = candidates
        .iter()
        .copied()
        .filter(|&c| squares[c].contains_point(&p))
        .collect();
    println!("{} candidates for {:?}, containing: {:?}", candidates.len(), p, hit);

    // Segment query
    let mut along = Vec::new();
    tree.traverse(
        &mut SegmentVisitor::new([0.5, 0.5], [15.5, 0.5]),
        |c| {
            along.push(c);
            true
        },
    );
    println!("segment candidates: {}", along.len());
}

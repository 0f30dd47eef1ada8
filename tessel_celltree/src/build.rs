// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Top-down construction with a bucketed split-cost heuristic.

use alloc::vec;
use alloc::vec::Vec;

use crate::tree::{Celltree, Node};
use crate::types::{Aabb, Scalar, lt, max_t, min_t};

/// Tuning knobs for [`Celltree::build`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BuildConfig {
    /// Nodes holding at most this many cells are not split further.
    pub max_leaf_size: usize,
    /// Number of buckets cell centers are sorted into when evaluating splits.
    pub num_buckets: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_leaf_size: 8,
            num_buckets: 5,
        }
    }
}

impl BuildConfig {
    /// Set the leaf size threshold (at least 2).
    pub fn with_max_leaf_size(mut self, n: usize) -> Self {
        self.max_leaf_size = n.max(2);
        self
    }

    /// Set the number of split buckets (at least 2).
    pub fn with_num_buckets(mut self, n: usize) -> Self {
        self.num_buckets = n.max(2);
        self
    }
}

/// Per-axis bucket statistics, reused across nodes.
struct Buckets<T, const N: usize> {
    count: Vec<[usize; N]>,
    min: Vec<[T; N]>,
    max: Vec<[T; N]>,
}

impl<T: Scalar, const N: usize> Buckets<T, N> {
    fn new(n: usize) -> Self {
        Self {
            count: vec![[0; N]; n],
            min: vec![[T::MAX; N]; n],
            max: vec![[T::LOWEST; N]; n],
        }
    }

    fn reset(&mut self) {
        self.count.fill([0; N]);
        self.min.fill([T::MAX; N]);
        self.max.fill([T::LOWEST; N]);
    }
}

/// The chosen split of one node.
struct Choice<T> {
    dim: usize,
    bucket: usize,
    lmax: T,
    rmin: T,
}

/// Center range of a node's cells along one axis.
#[derive(Copy, Clone)]
struct CenterRange {
    min: f64,
    extent: f64,
}

impl CenterRange {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "the ratio is clamped to [0, n) before the cast"
    )]
    fn bucket(&self, center: f64, n: usize) -> usize {
        if self.extent <= 0.0 {
            return 0;
        }
        let b = ((center - self.min) * n as f64 / self.extent).max(0.0) as usize;
        b.min(n - 1)
    }
}

impl<T: Scalar, const N: usize> Celltree<T, N> {
    /// Build a tree over `cell_bounds`, where entry `i` is the bounding box of cell `i`.
    ///
    /// `bounds` becomes the root region and should contain every cell box.
    /// The result only depends on the inputs, so building twice gives identical trees.
    pub fn build(cell_bounds: &[Aabb<T, N>], bounds: Aabb<T, N>, config: &BuildConfig) -> Self {
        let num_cells = cell_bounds.len();
        let max_leaf = config.max_leaf_size.max(2);
        let nb = config.num_buckets.max(2);

        let mut nodes = vec![Node::leaf(0, num_cells)];
        let mut cells: Vec<usize> = (0..num_cells).collect();
        let mut buckets = Buckets::<T, N>::new(nb);
        let mut abandoned = 0_usize;

        let mut work = vec![0_usize];
        while let Some(idx) = work.pop() {
            let Node::Leaf { start, count } = nodes[idx] else {
                continue;
            };
            if count <= max_leaf {
                continue;
            }
            // Splitting adds two nodes; there may never be more nodes than cells.
            if nodes.len() + 2 > num_cells {
                abandoned += 1;
                continue;
            }
            let slice = &mut cells[start..start + count];
            let Some(choice) = choose_split(slice, cell_bounds, &mut buckets) else {
                log::warn!("abandoning split of celltree node {idx} with {count} cells");
                abandoned += 1;
                continue;
            };

            let nl = partition(slice, cell_bounds, &choice, nb);
            let child = nodes.len();
            nodes[idx] = Node::Inner {
                dim: choice.dim,
                lmax: choice.lmax,
                rmin: choice.rmin,
                child,
            };
            nodes.push(Node::leaf(start, nl));
            nodes.push(Node::leaf(start + nl, count - nl));
            work.push(child + 1);
            work.push(child);
        }

        log::info!(
            "created celltree: {} nodes, {} cells",
            nodes.len(),
            num_cells
        );
        if abandoned > 0 {
            log::debug!("{abandoned} celltree leaves exceed the leaf size of {max_leaf}");
        }
        Self::from_parts(bounds, nodes, cells)
    }

    /// Build with the default configuration, taking the union of all cell boxes as root region.
    pub fn from_cell_bounds(cell_bounds: &[Aabb<T, N>]) -> Self {
        let bounds = cell_bounds
            .iter()
            .fold(Aabb::inverted(), |acc, b| acc.union(b));
        Self::build(cell_bounds, bounds, &BuildConfig::default())
    }
}

fn center_ranges<T: Scalar, const N: usize>(
    slice: &[usize],
    cell_bounds: &[Aabb<T, N>],
) -> [CenterRange; N] {
    let mut lo = [f64::MAX; N];
    let mut hi = [f64::MIN; N];
    for &c in slice {
        let b = &cell_bounds[c];
        for d in 0..N {
            let center = T::widen(b.center(d));
            lo[d] = lo[d].min(center);
            hi[d] = hi[d].max(center);
        }
    }
    core::array::from_fn(|d| CenterRange {
        min: lo[d],
        extent: hi[d] - lo[d],
    })
}

/// Pick the cheapest axis and bucket boundary for the cells in `slice`.
///
/// Ties keep the first candidate found, scanning axes then buckets in
/// increasing order. Returns `None` if no boundary leaves both sides non-empty.
fn choose_split<T: Scalar, const N: usize>(
    slice: &[usize],
    cell_bounds: &[Aabb<T, N>],
    buckets: &mut Buckets<T, N>,
) -> Option<Choice<T>> {
    let nb = buckets.count.len();
    let ranges = center_ranges(slice, cell_bounds);
    buckets.reset();

    for &c in slice {
        let b = &cell_bounds[c];
        for d in 0..N {
            let k = ranges[d].bucket(T::widen(b.center(d)), nb);
            buckets.count[k][d] += 1;
            buckets.min[k][d] = min_t(buckets.min[k][d], b.min[d]);
            buckets.max[k][d] = max_t(buckets.max[k][d], b.max[d]);
        }
    }

    // Make the bucket extents monotonic so that empty buckets inherit their neighbours.
    for d in 0..N {
        for k in 1..nb {
            buckets.max[k][d] = max_t(buckets.max[k][d], buckets.max[k - 1][d]);
        }
        for k in (0..nb - 1).rev() {
            buckets.min[k][d] = min_t(buckets.min[k][d], buckets.min[k + 1][d]);
        }
    }

    #[allow(clippy::cast_precision_loss, reason = "cell counts stay far below 2^52")]
    let total = slice.len() as f64;
    let mut best: Option<(f64, Choice<T>)> = None;
    for d in 0..N {
        if ranges[d].extent <= 0.0 {
            continue;
        }
        let mut nl = 0_usize;
        for k in 0..nb - 1 {
            nl += buckets.count[k][d];
            let nr = slice.len() - nl;
            if nl == 0 || nr == 0 {
                continue;
            }
            let left = T::widen(buckets.max[k][d]) - T::widen(buckets.min[0][d]);
            let right = T::widen(buckets.max[nb - 1][d]) - T::widen(buckets.min[k + 1][d]);
            #[allow(clippy::cast_precision_loss, reason = "cell counts stay far below 2^52")]
            let cost = (nl as f64 * left + nr as f64 * right) / (total * ranges[d].extent);
            if best.as_ref().is_none_or(|(c, _)| lt(cost, *c)) {
                best = Some((
                    cost,
                    Choice {
                        dim: d,
                        bucket: k,
                        lmax: buckets.max[k][d],
                        rmin: buckets.min[k + 1][d],
                    },
                ));
            }
        }
    }
    best.map(|(_, choice)| choice)
}

/// Move cells whose center falls into a bucket at or below the split to the front.
///
/// Returns the number of cells on the left.
fn partition<T: Scalar, const N: usize>(
    slice: &mut [usize],
    cell_bounds: &[Aabb<T, N>],
    choice: &Choice<T>,
    nb: usize,
) -> usize {
    let range = center_ranges(slice, cell_bounds)[choice.dim];
    let goes_left =
        |c: usize| range.bucket(T::widen(cell_bounds[c].center(choice.dim)), nb) <= choice.bucket;

    let mut i = 0;
    let mut j = slice.len();
    while i < j {
        if goes_left(slice[i]) {
            i += 1;
        } else {
            j -= 1;
            slice.swap(i, j);
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visit::{PointVisitor, SegmentVisitor};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// An `n`³ lattice of unit cubes.
    fn lattice(n: usize) -> Vec<Aabb<f32, 3>> {
        let mut out = Vec::new();
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    #[allow(clippy::cast_precision_loss, reason = "small test lattice")]
                    let p = [i as f32, j as f32, k as f32];
                    out.push(Aabb::new(p, [p[0] + 1.0, p[1] + 1.0, p[2] + 1.0]));
                }
            }
        }
        out
    }

    fn random_boxes(n: usize, seed: u64) -> Vec<Aabb<f64, 3>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let min: [f64; 3] = core::array::from_fn(|_| rng.gen_range(-100.0..100.0));
                let max = core::array::from_fn(|d| min[d] + rng.gen_range(0.0..5.0));
                Aabb::new(min, max)
            })
            .collect()
    }

    #[test]
    fn lattice_point_queries_find_their_cube() {
        let cubes = lattice(6);
        let tree = Celltree::from_cell_bounds(&cubes);
        assert_eq!(tree.check(), Ok(()));
        assert!(tree.validate(|c| cubes[c]).is_valid());
        assert!(tree.num_nodes() > 1);

        for (idx, cube) in cubes.iter().enumerate() {
            let p = [cube.center(0), cube.center(1), cube.center(2)];
            let mut found = None;
            tree.traverse(&mut PointVisitor::new(p), |c| {
                if cubes[c].contains_point(&p) {
                    found = Some(c);
                    return false;
                }
                true
            });
            assert_eq!(found, Some(idx));
        }
    }

    #[test]
    fn leaves_respect_threshold_when_splittable() {
        let cubes = lattice(5);
        let tree = Celltree::from_cell_bounds(&cubes);
        for (i, n) in tree.nodes().iter().enumerate() {
            if n.is_leaf() {
                assert!(tree.leaf_cells(i).len() <= 8);
            }
        }
        assert!(tree.depth() >= 3);
    }

    #[test]
    fn build_is_deterministic() {
        let boxes = random_boxes(500, 7);
        let a = Celltree::from_cell_bounds(&boxes);
        let b = Celltree::from_cell_bounds(&boxes);
        assert_eq!(a.nodes(), b.nodes());
        assert_eq!(a.cells(), b.cells());
    }

    #[test]
    fn random_boxes_validate() {
        let boxes = random_boxes(1000, 42);
        let tree = Celltree::from_cell_bounds(&boxes);
        assert_eq!(tree.check(), Ok(()));
        let report = tree.validate(|c| boxes[c]);
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn identical_centers_keep_one_oversized_leaf() {
        let boxes = vec![Aabb::new([0.0_f32, 0.0], [1.0, 1.0]); 20];
        let tree = Celltree::from_cell_bounds(&boxes);
        assert_eq!(tree.num_nodes(), 1);
        assert_eq!(tree.leaf_cells(0).len(), 20);
        assert_eq!(tree.check(), Ok(()));
    }

    #[test]
    fn uneven_centers_never_exceed_one_node_per_cell() {
        let boxes: Vec<Aabb<f64, 3>> = (0..40)
            .map(|i| {
                let x = 10.0_f64.powi(i);
                Aabb::new([x, 0.0, 0.0], [x * 1.0001, 1.0, 1.0])
            })
            .collect();
        let tree = Celltree::from_cell_bounds(&boxes);
        assert!(tree.num_nodes() <= boxes.len(), "{} nodes", tree.num_nodes());
        assert_eq!(tree.check(), Ok(()));
        assert!(tree.validate(|c| boxes[c]).is_valid());

        for (idx, b) in boxes.iter().enumerate() {
            let p = [b.center(0), 0.5, 0.5];
            let mut found = Vec::new();
            tree.traverse(&mut PointVisitor::new(p), |c| {
                if boxes[c].contains_point(&p) {
                    found.push(c);
                }
                true
            });
            assert_eq!(found, vec![idx]);
        }
    }

    #[test]
    fn empty_input_gives_single_empty_leaf() {
        let tree = Celltree::<f32, 3>::from_cell_bounds(&[]);
        assert_eq!(tree.num_nodes(), 1);
        assert!(tree.is_empty());
        assert_eq!(tree.check(), Ok(()));
        let mut calls = 0;
        tree.traverse(&mut PointVisitor::new([0.0; 3]), |_| {
            calls += 1;
            true
        });
        assert_eq!(calls, 0);
    }

    #[test]
    fn segment_traversal_is_complete() {
        let cubes = lattice(4);
        let tree = Celltree::from_cell_bounds(&cubes);
        let p0 = [0.5_f32, 0.5, 0.5];
        let p1 = [3.5_f32, 0.5, 0.5];
        let mut hits = Vec::new();
        tree.traverse(&mut SegmentVisitor::new(p0, p1), |c| {
            hits.push(c);
            true
        });
        // Every cube on the row j = k = 0 must have been reached.
        for i in 0..4 {
            assert!(hits.contains(&(i * 16)), "missing cube {}", i * 16);
        }
    }

    #[test]
    fn config_clamps_degenerate_values() {
        let cfg = BuildConfig::default()
            .with_max_leaf_size(0)
            .with_num_buckets(1);
        assert_eq!(cfg.max_leaf_size, 2);
        assert_eq!(cfg.num_buckets, 2);
        let boxes = random_boxes(64, 3);
        let tree = Celltree::build(
            &boxes,
            boxes.iter().fold(Aabb::inverted(), |a, b| a.union(b)),
            &cfg,
        );
        assert_eq!(tree.check(), Ok(()));
        assert!(tree.validate(|c| boxes[c]).is_valid());
    }
}

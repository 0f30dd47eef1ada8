// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for unit tests.

use glam::{Affine3A, Mat3, Vec3};
use rand::Rng;
use rand::rngs::StdRng;

/// Corners of the unit cube in hexahedron order.
pub(crate) fn unit_cube() -> [Vec3; 8] {
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
}

/// Corners of the reference tetrahedron.
pub(crate) fn unit_tetrahedron() -> [Vec3; 4] {
    [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z]
}

/// Corners of a pyramid over the unit square with its apex above the square's center.
pub(crate) fn unit_pyramid() -> [Vec3; 5] {
    [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.5, 0.5, 1.0),
    ]
}

/// Corners of a right prism over the reference triangle.
pub(crate) fn unit_prism() -> [Vec3; 6] {
    [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(0.0, 1.0, 1.0),
    ]
}

/// A random orientation-preserving affine map that does not distort too much.
pub(crate) fn random_affine(rng: &mut StdRng) -> Affine3A {
    loop {
        let mut m = Mat3::IDENTITY;
        for c in 0..3 {
            for r in 0..3 {
                m.col_mut(c)[r] += rng.gen_range(-0.3..0.3);
            }
        }
        if m.determinant() > 0.3 {
            let t = Vec3::new(
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-5.0..5.0),
            );
            return Affine3A::from_mat3_translation(m, t);
        }
    }
}

/// A random point strictly inside the convex hull of `corners`.
pub(crate) fn random_convex_combination(rng: &mut StdRng, corners: &[Vec3]) -> Vec3 {
    let weights: Vec<f32> = corners.iter().map(|_| rng.gen_range(0.05..1.0)).collect();
    let total: f32 = weights.iter().sum();
    corners
        .iter()
        .zip(&weights)
        .map(|(&c, &w)| c * (w / total))
        .sum()
}

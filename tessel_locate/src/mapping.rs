// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inverse isoparametric maps for quadrilaterals and hexahedra.
//!
//! Both solvers run a fixed number of Gauss-Newton steps in double precision
//! from the parametric center and clamp the estimate into the unit square or
//! cube after every step. They are best effort: a singular Jacobian ends the
//! iteration with the current estimate.

use glam::{DMat2, DMat3, DVec2, DVec3, Vec2, Vec3};

const ITERATIONS: usize = 5;
const TRILINEAR_TOLERANCE: f64 = 1e-10;
const BILINEAR_TOLERANCE: f64 = 1e-6;
const SINGULAR: f64 = 1e-30;

/// Trilinear shape function weights at parametric coordinates `(s, t, w)`.
///
/// Corner order is `(0,0,0) (1,0,0) (1,1,0) (0,1,0) (0,0,1) (1,0,1) (1,1,1) (0,1,1)`.
pub fn trilinear_weights(s: f64, t: f64, w: f64) -> [f64; 8] {
    [
        (1.0 - s) * (1.0 - t) * (1.0 - w),
        s * (1.0 - t) * (1.0 - w),
        s * t * (1.0 - w),
        (1.0 - s) * t * (1.0 - w),
        (1.0 - s) * (1.0 - t) * w,
        s * (1.0 - t) * w,
        s * t * w,
        (1.0 - s) * t * w,
    ]
}

/// Bilinear shape function weights at parametric coordinates `(s, t)`.
///
/// Corner order is `(0,0) (1,0) (1,1) (0,1)`.
pub fn bilinear_weights(s: f64, t: f64) -> [f64; 4] {
    [(1.0 - s) * (1.0 - t), s * (1.0 - t), s * t, (1.0 - s) * t]
}

/// Parametric coordinates of `point` in the hexahedron `corners`.
pub fn inverse_trilinear(point: Vec3, corners: &[Vec3; 8]) -> Vec3 {
    let p = corners.map(|c| c.as_dvec3());
    let target = point.as_dvec3();
    let mut ss = DVec3::splat(0.5);

    for _ in 0..ITERATIONS {
        let (s, t, w) = (ss.x, ss.y, ss.z);
        let res = trilinear_weights(s, t, w)
            .iter()
            .zip(&p)
            .map(|(&n, &c)| c * n)
            .sum::<DVec3>()
            - target;
        if res.length_squared() < TRILINEAR_TOLERANCE * TRILINEAR_TOLERANCE {
            break;
        }

        let js = (p[1] - p[0]) * ((1.0 - t) * (1.0 - w))
            + (p[2] - p[3]) * (t * (1.0 - w))
            + (p[5] - p[4]) * ((1.0 - t) * w)
            + (p[6] - p[7]) * (t * w);
        let jt = (p[3] - p[0]) * ((1.0 - s) * (1.0 - w))
            + (p[2] - p[1]) * (s * (1.0 - w))
            + (p[7] - p[4]) * ((1.0 - s) * w)
            + (p[6] - p[5]) * (s * w);
        let jw = (p[4] - p[0]) * ((1.0 - s) * (1.0 - t))
            + (p[5] - p[1]) * (s * (1.0 - t))
            + (p[6] - p[2]) * (s * t)
            + (p[7] - p[3]) * ((1.0 - s) * t);
        let j = DMat3::from_cols(js, jt, jw);
        let jtj = j.transpose() * j;
        if jtj.determinant().abs() < SINGULAR {
            log::trace!("singular Jacobian in inverse trilinear map at {ss}");
            break;
        }
        ss -= jtj.inverse() * (j.transpose() * res);
        ss = ss.clamp(DVec3::ZERO, DVec3::ONE);
    }

    ss.as_vec3()
}

/// Parametric coordinates of `point` in the (possibly non-planar) quadrilateral `corners`.
pub fn inverse_bilinear(point: Vec3, corners: &[Vec3; 4]) -> Vec2 {
    let p = corners.map(|c| c.as_dvec3());
    let target = point.as_dvec3();
    let mut ss = DVec2::splat(0.5);

    for _ in 0..ITERATIONS {
        let (s, t) = (ss.x, ss.y);
        let res = bilinear_weights(s, t)
            .iter()
            .zip(&p)
            .map(|(&n, &c)| c * n)
            .sum::<DVec3>()
            - target;
        if res.length_squared() < BILINEAR_TOLERANCE * BILINEAR_TOLERANCE {
            break;
        }

        let js = (p[1] - p[0]) * (1.0 - t) + (p[2] - p[3]) * t;
        let jt = (p[3] - p[0]) * (1.0 - s) + (p[2] - p[1]) * s;
        let jtj = DMat2::from_cols(
            DVec2::new(js.dot(js), js.dot(jt)),
            DVec2::new(js.dot(jt), jt.dot(jt)),
        );
        if jtj.determinant().abs() < SINGULAR {
            log::trace!("singular Jacobian in inverse bilinear map at {ss}");
            break;
        }
        ss -= jtj.inverse() * DVec2::new(js.dot(res), jt.dot(res));
        ss = ss.clamp(DVec2::ZERO, DVec2::ONE);
    }

    ss.as_vec2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{random_affine, unit_cube};
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn forward(corners: &[Vec3; 8], ss: Vec3) -> Vec3 {
        let n = trilinear_weights(f64::from(ss.x), f64::from(ss.y), f64::from(ss.z));
        corners
            .iter()
            .zip(n)
            .map(|(&c, w)| c.as_dvec3() * w)
            .sum::<DVec3>()
            .as_vec3()
    }

    #[test]
    fn unit_cube_is_identity() {
        let cube = unit_cube();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let p = Vec3::new(rng.r#gen(), rng.r#gen(), rng.r#gen());
            let ss = inverse_trilinear(p, &cube);
            assert_abs_diff_eq!(ss.x, p.x, epsilon = 1e-6);
            assert_abs_diff_eq!(ss.y, p.y, epsilon = 1e-6);
            assert_abs_diff_eq!(ss.z, p.z, epsilon = 1e-6);
        }
    }

    #[test]
    fn recovers_parameters_in_distorted_hexahedra() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..100 {
            let map = random_affine(&mut rng);
            let mut hex = unit_cube().map(|c| map.transform_point3(c));
            // Pull one corner inwards so the map is no longer affine.
            hex[6] -= (hex[6] - hex[0]) * 0.1;
            let ss = Vec3::new(
                rng.gen_range(0.1..0.9),
                rng.gen_range(0.1..0.9),
                rng.gen_range(0.1..0.9),
            );
            let found = inverse_trilinear(forward(&hex, ss), &hex);
            assert_abs_diff_eq!(found.x, ss.x, epsilon = 1e-3);
            assert_abs_diff_eq!(found.y, ss.y, epsilon = 1e-3);
            assert_abs_diff_eq!(found.z, ss.z, epsilon = 1e-3);
        }
    }

    #[test]
    fn outside_points_are_clamped() {
        let ss = inverse_trilinear(Vec3::new(2.0, -1.0, 0.5), &unit_cube());
        assert_abs_diff_eq!(ss.x, 1.0);
        assert_abs_diff_eq!(ss.y, 0.0);
        assert_abs_diff_eq!(ss.z, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn bilinear_on_skewed_quad() {
        let quad = [
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(2.0, 0.0, 1.0),
            Vec3::new(2.5, 1.0, 1.0),
            Vec3::new(0.5, 1.0, 1.0),
        ];
        // A parallelogram, so the bilinear map is affine.
        let p = Vec3::new(1.25 + 0.5 * 0.5, 0.5, 1.0);
        let ss = inverse_bilinear(p, &quad);
        assert_abs_diff_eq!(ss.x, 0.625, epsilon = 1e-5);
        assert_abs_diff_eq!(ss.y, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn degenerate_quad_stops_at_center() {
        let quad = [Vec3::ONE; 4];
        assert_eq!(inverse_bilinear(Vec3::ZERO, &quad), Vec2::splat(0.5));
    }
}

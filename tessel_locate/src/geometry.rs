// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry kernel: face normals, point-in-polygon and point-in-cell tests.
//!
//! Polygon tests work in the plane obtained by dropping the coordinate axis
//! most aligned with the polygon normal. Projected coordinates are handled as
//! Kurbo vectors in `f64`, relative to the query point.

use glam::Vec3;
use kurbo::Vec2;

/// Below this, a face normal is treated as perpendicular to a ray.
pub const PARALLEL_EPSILON: f32 = 1e-7;

/// Edge-side products smaller than this, relative to the edge length times the
/// distance to its farther endpoint, do not fix the orientation of a convex polygon.
const CONVEX_SIDE_EPSILON: f64 = 1e-5;

/// The faces of one cell as corner coordinate lists.
///
/// Corners of all faces share one buffer, so a `FaceSet` can be cleared and
/// refilled for many cells without reallocating.
#[derive(Clone, Debug, Default)]
pub struct FaceSet {
    corners: Vec<Vec3>,
    ends: Vec<usize>,
}

impl FaceSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all faces, keeping the allocation.
    pub fn clear(&mut self) {
        self.corners.clear();
        self.ends.clear();
    }

    /// Append a face.
    pub fn push_face<I: IntoIterator<Item = Vec3>>(&mut self, corners: I) {
        self.corners.extend(corners);
        self.ends.push(self.corners.len());
    }

    /// Number of faces.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Whether there are no faces.
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Iterate over the corner lists of all faces.
    pub fn iter(&self) -> impl Iterator<Item = &[Vec3]> + '_ {
        self.ends.iter().scan(0, |start, &end| {
            let face = &self.corners[*start..end];
            *start = end;
            Some(face)
        })
    }
}

/// Unit normal and vertex centroid of a planar or nearly planar polygon.
///
/// The normal follows the right-hand rule over the corner order and is
/// computed with Newell's method. It is zero for fewer than three corners or
/// a degenerate polygon.
pub fn face_normal_and_center(corners: &[Vec3]) -> (Vec3, Vec3) {
    let Some(&last) = corners.last() else {
        return (Vec3::ZERO, Vec3::ZERO);
    };
    #[allow(clippy::cast_precision_loss, reason = "faces have few corners")]
    let center = corners.iter().sum::<Vec3>() / corners.len() as f32;
    if corners.len() < 3 {
        return (Vec3::ZERO, center);
    }
    let mut normal = Vec3::ZERO;
    let mut prev = last;
    for &c in corners {
        normal += prev.cross(c);
        prev = c;
    }
    (normal.normalize_or_zero(), center)
}

/// Maps points into the plane perpendicular to the dominant normal axis,
/// relative to an origin.
#[derive(Clone, Copy, Debug)]
struct Projection {
    u: usize,
    v: usize,
    origin: Vec3,
}

impl Projection {
    fn dropping_axis_of(normal: Vec3, origin: Vec3) -> Self {
        let a = normal.abs();
        let (u, v) = if a.x >= a.y && a.x >= a.z {
            (1, 2)
        } else if a.y >= a.z {
            (0, 2)
        } else {
            (0, 1)
        };
        Self { u, v, origin }
    }

    fn apply(&self, p: Vec3) -> Vec2 {
        let d = p - self.origin;
        Vec2::new(f64::from(d[self.u]), f64::from(d[self.v]))
    }
}

/// Number of polygon edges crossing the positive x semi-axis.
///
/// An edge counts if its endpoints lie on different sides of the x axis
/// (half-open in y) and it meets the axis at `x > 0`.
fn crossings(corners: &[Vec2]) -> usize {
    let mut count = 0;
    let mut a = match corners.last() {
        Some(&a) => a,
        None => return 0,
    };
    for &b in corners {
        if (a.y > 0.0) != (b.y > 0.0) {
            let x = a.x - a.y * (b.x - a.x) / (b.y - a.y);
            if x > 0.0 {
                count += 1;
            }
        }
        a = b;
    }
    count
}

/// Whether `point` lies inside the polygon `corners` with normal `normal`.
///
/// The point is assumed to lie in the polygon's plane; only its projection is tested.
/// Works for non-convex polygons.
pub fn inside_polygon(point: Vec3, corners: &[Vec3], normal: Vec3) -> bool {
    if corners.len() <= 4 {
        let proj = Projection::dropping_axis_of(normal, point);
        let mut buf = [Vec2::ZERO; 4];
        for (slot, &c) in buf.iter_mut().zip(corners) {
            *slot = proj.apply(c);
        }
        crossings(&buf[..corners.len()]) % 2 == 1
    } else {
        inside_polygon_general(point, corners, normal)
    }
}

pub(crate) fn inside_polygon_general(point: Vec3, corners: &[Vec3], normal: Vec3) -> bool {
    let proj = Projection::dropping_axis_of(normal, point);
    let projected: Vec<Vec2> = corners.iter().map(|&c| proj.apply(c)).collect();
    crossings(&projected) % 2 == 1
}

/// Whether `point` lies inside the convex polygon `corners` with normal `normal`.
///
/// Every edge must see the point on the same side. Agrees with
/// [`inside_polygon`] for convex polygons, up to points on the boundary.
pub fn inside_convex_polygon(point: Vec3, corners: &[Vec3], normal: Vec3) -> bool {
    let n = corners.len();
    if n < 3 {
        return false;
    }
    let proj = Projection::dropping_axis_of(normal, point);
    let mut sign = 0.0;
    for i in 0..n {
        let a = proj.apply(corners[i]);
        let b = proj.apply(corners[(i + 1) % n]);
        let side = (b - a).cross(a);
        if sign == 0.0 {
            let scale = (b - a).hypot() * a.hypot().max(b.hypot());
            if side.abs() > CONVEX_SIDE_EPSILON * scale {
                sign = side;
            }
        } else if side * sign < 0.0 {
            return false;
        }
    }
    true
}

/// Which side of the line through `p0` and `p1` the origin is on, in the xy plane.
fn origin_side_z(p0: Vec3, p1: Vec3) -> f64 {
    let (x0, y0) = (f64::from(p0.x), f64::from(p0.y));
    let (x1, y1) = (f64::from(p1.x), f64::from(p1.y));
    x0 * (y1 - y0) - y0 * (x1 - x0)
}

/// Whether the z axis passes through the polygon, by winding number in the xy plane.
///
/// `corners` must already be translated so that the query point is the origin.
pub fn origin_inside_polygon_z(corners: &[Vec3]) -> bool {
    let Some(&last) = corners.last() else {
        return false;
    };
    let mut winding = 0_i32;
    let mut a = last;
    for &b in corners {
        if a.y <= 0.0 {
            if b.y > 0.0 && origin_side_z(a, b) > 0.0 {
                winding += 1;
            }
        } else if b.y <= 0.0 && origin_side_z(a, b) < 0.0 {
            winding -= 1;
        }
        a = b;
    }
    winding != 0
}

/// Whether `point` lies inside a convex cell: on the inner side of every face plane.
///
/// Faces must wind so that their normals point outwards. `tolerance` is the
/// largest accepted distance outside a face plane.
pub fn point_in_convex_cell(point: Vec3, faces: &FaceSet, tolerance: f32) -> bool {
    faces.iter().all(|face| {
        let (normal, center) = face_normal_and_center(face);
        normal.dot(point - center) <= tolerance
    })
}

/// Whether every corner of every face lies on the inner side of every face plane.
///
/// Non-planar faces whose own corners stray more than `tolerance` from the
/// face plane make the cell count as non-convex.
pub fn cell_is_convex(faces: &FaceSet, tolerance: f32) -> bool {
    faces.iter().all(|face| {
        let (normal, center) = face_normal_and_center(face);
        normal != Vec3::ZERO
            && faces
                .iter()
                .flatten()
                .all(|&c| normal.dot(c - center) <= tolerance)
    })
}

/// Whether `point` lies inside an arbitrary closed cell.
///
/// Casts a ray from the point along +z and counts the faces it crosses; an odd
/// count means inside. Faces nearly parallel to the ray are skipped.
pub fn point_in_general_cell(point: Vec3, faces: &FaceSet) -> bool {
    let mut local = Vec::with_capacity(8);
    let mut count = 0_usize;
    for face in faces.iter() {
        if face.is_empty() {
            continue;
        }
        local.clear();
        local.extend(face.iter().map(|&c| c - point));
        let (min, max) = local
            .iter()
            .fold((Vec3::MAX, Vec3::MIN), |(lo, hi), &c| (lo.min(c), hi.max(c)));

        // Entirely below the point, or the ray misses the bounding rectangle.
        if max.z < 0.0 || max.x < 0.0 || min.x > 0.0 || max.y < 0.0 || min.y > 0.0 {
            continue;
        }
        if !origin_inside_polygon_z(&local) {
            continue;
        }
        if min.z > 0.0 {
            count += 1;
            continue;
        }
        let (normal, center) = face_normal_and_center(&local);
        let ndz = normal.z;
        if ndz.abs() < PARALLEL_EPSILON {
            continue;
        }
        if normal.dot(center) / ndz > 0.0 {
            count += 1;
        }
    }
    count % 2 == 1
}

/// Distance from `point` along `dir` to the nearest face the ray leaves through.
///
/// `dir` need not be normalized. Returns `None` if no face is hit at a
/// non-negative distance.
pub fn exit_distance(point: Vec3, dir: Vec3, faces: &FaceSet) -> Option<f32> {
    let dir = dir.normalize_or_zero();
    if dir == Vec3::ZERO {
        return None;
    }
    let mut best: Option<f32> = None;
    for face in faces.iter() {
        let (normal, center) = face_normal_and_center(face);
        let cosa = normal.dot(dir);
        if cosa.abs() <= PARALLEL_EPSILON {
            continue;
        }
        let t = normal.dot(center - point) / cosa;
        if t < 0.0 {
            continue;
        }
        if inside_polygon(point + t * dir, face, normal) && best.is_none_or(|b| t < b) {
            best = Some(t);
        }
    }
    best
}

/// Point where the segment from `p0` to `p1` crosses the plane through `origin` with normal `normal`.
///
/// Returns `None` if both endpoints lie strictly on the same side or the
/// segment lies in the plane.
pub fn segment_plane_intersection(p0: Vec3, p1: Vec3, origin: Vec3, normal: Vec3) -> Option<Vec3> {
    let d0 = normal.dot(p0 - origin);
    let d1 = normal.dot(p1 - origin);
    if d0 * d1 > 0.0 {
        return None;
    }
    let denom = d0 - d1;
    if denom.abs() <= PARALLEL_EPSILON {
        return None;
    }
    Some(p0 + (p1 - p0) * (d0 / denom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::CellShape;
    use crate::test_util::{random_affine, unit_cube};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn faces_of(shape: CellShape, corners: &[Vec3]) -> FaceSet {
        let mut faces = FaceSet::new();
        for face in shape.faces() {
            faces.push_face(face.iter().map(|&i| corners[i]));
        }
        faces
    }

    #[test]
    fn newell_normal_of_unit_square() {
        let square = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let (n, c) = face_normal_and_center(&square);
        assert_eq!(n, Vec3::Z);
        assert_eq!(c, Vec3::new(0.5, 0.5, 0.0));
        let (n, _) = face_normal_and_center(&square[..2]);
        assert_eq!(n, Vec3::ZERO);
    }

    #[test]
    fn catalog_faces_point_outwards() {
        let cube = unit_cube();
        let faces = faces_of(CellShape::Hexahedron, &cube);
        let centroid = Vec3::splat(0.5);
        for face in faces.iter() {
            let (n, c) = face_normal_and_center(face);
            assert!(n.dot(c - centroid) > 0.0);
        }
    }

    #[test]
    fn non_convex_polygon() {
        // An L shape in the plane z = 2.
        let l = [
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(2.0, 0.0, 2.0),
            Vec3::new(2.0, 1.0, 2.0),
            Vec3::new(1.0, 1.0, 2.0),
            Vec3::new(1.0, 2.0, 2.0),
            Vec3::new(0.0, 2.0, 2.0),
        ];
        let n = face_normal_and_center(&l).0;
        assert!(inside_polygon(Vec3::new(0.5, 1.5, 2.0), &l, n));
        assert!(inside_polygon(Vec3::new(1.5, 0.5, 2.0), &l, n));
        assert!(!inside_polygon(Vec3::new(1.5, 1.5, 2.0), &l, n));
        assert!(!inside_convex_polygon(Vec3::new(1.5, 1.5, 2.0), &l[..4], n));
    }

    #[test]
    fn small_polygon_path_matches_general_path() {
        let mut rng = StdRng::seed_from_u64(11);
        let quad = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.2, 0.1),
            Vec3::new(1.2, 1.1, 0.3),
            Vec3::new(-0.1, 0.9, 0.2),
        ];
        let n = face_normal_and_center(&quad).0;
        for _ in 0..500 {
            let p = Vec3::new(rng.gen_range(-0.5..1.5), rng.gen_range(-0.5..1.5), 0.15);
            assert_eq!(
                inside_polygon(p, &quad, n),
                inside_polygon_general(p, &quad, n)
            );
            assert_eq!(
                inside_polygon(p, &quad[..3], n),
                inside_polygon_general(p, &quad[..3], n)
            );
        }
    }

    #[test]
    fn convex_and_general_polygon_tests_agree() {
        let mut rng = StdRng::seed_from_u64(5);
        for scale in [1.0_f32, 1e-3, 1e-5, 1e3] {
            let hexagon: Vec<Vec3> = (0..6_u8)
                .map(|i| {
                    let a = f32::from(i) * core::f32::consts::TAU / 6.0;
                    Vec3::new(a.cos(), a.sin(), 0.0) * scale
                })
                .collect();
            let n = face_normal_and_center(&hexagon).0;
            for _ in 0..500 {
                let p = Vec3::new(rng.gen_range(-1.2..1.2), rng.gen_range(-1.2..1.2), 0.0) * scale;
                // Skip points on or very near an edge.
                let near_edge = (0..6).any(|i| {
                    let a = hexagon[i];
                    let b = hexagon[(i + 1) % 6];
                    let d = (b - a).normalize();
                    let off = p - a;
                    (off - d * off.dot(d)).length() < 1e-3 * scale
                });
                if near_edge {
                    continue;
                }
                assert_eq!(
                    inside_polygon(p, &hexagon, n),
                    inside_convex_polygon(p, &hexagon, n),
                    "{p} at scale {scale}"
                );
            }
        }
    }

    #[test]
    fn small_convex_polygons_reject_outside_points() {
        let tri = [Vec3::ZERO, Vec3::X * 1e-3, Vec3::Y * 1e-3];
        let outside = Vec3::new(2e-3, 2e-3, 0.0);
        let inside = Vec3::new(2e-4, 2e-4, 0.0);
        assert!(!inside_polygon(outside, &tri, Vec3::Z));
        assert!(!inside_convex_polygon(outside, &tri, Vec3::Z));
        assert!(inside_polygon(inside, &tri, Vec3::Z));
        assert!(inside_convex_polygon(inside, &tri, Vec3::Z));
    }

    #[test]
    fn unit_cube_inside_tests() {
        let cube = unit_cube();
        let faces = faces_of(CellShape::Hexahedron, &cube);
        let center = Vec3::splat(0.5);
        assert!(point_in_general_cell(center, &faces));
        assert!(point_in_convex_cell(center, &faces, 1e-6));
        let outside = Vec3::new(1.5, 0.5, 0.5);
        assert!(!point_in_general_cell(outside, &faces));
        assert!(!point_in_convex_cell(outside, &faces, 1e-6));
        let above = Vec3::new(0.5, 0.5, 2.0);
        assert!(!point_in_general_cell(above, &faces));
    }

    #[test]
    fn convex_and_general_cell_tests_agree() {
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..200 {
            let map = random_affine(&mut rng);
            let hex = unit_cube().map(|c| map.transform_point3(c));
            let faces = faces_of(CellShape::Hexahedron, &hex);
            for _ in 0..20 {
                let p = Vec3::new(
                    rng.gen_range(-0.3..1.3),
                    rng.gen_range(-0.3..1.3),
                    rng.gen_range(-0.3..1.3),
                );
                // Points on a face are ambiguous.
                let near_face = faces.iter().any(|f| {
                    let (n, c) = face_normal_and_center(f);
                    n.dot(p - c).abs() < 1e-3
                });
                if near_face {
                    continue;
                }
                assert_eq!(
                    point_in_convex_cell(p, &faces, 0.0),
                    point_in_general_cell(p, &faces),
                    "{p} in {hex:?}"
                );
            }
        }
    }

    #[test]
    fn convexity_of_hexahedra() {
        let mut cube = unit_cube();
        assert!(cell_is_convex(&faces_of(CellShape::Hexahedron, &cube), 1e-5));
        // Sink one top corner so that the top face folds inwards.
        cube[6].z = 0.5;
        assert!(!cell_is_convex(&faces_of(CellShape::Hexahedron, &cube), 1e-5));
    }

    #[test]
    fn exit_distance_from_cube_center() {
        let cube = unit_cube();
        let faces = faces_of(CellShape::Hexahedron, &cube);
        let c = Vec3::splat(0.5);
        let d = exit_distance(c, Vec3::X, &faces).unwrap();
        assert!((d - 0.5).abs() < 1e-6);
        let slanted = exit_distance(c, Vec3::new(1.0, 0.5, 0.0), &faces).unwrap();
        assert!((slanted - 0.5 * 1.25_f32.sqrt()).abs() < 1e-5);
        assert_eq!(exit_distance(c, Vec3::ZERO, &faces), None);
    }

    #[test]
    fn segment_crosses_plane() {
        let hit = segment_plane_intersection(
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::ZERO,
            Vec3::Z,
        );
        assert_eq!(hit, Some(Vec3::ZERO));
        assert_eq!(
            segment_plane_intersection(Vec3::ONE, Vec3::splat(2.0), Vec3::ZERO, Vec3::Z),
            None
        );
    }
}

// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interpolation weights within a cell.
//!
//! An [`Interpolator`] is a sparse list of `(vertex or cell index, weight)`
//! pairs. Applying it to a field evaluates the weighted sum at the query point.

use core::ops::{Add, Mul};

use glam::{DMat3, Vec3};

use crate::geometry::{face_normal_and_center, inside_convex_polygon};
use crate::mapping::{bilinear_weights, inverse_bilinear, inverse_trilinear, trilinear_weights};
use crate::shape::CellShape;

/// Where field values live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mapping {
    /// One value per vertex.
    #[default]
    Vertex,
    /// One value per cell.
    Element,
}

/// How vertex values are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InterpolationMode {
    /// Value at the cell's first corner.
    First,
    /// Value at the corner closest to the point.
    Nearest,
    /// Unweighted mean over the cell's vertices.
    Mean,
    /// Shape-function interpolation.
    #[default]
    Linear,
}

/// Weighted indices into a field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interpolator {
    indices: Vec<usize>,
    weights: Vec<f32>,
}

impl Interpolator {
    /// Pair up `indices` and `weights`, summing the weights of repeated indices.
    ///
    /// The first occurrence of an index determines its position.
    pub fn new(
        indices: impl IntoIterator<Item = usize>,
        weights: impl IntoIterator<Item = f32>,
    ) -> Self {
        let mut out = Self::default();
        for (i, w) in indices.into_iter().zip(weights) {
            match out.indices.iter().position(|&j| j == i) {
                Some(k) => out.weights[k] += w,
                None => {
                    out.indices.push(i);
                    out.weights.push(w);
                }
            }
        }
        out
    }

    /// Weight 1 at a single index.
    pub fn single(index: usize) -> Self {
        Self {
            indices: vec![index],
            weights: vec![1.0],
        }
    }

    /// Indices into the field.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Weights, parallel to [`Interpolator::indices`].
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Number of weighted entries.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Sum of all weights.
    pub fn weight_sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Weighted sum of `field` over the stored indices.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range for `field`.
    pub fn apply<T>(&self, field: &[T]) -> T
    where
        T: Copy + Default + Add<Output = T> + Mul<f32, Output = T>,
    {
        self.indices
            .iter()
            .zip(&self.weights)
            .fold(T::default(), |acc, (&i, &w)| acc + field[i] * w)
    }
}

#[allow(clippy::cast_possible_truncation, reason = "weights are stored in f32")]
fn narrow<const N: usize>(w: [f64; N]) -> [f32; N] {
    w.map(|x| x as f32)
}

fn one_hot<const N: usize>(k: usize) -> [f32; N] {
    let mut w = [0.0; N];
    w[k] = 1.0;
    w
}

/// Index of the corner nearest to `point`.
pub fn nearest_corner(point: Vec3, corners: &[Vec3]) -> usize {
    corners
        .iter()
        .enumerate()
        .fold((0, f32::MAX), |(best, dist), (i, &c)| {
            let d = c.distance_squared(point);
            if d < dist { (i, d) } else { (best, dist) }
        })
        .0
}

/// Barycentric weights in a tetrahedron.
///
/// A flat tetrahedron puts all weight on the nearest corner.
pub fn tetrahedron_weights(point: Vec3, corners: &[Vec3; 4]) -> [f32; 4] {
    let c = corners.map(|c| c.as_dvec3());
    let t = DMat3::from_cols(c[0] - c[3], c[1] - c[3], c[2] - c[3]);
    if t.determinant().abs() < 1e-300 {
        return one_hot(nearest_corner(point, corners));
    }
    let w = t.inverse() * (point.as_dvec3() - c[3]);
    narrow([w.x, w.y, w.z, 1.0 - w.x - w.y - w.z])
}

/// Barycentric weights in a triangle embedded in 3D.
pub fn triangle_weights(point: Vec3, corners: &[Vec3; 3]) -> [f32; 3] {
    let [a, b, c] = corners.map(|c| c.as_dvec3());
    let p = point.as_dvec3();
    let n = (b - a).cross(c - a);
    let nn = n.length_squared();
    if nn < 1e-300 {
        return one_hot(nearest_corner(point, corners));
    }
    let wa = n.dot((c - b).cross(p - b)) / nn;
    let wb = n.dot((a - c).cross(p - c)) / nn;
    narrow([wa, wb, 1.0 - wa - wb])
}

/// Bilinear weights in a quadrilateral.
pub fn quad_weights(point: Vec3, corners: &[Vec3; 4]) -> [f32; 4] {
    let ss = inverse_bilinear(point, corners);
    narrow(bilinear_weights(f64::from(ss.x), f64::from(ss.y)))
}

/// Trilinear weights in a hexahedron.
pub fn hexahedron_weights(point: Vec3, corners: &[Vec3; 8]) -> [f32; 8] {
    let ss = inverse_trilinear(point, corners);
    narrow(trilinear_weights(
        f64::from(ss.x),
        f64::from(ss.y),
        f64::from(ss.z),
    ))
}

/// Weights in a prism, treated as a hexahedron with collapsed edges `2-3` and `6-7`.
pub fn prism_weights(point: Vec3, corners: &[Vec3; 6]) -> [f32; 6] {
    let c = corners;
    let hex = [c[0], c[1], c[2], c[2], c[3], c[4], c[5], c[5]];
    let ss = inverse_trilinear(point, &hex);
    let (s, t, w) = (f64::from(ss.x), f64::from(ss.y), f64::from(ss.z));
    narrow([
        (1.0 - s) * (1.0 - t) * (1.0 - w),
        s * (1.0 - t) * (1.0 - w),
        t * (1.0 - w),
        (1.0 - s) * (1.0 - t) * w,
        s * (1.0 - t) * w,
        t * w,
    ])
}

/// Weights in a pyramid: the height above the base gives the apex weight, the
/// projection from the apex onto the base is interpolated bilinearly.
pub fn pyramid_weights(point: Vec3, corners: &[Vec3; 5]) -> [f32; 5] {
    let c = corners.map(|c| c.as_dvec3());
    let p = point.as_dvec3();
    let first = c[1] - c[0];
    let normal = first.cross(c[2] - c[1]) + first.cross(c[3] - c[2]);
    let height = normal.dot(c[4] - c[0]);
    if height.abs() < 1e-300 {
        return one_hot(nearest_corner(point, corners));
    }
    let apex = normal.dot(p - c[0]) / height;
    let rest = 1.0 - apex;
    if rest.abs() < 1e-9 {
        return one_hot(4);
    }
    let projected = ((p - c[4] * apex) / rest).as_vec3();
    let base = [corners[0], corners[1], corners[2], corners[3]];
    let ss = inverse_bilinear(projected, &base);
    let b = bilinear_weights(f64::from(ss.x), f64::from(ss.y));
    narrow([b[0] * rest, b[1] * rest, b[2] * rest, b[3] * rest, apex])
}

/// Weights in a planar polygon by a fan of triangles around the vertex centroid.
///
/// The centroid's share is spread evenly over all corners. Points outside the
/// polygon use the fan triangle they are least outside of.
pub fn polygon_weights(point: Vec3, corners: &[Vec3]) -> Vec<f32> {
    let n = corners.len();
    match n {
        0 => return Vec::new(),
        1 | 2 => {
            let mut w = vec![0.0; n];
            w[nearest_corner(point, corners)] = 1.0;
            return w;
        }
        _ => {}
    }
    let (_, center) = face_normal_and_center(corners);
    let mut best: Option<(f32, usize, [f32; 3])> = None;
    for i in 0..n {
        let tri = [center, corners[i], corners[(i + 1) % n]];
        let b = triangle_weights(point, &tri);
        let worst = b[0].min(b[1]).min(b[2]);
        if best.is_none_or(|(w, _, _)| worst > w) {
            best = Some((worst, i, b));
        }
    }
    let mut w = vec![0.0; n];
    if let Some((_, i, b)) = best {
        #[allow(clippy::cast_precision_loss, reason = "polygons have few corners")]
        let share = b[0] / n as f32;
        for x in &mut w {
            *x = share;
        }
        w[i] += b[1];
        w[(i + 1) % n] += b[2];
    }
    w
}

/// Linear weights for a fixed-size shape or a polygon.
///
/// Returns `None` for polyhedra and if `corners` does not match the shape.
pub fn linear_weights(shape: CellShape, point: Vec3, corners: &[Vec3]) -> Option<Vec<f32>> {
    Some(match shape {
        CellShape::Triangle => triangle_weights(point, corners.try_into().ok()?).to_vec(),
        CellShape::Quad => quad_weights(point, corners.try_into().ok()?).to_vec(),
        CellShape::Polygon => polygon_weights(point, corners),
        CellShape::Tetrahedron => tetrahedron_weights(point, corners.try_into().ok()?).to_vec(),
        CellShape::Pyramid => pyramid_weights(point, corners.try_into().ok()?).to_vec(),
        CellShape::Prism => prism_weights(point, corners.try_into().ok()?).to_vec(),
        CellShape::Hexahedron => hexahedron_weights(point, corners.try_into().ok()?).to_vec(),
        CellShape::None | CellShape::Polyhedron => return None,
    })
}

/// Faces the ray reaches only beyond this many times its length are ignored.
const CENTER_SCALE: f32 = 1e-3;

/// Interpolation in a polyhedron split into pyramids from its vertex centroid.
///
/// The ray from the centroid through `point` selects a face. The result blends
/// the centroid, as the plain mean of all vertices, with the face's own weights
/// at the ray's hit point, in proportion to how far `point` lies between
/// centroid and face. Affine fields are reproduced exactly. If no face is hit,
/// all weight goes to the centroid.
pub fn polyhedron_interpolator<'a, F>(
    point: Vec3,
    faces: impl Iterator<Item = &'a [usize]> + Clone,
    coord: F,
) -> Interpolator
where
    F: Fn(usize) -> Vec3,
{
    let mut verts: Vec<usize> = faces.clone().flatten().copied().collect();
    verts.sort_unstable();
    verts.dedup();
    if verts.is_empty() {
        return Interpolator::default();
    }
    #[allow(clippy::cast_precision_loss, reason = "cells have few vertices")]
    let center = verts.iter().map(|&v| coord(v)).sum::<Vec3>() / verts.len() as f32;
    let dir = point - center;

    let mut scale = 0.0_f32;
    let mut hit: Option<(&[usize], Vec<Vec3>, Vec3)> = None;
    for face in faces {
        let corners: Vec<Vec3> = face.iter().map(|&v| coord(v)).collect();
        let (normal, face_center) = face_normal_and_center(&corners);
        let denom = normal.dot(face_center - center);
        if denom.abs() < f32::EPSILON {
            continue;
        }
        let s = (normal.dot(dir) / denom).min(1.0);
        if s <= CENTER_SCALE {
            continue;
        }
        let isect = center + dir / s;
        if inside_convex_polygon(isect, &corners, normal) {
            scale = s;
            hit = Some((face, corners, isect));
            break;
        }
    }

    let center_weight = 1.0 - scale;
    let mut indices = Vec::with_capacity(verts.len() + 8);
    let mut weights = Vec::with_capacity(verts.len() + 8);

    if center_weight > 0.0 {
        #[allow(clippy::cast_precision_loss, reason = "cells have few vertices")]
        let share = center_weight / verts.len() as f32;
        indices.extend_from_slice(&verts);
        weights.extend(core::iter::repeat_n(share, verts.len()));
    }

    if let Some((face, corners, isect)) = hit {
        let face_weights = match corners.len() {
            3 => triangle_weights(isect, &[corners[0], corners[1], corners[2]]).to_vec(),
            4 => quad_weights(isect, &[corners[0], corners[1], corners[2], corners[3]]).to_vec(),
            _ => polygon_weights(isect, &corners),
        };
        indices.extend_from_slice(face);
        weights.extend(face_weights.iter().map(|w| w * scale));
    }

    Interpolator::new(indices, weights)
}

/// Shape-independent interpolators for [`InterpolationMode::First`],
/// [`InterpolationMode::Nearest`] and [`InterpolationMode::Mean`].
///
/// `vertices` are the cell's distinct vertices, `coord` looks up their positions.
pub fn closed_form<F>(
    mode: InterpolationMode,
    point: Vec3,
    vertices: &[usize],
    coord: F,
) -> Interpolator
where
    F: Fn(usize) -> Vec3,
{
    let Some(&first) = vertices.first() else {
        return Interpolator::default();
    };
    match mode {
        InterpolationMode::First => Interpolator::single(first),
        InterpolationMode::Nearest => {
            let positions: Vec<Vec3> = vertices.iter().map(|&v| coord(v)).collect();
            Interpolator::single(vertices[nearest_corner(point, &positions)])
        }
        InterpolationMode::Mean | InterpolationMode::Linear => {
            #[allow(clippy::cast_precision_loss, reason = "cells have few vertices")]
            let w = 1.0 / vertices.len() as f32;
            Interpolator::new(vertices.iter().copied(), core::iter::repeat(w))
        }
    }
}

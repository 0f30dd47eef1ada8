// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cell shapes, per-cell type bytes and the face tables of fixed-size shapes.
//!
//! Face tables wind every face counter-clockwise when seen from outside the
//! cell, so that the Newell normal of a face points away from the cell interior.

use core::fmt;

bitflags::bitflags! {
    /// Cached per-cell flags stored in the high bits of a [`CellType`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CellFlags: u8 {
        /// The cell is owned by another partition and only present as halo.
        const GHOST  = 0b1000_0000;
        /// The cell is known to be convex.
        const CONVEX = 0b0100_0000;
    }
}

/// Topological kind of a cell.
///
/// Discriminants are the values stored in the low bits of a type byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellShape {
    /// Placeholder without geometry.
    None = 0,
    /// Three-cornered planar cell.
    Triangle = 5,
    /// Planar cell with any number of corners.
    Polygon = 7,
    /// Four-cornered planar cell.
    Quad = 9,
    /// Four-cornered solid.
    Tetrahedron = 10,
    /// Solid bounded by an arbitrary list of polygonal faces.
    Polyhedron = 11,
    /// Eight-cornered solid.
    Hexahedron = 12,
    /// Six-cornered solid with two triangular and three quadrilateral faces.
    Prism = 13,
    /// Five-cornered solid with a quadrilateral base.
    Pyramid = 14,
}

const TRIANGLE_FACES: &[&[usize]] = &[&[0, 1, 2]];
const QUAD_FACES: &[&[usize]] = &[&[0, 1, 2, 3]];
const TETRAHEDRON_FACES: &[&[usize]] = &[&[2, 1, 0], &[0, 1, 3], &[1, 2, 3], &[2, 0, 3]];
const PYRAMID_FACES: &[&[usize]] = &[
    &[3, 2, 1, 0],
    &[0, 1, 4],
    &[1, 2, 4],
    &[2, 3, 4],
    &[3, 0, 4],
];
const PRISM_FACES: &[&[usize]] = &[
    &[2, 1, 0],
    &[3, 4, 5],
    &[0, 1, 4, 3],
    &[1, 2, 5, 4],
    &[2, 0, 3, 5],
];
const HEXAHEDRON_FACES: &[&[usize]] = &[
    &[3, 2, 1, 0],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[7, 6, 2, 3],
    &[1, 2, 6, 5],
    &[4, 7, 3, 0],
];

impl CellShape {
    /// Mask selecting the shape bits of a type byte.
    pub const MASK: u8 = 0x3f;

    /// Number of corners, or `None` for variable-size shapes.
    pub const fn num_vertices(self) -> Option<usize> {
        match self {
            Self::None => Some(0),
            Self::Triangle => Some(3),
            Self::Quad | Self::Tetrahedron => Some(4),
            Self::Pyramid => Some(5),
            Self::Prism => Some(6),
            Self::Hexahedron => Some(8),
            Self::Polygon | Self::Polyhedron => None,
        }
    }

    /// Number of faces, or `None` for polyhedra.
    ///
    /// Planar cells count as a single face.
    pub const fn num_faces(self) -> Option<usize> {
        match self {
            Self::Polyhedron => None,
            Self::Polygon => Some(1),
            _ => Some(self.faces().len()),
        }
    }

    /// Topological dimension.
    pub const fn dimension(self) -> usize {
        match self {
            Self::None => 0,
            Self::Triangle | Self::Quad | Self::Polygon => 2,
            _ => 3,
        }
    }

    /// Whether every cell of this shape is convex regardless of its geometry.
    pub const fn is_always_convex(self) -> bool {
        matches!(self, Self::Triangle | Self::Tetrahedron)
    }

    /// Face table of a fixed-size shape, as indices into the cell's corner list.
    ///
    /// Empty for variable-size shapes and [`CellShape::None`].
    pub const fn faces(self) -> &'static [&'static [usize]] {
        match self {
            Self::Triangle => TRIANGLE_FACES,
            Self::Quad => QUAD_FACES,
            Self::Tetrahedron => TETRAHEDRON_FACES,
            Self::Pyramid => PYRAMID_FACES,
            Self::Prism => PRISM_FACES,
            Self::Hexahedron => HEXAHEDRON_FACES,
            Self::None | Self::Polygon | Self::Polyhedron => &[],
        }
    }
}

/// Error for a type byte whose shape bits name no known shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown cell shape {0}")]
pub struct UnknownShape(pub u8);

impl TryFrom<u8> for CellShape {
    type Error = UnknownShape;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte & Self::MASK {
            0 => Self::None,
            5 => Self::Triangle,
            7 => Self::Polygon,
            9 => Self::Quad,
            10 => Self::Tetrahedron,
            11 => Self::Polyhedron,
            12 => Self::Hexahedron,
            13 => Self::Prism,
            14 => Self::Pyramid,
            other => return Err(UnknownShape(other)),
        })
    }
}

/// A cell's type byte: shape in the low six bits, [`CellFlags`] in the high two.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CellType(u8);

impl CellType {
    /// Type byte for `shape` with no flags set.
    pub const fn new(shape: CellShape) -> Self {
        Self(shape as u8)
    }

    /// Reinterpret a raw type byte, rejecting unknown shapes.
    pub fn from_byte(byte: u8) -> Result<Self, UnknownShape> {
        CellShape::try_from(byte).map(|_| Self(byte))
    }

    /// The raw byte.
    pub const fn byte(self) -> u8 {
        self.0
    }

    /// The cell's shape.
    pub fn shape(self) -> CellShape {
        // Construction only admits known shapes.
        CellShape::try_from(self.0).unwrap_or(CellShape::None)
    }

    /// The cached flags.
    pub const fn flags(self) -> CellFlags {
        CellFlags::from_bits_truncate(self.0)
    }

    /// Copy of this type with `flags` set or cleared.
    #[must_use]
    pub const fn with(self, flags: CellFlags, on: bool) -> Self {
        if on {
            Self(self.0 | flags.bits())
        } else {
            Self(self.0 & !flags.bits())
        }
    }

    /// Whether the ghost flag is set.
    pub const fn is_ghost(self) -> bool {
        self.flags().contains(CellFlags::GHOST)
    }

    /// Whether the convex flag is set or the shape is always convex.
    pub fn is_convex(self) -> bool {
        self.flags().contains(CellFlags::CONVEX) || self.shape().is_always_convex()
    }
}

impl From<CellShape> for CellType {
    fn from(shape: CellShape) -> Self {
        Self::new(shape)
    }
}

impl fmt::Debug for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellType")
            .field("shape", &self.shape())
            .field("flags", &self.flags())
            .finish()
    }
}

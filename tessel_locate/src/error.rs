// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised when a grid is constructed from inconsistent arrays.

use crate::polyhedron::FaceStreamError;
use crate::shape::UnknownShape;

/// Inconsistent grid input detected by a grid's `check`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    /// The coordinate arrays differ in length.
    #[error("coordinate arrays differ in length: x {x}, y {y}, z {z}")]
    CoordinateLength {
        /// Length of the x array.
        x: usize,
        /// Length of the y array.
        y: usize,
        /// Length of the z array.
        z: usize,
    },
    /// The element offset array is empty or does not start at zero.
    #[error("element offsets must start with 0")]
    FirstOffset,
    /// An element offset is smaller than its predecessor.
    #[error("element offsets decrease at element {element}")]
    NonMonotonicOffsets {
        /// The element whose end lies before its start.
        element: usize,
    },
    /// The final element offset does not match the corner count.
    #[error("last element offset {last} does not match {corners} corners")]
    CornerCount {
        /// Final entry of the offset array.
        last: usize,
        /// Length of the corner array.
        corners: usize,
    },
    /// A corner references a vertex that does not exist.
    #[error("corner {corner} references vertex {vertex}, but there are only {vertices} vertices")]
    CornerOutOfRange {
        /// Position in the corner array.
        corner: usize,
        /// The referenced vertex.
        vertex: usize,
        /// Number of vertices.
        vertices: usize,
    },
    /// A per-element array does not have one entry per element.
    #[error("{array} has {len} entries for {elements} elements")]
    PerElementLength {
        /// Which array.
        array: &'static str,
        /// Its length.
        len: usize,
        /// Number of elements.
        elements: usize,
    },
    /// A type byte names no known shape.
    #[error("element {element}: {source}")]
    UnknownShape {
        /// The element.
        element: usize,
        /// The offending byte.
        source: UnknownShape,
    },
    /// A fixed-size element has the wrong number of corners.
    #[error("element {element} has {found} corners, expected {expected}")]
    WrongCornerCount {
        /// The element.
        element: usize,
        /// Corners the shape requires.
        expected: usize,
        /// Corners present.
        found: usize,
    },
    /// A polyhedron's face list is malformed.
    #[error("polyhedron {element}: {source}")]
    FaceStream {
        /// The element.
        element: usize,
        /// What is wrong with its faces.
        source: FaceStreamError,
    },
    /// Structured dimensions do not match the number of vertices.
    #[error("structured dimensions {dims:?} need {expected} vertices, found {found}")]
    StructuredDimensions {
        /// Vertex counts along each axis.
        dims: [usize; 3],
        /// Product of the dimensions.
        expected: usize,
        /// Vertices present.
        found: usize,
    },
    /// Ghost layers leave no owned cells along an axis, or exceed it.
    #[error("ghost layers {before}+{after} do not fit {cells} cells along axis {axis}")]
    GhostLayers {
        /// The axis.
        axis: usize,
        /// Layers at the low end.
        before: usize,
        /// Layers at the high end.
        after: usize,
        /// Cells along the axis.
        cells: usize,
    },
    /// Rectilinear axis coordinates are not strictly increasing.
    #[error("coordinates along axis {axis} do not increase at index {index}")]
    NonIncreasingAxis {
        /// The axis.
        axis: usize,
        /// First index that is not larger than its predecessor.
        index: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn messages_name_the_element_and_keep_the_cause() {
        let err = MeshError::UnknownShape {
            element: 3,
            source: UnknownShape(42),
        };
        assert_eq!(err.to_string(), "element 3: unknown cell shape 42");
        let cause = err.source().map(ToString::to_string);
        assert_eq!(cause.as_deref(), Some("unknown cell shape 42"));

        let err = MeshError::FaceStream {
            element: 7,
            source: FaceStreamError::DegenerateFace { offset: 4, len: 2 },
        };
        assert_eq!(err.to_string(), "polyhedron 7: face at offset 4 has only 2 corners");
        assert!(err.source().is_some());
        assert_eq!(
            FaceStreamError::Truncated { offset: 9 }.to_string(),
            "face at offset 9 is not closed"
        );
    }
}

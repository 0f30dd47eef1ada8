// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Face streams of polyhedral cells.

/// How the faces of a polyhedral cell are laid out in its corner list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PolyhedronEncoding {
    /// Each face is its vertex count followed by its vertices: `[n, v0, .., vn-1, ...]`.
    SizePrefixed,
    /// Each face repeats its first vertex to close it: `[v0, .., vn-1, v0, ...]`.
    #[default]
    StartVertexTerminated,
}

/// Why a face stream could not be split into faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FaceStreamError {
    /// The last face is not closed or runs past the end of the stream.
    #[error("face at offset {offset} is not closed")]
    Truncated {
        /// Offset of the face within the stream.
        offset: usize,
    },
    /// A face has fewer than three corners.
    #[error("face at offset {offset} has only {len} corners")]
    DegenerateFace {
        /// Offset of the face within the stream.
        offset: usize,
        /// Number of corners.
        len: usize,
    },
}

impl PolyhedronEncoding {
    /// Iterate the faces of one polyhedron's corner list.
    ///
    /// Iteration ends early at the first malformed face; use
    /// [`PolyhedronEncoding::check`] to detect that.
    pub fn faces(self, stream: &[usize]) -> Faces<'_> {
        Faces {
            stream,
            pos: 0,
            encoding: self,
        }
    }

    /// Verify that `stream` splits into closed faces of at least three corners.
    ///
    /// Returns the number of faces.
    pub fn check(self, stream: &[usize]) -> Result<usize, FaceStreamError> {
        let mut pos = 0;
        let mut count = 0;
        while pos < stream.len() {
            let (face, next) = self
                .split(stream, pos)
                .ok_or(FaceStreamError::Truncated { offset: pos })?;
            if face.len() < 3 {
                return Err(FaceStreamError::DegenerateFace {
                    offset: pos,
                    len: face.len(),
                });
            }
            count += 1;
            pos = next;
        }
        Ok(count)
    }

    /// Positions in `stream` that hold vertex indices rather than face sizes.
    pub fn vertex_slots(self, stream: &[usize]) -> impl Iterator<Item = usize> + '_ {
        let mut remaining = 0;
        (0..stream.len()).filter(move |&i| match self {
            Self::StartVertexTerminated => true,
            Self::SizePrefixed => {
                if remaining > 0 {
                    remaining -= 1;
                    return true;
                }
                // `i` holds the size of the next face.
                remaining = stream[i];
                false
            }
        })
    }

    /// Sorted, deduplicated vertex indices of one polyhedron.
    pub fn unique_vertices(self, stream: &[usize]) -> Vec<usize> {
        let mut verts: Vec<usize> = self.faces(stream).flatten().copied().collect();
        verts.sort_unstable();
        verts.dedup();
        verts
    }

    /// The face starting at `pos` and the position after it.
    fn split(self, stream: &[usize], pos: usize) -> Option<(&[usize], usize)> {
        match self {
            Self::SizePrefixed => {
                let n = *stream.get(pos)?;
                let end = pos.checked_add(1)?.checked_add(n)?;
                stream.get(pos + 1..end).map(|face| (face, end))
            }
            Self::StartVertexTerminated => {
                let first = *stream.get(pos)?;
                let len = stream[pos + 1..].iter().position(|&v| v == first)? + 1;
                Some((&stream[pos..pos + len], pos + len + 1))
            }
        }
    }
}

/// Iterator over the faces of a polyhedron, see [`PolyhedronEncoding::faces`].
#[derive(Clone, Debug)]
pub struct Faces<'a> {
    stream: &'a [usize],
    pos: usize,
    encoding: PolyhedronEncoding,
}

impl<'a> Iterator for Faces<'a> {
    type Item = &'a [usize];

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.stream.len() {
            return None;
        }
        let Some((face, next)) = self.encoding.split(self.stream, self.pos) else {
            self.pos = self.stream.len();
            return None;
        };
        self.pos = next;
        Some(face)
    }
}

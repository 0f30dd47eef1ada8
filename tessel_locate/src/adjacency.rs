// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vertex-to-cell adjacency and neighbor lookups built on it.

/// For every vertex, the cells that use it, in compressed sparse row form.
///
/// The cells of vertex `v` are `cell_list[vertex_offsets[v]..vertex_offsets[v + 1]]`,
/// sorted ascending and without repeats.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexOwnerList {
    vertex_offsets: Vec<usize>,
    cell_list: Vec<usize>,
}

impl VertexOwnerList {
    /// Build the list from the vertices of each cell in turn.
    ///
    /// A vertex that a cell lists several times is recorded once for that cell.
    ///
    /// # Panics
    ///
    /// Panics if a cell references a vertex `>= num_vertices`.
    pub fn from_cells<I, C>(num_vertices: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = C>,
        I::IntoIter: Clone,
        C: AsRef<[usize]>,
    {
        let cells = cells.into_iter();

        // Count with a marker per vertex so repeats within a cell are skipped.
        let mut last_owner = vec![usize::MAX; num_vertices];
        let mut counts = vec![0_usize; num_vertices + 1];
        for (cell, verts) in cells.clone().enumerate() {
            for &v in verts.as_ref() {
                if last_owner[v] != cell {
                    last_owner[v] = cell;
                    counts[v + 1] += 1;
                }
            }
        }
        for v in 0..num_vertices {
            counts[v + 1] += counts[v];
        }
        let vertex_offsets = counts;

        let mut fill = vertex_offsets.clone();
        let mut cell_list = vec![0; vertex_offsets[num_vertices]];
        last_owner.fill(usize::MAX);
        for (cell, verts) in cells.enumerate() {
            for &v in verts.as_ref() {
                if last_owner[v] != cell {
                    last_owner[v] = cell;
                    cell_list[fill[v]] = cell;
                    fill[v] += 1;
                }
            }
        }

        log::debug!(
            "vertex owner list: {} vertices, {} entries",
            num_vertices,
            cell_list.len()
        );
        Self {
            vertex_offsets,
            cell_list,
        }
    }

    /// Number of vertices covered.
    pub fn num_vertices(&self) -> usize {
        self.vertex_offsets.len().saturating_sub(1)
    }

    /// Offsets into [`VertexOwnerList::cell_list`], one more than there are vertices.
    pub fn vertex_offsets(&self) -> &[usize] {
        &self.vertex_offsets
    }

    /// Concatenated owner cells of all vertices.
    pub fn cell_list(&self) -> &[usize] {
        &self.cell_list
    }

    /// Cells using `vertex`; empty if the vertex is out of range.
    pub fn cells_of(&self, vertex: usize) -> &[usize] {
        match (
            self.vertex_offsets.get(vertex),
            self.vertex_offsets.get(vertex + 1),
        ) {
            (Some(&start), Some(&end)) => &self.cell_list[start..end],
            _ => &[],
        }
    }

    /// Whether every entry names one of `num_elements` cells.
    pub fn check(&self, num_elements: usize) -> bool {
        self.vertex_offsets.windows(2).all(|w| w[0] <= w[1])
            && self.cell_list.iter().all(|&c| c < num_elements)
    }

    /// Cells sharing at least one of `vertices` with `cell`, excluding `cell` itself.
    ///
    /// The result is sorted.
    pub fn neighbors(&self, cell: usize, vertices: &[usize]) -> Vec<usize> {
        let mut out: Vec<usize> = vertices
            .iter()
            .flat_map(|&v| self.cells_of(v))
            .copied()
            .filter(|&c| c != cell)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// The cell other than `cell` that uses all of `v1`, `v2` and `v3`, i.e. the
    /// neighbor across the face through these vertices.
    pub fn face_neighbor(&self, cell: usize, v1: usize, v2: usize, v3: usize) -> Option<usize> {
        let (b, c) = (self.cells_of(v2), self.cells_of(v3));
        self.cells_of(v1)
            .iter()
            .copied()
            .find(|&e| e != cell && b.binary_search(&e).is_ok() && c.binary_search(&e).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two triangles sharing edge 1-2, and a third touching vertex 2 only.
    fn fan() -> VertexOwnerList {
        VertexOwnerList::from_cells(5, [vec![0, 1, 2], vec![1, 3, 2], vec![2, 4, 2]])
    }

    #[test]
    fn csr_contents() {
        let owners = fan();
        assert_eq!(owners.num_vertices(), 5);
        assert_eq!(owners.vertex_offsets(), &[0, 1, 3, 6, 7, 8]);
        assert_eq!(owners.cell_list(), &[0, 0, 1, 0, 1, 2, 1, 2]);
        assert_eq!(owners.cells_of(2), &[0, 1, 2]);
        assert!(owners.cells_of(9).is_empty());
        assert!(owners.check(3));
        assert!(!owners.check(2));
    }

    #[test]
    fn neighbor_queries() {
        let owners = fan();
        assert_eq!(owners.neighbors(0, &[0, 1, 2]), vec![1, 2]);
        assert_eq!(owners.neighbors(2, &[2, 4]), vec![0, 1]);
        assert_eq!(owners.face_neighbor(0, 1, 2, 1), Some(1));
        assert_eq!(owners.face_neighbor(0, 0, 1, 2), None);
    }
}

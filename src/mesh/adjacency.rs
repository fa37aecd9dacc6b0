//! Compressed per-vertex index lists

/// Variable-length index lists stored back to back
///
/// List `i` occupies `indices[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
    offsets: Vec<usize>,
    indices: Vec<usize>,
}

impl Adjacency {
    /// Pack nested lists, preserving the order inside each list
    pub fn from_lists(lists: Vec<Vec<usize>>) -> Self {
        let mut offsets = Vec::with_capacity(lists.len() + 1);
        let mut indices = Vec::with_capacity(lists.iter().map(Vec::len).sum());

        offsets.push(0);
        for list in lists {
            indices.extend(list);
            offsets.push(indices.len());
        }

        Self { offsets, indices }
    }

    /// Number of lists (one per vertex)
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The list for entry `i`; empty if `i` is out of range
    pub fn get(&self, i: usize) -> &[usize] {
        match (self.offsets.get(i), self.offsets.get(i + 1)) {
            (Some(&start), Some(&end)) => &self.indices[start..end],
            _ => &[],
        }
    }

    /// Iterate over all lists in order
    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.offsets
            .windows(2)
            .map(move |w| &self.indices[w[0]..w[1]])
    }

    /// Total number of stored indices
    pub fn total_entries(&self) -> usize {
        self.indices.len()
    }
}

//! Landgrid neighbor relation: which state pairs may appear as one transition.

use std::collections::HashSet;

use geoarg_schema::StateId;

/// Symmetric set of state pairs allowed to neighbor each other.
///
/// Built from the landgrid's adjacency matrix export, where row and column
/// positions are 0-based but cell ids are 1-based.
#[derive(Debug, Clone, Default)]
pub struct StateAdjacency {
    allowed: HashSet<(StateId, StateId)>,
}

impl StateAdjacency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds from a square 0/1 matrix with rows and columns in state order.
    pub fn from_matrix(rows: &[Vec<u8>]) -> Self {
        let mut adjacency = Self::new();
        for (i, row) in rows.iter().enumerate() {
            for (j, &cell) in row.iter().enumerate() {
                if cell != 0 {
                    adjacency.insert(StateId(i as u32 + 1), StateId(j as u32 + 1));
                }
            }
        }
        adjacency
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (StateId, StateId)>,
    {
        let mut adjacency = Self::new();
        for (a, b) in pairs {
            adjacency.insert(a, b);
        }
        adjacency
    }

    /// Records both orientations of the pair.
    pub fn insert(&mut self, a: StateId, b: StateId) {
        self.allowed.insert((a, b));
        self.allowed.insert((b, a));
    }

    /// Staying in place is always allowed.
    pub fn allows(&self, from: StateId, to: StateId) -> bool {
        from == to || self.allowed.contains(&(from, to))
    }

    pub fn pair_count(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

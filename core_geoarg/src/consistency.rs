//! Conflict detection over per-edge state series.
//!
//! Two checks run against a [`SeriesTable`]: same-time conflicts (one edge
//! claiming two states at one time point) and transitions between states the
//! landgrid does not treat as neighbors. Both report per edge and never
//! mutate the table.

use std::collections::HashMap;

use geoarg_schema::{EdgeId, StateId, TransitionViolation, Violation};
use serde::{Deserialize, Serialize};

use crate::adjacency::StateAdjacency;
use crate::series::{SeriesPoint, SeriesTable};

bitflags::bitflags! {
    /// Which audit checks an edge failed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ViolationFlags: u8 {
        const SAME_TIME_CONFLICT = 1 << 0;
        const NON_ADJACENT_TRANSITION = 1 << 1;
    }
}

/// Finds edges whose series carries two or more distinct states at one time
/// point. At most one violation per edge, anchored at the earliest
/// conflicting time; later conflicts on the same edge are covered by the
/// attached full series.
pub fn find_conflicts(table: &SeriesTable) -> HashMap<EdgeId, Violation> {
    let mut conflicts = HashMap::new();
    for edge in table.edges() {
        let Some(points) = table.get(edge) else {
            continue;
        };
        if let Some((time, states)) = first_conflict(points) {
            conflicts.insert(
                edge,
                Violation {
                    edge_id: edge,
                    time,
                    states,
                    entries: table.entries_for(edge),
                },
            );
        }
    }
    conflicts
}

/// Earliest run of equal-time points with more than one entry. Duplicate
/// rows were removed at table construction, so a longer run can only mean
/// distinct states.
fn first_conflict(points: &[SeriesPoint]) -> Option<(f64, Vec<StateId>)> {
    let mut start = 0;
    while start < points.len() {
        let mut end = start + 1;
        while end < points.len() && points[end].time.total_cmp(&points[start].time).is_eq() {
            end += 1;
        }
        if end - start > 1 {
            let states = points[start..end].iter().map(|p| p.state).collect();
            return Some((points[start].time, states));
        }
        start = end;
    }
    None
}

/// Walks each edge's consecutive state changes and flags pairs the landgrid
/// does not allow. Same-state pairs never fault.
pub fn check_transitions(
    table: &SeriesTable,
    adjacency: &StateAdjacency,
) -> HashMap<EdgeId, Vec<TransitionViolation>> {
    let mut faults: HashMap<EdgeId, Vec<TransitionViolation>> = HashMap::new();
    for edge in table.edges() {
        let Some(points) = table.get(edge) else {
            continue;
        };
        for pair in points.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if from.state == to.state || adjacency.allows(from.state, to.state) {
                continue;
            }
            faults.entry(edge).or_default().push(TransitionViolation {
                edge_id: edge,
                time_start: from.time,
                time_end: to.time,
                from_state: from.state,
                to_state: to.state,
            });
        }
    }
    faults
}

/// Combined audit result over one table.
#[derive(Debug, Clone, Default)]
pub struct ConsistencyReport {
    pub conflicts: HashMap<EdgeId, Violation>,
    pub transition_faults: HashMap<EdgeId, Vec<TransitionViolation>>,
}

impl ConsistencyReport {
    pub fn is_conflicted(&self, edge: EdgeId) -> bool {
        self.conflicts.contains_key(&edge)
    }

    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty() && self.transition_faults.is_empty()
    }

    pub fn flags_for(&self, edge: EdgeId) -> ViolationFlags {
        let mut flags = ViolationFlags::empty();
        if self.conflicts.contains_key(&edge) {
            flags |= ViolationFlags::SAME_TIME_CONFLICT;
        }
        if self.transition_faults.contains_key(&edge) {
            flags |= ViolationFlags::NON_ADJACENT_TRANSITION;
        }
        flags
    }

    /// Edges failing any check, ascending, with their flags.
    pub fn flagged_edges(&self) -> Vec<(EdgeId, ViolationFlags)> {
        let mut edges: Vec<EdgeId> = self
            .conflicts
            .keys()
            .chain(self.transition_faults.keys())
            .copied()
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
            .into_iter()
            .map(|edge| (edge, self.flags_for(edge)))
            .collect()
    }
}

/// Runs every applicable check. The transition check only runs when the
/// caller has a neighbor relation for the dataset's landgrid.
pub fn audit(table: &SeriesTable, adjacency: Option<&StateAdjacency>) -> ConsistencyReport {
    let conflicts = find_conflicts(table);
    let transition_faults = adjacency
        .map(|adj| check_transitions(table, adj))
        .unwrap_or_default();

    if !conflicts.is_empty() || !transition_faults.is_empty() {
        tracing::debug!(
            conflicted = conflicts.len(),
            faulted = transition_faults.len(),
            "audit flagged edges"
        );
    }

    ConsistencyReport {
        conflicts,
        transition_faults,
    }
}

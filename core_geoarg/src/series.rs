//! Per-edge views over the raw georeference table.
//!
//! Rows arrive as a flat list of `(edge, state, time)` entries. Every
//! downstream pass wants the same grouped, time-sorted view of that list, so
//! grouping, shape checks, and duplicate removal all happen once, here.

use std::collections::HashMap;

use geoarg_schema::{EdgeId, GeoStateEntry, StateId};

/// Raised when the raw rows are malformed. The whole call fails: a table
/// with broken times cannot be partially trusted.
#[derive(Debug, thiserror::Error)]
pub enum SeriesError {
    #[error("edge {edge} carries negative time {time}")]
    NegativeTime { edge: EdgeId, time: f64 },
    #[error("edge {edge} carries a non-finite time")]
    NonFiniteTime { edge: EdgeId },
}

/// One point of an edge's series after grouping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub time: f64,
    pub state: StateId,
}

/// All entries grouped per edge and sorted by `(time, state)` ascending.
///
/// Exact duplicate `(time, state)` rows are dropped at construction, so
/// ingesting the same table twice yields the same view as ingesting it once.
#[derive(Debug, Clone, Default)]
pub struct SeriesTable {
    series: HashMap<EdgeId, Vec<SeriesPoint>>,
    entry_count: usize,
}

impl SeriesTable {
    /// Groups raw rows into per-edge series. Times must be finite and
    /// non-negative; the first offending row aborts the build.
    pub fn from_entries(entries: &[GeoStateEntry]) -> Result<Self, SeriesError> {
        let mut series: HashMap<EdgeId, Vec<SeriesPoint>> = HashMap::new();
        for entry in entries {
            if !entry.time.is_finite() {
                return Err(SeriesError::NonFiniteTime {
                    edge: entry.edge_id,
                });
            }
            if entry.time < 0.0 {
                return Err(SeriesError::NegativeTime {
                    edge: entry.edge_id,
                    time: entry.time,
                });
            }
            series.entry(entry.edge_id).or_default().push(SeriesPoint {
                time: entry.time,
                state: entry.state_id,
            });
        }

        let mut entry_count = 0;
        for points in series.values_mut() {
            points.sort_unstable_by(|a, b| {
                a.time.total_cmp(&b.time).then(a.state.cmp(&b.state))
            });
            points.dedup_by(|a, b| a.time.total_cmp(&b.time).is_eq() && a.state == b.state);
            entry_count += points.len();
        }

        Ok(Self {
            series,
            entry_count,
        })
    }

    /// Sorted series for one edge, if the table has rows for it.
    pub fn get(&self, edge: EdgeId) -> Option<&[SeriesPoint]> {
        self.series.get(&edge).map(Vec::as_slice)
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.series.keys().copied()
    }

    /// Edge ids ascending, for deterministic report emission.
    pub fn sorted_edges(&self) -> Vec<EdgeId> {
        let mut edges: Vec<EdgeId> = self.series.keys().copied().collect();
        edges.sort_unstable();
        edges
    }

    /// State of the edge's earliest entry, the one closest to the present.
    pub fn earliest_state(&self, edge: EdgeId) -> Option<StateId> {
        self.series
            .get(&edge)
            .and_then(|points| points.first())
            .map(|point| point.state)
    }

    /// Edges whose series begins in `state`: lineages originating there.
    pub fn edges_starting_in(&self, state: StateId) -> Vec<EdgeId> {
        let mut edges: Vec<EdgeId> = self
            .series
            .iter()
            .filter(|(_, points)| points.first().map(|p| p.state) == Some(state))
            .map(|(edge, _)| *edge)
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Rebuilds schema rows for one edge, for diagnostics payloads.
    pub fn entries_for(&self, edge: EdgeId) -> Vec<GeoStateEntry> {
        self.series
            .get(&edge)
            .map(|points| {
                points
                    .iter()
                    .map(|point| GeoStateEntry::new(edge, point.state, point.time))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.series.len()
    }

    /// Rows surviving duplicate removal.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

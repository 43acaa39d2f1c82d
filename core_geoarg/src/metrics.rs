//! Aggregate counters for one pipeline run, for log lines and run reports.

use geoarg_schema::MigrationStep;
use serde::Serialize;

use crate::ancestry::SubgraphResult;
use crate::binning::BinReport;
use crate::consistency::ConsistencyReport;
use crate::migration::PathSet;
use crate::series::SeriesTable;
use crate::spatial::ProjectedPaths;

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineMetrics {
    pub entries: usize,
    pub edges: usize,
    pub conflicted_edges: usize,
    pub transition_faults: usize,
    pub subgraph_edges: usize,
    pub cycles_detected: u32,
    pub unresolved_seeds: u32,
    pub paths_built: usize,
    pub steps_emitted: usize,
    pub skipped_conflicted: usize,
    pub compressed_steps: usize,
    pub projected_segments: usize,
    pub dropped_steps: u32,
    pub individuals_binned: usize,
    pub missing_locations: u32,
    pub malformed_locations: usize,
}

impl PipelineMetrics {
    pub fn record_table(&mut self, table: &SeriesTable) {
        self.entries = table.entry_count();
        self.edges = table.edge_count();
    }

    pub fn record_audit(&mut self, report: &ConsistencyReport) {
        self.conflicted_edges = report.conflicts.len();
        self.transition_faults = report.transition_faults.values().map(Vec::len).sum();
    }

    pub fn record_subgraph(&mut self, result: &SubgraphResult) {
        self.subgraph_edges = result.edges.len();
        self.unresolved_seeds += result.unresolved_seeds;
        if result.cycle_detected {
            self.cycles_detected += 1;
        }
    }

    pub fn record_paths(&mut self, set: &PathSet) {
        self.paths_built = set.paths.len();
        self.steps_emitted = set.step_count();
        self.skipped_conflicted = set.skipped_conflicted.len();
    }

    pub fn record_compressed(&mut self, steps: &[MigrationStep]) {
        self.compressed_steps = steps.len();
    }

    pub fn record_projection(&mut self, projected: &ProjectedPaths) {
        self.projected_segments = projected.segments.len();
        self.dropped_steps = projected.dropped;
    }

    pub fn record_binning(&mut self, report: &BinReport) {
        self.individuals_binned = report.placed();
        self.missing_locations = report.missing_location;
        self.malformed_locations = report.malformed.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{build_paths, PathOptions};
    use geoarg_schema::{EdgeId, GeoStateEntry, StateId};

    #[test]
    fn counters_track_each_stage() {
        let table = SeriesTable::from_entries(&[
            GeoStateEntry::new(EdgeId(1), StateId(5), 100.0),
            GeoStateEntry::new(EdgeId(1), StateId(7), 100.0),
            GeoStateEntry::new(EdgeId(2), StateId(3), 10.0),
            GeoStateEntry::new(EdgeId(2), StateId(4), 60.0),
        ])
        .unwrap();

        let mut metrics = PipelineMetrics::default();
        metrics.record_table(&table);
        metrics.record_audit(&crate::consistency::audit(&table, None));
        metrics.record_paths(&build_paths(&table, None, &PathOptions::default()));

        assert_eq!(metrics.entries, 4);
        assert_eq!(metrics.edges, 2);
        assert_eq!(metrics.conflicted_edges, 1);
        assert_eq!(metrics.paths_built, 1);
        assert_eq!(metrics.steps_emitted, 1);
        assert_eq!(metrics.skipped_conflicted, 1);
    }
}

//! Derives migration steps from validated series.
//!
//! A step is a state change between consecutive entries of one edge's
//! series, read from the present toward the past: the source is the more
//! recent state, the target is the deeper-past one, and the step carries the
//! deeper-past entry's time. Building can cover a whole table, a resolved
//! subgraph, or the lineages anchored in one state.

use std::collections::{HashMap, HashSet};

use geoarg_schema::{EdgeId, MigrationPath, MigrationStep, StateId};

use crate::series::{SeriesPoint, SeriesTable};

/// Caller knobs for path derivation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathOptions {
    /// Only derive for edges whose series begins in this state.
    pub anchor_state: Option<StateId>,
    /// Derive even for edges that still carry same-time conflicts. Off by
    /// default: conflicted series have no single orderable history.
    pub include_conflicted: bool,
}

/// Full per-edge derivation result.
#[derive(Debug, Clone, Default)]
pub struct PathSet {
    pub paths: HashMap<EdgeId, MigrationPath>,
    /// Edges skipped because their series conflicts, ascending.
    pub skipped_conflicted: Vec<EdgeId>,
}

impl PathSet {
    pub fn step_count(&self) -> usize {
        self.paths.values().map(|path| path.steps.len()).sum()
    }

    /// Paths ordered by edge id, for deterministic emission.
    pub fn sorted(&self) -> Vec<&MigrationPath> {
        let mut paths: Vec<&MigrationPath> = self.paths.values().collect();
        paths.sort_unstable_by_key(|path| path.edge_id);
        paths
    }
}

/// Compressed derivation result: at most one step per unordered state pair.
#[derive(Debug, Clone, Default)]
pub struct CompressedSet {
    pub steps: Vec<MigrationStep>,
    pub skipped_conflicted: Vec<EdgeId>,
}

/// Derives one path per edge in scope. `scope` narrows the table to a
/// resolved subgraph; `None` covers every edge. An edge with fewer than two
/// entries yields an empty path, not an error.
pub fn build_paths(
    table: &SeriesTable,
    scope: Option<&HashSet<EdgeId>>,
    options: &PathOptions,
) -> PathSet {
    let mut set = PathSet::default();
    for edge in table.sorted_edges() {
        if let Some(scope) = scope {
            if !scope.contains(&edge) {
                continue;
            }
        }
        let Some(points) = table.get(edge) else {
            continue;
        };
        if let Some(anchor) = options.anchor_state {
            if points.first().map(|p| p.state) != Some(anchor) {
                continue;
            }
        }
        if !options.include_conflicted && has_same_time_pair(points) {
            set.skipped_conflicted.push(edge);
            continue;
        }
        set.paths.insert(
            edge,
            MigrationPath {
                edge_id: edge,
                steps: derive_steps(points),
            },
        );
    }

    if !set.skipped_conflicted.is_empty() {
        tracing::debug!(
            skipped = set.skipped_conflicted.len(),
            "conflicted edges excluded from path derivation"
        );
    }
    set
}

/// Duplicate rows were removed at table construction, so an equal-time
/// neighbor pair means two distinct states at one time.
fn has_same_time_pair(points: &[SeriesPoint]) -> bool {
    points
        .windows(2)
        .any(|pair| pair[0].time.total_cmp(&pair[1].time).is_eq())
}

fn derive_steps(points: &[SeriesPoint]) -> Vec<MigrationStep> {
    let mut steps = Vec::new();
    for pair in points.windows(2) {
        if pair[0].state != pair[1].state {
            steps.push(MigrationStep {
                source_id: pair[0].state,
                target_id: pair[1].state,
                time: pair[1].time,
            });
        }
    }
    steps
}

/// Collapses a path set to one step per unordered state pair, keeping the
/// oldest occurrence. Paths are visited in edge id order so equal-time ties
/// resolve the same way on every run.
pub fn compress_paths(set: &PathSet) -> Vec<MigrationStep> {
    let mut oldest: HashMap<(StateId, StateId), MigrationStep> = HashMap::new();
    for path in set.sorted() {
        for step in &path.steps {
            let key = pair_key(step.source_id, step.target_id);
            let replace = oldest
                .get(&key)
                .map_or(true, |kept| step.time > kept.time);
            if replace {
                oldest.insert(key, *step);
            }
        }
    }

    let mut steps: Vec<MigrationStep> = oldest.into_values().collect();
    steps.sort_unstable_by(|a, b| {
        a.time
            .total_cmp(&b.time)
            .then(a.source_id.cmp(&b.source_id))
            .then(a.target_id.cmp(&b.target_id))
    });
    steps
}

fn pair_key(a: StateId, b: StateId) -> (StateId, StateId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Derivation and compression in one call.
pub fn build_compressed(
    table: &SeriesTable,
    scope: Option<&HashSet<EdgeId>>,
    options: &PathOptions,
) -> CompressedSet {
    let set = build_paths(table, scope, options);
    CompressedSet {
        steps: compress_paths(&set),
        skipped_conflicted: set.skipped_conflicted,
    }
}

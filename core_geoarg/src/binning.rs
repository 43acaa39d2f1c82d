//! Aggregate counting of sampled individuals into landgrid cells.

use std::collections::HashMap;

use rayon::prelude::*;

use geoarg_schema::{AggregateBin, Individual, IndividualId, StateId};

use crate::spatial::SpatialIndex;

/// Outcome of one binning pass.
#[derive(Debug, Clone, Default)]
pub struct BinReport {
    /// Non-empty bins, ascending by state id. Cells nobody landed in are
    /// simply absent.
    pub bins: Vec<AggregateBin>,
    /// Individuals with no location at all.
    pub missing_location: u32,
    /// Individuals whose coordinates are not finite, in input order.
    pub malformed: Vec<IndividualId>,
}

impl BinReport {
    /// Individuals that landed in some bin.
    pub fn placed(&self) -> usize {
        self.bins.iter().map(|bin| bin.count as usize).sum()
    }
}

enum Placement {
    Cell(IndividualId, StateId),
    Missing,
    Malformed(IndividualId),
}

/// Assigns every locatable individual to exactly one cell: polygon
/// containment first, nearest centroid otherwise. A bad coordinate rejects
/// that individual alone; the rest of the batch proceeds. Classification
/// runs in parallel, aggregation stays sequential so bin membership keeps
/// input order.
pub fn bin_individuals(individuals: &[Individual], index: &SpatialIndex) -> BinReport {
    let placements: Vec<Placement> = individuals
        .par_iter()
        .map(|individual| match individual.location {
            None => Placement::Missing,
            Some(location) if !location.is_finite() => Placement::Malformed(individual.id),
            Some(location) => match index.assign(location) {
                Some(state) => Placement::Cell(individual.id, state),
                None => Placement::Missing,
            },
        })
        .collect();

    let mut report = BinReport::default();
    let mut by_state: HashMap<StateId, AggregateBin> = HashMap::new();
    for placement in placements {
        match placement {
            Placement::Cell(id, state) => {
                let bin = by_state.entry(state).or_insert_with(|| AggregateBin {
                    state_id: state,
                    count: 0,
                    point_ids: Vec::new(),
                });
                bin.count += 1;
                bin.point_ids.push(id);
            }
            Placement::Missing => report.missing_location += 1,
            Placement::Malformed(id) => report.malformed.push(id),
        }
    }

    let mut bins: Vec<AggregateBin> = by_state.into_values().collect();
    bins.sort_unstable_by_key(|bin| bin.state_id);
    report.bins = bins;

    if report.missing_location > 0 || !report.malformed.is_empty() {
        tracing::debug!(
            missing = report.missing_location,
            malformed = report.malformed.len(),
            "individuals left out of the binning pass"
        );
    }
    report
}

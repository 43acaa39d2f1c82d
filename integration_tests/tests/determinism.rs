use core_geoarg::{
    audit, bin_individuals, build_compressed, PathOptions, SeriesTable, SpatialIndex,
};
use geoarg_schema::{
    EdgeId, GeoPoint, GeoStateEntry, Individual, IndividualId, NodeId, SpatialCell, StateId,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const STATES: u32 = 24;
const GRID_WIDTH: u32 = 6;

fn grid() -> Vec<SpatialCell> {
    (1..=STATES)
        .map(|state| {
            let col = ((state - 1) % GRID_WIDTH) as f64;
            let row = ((state - 1) / GRID_WIDTH) as f64;
            SpatialCell {
                state_id: StateId(state),
                continent_id: format!("C{}", (state - 1) / GRID_WIDTH + 1),
                centroid: GeoPoint::new(col + 0.5, row + 0.5),
                boundary: vec![
                    GeoPoint::new(col, row),
                    GeoPoint::new(col + 1.0, row),
                    GeoPoint::new(col + 1.0, row + 1.0),
                    GeoPoint::new(col, row + 1.0),
                ],
            }
        })
        .collect()
}

fn random_rows(seed: u64) -> Vec<GeoStateEntry> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows = Vec::new();
    for edge in 0..400u32 {
        let mut time = 0.0f64;
        let hops = rng.gen_range(2..6);
        for _ in 0..hops {
            rows.push(GeoStateEntry::new(
                EdgeId(edge),
                StateId(rng.gen_range(1..=STATES)),
                time,
            ));
            time += rng.gen_range(5.0..60.0);
        }
        // every seventh edge gets a same-time conflict at its origin
        if edge % 7 == 0 {
            rows.push(GeoStateEntry::new(
                EdgeId(edge),
                StateId(STATES + 1 + edge % 3),
                0.0,
            ));
        }
    }
    rows
}

fn random_individuals(seed: u64) -> Vec<Individual> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..300u32)
        .map(|id| {
            let location = if id % 23 == 0 {
                None
            } else {
                Some(GeoPoint::new(
                    rng.gen_range(-1.0..7.0),
                    rng.gen_range(-1.0..5.0),
                ))
            };
            Individual {
                id: IndividualId(id),
                nodes: vec![NodeId(id)],
                location,
            }
        })
        .collect()
}

fn run_once(
    rows: &[GeoStateEntry],
    individuals: &[Individual],
    index: &SpatialIndex,
) -> String {
    let table = SeriesTable::from_entries(rows).expect("generated rows are well formed");
    let report = audit(&table, None);
    let mut flagged: Vec<u32> = report.conflicts.keys().map(|edge| edge.0).collect();
    flagged.sort_unstable();

    let compressed = build_compressed(&table, None, &PathOptions::default());
    let bins = bin_individuals(individuals, index);

    serde_json::to_string(&(
        flagged,
        compressed.steps,
        compressed.skipped_conflicted,
        bins.bins,
    ))
    .expect("run report serializes")
}

/// The toolchain runs the same dataset through separate processes and diffs
/// the emitted reports, so map iteration order must never leak into output.
#[test]
fn repeated_runs_emit_identical_reports() {
    let rows = random_rows(42);
    let individuals = random_individuals(7);
    let index = SpatialIndex::build(&grid()).expect("grid is valid");

    let first = run_once(&rows, &individuals, &index);
    let second = run_once(&rows, &individuals, &index);
    assert_eq!(first, second);
}

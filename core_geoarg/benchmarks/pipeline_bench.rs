use core_geoarg::{
    audit, bin_individuals, build_compressed, resolve_from_nodes, ArgTopology, PathOptions,
    SeriesTable, SpatialIndex,
};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use geoarg_schema::{
    ArgEdge, EdgeId, GeoPoint, GeoStateEntry, Individual, IndividualId, NodeId, SpatialCell,
    StateId,
};
use rand::{rngs::SmallRng, Rng, SeedableRng};

const GRID_WIDTH: u32 = 12;
const STATES: u32 = 96;

fn landgrid() -> Vec<SpatialCell> {
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

fn series_rows(edges: u32, seed: u64) -> Vec<GeoStateEntry> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut rows = Vec::new();
    for edge in 0..edges {
        let mut time = 0.0f64;
        let hops = rng.gen_range(2..6);
        for _ in 0..hops {
            rows.push(GeoStateEntry::new(
                EdgeId(edge),
                StateId(rng.gen_range(1..=STATES)),
                time,
            ));
            time += rng.gen_range(10.0..80.0);
        }
    }
    rows
}

fn chain_topology(edges: u32) -> ArgTopology {
    let list = (0..edges)
        .map(|id| ArgEdge {
            id: EdgeId(id),
            parent: NodeId(id + 1),
            child: NodeId(id),
        })
        .collect();
    ArgTopology::new(list)
}

fn individuals(count: u32, seed: u64) -> Vec<Individual> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let width = GRID_WIDTH as f64;
    let height = (STATES / GRID_WIDTH) as f64;
    (0..count)
        .map(|id| Individual {
            id: IndividualId(id),
            nodes: vec![NodeId(id)],
            location: Some(GeoPoint::new(
                rng.gen_range(-1.0..width + 1.0),
                rng.gen_range(-1.0..height + 1.0),
            )),
        })
        .collect()
}

fn bench_audit(c: &mut Criterion) {
    let mut group = c.benchmark_group("series_audit");

    for size in [1_000u32, 4_000, 16_000] {
        group.bench_with_input(BenchmarkId::new("ingest_audit", size), &size, |b, &size| {
            b.iter_batched(
                || series_rows(size, 7),
                |rows| {
                    let table = SeriesTable::from_entries(&rows).unwrap();
                    audit(&table, None)
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("subgraph_resolution");

    for size in [1_000u32, 4_000, 16_000] {
        group.bench_with_input(BenchmarkId::new("chain", size), &size, |b, &size| {
            b.iter_batched(
                || chain_topology(size),
                |topology| resolve_from_nodes(&topology, &[NodeId(0)]),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_derivation");

    for size in [1_000u32, 4_000, 16_000] {
        group.bench_with_input(BenchmarkId::new("compressed", size), &size, |b, &size| {
            b.iter_batched(
                || SeriesTable::from_entries(&series_rows(size, 7)).unwrap(),
                |table| build_compressed(&table, None, &PathOptions::default()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_binning(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_binning");
    let index = SpatialIndex::build(&landgrid()).unwrap();

    for size in [1_000u32, 4_000, 16_000] {
        group.bench_with_input(BenchmarkId::new("assign", size), &size, |b, &size| {
            b.iter_batched(
                || individuals(size, 11),
                |people| bin_individuals(&people, &index),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    pipeline_benches,
    bench_audit,
    bench_resolve,
    bench_paths,
    bench_binning
);
criterion_main!(pipeline_benches);

use core_geoarg::{
    audit, build_compressed, build_paths, resolve_from_nodes, resolve_from_state, ArgTopology,
    PathOptions, SeriesTable, SpatialIndex,
};
use geoarg_schema::{ArgEdge, EdgeId, GeoPoint, GeoStateEntry, NodeId, SpatialCell, StateId};

fn entry(edge: u32, state: u32, time: f64) -> GeoStateEntry {
    GeoStateEntry::new(EdgeId(edge), StateId(state), time)
}

fn arg_edge(id: u32, parent: u32, child: u32) -> ArgEdge {
    ArgEdge {
        id: EdgeId(id),
        parent: NodeId(parent),
        child: NodeId(child),
    }
}

/// A dataset carrying every tolerated anomaly at once: a same-time conflict,
/// a cycle in the topology, and series rows naming edges the topology lacks.
/// The pipeline must complete and report each anomaly in its own channel.
#[test]
fn messy_dataset_flows_through_every_stage() {
    let rows = vec![
        // edge 0: clean two-hop lineage out of state 1
        entry(0, 1, 10.0),
        entry(0, 2, 60.0),
        entry(0, 3, 140.0),
        // edge 1: conflicted at time 100
        entry(1, 5, 100.0),
        entry(1, 7, 100.0),
        entry(1, 5, 200.0),
        // edge 99 exists only in the series, not in the topology
        entry(99, 1, 5.0),
        entry(99, 4, 75.0),
    ];
    let table = SeriesTable::from_entries(&rows).expect("rows are well formed");

    // nodes 0 -> 1 -> 2 -> 0 form a deliberate cycle
    let topology = ArgTopology::new(vec![
        arg_edge(0, 1, 0),
        arg_edge(1, 2, 1),
        arg_edge(2, 0, 2),
    ]);

    let report = audit(&table, None);
    assert!(report.is_conflicted(EdgeId(1)));
    assert!(!report.is_conflicted(EdgeId(0)));

    let subgraph = resolve_from_state(&topology, &table, StateId(1));
    assert!(subgraph.cycle_detected, "the back edge must be flagged");
    assert_eq!(subgraph.unresolved_seeds, 1, "edge 99 has no topology row");
    assert_eq!(subgraph.nodes_visited, 3);

    let paths = build_paths(&table, Some(&subgraph.edges), &PathOptions::default());
    assert!(
        paths.paths.contains_key(&EdgeId(0)),
        "clean in-scope edges still derive"
    );
    assert_eq!(paths.skipped_conflicted, vec![EdgeId(1)]);
}

#[test]
fn conflicted_edges_never_leak_into_compressed_output() {
    let table = SeriesTable::from_entries(&[
        entry(3, 4, 50.0),
        entry(3, 6, 50.0),
        entry(3, 4, 90.0),
        entry(8, 4, 10.0),
        entry(8, 6, 30.0),
    ])
    .unwrap();

    let compressed = build_compressed(&table, None, &PathOptions::default());
    assert_eq!(compressed.skipped_conflicted, vec![EdgeId(3)]);
    assert_eq!(compressed.steps.len(), 1);
    assert_eq!(compressed.steps[0].time, 30.0, "only edge 8 contributes");
}

#[test]
fn traversal_terminates_on_a_self_parent() {
    let topology = ArgTopology::new(vec![arg_edge(0, 4, 4)]);
    let result = resolve_from_nodes(&topology, &[NodeId(4)]);

    assert!(result.cycle_detected);
    assert_eq!(result.nodes_visited, 1);
    assert_eq!(result.sorted_edges(), vec![EdgeId(0)]);
}

/// Steps referencing a state the landgrid never defined disappear at
/// projection time, not before, and the loss is counted.
#[test]
fn unknown_states_survive_until_projection() {
    let table = SeriesTable::from_entries(&[
        entry(0, 1, 10.0),
        entry(0, 777, 60.0),
    ])
    .unwrap();

    let compressed = build_compressed(&table, None, &PathOptions::default());
    assert_eq!(compressed.steps.len(), 1, "derivation keeps the step");

    let index = SpatialIndex::build(&[SpatialCell {
        state_id: StateId(1),
        continent_id: "C1".to_string(),
        centroid: GeoPoint::new(0.5, 0.5),
        boundary: vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(0.0, 1.0),
        ],
    }])
    .unwrap();

    let projected = index.project_steps(&compressed.steps);
    assert!(projected.segments.is_empty());
    assert_eq!(projected.dropped, 1);
}

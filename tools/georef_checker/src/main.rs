//! Command line checker for geoARG exports.
//!
//! Loads the per-table files an export produces, audits the georef series
//! for consistency, and optionally resolves ancestry subgraphs, derives
//! migration paths, and bins sampled individuals onto the landgrid.

mod dataset;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use core_geoarg::{
    audit, bin_individuals, build_paths, compress_paths, resolve_from_nodes, resolve_from_state,
    ArgTopology, ConsistencyReport, PathOptions, PipelineMetrics, SeriesTable, SpatialIndex,
};
use geoarg_schema::{
    AggregateBin, EdgeId, MigrationPath, MigrationStep, NodeId, StateId, TransitionViolation,
    Violation,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Consistency checker and path builder for geoARG exports", long_about = None)]
struct Args {
    /// Georef entries JSON (edge, state, time rows)
    #[arg(long)]
    georef: PathBuf,

    /// ARG edge table JSON, required for subgraph resolution
    #[arg(long = "arg-edges")]
    arg_edges: Option<PathBuf>,

    /// Landgrid GeoJSON with per-cell state metadata
    #[arg(long)]
    landgrid: Option<PathBuf>,

    /// Landgrid adjacency matrix CSV, enables the transition check
    #[arg(long)]
    adjacency: Option<PathBuf>,

    /// Individuals table JSON, binned when a landgrid is given
    #[arg(long)]
    individuals: Option<PathBuf>,

    /// Seed the ancestry subgraph from this node id (repeatable)
    #[arg(long = "node", conflicts_with = "state")]
    nodes: Vec<u32>,

    /// Seed the ancestry subgraph from lineages originating in this state
    #[arg(long)]
    state: Option<u32>,

    /// Derive paths only for edges whose series begins in this state
    #[arg(long)]
    anchor: Option<u32>,

    /// Derive paths for conflicted edges too
    #[arg(long, default_value_t = false)]
    include_conflicted: bool,

    /// Collapse derived paths to one step per state pair
    #[arg(long, default_value_t = false)]
    compress: bool,

    /// Write the full run as pretty JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Serialize)]
struct RunReport {
    violations: Vec<Violation>,
    transition_faults: Vec<TransitionViolation>,
    subgraph_edges: Option<Vec<EdgeId>>,
    cycle_detected: bool,
    paths: Vec<MigrationPath>,
    skipped_conflicted: Vec<EdgeId>,
    compressed_steps: Option<Vec<MigrationStep>>,
    bins: Option<Vec<AggregateBin>>,
    metrics: PipelineMetrics,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut metrics = PipelineMetrics::default();

    let rows = dataset::load_georef(&args.georef)?;
    let table = SeriesTable::from_entries(&rows).context("georef table failed shape checks")?;
    metrics.record_table(&table);
    tracing::info!(
        entries = table.entry_count(),
        edges = table.edge_count(),
        "georef table loaded"
    );

    let adjacency = match &args.adjacency {
        Some(path) => Some(dataset::load_adjacency(path)?),
        None => None,
    };
    let report = audit(&table, adjacency.as_ref());
    metrics.record_audit(&report);
    println!("=== consistency ===");
    print_validation(&report);

    let topology = match &args.arg_edges {
        Some(path) => Some(ArgTopology::new(dataset::load_arg_edges(path)?)),
        None => None,
    };

    let mut subgraph = None;
    if args.state.is_some() || !args.nodes.is_empty() {
        let topology = topology
            .as_ref()
            .context("subgraph resolution requires --arg-edges")?;
        let result = if let Some(state) = args.state {
            resolve_from_state(topology, &table, StateId(state))
        } else {
            let seeds: Vec<NodeId> = args.nodes.iter().copied().map(NodeId).collect();
            resolve_from_nodes(topology, &seeds)
        };
        metrics.record_subgraph(&result);
        println!("=== subgraph ===");
        println!(
            "{} edges reached across {} nodes",
            result.edges.len(),
            result.nodes_visited
        );
        if result.cycle_detected {
            println!("cycle detected during traversal; closure is still complete");
        }
        if result.unresolved_seeds > 0 {
            println!("{} series edges had no topology row", result.unresolved_seeds);
        }
        subgraph = Some(result);
    }

    let options = PathOptions {
        anchor_state: args.anchor.map(StateId),
        include_conflicted: args.include_conflicted,
    };
    let scope = subgraph.as_ref().map(|result| &result.edges);
    let paths = build_paths(&table, scope, &options);
    metrics.record_paths(&paths);
    println!("=== migration ===");
    println!(
        "{} paths carrying {} steps, {} conflicted edges skipped",
        paths.paths.len(),
        paths.step_count(),
        paths.skipped_conflicted.len()
    );

    let compressed = if args.compress {
        let steps = compress_paths(&paths);
        metrics.record_compressed(&steps);
        println!("{} steps after compression", steps.len());
        Some(steps)
    } else {
        None
    };

    let index = match &args.landgrid {
        Some(path) => {
            let cells = dataset::load_landgrid(path)?;
            Some(SpatialIndex::build(&cells).context("landgrid failed shape checks")?)
        }
        None => None,
    };

    if let Some(index) = &index {
        let steps: Vec<MigrationStep> = match &compressed {
            Some(steps) => steps.clone(),
            None => paths
                .sorted()
                .iter()
                .flat_map(|path| path.steps.iter().copied())
                .collect(),
        };
        let projected = index.project_steps(&steps);
        metrics.record_projection(&projected);
        if projected.dropped > 0 {
            println!(
                "{} steps referenced states missing from the landgrid",
                projected.dropped
            );
        }
    }

    let mut bins = None;
    if let Some(path) = &args.individuals {
        let index = index
            .as_ref()
            .context("binning individuals requires --landgrid")?;
        let individuals = dataset::load_individuals(path)?;
        let binned = bin_individuals(&individuals, index);
        metrics.record_binning(&binned);
        println!("=== binning ===");
        for bin in &binned.bins {
            println!("state {}: {} individuals", bin.state_id, bin.count);
        }
        if binned.missing_location > 0 || !binned.malformed.is_empty() {
            println!(
                "{} without location, {} with malformed coordinates",
                binned.missing_location,
                binned.malformed.len()
            );
        }
        bins = Some(binned.bins);
    }

    println!("=== metrics ===");
    println!("{}", serde_json::to_string_pretty(&metrics)?);

    if let Some(path) = &args.report {
        let mut violations: Vec<Violation> = report.conflicts.values().cloned().collect();
        violations.sort_unstable_by_key(|violation| violation.edge_id);
        let mut faults: Vec<TransitionViolation> = report
            .transition_faults
            .values()
            .flatten()
            .cloned()
            .collect();
        faults.sort_unstable_by(|a, b| {
            a.edge_id
                .cmp(&b.edge_id)
                .then(a.time_start.total_cmp(&b.time_start))
        });

        let doc = RunReport {
            violations,
            transition_faults: faults,
            subgraph_edges: subgraph.as_ref().map(|result| result.sorted_edges()),
            cycle_detected: subgraph
                .as_ref()
                .map(|result| result.cycle_detected)
                .unwrap_or(false),
            paths: paths.sorted().into_iter().cloned().collect(),
            skipped_conflicted: paths.skipped_conflicted.clone(),
            compressed_steps: compressed,
            bins,
            metrics,
        };
        fs::write(path, serde_json::to_string_pretty(&doc)?)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "run report written");
    }

    Ok(())
}

fn print_validation(report: &ConsistencyReport) {
    if report.is_clean() {
        println!("No violations found!");
        return;
    }
    let flagged = report.flagged_edges();
    println!("Found {} edges with violations:", flagged.len());
    for (edge, _) in flagged {
        println!();
        println!("Edge ID: {edge}");
        if let Some(violation) = report.conflicts.get(&edge) {
            let states: Vec<String> = violation
                .states
                .iter()
                .map(|state| state.to_string())
                .collect();
            println!(
                "  Time {}: Multiple states found: [{}]",
                violation.time,
                states.join(", ")
            );
        }
        if let Some(faults) = report.transition_faults.get(&edge) {
            for fault in faults {
                println!(
                    "  Time {} -> {}: Invalid transition from state {} to state {}",
                    fault.time_start, fault.time_end, fault.from_state, fault.to_state
                );
            }
        }
    }
}

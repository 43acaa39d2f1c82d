//! Core transformations for the geoARG ancestry explorer.
//!
//! Batch passes over in-memory tables: series consistency auditing,
//! ancestral subgraph resolution, migration path derivation, and spatial
//! binning. Inputs arrive pre-loaded as [`geoarg_schema`] records; nothing
//! here performs I/O.

mod adjacency;
mod ancestry;
mod binning;
mod consistency;
mod metrics;
mod migration;
mod series;
mod spatial;

pub use adjacency::StateAdjacency;
pub use ancestry::{
    resolve_for_individual, resolve_from_nodes, resolve_from_state, ArgTopology, SubgraphResult,
};
pub use binning::{bin_individuals, BinReport};
pub use consistency::{
    audit, check_transitions, find_conflicts, ConsistencyReport, ViolationFlags,
};
pub use metrics::PipelineMetrics;
pub use migration::{
    build_compressed, build_paths, compress_paths, CompressedSet, PathOptions, PathSet,
};
pub use series::{SeriesError, SeriesPoint, SeriesTable};
pub use spatial::{IndexError, ProjectedPaths, ProjectedStep, SpatialIndex};

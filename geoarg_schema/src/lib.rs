//! Shared record types for the geoARG processing pipeline.
//!
//! Everything here is plain data with serde derives: the input tables the
//! loaders produce and the report records the core hands to its consumers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one lineage branch in the ARG.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a coalescent or sample node in the ARG.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a discrete geographic state (a landgrid cell). 1-based in
/// real datasets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub u32);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a sampled individual.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndividualId(pub u32);

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }
}

/// One georeferenced fact: the inferred state of an edge at a time depth.
/// Time is non-negative and grows further into the past.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoStateEntry {
    pub edge_id: EdgeId,
    pub state_id: StateId,
    pub time: f64,
}

impl GeoStateEntry {
    pub fn new(edge_id: EdgeId, state_id: StateId, time: f64) -> Self {
        Self {
            edge_id,
            state_id,
            time,
        }
    }
}

/// A lineage branch connecting a child node to its parent. The child→parent
/// closure of these relations defines an ancestry subgraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgEdge {
    pub id: EdgeId,
    pub parent: NodeId,
    pub child: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: IndividualId,
    pub nodes: Vec<NodeId>,
    pub location: Option<GeoPoint>,
}

/// Static reference geometry for one hexagonal landgrid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialCell {
    pub state_id: StateId,
    pub continent_id: String,
    pub centroid: GeoPoint,
    pub boundary: Vec<GeoPoint>,
}

/// An edge carrying two or more distinct states at the same time point.
/// `states` is sorted ascending; `entries` keeps the edge's full series for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub edge_id: EdgeId,
    pub time: f64,
    pub states: Vec<StateId>,
    pub entries: Vec<GeoStateEntry>,
}

/// A state change between two landgrid cells that are not adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionViolation {
    pub edge_id: EdgeId,
    pub time_start: f64,
    pub time_end: f64,
    pub from_state: StateId,
    pub to_state: StateId,
}

/// One state transition along an edge. `time` is the deeper-past entry's
/// time; `source_id` is the more recent state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MigrationStep {
    pub source_id: StateId,
    pub target_id: StateId,
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationPath {
    pub edge_id: EdgeId,
    pub steps: Vec<MigrationStep>,
}

impl MigrationPath {
    pub fn new(edge_id: EdgeId) -> Self {
        Self {
            edge_id,
            steps: Vec::new(),
        }
    }
}

/// Individuals counted into one spatial cell. Zero-count bins are never
/// produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBin {
    pub state_id: StateId,
    pub count: u32,
    pub point_ids: Vec<IndividualId>,
}

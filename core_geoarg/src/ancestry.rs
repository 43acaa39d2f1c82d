//! Upward closure over the ARG's child→parent relation.
//!
//! The recombination graph is treated as plain topology here: no times, no
//! states, just which node descends from which. Resolution expands a seed set
//! to everything ancestral to it and reports the edges touching that set.
//! Malformed inputs can contain cycles, so traversal never assumes a DAG.

use std::collections::{HashMap, HashSet, VecDeque};

use geoarg_schema::{ArgEdge, EdgeId, Individual, NodeId, StateId};

use crate::series::SeriesTable;

/// Child→parent adjacency built once per dataset, read-shared afterwards.
#[derive(Debug, Clone, Default)]
pub struct ArgTopology {
    parents: HashMap<NodeId, Vec<NodeId>>,
    by_id: HashMap<EdgeId, usize>,
    edges: Vec<ArgEdge>,
}

impl ArgTopology {
    pub fn new(edges: Vec<ArgEdge>) -> Self {
        let mut parents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut by_id = HashMap::with_capacity(edges.len());
        for (index, edge) in edges.iter().enumerate() {
            parents.entry(edge.child).or_default().push(edge.parent);
            by_id.insert(edge.id, index);
        }
        Self {
            parents,
            by_id,
            edges,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&ArgEdge> {
        self.by_id.get(&id).map(|&index| &self.edges[index])
    }

    fn parents_of(&self, node: NodeId) -> &[NodeId] {
        self.parents.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Outcome of one subgraph resolution.
#[derive(Debug, Clone, Default)]
pub struct SubgraphResult {
    /// Every edge with its child or parent in the ancestral closure.
    pub edges: HashSet<EdgeId>,
    /// A closure node was reachable from itself. The result stays usable;
    /// the cycle marks the dataset as structurally suspect.
    pub cycle_detected: bool,
    /// Size of the node closure, seeds included.
    pub nodes_visited: usize,
    /// Seed edge ids that had no row in the topology.
    pub unresolved_seeds: u32,
}

impl SubgraphResult {
    /// Edge ids ascending, for deterministic report emission.
    pub fn sorted_edges(&self) -> Vec<EdgeId> {
        let mut edges: Vec<EdgeId> = self.edges.iter().copied().collect();
        edges.sort_unstable();
        edges
    }
}

/// Expands `seeds` to their full ancestral closure. Visited nodes are never
/// re-entered, so traversal terminates on cyclic inputs too.
pub fn resolve_from_nodes(topology: &ArgTopology, seeds: &[NodeId]) -> SubgraphResult {
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut frontier: VecDeque<NodeId> = VecDeque::new();
    for &seed in seeds {
        if visited.insert(seed) {
            frontier.push_back(seed);
        }
    }
    while let Some(node) = frontier.pop_front() {
        for &parent in topology.parents_of(node) {
            if visited.insert(parent) {
                frontier.push_back(parent);
            }
        }
    }

    let edges: HashSet<EdgeId> = topology
        .edges
        .iter()
        .filter(|edge| visited.contains(&edge.child) || visited.contains(&edge.parent))
        .map(|edge| edge.id)
        .collect();

    let cycle_detected = has_back_edge(topology, &visited);
    if cycle_detected {
        tracing::warn!(
            nodes = visited.len(),
            "ancestral closure contains a cycle"
        );
    }

    SubgraphResult {
        edges,
        cycle_detected,
        nodes_visited: visited.len(),
        unresolved_seeds: 0,
    }
}

/// Closure seeded from every node an individual maps to.
pub fn resolve_for_individual(topology: &ArgTopology, individual: &Individual) -> SubgraphResult {
    resolve_from_nodes(topology, &individual.nodes)
}

/// Closure seeded from the endpoints of every edge whose series begins in
/// `state`. Series rows naming an edge the topology lacks are dropped and
/// counted in `unresolved_seeds`.
pub fn resolve_from_state(
    topology: &ArgTopology,
    table: &SeriesTable,
    state: StateId,
) -> SubgraphResult {
    let mut seeds: Vec<NodeId> = Vec::new();
    let mut unresolved = 0u32;
    for edge_id in table.edges_starting_in(state) {
        match topology.edge(edge_id) {
            Some(edge) => {
                seeds.push(edge.child);
                seeds.push(edge.parent);
            }
            None => unresolved += 1,
        }
    }
    if unresolved > 0 {
        tracing::debug!(
            state = %state,
            dropped = unresolved,
            "series edges missing from the topology"
        );
    }

    let mut result = resolve_from_nodes(topology, &seeds);
    result.unresolved_seeds = unresolved;
    result
}

/// Depth-first scan of the closure for a back edge. The closure is closed
/// under `parents_of`, so the walk stays inside it.
fn has_back_edge(topology: &ArgTopology, closure: &HashSet<NodeId>) -> bool {
    const OPEN: u8 = 1;
    const DONE: u8 = 2;

    let mut color: HashMap<NodeId, u8> = HashMap::with_capacity(closure.len());
    for &root in closure {
        if color.contains_key(&root) {
            continue;
        }
        let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];
        while let Some((node, exiting)) = stack.pop() {
            if exiting {
                color.insert(node, DONE);
                continue;
            }
            match color.get(&node) {
                // Reached again while still on the current path.
                Some(&OPEN) => return true,
                Some(&DONE) => continue,
                _ => {}
            }
            color.insert(node, OPEN);
            stack.push((node, true));
            for &parent in topology.parents_of(node) {
                if color.get(&parent) != Some(&DONE) {
                    stack.push((parent, false));
                }
            }
        }
    }
    false
}

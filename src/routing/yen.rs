//! K shortest loopless paths (Yen's algorithm)
//!
//! Builds on the banned-set Dijkstra: each accepted path is perturbed at
//! every spur node, deviation edges already taken by accepted paths that
//! share the prefix are removed, and the best deviation enters a
//! candidate pool ordered by weight with discovery order as tie-break.

use std::{cmp::Ordering, collections::BinaryHeap};

use fixedbitset::FixedBitSet;
use hashbrown::HashSet;
use log::debug;
use petgraph::graph::NodeIndex;

use super::dijkstra::{SearchPath, edge_key, shortest_path};
use crate::{Error, model::StreetGraph};

/// A loopless path between the query endpoints, ordered origin to
/// destination, with its total edge weight in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct PathCandidate {
    pub nodes: Vec<NodeIndex>,
    pub weight: f64,
}

impl PathCandidate {
    fn from_search(path: SearchPath) -> Self {
        Self {
            nodes: path.nodes,
            weight: path.weight,
        }
    }
}

/// Pool entry keyed by (weight, discovery sequence)
struct PoolEntry {
    weight: f64,
    seq: u64,
    nodes: Vec<NodeIndex>,
}

impl PartialEq for PoolEntry {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for PoolEntry {}

impl Ord for PoolEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by weight, earliest discovery wins ties
        other
            .weight
            .total_cmp(&self.weight)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PoolEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Enumerate up to `k` distinct loopless paths from `source` to
/// `target`, sorted ascending by total edge weight.
///
/// Fewer than `k` paths (down to one) is a degraded result, not an
/// error: the graph simply does not support more distinct alternatives.
///
/// # Errors
///
/// - [`Error::InvalidInput`] if `k` is zero or an endpoint is not a node
///   of the graph
/// - [`Error::NoRoute`] if the endpoints are disconnected
pub fn k_shortest_paths(
    graph: &StreetGraph,
    source: NodeIndex,
    target: NodeIndex,
    k: usize,
) -> Result<Vec<PathCandidate>, Error> {
    if k == 0 {
        return Err(Error::InvalidInput("k must be at least 1".to_string()));
    }
    for endpoint in [source, target] {
        if graph.graph.node_weight(endpoint).is_none() {
            return Err(Error::InvalidInput(format!(
                "endpoint index {} is not a node of the graph",
                endpoint.index()
            )));
        }
    }

    let node_count = graph.graph.node_count();
    let no_banned_nodes = FixedBitSet::with_capacity(node_count);
    let no_banned_edges = HashSet::new();

    let first = shortest_path(graph, source, target, &no_banned_nodes, &no_banned_edges)
        .ok_or(Error::NoRoute)?;

    let mut accepted = vec![PathCandidate::from_search(first)];
    let mut pool: BinaryHeap<PoolEntry> = BinaryHeap::new();
    let mut seen: HashSet<Vec<NodeIndex>> = HashSet::new();
    seen.insert(accepted[0].nodes.clone());
    let mut seq: u64 = 0;

    while accepted.len() < k {
        let prev = accepted
            .last()
            .cloned()
            .ok_or(Error::EmptyResult)?;

        let mut root_weight = 0.0;
        for spur_idx in 0..prev.nodes.len().saturating_sub(1) {
            let spur_node = prev.nodes[spur_idx];
            let root = &prev.nodes[..=spur_idx];

            // Remove deviation edges of accepted paths sharing this root
            let mut banned_edges: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
            for path in &accepted {
                if path.nodes.len() > spur_idx + 1 && path.nodes[..=spur_idx] == *root {
                    banned_edges.insert(edge_key(path.nodes[spur_idx], path.nodes[spur_idx + 1]));
                }
            }

            // Remove root nodes so deviations stay loopless
            let mut banned_nodes = FixedBitSet::with_capacity(node_count);
            for node in &root[..spur_idx] {
                banned_nodes.insert(node.index());
            }

            if let Some(spur_path) =
                shortest_path(graph, spur_node, target, &banned_nodes, &banned_edges)
            {
                let mut nodes = root[..spur_idx].to_vec();
                nodes.extend_from_slice(&spur_path.nodes);

                if !seen.contains(&nodes) {
                    seen.insert(nodes.clone());
                    pool.push(PoolEntry {
                        weight: root_weight + spur_path.weight,
                        seq,
                        nodes,
                    });
                    seq += 1;
                }
            }

            // Extend the root weight to the next spur node
            root_weight += graph
                .edge_length(prev.nodes[spur_idx], prev.nodes[spur_idx + 1])
                .ok_or_else(|| {
                    Error::InvalidInput("accepted path traverses a missing edge".to_string())
                })?;
        }

        match pool.pop() {
            Some(entry) => {
                debug!(
                    "Accepted alternative path {} with weight {:.1} m",
                    accepted.len() + 1,
                    entry.weight
                );
                accepted.push(PathCandidate {
                    nodes: entry.nodes,
                    weight: entry.weight,
                });
            }
            // Graph exhausted: fewer than k distinct paths exist
            None => break,
        }
    }

    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Diamond: two disjoint two-edge paths of weight 10 and 12
    fn diamond_graph() -> StreetGraph {
        let mut builder = StreetGraph::builder();
        builder.add_node(1, 0.0, 0.0).unwrap();
        builder.add_node(2, 0.001, 0.001).unwrap();
        builder.add_node(3, -0.001, 0.001).unwrap();
        builder.add_node(4, 0.0, 0.002).unwrap();
        builder.add_edge(1, 2, 5.0).unwrap();
        builder.add_edge(2, 4, 5.0).unwrap();
        builder.add_edge(1, 3, 6.0).unwrap();
        builder.add_edge(3, 4, 6.0).unwrap();
        builder.build()
    }

    fn idx(graph: &StreetGraph, id: u64) -> NodeIndex {
        graph.node_index(id).unwrap()
    }

    #[test]
    fn diamond_yields_exactly_two_paths() {
        let graph = diamond_graph();
        let paths = k_shortest_paths(&graph, idx(&graph, 1), idx(&graph, 4), 3).unwrap();

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].weight, 10.0);
        assert_eq!(paths[1].weight, 12.0);
    }

    #[test]
    fn paths_are_distinct_and_sorted() {
        let graph = diamond_graph();
        let paths = k_shortest_paths(&graph, idx(&graph, 1), idx(&graph, 4), 5).unwrap();

        for pair in paths.windows(2) {
            assert!(pair[0].weight <= pair[1].weight);
            assert_ne!(pair[0].nodes, pair[1].nodes);
        }
    }

    #[test]
    fn paths_are_loopless() {
        let graph = diamond_graph();
        let paths = k_shortest_paths(&graph, idx(&graph, 1), idx(&graph, 4), 5).unwrap();

        for path in &paths {
            let unique: HashSet<_> = path.nodes.iter().collect();
            assert_eq!(unique.len(), path.nodes.len());
        }
    }

    #[test]
    fn k_zero_is_invalid() {
        let graph = diamond_graph();
        assert!(matches!(
            k_shortest_paths(&graph, idx(&graph, 1), idx(&graph, 4), 0),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn disconnected_endpoints_have_no_route() {
        let mut builder = StreetGraph::builder();
        builder.add_node(1, 0.0, 0.0).unwrap();
        builder.add_node(2, 0.001, 0.0).unwrap();
        builder.add_node(3, 0.5, 0.5).unwrap();
        builder.add_node(4, 0.501, 0.5).unwrap();
        builder.add_edge(1, 2, 10.0).unwrap();
        builder.add_edge(3, 4, 10.0).unwrap();
        let graph = builder.build();

        assert!(matches!(
            k_shortest_paths(&graph, idx(&graph, 1), idx(&graph, 3), 2),
            Err(Error::NoRoute)
        ));
    }

    #[test]
    fn grid_supports_many_alternatives() {
        // 3x3 grid with unit-ish weights; plenty of distinct loopless paths
        let mut builder = StreetGraph::builder();
        for row in 0..3u64 {
            for col in 0..3u64 {
                let id = row * 3 + col + 1;
                builder
                    .add_node(id, row as f64 * 0.001, col as f64 * 0.001)
                    .unwrap();
            }
        }
        for row in 0..3u64 {
            for col in 0..3u64 {
                let id = row * 3 + col + 1;
                if col < 2 {
                    builder.add_edge(id, id + 1, 10.0).unwrap();
                }
                if row < 2 {
                    builder.add_edge(id, id + 3, 10.0).unwrap();
                }
            }
        }
        let graph = builder.build();

        let paths = k_shortest_paths(&graph, idx(&graph, 1), idx(&graph, 9), 4).unwrap();
        assert_eq!(paths.len(), 4);
        // All shortest grid walks share the same weight, longer detours follow
        assert_eq!(paths[0].weight, 40.0);
        for pair in paths.windows(2) {
            assert!(pair[0].weight <= pair[1].weight);
        }
    }

    #[test]
    fn deterministic_across_calls() {
        let graph = diamond_graph();
        let a = k_shortest_paths(&graph, idx(&graph, 1), idx(&graph, 4), 3).unwrap();
        let b = k_shortest_paths(&graph, idx(&graph, 1), idx(&graph, 4), 3).unwrap();
        assert_eq!(a, b);
    }
}

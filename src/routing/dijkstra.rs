use std::{cmp::Ordering, collections::BinaryHeap};

use fixedbitset::FixedBitSet;
use hashbrown::{HashMap, HashSet};
use petgraph::{graph::NodeIndex, visit::EdgeRef};

use crate::model::StreetGraph;

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node: NodeIndex,
}

impl Eq for State {}

// Implement Ord for State to use in BinaryHeap
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap);
        // node index as a total tie-break since costs are floats
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.index().cmp(&self.node.index()))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A reconstructed shortest path with its total weight in meters
#[derive(Debug, Clone)]
pub(crate) struct SearchPath {
    pub(crate) nodes: Vec<NodeIndex>,
    pub(crate) weight: f64,
}

/// Undirected edge key with endpoints in canonical order
pub(crate) fn edge_key(a: NodeIndex, b: NodeIndex) -> (NodeIndex, NodeIndex) {
    if a.index() <= b.index() { (a, b) } else { (b, a) }
}

/// Dijkstra's algorithm from `source` to `target`, ignoring banned
/// nodes and banned undirected edges. Returns `None` when the target is
/// unreachable on the reduced graph.
///
/// The banned sets are what make this usable for spur searches: the
/// enumeration layer removes the root-path nodes and the deviation
/// edges of previously accepted paths before each call.
pub(crate) fn shortest_path(
    graph: &StreetGraph,
    source: NodeIndex,
    target: NodeIndex,
    banned_nodes: &FixedBitSet,
    banned_edges: &HashSet<(NodeIndex, NodeIndex)>,
) -> Option<SearchPath> {
    if banned_nodes.contains(source.index()) || banned_nodes.contains(target.index()) {
        return None;
    }

    let estimated_nodes = graph.graph.node_count().min(1000);
    let mut distances: HashMap<NodeIndex, f64> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeIndex, NodeIndex> = HashMap::with_capacity(estimated_nodes);
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    // Start node has distance 0
    heap.push(State {
        cost: 0.0,
        node: source,
    });
    distances.insert(source, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        // Check if we've reached the target
        if node == target {
            break;
        }

        // Skip if we've found a better path
        if let Some(&best) = distances.get(&node)
            && cost > best
        {
            continue;
        }

        // Examine neighbors
        for edge in graph.graph.edges(node) {
            let next = edge.target();
            if banned_nodes.contains(next.index()) {
                continue;
            }
            if banned_edges.contains(&edge_key(node, next)) {
                continue;
            }

            let next_cost = cost + edge.weight().length;

            // Add or update distance if better using Entry API
            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                    predecessors.insert(next, node);
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                        predecessors.insert(next, node);
                    }
                }
            }
        }
    }

    let weight = *distances.get(&target)?;
    if target != source && !predecessors.contains_key(&target) {
        return None;
    }

    // Follow predecessors backward from target to source
    let mut nodes = vec![target];
    let mut current = target;
    while current != source {
        let &prev = predecessors.get(&current)?;
        nodes.push(prev);
        current = prev;
    }
    nodes.reverse();

    Some(SearchPath { nodes, weight })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph() -> StreetGraph {
        let mut builder = StreetGraph::builder();
        for (id, lat) in [(1u64, 0.0), (2, 0.001), (3, 0.002), (4, 0.003)] {
            builder.add_node(id, lat, 0.0).unwrap();
        }
        builder.add_edge(1, 2, 10.0).unwrap();
        builder.add_edge(2, 3, 10.0).unwrap();
        builder.add_edge(3, 4, 10.0).unwrap();
        // Shortcut skipping node 2
        builder.add_edge(1, 3, 15.0).unwrap();
        builder.build()
    }

    fn idx(graph: &StreetGraph, id: u64) -> NodeIndex {
        graph.node_index(id).unwrap()
    }

    #[test]
    fn finds_cheapest_path() {
        let graph = line_graph();
        let no_nodes = FixedBitSet::with_capacity(graph.node_count());
        let no_edges = HashSet::new();

        let path = shortest_path(&graph, idx(&graph, 1), idx(&graph, 4), &no_nodes, &no_edges)
            .expect("path exists");
        assert_eq!(path.weight, 25.0);
        assert_eq!(
            path.nodes,
            vec![idx(&graph, 1), idx(&graph, 3), idx(&graph, 4)]
        );
    }

    #[test]
    fn banned_edge_forces_detour() {
        let graph = line_graph();
        let no_nodes = FixedBitSet::with_capacity(graph.node_count());
        let mut banned = HashSet::new();
        banned.insert(edge_key(idx(&graph, 1), idx(&graph, 3)));

        let path = shortest_path(&graph, idx(&graph, 1), idx(&graph, 4), &no_nodes, &banned)
            .expect("detour exists");
        assert_eq!(path.weight, 30.0);
        assert_eq!(path.nodes.len(), 4);
    }

    #[test]
    fn banned_node_blocks_path() {
        let graph = line_graph();
        let mut banned_nodes = FixedBitSet::with_capacity(graph.node_count());
        banned_nodes.insert(idx(&graph, 3).index());
        let mut banned_edges = HashSet::new();
        banned_edges.insert(edge_key(idx(&graph, 2), idx(&graph, 3)));

        // Node 3 is the only way to reach node 4
        assert!(
            shortest_path(
                &graph,
                idx(&graph, 1),
                idx(&graph, 4),
                &banned_nodes,
                &banned_edges
            )
            .is_none()
        );
    }

    #[test]
    fn source_equals_target() {
        let graph = line_graph();
        let no_nodes = FixedBitSet::with_capacity(graph.node_count());
        let path = shortest_path(
            &graph,
            idx(&graph, 2),
            idx(&graph, 2),
            &no_nodes,
            &HashSet::new(),
        )
        .expect("trivial path");
        assert_eq!(path.weight, 0.0);
        assert_eq!(path.nodes, vec![idx(&graph, 2)]);
    }
}

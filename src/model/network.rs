//! Street graph storage and spatial snapping
//!
//! The graph is undirected and simple: self-loops are rejected and
//! parallel edges collapse to the shortest survivor. An R-tree over the
//! node coordinates supports snapping arbitrary points to the network.

use geo::Point;
use hashbrown::HashMap;
use log::info;
use petgraph::graph::{NodeIndex, UnGraph};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use super::components::{StreetEdge, StreetNode};
use crate::{Error, NodeId};

/// Node coordinate wrapper stored in the R-tree
#[derive(Debug, Clone)]
pub struct IndexedPoint {
    position: [f64; 2],
    node: NodeIndex,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Walkable street network around an area of interest
#[derive(Clone)]
pub struct StreetGraph {
    pub graph: UnGraph<StreetNode, StreetEdge>,
    node_ids: HashMap<NodeId, NodeIndex>,
    rtree: RTree<IndexedPoint>,
}

impl std::fmt::Debug for StreetGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreetGraph")
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}

impl StreetGraph {
    pub fn builder() -> StreetGraphBuilder {
        StreetGraphBuilder::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Resolve a provider node id to its graph index
    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_ids.get(&id).copied()
    }

    /// Provider id of a graph node
    pub fn node_id(&self, index: NodeIndex) -> Option<NodeId> {
        self.graph.node_weight(index).map(|node| node.id)
    }

    /// Coordinates of a graph node (x = longitude, y = latitude)
    pub fn node_point(&self, index: NodeIndex) -> Option<Point<f64>> {
        self.graph.node_weight(index).map(|node| node.geometry)
    }

    /// Length in meters of the edge between two adjacent nodes
    pub(crate) fn edge_length(&self, a: NodeIndex, b: NodeIndex) -> Option<f64> {
        self.graph
            .find_edge(a, b)
            .and_then(|edge| self.graph.edge_weight(edge))
            .map(|edge| edge.length)
    }

    /// Snap an arbitrary point to the nearest network node
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the graph has no nodes.
    pub fn nearest_node(&self, point: &Point<f64>) -> Result<NodeId, Error> {
        let indexed = self
            .rtree
            .nearest_neighbor(&[point.x(), point.y()])
            .ok_or_else(|| Error::InvalidInput("cannot snap to an empty graph".to_string()))?;

        self.node_id(indexed.node)
            .ok_or_else(|| Error::InvalidInput("spatial index references a missing node".to_string()))
    }
}

/// Incremental construction seam for graph providers
///
/// An OSM loader (or a test fixture) registers nodes first, then the
/// undirected segments connecting them, and finally calls
/// [`StreetGraphBuilder::build`].
#[derive(Debug, Default)]
pub struct StreetGraphBuilder {
    graph: UnGraph<StreetNode, StreetEdge>,
    node_ids: HashMap<NodeId, NodeIndex>,
}

impl StreetGraphBuilder {
    /// Register a node; repeated ids keep the first registration.
    pub fn add_node(&mut self, id: NodeId, lat: f64, lon: f64) -> Result<NodeIndex, Error> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(Error::InvalidInput(format!(
                "node {id} has non-finite coordinates ({lat}, {lon})"
            )));
        }

        if let Some(&existing) = self.node_ids.get(&id) {
            return Ok(existing);
        }

        let index = self.graph.add_node(StreetNode {
            id,
            geometry: Point::new(lon, lat),
        });
        self.node_ids.insert(id, index);
        Ok(index)
    }

    /// Register an undirected segment between two known nodes.
    ///
    /// Self-loops are rejected. A parallel edge keeps whichever length
    /// is shorter, so the built graph stays simple.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, length: f64) -> Result<(), Error> {
        if a == b {
            return Err(Error::InvalidInput(format!("self-loop on node {a}")));
        }
        if !length.is_finite() || length <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "edge {a}-{b} has invalid length {length}"
            )));
        }

        let ia = self
            .node_ids
            .get(&a)
            .copied()
            .ok_or_else(|| Error::InvalidInput(format!("edge references unknown node {a}")))?;
        let ib = self
            .node_ids
            .get(&b)
            .copied()
            .ok_or_else(|| Error::InvalidInput(format!("edge references unknown node {b}")))?;

        match self.graph.find_edge(ia, ib) {
            Some(edge) => {
                // Simplification keeps the shortest parallel segment
                if let Some(existing) = self.graph.edge_weight_mut(edge)
                    && length < existing.length
                {
                    existing.length = length;
                }
            }
            None => {
                self.graph.add_edge(ia, ib, StreetEdge { length });
            }
        }

        Ok(())
    }

    pub fn build(self) -> StreetGraph {
        let points: Vec<IndexedPoint> = self
            .graph
            .node_indices()
            .filter_map(|index| {
                self.graph.node_weight(index).map(|node| IndexedPoint {
                    position: [node.geometry.x(), node.geometry.y()],
                    node: index,
                })
            })
            .collect();

        info!(
            "Built street graph with {} nodes and {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );

        StreetGraph {
            graph: self.graph,
            node_ids: self.node_ids,
            rtree: RTree::bulk_load(points),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_graph() -> StreetGraph {
        let mut builder = StreetGraph::builder();
        builder.add_node(1, 0.0, 0.0).unwrap();
        builder.add_node(2, 0.0, 0.001).unwrap();
        builder.add_node(3, 0.001, 0.001).unwrap();
        builder.add_edge(1, 2, 111.0).unwrap();
        builder.add_edge(2, 3, 111.0).unwrap();
        builder.build()
    }

    #[test]
    fn builds_simple_graph() {
        let graph = square_graph();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn rejects_self_loop() {
        let mut builder = StreetGraph::builder();
        builder.add_node(1, 0.0, 0.0).unwrap();
        assert!(matches!(
            builder.add_edge(1, 1, 5.0),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_non_positive_length() {
        let mut builder = StreetGraph::builder();
        builder.add_node(1, 0.0, 0.0).unwrap();
        builder.add_node(2, 0.0, 0.001).unwrap();
        assert!(builder.add_edge(1, 2, 0.0).is_err());
        assert!(builder.add_edge(1, 2, f64::NAN).is_err());
        assert!(builder.add_edge(1, 2, f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_unknown_endpoint() {
        let mut builder = StreetGraph::builder();
        builder.add_node(1, 0.0, 0.0).unwrap();
        assert!(builder.add_edge(1, 99, 5.0).is_err());
    }

    #[test]
    fn parallel_edge_keeps_shortest() {
        let mut builder = StreetGraph::builder();
        builder.add_node(1, 0.0, 0.0).unwrap();
        builder.add_node(2, 0.0, 0.001).unwrap();
        builder.add_edge(1, 2, 120.0).unwrap();
        builder.add_edge(1, 2, 90.0).unwrap();
        builder.add_edge(2, 1, 200.0).unwrap();
        let graph = builder.build();

        assert_eq!(graph.edge_count(), 1);
        let a = graph.node_index(1).unwrap();
        let b = graph.node_index(2).unwrap();
        assert_eq!(graph.edge_length(a, b), Some(90.0));
    }

    #[test]
    fn nearest_node_snaps_to_closest() {
        let graph = square_graph();
        let snapped = graph.nearest_node(&Point::new(0.00101, 0.00099)).unwrap();
        assert_eq!(snapped, 3);
    }

    #[test]
    fn nearest_node_on_empty_graph_fails() {
        let graph = StreetGraph::builder().build();
        assert!(matches!(
            graph.nearest_node(&Point::new(0.0, 0.0)),
            Err(Error::InvalidInput(_))
        ));
    }
}

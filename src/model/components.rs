//! Street network components - nodes and edges

use geo::Point;

use crate::NodeId;

/// Street graph node
#[derive(Debug, Clone)]
pub struct StreetNode {
    /// Provider-assigned ID of the node (e.g. OSM)
    pub id: NodeId,
    /// Node coordinates (x = longitude, y = latitude)
    pub geometry: Point<f64>,
}

/// Street graph edge (street segment)
#[derive(Debug, Clone)]
pub struct StreetEdge {
    /// Segment length in meters
    pub length: f64,
}

impl StreetEdge {
    pub fn length_meters(&self) -> f64 {
        self.length
    }
}

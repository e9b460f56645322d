// Re-export key components
pub use crate::error::Error;
pub use crate::exposure::{ExposureEstimator, HashExposure, RankedUniform, SeededUniform};
pub use crate::geometry::{haversine_distance, path_length, walking_time_minutes};
pub use crate::model::{StreetGraph, StreetGraphBuilder};
pub use crate::route::{RoutePlanner, RouteRecord, RouteSet, compute_routes};
pub use crate::routing::{PathCandidate, k_shortest_paths};

// Core scalar types
pub use crate::DEFAULT_WALKING_SPEED;
pub use crate::NodeId;

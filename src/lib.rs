//! Shade-aware pedestrian route enumeration and ranking.
//!
//! Given a walkable street network and two snapped endpoints, this crate
//! enumerates the K shortest loopless walking paths between them, measures
//! each one geodesically, attaches a bounded sun-exposure score, and flags
//! the single recommended route. Building the network (OSM extraction,
//! geocoding) and rendering the result are collaborator concerns; the
//! boundary in both directions is [`StreetGraph`] in and [`RouteSet`] out.

pub mod error;
pub mod exposure;
pub mod geometry;
pub mod model;
pub mod prelude;
pub mod route;
pub mod routing;

pub use error::Error;
pub use exposure::{ExposureEstimator, HashExposure, RankedUniform, SeededUniform};
pub use model::{StreetEdge, StreetGraph, StreetGraphBuilder, StreetNode};
pub use route::{RoutePlanner, RouteRecord, RouteSet, compute_routes};
pub use routing::PathCandidate;

/// External (provider-assigned) street node identifier, e.g. an OSM node id.
pub type NodeId = u64;

/// Reference walking speed in meters per minute (4.8 km/h).
pub const DEFAULT_WALKING_SPEED: f64 = 80.0;

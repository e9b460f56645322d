//! Route assembly and ranking
//!
//! Turns raw engine paths into presentation-ready records: coordinates
//! resolved, distance and time measured, exposure attached, exactly one
//! route flagged as recommended.

mod to_geojson;

use geo::Point;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    Error, NodeId,
    exposure::ExposureEstimator,
    geometry::{path_length, walking_time_minutes},
    model::StreetGraph,
    routing::k_shortest_paths,
};

/// One ranked walking route, immutable once assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    /// 1-based rank in ascending path-weight order
    pub id: usize,
    /// Ordered (latitude, longitude) pairs along the route
    pub coords: Vec<(f64, f64)>,
    /// Geodesic length in meters
    pub distance_m: f64,
    /// Estimated walking time in minutes
    pub time_min: f64,
    /// Shade estimate in `[0, 100]`, higher is more shade
    pub exposure: f64,
    /// Exactly one record per set carries this flag
    pub recommended: bool,
}

/// Ordered collection of up to K routes for one origin/destination query.
///
/// Order is ascending path weight as produced by the engine, independent
/// of the exposure ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSet {
    routes: Vec<RouteRecord>,
}

impl RouteSet {
    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RouteRecord> {
        self.routes.iter()
    }

    /// The single route flagged as recommended
    pub fn recommended(&self) -> Option<&RouteRecord> {
        self.routes.iter().find(|route| route.recommended)
    }

    pub fn into_vec(self) -> Vec<RouteRecord> {
        self.routes
    }
}

impl<'a> IntoIterator for &'a RouteSet {
    type Item = &'a RouteRecord;
    type IntoIter = std::slice::Iter<'a, RouteRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

/// Compute up to `k` ranked walking routes between two graph nodes.
///
/// Routes come back sorted ascending by path weight; fewer than `k`
/// (down to one) means the graph does not support more distinct loopless
/// alternatives. The recommended flag goes to the highest exposure
/// score, ties broken by shorter distance, then by lower rank id.
///
/// # Errors
///
/// - [`Error::InvalidInput`] for an unknown endpoint, `k` of zero or a
///   non-positive walking speed
/// - [`Error::NoRoute`] when the endpoints are disconnected
/// - [`Error::EmptyResult`] if the engine claims success with zero paths
pub fn compute_routes(
    graph: &StreetGraph,
    origin: NodeId,
    destination: NodeId,
    k: usize,
    speed_m_per_min: f64,
    estimator: &dyn ExposureEstimator,
) -> Result<RouteSet, Error> {
    if !speed_m_per_min.is_finite() || speed_m_per_min <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "walking speed must be positive, got {speed_m_per_min}"
        )));
    }

    let source = graph
        .node_index(origin)
        .ok_or_else(|| Error::InvalidInput(format!("origin node {origin} not in graph")))?;
    let target = graph
        .node_index(destination)
        .ok_or_else(|| Error::InvalidInput(format!("destination node {destination} not in graph")))?;

    let paths = k_shortest_paths(graph, source, target, k)?;
    if paths.is_empty() {
        return Err(Error::EmptyResult);
    }

    let scores = estimator.estimate_all(&paths, graph);
    if scores.len() != paths.len() {
        return Err(Error::InvalidInput(format!(
            "estimator returned {} scores for {} paths",
            scores.len(),
            paths.len()
        )));
    }

    let mut routes = Vec::with_capacity(paths.len());
    for (rank, (path, score)) in paths.iter().zip(&scores).enumerate() {
        let points: Vec<Point<f64>> = path
            .nodes
            .iter()
            .map(|&index| {
                graph.node_point(index).ok_or_else(|| {
                    Error::InvalidInput("path references a missing node".to_string())
                })
            })
            .collect::<Result<_, _>>()?;

        let distance_m = path_length(&points)?;
        let time_min = walking_time_minutes(distance_m, speed_m_per_min)?;

        routes.push(RouteRecord {
            id: rank + 1,
            coords: points.iter().map(|p| (p.y(), p.x())).collect(),
            distance_m,
            time_min,
            exposure: score.clamp(0.0, 100.0),
            recommended: false,
        });
    }

    // Most shade wins; ties fall back to distance, then rank order
    let mut best = 0;
    for (idx, route) in routes.iter().enumerate().skip(1) {
        let current = &routes[best];
        if route.exposure > current.exposure
            || (route.exposure == current.exposure && route.distance_m < current.distance_m)
        {
            best = idx;
        }
    }
    routes[best].recommended = true;

    debug!(
        "Assembled {} routes between nodes {} and {}, recommending route {}",
        routes.len(),
        origin,
        destination,
        routes[best].id
    );

    Ok(RouteSet { routes })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    origin: NodeId,
    destination: NodeId,
    k: usize,
    speed_bits: u64,
}

/// Caller-owned session state: a graph plus a single-slot result cache.
///
/// The cache holds the last successful [`RouteSet`] keyed by
/// (origin, destination, k, speed); any other request recomputes and
/// overwrites the slot.
pub struct RoutePlanner {
    graph: StreetGraph,
    cache: Option<(CacheKey, RouteSet)>,
}

impl RoutePlanner {
    pub fn new(graph: StreetGraph) -> Self {
        Self { graph, cache: None }
    }

    pub fn graph(&self) -> &StreetGraph {
        &self.graph
    }

    /// Snap an arbitrary point to the nearest network node
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the graph has no nodes.
    pub fn nearest_node(&self, point: &Point<f64>) -> Result<NodeId, Error> {
        self.graph.nearest_node(point)
    }

    /// [`compute_routes`] with the single-slot cache in front.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`compute_routes`].
    pub fn compute(
        &mut self,
        origin: NodeId,
        destination: NodeId,
        k: usize,
        speed_m_per_min: f64,
        estimator: &dyn ExposureEstimator,
    ) -> Result<RouteSet, Error> {
        let key = CacheKey {
            origin,
            destination,
            k,
            speed_bits: speed_m_per_min.to_bits(),
        };

        if let Some((cached_key, cached_set)) = &self.cache
            && *cached_key == key
        {
            debug!("Serving cached routes for nodes {origin} -> {destination}");
            return Ok(cached_set.clone());
        }

        let set = compute_routes(
            &self.graph,
            origin,
            destination,
            k,
            speed_m_per_min,
            estimator,
        )?;
        self.cache = Some((key, set.clone()));
        Ok(set)
    }
}

//! Sun-exposure scoring policies
//!
//! Nothing here models real shadow physics yet. Every policy is a
//! placeholder estimate behind the [`ExposureEstimator`] seam, so a
//! future model (for example park-buffer intersection with the route
//! geometry) can replace the heuristics without touching the engine.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{model::StreetGraph, routing::PathCandidate};

/// Scores a candidate path with a shade estimate in `[0, 100]`.
///
/// Higher means more shade. Set-level policies (ranking the whole
/// `RouteSet` at once) override [`ExposureEstimator::estimate_all`];
/// per-path policies only implement [`ExposureEstimator::estimate`].
pub trait ExposureEstimator {
    fn estimate(&self, path: &PathCandidate, graph: &StreetGraph) -> f64;

    /// Score an ordered set of paths. The default maps [`Self::estimate`]
    /// over the slice, preserving order.
    fn estimate_all(&self, paths: &[PathCandidate], graph: &StreetGraph) -> Vec<f64> {
        paths.iter().map(|path| self.estimate(path, graph)).collect()
    }
}

/// FNV-1a over the external node-id sequence.
///
/// The std/hashbrown default hashers are randomly keyed per process, so
/// a stable hand-rolled hash is required for reproducible scores.
fn path_fingerprint(path: &PathCandidate, graph: &StreetGraph) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for index in &path.nodes {
        let id = graph.node_id(*index).unwrap_or(0);
        for byte in id.to_le_bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

/// Pure deterministic reference policy.
///
/// The score trends down with path length (long detours spend more time
/// in the open) and a stable hash of the node sequence spreads sibling
/// routes apart. No randomness, so identical inputs always score
/// identically.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashExposure;

impl ExposureEstimator for HashExposure {
    fn estimate(&self, path: &PathCandidate, graph: &StreetGraph) -> f64 {
        let jitter = (path_fingerprint(path, graph) % 1000) as f64 / 1000.0;
        let length_penalty = (path.weight / 100.0).min(30.0);

        (55.0 - length_penalty + jitter * 10.0).clamp(0.0, 100.0)
    }
}

/// Independent uniform draw per path from a fixed band.
///
/// The draw is keyed by the caller seed and the path fingerprint, so a
/// given (seed, path) pair always scores the same.
#[derive(Debug, Clone, Copy)]
pub struct SeededUniform {
    pub seed: u64,
    pub min: f64,
    pub max: f64,
}

impl SeededUniform {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            min: 20.0,
            max: 55.0,
        }
    }
}

impl ExposureEstimator for SeededUniform {
    fn estimate(&self, path: &PathCandidate, graph: &StreetGraph) -> f64 {
        let mut rng = StdRng::seed_from_u64(self.seed ^ path_fingerprint(path, graph));
        rng.gen_range(self.min..=self.max).clamp(0.0, 100.0)
    }
}

/// Uniform draws reordered so the first path always scores highest.
///
/// Reproduces the original "route 1 is the most shaded by construction"
/// presentation: draws are sorted descending across the set, and since
/// the engine hands paths over in ascending-weight order, the shortest
/// route receives the best score.
#[derive(Debug, Clone, Copy)]
pub struct RankedUniform {
    inner: SeededUniform,
}

impl RankedUniform {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: SeededUniform::new(seed),
        }
    }
}

impl ExposureEstimator for RankedUniform {
    fn estimate(&self, path: &PathCandidate, graph: &StreetGraph) -> f64 {
        self.inner.estimate(path, graph)
    }

    fn estimate_all(&self, paths: &[PathCandidate], graph: &StreetGraph) -> Vec<f64> {
        let mut scores = self.inner.estimate_all(paths, graph);
        scores.sort_by(|a, b| b.total_cmp(a));
        scores
    }
}

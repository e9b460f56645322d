//! Geodesic measurement over walking geometry
//!
//! Coordinate deltas inside one neighbourhood are tiny, but the
//! longitude scaling still depends on latitude, so lengths come from a
//! great-circle formula rather than flat Euclidean distance.

use geo::Point;
use itertools::Itertools;

use crate::Error;

/// Mean Earth radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points (haversine).
///
/// Pure and symmetric: `haversine_distance(a, b) == haversine_distance(b, a)`.
pub fn haversine_distance(a: &Point<f64>, b: &Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let dlat = (b.y() - a.y()).to_radians();
    let dlon = (b.x() - a.x()).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Total geodesic length in meters of an ordered coordinate sequence.
///
/// A single point has length 0.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an empty sequence.
pub fn path_length(coords: &[Point<f64>]) -> Result<f64, Error> {
    if coords.is_empty() {
        return Err(Error::InvalidInput(
            "path must contain at least one point".to_string(),
        ));
    }

    Ok(coords
        .iter()
        .tuple_windows()
        .map(|(a, b)| haversine_distance(a, b))
        .sum())
}

/// Walking time in minutes for a length at a given pace.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the speed is not strictly positive.
pub fn walking_time_minutes(length_m: f64, speed_m_per_min: f64) -> Result<f64, Error> {
    if !speed_m_per_min.is_finite() || speed_m_per_min <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "walking speed must be positive, got {speed_m_per_min}"
        )));
    }

    Ok(length_m / speed_m_per_min)
}

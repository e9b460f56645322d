use geo::{Coord, LineString};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use super::{RouteRecord, RouteSet};

impl RouteSet {
    /// Converts the route set to a `GeoJSON` `FeatureCollection`, one
    /// `LineString` feature per route.
    pub fn to_geojson(&self) -> FeatureCollection {
        FeatureCollection {
            features: self.iter().map(route_feature).collect(),
            bbox: None,
            foreign_members: None,
        }
    }

    /// # Errors
    ///
    /// Returns the underlying serialization error, which only occurs on
    /// non-finite route metrics.
    pub fn to_geojson_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_geojson())
    }
}

fn route_feature(route: &RouteRecord) -> Feature {
    // RouteRecord stores (lat, lon); GeoJSON wants lon-first coordinates
    let coords: Vec<Coord<f64>> = route
        .coords
        .iter()
        .map(|&(lat, lon)| Coord { x: lon, y: lat })
        .collect();

    let geometry = Geometry::new(GeoJsonValue::from(&LineString::new(coords)));

    let properties = json!({
        "route": route.id,
        "distance_m": route.distance_m,
        "time_min": route.time_min,
        "exposure": route.exposure,
        "recommended": route.recommended,
    });

    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: properties.as_object().cloned(),
        foreign_members: None,
    }
}

//! Circular danger areas approximated as buffered regular polygons.
//!
//! Routing services accept "areas to avoid" as `GeoJSON` polygons. Each
//! zone becomes a 16-sided polygon whose circumradius is the zone radius
//! plus [`SAFETY_BUFFER_METERS`].
//!
//! Meters are converted to degrees with a flat approximation:
//! [`METERS_PER_DEGREE`] per degree of latitude, and longitude offsets are
//! scaled by `1 / cos(latitude)` for meridian convergence.

use std::f64::consts::TAU;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use safe_campus_zone_models::DangerZone;

/// Distance added beyond a zone's nominal radius.
pub const SAFETY_BUFFER_METERS: f64 = 20.0;

/// Approximate meters per degree of latitude.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Number of sides of each avoidance polygon.
pub const POLYGON_SEGMENTS: usize = 16;

/// Builds the closed ring around `zone`: [`POLYGON_SEGMENTS`] vertices at
/// angles `i * 2π / 16`, followed by the first vertex again (17 points).
///
/// Coordinates are `x = longitude`, `y = latitude`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn avoidance_ring(zone: &DangerZone) -> LineString<f64> {
    let radius_degrees = (zone.radius_meters + SAFETY_BUFFER_METERS) / METERS_PER_DEGREE;
    let lon_scale = zone.latitude.to_radians().cos();

    let mut coords: Vec<Coord<f64>> = (0..POLYGON_SEGMENTS)
        .map(|i| {
            let angle = i as f64 * TAU / POLYGON_SEGMENTS as f64;
            Coord {
                x: zone.longitude + radius_degrees * angle.cos() / lon_scale,
                y: zone.latitude + radius_degrees * angle.sin(),
            }
        })
        .collect();

    // Exact copy of the first vertex closes the ring.
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }

    LineString::new(coords)
}

/// The avoidance area of a single zone.
#[must_use]
pub fn avoidance_polygon(zone: &DangerZone) -> Polygon<f64> {
    Polygon::new(avoidance_ring(zone), Vec::new())
}

/// The avoidance areas of every zone in `zones`, in order.
#[must_use]
pub fn avoidance_multipolygon<'a, I>(zones: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = &'a DangerZone>,
{
    MultiPolygon::new(zones.into_iter().map(avoidance_polygon).collect())
}

/// Serialises `polygons` as a `GeoJSON` `MultiPolygon` geometry object.
#[must_use]
pub fn to_geojson(polygons: &MultiPolygon<f64>) -> serde_json::Value {
    let geometry = geojson::Geometry::new(geojson::Value::from(polygons));
    serde_json::to_value(&geometry).unwrap_or_else(|e| {
        log::error!("Failed to serialise avoidance polygons: {e}");
        serde_json::Value::Null
    })
}

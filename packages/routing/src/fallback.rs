//! Local route used when every external routing service fails.
//!
//! The path detours through the blue light station that minimises the
//! summed straight-line distance `start -> station -> end`, measured in
//! degree space. With no stations configured the path is the direct line.
//!
//! No service reports a duration here, so it is estimated from the path
//! length at [`WALKING_SPEED_METERS_PER_MINUTE`]. The estimate is flagged
//! on the result via `duration_is_estimate`.

use geo::{Distance as _, Haversine, Point};
use safe_campus_routing_models::{RouteResult, RouteSource};
use safe_campus_zone_models::{BlueLightStation, Coordinate};

/// Assumed walking pace for duration estimates (about 1.33 m/s).
pub const WALKING_SPEED_METERS_PER_MINUTE: f64 = 80.0;

/// The station minimising `|start - station| + |station - end|`.
///
/// Ties keep the first station in configuration order.
#[must_use]
pub fn nearest_station<'a>(
    start: &Coordinate,
    end: &Coordinate,
    stations: &'a [BlueLightStation],
) -> Option<&'a BlueLightStation> {
    let detour = |station: &BlueLightStation| {
        let location = station.location();
        start.degree_distance(&location) + location.degree_distance(end)
    };

    stations.iter().fold(None, |best, station| match best {
        Some(current) if detour(current) <= detour(station) => Some(current),
        _ => Some(station),
    })
}

/// Haversine length of `path` in meters.
#[must_use]
pub fn path_length_meters(path: &[Coordinate]) -> f64 {
    path.windows(2)
        .map(|pair| {
            let a = Point::new(pair[0].longitude, pair[0].latitude);
            let b = Point::new(pair[1].longitude, pair[1].latitude);
            Haversine.distance(a, b)
        })
        .sum()
}

/// Walking time in seconds for `distance_meters` at the assumed pace.
#[must_use]
pub fn estimate_duration_seconds(distance_meters: f64) -> f64 {
    distance_meters / WALKING_SPEED_METERS_PER_MINUTE * 60.0
}

/// Builds the local fallback route. Never fails.
#[must_use]
pub fn local_route(
    start: Coordinate,
    end: Coordinate,
    stations: &[BlueLightStation],
) -> RouteResult {
    let coordinates = nearest_station(&start, &end, stations).map_or_else(
        || vec![start, end],
        |station| {
            let location = station.location();
            log::debug!("Local fallback routing via station {}", station.id);
            vec![
                start,
                start.midpoint(&location),
                location,
                location.midpoint(&end),
                end,
            ]
        },
    );

    let distance_meters = path_length_meters(&coordinates);

    RouteResult {
        coordinates,
        distance_meters,
        duration_seconds: estimate_duration_seconds(distance_meters),
        steps: None,
        source: RouteSource::LocalFallback,
        duration_is_estimate: true,
        avoided_zone_ids: Vec::new(),
    }
}

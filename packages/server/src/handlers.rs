//! HTTP handler functions for the safe campus API.

use actix_web::{HttpResponse, web};
use safe_campus_geocoder::{DEFAULT_LIMIT, GeocodeError};
use safe_campus_server_models::{
    ApiHealth, ApiPlace, ApiRoute, ApiStation, ApiZone, GeocodeQueryParams, RouteQueryParams,
    ZonesQueryParams,
};
use safe_campus_zone::score;
use safe_campus_zone_models::Coordinate;

use crate::AppState;

/// Upper bound on autocomplete candidates per request.
const MAX_GEOCODE_LIMIT: u32 = 20;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/zones`
///
/// Returns every danger zone scored at `at` (default: now).
pub async fn zones(
    state: web::Data<AppState>,
    params: web::Query<ZonesQueryParams>,
) -> HttpResponse {
    let at = match params.at.as_deref() {
        Some(raw) => match score::parse_local_time(raw) {
            Some(at) => at,
            None => return bad_request(&format!("Invalid 'at' time: {raw}")),
        },
        None => chrono::Local::now().naive_local(),
    };

    let zones: Vec<ApiZone> = score::assess_all(state.router.campus().danger_zones(), at)
        .into_iter()
        .map(ApiZone::from)
        .collect();

    HttpResponse::Ok().json(zones)
}

/// `GET /api/stations`
pub async fn stations(state: web::Data<AppState>) -> HttpResponse {
    let stations: Vec<ApiStation> = state
        .router
        .campus()
        .stations()
        .iter()
        .map(ApiStation::from)
        .collect();

    HttpResponse::Ok().json(stations)
}

/// `GET /api/route`
///
/// Computes a safe walking route between two `lat,lon` points. Always
/// succeeds for valid input; the `source` field tells which stage
/// produced it.
pub async fn route(
    state: web::Data<AppState>,
    params: web::Query<RouteQueryParams>,
) -> HttpResponse {
    let start = match params.start.parse::<Coordinate>() {
        Ok(c) => c,
        Err(e) => return bad_request(&format!("Invalid 'start': {e}")),
    };
    let end = match params.end.parse::<Coordinate>() {
        Ok(c) => c,
        Err(e) => return bad_request(&format!("Invalid 'end': {e}")),
    };

    let route = state.router.compute_safe_route(start, end).await;
    log::debug!(
        "Route {start} -> {end} via {} ({} points)",
        route.source,
        route.coordinates.len()
    );

    HttpResponse::Ok().json(ApiRoute::from(route))
}

/// `GET /api/geocode`
///
/// Address autocomplete, best candidate first.
pub async fn geocode(
    state: web::Data<AppState>,
    params: web::Query<GeocodeQueryParams>,
) -> HttpResponse {
    let near = match params.near.as_deref().map(str::parse::<Coordinate>) {
        Some(Ok(c)) => Some(c),
        Some(Err(e)) => return bad_request(&format!("Invalid 'near': {e}")),
        None => None,
    };
    let limit = geocode_limit(params.limit);

    match state.geocoder.autocomplete(&params.text, limit, near).await {
        Ok(places) => {
            let places: Vec<ApiPlace> = places.into_iter().map(ApiPlace::from).collect();
            HttpResponse::Ok().json(places)
        }
        Err(GeocodeError::MissingApiKey) => {
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": "Geocoding is not configured"
            }))
        }
        Err(e) => {
            log::error!("Failed to geocode '{}': {e}", params.text);
            HttpResponse::BadGateway().json(serde_json::json!({
                "error": "Failed to geocode"
            }))
        }
    }
}

fn geocode_limit(requested: Option<u32>) -> u32 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_GEOCODE_LIMIT)
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
}

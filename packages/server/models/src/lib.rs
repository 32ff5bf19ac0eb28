#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the safe campus server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the domain types so the API contract can evolve independently.

use safe_campus_geocoder::GeocodedPlace;
use safe_campus_routing_models::{RouteResult, RouteSource, RouteStep};
use safe_campus_zone_models::{BlueLightStation, Intensity, ZoneAssessment};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// A danger zone with its current level, as rendered on the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiZone {
    /// Zone ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
    /// Radius in meters.
    pub radius_meters: f64,
    /// Danger level (0-100) at the requested time.
    pub danger_level: u8,
    /// Intensity bucket at the requested time.
    pub intensity: Intensity,
    /// Recently reported incidents.
    pub recent_incidents: u32,
    /// Incident summaries.
    pub incident_summaries: Vec<String>,
}

impl From<ZoneAssessment> for ApiZone {
    fn from(assessment: ZoneAssessment) -> Self {
        let zone = assessment.zone;
        Self {
            id: zone.id,
            name: zone.name,
            latitude: zone.latitude,
            longitude: zone.longitude,
            radius_meters: zone.radius_meters,
            danger_level: assessment.danger_level,
            intensity: assessment.intensity,
            recent_incidents: zone.recent_incidents,
            incident_summaries: zone.incident_summaries,
        }
    }
}

/// A blue light emergency station.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStation {
    /// Station ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Where to find it.
    pub description: Option<String>,
}

impl From<&BlueLightStation> for ApiStation {
    fn from(station: &BlueLightStation) -> Self {
        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            latitude: station.latitude,
            longitude: station.longitude,
            description: station.description.clone(),
        }
    }
}

/// One turn-by-turn instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRouteStep {
    /// Instruction text.
    pub instruction: String,
    /// Step length in meters.
    pub distance_meters: f64,
    /// Step duration in seconds.
    pub duration_seconds: f64,
}

impl From<RouteStep> for ApiRouteStep {
    fn from(step: RouteStep) -> Self {
        Self {
            instruction: step.instruction,
            distance_meters: step.distance_meters,
            duration_seconds: step.duration_seconds,
        }
    }
}

/// A computed walking route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRoute {
    /// Path as `[lon, lat]` pairs (`GeoJSON` order).
    pub coordinates: Vec<[f64; 2]>,
    /// Total length in meters.
    pub distance_meters: f64,
    /// Total duration in seconds.
    pub duration_seconds: f64,
    /// Whether the duration is a walking-pace estimate.
    pub duration_is_estimate: bool,
    /// Turn-by-turn instructions, if available.
    pub steps: Vec<ApiRouteStep>,
    /// Which fallback stage produced the route.
    pub source: RouteSource,
    /// Whether danger zones were excluded when computing the route.
    pub avoids_zones: bool,
    /// IDs of zones the route was computed to avoid.
    pub avoided_zone_ids: Vec<String>,
}

impl From<RouteResult> for ApiRoute {
    fn from(route: RouteResult) -> Self {
        Self {
            coordinates: route.coordinates.iter().map(|c| c.to_lon_lat()).collect(),
            distance_meters: route.distance_meters,
            duration_seconds: route.duration_seconds,
            duration_is_estimate: route.duration_is_estimate,
            steps: route
                .steps
                .unwrap_or_default()
                .into_iter()
                .map(ApiRouteStep::from)
                .collect(),
            source: route.source,
            avoids_zones: route.source.avoids_zones(),
            avoided_zone_ids: route.avoided_zone_ids,
        }
    }
}

/// A geocoding candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPlace {
    /// Formatted address.
    pub formatted: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Provider confidence (0-1).
    pub confidence: Option<f64>,
    /// Provider result type.
    pub result_type: Option<String>,
}

impl From<GeocodedPlace> for ApiPlace {
    fn from(place: GeocodedPlace) -> Self {
        Self {
            formatted: place.formatted,
            latitude: place.latitude,
            longitude: place.longitude,
            confidence: place.confidence,
            result_type: place.result_type,
        }
    }
}

/// Query parameters for the zones endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZonesQueryParams {
    /// Local time to score at (`2024-03-04T21:00:00`, or RFC 3339 which is
    /// converted to server-local time). Defaults to now.
    pub at: Option<String>,
}

/// Query parameters for the route endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteQueryParams {
    /// Start point as `lat,lon`.
    pub start: String,
    /// End point as `lat,lon`.
    pub end: String,
}

/// Query parameters for the geocode endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeQueryParams {
    /// Free-text query.
    pub text: String,
    /// Maximum number of candidates.
    pub limit: Option<u32>,
    /// Optional `lat,lon` to bias results toward.
    pub near: Option<String>,
}

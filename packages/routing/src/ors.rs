//! `OpenRouteService` foot-routing client with polygon avoidance.
//!
//! `POST {base_url}/v2/directions/foot-walking/geojson` with the API key in
//! the `Authorization` header. The response is a `GeoJSON`
//! `FeatureCollection`; the first feature's geometry is the path and its
//! `properties.summary` carries distance (meters) and duration (seconds).
//!
//! See <https://openrouteservice.org/dev/#/api-docs/v2/directions/{profile}/geojson/post>

use safe_campus_zone_models::Coordinate;
use serde_json::{Value, json};

use crate::{AvoidanceRouter, ProviderRoute, RouteStep, RoutingError, body_preview, parse_line};

/// Default public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

/// Routing profile used for every request.
pub const PROFILE: &str = "foot-walking";

const SERVICE: &str = "OpenRouteService";

/// `OpenRouteService` directions client.
#[derive(Debug, Clone)]
pub struct OrsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OrsClient {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn directions_url(&self) -> String {
        format!("{}/v2/directions/{PROFILE}/geojson", self.base_url)
    }
}

#[async_trait::async_trait]
impl AvoidanceRouter for OrsClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn route_avoiding(
        &self,
        start: Coordinate,
        end: Coordinate,
        avoid_polygons: Option<&Value>,
    ) -> Result<Option<ProviderRoute>, RoutingError> {
        let url = self.directions_url();
        let body = build_request_body(start, end, avoid_polygons);
        log::debug!("Calling {SERVICE}: {url}");

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(RoutingError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body: body_preview(&text),
            });
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| RoutingError::Parse {
            message: format!("{SERVICE} response was not valid JSON: {e}"),
        })?;
        parse_response(&json)
    }
}

/// Builds the directions request body.
///
/// `options` is omitted entirely when there is nothing to avoid.
#[must_use]
pub fn build_request_body(
    start: Coordinate,
    end: Coordinate,
    avoid_polygons: Option<&Value>,
) -> Value {
    let mut body = json!({
        "coordinates": [start.to_lon_lat(), end.to_lon_lat()],
        "instructions": true,
    });

    if let Some(polygons) = avoid_polygons {
        body["options"] = json!({ "avoid_polygons": polygons });
    }

    body
}

/// Parses a directions `FeatureCollection`.
///
/// Returns `Ok(None)` when there are no features or the first feature's
/// path is empty.
///
/// # Errors
///
/// Returns [`RoutingError::Parse`] if the document does not have the
/// expected shape.
pub fn parse_response(body: &Value) -> Result<Option<ProviderRoute>, RoutingError> {
    let features = body
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| RoutingError::Parse {
            message: format!("{SERVICE} response missing 'features' array"),
        })?;

    let Some(first) = features.first() else {
        return Ok(None);
    };

    let coordinates = first
        .pointer("/geometry/coordinates")
        .map(parse_line)
        .transpose()?
        .unwrap_or_default();

    if coordinates.is_empty() {
        return Ok(None);
    }

    let summary = first.pointer("/properties/summary");
    let distance_meters = summary
        .and_then(|s| s.get("distance"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let duration_seconds = summary
        .and_then(|s| s.get("duration"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    Ok(Some(ProviderRoute {
        coordinates,
        distance_meters,
        duration_seconds,
        steps: parse_steps(first),
    }))
}

fn parse_steps(feature: &Value) -> Option<Vec<RouteStep>> {
    let segments = feature
        .pointer("/properties/segments")
        .and_then(Value::as_array)?;

    let steps: Vec<RouteStep> = segments
        .iter()
        .filter_map(|segment| segment.get("steps").and_then(Value::as_array))
        .flatten()
        .map(|step| RouteStep {
            instruction: step
                .get("instruction")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            distance_meters: step.get("distance").and_then(Value::as_f64).unwrap_or(0.0),
            duration_seconds: step.get("duration").and_then(Value::as_f64).unwrap_or(0.0),
        })
        .collect();

    if steps.is_empty() { None } else { Some(steps) }
}

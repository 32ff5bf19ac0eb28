//! Geoapify waypoint routing client.
//!
//! `GET {base_url}/v1/routing?waypoints=lat,lon|lat,lon&mode=walk`. The
//! response is a `FeatureCollection` whose geometry is a `LineString` or,
//! for multi-leg routes, a `MultiLineString` with one line per leg.
//!
//! See <https://apidocs.geoapify.com/docs/routing/>

use safe_campus_zone_models::Coordinate;
use serde_json::Value;

use crate::{ProviderRoute, RouteStep, RoutingError, WaypointRouter, body_preview, parse_line};

/// Default public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.geoapify.com";

/// Travel mode used for every request.
pub const MODE: &str = "walk";

const SERVICE: &str = "Geoapify";

/// Geoapify routing client.
#[derive(Debug, Clone)]
pub struct GeoapifyClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeoapifyClient {
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

    fn query_params(&self, waypoints: &[Coordinate]) -> [(&'static str, String); 3] {
        [
            ("waypoints", format_waypoints(waypoints)),
            ("mode", MODE.to_string()),
            ("apiKey", self.api_key.clone()),
        ]
    }
}

#[async_trait::async_trait]
impl WaypointRouter for GeoapifyClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn route(&self, waypoints: &[Coordinate]) -> Result<Option<ProviderRoute>, RoutingError> {
        let url = format!("{}/v1/routing", self.base_url);
        let params = self.query_params(waypoints);
        log::debug!("Calling {SERVICE}: {url}?waypoints={}&mode={MODE}", params[0].1);

        let resp = self.client.get(&url).query(&params).send().await?;

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

/// Formats waypoints as `lat,lon|lat,lon|...`.
#[must_use]
pub fn format_waypoints(waypoints: &[Coordinate]) -> String {
    waypoints
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

/// Parses a routing `FeatureCollection`.
///
/// Returns `Ok(None)` when there are no features or the path is empty.
///
/// # Errors
///
/// Returns [`RoutingError::Parse`] if the document does not have the
/// expected shape or uses an unsupported geometry type.
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

    let Some(geometry) = first.get("geometry") else {
        return Ok(None);
    };

    let coordinates = parse_geometry(geometry)?;
    if coordinates.is_empty() {
        return Ok(None);
    }

    let properties = first.get("properties");
    let distance_meters = properties
        .and_then(|p| p.get("distance"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let duration_seconds = properties
        .and_then(|p| p.get("time"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    Ok(Some(ProviderRoute {
        coordinates,
        distance_meters,
        duration_seconds,
        steps: properties.and_then(parse_steps),
    }))
}

/// Flattens a `LineString` or `MultiLineString` into one path.
///
/// Each leg that follows a non-empty path starts where the path ended, so
/// its first point is dropped.
fn parse_geometry(geometry: &Value) -> Result<Vec<Coordinate>, RoutingError> {
    let kind = geometry.get("type").and_then(Value::as_str).unwrap_or_default();
    let Some(coordinates) = geometry.get("coordinates") else {
        return Ok(Vec::new());
    };

    match kind {
        "LineString" => parse_line(coordinates),
        "MultiLineString" => {
            let legs = coordinates.as_array().ok_or_else(|| RoutingError::Parse {
                message: "MultiLineString coordinates are not an array".to_string(),
            })?;

            let mut path = Vec::new();
            for leg in legs {
                let points = parse_line(leg)?;
                let skip = usize::from(!path.is_empty());
                path.extend(points.into_iter().skip(skip));
            }
            Ok(path)
        }
        other => Err(RoutingError::Parse {
            message: format!("unsupported {SERVICE} geometry type '{other}'"),
        }),
    }
}

fn parse_steps(properties: &Value) -> Option<Vec<RouteStep>> {
    let legs = properties.get("legs").and_then(Value::as_array)?;

    let steps: Vec<RouteStep> = legs
        .iter()
        .filter_map(|leg| leg.get("steps").and_then(Value::as_array))
        .flatten()
        .map(|step| RouteStep {
            instruction: step
                .pointer("/instruction/text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            distance_meters: step.get("distance").and_then(Value::as_f64).unwrap_or(0.0),
            duration_seconds: step.get("time").and_then(Value::as_f64).unwrap_or(0.0),
        })
        .collect();

    if steps.is_empty() { None } else { Some(steps) }
}

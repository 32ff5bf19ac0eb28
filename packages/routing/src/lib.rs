#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Safe walking route selection.
//!
//! [`SafeRouter::compute_safe_route`] produces a walking route between two
//! points that, on a best-effort basis, avoids danger zones currently
//! scored `medium` or `high`. It tries three strategies in order and
//! returns the first usable result:
//!
//! 1. **`OpenRouteService`** foot routing with the active zones submitted
//!    as `avoid_polygons` (see [`ors`]).
//! 2. **Geoapify** walking route with no avoidance (see [`geoapify`]).
//! 3. A **local path** through the nearest blue light station (see
//!    [`fallback`]). This stage never fails.
//!
//! Provider errors are logged and absorbed; the chain itself cannot fail.
//! The stage that produced a route is recorded in
//! [`RouteResult::source`].

pub mod config;
pub mod fallback;
pub mod geoapify;
pub mod ors;
pub mod router;

use safe_campus_zone_models::Coordinate;
use thiserror::Error;

pub use config::RoutingConfig;
pub use router::SafeRouter;
pub use safe_campus_routing_models::{RouteResult, RouteSource, RouteStep};

/// A path as reported by an external routing service.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRoute {
    /// Ordered path points.
    pub coordinates: Vec<Coordinate>,
    /// Length in meters.
    pub distance_meters: f64,
    /// Duration in seconds.
    pub duration_seconds: f64,
    /// Turn-by-turn instructions, if the service returned any.
    pub steps: Option<Vec<RouteStep>>,
}

/// Errors from external routing services.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{service} returned status {status}: {body}")]
    Status {
        /// Service name.
        service: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// A foot-routing service that accepts polygons to avoid.
#[async_trait::async_trait]
pub trait AvoidanceRouter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Requests a walking route from `start` to `end` that avoids
    /// `avoid_polygons` (a `GeoJSON` `MultiPolygon`, or `None` when there
    /// is nothing to avoid).
    ///
    /// Returns `Ok(None)` when the service found no route.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError`] if the request or response parsing fails.
    async fn route_avoiding(
        &self,
        start: Coordinate,
        end: Coordinate,
        avoid_polygons: Option<&serde_json::Value>,
    ) -> Result<Option<ProviderRoute>, RoutingError>;
}

/// A routing service that walks through an ordered list of waypoints.
#[async_trait::async_trait]
pub trait WaypointRouter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Requests a walking route through `waypoints` (at least two).
    ///
    /// Returns `Ok(None)` when the service found no route.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError`] if the request or response parsing fails.
    async fn route(&self, waypoints: &[Coordinate]) -> Result<Option<ProviderRoute>, RoutingError>;
}

/// Maximum length of a response body included in error messages.
const BODY_PREVIEW_LEN: usize = 300;

/// Truncates a response body for inclusion in [`RoutingError::Status`].
fn body_preview(text: &str) -> String {
    if text.len() > BODY_PREVIEW_LEN {
        let mut end = BODY_PREVIEW_LEN;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text.to_string()
    }
}

/// Reads a `[lon, lat, ...]` `GeoJSON` position.
fn parse_position(value: &serde_json::Value) -> Option<Coordinate> {
    let pair = value.as_array()?;
    if pair.len() < 2 {
        return None;
    }
    Some(Coordinate::from_lon_lat([pair[0].as_f64()?, pair[1].as_f64()?]))
}

/// Reads a `GeoJSON` `LineString` coordinate array.
fn parse_line(value: &serde_json::Value) -> Result<Vec<Coordinate>, RoutingError> {
    let positions = value.as_array().ok_or_else(|| RoutingError::Parse {
        message: "line coordinates are not an array".to_string(),
    })?;

    positions
        .iter()
        .map(|p| {
            parse_position(p).ok_or_else(|| RoutingError::Parse {
                message: format!("invalid position {p}"),
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Accepts one connection on a local port, answers it with `status`
    /// and `body`, and yields the raw request (headers and body).
    pub async fn respond_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
             content-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0_u8; 4096];
            while !request_complete(&request) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (base_url, handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&request[..header_end]);
        let content_length = headers
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }
}

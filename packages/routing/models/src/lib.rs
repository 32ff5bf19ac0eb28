#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route result types.
//!
//! A [`RouteResult`] is built fresh for every route request and never
//! persisted. It records which stage of the fallback chain produced it so
//! callers can tell a zone-avoiding route from a best-effort one.

use safe_campus_zone_models::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which stage of the fallback chain produced a route.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RouteSource {
    /// Foot routing with the currently dangerous zones submitted as
    /// polygons to avoid.
    AvoidPolygons,
    /// Walking route from the waypoint routing service with no avoidance.
    Unconstrained,
    /// Local path through the nearest blue light station.
    LocalFallback,
}

impl RouteSource {
    /// Whether the route was computed with danger zones excluded.
    #[must_use]
    pub const fn avoids_zones(self) -> bool {
        matches!(self, Self::AvoidPolygons)
    }
}

/// One turn-by-turn instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    /// Human-readable instruction (e.g. "Turn left onto Green Street").
    pub instruction: String,
    /// Length of this step in meters.
    pub distance_meters: f64,
    /// Duration of this step in seconds.
    pub duration_seconds: f64,
}

/// A walking path from start to end, both inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Ordered path points.
    pub coordinates: Vec<Coordinate>,
    /// Total length in meters.
    pub distance_meters: f64,
    /// Total duration in seconds.
    pub duration_seconds: f64,
    /// Turn-by-turn instructions, when the provider supplies them.
    pub steps: Option<Vec<RouteStep>>,
    /// Fallback stage that produced this route.
    pub source: RouteSource,
    /// `true` when the duration was derived from distance at a fixed
    /// walking speed rather than reported by a routing service.
    pub duration_is_estimate: bool,
    /// Zones submitted as areas to avoid. Empty unless
    /// `source` is [`RouteSource::AvoidPolygons`].
    pub avoided_zone_ids: Vec<String>,
}

impl RouteResult {
    /// First point of the path.
    #[must_use]
    pub fn start(&self) -> Option<&Coordinate> {
        self.coordinates.first()
    }

    /// Last point of the path.
    #[must_use]
    pub fn end(&self) -> Option<&Coordinate> {
        self.coordinates.last()
    }
}

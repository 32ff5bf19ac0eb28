#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Danger zone, blue light station, and coordinate types.
//!
//! Zones and stations are static campus configuration. They are never
//! mutated at runtime; a zone's danger level is derived on every read by
//! the scorer in `safe_campus_zone`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Danger level at or above which a zone is classified [`Intensity::High`].
pub const HIGH_THRESHOLD: u8 = 70;

/// Danger level at or above which a zone is classified [`Intensity::Medium`].
pub const MEDIUM_THRESHOLD: u8 = 45;

/// Base score used when a zone does not define one.
pub const DEFAULT_BASE_SCORE: u8 = 50;

/// Upper bound for base scores and computed danger levels.
pub const MAX_SCORE: u8 = 100;

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if the latitude and longitude are finite and within
    /// WGS84 bounds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// The point halfway between `self` and `other` in degree space.
    #[must_use]
    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new(
            (self.latitude + other.latitude) / 2.0,
            (self.longitude + other.longitude) / 2.0,
        )
    }

    /// Straight-line distance in degree space (not geodesic).
    #[must_use]
    pub fn degree_distance(&self, other: &Self) -> f64 {
        (self.latitude - other.latitude).hypot(self.longitude - other.longitude)
    }

    /// `[lon, lat]`, the `GeoJSON` axis order.
    #[must_use]
    pub const fn to_lon_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    #[must_use]
    pub const fn from_lon_lat(lon_lat: [f64; 2]) -> Self {
        Self::new(lon_lat[1], lon_lat[0])
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Error returned when a `"lat,lon"` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateParseError {
    /// The input was not two comma-separated components.
    #[error("expected 'lat,lon', got '{0}'")]
    Format(String),

    /// A component was not a number.
    #[error("invalid number in '{0}'")]
    Number(String),

    /// The point lies outside WGS84 bounds.
    #[error("coordinate out of range: '{0}'")]
    OutOfRange(String),
}

impl FromStr for Coordinate {
    type Err = CoordinateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 2 {
            return Err(CoordinateParseError::Format(s.to_string()));
        }
        let lat = parts[0]
            .trim()
            .parse::<f64>()
            .map_err(|_| CoordinateParseError::Number(s.to_string()))?;
        let lon = parts[1]
            .trim()
            .parse::<f64>()
            .map_err(|_| CoordinateParseError::Number(s.to_string()))?;

        let coordinate = Self::new(lat, lon);
        if !coordinate.is_valid() {
            return Err(CoordinateParseError::OutOfRange(s.to_string()));
        }
        Ok(coordinate)
    }
}

/// Coarse classification of a numeric danger level.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Intensity {
    /// Below [`MEDIUM_THRESHOLD`].
    Low,
    /// [`MEDIUM_THRESHOLD`] up to (excluding) [`HIGH_THRESHOLD`].
    Medium,
    /// [`HIGH_THRESHOLD`] and above.
    High,
}

impl Intensity {
    /// Buckets a danger level.
    #[must_use]
    pub const fn from_level(level: u8) -> Self {
        if level >= HIGH_THRESHOLD {
            Self::High
        } else if level >= MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Whether routing should try to avoid zones of this intensity.
    #[must_use]
    pub const fn should_avoid(self) -> bool {
        matches!(self, Self::Medium | Self::High)
    }
}

/// A circular area with a time-varying risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DangerZone {
    /// Stable identifier.
    pub id: String,
    /// Human-readable name shown on the map.
    pub name: String,
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
    /// Radius of the danger area in meters.
    pub radius_meters: f64,
    /// Baseline risk (0-100). Defaults to [`DEFAULT_BASE_SCORE`].
    #[serde(default)]
    pub base_score: Option<u8>,
    /// Local hours (0-23) during which the zone is more dangerous.
    #[serde(default)]
    pub peak_hours: Vec<u8>,
    /// Weekdays (0-6, Sunday = 0) during which the zone is more dangerous.
    /// Zones without peak days skip the weekday factor entirely.
    #[serde(default)]
    pub peak_days: Option<Vec<u8>>,
    /// Number of recently reported incidents. Display only.
    #[serde(default)]
    pub recent_incidents: u32,
    /// Free-text incident summaries. Display only.
    #[serde(default)]
    pub incident_summaries: Vec<String>,
}

impl DangerZone {
    #[must_use]
    pub const fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// The base score with the default applied and clamped to
    /// [`MAX_SCORE`].
    #[must_use]
    pub fn effective_base_score(&self) -> u8 {
        self.base_score.unwrap_or(DEFAULT_BASE_SCORE).min(MAX_SCORE)
    }
}

/// A fixed emergency callbox location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueLightStation {
    /// Stable identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Where to find it (e.g. "North entrance of the library").
    #[serde(default)]
    pub description: Option<String>,
}

impl BlueLightStation {
    #[must_use]
    pub const fn location(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A zone together with its danger level at a specific instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAssessment {
    /// The zone definition.
    pub zone: DangerZone,
    /// Computed danger level (0-100).
    pub danger_level: u8,
    /// Bucket of `danger_level`.
    pub intensity: Intensity,
}

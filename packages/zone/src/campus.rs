//! Read-only campus data: danger zones and blue light stations.
//!
//! The default campus is embedded at compile time from the TOML files in
//! `campus/`. A different campus can be supplied as a single TOML file
//! containing `[[zones]]` and `[[stations]]` tables, selected at runtime
//! with the `CAMPUS_CONFIG_PATH` environment variable.
//!
//! Consumers depend on the [`CampusRepository`] trait so tests can inject
//! fixture data.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use safe_campus_zone_models::{BlueLightStation, DangerZone};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an alternative campus TOML file.
pub const CAMPUS_CONFIG_PATH_ENV: &str = "CAMPUS_CONFIG_PATH";

const EMBEDDED_ZONES: &str = include_str!("../campus/zones.toml");
const EMBEDDED_STATIONS: &str = include_str!("../campus/stations.toml");

/// Read-only access to campus safety data.
pub trait CampusRepository: Send + Sync {
    /// All configured danger zones.
    fn danger_zones(&self) -> &[DangerZone];

    /// All configured blue light stations.
    fn stations(&self) -> &[BlueLightStation];
}

/// Errors from loading or validating campus configuration.
#[derive(Debug, Error)]
pub enum CampusError {
    /// The configuration file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML was malformed or did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The data parsed but violates an invariant.
    #[error("Invalid campus configuration: {message}")]
    Invalid {
        /// Description of the violation.
        message: String,
    },
}

#[derive(Debug, Default, Deserialize)]
struct CampusFile {
    #[serde(default)]
    zones: Vec<DangerZone>,
    #[serde(default)]
    stations: Vec<BlueLightStation>,
}

/// Danger zones and stations for one campus.
#[derive(Debug, Clone, Default)]
pub struct CampusConfig {
    zones: Vec<DangerZone>,
    stations: Vec<BlueLightStation>,
}

impl CampusConfig {
    /// Builds a validated configuration from in-memory data.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::Invalid`] if any zone or station violates an
    /// invariant (see [`CampusConfig::validate`]).
    pub fn new(
        zones: Vec<DangerZone>,
        stations: Vec<BlueLightStation>,
    ) -> Result<Self, CampusError> {
        let config = Self { zones, stations };
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document containing `[[zones]]` and/or `[[stations]]`.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError`] if the TOML is malformed or invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, CampusError> {
        let file: CampusFile = toml::de::from_str(toml_str)?;
        Self::new(file.zones, file.stations)
    }

    /// Loads a campus from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError`] if the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: &Path) -> Result<Self, CampusError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CampusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        log::info!(
            "Loaded {} danger zones and {} blue light stations from {}",
            config.zones.len(),
            config.stations.len(),
            path.display()
        );
        Ok(config)
    }

    /// The default campus compiled into the binary.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (a build-time guarantee
    /// covered by tests).
    #[must_use]
    pub fn embedded() -> Self {
        let zones: CampusFile = toml::de::from_str(EMBEDDED_ZONES)
            .unwrap_or_else(|e| panic!("Failed to parse embedded zones: {e}"));
        let stations: CampusFile = toml::de::from_str(EMBEDDED_STATIONS)
            .unwrap_or_else(|e| panic!("Failed to parse embedded stations: {e}"));

        Self::new(zones.zones, stations.stations)
            .unwrap_or_else(|e| panic!("Embedded campus is invalid: {e}"))
    }

    /// Loads the campus named by `CAMPUS_CONFIG_PATH`, or the embedded
    /// campus when the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError`] if the named file cannot be loaded.
    pub fn from_env() -> Result<Self, CampusError> {
        match std::env::var(CAMPUS_CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => {
                log::debug!("{CAMPUS_CONFIG_PATH_ENV} not set, using embedded campus");
                Ok(Self::embedded())
            }
        }
    }

    /// Checks identifier uniqueness and value ranges.
    ///
    /// Base scores above 100 are accepted here and clamped when scored.
    ///
    /// # Errors
    ///
    /// Returns [`CampusError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), CampusError> {
        let mut zone_ids = BTreeSet::new();
        for zone in &self.zones {
            if !zone_ids.insert(zone.id.as_str()) {
                return Err(invalid(format!("duplicate zone id '{}'", zone.id)));
            }
            check_position(&zone.id, zone.latitude, zone.longitude)?;
            if !(zone.radius_meters.is_finite() && zone.radius_meters > 0.0) {
                return Err(invalid(format!(
                    "zone '{}' has non-positive radius {}",
                    zone.id, zone.radius_meters
                )));
            }
            if let Some(hour) = zone.peak_hours.iter().find(|h| **h > 23) {
                return Err(invalid(format!(
                    "zone '{}' has peak hour {hour} outside 0-23",
                    zone.id
                )));
            }
            if let Some(day) = zone.peak_days.iter().flatten().find(|d| **d > 6) {
                return Err(invalid(format!(
                    "zone '{}' has peak day {day} outside 0-6",
                    zone.id
                )));
            }
        }

        let mut station_ids = BTreeSet::new();
        for station in &self.stations {
            if !station_ids.insert(station.id.as_str()) {
                return Err(invalid(format!("duplicate station id '{}'", station.id)));
            }
            check_position(&station.id, station.latitude, station.longitude)?;
        }

        Ok(())
    }
}

impl CampusRepository for CampusConfig {
    fn danger_zones(&self) -> &[DangerZone] {
        &self.zones
    }

    fn stations(&self) -> &[BlueLightStation] {
        &self.stations
    }
}

const fn invalid(message: String) -> CampusError {
    CampusError::Invalid { message }
}

fn check_position(id: &str, latitude: f64, longitude: f64) -> Result<(), CampusError> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(invalid(format!(
            "'{id}' has out-of-range position {latitude},{longitude}"
        )));
    }
    Ok(())
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address autocomplete for safe campus routing.
//!
//! Resolves user-typed place names ("main library", "302 E John St") to
//! ranked candidate coordinates via the Geoapify autocomplete API. The
//! chosen candidate's coordinates feed into the route selector.

pub mod geoapify;

use safe_campus_zone_models::Coordinate;
use serde::Serialize;
use thiserror::Error;

/// Default public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.geoapify.com";

/// Default number of candidates requested.
pub const DEFAULT_LIMIT: u32 = 5;

/// A candidate place returned by autocomplete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodedPlace {
    /// Full formatted address.
    pub formatted: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Provider confidence in [0, 1], if reported.
    pub confidence: Option<f64>,
    /// Provider result type (e.g. `"building"`, `"street"`, `"amenity"`).
    pub result_type: Option<String>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The service answered with a non-success status.
    #[error("Geoapify returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// No API key is configured.
    #[error("GEOAPIFY_API_KEY is not set")]
    MissingApiKey,
}

/// Geocoder endpoint and credentials.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    /// Geoapify API key.
    pub api_key: Option<String>,
    /// Geoapify base URL.
    pub base_url: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl GeocoderConfig {
    /// Reads `GEOAPIFY_API_KEY` and `GEOAPIFY_BASE_URL`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GEOAPIFY_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            base_url: std::env::var("GEOAPIFY_BASE_URL")
                .ok()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

/// Autocomplete client bound to one configuration.
#[derive(Debug, Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    config: GeocoderConfig,
}

impl Geocoder {
    #[must_use]
    pub const fn new(client: reqwest::Client, config: GeocoderConfig) -> Self {
        Self { client, config }
    }

    /// Whether an API key is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Returns up to `limit` candidates for `text`, best first, optionally
    /// biased toward `near`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::MissingApiKey`] without a key, or another
    /// [`GeocodeError`] if the request or response parsing fails.
    pub async fn autocomplete(
        &self,
        text: &str,
        limit: u32,
        near: Option<Coordinate>,
    ) -> Result<Vec<GeocodedPlace>, GeocodeError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GeocodeError::MissingApiKey)?;

        geoapify::autocomplete(
            &self.client,
            &self.config.base_url,
            api_key,
            text,
            limit,
            near,
        )
        .await
    }
}

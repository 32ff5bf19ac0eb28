//! Routing service configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `ORS_API_KEY` | unset (stage skipped) |
//! | `ORS_BASE_URL` | [`ors::DEFAULT_BASE_URL`] |
//! | `GEOAPIFY_API_KEY` | unset (stage skipped) |
//! | `GEOAPIFY_BASE_URL` | [`geoapify::DEFAULT_BASE_URL`] |
//! | `ROUTING_TIMEOUT_SECS` | 15 |

use std::sync::Arc;
use std::time::Duration;

use safe_campus_zone::CampusRepository;

use crate::geoapify::{self, GeoapifyClient};
use crate::ors::{self, OrsClient};
use crate::{RoutingError, SafeRouter};

/// Default per-request timeout for routing services.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Endpoints, credentials, and timeouts for the external routing stages.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// `OpenRouteService` API key. Without one, the avoidance stage is
    /// skipped.
    pub ors_api_key: Option<String>,
    /// `OpenRouteService` base URL.
    pub ors_base_url: String,
    /// Geoapify API key. Without one, the unconstrained stage is skipped.
    pub geoapify_api_key: Option<String>,
    /// Geoapify base URL.
    pub geoapify_base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            ors_api_key: None,
            ors_base_url: ors::DEFAULT_BASE_URL.to_string(),
            geoapify_api_key: None,
            geoapify_base_url: geoapify::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl RoutingConfig {
    /// Reads the configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timeout = non_empty_var("ROUTING_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(defaults.timeout, Duration::from_secs);

        Self {
            ors_api_key: non_empty_var("ORS_API_KEY"),
            ors_base_url: non_empty_var("ORS_BASE_URL").unwrap_or(defaults.ors_base_url),
            geoapify_api_key: non_empty_var("GEOAPIFY_API_KEY"),
            geoapify_base_url: non_empty_var("GEOAPIFY_BASE_URL")
                .unwrap_or(defaults.geoapify_base_url),
            timeout,
        }
    }

    /// Builds the HTTP client shared by both routing stages.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Http`] if the TLS backend cannot be
    /// initialised.
    pub fn http_client(&self) -> Result<reqwest::Client, RoutingError> {
        Ok(reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("safe-campus/", env!("CARGO_PKG_VERSION")))
            .build()?)
    }

    /// Builds a [`SafeRouter`] with every stage that has credentials.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Http`] if the HTTP client cannot be built.
    pub fn build_router(
        &self,
        campus: Arc<dyn CampusRepository>,
    ) -> Result<SafeRouter, RoutingError> {
        let client = self.http_client()?;
        let mut router = SafeRouter::new(campus);

        if let Some(key) = &self.ors_api_key {
            router = router.with_avoidance_router(Box::new(OrsClient::new(
                client.clone(),
                &self.ors_base_url,
                key,
            )));
        } else {
            log::warn!("ORS_API_KEY not set; zone-avoiding routing disabled");
        }

        if let Some(key) = &self.geoapify_api_key {
            router = router.with_waypoint_router(Box::new(GeoapifyClient::new(
                client,
                &self.geoapify_base_url,
                key,
            )));
        } else {
            log::warn!("GEOAPIFY_API_KEY not set; unconstrained routing disabled");
        }

        Ok(router)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

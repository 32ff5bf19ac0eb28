#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for safe campus routing.
//!
//! Serves the danger zone layer, blue light stations, safe walking routes,
//! and address autocomplete as JSON under `/api`. Campus data is loaded
//! once at startup and shared read-only across workers; danger levels are
//! recomputed on every request.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use safe_campus_geocoder::{Geocoder, GeocoderConfig};
use safe_campus_routing::{RoutingConfig, RoutingError, SafeRouter};
use safe_campus_zone::{CampusConfig, CampusError, CampusRepository};
use thiserror::Error;

/// Shared application state.
pub struct AppState {
    /// Three-stage route selector, which also owns the campus.
    pub router: SafeRouter,
    /// Address autocomplete client.
    pub geocoder: Geocoder,
}

impl AppState {
    /// Builds state from environment configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the campus cannot be loaded or the HTTP
    /// client cannot be built.
    pub fn from_env() -> Result<Self, ServerError> {
        let campus: Arc<dyn CampusRepository> = Arc::new(CampusConfig::from_env()?);
        let routing = RoutingConfig::from_env();
        let router = routing.build_router(campus)?;

        let geocoder = Geocoder::new(routing.http_client()?, GeocoderConfig::from_env());
        if !geocoder.is_configured() {
            log::warn!("GEOAPIFY_API_KEY not set; /api/geocode will return 503");
        }

        Ok(Self { router, geocoder })
    }
}

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Campus configuration failed to load.
    #[error(transparent)]
    Campus(#[from] CampusError),

    /// Routing clients could not be built.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// Binding or serving failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/zones", web::get().to(handlers::zones))
            .route("/stations", web::get().to(handlers::stations))
            .route("/route", web::get().to(handlers::route))
            .route("/geocode", web::get().to(handlers::geocode)),
    );
}

/// Starts the safe campus API server.
///
/// Loads the campus, builds the routing and geocoding clients from the
/// environment, and serves until shutdown. Logging must already be
/// initialised. This is a regular async function; the caller provides the
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if startup fails or the HTTP server fails to
/// bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    let state = web::Data::new(AppState::from_env()?);

    log::info!(
        "Serving {} danger zones and {} blue light stations",
        state.router.campus().danger_zones().len(),
        state.router.campus().stations().len()
    );

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line interface for safe campus routing.
//!
//! ```text
//! safe_campus zones [--at 2024-03-04T21:00] [--active] [--json]
//! safe_campus stations [--json]
//! safe_campus route <lat,lon> <lat,lon> [--at ...] [--json]
//! safe_campus geocode <text> [--limit 5] [--near lat,lon] [--json]
//! safe_campus serve
//! ```
//!
//! Campus data comes from `CAMPUS_CONFIG_PATH` (or the embedded campus);
//! routing and geocoding credentials come from the same environment
//! variables the server reads.

use std::sync::Arc;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use safe_campus_geocoder::{DEFAULT_LIMIT, Geocoder, GeocoderConfig};
use safe_campus_routing::RoutingConfig;
use safe_campus_server_models::{ApiPlace, ApiRoute, ApiStation, ApiZone};
use safe_campus_zone::{CampusConfig, CampusRepository, score};
use safe_campus_zone_models::Coordinate;

#[derive(Parser)]
#[command(name = "safe_campus", about = "Safe walking routes around campus danger zones")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show danger zones and their current levels
    Zones {
        /// Local time to score at (RFC 3339 or `YYYY-MM-DDTHH:MM`), default now
        #[arg(long, value_parser = parse_at)]
        at: Option<NaiveDateTime>,
        /// Only show zones that routes avoid (medium and high)
        #[arg(long)]
        active: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List blue light emergency stations
    Stations {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Compute a safe walking route
    Route {
        /// Start point as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        start: Coordinate,
        /// End point as `lat,lon`
        #[arg(allow_hyphen_values = true)]
        end: Coordinate,
        /// Local time to score zones at, default now
        #[arg(long, value_parser = parse_at)]
        at: Option<NaiveDateTime>,
        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Autocomplete an address or place name
    Geocode {
        /// Free-text query
        text: String,
        /// Maximum number of candidates
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: u32,
        /// Bias results toward `lat,lon`
        #[arg(long, allow_hyphen_values = true)]
        near: Option<Coordinate>,
        /// Print JSON instead of a list
        #[arg(long)]
        json: bool,
    },
    /// Start the HTTP API server
    Serve,
}

fn parse_at(value: &str) -> Result<NaiveDateTime, String> {
    score::parse_local_time(value).ok_or_else(|| format!("Unrecognised time: {value}"))
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Zones { at, active, json } => {
            let campus = CampusConfig::from_env()?;
            let at = at.unwrap_or_else(now);
            log::debug!("Scoring {} zones at {at}", campus.danger_zones().len());
            let zones: Vec<ApiZone> = score::assess_all(campus.danger_zones(), at)
                .into_iter()
                .filter(|a| !active || a.intensity.should_avoid())
                .map(ApiZone::from)
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&zones)?);
            } else if zones.is_empty() {
                println!("No danger zones.");
            } else {
                println!("Danger levels at {}", at.format("%a %Y-%m-%d %H:%M"));
                println!();
                for zone in &zones {
                    println!(
                        "  {:>3}  {:<6}  {:<24}  {:>4.0} m  {}",
                        zone.danger_level,
                        zone.intensity.as_ref(),
                        zone.id,
                        zone.radius_meters,
                        zone.name
                    );
                }
            }
        }
        Commands::Stations { json } => {
            let campus = CampusConfig::from_env()?;
            let stations: Vec<ApiStation> =
                campus.stations().iter().map(ApiStation::from).collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&stations)?);
            } else if stations.is_empty() {
                println!("No blue light stations.");
            } else {
                for station in &stations {
                    println!(
                        "  {:<12}  {:.6},{:.6}  {}",
                        station.id, station.latitude, station.longitude, station.name
                    );
                    if let Some(description) = &station.description {
                        println!("                {description}");
                    }
                }
            }
        }
        Commands::Route {
            start,
            end,
            at,
            json,
        } => {
            let campus: Arc<dyn CampusRepository> = Arc::new(CampusConfig::from_env()?);
            let router = RoutingConfig::from_env().build_router(campus)?;
            let route = router
                .compute_safe_route_at(start, end, at.unwrap_or_else(now))
                .await;
            log::info!(
                "Route {start} -> {end} via {} ({} points)",
                route.source,
                route.coordinates.len()
            );
            let route = ApiRoute::from(route);

            if json {
                println!("{}", serde_json::to_string_pretty(&route)?);
            } else {
                print_route(&route);
            }
        }
        Commands::Geocode {
            text,
            limit,
            near,
            json,
        } => {
            let routing = RoutingConfig::from_env();
            let geocoder = Geocoder::new(routing.http_client()?, GeocoderConfig::from_env());
            if !geocoder.is_configured() {
                log::warn!("GEOAPIFY_API_KEY not set; geocoding will fail");
            }
            let places: Vec<ApiPlace> = geocoder
                .autocomplete(&text, limit, near)
                .await?
                .into_iter()
                .map(ApiPlace::from)
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&places)?);
            } else if places.is_empty() {
                println!("No matches for '{text}'.");
            } else {
                for (i, place) in places.iter().enumerate() {
                    println!(
                        "  {}. {}  ({:.6},{:.6})",
                        i + 1,
                        place.formatted,
                        place.latitude,
                        place.longitude
                    );
                }
            }
        }
        Commands::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_rt::System::new().block_on(safe_campus_server::run_server())
            })
            .await??;
        }
    }

    Ok(())
}

fn print_route(route: &ApiRoute) {
    let minutes = route.duration_seconds / 60.0;
    let estimate = if route.duration_is_estimate {
        " (estimated)"
    } else {
        ""
    };

    println!("Source:   {}", route.source);
    println!("Distance: {:.0} m", route.distance_meters);
    println!("Duration: {minutes:.1} min{estimate}");
    if !route.avoided_zone_ids.is_empty() {
        println!("Avoiding: {}", route.avoided_zone_ids.join(", "));
    }
    println!("Points:   {}", route.coordinates.len());

    if !route.steps.is_empty() {
        println!();
        for (i, step) in route.steps.iter().enumerate() {
            println!(
                "  {:>2}. {} ({:.0} m)",
                i + 1,
                step.instruction,
                step.distance_meters
            );
        }
    }
}

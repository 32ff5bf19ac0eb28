#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Danger zone scoring and campus configuration.
//!
//! - [`score`] maps a static [`DangerZone`] plus a local wall-clock time to
//!   a danger level (0-100) and an [`Intensity`] bucket. Scores are never
//!   cached; the same zone yields different levels at different hours.
//! - [`polygon`] turns zones into buffered 16-sided polygons that routing
//!   services accept as areas to avoid.
//! - [`campus`] provides the read-only zone and blue light station data,
//!   either from the embedded default campus or a TOML file.

pub mod campus;
pub mod polygon;
pub mod score;

pub use campus::{CampusConfig, CampusError, CampusRepository};
pub use safe_campus_zone_models::{
    BlueLightStation, Coordinate, DangerZone, Intensity, ZoneAssessment,
};

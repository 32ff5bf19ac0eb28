//! Time-varying danger scoring.
//!
//! The level is `base × peak-hour × peak-day × late-night`, clamped to
//! [`MAX_SCORE`] and rounded. Every factor is multiplicative and the clamp
//! is applied last.
//!
//! The time is always an explicit argument so that scoring stays a pure
//! function. Callers that want "now" pass `chrono::Local::now().naive_local()`.

use chrono::{DateTime, Datelike as _, Local, NaiveDateTime, Timelike as _};
use safe_campus_zone_models::{DangerZone, Intensity, MAX_SCORE, ZoneAssessment};

/// Multiplier applied when the local hour is one of the zone's peak hours.
pub const PEAK_HOUR_MULTIPLIER: f64 = 1.5;

/// Multiplier applied when the local weekday is one of the zone's peak days.
pub const PEAK_DAY_MULTIPLIER: f64 = 1.3;

/// Multiplier applied during the late-night band.
pub const LATE_NIGHT_MULTIPLIER: f64 = 1.4;

/// First hour of the late-night band (inclusive, wraps past midnight).
pub const LATE_NIGHT_START_HOUR: u32 = 22;

/// Last hour of the late-night band (inclusive).
pub const LATE_NIGHT_END_HOUR: u32 = 2;

/// Whether `hour` falls in 22:00-23:59 or 00:00-02:59.
#[must_use]
pub const fn is_late_night(hour: u32) -> bool {
    hour >= LATE_NIGHT_START_HOUR || hour <= LATE_NIGHT_END_HOUR
}

/// Computes the danger level (0-100) of `zone` at local time `at`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn danger_level(zone: &DangerZone, at: NaiveDateTime) -> u8 {
    let hour = at.hour();
    let weekday = at.weekday().num_days_from_sunday();

    let mut level = f64::from(zone.effective_base_score());

    if zone.peak_hours.iter().any(|h| u32::from(*h) == hour) {
        level *= PEAK_HOUR_MULTIPLIER;
    }

    if let Some(days) = &zone.peak_days
        && days.iter().any(|d| u32::from(*d) == weekday)
    {
        level *= PEAK_DAY_MULTIPLIER;
    }

    if is_late_night(hour) {
        level *= LATE_NIGHT_MULTIPLIER;
    }

    level.clamp(0.0, f64::from(MAX_SCORE)).round() as u8
}

/// Computes the intensity bucket of `zone` at local time `at`.
#[must_use]
pub fn intensity(zone: &DangerZone, at: NaiveDateTime) -> Intensity {
    Intensity::from_level(danger_level(zone, at))
}

/// Scores a single zone.
#[must_use]
pub fn assess(zone: &DangerZone, at: NaiveDateTime) -> ZoneAssessment {
    let danger_level = danger_level(zone, at);
    ZoneAssessment {
        zone: zone.clone(),
        danger_level,
        intensity: Intensity::from_level(danger_level),
    }
}

/// Scores every zone, preserving input order.
#[must_use]
pub fn assess_all(zones: &[DangerZone], at: NaiveDateTime) -> Vec<ZoneAssessment> {
    zones.iter().map(|zone| assess(zone, at)).collect()
}

/// Returns the zones that are currently `medium` or `high`.
#[must_use]
pub fn active_zones(zones: &[DangerZone], at: NaiveDateTime) -> Vec<&DangerZone> {
    zones
        .iter()
        .filter(|zone| intensity(zone, at).should_avoid())
        .collect()
}

/// Parses a scoring time.
///
/// Accepts RFC 3339 (converted to local time) or a naive local
/// `YYYY-MM-DDTHH:MM[:SS]`.
#[must_use]
pub fn parse_local_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

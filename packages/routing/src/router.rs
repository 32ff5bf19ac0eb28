//! The three-stage safe route pipeline.

use std::sync::Arc;

use chrono::NaiveDateTime;
use safe_campus_routing_models::{RouteResult, RouteSource};
use safe_campus_zone::{CampusRepository, polygon, score};
use safe_campus_zone_models::{Coordinate, DangerZone};

use crate::{AvoidanceRouter, ProviderRoute, WaypointRouter, fallback};

/// Computes walking routes that prefer to avoid active danger zones.
///
/// Holds no mutable state; concurrent calls are independent.
pub struct SafeRouter {
    campus: Arc<dyn CampusRepository>,
    avoidance: Option<Box<dyn AvoidanceRouter>>,
    waypoint: Option<Box<dyn WaypointRouter>>,
}

impl SafeRouter {
    /// A router with only the local fallback stage.
    #[must_use]
    pub fn new(campus: Arc<dyn CampusRepository>) -> Self {
        Self {
            campus,
            avoidance: None,
            waypoint: None,
        }
    }

    /// Sets the primary, polygon-avoiding stage.
    #[must_use]
    pub fn with_avoidance_router(mut self, router: Box<dyn AvoidanceRouter>) -> Self {
        self.avoidance = Some(router);
        self
    }

    /// Sets the secondary, unconstrained stage.
    #[must_use]
    pub fn with_waypoint_router(mut self, router: Box<dyn WaypointRouter>) -> Self {
        self.waypoint = Some(router);
        self
    }

    /// The campus data this router scores and falls back on.
    #[must_use]
    pub fn campus(&self) -> &dyn CampusRepository {
        self.campus.as_ref()
    }

    /// Computes a route using the current local time to score zones.
    pub async fn compute_safe_route(&self, start: Coordinate, end: Coordinate) -> RouteResult {
        self.compute_safe_route_at(start, end, chrono::Local::now().naive_local())
            .await
    }

    /// Computes a route, scoring zones as of local time `at`.
    ///
    /// Stages run strictly in sequence and the first usable route is
    /// returned unmodified apart from its [`RouteSource`] tag.
    pub async fn compute_safe_route_at(
        &self,
        start: Coordinate,
        end: Coordinate,
        at: NaiveDateTime,
    ) -> RouteResult {
        let active = score::active_zones(self.campus.danger_zones(), at);

        if let Some(route) = self.try_avoidance(start, end, &active).await {
            return route;
        }

        if let Some(route) = self.try_unconstrained(start, end).await {
            return route;
        }

        log::info!("External routing unavailable; using local fallback route");
        fallback::local_route(start, end, self.campus.stations())
    }

    async fn try_avoidance(
        &self,
        start: Coordinate,
        end: Coordinate,
        active: &[&DangerZone],
    ) -> Option<RouteResult> {
        let router = self.avoidance.as_ref()?;

        let avoid_polygons = if active.is_empty() {
            None
        } else {
            Some(polygon::to_geojson(&polygon::avoidance_multipolygon(
                active.iter().copied(),
            )))
        };

        log::info!(
            "Requesting {} route avoiding {} zone(s)",
            router.name(),
            active.len()
        );

        match router
            .route_avoiding(start, end, avoid_polygons.as_ref())
            .await
        {
            Ok(Some(route)) if !route.coordinates.is_empty() => Some(into_result(
                route,
                RouteSource::AvoidPolygons,
                active.iter().map(|z| z.id.clone()).collect(),
            )),
            Ok(_) => {
                log::warn!("{} returned no route", router.name());
                None
            }
            Err(e) => {
                log::warn!("{} routing failed: {e}", router.name());
                None
            }
        }
    }

    async fn try_unconstrained(&self, start: Coordinate, end: Coordinate) -> Option<RouteResult> {
        let router = self.waypoint.as_ref()?;
        log::info!("Requesting unconstrained {} route", router.name());

        match router.route(&[start, end]).await {
            Ok(Some(route)) if !route.coordinates.is_empty() => Some(into_result(
                route,
                RouteSource::Unconstrained,
                Vec::new(),
            )),
            Ok(_) => {
                log::warn!("{} returned no route", router.name());
                None
            }
            Err(e) => {
                log::warn!("{} routing failed: {e}", router.name());
                None
            }
        }
    }
}

fn into_result(
    route: ProviderRoute,
    source: RouteSource,
    avoided_zone_ids: Vec<String>,
) -> RouteResult {
    RouteResult {
        coordinates: route.coordinates,
        distance_meters: route.distance_meters,
        duration_seconds: route.duration_seconds,
        steps: route.steps,
        source,
        duration_is_estimate: false,
        avoided_zone_ids,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;
    use safe_campus_zone::CampusConfig;
    use safe_campus_zone_models::BlueLightStation;

    use super::*;
    use crate::{RouteStep, RoutingError};

    /// What a fake provider should do when called.
    #[derive(Clone)]
    enum Behavior {
        Succeed(ProviderRoute),
        Empty,
        Fail,
    }

    fn respond(behavior: &Behavior) -> Result<Option<ProviderRoute>, RoutingError> {
        match behavior {
            Behavior::Succeed(route) => Ok(Some(route.clone())),
            Behavior::Empty => Ok(None),
            Behavior::Fail => Err(RoutingError::Status {
                service: "fake",
                status: 503,
                body: "unavailable".to_string(),
            }),
        }
    }

    struct FakeAvoidance {
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
        polygons: Arc<Mutex<Vec<Option<serde_json::Value>>>>,
    }

    #[async_trait::async_trait]
    impl AvoidanceRouter for FakeAvoidance {
        fn name(&self) -> &'static str {
            "fake-avoidance"
        }

        async fn route_avoiding(
            &self,
            _start: Coordinate,
            _end: Coordinate,
            avoid_polygons: Option<&serde_json::Value>,
        ) -> Result<Option<ProviderRoute>, RoutingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.polygons.lock().unwrap().push(avoid_polygons.cloned());
            respond(&self.behavior)
        }
    }

    struct FakeWaypoint {
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl WaypointRouter for FakeWaypoint {
        fn name(&self) -> &'static str {
            "fake-waypoint"
        }

        async fn route(
            &self,
            waypoints: &[Coordinate],
        ) -> Result<Option<ProviderRoute>, RoutingError> {
            assert_eq!(waypoints.len(), 2);
            self.calls.fetch_add(1, Ordering::SeqCst);
            respond(&self.behavior)
        }
    }

    struct Harness {
        router: SafeRouter,
        avoidance_calls: Arc<AtomicUsize>,
        waypoint_calls: Arc<AtomicUsize>,
        polygons: Arc<Mutex<Vec<Option<serde_json::Value>>>>,
    }

    fn harness(campus: CampusConfig, primary: Behavior, secondary: Behavior) -> Harness {
        let avoidance_calls = Arc::new(AtomicUsize::new(0));
        let waypoint_calls = Arc::new(AtomicUsize::new(0));
        let polygons = Arc::new(Mutex::new(Vec::new()));

        let router = SafeRouter::new(Arc::new(campus))
            .with_avoidance_router(Box::new(FakeAvoidance {
                behavior: primary,
                calls: avoidance_calls.clone(),
                polygons: polygons.clone(),
            }))
            .with_waypoint_router(Box::new(FakeWaypoint {
                behavior: secondary,
                calls: waypoint_calls.clone(),
            }));

        Harness {
            router,
            avoidance_calls,
            waypoint_calls,
            polygons,
        }
    }

    fn zone(id: &str, base_score: u8) -> DangerZone {
        DangerZone {
            id: id.to_string(),
            name: id.to_string(),
            latitude: 40.105,
            longitude: -88.23,
            radius_meters: 75.0,
            base_score: Some(base_score),
            peak_hours: Vec::new(),
            peak_days: None,
            recent_incidents: 0,
            incident_summaries: Vec::new(),
        }
    }

    fn station(id: &str, latitude: f64, longitude: f64) -> BlueLightStation {
        BlueLightStation {
            id: id.to_string(),
            name: id.to_string(),
            latitude,
            longitude,
            description: None,
        }
    }

    fn campus() -> CampusConfig {
        CampusConfig::new(
            vec![zone("low", 20), zone("medium", 50), zone("high", 80)],
            vec![
                station("library", 40.1047, -88.2289),
                station("far-away", 40.2, -88.5),
            ],
        )
        .unwrap()
    }

    fn afternoon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    fn provider_route(points: &[(f64, f64)], distance: f64, duration: f64) -> ProviderRoute {
        ProviderRoute {
            coordinates: points.iter().map(|(lat, lon)| Coordinate::new(*lat, *lon)).collect(),
            distance_meters: distance,
            duration_seconds: duration,
            steps: Some(vec![RouteStep {
                instruction: "Walk".to_string(),
                distance_meters: distance,
                duration_seconds: duration,
            }]),
        }
    }

    const START: Coordinate = Coordinate::new(40.1092, -88.2272);
    const END: Coordinate = Coordinate::new(40.1040, -88.2360);

    #[tokio::test]
    async fn primary_route_is_returned_untouched() {
        let primary = provider_route(
            &[(40.1092, -88.2272), (40.107, -88.231), (40.1040, -88.2360)],
            950.0,
            700.0,
        );
        let h = harness(campus(), Behavior::Succeed(primary.clone()), Behavior::Fail);

        let route = h.router.compute_safe_route_at(START, END, afternoon()).await;

        assert_eq!(route.coordinates, primary.coordinates);
        assert!((route.distance_meters - 950.0).abs() < f64::EPSILON);
        assert!((route.duration_seconds - 700.0).abs() < f64::EPSILON);
        assert_eq!(route.steps, primary.steps);
        assert_eq!(route.source, RouteSource::AvoidPolygons);
        assert!(!route.duration_is_estimate);
        assert_eq!(h.waypoint_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn only_medium_and_high_zones_are_avoided() {
        let primary = provider_route(&[(40.1092, -88.2272), (40.1040, -88.2360)], 900.0, 650.0);
        let h = harness(campus(), Behavior::Succeed(primary), Behavior::Fail);

        let route = h.router.compute_safe_route_at(START, END, afternoon()).await;
        assert_eq!(route.avoided_zone_ids, vec!["medium".to_string(), "high".to_string()]);

        let sent = h.polygons.lock().unwrap();
        let polygons = sent[0].as_ref().unwrap();
        assert_eq!(polygons["type"], "MultiPolygon");
        let rings = polygons["coordinates"].as_array().unwrap();
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0][0].as_array().unwrap().len(), 17);
    }

    #[tokio::test]
    async fn no_active_zones_sends_no_polygons() {
        let quiet = CampusConfig::new(vec![zone("low", 10)], Vec::new()).unwrap();
        let primary = provider_route(&[(40.1092, -88.2272), (40.1040, -88.2360)], 900.0, 650.0);
        let h = harness(quiet, Behavior::Succeed(primary), Behavior::Fail);

        let route = h.router.compute_safe_route_at(START, END, afternoon()).await;
        assert!(route.avoided_zone_ids.is_empty());
        assert!(h.polygons.lock().unwrap()[0].is_none());
    }

    #[tokio::test]
    async fn secondary_used_when_primary_fails() {
        let secondary = provider_route(
            &[(40.1092, -88.2272), (40.106, -88.232), (40.1040, -88.2360)],
            1010.0,
            760.0,
        );
        let h = harness(campus(), Behavior::Fail, Behavior::Succeed(secondary.clone()));

        let route = h.router.compute_safe_route_at(START, END, afternoon()).await;

        assert_eq!(route.coordinates, secondary.coordinates);
        assert!((route.distance_meters - 1010.0).abs() < f64::EPSILON);
        assert!((route.duration_seconds - 760.0).abs() < f64::EPSILON);
        assert_eq!(route.steps, secondary.steps);
        assert_eq!(route.source, RouteSource::Unconstrained);
        assert!(route.avoided_zone_ids.is_empty());
        assert_eq!(h.avoidance_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.waypoint_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_primary_result_falls_through() {
        let secondary = provider_route(&[(40.1092, -88.2272), (40.1040, -88.2360)], 1000.0, 750.0);
        let empty = ProviderRoute {
            coordinates: Vec::new(),
            distance_meters: 0.0,
            duration_seconds: 0.0,
            steps: None,
        };
        let h = harness(campus(), Behavior::Succeed(empty), Behavior::Succeed(secondary));

        let route = h.router.compute_safe_route_at(START, END, afternoon()).await;
        assert_eq!(route.source, RouteSource::Unconstrained);
    }

    #[tokio::test]
    async fn local_fallback_when_both_services_fail() {
        let h = harness(campus(), Behavior::Fail, Behavior::Empty);

        let route = h.router.compute_safe_route_at(START, END, afternoon()).await;

        assert_eq!(route.source, RouteSource::LocalFallback);
        assert_eq!(route.coordinates.len(), 5);
        assert_eq!(route.coordinates[0], START);
        assert_eq!(route.coordinates[2], Coordinate::new(40.1047, -88.2289));
        assert_eq!(route.coordinates[4], END);
        assert!(route.duration_is_estimate);
        assert!(route.duration_seconds > 0.0);
    }

    #[tokio::test]
    async fn local_fallback_without_stations_is_direct() {
        let bare = CampusConfig::new(vec![zone("high", 90)], Vec::new()).unwrap();
        let h = harness(bare, Behavior::Fail, Behavior::Fail);

        let route = h.router.compute_safe_route_at(START, END, afternoon()).await;
        assert_eq!(route.coordinates, vec![START, END]);
    }

    #[tokio::test]
    async fn router_without_providers_uses_fallback() {
        let router = SafeRouter::new(Arc::new(campus()));
        let route = router.compute_safe_route(START, END).await;
        assert_eq!(route.source, RouteSource::LocalFallback);
        assert_eq!(route.start(), Some(&START));
        assert_eq!(route.end(), Some(&END));
    }

    #[tokio::test]
    async fn endpoints_preserved_for_arbitrary_points() {
        let points = [
            (Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)),
            (Coordinate::new(-33.86, 151.2), Coordinate::new(51.5, -0.12)),
            (Coordinate::new(89.9, 179.9), Coordinate::new(-89.9, -179.9)),
            (Coordinate::new(40.1, -88.2), Coordinate::new(40.1, -88.2)),
        ];
        let h = harness(campus(), Behavior::Fail, Behavior::Fail);

        for (start, end) in points {
            let route = h.router.compute_safe_route_at(start, end, afternoon()).await;
            assert_eq!(route.start(), Some(&start));
            assert_eq!(route.end(), Some(&end));
        }
    }
}

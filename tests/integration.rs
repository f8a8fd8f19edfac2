use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use uuid::Uuid;

use trip_matching_engine::clock::FixedClock;
use trip_matching_engine::engine::locator::UnknownLocationPolicy;
use trip_matching_engine::geo::{haversine_km, wkt};
use trip_matching_engine::models::location::Coordinate;
use trip_matching_engine::models::promotion::{EligibilityRule, PromotionDraft};
use trip_matching_engine::models::rider::{LocationSource, RiderProfile, RiderStatus};
use trip_matching_engine::models::trip::{Place, TripRequest, TripStatus};
use trip_matching_engine::store::memory::{
    MemoryPromotionStore, MemoryRatingStore, MemoryRiderPool, MemoryTripStore,
};
use trip_matching_engine::{Collaborators, Config, EngineError, TripService};

const ALGIERS: Coordinate = Coordinate::new(36.7538, 3.0588);
const LAKHDARIA: Coordinate = Coordinate::new(36.5644, 3.5892);

struct Harness {
    service: TripService,
    riders: Arc<MemoryRiderPool>,
    trips: Arc<MemoryTripStore>,
    clock: Arc<FixedClock>,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 15, 7, 30, 0).unwrap()
}

fn setup_with(config: Config) -> Harness {
    let riders = Arc::new(MemoryRiderPool::new());
    let trips = Arc::new(MemoryTripStore::new());
    let clock = Arc::new(FixedClock::new(start()));

    let stores = Collaborators {
        trips: trips.clone(),
        ratings: Arc::new(MemoryRatingStore::new()),
        promotions: Arc::new(MemoryPromotionStore::new()),
        riders: riders.clone(),
    };

    Harness {
        service: TripService::new(config, stores, clock.clone()),
        riders,
        trips,
        clock,
    }
}

fn setup() -> Harness {
    setup_with(Config::default())
}

/// A point roughly `km` kilometres due north of Algiers.
fn north_of_algiers(km: f64) -> Coordinate {
    Coordinate::new(ALGIERS.latitude + km / 111.195, ALGIERS.longitude)
}

fn add_rider(h: &Harness, seed: u128, location: Option<Coordinate>) -> Uuid {
    let id = Uuid::from_u128(seed);
    h.riders.upsert(RiderProfile {
        id,
        display_name: format!("Rider {seed}"),
        phone: "0770123456".to_string(),
        rating_average: None,
        current_location: location.map(|c| wkt::encode(&c)),
        status: RiderStatus::Online,
        vehicle_type: "motorcycle".to_string(),
        license_plate: None,
        updated_at: start(),
    });
    id
}

fn request(rider_id: Option<Uuid>) -> TripRequest {
    TripRequest {
        pickup: Place::new(ALGIERS, "Grande Poste, Alger Centre"),
        destination: Place::new(Coordinate::new(36.6910, 3.2150), "Aéroport Houari Boumediene"),
        rider_id,
    }
}

fn completed_trip(h: &Harness, user: Uuid, rider: Uuid) -> Uuid {
    let trip = h.service.create_trip(user, request(Some(rider))).unwrap();
    for status in [TripStatus::Accepted, TripStatus::InProgress, TripStatus::Completed] {
        h.clock.advance(Duration::minutes(5));
        h.service.transition_trip(user, trip.id, status).unwrap();
    }
    trip.id
}

fn promotion_draft(title: &str) -> PromotionDraft {
    PromotionDraft {
        title: title.to_string(),
        description: Some("test promotion".to_string()),
        discount_percentage: Some(20.0),
        discount_amount: None,
        rule: None,
        valid_from: start() - Duration::days(1),
        valid_until: start() + Duration::days(7),
        is_active: true,
    }
}

#[test]
fn nearby_returns_riders_in_radius_nearest_first() {
    let h = setup();
    add_rider(&h, 3, Some(north_of_algiers(60.0)));
    add_rider(&h, 2, Some(north_of_algiers(10.0)));
    add_rider(&h, 1, Some(north_of_algiers(2.0)));

    let nearby = h.service.nearby_riders(ALGIERS, Some(50.0)).unwrap();

    let ids: Vec<u128> = nearby.riders.iter().map(|r| r.id.as_u128()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(nearby.search_radius_km, 50.0);
    assert!((nearby.riders[0].distance_km - 2.0).abs() < 0.01);
}

#[test]
fn nearby_defaults_radius_and_validates_input() {
    let h = setup();
    add_rider(&h, 1, Some(north_of_algiers(45.0)));

    let nearby = h.service.nearby_riders(ALGIERS, None).unwrap();
    assert_eq!(nearby.search_radius_km, 50.0);
    assert_eq!(nearby.riders.len(), 1);

    assert!(matches!(
        h.service.nearby_riders(ALGIERS, Some(150.0)),
        Err(EngineError::OutOfRange(_))
    ));
    assert!(matches!(
        h.service.nearby_riders(Coordinate::new(100.0, 3.0), None),
        Err(EngineError::OutOfRange(_))
    ));
}

#[test]
fn nearby_with_empty_pool_is_empty() {
    let h = setup();
    let nearby = h.service.nearby_riders(ALGIERS, None).unwrap();
    assert!(nearby.riders.is_empty());
}

#[test]
fn nearby_ignores_offline_riders() {
    let h = setup();
    let id = add_rider(&h, 1, Some(north_of_algiers(1.0)));
    h.riders.update_status(id, RiderStatus::Offline, start()).unwrap();

    assert!(h.service.nearby_riders(ALGIERS, None).unwrap().riders.is_empty());
}

#[test]
fn unknown_rider_location_follows_policy() {
    let h = setup();
    add_rider(&h, 1, None);
    assert!(h.service.nearby_riders(ALGIERS, Some(100.0)).unwrap().riders.is_empty());

    let config = Config {
        unknown_location: UnknownLocationPolicy::Fallback(LAKHDARIA),
        ..Config::default()
    };
    let h = setup_with(config);
    add_rider(&h, 1, None);

    let nearby = h.service.nearby_riders(ALGIERS, Some(100.0)).unwrap();
    assert_eq!(nearby.riders.len(), 1);
    assert_eq!(nearby.riders[0].location, LAKHDARIA);
    assert_eq!(nearby.riders[0].location_source, LocationSource::Fallback);
    assert!((nearby.riders[0].distance_km - 51.79).abs() < 0.01);
}

#[test]
fn trip_walks_the_full_lifecycle() {
    let h = setup();
    let rider = add_rider(&h, 1, Some(north_of_algiers(1.0)));
    let user = Uuid::new_v4();

    let trip = h.service.create_trip(user, request(Some(rider))).unwrap();
    assert_eq!(trip.status, TripStatus::Pending);
    assert_eq!(trip.requested_at, start());
    let raw_km = haversine_km(&ALGIERS, &trip.destination.location);
    let quote = h.service.config().pricing.quote(raw_km);
    assert_eq!(trip.price_da, quote.price_da);
    assert_eq!(trip.distance_km, quote.distance_km);
    assert_eq!(trip.estimated_duration_minutes, quote.estimated_duration_minutes);

    h.clock.advance(Duration::minutes(2));
    let accepted = h.service.transition_trip(user, trip.id, TripStatus::Accepted).unwrap();
    assert_eq!(accepted.status, TripStatus::Accepted);

    h.clock.advance(Duration::minutes(8));
    let started = h.service.transition_trip(user, trip.id, TripStatus::InProgress).unwrap();
    assert_eq!(started.started_at, Some(start() + Duration::minutes(10)));

    h.clock.advance(Duration::minutes(25));
    let done = h.service.transition_trip(user, trip.id, TripStatus::Completed).unwrap();
    assert_eq!(done.completed_at, Some(start() + Duration::minutes(35)));
    assert_eq!(done.started_at, started.started_at);

    // Price and distance are fixed at creation.
    assert_eq!(done.price_da, trip.price_da);
    assert_eq!(done.distance_km, trip.distance_km);
}

#[test]
fn skipping_states_is_rejected_and_nothing_changes() {
    let h = setup();
    let user = Uuid::new_v4();
    let trip = h.service.create_trip(user, request(None)).unwrap();

    let err = h
        .service
        .transition_trip(user, trip.id, TripStatus::Completed)
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransition {
            from: TripStatus::Pending,
            to: TripStatus::Completed,
        }
    );
    assert_eq!(h.service.get_trip(user, trip.id).unwrap().status, TripStatus::Pending);
}

#[test]
fn cancel_works_until_completion() {
    let h = setup();
    let user = Uuid::new_v4();
    let rider = add_rider(&h, 1, None);

    let pending = h.service.create_trip(user, request(None)).unwrap();
    assert_eq!(h.service.cancel_trip(user, pending.id).unwrap().status, TripStatus::Cancelled);
    assert!(matches!(
        h.service.cancel_trip(user, pending.id),
        Err(EngineError::InvalidTransition { .. })
    ));

    let in_progress = h.service.create_trip(user, request(Some(rider))).unwrap();
    h.service.transition_trip(user, in_progress.id, TripStatus::Accepted).unwrap();
    h.service.transition_trip(user, in_progress.id, TripStatus::InProgress).unwrap();
    assert!(h.service.cancel_trip(user, in_progress.id).is_ok());

    let done = completed_trip(&h, user, rider);
    assert!(matches!(
        h.service.cancel_trip(user, done),
        Err(EngineError::InvalidTransition { .. })
    ));
}

#[test]
fn other_users_cannot_see_or_touch_a_trip() {
    let h = setup();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let trip = h.service.create_trip(owner, request(None)).unwrap();

    assert_eq!(
        h.service.get_trip(stranger, trip.id).unwrap_err(),
        EngineError::TripNotFound(trip.id)
    );
    assert_eq!(
        h.service.cancel_trip(stranger, trip.id).unwrap_err(),
        EngineError::TripNotFound(trip.id)
    );
    assert_eq!(h.service.get_trip(owner, trip.id).unwrap().status, TripStatus::Pending);
}

#[test]
fn creating_a_trip_for_unknown_rider_fails() {
    let h = setup();
    let missing = Uuid::from_u128(404);
    let err = h.service.create_trip(Uuid::new_v4(), request(Some(missing))).unwrap_err();
    assert_eq!(err, EngineError::RiderNotFound(missing));
    assert!(h.trips.is_empty());
}

#[test]
fn user_trip_listing_filters_and_pages() {
    let h = setup();
    let user = Uuid::new_v4();
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(h.service.create_trip(user, request(None)).unwrap().id);
        h.clock.advance(Duration::minutes(1));
    }
    h.service.cancel_trip(user, ids[0]).unwrap();
    h.service.create_trip(Uuid::new_v4(), request(None)).unwrap();

    let all = h.service.user_trips(user, None, None, 0).unwrap();
    let listed: Vec<Uuid> = all.iter().map(|t| t.id).collect();
    assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);

    let cancelled = h
        .service
        .user_trips(user, Some(TripStatus::Cancelled), None, 0)
        .unwrap();
    assert_eq!(cancelled.len(), 1);

    let second_page = h.service.user_trips(user, None, Some(2), 2).unwrap();
    assert_eq!(second_page.len(), 1);
}

#[test]
fn rating_rules() {
    let h = setup();
    let user = Uuid::new_v4();
    let rider = add_rider(&h, 1, None);

    let pending = h.service.create_trip(user, request(Some(rider))).unwrap();
    assert_eq!(
        h.service.rate_trip(user, pending.id, 5, None).unwrap_err(),
        EngineError::TripNotCompleted(pending.id)
    );

    let done = completed_trip(&h, user, rider);
    assert!(matches!(
        h.service.rate_trip(user, done, 6, None),
        Err(EngineError::OutOfRange(_))
    ));

    let rating = h
        .service
        .rate_trip(user, done, 5, Some("Rapide et prudent".to_string()))
        .unwrap();
    assert_eq!(rating.rider_id, rider);
    assert_eq!(rating.rating, 5);

    assert_eq!(
        h.service.rate_trip(user, done, 4, None).unwrap_err(),
        EngineError::AlreadyRated(done)
    );

    let history = h.service.rider_ratings(rider, None).unwrap();
    assert_eq!(history.total_ratings, 1);
    assert_eq!(history.average_rating, 5.0);
    assert_eq!(history.ratings[0].comment.as_deref(), Some("Rapide et prudent"));
}

#[test]
fn rider_rating_history_is_recent_first() {
    let h = setup();
    let user = Uuid::new_v4();
    let rider = add_rider(&h, 1, None);

    for score in [3, 4, 5] {
        let trip = completed_trip(&h, user, rider);
        h.clock.advance(Duration::minutes(1));
        h.service.rate_trip(user, trip, score, None).unwrap();
    }

    let history = h.service.rider_ratings(rider, Some(2)).unwrap();
    let scores: Vec<u8> = history.ratings.iter().map(|r| r.rating).collect();
    assert_eq!(scores, vec![5, 4]);
    assert_eq!(history.average_rating, 4.5);
}

#[test]
fn first_ride_bonus_eligibility() {
    let h = setup();
    let promo = h.service.create_promotion(promotion_draft("First Ride Bonus")).unwrap();
    assert_eq!(promo.rule, EligibilityRule::FirstRideOnly);

    let newcomer = Uuid::new_v4();
    let result = h.service.check_promotion_eligibility(newcomer, promo.id).unwrap();
    assert!(result.eligible);
    assert_eq!(result.reason, "You are eligible for this promotion");

    let regular = Uuid::new_v4();
    let rider = add_rider(&h, 1, None);
    completed_trip(&h, regular, rider);
    let result = h.service.check_promotion_eligibility(regular, promo.id).unwrap();
    assert!(!result.eligible);
    assert_eq!(result.reason, "This promotion is only for first-time users");
}

#[test]
fn loyalty_eligibility_counts_completed_trips() {
    let h = setup();
    let promo = h.service.create_promotion(promotion_draft("Loyalty Club")).unwrap();
    let user = Uuid::new_v4();
    let rider = add_rider(&h, 1, None);
    for _ in 0..4 {
        completed_trip(&h, user, rider);
    }

    let result = h.service.check_promotion_eligibility(user, promo.id).unwrap();
    assert!(!result.eligible);
    assert_eq!(result.reason, "Complete 6 more trips to unlock this promotion");
}

#[test]
fn combined_first_ride_loyalty_title_checks_both() {
    let h = setup();
    let promo = h
        .service
        .create_promotion(promotion_draft("First Ride Loyalty Pack"))
        .unwrap();

    let result = h
        .service
        .check_promotion_eligibility(Uuid::new_v4(), promo.id)
        .unwrap();
    assert!(!result.eligible);
    assert_eq!(result.reason, "Complete 10 more trips to unlock this promotion");
}

#[test]
fn expired_promotion_is_not_eligible_and_cannot_be_applied() {
    let h = setup();
    let promo = h.service.create_promotion(promotion_draft("Spring Deal")).unwrap();
    h.clock.advance(Duration::days(8));

    let result = h
        .service
        .check_promotion_eligibility(Uuid::new_v4(), promo.id)
        .unwrap();
    assert!(!result.eligible);
    assert_eq!(result.reason, "Promotion is not currently active");

    assert_eq!(
        h.service.apply_promotion_discount(promo.id, 1000.0).unwrap_err(),
        EngineError::PromotionExpired(promo.id)
    );
    assert!(h.service.active_promotions().unwrap().is_empty());
}

#[test]
fn inactive_promotion_cannot_be_applied() {
    let h = setup();
    let mut draft = promotion_draft("Paused");
    draft.is_active = false;
    let promo = h.service.create_promotion(draft).unwrap();

    assert_eq!(
        h.service.apply_promotion_discount(promo.id, 1000.0).unwrap_err(),
        EngineError::PromotionInactive(promo.id)
    );
}

#[test]
fn discount_is_applied_to_trip_price() {
    let h = setup();
    let promo = h.service.create_promotion(promotion_draft("Spring Deal")).unwrap();

    let quote = h.service.apply_promotion_discount(promo.id, 1000.0).unwrap();
    assert_eq!(quote.discount_amount, 200.0);
    assert_eq!(quote.final_price, 800.0);
    assert_eq!(quote.original_price, 1000.0);
    assert_eq!(quote.promotion_title, "Spring Deal");

    assert_eq!(
        h.service.apply_promotion_discount(promo.id, 0.0).unwrap_err(),
        EngineError::InvalidTripPrice(0.0)
    );

    let missing = Uuid::new_v4();
    assert_eq!(
        h.service.apply_promotion_discount(missing, 500.0).unwrap_err(),
        EngineError::PromotionNotFound(missing)
    );
}

#[test]
fn dual_discount_promotion_is_rejected_at_creation() {
    let h = setup();
    let mut draft = promotion_draft("Confused");
    draft.discount_amount = Some(100.0);
    assert!(matches!(
        h.service.create_promotion(draft),
        Err(EngineError::InvalidPromotion(_))
    ));
}

#[test]
fn active_promotions_are_newest_first() {
    let h = setup();
    let first = h.service.create_promotion(promotion_draft("One")).unwrap();
    h.clock.advance(Duration::minutes(1));
    let second = h.service.create_promotion(promotion_draft("Two")).unwrap();

    let ids: Vec<Uuid> = h
        .service
        .active_promotions()
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(h.service.promotion(first.id).unwrap().title, "One");
}

#[test]
fn metrics_track_operations() {
    let h = setup();
    let user = Uuid::new_v4();
    let trip = h.service.create_trip(user, request(None)).unwrap();
    let _ = h.service.transition_trip(user, trip.id, TripStatus::Completed);
    h.service.nearby_riders(ALGIERS, None).unwrap();

    let body = h.service.metrics().encode().unwrap();
    assert!(body.contains("trips_created_total 1"));
    assert!(body.contains("nearby_queries_total 1"));
    assert!(body.contains("invalid_transition"));
}

#[test]
fn trip_serializes_locations_as_points() {
    let h = setup();
    let trip = h.service.create_trip(Uuid::new_v4(), request(None)).unwrap();

    let json: Value = serde_json::to_value(&trip).unwrap();
    assert_eq!(json["pickup"]["location"], "POINT(3.0588 36.7538)");
    assert_eq!(json["status"], "pending");
}

#[tokio::test]
async fn lifecycle_events_are_broadcast() {
    let h = setup();
    let mut events = h.service.subscribe();
    let user = Uuid::new_v4();

    let trip = h.service.create_trip(user, request(None)).unwrap();
    h.service.cancel_trip(user, trip.id).unwrap();

    let created = events.recv().await.unwrap();
    assert_eq!(created.trip_id, trip.id);
    assert_eq!(created.from, None);
    assert_eq!(created.to, TripStatus::Pending);

    let cancelled = events.recv().await.unwrap();
    assert_eq!(cancelled.from, Some(TripStatus::Pending));
    assert_eq!(cancelled.to, TripStatus::Cancelled);
    assert_eq!(cancelled.user_id, user);
}

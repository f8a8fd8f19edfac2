use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::engine::lifecycle::TripLifecycle;
use crate::engine::locator::RiderLocator;
use crate::engine::{promotion, rating, validation};
use crate::error::{EngineError, EngineResult};
use crate::models::location::Coordinate;
use crate::models::promotion::{DiscountQuote, Eligibility, Promotion, PromotionDraft};
use crate::models::rating::{Rating, RiderRatings};
use crate::models::rider::{RankedRider, RiderProfile};
use crate::models::trip::{Trip, TripEvent, TripFilter, TripRequest, TripStatus, TripSummary};
use crate::observability::metrics::Metrics;
use crate::store::{PromotionStore, RatingStore, RiderPool, TripStore};

/// The external systems the service reads and writes through.
#[derive(Clone)]
pub struct Collaborators {
    pub trips: Arc<dyn TripStore>,
    pub ratings: Arc<dyn RatingStore>,
    pub promotions: Arc<dyn PromotionStore>,
    pub riders: Arc<dyn RiderPool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyRiders {
    pub riders: Vec<RankedRider>,
    pub search_radius_km: f64,
    pub origin: Coordinate,
}

/// Entry point for callers: every operation reads the clock once, runs the
/// engine, and writes through the collaborators.
///
/// Callers pass the authenticated user id; trips owned by someone else are
/// reported as not found.
pub struct TripService {
    config: Config,
    stores: Collaborators,
    clock: Arc<dyn Clock>,
    lifecycle: TripLifecycle,
    locator: RiderLocator,
    events_tx: broadcast::Sender<TripEvent>,
    metrics: Metrics,
}

impl TripService {
    pub fn new(config: Config, stores: Collaborators, clock: Arc<dyn Clock>) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size.max(1));

        Self {
            lifecycle: TripLifecycle::new(config.pricing),
            locator: RiderLocator::new(config.unknown_location, config.pricing),
            config,
            stores,
            clock,
            events_tx,
            metrics: Metrics::new(),
        }
    }

    pub fn with_system_clock(config: Config, stores: Collaborators) -> Self {
        Self::new(config, stores, Arc::new(SystemClock))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TripEvent> {
        self.events_tx.subscribe()
    }

    pub fn create_trip(&self, user_id: Uuid, request: TripRequest) -> EngineResult<Trip> {
        if let Some(rider_id) = request.rider_id {
            self.stores.riders.get(rider_id)?;
        }

        let now = self.clock.now();
        let trip = self.lifecycle.create(request, user_id, now)?;
        let trip = self.stores.trips.insert(trip)?;

        self.metrics.trips_created_total.inc();
        info!(
            trip_id = %trip.id,
            user_id = %user_id,
            distance_km = trip.distance_km,
            price_da = trip.price_da,
            "trip created"
        );
        self.publish(&trip, None);

        Ok(trip)
    }

    pub fn get_trip(&self, user_id: Uuid, trip_id: Uuid) -> EngineResult<Trip> {
        let trip = self.stores.trips.get(trip_id)?;
        if trip.user_id != user_id {
            return Err(EngineError::TripNotFound(trip_id));
        }
        Ok(trip)
    }

    pub fn user_trips(
        &self,
        user_id: Uuid,
        status: Option<TripStatus>,
        limit: Option<usize>,
        offset: usize,
    ) -> EngineResult<Vec<Trip>> {
        let filter = TripFilter {
            status,
            limit: limit.unwrap_or(self.config.trip_page_size),
            offset,
        };
        self.stores.trips.list_for_user(user_id, &filter)
    }

    pub fn transition_trip(
        &self,
        user_id: Uuid,
        trip_id: Uuid,
        to: TripStatus,
    ) -> EngineResult<Trip> {
        let result = self.get_trip(user_id, trip_id).and_then(|trip| {
            let transition = self.lifecycle.plan(&trip, to, self.clock.now())?;
            let updated = self.stores.trips.apply_transition(&transition)?;
            Ok((transition.from, updated))
        });

        match result {
            Ok((from, trip)) => {
                self.metrics
                    .trip_transitions_total
                    .with_label_values(&[to.as_str(), "success"])
                    .inc();
                info!(trip_id = %trip_id, from = %from, to = %to, "trip status changed");
                self.publish(&trip, Some(from));
                Ok(trip)
            }
            Err(err) => {
                self.metrics
                    .trip_transitions_total
                    .with_label_values(&[to.as_str(), err.kind()])
                    .inc();
                warn!(trip_id = %trip_id, to = %to, error = %err, "trip transition rejected");
                Err(err)
            }
        }
    }

    pub fn cancel_trip(&self, user_id: Uuid, trip_id: Uuid) -> EngineResult<Trip> {
        self.transition_trip(user_id, trip_id, TripStatus::Cancelled)
    }

    pub fn nearby_riders(
        &self,
        origin: Coordinate,
        radius_km: Option<f64>,
    ) -> EngineResult<NearbyRiders> {
        validation::coordinate("origin", &origin)?;
        let search_radius_km = validation::search_radius(
            radius_km,
            self.config.default_radius_km,
            self.config.min_radius_km,
            self.config.max_radius_km,
        )?;

        let pool = self.stores.riders.online_riders(self.config.rider_pool_limit)?;
        let riders = self.locator.nearby(&origin, &pool, search_radius_km)?;

        self.metrics.nearby_queries_total.inc();
        self.metrics.nearby_candidates.observe(riders.len() as f64);
        info!(
            pool = pool.len(),
            matched = riders.len(),
            radius_km = search_radius_km,
            "nearby riders resolved"
        );

        Ok(NearbyRiders {
            riders,
            search_radius_km,
            origin,
        })
    }

    pub fn rider(&self, rider_id: Uuid) -> EngineResult<RiderProfile> {
        self.stores.riders.get(rider_id)
    }

    pub fn rider_ratings(
        &self,
        rider_id: Uuid,
        limit: Option<usize>,
    ) -> EngineResult<RiderRatings> {
        let limit = limit.unwrap_or(self.config.rating_history_limit);
        let ratings = self.stores.ratings.recent_for_rider(rider_id, limit)?;
        Ok(rating::summarize(ratings))
    }

    pub fn rate_trip(
        &self,
        user_id: Uuid,
        trip_id: Uuid,
        score: i64,
        comment: Option<String>,
    ) -> EngineResult<Rating> {
        let result = self.get_trip(user_id, trip_id).and_then(|trip| {
            let rating = rating::rate_trip(&trip, score, comment, self.clock.now())?;
            self.stores.ratings.insert(rating)
        });

        match &result {
            Ok(rating) => {
                self.metrics.ratings_total.with_label_values(&["success"]).inc();
                info!(
                    trip_id = %trip_id,
                    rider_id = %rating.rider_id,
                    rating = rating.rating,
                    "trip rated"
                );
            }
            Err(err) => {
                self.metrics.ratings_total.with_label_values(&[err.kind()]).inc();
                warn!(trip_id = %trip_id, error = %err, "trip rating rejected");
            }
        }

        result
    }

    pub fn create_promotion(&self, draft: PromotionDraft) -> EngineResult<Promotion> {
        let promotion = promotion::create(draft, self.clock.now())?;
        let promotion = self.stores.promotions.insert(promotion)?;
        info!(promotion_id = %promotion.id, rule = ?promotion.rule, "promotion created");
        Ok(promotion)
    }

    pub fn promotion(&self, promotion_id: Uuid) -> EngineResult<Promotion> {
        self.stores.promotions.get(promotion_id)
    }

    pub fn active_promotions(&self) -> EngineResult<Vec<Promotion>> {
        self.stores.promotions.list_active(self.clock.now())
    }

    pub fn check_promotion_eligibility(
        &self,
        user_id: Uuid,
        promotion_id: Uuid,
    ) -> EngineResult<Eligibility> {
        let promotion = self.stores.promotions.get(promotion_id)?;

        if !promotion::is_valid_now(&promotion, self.clock.now()) {
            return Ok(Eligibility {
                eligible: false,
                reason: promotion::NOT_ACTIVE_REASON.to_string(),
            });
        }

        let all_trips = TripFilter {
            status: None,
            limit: usize::MAX,
            offset: 0,
        };
        let history: Vec<TripSummary> = self
            .stores
            .trips
            .list_for_user(user_id, &all_trips)?
            .iter()
            .map(TripSummary::from)
            .collect();

        Ok(promotion::check_eligibility(&promotion, &history))
    }

    pub fn apply_promotion_discount(
        &self,
        promotion_id: Uuid,
        trip_price: f64,
    ) -> EngineResult<DiscountQuote> {
        let result = self.price_discount(promotion_id, trip_price);

        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => err.kind(),
        };
        self.metrics
            .promotion_discounts_total
            .with_label_values(&[outcome])
            .inc();
        if let Err(err) = &result {
            warn!(promotion_id = %promotion_id, error = %err, "promotion discount rejected");
        }

        result
    }

    fn price_discount(&self, promotion_id: Uuid, trip_price: f64) -> EngineResult<DiscountQuote> {
        if !(trip_price > 0.0) || !trip_price.is_finite() {
            return Err(EngineError::InvalidTripPrice(trip_price));
        }

        let promotion = self.stores.promotions.get(promotion_id)?;
        promotion::ensure_valid(&promotion, self.clock.now())?;
        let discount = promotion::apply_discount(&promotion, trip_price)?;

        Ok(DiscountQuote {
            promotion_id: promotion.id,
            promotion_title: promotion.title,
            original_price: trip_price,
            discount_amount: discount.discount_amount,
            final_price: discount.final_price,
        })
    }

    fn publish(&self, trip: &Trip, from: Option<TripStatus>) {
        let event = TripEvent {
            trip_id: trip.id,
            user_id: trip.user_id,
            rider_id: trip.rider_id,
            from,
            to: trip.status,
            at: trip.updated_at,
        };
        let _ = self.events_tx.send(event);
    }
}

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::geo::wkt;
use crate::models::location::Coordinate;
use crate::models::promotion::Promotion;
use crate::models::rating::Rating;
use crate::models::rider::{RiderProfile, RiderStatus};
use crate::models::trip::{Trip, TripFilter, TripTransition};
use crate::store::{PromotionStore, RatingStore, RiderPool, TripStore};

#[derive(Default)]
pub struct MemoryTripStore {
    trips: DashMap<Uuid, Trip>,
}

impl MemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

impl TripStore for MemoryTripStore {
    fn insert(&self, trip: Trip) -> EngineResult<Trip> {
        match self.trips.entry(trip.id) {
            Entry::Occupied(_) => Err(EngineError::Conflict(format!(
                "trip {} already exists",
                trip.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(trip.clone());
                Ok(trip)
            }
        }
    }

    fn get(&self, id: Uuid) -> EngineResult<Trip> {
        self.trips
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(EngineError::TripNotFound(id))
    }

    fn apply_transition(&self, transition: &TripTransition) -> EngineResult<Trip> {
        // The shard lock held by `get_mut` serialises concurrent writers.
        let mut trip = self
            .trips
            .get_mut(&transition.trip_id)
            .ok_or(EngineError::TripNotFound(transition.trip_id))?;

        if trip.status != transition.from {
            return Err(EngineError::Conflict(format!(
                "trip {} is {} but transition expected {}",
                transition.trip_id, trip.status, transition.from
            )));
        }

        transition.apply_to(&mut trip);
        Ok(trip.clone())
    }

    fn list_for_user(&self, user_id: Uuid, filter: &TripFilter) -> EngineResult<Vec<Trip>> {
        let mut trips: Vec<Trip> = self
            .trips
            .iter()
            .filter(|entry| {
                let trip = entry.value();
                trip.user_id == user_id && filter.status.is_none_or(|status| trip.status == status)
            })
            .map(|entry| entry.value().clone())
            .collect();

        trips.sort_by(|a, b| b.requested_at.cmp(&a.requested_at).then_with(|| a.id.cmp(&b.id)));

        Ok(trips
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryRatingStore {
    ratings: DashMap<Uuid, Rating>,
}

impl MemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RatingStore for MemoryRatingStore {
    fn insert(&self, rating: Rating) -> EngineResult<Rating> {
        // Keyed by trip so a second rating for the same trip collides.
        match self.ratings.entry(rating.trip_id) {
            Entry::Occupied(_) => Err(EngineError::AlreadyRated(rating.trip_id)),
            Entry::Vacant(slot) => {
                slot.insert(rating.clone());
                Ok(rating)
            }
        }
    }

    fn recent_for_rider(&self, rider_id: Uuid, limit: usize) -> EngineResult<Vec<Rating>> {
        let mut ratings: Vec<Rating> = self
            .ratings
            .iter()
            .filter(|entry| entry.value().rider_id == rider_id)
            .map(|entry| entry.value().clone())
            .collect();

        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        ratings.truncate(limit);
        Ok(ratings)
    }
}

#[derive(Default)]
pub struct MemoryPromotionStore {
    promotions: DashMap<Uuid, Promotion>,
}

impl MemoryPromotionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PromotionStore for MemoryPromotionStore {
    fn insert(&self, promotion: Promotion) -> EngineResult<Promotion> {
        self.promotions.insert(promotion.id, promotion.clone());
        Ok(promotion)
    }

    fn get(&self, id: Uuid) -> EngineResult<Promotion> {
        self.promotions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(EngineError::PromotionNotFound(id))
    }

    fn list_active(&self, now: DateTime<Utc>) -> EngineResult<Vec<Promotion>> {
        let mut promotions: Vec<Promotion> = self
            .promotions
            .iter()
            .filter(|entry| entry.value().is_active && entry.value().valid_until >= now)
            .map(|entry| entry.value().clone())
            .collect();

        promotions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(promotions)
    }
}

/// Rider registry standing in for the driver-onboarding side of the system.
#[derive(Default)]
pub struct MemoryRiderPool {
    riders: DashMap<Uuid, RiderProfile>,
}

impl MemoryRiderPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, rider: RiderProfile) {
        self.riders.insert(rider.id, rider);
    }

    pub fn update_location(
        &self,
        id: Uuid,
        location: &Coordinate,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let mut rider = self.riders.get_mut(&id).ok_or(EngineError::RiderNotFound(id))?;
        rider.current_location = Some(wkt::encode(location));
        rider.updated_at = now;
        Ok(())
    }

    pub fn update_status(
        &self,
        id: Uuid,
        status: RiderStatus,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let mut rider = self.riders.get_mut(&id).ok_or(EngineError::RiderNotFound(id))?;
        rider.status = status;
        rider.updated_at = now;
        Ok(())
    }
}

impl RiderPool for MemoryRiderPool {
    fn online_riders(&self, limit: usize) -> EngineResult<Vec<RiderProfile>> {
        let mut riders: Vec<RiderProfile> = self
            .riders
            .iter()
            .filter(|entry| entry.value().status == RiderStatus::Online)
            .map(|entry| entry.value().clone())
            .collect();

        // DashMap iteration order is arbitrary; keep snapshots reproducible.
        riders.sort_by_key(|rider| rider.id);
        riders.truncate(limit);
        Ok(riders)
    }

    fn get(&self, id: Uuid) -> EngineResult<RiderProfile> {
        self.riders
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(EngineError::RiderNotFound(id))
    }
}

//! Narrow interfaces to the systems the engine reads from and writes to.
//!
//! Implementations surface missing entities with the matching `*NotFound`
//! error and wrap any backend failure in [`EngineError::Store`](crate::error::EngineError::Store).

pub mod memory;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::promotion::Promotion;
use crate::models::rating::Rating;
use crate::models::rider::RiderProfile;
use crate::models::trip::{Trip, TripFilter, TripTransition};

pub trait TripStore: Send + Sync {
    fn insert(&self, trip: Trip) -> EngineResult<Trip>;

    fn get(&self, id: Uuid) -> EngineResult<Trip>;

    /// Writes status and timestamps only, and only if the stored status
    /// still equals `transition.from`; otherwise fails with `Conflict`.
    fn apply_transition(&self, transition: &TripTransition) -> EngineResult<Trip>;

    /// The user's trips, newest `requested_at` first.
    fn list_for_user(&self, user_id: Uuid, filter: &TripFilter) -> EngineResult<Vec<Trip>>;
}

pub trait RatingStore: Send + Sync {
    /// Fails with `AlreadyRated` when the trip already has a rating.
    fn insert(&self, rating: Rating) -> EngineResult<Rating>;

    /// Most recent first.
    fn recent_for_rider(&self, rider_id: Uuid, limit: usize) -> EngineResult<Vec<Rating>>;
}

pub trait PromotionStore: Send + Sync {
    fn insert(&self, promotion: Promotion) -> EngineResult<Promotion>;

    fn get(&self, id: Uuid) -> EngineResult<Promotion>;

    /// Active and not yet expired at `now`, newest `created_at` first.
    fn list_active(&self, now: DateTime<Utc>) -> EngineResult<Vec<Promotion>>;
}

pub trait RiderPool: Send + Sync {
    /// Point-in-time snapshot of online riders, at most `limit` of them.
    fn online_riders(&self, limit: usize) -> EngineResult<Vec<RiderProfile>>;

    fn get(&self, id: Uuid) -> EngineResult<RiderProfile>;
}

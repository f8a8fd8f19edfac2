use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::engine::pricing::PricingPolicy;
use crate::engine::validation;
use crate::error::{EngineError, EngineResult};
use crate::geo::haversine_km;
use crate::models::trip::{Trip, TripRequest, TripStatus, TripTransition};

/// Trip state machine: `pending -> accepted -> in_progress -> completed`,
/// with `cancelled` reachable from every non-terminal state.
///
/// Ownership is checked by the caller; every method here assumes the trip
/// handle it receives is already authorised.
#[derive(Debug, Clone, Copy, Default)]
pub struct TripLifecycle {
    pub pricing: PricingPolicy,
}

impl TripLifecycle {
    pub fn new(pricing: PricingPolicy) -> Self {
        Self { pricing }
    }

    pub fn create(
        &self,
        request: TripRequest,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> EngineResult<Trip> {
        validation::place("pickup", &request.pickup)?;
        validation::place("destination", &request.destination)?;

        let distance_km = haversine_km(&request.pickup.location, &request.destination.location);
        let fare = self.pricing.quote(distance_km);

        Ok(Trip {
            id: Uuid::new_v4(),
            user_id,
            rider_id: request.rider_id,
            pickup: request.pickup,
            destination: request.destination,
            distance_km: fare.distance_km,
            estimated_duration_minutes: fare.estimated_duration_minutes,
            price_da: fare.price_da,
            status: TripStatus::Pending,
            requested_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        })
    }

    /// Checks a status change without touching the trip.
    pub fn plan(
        &self,
        trip: &Trip,
        to: TripStatus,
        now: DateTime<Utc>,
    ) -> EngineResult<TripTransition> {
        if !trip.status.can_transition_to(to) {
            return Err(EngineError::InvalidTransition {
                from: trip.status,
                to,
            });
        }

        Ok(TripTransition {
            trip_id: trip.id,
            from: trip.status,
            to,
            at: now,
            started_at: (to == TripStatus::InProgress).then_some(now),
            completed_at: (to == TripStatus::Completed).then_some(now),
        })
    }

    /// Applies a status change in place; on error the trip is left as it was.
    pub fn transition(
        &self,
        trip: &mut Trip,
        to: TripStatus,
        now: DateTime<Utc>,
    ) -> EngineResult<TripTransition> {
        let transition = self.plan(trip, to, now)?;
        transition.apply_to(trip);
        Ok(transition)
    }

    pub fn cancel(&self, trip: &mut Trip, now: DateTime<Utc>) -> EngineResult<TripTransition> {
        self.transition(trip, TripStatus::Cancelled, now)
    }
}

use tracing::debug;

use crate::engine::pricing::PricingPolicy;
use crate::engine::validation;
use crate::error::{EngineError, EngineResult};
use crate::geo::{haversine_km, round_to, wkt};
use crate::models::location::Coordinate;
use crate::models::rider::{LocationSource, RankedRider, RiderProfile};

/// What to do with a rider whose stored position is missing or unreadable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnknownLocationPolicy {
    Exclude,
    /// Place the rider at a fixed configured point and flag the entry.
    Fallback(Coordinate),
}

#[derive(Debug, Clone, Copy)]
pub struct RiderLocator {
    pub unknown_location: UnknownLocationPolicy,
    pub pricing: PricingPolicy,
}

impl RiderLocator {
    pub fn new(unknown_location: UnknownLocationPolicy, pricing: PricingPolicy) -> Self {
        Self {
            unknown_location,
            pricing,
        }
    }

    pub fn resolve_location(&self, rider: &RiderProfile) -> Option<(Coordinate, LocationSource)> {
        if let Some(location) = rider.current_location.as_deref().and_then(wkt::decode) {
            return Some((location, LocationSource::Reported));
        }

        match self.unknown_location {
            UnknownLocationPolicy::Exclude => None,
            UnknownLocationPolicy::Fallback(point) => Some((point, LocationSource::Fallback)),
        }
    }

    /// Riders within `radius_km` of `origin`, nearest first.
    ///
    /// Distances are rounded to 2 decimals before filtering; equal distances
    /// keep pool order. Fails with `OutOfRange` for an invalid origin or a
    /// radius that is not a positive finite number.
    pub fn nearby(
        &self,
        origin: &Coordinate,
        pool: &[RiderProfile],
        radius_km: f64,
    ) -> EngineResult<Vec<RankedRider>> {
        validation::coordinate("origin", origin)?;
        if !(radius_km.is_finite() && radius_km > 0.0) {
            return Err(EngineError::OutOfRange(format!(
                "radius must be a positive number of km, got {radius_km}"
            )));
        }

        let mut ranked: Vec<RankedRider> = pool
            .iter()
            .filter_map(|rider| {
                let Some((location, location_source)) = self.resolve_location(rider) else {
                    debug!(rider_id = %rider.id, "skipping rider without a known location");
                    return None;
                };

                let raw_distance = haversine_km(origin, &location);
                let distance_km = round_to(raw_distance, 2);
                if distance_km > radius_km {
                    return None;
                }

                Some(RankedRider {
                    id: rider.id,
                    display_name: rider.display_name.clone(),
                    phone: rider.phone.clone(),
                    rating_average: rider.rating_or_default(),
                    location,
                    location_source,
                    distance_km,
                    pickup_eta_minutes: self.pricing.estimated_duration_minutes(raw_distance),
                    status: rider.status,
                    vehicle_type: rider.vehicle_type.clone(),
                    license_plate: rider.license_plate.clone(),
                })
            })
            .collect();

        ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        Ok(ranked)
    }
}

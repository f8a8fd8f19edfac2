//! Linear fare and duration model.
//!
//! `price = round(base + km * per_km)` and
//! `minutes = round(km / average_speed * 60)`, both on the unrounded distance.

use serde::{Deserialize, Serialize};

use crate::geo::round_to;

pub const BASE_FARE_DA: f64 = 100.0;
pub const PER_KM_DA: f64 = 50.0;
pub const AVERAGE_SPEED_KMH: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub base_fare_da: f64,
    pub per_km_da: f64,
    pub average_speed_kmh: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            base_fare_da: BASE_FARE_DA,
            per_km_da: PER_KM_DA,
            average_speed_kmh: AVERAGE_SPEED_KMH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FareQuote {
    pub distance_km: f64,
    pub estimated_duration_minutes: i64,
    pub price_da: i64,
}

impl PricingPolicy {
    pub fn price_da(&self, distance_km: f64) -> i64 {
        (self.base_fare_da + distance_km * self.per_km_da).round() as i64
    }

    pub fn estimated_duration_minutes(&self, distance_km: f64) -> i64 {
        (distance_km / self.average_speed_kmh * 60.0).round() as i64
    }

    pub fn quote(&self, distance_km: f64) -> FareQuote {
        FareQuote {
            distance_km: round_to(distance_km, 2),
            estimated_duration_minutes: self.estimated_duration_minutes(distance_km),
            price_da: self.price_da(distance_km),
        }
    }
}

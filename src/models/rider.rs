use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::Coordinate;

pub const DEFAULT_RATING_AVERAGE: f64 = 4.5;
pub const DEFAULT_VEHICLE_TYPE: &str = "motorcycle";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiderStatus {
    Online,
    Offline,
    Busy,
}

/// A driver as returned by the rider pool. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderProfile {
    pub id: Uuid,
    pub display_name: String,
    pub phone: String,
    #[serde(default)]
    pub rating_average: Option<f64>,
    /// Last reported position as stored, `POINT(lng lat)`.
    #[serde(default)]
    pub current_location: Option<String>,
    pub status: RiderStatus,
    #[serde(default = "default_vehicle_type")]
    pub vehicle_type: String,
    #[serde(default)]
    pub license_plate: Option<String>,
    pub updated_at: DateTime<Utc>,
}

fn default_vehicle_type() -> String {
    DEFAULT_VEHICLE_TYPE.to_string()
}

impl RiderProfile {
    pub fn rating_or_default(&self) -> f64 {
        self.rating_average.unwrap_or(DEFAULT_RATING_AVERAGE)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Reported,
    Fallback,
}

/// A rider that passed the radius filter, with its resolved position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedRider {
    pub id: Uuid,
    pub display_name: String,
    pub phone: String,
    pub rating_average: f64,
    pub location: Coordinate,
    pub location_source: LocationSource,
    pub distance_km: f64,
    pub pickup_eta_minutes: i64,
    pub status: RiderStatus,
    pub vehicle_type: String,
    pub license_plate: Option<String>,
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::wkt;
use crate::models::location::Coordinate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub const ALL: [TripStatus; 5] = [
        TripStatus::Pending,
        TripStatus::Accepted,
        TripStatus::InProgress,
        TripStatus::Completed,
        TripStatus::Cancelled,
    ];

    /// Immediate successor on the forward path, if any.
    pub fn successor(self) -> Option<TripStatus> {
        match self {
            TripStatus::Pending => Some(TripStatus::Accepted),
            TripStatus::Accepted => Some(TripStatus::InProgress),
            TripStatus::InProgress => Some(TripStatus::Completed),
            TripStatus::Completed | TripStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: TripStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == TripStatus::Cancelled || self.successor() == Some(next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TripStatus::Pending => "pending",
            TripStatus::Accepted => "accepted",
            TripStatus::InProgress => "in_progress",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pickup or destination. The location is persisted as `POINT(lng lat)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(with = "wkt::serde_point")]
    pub location: Coordinate,
    pub address: String,
}

impl Place {
    pub fn new(location: Coordinate, address: impl Into<String>) -> Self {
        Self {
            location,
            address: address.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rider_id: Option<Uuid>,
    pub pickup: Place,
    pub destination: Place,
    pub distance_km: f64,
    pub estimated_duration_minutes: i64,
    pub price_da: i64,
    pub status: TripStatus,
    pub requested_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// What a passenger submits to request a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub pickup: Place,
    pub destination: Place,
    #[serde(default)]
    pub rider_id: Option<Uuid>,
}

/// A status change produced by the lifecycle, written by the trip store as
/// a partial update guarded on `from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripTransition {
    pub trip_id: Uuid,
    pub from: TripStatus,
    pub to: TripStatus,
    pub at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TripTransition {
    pub fn apply_to(&self, trip: &mut Trip) {
        trip.status = self.to;
        trip.updated_at = self.at;
        if let Some(started_at) = self.started_at {
            trip.started_at = Some(started_at);
        }
        if let Some(completed_at) = self.completed_at {
            trip.completed_at = Some(completed_at);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub id: Uuid,
    pub status: TripStatus,
}

impl From<&Trip> for TripSummary {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id,
            status: trip.status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripFilter {
    pub status: Option<TripStatus>,
    pub limit: usize,
    pub offset: usize,
}

/// Broadcast on creation (`from == None`) and on every accepted transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripEvent {
    pub trip_id: Uuid,
    pub user_id: Uuid,
    pub rider_id: Option<Uuid>,
    pub from: Option<TripStatus>,
    pub to: TripStatus,
    pub at: DateTime<Utc>,
}

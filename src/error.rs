use thiserror::Error;
use uuid::Uuid;

use crate::models::trip::TripStatus;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: TripStatus, to: TripStatus },

    #[error("invalid trip price: {0} (must be a positive number)")]
    InvalidTripPrice(f64),

    #[error("promotion {0} has expired")]
    PromotionExpired(Uuid),

    #[error("promotion {0} is not currently active")]
    PromotionInactive(Uuid),

    #[error("invalid promotion: {0}")]
    InvalidPromotion(String),

    #[error("rider {0} not found")]
    RiderNotFound(Uuid),

    #[error("trip {0} not found")]
    TripNotFound(Uuid),

    #[error("promotion {0} not found")]
    PromotionNotFound(Uuid),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("trip {0} is not completed; only completed trips can be rated")]
    TripNotCompleted(Uuid),

    #[error("trip {0} has no assigned rider")]
    TripHasNoRider(Uuid),

    #[error("trip {0} has already been rated")]
    AlreadyRated(Uuid),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),
}

impl EngineError {
    /// True for the "referenced entity absent" family surfaced by stores.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::RiderNotFound(_)
                | EngineError::TripNotFound(_)
                | EngineError::PromotionNotFound(_)
        )
    }

    /// Short stable label used as a metric/log dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidTransition { .. } => "invalid_transition",
            EngineError::InvalidTripPrice(_) => "invalid_trip_price",
            EngineError::PromotionExpired(_) => "promotion_expired",
            EngineError::PromotionInactive(_) => "promotion_inactive",
            EngineError::InvalidPromotion(_) => "invalid_promotion",
            EngineError::RiderNotFound(_) => "rider_not_found",
            EngineError::TripNotFound(_) => "trip_not_found",
            EngineError::PromotionNotFound(_) => "promotion_not_found",
            EngineError::OutOfRange(_) => "out_of_range",
            EngineError::InvalidInput(_) => "invalid_input",
            EngineError::TripNotCompleted(_) => "trip_not_completed",
            EngineError::TripHasNoRider(_) => "trip_has_no_rider",
            EngineError::AlreadyRated(_) => "already_rated",
            EngineError::Conflict(_) => "conflict",
            EngineError::Config(_) => "config",
            EngineError::Store(_) => "store",
        }
    }
}

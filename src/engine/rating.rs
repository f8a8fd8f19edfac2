use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::engine::validation;
use crate::error::{EngineError, EngineResult};
use crate::geo::round_to;
use crate::models::rating::{Rating, RiderRatings};
use crate::models::trip::{Trip, TripStatus};

/// Builds the rating a passenger leaves on their completed trip.
pub fn rate_trip(
    trip: &Trip,
    rating: i64,
    comment: Option<String>,
    now: DateTime<Utc>,
) -> EngineResult<Rating> {
    let rating = validation::rating(rating)?;

    if trip.status != TripStatus::Completed {
        return Err(EngineError::TripNotCompleted(trip.id));
    }
    let rider_id = trip.rider_id.ok_or(EngineError::TripHasNoRider(trip.id))?;

    let comment = comment
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    Ok(Rating {
        id: Uuid::new_v4(),
        trip_id: trip.id,
        user_id: trip.user_id,
        rider_id,
        rating,
        comment,
        created_at: now,
    })
}

/// Average over the given ratings, one decimal; zero when there are none.
pub fn summarize(ratings: Vec<Rating>) -> RiderRatings {
    let total_ratings = ratings.len();
    let average_rating = if total_ratings == 0 {
        0.0
    } else {
        let sum: u32 = ratings.iter().map(|r| r.rating as u32).sum();
        round_to(sum as f64 / total_ratings as f64, 1)
    };

    RiderRatings {
        ratings,
        average_rating,
        total_ratings,
    }
}

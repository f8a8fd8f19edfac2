//! Range checks mirrored from the request-validation layer, so the engine
//! rejects bad input the same way when it is called directly.

use crate::error::{EngineError, EngineResult};
use crate::models::location::Coordinate;
use crate::models::rating::{MAX_RATING, MIN_RATING};
use crate::models::trip::Place;

pub fn coordinate(label: &str, value: &Coordinate) -> EngineResult<()> {
    if !value.latitude.is_finite() || !(-90.0..=90.0).contains(&value.latitude) {
        return Err(EngineError::OutOfRange(format!(
            "{label} latitude {} not in [-90, 90]",
            value.latitude
        )));
    }
    if !value.longitude.is_finite() || !(-180.0..=180.0).contains(&value.longitude) {
        return Err(EngineError::OutOfRange(format!(
            "{label} longitude {} not in [-180, 180]",
            value.longitude
        )));
    }
    Ok(())
}

pub fn place(label: &str, value: &Place) -> EngineResult<()> {
    coordinate(label, &value.location)?;
    if value.address.trim().is_empty() {
        return Err(EngineError::InvalidInput(format!("{label} address is required")));
    }
    Ok(())
}

/// Resolves an optional search radius against the configured bounds.
pub fn search_radius(
    requested: Option<f64>,
    default: f64,
    min: f64,
    max: f64,
) -> EngineResult<f64> {
    let radius = requested.unwrap_or(default);
    if !radius.is_finite() || radius < min || radius > max {
        return Err(EngineError::OutOfRange(format!(
            "radius must be between {min} and {max} km, got {radius}"
        )));
    }
    Ok(radius)
}

pub fn rating(value: i64) -> EngineResult<u8> {
    if !(MIN_RATING..=MAX_RATING).contains(&value) {
        return Err(EngineError::OutOfRange(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}, got {value}"
        )));
    }
    Ok(value as u8)
}

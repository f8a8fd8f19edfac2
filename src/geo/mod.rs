pub mod wkt;

use crate::models::location::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance in kilometres.
///
/// Callers are expected to pass range-checked coordinates.
pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    // Rounding can push the term a hair past 1.0 for antipodal points.
    let central_angle = 2.0 * haversine.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Rounds to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

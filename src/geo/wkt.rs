//! `POINT(<longitude> <latitude>)` text, the geometry form the stores persist.
//!
//! Decoding never fails loudly: anything that is not a well-formed, in-range
//! point yields `None` and the caller decides what an unknown position means.

use crate::models::location::Coordinate;

pub fn encode(coordinate: &Coordinate) -> String {
    format!("POINT({} {})", coordinate.longitude, coordinate.latitude)
}

pub fn decode(text: &str) -> Option<Coordinate> {
    let text = text.trim();
    // PostGIS may hand back EWKT with an SRID prefix.
    let text = match text.split_once(';') {
        Some((srid, rest)) if srid.trim().to_ascii_uppercase().starts_with("SRID=") => rest.trim(),
        Some(_) => return None,
        None => text,
    };

    let keyword = text.get(..5)?;
    if !keyword.eq_ignore_ascii_case("POINT") {
        return None;
    }

    let body = text[5..]
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')?;

    let mut parts = body.split_whitespace();
    let longitude: f64 = parts.next()?.parse().ok()?;
    let latitude: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let coordinate = Coordinate::new(latitude, longitude);
    coordinate.is_valid().then_some(coordinate)
}

/// Serde adapter storing a [`Coordinate`] as POINT text.
pub mod serde_point {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::models::location::Coordinate;

    pub fn serialize<S>(coordinate: &Coordinate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::encode(coordinate))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Coordinate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::decode(&raw)
            .ok_or_else(|| D::Error::custom(format!("malformed POINT geometry: {raw}")))
    }
}

use std::env;
use std::str::FromStr;

use crate::engine::locator::UnknownLocationPolicy;
use crate::engine::pricing::PricingPolicy;
use crate::error::EngineError;
use crate::models::location::Coordinate;

/// Lakhdaria, where riders without a reported position are parked when the
/// fallback policy is enabled.
pub const DEFAULT_FALLBACK_LOCATION: Coordinate = Coordinate::new(36.5644, 3.5892);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?}, expected compact or json")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_level: String,
    pub log_format: LogFormat,
    pub default_radius_km: f64,
    pub min_radius_km: f64,
    pub max_radius_km: f64,
    pub rider_pool_limit: usize,
    pub unknown_location: UnknownLocationPolicy,
    pub pricing: PricingPolicy,
    pub trip_page_size: usize,
    pub rating_history_limit: usize,
    pub event_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            default_radius_km: 50.0,
            min_radius_km: 1.0,
            max_radius_km: 100.0,
            rider_pool_limit: 50,
            unknown_location: UnknownLocationPolicy::Exclude,
            pricing: PricingPolicy::default(),
            trip_page_size: 50,
            rating_history_limit: 10,
            event_buffer_size: 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, EngineError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let unknown_location = match lookup("UNKNOWN_RIDER_LOCATION")
            .map(|raw| raw.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("exclude") => UnknownLocationPolicy::Exclude,
            Some("fallback") => UnknownLocationPolicy::Fallback(Coordinate::new(
                parse_or_default(
                    &lookup,
                    "FALLBACK_LATITUDE",
                    DEFAULT_FALLBACK_LOCATION.latitude,
                )?,
                parse_or_default(
                    &lookup,
                    "FALLBACK_LONGITUDE",
                    DEFAULT_FALLBACK_LOCATION.longitude,
                )?,
            )),
            Some(other) => {
                return Err(EngineError::Config(format!(
                    "invalid UNKNOWN_RIDER_LOCATION: {other:?}, expected exclude or fallback"
                )));
            }
        };

        let config = Self {
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse_or_default(&lookup, "LOG_FORMAT", defaults.log_format)?,
            default_radius_km: parse_or_default(
                &lookup,
                "DEFAULT_SEARCH_RADIUS_KM",
                defaults.default_radius_km,
            )?,
            min_radius_km: parse_or_default(
                &lookup,
                "MIN_SEARCH_RADIUS_KM",
                defaults.min_radius_km,
            )?,
            max_radius_km: parse_or_default(
                &lookup,
                "MAX_SEARCH_RADIUS_KM",
                defaults.max_radius_km,
            )?,
            rider_pool_limit: parse_or_default(
                &lookup,
                "RIDER_POOL_LIMIT",
                defaults.rider_pool_limit,
            )?,
            unknown_location,
            pricing: PricingPolicy {
                base_fare_da: parse_or_default(
                    &lookup,
                    "PRICING_BASE_FARE_DA",
                    defaults.pricing.base_fare_da,
                )?,
                per_km_da: parse_or_default(
                    &lookup,
                    "PRICING_PER_KM_DA",
                    defaults.pricing.per_km_da,
                )?,
                average_speed_kmh: parse_or_default(
                    &lookup,
                    "PRICING_AVERAGE_SPEED_KMH",
                    defaults.pricing.average_speed_kmh,
                )?,
            },
            trip_page_size: parse_or_default(&lookup, "TRIP_PAGE_SIZE", defaults.trip_page_size)?,
            rating_history_limit: parse_or_default(
                &lookup,
                "RATING_HISTORY_LIMIT",
                defaults.rating_history_limit,
            )?,
            event_buffer_size: parse_or_default(
                &lookup,
                "EVENT_BUFFER_SIZE",
                defaults.event_buffer_size,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.min_radius_km > 0.0
            && self.min_radius_km <= self.default_radius_km
            && self.default_radius_km <= self.max_radius_km)
        {
            return Err(EngineError::Config(format!(
                "search radius bounds must satisfy 0 < min ({}) <= default ({}) <= max ({})",
                self.min_radius_km, self.default_radius_km, self.max_radius_km
            )));
        }

        let fares = [
            ("PRICING_BASE_FARE_DA", self.pricing.base_fare_da),
            ("PRICING_PER_KM_DA", self.pricing.per_km_da),
        ];
        for (key, value) in fares {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::Config(format!(
                    "{key} must be a non-negative number, got {value}"
                )));
            }
        }

        if !(self.pricing.average_speed_kmh.is_finite() && self.pricing.average_speed_kmh > 0.0) {
            return Err(EngineError::Config(format!(
                "average speed must be positive, got {}",
                self.pricing.average_speed_kmh
            )));
        }

        if let UnknownLocationPolicy::Fallback(point) = self.unknown_location {
            if !point.is_valid() {
                return Err(EngineError::Config(format!(
                    "fallback location out of range: ({}, {})",
                    point.latitude, point.longitude
                )));
            }
        }

        if self.event_buffer_size == 0 {
            return Err(EngineError::Config("EVENT_BUFFER_SIZE must be > 0".to_string()));
        }

        Ok(())
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, EngineError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|err| EngineError::Config(format!("invalid {key}: {err}"))),
        None => Ok(default),
    }
}

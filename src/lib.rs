pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod models;
pub mod observability;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{EngineError, EngineResult};
pub use service::{Collaborators, NearbyRiders, TripService};

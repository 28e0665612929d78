//! Core library for the `skycast` CLI.
//!
//! This crate defines:
//! - Configuration and persisted preferences
//! - Location resolution (built-in cities, geocoding, reverse lookup, positioning)
//! - Forecast retrieval and normalization, with a synthetic fallback
//! - Unit conversion and shared domain models
//!
//! It is used by `skycast-cli`, but can also be reused by other binaries or services.

pub mod cities;
pub mod condition;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod geolocation;
pub mod model;
pub mod provider;
pub mod resolver;
pub mod service;
pub mod store;
pub mod synthetic;
pub mod units;

pub use condition::Condition;
pub use config::Config;
pub use error::{GeolocationError, Notice};
pub use fetcher::WeatherFetcher;
pub use model::{Coordinate, DayForecast, HourlySeries, ResolvedLocation, SavedLocation, WeatherSnapshot};
pub use resolver::{LocationResolver, Resolution, ResolutionSource};
pub use service::{Report, Target, WeatherService};
pub use store::Preferences;
pub use units::Unit;

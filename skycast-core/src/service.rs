use anyhow::Result;

use crate::{
    config::Config,
    fetcher::WeatherFetcher,
    model::{Coordinate, WeatherSnapshot},
    resolver::{LocationResolver, Resolution},
};

/// What the user asked weather for.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Automatic position.
    Current,
    /// Free-text place name.
    Name(String),
    /// Explicit coordinates, optionally already named.
    Coordinates { coordinate: Coordinate, name: Option<String>, not_found: bool },
}

impl Target {
    /// Build a target from loose navigation parameters. Coordinates count only
    /// when both are present and finite; otherwise a name, else the current position.
    pub fn from_params(
        latitude: Option<f64>,
        longitude: Option<f64>,
        name: Option<String>,
        not_found: bool,
    ) -> Self {
        let name = name.filter(|n| !n.trim().is_empty());
        match (latitude, longitude) {
            (Some(latitude), Some(longitude))
                if Coordinate::new(latitude, longitude).is_finite() =>
            {
                Target::Coordinates { coordinate: Coordinate::new(latitude, longitude), name, not_found }
            }
            _ => match name {
                Some(name) => Target::Name(name),
                None => Target::Current,
            },
        }
    }
}

/// A resolved location together with its weather.
#[derive(Debug, Clone)]
pub struct Report {
    pub resolution: Resolution,
    pub snapshot: WeatherSnapshot,
}

/// Resolver and fetcher wired together.
#[derive(Debug)]
pub struct WeatherService {
    resolver: LocationResolver,
    fetcher: WeatherFetcher,
}

impl WeatherService {
    pub fn new(resolver: LocationResolver, fetcher: WeatherFetcher) -> Self {
        Self { resolver, fetcher }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(LocationResolver::from_config(config)?, WeatherFetcher::from_config(config)?))
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub async fn resolve(&self, target: &Target) -> Resolution {
        match target {
            Target::Current => self.resolver.resolve(None).await,
            Target::Name(name) => self.resolver.resolve(Some(name)).await,
            Target::Coordinates { coordinate, name, not_found } => {
                self.resolver.resolve_coordinates(*coordinate, name.as_deref(), *not_found).await
            }
        }
    }

    pub async fn report(&self, target: &Target) -> Report {
        let resolution = self.resolve(target).await;
        let snapshot = self.fetcher.fetch_location(&resolution.location).await;
        Report { resolution, snapshot }
    }
}

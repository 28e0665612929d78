//! Location resolution.
//!
//! Turns a free-text place name, explicit coordinates, or the automatic
//! position into a [`ResolvedLocation`]. Every tier that fails hands over to
//! the next one; resolution itself never fails.

use anyhow::{Result, anyhow};
use std::{future::Future, time::Duration};
use tracing::{debug, info, warn};

use crate::{
    cities::{self, MatchKind},
    config::{Config, DefaultLocation},
    error::Notice,
    geolocation::{PositionOptions, PositionSource, position_source_from_config},
    model::{Coordinate, ResolvedLocation},
    provider::{GeocodeCandidate, Geocoder, NominatimReverse, OpenMeteoGeocoder, ReverseGeocoder},
};

/// Number of candidates requested from the geocoding search.
pub const SEARCH_CANDIDATES: usize = 5;

/// Which tier produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    KnownCity(MatchKind),
    Geocoded,
    Coordinates,
    Position,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub location: ResolvedLocation,
    pub source: ResolutionSource,
    /// Set whenever a default was substituted.
    pub notice: Option<Notice>,
}

#[derive(Debug)]
pub struct LocationResolver {
    geocoder: Box<dyn Geocoder>,
    reverse: Vec<Box<dyn ReverseGeocoder>>,
    position: Box<dyn PositionSource>,
    default_location: DefaultLocation,
    search_timeout: Duration,
    reverse_timeout: Duration,
    position_options: PositionOptions,
}

impl LocationResolver {
    /// `reverse` providers are tried in order.
    pub fn new(
        geocoder: Box<dyn Geocoder>,
        reverse: Vec<Box<dyn ReverseGeocoder>>,
        position: Box<dyn PositionSource>,
        config: &Config,
    ) -> Self {
        Self {
            geocoder,
            reverse,
            position,
            default_location: config.default_location.clone(),
            search_timeout: config.timeouts.search(),
            reverse_timeout: config.timeouts.reverse(),
            position_options: PositionOptions::from(&config.geolocation),
        }
    }

    /// Open-Meteo search, Open-Meteo then Nominatim reverse, IP positioning.
    pub fn from_config(config: &Config) -> Result<Self> {
        let open_meteo = OpenMeteoGeocoder::from_config(config)?;
        let nominatim = NominatimReverse::from_config(config)?;

        Ok(Self::new(
            Box::new(open_meteo.clone()),
            vec![Box::new(open_meteo), Box::new(nominatim)],
            position_source_from_config(config),
            config,
        ))
    }

    /// Resolve a place name, or the current position when no name is given.
    /// Blank names count as no name.
    pub async fn resolve(&self, name: Option<&str>) -> Resolution {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => self.resolve_name(name).await,
            None => self.resolve_current().await,
        }
    }

    pub async fn resolve_name(&self, name: &str) -> Resolution {
        debug!("Resolving location name '{name}'");

        if let Some((city, kind)) = cities::lookup(name) {
            info!("'{name}' matched built-in city '{}' ({kind:?})", city.key);
            return Resolution {
                location: ResolvedLocation::new(city.coordinate, city.display),
                source: ResolutionSource::KnownCity(kind),
                notice: None,
            };
        }

        let search = bounded(self.search_timeout, self.geocoder.search(name, SEARCH_CANDIDATES));
        match search.await {
            Ok(candidates) => match select_best_candidate(&candidates) {
                Some(best) => {
                    info!("Geocoded '{name}' to {} ({})", best.display_name(), best.coordinate());
                    Resolution {
                        location: ResolvedLocation::new(best.coordinate(), best.display_name()),
                        source: ResolutionSource::Geocoded,
                        notice: None,
                    }
                }
                None => {
                    warn!("No geocoding results for '{name}', using default location");
                    self.fallback(Notice::NotFound {
                        query: name.to_string(),
                        fallback: self.default_location.name.clone(),
                    })
                }
            },
            Err(e) => {
                warn!("Geocoding '{name}' failed: {e:#}");
                self.fallback(Notice::LookupFailed {
                    query: name.to_string(),
                    fallback: self.default_location.name.clone(),
                })
            }
        }
    }

    /// Resolve the automatic position and name it by reverse lookup.
    pub async fn resolve_current(&self) -> Resolution {
        debug!("Resolving current position");

        match self.position.current_position(self.position_options).await {
            Ok(coordinate) => {
                let name = self.reverse_name(coordinate).await;
                info!("Resolved current position to '{name}' ({coordinate})");
                Resolution {
                    location: ResolvedLocation::new(coordinate, name),
                    source: ResolutionSource::Position,
                    notice: None,
                }
            }
            Err(error) => {
                warn!("Position lookup failed (code {}): {error}", error.code());
                self.fallback(Notice::Geolocation {
                    error,
                    fallback: self.default_location.name.clone(),
                })
            }
        }
    }

    /// Explicit coordinates with an optional caller-supplied name. A missing
    /// name, or one that is only a coordinate placeholder, is looked up.
    pub async fn resolve_coordinates(
        &self,
        coordinate: Coordinate,
        name: Option<&str>,
        not_found: bool,
    ) -> Resolution {
        let given = name.map(str::trim).filter(|n| !n.is_empty());

        let name = match given {
            Some(n) if !is_placeholder_name(n) => n.to_string(),
            Some(placeholder) => {
                let looked_up = self.reverse_name(coordinate).await;
                if is_placeholder_name(&looked_up) { placeholder.to_string() } else { looked_up }
            }
            None => self.reverse_name(coordinate).await,
        };

        Resolution {
            location: ResolvedLocation { coordinate, name, not_found },
            source: ResolutionSource::Coordinates,
            notice: None,
        }
    }

    /// Name for a coordinate: each reverse provider in turn, then a name
    /// synthesized from the coordinate itself.
    pub async fn reverse_name(&self, coordinate: Coordinate) -> String {
        for provider in &self.reverse {
            match bounded(self.reverse_timeout, provider.reverse(coordinate)).await {
                Ok(Some(name)) => {
                    debug!("{} named {coordinate} as '{name}'", provider.id());
                    return name;
                }
                Ok(None) => debug!("{} has no name for {coordinate}", provider.id()),
                Err(e) => warn!("{} reverse lookup failed: {e:#}", provider.id()),
            }
        }

        synthesize_name(coordinate)
    }

    pub fn default_location(&self) -> &DefaultLocation {
        &self.default_location
    }

    fn fallback(&self, notice: Notice) -> Resolution {
        Resolution {
            location: ResolvedLocation::fallback(
                self.default_location.coordinate(),
                self.default_location.name.clone(),
            ),
            source: ResolutionSource::Default,
            notice: Some(notice),
        }
    }
}

/// Run `fut`, abandoning it once `limit` elapses.
async fn bounded<T>(limit: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| anyhow!("timed out after {}s", limit.as_secs_f32()))?
}

/// First capital or major administrative seat, otherwise the top-ranked result.
pub fn select_best_candidate(candidates: &[GeocodeCandidate]) -> Option<&GeocodeCandidate> {
    candidates
        .iter()
        .find(|c| c.is_major_division())
        .or_else(|| candidates.first())
}

/// "Northern Eastern region at 41.30°, 69.24°" style placeholder.
pub fn synthesize_name(coordinate: Coordinate) -> String {
    let north_south = if coordinate.latitude > 0.0 { "Northern" } else { "Southern" };
    let east_west = if coordinate.longitude > 0.0 { "Eastern" } else { "Western" };
    format!(
        "{north_south} {east_west} region at {:.2}°, {:.2}°",
        coordinate.latitude, coordinate.longitude
    )
}

/// Names produced by [`synthesize_name`] carry degree signs.
pub fn is_placeholder_name(name: &str) -> bool {
    name.contains('°')
}

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::Config,
    model::Coordinate,
    provider::{ProviderId, ReverseGeocoder, get_json, http_client},
};

/// OpenStreetMap Nominatim reverse geocoding. Used when Open-Meteo cannot
/// name a coordinate.
#[derive(Debug, Clone)]
pub struct NominatimReverse {
    url: String,
    http: Client,
}

impl NominatimReverse {
    pub fn new(url: impl Into<String>, http: Client) -> Self {
        Self { url: url.into(), http }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.endpoints.nominatim_reverse.clone(),
            http_client(config.timeouts.reverse())?,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

impl NominatimResponse {
    /// "<name or first display segment>, <last display segment>".
    fn place_name(&self) -> Option<String> {
        let name = self.name.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let display = self.display_name.as_deref().map(str::trim).filter(|s| !s.is_empty());

        if name.is_none() && display.is_none() {
            return None;
        }

        let segments: Vec<&str> = display
            .map(|d| d.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let city = name.or_else(|| segments.first().copied());
        let country = segments.last().copied().filter(|c| Some(*c) != city);

        let joined = [city, country].into_iter().flatten().collect::<Vec<_>>().join(", ");
        if joined.is_empty() { None } else { Some(joined) }
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimReverse {
    fn id(&self) -> ProviderId {
        ProviderId::Nominatim
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>> {
        let parsed: NominatimResponse = get_json(
            &self.http,
            &self.url,
            &[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("format", "json".to_string()),
                ("zoom", "12".to_string()),
            ],
            "Nominatim reverse geocoding",
        )
        .await?;

        Ok(parsed.place_name())
    }
}

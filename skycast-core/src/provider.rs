use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::{fmt::Debug, time::Duration};

use crate::model::Coordinate;

pub mod nominatim;
pub mod openmeteo;

pub use nominatim::NominatimReverse;
pub use openmeteo::{OpenMeteoForecast, OpenMeteoGeocoder};

pub const USER_AGENT: &str = concat!("skycast/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenMeteo,
    Nominatim,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "open-meteo",
            ProviderId::Nominatim => "nominatim",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One place returned by a forward geocoding search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeCandidate {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub admin1: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub admin_level: Option<u8>,
    #[serde(default)]
    pub feature_code: Option<String>,
}

impl GeocodeCandidate {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Capitals and first/second-level administrative seats.
    pub fn is_major_division(&self) -> bool {
        matches!(self.admin_level, Some(4) | Some(6)) || self.feature_code.as_deref() == Some("PPLC")
    }

    /// "name, admin1, country", skipping an admin1 equal to the name.
    pub fn display_name(&self) -> String {
        join_place_parts(
            Some(self.name.as_str()),
            self.admin1.as_deref(),
            self.country.as_deref(),
        )
        .unwrap_or_else(|| self.name.clone())
    }
}

/// Build "city, region, country". The region is dropped when it repeats the
/// city; the country is only added after a city or region.
pub fn join_place_parts(
    name: Option<&str>,
    region: Option<&str>,
    country: Option<&str>,
) -> Option<String> {
    let mut parts: Vec<&str> = Vec::with_capacity(3);

    let name = name.map(str::trim).filter(|s| !s.is_empty());
    if let Some(name) = name {
        parts.push(name);
    }
    if let Some(region) = region.map(str::trim).filter(|s| !s.is_empty() && Some(*s) != name) {
        parts.push(region);
    }
    if let Some(country) = country.map(str::trim).filter(|s| !s.is_empty() && !parts.is_empty()) {
        parts.push(country);
    }

    if parts.is_empty() { None } else { Some(parts.join(", ")) }
}

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Up to `count` candidates for a free-text place name, best-ranked first.
    async fn search(&self, name: &str, count: usize) -> Result<Vec<GeocodeCandidate>>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Human-readable name for a coordinate; `Ok(None)` when the service
    /// answered but knows nothing useful about the spot.
    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>>;
}

#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn forecast(&self, coordinate: Coordinate) -> Result<openmeteo::ForecastResponse>;
}

/// Client shared by all providers: one timeout per call, identifying User-Agent.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// GET `url` with `query`, fail on non-2xx with a truncated body, parse JSON.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    url: &str,
    query: &[(&str, String)],
    what: &str,
) -> Result<T> {
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .with_context(|| format!("Failed to send request to {what}"))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {what} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "{what} request failed with status {}: {}",
            status,
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {what} JSON"))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(admin_level: Option<u8>, feature_code: Option<&str>) -> GeocodeCandidate {
        GeocodeCandidate {
            name: "Springfield".into(),
            latitude: 39.8,
            longitude: -89.6,
            admin1: Some("Illinois".into()),
            country: Some("United States".into()),
            admin_level,
            feature_code: feature_code.map(str::to_string),
        }
    }

    #[test]
    fn provider_id_display() {
        assert_eq!(ProviderId::OpenMeteo.to_string(), "open-meteo");
        assert_eq!(ProviderId::Nominatim.as_str(), "nominatim");
    }

    #[test]
    fn major_division_detection() {
        assert!(candidate(Some(4), None).is_major_division());
        assert!(candidate(Some(6), None).is_major_division());
        assert!(candidate(None, Some("PPLC")).is_major_division());
        assert!(!candidate(Some(8), Some("PPL")).is_major_division());
        assert!(!candidate(None, None).is_major_division());
    }

    #[test]
    fn join_place_parts_rules() {
        assert_eq!(
            join_place_parts(Some("Tashkent"), Some("Tashkent"), Some("Uzbekistan")).as_deref(),
            Some("Tashkent, Uzbekistan")
        );
        assert_eq!(
            join_place_parts(Some("Springfield"), Some("Illinois"), Some("United States"))
                .as_deref(),
            Some("Springfield, Illinois, United States")
        );
        assert_eq!(join_place_parts(None, None, Some("France")), None);
        assert_eq!(join_place_parts(None, Some("Bavaria"), Some("Germany")).as_deref(), Some("Bavaria, Germany"));
        assert_eq!(join_place_parts(Some("  "), None, None), None);
    }

    #[test]
    fn candidate_display_name() {
        assert_eq!(candidate(None, None).display_name(), "Springfield, Illinois, United States");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "ж".repeat(150);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
        assert_eq!(truncate_body("short"), "short");
    }
}

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::Config,
    model::Coordinate,
    provider::{
        ForecastProvider, GeocodeCandidate, Geocoder, ProviderId, ReverseGeocoder, get_json,
        http_client, join_place_parts,
    },
};

pub const HOURLY_VARIABLES: &str =
    "temperature_2m,relative_humidity_2m,wind_speed_10m,rain,snowfall,weather_code";
pub const DAILY_VARIABLES: &str = "temperature_2m_max,temperature_2m_min,weather_code";
pub const CURRENT_VARIABLES: &str =
    "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m,precipitation";
pub const FORECAST_DAYS: u8 = 7;

/// Open-Meteo geocoding: forward search and reverse lookup.
#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    search_url: String,
    reverse_url: String,
    search_http: Client,
    reverse_http: Client,
}

impl OpenMeteoGeocoder {
    pub fn new(
        search_url: impl Into<String>,
        reverse_url: impl Into<String>,
        search_http: Client,
        reverse_http: Client,
    ) -> Self {
        Self {
            search_url: search_url.into(),
            reverse_url: reverse_url.into(),
            search_http,
            reverse_http,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.endpoints.geocoding_search.clone(),
            config.endpoints.geocoding_reverse.clone(),
            http_client(config.timeouts.search())?,
            http_client(config.timeouts.reverse())?,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct OmSearchResponse {
    #[serde(default)]
    results: Option<Vec<GeocodeCandidate>>,
}

#[derive(Debug, Deserialize)]
struct OmReverseResult {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    admin1: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmReverseResponse {
    #[serde(default)]
    results: Option<Vec<OmReverseResult>>,
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    async fn search(&self, name: &str, count: usize) -> Result<Vec<GeocodeCandidate>> {
        let parsed: OmSearchResponse = get_json(
            &self.search_http,
            &self.search_url,
            &[
                ("name", name.to_string()),
                ("count", count.to_string()),
                ("language", "en".to_string()),
                ("format", "json".to_string()),
            ],
            "Open-Meteo geocoding search",
        )
        .await?;

        let results = parsed.results.unwrap_or_default();
        debug!("Geocoding '{}' returned {} candidate(s)", name, results.len());
        Ok(results)
    }
}

#[async_trait]
impl ReverseGeocoder for OpenMeteoGeocoder {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>> {
        let parsed: OmReverseResponse = get_json(
            &self.reverse_http,
            &self.reverse_url,
            &[
                ("latitude", coordinate.latitude.to_string()),
                ("longitude", coordinate.longitude.to_string()),
                ("language", "en".to_string()),
                ("format", "json".to_string()),
            ],
            "Open-Meteo reverse geocoding",
        )
        .await?;

        Ok(parsed.results.and_then(|results| {
            let first = results.into_iter().next()?;
            join_place_parts(first.name.as_deref(), first.admin1.as_deref(), first.country.as_deref())
        }))
    }
}

/// Open-Meteo forecast endpoint.
#[derive(Debug, Clone)]
pub struct OpenMeteoForecast {
    url: String,
    http: Client,
}

impl OpenMeteoForecast {
    pub fn new(url: impl Into<String>, http: Client) -> Self {
        Self { url: url.into(), http }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.endpoints.forecast.clone(), http_client(config.timeouts.forecast())?))
    }
}

/// `current` block. Any variable may be absent or null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentBlock {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub temperature_2m: Option<f64>,
    #[serde(default)]
    pub relative_humidity_2m: Option<f64>,
    #[serde(default)]
    pub weather_code: Option<i32>,
    #[serde(default)]
    pub wind_speed_10m: Option<f64>,
    #[serde(default)]
    pub precipitation: Option<f64>,
}

/// `hourly` block: parallel arrays indexed against `time` ("YYYY-MM-DDTHH:MM", local).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlyBlock {
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub rain: Vec<Option<f64>>,
    #[serde(default)]
    pub snowfall: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
}

/// `daily` block: parallel arrays indexed against `time` ("YYYY-MM-DD").
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyBlock {
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub utc_offset_seconds: i32,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub current: Option<CurrentBlock>,
    pub hourly: HourlyBlock,
    pub daily: DailyBlock,
}

#[async_trait]
impl ForecastProvider for OpenMeteoForecast {
    async fn forecast(&self, coordinate: Coordinate) -> Result<ForecastResponse> {
        get_json(
            &self.http,
            &self.url,
            &[
                ("latitude", coordinate.latitude.to_string()),
                ("longitude", coordinate.longitude.to_string()),
                ("hourly", HOURLY_VARIABLES.to_string()),
                ("daily", DAILY_VARIABLES.to_string()),
                ("current", CURRENT_VARIABLES.to_string()),
                ("forecast_days", FORECAST_DAYS.to_string()),
                ("timezone", "auto".to_string()),
            ],
            "Open-Meteo forecast",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        http_client(Duration::from_secs(2)).unwrap()
    }

    fn geocoder(server: &MockServer) -> OpenMeteoGeocoder {
        OpenMeteoGeocoder::new(
            format!("{}/v1/search", server.uri()),
            format!("{}/v1/reverse", server.uri()),
            client(),
            client(),
        )
    }

    #[tokio::test]
    async fn search_parses_candidates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Springfield"))
            .and(query_param("count", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"name": "Springfield", "latitude": 37.2, "longitude": -93.3, "admin1": "Missouri", "country": "United States", "feature_code": "PPLA2"},
                    {"name": "Springfield", "latitude": 39.8, "longitude": -89.6, "admin1": "Illinois", "country": "United States", "feature_code": "PPLA"}
                ]
            })))
            .mount(&server)
            .await;

        let results = geocoder(&server).search("Springfield", 5).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].admin1.as_deref(), Some("Illinois"));
        assert_eq!(results[0].feature_code.as_deref(), Some("PPLA2"));
    }

    #[tokio::test]
    async fn search_without_results_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "generationtime_ms": 0.5
            })))
            .mount(&server)
            .await;

        let results = geocoder(&server).search("Atlantis", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_reports_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = geocoder(&server).search("Paris", 5).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("maintenance"));
    }

    #[tokio::test]
    async fn reverse_joins_name_region_country() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"name": "Tashkent", "admin1": "Tashkent", "country": "Uzbekistan"}]
            })))
            .mount(&server)
            .await;

        let name = geocoder(&server)
            .reverse(Coordinate::new(41.2995, 69.2401))
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("Tashkent, Uzbekistan"));
    }

    #[tokio::test]
    async fn reverse_with_no_results_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
            .mount(&server)
            .await;

        let name = geocoder(&server).reverse(Coordinate::new(0.0, 0.0)).await.unwrap();
        assert_eq!(name, None);
    }

    #[tokio::test]
    async fn forecast_requests_all_variables() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("hourly", HOURLY_VARIABLES))
            .and(query_param("daily", DAILY_VARIABLES))
            .and(query_param("current", CURRENT_VARIABLES))
            .and(query_param("forecast_days", "7"))
            .and(query_param("timezone", "auto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "utc_offset_seconds": 18000,
                "timezone": "Asia/Tashkent",
                "current": {"time": "2025-03-01T14:00", "temperature_2m": 12.3, "relative_humidity_2m": 55, "weather_code": 2, "wind_speed_10m": 9.1, "precipitation": 0.0},
                "hourly": {"time": ["2025-03-01T00:00"], "temperature_2m": [8.0], "relative_humidity_2m": [70], "wind_speed_10m": [5.0], "rain": [null], "snowfall": [0.0], "weather_code": [3]},
                "daily": {"time": ["2025-03-01"], "temperature_2m_max": [15.0], "temperature_2m_min": [4.0], "weather_code": [2]}
            })))
            .mount(&server)
            .await;

        let provider = OpenMeteoForecast::new(format!("{}/v1/forecast", server.uri()), client());
        let response = provider.forecast(Coordinate::new(41.3, 69.2)).await.unwrap();

        assert_eq!(response.utc_offset_seconds, 18000);
        let current = response.current.unwrap();
        assert_eq!(current.weather_code, Some(2));
        assert_eq!(current.relative_humidity_2m, Some(55.0));
        assert_eq!(response.hourly.rain, vec![None]);
        assert_eq!(response.daily.temperature_2m_max, vec![Some(15.0)]);
    }
}

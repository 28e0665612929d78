//! Automatic "where am I" lookup.
//!
//! A [`PositionSource`] answers a single-shot position request bounded by a
//! timeout, reusing a recent fix when it is younger than the maximum age.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{
    fmt::Debug,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{debug, warn};

use crate::{
    config::{Config, GeolocationConfig},
    error::GeolocationError,
    model::Coordinate,
    provider::USER_AGENT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(10), maximum_age: Duration::from_secs(60) }
    }
}

impl From<&GeolocationConfig> for PositionOptions {
    fn from(cfg: &GeolocationConfig) -> Self {
        Self {
            timeout: Duration::from_secs(cfg.timeout_secs),
            maximum_age: Duration::from_secs(cfg.maximum_age_secs),
        }
    }
}

#[async_trait]
pub trait PositionSource: Send + Sync + Debug {
    async fn current_position(
        &self,
        options: PositionOptions,
    ) -> Result<Coordinate, GeolocationError>;
}

/// Positioning switched off by the user; every request is denied.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPosition;

#[async_trait]
impl PositionSource for DisabledPosition {
    async fn current_position(&self, _: PositionOptions) -> Result<Coordinate, GeolocationError> {
        Err(GeolocationError::PermissionDenied)
    }
}

/// Always answers with the same coordinate.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinate);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self, _: PositionOptions) -> Result<Coordinate, GeolocationError> {
        Ok(self.0)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    error: Option<bool>,
    #[serde(default)]
    reason: Option<String>,
}

/// Approximate position from the public IP address.
#[derive(Debug)]
pub struct IpPositionSource {
    url: String,
    http: Client,
    last_fix: Mutex<Option<(Instant, Coordinate)>>,
}

impl IpPositionSource {
    pub fn new(url: impl Into<String>) -> Result<Self, GeolocationError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GeolocationError::PositionUnavailable(e.to_string()))?;
        Ok(Self { url: url.into(), http, last_fix: Mutex::new(None) })
    }

    fn cached(&self, maximum_age: Duration) -> Option<Coordinate> {
        let guard = self.last_fix.lock().ok()?;
        let (at, coordinate) = (*guard)?;
        (at.elapsed() <= maximum_age).then_some(coordinate)
    }

    fn remember(&self, coordinate: Coordinate) {
        if let Ok(mut guard) = self.last_fix.lock() {
            *guard = Some((Instant::now(), coordinate));
        }
    }

    async fn lookup(&self) -> Result<Coordinate, GeolocationError> {
        let unavailable = |e: reqwest::Error| {
            if e.is_timeout() {
                GeolocationError::Timeout
            } else {
                GeolocationError::PositionUnavailable(e.to_string())
            }
        };

        let res = self.http.get(&self.url).send().await.map_err(unavailable)?;
        let status = res.status();
        if !status.is_success() {
            return Err(GeolocationError::PositionUnavailable(format!(
                "IP lookup failed with status {status}"
            )));
        }

        let body: IpLookupResponse = res.json().await.map_err(unavailable)?;
        if body.error.unwrap_or(false) {
            return Err(GeolocationError::PositionUnavailable(
                body.reason.unwrap_or_else(|| "IP lookup refused".to_string()),
            ));
        }

        match (body.latitude, body.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinate::new(latitude, longitude)),
            _ => Err(GeolocationError::PositionUnavailable(
                "IP lookup returned no coordinates".to_string(),
            )),
        }
    }
}

#[async_trait]
impl PositionSource for IpPositionSource {
    async fn current_position(
        &self,
        options: PositionOptions,
    ) -> Result<Coordinate, GeolocationError> {
        if let Some(coordinate) = self.cached(options.maximum_age) {
            debug!("Reusing cached position {coordinate}");
            return Ok(coordinate);
        }

        let coordinate = tokio::time::timeout(options.timeout, self.lookup())
            .await
            .map_err(|_| GeolocationError::Timeout)??;

        self.remember(coordinate);
        Ok(coordinate)
    }
}

/// Position source matching the configuration: IP lookup when enabled,
/// otherwise permission denied.
pub fn position_source_from_config(config: &Config) -> Box<dyn PositionSource> {
    if !config.geolocation.enabled {
        return Box::new(DisabledPosition);
    }

    match IpPositionSource::new(config.endpoints.ip_geolocation.clone()) {
        Ok(source) => Box::new(source),
        Err(e) => {
            warn!("IP position source unavailable: {e}");
            Box::new(DisabledPosition)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn disabled_source_is_permission_denied() {
        let err = DisabledPosition.current_position(PositionOptions::default()).await.unwrap_err();
        assert_eq!(err, GeolocationError::PermissionDenied);
        assert_eq!(err.code(), 1);
    }

    #[tokio::test]
    async fn ip_lookup_returns_coordinates_and_caches_them() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": "Samarkand", "latitude": 39.654, "longitude": 66.9597
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = IpPositionSource::new(format!("{}/json/", server.uri())).unwrap();
        let first = source.current_position(PositionOptions::default()).await.unwrap();
        let second = source.current_position(PositionOptions::default()).await.unwrap();

        assert_eq!(first, Coordinate::new(39.654, 66.9597));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn ip_lookup_error_payload_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": true, "reason": "RateLimited"
            })))
            .mount(&server)
            .await;

        let source = IpPositionSource::new(format!("{}/json/", server.uri())).unwrap();
        let err = source.current_position(PositionOptions::default()).await.unwrap_err();
        assert_eq!(err, GeolocationError::PositionUnavailable("RateLimited".into()));
    }

    #[tokio::test]
    async fn slow_lookup_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/json/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"latitude": 1.0, "longitude": 2.0}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let source = IpPositionSource::new(format!("{}/json/", server.uri())).unwrap();
        let options = PositionOptions {
            timeout: Duration::from_millis(50),
            maximum_age: Duration::ZERO,
        };
        let err = source.current_position(options).await.unwrap_err();
        assert_eq!(err, GeolocationError::Timeout);
    }

    #[test]
    fn config_disabled_yields_denied_source() {
        let mut cfg = Config::default();
        cfg.geolocation.enabled = false;
        let source = position_source_from_config(&cfg);
        assert!(format!("{source:?}").contains("DisabledPosition"));
    }
}

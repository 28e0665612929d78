//! Weather retrieval.
//!
//! [`WeatherFetcher::fetch`] always yields a snapshot: a normalized forecast
//! when the service answers, synthetic data when it does not.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use std::time::Duration as StdDuration;
use tracing::{debug, warn};

use crate::{
    condition::{determine_condition, determine_detailed_condition, feels_like},
    config::Config,
    model::{Coordinate, DayForecast, HourlySeries, ResolvedLocation, WeatherSnapshot},
    provider::{ForecastProvider, OpenMeteoForecast, openmeteo::ForecastResponse},
    synthetic,
};

pub const DAILY_ENTRIES: usize = 5;
pub const HOURLY_ENTRIES: usize = 24;

const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const DAILY_TIME_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug)]
pub struct WeatherFetcher {
    provider: Box<dyn ForecastProvider>,
    timeout: StdDuration,
}

impl WeatherFetcher {
    pub fn new(provider: Box<dyn ForecastProvider>, timeout: StdDuration) -> Self {
        Self { provider, timeout }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Box::new(OpenMeteoForecast::from_config(config)?),
            config.timeouts.forecast(),
        ))
    }

    /// Forecast for a coordinate, or synthetic data if it cannot be retrieved.
    pub async fn fetch(&self, latitude: f64, longitude: f64, name: &str) -> WeatherSnapshot {
        match self.try_fetch(Coordinate::new(latitude, longitude), name).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Forecast for '{name}' unavailable, using synthetic data: {e:#}");
                let now = chrono::Local::now().naive_local();
                synthetic::synthesize(name, now, &mut rand::rng())
            }
        }
    }

    /// [`Self::fetch`] for a resolved location, carrying over its fallback flag.
    pub async fn fetch_location(&self, location: &ResolvedLocation) -> WeatherSnapshot {
        let mut snapshot = self
            .fetch(location.coordinate.latitude, location.coordinate.longitude, &location.name)
            .await;
        snapshot.is_default_location = location.not_found;
        snapshot
    }

    /// Like [`Self::fetch`] but reports failures instead of substituting data.
    pub async fn try_fetch(&self, coordinate: Coordinate, name: &str) -> Result<WeatherSnapshot> {
        debug!("Fetching forecast for '{name}' at {coordinate}");

        let response = tokio::time::timeout(self.timeout, self.provider.forecast(coordinate))
            .await
            .map_err(|_| anyhow!("forecast request timed out after {}s", self.timeout.as_secs()))??;

        normalize(response, name, Utc::now())
    }
}

/// "Today", "Tomorrow", or the weekday name.
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if Some(date) == today.succ_opt() {
        "Tomorrow".to_string()
    } else {
        date.format("%A").to_string()
    }
}

fn value_at(values: &[Option<f64>], i: usize) -> f64 {
    values.get(i).copied().flatten().unwrap_or_default()
}

/// Turn a raw forecast into a snapshot. `now` anchors "Today" and the start
/// of the hourly window in the location's own time zone.
pub fn normalize(
    response: ForecastResponse,
    name: &str,
    now: DateTime<Utc>,
) -> Result<WeatherSnapshot> {
    let local_now = now.naive_utc() + Duration::seconds(i64::from(response.utc_offset_seconds));
    let today = local_now.date();

    let hourly_raw = &response.hourly;
    let times = hourly_raw
        .time
        .iter()
        .map(|t| {
            NaiveDateTime::parse_from_str(t, HOURLY_TIME_FORMAT)
                .with_context(|| format!("Invalid hourly timestamp '{t}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    if times.is_empty() {
        return Err(anyhow!("Forecast response contained no hourly data"));
    }
    if response.daily.time.is_empty() {
        return Err(anyhow!("Forecast response contained no daily data"));
    }

    // Window of HOURLY_ENTRIES hours starting at the current local hour.
    let this_hour = local_now
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(local_now);
    let start = times
        .iter()
        .position(|t| *t >= this_hour)
        .unwrap_or(0)
        .min(times.len().saturating_sub(HOURLY_ENTRIES));
    let end = (start + HOURLY_ENTRIES).min(times.len());

    let hourly = HourlySeries {
        time: times[start..end].to_vec(),
        temperature: (start..end).map(|i| value_at(&hourly_raw.temperature_2m, i)).collect(),
        wind_speed: (start..end).map(|i| value_at(&hourly_raw.wind_speed_10m, i)).collect(),
        rain: (start..end).map(|i| value_at(&hourly_raw.rain, i)).collect(),
        snowfall: (start..end).map(|i| value_at(&hourly_raw.snowfall, i)).collect(),
    };

    // Current conditions; the first hour of the window stands in when absent.
    let current = response.current.clone().unwrap_or_default();
    let (temperature, humidity, wind, rain, code, observed) = match current.temperature_2m {
        Some(t) => (
            t,
            current.relative_humidity_2m.unwrap_or(50.0),
            current.wind_speed_10m.unwrap_or_default(),
            current.precipitation.unwrap_or_default(),
            current.weather_code,
            current
                .time
                .as_deref()
                .and_then(|t| NaiveDateTime::parse_from_str(t, HOURLY_TIME_FORMAT).ok()),
        ),
        None => (
            value_at(&hourly_raw.temperature_2m, start),
            hourly_raw
                .relative_humidity_2m
                .get(start)
                .copied()
                .flatten()
                .unwrap_or(50.0),
            value_at(&hourly_raw.wind_speed_10m, start),
            value_at(&hourly_raw.rain, start),
            hourly_raw.weather_code.get(start).copied().flatten(),
            times.get(start).copied(),
        ),
    };

    let temperature = temperature.round();
    let humidity = humidity.round().clamp(0.0, 100.0);
    let wind = wind.round();

    let condition = match code {
        Some(code) => determine_condition(code, rain, temperature),
        None => determine_detailed_condition(
            temperature,
            humidity,
            rain,
            value_at(&hourly_raw.snowfall, start),
            wind,
        ),
    };

    let forecast = normalize_daily(&response, &times, today)?;

    Ok(WeatherSnapshot {
        location: name.to_string(),
        temperature,
        condition,
        humidity: humidity as u8,
        wind_speed: wind,
        feels_like: feels_like(temperature, humidity, wind),
        precipitation: rain,
        time: observed.unwrap_or(local_now).format("%H:%M").to_string(),
        forecast,
        hourly,
        is_default_location: false,
        synthetic: false,
    })
}

fn normalize_daily(
    response: &ForecastResponse,
    hourly_times: &[NaiveDateTime],
    today: NaiveDate,
) -> Result<Vec<DayForecast>> {
    let daily = &response.daily;

    daily
        .time
        .iter()
        .take(DAILY_ENTRIES)
        .enumerate()
        .map(|(i, raw_date)| {
            let date = NaiveDate::parse_from_str(raw_date, DAILY_TIME_FORMAT)
                .with_context(|| format!("Invalid daily date '{raw_date}'"))?;

            let high = value_at(&daily.temperature_2m_max, i);
            let low = value_at(&daily.temperature_2m_min, i);

            let day_rain: f64 = hourly_times
                .iter()
                .enumerate()
                .filter(|(_, t)| t.date() == date)
                .map(|(h, _)| value_at(&response.hourly.rain, h))
                .sum();

            let code = daily.weather_code.get(i).copied().flatten().unwrap_or(-1);

            Ok(DayForecast {
                day: day_label(date, today),
                high: high.round(),
                low: low.round(),
                condition: determine_condition(code, day_rain, high),
            })
        })
        .collect()
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// True when both axes differ by less than `tolerance` degrees.
    pub fn is_near(&self, other: &Coordinate, tolerance: f64) -> bool {
        (self.latitude - other.latitude).abs() < tolerance
            && (self.longitude - other.longitude).abs() < tolerance
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Coordinates plus the name shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    pub name: String,
    /// Set when the requested place could not be found and a default was substituted.
    pub not_found: bool,
}

impl ResolvedLocation {
    pub fn new(coordinate: Coordinate, name: impl Into<String>) -> Self {
        Self { coordinate, name: name.into(), not_found: false }
    }

    pub fn fallback(coordinate: Coordinate, name: impl Into<String>) -> Self {
        Self { coordinate, name: name.into(), not_found: true }
    }

    /// First segment of a "city, region, country" chain.
    pub fn primary_name(&self) -> &str {
        split_display_name(&self.name).0
    }
}

/// Splits "city, region, country" into ("city", "region, country").
pub fn split_display_name(name: &str) -> (&str, &str) {
    match name.split_once(',') {
        Some((head, rest)) => (head.trim(), rest.trim()),
        None => (name.trim(), ""),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub day: String,
    pub high: f64,
    pub low: f64,
    pub condition: Condition,
}

/// Hourly series; every vector is indexed against `time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<NaiveDateTime>,
    pub temperature: Vec<f64>,
    pub wind_speed: Vec<f64>,
    pub rain: Vec<f64>,
    pub snowfall: Vec<f64>,
}

impl HourlySeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Keeps only the first `n` hours of every series.
    pub fn truncate(&mut self, n: usize) {
        self.time.truncate(n);
        self.temperature.truncate(n);
        self.wind_speed.truncate(n);
        self.rain.truncate(n);
        self.snowfall.truncate(n);
    }

    pub fn hours(&self) -> impl Iterator<Item = HourPoint> + '_ {
        self.time.iter().enumerate().map(|(i, time)| HourPoint {
            time: *time,
            temperature: self.temperature.get(i).copied().unwrap_or_default(),
            wind_speed: self.wind_speed.get(i).copied().unwrap_or_default(),
            rain: self.rain.get(i).copied().unwrap_or_default(),
            snowfall: self.snowfall.get(i).copied().unwrap_or_default(),
        })
    }
}

/// One row of an [`HourlySeries`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourPoint {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub wind_speed: f64,
    pub rain: f64,
    pub snowfall: f64,
}

/// One fetched or synthesized weather bundle. Temperatures in °C, wind in km/h,
/// precipitation in mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: String,
    pub temperature: f64,
    pub condition: Condition,
    pub humidity: u8,
    pub wind_speed: f64,
    pub feels_like: f64,
    pub precipitation: f64,
    pub time: String,
    pub forecast: Vec<DayForecast>,
    pub hourly: HourlySeries,
    pub is_default_location: bool,
    /// Generated locally because the forecast service could not be reached.
    pub synthetic: bool,
}

/// A favorite place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl SavedLocation {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

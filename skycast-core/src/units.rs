use serde::{Deserialize, Serialize};

const KMH_TO_MPH: f64 = 0.621371;

/// Display unit preference. Values are always stored metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Metric,
    Imperial,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Metric => "metric",
            Unit::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Unit] {
        &[Unit::Metric, Unit::Imperial]
    }

    pub fn toggled(self) -> Self {
        match self {
            Unit::Metric => Unit::Imperial,
            Unit::Imperial => Unit::Metric,
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Unit::Metric => "°C",
            Unit::Imperial => "°F",
        }
    }

    pub fn wind_symbol(&self) -> &'static str {
        match self {
            Unit::Metric => "km/h",
            Unit::Imperial => "mph",
        }
    }

    /// Celsius to this unit, rounded to a whole degree.
    pub fn convert_temperature(&self, celsius: f64) -> f64 {
        match self {
            Unit::Metric => whole(celsius),
            Unit::Imperial => whole(celsius * 9.0 / 5.0 + 32.0),
        }
    }

    /// Inverse of [`Unit::convert_temperature`], without rounding.
    pub fn to_celsius(&self, value: f64) -> f64 {
        match self {
            Unit::Metric => value,
            Unit::Imperial => (value - 32.0) * 5.0 / 9.0,
        }
    }

    pub fn format_temperature(&self, celsius: f64) -> String {
        format!("{}{}", self.convert_temperature(celsius), self.temperature_symbol())
    }

    /// km/h to this unit, rounded.
    pub fn convert_wind_speed(&self, kmh: f64) -> f64 {
        match self {
            Unit::Metric => whole(kmh),
            Unit::Imperial => whole(kmh * KMH_TO_MPH),
        }
    }

    pub fn format_wind_speed(&self, kmh: f64) -> String {
        format!("{} {}", self.convert_wind_speed(kmh), self.wind_symbol())
    }
}

/// Rounds to an integer, folding `-0.0` into `0.0` so it never prints as "-0".
fn whole(value: f64) -> f64 {
    value.round() + 0.0
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Unit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "c" | "celsius" => Ok(Unit::Metric),
            "imperial" | "f" | "fahrenheit" => Ok(Unit::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit '{value}'. Supported units: metric, imperial."
            )),
        }
    }
}

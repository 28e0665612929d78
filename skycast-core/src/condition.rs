//! Weather condition labels and derived "feels like" temperature.
//!
//! Codes follow the WMO 4677 table that Open-Meteo reports as `weather_code`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Sunny,
    Clear,
    PartlyCloudy,
    Cloudy,
    Foggy,
    LightRain,
    Rain,
    HeavyRain,
    Snow,
    SnowShower,
    Thunderstorm,
    Hot,
    Humid,
    Cold,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sunny => "Sunny",
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Foggy => "Foggy",
            Self::LightRain => "Light Rain",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::SnowShower => "Snow Shower",
            Self::Thunderstorm => "Thunderstorm",
            Self::Hot => "Hot",
            Self::Humid => "Humid",
            Self::Cold => "Cold",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a weather code to a condition. Known code ranges win; anything else
/// falls through to rain and temperature heuristics.
pub fn determine_condition(weather_code: i32, rain: f64, temperature: f64) -> Condition {
    match weather_code {
        0 if temperature > 25.0 => Condition::Sunny,
        0 => Condition::Clear,
        1 | 2 => Condition::PartlyCloudy,
        3 => Condition::Cloudy,
        45..=48 => Condition::Foggy,
        51..=55 => Condition::LightRain,
        61..=65 => Condition::Rain,
        80..=82 => Condition::HeavyRain,
        71..=77 => Condition::Snow,
        85 | 86 => Condition::SnowShower,
        95..=99 => Condition::Thunderstorm,
        _ if rain > 0.5 => Condition::Rain,
        _ if rain > 0.0 => Condition::LightRain,
        _ if temperature > 30.0 => Condition::Hot,
        _ if temperature > 25.0 => Condition::Sunny,
        _ if temperature > 15.0 => Condition::PartlyCloudy,
        _ => Condition::Cloudy,
    }
}

/// Condition from raw measurements, for when no weather code was reported.
pub fn determine_detailed_condition(
    temperature: f64,
    humidity: f64,
    rain: f64,
    snowfall: f64,
    _wind_speed: f64,
) -> Condition {
    if snowfall > 0.0 {
        return Condition::Snow;
    }
    if rain > 1.0 {
        return Condition::HeavyRain;
    }
    if rain > 0.1 {
        return Condition::Rain;
    }
    if rain > 0.0 {
        return Condition::LightRain;
    }

    if humidity > 90.0 {
        return Condition::Foggy;
    }
    if humidity > 80.0 && temperature < 10.0 {
        return Condition::Cloudy;
    }
    if temperature > 30.0 {
        return Condition::Hot;
    }
    if temperature > 25.0 {
        return if humidity > 60.0 { Condition::Humid } else { Condition::Sunny };
    }
    if temperature > 15.0 {
        return if humidity > 70.0 { Condition::PartlyCloudy } else { Condition::Clear };
    }
    if temperature < 0.0 {
        return Condition::Cold;
    }

    Condition::PartlyCloudy
}

/// Apparent temperature in °C. Wind chill below 10 °C (wind in km/h), a
/// humidity bump above 20 °C when humidity exceeds 40%, otherwise the air
/// temperature unchanged.
pub fn feels_like(temperature: f64, humidity: f64, wind_kmh: f64) -> f64 {
    if temperature < 10.0 {
        let v = wind_kmh.max(0.0).powf(0.16);
        (13.12 + 0.6215 * temperature - 11.37 * v + 0.3965 * temperature * v).round()
    } else if temperature > 20.0 && humidity > 40.0 {
        (temperature + 0.05 * humidity).round()
    } else {
        temperature
    }
}

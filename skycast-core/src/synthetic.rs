//! Locally generated stand-in weather, used when the forecast service is unreachable.

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use rand::RngExt;
use std::f64::consts::PI;

use crate::{
    condition::Condition,
    fetcher::{DAILY_ENTRIES, HOURLY_ENTRIES, day_label},
    model::{DayForecast, HourlySeries, WeatherSnapshot},
};

const DEFAULT_BASE_C: f64 = 20.0;

fn is_tashkent(name: &str) -> bool {
    let lower = name.to_lowercase();
    ["tashkent", "toshkent", "ташкент"].iter().any(|n| lower.contains(n))
}

/// Seasonal base temperature for Tashkent, flat 20 °C elsewhere.
fn base_temperature<R: RngExt>(name: &str, month0: u32, rng: &mut R) -> f64 {
    if !is_tashkent(name) {
        return DEFAULT_BASE_C;
    }
    match month0 {
        4..=8 => 28.0 + rng.random_range(0.0..4.0),
        2 | 3 | 9 | 10 => 18.0 + rng.random_range(0.0..7.0),
        _ => 5.0 + rng.random_range(0.0..8.0),
    }
}

/// Diurnal offset for hour index `i`: peaks mid-afternoon, shallower dip at night.
fn diurnal_offset(i: usize) -> f64 {
    let factor = ((i as f64 - 6.0) * PI / 12.0).sin();
    if factor > 0.0 { factor * 5.0 } else { factor * 2.0 }
}

/// Build a plausible snapshot for `name` starting at local time `now`.
pub fn synthesize<R: RngExt>(name: &str, now: NaiveDateTime, rng: &mut R) -> WeatherSnapshot {
    let tashkent = is_tashkent(name);
    let base = base_temperature(name, now.month0(), rng);

    let start = now
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);

    let mut hourly = HourlySeries::default();
    for i in 0..HOURLY_ENTRIES {
        hourly.time.push(start + Duration::hours(i as i64));
        hourly.temperature.push(base + diurnal_offset(i));
        hourly.wind_speed.push(5.0 + rng.random_range(0.0..10.0));
        hourly.rain.push(if rng.random_bool(0.2) { rng.random_range(0.0..2.0) } else { 0.0 });
        hourly.snowfall.push(if base < 0.0 && rng.random_bool(0.2) {
            rng.random_range(0.0..1.0)
        } else {
            0.0
        });
    }

    let today = now.date();
    let forecast = (0..DAILY_ENTRIES)
        .map(|i| {
            let variation = rng.random_range(-2.0..2.0);
            DayForecast {
                day: day_label(today + Duration::days(i as i64), today),
                high: (base + 3.0 + variation).round(),
                low: (base - 5.0 + variation).round(),
                condition: if i % 2 == 0 { Condition::PartlyCloudy } else { Condition::Sunny },
            }
        })
        .collect();

    let temperature = base.round();

    WeatherSnapshot {
        location: name.to_string(),
        temperature,
        condition: Condition::PartlyCloudy,
        humidity: if tashkent { 40 } else { 65 },
        wind_speed: if tashkent { 6.0 } else { 12.0 },
        feels_like: temperature - 1.0,
        precipitation: 0.0,
        time: now.format("%H:%M").to_string(),
        forecast,
        hourly,
        is_default_location: false,
        synthetic: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::{SeedableRng, rngs::StdRng};

    fn at(month: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, month, 12).unwrap().and_hms_opt(hour, 37, 5).unwrap()
    }

    #[test]
    fn shape_is_five_days_and_twenty_four_hours() {
        let mut rng = StdRng::seed_from_u64(7);
        let snap = synthesize("Lisbon, Portugal", at(3, 9), &mut rng);

        assert!(snap.synthetic);
        assert_eq!(snap.forecast.len(), 5);
        assert_eq!(snap.hourly.len(), 24);
        assert_eq!(snap.hourly.temperature.len(), 24);
        assert_eq!(snap.hourly.wind_speed.len(), 24);
        assert_eq!(snap.hourly.rain.len(), 24);
        assert_eq!(snap.hourly.snowfall.len(), 24);
        assert_eq!(snap.forecast[0].day, "Today");
        assert_eq!(snap.forecast[1].day, "Tomorrow");
        assert_eq!(snap.time, "09:37");
    }

    #[test]
    fn hourly_curve_follows_time_of_day() {
        let mut rng = StdRng::seed_from_u64(1);
        let snap = synthesize("Lisbon", at(3, 0), &mut rng);

        assert_eq!(snap.temperature, 20.0);
        assert_eq!(snap.feels_like, 19.0);
        // index 12 is the peak of the sine curve, index 0 the trough
        assert!((snap.hourly.temperature[12] - 25.0).abs() < 1e-9);
        assert!((snap.hourly.temperature[0] - 18.0).abs() < 1e-9);
        assert!(snap.hourly.wind_speed.iter().all(|w| (5.0..15.0).contains(w)));
        assert!(snap.hourly.rain.iter().all(|r| (0.0..2.0).contains(r)));
        assert!(snap.hourly.snowfall.iter().all(|s| *s == 0.0));
        assert_eq!(snap.hourly.time[1] - snap.hourly.time[0], Duration::hours(1));
    }

    #[test]
    fn tashkent_summer_is_hot() {
        let mut rng = StdRng::seed_from_u64(3);
        let snap = synthesize("Toshkent", at(7, 12), &mut rng);
        assert!((28.0..=32.0).contains(&snap.temperature));
        assert_eq!(snap.humidity, 40);
        assert_eq!(snap.wind_speed, 6.0);
    }

    #[test]
    fn tashkent_winter_is_mild() {
        let mut rng = StdRng::seed_from_u64(3);
        let snap = synthesize("Tashkent, Uzbekistan", at(1, 12), &mut rng);
        assert!((5.0..=13.0).contains(&snap.temperature));
    }

    #[test]
    fn daily_highs_exceed_lows() {
        let mut rng = StdRng::seed_from_u64(11);
        let snap = synthesize("Anywhere", at(10, 18), &mut rng);
        for day in &snap.forecast {
            assert_eq!(day.high - day.low, 8.0);
        }
        assert_eq!(snap.forecast[0].condition, Condition::PartlyCloudy);
        assert_eq!(snap.forecast[1].condition, Condition::Sunny);
    }
}

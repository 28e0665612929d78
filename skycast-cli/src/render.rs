//! Human-readable output.

use skycast_core::{Notice, SavedLocation, Unit, WeatherSnapshot, model::split_display_name};

pub const DEFAULT_HOURS: usize = 6;

pub const SYNTHETIC_BANNER: &str =
    "Forecast service unreachable: showing generated sample data, not real weather.";

/// Full report for one snapshot, temperatures and wind in `unit`.
pub fn snapshot(snapshot: &WeatherSnapshot, unit: Unit, hours: usize) -> String {
    let (primary, rest) = split_display_name(&snapshot.location);
    let mut lines = Vec::new();

    lines.push(primary.to_string());
    if !rest.is_empty() {
        lines.push(rest.to_string());
    }
    if snapshot.is_default_location {
        lines.push("(default location)".to_string());
    }
    lines.push(String::new());

    lines.push(format!(
        "{}  {}   as of {}",
        unit.format_temperature(snapshot.temperature),
        snapshot.condition,
        snapshot.time
    ));
    lines.push(format!("Feels like     {}", unit.format_temperature(snapshot.feels_like)));
    lines.push(format!("Humidity       {}%", snapshot.humidity));
    lines.push(format!("Wind           {}", unit.format_wind_speed(snapshot.wind_speed)));
    lines.push(format!("Precipitation  {:.1} mm", snapshot.precipitation));

    if !snapshot.forecast.is_empty() {
        lines.push(String::new());
        for day in &snapshot.forecast {
            lines.push(format!(
                "{:<10} {:>6} / {:<6} {}",
                day.day,
                unit.format_temperature(day.high),
                unit.format_temperature(day.low),
                day.condition
            ));
        }
    }

    if hours > 0 && !snapshot.hourly.is_empty() {
        lines.push(String::new());
        for hour in snapshot.hourly.hours().take(hours) {
            let mut line = format!(
                "{}  {:>6}  {:>8}  {:.1} mm",
                hour.time.format("%a %H:%M"),
                unit.format_temperature(hour.temperature),
                unit.format_wind_speed(hour.wind_speed),
                hour.rain
            );
            if hour.snowfall > 0.0 {
                line.push_str(&format!("  snow {:.1} cm", hour.snowfall));
            }
            lines.push(line);
        }
    }

    lines.join("\n")
}

pub fn notice(notice: &Notice) -> String {
    format!("{}: {}", notice.title(), notice.message())
}

pub fn saved_list(saved: &[SavedLocation]) -> String {
    if saved.is_empty() {
        return "No saved locations. Add one with `skycast saved add <PLACE>`.".to_string();
    }

    saved
        .iter()
        .map(|loc| format!("{}  {}  ({:.4}, {:.4})", loc.id, loc.name, loc.latitude, loc.longitude))
        .collect::<Vec<_>>()
        .join("\n")
}

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::Coordinate;

/// Base URLs of the services the resolver and fetcher talk to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub forecast: String,
    pub geocoding_search: String,
    pub geocoding_reverse: String,
    pub nominatim_reverse: String,
    pub ip_geolocation: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            forecast: "https://api.open-meteo.com/v1/forecast".to_string(),
            geocoding_search: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            geocoding_reverse: "https://geocoding-api.open-meteo.com/v1/reverse".to_string(),
            nominatim_reverse: "https://nominatim.openstreetmap.org/reverse".to_string(),
            ip_geolocation: "https://ipapi.co/json/".to_string(),
        }
    }
}

/// Per-call network timeouts, in seconds. Expired calls are abandoned, not retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub search_secs: u64,
    pub reverse_secs: u64,
    pub forecast_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { search_secs: 10, reverse_secs: 8, forecast_secs: 10 }
    }
}

impl Timeouts {
    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search_secs)
    }

    pub fn reverse(&self) -> Duration {
        Duration::from_secs(self.reverse_secs)
    }

    pub fn forecast(&self) -> Duration {
        Duration::from_secs(self.forecast_secs)
    }
}

/// Where to show weather for when nothing better is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for DefaultLocation {
    fn default() -> Self {
        Self { name: "New York, United States".to_string(), latitude: 40.7128, longitude: -74.006 }
    }
}

impl DefaultLocation {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Automatic position lookup settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    /// When false, position requests fail as "permission denied".
    pub enabled: bool,
    pub timeout_secs: u64,
    /// A cached fix younger than this is reused.
    pub maximum_age_secs: u64,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self { enabled: true, timeout_secs: 10, maximum_age_secs: 60 }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [default_location]
/// name = "Tashkent, Uzbekistan"
/// latitude = 41.2995
/// longitude = 69.2401
///
/// [geolocation]
/// enabled = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub endpoints: Endpoints,
    pub timeouts: Timeouts,
    pub default_location: DefaultLocation,
    pub geolocation: GeolocationConfig,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let d = &self.default_location;
        if !(-90.0..=90.0).contains(&d.latitude) || !(-180.0..=180.0).contains(&d.longitude) {
            return Err(anyhow!(
                "default_location ({}, {}) is outside the valid coordinate range",
                d.latitude,
                d.longitude
            ));
        }
        if self.timeouts.search_secs == 0
            || self.timeouts.reverse_secs == 0
            || self.timeouts.forecast_secs == 0
            || self.geolocation.timeout_secs == 0
        {
            return Err(anyhow!("timeouts must be at least one second"));
        }
        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "skycast", "skycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the persisted preferences (unit + saved locations).
    pub fn preferences_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("preferences.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_new_york_and_open_meteo() {
        let cfg = Config::default();
        assert_eq!(cfg.default_location.coordinate(), Coordinate::new(40.7128, -74.006));
        assert!(cfg.endpoints.forecast.contains("open-meteo"));
        assert_eq!(cfg.timeouts.reverse(), Duration::from_secs(8));
        assert!(cfg.geolocation.enabled);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[geolocation]\nenabled = false\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert!(!cfg.geolocation.enabled);
        assert_eq!(cfg.geolocation.maximum_age_secs, 60);
        assert_eq!(cfg.timeouts, Timeouts::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.default_location = DefaultLocation {
            name: "Tashkent, Uzbekistan".into(),
            latitude: 41.2995,
            longitude: 69.2401,
        };
        cfg.timeouts.search_secs = 4;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn out_of_range_default_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[default_location]\nname = \"x\"\nlatitude = 120.0\nlongitude = 0.0\n")
            .unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("outside the valid coordinate range"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut cfg = Config::default();
        cfg.timeouts.forecast_secs = 0;
        assert!(cfg.validate().is_err());
    }
}

//! Persisted user preferences: display unit and favorite places.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{debug, warn};

use crate::{
    model::{Coordinate, SavedLocation},
    units::Unit,
};

/// Two saved places closer than this on both axes are the same place.
pub const DUPLICATE_TOLERANCE_DEG: f64 = 0.01;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub unit: Unit,
    pub saved_locations: Vec<SavedLocation>,
}

impl Preferences {
    /// Read preferences, falling back to defaults when the file is missing or
    /// unreadable JSON. I/O errors other than "not found" are reported.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preferences file: {}", path.display()))?;

        match serde_json::from_str(&contents) {
            Ok(prefs) => Ok(prefs),
            Err(e) => {
                warn!("Failed to parse saved preferences at {}: {e}", path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize preferences to JSON")?;

        fs::write(path, json)
            .with_context(|| format!("Failed to write preferences file: {}", path.display()))?;

        Ok(())
    }

    pub fn toggle_unit(&mut self) -> Unit {
        self.unit = self.unit.toggled();
        self.unit
    }

    /// Saved entry lying within [`DUPLICATE_TOLERANCE_DEG`] of `coordinate`.
    pub fn find_near(&self, coordinate: &Coordinate) -> Option<&SavedLocation> {
        self.saved_locations
            .iter()
            .find(|loc| loc.coordinate().is_near(coordinate, DUPLICATE_TOLERANCE_DEG))
    }

    pub fn find_by_id(&self, id: &str) -> Option<&SavedLocation> {
        self.saved_locations.iter().find(|loc| loc.id == id)
    }

    /// Add a favorite unless one already exists at (nearly) the same spot.
    /// Returns the new entry, or `None` when it was a duplicate.
    pub fn add_saved_location(
        &mut self,
        name: impl Into<String>,
        coordinate: Coordinate,
    ) -> Option<&SavedLocation> {
        if let Some(existing) = self.find_near(&coordinate) {
            debug!("'{}' already saved as {}", existing.name, existing.id);
            return None;
        }

        let id = self.next_id();
        self.saved_locations.push(SavedLocation {
            id,
            name: name.into(),
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        });
        self.saved_locations.last()
    }

    /// Remove by id; returns the removed entry if there was one.
    pub fn remove_saved_location(&mut self, id: &str) -> Option<SavedLocation> {
        let idx = self.saved_locations.iter().position(|loc| loc.id == id)?;
        Some(self.saved_locations.remove(idx))
    }

    /// Millisecond timestamp, bumped past any id already in use.
    fn next_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.find_by_id(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_the_same_place_twice_keeps_one_entry() {
        let mut prefs = Preferences::default();
        let tashkent = Coordinate::new(41.2995, 69.2401);

        assert!(prefs.add_saved_location("Tashkent", tashkent).is_some());
        assert!(prefs.add_saved_location("Tashkent again", tashkent).is_none());
        assert!(
            prefs
                .add_saved_location("Nearby", Coordinate::new(41.305, 69.245))
                .is_none()
        );

        assert_eq!(prefs.saved_locations.len(), 1);
        assert_eq!(prefs.saved_locations[0].name, "Tashkent");
    }

    #[test]
    fn distinct_places_get_distinct_ids() {
        let mut prefs = Preferences::default();
        prefs.add_saved_location("London", Coordinate::new(51.5074, -0.1278));
        prefs.add_saved_location("Paris", Coordinate::new(48.8566, 2.3522));
        prefs.add_saved_location("Tokyo", Coordinate::new(35.6762, 139.6503));

        assert_eq!(prefs.saved_locations.len(), 3);
        let mut ids: Vec<_> = prefs.saved_locations.iter().map(|l| l.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn remove_by_id() {
        let mut prefs = Preferences::default();
        let id = prefs
            .add_saved_location("London", Coordinate::new(51.5074, -0.1278))
            .map(|l| l.id.clone())
            .unwrap();

        assert!(prefs.remove_saved_location("missing").is_none());
        let removed = prefs.remove_saved_location(&id).unwrap();
        assert_eq!(removed.name, "London");
        assert!(prefs.saved_locations.is_empty());
    }

    #[test]
    fn toggle_unit_flips_preference() {
        let mut prefs = Preferences::default();
        assert_eq!(prefs.unit, Unit::Metric);
        assert_eq!(prefs.toggle_unit(), Unit::Imperial);
        assert_eq!(prefs.toggle_unit(), Unit::Metric);
    }

    #[test]
    fn persists_unit_and_locations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("preferences.json");

        let mut prefs = Preferences { unit: Unit::Imperial, ..Default::default() };
        prefs.add_saved_location("Sydney", Coordinate::new(-33.8688, 151.2093));
        prefs.save_to(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"unit\": \"imperial\""));
        assert!(raw.contains("\"saved_locations\""));

        let loaded = Preferences::load_from(&path).unwrap();
        assert_eq!(loaded, prefs);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").unwrap();

        let loaded = Preferences::load_from(&path).unwrap();
        assert_eq!(loaded, Preferences::default());
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Preferences::load_from(&dir.path().join("none.json")).unwrap();
        assert!(loaded.saved_locations.is_empty());
    }
}

//! Built-in coordinates for well-known cities.
//!
//! Looked up before any network call so the most common searches resolve
//! instantly and unambiguously. Uzbek spellings map to the same point as
//! their English counterparts.

use crate::model::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnownCity {
    /// Lowercase lookup key.
    pub key: &'static str,
    /// Name shown to the user.
    pub display: &'static str,
    pub coordinate: Coordinate,
}

const fn city(key: &'static str, display: &'static str, lat: f64, lon: f64) -> KnownCity {
    KnownCity { key, display, coordinate: Coordinate::new(lat, lon) }
}

pub const KNOWN_CITIES: &[KnownCity] = &[
    city("tashkent", "Tashkent, Uzbekistan", 41.2995, 69.2401),
    city("toshkent", "Tashkent, Uzbekistan", 41.2995, 69.2401),
    city("samarkand", "Samarkand, Uzbekistan", 39.6270, 66.9750),
    city("samarqand", "Samarkand, Uzbekistan", 39.6270, 66.9750),
    city("bukhara", "Bukhara, Uzbekistan", 39.7680, 64.4219),
    city("buxoro", "Bukhara, Uzbekistan", 39.7680, 64.4219),
    city("namangan", "Namangan, Uzbekistan", 41.0011, 71.6725),
    city("andijan", "Andijan, Uzbekistan", 40.7829, 72.3442),
    city("andijon", "Andijan, Uzbekistan", 40.7829, 72.3442),
    city("nukus", "Nukus, Uzbekistan", 42.4628, 59.6166),
    city("fergana", "Fergana, Uzbekistan", 40.3842, 71.7789),
    city("farg'ona", "Fergana, Uzbekistan", 40.3842, 71.7789),
    city("qarshi", "Qarshi, Uzbekistan", 38.8578, 65.7881),
    city("termez", "Termez, Uzbekistan", 37.2286, 67.2783),
    city("termiz", "Termez, Uzbekistan", 37.2286, 67.2783),
    city("gulistan", "Gulistan, Uzbekistan", 40.4897, 68.7898),
    city("jizzakh", "Jizzakh, Uzbekistan", 40.1216, 67.8422),
    city("jizzax", "Jizzakh, Uzbekistan", 40.1216, 67.8422),
    city("new york", "New York, United States", 40.7128, -74.0060),
    city("london", "London, United Kingdom", 51.5074, -0.1278),
    city("paris", "Paris, France", 48.8566, 2.3522),
    city("tokyo", "Tokyo, Japan", 35.6762, 139.6503),
    city("beijing", "Beijing, China", 39.9042, 116.4074),
    city("dubai", "Dubai, United Arab Emirates", 25.2048, 55.2708),
    city("istanbul", "Istanbul, Turkey", 41.0082, 28.9784),
    city("moscow", "Moscow, Russia", 55.7558, 37.6173),
    city("singapore", "Singapore", 1.3521, 103.8198),
    city("sydney", "Sydney, Australia", -33.8688, 151.2093),
];

/// How a table entry matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Partial,
}

/// Trim and lowercase a free-text place name.
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Exact key match on the normalized input.
pub fn find_exact(input: &str) -> Option<&'static KnownCity> {
    let needle = normalize(input);
    KNOWN_CITIES.iter().find(|c| c.key == needle)
}

/// First entry whose key contains the input or is contained by it.
pub fn find_partial(input: &str) -> Option<&'static KnownCity> {
    let needle = normalize(input);
    if needle.is_empty() {
        return None;
    }
    KNOWN_CITIES
        .iter()
        .find(|c| needle.contains(c.key) || c.key.contains(needle.as_str()))
}

/// Exact match first, then partial.
pub fn lookup(input: &str) -> Option<(&'static KnownCity, MatchKind)> {
    find_exact(input)
        .map(|c| (c, MatchKind::Exact))
        .or_else(|| find_partial(input).map(|c| (c, MatchKind::Partial)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_case_insensitive_and_trimmed() {
        let (city, kind) = lookup("  TashKent ").expect("tashkent is known");
        assert_eq!(kind, MatchKind::Exact);
        assert_eq!(city.coordinate, Coordinate::new(41.2995, 69.2401));
    }

    #[test]
    fn every_table_key_resolves_to_its_own_coordinate() {
        for entry in KNOWN_CITIES {
            let found = find_exact(&entry.key.to_uppercase()).expect("key must match itself");
            assert_eq!(found.coordinate, entry.coordinate);
        }
    }

    #[test]
    fn regional_spellings_share_coordinates() {
        assert_eq!(
            find_exact("samarqand").map(|c| c.coordinate),
            find_exact("samarkand").map(|c| c.coordinate)
        );
        assert_eq!(find_exact("farg'ona").map(|c| c.display), Some("Fergana, Uzbekistan"));
    }

    #[test]
    fn partial_match_works_in_both_directions() {
        let (city, kind) = lookup("Greater London area").expect("contains london");
        assert_eq!(kind, MatchKind::Partial);
        assert_eq!(city.key, "london");

        let (city, kind) = lookup("dub").expect("dubai contains dub");
        assert_eq!(kind, MatchKind::Partial);
        assert_eq!(city.key, "dubai");
    }

    #[test]
    fn unrelated_names_do_not_match() {
        assert!(lookup("Reykjavik").is_none());
        assert!(lookup("   ").is_none());
    }
}

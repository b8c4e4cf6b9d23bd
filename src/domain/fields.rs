//! Aircraft state-vector field catalogue.
//!
//! The service exposes a fixed set of columns. The catalogue is used to
//! validate sort fields, to resolve loosely typed field names from the command
//! line, and to build the range-filter keys the service understands.

use crate::domain::query::{FilterValue, Filters};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};

/// A column known to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// All queryable columns, in display order.
pub const FLIGHT_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "id", description: "Row identifier" },
    FieldSpec { name: "icao24", description: "Aircraft identifier" },
    FieldSpec { name: "callsign", description: "Flight callsign" },
    FieldSpec { name: "origin_country", description: "Country of origin" },
    FieldSpec { name: "time_position", description: "Time of position report" },
    FieldSpec { name: "last_contact", description: "Time of last contact" },
    FieldSpec { name: "longitude", description: "Longitude in degrees" },
    FieldSpec { name: "latitude", description: "Latitude in degrees" },
    FieldSpec { name: "baro_altitude", description: "Barometric altitude in meters" },
    FieldSpec { name: "on_ground", description: "Whether the aircraft is on the ground" },
    FieldSpec { name: "velocity", description: "Velocity over ground in m/s" },
    FieldSpec { name: "true_track", description: "True track in degrees" },
    FieldSpec { name: "vertical_rate", description: "Vertical rate in m/s" },
    FieldSpec { name: "geo_altitude", description: "Geometric altitude in meters" },
    FieldSpec { name: "squawk", description: "Transponder code" },
    FieldSpec { name: "position_source", description: "Source of position information" },
    FieldSpec { name: "category", description: "Category of the transponder" },
];

/// Transponder codes for hijack, radio failure and general emergency.
pub const EMERGENCY_SQUAWKS: [&str; 3] = ["7500", "7600", "7700"];

/// Returns `true` if `name` is an exact catalogue column.
#[must_use]
pub fn is_known_field(name: &str) -> bool {
    FLIGHT_FIELDS.iter().any(|f| f.name == name)
}

/// Resolves a user-typed field name to a catalogue column.
///
/// Exact matches win; otherwise the best fuzzy match is returned, so `vel`
/// resolves to `velocity` and `baro` to `baro_altitude`.
#[must_use]
pub fn resolve_field(query: &str) -> Option<&'static str> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    if let Some(exact) = FLIGHT_FIELDS.iter().find(|f| f.name == query) {
        return Some(exact.name);
    }

    let matcher = SkimMatcherV2::default();
    let best = FLIGHT_FIELDS
        .iter()
        .filter_map(|f| matcher.fuzzy_match(f.name, &query).map(|score| (score, f.name)))
        .max_by_key(|(score, _)| *score);

    tracing::trace!(query = %query, resolved = ?best, "resolved field name");
    best.map(|(_, name)| name)
}

/// Direction of a range predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    GreaterThan,
    LessThan,
}

/// Builds the filter key for a range predicate (`baro_altitude_gt`).
#[must_use]
pub fn range_key(field: &str, bound: RangeBound) -> String {
    match bound {
        RangeBound::GreaterThan => format!("{field}_gt"),
        RangeBound::LessThan => format!("{field}_lt"),
    }
}

/// Filter set matching aircraft squawking an emergency code.
#[must_use]
pub fn emergency_filters() -> Filters {
    let mut filters = Filters::new();
    filters.insert(
        "squawk",
        FilterValue::Set(EMERGENCY_SQUAWKS.iter().map(|s| (*s).to_string()).collect()),
    );
    filters
}

/// Preferred measurement system for the display layer.
///
/// The core only persists this choice; converting values is up to whoever
/// renders them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "metric" | "si" => Some(Self::Metric),
            "imperial" | "aviation" => Some(Self::Imperial),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exact_and_fuzzy_names() {
        assert_eq!(resolve_field("callsign"), Some("callsign"));
        assert_eq!(resolve_field("VELOCITY"), Some("velocity"));
        assert_eq!(resolve_field("vel"), Some("velocity"));
        assert_eq!(resolve_field("country"), Some("origin_country"));
        assert_eq!(resolve_field("zzzz"), None);
        assert_eq!(resolve_field("  "), None);
    }

    #[test]
    fn range_keys_carry_the_bound_suffix() {
        assert_eq!(range_key("baro_altitude", RangeBound::GreaterThan), "baro_altitude_gt");
        assert_eq!(range_key("velocity", RangeBound::LessThan), "velocity_lt");
    }

    #[test]
    fn emergency_preset_targets_squawk_codes() {
        let filters = emergency_filters();
        let Some(FilterValue::Set(codes)) = filters.get("squawk") else {
            panic!("expected squawk set");
        };
        assert_eq!(codes.len(), 3);
        assert!(codes.contains("7700"));
    }
}

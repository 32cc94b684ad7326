//! Runtime configuration for the room finder core.
//!
//! Every tunable the components need (fuzzy threshold, walking speed, tile
//! styles, theme colours, readiness policy) lives in one [`FinderConfig`]
//! value that is passed in explicitly. Missing JSON fields take defaults.
//!
//! ```
//! use roomfinder_logic::config::{validate_config, FinderConfig};
//!
//! let config = FinderConfig::from_json_str(r#"{ "route": { "walking_speed_kmh": 4.5 } }"#).unwrap();
//! assert_eq!(config.route.walking_speed_kmh, 4.5);
//! assert_eq!(config.search.fuzzy_threshold, 60.0);
//! assert!(validate_config(&config).is_empty());
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::Bounds;
use crate::styles::StyleTable;
use crate::surface::{LineStyle, MarkerStyle, PolygonStyle};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    pub search: SearchConfig,
    pub route: RouteConfig,
    /// Records outside this box are dropped at catalog load.
    pub envelope: Bounds,
    pub map: MapSettings,
}

/// Search tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum hits returned.
    pub limit: usize,
    /// Minimum combined score (0–100) to keep a hit.
    pub fuzzy_threshold: f64,
    /// Popular destinations shown when the query is empty.
    pub featured: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: 5,
            fuzzy_threshold: 60.0,
            featured: vec![
                "Library".into(),
                "Cafeteria".into(),
                "Auditorium".into(),
                "Computer Lab 1".into(),
                "A101".into(),
                "B205".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub walking_speed_kmh: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            walking_speed_kmh: 5.0,
        }
    }
}

/// Everything the map controller needs besides data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub styles: StyleTable,
    pub theme: MapTheme,
    /// Pixels kept free around fitted bounds.
    pub fit_padding: u32,
    pub readiness: ReadinessConfig,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            styles: StyleTable::default(),
            theme: MapTheme::default(),
            fit_padding: 30,
            readiness: ReadinessConfig::default(),
        }
    }
}

/// Layer appearance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapTheme {
    pub room_marker: MarkerStyle,
    pub user_marker: MarkerStyle,
    pub selected_marker: MarkerStyle,
    pub route_line: LineStyle,
    pub boundary: PolygonStyle,
}

impl Default for MapTheme {
    fn default() -> Self {
        Self {
            room_marker: MarkerStyle::new("gray", "door-open"),
            user_marker: MarkerStyle::new("blue", "user"),
            selected_marker: MarkerStyle::new("red", "map-marker"),
            route_line: LineStyle {
                color: "#4CAF50".into(),
                weight: 5.0,
                opacity: 0.8,
                dash: Some("10, 5".into()),
            },
            boundary: PolygonStyle {
                stroke_color: "#D32F2F".into(),
                stroke_weight: 3.0,
                fill_color: "#4CAF50".into(),
                fill_opacity: 0.2,
            },
        }
    }
}

/// How long to wait for the map surface to come up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            max_attempts: 50,
        }
    }
}

impl ReadinessConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl FinderConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Check a configuration. Returns human-readable problems; empty means valid.
pub fn validate_config(config: &FinderConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.search.limit == 0 {
        errors.push("search.limit must be at least 1".to_string());
    }
    let t = config.search.fuzzy_threshold;
    if !(0.0..=100.0).contains(&t) {
        errors.push(format!("search.fuzzy_threshold must be 0–100, got {}", t));
    }

    let speed = config.route.walking_speed_kmh;
    if !speed.is_finite() || speed <= 0.0 {
        errors.push(format!("route.walking_speed_kmh must be positive, got {}", speed));
    }

    let env = &config.envelope;
    if !env.min.is_finite() || !env.max.is_finite() {
        errors.push("envelope corners must be finite".to_string());
    } else if env.min.lat > env.max.lat || env.min.lon > env.max.lon {
        errors.push("envelope min corner must not exceed max corner".to_string());
    }

    let styles = &config.map.styles;
    if styles.styles.is_empty() {
        errors.push("map.styles must define at least one style".to_string());
    } else if styles.get(&styles.default_key).is_none() {
        errors.push(format!(
            "map.styles.default_key {:?} does not name a style",
            styles.default_key
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for key in styles.keys() {
        if !seen.insert(key) {
            errors.push(format!("duplicate map style key {:?}", key));
        }
    }

    if config.map.readiness.poll_interval_ms == 0 {
        errors.push("map.readiness.poll_interval_ms must be positive".to_string());
    }
    if config.map.readiness.max_attempts == 0 {
        errors.push("map.readiness.max_attempts must be at least 1".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let errors = validate_config(&FinderConfig::default());
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = FinderConfig::from_json_str("{}").unwrap();
        assert_eq!(config.search.limit, 5);
        assert_eq!(config.route.walking_speed_kmh, 5.0);
        assert_eq!(config.envelope, Bounds::WORLD);
        assert_eq!(config.map.styles.styles.len(), 5);
        assert_eq!(config.map.readiness.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "search": { "fuzzy_threshold": 75 },
            "envelope": { "min": { "lat": -1.0, "lon": 37.0 }, "max": { "lat": 0.0, "lon": 38.0 } },
            "map": { "fit_padding": 12 }
        }"#;
        let config = FinderConfig::from_json_str(json).unwrap();
        assert_eq!(config.search.fuzzy_threshold, 75.0);
        assert_eq!(config.search.limit, 5);
        assert_eq!(config.envelope.min.lat, -1.0);
        assert_eq!(config.map.fit_padding, 12);
        assert_eq!(config.map.theme.user_marker.color, "blue");
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(FinderConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_invalid_values_reported() {
        let mut config = FinderConfig::default();
        config.search.limit = 0;
        config.search.fuzzy_threshold = 140.0;
        config.route.walking_speed_kmh = 0.0;
        config.map.styles.default_key = "neon".into();
        config.map.readiness.max_attempts = 0;
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 5, "{:?}", errors);
        assert!(errors.iter().any(|e| e.contains("walking_speed_kmh")));
        assert!(errors.iter().any(|e| e.contains("neon")));
    }

    #[test]
    fn test_inverted_envelope_reported() {
        let mut config = FinderConfig::default();
        config.envelope.min.lat = 10.0;
        config.envelope.max.lat = -10.0;
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("envelope"));
    }
}

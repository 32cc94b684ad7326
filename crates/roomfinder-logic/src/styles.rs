//! Base-map tile styles.
//!
//! The table is plain data carried in [`crate::config::FinderConfig`], so a
//! deployment can add or replace styles without touching code. Lookups of
//! an unknown key fall back to the table's default style.

use serde::{Deserialize, Serialize};

/// One selectable base map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileStyle {
    /// Stable key used in snapshots ("standard", "satellite", ...).
    pub key: String,
    /// Human-readable name for the style picker.
    pub label: String,
    /// Tile URL template, or a provider name the surface understands.
    pub url: String,
    pub attribution: String,
}

impl TileStyle {
    fn new(key: &str, label: &str, url: &str, attribution: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            url: url.to_string(),
            attribution: attribution.to_string(),
        }
    }
}

/// Ordered set of tile styles plus the fallback key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleTable {
    pub default_key: String,
    pub styles: Vec<TileStyle>,
}

impl Default for StyleTable {
    fn default() -> Self {
        Self {
            default_key: "standard".to_string(),
            styles: vec![
                TileStyle::new(
                    "standard",
                    "Standard",
                    "OpenStreetMap",
                    "© OpenStreetMap contributors",
                ),
                TileStyle::new(
                    "terrain",
                    "Terrain",
                    "https://stamen-tiles.a.ssl.fastly.net/terrain/{z}/{x}/{y}.jpg",
                    "Map tiles by Stamen Design, © OpenStreetMap",
                ),
                TileStyle::new(
                    "light",
                    "Light",
                    "https://cartodb-basemaps-a.global.ssl.fastly.net/light_all/{z}/{x}/{y}{r}.png",
                    "© OpenStreetMap contributors © CARTO",
                ),
                TileStyle::new(
                    "dark",
                    "Dark",
                    "https://cartodb-basemaps-a.global.ssl.fastly.net/dark_all/{z}/{x}/{y}{r}.png",
                    "© OpenStreetMap contributors © CARTO",
                ),
                TileStyle::new(
                    "satellite",
                    "Satellite",
                    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                    "Tiles © Esri, Source: Esri, DigitalGlobe and others",
                ),
            ],
        }
    }
}

impl StyleTable {
    pub fn get(&self, key: &str) -> Option<&TileStyle> {
        self.styles.iter().find(|s| s.key == key)
    }

    /// Resolve `key`, falling back to the default style (then to the first
    /// style). `None` only for an empty table.
    pub fn resolve(&self, key: &str) -> Option<&TileStyle> {
        self.get(key).or_else(|| {
            log::debug!("Unknown map style {:?}, using {:?}", key, self.default_key);
            self.get(&self.default_key).or_else(|| self.styles.first())
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.styles.iter().map(|s| s.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_has_five_styles() {
        let t = StyleTable::default();
        let keys: Vec<&str> = t.keys().collect();
        assert_eq!(keys, vec!["standard", "terrain", "light", "dark", "satellite"]);
        assert!(t.get(&t.default_key).is_some());
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        let t = StyleTable::default();
        assert_eq!(t.resolve("dark").unwrap().key, "dark");
        assert_eq!(t.resolve("neon").unwrap().key, "standard");
    }

    #[test]
    fn test_resolve_with_bad_default_uses_first() {
        let t = StyleTable {
            default_key: "missing".into(),
            ..StyleTable::default()
        };
        assert_eq!(t.resolve("neon").unwrap().key, "standard");
        let empty = StyleTable {
            default_key: "x".into(),
            styles: vec![],
        };
        assert!(empty.resolve("x").is_none());
    }
}

//! Board geometry and offline-cache configuration.
//!
//! # Responsibility
//! - Hold the named constants the layout engine and cache worker depend on.
//! - Allow overriding them from JSON without code changes.
//!
//! # Invariants
//! - Geometry values are finite and non-negative; widths/heights are positive.
//! - Static and dynamic partition names both start with `partition_prefix`.
//! - Bumping a partition suffix is the only supported cache upgrade path.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Days a trashed note is retained before permanent removal.
pub const TRASH_RETENTION_DAYS: i64 = 30;

const DEFAULT_NOTE_WIDTH: f64 = 180.0;
const DEFAULT_NOTE_HEIGHT: f64 = 180.0;
const DEFAULT_NOTE_GAP: f64 = 20.0;
const DEFAULT_INITIAL_X: f64 = 240.0;
const DEFAULT_INITIAL_Y: f64 = 24.0;

const STATIC_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/css/styles.css",
    "/js/app.js",
    "/js/services/srv-local-storage.js",
    "/js/viewmodels/vm-dom.js",
    "/js/viewmodels/vm-sticky-note.js",
    "/js/viewmodels/vm-white-board.js",
    "/manifest.json",
    "/icons/icon-192x192.png",
    "/icons/icon-512x512.png",
];

const EXTERNAL_ASSETS: &[&str] = &[
    "https://fonts.googleapis.com/css2?family=Roboto:wght@300;400;500&display=swap",
    "https://fonts.googleapis.com/icon?family=Material+Icons",
];

/// Configuration validation/parsing error.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Fixed grid geometry used by every placement and reflow pass.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub note_width: f64,
    pub note_height: f64,
    /// Gap between cells; also the unindented left margin of wrapped rows.
    pub gap: f64,
    pub initial_x: f64,
    pub initial_y: f64,
    /// Bottom edge of the fixed UI stack in the top-left corner.
    ///
    /// A first overflow row starting above this line is indented to
    /// `initial_x` so it does not slide under the stack.
    pub header_band_bottom: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            note_width: DEFAULT_NOTE_WIDTH,
            note_height: DEFAULT_NOTE_HEIGHT,
            gap: DEFAULT_NOTE_GAP,
            initial_x: DEFAULT_INITIAL_X,
            initial_y: DEFAULT_INITIAL_Y,
            header_band_bottom: DEFAULT_INITIAL_Y + DEFAULT_NOTE_HEIGHT,
        }
    }
}

impl LayoutConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("noteWidth", self.note_width),
            ("noteHeight", self.note_height),
            ("gap", self.gap),
            ("initialX", self.initial_x),
            ("initialY", self.initial_y),
            ("headerBandBottom", self.header_band_bottom),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "`{name}` must be finite and non-negative, got {value}"
                )));
            }
        }
        if self.note_width == 0.0 || self.note_height == 0.0 {
            return Err(ConfigError::Invalid(
                "note dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Horizontal distance between the left edges of neighbouring cells.
    pub fn column_step(&self) -> f64 {
        self.note_width + self.gap
    }

    /// Vertical distance between the top edges of neighbouring rows.
    pub fn row_step(&self) -> f64 {
        self.note_height + self.gap
    }
}

/// Offline cache worker settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Release tag of this worker generation, used in diagnostics.
    pub release: String,
    /// Prefix shared by every partition this application owns.
    pub partition_prefix: String,
    pub static_partition: String,
    pub dynamic_partition: String,
    /// Origin that relative manifest paths are resolved against.
    pub origin: String,
    /// Same-origin paths prefetched into the static partition on install.
    pub static_assets: Vec<String>,
    /// Absolute cross-origin URLs prefetched into the dynamic partition.
    pub external_assets: Vec<String>,
    /// Hosts answered cache-preferred (web fonts).
    pub font_hosts: Vec<String>,
    /// Hosts answered network-preferred (CDN scripts).
    pub cdn_hosts: Vec<String>,
    /// Root document served to navigations when both cache and network miss.
    pub offline_document: String,
    /// Request activation right after install instead of waiting for clients.
    pub skip_waiting_on_install: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            release: "foss-kulli-v1".to_string(),
            partition_prefix: "foss-kulli-".to_string(),
            static_partition: "foss-kulli-static-v1".to_string(),
            dynamic_partition: "foss-kulli-dynamic-v1".to_string(),
            origin: "http://localhost:8080".to_string(),
            static_assets: STATIC_ASSETS.iter().map(|path| path.to_string()).collect(),
            external_assets: EXTERNAL_ASSETS.iter().map(|url| url.to_string()).collect(),
            font_hosts: vec![
                "fonts.googleapis.com".to_string(),
                "fonts.gstatic.com".to_string(),
            ],
            cdn_hosts: vec!["cdn.tailwindcss.com".to_string()],
            offline_document: "/index.html".to_string(),
            skip_waiting_on_install: true,
        }
    }
}

impl CacheConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.partition_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "partition prefix cannot be empty".to_string(),
            ));
        }
        for name in [&self.static_partition, &self.dynamic_partition] {
            if !name.starts_with(self.partition_prefix.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "partition `{name}` does not start with prefix `{}`",
                    self.partition_prefix
                )));
            }
        }
        if self.static_partition == self.dynamic_partition {
            return Err(ConfigError::Invalid(
                "static and dynamic partitions must differ".to_string(),
            ));
        }
        url::Url::parse(self.origin.as_str()).map_err(|err| {
            ConfigError::Invalid(format!("origin `{}` is not a valid URL: {err}", self.origin))
        })?;
        Ok(())
    }

    /// Returns the names of the partitions that survive activation.
    pub fn current_partitions(&self) -> [&str; 2] {
        [
            self.static_partition.as_str(),
            self.dynamic_partition.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheConfig, ConfigError, LayoutConfig};

    #[test]
    fn layout_defaults_match_board_geometry() {
        let config = LayoutConfig::default();
        assert_eq!(config.note_width, 180.0);
        assert_eq!(config.gap, 20.0);
        assert_eq!(config.header_band_bottom, 204.0);
        assert_eq!(config.column_step(), 200.0);
    }

    #[test]
    fn layout_json_keeps_defaults_for_missing_fields() {
        let config = LayoutConfig::from_json_str(r#"{"gap": 10}"#).expect("valid json");
        assert_eq!(config.gap, 10.0);
        assert_eq!(config.note_width, 180.0);
    }

    #[test]
    fn layout_rejects_negative_values() {
        let err = LayoutConfig::from_json_str(r#"{"initialX": -1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn cache_rejects_partition_outside_prefix() {
        let err = CacheConfig::from_json_str(r#"{"staticPartition": "other-static-v2"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("prefix"));
    }

    #[test]
    fn cache_defaults_are_valid() {
        let config = CacheConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.static_assets.len(), 11);
        assert_eq!(
            config.current_partitions(),
            ["foss-kulli-static-v1", "foss-kulli-dynamic-v1"]
        );
    }
}

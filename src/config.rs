//! Editor configuration.
//!
//! The configuration surface hosts hand to the engine: feature toggles, the
//! enabled tool set, engine tunables and keypoint definitions. It serializes
//! to JSON so hosts can persist and share it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HISTORY_LIMIT, DEFAULT_MIN_BOX_SIZE, DEFAULT_NEW_BOX_MIN_DRAG,
    DEFAULT_POLYGON_CLOSE_THRESHOLD,
};
use crate::model::{Point, Tool};

/// Log level setting for hosts that install a logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    /// Session loads, committed edits and history restores
    #[default]
    Info,
    /// Gesture steps and history pushes
    Debug,
    /// Every pointer move
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// One landmark of a keypoint skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landmark {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub color: String,
    /// Offset from the skeleton center at scale 1.
    pub default_position: Point,
}

impl Landmark {
    /// Landmark at the given offset, unlabelled.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            label: String::new(),
            color: String::new(),
            default_position: Point::new(x, y),
        }
    }
}

/// A named keypoint skeleton layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypointDefinition {
    pub landmarks: BTreeMap<String, Landmark>,
    /// Pairs of landmark names drawn as bones.
    #[serde(default)]
    pub connections: Vec<(String, String)>,
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_enabled_tools() -> BTreeSet<Tool> {
    Tool::all().iter().copied().collect()
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_min_box_size() -> f64 {
    DEFAULT_MIN_BOX_SIZE
}

fn default_polygon_close_threshold() -> f64 {
    DEFAULT_POLYGON_CLOSE_THRESHOLD
}

fn default_new_box_min_drag() -> f64 {
    DEFAULT_NEW_BOX_MIN_DRAG
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Configuration consumed by the engine.
///
/// Flags the engine does not act on itself (`disable_region_type`,
/// `disable_top_nav`, `disable_right_sidebar`, `hide_name`) are carried for the
/// renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Version of the configuration format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Region class labels cannot be changed
    #[serde(default)]
    pub disable_classes: bool,
    /// Region tags cannot be changed
    #[serde(default)]
    pub disable_tags: bool,
    #[serde(default)]
    pub disable_region_type: bool,
    #[serde(default)]
    pub disable_top_nav: bool,
    /// Prev/Next header buttons are ignored
    #[serde(default)]
    pub disable_navs: bool,
    /// Settings header button is ignored
    #[serde(default)]
    pub disable_settings: bool,
    #[serde(default)]
    pub disable_right_sidebar: bool,
    /// Reject every mutating action
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub hide_name: bool,
    /// Enables the mask toggle
    #[serde(default)]
    pub full_image_segmentation_mode: bool,
    /// Tools `SELECT_TOOL` may activate (select, pan and window tools are always allowed)
    #[serde(default = "default_enabled_tools")]
    pub enabled_tools: BTreeSet<Tool>,

    /// Maximum number of undo snapshots
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Minimum box width/height while resizing
    #[serde(default = "default_min_box_size")]
    pub min_box_size: f64,
    /// Snap distance for closing a polygon at its first vertex
    #[serde(default = "default_polygon_close_threshold")]
    pub polygon_close_threshold: f64,
    /// New boxes dragged less than this are discarded on mouse up
    #[serde(default = "default_new_box_min_drag")]
    pub new_box_min_drag: f64,
    /// Skeleton layouts for `create-keypoints`, by id
    #[serde(default)]
    pub keypoint_definitions: BTreeMap<String, KeypointDefinition>,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl EditorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            disable_classes: false,
            disable_tags: false,
            disable_region_type: false,
            disable_top_nav: false,
            disable_navs: false,
            disable_settings: false,
            disable_right_sidebar: false,
            read_only: false,
            hide_name: false,
            full_image_segmentation_mode: false,
            enabled_tools: default_enabled_tools(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            min_box_size: DEFAULT_MIN_BOX_SIZE,
            polygon_close_threshold: DEFAULT_POLYGON_CLOSE_THRESHOLD,
            new_box_min_drag: DEFAULT_NEW_BOX_MIN_DRAG,
            keypoint_definitions: BTreeMap::new(),
            log_level: LogLevel::default(),
        }
    }

    /// Builder: make the editor read-only.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Builder: restrict the enabled tools.
    pub fn with_enabled_tools(mut self, tools: impl IntoIterator<Item = Tool>) -> Self {
        self.enabled_tools = tools.into_iter().collect();
        self
    }

    /// Builder: set the history limit.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Builder: register a keypoint definition.
    pub fn with_keypoint_definition(
        mut self,
        id: impl Into<String>,
        definition: KeypointDefinition,
    ) -> Self {
        self.keypoint_definitions.insert(id.into(), definition);
        self
    }

    /// Check whether `SELECT_TOOL` may activate a tool.
    pub fn is_tool_enabled(&self, tool: Tool) -> bool {
        if tool == Tool::ShowMask && !self.full_image_segmentation_mode {
            return false;
        }
        tool.always_enabled() || self.enabled_tools.contains(&tool)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }

    fn tunables(&self) -> [(&'static str, f64); 3] {
        [
            ("minBoxSize", self.min_box_size),
            ("polygonCloseThreshold", self.polygon_close_threshold),
            ("newBoxMinDrag", self.new_box_min_drag),
        ]
    }

    /// Check that every distance tunable is finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.tunables().into_iter().find(|(_, value)| !is_positive(*value)) {
            Some((field, value)) => Err(ConfigError::InvalidValue {
                field: field.to_string(),
                value,
            }),
            None => Ok(()),
        }
    }

    /// Replace invalid tunables with their defaults.
    pub fn sanitized(mut self) -> Self {
        for (field, value) in self.tunables() {
            if !is_positive(value) {
                log::warn!("⚠️ Config {} = {} must be positive, using the default", field, value);
            }
        }
        if !is_positive(self.min_box_size) {
            self.min_box_size = DEFAULT_MIN_BOX_SIZE;
        }
        if !is_positive(self.polygon_close_threshold) {
            self.polygon_close_threshold = DEFAULT_POLYGON_CLOSE_THRESHOLD;
        }
        if !is_positive(self.new_box_min_drag) {
            self.new_box_min_drag = DEFAULT_NEW_BOX_MIN_DRAG;
        }
        self
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "region-annotator-config.json"
    }

    /// Per-user config file: `<config dir>/region-annotator/<default_filename>`,
    /// with `~/.config` standing in when the platform has no config dir.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        let base = dirs::config_dir().or_else(|| dirs::home_dir().map(|home| home.join(".config")))?;
        Some(base.join("region-annotator").join(Self::default_filename()))
    }

    /// Load configuration from a file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load the per-user config file, if there is a readable one.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from_path(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to a file, creating parent directories as needed.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// A tunable is out of its valid range
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: f64 },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert!(!config.read_only);
        assert!(config.is_tool_enabled(Tool::CreateBox));
        // Mask toggle needs segmentation mode
        assert!(!config.is_tool_enabled(Tool::ShowMask));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json(r#"{"readOnly": true, "disableClasses": true}"#)
            .expect("valid config");
        assert!(config.read_only);
        assert!(config.disable_classes);
        assert!(!config.disable_tags);
        assert_eq!(config.enabled_tools.len(), Tool::all().len());
        assert_eq!(config.min_box_size, DEFAULT_MIN_BOX_SIZE);
    }

    #[test]
    fn test_enabled_tools_restrict_but_keep_always_available() {
        let config = EditorConfig::from_json(r#"{"enabledTools": ["create-box"]}"#)
            .expect("valid config");
        assert!(config.is_tool_enabled(Tool::CreateBox));
        assert!(!config.is_tool_enabled(Tool::CreatePolygon));
        assert!(config.is_tool_enabled(Tool::Select));
        assert!(config.is_tool_enabled(Tool::Pan));
    }

    #[test]
    fn test_version_too_new() {
        let result = EditorConfig::from_json(r#"{"version": 99}"#);
        assert_matches!(
            result,
            Err(ConfigError::VersionTooNew {
                file_version: 99,
                ..
            })
        );
    }

    #[test]
    fn test_json_roundtrip_with_keypoints() {
        let mut landmarks = BTreeMap::new();
        landmarks.insert("nose".to_string(), Landmark::at(0.0, -0.05));
        let config = EditorConfig::new().with_keypoint_definition(
            "face",
            KeypointDefinition {
                landmarks,
                connections: vec![("nose".to_string(), "nose".to_string())],
            },
        );
        let json = config.to_json().expect("serialize");
        assert!(json.contains("\"keypointDefinitions\""));
        assert!(json.contains("\"defaultPosition\""));
        let back = EditorConfig::from_json(&json).expect("parse");
        assert_eq!(back, config);
    }

    #[test]
    fn test_non_positive_tunables_rejected() {
        let result = EditorConfig::from_json(r#"{"minBoxSize": 0}"#);
        assert_matches!(result, Err(ConfigError::InvalidValue { ref field, .. }) if field == "minBoxSize");

        let result = EditorConfig::from_json(r#"{"polygonCloseThreshold": -0.5}"#);
        assert_matches!(result, Err(ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_sanitized_restores_defaults() {
        let mut config = EditorConfig::default();
        config.min_box_size = 0.0;
        config.new_box_min_drag = f64::NAN;
        config.polygon_close_threshold = 0.05;

        let config = config.sanitized();
        assert_eq!(config.min_box_size, DEFAULT_MIN_BOX_SIZE);
        assert_eq!(config.new_box_min_drag, DEFAULT_NEW_BOX_MIN_DRAG);
        assert_eq!(config.polygon_close_threshold, 0.05);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("region-annotator-test-{}", std::process::id()))
            .join(EditorConfig::default_filename());
        let config = EditorConfig::new().read_only(true).with_history_limit(7);

        config.save_to_path(&path).expect("save");
        let loaded = EditorConfig::load_from_path(&path).expect("load");
        assert_eq!(loaded, config);
        let _ = std::fs::remove_dir_all(path.parent().expect("has parent"));
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Debug.to_level_filter(), log::LevelFilter::Debug);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }
}

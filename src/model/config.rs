use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend root, e.g. `http://localhost:8080/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Version segment for auth and task routes (`v1`). Empty = unversioned.
    #[serde(default = "default_version")]
    pub version: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            version: default_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".into()
}

fn default_version() -> String {
    "v1".into()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub show_key_hints: bool,
    /// Color overrides applied on top of the light/dark palette
    #[serde(default)]
    pub colors: HashMap<String, String>,
    #[serde(default)]
    pub label_colors: HashMap<String, String>,
}

/// Initial panel sizes, in percent of the screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_side_panel")]
    pub explorer: u16,
    #[serde(default = "default_side_panel")]
    pub properties: u16,
    #[serde(default = "default_timeline_panel")]
    pub timeline: u16,
    #[serde(default = "default_true")]
    pub show_timeline: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            explorer: default_side_panel(),
            properties: default_side_panel(),
            timeline: default_timeline_panel(),
            show_timeline: true,
        }
    }
}

fn default_side_panel() -> u16 {
    20
}

fn default_timeline_panel() -> u16 {
    30
}

fn default_true() -> bool {
    true
}

/// Terminal scale for the timeline grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_days")]
    pub days: u32,
    /// Columns per day column
    #[serde(default = "default_columns_per_day")]
    pub columns_per_day: u16,
    /// Width of the task title column
    #[serde(default = "default_label_width")]
    pub label_width: u16,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig {
            days: default_days(),
            columns_per_day: default_columns_per_day(),
            label_width: default_label_width(),
        }
    }
}

fn default_days() -> u32 {
    14
}

fn default_columns_per_day() -> u16 {
    7
}

fn default_label_width() -> u16 {
    24
}

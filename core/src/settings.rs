use serde::{Deserialize, Serialize};

pub const SETTINGS_STORAGE_KEY: &str = "noel.settings.v1";
pub const REDUCED_MOTION_OVERRIDE_KEY: &str = "noel.debug.reduced_motion";

pub const OPEN_SETTLE_MS: u32 = 2200;
pub const CLOSE_SETTLE_MS: u32 = 2500;

pub const SNOW_BASE_DESKTOP: f64 = 70.0;
pub const SNOW_BASE_COMPACT: f64 = 35.0;
pub const SNOW_REFERENCE_WIDTH: f64 = 800.0;
pub const SNOW_REFERENCE_HEIGHT: f64 = 600.0;
pub const SNOW_MIN_AREA_FACTOR: f64 = 0.5;
pub const SNOW_MAX_FRAME_GAP_MS: f64 = 50.0;
pub const SNOW_FRAME_MS: f64 = 16.6667;
pub const SNOW_RESPAWN_MARGIN: f64 = 10.0;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings blob is not valid json: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnowSettings {
    #[serde(default = "default_base_desktop")]
    pub base_desktop: f64,
    #[serde(default = "default_base_compact")]
    pub base_compact: f64,
    #[serde(default = "default_reference_width")]
    pub reference_width: f64,
    #[serde(default = "default_reference_height")]
    pub reference_height: f64,
    #[serde(default = "default_min_area_factor")]
    pub min_area_factor: f64,
    #[serde(default = "default_max_frame_gap_ms")]
    pub max_frame_gap_ms: f64,
    #[serde(default = "default_frame_ms")]
    pub frame_ms: f64,
    #[serde(default = "default_respawn_margin")]
    pub respawn_margin: f64,
}

impl Default for SnowSettings {
    fn default() -> Self {
        Self {
            base_desktop: SNOW_BASE_DESKTOP,
            base_compact: SNOW_BASE_COMPACT,
            reference_width: SNOW_REFERENCE_WIDTH,
            reference_height: SNOW_REFERENCE_HEIGHT,
            min_area_factor: SNOW_MIN_AREA_FACTOR,
            max_frame_gap_ms: SNOW_MAX_FRAME_GAP_MS,
            frame_ms: SNOW_FRAME_MS,
            respawn_margin: SNOW_RESPAWN_MARGIN,
        }
    }
}

fn default_base_desktop() -> f64 {
    SNOW_BASE_DESKTOP
}

fn default_base_compact() -> f64 {
    SNOW_BASE_COMPACT
}

fn default_reference_width() -> f64 {
    SNOW_REFERENCE_WIDTH
}

fn default_reference_height() -> f64 {
    SNOW_REFERENCE_HEIGHT
}

fn default_min_area_factor() -> f64 {
    SNOW_MIN_AREA_FACTOR
}

fn default_max_frame_gap_ms() -> f64 {
    SNOW_MAX_FRAME_GAP_MS
}

fn default_frame_ms() -> f64 {
    SNOW_FRAME_MS
}

fn default_respawn_margin() -> f64 {
    SNOW_RESPAWN_MARGIN
}

/// Element lookups the controller binds to at boot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementIds {
    #[serde(default = "default_open_button")]
    pub open_button: String,
    #[serde(default = "default_card_selector")]
    pub card_selector: String,
    #[serde(default = "default_card_inner")]
    pub card_inner: String,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default = "default_audio")]
    pub audio: String,
    #[serde(default = "default_snow_canvas")]
    pub snow_canvas: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            open_button: default_open_button(),
            card_selector: default_card_selector(),
            card_inner: default_card_inner(),
            template: default_template(),
            audio: default_audio(),
            snow_canvas: default_snow_canvas(),
        }
    }
}

fn default_open_button() -> String {
    "openBtn".to_string()
}

fn default_card_selector() -> String {
    ".card".to_string()
}

fn default_card_inner() -> String {
    "cardInner".to_string()
}

fn default_template() -> String {
    "cardContent".to_string()
}

fn default_audio() -> String {
    "audio".to_string()
}

fn default_snow_canvas() -> String {
    "snowCanvas".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardSettings {
    #[serde(default)]
    pub elements: ElementIds,
    #[serde(default = "default_open_settle_ms")]
    pub open_settle_ms: u32,
    #[serde(default = "default_close_settle_ms")]
    pub close_settle_ms: u32,
    #[serde(default)]
    pub snow: SnowSettings,
}

impl Default for CardSettings {
    fn default() -> Self {
        Self {
            elements: ElementIds::default(),
            open_settle_ms: OPEN_SETTLE_MS,
            close_settle_ms: CLOSE_SETTLE_MS,
            snow: SnowSettings::default(),
        }
    }
}

fn default_open_settle_ms() -> u32 {
    OPEN_SETTLE_MS
}

fn default_close_settle_ms() -> u32 {
    CLOSE_SETTLE_MS
}

impl CardSettings {
    /// Decodes a (possibly partial) settings blob; absent fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(trimmed)?)
    }
}

/// Parses the `1`/`0` style debug override for reduced motion.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_blob_keeps_defaults() {
        let settings =
            CardSettings::from_json(r#"{"open_settle_ms": 1800, "snow": {"base_desktop": 90}}"#)
                .expect("settings");
        assert_eq!(settings.open_settle_ms, 1800);
        assert_eq!(settings.close_settle_ms, CLOSE_SETTLE_MS);
        assert_eq!(settings.snow.base_desktop, 90.0);
        assert_eq!(settings.snow.base_compact, SNOW_BASE_COMPACT);
        assert_eq!(settings.elements, ElementIds::default());
    }

    #[test]
    fn empty_blob_is_default() {
        assert_eq!(CardSettings::from_json("  ").expect("settings"), CardSettings::default());
    }

    #[test]
    fn invalid_blob_is_an_error() {
        assert!(matches!(
            CardSettings::from_json("{not json"),
            Err(SettingsError::Decode(_))
        ));
    }

    #[test]
    fn flag_parsing() {
        assert_eq!(parse_flag(" 1 "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::Result;

/// Session settings supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Enables verbose diagnostics, including guard evaluation failures.
    pub debug: bool,
    /// Logical-unit to device-pixel factor.
    pub ui_scale: f32,
    /// Disables features that depend on the host's native memory layout,
    /// currently the state-tracking entries behind mouse-button modifiers.
    pub safe_mode: bool,
    pub hold_time_ms: u64,
    pub chord_time_ms: u64,
    pub double_click_time_ms: u64,
    /// How long parked hotkeys wait for their keymap before an advisory is reported.
    pub keymap_wait_secs: f64,
    /// Keymap used when a menu names none.
    pub default_keymap: String,
    /// Minimum distance, in logical units, between an overlay panel and the region edge.
    pub panel_margin: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            ui_scale: 1.0,
            safe_mode: false,
            hold_time_ms: 200,
            chord_time_ms: 300,
            double_click_time_ms: 350,
            keymap_wait_secs: 10.0,
            default_keymap: "Window".to_string(),
            panel_margin: 10.0,
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file.
    /// Returns defaults if the file doesn't exist or is malformed.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("failed to load settings from {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut settings: Settings = serde_json::from_str(json)?;
        if !(settings.ui_scale.is_finite() && settings.ui_scale > 0.0) {
            settings.ui_scale = 1.0;
        }
        Ok(settings)
    }

    pub fn hold_time(&self) -> Duration {
        Duration::from_millis(self.hold_time_ms)
    }

    pub fn chord_time(&self) -> Duration {
        Duration::from_millis(self.chord_time_ms)
    }

    pub fn double_click_time(&self) -> Duration {
        Duration::from_millis(self.double_click_time_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{"debug": true, "chord_time_ms": 500}"#).unwrap();
        assert!(settings.debug);
        assert_eq!(settings.chord_time(), Duration::from_millis(500));
        assert_eq!(settings.hold_time(), Duration::from_millis(200));
        assert_eq!(settings.default_keymap, "Window");
    }

    #[test]
    fn bad_scale_is_reset() {
        let settings = Settings::from_json(r#"{"ui_scale": 0.0}"#).unwrap();
        assert_eq!(settings.ui_scale, 1.0);
    }

    #[test]
    fn malformed_json_is_an_error_and_missing_file_is_default() {
        assert!(Settings::from_json("{not json").is_err());
        let settings = Settings::load("/definitely/not/here/settings.json");
        assert_eq!(settings, Settings::default());
    }
}

//! Runtime configuration, stored as TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! stock 1280×720 keyboard with a 40 px pinch threshold and a 400 ms click
//! cooldown.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use pinch_core::{GestureParams, LayoutGeometry};

/// Which [`crate::hand::HandDetector`] to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackend {
    /// Mouse-driven hand, no camera or model needed.
    Simulated,
    /// MediaPipe helper process fed with camera frames.
    Mediapipe,
}

impl Default for DetectorBackend {
    /// A camera build tracks the real hand; otherwise the mouse stands in.
    fn default() -> Self {
        if cfg!(feature = "camera") {
            DetectorBackend::Mediapipe
        } else {
            DetectorBackend::Simulated
        }
    }
}

/// The helper script shipped with this crate, as an absolute path so the
/// default works from any working directory.
pub const DEFAULT_DETECTOR_SCRIPT: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/scripts/hand_detect.py");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width:      usize,
    pub height:     usize,
    /// Frame-rate cap for the main loop.
    pub target_fps: usize,
    pub title:      String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            width:      1280,
            height:     720,
            target_fps: 30,
            title:      "Pinch Keyboard".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index:  u32,
    /// Flip frames horizontally before detection and display.
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig { index: 0, mirror: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub key_size: i32,
    pub gap:      i32,
    pub origin_y: i32,
    pub stagger:  bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let g = LayoutGeometry::default();
        LayoutConfig {
            key_size: g.key_size,
            gap:      g.gap,
            origin_y: g.origin_y,
            stagger:  g.stagger,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub pinch_threshold_px: f32,
    pub click_cooldown_ms:  u64,
    /// Refuse a second click until the fingers open again.
    pub require_release:    bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        let p = GestureParams::default();
        GestureConfig {
            pinch_threshold_px: p.pinch_threshold,
            click_cooldown_ms:  p.cooldown.as_millis() as u64,
            require_release:    p.require_release,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub backend:        DetectorBackend,
    /// Interpreter used to launch the MediaPipe helper script.
    pub python:         String,
    /// Helper script path; a relative path is taken from the working
    /// directory.
    pub script:         String,
    pub min_confidence: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            backend:        DetectorBackend::default(),
            python:         "python3".to_string(),
            script:         DEFAULT_DETECTOR_SCRIPT.to_string(),
            min_confidence: 0.7,
        }
    }
}

/// Configuration for the full application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Start the logger at debug level.
    pub debug_logging: bool,
    pub display:       DisplayConfig,
    pub camera:        CameraConfig,
    pub layout:        LayoutConfig,
    pub gesture:       GestureConfig,
    pub detector:      DetectorConfig,
}

impl AppConfig {
    /// Load from a TOML file.  A missing or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Layout geometry; the centering width always follows the display.
    pub fn geometry(&self) -> LayoutGeometry {
        LayoutGeometry {
            key_size:     self.layout.key_size,
            gap:          self.layout.gap,
            screen_width: self.display.width as i32,
            origin_y:     self.layout.origin_y,
            stagger:      self.layout.stagger,
        }
    }

    pub fn gesture_params(&self) -> GestureParams {
        GestureParams {
            pinch_threshold: self.gesture.pinch_threshold_px,
            cooldown:        Duration::from_millis(self.gesture.click_cooldown_ms),
            require_release: self.gesture.require_release,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_core_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.geometry(), LayoutGeometry::default());
        assert_eq!(cfg.gesture_params(), GestureParams::default());
    }

    #[test]
    fn default_backend_follows_camera_feature() {
        let expected = if cfg!(feature = "camera") {
            DetectorBackend::Mediapipe
        } else {
            DetectorBackend::Simulated
        };
        assert_eq!(AppConfig::default().detector.backend, expected);
    }

    #[test]
    fn default_script_is_the_bundled_helper() {
        let script = AppConfig::default().detector.script;
        assert!(Path::new(&script).is_absolute());
        assert!(Path::new(&script).is_file(), "{} missing", script);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = AppConfig::from_toml("[gesture]\nclick_cooldown_ms = 250\n").unwrap();
        assert_eq!(cfg.gesture.click_cooldown_ms, 250);
        assert_eq!(cfg.gesture.pinch_threshold_px, 40.0);
        assert_eq!(cfg.gesture_params().cooldown, Duration::from_millis(250));
        assert_eq!(cfg.display, DisplayConfig::default());
    }

    #[test]
    fn screen_width_follows_display() {
        let cfg = AppConfig::from_toml("[display]\nwidth = 1920\n").unwrap();
        assert_eq!(cfg.geometry().screen_width, 1920);
    }

    #[test]
    fn backend_parses_lowercase() {
        let cfg = AppConfig::from_toml("[detector]\nbackend = \"mediapipe\"\n").unwrap();
        assert_eq!(cfg.detector.backend, DetectorBackend::Mediapipe);
        assert!(AppConfig::from_toml("[detector]\nbackend = \"opencv\"\n").is_err());
    }

    #[test]
    fn toml_round_trip() {
        let mut cfg = AppConfig::default();
        cfg.camera.mirror = false;
        cfg.layout.stagger = false;
        let back = AppConfig::from_toml(&cfg.to_toml().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debug_logging = true\n[camera]\nindex = 2").unwrap();
        let cfg = AppConfig::load(file.path()).unwrap();
        assert!(cfg.debug_logging);
        assert_eq!(cfg.camera.index, 2);
    }

    #[test]
    fn load_reports_path_on_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display\nwidth = ").unwrap();
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains(&file.path().display().to_string()));

        assert!(AppConfig::load(Path::new("/nonexistent/pinch.toml")).is_err());
    }
}

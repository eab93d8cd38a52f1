//! Configuration management for the gaze mouse and the booking flow

use crate::{
    booking::{BookingProfile, Variant},
    constants::{
        DEFAULT_BLINK_COOLDOWN_FRAMES, DEFAULT_BLINK_THRESHOLD, DEFAULT_CROP_EXPANSION, DEFAULT_DETECTION_CONFIDENCE,
        DEFAULT_NMS_THRESHOLD, DEFAULT_PRESENCE_THRESHOLD,
    },
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera and blink tracking
    pub tracker: TrackerConfig,

    /// Model files and detector thresholds
    pub models: ModelConfig,

    /// Booking flow profile; absent means the preset picked at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingProfile>,
}

/// Camera, preview and blink settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// OS camera index
    pub camera_index: i32,

    /// Flip frames horizontally before processing
    pub mirror: bool,

    /// Show the preview window
    pub show_preview: bool,

    /// Lid distance below which an eye counts as closed
    pub blink_threshold: f64,

    /// Frames an eye ignores blinks after a click
    pub blink_cooldown_frames: u32,
}

/// Model file paths and inference thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the SCRFD face detection ONNX model
    pub face_detector: PathBuf,

    /// Path to the 468-point face mesh ONNX model
    pub face_mesh: PathBuf,

    /// Minimum detector score (0.0-1.0)
    pub detection_confidence: f32,

    /// IOU threshold for non-maximum suppression (0.0-1.0)
    pub nms_threshold: f32,

    /// Fraction the face box grows by before the mesh crop
    pub crop_expansion: f32,

    /// Minimum face presence probability from the mesh model (0.0-1.0)
    pub presence_threshold: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            mirror: true,
            show_preview: true,
            blink_threshold: DEFAULT_BLINK_THRESHOLD,
            blink_cooldown_frames: DEFAULT_BLINK_COOLDOWN_FRAMES,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            face_detector: PathBuf::from("assets/face_detector.onnx"),
            face_mesh: PathBuf::from("assets/face_mesh.onnx"),
            detection_confidence: DEFAULT_DETECTION_CONFIDENCE,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            crop_expansion: DEFAULT_CROP_EXPANSION,
            presence_threshold: DEFAULT_PRESENCE_THRESHOLD,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `ConfigError` if it does not parse.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the text does not parse.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if serialization fails and `Io` if the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate value ranges. Model files are checked by [`Config::check_model_files`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if !(self.tracker.blink_threshold.is_finite() && self.tracker.blink_threshold > 0.0) {
            return Err(Error::ConfigError("Blink threshold must be greater than 0".to_string()));
        }
        if self.tracker.blink_cooldown_frames == 0 {
            return Err(Error::ConfigError("Blink cooldown must be at least 1 frame".to_string()));
        }
        if self.tracker.camera_index < 0 {
            return Err(Error::ConfigError("Camera index must not be negative".to_string()));
        }

        for (name, value) in [
            ("Detection confidence", self.models.detection_confidence),
            ("NMS threshold", self.models.nms_threshold),
            ("Presence threshold", self.models.presence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ConfigError(format!("{name} must be between 0.0 and 1.0")));
            }
        }
        if !(self.models.crop_expansion.is_finite() && self.models.crop_expansion >= 0.0) {
            return Err(Error::ConfigError("Crop expansion must not be negative".to_string()));
        }

        match &self.booking {
            Some(profile) => profile.validate(),
            None => Ok(()),
        }
    }

    /// Booking profile from the file's `booking` section, or the `variant` preset
    /// when the file has none
    #[must_use]
    pub fn booking_profile(&self, variant: Variant) -> BookingProfile {
        self.booking.clone().unwrap_or_else(|| BookingProfile::preset(variant))
    }

    /// Check that both model files exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` naming the first missing file.
    pub fn check_model_files(&self) -> Result<()> {
        for (name, path) in [
            ("Face detector", &self.models.face_detector),
            ("Face mesh", &self.models.face_mesh),
        ] {
            if !path.exists() {
                return Err(Error::ConfigError(format!("{name} model not found: {}", path.display())));
            }
        }
        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Blink Mouse Configuration

# Camera and blink tracking
tracker:
  camera_index: 0
  mirror: true
  show_preview: true
  blink_threshold: 0.004
  blink_cooldown_frames: 10

# Model paths and thresholds
models:
  face_detector: "assets/face_detector.onnx"
  face_mesh: "assets/face_mesh.onnx"
  detection_confidence: 0.5
  nms_threshold: 0.4
  crop_expansion: 0.25
  presence_threshold: 0.5

# Booking flow (classic preset). Without this section metro-booking uses --variant
booking:
  name: "Metro Ticket Booking"
  stations: ["Miyapur", "Kukatpally", "Ameerpet", "Hitec City", "LB Nagar"]
  fares:
    base: 45
    cab: 150
  payload_format: pipe
  payment:
    kind: simulated
    delay_ms: 2000
  id_prefix: "MTR"
  download_ticket: false
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.tracker.blink_cooldown_frames, 10);
        let booking = config.booking.unwrap();
        assert_eq!(booking.fares.base, 45);
        assert!(booking.serves("Hitec City"));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml("tracker:\n  camera_index: 2\n").unwrap();
        assert_eq!(config.tracker.camera_index, 2);
        assert!(config.tracker.mirror);
        assert_eq!(config.models, ModelConfig::default());
        assert_eq!(config.booking, None);
    }

    #[test]
    fn test_missing_booking_section_keeps_variant() {
        let config = Config::from_yaml("tracker:\n  camera_index: 1\n").unwrap();
        assert_eq!(config.booking_profile(Variant::Upi), BookingProfile::preset(Variant::Upi));
        assert_eq!(
            config.booking_profile(Variant::Express),
            BookingProfile::preset(Variant::Express)
        );
    }

    #[test]
    fn test_booking_section_overrides_variant() {
        let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        let profile = config.booking_profile(Variant::Upi);
        assert_eq!(profile.fares.base, 45);
        assert_eq!(profile.stations.len(), 5);
    }

    #[test]
    fn test_rejects_zero_cooldown() {
        let mut config = Config::default();
        config.tracker.blink_cooldown_frames = 0;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        let mut config = Config::default();
        for bad in [0.0, -0.1, f64::NAN] {
            config.tracker.blink_threshold = bad;
            assert!(config.validate().is_err(), "threshold {bad} accepted");
        }
    }

    #[test]
    fn test_missing_model_files() {
        let mut config = Config::default();
        config.models.face_mesh = PathBuf::from("/nonexistent/face_mesh.onnx");
        assert!(config.check_model_files().is_err());
    }

    #[test]
    fn test_bad_yaml() {
        assert!(matches!(Config::from_yaml("tracker: [1, 2"), Err(Error::ConfigError(_))));
    }
}

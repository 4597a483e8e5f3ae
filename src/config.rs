//! Configuration management for the head scroll application

use crate::{
    constants::{
        DEFAULT_ABSENCE_GRACE_SECS, DEFAULT_COOLDOWN_SECS, DEFAULT_COUNTDOWN_SECS, DEFAULT_MOVEMENT_THRESHOLD,
        DEFAULT_SCROLL_CLICKS,
    },
    gesture::SessionConfig,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gesture interpretation parameters
    pub gesture: GestureConfig,

    /// Model configuration
    pub models: ModelConfig,

    /// Face detection configuration
    pub face_detection: FaceDetectionConfig,

    /// Position smoothing configuration
    pub filter: FilterConfig,

    /// Display configuration
    pub display: DisplayConfig,

    /// Action dispatch configuration
    pub actions: ActionConfig,
}

/// Gesture parameters, durations in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Dead-zone half-width in pixel rows
    pub movement_threshold: f64,

    /// Minimum seconds between scroll actions
    pub cooldown_period: f64,

    /// Seconds of continuous absence before pausing
    pub absence_grace_period: f64,

    /// Seconds between first face sighting and baseline capture
    pub countdown_duration: f64,
}

/// Model file paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to face detection ONNX model
    pub face_detector: PathBuf,

    /// Path to facial landmarks ONNX model
    pub face_landmarks: PathBuf,
}

/// Face detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceDetectionConfig {
    /// Confidence threshold for face detection (0.0-1.0)
    pub confidence_threshold: f32,

    /// IOU threshold for non-maximum suppression (0.0-1.0)
    pub iou_threshold: f32,
}

/// Position smoothing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Filter spec, e.g. `none`, `median:5`, `exponential:0.5`
    pub position_filter: String,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// GUI mode (`cam` or `none`)
    pub gui_mode: String,

    /// Mirror the camera image horizontally
    pub mirror: bool,

    /// Show FPS counter
    pub show_fps: bool,
}

/// Action dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Dispatcher backend (`x11` or `log`)
    pub dispatcher: String,

    /// Wheel clicks per scroll intent
    pub scroll_clicks: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            movement_threshold: DEFAULT_MOVEMENT_THRESHOLD,
            cooldown_period: DEFAULT_COOLDOWN_SECS,
            absence_grace_period: DEFAULT_ABSENCE_GRACE_SECS,
            countdown_duration: DEFAULT_COUNTDOWN_SECS,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            face_detector: PathBuf::from("assets/face_detector.onnx"),
            face_landmarks: PathBuf::from("assets/face_landmarks.onnx"),
        }
    }
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            iou_threshold: 0.4,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            position_filter: "none".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            gui_mode: "cam".to_string(),
            mirror: false,
            show_fps: false,
        }
    }
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            dispatcher: "x11".to_string(),
            scroll_clicks: DEFAULT_SCROLL_CLICKS,
        }
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| Error::ConfigError(format!("{name} must be a finite, non-negative number of seconds, got {value}")))
}

impl GestureConfig {
    /// Convert to the engine's session configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold or any duration is negative or not finite.
    pub fn session_config(&self) -> Result<SessionConfig> {
        if !self.movement_threshold.is_finite() || self.movement_threshold < 0.0 {
            return Err(Error::ConfigError(format!(
                "Movement threshold must be a finite, non-negative number, got {}",
                self.movement_threshold
            )));
        }

        Ok(SessionConfig {
            movement_threshold: self.movement_threshold,
            cooldown_period: seconds("Cooldown period", self.cooldown_period)?,
            absence_grace_period: seconds("Absence grace period", self.absence_grace_period)?,
            countdown_duration: seconds("Countdown duration", self.countdown_duration)?,
        })
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate parameters that do not depend on the filesystem
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<()> {
        self.gesture.session_config()?;

        if !(0.0..=1.0).contains(&self.face_detection.confidence_threshold) {
            return Err(Error::ConfigError(
                "Confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.face_detection.iou_threshold) {
            return Err(Error::ConfigError(
                "IOU threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        crate::filters::create_filter(&self.filter.position_filter)
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        crate::app::GuiMode::parse(&self.display.gui_mode)?;
        crate::dispatch::DispatcherKind::parse(&self.actions.dispatcher)?;
        if self.actions.scroll_clicks == 0 {
            return Err(Error::ConfigError("Scroll clicks must be greater than 0".to_string()));
        }

        Ok(())
    }

    /// Check that the model files exist
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing model.
    pub fn validate_models(&self) -> Result<()> {
        if !self.models.face_detector.exists() {
            return Err(Error::ConfigError(format!(
                "Face detector model not found: {}",
                self.models.face_detector.display()
            )));
        }
        if !self.models.face_landmarks.exists() {
            return Err(Error::ConfigError(format!(
                "Face landmarks model not found: {}",
                self.models.face_landmarks.display()
            )));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Head Scroll Configuration

# Gesture interpretation (durations in seconds)
gesture:
  movement_threshold: 13.0
  cooldown_period: 1.5
  absence_grace_period: 5.0
  countdown_duration: 4.0

# Model paths
models:
  face_detector: "assets/face_detector.onnx"
  face_landmarks: "assets/face_landmarks.onnx"

# Face detection parameters
face_detection:
  confidence_threshold: 0.5
  iou_threshold: 0.4

# Nose position smoothing (none, moving_average:N, median:N, exponential:A, kalman)
filter:
  position_filter: "none"

# Display settings
display:
  gui_mode: "cam"
  mirror: false
  show_fps: false

# Actions performed for each intent
actions:
  dispatcher: "x11"
  scroll_clicks: 100
"#;

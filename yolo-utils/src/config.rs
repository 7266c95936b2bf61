//! Shared configuration types consumed across the detection workspace.
//!
//! These structures describe the model resources, inference input, detection
//! thresholds, and camera preferences the GUI reads once at startup.

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Paths to the model resources loaded before detection can run.
///
/// All three files are required; the font is optional and only affects
/// whether annotated frames carry text labels next to the boxes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelSettings {
    /// ONNX graph holding the pretrained network weights.
    pub weights_path: String,
    /// JSON sidecar describing input geometry and class count.
    pub config_path: String,
    /// Newline-delimited class label names.
    pub labels_path: String,
    /// Optional TrueType font used to draw label text on annotated frames.
    pub font_path: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            weights_path: "models/yolov3.onnx".to_string(),
            config_path: "models/yolov3.json".to_string(),
            labels_path: "models/coco.names".to_string(),
            font_path: None,
        }
    }
}

impl ModelSettings {
    /// Resolve the weights path against the executable directory or cwd.
    pub fn resolved_weights_path(&self) -> PathBuf {
        resolve_resource_path(&self.weights_path)
    }

    /// Resolve the network description path against the executable directory or cwd.
    pub fn resolved_config_path(&self) -> PathBuf {
        resolve_resource_path(&self.config_path)
    }

    /// Resolve the labels path against the executable directory or cwd.
    pub fn resolved_labels_path(&self) -> PathBuf {
        resolve_resource_path(&self.labels_path)
    }

    /// Resolve the optional font path against the executable directory or cwd.
    pub fn resolved_font_path(&self) -> Option<PathBuf> {
        self.font_path.as_ref().map(resolve_resource_path)
    }
}

/// Resize filter trade-off applied when scaling frames to the network input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResizeQuality {
    /// Preserve visual quality when resizing (default, Triangle filter).
    #[default]
    Quality,
    /// Prioritize throughput for realtime capture (Nearest filter).
    Speed,
}

impl ResizeQuality {
    pub fn as_label(self) -> &'static str {
        match self {
            ResizeQuality::Quality => "Quality",
            ResizeQuality::Speed => "Speed",
        }
    }
}

impl fmt::Display for ResizeQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ResizeQuality::Quality => "quality",
                ResizeQuality::Speed => "speed",
            }
        )
    }
}

impl FromStr for ResizeQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quality" => Ok(ResizeQuality::Quality),
            "speed" => Ok(ResizeQuality::Speed),
            other => Err(format!(
                "invalid resize quality '{other}'; expected 'quality' or 'speed'"
            )),
        }
    }
}

/// Network input resolution in pixels (width x height).
///
/// Frames are resized to these dimensions before inference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InputDimensions {
    pub width: u32,
    pub height: u32,
    /// Choose between quality-focused or speed-focused resizing.
    pub resize_quality: ResizeQuality,
}

impl Default for InputDimensions {
    fn default() -> Self {
        Self {
            width: 416,
            height: 416,
            resize_quality: ResizeQuality::Quality,
        }
    }
}

/// Detection post-processing parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionSettings {
    /// Minimum class confidence for a detection to be kept.
    /// Scores exactly at the threshold are rejected.
    pub confidence_threshold: f32,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
        }
    }
}

/// Capture device preferences for realtime detection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CameraSettings {
    /// Index of the capture device to open.
    pub device_index: u32,
    /// Requested capture width in pixels.
    pub width: u32,
    /// Requested capture height in pixels.
    pub height: u32,
    /// Target frames per second for the realtime loop.
    pub fps: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

/// Settings controlling optional runtime telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Whether telemetry timing logs are enabled.
    pub enabled: bool,
    /// Logging level for telemetry output (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "debug".to_string(),
        }
    }
}

impl TelemetrySettings {
    /// Resolve the configured level string into a `LevelFilter`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" | "warning" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Debug,
        }
    }
}

/// Application settings read once at startup.
///
/// The GUI never writes this file back; editing it by hand and restarting is
/// the supported way to change model paths or thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Model resource locations.
    pub model: ModelSettings,
    /// The input dimensions for network inference.
    pub input: InputDimensions,
    /// The parameters for detection post-processing.
    pub detection: DetectionSettings,
    /// Capture device preferences.
    pub camera: CameraSettings,
    /// Telemetry and diagnostics preferences.
    pub telemetry: TelemetrySettings,
}

impl AppSettings {
    /// Load settings from a JSON file.
    ///
    /// If the file does not exist or cannot be parsed, an error is returned.
    /// Missing fields fall back to their defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings: AppSettings = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings JSON at {}", path.display()))?;
        Ok(settings)
    }

    /// Serialize settings to disk in pretty-printed JSON.
    ///
    /// This will overwrite the file if it already exists.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let payload =
            serde_json::to_string_pretty(self).context("failed to serialize settings JSON")?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write settings file {}", path.display()))?;
        Ok(())
    }
}

/// Returns the default path for application settings (`config/detector.json`).
pub fn default_settings_path() -> PathBuf {
    env::current_dir()
        .map(|dir| dir.join("config/detector.json"))
        .unwrap_or_else(|_| PathBuf::from("config/detector.json"))
}

/// Resolve a possibly-relative resource path.
///
/// Relative paths are checked against the executable's directory first so a
/// packaged install finds its bundled resources; when no file exists there
/// the path is left relative to the working directory.
pub fn resolve_resource_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        return path.to_path_buf();
    }
    if let Ok(exe) = env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let candidate = dir.join(path);
        if candidate.exists() {
            return candidate;
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn default_settings_round_trip() {
        let file = NamedTempFile::new().expect("tempfile");
        let settings = AppSettings::default();
        settings.save_to_path(file.path()).expect("save");

        let loaded = AppSettings::load_from_path(file.path()).expect("load");
        assert_eq!(loaded.model, settings.model);
        assert_eq!(loaded.input, settings.input);
        assert_eq!(loaded.detection, settings.detection);
        assert_eq!(loaded.camera, settings.camera);
        assert_eq!(loaded.telemetry.enabled, settings.telemetry.enabled);
        assert_eq!(loaded.telemetry.level, settings.telemetry.level);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let file = NamedTempFile::new().expect("tempfile");
        let json = r#"{
            "model": { "weights_path": "custom/net.onnx" },
            "detection": { "confidence_threshold": 0.75 }
        }"#;
        fs::write(file.path(), json).expect("write custom settings");

        let loaded = AppSettings::load_from_path(file.path()).expect("load");
        assert_eq!(loaded.model.weights_path, "custom/net.onnx");
        assert_eq!(loaded.model.labels_path, "models/coco.names");
        assert_eq!(loaded.detection.confidence_threshold, 0.75);
        assert_eq!(
            loaded.input,
            InputDimensions {
                width: 416,
                height: 416,
                resize_quality: ResizeQuality::Quality,
            }
        );
        assert_eq!(loaded.camera, CameraSettings::default());
        assert!(!loaded.telemetry.enabled);
        assert_eq!(loaded.telemetry.level_filter(), LevelFilter::Debug);
    }

    #[test]
    fn unreadable_settings_file_is_an_error() {
        let missing = std::env::temp_dir().join("detector-settings-that-do-not-exist.json");
        assert!(AppSettings::load_from_path(&missing).is_err());
    }

    #[test]
    fn telemetry_level_parses_variants() {
        let telemetry = TelemetrySettings {
            level: "TRACE".into(),
            ..TelemetrySettings::default()
        };
        assert_eq!(telemetry.level_filter(), LevelFilter::Trace);

        let telemetry = TelemetrySettings {
            level: "Warn".into(),
            ..TelemetrySettings::default()
        };
        assert_eq!(telemetry.level_filter(), LevelFilter::Warn);
    }

    #[test]
    fn resize_quality_parses_labels() {
        assert_eq!(
            " Speed ".parse::<ResizeQuality>().unwrap(),
            ResizeQuality::Speed
        );
        assert!("cubic".parse::<ResizeQuality>().is_err());
        assert_eq!(ResizeQuality::Quality.as_label(), "Quality");
    }

    #[test]
    fn default_settings_path_points_at_config_dir() {
        let path = default_settings_path();
        assert!(path.ends_with("config/detector.json"));
    }

    #[test]
    fn absolute_resource_paths_pass_through() {
        let absolute = std::env::temp_dir().join("weights.onnx");
        assert_eq!(resolve_resource_path(&absolute), absolute);
    }
}

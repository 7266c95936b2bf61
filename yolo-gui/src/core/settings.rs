//! Settings loading for the GUI.
//!
//! The application reads its settings file once at startup and never writes
//! it back; editing the JSON by hand and restarting is the supported way to
//! change model paths or thresholds.

use log::warn;
use std::path::Path;
use yolo_utils::AppSettings;

/// Loads application settings from a file, or returns default settings if loading fails.
pub fn load_settings(path: &Path) -> AppSettings {
    match AppSettings::load_from_path(path) {
        Ok(settings) => settings,
        Err(err) => {
            warn!(
                "Failed to load settings from {}: {err:?}. Falling back to defaults.",
                path.display()
            );
            AppSettings::default()
        }
    }
}

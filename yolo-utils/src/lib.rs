//! Common helpers shared across the YOLO detection crates.

/// Application configuration loaded at startup.
pub mod config;
/// Append-only error log written next to the executable.
pub mod error_log;
/// Test fixtures: synthetic images and scripted capture devices.
pub mod fixtures;
/// Image loading, resizing, and tensor conversion.
pub mod image_utils;
/// Instrumentation helpers for optional performance tracing.
pub mod telemetry;
/// Camera capture behind small capability traits.
pub mod webcam;

use anyhow::Result;
use log::LevelFilter;

pub use config::{
    AppSettings, CameraSettings, DetectionSettings, InputDimensions, ModelSettings, ResizeQuality,
    TelemetrySettings, default_settings_path, resolve_resource_path,
};
pub use error_log::{append_error_log, default_error_log_path};
pub use fixtures::{CountingCameraProvider, solid_rgb_image};
pub use image_utils::{ImageLoadError, load_image, resize_image, rgb_to_chw};
pub use telemetry::{
    TimingGuard, configure as configure_telemetry, telemetry_allows, telemetry_enabled,
    telemetry_level, timing_guard, timing_guard_if,
};
pub use webcam::{CameraError, CameraProvider, FrameSource, NokhwaProvider};

/// Initialize logging once for the GUI process.
///
/// This function respects the `RUST_LOG` environment variable if it is set.
/// Otherwise, it falls back to the provided default filter level.
///
/// # Arguments
///
/// * `default_filter` - The `LevelFilter` to use if `RUST_LOG` is not set.
pub fn init_logging(default_filter: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    builder.filter_module("yolo::telemetry", LevelFilter::Trace);

    if builder.try_init().is_err() {
        // Logger already initialized; nothing to do.
    }
    Ok(())
}

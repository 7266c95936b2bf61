//! Desktop GUI for YOLO object detection.
//!
//! The application wraps [`yolo_core`] in an `eframe` window: still images
//! are annotated on a worker thread, the realtime tab streams annotated
//! webcam frames, and every failure funnels through one presentation
//! boundary (log, error log file, modal dialog).

/// Application state machine and `eframe` integration.
pub mod app;
/// Detection jobs, capture loop, settings loading.
pub mod core;
/// Color palette and style.
pub mod theme;
/// Shared state types.
pub mod types;
/// Panel rendering.
pub mod ui;

pub use types::*;

//! Desktop GUI for YOLO object detection.

use eframe::NativeOptions;
use yolo_gui::YoloApp;
use yolo_utils::init_logging;

/// Main entry point for the GUI application.
fn main() -> eframe::Result<()> {
    init_logging(log::LevelFilter::Info).expect("failed to initialize logging");
    let mut options = NativeOptions::default();

    // Set initial window size to avoid scrunched UI on first launch
    options.viewport = options.viewport.with_inner_size([960.0, 640.0]);

    eframe::run_native(
        "Object Detection",
        options,
        Box::new(|cc| Ok(Box::new(YoloApp::new(cc)))),
    )
}

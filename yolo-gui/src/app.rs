//! Application state machine and the `eframe` update loop.

use std::{
    path::PathBuf,
    sync::{Arc, mpsc},
    time::{Duration, Instant},
};

use egui::{Context as EguiContext, Key, TextureOptions, ViewportCommand};
use log::info;
use yolo_utils::{
    NokhwaProvider, append_error_log, configure_telemetry, default_error_log_path,
    default_settings_path,
};

use crate::core::detection::{spawn_detector_load, start_image_job};
use crate::core::settings::load_settings;
use crate::{
    ActiveTab, AppPhase, ErrorKind, ErrorReport, ImageJobSuccess, JobMessage, PreviewState,
    RealtimeState, SPLASH_DURATION, YoloApp, theme,
};

impl YoloApp {
    /// Creates the application for a real `eframe` window.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        Self::create(&cc.egui_ctx, default_settings_path())
    }

    /// Builds the application against a specific settings file.
    ///
    /// The detector starts loading on a worker thread immediately; the
    /// window shows the splash screen until the load resolves.
    pub fn create(ctx: &EguiContext, settings_path: PathBuf) -> Self {
        theme::apply(ctx);

        info!("Loading settings from {}", settings_path.display());
        let settings = load_settings(&settings_path);
        configure_telemetry(settings.telemetry.enabled, settings.telemetry.level_filter());

        let (job_tx, job_rx) = mpsc::channel();
        spawn_detector_load(&settings, job_tx.clone());

        Self {
            settings,
            settings_path,
            error_log_path: default_error_log_path(),
            phase: AppPhase::Splash {
                since: Instant::now(),
            },
            active_tab: ActiveTab::default(),
            status_line: "Loading model...".to_string(),
            last_error: None,
            detector: None,
            detector_failed: false,
            camera_provider: Arc::new(NokhwaProvider),
            job_tx,
            job_rx,
            preview: PreviewState::default(),
            realtime: RealtimeState::default(),
            unsaved_changes: false,
            is_busy: false,
            texture_seq: 0,
            job_counter: 0,
            current_job: None,
            show_about: false,
            show_close_confirm: false,
            close_allowed: false,
        }
    }

    /// Builds an app instance for tests, without an `eframe` window.
    ///
    /// Settings fall back to defaults and the error log is redirected to the
    /// system temp directory.
    pub fn test_instance() -> Self {
        let ctx = EguiContext::default();
        let mut app = Self::create(
            &ctx,
            std::env::temp_dir().join("yolo-gui-test-settings-missing.json"),
        );
        app.error_log_path = std::env::temp_dir().join("yolo-gui-test-error.log");
        app
    }

    /// Update the status line after a successful operation.
    pub fn show_success(&mut self, message: impl Into<String>) {
        self.status_line = message.into();
        self.last_error = None;
    }

    /// Log a failure, append it to the error log, and queue the modal dialog.
    ///
    /// Every recoverable failure in the application funnels through here, so
    /// the log format and dialog wiring live in one place.
    pub fn present_error(&mut self, kind: ErrorKind, detail: impl Into<String>) {
        let detail = detail.into();
        log::error!("{}: {detail}", kind.dialog_title());
        append_error_log(&self.error_log_path, kind.dialog_title(), &detail);
        self.status_line = kind.dialog_title().to_string();
        self.last_error = Some(ErrorReport { kind, detail });
    }

    /// Dismiss the error dialog; returns true when the app must now close.
    pub fn acknowledge_error(&mut self) -> bool {
        match self.last_error.take() {
            Some(report) if report.kind.is_fatal() => {
                self.close_allowed = true;
                true
            }
            _ => false,
        }
    }

    /// Ask for an image file and start detection on it.
    pub fn open_image_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "webp"])
            .pick_file()
        else {
            return;
        };
        self.start_image_detection(path);
    }

    /// Launch a background detection job for an image path.
    pub fn start_image_detection(&mut self, path: PathBuf) {
        let Some(detector) = self.detector.clone() else {
            return;
        };

        self.preview.begin_loading(path.clone());
        self.is_busy = true;
        self.job_counter += 1;
        let job_id = self.job_counter;
        self.current_job = Some(job_id);
        self.status_line = format!("Detecting objects in {}...", path.display());

        start_image_job(path, detector, job_id, self.job_tx.clone());
    }

    /// Drain pending worker messages and repaint if anything changed.
    pub fn poll_worker(&mut self, ctx: &EguiContext) {
        let mut updated = false;
        while let Ok(message) = self.job_rx.try_recv() {
            self.handle_job_message(ctx, message);
            updated = true;
        }
        if updated {
            ctx.request_repaint();
        }
    }

    /// Apply one worker message to the application state.
    pub fn handle_job_message(&mut self, ctx: &EguiContext, message: JobMessage) {
        match message {
            JobMessage::DetectorReady(detector) => {
                info!("Detector ready with {} classes", detector.labels().len());
                self.detector = Some(detector);
                self.show_success("Model ready. Open an image or start real-time detection.");
            }
            JobMessage::DetectorFailed { detail } => {
                self.detector_failed = true;
                self.present_error(ErrorKind::ModelLoad, detail);
            }
            JobMessage::ImageFinished { job_id, data } => {
                self.finish_image_job(ctx, job_id, data);
            }
            JobMessage::ImageFailed { job_id, report } => {
                if Some(job_id) != self.current_job {
                    info!("Ignoring stale detection failure for job {job_id}");
                    return;
                }
                self.current_job = None;
                self.is_busy = false;
                self.preview.is_loading = false;
                self.present_error(report.kind, report.detail);
            }
            JobMessage::RealtimeFrame {
                frame,
                detections,
                summary,
                frame_number,
            } => {
                self.process_realtime_frame(ctx, frame, detections, summary, frame_number);
            }
            JobMessage::RealtimeDetectionFailed {
                frame_number,
                detail,
            } => {
                self.report_realtime_detection_failure(frame_number, &detail);
            }
            JobMessage::RealtimeError(detail) => {
                self.present_error(ErrorKind::Camera, detail);
            }
            JobMessage::RealtimeStopped => {
                self.handle_realtime_stopped();
            }
        }
    }

    fn finish_image_job(&mut self, ctx: &EguiContext, job_id: u64, data: ImageJobSuccess) {
        if Some(job_id) != self.current_job {
            info!("Ignoring stale detection result for {}", data.path.display());
            return;
        }
        self.current_job = None;
        self.is_busy = false;

        let ImageJobSuccess {
            path,
            color_image,
            detections,
            summary,
            original_size,
        } = data;

        let texture_name = format!("image-preview-{}", self.texture_seq);
        self.texture_seq = self.texture_seq.wrapping_add(1);
        let texture = ctx.load_texture(texture_name, color_image, TextureOptions::LINEAR);

        self.preview.is_loading = false;
        self.preview.image_path = Some(path.clone());
        self.preview.texture = Some(texture);
        self.preview.image_size = Some(original_size);
        self.preview.detections = detections;
        self.preview.summary = summary;
        self.unsaved_changes = true;
        self.active_tab = ActiveTab::ImageDetection;

        self.show_success(format!(
            "Detected {} object(s) in {}",
            self.preview.detections.len(),
            path.display()
        ));
    }

    /// Move from the splash screen to the workspace once both the timer and
    /// the model load have resolved.
    pub fn advance_phase(&mut self) {
        if let AppPhase::Splash { since } = self.phase
            && since.elapsed() >= SPLASH_DURATION
            && (self.detector.is_some() || self.detector_failed)
        {
            self.phase = AppPhase::Ready;
        }
    }

    /// True when a close request must be intercepted for confirmation.
    pub fn should_confirm_close(&self) -> bool {
        self.unsaved_changes && !self.close_allowed
    }

    /// Let the pending close proceed, discarding unsaved results.
    pub fn confirm_exit(&mut self) {
        self.show_close_confirm = false;
        self.close_allowed = true;
    }

    /// Keep the window open; unsaved results stay marked.
    pub fn cancel_exit(&mut self) {
        self.show_close_confirm = false;
    }

    fn handle_close_request(&mut self, ctx: &EguiContext) {
        if !ctx.input(|i| i.viewport().close_requested()) {
            return;
        }
        if self.should_confirm_close() {
            ctx.send_viewport_cmd(ViewportCommand::CancelClose);
            self.show_close_confirm = true;
        } else {
            // Closing for real; release the camera before the window goes.
            self.stop_realtime();
        }
    }

    fn handle_shortcuts(&mut self, ctx: &EguiContext) {
        if ctx.input(|i| i.key_pressed(Key::Escape)) && self.realtime.is_running() {
            self.stop_realtime();
        }
    }
}

impl eframe::App for YoloApp {
    fn update(&mut self, ctx: &EguiContext, _frame: &mut eframe::Frame) {
        self.poll_worker(ctx);
        self.advance_phase();

        if matches!(self.phase, AppPhase::Splash { .. }) {
            self.show_splash(ctx);
            // A fatal model load failure surfaces here as well.
            self.show_dialogs(ctx);
            self.handle_close_request(ctx);
            ctx.request_repaint_after(Duration::from_millis(100));
            return;
        }

        self.handle_shortcuts(ctx);
        self.show_menu_bar(ctx);
        self.show_toolbar(ctx);
        self.show_status_bar(ctx);
        self.show_central_panel(ctx);
        self.show_dialogs(ctx);
        self.handle_close_request(ctx);

        if self.is_busy || self.realtime.is_running() {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_dialog_strings() {
        assert_eq!(ErrorKind::ModelLoad.dialog_title(), "Model Load Error");
        assert_eq!(ErrorKind::ImageDecode.dialog_title(), "Image Error");
        assert_eq!(ErrorKind::Camera.dialog_title(), "Camera Error");
        assert_eq!(ErrorKind::Inference.dialog_title(), "Detection Error");

        assert!(ErrorKind::ModelLoad.is_fatal());
        assert!(!ErrorKind::ImageDecode.is_fatal());
        assert!(!ErrorKind::Camera.is_fatal());
        assert!(!ErrorKind::Inference.is_fatal());
    }

    #[test]
    fn splash_waits_for_model_resolution() {
        let mut app = YoloApp::test_instance();
        app.phase = AppPhase::Splash {
            since: Instant::now() - Duration::from_secs(5),
        };

        // Timer satisfied, load still unresolved.
        app.advance_phase();
        assert!(matches!(app.phase, AppPhase::Splash { .. }));

        app.detector_failed = true;
        app.advance_phase();
        assert_eq!(app.phase, AppPhase::Ready);
    }

    #[test]
    fn splash_holds_until_timer_elapses() {
        let mut app = YoloApp::test_instance();
        app.detector_failed = true;
        app.phase = AppPhase::Splash {
            since: Instant::now(),
        };

        app.advance_phase();
        assert!(matches!(app.phase, AppPhase::Splash { .. }));
    }

    #[test]
    fn close_confirmation_depends_on_unsaved_work() {
        let mut app = YoloApp::test_instance();
        assert!(!app.should_confirm_close());

        app.unsaved_changes = true;
        assert!(app.should_confirm_close());

        app.confirm_exit();
        assert!(!app.should_confirm_close());
        assert!(app.close_allowed);
    }

    #[test]
    fn cancelling_exit_keeps_unsaved_state() {
        let mut app = YoloApp::test_instance();
        app.unsaved_changes = true;
        app.show_close_confirm = true;

        app.cancel_exit();
        assert!(!app.show_close_confirm);
        assert!(app.unsaved_changes);
        assert!(app.should_confirm_close());
    }

    #[test]
    fn fatal_error_acknowledgement_allows_close() {
        let mut app = YoloApp::test_instance();

        app.present_error(ErrorKind::ModelLoad, "weights missing");
        assert!(app.acknowledge_error());
        assert!(app.close_allowed);
        assert!(app.last_error.is_none());
    }

    #[test]
    fn camera_error_acknowledgement_keeps_app_open() {
        let mut app = YoloApp::test_instance();

        app.present_error(ErrorKind::Camera, "Could not open webcam.");
        assert_eq!(app.status_line, "Camera Error");
        assert!(!app.acknowledge_error());
        assert!(!app.close_allowed);
        assert!(app.last_error.is_none());
    }
}

//! Realtime webcam capture and detection.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
    time::Duration,
};

use egui::Context as EguiContext;
use image::RgbImage;
use log::{error, info, warn};
use yolo_core::{Detection, YoloDetector};
use yolo_utils::{CameraProvider, CameraSettings, append_error_log};

use crate::core::detection::detector_error_report;
use crate::ui::load_texture_from_rgb;
use crate::{ActiveTab, ErrorKind, JobMessage, RealtimeStatus, YoloApp};

impl YoloApp {
    /// Start realtime capture in a background thread.
    pub fn start_realtime(&mut self) {
        if !matches!(self.realtime.status, RealtimeStatus::Inactive) {
            return;
        }
        let Some(detector) = self.detector.clone() else {
            return;
        };

        info!(
            "Starting realtime detection: device={}, {}x{} @ {} fps",
            self.settings.camera.device_index,
            self.settings.camera.width,
            self.settings.camera.height,
            self.settings.camera.fps
        );

        self.realtime.status = RealtimeStatus::Starting;
        self.realtime.summary.clear();
        self.realtime.frames_captured = 0;
        self.realtime.last_detection_count = 0;

        let stop_flag = Arc::new(AtomicBool::new(false));
        self.realtime.stop_flag = Some(stop_flag.clone());

        let provider = self.camera_provider.clone();
        let camera = self.settings.camera;
        let job_tx = self.job_tx.clone();

        thread::spawn(move || {
            run_realtime_loop(provider, camera, detector, job_tx, stop_flag);
        });

        self.active_tab = ActiveTab::RealtimeDetection;
        self.show_success("Starting real-time detection...");
    }

    /// Signal the capture thread to stop.
    ///
    /// The thread exits on its next iteration; [`JobMessage::RealtimeStopped`]
    /// confirms the camera has been released.
    pub fn stop_realtime(&mut self) {
        if matches!(self.realtime.status, RealtimeStatus::Inactive) {
            return;
        }

        info!("Stopping realtime detection");
        self.realtime.status = RealtimeStatus::Stopping;
        if let Some(flag) = &self.realtime.stop_flag {
            flag.store(true, Ordering::Relaxed);
        }
    }

    /// Show a frame delivered by the capture thread.
    pub fn process_realtime_frame(
        &mut self,
        ctx: &EguiContext,
        frame: RgbImage,
        detections: Vec<Detection>,
        summary: String,
        frame_number: u32,
    ) {
        // In-flight frames delivered after a stop request keep the pane
        // updated but must not revive the session state.
        if self.realtime.is_running() {
            self.realtime.status = RealtimeStatus::Active;
        }
        self.realtime.frames_captured = frame_number;
        self.realtime.last_detection_count = detections.len();
        self.realtime.texture = Some(load_texture_from_rgb(
            ctx,
            "realtime-frame",
            &frame,
            &mut self.texture_seq,
        ));
        self.realtime.summary = summary;
        // Every detection pass that reaches the screen counts as unsaved work.
        self.unsaved_changes = true;
    }

    /// Record a per-frame detection failure without interrupting the stream.
    pub fn report_realtime_detection_failure(&mut self, frame_number: u32, detail: &str) {
        append_error_log(
            &self.error_log_path,
            ErrorKind::Inference.dialog_title(),
            detail,
        );
        self.status_line = format!("Detection failed on frame {frame_number}");
    }

    /// Reset state once the capture thread has exited.
    pub fn handle_realtime_stopped(&mut self) {
        info!("Realtime capture stopped");
        self.realtime.status = RealtimeStatus::Inactive;
        self.realtime.stop_flag = None;
        if self.last_error.is_none() {
            self.status_line = "Real-time detection stopped.".to_string();
        }
    }
}

/// Run the capture loop until stopped, the stream ends, or the camera fails.
///
/// [`JobMessage::RealtimeStopped`] is sent on every exit path, after the
/// capture device has been released.
pub fn run_realtime_loop(
    provider: Arc<dyn CameraProvider>,
    camera: CameraSettings,
    detector: Arc<YoloDetector>,
    job_tx: mpsc::Sender<JobMessage>,
    stop_flag: Arc<AtomicBool>,
) {
    capture_frames(provider.as_ref(), &camera, &detector, &job_tx, &stop_flag);
    let _ = job_tx.send(JobMessage::RealtimeStopped);
}

fn capture_frames(
    provider: &dyn CameraProvider,
    camera: &CameraSettings,
    detector: &YoloDetector,
    job_tx: &mpsc::Sender<JobMessage>,
    stop_flag: &AtomicBool,
) {
    let mut source = match provider.open(camera) {
        Ok(source) => source,
        Err(err) => {
            error!("Camera open failed: {err}");
            let _ = job_tx.send(JobMessage::RealtimeError(
                "Could not open webcam.".to_string(),
            ));
            return;
        }
    };

    let (width, height) = source.resolution();
    info!(
        "Camera {} capturing at {}x{} for realtime detection",
        camera.device_index, width, height
    );

    let frame_duration = Duration::from_millis(1000 / u64::from(camera.fps.max(1)));
    let mut frame_number = 0u32;

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            info!("Stop signal received, ending realtime capture");
            break;
        }

        let frame = match source.read_frame() {
            Ok(frame) => frame,
            Err(err) => {
                warn!("Frame capture ended the realtime loop: {err}");
                break;
            }
        };

        frame_number += 1;

        let message = match detector.detect(&frame) {
            Ok(output) => JobMessage::RealtimeFrame {
                frame: output.annotated,
                detections: output.detections,
                summary: output.summary,
                frame_number,
            },
            Err(err) => {
                warn!("Detection failed on frame {frame_number}: {err}");
                let detail = detector_error_report(err).detail;
                let report = JobMessage::RealtimeDetectionFailed {
                    frame_number,
                    detail,
                };
                if job_tx.send(report).is_err() {
                    break;
                }
                // The raw frame stands in for the annotated one.
                JobMessage::RealtimeFrame {
                    frame,
                    detections: Vec::new(),
                    summary: String::new(),
                    frame_number,
                }
            }
        };

        if job_tx.send(message).is_err() {
            warn!("GUI dropped realtime frames, ending capture");
            break;
        }

        thread::sleep(frame_duration);
    }

    // Dropping the source releases the camera on every exit path.
}

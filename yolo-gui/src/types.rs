//! Application state types shared across the GUI modules.

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::AtomicBool,
        mpsc::{Receiver, Sender},
    },
    time::{Duration, Instant},
};

use egui::TextureHandle;
use image::RgbImage;
use yolo_core::{Detection, YoloDetector};
use yolo_utils::{AppSettings, CameraProvider};

/// How long the splash screen stays up before the main window may appear.
pub const SPLASH_DURATION: Duration = Duration::from_millis(1500);

/// Lifecycle phase of the application window.
///
/// The window starts in `Splash` and moves to `Ready` once the splash has
/// been shown for [`SPLASH_DURATION`] and the background model load has
/// resolved either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    Splash { since: Instant },
    Ready,
}

/// Which workspace tab is active in the central panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTab {
    #[default]
    ImageDetection,
    RealtimeDetection,
}

/// Category of a user-facing failure.
///
/// The category decides the dialog title, the lead line above the detail
/// text, and whether acknowledging the dialog terminates the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ModelLoad,
    ImageDecode,
    Camera,
    Inference,
}

impl ErrorKind {
    /// Dialog title, also used as the category tag in the error log.
    pub fn dialog_title(self) -> &'static str {
        match self {
            ErrorKind::ModelLoad => "Model Load Error",
            ErrorKind::ImageDecode => "Image Error",
            ErrorKind::Camera => "Camera Error",
            ErrorKind::Inference => "Detection Error",
        }
    }

    /// First line of the dialog body, shown above the failure detail.
    pub fn dialog_lead(self) -> &'static str {
        match self {
            ErrorKind::ModelLoad => "Could not load model files:",
            ErrorKind::ImageDecode => "Could not open/process the image:",
            ErrorKind::Camera => "Real-time detection failed:",
            ErrorKind::Inference => "Detection failed:",
        }
    }

    /// True when the application cannot continue after this failure.
    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::ModelLoad)
    }
}

/// A failure queued for the modal error dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub detail: String,
}

/// Result payload of a finished image detection job.
#[derive(Clone)]
pub struct ImageJobSuccess {
    /// Source image path, echoed back for the status line.
    pub path: PathBuf,
    /// Annotated frame converted for texture upload on the UI thread.
    pub color_image: egui::ColorImage,
    pub detections: Vec<Detection>,
    pub summary: String,
    /// Dimensions of the original image in pixels.
    pub original_size: (u32, u32),
}

/// Messages sent from background jobs back to the UI thread.
pub enum JobMessage {
    /// The detector finished loading during the splash phase.
    DetectorReady(Arc<YoloDetector>),
    /// The detector could not be loaded; the application must shut down.
    DetectorFailed { detail: String },
    /// An image detection job finished.
    ImageFinished { job_id: u64, data: ImageJobSuccess },
    /// An image detection job failed.
    ImageFailed { job_id: u64, report: ErrorReport },
    /// The realtime loop produced a frame (annotated, or raw after a
    /// per-frame detection failure).
    RealtimeFrame {
        frame: RgbImage,
        detections: Vec<Detection>,
        summary: String,
        frame_number: u32,
    },
    /// Detection failed on one realtime frame; the stream continues.
    RealtimeDetectionFailed { frame_number: u32, detail: String },
    /// The realtime loop could not start or aborted with a camera failure.
    RealtimeError(String),
    /// The realtime loop has exited and released the camera.
    RealtimeStopped,
}

/// State of the still-image preview pane.
#[derive(Default)]
pub struct PreviewState {
    /// Path of the image currently shown (or being processed).
    pub image_path: Option<PathBuf>,
    /// Uploaded texture of the annotated image.
    pub texture: Option<TextureHandle>,
    /// Original image dimensions in pixels.
    pub image_size: Option<(u32, u32)>,
    pub detections: Vec<Detection>,
    /// Summary text listing detected objects with confidences.
    pub summary: String,
    /// True while a detection job for `image_path` is in flight.
    pub is_loading: bool,
}

impl PreviewState {
    /// Reset the pane for a new image and mark it loading.
    pub fn begin_loading(&mut self, path: PathBuf) {
        self.image_path = Some(path);
        self.texture = None;
        self.image_size = None;
        self.detections.clear();
        self.summary.clear();
        self.is_loading = true;
    }
}

/// Lifecycle of the realtime capture thread as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RealtimeStatus {
    #[default]
    Inactive,
    /// Thread spawned, camera not confirmed yet.
    Starting,
    /// Frames are arriving.
    Active,
    /// Stop requested, waiting for the loop to exit.
    Stopping,
}

/// State of the realtime detection pane.
#[derive(Default)]
pub struct RealtimeState {
    pub status: RealtimeStatus,
    /// Cancellation flag shared with the capture thread.
    pub stop_flag: Option<Arc<AtomicBool>>,
    /// Latest frame uploaded as a texture.
    pub texture: Option<TextureHandle>,
    /// Summary text for the latest frame.
    pub summary: String,
    /// Number of frames received in the current session.
    pub frames_captured: u32,
    /// Detection count of the latest frame.
    pub last_detection_count: usize,
}

impl RealtimeState {
    /// True while the capture thread is (or may be) producing frames.
    pub fn is_running(&self) -> bool {
        matches!(self.status, RealtimeStatus::Starting | RealtimeStatus::Active)
    }
}

/// Top-level application state driving the `eframe` window.
pub struct YoloApp {
    /// Settings loaded once at startup; never written back.
    pub settings: AppSettings,
    /// Path the settings were loaded from.
    pub settings_path: PathBuf,
    /// Where [`YoloApp::present_error`] appends error log entries.
    pub error_log_path: PathBuf,
    /// Splash/ready lifecycle phase.
    pub phase: AppPhase,
    /// Active central-panel tab.
    pub active_tab: ActiveTab,
    /// One-line status shown in the bottom bar.
    pub status_line: String,
    /// Failure awaiting acknowledgement in the modal error dialog.
    pub last_error: Option<ErrorReport>,
    /// Loaded detector; `None` until the background load resolves.
    pub detector: Option<Arc<YoloDetector>>,
    /// Set when the background load failed; the app shuts down on
    /// acknowledgement of the fatal dialog.
    pub detector_failed: bool,
    /// Capture device factory; swapped for a scripted one in tests.
    pub camera_provider: Arc<dyn CameraProvider>,
    /// Sender handed to background jobs.
    pub job_tx: Sender<JobMessage>,
    /// Receiver polled once per frame on the UI thread.
    pub job_rx: Receiver<JobMessage>,
    /// Still-image pane state.
    pub preview: PreviewState,
    /// Realtime pane state.
    pub realtime: RealtimeState,
    /// True once any detection result has been shown and not saved.
    pub unsaved_changes: bool,
    /// True while an image detection job is in flight.
    pub is_busy: bool,
    /// Monotonic counter for unique texture names.
    pub texture_seq: u64,
    /// Monotonic counter assigning image job ids.
    pub job_counter: u64,
    /// Id of the image job whose result is still wanted.
    pub current_job: Option<u64>,
    /// About window visibility.
    pub show_about: bool,
    /// Unsaved-changes confirmation dialog visibility.
    pub show_close_confirm: bool,
    /// Latch letting the next close request pass without confirmation.
    pub close_allowed: bool,
}

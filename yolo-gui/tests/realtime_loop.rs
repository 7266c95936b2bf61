use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
    time::{Duration, Instant},
};

use image::Rgb;
use tract_onnx::prelude::Tensor;
use yolo_core::{ClassLabels, InferenceBackend, PostprocessConfig, PreprocessConfig, YoloDetector};
use yolo_gui::core::realtime::run_realtime_loop;
use yolo_gui::{ActiveTab, JobMessage, RealtimeStatus, YoloApp};
use yolo_utils::{CameraSettings, CountingCameraProvider, solid_rgb_image};

// Three-class rows: [cx, cy, w, h, objectness, c0, c1, c2].
const COLS: usize = 8;

#[derive(Debug)]
struct ScriptedBackend {
    tensor: Tensor,
}

impl ScriptedBackend {
    fn from_rows(rows: &[[f32; COLS]]) -> Self {
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        Self {
            tensor: Tensor::from_shape(&[rows.len(), COLS], &flat).unwrap(),
        }
    }
}

impl InferenceBackend for ScriptedBackend {
    fn infer(&self, _input: Tensor) -> anyhow::Result<Vec<Tensor>> {
        Ok(vec![self.tensor.clone()])
    }
}

#[derive(Debug)]
struct FailingBackend;

impl InferenceBackend for FailingBackend {
    fn infer(&self, _input: Tensor) -> anyhow::Result<Vec<Tensor>> {
        Err(anyhow::anyhow!("scripted inference failure"))
    }
}

fn detector_with(backend: Arc<dyn InferenceBackend>) -> Arc<YoloDetector> {
    Arc::new(YoloDetector::with_backend(
        backend,
        ClassLabels::from_names(["person", "bicycle", "car"]),
        PreprocessConfig::default(),
        PostprocessConfig {
            confidence_threshold: 0.5,
            class_count: 3,
        },
    ))
}

fn one_car_detector() -> Arc<YoloDetector> {
    detector_with(Arc::new(ScriptedBackend::from_rows(&[[
        0.5, 0.5, 0.2, 0.2, 1.0, 0.0, 0.0, 0.9,
    ]])))
}

fn silent_detector() -> Arc<YoloDetector> {
    detector_with(Arc::new(ScriptedBackend::from_rows(&[])))
}

// High fps keeps the inter-frame sleep at one millisecond.
fn fast_camera() -> CameraSettings {
    CameraSettings {
        fps: 1000,
        ..CameraSettings::default()
    }
}

fn unset_stop_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

#[test]
fn frames_flow_until_stream_ends() {
    let provider = Arc::new(CountingCameraProvider::new(
        solid_rgb_image(64, 48, [8, 8, 8]),
        3,
    ));
    let (tx, rx) = mpsc::channel();

    run_realtime_loop(
        provider.clone(),
        fast_camera(),
        one_car_detector(),
        tx,
        unset_stop_flag(),
    );

    let messages: Vec<JobMessage> = rx.try_iter().collect();
    assert_eq!(messages.len(), 4);
    for (index, message) in messages.iter().take(3).enumerate() {
        match message {
            JobMessage::RealtimeFrame {
                frame,
                detections,
                summary,
                frame_number,
            } => {
                assert_eq!(*frame_number, index as u32 + 1);
                assert_eq!(detections.len(), 1);
                assert_eq!(summary, "Detected Objects:\ncar: 0.90\n");
                // Top-left box corner proves the annotated copy was sent.
                assert_eq!(*frame.get_pixel(26, 19), Rgb([0, 255, 0]));
            }
            _ => panic!("expected an annotated frame"),
        }
    }
    assert!(matches!(messages[3], JobMessage::RealtimeStopped));
    assert!(provider.all_released());
}

#[test]
fn stop_flag_ends_loop_and_releases_camera() {
    let provider = Arc::new(CountingCameraProvider::new(
        solid_rgb_image(64, 48, [8, 8, 8]),
        usize::MAX,
    ));
    let (tx, rx) = mpsc::channel();
    let stop_flag = unset_stop_flag();

    let thread_provider = provider.clone();
    let thread_flag = stop_flag.clone();
    let handle = thread::spawn(move || {
        run_realtime_loop(
            thread_provider,
            fast_camera(),
            silent_detector(),
            tx,
            thread_flag,
        );
    });

    // The first frame proves the loop is running before we stop it.
    let first = rx.recv_timeout(Duration::from_secs(10)).expect("first frame");
    assert!(matches!(first, JobMessage::RealtimeFrame { .. }));

    stop_flag.store(true, Ordering::Relaxed);
    handle.join().expect("capture thread");

    let remaining: Vec<JobMessage> = rx.try_iter().collect();
    assert!(matches!(remaining.last(), Some(JobMessage::RealtimeStopped)));
    assert!(provider.all_released());
}

#[test]
fn refused_open_reports_camera_error() {
    let provider = Arc::new(CountingCameraProvider::new(
        solid_rgb_image(64, 48, [0, 0, 0]),
        1,
    ));
    provider.set_refuse_open(true);
    let (tx, rx) = mpsc::channel();

    run_realtime_loop(
        provider.clone(),
        fast_camera(),
        silent_detector(),
        tx,
        unset_stop_flag(),
    );

    let messages: Vec<JobMessage> = rx.try_iter().collect();
    assert_eq!(messages.len(), 2);
    match &messages[0] {
        JobMessage::RealtimeError(detail) => assert_eq!(detail, "Could not open webcam."),
        _ => panic!("expected a camera error"),
    }
    assert!(matches!(messages[1], JobMessage::RealtimeStopped));
    assert_eq!(provider.opened(), 0);
    assert!(provider.all_released());
}

#[test]
fn repeated_refusals_do_not_leak_sources() {
    let provider = Arc::new(CountingCameraProvider::new(
        solid_rgb_image(64, 48, [0, 0, 0]),
        1,
    ));
    let detector = silent_detector();

    provider.set_refuse_open(true);
    for _ in 0..3 {
        let (tx, rx) = mpsc::channel();
        run_realtime_loop(
            provider.clone(),
            fast_camera(),
            detector.clone(),
            tx,
            unset_stop_flag(),
        );
        drop(rx);
    }
    assert_eq!(provider.opened(), 0);

    // The device coming back opens exactly one fresh source.
    provider.set_refuse_open(false);
    let (tx, rx) = mpsc::channel();
    run_realtime_loop(provider.clone(), fast_camera(), detector, tx, unset_stop_flag());
    drop(rx);

    assert_eq!(provider.opened(), 1);
    assert!(provider.all_released());
}

#[test]
fn failed_detection_falls_back_to_raw_frames() {
    let frame = solid_rgb_image(64, 48, [120, 7, 9]);
    let provider = Arc::new(CountingCameraProvider::new(frame.clone(), 2));
    let (tx, rx) = mpsc::channel();

    run_realtime_loop(
        provider.clone(),
        fast_camera(),
        detector_with(Arc::new(FailingBackend)),
        tx,
        unset_stop_flag(),
    );

    // Each frame produces a failure note followed by the raw frame.
    let messages: Vec<JobMessage> = rx.try_iter().collect();
    assert_eq!(messages.len(), 5);
    match &messages[0] {
        JobMessage::RealtimeDetectionFailed {
            frame_number,
            detail,
        } => {
            assert_eq!(*frame_number, 1);
            assert!(detail.contains("scripted inference failure"));
        }
        _ => panic!("expected a detection failure note"),
    }
    match &messages[1] {
        JobMessage::RealtimeFrame {
            frame: sent,
            detections,
            summary,
            frame_number,
        } => {
            assert_eq!(*frame_number, 1);
            assert!(detections.is_empty());
            assert!(summary.is_empty());
            assert_eq!(sent.as_raw(), frame.as_raw());
        }
        _ => panic!("expected the raw frame"),
    }
    assert!(matches!(messages[4], JobMessage::RealtimeStopped));
    assert!(provider.all_released());
}

#[test]
fn app_start_and_stop_realtime_round_trip() {
    let ctx = egui::Context::default();
    let mut app = YoloApp::test_instance();
    let provider = Arc::new(CountingCameraProvider::new(
        solid_rgb_image(64, 48, [8, 8, 8]),
        usize::MAX,
    ));
    app.camera_provider = provider.clone();
    app.settings.camera = fast_camera();
    app.detector = Some(one_car_detector());

    app.start_realtime();
    assert_eq!(app.realtime.status, RealtimeStatus::Starting);
    assert!(app.realtime.stop_flag.is_some());
    assert_eq!(app.active_tab, ActiveTab::RealtimeDetection);
    assert_eq!(app.status_line, "Starting real-time detection...");

    // Poll the app's own channel until the first frame lands.
    let deadline = Instant::now() + Duration::from_secs(10);
    while app.realtime.frames_captured == 0 && Instant::now() < deadline {
        app.poll_worker(&ctx);
        thread::sleep(Duration::from_millis(5));
    }

    assert!(app.realtime.frames_captured > 0);
    assert_eq!(app.realtime.status, RealtimeStatus::Active);
    assert_eq!(app.realtime.last_detection_count, 1);
    assert!(app.realtime.texture.is_some());
    assert_eq!(app.realtime.summary, "Detected Objects:\ncar: 0.90\n");
    assert!(app.unsaved_changes);

    app.stop_realtime();
    assert!(!app.realtime.is_running());

    // Drain until the loop confirms the camera is gone.
    let deadline = Instant::now() + Duration::from_secs(10);
    while app.realtime.status != RealtimeStatus::Inactive && Instant::now() < deadline {
        app.poll_worker(&ctx);
        thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(app.realtime.status, RealtimeStatus::Inactive);
    assert!(app.realtime.stop_flag.is_none());
    assert!(provider.all_released());
}

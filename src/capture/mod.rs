// SPDX-License-Identifier: GPL-3.0-only

//! Webcam capture loop
//!
//! [`CaptureLoop`] is the single-threaded state machine: one call to
//! [`CaptureLoop::tick`] reads one frame, scans it and reports what happened.
//! [`CaptureWorker`] drives a loop on its own thread for the GUI.

pub mod worker;

pub use worker::{CaptureEvent, CaptureWorker};

use crate::backends::camera::FrameSource;
use crate::constants::{status, timing};
use crate::errors::CameraError;
use crate::scanner::{FrameScanner, ScanMode, ScanOutcome};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info};

/// Where the loop is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
    /// The camera failed; starting again is allowed
    Error(String),
}

/// What a single tick produced
#[derive(Debug, Clone)]
pub enum Tick {
    /// Not capturing, nothing was done
    Idle,
    /// The stop flag was seen and the camera released
    Stopped,
    /// A frame was scanned
    Frame(ScanOutcome),
    /// The camera failed and was released
    Failed(String),
}

impl Tick {
    /// Status label text for this tick, `None` when the label should not change
    pub fn status_text(&self) -> Option<String> {
        match self {
            Tick::Idle => None,
            Tick::Stopped => Some(status::WEBCAM_STOPPED.to_string()),
            Tick::Frame(outcome) => Some(outcome.status_text(ScanMode::Webcam)),
            Tick::Failed(_) => Some(status::WEBCAM_ERROR.to_string()),
        }
    }

    /// Whether more ticks should follow
    pub fn should_continue(&self) -> bool {
        matches!(self, Tick::Frame(_))
    }
}

/// Read → preprocess → detect → annotate, one frame per tick
pub struct CaptureLoop {
    state: CaptureState,
    source: Option<Box<dyn FrameSource>>,
    scanner: FrameScanner,
    stop_flag: Arc<AtomicBool>,
    frames: u64,
}

impl CaptureLoop {
    pub fn new(scanner: FrameScanner) -> Self {
        Self::with_stop_flag(scanner, Arc::new(AtomicBool::new(false)))
    }

    /// Loop that obeys an externally owned stop flag
    pub fn with_stop_flag(scanner: FrameScanner, stop_flag: Arc<AtomicBool>) -> Self {
        Self {
            state: CaptureState::Idle,
            source: None,
            scanner,
            stop_flag,
            frames: 0,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == CaptureState::Capturing
    }

    /// Flag that makes the next tick release the camera and go idle
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    /// Begin capturing from an opened source
    ///
    /// Allowed from any state; a previous source is released first.
    pub fn start(&mut self, source: Box<dyn FrameSource>) {
        self.release_source();
        info!(source = %source.describe(), "Capture started");
        self.source = Some(source);
        self.stop_flag.store(false, Ordering::SeqCst);
        self.frames = 0;
        self.state = CaptureState::Capturing;
    }

    /// Record that the camera could not be opened
    pub fn fail(&mut self, message: impl Into<String>) -> Tick {
        let message = message.into();
        error!(error = %message, "Webcam capture failed");
        self.release_source();
        self.state = CaptureState::Error(message.clone());
        Tick::Failed(message)
    }

    /// Run one iteration
    pub fn tick(&mut self) -> Tick {
        if self.stop_flag.load(Ordering::SeqCst) && self.source.is_some() {
            debug!("Stop flag set, ending capture");
            self.stop();
            return Tick::Stopped;
        }

        if !self.is_capturing() {
            return Tick::Idle;
        }

        let Some(source) = self.source.as_mut() else {
            return self.fail("no camera source");
        };

        let (image, latency) = match source.read_frame().and_then(|frame| {
            let latency = frame.captured_at.elapsed();
            frame.to_rgb_image().map(|image| (image, latency))
        }) {
            Ok(frame) => frame,
            Err(e) => return self.fail(CameraError::from(e).to_string()),
        };

        self.frames += 1;
        if self.frames % timing::FRAME_LOG_INTERVAL == 0 {
            debug!(
                frames = self.frames,
                width = image.width(),
                height = image.height(),
                latency_ms = latency.as_millis(),
                "Capture progress"
            );
        }

        Tick::Frame(self.scanner.scan(image))
    }

    /// Release the camera and go idle
    pub fn stop(&mut self) {
        self.release_source();
        self.state = CaptureState::Idle;
    }

    fn release_source(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
            debug!(frames = self.frames, "Camera source released");
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.release_source();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backends::camera::{BackendError, BackendResult, CameraFrame};
    use crate::scanner::{BarcodeDetector, BoundingRect, DecodedSymbol, SymbolDecoder};
    use image::GrayImage;
    use std::collections::VecDeque;

    /// Source that replays scripted reads and records release
    pub(crate) struct FakeSource {
        pub reads: VecDeque<BackendResult<CameraFrame>>,
        pub released: Arc<AtomicBool>,
    }

    impl FakeSource {
        pub(crate) fn new(reads: Vec<BackendResult<CameraFrame>>) -> (Self, Arc<AtomicBool>) {
            let released = Arc::new(AtomicBool::new(false));
            let source = Self {
                reads: reads.into(),
                released: Arc::clone(&released),
            };
            (source, released)
        }

        pub(crate) fn frame() -> BackendResult<CameraFrame> {
            Ok(CameraFrame::from_packed_rgb(16, 16, vec![200; 16 * 16 * 3]))
        }
    }

    impl FrameSource for FakeSource {
        fn read_frame(&mut self) -> BackendResult<CameraFrame> {
            self.reads.pop_front().unwrap_or_else(Self::frame)
        }

        fn release(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    pub(crate) struct FixedDecoder(pub Vec<&'static str>);

    impl SymbolDecoder for FixedDecoder {
        fn decode(&self, _prepared: &GrayImage) -> Vec<DecodedSymbol> {
            self.0
                .iter()
                .map(|p| DecodedSymbol::new(*p, BoundingRect::new(2, 2, 8, 8)))
                .collect()
        }
    }

    pub(crate) fn scanner_with(payloads: Vec<&'static str>) -> FrameScanner {
        FrameScanner::new(
            Default::default(),
            BarcodeDetector::with_decoder(Box::new(FixedDecoder(payloads))),
        )
    }

    #[test]
    fn test_starts_idle() {
        let mut capture = CaptureLoop::new(scanner_with(vec![]));
        assert_eq!(capture.state(), &CaptureState::Idle);
        assert!(matches!(capture.tick(), Tick::Idle));
    }

    #[test]
    fn test_tick_reports_decoded_payload() {
        let mut capture = CaptureLoop::new(scanner_with(vec!["HELLO123"]));
        let (source, _) = FakeSource::new(vec![FakeSource::frame()]);
        capture.start(Box::new(source));

        let tick = capture.tick();
        let Tick::Frame(outcome) = &tick else {
            panic!("expected a frame, got {:?}", tick);
        };
        assert_eq!(outcome.payloads(), vec!["HELLO123".to_string()]);
        assert_eq!(tick.status_text().unwrap(), "Decoded: HELLO123");
        assert!(capture.is_capturing());
    }

    #[test]
    fn test_tick_without_barcode() {
        let mut capture = CaptureLoop::new(scanner_with(vec![]));
        let (source, _) = FakeSource::new(vec![]);
        capture.start(Box::new(source));

        let tick = capture.tick();
        assert!(tick.should_continue());
        assert_eq!(tick.status_text().unwrap(), "No barcode detected.");
    }

    #[test]
    fn test_read_failure_releases_and_errors() {
        let mut capture = CaptureLoop::new(scanner_with(vec![]));
        let (source, released) = FakeSource::new(vec![Err(BackendError::Timeout)]);
        capture.start(Box::new(source));

        let tick = capture.tick();
        let Tick::Failed(message) = &tick else {
            panic!("expected a failure, got {:?}", tick);
        };
        assert!(message.starts_with("Failed to read frame"), "{}", message);
        assert!(!tick.should_continue());
        assert_eq!(tick.status_text().unwrap(), "Error accessing webcam.");
        assert!(matches!(capture.state(), CaptureState::Error(_)));
        assert!(released.load(Ordering::SeqCst));

        // No further work once failed
        assert!(matches!(capture.tick(), Tick::Idle));
    }

    #[test]
    fn test_restart_after_error() {
        let mut capture = CaptureLoop::new(scanner_with(vec![]));
        let (failing, _) = FakeSource::new(vec![Err(BackendError::EndOfStream)]);
        capture.start(Box::new(failing));
        capture.tick();

        let (working, _) = FakeSource::new(vec![]);
        capture.start(Box::new(working));
        assert!(capture.is_capturing());
        assert!(matches!(capture.tick(), Tick::Frame(_)));
    }

    #[test]
    fn test_stop_flag_releases_source() {
        let mut capture = CaptureLoop::new(scanner_with(vec![]));
        let (source, released) = FakeSource::new(vec![]);
        capture.start(Box::new(source));
        capture.tick();

        capture.stop_flag().store(true, Ordering::SeqCst);
        assert!(matches!(capture.tick(), Tick::Stopped));
        assert!(released.load(Ordering::SeqCst));
        assert_eq!(capture.state(), &CaptureState::Idle);
    }

    #[test]
    fn test_stop_returns_to_idle() {
        let mut capture = CaptureLoop::new(scanner_with(vec![]));
        let (source, released) = FakeSource::new(vec![]);
        capture.start(Box::new(source));

        capture.stop();
        assert_eq!(capture.state(), &CaptureState::Idle);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_drop_releases_source() {
        let (source, released) = FakeSource::new(vec![]);
        {
            let mut capture = CaptureLoop::new(scanner_with(vec![]));
            capture.start(Box::new(source));
        }
        assert!(released.load(Ordering::SeqCst));
    }
}

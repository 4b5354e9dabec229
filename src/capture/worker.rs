// SPDX-License-Identifier: GPL-3.0-only

//! Thread lifecycle for the webcam capture loop
//!
//! The worker opens the camera on its own thread, then ticks a
//! [`CaptureLoop`] until the camera fails, the receiver goes away, or the
//! owner stops it. URL payloads are launched here on every detecting tick.
//! Results travel back over a bounded `futures` channel; frames are dropped
//! when the receiver lags, lifecycle events are not.

use super::{CaptureLoop, Tick};
use crate::backends::camera::{BackendResult, FrameSource};
use crate::browser::UrlLauncher;
use crate::errors::CameraError;
use crate::scanner::{FrameScanner, ScanOutcome};
use futures::channel::mpsc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Messages from the worker to its owner
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// The camera opened and frames will follow
    Started { camera: String },
    /// One scanned frame
    Frame(ScanOutcome),
    /// The camera could not be opened or stopped delivering frames
    Failed(String),
    /// The loop was stopped and the camera released
    Stopped,
}

/// Owner of a capture loop thread
///
/// Dropping the worker stops the loop and waits for the camera to be released.
pub struct CaptureWorker {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl CaptureWorker {
    /// Spawn the capture thread
    ///
    /// `open` runs on the new thread so a slow camera does not block the
    /// caller.
    pub fn spawn<O>(
        name: &str,
        open: O,
        scanner: FrameScanner,
        launcher: UrlLauncher,
        tick_interval: Duration,
        events: mpsc::Sender<CaptureEvent>,
    ) -> Self
    where
        O: FnOnce() -> BackendResult<Box<dyn FrameSource>> + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting capture worker");

        let thread_handle = thread::spawn(move || {
            let mut sink = EventSink {
                events,
                stop_signal: Arc::clone(&stop_signal_clone),
                tick_interval,
            };
            let mut capture = CaptureLoop::with_stop_flag(scanner, stop_signal_clone);

            match open() {
                Ok(source) => {
                    let camera = source.describe();
                    capture.start(source);
                    if !sink.deliver(CaptureEvent::Started { camera }) {
                        return;
                    }
                }
                Err(e) => {
                    if let Tick::Failed(message) = capture.fail(CameraError::from(e).to_string()) {
                        sink.deliver(CaptureEvent::Failed(message));
                    }
                    return;
                }
            }

            loop {
                match capture.tick() {
                    Tick::Frame(outcome) => {
                        if let Some(result) = &outcome.result {
                            launcher.launch(result);
                        }
                        if !sink.offer(CaptureEvent::Frame(outcome)) {
                            debug!(name = %name_clone, "Receiver gone, stopping");
                            break;
                        }
                        thread::sleep(tick_interval);
                    }
                    Tick::Failed(message) => {
                        sink.deliver(CaptureEvent::Failed(message));
                        break;
                    }
                    Tick::Stopped => {
                        sink.deliver(CaptureEvent::Stopped);
                        break;
                    }
                    Tick::Idle => break,
                }
            }

            info!(name = %name_clone, "Capture worker exiting");
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture worker stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Signal the loop to stop and join it on a helper thread
    ///
    /// For owners running on an async executor, which must not block while
    /// the camera shuts down.
    pub fn stop_detached(mut self) {
        self.request_stop();
        let Some(handle) = self.thread_handle.take() else {
            return;
        };

        let name = self.name.clone();
        let spawned = thread::Builder::new()
            .name(format!("{}-join", name))
            .spawn(move || {
                if let Err(e) = handle.join() {
                    warn!(name = %name, "Capture worker panicked: {:?}", e);
                }
                debug!(name = %name, "Capture worker joined");
            });
        if let Err(e) = spawned {
            warn!(name = %self.name, error = %e, "Could not spawn join thread, worker left detached");
        }
    }

    /// Wait for the thread to finish without sending stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for capture worker to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Capture worker panicked: {:?}", e);
            }
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureWorker dropped, stopping loop");
            self.stop();
        }
    }
}

struct EventSink {
    events: mpsc::Sender<CaptureEvent>,
    stop_signal: Arc<AtomicBool>,
    tick_interval: Duration,
}

impl EventSink {
    /// Send if there is room; a full channel drops the event
    ///
    /// Returns false once the receiver is gone.
    fn offer(&mut self, event: CaptureEvent) -> bool {
        match self.events.try_send(event) {
            Ok(()) => true,
            Err(e) if e.is_disconnected() => false,
            Err(_) => {
                trace!("Receiver busy, frame dropped");
                true
            }
        }
    }

    /// Send, waiting for room unless the worker is being stopped
    fn deliver(&mut self, mut event: CaptureEvent) -> bool {
        loop {
            match self.events.try_send(event) {
                Ok(()) => return true,
                Err(e) if e.is_disconnected() => return false,
                Err(e) => {
                    if self.stop_signal.load(Ordering::SeqCst) {
                        return false;
                    }
                    event = e.into_inner();
                    thread::sleep(self.tick_interval);
                }
            }
        }
    }
}

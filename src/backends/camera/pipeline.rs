// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer pipeline for camera capture
//!
//! The pipeline ends in an `appsink` that is pulled synchronously, one sample
//! per call. Candidate pipelines are tried in order until one produces a
//! first frame: MJPEG at the requested size, raw at the requested size, then
//! whatever `decodebin` negotiates.

use super::types::*;
use super::FrameSource;
use crate::constants::camera::{READ_TIMEOUT_MS, WARMUP_TIMEOUT_MS};
use crate::constants::timing;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Tail shared by every candidate pipeline
const RGB_SINK: &str = "videoconvert ! video/x-raw,format=RGB ! appsink name=sink";

/// GStreamer camera source
pub struct GstCameraSource {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    device: CameraDevice,
    /// First frame, captured while checking the pipeline works
    pending: Option<CameraFrame>,
    released: bool,
}

impl GstCameraSource {
    /// Open the device and wait for its first frame
    pub fn open(device: &CameraDevice, format: CameraFormat) -> BackendResult<Self> {
        info!(device = %device, format = %format, "Opening camera");

        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        let mut last_error = None;
        for candidate in candidate_pipelines(device, format) {
            match try_start(&candidate) {
                Ok((pipeline, appsink, first)) => {
                    info!(
                        pipeline = %candidate,
                        width = first.width,
                        height = first.height,
                        "Camera pipeline running"
                    );
                    return Ok(Self {
                        pipeline,
                        appsink,
                        device: device.clone(),
                        pending: Some(first),
                        released: false,
                    });
                }
                Err(e) => {
                    debug!(pipeline = %candidate, error = %e, "Pipeline candidate failed");
                    last_error = Some(e);
                }
            }
        }

        error!(device = %device, "No camera pipeline could be started");
        Err(last_error
            .unwrap_or_else(|| BackendError::InitializationFailed("no pipelines".to_string())))
    }
}

impl FrameSource for GstCameraSource {
    fn read_frame(&mut self) -> BackendResult<CameraFrame> {
        if self.released {
            return Err(BackendError::NotAvailable("camera released".to_string()));
        }
        if let Some(frame) = self.pending.take() {
            return Ok(frame);
        }

        match self
            .appsink
            .try_pull_sample(gstreamer::ClockTime::from_mseconds(READ_TIMEOUT_MS))
        {
            Some(sample) => sample_to_frame(&sample),
            None if self.appsink.is_eos() => Err(BackendError::EndOfStream),
            None => {
                if let Some(message) = check_bus_for_errors(&self.pipeline) {
                    return Err(BackendError::Other(message));
                }
                Err(BackendError::Timeout)
            }
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.pending = None;
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = ?e, "Failed to stop camera pipeline");
        }
        let (result, state, _) = self
            .pipeline
            .state(gstreamer::ClockTime::from_seconds(timing::STOP_TIMEOUT_SECS));
        if let Err(e) = result {
            debug!(error = ?e, state = ?state, "Pipeline state change had issues");
        }
        info!(device = %self.device, "Camera released");
    }

    fn describe(&self) -> String {
        self.device.to_string()
    }
}

impl Drop for GstCameraSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// Source element for a device path
///
/// Empty path means the system default, `/dev/video*` is opened through V4L2
/// and anything else is treated as a PipeWire target.
pub fn source_element(device: &CameraDevice) -> String {
    let path = device.path.trim();
    if path.is_empty() {
        "autovideosrc".to_string()
    } else if path.starts_with("/dev/video") {
        format!("v4l2src device={}", path)
    } else {
        format!("pipewiresrc target-object={}", path)
    }
}

/// Pipelines to try, most preferred first
pub fn candidate_pipelines(device: &CameraDevice, format: CameraFormat) -> Vec<String> {
    let source = source_element(device);
    let (w, h) = (format.width, format.height);
    vec![
        format!(
            "{} ! image/jpeg,width={},height={} ! jpegdec ! {}",
            source, w, h, RGB_SINK
        ),
        format!(
            "{} ! video/x-raw,width={},height={} ! {}",
            source, w, h, RGB_SINK
        ),
        format!("{} ! decodebin ! {}", source, RGB_SINK),
    ]
}

/// Launch a pipeline and pull its first frame
fn try_start(description: &str) -> BackendResult<(gstreamer::Pipeline, AppSink, CameraFrame)> {
    let pipeline = gstreamer::parse::launch(description)
        .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
        .dynamic_cast::<gstreamer::Pipeline>()
        .map_err(|_| BackendError::InitializationFailed("not a pipeline".to_string()))?;

    let appsink = pipeline
        .by_name("sink")
        .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".to_string()))?
        .dynamic_cast::<AppSink>()
        .map_err(|_| BackendError::InitializationFailed("Failed to cast appsink".to_string()))?;

    // Only the newest frame matters
    appsink.set_property("sync", false);
    appsink.set_max_buffers(2);
    appsink.set_drop(true);

    if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
        let detail = check_bus_for_errors(&pipeline).unwrap_or_else(|| e.to_string());
        let _ = pipeline.set_state(gstreamer::State::Null);
        return Err(BackendError::InitializationFailed(detail));
    }

    let (result, state, pending) =
        pipeline.state(gstreamer::ClockTime::from_seconds(timing::START_TIMEOUT_SECS));
    debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state");

    let warmup_start = Instant::now();
    let Some(sample) =
        appsink.try_pull_sample(gstreamer::ClockTime::from_mseconds(WARMUP_TIMEOUT_MS))
    else {
        let detail = check_bus_for_errors(&pipeline)
            .unwrap_or_else(|| "no frame during warmup".to_string());
        let _ = pipeline.set_state(gstreamer::State::Null);
        return Err(BackendError::InitializationFailed(detail));
    };

    let first = match sample_to_frame(&sample) {
        Ok(frame) => frame,
        Err(e) => {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(e);
        }
    };
    debug!(
        warmup_ms = warmup_start.elapsed().as_millis(),
        "First camera frame received"
    );

    Ok((pipeline, appsink, first))
}

/// Copy an appsink sample into a `CameraFrame`
fn sample_to_frame(sample: &gstreamer::Sample) -> BackendResult<CameraFrame> {
    let caps = sample
        .caps()
        .ok_or_else(|| BackendError::InvalidFrame("sample has no caps".to_string()))?;
    let info = VideoInfo::from_caps(caps)
        .map_err(|e| BackendError::InvalidFrame(format!("unreadable caps: {}", e)))?;
    let buffer = sample
        .buffer()
        .ok_or_else(|| BackendError::InvalidFrame("sample has no buffer".to_string()))?;
    let map = buffer
        .map_readable()
        .map_err(|e| BackendError::InvalidFrame(format!("buffer not readable: {}", e)))?;

    let stride = info.stride().first().copied().unwrap_or(0).max(0) as u32;

    Ok(CameraFrame {
        width: info.width(),
        height: info.height(),
        stride,
        data: Arc::from(map.as_slice()),
        captured_at: Instant::now(),
    })
}

/// Pop a pending error or warning from the bus, logging it
fn check_bus_for_errors(pipeline: &gstreamer::Pipeline) -> Option<String> {
    let bus = pipeline.bus()?;
    let msg = bus.timed_pop_filtered(
        gstreamer::ClockTime::from_mseconds(100),
        &[
            gstreamer::MessageType::Error,
            gstreamer::MessageType::Warning,
        ],
    )?;

    match msg.view() {
        gstreamer::MessageView::Error(err) => {
            error!(
                error = %err.error(),
                debug = ?err.debug(),
                source = ?err.src().map(|s| s.name()),
                "GStreamer error"
            );
            Some(err.error().to_string())
        }
        gstreamer::MessageView::Warning(warn_msg) => {
            warn!(
                warning = %warn_msg.error(),
                debug = ?warn_msg.debug(),
                "GStreamer warning"
            );
            None
        }
        _ => None,
    }
}

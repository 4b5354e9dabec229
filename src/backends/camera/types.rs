// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backends

//! Shared types for camera backends

use crate::errors::CameraError;
use image::RgbImage;
use std::sync::Arc;
use std::time::Instant;

/// Bytes per pixel of packed RGB24 frames
pub const RGB_BYTES_PER_PIXEL: usize = 3;

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Human readable name
    pub name: String,
    /// Device path (`/dev/video0`), PipeWire node, or empty for the system default
    pub path: String,
}

impl CameraDevice {
    /// The system default camera
    pub fn system_default() -> Self {
        Self {
            name: "Default Camera".to_string(),
            path: String::new(),
        }
    }
}

impl std::fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.path)
        }
    }
}

/// Requested capture resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
}

impl Default for CameraFormat {
    fn default() -> Self {
        Self {
            width: crate::constants::camera::REQUESTED_WIDTH,
            height: crate::constants::camera::REQUESTED_HEIGHT,
        }
    }
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A single frame from the camera
///
/// Packed RGB24 rows. `stride` is the number of bytes per row and may include
/// padding past `width * 3`.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub data: Arc<[u8]>,
    /// Timestamp when frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Frame from tightly packed RGB rows
    pub fn from_packed_rgb(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * RGB_BYTES_PER_PIXEL as u32,
            data: Arc::from(data),
            captured_at: Instant::now(),
        }
    }

    /// Copy the frame into an `RgbImage`, dropping row padding
    pub fn to_rgb_image(&self) -> BackendResult<RgbImage> {
        let width = self.width as usize;
        let height = self.height as usize;
        let stride = self.stride as usize;
        let row_len = width * RGB_BYTES_PER_PIXEL;

        if stride < row_len {
            return Err(BackendError::InvalidFrame(format!(
                "stride {} shorter than row of {} bytes",
                stride, row_len
            )));
        }

        let mut packed = Vec::with_capacity(row_len * height);
        for y in 0..height {
            let row_start = y * stride;
            let row_end = row_start + row_len;
            let Some(row) = self.data.get(row_start..row_end) else {
                return Err(BackendError::InvalidFrame(format!(
                    "buffer of {} bytes too short for {}x{} frame",
                    self.data.len(),
                    self.width,
                    self.height
                )));
            };
            packed.extend_from_slice(row);
        }

        RgbImage::from_raw(self.width, self.height, packed)
            .ok_or_else(|| BackendError::InvalidFrame("frame size mismatch".to_string()))
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Backend errors
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to initialize backend
    InitializationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// No frame arrived in time
    Timeout,
    /// A frame arrived but could not be interpreted
    InvalidFrame(String),
    /// The pipeline stopped delivering frames
    EndOfStream,
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::Timeout => write!(f, "Timed out waiting for a frame"),
            BackendError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            BackendError::EndOfStream => write!(f, "Camera stream ended"),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<BackendError> for CameraError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotAvailable(msg)
            | BackendError::InitializationFailed(msg)
            | BackendError::DeviceNotFound(msg) => CameraError::OpenFailed(msg),
            other => CameraError::ReadFailed(other.to_string()),
        }
    }
}

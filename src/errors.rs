// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner application

use std::fmt;
use std::path::PathBuf;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera-related errors
    Camera(CameraError),
    /// Image scanning errors
    Scan(ScanError),
    /// Terminal or filesystem errors
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// Camera index out of range
    InvalidIndex { index: usize, available: usize },
    /// Camera could not be opened
    OpenFailed(String),
    /// A frame could not be read from an open camera
    ReadFailed(String),
}

/// Errors from scanning an image file
#[derive(Debug, Clone)]
pub enum ScanError {
    /// The image could not be opened or decoded
    ImageLoad { path: PathBuf, reason: String },
}

impl ScanError {
    /// Path of the image that failed, if any
    pub fn path(&self) -> &std::path::Path {
        match self {
            ScanError::ImageLoad { path, .. } => path,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Scan(e) => write!(f, "{}", e),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::InvalidIndex { index, available } => write!(
                f,
                "Camera index {} out of range ({} available)",
                index, available
            ),
            CameraError::OpenFailed(msg) => write!(f, "Failed to open camera: {}", msg),
            CameraError::ReadFailed(msg) => write!(f, "Failed to read frame: {}", msg),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::ImageLoad { path, .. } => {
                write!(f, "Could not open image {}", path.display())
            }
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for ScanError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        AppError::Scan(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

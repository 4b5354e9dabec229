// SPDX-License-Identifier: GPL-3.0-only

//! Scanner - Barcode scanning from a webcam or image files
//!
//! Frames are converted to grayscale, blurred and thresholded before
//! symbol detection. Every decoded symbol is outlined on the original frame
//! and payloads that look like URLs can be opened in the browser.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`scanner`]: Preprocessing, detection and annotation of a single frame
//! - [`backends`]: Camera enumeration and GStreamer frame capture
//! - [`capture`]: Webcam capture loop and its worker thread
//! - [`file_scan`]: One-shot scan of an image file
//! - [`browser`]: URL launch policy
//! - `app`: Desktop window (behind the `gui` feature)
//! - [`terminal`]: Terminal front end
//! - [`config`]: User configuration handling

#[cfg(feature = "gui")]
pub mod app;
pub mod backends;
pub mod browser;
pub mod capture;
pub mod config;
pub mod constants;
pub mod errors;
pub mod file_scan;
pub mod i18n;
pub mod scanner;
pub mod terminal;

// Re-export commonly used types
pub use browser::{UrlLauncher, UrlOpenPolicy};
pub use config::Config;
pub use file_scan::{FileScan, FileScanAction};
pub use scanner::{FrameScanner, ScanMode, ScanOutcome, ScanResult};

// SPDX-License-Identifier: GPL-3.0-only

//! One-shot scan of an image file

use crate::constants::file_formats;
use crate::errors::ScanError;
use crate::scanner::{FrameScanner, ScanMode, ScanOutcome};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of scanning one file
#[derive(Debug, Clone)]
pub struct FileScan {
    pub path: PathBuf,
    pub outcome: ScanOutcome,
}

impl FileScan {
    /// Status label text for this file
    pub fn status_text(&self) -> String {
        self.outcome.status_text(ScanMode::File)
    }
}

/// Loads an image and runs it through the scanning pipeline
#[derive(Default)]
pub struct FileScanAction {
    scanner: FrameScanner,
}

impl FileScanAction {
    pub fn new(scanner: FrameScanner) -> Self {
        Self { scanner }
    }

    /// Scan the image at `path`
    ///
    /// Nothing is decoded when the image cannot be loaded.
    pub fn run(&self, path: &Path) -> Result<FileScan, ScanError> {
        info!(path = %path.display(), "Scanning image file");
        if !file_formats::is_supported_image(path) {
            debug!(path = %path.display(), "Unlisted extension, decoding by content");
        }

        let image = image::open(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Could not open image");
            ScanError::ImageLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        let frame = image.to_rgb8();
        debug!(
            width = frame.width(),
            height = frame.height(),
            "Image loaded"
        );

        Ok(FileScan {
            path: path.to_path_buf(),
            outcome: self.scanner.scan(frame),
        })
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Main window geometry
pub mod window {
    /// Fixed window width
    pub const WIDTH: f32 = 900.0;

    /// Fixed window height
    pub const HEIGHT: f32 = 700.0;

    /// Largest area the scanned frame is scaled into
    pub const PREVIEW_MAX_WIDTH: f32 = 860.0;
    pub const PREVIEW_MAX_HEIGHT: f32 = 420.0;
}

/// Camera request parameters
pub mod camera {
    /// Requested capture width
    pub const REQUESTED_WIDTH: u32 = 1280;

    /// Requested capture height
    pub const REQUESTED_HEIGHT: u32 = 720;

    /// Time to wait for the first frame after a pipeline starts
    pub const WARMUP_TIMEOUT_MS: u64 = 2_000;

    /// Time to wait for a single frame before the read counts as failed
    pub const READ_TIMEOUT_MS: u64 = 2_000;
}

/// Fixed preprocessing parameters
pub mod preprocess {
    /// Gaussian sigma matching a 5x5 kernel with automatic sigma
    pub const BLUR_SIGMA: f32 = 1.1;

    /// Pixels strictly above this become white, the rest black
    pub const THRESHOLD: u8 = 100;
}

/// Annotation style drawn onto scanned frames
pub mod annotation {
    /// Box colour (green)
    pub const COLOR: [u8; 3] = [0, 255, 0];

    /// Box line thickness in pixels
    pub const THICKNESS: u32 = 2;

    /// Payload labels end this many pixels above their box
    pub const LABEL_OFFSET: i32 = 10;

    /// Label glyph height in pixels
    pub const LABEL_SCALE: f32 = 18.0;
}

/// Status label texts
pub mod status {
    pub const READY: &str = "Select an option to start barcode scanning.";
    pub const WEBCAM_NONE: &str = "No barcode detected.";
    pub const WEBCAM_ERROR: &str = "Error accessing webcam.";
    pub const WEBCAM_STOPPED: &str = "Webcam stopped.";
    pub const FILE_NONE: &str = "No barcode detected in the image.";
    pub const WEBCAM_DECODED_PREFIX: &str = "Decoded: ";
    pub const FILE_DECODED_PREFIX: &str = "Decoded from Image: ";
}

/// Image files accepted by the file scan action
pub mod file_formats {
    /// Extensions offered in the open dialog
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

    /// Check if a path has an accepted extension (case-insensitive)
    pub fn is_supported_image(path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|supported| ext.eq_ignore_ascii_case(supported))
            })
            .unwrap_or(false)
    }
}

/// Prefix that marks a payload as a URL to launch
pub const URL_PREFIX: &str = "http";

/// Timing constants
pub mod timing {
    /// Delay between capture loop ticks
    pub const TICK_INTERVAL_MS: u64 = 10;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Pipeline state change timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;
}

/// Default capture loop tick interval
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(timing::TICK_INTERVAL_MS);

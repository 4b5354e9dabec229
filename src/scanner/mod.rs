// SPDX-License-Identifier: GPL-3.0-only

//! Barcode scanning pipeline
//!
//! Every front end runs frames through the same steps:
//! preprocess → detect → annotate. [`FrameScanner`] bundles them.

pub mod annotate;
pub mod detector;
pub mod preprocess;
pub mod types;

pub use detector::{BarcodeDetector, RqrrDecoder, SymbolDecoder};
pub use preprocess::FramePreprocessor;
pub use types::{
    BoundingRect, DecodedSymbol, ScanMode, ScanOutcome, ScanResult, status_text,
};

use image::RgbImage;

/// Preprocessor and detector run as one step
#[derive(Default)]
pub struct FrameScanner {
    preprocessor: FramePreprocessor,
    detector: BarcodeDetector,
}

impl FrameScanner {
    pub fn new(preprocessor: FramePreprocessor, detector: BarcodeDetector) -> Self {
        Self {
            preprocessor,
            detector,
        }
    }

    /// Scan a color frame, consuming it as the annotation canvas
    pub fn scan(&self, mut frame: RgbImage) -> ScanOutcome {
        let prepared = self.preprocessor.preprocess(&frame);
        let result = self.detector.detect_and_decode(&prepared, &mut frame);
        ScanOutcome {
            annotated: frame,
            result,
        }
    }
}

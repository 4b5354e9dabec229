// SPDX-License-Identifier: GPL-3.0-only

//! Core types for scan results
//!
//! These types represent the output of barcode detection and are shared by
//! every front end (window, terminal, command line).

use crate::constants::status;
use image::RgbImage;
use serde::Serialize;

/// Axis-aligned bounding rectangle in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle containing all points, clamped to the frame
    ///
    /// Returns `None` if there are no points or the clamped area is empty.
    pub fn from_points(
        points: impl IntoIterator<Item = (i32, i32)>,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        let mut points = points.into_iter();
        let (first_x, first_y) = points.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first_x, first_y, first_x, first_y);

        for (x, y) in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let clamp_x = |v: i32| v.clamp(0, frame_width as i32) as u32;
        let clamp_y = |v: i32| v.clamp(0, frame_height as i32) as u32;

        let (x0, x1) = (clamp_x(min_x), clamp_x(max_x));
        let (y0, y1) = (clamp_y(min_y), clamp_y(max_y));

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Self::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// A decoded barcode: its payload text and where it was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedSymbol {
    pub payload: String,
    pub bounds: BoundingRect,
}

impl DecodedSymbol {
    pub fn new(payload: impl Into<String>, bounds: BoundingRect) -> Self {
        Self {
            payload: payload.into(),
            bounds,
        }
    }
}

/// All symbols decoded from one frame, in detector order
///
/// Never empty; "nothing found" is expressed as `Option::<ScanResult>::None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScanResult {
    symbols: Vec<DecodedSymbol>,
}

impl ScanResult {
    /// Wrap detected symbols, `None` if there are none
    pub fn from_symbols(symbols: Vec<DecodedSymbol>) -> Option<Self> {
        if symbols.is_empty() {
            None
        } else {
            Some(Self { symbols })
        }
    }

    pub fn symbols(&self) -> &[DecodedSymbol] {
        &self.symbols
    }

    pub fn payloads(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(|s| s.payload.as_str())
    }

    /// Payloads joined for display ("a, b")
    pub fn joined(&self) -> String {
        self.payloads().collect::<Vec<_>>().join(", ")
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Where a frame came from; decides the status wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Webcam,
    File,
}

/// Status label text for a scan result
pub fn status_text(result: Option<&ScanResult>, mode: ScanMode) -> String {
    match (result, mode) {
        (Some(result), ScanMode::Webcam) => {
            format!("{}{}", status::WEBCAM_DECODED_PREFIX, result.joined())
        }
        (Some(result), ScanMode::File) => {
            format!("{}{}", status::FILE_DECODED_PREFIX, result.joined())
        }
        (None, ScanMode::Webcam) => status::WEBCAM_NONE.to_string(),
        (None, ScanMode::File) => status::FILE_NONE.to_string(),
    }
}

/// The annotated frame and whatever was decoded from it
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Original color frame with bounding boxes drawn in
    pub annotated: RgbImage,
    /// Decoded symbols, `None` when no barcode was found
    pub result: Option<ScanResult>,
}

impl ScanOutcome {
    pub fn status_text(&self, mode: ScanMode) -> String {
        status_text(self.result.as_ref(), mode)
    }

    /// Decoded payloads, empty when nothing was found
    pub fn payloads(&self) -> Vec<String> {
        self.result
            .as_ref()
            .map(|r| r.payloads().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

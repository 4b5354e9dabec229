// SPDX-License-Identifier: GPL-3.0-only

//! Barcode detection
//!
//! Decoding itself is delegated to a [`SymbolDecoder`]; the production one
//! wraps `rqrr`. The detector turns decoder output into [`ScanResult`]s and
//! draws a box and the payload text for each symbol on the caller's color
//! frame.

use super::annotate::{draw_label, draw_rectangle};
use super::types::{BoundingRect, DecodedSymbol, ScanResult};
use crate::constants::annotation;
use image::{GrayImage, RgbImage};
use tracing::{debug, trace};

/// The external decode primitive
///
/// Implementations get the preprocessed single-channel image and return every
/// symbol they could decode, in the order they found them.
pub trait SymbolDecoder: Send + Sync {
    fn decode(&self, prepared: &GrayImage) -> Vec<DecodedSymbol>;
}

/// QR code decoding with `rqrr`
#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDecoder;

impl SymbolDecoder for RqrrDecoder {
    fn decode(&self, prepared: &GrayImage) -> Vec<DecodedSymbol> {
        let (width, height) = prepared.dimensions();
        let mut image = rqrr::PreparedImage::prepare(prepared.clone());
        let grids = image.detect_grids();
        trace!(count = grids.len(), "QR grids located");

        let mut symbols = Vec::with_capacity(grids.len());
        for grid in grids {
            let content = match grid.decode() {
                Ok((_, content)) => content,
                Err(e) => {
                    debug!(error = %e, "Failed to decode QR code");
                    continue;
                }
            };

            let corners = grid.bounds.iter().map(|p| (p.x, p.y));
            let Some(bounds) = BoundingRect::from_points(corners, width, height) else {
                debug!(content = %content, "Decoded QR code has no usable bounds");
                continue;
            };

            symbols.push(DecodedSymbol::new(content, bounds));
        }

        symbols
    }
}

/// Runs a decoder and annotates the original frame
pub struct BarcodeDetector {
    decoder: Box<dyn SymbolDecoder>,
}

impl Default for BarcodeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BarcodeDetector {
    /// Detector backed by `rqrr`
    pub fn new() -> Self {
        Self::with_decoder(Box::new(RqrrDecoder))
    }

    pub fn with_decoder(decoder: Box<dyn SymbolDecoder>) -> Self {
        Self { decoder }
    }

    /// Decode symbols from `prepared` and annotate them on `original`
    ///
    /// Returns `None` when nothing was decoded.
    pub fn detect_and_decode(
        &self,
        prepared: &GrayImage,
        original: &mut RgbImage,
    ) -> Option<ScanResult> {
        let start = std::time::Instant::now();
        let symbols = self.decoder.decode(prepared);

        for symbol in &symbols {
            draw_rectangle(
                original,
                symbol.bounds,
                annotation::COLOR,
                annotation::THICKNESS,
            );
            draw_label(original, symbol.bounds, &symbol.payload, annotation::COLOR);
            debug!(
                payload = %symbol.payload,
                x = symbol.bounds.x,
                y = symbol.bounds.y,
                width = symbol.bounds.width,
                height = symbol.bounds.height,
                "Detected barcode"
            );
        }

        if !symbols.is_empty() {
            debug!(
                count = symbols.len(),
                total_ms = start.elapsed().as_millis(),
                "Barcode detection found codes"
            );
        }

        ScanResult::from_symbols(symbols)
    }
}

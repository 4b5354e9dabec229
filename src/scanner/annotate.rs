// SPDX-License-Identifier: GPL-3.0-only

//! Drawing detection boxes and payload labels onto frames

use super::types::BoundingRect;
use crate::constants::annotation::{LABEL_OFFSET, LABEL_SCALE};
use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::sync::LazyLock;
use tracing::error;

static LABEL_FONT_DATA: &[u8] = include_bytes!("../../resources/fonts/DejaVuSans.ttf");

static LABEL_FONT: LazyLock<Option<FontRef<'static>>> = LazyLock::new(|| {
    FontRef::try_from_slice(LABEL_FONT_DATA)
        .inspect_err(|e| error!(error = %e, "Label font unreadable, labels disabled"))
        .ok()
});

/// Draw a hollow rectangle of the given thickness, clipped to the frame
///
/// The stroke grows inwards from the rectangle's edges.
pub fn draw_rectangle(frame: &mut RgbImage, rect: BoundingRect, color: [u8; 3], thickness: u32) {
    for inset in 0..thickness.max(1) {
        let width = rect.width.saturating_sub(2 * inset);
        let height = rect.height.saturating_sub(2 * inset);
        if width == 0 || height == 0 {
            break;
        }
        let outline = Rect::at((rect.x + inset) as i32, (rect.y + inset) as i32).of_size(width, height);
        draw_hollow_rect_mut(frame, outline, Rgb(color));
    }
}

/// Draw `text` so it ends `LABEL_OFFSET` pixels above the rectangle
///
/// Labels that would leave the top of the frame are pushed down to row 0.
pub fn draw_label(frame: &mut RgbImage, rect: BoundingRect, text: &str, color: [u8; 3]) {
    let Some(font) = LABEL_FONT.as_ref() else {
        return;
    };
    if text.is_empty() {
        return;
    }

    let scale = PxScale::from(LABEL_SCALE);
    let (_, text_height) = text_size(scale, font, text);
    let y = (rect.y as i32 - LABEL_OFFSET - text_height as i32).max(0);

    draw_text_mut(frame, Rgb(color), rect.x as i32, y, scale, font, text);
}

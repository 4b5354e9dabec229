// SPDX-License-Identifier: GPL-3.0-only

//! Main application view
//!
//! Title, status label, annotated frame, then the webcam/browse buttons
//! and quit.

use super::state::{AppModel, Message, WebcamState};
use crate::constants::window::{PREVIEW_MAX_HEIGHT, PREVIEW_MAX_WIDTH};
use crate::fl;
use cosmic::Element;
use cosmic::iced::{Alignment, Color, Length};
use cosmic::widget;

/// Status label colour
const ACCENT_GREEN: Color = Color::from_rgb(0.0, 0.6, 0.0);

impl AppModel {
    /// Build the main application view
    pub fn view(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let title = widget::text::title1(fl!("app-title"));

        let status = widget::container(widget::text::title4(self.status.as_str())).style(
            |_theme| widget::container::Style {
                text_color: Some(ACCENT_GREEN),
                ..Default::default()
            },
        );

        let webcam_label = match self.webcam {
            WebcamState::Running => fl!("stop-webcam"),
            WebcamState::Off => fl!("scan-webcam"),
        };

        let buttons = widget::row()
            .push(widget::button::suggested(webcam_label).on_press(Message::ToggleWebcam))
            .push(
                widget::button::standard(fl!("browse-image"))
                    .on_press_maybe((!self.file_scan_pending).then_some(Message::BrowseImage)),
            )
            .spacing(spacing.space_m)
            .align_y(Alignment::Center);

        let quit = widget::button::destructive(fl!("quit")).on_press(Message::Quit);

        widget::column()
            .push(title)
            .push(status)
            .push(self.build_preview())
            .push(buttons)
            .push(quit)
            .spacing(spacing.space_l)
            .padding(spacing.space_l)
            .align_x(Alignment::Center)
            .width(Length::Fill)
            .into()
    }

    /// Annotated frame, scaled down to fit the preview area
    fn build_preview(&self) -> Element<'_, Message> {
        let Some(preview) = &self.preview else {
            return widget::Space::new(Length::Fixed(PREVIEW_MAX_WIDTH), Length::Fixed(PREVIEW_MAX_HEIGHT))
                .into();
        };

        let (width, height) = fit_frame(
            PREVIEW_MAX_WIDTH,
            PREVIEW_MAX_HEIGHT,
            preview.width,
            preview.height,
        );

        widget::container(
            widget::image(preview.handle.clone())
                .width(Length::Fixed(width))
                .height(Length::Fixed(height)),
        )
        .center_x(Length::Fill)
        .height(Length::Fixed(PREVIEW_MAX_HEIGHT))
        .into()
    }
}

/// Size of a frame scaled to fit within a box, keeping its aspect ratio
///
/// Never scales up.
pub fn fit_frame(max_width: f32, max_height: f32, frame_width: u32, frame_height: u32) -> (f32, f32) {
    if frame_width == 0 || frame_height == 0 {
        return (0.0, 0.0);
    }
    let (fw, fh) = (frame_width as f32, frame_height as f32);
    let scale = (max_width / fw).min(max_height / fh).min(1.0);
    (fw * scale, fh * scale)
}

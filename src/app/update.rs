// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling

use super::state::{AppModel, Message, Preview, WebcamState};
use crate::capture::CaptureEvent;
use crate::config::Config;
use crate::constants::{file_formats, status};
use crate::errors::ScanError;
use crate::file_scan::{FileScan, FileScanAction};
use crate::fl;
use crate::scanner::{ScanMode, ScanOutcome};
use cosmic::Task;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

impl AppModel {
    /// Main message handler - routes messages to appropriate handler methods.
    pub fn update(&mut self, message: Message) -> Task<cosmic::Action<Message>> {
        match message {
            Message::ToggleWebcam => self.handle_toggle_webcam(),
            Message::Capture(session, event) => self.handle_capture_event(session, event),
            Message::BrowseImage => self.handle_browse_image(),
            Message::ImageChosen(path) => self.handle_image_chosen(path),
            Message::FileScanned(result) => self.handle_file_scanned(result),
            Message::CloseDialog => {
                self.error_dialog = None;
                Task::none()
            }
            Message::Quit => {
                info!("Quit requested");
                self.stop_webcam();
                cosmic::iced::exit()
            }
            Message::UpdateConfig(config) => self.handle_update_config(config),
        }
    }

    // =========================================================================
    // Webcam
    // =========================================================================

    fn handle_toggle_webcam(&mut self) -> Task<cosmic::Action<Message>> {
        match self.webcam {
            WebcamState::Running => {
                self.stop_webcam();
                self.status = status::WEBCAM_STOPPED.to_string();
            }
            WebcamState::Off => {
                self.webcam_session += 1;
                self.webcam = WebcamState::Running;
                info!(session = self.webcam_session, "Webcam scanning started");
            }
        }
        Task::none()
    }

    /// Drop the capture subscription; the worker releases the camera
    fn stop_webcam(&mut self) {
        if self.webcam == WebcamState::Running {
            info!(session = self.webcam_session, "Webcam scanning stopped");
        }
        self.webcam = WebcamState::Off;
    }

    fn handle_capture_event(
        &mut self,
        session: u64,
        event: CaptureEvent,
    ) -> Task<cosmic::Action<Message>> {
        // Events still in flight from a session that was already stopped
        if self.webcam != WebcamState::Running || session != self.webcam_session {
            debug!(session, current = self.webcam_session, "Ignoring stale capture event");
            return Task::none();
        }

        match event {
            CaptureEvent::Started { camera } => {
                info!(camera = %camera, "Webcam opened");
            }
            CaptureEvent::Frame(outcome) => self.show_outcome(outcome, ScanMode::Webcam),
            CaptureEvent::Failed(message) => {
                error!(error = %message, "Webcam failed");
                self.webcam = WebcamState::Off;
                self.status = status::WEBCAM_ERROR.to_string();
            }
            CaptureEvent::Stopped => {
                self.webcam = WebcamState::Off;
                self.status = status::WEBCAM_STOPPED.to_string();
            }
        }
        Task::none()
    }

    // =========================================================================
    // Image files
    // =========================================================================

    fn handle_browse_image(&mut self) -> Task<cosmic::Action<Message>> {
        let title = fl!("browse-image");
        let filter = fl!("image-files");

        Task::perform(
            async move {
                rfd::AsyncFileDialog::new()
                    .set_title(title)
                    .add_filter(filter, file_formats::IMAGE_EXTENSIONS)
                    .pick_file()
                    .await
                    .map(|handle| handle.path().to_path_buf())
            },
            |path| cosmic::Action::App(Message::ImageChosen(path)),
        )
    }

    fn handle_image_chosen(&mut self, path: Option<PathBuf>) -> Task<cosmic::Action<Message>> {
        let Some(path) = path else {
            debug!("Image selection cancelled");
            return Task::none();
        };

        // The webcam would overwrite the scanned image on its next frame
        self.stop_webcam();
        self.file_scan_pending = true;

        Task::perform(
            async move {
                let task_path = path.clone();
                match tokio::task::spawn_blocking(move || {
                    FileScanAction::default().run(&task_path)
                })
                .await
                {
                    Ok(result) => result,
                    Err(e) => Err(ScanError::ImageLoad {
                        path,
                        reason: e.to_string(),
                    }),
                }
            },
            |result| cosmic::Action::App(Message::FileScanned(result)),
        )
    }

    fn handle_file_scanned(
        &mut self,
        result: Result<FileScan, ScanError>,
    ) -> Task<cosmic::Action<Message>> {
        self.file_scan_pending = false;

        match result {
            Ok(scan) => {
                info!(path = %scan.path.display(), "Image scanned");
                if let Some(result) = &scan.outcome.result {
                    self.launcher.launch(result);
                }
                self.show_outcome(scan.outcome, ScanMode::File);
            }
            Err(e) => {
                warn!(path = %e.path().display(), error = %e, "Image scan failed");
                self.error_dialog = Some(e.to_string());
            }
        }
        Task::none()
    }

    // =========================================================================
    // Shared
    // =========================================================================

    /// Display a scanned frame and update the status
    ///
    /// Webcam URLs are launched by the capture worker, file URLs by the caller.
    fn show_outcome(&mut self, outcome: ScanOutcome, mode: ScanMode) {
        self.status = outcome.status_text(mode);

        let (width, height) = outcome.annotated.dimensions();
        let rgba = image::DynamicImage::ImageRgb8(outcome.annotated).into_rgba8();
        self.preview = Some(Preview {
            handle: cosmic::widget::image::Handle::from_rgba(width, height, rgba.into_raw()),
            width,
            height,
        });
    }

    fn handle_update_config(&mut self, config: Config) -> Task<cosmic::Action<Message>> {
        debug!(?config, "Configuration updated");
        self.launcher.set_policy(config.url_open_policy);
        self.config = config;
        Task::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{UrlLauncher, UrlOpenPolicy, UrlOpener};
    use crate::scanner::{BoundingRect, DecodedSymbol, ScanResult};
    use image::RgbImage;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingOpener(Arc<Mutex<Vec<String>>>);

    impl UrlOpener for RecordingOpener {
        fn open(&self, url: &str) -> std::io::Result<()> {
            self.0.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn model() -> (AppModel, RecordingOpener) {
        let opener = RecordingOpener::default();
        let launcher =
            UrlLauncher::with_opener(UrlOpenPolicy::EveryDetection, Box::new(opener.clone()));
        let app = AppModel::new(cosmic::Core::default(), Config::default(), launcher);
        (app, opener)
    }

    fn outcome_with(payloads: &[&str]) -> ScanOutcome {
        let symbols = payloads
            .iter()
            .map(|p| DecodedSymbol::new(*p, BoundingRect::new(0, 0, 4, 4)))
            .collect();
        ScanOutcome {
            annotated: RgbImage::new(8, 8),
            result: ScanResult::from_symbols(symbols),
        }
    }

    #[test]
    fn test_starts_ready() {
        let (app, _) = model();
        assert_eq!(app.status, status::READY);
        assert_eq!(app.webcam, WebcamState::Off);
        assert!(app.preview.is_none());
    }

    #[test]
    fn test_load_failure_keeps_status_and_names_path() {
        let (mut app, _) = model();
        app.status = "Decoded: ABC".to_string();

        let _ = app.update(Message::FileScanned(Err(ScanError::ImageLoad {
            path: PathBuf::from("/tmp/missing.png"),
            reason: "not found".to_string(),
        })));

        assert_eq!(app.status, "Decoded: ABC");
        let message = app.error_dialog.as_deref().expect("error dialog shown");
        assert!(message.contains("/tmp/missing.png"));
        assert!(app.preview.is_none());
        assert!(!app.file_scan_pending);
    }

    #[test]
    fn test_cancelled_dialog_changes_nothing() {
        let (mut app, _) = model();
        let _ = app.update(Message::ToggleWebcam);
        let session = app.webcam_session;

        let _ = app.update(Message::ImageChosen(None));

        assert_eq!(app.status, status::READY);
        assert_eq!(app.webcam, WebcamState::Running);
        assert_eq!(app.webcam_session, session);
        assert!(!app.file_scan_pending);
        assert!(app.error_dialog.is_none());
    }

    #[test]
    fn test_chosen_image_stops_webcam() {
        let (mut app, _) = model();
        let _ = app.update(Message::ToggleWebcam);

        let _ = app.update(Message::ImageChosen(Some(PathBuf::from("/tmp/code.png"))));

        assert_eq!(app.webcam, WebcamState::Off);
        assert!(app.file_scan_pending);
        assert_eq!(app.status, status::READY);
    }

    #[test]
    fn test_capture_failure_reports_error() {
        let (mut app, _) = model();
        let _ = app.update(Message::ToggleWebcam);
        let session = app.webcam_session;

        let _ = app.update(Message::Capture(
            session,
            CaptureEvent::Failed("no camera".to_string()),
        ));

        assert_eq!(app.status, status::WEBCAM_ERROR);
        assert_eq!(app.webcam, WebcamState::Off);
    }

    #[test]
    fn test_stale_session_events_ignored() {
        let (mut app, _) = model();
        let _ = app.update(Message::ToggleWebcam);
        let _ = app.update(Message::ToggleWebcam);
        let _ = app.update(Message::ToggleWebcam);
        assert_eq!(app.webcam_session, 2);
        let status_before = app.status.clone();

        let _ = app.update(Message::Capture(1, CaptureEvent::Frame(outcome_with(&["ABC"]))));
        let _ = app.update(Message::Capture(1, CaptureEvent::Failed("gone".to_string())));

        assert_eq!(app.status, status_before);
        assert_eq!(app.webcam, WebcamState::Running);
        assert!(app.preview.is_none());

        // Nothing at all is accepted once stopped
        let _ = app.update(Message::ToggleWebcam);
        let _ = app.update(Message::Capture(2, CaptureEvent::Frame(outcome_with(&["ABC"]))));
        assert!(app.preview.is_none());
        assert_eq!(app.status, status::WEBCAM_STOPPED);
    }

    #[test]
    fn test_webcam_frame_updates_status_without_launching() {
        let (mut app, opener) = model();
        let _ = app.update(Message::ToggleWebcam);
        let session = app.webcam_session;

        let _ = app.update(Message::Capture(
            session,
            CaptureEvent::Frame(outcome_with(&["http://example.com"])),
        ));

        assert_eq!(app.status, "Decoded: http://example.com");
        assert!(app.preview.is_some());
        // The capture worker already launched it
        assert!(opener.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_file_scan_opens_urls() {
        let (mut app, opener) = model();
        let scan = FileScan {
            path: PathBuf::from("/tmp/code.png"),
            outcome: outcome_with(&["ABC", "http://example.com"]),
        };

        let _ = app.update(Message::FileScanned(Ok(scan)));

        assert_eq!(app.status, "Decoded from Image: ABC, http://example.com");
        assert_eq!(*opener.0.lock().unwrap(), vec!["http://example.com"]);
    }
}

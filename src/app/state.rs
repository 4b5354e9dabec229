// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::browser::UrlLauncher;
use crate::capture::CaptureEvent;
use crate::config::Config;
use crate::errors::ScanError;
use crate::file_scan::FileScan;
use std::path::PathBuf;

/// Webcam session state as seen by the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebcamState {
    /// No capture running
    #[default]
    Off,
    /// Capture subscription active; waiting for or receiving frames
    Running,
}

/// The last scanned frame, ready for display
#[derive(Debug, Clone)]
pub struct Preview {
    pub handle: cosmic::widget::image::Handle,
    pub width: u32,
    pub height: u32,
}

/// The application model stores app-specific state used to describe its interface and
/// drive its logic.
pub struct AppModel {
    /// Application state which is managed by the COSMIC runtime.
    pub core: cosmic::Core,
    /// Configuration data that persists between application runs.
    pub config: Config,
    /// Status label text
    pub status: String,
    /// Last annotated frame, from either source
    pub preview: Option<Preview>,
    pub webcam: WebcamState,
    /// Incremented on every start so each session gets a fresh subscription
    pub webcam_session: u64,
    /// Opens URL payloads according to the configured policy; shared with the capture worker
    pub launcher: UrlLauncher,
    /// Message of the modal error dialog, if shown
    pub error_dialog: Option<String>,
    /// A file scan is running in the background
    pub file_scan_pending: bool,
}

impl AppModel {
    /// Fresh window state: webcam off, nothing scanned yet
    pub fn new(core: cosmic::Core, config: Config, launcher: UrlLauncher) -> Self {
        Self {
            core,
            config,
            status: crate::constants::status::READY.to_string(),
            preview: None,
            webcam: WebcamState::Off,
            webcam_session: 0,
            launcher,
            error_dialog: None,
            file_scan_pending: false,
        }
    }
}

/// Messages emitted by the application and its widgets.
#[derive(Debug, Clone)]
pub enum Message {
    /// "Scan via Webcam" / "Stop Webcam" pressed
    ToggleWebcam,
    /// Event from the capture worker of the given webcam session
    Capture(u64, CaptureEvent),
    /// "Browse Image" pressed
    BrowseImage,
    /// File dialog closed; `None` when cancelled
    ImageChosen(Option<PathBuf>),
    /// Background file scan finished
    FileScanned(Result<FileScan, ScanError>),
    /// Error dialog acknowledged
    CloseDialog,
    /// "Quit" pressed
    Quit,
    /// Configuration updated
    UpdateConfig(Config),
}

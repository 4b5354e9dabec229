// SPDX-License-Identifier: GPL-3.0-only

//! Desktop window for the barcode scanner
//!
//! # Architecture
//!
//! - `state`: Application state types (AppModel, Message, WebcamState)
//! - `view`: Main view rendering
//! - `update`: Message handling
//!
//! The webcam runs in a [`CaptureWorker`] owned by a subscription. Stopping
//! the webcam removes the subscription, which stops the worker and releases
//! the camera on a helper thread.

mod state;
mod update;
mod view;

use crate::backends::camera::open_camera;
use crate::browser::UrlLauncher;
use crate::capture::CaptureWorker;
use crate::config::Config;
use crate::fl;
use crate::scanner::FrameScanner;
use cosmic::cosmic_config::{self, CosmicConfigEntry};
use cosmic::iced::Subscription;
use cosmic::widget;
use cosmic::{ApplicationExt, Element, Task};
pub use state::{AppModel, Message, Preview, WebcamState};
pub use view::fit_frame;
use tracing::{error, info};

impl cosmic::Application for AppModel {
    /// The async executor that will be used to run your application's commands.
    type Executor = cosmic::executor::Default;

    /// Data that your application receives to its init method.
    type Flags = ();

    /// Messages which the application and its widgets will emit.
    type Message = Message;

    /// Unique identifier in RDNN (reverse domain name notation) format.
    const APP_ID: &'static str = "io.github.cosmic_utils.scanner";

    fn core(&self) -> &cosmic::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut cosmic::Core {
        &mut self.core
    }

    /// Initializes the application with any given flags and startup commands.
    fn init(
        core: cosmic::Core,
        _flags: Self::Flags,
    ) -> (Self, Task<cosmic::Action<Self::Message>>) {
        let config = match cosmic_config::Config::new(Self::APP_ID, Config::VERSION) {
            Ok(handler) => match Config::get_entry(&handler) {
                Ok(config) => config,
                Err((errors, config)) => {
                    error!(?errors, "Errors loading config");
                    config
                }
            },
            Err(err) => {
                error!(%err, "Failed to create config handler");
                Config::default()
            }
        };

        info!(policy = %config.url_open_policy, "Scanner window starting");

        let launcher = UrlLauncher::new(config.url_open_policy);
        let mut app = AppModel::new(core, config, launcher);

        let title_task = app.update_title();
        (app, title_task)
    }

    /// Modal error dialog
    fn dialog(&self) -> Option<Element<'_, Self::Message>> {
        let message = self.error_dialog.as_ref()?;

        Some(
            widget::dialog()
                .title(fl!("error"))
                .body(message.as_str())
                .primary_action(
                    widget::button::suggested(fl!("ok")).on_press(Message::CloseDialog),
                )
                .into(),
        )
    }

    /// Describes the interface based on the current state of the application model.
    fn view(&self) -> Element<'_, Self::Message> {
        self.view()
    }

    /// Register subscriptions for this application.
    fn subscription(&self) -> Subscription<Self::Message> {
        use futures::{SinkExt, StreamExt};

        let config_sub = self
            .core()
            .watch_config::<Config>(Self::APP_ID)
            .map(|update| Message::UpdateConfig(update.config));

        let webcam_sub = match self.webcam {
            WebcamState::Running => {
                let device = self.config.camera_device();
                let tick_interval = self.config.tick_interval();
                let session = self.webcam_session;
                let launcher = self.launcher.clone();

                Subscription::run_with_id(
                    ("webcam", session),
                    cosmic::iced::stream::channel(4, move |mut output| async move {
                        info!(session, device = %device, "Webcam subscription started");

                        let (events, mut receiver) = futures::channel::mpsc::channel(2);
                        // Dropped when the subscription goes away, releasing the camera
                        let _worker = DetachOnDrop(Some(CaptureWorker::spawn(
                            "webcam",
                            move || open_camera(&device),
                            FrameScanner::default(),
                            launcher,
                            tick_interval,
                            events,
                        )));

                        while let Some(event) = receiver.next().await {
                            if output.send(Message::Capture(session, event)).await.is_err() {
                                break;
                            }
                        }

                        info!(session, "Webcam subscription finished");
                    }),
                )
            }
            WebcamState::Off => Subscription::none(),
        };

        Subscription::batch([config_sub, webcam_sub])
    }

    /// Handles messages emitted by the application and its widgets.
    fn update(&mut self, message: Self::Message) -> Task<cosmic::Action<Self::Message>> {
        self.update(message)
    }
}

impl AppModel {
    /// Updates the header and window titles.
    fn update_title(&mut self) -> Task<cosmic::Action<Message>> {
        let title = fl!("app-title");
        if let Some(id) = self.core.main_window_id() {
            self.set_window_title(title, id)
        } else {
            Task::none()
        }
    }
}

/// Stops a capture worker without blocking the executor thread
///
/// The subscription future is dropped on the runtime, and joining there
/// would stall the UI until the camera pipeline shuts down.
struct DetachOnDrop(Option<CaptureWorker>);

impl Drop for DetachOnDrop {
    fn drop(&mut self) {
        if let Some(worker) = self.0.take() {
            worker.stop_detached();
        }
    }
}

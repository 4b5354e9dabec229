// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use scanner::browser::UrlOpenPolicy;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "scanner")]
#[command(about = "Barcode scanner for webcams and image files")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the webcam feed in the terminal
    Terminal {
        /// Camera index to use (from 'scanner list')
        #[arg(short, long, default_value = "0")]
        camera: usize,

        /// When to open URL payloads: always, once or never
        #[arg(long, default_value = "once")]
        open_urls: UrlOpenPolicy,
    },

    /// List available cameras
    List,

    /// Scan an image file and print the decoded payloads
    Scan {
        /// Image to scan (jpg, jpeg or png)
        file: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// When to open URL payloads: always, once or never
        #[arg(long, default_value = "never")]
        open_urls: UrlOpenPolicy,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=scanner=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Terminal { camera, open_urls }) => {
            scanner::terminal::run(camera, open_urls)?
        }
        Some(Commands::List) => cli::list_cameras()?,
        Some(Commands::Scan {
            file,
            json,
            open_urls,
        }) => cli::scan_file(file, json, open_urls)?,
        None => run_gui()?,
    }

    Ok(())
}

#[cfg(feature = "gui")]
fn run_gui() -> Result<(), Box<dyn std::error::Error>> {
    use scanner::constants::window;

    // Get the system's preferred languages.
    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();

    // Enable localizations to be applied.
    scanner::i18n::init(&requested_languages);

    // Fixed size window
    let size = cosmic::iced::Size::new(window::WIDTH, window::HEIGHT);
    let settings = cosmic::app::Settings::default()
        .size(size)
        .size_limits(cosmic::iced::Limits::new(size, size));

    // Starts the application's event loop with `()` as the application's flags.
    cosmic::app::run::<scanner::app::AppModel>(settings, ())?;

    Ok(())
}

#[cfg(not(feature = "gui"))]
fn run_gui() -> Result<(), Box<dyn std::error::Error>> {
    Err("built without the window; use 'scanner scan', 'scanner terminal' or 'scanner list'".into())
}

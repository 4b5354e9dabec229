// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based barcode scanner
//!
//! Renders the annotated camera feed to the terminal using Unicode half-block
//! characters for improved vertical resolution, with decoded payloads in the
//! status bar.

use crate::backends::camera::{CameraDevice, enumerate_cameras, open_camera};
use crate::browser::{UrlLauncher, UrlOpenPolicy};
use crate::capture::{CaptureLoop, CaptureState, Tick};
use crate::errors::{AppResult, CameraError};
use crate::scanner::{DecodedSymbol, FrameScanner, ScanMode};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbImage;
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::path::PathBuf;
use tracing::{error, info};

/// Run the terminal scanner
pub fn run(camera_index: usize, policy: UrlOpenPolicy) -> AppResult<()> {
    let cameras = enumerate_cameras();
    if camera_index >= cameras.len() {
        return Err(CameraError::InvalidIndex {
            index: camera_index,
            available: cameras.len(),
        }
        .into());
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut terminal = setup_or_restore(enter_screen, restore_screen)?;

    // Run the app
    let result = run_app(&mut terminal, &cameras, camera_index, policy);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn enter_screen() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Undo raw mode and the alternate screen after a failed setup
fn restore_screen() {
    if let Err(e) = disable_raw_mode() {
        error!(error = %e, "Failed to disable raw mode");
    }
    let _ = execute!(stdout(), LeaveAlternateScreen);
}

/// Run `setup`, calling `restore` before handing back its error
fn setup_or_restore<T>(
    setup: impl FnOnce() -> io::Result<T>,
    restore: impl FnOnce(),
) -> io::Result<T> {
    setup().inspect_err(|_| restore())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cameras: &[CameraDevice],
    mut current_camera_index: usize,
    policy: UrlOpenPolicy,
) -> AppResult<()> {
    info!(count = cameras.len(), "Found cameras");

    let multi_camera = cameras.len() > 1;
    let mut capture = CaptureLoop::new(FrameScanner::default());
    let launcher = UrlLauncher::new(policy);
    let mut frame_widget = FrameWidget::new();
    let mut show_help = false;
    let mut scan_status = start_camera(&mut capture, &cameras[current_camera_index]);

    loop {
        match capture.tick() {
            Tick::Frame(outcome) => {
                if let Some(result) = &outcome.result {
                    launcher.launch(result);
                }
                scan_status = outcome.status_text(ScanMode::Webcam);
                let symbols = outcome.result.map(|r| r.symbols().to_vec());
                frame_widget.update(outcome.annotated, symbols);
            }
            tick @ (Tick::Failed(_) | Tick::Stopped) => {
                scan_status = tick.status_text().unwrap_or_default();
            }
            Tick::Idle => {}
        }

        let status_message = if show_help {
            build_help_message(multi_camera)
        } else {
            format!("{} | {}", scan_status, build_key_hints(multi_camera))
        };

        // Draw
        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let camera_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };

            f.render_widget(&frame_widget, camera_area);

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };

            let status = StatusBar {
                message: &status_message,
            };
            f.render_widget(status, status_area);
        })?;

        // Handle input, short timeout so the next tick follows quickly
        if event::poll(crate::constants::DEFAULT_TICK_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C to quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            match key.code {
                KeyCode::Char('q') => break,

                // 'p' saves the annotated frame
                KeyCode::Char('p') => {
                    show_help = false;
                    if let Some(frame) = &frame_widget.frame {
                        scan_status = match save_snapshot(frame) {
                            Ok(path) => format!("Saved: {}", path.display()),
                            Err(e) => {
                                error!("Failed to save snapshot: {}", e);
                                format!("Error: {}", e)
                            }
                        };
                    }
                }

                // 's' switches camera
                KeyCode::Char('s') if multi_camera => {
                    show_help = false;
                    current_camera_index = (current_camera_index + 1) % cameras.len();
                    frame_widget = FrameWidget::new();
                    scan_status = start_camera(&mut capture, &cameras[current_camera_index]);
                }

                // 'r' retries after a camera error
                KeyCode::Char('r') if matches!(capture.state(), CaptureState::Error(_)) => {
                    scan_status = start_camera(&mut capture, &cameras[current_camera_index]);
                }

                KeyCode::Char('h') => show_help = !show_help,

                _ => {}
            }
        }
    }

    capture.stop();
    Ok(())
}

/// Open a camera and hand it to the loop, returning the status to show
fn start_camera(capture: &mut CaptureLoop, device: &CameraDevice) -> String {
    info!(device = %device, "Initializing camera");
    capture.stop();

    match open_camera(device) {
        Ok(source) => {
            capture.start(source);
            format!("Scanning with {}", device.name)
        }
        Err(e) => capture
            .fail(CameraError::from(e).to_string())
            .status_text()
            .unwrap_or_default(),
    }
}

fn build_key_hints(multi_camera: bool) -> String {
    let mut msg = "'p' save".to_string();
    if multi_camera {
        msg.push_str(" | 's' switch camera");
    }
    msg.push_str(" | 'h' help | 'q' quit");
    msg
}

fn build_help_message(multi_camera: bool) -> String {
    let mut msg = String::from("p: Save annotated frame | ");
    if multi_camera {
        msg.push_str("s: Switch camera | ");
    }
    msg.push_str("r: Retry camera | h: Toggle help | q/Ctrl+C: Quit");
    msg
}

/// Directory scanned frames are saved to (~/Pictures/scanner)
pub fn snapshot_directory() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scanner")
}

/// Save the annotated frame as a PNG
fn save_snapshot(frame: &RgbImage) -> AppResult<PathBuf> {
    let dir = snapshot_directory();
    std::fs::create_dir_all(&dir)?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let filepath = dir.join(format!("SCAN_{}.png", timestamp));

    frame.save(&filepath)?;
    info!(path = %filepath.display(), "Snapshot saved");

    Ok(filepath)
}

/// Widget that renders a scanned frame using half-block characters
struct FrameWidget {
    frame: Option<RgbImage>,
    symbols: Vec<DecodedSymbol>,
}

impl FrameWidget {
    fn new() -> Self {
        Self {
            frame: None,
            symbols: Vec::new(),
        }
    }

    fn update(&mut self, frame: RgbImage, symbols: Option<Vec<DecodedSymbol>>) {
        self.frame = Some(frame);
        self.symbols = symbols.unwrap_or_default();
    }
}

/// Cell size of a frame fitted into an area
///
/// Each terminal cell displays 2 vertical pixels.
fn fit_to_cells(frame_width: u32, frame_height: u32, area: Rect) -> (u16, u16) {
    if frame_width == 0 || frame_height == 0 || area.width == 0 || area.height == 0 {
        return (0, 0);
    }

    let frame_aspect = frame_width as f64 / frame_height as f64;
    let term_width = area.width as f64;
    let term_height = (area.height as f64) * 2.0;

    if term_width / term_height > frame_aspect {
        // Terminal is wider - fit to height
        let h = term_height;
        let w = h * frame_aspect;
        (w as u16, (h / 2.0) as u16)
    } else {
        // Terminal is taller - fit to width
        let w = term_width;
        let h = w / frame_aspect;
        (w as u16, (h / 2.0) as u16)
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            // No frame yet - show placeholder
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        };

        let (display_width, display_height) = fit_to_cells(frame.width(), frame.height(), area);
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width() as f64 / display_width as f64;
        let y_scale = frame.height() as f64 / (display_height as f64 * 2.0);

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }

        // Payload labels one row above their box
        for symbol in &self.symbols {
            let cell_x = x_offset + (symbol.bounds.x as f64 / x_scale) as u16;
            let cell_y = y_offset + (symbol.bounds.y as f64 / (y_scale * 2.0)) as u16;
            let label_y = cell_y.saturating_sub(1).max(area.y);
            if cell_x >= area.x + area.width || label_y >= area.y + area.height {
                continue;
            }
            let room = (area.x + area.width - cell_x) as usize;
            let text: String = symbol.payload.chars().take(room).collect();
            buf.set_string(
                cell_x,
                label_y,
                text,
                ratatui::style::Style::default()
                    .fg(Color::Green)
                    .bg(Color::Black),
            );
        }
    }
}

fn sample_pixel(frame: &RgbImage, x: u32, y: u32) -> Color {
    let x = x.min(frame.width().saturating_sub(1));
    let y = y.min(frame.height().saturating_sub(1));
    let [r, g, b] = frame.get_pixel(x, y).0;
    Color::Rgb(r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();

        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}

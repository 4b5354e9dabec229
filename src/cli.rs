// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Scanning an image file without a window

use scanner::backends::camera::enumerate_cameras;
use scanner::browser::{UrlLauncher, UrlOpenPolicy};
use scanner::errors::AppResult;
use scanner::file_scan::FileScanAction;
use scanner::scanner::DecodedSymbol;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// List all available cameras
pub fn list_cameras() -> AppResult<()> {
    let cameras = enumerate_cameras();

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        if !camera.path.is_empty() {
            println!("      Path: {}", camera.path);
        }
        println!();
    }

    Ok(())
}

/// Machine readable result of a file scan
#[derive(Serialize)]
struct ScanReport<'a> {
    path: &'a Path,
    status: String,
    symbols: &'a [DecodedSymbol],
    opened_urls: Vec<String>,
}

/// Scan an image file and print what was decoded
///
/// Fails when the image cannot be loaded; finding no barcode is not an error.
pub fn scan_file(
    path: PathBuf,
    json: bool,
    policy: UrlOpenPolicy,
) -> AppResult<()> {
    let scan = FileScanAction::default().run(&path)?;

    let launcher = UrlLauncher::new(policy);
    let opened_urls = scan
        .outcome
        .result
        .as_ref()
        .map(|result| launcher.launch(result))
        .unwrap_or_default();

    if json {
        let symbols = scan
            .outcome
            .result
            .as_ref()
            .map(|r| r.symbols())
            .unwrap_or_default();
        let report = ScanReport {
            path: &scan.path,
            status: scan.status_text(),
            symbols,
            opened_urls,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", scan.status_text());
    for payload in scan.outcome.payloads() {
        println!("{}", payload);
    }
    for url in &opened_urls {
        println!("Opened: {}", url);
    }

    Ok(())
}

// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for scanning image files and launching URLs

use image::{Rgb, RgbImage};
use scanner::browser::{UrlLauncher, UrlOpenPolicy, UrlOpener};
use scanner::errors::ScanError;
use scanner::scanner::{
    BarcodeDetector, BoundingRect, DecodedSymbol, FramePreprocessor, ScanResult, SymbolDecoder,
};
use scanner::{FileScanAction, FrameScanner, ScanMode};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct RecordingOpener(Arc<Mutex<Vec<String>>>);

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> std::io::Result<()> {
        self.0.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

struct FixedDecoder(Vec<&'static str>);

impl SymbolDecoder for FixedDecoder {
    fn decode(&self, _prepared: &image::GrayImage) -> Vec<DecodedSymbol> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, p)| DecodedSymbol::new(*p, BoundingRect::new(4 + 20 * i as u32, 4, 12, 12)))
            .collect()
    }
}

fn result_of(payloads: &[&str]) -> ScanResult {
    let symbols = payloads
        .iter()
        .map(|p| DecodedSymbol::new(*p, BoundingRect::new(0, 0, 10, 10)))
        .collect();
    ScanResult::from_symbols(symbols).unwrap()
}

fn write_png(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    RgbImage::from_pixel(64, 48, Rgb([255, 255, 255]))
        .save(&path)
        .unwrap();
    path
}

#[test]
fn test_blank_image_reports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(&dir, "blank.png");

    let scan = FileScanAction::default().run(&path).unwrap();

    assert!(scan.outcome.result.is_none());
    assert_eq!(scan.status_text(), "No barcode detected in the image.");
    assert_eq!(scan.outcome.annotated.dimensions(), (64, 48));
}

#[test]
fn test_missing_image_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.png");

    let err = FileScanAction::default().run(&path).unwrap_err();
    assert!(matches!(err, ScanError::ImageLoad { .. }));
}

#[test]
fn test_file_scan_with_decoded_symbols() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(&dir, "codes.png");
    let scanner = FrameScanner::new(
        FramePreprocessor::new(),
        BarcodeDetector::with_decoder(Box::new(FixedDecoder(vec!["ABC", "http://x"]))),
    );

    let scan = FileScanAction::new(scanner).run(&path).unwrap();

    assert_eq!(scan.status_text(), "Decoded from Image: ABC, http://x");
    assert_eq!(scan.outcome.payloads(), vec!["ABC", "http://x"]);
    // Bottom edge of the first box on the original colour frame
    assert_eq!(*scan.outcome.annotated.get_pixel(4, 15), Rgb([0, 255, 0]));
    assert_eq!(
        scan.outcome.status_text(ScanMode::Webcam),
        "Decoded: ABC, http://x"
    );
}

#[test]
fn test_real_qr_file_opens_url() {
    let code = qrcode::QrCode::new(b"http://example.com").unwrap();
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let (module, quiet) = (6, 4);
    let size = (modules + 2 * quiet) * module;
    let image = RgbImage::from_fn(size, size, |x, y| {
        let (mx, my) = (x / module, y / module);
        let inside =
            (quiet..quiet + modules).contains(&mx) && (quiet..quiet + modules).contains(&my);
        if inside && colors[((my - quiet) * modules + (mx - quiet)) as usize] == qrcode::Color::Dark
        {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    });
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("url.png");
    image.save(&path).unwrap();

    let scan = FileScanAction::default().run(&path).unwrap();
    assert_eq!(scan.status_text(), "Decoded from Image: http://example.com");

    let opener = RecordingOpener::default();
    let launcher = UrlLauncher::with_opener(UrlOpenPolicy::Once, Box::new(opener.clone()));
    launcher.launch(scan.outcome.result.as_ref().unwrap());
    assert_eq!(*opener.0.lock().unwrap(), vec!["http://example.com"]);
}

#[test]
fn test_launcher_policies() {
    let result = result_of(&["ABC", "http://example.com"]);

    let every = RecordingOpener::default();
    let launcher =
        UrlLauncher::with_opener(UrlOpenPolicy::EveryDetection, Box::new(every.clone()));
    launcher.launch(&result);
    launcher.launch(&result);
    assert_eq!(
        *every.0.lock().unwrap(),
        vec!["http://example.com", "http://example.com"]
    );

    let once = RecordingOpener::default();
    let launcher =
        UrlLauncher::with_opener(UrlOpenPolicy::OncePerSession, Box::new(once.clone()));
    launcher.launch(&result);
    launcher.launch(&result);
    assert_eq!(*once.0.lock().unwrap(), vec!["http://example.com"]);

    let never = RecordingOpener::default();
    let launcher = UrlLauncher::with_opener(UrlOpenPolicy::Never, Box::new(never.clone()));
    assert!(launcher.launch(&result).is_empty());
    assert!(never.0.lock().unwrap().is_empty());
}

#[test]
fn test_policy_parsing() {
    assert_eq!("always".parse::<UrlOpenPolicy>(), Ok(UrlOpenPolicy::EveryDetection));
    assert_eq!("ONCE".parse::<UrlOpenPolicy>(), Ok(UrlOpenPolicy::OncePerSession));
    assert_eq!("never".parse::<UrlOpenPolicy>(), Ok(UrlOpenPolicy::Never));
    assert!("sometimes".parse::<UrlOpenPolicy>().is_err());
}

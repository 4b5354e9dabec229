// SPDX-License-Identifier: GPL-3.0-only

//! Camera discovery through the GStreamer device monitor

use super::types::CameraDevice;
use gstreamer::prelude::*;
use tracing::{debug, info, warn};

/// Device properties that carry a path the pipeline can open, best first
const PATH_PROPERTIES: &[&str] = &["api.v4l2.path", "device.path", "object.serial"];

/// Enumerate video sources
///
/// Falls back to the system default camera when nothing can be listed, so the
/// result is never empty.
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    debug!("Enumerating cameras");

    if let Err(e) = gstreamer::init() {
        warn!(error = %e, "GStreamer init failed");
        return vec![CameraDevice::system_default()];
    }

    let monitor = gstreamer::DeviceMonitor::new();
    monitor.add_filter(Some("Video/Source"), None);
    if let Err(e) = monitor.start() {
        warn!(error = %e, "Device monitor failed to start");
        return vec![CameraDevice::system_default()];
    }

    let found: Vec<CameraDevice> = monitor
        .devices()
        .iter()
        .map(|device| CameraDevice {
            name: device.display_name().to_string(),
            path: device_path(device).unwrap_or_default(),
        })
        .collect();
    monitor.stop();

    let cameras = dedup_devices(found);
    if cameras.is_empty() {
        info!("No cameras listed, using system default");
        return vec![CameraDevice::system_default()];
    }

    debug!(count = cameras.len(), "Found cameras");
    cameras
}

fn device_path(device: &gstreamer::Device) -> Option<String> {
    let properties = device.properties()?;
    PATH_PROPERTIES.iter().find_map(|key| {
        let value = properties.value(key).ok()?;
        let text = value.transform::<String>().ok()?.get::<String>().ok()?;
        (!text.is_empty()).then_some(text)
    })
}

/// Drop devices that several providers report under the same path
///
/// PipeWire and V4L2 both list the same webcam; the first listing wins.
/// Devices without a path are kept only when no device has one.
pub fn dedup_devices(devices: Vec<CameraDevice>) -> Vec<CameraDevice> {
    let any_with_path = devices.iter().any(|d| !d.path.is_empty());
    let mut seen = std::collections::HashSet::new();

    devices
        .into_iter()
        .filter(|d| {
            if d.path.is_empty() {
                !any_with_path
            } else {
                seen.insert(d.path.clone())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam(name: &str, path: &str) -> CameraDevice {
        CameraDevice {
            name: name.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_dedup_keeps_first_per_path() {
        let cameras = dedup_devices(vec![
            cam("Webcam (PipeWire)", "/dev/video0"),
            cam("Webcam (V4L2)", "/dev/video0"),
            cam("Capture card", "/dev/video2"),
        ]);
        assert_eq!(
            cameras,
            vec![
                cam("Webcam (PipeWire)", "/dev/video0"),
                cam("Capture card", "/dev/video2")
            ]
        );
    }

    #[test]
    fn test_dedup_pathless_devices() {
        assert_eq!(
            dedup_devices(vec![cam("Camera", ""), cam("Webcam", "/dev/video0")]),
            vec![cam("Webcam", "/dev/video0")]
        );
        assert_eq!(
            dedup_devices(vec![cam("Camera", "")]),
            vec![cam("Camera", "")]
        );
    }
}

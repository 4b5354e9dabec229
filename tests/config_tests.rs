// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use scanner::backends::camera::CameraDevice;
use scanner::{Config, UrlOpenPolicy};
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.url_open_policy, UrlOpenPolicy::EveryDetection);
    assert_eq!(config.tick_interval(), Duration::from_millis(10));
    assert_eq!(config.camera_path(), None);
}

#[test]
fn test_config_tick_interval_never_zero() {
    let config = Config {
        tick_interval_ms: 0,
        ..Config::default()
    };
    assert_eq!(config.tick_interval(), Duration::from_millis(1));
}

#[test]
fn test_config_camera_path() {
    let config = Config {
        camera_path: "/dev/video2".to_string(),
        ..Config::default()
    };
    assert_eq!(config.camera_path(), Some("/dev/video2"));
    assert_eq!(config.camera_device().path, "/dev/video2");
}

#[test]
fn test_config_empty_camera_path_opens_default() {
    let device = Config::default().camera_device();
    assert!(device.path.is_empty());
    assert_eq!(device.name, CameraDevice::system_default().name);
}

#[test]
fn test_config_serde_round_trip() {
    let config = Config {
        url_open_policy: UrlOpenPolicy::Never,
        camera_path: "/dev/video0".to_string(),
        tick_interval_ms: 25,
    };
    let json = serde_json::to_string(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}

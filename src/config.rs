// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::CameraDevice;
use crate::browser::UrlOpenPolicy;
use crate::constants::timing;
#[cfg(feature = "gui")]
use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "gui", derive(CosmicConfigEntry), version = 1)]
pub struct Config {
    /// What to do with URL payloads (open every time, once, or never)
    pub url_open_policy: UrlOpenPolicy,
    /// Camera device path the webcam opens (empty = system default)
    pub camera_path: String,
    /// Delay between webcam ticks in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url_open_policy: UrlOpenPolicy::default(),
            camera_path: String::new(),
            tick_interval_ms: timing::TICK_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Tick interval as a duration, never zero
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Camera path to open, `None` for the system default
    pub fn camera_path(&self) -> Option<&str> {
        if self.camera_path.is_empty() {
            None
        } else {
            Some(self.camera_path.as_str())
        }
    }

    /// Device the webcam opens when started
    pub fn camera_device(&self) -> CameraDevice {
        self.camera_path()
            .map(|path| CameraDevice {
                name: path.to_string(),
                path: path.to_string(),
            })
            .unwrap_or_else(CameraDevice::system_default)
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Hardware access for capture
//!
//! - [`camera`]: Camera enumeration and frame capture through GStreamer

pub mod camera;

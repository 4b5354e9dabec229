// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │    CaptureLoop      │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  FrameSource Trait  │  ← read one frame, release
//! └──────────┬──────────┘
//!            │
//!            ▼
//!     ┌──────────────┐
//!     │  GStreamer   │  ← v4l2src / pipewiresrc / autovideosrc ! appsink
//!     └──────────────┘
//! ```

pub mod enumeration;
pub mod pipeline;
pub mod types;

pub use enumeration::enumerate_cameras;
pub use pipeline::GstCameraSource;
pub use types::*;

/// A camera that hands out frames on request
///
/// Sources are pulled, never pushed: the capture loop asks for exactly one
/// frame per tick. Implementations must be safe to release more than once and
/// must release themselves on drop.
pub trait FrameSource: Send {
    /// Block until the next frame is available
    fn read_frame(&mut self) -> BackendResult<CameraFrame>;

    /// Stop capturing and give the device back to the system
    fn release(&mut self);

    /// Short description for logs and status output
    fn describe(&self) -> String {
        "camera".to_string()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> BackendResult<CameraFrame> {
        (**self).read_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Open a camera at the default requested resolution
pub fn open_camera(device: &CameraDevice) -> BackendResult<Box<dyn FrameSource>> {
    let source = GstCameraSource::open(device, CameraFormat::default())?;
    Ok(Box::new(source))
}

//! rollcall-hw — camera capture for the attendance pipeline.
//!
//! Provides V4L2-based camera access (one-shot grabs and persistent
//! streaming) and the grayscale frame type the rest of the system works
//! on.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, CameraStream, DeviceInfo, PixelFormat};
pub use frame::Frame;

//! blink-hw — Camera capture for the blink counter.
//!
//! Provides V4L2-based camera access and conversion of the negotiated pixel
//! format to 8-bit grayscale.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, DeviceInfo, PixelFormat};
pub use frame::{Frame, FrameError};

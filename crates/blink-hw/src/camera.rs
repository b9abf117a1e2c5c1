//! V4L2 camera capture via the `v4l` crate.

use crate::frame::{self, Frame};
use std::io::ErrorKind;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::capability::{Capabilities, Flags as CapFlags};
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

const REQUESTED_WIDTH: u32 = 640;
const REQUESTED_HEIGHT: u32 = 480;
const STREAM_BUFFERS: u32 = 4;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("device cannot capture video")]
    NotCaptureDevice,
    #[error("frame conversion failed: {0}")]
    Frame(#[from] frame::FrameError),
}

/// Info about a discovered V4L2 device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// Negotiated pixel format for the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// YUYV 4:2:2 packed (2 bytes/pixel, extract Y channel).
    Yuyv,
    /// 8-bit grayscale.
    Grey,
    /// 16-bit little-endian grayscale.
    Y16,
}

impl PixelFormat {
    fn from_fourcc(fourcc: FourCC) -> Option<Self> {
        if fourcc == FourCC::new(b"YUYV") {
            Some(Self::Yuyv)
        } else if fourcc == FourCC::new(b"GREY") {
            Some(Self::Grey)
        } else if fourcc == FourCC::new(b"Y16 ") || fourcc == FourCC::new(b"Y16\0") {
            Some(Self::Y16)
        } else {
            None
        }
    }
}

/// V4L2 camera device handle.
pub struct Camera {
    device: Device,
    pub width: u32,
    pub height: u32,
    pub device_path: String,
    pixel_format: PixelFormat,
}

const EBUSY: i32 = 16;

fn open_error(path: &str, err: std::io::Error) -> CameraError {
    match err.kind() {
        ErrorKind::NotFound => CameraError::DeviceNotFound(path.to_string()),
        _ if err.raw_os_error() == Some(EBUSY) => CameraError::DeviceBusy,
        _ => CameraError::DeviceNotFound(format!("{path}: {err}")),
    }
}

/// Open `path` and require the video-capture capability.
fn open_capture_device(path: &str) -> Result<(Device, Capabilities), CameraError> {
    let device = Device::with_path(path).map_err(|e| open_error(path, e))?;
    let caps = device
        .query_caps()
        .map_err(|e| CameraError::CaptureFailed(format!("{path}: capability query: {e}")))?;
    if !caps.capabilities.contains(CapFlags::VIDEO_CAPTURE) {
        return Err(CameraError::NotCaptureDevice);
    }
    Ok((device, caps))
}

/// Request YUYV at the default size and return whatever the driver settled on,
/// as long as it converts to grayscale.
fn negotiate_format(device: &Device) -> Result<(Format, PixelFormat), CameraError> {
    let mut wanted = device
        .format()
        .map_err(|e| CameraError::FormatNegotiationFailed(format!("get: {e}")))?;
    wanted.fourcc = FourCC::new(b"YUYV");
    wanted.width = REQUESTED_WIDTH;
    wanted.height = REQUESTED_HEIGHT;

    let got = device
        .set_format(&wanted)
        .map_err(|e| CameraError::FormatNegotiationFailed(format!("set: {e}")))?;
    match PixelFormat::from_fourcc(got.fourcc) {
        Some(pf) => Ok((got, pf)),
        None => Err(CameraError::FormatNegotiationFailed(format!(
            "driver chose {:?}; grayscale needs YUYV, GREY or Y16",
            got.fourcc
        ))),
    }
}

/// Index `N` of a `videoN` device node name.
fn video_index(name: &str) -> Option<u32> {
    name.strip_prefix("video")?.parse().ok()
}

impl Camera {
    /// Open a V4L2 capture device such as `/dev/video0` and negotiate a
    /// grayscale-convertible format.
    pub fn open(device_path: &str) -> Result<Self, CameraError> {
        let (device, caps) = open_capture_device(device_path)?;
        let (format, pixel_format) = negotiate_format(&device)?;

        tracing::info!(
            device = device_path,
            card = %caps.card,
            width = format.width,
            height = format.height,
            format = ?pixel_format,
            "camera ready"
        );

        Ok(Self {
            device,
            width: format.width,
            height: format.height,
            device_path: device_path.to_string(),
            pixel_format,
        })
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Capture `count` consecutive frames as grayscale, calling `on_frame`
    /// for each. Stops early when `on_frame` returns `false`.
    pub fn capture_frames<F>(&self, count: usize, mut on_frame: F) -> Result<usize, CameraError>
    where
        F: FnMut(Frame) -> bool,
    {
        let mut stream = MmapStream::with_buffers(&self.device, BufType::VideoCapture, STREAM_BUFFERS)
            .map_err(|e| CameraError::CaptureFailed(format!("failed to create mmap stream: {e}")))?;

        let mut captured = 0usize;
        while captured < count {
            let (buf, meta) = stream
                .next()
                .map_err(|e| CameraError::CaptureFailed(format!("failed to dequeue buffer: {e}")))?;

            let gray = self.to_grayscale(buf)?;
            captured += 1;

            let keep_going = on_frame(Frame {
                data: gray,
                width: self.width,
                height: self.height,
                timestamp: std::time::Instant::now(),
                sequence: meta.sequence,
            });
            if !keep_going {
                break;
            }
        }

        Ok(captured)
    }

    fn to_grayscale(&self, buf: &[u8]) -> Result<Vec<u8>, CameraError> {
        let gray = match self.pixel_format {
            PixelFormat::Grey => frame::grey_to_grayscale(buf, self.width, self.height)?,
            PixelFormat::Yuyv => frame::yuyv_to_grayscale(buf, self.width, self.height)?,
            PixelFormat::Y16 => frame::y16_to_grayscale(buf, self.width, self.height)?,
        };
        Ok(gray)
    }

    /// Capture-capable `/dev/videoN` nodes, in index order. Nodes that
    /// cannot be opened are skipped.
    pub fn list_devices() -> Vec<DeviceInfo> {
        let entries = match std::fs::read_dir("/dev") {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "cannot scan /dev");
                return Vec::new();
            }
        };

        let mut nodes: Vec<(u32, String)> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let index = video_index(&name)?;
                Some((index, format!("/dev/{name}")))
            })
            .collect();
        nodes.sort_unstable();

        nodes
            .into_iter()
            .filter_map(|(_, path)| match open_capture_device(&path) {
                Ok((_, caps)) => Some(DeviceInfo {
                    path,
                    name: caps.card,
                    driver: caps.driver,
                    bus: caps.bus,
                }),
                Err(e) => {
                    tracing::debug!(path, error = %e, "skipping video node");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_from_fourcc() {
        assert_eq!(PixelFormat::from_fourcc(FourCC::new(b"YUYV")), Some(PixelFormat::Yuyv));
        assert_eq!(PixelFormat::from_fourcc(FourCC::new(b"GREY")), Some(PixelFormat::Grey));
        assert_eq!(PixelFormat::from_fourcc(FourCC::new(b"Y16 ")), Some(PixelFormat::Y16));
        assert_eq!(PixelFormat::from_fourcc(FourCC::new(b"MJPG")), None);
    }

    #[test]
    fn test_video_index() {
        assert_eq!(video_index("video0"), Some(0));
        assert_eq!(video_index("video12"), Some(12));
        assert_eq!(video_index("video"), None);
        assert_eq!(video_index("videox"), None);
        assert_eq!(video_index("media0"), None);
    }

    #[test]
    fn test_open_error_classification() {
        let missing = std::io::Error::from(ErrorKind::NotFound);
        assert!(matches!(open_error("/dev/video9", missing), CameraError::DeviceNotFound(p) if p == "/dev/video9"));

        let busy = std::io::Error::from_raw_os_error(EBUSY);
        assert!(matches!(open_error("/dev/video0", busy), CameraError::DeviceBusy));

        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        assert!(matches!(open_error("/dev/video0", denied), CameraError::DeviceNotFound(p) if p.starts_with("/dev/video0: ")));
    }

    #[test]
    fn test_open_missing_device() {
        match Camera::open("/dev/blink-no-such-device") {
            Err(CameraError::DeviceNotFound(path)) => assert!(path.contains("no-such-device")),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("expected missing device"),
        }
    }
}

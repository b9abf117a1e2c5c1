//! Raw grayscale capture: frames straight from the camera, no landmarks.

use crate::signal::Interrupt;
use anyhow::{Context, Result};
use blink_hw::{Camera, Frame};
use std::path::{Path, PathBuf};

fn frame_path(dir: &Path, sequence: u32) -> PathBuf {
    dir.join(format!("frame_{sequence:06}.png"))
}

fn save_png(frame: &Frame, dir: &Path) -> Result<PathBuf> {
    let img = image::GrayImage::from_raw(frame.width, frame.height, frame.data.clone())
        .context("frame buffer does not match its dimensions")?;
    let path = frame_path(dir, frame.sequence);
    img.save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Capture `count` grayscale frames, optionally writing each as a PNG.
/// Returns the number of frames captured.
pub fn capture_gray(
    device: &str,
    count: usize,
    out_dir: Option<&Path>,
    interrupt: &Interrupt,
) -> Result<usize> {
    let camera = Camera::open(device).with_context(|| format!("cannot open camera {device}"))?;
    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create output directory {}", dir.display()))?;
    }

    let _guard = interrupt.begin_session();
    let mut save_err = None;
    let captured = camera.capture_frames(count, |frame| {
        let brightness = frame.avg_brightness();
        println!(
            "frame {}: {}x{} avg brightness {brightness:.1}",
            frame.sequence, frame.width, frame.height
        );
        if let Some(dir) = out_dir {
            match save_png(&frame, dir) {
                Ok(path) => tracing::debug!(path = %path.display(), "saved frame"),
                Err(e) => {
                    save_err = Some(e);
                    return false;
                }
            }
        }
        !interrupt.should_stop()
    })?;

    if let Some(e) = save_err {
        return Err(e);
    }
    tracing::info!(device, captured, format = ?camera.pixel_format(), "grayscale capture finished");
    Ok(captured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_frame_path() {
        let p = frame_path(Path::new("/tmp/out"), 42);
        assert_eq!(p, PathBuf::from("/tmp/out/frame_000042.png"));
    }

    #[test]
    fn test_save_png_rejects_short_buffer() {
        let frame = Frame {
            data: vec![0u8; 3],
            width: 2,
            height: 2,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        };
        let dir = tempdir().unwrap();
        assert!(save_png(&frame, dir.path()).is_err());
        assert!(!frame_path(dir.path(), 0).exists());
    }

    #[test]
    fn test_save_png_writes_frame() {
        let frame = Frame {
            data: vec![0, 64, 128, 255],
            width: 2,
            height: 2,
            timestamp: std::time::Instant::now(),
            sequence: 7,
        };
        let dir = tempdir().unwrap();
        let path = save_png(&frame, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("frame_000007.png"));

        let img = image::open(&path).unwrap().into_luma8();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.into_raw(), vec![0, 64, 128, 255]);
    }
}

//! Landmark numbering schemes.
//!
//! Providers number facial keypoints in model-specific ways. A scheme picks
//! the six points of each eye out of a full face shape and puts them in
//! [`EyeLandmarks`] order.

use crate::types::{EyeLandmarks, FaceEyes, Point};

/// Maps a provider's face shape onto eye landmarks.
pub trait LandmarkScheme {
    /// Short name used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Extract the eyes from one face shape. Returns `None` for an eye
    /// whose landmarks are not all present.
    fn eyes(&self, shape: &[Point]) -> FaceEyes;
}

/// dlib / iBUG 300-W 68-point layout.
pub struct Ibug68;

/// Left eye indices, outer corner first.
const IBUG68_LEFT_EYE: [usize; 6] = [36, 37, 38, 39, 40, 41];
const IBUG68_RIGHT_EYE: [usize; 6] = [42, 43, 44, 45, 46, 47];

/// Gather six indexed points, or `None` if the shape is too short.
fn pick_eye(shape: &[Point], idx: [usize; 6]) -> Option<EyeLandmarks> {
    let mut points = [Point::new(0.0, 0.0); 6];
    for (slot, &i) in points.iter_mut().zip(idx.iter()) {
        *slot = *shape.get(i)?;
    }
    Some(EyeLandmarks::new(points))
}

impl LandmarkScheme for Ibug68 {
    fn name(&self) -> &'static str {
        "ibug68"
    }

    fn eyes(&self, shape: &[Point]) -> FaceEyes {
        FaceEyes {
            left: pick_eye(shape, IBUG68_LEFT_EYE),
            right: pick_eye(shape, IBUG68_RIGHT_EYE),
        }
    }
}

/// Twelve points: left eye then right eye, each already in
/// [`EyeLandmarks`] order. For providers that emit only the eyes.
pub struct EyesOnly;

impl LandmarkScheme for EyesOnly {
    fn name(&self) -> &'static str {
        "eyes12"
    }

    fn eyes(&self, shape: &[Point]) -> FaceEyes {
        FaceEyes {
            left: pick_eye(shape, [0, 1, 2, 3, 4, 5]),
            right: pick_eye(shape, [6, 7, 8, 9, 10, 11]),
        }
    }
}

/// Look up a scheme by its configured name.
pub fn scheme_by_name(name: &str) -> Option<Box<dyn LandmarkScheme + Send>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "ibug68" | "dlib68" => Some(Box::new(Ibug68)),
        "eyes12" => Some(Box::new(EyesOnly)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f32, (i * 2) as f32)).collect()
    }

    #[test]
    fn test_ibug68_indices() {
        let eyes = Ibug68.eyes(&shape(68));
        let left = eyes.left.unwrap();
        let right = eyes.right.unwrap();
        assert_eq!(left.outer_corner(), Point::new(36.0, 72.0));
        assert_eq!(left.inner_corner(), Point::new(39.0, 78.0));
        assert_eq!(right.outer_corner(), Point::new(42.0, 84.0));
        assert_eq!(right.0[5], Point::new(47.0, 94.0));
    }

    #[test]
    fn test_ibug68_truncated_shape() {
        let eyes = Ibug68.eyes(&shape(45));
        assert!(eyes.left.is_some());
        assert!(eyes.right.is_none());

        let eyes = Ibug68.eyes(&shape(10));
        assert!(eyes.left.is_none());
        assert!(eyes.right.is_none());
    }

    #[test]
    fn test_eyes_only() {
        let eyes = EyesOnly.eyes(&shape(12));
        assert_eq!(eyes.left.unwrap().outer_corner(), Point::new(0.0, 0.0));
        assert_eq!(eyes.right.unwrap().outer_corner(), Point::new(6.0, 12.0));
    }

    #[test]
    fn test_scheme_by_name() {
        assert_eq!(scheme_by_name("iBUG68").unwrap().name(), "ibug68");
        assert_eq!(scheme_by_name("dlib68").unwrap().name(), "ibug68");
        assert_eq!(scheme_by_name("eyes12").unwrap().name(), "eyes12");
        assert!(scheme_by_name("mediapipe").is_none());
    }
}

//! Blink ratio — eye width over eye openness.
//!
//! Wide-open eyes give a small ratio; as the lids close the vertical
//! distance collapses and the ratio grows without bound.

use crate::types::EyeLandmarks;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum RatioError {
    #[error("vertical eye distance is zero")]
    DivideByZero,
    #[error("blink ratio is not finite")]
    NonFinite,
    #[error("no eye landmarks available")]
    NoEyes,
}

/// How to score a face when only one eye's landmarks are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SingleEyePolicy {
    /// Use the visible eye's ratio for both eyes.
    #[default]
    Substitute,
    /// Treat the frame as having no reliable reading.
    Skip,
}

impl std::str::FromStr for SingleEyePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substitute" => Ok(Self::Substitute),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown single-eye policy: {other} (expected substitute or skip)")),
        }
    }
}

/// Blink ratio of a single eye: corner-to-corner distance divided by the
/// distance between the lower-lid and upper-lid midpoints.
pub fn eye_ratio(eye: &EyeLandmarks) -> Result<f32, RatioError> {
    let horizontal = eye.outer_corner().distance(&eye.inner_corner());
    let vertical = eye.lower_lid_center().distance(&eye.upper_lid_center());

    if vertical == 0.0 {
        return Err(RatioError::DivideByZero);
    }

    let ratio = horizontal / vertical;
    if !ratio.is_finite() {
        return Err(RatioError::NonFinite);
    }
    Ok(ratio)
}

/// Mean blink ratio of both eyes.
pub fn frame_ratio(left: &EyeLandmarks, right: &EyeLandmarks) -> Result<f32, RatioError> {
    let left = eye_ratio(left)?;
    let right = eye_ratio(right)?;
    Ok((left + right) / 2.0)
}

/// Blink ratio for a face whose eyes may be partially missing.
pub fn face_ratio(
    left: Option<&EyeLandmarks>,
    right: Option<&EyeLandmarks>,
    policy: SingleEyePolicy,
) -> Result<f32, RatioError> {
    match (left, right, policy) {
        (Some(l), Some(r), _) => frame_ratio(l, r),
        (Some(eye), None, SingleEyePolicy::Substitute)
        | (None, Some(eye), SingleEyePolicy::Substitute) => eye_ratio(eye),
        _ => Err(RatioError::NoEyes),
    }
}

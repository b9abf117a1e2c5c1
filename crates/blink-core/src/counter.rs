//! Blink hysteresis — two states (Open, Closed), one counted edge.
//!
//! A frame whose ratio exceeds the threshold marks the eyes closed. The next
//! frame at or below the threshold registers the blink and reopens them.
//! There is no multi-frame confirmation: one noisy frame is enough to enter
//! or leave Closed.

use crate::ratio::{face_ratio, RatioError, SingleEyePolicy};
use crate::types::FrameObservation;
use serde::Serialize;

/// Ratio above which both eyes are judged shut. Tuned for dlib 68-point
/// landmarks in pixel coordinates on a typical webcam.
pub const DEFAULT_THRESHOLD: f32 = 5.5;

/// Per-session blink state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BlinkState {
    pub is_closed: bool,
    pub blink_count: u64,
}

impl BlinkState {
    pub const fn new() -> Self {
        Self {
            is_closed: false,
            blink_count: 0,
        }
    }

    /// Advance the machine by one frame's ratio.
    pub fn update(self, ratio: f32, threshold: f32) -> Self {
        if ratio > threshold {
            Self {
                is_closed: true,
                ..self
            }
        } else if self.is_closed {
            Self {
                is_closed: false,
                blink_count: self.blink_count + 1,
            }
        } else {
            self
        }
    }

    /// Advance by a reading that may have failed. A failed reading leaves
    /// the state untouched.
    pub fn apply(self, reading: Result<f32, RatioError>, threshold: f32) -> Self {
        match reading {
            Ok(ratio) => self.update(ratio, threshold),
            Err(_) => self,
        }
    }
}

/// What happened to the state for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// No face in the frame; state unchanged.
    NoFace,
    /// Landmarks present but unusable; state unchanged.
    Degenerate(RatioError),
    /// State advanced with this ratio. `blinked` is set on the Closed → Open edge.
    Updated { ratio: f32, blinked: bool },
}

/// Threshold-bound blink counter owned by one session.
#[derive(Debug, Clone)]
pub struct BlinkCounter {
    state: BlinkState,
    threshold: f32,
    single_eye: SingleEyePolicy,
}

impl BlinkCounter {
    pub fn new(threshold: f32, single_eye: SingleEyePolicy) -> Self {
        Self {
            state: BlinkState::new(),
            threshold,
            single_eye,
        }
    }

    pub fn state(&self) -> BlinkState {
        self.state
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn blink_count(&self) -> u64 {
        self.state.blink_count
    }

    /// Feed one frame's observation.
    pub fn observe(&mut self, obs: &FrameObservation) -> FrameOutcome {
        let Some(face) = obs.face.as_ref() else {
            return FrameOutcome::NoFace;
        };

        let reading = face_ratio(face.left.as_ref(), face.right.as_ref(), self.single_eye);
        let before = self.state.blink_count;
        self.state = self.state.apply(reading, self.threshold);

        match reading {
            Ok(ratio) => FrameOutcome::Updated {
                ratio,
                blinked: self.state.blink_count > before,
            },
            Err(e) => {
                tracing::debug!(seq = obs.sequence, error = %e, "skipping frame with no reliable reading");
                FrameOutcome::Degenerate(e)
            }
        }
    }
}

impl Default for BlinkCounter {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, SingleEyePolicy::default())
    }
}

//! blink-core — Eye blink counting from facial landmarks.
//!
//! Reduces each eye's six landmarks to a width/openness ratio and counts a
//! blink on every closed → open transition across a threshold. Landmarks are
//! supplied by an external provider as a JSON-lines stream.

pub mod counter;
pub mod ratio;
pub mod scheme;
pub mod session;
pub mod stream;
pub mod types;

pub use counter::{BlinkCounter, BlinkState, FrameOutcome, DEFAULT_THRESHOLD};
pub use ratio::{eye_ratio, frame_ratio, RatioError, SingleEyePolicy};
pub use scheme::{scheme_by_name, Ibug68, LandmarkScheme};
pub use session::{run_session, FrameReport, SessionEnd, SessionError, SessionSummary};
pub use stream::{LandmarkStream, ObservationSource, StreamError};
pub use types::{midpoint, EyeLandmarks, FaceEyes, FrameObservation, Point};

//! Frame-sequential blink counting session.
//!
//! Pulls observations one at a time, feeds each to a fresh [`BlinkCounter`],
//! and reports every frame before reading the next. Cancellation is polled
//! between frames; a frame is never half-applied.

use crate::counter::{BlinkCounter, FrameOutcome};
use crate::stream::{ObservationSource, StreamError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("landmark source failed after {frames} frames: {source}")]
    Source {
        frames: u64,
        #[source]
        source: StreamError,
    },
}

/// Per-frame report handed to the caller's display layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub sequence: u64,
    pub outcome: FrameOutcome,
    pub blink_count: u64,
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// The source ran out of frames.
    Exhausted,
    /// The caller asked to stop.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub frames: u64,
    pub frames_with_face: u64,
    pub degenerate_frames: u64,
    pub blinks: u64,
    pub end: SessionEnd,
}

/// Run one session to completion.
///
/// `should_stop` is checked before each frame is read. `on_frame` runs after
/// the frame's state update.
pub fn run_session<S, C, F>(
    source: &mut S,
    mut counter: BlinkCounter,
    mut should_stop: C,
    mut on_frame: F,
) -> Result<SessionSummary, SessionError>
where
    S: ObservationSource + ?Sized,
    C: FnMut() -> bool,
    F: FnMut(&FrameReport),
{
    let mut frames = 0u64;
    let mut frames_with_face = 0u64;
    let mut degenerate_frames = 0u64;

    tracing::debug!(threshold = counter.threshold(), "session started");

    let end = loop {
        if should_stop() {
            break SessionEnd::Interrupted;
        }

        let obs = match source.next_observation() {
            Ok(Some(obs)) => obs,
            Ok(None) => break SessionEnd::Exhausted,
            Err(source) => return Err(SessionError::Source { frames, source }),
        };

        let outcome = counter.observe(&obs);
        frames += 1;
        match outcome {
            FrameOutcome::NoFace => {}
            FrameOutcome::Degenerate(_) => {
                frames_with_face += 1;
                degenerate_frames += 1;
            }
            FrameOutcome::Updated { ratio, blinked } => {
                frames_with_face += 1;
                if blinked {
                    tracing::debug!(seq = obs.sequence, ratio, blinks = counter.blink_count(), "blink");
                }
            }
        }

        on_frame(&FrameReport {
            sequence: obs.sequence,
            outcome,
            blink_count: counter.blink_count(),
        });
    };

    let summary = SessionSummary {
        frames,
        frames_with_face,
        degenerate_frames,
        blinks: counter.blink_count(),
        end,
    };
    tracing::info!(
        frames,
        frames_with_face,
        degenerate_frames,
        blinks = summary.blinks,
        end = ?end,
        "session finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratio::RatioError;
    use crate::types::{EyeLandmarks, FaceEyes, FrameObservation, Point};
    use std::collections::VecDeque;

    struct Scripted(VecDeque<Result<FrameObservation, StreamError>>);

    impl ObservationSource for Scripted {
        fn next_observation(&mut self) -> Result<Option<FrameObservation>, StreamError> {
            self.0.pop_front().transpose()
        }
    }

    fn eye(open: f32) -> EyeLandmarks {
        let h = open / 2.0;
        EyeLandmarks::new([
            Point::new(0.0, 0.0),
            Point::new(2.0, -h),
            Point::new(4.0, -h),
            Point::new(6.0, 0.0),
            Point::new(4.0, h),
            Point::new(2.0, h),
        ])
    }

    fn frame(seq: u64, open: Option<f32>) -> Result<FrameObservation, StreamError> {
        Ok(match open {
            Some(o) => FrameObservation {
                sequence: seq,
                faces_detected: 1,
                face: Some(FaceEyes {
                    left: Some(eye(o)),
                    right: Some(eye(o)),
                }),
            },
            None => FrameObservation::empty(seq),
        })
    }

    #[test]
    fn test_session_counts_blinks() {
        // Ratios: 3.0, 12.0, none, 0-division, 3.0, 12.0, 3.0
        let mut src = Scripted(
            vec![
                frame(0, Some(2.0)),
                frame(1, Some(0.5)),
                frame(2, None),
                frame(3, Some(0.0)),
                frame(4, Some(2.0)),
                frame(5, Some(0.5)),
                frame(6, Some(2.0)),
            ]
            .into(),
        );

        let mut reports = Vec::new();
        let summary = run_session(&mut src, BlinkCounter::default(), || false, |r| {
            reports.push(*r)
        })
        .unwrap();

        assert_eq!(summary.frames, 7);
        assert_eq!(summary.frames_with_face, 6);
        assert_eq!(summary.degenerate_frames, 1);
        assert_eq!(summary.blinks, 2);
        assert_eq!(summary.end, SessionEnd::Exhausted);

        assert_eq!(reports.len(), 7);
        assert_eq!(reports[2].outcome, FrameOutcome::NoFace);
        assert_eq!(
            reports[3].outcome,
            FrameOutcome::Degenerate(RatioError::DivideByZero)
        );
        assert!(matches!(reports[4].outcome, FrameOutcome::Updated { blinked: true, .. }));
        assert_eq!(reports[4].blink_count, 1);
        assert_eq!(reports[6].blink_count, 2);
    }

    #[test]
    fn test_session_interrupted() {
        let mut src = Scripted(vec![frame(0, Some(0.5)), frame(1, Some(2.0)), frame(2, Some(2.0))].into());
        let mut polls = 0;
        let summary = run_session(
            &mut src,
            BlinkCounter::default(),
            || {
                polls += 1;
                polls > 2
            },
            |_| {},
        )
        .unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.blinks, 1);
        assert_eq!(summary.end, SessionEnd::Interrupted);
    }

    #[test]
    fn test_session_source_error() {
        let err = StreamError::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof"));
        let mut src = Scripted(vec![frame(0, Some(2.0)), Err(err)].into());
        match run_session(&mut src, BlinkCounter::default(), || false, |_| {}) {
            Err(SessionError::Source { frames, .. }) => assert_eq!(frames, 1),
            other => panic!("expected source error, got {other:?}"),
        }
    }

    #[test]
    fn test_summary_serializes() {
        let summary = SessionSummary {
            frames: 3,
            frames_with_face: 2,
            degenerate_frames: 0,
            blinks: 1,
            end: SessionEnd::Interrupted,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["blinks"], 1);
        assert_eq!(json["end"], "interrupted");
    }
}

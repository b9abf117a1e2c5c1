//! Console front end for landmark-stream sessions.

use crate::config::Config;
use crate::signal::Interrupt;
use anyhow::{Context, Result};
use blink_core::{
    run_session, BlinkCounter, FrameOutcome, FrameReport, LandmarkStream, ObservationSource,
    SessionEnd, SessionSummary,
};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};

/// Open a landmark source: `-` is stdin, anything else a file or FIFO.
pub fn open_landmarks(source: &str) -> Result<Box<dyn BufRead + Send>> {
    if source == "-" {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = File::open(source).with_context(|| format!("cannot open landmark source {source}"))?;
    Ok(Box::new(BufReader::new(file)))
}

fn report_line(report: &FrameReport) -> Option<String> {
    match report.outcome {
        FrameOutcome::Updated { blinked: true, ratio } => Some(format!(
            "frame {}: BLINK DETECTED (ratio {ratio:.2}, total {})",
            report.sequence, report.blink_count
        )),
        _ => None,
    }
}

/// Count blinks over one landmark stream, writing progress to `out`.
pub fn count_blinks<R: BufRead>(
    reader: R,
    config: &Config,
    interrupt: &Interrupt,
    out: &mut dyn Write,
) -> Result<SessionSummary> {
    let mut stream = LandmarkStream::new(reader, config.landmark_scheme()?);
    let counter = BlinkCounter::new(config.threshold, config.single_eye);

    let _guard = interrupt.begin_session();
    let mut write_err = None;
    let summary = run_session(
        &mut stream,
        counter,
        || interrupt.should_stop(),
        |report| {
            tracing::trace!(seq = report.sequence, outcome = ?report.outcome, "frame");
            if let Some(line) = report_line(report) {
                if let Err(e) = writeln!(out, "{line}") {
                    write_err.get_or_insert(e);
                }
            }
        },
    )?;
    if let Some(e) = write_err {
        return Err(e.into());
    }
    Ok(summary)
}

/// Closing lines of a blink session.
pub fn print_summary(summary: &SessionSummary, out: &mut dyn Write) -> Result<()> {
    match summary.end {
        SessionEnd::Exhausted => writeln!(out, "Reached end of the video.")?,
        SessionEnd::Interrupted => writeln!(out, "Frame capturing stopped.")?,
    }
    writeln!(out, "Total blinks: {}", summary.blinks)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceSummary {
    pub frames: u64,
    pub frames_with_face: u64,
    pub max_faces: usize,
    pub end: SessionEnd,
}

/// Report the number of faces in every frame of a landmark stream.
pub fn count_faces<R: BufRead>(
    reader: R,
    config: &Config,
    interrupt: &Interrupt,
    out: &mut dyn Write,
) -> Result<FaceSummary> {
    let mut stream = LandmarkStream::new(reader, config.landmark_scheme()?);
    let _guard = interrupt.begin_session();

    let mut summary = FaceSummary {
        frames: 0,
        frames_with_face: 0,
        max_faces: 0,
        end: SessionEnd::Exhausted,
    };

    loop {
        if interrupt.should_stop() {
            summary.end = SessionEnd::Interrupted;
            break;
        }
        let Some(obs) = stream
            .next_observation()
            .with_context(|| format!("landmark source failed after {} frames", summary.frames))?
        else {
            break;
        };

        summary.frames += 1;
        if obs.faces_detected > 0 {
            summary.frames_with_face += 1;
        }
        summary.max_faces = summary.max_faces.max(obs.faces_detected);
        writeln!(out, "frame {}: {} faces detected", obs.sequence, obs.faces_detected)?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const OPEN: &str = "[0,0],[2,-1],[4,-1],[6,0],[4,1],[2,1]";
    const SHUT: &str = "[0,0],[2,-0.25],[4,-0.25],[6,0],[4,0.25],[2,0.25]";

    fn eyes12_config() -> Config {
        Config {
            scheme: "eyes12".into(),
            ..Config::default()
        }
    }

    fn line(eye: &str) -> String {
        format!("{{\"faces\": [[{eye},{eye}]]}}\n")
    }

    #[test]
    fn test_count_blinks_stream() {
        let input = [OPEN, SHUT, SHUT, OPEN, OPEN, SHUT, OPEN]
            .iter()
            .map(|e| line(e))
            .collect::<String>();
        let mut out = Vec::new();
        let summary =
            count_blinks(Cursor::new(input), &eyes12_config(), &Interrupt::default(), &mut out).unwrap();

        assert_eq!(summary.blinks, 2);
        assert_eq!(summary.frames, 7);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("BLINK DETECTED").count(), 2);
        assert!(text.contains("frame 3: BLINK DETECTED"));
    }

    #[test]
    fn test_count_blinks_threshold_from_config() {
        // Open eyes score 3.0; a threshold below that keeps them "closed".
        let input = [OPEN, OPEN].iter().map(|e| line(e)).collect::<String>();
        let config = Config {
            threshold: 2.0,
            ..eyes12_config()
        };
        let summary =
            count_blinks(Cursor::new(input), &config, &Interrupt::default(), &mut Vec::new()).unwrap();
        assert_eq!(summary.blinks, 0);
    }

    #[test]
    fn test_count_blinks_malformed_input() {
        let input = format!("{}{{oops\n", line(OPEN));
        let err = count_blinks(Cursor::new(input), &eyes12_config(), &Interrupt::default(), &mut Vec::new())
            .unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_print_summary() {
        let summary = SessionSummary {
            frames: 10,
            frames_with_face: 9,
            degenerate_frames: 0,
            blinks: 3,
            end: SessionEnd::Exhausted,
        };
        let mut out = Vec::new();
        print_summary(&summary, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Reached end of the video."));
        assert!(text.contains("Total blinks: 3"));
    }

    #[test]
    fn test_count_faces() {
        let input = format!(
            "{{\"frame\": 1, \"faces\": []}}\n{}{{\"frame\": 9, \"faces\": [[[1,1]], [[2,2]], [[3,3]]]}}\n",
            line(OPEN)
        );
        let mut out = Vec::new();
        let summary =
            count_faces(Cursor::new(input), &eyes12_config(), &Interrupt::default(), &mut out).unwrap();

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.frames_with_face, 2);
        assert_eq!(summary.max_faces, 3);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("frame 1: 0 faces detected"));
        assert!(text.contains("frame 9: 3 faces detected"));
    }

    #[test]
    fn test_open_missing_file() {
        let err = open_landmarks("/nonexistent/blink/landmarks.jsonl").err().unwrap();
        assert!(err.to_string().contains("cannot open landmark source"));
    }
}

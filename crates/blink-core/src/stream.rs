//! JSON-lines landmark stream decoding.
//!
//! Each non-blank line is one frame:
//!
//! ```text
//! {"frame": 17, "faces": [[[x0, y0], [x1, y1], ...], ...]}
//! ```
//!
//! `frame` is optional and defaults to the 0-based index of the record.
//! Shapes are numbered according to the configured [`LandmarkScheme`].

use crate::scheme::LandmarkScheme;
use crate::types::{FrameObservation, Point};
use serde::Deserialize;
use std::io::BufRead;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("failed to read landmark stream: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed landmark record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One decoded line of the stream.
#[derive(Debug, Clone, Deserialize)]
pub struct LandmarkRecord {
    #[serde(default)]
    pub frame: Option<u64>,
    #[serde(default)]
    pub faces: Vec<Vec<(f32, f32)>>,
}

/// Pull-based producer of per-frame observations.
pub trait ObservationSource {
    /// Next frame, or `Ok(None)` when the source is exhausted.
    fn next_observation(&mut self) -> Result<Option<FrameObservation>, StreamError>;
}

/// Reads landmark records from any buffered reader.
pub struct LandmarkStream<R> {
    reader: R,
    scheme: Box<dyn LandmarkScheme + Send>,
    line_no: usize,
    records: u64,
    buf: String,
}

impl<R: BufRead> LandmarkStream<R> {
    pub fn new(reader: R, scheme: Box<dyn LandmarkScheme + Send>) -> Self {
        Self {
            reader,
            scheme,
            line_no: 0,
            records: 0,
            buf: String::new(),
        }
    }

    /// Next raw record, skipping blank lines.
    pub fn next_record(&mut self) -> Result<Option<LandmarkRecord>, StreamError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }

            let record = serde_json::from_str::<LandmarkRecord>(line).map_err(|source| {
                StreamError::Parse {
                    line: self.line_no,
                    source,
                }
            })?;
            return Ok(Some(record));
        }
    }

    /// Turn a record into an observation of its first face.
    fn to_observation(&self, record: LandmarkRecord, index: u64) -> FrameObservation {
        let sequence = record.frame.unwrap_or(index);
        let faces_detected = record.faces.len();

        let face = record.faces.first().map(|shape| {
            let points: Vec<Point> = shape.iter().copied().map(Point::from).collect();
            self.scheme.eyes(&points)
        });

        if faces_detected > 1 {
            tracing::trace!(seq = sequence, faces = faces_detected, "multiple faces; using the first");
        }

        FrameObservation {
            sequence,
            faces_detected,
            face,
        }
    }
}

impl<R: BufRead> ObservationSource for LandmarkStream<R> {
    fn next_observation(&mut self) -> Result<Option<FrameObservation>, StreamError> {
        let Some(record) = self.next_record()? else {
            return Ok(None);
        };
        let index = self.records;
        self.records += 1;
        Ok(Some(self.to_observation(record, index)))
    }
}

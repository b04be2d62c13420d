use std::io::BufRead;

use serde::Deserialize;

use crate::{
    error::{Result, TrackerError},
    types::{HandFrame, LandmarkFrame, LandmarkPoint},
};

/// Anything that yields per-frame hand landmarks: a live model, a recording.
/// `Ok(None)` marks the end of the stream.
pub trait LandmarkSource: Send + 'static {
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>>;
}

#[derive(Deserialize, Debug)]
struct HandRecord {
    landmarks: Vec<LandmarkPoint>,
    handedness: String,
    #[serde(default)]
    handedness_confidence: f32,
}

#[derive(Deserialize, Debug)]
struct FrameRecord {
    #[serde(default)]
    timestamp_ms: Option<i64>,
    #[serde(default)]
    hands: Vec<HandRecord>,
}

/// Parses one recorded frame. Missing timestamps are filled with the
/// current wall-clock time.
pub fn parse_frame(line: &str) -> Result<LandmarkFrame> {
    let record: FrameRecord = serde_json::from_str(line)?;
    let hands = record
        .hands
        .into_iter()
        .map(|hand| -> Result<HandFrame> {
            Ok(HandFrame::new(
                hand.landmarks,
                hand.handedness.parse()?,
                hand.handedness_confidence,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LandmarkFrame {
        timestamp_ms: record
            .timestamp_ms
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
        hands,
    })
}

/// Reads one JSON frame per line. Blank lines are skipped; a line that does
/// not parse is logged and skipped so one corrupt record does not end a
/// replay.
pub struct JsonLinesSource<R> {
    reader: R,
    line_number: usize,
    buf: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead + Send + 'static> LandmarkSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            match parse_frame(line) {
                Ok(frame) => return Ok(Some(frame)),
                Err(err @ (TrackerError::Json(_) | TrackerError::InvalidFrame(_))) => {
                    log::warn!("skipping frame on line {}: {err}", self.line_number);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

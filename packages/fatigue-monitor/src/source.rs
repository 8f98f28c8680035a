//! JSON Lines landmark source.
//!
//! One object per line: `{"timestamp": 12.5, "landmarks": [[x, y], ...]}`.
//! `timestamp` is optional (wall clock is used instead); `landmarks` may be
//! `null`, empty or absent when no face was found in the frame.

use chrono::Utc;
use fatigue_engine::{LandmarkSet, Point2D};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::config::InputSource;
use crate::error::{MonitorError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct FrameRecord {
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub landmarks: Option<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone)]
pub struct Frame {
    /// 1-based input line.
    pub line: u64,
    pub timestamp: f64,
    pub points: Option<Vec<Point2D>>,
}

impl Frame {
    pub fn landmarks(&self) -> Option<LandmarkSet<'_>> {
        self.points.as_deref().map(LandmarkSet::new)
    }
}

pub fn wall_clock_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Turns optional per-frame timestamps into a non-decreasing clock.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    last: Option<f64>,
}

impl FrameClock {
    pub fn stamp(&mut self, timestamp: Option<f64>) -> f64 {
        let now = timestamp
            .filter(|t| t.is_finite())
            .unwrap_or_else(wall_clock_secs);
        let now = match self.last {
            Some(last) if now < last => last,
            _ => now,
        };
        self.last = Some(now);
        now
    }

    pub fn last(&self) -> Option<f64> {
        self.last
    }
}

pub fn parse_frame(line: u64, text: &str) -> Result<FrameRecord> {
    serde_json::from_str(text).map_err(|source| MonitorError::Parse { line, source })
}

pub struct FrameSource<R> {
    lines: Lines<R>,
    line: u64,
    clock: FrameClock,
}

impl<R: AsyncBufRead + Unpin> FrameSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
            clock: FrameClock::default(),
        }
    }

    /// `Ok(None)` at end of input. A `Parse` error covers one line only; the
    /// next call continues with the following line.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            let Some(text) = self.lines.next_line().await? else {
                return Ok(None);
            };
            self.line += 1;

            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            let record = parse_frame(self.line, text)?;
            let timestamp = self.clock.stamp(record.timestamp);
            let points = record
                .landmarks
                .filter(|points| !points.is_empty())
                .map(|points| points.into_iter().map(Point2D::from).collect());

            return Ok(Some(Frame {
                line: self.line,
                timestamp,
                points,
            }));
        }
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    /// Timestamp for a frame that could not be read: the last known frame
    /// time, or the wall clock before any frame was read.
    pub fn fallback_timestamp(&self) -> f64 {
        self.clock.last().unwrap_or_else(wall_clock_secs)
    }
}

pub type BoxedInput = Box<dyn AsyncBufRead + Unpin + Send>;

pub async fn open_input(input: &InputSource) -> Result<BoxedInput> {
    match input {
        InputSource::Stdin => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
        InputSource::File(path) => {
            let file = tokio::fs::File::open(path).await?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

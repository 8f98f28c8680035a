use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which geometric metric a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Ear,
    Mar,
    HeadTilt,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Ear => "EAR",
            Metric::Mar => "MAR",
            Metric::HeadTilt => "head tilt",
        };
        f.write_str(name)
    }
}

/// Per-frame metric failure. Never fatal: the pipeline either substitutes the
/// last valid value or skips the frame.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MetricError {
    #[error("degenerate geometry for {metric}: reference distance {distance}")]
    DegenerateGeometry { metric: Metric, distance: f64 },
    #[error("landmark index {index} out of range ({len} landmarks)")]
    LandmarkOutOfRange { index: usize, len: usize },
}

impl MetricError {
    pub fn is_degenerate(&self) -> bool {
        matches!(self, MetricError::DegenerateGeometry { .. })
    }
}

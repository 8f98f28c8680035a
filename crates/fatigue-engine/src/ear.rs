use serde::{Deserialize, Serialize};

use crate::error::{Metric, MetricError};
use crate::landmarks::LandmarkSet;

// MediaPipe Face Mesh eye landmark indices (基础6点)
// [外眼角, 上眼睑, 上眼睑, 内眼角, 下眼睑, 下眼睑]
pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];
pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Below this reference distance (pixels) the ratio is considered degenerate.
pub const MIN_REFERENCE_DISTANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EARResult {
    pub left_ear: f64,
    pub right_ear: f64,
    pub avg_ear: f64,
}

/// Eye aspect ratio for six ordered contour points:
/// `(|p1-p5| + |p2-p4|) / (2 * |p0-p3|)`.
pub fn ear(indices: &[usize; 6], landmarks: &LandmarkSet<'_>) -> Result<f64, MetricError> {
    let p0 = landmarks.get(indices[0])?;
    let p1 = landmarks.get(indices[1])?;
    let p2 = landmarks.get(indices[2])?;
    let p3 = landmarks.get(indices[3])?;
    let p4 = landmarks.get(indices[4])?;
    let p5 = landmarks.get(indices[5])?;

    let vertical1 = p1.distance(&p5);
    let vertical2 = p2.distance(&p4);
    let horizontal = p0.distance(&p3);

    ratio(Metric::Ear, vertical1 + vertical2, 2.0 * horizontal)
}

/// Both eyes plus their mean.
pub fn eye_aspect_ratios(
    left: &[usize; 6],
    right: &[usize; 6],
    landmarks: &LandmarkSet<'_>,
) -> Result<EARResult, MetricError> {
    let left_ear = ear(left, landmarks)?;
    let right_ear = ear(right, landmarks)?;
    Ok(EARResult {
        left_ear,
        right_ear,
        avg_ear: (left_ear + right_ear) / 2.0,
    })
}

/// Shared zero guard for EAR and MAR. A NaN or infinite result is reported as
/// degenerate so it never reaches the threshold comparisons.
pub(crate) fn ratio(metric: Metric, numerator: f64, reference: f64) -> Result<f64, MetricError> {
    if !reference.is_finite() || reference < MIN_REFERENCE_DISTANCE {
        return Err(MetricError::DegenerateGeometry {
            metric,
            distance: reference,
        });
    }
    let value = numerator / reference;
    if !value.is_finite() {
        return Err(MetricError::DegenerateGeometry {
            metric,
            distance: reference,
        });
    }
    Ok(value)
}

use serde::{Deserialize, Serialize};

use crate::ear::MIN_REFERENCE_DISTANCE;
use crate::error::{Metric, MetricError};
use crate::landmarks::LandmarkSet;

/// Outer eye corners used as the roll reference `[left, right]`.
pub const HEAD_TILT_REFERENCE: [usize; 2] = [33, 263];

pub const HEAD_TILT_THRESHOLD: f64 = 30.0;
pub const HEAD_DOWN_CONSEC_FRAMES: u32 = 30;

#[inline]
fn normalize_roll(degrees: f64) -> f64 {
    // 镜像画面下两眼角左右互换，折回 [-90, 90]
    if degrees > 90.0 {
        degrees - 180.0
    } else if degrees < -90.0 {
        degrees + 180.0
    } else {
        degrees
    }
}

/// Roll angle in degrees of the line through the two reference eye corners.
///
/// Folded into `[-90, 90]` so a mirrored frame (corners swapped left/right)
/// reads the same as the unmirrored one. This is a 2D heuristic, not a pose
/// estimate.
pub fn head_tilt(reference: &[usize; 2], landmarks: &LandmarkSet<'_>) -> Result<f64, MetricError> {
    let left = landmarks.get(reference[0])?;
    let right = landmarks.get(reference[1])?;

    let distance = left.distance(&right);
    if !distance.is_finite() || distance < MIN_REFERENCE_DISTANCE {
        return Err(MetricError::DegenerateGeometry {
            metric: Metric::HeadTilt,
            distance,
        });
    }

    let angle = (right.y - left.y).atan2(right.x - left.x).to_degrees();
    Ok(normalize_roll(angle))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HeadEvent {
    HeadDownOnset,
    HeadRecovered { frames: u32 },
}

#[derive(Debug, Clone)]
pub struct HeadTiltDetector {
    threshold_deg: f64,
    consec_frames: u32,
    tilt_frames: u32,
    is_head_down: bool,
    last_angle: f64,
}

impl HeadTiltDetector {
    pub fn new(threshold_deg: f64, consec_frames: u32) -> Self {
        Self {
            threshold_deg,
            consec_frames: consec_frames.max(1),
            tilt_frames: 0,
            is_head_down: false,
            last_angle: 0.0,
        }
    }

    pub fn update(&mut self, angle: f64) -> Option<HeadEvent> {
        self.last_angle = angle;

        if angle.abs() > self.threshold_deg {
            self.tilt_frames = self.tilt_frames.saturating_add(1);
            let was_down = self.is_head_down;
            self.is_head_down = self.tilt_frames >= self.consec_frames;
            return (self.is_head_down && !was_down).then_some(HeadEvent::HeadDownOnset);
        }

        let frames = self.tilt_frames;
        let was_down = self.is_head_down;
        self.tilt_frames = 0;
        self.is_head_down = false;
        was_down.then_some(HeadEvent::HeadRecovered { frames })
    }

    pub fn tilt_frames(&self) -> u32 {
        self.tilt_frames
    }

    pub fn is_head_down(&self) -> bool {
        self.is_head_down
    }

    pub fn last_angle(&self) -> f64 {
        self.last_angle
    }

    pub fn reset(&mut self) {
        self.tilt_frames = 0;
        self.is_head_down = false;
        self.last_angle = 0.0;
    }
}

impl Default for HeadTiltDetector {
    fn default() -> Self {
        Self::new(HEAD_TILT_THRESHOLD, HEAD_DOWN_CONSEC_FRAMES)
    }
}

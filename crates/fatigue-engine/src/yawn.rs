use serde::{Deserialize, Serialize};

use crate::ear::ratio;
use crate::error::{Metric, MetricError};
use crate::landmarks::LandmarkSet;

const MOUTH_TOP: usize = 13;
const MOUTH_BOTTOM: usize = 14;
const MOUTH_LEFT: usize = 61;
const MOUTH_RIGHT: usize = 291;

/// `[upper_lip, lower_lip, left_corner, right_corner]`
pub const MOUTH: [usize; 4] = [MOUTH_TOP, MOUTH_BOTTOM, MOUTH_LEFT, MOUTH_RIGHT];

pub const MOUTH_AR_THRESHOLD: f64 = 0.65;
/// Consecutive open-mouth frames before a yawn is recognised (约1.5秒 @30fps).
pub const YAWN_CONSEC_FRAMES: u32 = 45;

/// Mouth aspect ratio: `|upper - lower| / |left - right|`.
pub fn mar(indices: &[usize; 4], landmarks: &LandmarkSet<'_>) -> Result<f64, MetricError> {
    let top = landmarks.get(indices[0])?;
    let bottom = landmarks.get(indices[1])?;
    let left = landmarks.get(indices[2])?;
    let right = landmarks.get(indices[3])?;

    let vertical = top.distance(&bottom);
    let horizontal = left.distance(&right);

    ratio(Metric::Mar, vertical, horizontal)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MouthEvent {
    /// The open run reached the yawn threshold on this frame.
    YawnOnset,
    /// A sustained open run ended and was counted as a yawn.
    Yawn { frames: u32 },
}

/// Mouth channel debouncer.
///
/// Opposite policy to blinks: an open run counts as a yawn only if it reached
/// the sustained threshold. Shorter openings (talking, eating) are discarded.
#[derive(Debug, Clone)]
pub struct YawnDetector {
    mar_threshold: f64,
    consec_frames: u32,
    yawn_frames: u32,
    yawn_count: u32,
    is_yawning: bool,
}

impl YawnDetector {
    pub fn new(mar_threshold: f64, consec_frames: u32) -> Self {
        Self {
            mar_threshold,
            consec_frames: consec_frames.max(1),
            yawn_frames: 0,
            yawn_count: 0,
            is_yawning: false,
        }
    }

    pub fn is_open(&self, mar: f64) -> bool {
        mar > self.mar_threshold
    }

    pub fn update(&mut self, mar: f64) -> Option<MouthEvent> {
        if self.is_open(mar) {
            self.yawn_frames = self.yawn_frames.saturating_add(1);
            let was_yawning = self.is_yawning;
            self.is_yawning = self.yawn_frames >= self.consec_frames;
            return (self.is_yawning && !was_yawning).then_some(MouthEvent::YawnOnset);
        }

        let frames = self.yawn_frames;
        self.yawn_frames = 0;
        self.is_yawning = false;

        if frames >= self.consec_frames {
            self.yawn_count = self.yawn_count.saturating_add(1);
            Some(MouthEvent::Yawn { frames })
        } else {
            None
        }
    }

    pub fn yawn_frames(&self) -> u32 {
        self.yawn_frames
    }

    pub fn yawn_count(&self) -> u32 {
        self.yawn_count
    }

    pub fn is_yawning(&self) -> bool {
        self.is_yawning
    }

    pub fn set_mar_threshold(&mut self, threshold: f64) {
        self.mar_threshold = threshold;
    }

    pub fn reset(&mut self) {
        self.yawn_frames = 0;
        self.yawn_count = 0;
        self.is_yawning = false;
    }
}

impl Default for YawnDetector {
    fn default() -> Self {
        Self::new(MOUTH_AR_THRESHOLD, YAWN_CONSEC_FRAMES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Point2D;
    use proptest::prelude::*;

    const OPEN: f64 = 0.9;
    const CLOSED: f64 = 0.2;

    fn mouth(opening: f64, width: f64) -> Vec<Point2D> {
        vec![
            Point2D::new(width / 2.0, 0.0),
            Point2D::new(width / 2.0, opening),
            Point2D::new(0.0, opening / 2.0),
            Point2D::new(width, opening / 2.0),
        ]
    }

    #[test]
    fn test_mar_value() {
        let points = mouth(30.0, 50.0);
        let value = mar(&[0, 1, 2, 3], &LandmarkSet::new(&points)).unwrap();
        assert!((value - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_mar_degenerate_width() {
        let points = mouth(30.0, 0.0);
        let err = mar(&[0, 1, 2, 3], &LandmarkSet::new(&points)).unwrap_err();
        assert!(err.is_degenerate());
    }

    #[test]
    fn test_sustained_opening_counts_yawn() {
        let mut detector = YawnDetector::default();
        for frame in 1..=YAWN_CONSEC_FRAMES {
            let event = detector.update(OPEN);
            if frame == YAWN_CONSEC_FRAMES {
                assert_eq!(event, Some(MouthEvent::YawnOnset));
            }
        }
        assert!(detector.is_yawning());
        assert_eq!(detector.update(CLOSED), Some(MouthEvent::Yawn { frames: YAWN_CONSEC_FRAMES }));
        assert_eq!(detector.yawn_count(), 1);
        assert!(!detector.is_yawning());
        assert_eq!(detector.yawn_frames(), 0);
    }

    #[test]
    fn test_short_opening_discarded() {
        let mut detector = YawnDetector::default();
        for _ in 0..YAWN_CONSEC_FRAMES - 1 {
            detector.update(OPEN);
        }
        assert!(!detector.is_yawning());
        assert_eq!(detector.update(CLOSED), None);
        assert_eq!(detector.yawn_count(), 0);
    }

    #[test]
    fn test_threshold_value_is_closed() {
        let mut detector = YawnDetector::default();
        detector.update(MOUTH_AR_THRESHOLD);
        assert_eq!(detector.yawn_frames(), 0);
    }

    proptest! {
        #[test]
        fn prop_open_run_classification(len in 1u32..150) {
            let mut detector = YawnDetector::default();
            for _ in 0..len {
                detector.update(OPEN);
                prop_assert_eq!(detector.is_yawning(), detector.yawn_frames() >= YAWN_CONSEC_FRAMES);
            }
            detector.update(CLOSED);
            let expected = if len >= YAWN_CONSEC_FRAMES { 1 } else { 0 };
            prop_assert_eq!(detector.yawn_count(), expected);
        }
    }
}

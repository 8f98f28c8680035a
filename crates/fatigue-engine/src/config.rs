use serde::{Deserialize, Serialize};

use crate::alarm::AlarmConfig;
use crate::blink::{EAR_THRESHOLD, EYE_AR_CONSEC_FRAMES};
use crate::ear::{LEFT_EYE, RIGHT_EYE};
use crate::fatigue::{FatigueWeights, SCORE_HISTORY_LEN};
use crate::head_pose::{HEAD_DOWN_CONSEC_FRAMES, HEAD_TILT_REFERENCE, HEAD_TILT_THRESHOLD};
use crate::history::{BLINK_HISTORY_LEN, METRIC_HISTORY_LEN};
use crate::yawn::{MOUTH, MOUTH_AR_THRESHOLD, YAWN_CONSEC_FRAMES};

pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// How the duration of the current eye-closed run is derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClosedDurationMode {
    /// `eye_closed_frames / fps`, assuming a fixed capture rate.
    Nominal { fps: f64 },
    /// Wall-clock time covered by the closed run.
    Measured,
}

impl ClosedDurationMode {
    pub fn nominal_fps(&self) -> f64 {
        match *self {
            ClosedDurationMode::Nominal { fps } if fps.is_finite() && fps > 0.0 => fps,
            _ => DEFAULT_FRAME_RATE,
        }
    }
}

impl Default for ClosedDurationMode {
    fn default() -> Self {
        ClosedDurationMode::Nominal {
            fps: DEFAULT_FRAME_RATE,
        }
    }
}

/// Fixed landmark topology of the upstream face-mesh provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkIndices {
    pub left_eye: [usize; 6],
    pub right_eye: [usize; 6],
    pub mouth: [usize; 4],
    pub tilt_reference: [usize; 2],
}

impl LandmarkIndices {
    pub fn all(&self) -> impl Iterator<Item = usize> + '_ {
        self.left_eye
            .iter()
            .chain(self.right_eye.iter())
            .chain(self.mouth.iter())
            .chain(self.tilt_reference.iter())
            .copied()
    }

    pub fn max_index(&self) -> usize {
        self.all().max().unwrap_or(0)
    }
}

impl Default for LandmarkIndices {
    fn default() -> Self {
        Self {
            left_eye: LEFT_EYE,
            right_eye: RIGHT_EYE,
            mouth: MOUTH,
            tilt_reference: HEAD_TILT_REFERENCE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub ear_threshold: f64,
    pub eye_closed_consec_frames: u32,
    pub mar_threshold: f64,
    pub yawn_consec_frames: u32,
    pub head_tilt_threshold_deg: f64,
    pub head_down_consec_frames: u32,
    pub indices: LandmarkIndices,
    pub closed_duration: ClosedDurationMode,
    pub blink_history_len: usize,
    pub metric_history_len: usize,
    pub score_history_len: usize,
    pub weights: FatigueWeights,
    pub alarm: AlarmConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            ear_threshold: EAR_THRESHOLD,
            eye_closed_consec_frames: EYE_AR_CONSEC_FRAMES,
            mar_threshold: MOUTH_AR_THRESHOLD,
            yawn_consec_frames: YAWN_CONSEC_FRAMES,
            head_tilt_threshold_deg: HEAD_TILT_THRESHOLD,
            head_down_consec_frames: HEAD_DOWN_CONSEC_FRAMES,
            indices: LandmarkIndices::default(),
            closed_duration: ClosedDurationMode::default(),
            blink_history_len: BLINK_HISTORY_LEN,
            metric_history_len: METRIC_HISTORY_LEN,
            score_history_len: SCORE_HISTORY_LEN,
            weights: FatigueWeights::default(),
            alarm: AlarmConfig::default(),
        }
    }
}

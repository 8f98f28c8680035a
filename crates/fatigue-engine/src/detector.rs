use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::alarm::{AlarmGate, AlarmTriggers};
use crate::blink::{BlinkDetector, EyeEvent};
use crate::config::{ClosedDurationMode, DetectionConfig};
use crate::ear::{ear, EARResult};
use crate::error::MetricError;
use crate::fatigue::{FatigueEvaluation, FatigueLevel, FatigueScorer, FatigueTrend};
use crate::head_pose::{head_tilt, HeadEvent, HeadTiltDetector};
use crate::history::{MetricSample, RollingHistory};
use crate::landmarks::LandmarkSet;
use crate::snapshot::DetectionSnapshot;
use crate::yawn::{mar, MouthEvent, YawnDetector};

/// Open-eye EAR used until the first valid measurement.
pub const NEUTRAL_EAR: f64 = 0.3;
/// Closed-mouth MAR used until the first valid measurement.
pub const NEUTRAL_MAR: f64 = 0.0;

const NEUTRAL_EARS: EARResult = EARResult {
    left_ear: NEUTRAL_EAR,
    right_ear: NEUTRAL_EAR,
    avg_ear: NEUTRAL_EAR,
};

/// Discrete events raised by one processed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameEvents {
    pub eye: Option<EyeEvent>,
    pub mouth: Option<MouthEvent>,
    pub head: Option<HeadEvent>,
}

impl FrameEvents {
    pub fn blink_completed(&self) -> bool {
        matches!(self.eye, Some(EyeEvent::Blink { .. }))
    }

    pub fn closure_started(&self) -> bool {
        matches!(self.eye, Some(EyeEvent::ClosureOnset))
    }

    pub fn yawn_completed(&self) -> bool {
        matches!(self.mouth, Some(MouthEvent::Yawn { .. }))
    }

    pub fn yawn_started(&self) -> bool {
        matches!(self.mouth, Some(MouthEvent::YawnOnset))
    }

    pub fn head_down_started(&self) -> bool {
        matches!(self.head, Some(HeadEvent::HeadDownOnset))
    }

    pub fn is_empty(&self) -> bool {
        self.eye.is_none() && self.mouth.is_none() && self.head.is_none()
    }
}

/// Per-face detection state: the three debouncers, the rolling history and the
/// latest metric values.
#[derive(Debug, Clone)]
pub struct DetectionState {
    blink: BlinkDetector,
    yawn: YawnDetector,
    head: HeadTiltDetector,
    history: RollingHistory,
    ears: EARResult,
    current_mar: f64,
    head_tilt: f64,
    closed_duration: ClosedDurationMode,
    last_frame_at: Option<f64>,
    // Measured 模式：闭眼区间的起点与最近一次闭眼帧
    closed_anchor: Option<f64>,
    last_closed_at: Option<f64>,
}

impl DetectionState {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            blink: BlinkDetector::new(config.ear_threshold, config.eye_closed_consec_frames),
            yawn: YawnDetector::new(config.mar_threshold, config.yawn_consec_frames),
            head: HeadTiltDetector::new(config.head_tilt_threshold_deg, config.head_down_consec_frames),
            history: RollingHistory::new(config.blink_history_len, config.metric_history_len),
            ears: NEUTRAL_EARS,
            current_mar: NEUTRAL_MAR,
            head_tilt: 0.0,
            closed_duration: config.closed_duration,
            last_frame_at: None,
            closed_anchor: None,
            last_closed_at: None,
        }
    }

    /// Feeds one frame's metrics through the debouncers and the history.
    pub fn observe(&mut self, ears: EARResult, mar: f64, tilt: f64, now: f64) -> FrameEvents {
        let was_closed = self.blink.eye_closed_frames() > 0;
        let eye = self.blink.update(ears.avg_ear);
        let is_closed = self.blink.eye_closed_frames() > 0;

        if is_closed {
            if !was_closed {
                self.closed_anchor = Some(self.last_frame_at.unwrap_or(now));
            }
            self.last_closed_at = Some(now);
        } else {
            self.closed_anchor = None;
            self.last_closed_at = None;
        }

        if matches!(eye, Some(EyeEvent::Blink { .. })) {
            self.history.record_blink(now);
        }

        let mouth = self.yawn.update(mar);
        let head = self.head.update(tilt);

        self.ears = ears;
        self.current_mar = mar;
        self.head_tilt = tilt;
        self.history.record_sample(MetricSample {
            ear: ears.avg_ear,
            mar,
            timestamp: now,
        });
        self.last_frame_at = Some(now);

        FrameEvents { eye, mouth, head }
    }

    /// Marks a break in face tracking. A closed run that starts after the gap
    /// is anchored at its own first frame instead of the last frame before it.
    pub fn note_gap(&mut self) {
        self.last_frame_at = None;
    }

    /// Seconds covered by the current eye-closed run; 0 while the eyes are open.
    pub fn eye_closed_duration(&self) -> f64 {
        match self.closed_duration {
            ClosedDurationMode::Nominal { .. } => {
                f64::from(self.blink.eye_closed_frames()) / self.closed_duration.nominal_fps()
            }
            ClosedDurationMode::Measured => match (self.closed_anchor, self.last_closed_at) {
                (Some(start), Some(end)) => (end - start).max(0.0),
                _ => 0.0,
            },
        }
    }

    pub fn blink_rate(&self) -> f64 {
        self.history.blink_rate()
    }

    pub fn triggers(&self) -> AlarmTriggers {
        AlarmTriggers {
            is_fatigued: self.blink.is_fatigued(),
            is_yawning: self.yawn.is_yawning(),
            is_head_down: self.head.is_head_down(),
        }
    }

    pub fn eye_closed_frames(&self) -> u32 {
        self.blink.eye_closed_frames()
    }

    pub fn total_blinks(&self) -> u32 {
        self.blink.total_blinks()
    }

    pub fn yawn_frames(&self) -> u32 {
        self.yawn.yawn_frames()
    }

    pub fn yawn_count(&self) -> u32 {
        self.yawn.yawn_count()
    }

    pub fn head_tilt_frames(&self) -> u32 {
        self.head.tilt_frames()
    }

    pub fn is_fatigued(&self) -> bool {
        self.blink.is_fatigued()
    }

    pub fn is_yawning(&self) -> bool {
        self.yawn.is_yawning()
    }

    pub fn is_head_down(&self) -> bool {
        self.head.is_head_down()
    }

    pub fn current_ear(&self) -> f64 {
        self.ears.avg_ear
    }

    pub fn left_ear(&self) -> f64 {
        self.ears.left_ear
    }

    pub fn right_ear(&self) -> f64 {
        self.ears.right_ear
    }

    pub fn ears(&self) -> EARResult {
        self.ears
    }

    pub fn current_mar(&self) -> f64 {
        self.current_mar
    }

    pub fn head_tilt(&self) -> f64 {
        self.head_tilt
    }

    pub fn history(&self) -> &RollingHistory {
        &self.history
    }

    pub fn reset(&mut self) {
        self.blink.reset();
        self.yawn.reset();
        self.head.reset();
        self.history.clear();
        self.ears = NEUTRAL_EARS;
        self.current_mar = NEUTRAL_MAR;
        self.head_tilt = 0.0;
        self.last_frame_at = None;
        self.closed_anchor = None;
        self.last_closed_at = None;
    }
}

impl Default for DetectionState {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

/// Result of [`FatigueMonitor::process_frame`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameOutcome {
    /// `None` when the frame carried no usable landmarks.
    pub evaluation: Option<FatigueEvaluation>,
    /// The alarm gate authorized a notification on this frame.
    pub alarm: bool,
    pub events: FrameEvents,
}

impl FrameOutcome {
    pub fn is_skipped(&self) -> bool {
        self.evaluation.is_none()
    }
}

/// Per-frame pipeline:
/// landmarks -> metrics -> debouncers -> history -> scorer -> alarm gate.
///
/// Single writer. Share results with readers through [`DetectionSnapshot`];
/// the alarm gate is shared separately via [`FatigueMonitor::alarm_gate`].
#[derive(Debug)]
pub struct FatigueMonitor {
    config: DetectionConfig,
    state: DetectionState,
    scorer: FatigueScorer,
    alarm: Arc<AlarmGate>,
    frames_processed: u64,
    skipped_frames: u64,
    degenerate_frames: u64,
    last_evaluation: Option<FatigueEvaluation>,
    last_timestamp: Option<f64>,
}

impl FatigueMonitor {
    pub fn new(config: DetectionConfig) -> Self {
        let alarm = Arc::new(AlarmGate::new(config.alarm));
        Self::with_alarm_gate(config, alarm)
    }

    pub fn with_alarm_gate(config: DetectionConfig, alarm: Arc<AlarmGate>) -> Self {
        Self {
            state: DetectionState::new(&config),
            scorer: FatigueScorer::new(config.weights, config.score_history_len),
            config,
            alarm,
            frames_processed: 0,
            skipped_frames: 0,
            degenerate_frames: 0,
            last_evaluation: None,
            last_timestamp: None,
        }
    }

    pub fn process_frame(&mut self, landmarks: Option<&LandmarkSet<'_>>, now: f64) -> FrameOutcome {
        let now = self.monotonic(now);

        let Some(landmarks) = landmarks else {
            self.skipped_frames += 1;
            self.state.note_gap();
            debug!(now, "no face in frame, state held");
            return FrameOutcome::default();
        };

        // 最大索引可用则所有索引都可用
        let required = self.config.indices.max_index();
        if let Err(error) = landmarks.get(required) {
            self.skipped_frames += 1;
            self.state.note_gap();
            debug!(error = %error, "landmark set too short, frame skipped");
            return FrameOutcome::default();
        }

        let indices = self.config.indices;
        let mut degenerate = false;

        // 单眼退化时只沿用该眼的上一帧数值
        let previous = self.state.ears();
        let left_ear = match ear(&indices.left_eye, landmarks) {
            Ok(value) => value,
            Err(error) => {
                degenerate = true;
                self.report_degenerate(&error);
                previous.left_ear
            }
        };
        let right_ear = match ear(&indices.right_eye, landmarks) {
            Ok(value) => value,
            Err(error) => {
                degenerate = true;
                self.report_degenerate(&error);
                previous.right_ear
            }
        };
        let ears = EARResult {
            left_ear,
            right_ear,
            avg_ear: (left_ear + right_ear) / 2.0,
        };

        let mar = match mar(&indices.mouth, landmarks) {
            Ok(value) => value,
            Err(error) => {
                degenerate = true;
                self.report_degenerate(&error);
                self.state.current_mar()
            }
        };

        let tilt = match head_tilt(&indices.tilt_reference, landmarks) {
            Ok(angle) => angle,
            Err(error) => {
                degenerate = true;
                self.report_degenerate(&error);
                self.state.head_tilt()
            }
        };

        if degenerate {
            self.degenerate_frames += 1;
        }

        let events = self.state.observe(ears, mar, tilt, now);
        self.log_events(&events, now);

        let evaluation = self.scorer.calculate(
            self.state.blink_rate(),
            self.state.yawn_count(),
            self.state.eye_closed_duration(),
        );
        if self.last_evaluation.map(|e| e.level) != Some(evaluation.level) {
            info!(
                level = %evaluation.level,
                score = evaluation.score,
                "fatigue level changed"
            );
        }
        self.last_evaluation = Some(evaluation);
        self.frames_processed += 1;

        let alarm = self.alarm.check(self.state.triggers(), now);

        FrameOutcome {
            evaluation: Some(evaluation),
            alarm,
            events,
        }
    }

    pub fn snapshot(&self) -> DetectionSnapshot {
        let level = self
            .last_evaluation
            .map(|e| e.level)
            .unwrap_or(FatigueLevel::Normal);

        DetectionSnapshot {
            fatigue_level: level.name().to_string(),
            fatigue_level_color: level.color().to_hex(),
            fatigue_progress: level.progress(),
            fatigue_score: self.last_evaluation.map(|e| e.score).unwrap_or(0),
            trend: self.scorer.trend().as_str().to_string(),
            total_blinks: self.state.total_blinks(),
            yawn_count: self.state.yawn_count(),
            is_fatigued: self.state.is_fatigued(),
            is_yawning: self.state.is_yawning(),
            is_head_down: self.state.is_head_down(),
            blink_rate: self.state.blink_rate(),
            eye_closed_duration: self.state.eye_closed_duration(),
            ear: self.state.current_ear(),
            mar: self.state.current_mar(),
            head_tilt: self.state.head_tilt(),
            frames_processed: self.frames_processed,
            skipped_frames: self.skipped_frames,
            degenerate_frames: self.degenerate_frames,
            timestamp: self.last_timestamp.unwrap_or(0.0),
        }
    }

    pub fn alarm_gate(&self) -> Arc<AlarmGate> {
        Arc::clone(&self.alarm)
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn state(&self) -> &DetectionState {
        &self.state
    }

    pub fn scorer(&self) -> &FatigueScorer {
        &self.scorer
    }

    pub fn trend(&self) -> FatigueTrend {
        self.scorer.trend()
    }

    pub fn last_evaluation(&self) -> Option<FatigueEvaluation> {
        self.last_evaluation
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    pub fn degenerate_frames(&self) -> u64 {
        self.degenerate_frames
    }

    /// Clears detection state, score history, counters and the alarm's last
    /// firing time. Alarm enable/cooldown settings are kept.
    pub fn reset(&mut self) {
        self.state.reset();
        self.scorer.reset();
        self.alarm.reset();
        self.frames_processed = 0;
        self.skipped_frames = 0;
        self.degenerate_frames = 0;
        self.last_evaluation = None;
        self.last_timestamp = None;
        info!("fatigue monitor reset");
    }

    /// Clamps the frame clock so it never runs backwards.
    fn monotonic(&mut self, now: f64) -> f64 {
        let now = match self.last_timestamp {
            Some(last) if !now.is_finite() || now < last => last,
            None if !now.is_finite() => 0.0,
            _ => now,
        };
        self.last_timestamp = Some(now);
        now
    }

    fn report_degenerate(&self, error: &MetricError) {
        let count = self.degenerate_frames + 1;
        if count.is_power_of_two() {
            warn!(error = %error, degenerate_frames = count, "degenerate landmark geometry, reusing previous value");
        } else {
            debug!(error = %error, degenerate_frames = count, "degenerate landmark geometry");
        }
    }

    fn log_events(&self, events: &FrameEvents, now: f64) {
        match events.eye {
            Some(EyeEvent::ClosureOnset) => info!(now, "sustained eye closure"),
            Some(EyeEvent::Blink { frames }) => {
                debug!(frames, total_blinks = self.state.total_blinks(), "blink")
            }
            Some(EyeEvent::ClosureEnded { frames }) => debug!(frames, "eye closure ended"),
            None => {}
        }
        match events.mouth {
            Some(MouthEvent::YawnOnset) => info!(now, "yawning"),
            Some(MouthEvent::Yawn { frames }) => {
                debug!(frames, yawn_count = self.state.yawn_count(), "yawn")
            }
            None => {}
        }
        match events.head {
            Some(HeadEvent::HeadDownOnset) => {
                info!(now, angle = self.state.head_tilt(), "head down")
            }
            Some(HeadEvent::HeadRecovered { frames }) => debug!(frames, "head recovered"),
            None => {}
        }
    }
}

impl Default for FatigueMonitor {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

use serde::{Deserialize, Serialize};

pub const EAR_THRESHOLD: f64 = 0.15;
/// Consecutive closed frames that count as sustained closure (约2秒 @30fps).
pub const EYE_AR_CONSEC_FRAMES: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EyeEvent {
    /// The closed run reached the sustained-closure threshold on this frame.
    ClosureOnset,
    /// A short closed run ended and was counted as a blink.
    Blink { frames: u32 },
    /// A sustained closed run ended. Not a blink.
    ClosureEnded { frames: u32 },
}

/// Eye channel debouncer.
///
/// Blinks count only when the closed run is *shorter* than the sustained
/// threshold; a run that reaches it is sustained closure and is never counted
/// as a blink when it ends.
#[derive(Debug, Clone)]
pub struct BlinkDetector {
    ear_threshold: f64,
    consec_frames: u32,
    eye_closed_frames: u32,
    total_blinks: u32,
    is_fatigued: bool,
}

impl BlinkDetector {
    pub fn new(ear_threshold: f64, consec_frames: u32) -> Self {
        Self {
            ear_threshold,
            consec_frames: consec_frames.max(1),
            eye_closed_frames: 0,
            total_blinks: 0,
            is_fatigued: false,
        }
    }

    pub fn is_closed(&self, ear: f64) -> bool {
        ear < self.ear_threshold
    }

    pub fn update(&mut self, ear: f64) -> Option<EyeEvent> {
        if self.is_closed(ear) {
            self.eye_closed_frames = self.eye_closed_frames.saturating_add(1);
            let was_fatigued = self.is_fatigued;
            self.is_fatigued = self.eye_closed_frames >= self.consec_frames;
            return (self.is_fatigued && !was_fatigued).then_some(EyeEvent::ClosureOnset);
        }

        let frames = self.eye_closed_frames;
        self.eye_closed_frames = 0;
        self.is_fatigued = false;

        if frames == 0 {
            None
        } else if frames < self.consec_frames {
            self.total_blinks = self.total_blinks.saturating_add(1);
            Some(EyeEvent::Blink { frames })
        } else {
            Some(EyeEvent::ClosureEnded { frames })
        }
    }

    pub fn eye_closed_frames(&self) -> u32 {
        self.eye_closed_frames
    }

    pub fn total_blinks(&self) -> u32 {
        self.total_blinks
    }

    pub fn is_fatigued(&self) -> bool {
        self.is_fatigued
    }

    pub fn ear_threshold(&self) -> f64 {
        self.ear_threshold
    }

    pub fn consec_frames(&self) -> u32 {
        self.consec_frames
    }

    pub fn reset(&mut self) {
        self.eye_closed_frames = 0;
        self.total_blinks = 0;
        self.is_fatigued = false;
    }
}

impl Default for BlinkDetector {
    fn default() -> Self {
        Self::new(EAR_THRESHOLD, EYE_AR_CONSEC_FRAMES)
    }
}

use serde::{Deserialize, Serialize};

/// Flat, read-only view of the monitor after a frame. Every field is a plain
/// number, string or bool so any presentation layer can serialize it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionSnapshot {
    pub fatigue_level: String,
    /// `#rrggbb`
    pub fatigue_level_color: String,
    pub fatigue_progress: f64,
    pub fatigue_score: u8,
    pub trend: String,
    pub total_blinks: u32,
    pub yawn_count: u32,
    pub is_fatigued: bool,
    pub is_yawning: bool,
    pub is_head_down: bool,
    /// Blinks per minute.
    pub blink_rate: f64,
    /// Seconds.
    pub eye_closed_duration: f64,
    pub ear: f64,
    pub mar: f64,
    /// Degrees.
    pub head_tilt: f64,
    pub frames_processed: u64,
    pub skipped_frames: u64,
    pub degenerate_frames: u64,
    pub timestamp: f64,
}

impl DetectionSnapshot {
    pub fn alarm_condition(&self) -> bool {
        self.is_fatigued || self.is_yawning || self.is_head_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_to_flat_object() {
        let snapshot = DetectionSnapshot {
            fatigue_level: "Mild Fatigue".into(),
            fatigue_level_color: "#ffff00".into(),
            fatigue_progress: 0.33,
            fatigue_score: 31,
            trend: "up".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object["fatigue_level"], "Mild Fatigue");
        assert_eq!(object["fatigue_score"], 31);
        assert_eq!(object["trend"], "up");
        assert!(object.values().all(|v| !v.is_object() && !v.is_array()));
    }

    #[test]
    fn test_alarm_condition() {
        let mut snapshot = DetectionSnapshot::default();
        assert!(!snapshot.alarm_condition());
        snapshot.is_head_down = true;
        assert!(snapshot.alarm_condition());
    }
}

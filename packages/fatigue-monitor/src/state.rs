use std::sync::Arc;

use fatigue_engine::DetectionSnapshot;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Status document published after every frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatus {
    #[serde(flatten)]
    pub detection: DetectionSnapshot,
    /// `HH:MM:SS` since the first frame.
    pub runtime: String,
    pub fps: f64,
    pub alarm_enabled: bool,
    pub alarms_raised: u64,
}

/// Single-writer, many-reader holder of the latest [`MonitorStatus`].
///
/// The frame loop swaps in a whole new `Arc`; readers clone the current one
/// and keep a consistent view while the loop moves on.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Arc<MonitorStatus>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, status: MonitorStatus) {
        let status = Arc::new(status);
        *self.current.write() = status;
    }

    pub fn load(&self) -> Arc<MonitorStatus> {
        Arc::clone(&self.current.read())
    }
}

pub fn format_runtime(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const ALARM_COOLDOWN: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    pub cooldown_s: f64,
    pub enabled: bool,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            cooldown_s: ALARM_COOLDOWN,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlarmState {
    /// `None` until the first authorization and after `reset`.
    pub last_fired_at: Option<f64>,
    pub cooldown_s: f64,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmTriggers {
    pub is_fatigued: bool,
    pub is_yawning: bool,
    pub is_head_down: bool,
}

impl AlarmTriggers {
    pub fn any(&self) -> bool {
        self.is_fatigued || self.is_yawning || self.is_head_down
    }
}

/// Cooldown-gated alarm decision.
///
/// Only decides; delivering the alert is the caller's job. Cooldown runs from
/// authorization time, so a slow delivery never opens the gate early. All
/// methods take `&self` and may be called from any thread.
#[derive(Debug)]
pub struct AlarmGate {
    state: Mutex<AlarmState>,
}

impl AlarmGate {
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            state: Mutex::new(AlarmState {
                last_fired_at: None,
                cooldown_s: sanitize_cooldown(config.cooldown_s),
                enabled: config.enabled,
            }),
        }
    }

    /// Returns true when an alarm is authorized now; records `now` as the
    /// firing time.
    pub fn check(&self, triggers: AlarmTriggers, now: f64) -> bool {
        if !triggers.any() {
            return false;
        }

        let mut state = self.state.lock();
        if !state.enabled {
            return false;
        }

        let cooled_down = match state.last_fired_at {
            Some(last) => now - last > state.cooldown_s,
            None => true,
        };
        if !cooled_down {
            return false;
        }

        state.last_fired_at = Some(now);
        debug!(
            now,
            is_fatigued = triggers.is_fatigued,
            is_yawning = triggers.is_yawning,
            is_head_down = triggers.is_head_down,
            "alarm authorized"
        );
        true
    }

    pub fn enable(&self) {
        self.state.lock().enabled = true;
        info!("alarm enabled");
    }

    pub fn disable(&self) {
        self.state.lock().enabled = false;
        info!("alarm disabled");
    }

    pub fn set_cooldown(&self, cooldown_s: f64) {
        let cooldown_s = sanitize_cooldown(cooldown_s);
        self.state.lock().cooldown_s = cooldown_s;
        info!(cooldown_s, "alarm cooldown updated");
    }

    /// Forgets the last firing so the next trigger fires immediately.
    pub fn reset(&self) {
        self.state.lock().last_fired_at = None;
        info!("alarm reset");
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    pub fn cooldown(&self) -> f64 {
        self.state.lock().cooldown_s
    }

    pub fn state(&self) -> AlarmState {
        *self.state.lock()
    }
}

impl Default for AlarmGate {
    fn default() -> Self {
        Self::new(AlarmConfig::default())
    }
}

fn sanitize_cooldown(cooldown_s: f64) -> f64 {
    if cooldown_s.is_finite() {
        cooldown_s.max(0.0)
    } else {
        ALARM_COOLDOWN
    }
}

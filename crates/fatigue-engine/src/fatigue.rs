use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const SCORE_HISTORY_LEN: usize = 100;
const TREND_WINDOW: usize = 10;
const TREND_MARGIN: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatigueLevel {
    #[default]
    Normal,
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channel order expected by OpenCV-style renderers.
    pub fn to_bgr(self) -> (u8, u8, u8) {
        (self.b, self.g, self.r)
    }
}

struct LevelInfo {
    name: &'static str,
    color: Rgb,
    progress: f64,
}

// Indexed by `FatigueLevel as usize`.
const LEVEL_TABLE: [LevelInfo; 4] = [
    LevelInfo { name: "Normal", color: Rgb::new(0, 255, 0), progress: 0.0 },
    LevelInfo { name: "Mild Fatigue", color: Rgb::new(255, 255, 0), progress: 0.33 },
    LevelInfo { name: "Moderate Fatigue", color: Rgb::new(255, 165, 0), progress: 0.67 },
    LevelInfo { name: "Severe Fatigue", color: Rgb::new(255, 0, 0), progress: 1.0 },
];

impl FatigueLevel {
    pub const ALL: [FatigueLevel; 4] = [
        FatigueLevel::Normal,
        FatigueLevel::Mild,
        FatigueLevel::Moderate,
        FatigueLevel::Severe,
    ];

    fn info(self) -> &'static LevelInfo {
        &LEVEL_TABLE[self as usize]
    }

    /// Half-open buckets: `[0, .25) [.25, .5) [.5, .75) [.75, ..)`.
    pub fn from_total(total: f64) -> Self {
        if total < 0.25 {
            FatigueLevel::Normal
        } else if total < 0.5 {
            FatigueLevel::Mild
        } else if total < 0.75 {
            FatigueLevel::Moderate
        } else {
            FatigueLevel::Severe
        }
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn color(self) -> Rgb {
        self.info().color
    }

    pub fn progress(self) -> f64 {
        self.info().progress
    }
}

impl fmt::Display for FatigueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueWeights {
    pub blink_rate: f64,
    pub yawn_count: f64,
    pub eye_closed: f64,
}

impl Default for FatigueWeights {
    fn default() -> Self {
        Self {
            blink_rate: 0.45,
            yawn_count: 0.35,
            eye_closed: 0.20,
        }
    }
}

pub fn blink_rate_score(blink_rate: f64) -> f64 {
    if blink_rate < 5.0 {
        0.0
    } else if blink_rate < 10.0 {
        0.2
    } else if blink_rate < 15.0 {
        0.5
    } else if blink_rate < 20.0 {
        0.7
    } else {
        1.0
    }
}

pub fn yawn_count_score(yawn_count: u32) -> f64 {
    match yawn_count {
        0 => 0.0,
        1 => 0.3,
        2..=3 => 0.6,
        4..=5 => 0.8,
        _ => 1.0,
    }
}

pub fn eye_closed_score(eye_closed_s: f64) -> f64 {
    if eye_closed_s <= 0.0 {
        0.0
    } else if eye_closed_s < 1.0 {
        0.3
    } else if eye_closed_s < 2.0 {
        0.6
    } else if eye_closed_s < 3.0 {
        0.8
    } else {
        1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueEvaluation {
    pub level: FatigueLevel,
    /// `floor(total * 100)`
    pub score: u8,
    pub total: f64,
    pub blink_score: f64,
    pub yawn_score: f64,
    pub eye_closed_score: f64,
}

/// Weighted score without touching any history.
pub fn evaluate(
    weights: &FatigueWeights,
    blink_rate: f64,
    yawn_count: u32,
    eye_closed_s: f64,
) -> FatigueEvaluation {
    let blink_score = blink_rate_score(blink_rate);
    let yawn_score = yawn_count_score(yawn_count);
    let eye_closed_score = eye_closed_score(eye_closed_s);

    let total = blink_score * weights.blink_rate
        + yawn_score * weights.yawn_count
        + eye_closed_score * weights.eye_closed;

    let score = (total * 100.0).floor().clamp(0.0, 100.0) as u8;

    FatigueEvaluation {
        level: FatigueLevel::from_total(total),
        score,
        total,
        blink_score,
        yawn_score,
        eye_closed_score,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: u8,
    pub level: FatigueLevel,
    pub blink_rate: f64,
    pub yawn_count: u32,
    pub eye_closed_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatigueTrend {
    Up,
    Down,
    Stable,
}

impl FatigueTrend {
    pub fn as_str(self) -> &'static str {
        match self {
            FatigueTrend::Up => "up",
            FatigueTrend::Down => "down",
            FatigueTrend::Stable => "stable",
        }
    }
}

impl fmt::Display for FatigueTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct FatigueScorer {
    weights: FatigueWeights,
    history: VecDeque<ScoreRecord>,
    max_history_len: usize,
}

impl FatigueScorer {
    pub fn new(weights: FatigueWeights, max_history_len: usize) -> Self {
        let max_history_len = max_history_len.max(1);
        Self {
            weights,
            history: VecDeque::with_capacity(max_history_len),
            max_history_len,
        }
    }

    pub fn calculate(&mut self, blink_rate: f64, yawn_count: u32, eye_closed_s: f64) -> FatigueEvaluation {
        let evaluation = evaluate(&self.weights, blink_rate, yawn_count, eye_closed_s);

        self.history.push_back(ScoreRecord {
            score: evaluation.score,
            level: evaluation.level,
            blink_rate,
            yawn_count,
            eye_closed_s,
        });
        while self.history.len() > self.max_history_len {
            self.history.pop_front();
        }

        evaluation
    }

    /// Mean of the last `window` scores; 0 while the history is shorter than
    /// the window.
    pub fn average_score(&self, window: usize) -> f64 {
        if window == 0 || self.history.len() < window {
            return 0.0;
        }
        let sum: u32 = self
            .history
            .iter()
            .rev()
            .take(window)
            .map(|r| u32::from(r.score))
            .sum();
        sum as f64 / window as f64
    }

    /// Compares the last 10 scores with the 10 before them.
    pub fn trend(&self) -> FatigueTrend {
        let len = self.history.len();
        if len < TREND_WINDOW * 2 {
            return FatigueTrend::Stable;
        }

        let window_mean = |skip: usize| -> f64 {
            let sum: u32 = self
                .history
                .iter()
                .rev()
                .skip(skip)
                .take(TREND_WINDOW)
                .map(|r| u32::from(r.score))
                .sum();
            sum as f64 / TREND_WINDOW as f64
        };

        let recent = window_mean(0);
        let older = window_mean(TREND_WINDOW);

        if recent > older + TREND_MARGIN {
            FatigueTrend::Up
        } else if recent < older - TREND_MARGIN {
            FatigueTrend::Down
        } else {
            FatigueTrend::Stable
        }
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &ScoreRecord> + '_ {
        self.history.iter()
    }

    pub fn last(&self) -> Option<&ScoreRecord> {
        self.history.back()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn weights(&self) -> &FatigueWeights {
        &self.weights
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

impl Default for FatigueScorer {
    fn default() -> Self {
        Self::new(FatigueWeights::default(), SCORE_HISTORY_LEN)
    }
}

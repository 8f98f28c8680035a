use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::DetectionConfig;
use crate::detector::FatigueMonitor;
use crate::landmarks::{points_from_flat, LandmarkSet, Point2D};
use crate::snapshot::DetectionSnapshot;

#[derive(Serialize)]
struct FrameReport<'a> {
    alarm: bool,
    skipped: bool,
    #[serde(flatten)]
    snapshot: &'a DetectionSnapshot,
}

/// Browser binding for [`FatigueMonitor`].
#[wasm_bindgen]
pub struct WasmFatigueMonitor {
    inner: FatigueMonitor,
    points: Vec<Point2D>,
}

#[wasm_bindgen]
impl WasmFatigueMonitor {
    /// `config_js` 可选，缺省字段使用默认阈值；格式错误时构造失败
    #[wasm_bindgen(constructor)]
    pub fn new(config_js: JsValue) -> Result<WasmFatigueMonitor, JsValue> {
        let config: DetectionConfig = if config_js.is_undefined() || config_js.is_null() {
            DetectionConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config_js).map_err(|e| {
                tracing::warn!(error = %e, "invalid detection config");
                JsValue::from_str(&format!("invalid detection config: {e}"))
            })?
        };
        Ok(Self {
            inner: FatigueMonitor::new(config),
            points: Vec::new(),
        })
    }

    /// coords: 全部关键点的像素坐标 [x0, y0, x1, y1, ...]，空数组表示未检测到人脸
    #[wasm_bindgen]
    pub fn process_coords(&mut self, coords: &[f64], timestamp: f64) -> JsValue {
        if !points_from_flat(coords, &mut self.points) {
            tracing::warn!(len = coords.len(), "odd coordinate count, frame skipped");
        }

        let outcome = if self.points.is_empty() {
            self.inner.process_frame(None, timestamp)
        } else {
            let landmarks = LandmarkSet::new(&self.points);
            self.inner.process_frame(Some(&landmarks), timestamp)
        };

        let snapshot = self.inner.snapshot();
        let report = FrameReport {
            alarm: outcome.alarm,
            skipped: outcome.is_skipped(),
            snapshot: &snapshot,
        };
        serde_wasm_bindgen::to_value(&report).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen]
    pub fn snapshot(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.snapshot()).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen]
    pub fn enable_alarm(&self) {
        self.inner.alarm_gate().enable();
    }

    #[wasm_bindgen]
    pub fn disable_alarm(&self) {
        self.inner.alarm_gate().disable();
    }

    #[wasm_bindgen]
    pub fn set_alarm_cooldown(&self, cooldown_s: f64) {
        self.inner.alarm_gate().set_cooldown(cooldown_s);
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

#![allow(dead_code)]

use fatigue_engine::{LEFT_EYE, MOUTH, RIGHT_EYE};
use serde_json::json;

pub const MESH_SIZE: usize = 478;

/// Face mesh with the given EAR / MAR and a level head.
pub fn face(ear: f64, mar: f64) -> Vec<[f64; 2]> {
    let mut points = vec![[0.0, 0.0]; MESH_SIZE];
    let h = 30.0 * ear;
    for (idx, x0) in [(LEFT_EYE, 100.0), (RIGHT_EYE, 240.0)] {
        points[idx[0]] = [x0, 200.0];
        points[idx[1]] = [x0 + 20.0, 200.0 - h];
        points[idx[2]] = [x0 + 40.0, 200.0 - h];
        points[idx[3]] = [x0 + 60.0, 200.0];
        points[idx[4]] = [x0 + 40.0, 200.0 + h];
        points[idx[5]] = [x0 + 20.0, 200.0 + h];
    }
    let v = 100.0 * mar;
    points[MOUTH[0]] = [200.0, 300.0 - v / 2.0];
    points[MOUTH[1]] = [200.0, 300.0 + v / 2.0];
    points[MOUTH[2]] = [150.0, 300.0];
    points[MOUTH[3]] = [250.0, 300.0];
    points
}

pub fn frame_line(timestamp: f64, landmarks: Option<&[[f64; 2]]>) -> String {
    json!({ "timestamp": timestamp, "landmarks": landmarks }).to_string()
}

/// `count` frames at 30 fps starting at `start_frame`.
pub fn frames(start_frame: u32, count: u32, ear: f64, mar: f64) -> Vec<String> {
    let points = face(ear, mar);
    (start_frame..start_frame + count)
        .map(|i| frame_line(i as f64 / 30.0, Some(points.as_slice())))
        .collect()
}

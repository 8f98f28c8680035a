//! Synthetic face-mesh frames for pipeline tests.

#![allow(dead_code)]

use fatigue_engine::{Point2D, LEFT_EYE, MOUTH, RIGHT_EYE};

pub const MESH_SIZE: usize = 478;
pub const FPS: f64 = 30.0;

pub const OPEN_EAR: f64 = 0.3;
pub const CLOSED_EAR: f64 = 0.1;
pub const RELAXED_MAR: f64 = 0.3;
pub const YAWN_MAR: f64 = 0.8;

/// Builds a full mesh whose eyes measure `ear`, whose mouth measures `mar`
/// and whose eye line is rolled by `tilt_deg`.
#[derive(Debug, Clone, Copy)]
pub struct FaceBuilder {
    pub ear: f64,
    pub mar: f64,
    pub tilt_deg: f64,
    pub offset: (f64, f64),
}

impl Default for FaceBuilder {
    fn default() -> Self {
        Self {
            ear: OPEN_EAR,
            mar: RELAXED_MAR,
            tilt_deg: 0.0,
            offset: (0.0, 0.0),
        }
    }
}

impl FaceBuilder {
    pub fn ear(mut self, ear: f64) -> Self {
        self.ear = ear;
        self
    }

    pub fn mar(mut self, mar: f64) -> Self {
        self.mar = mar;
        self
    }

    pub fn tilt(mut self, tilt_deg: f64) -> Self {
        self.tilt_deg = tilt_deg;
        self
    }

    pub fn offset(mut self, dx: f64, dy: f64) -> Self {
        self.offset = (dx, dy);
        self
    }

    pub fn build(&self) -> Vec<Point2D> {
        let mut points = vec![Point2D::default(); MESH_SIZE];

        // 眼宽 60 px，EAR = h / 30
        let h = 30.0 * self.ear;
        place_eye(&mut points, &LEFT_EYE, 100.0, h);
        place_eye(&mut points, &RIGHT_EYE, 240.0, h);

        // 嘴宽 100 px，MAR = v / 100
        let v = 100.0 * self.mar;
        points[MOUTH[0]] = Point2D::new(200.0, 300.0 - v / 2.0);
        points[MOUTH[1]] = Point2D::new(200.0, 300.0 + v / 2.0);
        points[MOUTH[2]] = Point2D::new(150.0, 300.0);
        points[MOUTH[3]] = Point2D::new(250.0, 300.0);

        let (sin, cos) = self.tilt_deg.to_radians().sin_cos();
        let (cx, cy) = (200.0, 250.0);
        for p in points.iter_mut() {
            let (dx, dy) = (p.x - cx, p.y - cy);
            *p = Point2D::new(
                cx + dx * cos - dy * sin + self.offset.0,
                cy + dx * sin + dy * cos + self.offset.1,
            );
        }
        points
    }
}

fn place_eye(points: &mut [Point2D], idx: &[usize; 6], x0: f64, h: f64) {
    let y = 200.0;
    points[idx[0]] = Point2D::new(x0, y);
    points[idx[1]] = Point2D::new(x0 + 20.0, y - h);
    points[idx[2]] = Point2D::new(x0 + 40.0, y - h);
    points[idx[3]] = Point2D::new(x0 + 60.0, y);
    points[idx[4]] = Point2D::new(x0 + 40.0, y + h);
    points[idx[5]] = Point2D::new(x0 + 20.0, y + h);
}

pub fn frame_time(frame: u32) -> f64 {
    frame as f64 / FPS
}

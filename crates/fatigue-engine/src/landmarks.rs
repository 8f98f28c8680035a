use serde::{Deserialize, Serialize};

use crate::error::MetricError;

/// 2D landmark in image-pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(&self, other: &Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point2D {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Fills `out` from interleaved `[x0, y0, x1, y1, ...]` coordinates.
///
/// An odd-length input is rejected and leaves `out` empty.
pub fn points_from_flat(coords: &[f64], out: &mut Vec<Point2D>) -> bool {
    out.clear();
    if coords.len() % 2 != 0 {
        return false;
    }
    out.extend(coords.chunks_exact(2).map(|xy| Point2D::new(xy[0], xy[1])));
    true
}

/// Read-only view over one frame's landmarks. Indices are assumed stable
/// across frames (same semantic point, same index).
#[derive(Debug, Clone, Copy)]
pub struct LandmarkSet<'a> {
    points: &'a [Point2D],
}

impl<'a> LandmarkSet<'a> {
    pub fn new(points: &'a [Point2D]) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &'a [Point2D] {
        self.points
    }

    pub fn get(&self, index: usize) -> Result<Point2D, MetricError> {
        self.points
            .get(index)
            .copied()
            .ok_or(MetricError::LandmarkOutOfRange {
                index,
                len: self.points.len(),
            })
    }

    /// Checks that every index is addressable.
    pub fn contains_all(&self, indices: &[usize]) -> Result<(), MetricError> {
        match indices.iter().find(|&&i| i >= self.points.len()) {
            Some(&index) => Err(MetricError::LandmarkOutOfRange {
                index,
                len: self.points.len(),
            }),
            None => Ok(()),
        }
    }
}

impl<'a> From<&'a [Point2D]> for LandmarkSet<'a> {
    fn from(points: &'a [Point2D]) -> Self {
        Self::new(points)
    }
}

impl<'a> From<&'a Vec<Point2D>> for LandmarkSet<'a> {
    fn from(points: &'a Vec<Point2D>) -> Self {
        Self::new(points.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_get_out_of_range() {
        let points = vec![Point2D::default(); 3];
        let set = LandmarkSet::from(&points);
        assert!(set.get(2).is_ok());
        assert_eq!(
            set.get(3),
            Err(MetricError::LandmarkOutOfRange { index: 3, len: 3 })
        );
        assert!(set.contains_all(&[0, 1, 2]).is_ok());
        assert!(set.contains_all(&[0, 5]).is_err());
    }

    #[test]
    fn test_points_from_flat() {
        let mut out = vec![Point2D::new(9.0, 9.0)];
        assert!(points_from_flat(&[1.0, 2.0, 3.0, 4.0], &mut out));
        assert_eq!(out, vec![Point2D::new(1.0, 2.0), Point2D::new(3.0, 4.0)]);

        assert!(points_from_flat(&[], &mut out));
        assert!(out.is_empty());

        assert!(!points_from_flat(&[1.0, 2.0, 3.0], &mut out));
        assert!(out.is_empty());
    }
}

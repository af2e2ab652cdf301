//! Planar geometry primitives measured in room units (feet).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position on the room floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Point2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point2D> for [f64; 2] {
    fn from(p: Point2D) -> Self {
        [p.x, p.y]
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Rectangular room spanning `[0, width) x [0, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomDimensions {
    pub width: f64,
    pub height: f64,
}

impl RoomDimensions {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Number of unit-spaced samples along x.
    pub fn columns(&self) -> usize {
        sample_count(self.width)
    }

    /// Number of unit-spaced samples along y.
    pub fn rows(&self) -> usize {
        sample_count(self.height)
    }

    /// Feasible coordinate range for an emitter of the given radius, per axis.
    pub fn bounds_for(&self, radius: f64) -> (AxisBounds, AxisBounds) {
        (
            AxisBounds::new(radius, self.width - radius),
            AxisBounds::new(radius, self.height - radius),
        )
    }
}

impl fmt::Display for RoomDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn sample_count(extent: f64) -> usize {
    if extent.is_finite() && extent > 0.0 {
        extent.ceil() as usize
    } else {
        0
    }
}

/// Closed interval a single coordinate is confined to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    pub low: f64,
    pub high: f64,
}

impl AxisBounds {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.low).min(self.high)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn distance_is_euclidean() {
        let a = Point2D::new(1.0, 1.0);
        let b = Point2D::new(4.0, 5.0);
        assert_abs_diff_eq!(a.distance(&b), 5.0);
        assert_abs_diff_eq!(a.distance_squared(&b), 25.0);
    }

    #[test]
    fn sample_counts_round_up() {
        let room = RoomDimensions::new(20.0, 25.5);
        assert_eq!(room.columns(), 20);
        assert_eq!(room.rows(), 26);
        assert_eq!(RoomDimensions::new(0.0, 3.0).columns(), 0);
    }

    #[test]
    fn bounds_shrink_by_radius() {
        let room = RoomDimensions::new(20.0, 25.0);
        let (bx, by) = room.bounds_for(2.0);
        assert_eq!(bx, AxisBounds::new(2.0, 18.0));
        assert_eq!(by, AxisBounds::new(2.0, 23.0));
        assert_eq!(bx.clamp(30.0), 18.0);
        assert_eq!(by.clamp(-1.0), 2.0);
        assert!(bx.contains(2.0) && !bx.contains(18.5));
    }
}

//! Geometry helpers: distances, containment tests and percentiles
//!
//! Features:
//! - Euclidean distance between points
//! - Point-in-circle / point-in-square containment
//! - Point-to-segment distance
//! - Linearly interpolated percentiles

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A 2-D position in frame pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Length of the vector from the origin to this point
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn dot(&self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Euclidean distance between two points
pub fn distance(a: Point, b: Point) -> f64 {
    (a - b).norm()
}

/// True if the point lies inside or on the circle boundary
pub fn point_in_circle(point: Point, center: Point, radius: f64) -> bool {
    distance(point, center) <= radius
}

/// True if the point lies inside the axis-aligned square of side `size` centered on `center`
pub fn point_in_rect(point: Point, center: Point, size: f64) -> bool {
    let half = size / 2.0;
    (center.x - half..=center.x + half).contains(&point.x)
        && (center.y - half..=center.y + half).contains(&point.y)
}

/// Shortest distance from a point to the segment `start..end`
///
/// A zero-length segment degrades to the distance to `start`.
pub fn point_to_segment_distance(point: Point, start: Point, end: Point) -> f64 {
    let segment = end - start;
    let len_sq = segment.dot(segment);
    if len_sq == 0.0 {
        return distance(point, start);
    }

    let t = ((point - start).dot(segment) / len_sq).clamp(0.0, 1.0);
    distance(point, start + segment * t)
}

/// Percentile (0-100) with linear interpolation between order statistics
///
/// Returns 0.0 for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let index = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let frac = index - lower as f64;

    if frac == 0.0 {
        sorted[lower]
    } else {
        let upper = (lower + 1).min(sorted.len() - 1);
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

/// Arithmetic mean, 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_empty() {
        assert_eq!(percentile(&[], 0.0), 0.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(percentile(&[], 95.0), 0.0);
    }

    #[test]
    fn test_percentile_bounds() {
        let values = vec![4.0, 1.0, 9.0, 3.0, 7.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 9.0);
    }

    #[test]
    fn test_percentile_median() {
        // Odd length: middle element
        assert_eq!(percentile(&[5.0, 1.0, 3.0], 50.0), 3.0);
        // Even length: midpoint of the two middle elements
        assert_eq!(percentile(&[4.0, 1.0, 2.0, 3.0], 50.0), 2.5);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values: Vec<f64> = (0..=10).map(|v| v as f64).collect();
        assert!((percentile(&values, 95.0) - 9.5).abs() < 1e-9);
    }

    #[test]
    fn test_point_in_circle() {
        let center = Point::new(100.0, 100.0);
        assert!(point_in_circle(Point::new(100.0, 150.0), center, 50.0));
        assert!(!point_in_circle(Point::new(100.0, 151.0), center, 50.0));
        // Zero radius only contains the center itself
        assert!(point_in_circle(center, center, 0.0));
        assert!(!point_in_circle(Point::new(100.0, 100.5), center, 0.0));
    }

    #[test]
    fn test_point_in_rect() {
        let center = Point::new(50.0, 50.0);
        assert!(point_in_rect(Point::new(80.0, 20.0), center, 60.0));
        assert!(!point_in_rect(Point::new(81.0, 50.0), center, 60.0));
    }

    #[test]
    fn test_point_to_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(100.0, 0.0);
        assert_eq!(point_to_segment_distance(Point::new(50.0, 7.0), a, b), 7.0);
        // Beyond the end clamps to the endpoint
        assert_eq!(point_to_segment_distance(Point::new(103.0, 4.0), a, b), 5.0);
        // Degenerate segment
        assert_eq!(point_to_segment_distance(Point::new(3.0, 4.0), a, a), 5.0);
    }
}

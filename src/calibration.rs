//! Two-click calibration
//!
//! HOLD mode calibrates a circle (center click, then edge click); FOLLOW
//! mode calibrates the endpoints of the target path (A, then B). Derived
//! values are computed from the stored points on every read, never cached.

use crate::metrics::geometry::{distance, Point};

/// Circle calibration for HOLD mode
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CircleCalibration {
    #[default]
    Uninitialized,
    CenterSet(Point),
    Complete { center: Point, edge: Point },
}

impl CircleCalibration {
    /// Advance with a click; clicks after completion are ignored
    pub fn handle_click(&mut self, click: Point) {
        *self = match *self {
            CircleCalibration::Uninitialized => {
                tracing::debug!(x = click.x, y = click.y, "calibration center set");
                CircleCalibration::CenterSet(click)
            }
            CircleCalibration::CenterSet(center) => {
                tracing::debug!(radius = distance(center, click), "calibration complete");
                CircleCalibration::Complete {
                    center,
                    edge: click,
                }
            }
            complete @ CircleCalibration::Complete { .. } => complete,
        };
    }

    pub fn reset(&mut self) {
        *self = CircleCalibration::Uninitialized;
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, CircleCalibration::Complete { .. })
    }

    pub fn center(&self) -> Option<Point> {
        match *self {
            CircleCalibration::Uninitialized => None,
            CircleCalibration::CenterSet(center) | CircleCalibration::Complete { center, .. } => {
                Some(center)
            }
        }
    }

    /// `|edge - center|` once complete
    pub fn radius(&self) -> Option<f64> {
        match *self {
            CircleCalibration::Complete { center, edge } => Some(distance(center, edge)),
            _ => None,
        }
    }

    /// Calibrated circle, if any
    pub fn circle(&self) -> Option<(Point, f64)> {
        match *self {
            CircleCalibration::Complete { center, edge } => Some((center, distance(center, edge))),
            _ => None,
        }
    }
}

/// Endpoint calibration for the FOLLOW linear path
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SegmentCalibration {
    #[default]
    Uninitialized,
    PointASet(Point),
    Complete { a: Point, b: Point },
}

impl SegmentCalibration {
    pub fn handle_click(&mut self, click: Point) {
        *self = match *self {
            SegmentCalibration::Uninitialized => {
                tracing::debug!(x = click.x, y = click.y, "path point A set");
                SegmentCalibration::PointASet(click)
            }
            SegmentCalibration::PointASet(a) => {
                tracing::debug!(length = distance(a, click), "path point B set");
                SegmentCalibration::Complete { a, b: click }
            }
            complete @ SegmentCalibration::Complete { .. } => complete,
        };
    }

    pub fn reset(&mut self) {
        *self = SegmentCalibration::Uninitialized;
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, SegmentCalibration::Complete { .. })
    }

    pub fn point_a(&self) -> Option<Point> {
        match *self {
            SegmentCalibration::Uninitialized => None,
            SegmentCalibration::PointASet(a) | SegmentCalibration::Complete { a, .. } => Some(a),
        }
    }

    pub fn endpoints(&self) -> Option<(Point, Point)> {
        match *self {
            SegmentCalibration::Complete { a, b } => Some((a, b)),
            _ => None,
        }
    }

    pub fn length(&self) -> Option<f64> {
        self.endpoints().map(|(a, b)| distance(a, b))
    }
}

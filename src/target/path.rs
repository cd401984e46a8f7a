//! Moving target generators for FOLLOW mode
//!
//! Both generators are pure functions of elapsed session time; the only
//! state they hold is their geometry and speed parameters.

use crate::config::FollowConfig;
use crate::metrics::geometry::Point;
use std::f64::consts::TAU;

/// Back-and-forth target between two calibrated points, speeding up over time
#[derive(Clone, Debug, PartialEq)]
pub struct LinearPath {
    a: Point,
    b: Point,
    /// Cycles (A->B->A) per second at t = 0
    base_cycles_per_second: f64,
    /// Speed increase per ramp period, as a fraction of the base rate
    ramp_fraction: f64,
    ramp_period_s: f64,
}

impl LinearPath {
    pub fn new(a: Point, b: Point, base_cycles_per_second: f64) -> Self {
        LinearPath {
            a,
            b,
            base_cycles_per_second,
            ramp_fraction: 0.1,
            ramp_period_s: 5.0,
        }
    }

    /// Replace the default ramp (10% every 5 s)
    pub fn with_ramp(mut self, ramp_fraction: f64, ramp_period_s: f64) -> Self {
        self.ramp_fraction = ramp_fraction;
        self.ramp_period_s = ramp_period_s;
        self
    }

    pub fn endpoints(&self) -> (Point, Point) {
        (self.a, self.b)
    }

    /// Multiplier over the base rate at time `t`; grows without bound
    pub fn speed_multiplier(&self, t: f64) -> f64 {
        1.0 + (t / self.ramp_period_s) * self.ramp_fraction
    }

    pub fn cycles_per_second(&self, t: f64) -> f64 {
        self.base_cycles_per_second * self.speed_multiplier(t)
    }

    pub fn position(&self, t: f64) -> Point {
        if self.a == self.b {
            return self.a;
        }

        let phase = (t * self.cycles_per_second(t)).rem_euclid(1.0);
        let ratio = if phase <= 0.5 {
            2.0 * phase
        } else {
            2.0 * (1.0 - phase)
        };
        self.a + (self.b - self.a) * ratio
    }
}

/// Constant-speed circular target
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitPath {
    center: Point,
    radius: f64,
    period_s: f64,
}

impl OrbitPath {
    pub fn new(center: Point, radius: f64, period_s: f64) -> Self {
        OrbitPath {
            center,
            radius,
            period_s,
        }
    }

    /// Orbit centered in the frame with a radius of `fraction` of the shorter side
    pub fn for_frame(width: u32, height: u32, fraction: f64, period_s: f64) -> Self {
        let center = Point::new(width as f64 / 2.0, height as f64 / 2.0);
        let radius = width.min(height) as f64 * fraction;
        OrbitPath::new(center, radius, period_s)
    }

    fn angular_speed(&self) -> f64 {
        TAU / self.period_s
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn position(&self, t: f64) -> Point {
        let angle = self.angular_speed() * t;
        self.center + Point::new(angle.cos(), angle.sin()) * self.radius
    }

    /// Time derivative of [`OrbitPath::position`], px/s
    pub fn velocity(&self, t: f64) -> Point {
        let omega = self.angular_speed();
        let angle = omega * t;
        Point::new(-angle.sin(), angle.cos()) * (self.radius * omega)
    }
}

/// Target generator selected by the FOLLOW path style
#[derive(Clone, Debug, PartialEq)]
pub enum TargetPath {
    Linear(LinearPath),
    Orbit(OrbitPath),
}

impl TargetPath {
    /// Linear path with the ramp parameters from config
    pub fn linear(a: Point, b: Point, config: &FollowConfig) -> Self {
        TargetPath::Linear(
            LinearPath::new(a, b, config.base_cycles_per_second)
                .with_ramp(config.ramp_fraction, config.ramp_period_s),
        )
    }

    pub fn position(&self, t: f64) -> Point {
        match self {
            TargetPath::Linear(path) => path.position(t),
            TargetPath::Orbit(path) => path.position(t),
        }
    }

    /// Speed multiplier shown next to the beat counter
    pub fn speed_multiplier(&self, t: f64) -> f64 {
        match self {
            TargetPath::Linear(path) => path.speed_multiplier(t),
            TargetPath::Orbit(_) => 1.0,
        }
    }
}

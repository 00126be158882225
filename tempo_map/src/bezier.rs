// Least-squares quadratic Bezier fit over a run of points.
//
// P(t) = (1-t)^2 P0 + 2t(1-t) P1 + t^2 P2, with P0 and P2 pinned to the
// first and last point. Each dimension (tick, time) is fitted on its own:
// P1 has a closed-form least-squares solution once the parameter values
// t_i are fixed. We use t_i = i/n for i in 0..n, so the last sample sits at
// (n-1)/n rather than 1.
//
// The chords P0->P1 and P1->P2 are the curve's end tangents; `model.rs`
// turns their slopes into start/end tempo estimates.

use crate::error::{Result, TempoMapError};
use crate::points::DataPoint;

/// A point in (tick, time_ms) space. Ticks are fractional here because P1
/// rarely lands on the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub tick: f64,
    pub time_ms: f64,
}

impl From<DataPoint> for ControlPoint {
    fn from(p: DataPoint) -> Self {
        ControlPoint {
            tick: p.tick as f64,
            time_ms: p.time_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticBezier {
    pub p0: ControlPoint,
    pub p1: ControlPoint,
    pub p2: ControlPoint,
}

/// Derivative of a quadratic Bezier: B'(t) = (1-t) Q0 + t Q1 with
/// Q0 = 2(P1-P0), Q1 = 2(P2-P1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearBezier {
    pub q0: ControlPoint,
    pub q1: ControlPoint,
}

impl LinearBezier {
    pub fn at(&self, t: f64) -> ControlPoint {
        ControlPoint {
            tick: (1.0 - t) * self.q0.tick + t * self.q1.tick,
            time_ms: (1.0 - t) * self.q0.time_ms + t * self.q1.time_ms,
        }
    }

    /// d(time)/d(tick) at `t`. Infinite where the tick derivative is zero.
    pub fn slope(&self, t: f64) -> f64 {
        let d = self.at(t);
        d.time_ms / d.tick
    }
}

impl QuadraticBezier {
    /// Fit a curve to `points`. Needs at least four points.
    pub fn fit(points: &[DataPoint]) -> Result<Self> {
        if points.len() < 4 {
            return Err(TempoMapError::InsufficientPointsForFit { got: points.len() });
        }
        let p0 = ControlPoint::from(points[0]);
        let p2 = ControlPoint::from(points[points.len() - 1]);

        let n = points.len() as f64;
        let mut num_tick = 0.0;
        let mut num_time = 0.0;
        let mut denom = 0.0;
        for (i, p) in points.iter().enumerate() {
            let t = i as f64 / n;
            let a = (1.0 - t) * (1.0 - t);
            let c = t * t;
            num_tick += p.tick as f64 - a * p0.tick - c * p2.tick;
            num_time += p.time_ms - a * p0.time_ms - c * p2.time_ms;
            denom += 2.0 * t * (1.0 - t);
        }

        let p1 = ControlPoint {
            tick: num_tick / denom,
            time_ms: num_time / denom,
        };
        Ok(QuadraticBezier { p0, p1, p2 })
    }

    fn weights(t: f64) -> (f64, f64, f64) {
        let u = 1.0 - t;
        (u * u, 2.0 * t * u, t * t)
    }

    /// Tick coordinate at `t`.
    pub fn x(&self, t: f64) -> f64 {
        let (a, b, c) = Self::weights(t);
        a * self.p0.tick + b * self.p1.tick + c * self.p2.tick
    }

    /// Time coordinate at `t`.
    pub fn y(&self, t: f64) -> f64 {
        let (a, b, c) = Self::weights(t);
        a * self.p0.time_ms + b * self.p1.time_ms + c * self.p2.time_ms
    }

    pub fn at(&self, t: f64) -> ControlPoint {
        ControlPoint {
            tick: self.x(t),
            time_ms: self.y(t),
        }
    }

    pub fn derivative(&self) -> LinearBezier {
        LinearBezier {
            q0: ControlPoint {
                tick: 2.0 * (self.p1.tick - self.p0.tick),
                time_ms: 2.0 * (self.p1.time_ms - self.p0.time_ms),
            },
            q1: ControlPoint {
                tick: 2.0 * (self.p2.tick - self.p1.tick),
                time_ms: 2.0 * (self.p2.time_ms - self.p1.time_ms),
            },
        }
    }

    /// Milliseconds per tick at the start of the curve.
    pub fn start_slope(&self) -> f64 {
        self.derivative().slope(0.0)
    }

    /// Milliseconds per tick at the end of the curve.
    pub fn end_slope(&self) -> f64 {
        self.derivative().slope(1.0)
    }
}

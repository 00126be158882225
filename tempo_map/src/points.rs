// Input points and normalization.
//
// The alignment step upstream hands us `(tick, seconds)` pairs: a notated
// score position and the physical time the performer played it. Everything
// downstream works on `DataPoint`s rebased so the first point sits at tick 0
// and time 0, with time in milliseconds.
//
// Normalization does no validation and never reorders. Ticks are signed so
// an out-of-order input rebases to a negative tick instead of wrapping.

use serde::{Deserialize, Serialize};

/// A raw aligned point as produced by the alignment step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub tick: i64,
    pub seconds: f64,
}

impl RawPoint {
    pub fn new(tick: i64, seconds: f64) -> Self {
        RawPoint { tick, seconds }
    }
}

/// A normalized point: ticks from the first point, milliseconds from the
/// first point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub tick: i64,
    pub time_ms: f64,
}

impl DataPoint {
    pub fn new(tick: i64, time_ms: f64) -> Self {
        DataPoint { tick, time_ms }
    }
}

/// Rebase `raw` to start at tick 0 / time 0 and convert seconds to
/// milliseconds. An empty input yields an empty output.
pub fn normalize(raw: &[RawPoint]) -> Vec<DataPoint> {
    let Some(first) = raw.first() else {
        return Vec::new();
    };
    raw.iter()
        .map(|p| DataPoint {
            tick: p.tick - first.tick,
            time_ms: (p.seconds - first.seconds) * 1000.0,
        })
        .collect()
}

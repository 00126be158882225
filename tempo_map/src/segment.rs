// Segmentation of a normalized point run by local tempo trend.
//
// For each consecutive pair of points we take a local estimate
// `dtime / (dtick / 720)`: milliseconds per quarter note. A segment is a
// maximal run over which that estimate only moves in one direction.
// A strict increase continues or opens a `Rising` segment. A strict decrease
// does the same for `Falling`. Equal estimates keep whatever direction is
// current.
//
// Storage is arena-and-index: `SegmentedPoints` owns the point buffer and the
// per-pair estimates once, and each `Segment` is an inclusive index range
// into the points. Neighbouring segments share exactly one boundary point,
// so segment `k` ends where segment `k + 1` starts. A segment spanning points
// `start..=end` owns the estimates `start..end`, one fewer than its points.

use crate::error::{Result, TempoMapError};
use crate::points::DataPoint;
use crate::tempo::TICKS_PER_BEAT;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Rising,
    Falling,
}

/// Local tempo estimate for the pair of points starting at `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoPoint {
    pub tick: i64,
    /// Milliseconds per quarter note between this point and the next.
    pub estimate: f64,
}

/// An inclusive range of points sharing one trend direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub direction: Direction,
    /// Index of the first point.
    pub start: usize,
    /// Index of the last point (inclusive).
    pub end: usize,
}

impl Segment {
    /// Number of points covered, boundary points included.
    pub fn point_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// The normalized point buffer, its local tempo estimates, and the segments
/// indexing into both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentedPoints {
    pub points: Vec<DataPoint>,
    pub tempo_points: Vec<TempoPoint>,
    pub segments: Vec<Segment>,
}

impl SegmentedPoints {
    /// Points covered by `segment`.
    pub fn points_of(&self, segment: &Segment) -> &[DataPoint] {
        &self.points[segment.start..=segment.end]
    }

    /// Tempo estimates owned by `segment`.
    pub fn tempo_points_of(&self, segment: &Segment) -> &[TempoPoint] {
        &self.tempo_points[segment.start..segment.end]
    }

    /// Treat the whole buffer as one segment without trend detection. Used
    /// for a two-point input, which has a single estimate and so no trend.
    pub fn single(points: Vec<DataPoint>, direction: Direction) -> Result<Self> {
        if points.len() < 2 {
            return Err(TempoMapError::InsufficientData {
                needed: 2,
                got: points.len(),
            });
        }
        let tempo_points = local_tempo_points(&points);
        let segments = vec![Segment {
            direction,
            start: 0,
            end: points.len() - 1,
        }];
        Ok(SegmentedPoints {
            points,
            tempo_points,
            segments,
        })
    }
}

/// Per-pair tempo estimates: `dtime / (dtick / 720)` tagged with the pair's
/// first tick.
pub fn local_tempo_points(points: &[DataPoint]) -> Vec<TempoPoint> {
    points
        .windows(2)
        .map(|w| TempoPoint {
            tick: w[0].tick,
            estimate: (w[1].time_ms - w[0].time_ms) / ((w[1].tick - w[0].tick) as f64 / TICKS_PER_BEAT),
        })
        .collect()
}

/// Split `points` into maximal monotonic runs of local tempo. Needs at least
/// three points (two estimates) to establish a trend.
pub fn detect_segments(points: Vec<DataPoint>) -> Result<SegmentedPoints> {
    if points.len() < 3 {
        return Err(TempoMapError::InsufficientData {
            needed: 3,
            got: points.len(),
        });
    }
    let tempo_points = local_tempo_points(&points);

    let initial = if tempo_points[1].estimate > tempo_points[0].estimate {
        Direction::Rising
    } else {
        Direction::Falling
    };
    let mut current = Segment {
        direction: initial,
        start: 0,
        end: 1,
    };
    let mut segments = Vec::new();

    for i in 1..tempo_points.len() {
        let prev = tempo_points[i - 1].estimate;
        let here = tempo_points[i].estimate;
        let trend = if here > prev {
            Some(Direction::Rising)
        } else if here < prev {
            Some(Direction::Falling)
        } else {
            None
        };

        match trend {
            Some(direction) if direction != current.direction => {
                // Close at point i; the new run starts there.
                segments.push(current);
                current = Segment {
                    direction,
                    start: i,
                    end: i + 1,
                };
            }
            _ => current.end = i + 1,
        }
    }
    segments.push(current);

    Ok(SegmentedPoints {
        points,
        tempo_points,
        segments,
    })
}

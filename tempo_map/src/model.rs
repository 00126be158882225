// Initial tempo model for one segment.
//
// The shape of the first guess depends on how many points the segment has:
// - 2 points: constant tempo from the single time gap. Exact, no refinement.
// - 3 points: a transition from the first gap's tempo to the last gap's.
//   Also used as is.
// - 4 or more: a transition candidate that `sa.rs` refines. A quadratic
//   Bezier is fitted first and its end chords give start/end tempo
//   estimates. Those estimates are reported as diagnostics only; the
//   candidate itself is seeded from the raw boundary gaps with a linear ramp
//   and a quarter-note beat.

use crate::bezier::QuadraticBezier;
use crate::error::{Result, TempoMapError};
use crate::points::DataPoint;
use crate::tempo::{MS_PER_MINUTE, MeanTempoAt, TICKS_PER_BEAT, TempoModel};
use tracing::debug;

/// Beat length of a refinement candidate.
pub const CANDIDATE_BEAT_LENGTH: f64 = 0.25;

/// Start and end tempo read off the fitted curve's end chords.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveEstimate {
    pub curve: QuadraticBezier,
    pub start_bpm: f64,
    pub end_bpm: f64,
}

impl CurveEstimate {
    pub fn from_curve(curve: QuadraticBezier) -> Self {
        let scale = MS_PER_MINUTE / TICKS_PER_BEAT;
        let start_bpm =
            (curve.p1.tick - curve.p0.tick) / (curve.p1.time_ms - curve.p0.time_ms) * scale;
        let end_bpm =
            (curve.p2.tick - curve.p1.tick) / (curve.p2.time_ms - curve.p1.time_ms) * scale;
        CurveEstimate {
            curve,
            start_bpm,
            end_bpm,
        }
    }
}

/// What the builder hands back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitialModel {
    /// Two or three points: the model is final.
    Exact(TempoModel),
    /// Four or more points: a starting point for annealing.
    Candidate {
        model: TempoModel,
        estimate: CurveEstimate,
    },
}

impl InitialModel {
    pub fn model(&self) -> &TempoModel {
        match self {
            InitialModel::Exact(model) => model,
            InitialModel::Candidate { model, .. } => model,
        }
    }
}

/// Tempo implied by a time gap of `delta_ms` for one beat.
fn gap_bpm(delta_ms: f64) -> f64 {
    MS_PER_MINUTE / delta_ms
}

/// Beat length, in quarter notes, implied by a tick gap.
fn gap_beat_length(from: &DataPoint, to: &DataPoint) -> f64 {
    (to.tick - from.tick) as f64 / TICKS_PER_BEAT / 4.0
}

/// Build the first model for a segment's points.
pub fn build_initial_model(points: &[DataPoint]) -> Result<InitialModel> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 2 => (first, last),
        _ => {
            return Err(TempoMapError::InsufficientData {
                needed: 2,
                got: points.len(),
            });
        }
    };
    let second = &points[1];
    let penultimate = &points[points.len() - 2];
    let start_bpm = gap_bpm(second.time_ms - first.time_ms);

    match points.len() {
        2 => Ok(InitialModel::Exact(TempoModel::constant(
            first.tick,
            last.tick,
            start_bpm,
            gap_beat_length(first, second),
        ))),
        3 => Ok(InitialModel::Exact(TempoModel::transitioning(
            first.tick,
            last.tick,
            start_bpm,
            gap_bpm(last.time_ms - penultimate.time_ms),
            MeanTempoAt::MIDPOINT,
            gap_beat_length(first, second),
        ))),
        _ => {
            let estimate = CurveEstimate::from_curve(QuadraticBezier::fit(points)?);
            debug!(
                start_bpm = estimate.start_bpm,
                end_bpm = estimate.end_bpm,
                date = first.tick,
                end_date = last.tick,
                "curve estimate (not used to seed the candidate)"
            );
            let model = TempoModel::transitioning(
                first.tick,
                last.tick,
                start_bpm,
                gap_bpm(last.time_ms - penultimate.time_ms),
                MeanTempoAt::MIDPOINT,
                CANDIDATE_BEAT_LENGTH,
            );
            Ok(InitialModel::Candidate { model, estimate })
        }
    }
}

// Pipeline entry point: raw aligned points in, tempo map out.
//
// raw points -> normalize -> detect_segments -> per segment:
//   build_initial_model -> (anneal, for four or more points) -> TempoSegment
//
// Segments are fitted one after another, drawing from the same random
// source, so a fixed seed gives a fixed map. The first failing segment
// aborts the call; no partial map is returned. The result is rebuilt from
// scratch whenever the input changes.

use crate::error::{Result, TempoMapError};
use crate::model::{InitialModel, build_initial_model};
use crate::points::{DataPoint, RawPoint, normalize};
use crate::sa::{AnnealConfig, anneal, mean_squared_error};
use crate::segment::{Direction, Segment, SegmentedPoints, TempoPoint, detect_segments};
use crate::tempo::{TempoModel, elapsed_ms};
use serde::{Deserialize, Serialize};
use tempo_map_prng::UniformSource;
use tracing::info;

/// A fitted model and the segment it was fitted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoSegment {
    pub model: TempoModel,
    pub segment: Segment,
    /// Mean squared error of `model` against the segment's points, in ms^2.
    pub error: f64,
}

/// The fitted tempo map, holding the point buffer its segments index into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoMap {
    pub points: SegmentedPoints,
    pub segments: Vec<TempoSegment>,
}

impl TempoMap {
    pub fn points_of(&self, segment: &TempoSegment) -> &[DataPoint] {
        self.points.points_of(&segment.segment)
    }

    pub fn tempo_points_of(&self, segment: &TempoSegment) -> &[TempoPoint] {
        self.points.tempo_points_of(&segment.segment)
    }

    /// Modelled milliseconds from tick 0 to `tick`, integrating each segment
    /// in turn. `None` outside the fitted range.
    pub fn time_at(&self, tick: f64) -> Option<f64> {
        let mut offset = 0.0;
        for s in &self.segments {
            let model = &s.model;
            if tick < model.date as f64 {
                return None;
            }
            if tick <= model.end_date as f64 {
                return Some(offset + elapsed_ms(tick, model));
            }
            offset += elapsed_ms(model.end_date as f64, model);
        }
        None
    }

    /// Modelled minus observed time for every input point.
    pub fn residuals(&self) -> Vec<f64> {
        self.points
            .points
            .iter()
            .map(|p| self.time_at(p.tick as f64).map_or(f64::NAN, |t| t - p.time_ms))
            .collect()
    }
}

/// Fit one segment.
fn fit_segment(
    points: &[DataPoint],
    segment: Segment,
    config: &AnnealConfig,
    rng: &mut impl UniformSource,
) -> Result<TempoSegment> {
    let model = match build_initial_model(points)? {
        InitialModel::Exact(model) => model,
        InitialModel::Candidate { model, .. } => anneal(&model, points, config, rng).model,
    };
    Ok(TempoSegment {
        model,
        segment,
        error: mean_squared_error(&model, points),
    })
}

/// Build a tempo map from aligned `(tick, seconds)` points.
///
/// Needs at least two points. Two points make a single constant segment;
/// three or more go through trend detection.
pub fn approximate(
    raw: &[RawPoint],
    config: &AnnealConfig,
    rng: &mut impl UniformSource,
) -> Result<TempoMap> {
    let normalized = normalize(raw);
    let points = match normalized.len() {
        0 | 1 => {
            return Err(TempoMapError::InsufficientData {
                needed: 2,
                got: normalized.len(),
            });
        }
        // No trend from a single gap; fall back to the detector's default.
        2 => SegmentedPoints::single(normalized, Direction::Falling)?,
        _ => detect_segments(normalized)?,
    };

    let mut segments = Vec::with_capacity(points.segments.len());
    for segment in &points.segments {
        segments.push(fit_segment(points.points_of(segment), *segment, config, rng)?);
    }

    info!(
        points = points.points.len(),
        segments = segments.len(),
        "tempo map approximated"
    );

    Ok(TempoMap { points, segments })
}

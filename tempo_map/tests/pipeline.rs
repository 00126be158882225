// End-to-end tests for tempo map approximation.
//
// Each test synthesizes a performance from known tempo models, runs the full
// pipeline through the public API, and checks the resulting map's structure
// and its agreement with the observed timings.

use tempo_map::sa::{AnnealConfig, mean_squared_error};
use tempo_map::segment::Direction;
use tempo_map::tempo::{MeanTempoAt, TempoModel, elapsed_ms};
use tempo_map::{RawPoint, TempoMapError, approximate};
use tempo_map_prng::SeededRng;

/// One point per beat over `model`, shifted so the performance starts at
/// `start_seconds` and the score at `start_tick`.
fn perform(model: &TempoModel, start_tick: i64, start_seconds: f64) -> Vec<RawPoint> {
    (0..=(model.end_date - model.date) / 720)
        .map(|beat| {
            let tick = model.date + beat * 720;
            let ms = elapsed_ms(tick as f64, model);
            RawPoint::new(start_tick + tick, start_seconds + ms / 1000.0)
        })
        .collect()
}

fn ritardando() -> TempoModel {
    TempoModel::transitioning(0, 8 * 720, 120.0, 80.0, MeanTempoAt::MIDPOINT, 0.25)
}

#[test]
fn ritardando_is_one_rising_segment() {
    let raw = perform(&ritardando(), 1440, 3.25);
    let map = approximate(&raw, &AnnealConfig::default(), &mut SeededRng::new(5)).unwrap();

    assert_eq!(map.segments.len(), 1);
    let s = &map.segments[0];
    // Milliseconds per beat keep growing through a ritardando.
    assert_eq!(s.segment.direction, Direction::Rising);
    assert_eq!((s.model.date, s.model.end_date), (0, 8 * 720));
    assert!(s.model.bpm > s.model.transition_to().unwrap());
    assert_eq!(map.points_of(s).len(), raw.len());
}

#[test]
fn refinement_beats_the_first_guess() {
    let raw = perform(&ritardando(), 0, 0.0);
    let map = approximate(&raw, &AnnealConfig::default(), &mut SeededRng::new(5)).unwrap();
    let s = &map.segments[0];
    let pts = map.points_of(s);

    let first = pts[0];
    let second = pts[1];
    let last = pts[pts.len() - 1];
    let penultimate = pts[pts.len() - 2];
    let guess = TempoModel::transitioning(
        first.tick,
        last.tick,
        60_000.0 / (second.time_ms - first.time_ms),
        60_000.0 / (last.time_ms - penultimate.time_ms),
        MeanTempoAt::MIDPOINT,
        0.25,
    );
    let guess_error = mean_squared_error(&guess, pts);
    assert!(s.error <= guess_error, "{} > {}", s.error, guess_error);
    assert_eq!(s.error, mean_squared_error(&s.model, pts));
}

#[test]
fn accelerando_then_ritardando() {
    let accel = TempoModel::transitioning(0, 4 * 720, 90.0, 130.0, MeanTempoAt::MIDPOINT, 0.25);
    let mut raw = perform(&accel, 0, 0.0);
    let offset = raw.last().map(|p| p.seconds).unwrap();
    let rit = TempoModel::transitioning(0, 5 * 720, 125.0, 85.0, MeanTempoAt::MIDPOINT, 0.25);
    raw.extend(perform(&rit, 4 * 720, offset).into_iter().skip(1));

    let map = approximate(&raw, &AnnealConfig::default(), &mut SeededRng::new(9)).unwrap();
    let dirs: Vec<Direction> = map.segments.iter().map(|s| s.segment.direction).collect();
    assert_eq!(dirs, vec![Direction::Falling, Direction::Rising]);

    for pair in map.segments.windows(2) {
        assert_eq!(pair[0].segment.end, pair[1].segment.start);
        assert_eq!(pair[0].model.end_date, pair[1].model.date);
    }
    assert!(map.segments[0].model.is_accelerating());
    assert!(!map.segments[1].model.is_accelerating());

    let residuals = map.residuals();
    assert_eq!(residuals.len(), raw.len());
    assert_eq!(residuals[0], 0.0);
    assert!(residuals.iter().all(|r| r.is_finite()));
}

#[test]
fn same_seed_same_map() {
    let raw = perform(&ritardando(), 0, 0.0);
    let config = AnnealConfig {
        success_error: 0.0,
        ..Default::default()
    };
    let a = approximate(&raw, &config, &mut SeededRng::new(77)).unwrap();
    let b = approximate(&raw, &config, &mut SeededRng::new(77)).unwrap();
    assert_eq!(a, b);
    for (x, y) in a.segments.iter().zip(&b.segments) {
        assert_eq!(x.model.bpm.to_bits(), y.model.bpm.to_bits());
        assert_eq!(
            x.model.transition_to().map(f64::to_bits),
            y.model.transition_to().map(f64::to_bits)
        );
    }
}

#[test]
fn single_point_is_rejected() {
    let err = approximate(
        &[RawPoint::new(0, 0.0)],
        &AnnealConfig::default(),
        &mut SeededRng::new(0),
    )
    .unwrap_err();
    assert!(matches!(err, TempoMapError::InsufficientData { needed: 2, got: 1 }));
}

#[test]
fn map_serializes_for_consumers() {
    let raw = perform(&ritardando(), 0, 0.0);
    let map = approximate(&raw, &AnnealConfig::default(), &mut SeededRng::new(1)).unwrap();
    let json = serde_json::to_value(&map).unwrap();
    let seg = &json["segments"][0];
    assert!(seg["model"]["bpm"].is_number());
    assert!(seg["model"]["transition"]["mean_tempo_at"].is_number());
    assert_eq!(seg["segment"]["direction"], "Rising");
}

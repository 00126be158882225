// Tempo models and their evaluation.
//
// A `TempoModel` describes tempo over a tick range `[date, end_date]`. It is
// either constant (`transition: None`) or eases from `bpm` to
// `transition.to` along a power-law curve. The curve's skew is set by
// `mean_tempo_at`: the fraction of the range at which tempo crosses the
// midpoint between the two tempi. The exponent is
// `ln(0.5) / ln(mean_tempo_at)`, so 0.5 gives a linear ramp.
//
// Two evaluators, both pure:
// - `instantaneous_tempo`: bpm at a (possibly fractional) tick.
// - `elapsed_ms`: milliseconds from `date` to a tick. Closed form for
//   constant tempo, composite Simpson integration of 1/tempo otherwise.
//
// Models are plain values. The optimizer in `sa.rs` never edits one in
// place; it builds a new candidate for each step.

use crate::error::{Result, TempoMapError};
use serde::{Deserialize, Serialize};

/// Ticks per quarter note.
pub const TICKS_PER_BEAT: f64 = 720.0;

pub const MS_PER_MINUTE: f64 = 60_000.0;

/// Returned by `instantaneous_tempo` for a model with no usable bpm.
pub const FALLBACK_BPM: f64 = 100.0;

/// Progress fraction in the open interval (0, 1) at which a transition
/// reaches its midpoint tempo.
///
/// 0 and 1 make the exponent degenerate (division by `ln(0)` or `ln(1)`), so
/// construction rejects them instead of letting NaN reach the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct MeanTempoAt(f64);

impl MeanTempoAt {
    /// Linear ramp.
    pub const MIDPOINT: MeanTempoAt = MeanTempoAt(0.5);

    pub fn new(value: f64) -> Result<Self> {
        if value > 0.0 && value < 1.0 {
            Ok(MeanTempoAt(value))
        } else {
            Err(TempoMapError::InvalidMeanTempoAt(value))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Power-law exponent applied to progress.
    pub fn exponent(self) -> f64 {
        0.5f64.ln() / self.0.ln()
    }
}

impl TryFrom<f64> for MeanTempoAt {
    type Error = TempoMapError;

    fn try_from(value: f64) -> Result<Self> {
        MeanTempoAt::new(value)
    }
}

impl From<MeanTempoAt> for f64 {
    fn from(m: MeanTempoAt) -> f64 {
        m.0
    }
}

/// Target tempo reached at `end_date`, and the shape of the ease toward it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub to: f64,
    pub mean_tempo_at: MeanTempoAt,
}

/// Parametric tempo over `[date, end_date]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoModel {
    /// First tick covered.
    pub date: i64,
    /// Last tick covered.
    pub end_date: i64,
    /// Tempo at `date`.
    pub bpm: f64,
    /// Beat duration as a fraction of a quarter note.
    pub beat_length: f64,
    pub transition: Option<Transition>,
}

impl TempoModel {
    pub fn constant(date: i64, end_date: i64, bpm: f64, beat_length: f64) -> Self {
        TempoModel {
            date,
            end_date,
            bpm,
            beat_length,
            transition: None,
        }
    }

    pub fn transitioning(
        date: i64,
        end_date: i64,
        bpm: f64,
        to: f64,
        mean_tempo_at: MeanTempoAt,
        beat_length: f64,
    ) -> Self {
        TempoModel {
            date,
            end_date,
            bpm,
            beat_length,
            transition: Some(Transition { to, mean_tempo_at }),
        }
    }

    pub fn transition_to(&self) -> Option<f64> {
        self.transition.map(|t| t.to)
    }

    pub fn mean_tempo_at(&self) -> Option<f64> {
        self.transition.map(|t| t.mean_tempo_at.get())
    }

    /// True when the tempo rises across the range.
    pub fn is_accelerating(&self) -> bool {
        self.transition.is_some_and(|t| self.bpm < t.to)
    }

    /// A copy with new start and target tempi. A constant model stays
    /// constant and only takes the new `bpm`.
    pub fn with_tempi(&self, bpm: f64, to: f64) -> Self {
        TempoModel {
            bpm,
            transition: self.transition.map(|t| Transition { to, ..t }),
            ..*self
        }
    }
}

/// Tempo in bpm at `date`.
pub fn instantaneous_tempo(date: f64, model: &TempoModel) -> f64 {
    if model.bpm == 0.0 || model.bpm.is_nan() {
        return FALLBACK_BPM;
    }
    let Some(transition) = model.transition else {
        return model.bpm;
    };
    // Exact at the boundary; the power law is singular-prone at progress 1.
    if date == model.end_date as f64 {
        return transition.to;
    }
    let span = (model.end_date - model.date) as f64;
    let progress = (date - model.date as f64) / span;
    progress.powf(transition.mean_tempo_at.exponent()) * (transition.to - model.bpm) + model.bpm
}

/// Milliseconds elapsed between `model.date` and `date`.
pub fn elapsed_ms(date: f64, model: &TempoModel) -> f64 {
    let start = model.date as f64;
    let span = date - start;

    if model.transition.is_none() {
        return 15_000.0 * span / (model.bpm * model.beat_length * TICKS_PER_BEAT);
    }

    // One Simpson panel per sixteenth note, at least one panel.
    let steps = 2 * (span / (TICKS_PER_BEAT / 4.0)).floor().max(1.0) as usize;
    let h = span / steps as f64;
    let mut sum = 0.0;
    for i in 0..=steps {
        let weight = if i == 0 || i == steps {
            1.0
        } else if i % 2 == 1 {
            4.0
        } else {
            2.0
        };
        let t = if i == steps { date } else { start + i as f64 * h };
        sum += weight / instantaneous_tempo(t, model);
    }
    sum * span * 5000.0 / (steps as f64 * model.beat_length * TICKS_PER_BEAT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(from: f64, to: f64, mean: f64) -> TempoModel {
        TempoModel::transitioning(0, 720, from, to, MeanTempoAt::new(mean).unwrap(), 0.25)
    }

    #[test]
    fn constant_tempo_closed_form() {
        let model = TempoModel::constant(0, 720, 60.0, 0.25);
        assert_eq!(elapsed_ms(720.0, &model), 1000.0);
        assert_eq!(elapsed_ms(0.0, &model), 0.0);
    }

    #[test]
    fn constant_tempo_is_flat() {
        let model = TempoModel::constant(0, 720, 84.0, 0.25);
        assert_eq!(instantaneous_tempo(0.0, &model), 84.0);
        assert_eq!(instantaneous_tempo(500.0, &model), 84.0);
    }

    #[test]
    fn zero_bpm_falls_back() {
        let model = TempoModel::constant(0, 720, 0.0, 0.25);
        assert_eq!(instantaneous_tempo(100.0, &model), FALLBACK_BPM);
    }

    #[test]
    fn boundary_is_exact() {
        for mean in [0.1, 0.3, 0.5, 0.77, 0.99] {
            let model = ramp(60.0, 97.3, mean);
            assert_eq!(instantaneous_tempo(720.0, &model), 97.3);
        }
    }

    #[test]
    fn start_is_bpm() {
        let model = ramp(60.0, 120.0, 0.3);
        assert_eq!(instantaneous_tempo(0.0, &model), 60.0);
    }

    #[test]
    fn mean_tempo_at_marks_midpoint() {
        let model = TempoModel::transitioning(0, 1000, 60.0, 120.0, MeanTempoAt::new(0.3).unwrap(), 0.25);
        let mid = instantaneous_tempo(300.0, &model);
        assert!((mid - 90.0).abs() < 1e-9, "expected midpoint tempo at 30%, got {mid}");
    }

    #[test]
    fn midpoint_mean_is_linear() {
        let model = ramp(60.0, 120.0, 0.5);
        let t = instantaneous_tempo(180.0, &model);
        assert!((t - 75.0).abs() < 1e-9, "got {t}");
    }

    #[test]
    fn linear_ramp_integral() {
        // 83.33 ms/tick-bpm * 12 ln 2 for a 60 -> 120 linear ramp over a beat.
        let model = ramp(60.0, 120.0, 0.5);
        let expected = 15_000.0 / (0.25 * 720.0) * 12.0 * 2.0f64.ln();
        let got = elapsed_ms(720.0, &model);
        assert!((got - expected).abs() < 0.05, "expected {expected}, got {got}");
    }

    #[test]
    fn transition_between_constant_bounds() {
        // Elapsed time for a 60 -> 120 ramp lies between the two constant cases.
        let model = ramp(60.0, 120.0, 0.3);
        let slow = elapsed_ms(720.0, &TempoModel::constant(0, 720, 60.0, 0.25));
        let fast = elapsed_ms(720.0, &TempoModel::constant(0, 720, 120.0, 0.25));
        let got = elapsed_ms(720.0, &model);
        assert!(got < slow && got > fast, "{fast} < {got} < {slow}");
    }

    #[test]
    fn elapsed_is_monotonic() {
        let models = [
            ramp(60.0, 120.0, 0.5),
            ramp(140.0, 70.0, 0.5),
            ramp(80.0, 95.0, 0.2),
            ramp(110.0, 60.0, 0.85),
            TempoModel::constant(0, 720, 72.0, 0.5),
        ];
        for model in &models {
            let mut prev = elapsed_ms(0.0, model);
            let mut tick = 0.0;
            while tick <= 720.0 {
                let now = elapsed_ms(tick, model);
                assert!(now >= prev, "{model:?}: elapsed dropped at {tick}: {prev} -> {now}");
                prev = now;
                tick += 7.0;
            }
        }
    }

    #[test]
    fn zero_span_is_zero() {
        let model = ramp(60.0, 120.0, 0.4);
        assert_eq!(elapsed_ms(0.0, &model), 0.0);
    }

    #[test]
    fn mean_tempo_at_rejects_degenerate() {
        for bad in [0.0, 1.0, -0.2, 1.5, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(MeanTempoAt::new(bad), Err(TempoMapError::InvalidMeanTempoAt(_))),
                "{bad} should be rejected"
            );
        }
        assert!(MeanTempoAt::new(0.001).is_ok());
    }

    #[test]
    fn mean_tempo_at_deserialize_validates() {
        let ok: MeanTempoAt = serde_json::from_str("0.25").unwrap();
        assert_eq!(ok.get(), 0.25);
        assert!(serde_json::from_str::<MeanTempoAt>("1.0").is_err());
    }

    #[test]
    fn with_tempi_keeps_shape() {
        let model = ramp(60.0, 120.0, 0.3);
        let moved = model.with_tempi(59.0, 121.0);
        assert_eq!(moved.bpm, 59.0);
        assert_eq!(moved.transition_to(), Some(121.0));
        assert_eq!(moved.mean_tempo_at(), Some(0.3));
        assert_eq!(moved.date, model.date);
        assert_eq!(model.bpm, 60.0);

        let flat = TempoModel::constant(0, 720, 60.0, 0.25).with_tempi(61.0, 99.0);
        assert_eq!(flat.bpm, 61.0);
        assert_eq!(flat.transition_to(), None);
    }

    #[test]
    fn acceleration_classification() {
        assert!(ramp(60.0, 120.0, 0.5).is_accelerating());
        assert!(!ramp(120.0, 60.0, 0.5).is_accelerating());
        assert!(!TempoModel::constant(0, 720, 60.0, 0.25).is_accelerating());
    }
}

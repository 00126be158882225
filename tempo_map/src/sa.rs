// Simulated annealing refinement of a tempo model.
//
// Starts from the candidate built in `model.rs` and searches for start/end
// tempi whose integrated timing best matches the segment's recorded points.
// Each step proposes a neighbour by pushing `bpm` and `transition.to` apart
// by a uniform amount along their current ordering, so an accelerating
// candidate stays accelerating. The neighbour is accepted by the Metropolis
// criterion against the current model; independently, any neighbour that
// beats the best error seen so far becomes the new best. Temperature cools
// geometrically every step.
//
// Stops at `max_iterations`, when the temperature falls to `final_temp`, or
// once a step leaves the best error under `success_error`. Every run takes at
// least one step, even from a model that already fits. Returns the best
// model, which is never worse than the one passed in.
//
// Randomness comes only from the `UniformSource` argument. Models are values:
// each step builds a fresh candidate and nothing is edited in place.
//
// Cost is `mean_squared_error`, which skips NaN residuals without shrinking
// the denominator.

use crate::points::DataPoint;
use crate::tempo::{TempoModel, elapsed_ms};
use serde::{Deserialize, Serialize};
use tempo_map_prng::UniformSource;
use tracing::debug;

/// Annealing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealConfig {
    /// Initial temperature.
    pub initial_temp: f64,
    /// Stop once the temperature is at or below this.
    pub final_temp: f64,
    /// Multiplicative cooling per step.
    pub cooling_rate: f64,
    pub max_iterations: usize,
    /// Upper bound of the per-step tempo perturbation, in bpm.
    pub variation: f64,
    /// Stop early once the best mean squared error (ms^2) is below this.
    pub success_error: f64,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        AnnealConfig {
            initial_temp: 500.0,
            final_temp: 0.001,
            cooling_rate: 0.995,
            max_iterations: 1000,
            variation: 0.2,
            success_error: 10.0,
        }
    }
}

/// Result of an annealing run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnealResult {
    /// Best model found.
    pub model: TempoModel,
    /// Cost of `model`.
    pub error: f64,
    /// Cost of the model passed in.
    pub initial_error: f64,
    pub iterations: usize,
    pub accepted: usize,
}

/// Mean squared difference, in ms^2, between the model's elapsed time at each
/// point and the point's offset from the first point.
///
/// NaN residuals are skipped but still counted in the denominator.
pub fn mean_squared_error(model: &TempoModel, points: &[DataPoint]) -> f64 {
    let Some(origin) = points.first() else {
        return 0.0;
    };
    let mut sum = 0.0;
    for p in points {
        let residual = elapsed_ms(p.tick as f64, model) - (p.time_ms - origin.time_ms);
        let squared = residual * residual;
        if !squared.is_nan() {
            sum += squared;
        }
    }
    sum / points.len() as f64
}

/// Refine `initial` against `points`.
pub fn anneal(
    initial: &TempoModel,
    points: &[DataPoint],
    config: &AnnealConfig,
    rng: &mut impl UniformSource,
) -> AnnealResult {
    let initial_error = mean_squared_error(initial, points);
    let mut current = *initial;
    let mut best = *initial;
    let mut best_error = initial_error;
    let mut temp = config.initial_temp;
    let mut iterations = 0;
    let mut accepted = 0;

    while iterations < config.max_iterations && temp > config.final_temp {
        let candidate = neighbour(&current, config.variation, rng);
        // Recomputed each step rather than carried over from the last one.
        let current_error = mean_squared_error(&current, points);
        let candidate_error = mean_squared_error(&candidate, points);

        if metropolis_accept(current_error - candidate_error, temp, rng) {
            current = candidate;
            accepted += 1;
        }
        if candidate_error < best_error {
            best = candidate;
            best_error = candidate_error;
        }
        iterations += 1;

        if best_error < config.success_error {
            break;
        }
        temp *= config.cooling_rate;
    }

    debug!(
        iterations,
        accepted,
        initial_error,
        best_error,
        bpm = best.bpm,
        transition_to = best.transition_to(),
        "annealing finished"
    );

    AnnealResult {
        model: best,
        error: best_error,
        initial_error,
        iterations,
        accepted,
    }
}

/// Push `bpm` and the target tempo apart by `uniform(0, variation)`,
/// preserving which one is larger.
fn neighbour(model: &TempoModel, variation: f64, rng: &mut impl UniformSource) -> TempoModel {
    let delta = rng.uniform(0.0, variation);
    let to = model.transition_to().unwrap_or(model.bpm);
    if model.is_accelerating() {
        model.with_tempi(model.bpm - delta, to + delta)
    } else {
        model.with_tempi(model.bpm + delta, to - delta)
    }
}

/// Metropolis acceptance: `exp(improvement / temp) > u`. An improvement makes
/// the left side exceed 1, so it always passes. A uniform draw is consumed
/// either way.
fn metropolis_accept(improvement: f64, temp: f64, rng: &mut impl UniformSource) -> bool {
    (improvement / temp).exp() > rng.next_f64()
}

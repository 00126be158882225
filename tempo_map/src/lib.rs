// Tempo map reconstruction from performance timings.
//
// Given points pairing a notated tick with the time it was actually played,
// rebuild a compact piecewise tempo model that, integrated, reproduces the
// observed timings. Each piece is constant or a power-law transition
// between two tempi.
//
// Architecture:
// - points.rs: Raw and normalized points, normalization to tick 0 / time 0 in ms
// - tempo.rs: Tempo models and their evaluation (instantaneous tempo,
//   elapsed milliseconds via closed form or Simpson integration)
// - bezier.rs: Least-squares quadratic Bezier fit and its derivative
// - segment.rs: Splitting points into monotonic local-tempo runs, stored as
//   index ranges over one shared buffer
// - model.rs: First-guess model per segment, by point count
// - sa.rs: Simulated annealing refinement and its mean-squared-error cost
// - approximate.rs: The pipeline tying the above together into a `TempoMap`
// - config.rs: JSON-loadable tuning parameters
// - error.rs: Error type
//
// Everything is synchronous and pure apart from `TempoMapConfig::load`.
// Randomness is injected through `tempo_map_prng::UniformSource`, so a fixed
// seed gives a fixed map.

pub mod approximate;
pub mod bezier;
pub mod config;
pub mod error;
pub mod model;
pub mod points;
pub mod sa;
pub mod segment;
pub mod tempo;

pub use approximate::{TempoMap, TempoSegment, approximate};
pub use error::{Result, TempoMapError};
pub use points::{DataPoint, RawPoint};
pub use tempo::TempoModel;

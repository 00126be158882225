// Error taxonomy for tempo map fitting.
//
// Every error is local to one fitting call. The pipeline in `approximate.rs`
// stops at the first failing segment and returns no partial map.
//
// A NaN residual inside the annealing cost function is not an error: it is
// skipped silently (see `sa::mean_squared_error`).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TempoMapError>;

#[derive(Error, Debug)]
pub enum TempoMapError {
    /// Too few points for segmentation or model building.
    #[error("insufficient data: need at least {needed} points, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The quadratic Bezier fit needs at least four points.
    #[error("insufficient points for curve fit: need at least 4, got {got}")]
    InsufficientPointsForFit { got: usize },

    /// `meanTempoAt` must lie strictly between 0 and 1.
    #[error("invalid meanTempoAt {0}: must lie strictly between 0 and 1")]
    InvalidMeanTempoAt(f64),

    #[error("failed to read config: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

// Tempo map approximation: CLI entry point.
//
// Fits a tempo map to aligned points given on the command line and prints
// one line per segment.
//
// Usage:
//   cargo run -p tempo_map -- 0:0.0 720:0.52 1440:1.01 2160:1.55 2880:2.16
//     [--seed N] [--config tuning.json]
//
// Set RUST_LOG=tempo_map=debug to see curve estimates and annealing stats.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tempo_map::config::TempoMapConfig;
use tempo_map::segment::Direction;
use tempo_map::{RawPoint, approximate};
use tempo_map_prng::SeededRng;
use tracing::error;

#[derive(Parser, Debug)]
#[command(version, about = "Fit a piecewise tempo map to aligned performance timings")]
struct Args {
    /// Aligned points as TICK:SECONDS
    #[arg(required = true, value_parser = parse_point)]
    points: Vec<RawPoint>,

    /// Seed for the annealing random source
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// JSON tuning file; defaults apply to anything it leaves out
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_point(s: &str) -> Result<RawPoint, String> {
    let (tick, seconds) = s
        .split_once(':')
        .ok_or_else(|| format!("expected TICK:SECONDS, got '{s}'"))?;
    let tick = tick
        .parse()
        .map_err(|e| format!("bad tick '{tick}': {e}"))?;
    let seconds = seconds
        .parse()
        .map_err(|e| format!("bad seconds '{seconds}': {e}"))?;
    Ok(RawPoint::new(tick, seconds))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match TempoMapConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                error!("{}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => TempoMapConfig::default(),
    };

    let mut rng = SeededRng::new(args.seed);
    let map = match approximate(&args.points, &config.anneal, &mut rng) {
        Ok(map) => map,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    for (i, s) in map.segments.iter().enumerate() {
        let m = &s.model;
        let direction = match s.segment.direction {
            Direction::Rising => "rising",
            Direction::Falling => "falling",
        };
        let transition = match m.transition {
            Some(t) => format!(" -> {:.2} bpm (mean at {:.2})", t.to, t.mean_tempo_at.get()),
            None => String::new(),
        };
        println!(
            "segment {}: ticks {}..{} [{}] {:.2} bpm{}, beat {:.3}, mse {:.2} ms^2",
            i + 1,
            m.date,
            m.end_date,
            direction,
            m.bpm,
            transition,
            m.beat_length,
            s.error
        );
    }

    ExitCode::SUCCESS
}

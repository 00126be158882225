// Injectable random source for the tempo map optimizer.
//
// The annealing refinement in `tempo_map::sa` draws uniform variates for two
// things: the size of each perturbation step and the Metropolis acceptance
// test. Those draws come from a `UniformSource` passed in by the caller
// rather than from a process-wide generator, so a test can pin a seed and
// get bit-identical models back.
//
// `SeededRng` is the stock implementation: xoshiro256++ (Blackman & Vigna,
// 2019) with its 256-bit state expanded from a single `u64` via SplitMix64.
// The generator core is integer-only; floats are derived from the top 53
// bits of each output, so the stream is identical on every platform.

use serde::{Deserialize, Serialize};

/// A source of uniform variates in `[0, 1)`.
///
/// Everything the optimizer needs is built on `next_f64`; implement it to
/// drive the fit from a recorded or scripted sequence.
pub trait UniformSource {
    /// Next uniform value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform value in `[low, high)`. Returns `low` when the interval is
    /// empty.
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        low + self.next_f64() * (high - low)
    }
}

impl<S: UniformSource + ?Sized> UniformSource for &mut S {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// Xoshiro256++ generator seeded from a `u64`.
///
/// Two instances built from the same seed produce the same sequence. The
/// state serializes, so a stream can be snapshotted mid-run and resumed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededRng {
    s: [u64; 4],
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }
}

impl UniformSource for SeededRng {
    /// Upper 53 bits of a `u64` fill the f64 mantissa exactly.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// SplitMix64 step, used only to expand the seed.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

// Random Source
// Injectable uniform draws used by every randomized text transformation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of independent uniform draws in `[0, 1)`.
///
/// Transformations take `&mut dyn RandomSource` so callers decide whether
/// output is reproducible (seeded or fixed) or fresh per request.
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;

    /// True with probability `p`. A source pinned at or above `p` never fires.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Index into a collection of `len` items (`len` must be non-zero).
    fn index(&mut self, len: usize) -> usize {
        let draw = self.next_f64().clamp(0.0, 1.0);
        ((draw * len as f64) as usize).min(len.saturating_sub(1))
    }
}

/// Pick one item from a non-empty slice.
pub fn pick<'a, T>(rng: &mut dyn RandomSource, items: &'a [T]) -> &'a T {
    &items[rng.index(items.len())]
}

/// Two-way choice: `first` on a draw above one half, else `second`.
pub fn either<'a>(rng: &mut dyn RandomSource, first: &'a str, second: &'a str) -> &'a str {
    if rng.next_f64() > 0.5 {
        first
    } else {
        second
    }
}

/// Entropy-backed (or seeded) generator for production use.
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Always returns the same draw.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_f64(&mut self) -> f64 {
        self.0
    }
}

/// Replays a fixed list of draws, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    draws: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, cursor: 0 }
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let value = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        value
    }
}

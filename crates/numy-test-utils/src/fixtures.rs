//! Deterministic sample sets for fitting and ordering tests.
//!
//! - [`linear_samples`] and [`quadratic_samples`]: exact polynomial data.
//! - [`noisy_samples`]: a smooth trend plus bounded seeded noise.
//! - [`permutation`]: a seeded shuffle of `0..n`.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Abscissae and ordinates of a sample set.
#[derive(Clone, Debug, PartialEq)]
pub struct Samples {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Samples {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Smallest and largest abscissa.
    pub fn range(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }
}

fn grid(n: usize, lower: f64, upper: f64) -> Vec<f64> {
    assert!(n >= 2, "a sample grid needs at least two points");
    let step = (upper - lower) / (n - 1) as f64;
    // Pin the last point so it never overshoots `upper` by rounding.
    (0..n)
        .map(|i| if i == n - 1 { upper } else { lower + i as f64 * step })
        .collect()
}

/// `n` evenly spaced samples of `slope * x + intercept` over `[lower, upper]`.
pub fn linear_samples(n: usize, lower: f64, upper: f64, slope: f64, intercept: f64) -> Samples {
    let x = grid(n, lower, upper);
    let y = x.iter().map(|&v| slope * v + intercept).collect();
    Samples { x, y }
}

/// `n` evenly spaced samples of `a*x² + b*x + c` over `[lower, upper]`.
pub fn quadratic_samples(n: usize, lower: f64, upper: f64, [a, b, c]: [f64; 3]) -> Samples {
    let x = grid(n, lower, upper);
    let y = x.iter().map(|&v| a * v * v + b * v + c).collect();
    Samples { x, y }
}

/// `cos(x)` plus seeded uniform noise in `[-amplitude, amplitude)`.
pub fn noisy_samples(n: usize, lower: f64, upper: f64, amplitude: f64, seed: u64) -> Samples {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let x = grid(n, lower, upper);
    let y = x
        .iter()
        .map(|&v| v.cos() + amplitude * (2.0 * rng.random::<f64>() - 1.0))
        .collect();
    Samples { x, y }
}

/// Seeded shuffle of `0..n`; the same seed always gives the same order.
pub fn permutation(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out: Vec<usize> = (0..n).collect();
    out.shuffle(&mut rng);
    out
}

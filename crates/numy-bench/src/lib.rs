//! Benchmark profiles for the numy tensor engine.
//!
//! - [`mixed_vector`]: deterministic unsorted data with duplicates
//! - [`spline_profile`]: a fitter with knots placed plus its sample set

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use numy_core::Tensor;
use numy_fit::{SplineConfig, SplineFitter};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// `n` integral values in `[0, 1000)`, so long vectors carry duplicates.
pub fn mixed_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(0..1000u32) as f64).collect()
}

/// Vector tensor over [`mixed_vector`] data.
pub fn mixed_tensor(n: usize, seed: u64) -> Tensor {
    Tensor::from_slice(&mixed_vector(n, seed)).unwrap()
}

/// A cubic fitter with `ncoeffs` coefficients over `[0, 10]`, and `n`
/// samples of a smooth curve on that range.
pub fn spline_profile(ncoeffs: usize, n: usize) -> (SplineFitter, Vec<f64>, Vec<f64>) {
    let mut fitter = SplineFitter::new(SplineConfig::new(ncoeffs)).unwrap();
    fitter.place_uniform_knots(0.0, 10.0).unwrap();
    let x: Vec<f64> = (0..n).map(|i| 10.0 * i as f64 / (n - 1) as f64).collect();
    let y = x.iter().map(|v| (v * 0.7).sin() + 0.1 * v).collect();
    (fitter, x, y)
}

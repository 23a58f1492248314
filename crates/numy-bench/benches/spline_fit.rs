//! Criterion micro-benchmarks for B-spline fitting and evaluation.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use numy_bench::spline_profile;
use numy_ops::least_squares;
use numy_test_utils::linear_samples;

/// Benchmark: fit 20 coefficients to 1000 samples.
fn bench_fit_1000x20(c: &mut Criterion) {
    let (mut fitter, x, y) = spline_profile(20, 1000);

    c.bench_function("spline_fit_1000x20", |b| {
        b.iter(|| {
            let fit = fitter.fit(&x, &y, None).unwrap();
            black_box(fit.chi_square);
        });
    });
}

/// Benchmark: evaluate a fitted spline with standard error.
fn bench_eval(c: &mut Criterion) {
    let (mut fitter, x, y) = spline_profile(20, 1000);
    fitter.fit(&x, &y, None).unwrap();

    c.bench_function("spline_eval", |b| {
        b.iter(|| black_box(fitter.eval(black_box(4.2)).unwrap()));
    });
}

/// Benchmark: raw QR least squares on a 500x2 line fit.
fn bench_least_squares_line(c: &mut Criterion) {
    let s = linear_samples(500, 0.0, 1.0, 3.0, -1.0);
    let a: Vec<f64> = s.x.iter().flat_map(|&v| [1.0, v]).collect();

    c.bench_function("least_squares_500x2", |b| {
        b.iter(|| black_box(least_squares(&a, 500, 2, &s.y, 1).unwrap()));
    });
}

criterion_group!(benches, bench_fit_1000x20, bench_eval, bench_least_squares_line);
criterion_main!(benches);

//! End-to-end fits through the public API.

use approx::assert_relative_eq;
use numy_fit::{FitState, SplineConfig, SplineFitter};
use numy_test_utils::{linear_samples, noisy_samples, quadratic_samples};

#[test]
fn linear_function_has_unit_r_squared() {
    let s = linear_samples(200, 0.0, 10.0, -0.5, 4.0);

    let mut fitter = SplineFitter::new(SplineConfig::new(12)).unwrap();
    fitter.place_uniform_knots(0.0, 10.0).unwrap();
    let fit = fitter.fit(&s.x, &s.y, None).unwrap();

    assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-9);
    assert_eq!(fit.degrees_of_freedom, 188);
}

#[test]
fn cubic_basis_reproduces_quadratics() {
    let coeffs = [0.3, -2.0, 1.0];
    let f = |v: f64| 0.3 * v * v - 2.0 * v + 1.0;
    let s = quadratic_samples(61, -3.0, 3.0, coeffs);
    let w: Vec<f64> = (0..s.len()).map(|i| 1.0 + (i % 3) as f64).collect();

    let mut fitter = SplineFitter::new(SplineConfig::new(7)).unwrap();
    fitter.place_uniform_knots(-3.0, 3.0).unwrap();
    fitter.fit(&s.x, &s.y, Some(&w)).unwrap();
    assert_eq!(fitter.state(), FitState::Fitted);

    for probe in [-3.0, -1.25, 0.0, 0.7, 2.99, 3.0] {
        let (value, _) = fitter.eval(probe).unwrap();
        assert_relative_eq!(value, f(probe), epsilon = 1e-9);
    }
}

#[test]
fn noisy_data_gives_partial_r_squared_and_finite_errors() {
    let s = noisy_samples(100, 0.0, 9.9, 0.15, 42);

    let mut fitter = SplineFitter::new(SplineConfig::new(10)).unwrap();
    fitter.place_uniform_knots(0.0, 9.9).unwrap();
    let fit = fitter.fit(&s.x, &s.y, None).unwrap().clone();
    assert!(fit.r_squared > 0.5 && fit.r_squared < 1.0);
    assert!(fit.chi_square > 0.0);

    for i in 0..10 {
        let c = fit.covariance[i * 10 + i];
        assert!(c > 0.0, "variance of coefficient {i} must be positive");
        for j in 0..10 {
            assert_relative_eq!(fit.covariance[i * 10 + j], fit.covariance[j * 10 + i]);
        }
    }
    let (_, err) = fitter.eval(5.0).unwrap();
    assert!(err.is_finite() && err > 0.0);
}

#[test]
fn refit_after_replacing_knots() {
    let s = linear_samples(40, 0.0, 4.0, 1.0, 0.0);
    let mut fitter = SplineFitter::new(SplineConfig::new(6).with_order(3)).unwrap();
    fitter.place_uniform_knots(0.0, 4.0).unwrap();
    fitter.fit(&s.x, &s.y, None).unwrap();

    fitter.place_uniform_knots(-1.0, 5.0).unwrap();
    assert_eq!(fitter.state(), FitState::KnotsPlaced);
    assert!(fitter.result().is_none());
    let fit = fitter.fit(&s.x, &s.y, None).unwrap();
    assert_eq!(fit.coefficients.len(), 6);
}

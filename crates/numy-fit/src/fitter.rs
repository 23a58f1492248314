//! The B-spline fitting state machine.

use numy_core::TensorError;
use numy_ops::linalg::{covariance_from_r, least_squares};
use tracing::debug;

use crate::bspline::BSplineBasis;
use crate::config::SplineConfig;
use crate::error::FitError;

/// Lifecycle of a [`SplineFitter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitState {
    /// Order and coefficient count fixed; no knots yet.
    Initialized,
    /// Knot vector placed; ready to fit.
    KnotsPlaced,
    /// A fit has been computed. Fitting again replaces it.
    Fitted,
}

/// Outcome of a weighted least-squares spline fit.
#[derive(Clone, Debug, PartialEq)]
pub struct SplineFitResult {
    /// One coefficient per basis function.
    pub coefficients: Vec<f64>,
    /// `(XᵀWX)⁻¹`, `n × n` row-major.
    pub covariance: Vec<f64>,
    /// Weighted residual sum of squares.
    pub chi_square: f64,
    /// Weighted total sum of squares about the weighted mean of `y`.
    pub total_sum_squares: f64,
    /// `sample_count - coefficient_count`.
    pub degrees_of_freedom: usize,
    /// `1 - chi_square / total_sum_squares`; NaN when the total sum of
    /// squares is zero.
    pub r_squared: f64,
}

/// Fits a smoothing B-spline to weighted samples.
#[derive(Clone, Debug)]
pub struct SplineFitter {
    config: SplineConfig,
    basis: Option<BSplineBasis>,
    fit: Option<SplineFitResult>,
}

impl SplineFitter {
    /// A fitter in [`FitState::Initialized`].
    pub fn new(config: SplineConfig) -> Result<Self, FitError> {
        config.validate()?;
        Ok(Self {
            config,
            basis: None,
            fit: None,
        })
    }

    /// The configuration this fitter was built with.
    pub fn config(&self) -> &SplineConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FitState {
        match (&self.basis, &self.fit) {
            (None, _) => FitState::Initialized,
            (Some(_), None) => FitState::KnotsPlaced,
            (Some(_), Some(_)) => FitState::Fitted,
        }
    }

    /// The placed basis, if any.
    pub fn basis(&self) -> Option<&BSplineBasis> {
        self.basis.as_ref()
    }

    /// Place uniformly spaced breakpoints over `[lower, upper]`.
    ///
    /// Allowed in any state; a previous fit is discarded.
    pub fn place_uniform_knots(&mut self, lower: f64, upper: f64) -> Result<(), FitError> {
        let basis = BSplineBasis::clamped_uniform(
            self.config.order,
            self.config.breakpoints(),
            lower,
            upper,
        )?;
        debug!(lower, upper, knots = basis.knots().len(), "spline knots placed");
        self.basis = Some(basis);
        self.fit = None;
        Ok(())
    }

    /// Fit the basis to `(x, y)` with optional weights (all ones when
    /// `None`).
    pub fn fit(
        &mut self,
        x: &[f64],
        y: &[f64],
        w: Option<&[f64]>,
    ) -> Result<&SplineFitResult, FitError> {
        let state = self.state();
        let basis = self.basis.as_ref().ok_or(FitError::InvalidState {
            operation: "fit",
            state,
        })?;
        let n = x.len();
        let p = basis.coefficient_count();
        if y.len() != n || w.is_some_and(|w| w.len() != n) {
            return Err(FitError::invalid_argument(format!(
                "x has {n} samples, y has {}, w has {}",
                y.len(),
                w.map_or(n, <[f64]>::len)
            )));
        }
        if n < p {
            return Err(FitError::invalid_argument(format!(
                "{n} samples cannot determine {p} coefficients"
            )));
        }
        let (lower, upper) = (basis.lower(), basis.upper());
        if let Some(&bad) = x.iter().find(|&&v| !(lower..=upper).contains(&v)) {
            return Err(FitError::invalid_argument(format!(
                "sample x = {bad} outside knot range [{lower}, {upper}]"
            )));
        }
        if let Some(&bad) = y.iter().find(|v| !v.is_finite()) {
            return Err(FitError::invalid_argument(format!("non-finite y = {bad}")));
        }
        let weight = |i: usize| w.map_or(1.0, |w| w[i]);
        if let Some(bad) = (0..n).map(weight).find(|v| !v.is_finite() || *v < 0.0) {
            return Err(FitError::invalid_argument(format!(
                "weight {bad} must be finite and non-negative"
            )));
        }

        // Scaling row i by sqrt(w_i) turns the weighted problem into an
        // ordinary one with the same normal equations.
        let mut design = zeroed(n.checked_mul(p).ok_or(TensorError::AllocationFailure {
            bytes: usize::MAX,
        })?)?;
        let mut rhs = zeroed(n)?;
        for i in 0..n {
            let row = &mut design[i * p..(i + 1) * p];
            basis.eval_row(x[i], row);
            let sw = weight(i).sqrt();
            row.iter_mut().for_each(|v| *v *= sw);
            rhs[i] = sw * y[i];
        }
        let ls = least_squares(&design, n, p, &rhs, 1)?;
        let covariance = covariance_from_r(&ls.r, p)?;
        let chi_square = ls.residual_ss[0];

        let w_sum: f64 = (0..n).map(weight).sum();
        let y_mean = (0..n).map(|i| weight(i) * y[i]).sum::<f64>() / w_sum;
        let total_sum_squares: f64 = (0..n).map(|i| weight(i) * (y[i] - y_mean).powi(2)).sum();
        let r_squared = if total_sum_squares == 0.0 {
            f64::NAN
        } else {
            1.0 - chi_square / total_sum_squares
        };

        debug!(samples = n, coefficients = p, chi_square, r_squared, "spline fitted");
        Ok(self.fit.insert(SplineFitResult {
            coefficients: ls.solution,
            covariance,
            chi_square,
            total_sum_squares,
            degrees_of_freedom: n - p,
            r_squared,
        }))
    }

    /// The last fit, if any.
    pub fn result(&self) -> Option<&SplineFitResult> {
        self.fit.as_ref()
    }

    /// Fitted value at `x` and its standard error `sqrt(Bᵀ·cov·B)`.
    pub fn eval(&self, x: f64) -> Result<(f64, f64), FitError> {
        let (Some(basis), Some(fit)) = (&self.basis, &self.fit) else {
            return Err(FitError::InvalidState {
                operation: "eval",
                state: self.state(),
            });
        };
        if !(basis.lower()..=basis.upper()).contains(&x) {
            return Err(FitError::invalid_argument(format!(
                "x = {x} outside knot range [{}, {}]",
                basis.lower(),
                basis.upper()
            )));
        }
        let p = basis.coefficient_count();
        let mut row = vec![0.0; p];
        basis.eval_row(x, &mut row);
        let value: f64 = row.iter().zip(&fit.coefficients).map(|(b, c)| b * c).sum();
        let variance: f64 = (0..p)
            .map(|i| {
                row[i]
                    * (0..p)
                        .map(|j| fit.covariance[i * p + j] * row[j])
                        .sum::<f64>()
            })
            .sum();
        Ok((value, variance.max(0.0).sqrt()))
    }
}

/// A zeroed scratch buffer, failing instead of aborting when `len` is
/// more than the allocator can provide.
fn zeroed(len: usize) -> Result<Vec<f64>, TensorError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| TensorError::AllocationFailure {
            bytes: len.saturating_mul(std::mem::size_of::<f64>()),
        })?;
    buf.resize(len, 0.0);
    Ok(buf)
}

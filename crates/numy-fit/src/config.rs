//! Spline configuration.

use crate::error::FitError;

/// Default spline order (cubic).
pub const DEFAULT_ORDER: usize = 4;

/// Largest accepted spline order.
pub const MAX_ORDER: usize = 32;

/// Largest accepted number of basis functions.
///
/// The fit keeps a dense `n × n` covariance, 8 MiB at this bound.
pub const MAX_COEFFICIENTS: usize = 1024;

/// Shape of a spline basis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplineConfig {
    /// Order `k` of the piecewise polynomials (degree `k - 1`).
    pub order: usize,
    /// Number of basis functions, and so of fitted coefficients.
    pub coefficient_count: usize,
}

impl SplineConfig {
    /// Cubic basis with `coefficient_count` functions.
    pub fn new(coefficient_count: usize) -> Self {
        Self {
            order: DEFAULT_ORDER,
            coefficient_count,
        }
    }

    /// Replace the order.
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Number of breakpoints: `coefficient_count + 2 - order`.
    ///
    /// Saturates at 0 for invalid configurations; [`validate`](Self::validate)
    /// reports them.
    pub fn breakpoints(&self) -> usize {
        self.coefficient_count
            .checked_add(2)
            .map_or(0, |n| n.saturating_sub(self.order))
    }

    /// Require `1 ≤ order ≤ MAX_ORDER`, at most [`MAX_COEFFICIENTS`] basis
    /// functions and at least two breakpoints.
    pub fn validate(&self) -> Result<(), FitError> {
        if self.order == 0 || self.order > MAX_ORDER {
            return Err(FitError::InvalidConfig {
                reason: format!("order {} outside 1..={MAX_ORDER}", self.order),
            });
        }
        if self.coefficient_count > MAX_COEFFICIENTS {
            return Err(FitError::InvalidConfig {
                reason: format!(
                    "{} coefficients exceed the limit of {MAX_COEFFICIENTS}",
                    self.coefficient_count
                ),
            });
        }
        if self.breakpoints() < 2 {
            return Err(FitError::InvalidConfig {
                reason: format!(
                    "{} coefficients of order {} give fewer than 2 breakpoints",
                    self.coefficient_count, self.order
                ),
            });
        }
        Ok(())
    }
}

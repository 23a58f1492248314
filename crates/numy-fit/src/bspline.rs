//! Clamped B-spline basis.

use crate::error::FitError;

/// A B-spline basis of order `k` over a clamped knot vector.
///
/// The first and last knots are repeated `k` times, so the basis
/// interpolates the end coefficients and sums to one everywhere in
/// `[lower, upper]`.
#[derive(Clone, Debug, PartialEq)]
pub struct BSplineBasis {
    order: usize,
    knots: Vec<f64>,
}

impl BSplineBasis {
    /// Basis of `order` with `breakpoints` uniformly spaced breakpoints
    /// spanning `[lower, upper]`.
    pub fn clamped_uniform(
        order: usize,
        breakpoints: usize,
        lower: f64,
        upper: f64,
    ) -> Result<Self, FitError> {
        if order == 0 || breakpoints < 2 {
            return Err(FitError::InvalidConfig {
                reason: format!("order {order} with {breakpoints} breakpoints"),
            });
        }
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(FitError::invalid_argument(format!(
                "knot range [{lower}, {upper}] must be finite and non-empty"
            )));
        }
        let interior = breakpoints - 2;
        let h = (upper - lower) / (breakpoints - 1) as f64;
        let len = order
            .checked_mul(2)
            .and_then(|n| n.checked_add(interior))
            .ok_or_else(|| FitError::InvalidConfig {
                reason: format!("order {order} with {breakpoints} breakpoints overflows"),
            })?;
        let mut knots = Vec::new();
        knots
            .try_reserve_exact(len)
            .map_err(|_| FitError::InvalidConfig {
                reason: format!("cannot allocate {len} knots"),
            })?;
        knots.extend(std::iter::repeat_n(lower, order));
        knots.extend((1..=interior).map(|i| lower + i as f64 * h));
        knots.extend(std::iter::repeat_n(upper, order));
        Ok(Self { order, knots })
    }

    /// Order `k`.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of basis functions.
    pub fn coefficient_count(&self) -> usize {
        self.knots.len() - self.order
    }

    /// The full knot vector.
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Left end of the domain.
    pub fn lower(&self) -> f64 {
        self.knots[0]
    }

    /// Right end of the domain.
    pub fn upper(&self) -> f64 {
        self.knots[self.knots.len() - 1]
    }

    /// Index `mu` of the knot span containing `x` (clamped into the
    /// domain), with `knots[mu] <= x < knots[mu + 1]`. The right end maps
    /// onto the last non-empty span.
    fn span(&self, x: f64) -> usize {
        let degree = self.order - 1;
        let n = self.coefficient_count();
        if x >= self.knots[n] {
            return n - 1;
        }
        let mut mu = degree;
        while mu < n - 1 && x >= self.knots[mu + 1] {
            mu += 1;
        }
        mu
    }

    /// Values of the `order` basis functions that may be non-zero at `x`.
    ///
    /// Writes them into `out[..order]` and returns the index of the first
    /// one; the rest are zero.
    pub fn eval_nonzero(&self, x: f64, out: &mut [f64]) -> usize {
        let degree = self.order - 1;
        let x = x.clamp(self.lower(), self.upper());
        let mu = self.span(x);
        let knots = &self.knots;

        let mut left = vec![0.0; self.order];
        let mut right = vec![0.0; self.order];
        out[0] = 1.0;
        for d in 1..=degree {
            left[d] = x - knots[mu + 1 - d];
            right[d] = knots[mu + d] - x;
            let mut saved = 0.0;
            for r in 0..d {
                let den = right[r + 1] + left[d - r];
                let temp = if den != 0.0 { out[r] / den } else { 0.0 };
                out[r] = saved + right[r + 1] * temp;
                saved = left[d - r] * temp;
            }
            out[d] = saved;
        }
        mu - degree
    }

    /// Every basis function at `x`, written into `row[..coefficient_count]`.
    pub fn eval_row(&self, x: f64, row: &mut [f64]) {
        let n = self.coefficient_count();
        row[..n].fill(0.0);
        let mut local = vec![0.0; self.order];
        let first = self.eval_nonzero(x, &mut local);
        row[first..first + self.order].copy_from_slice(&local);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn knot_vector_is_clamped() {
        let b = BSplineBasis::clamped_uniform(4, 5, 0.0, 4.0).unwrap();
        assert_eq!(
            b.knots(),
            &[0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0, 4.0, 4.0, 4.0]
        );
        assert_eq!(b.coefficient_count(), 7);
        assert_eq!((b.lower(), b.upper()), (0.0, 4.0));
    }

    #[test]
    fn end_points_hit_end_coefficients() {
        let b = BSplineBasis::clamped_uniform(4, 4, -1.0, 2.0).unwrap();
        let mut row = vec![0.0; b.coefficient_count()];
        b.eval_row(-1.0, &mut row);
        assert_relative_eq!(row[0], 1.0);
        b.eval_row(2.0, &mut row);
        assert_relative_eq!(row[row.len() - 1], 1.0);
    }

    #[test]
    fn linear_order_is_hat_functions() {
        let b = BSplineBasis::clamped_uniform(2, 3, 0.0, 2.0).unwrap();
        let mut row = vec![0.0; 3];
        b.eval_row(0.5, &mut row);
        assert_eq!(row, vec![0.5, 0.5, 0.0]);
        b.eval_row(1.0, &mut row);
        assert_eq!(row, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn bad_ranges_rejected() {
        assert!(BSplineBasis::clamped_uniform(4, 4, 1.0, 1.0).is_err());
        assert!(BSplineBasis::clamped_uniform(4, 4, 2.0, 1.0).is_err());
        assert!(BSplineBasis::clamped_uniform(4, 4, 0.0, f64::INFINITY).is_err());
        assert!(BSplineBasis::clamped_uniform(4, 1, 0.0, 1.0).is_err());
    }

    #[test]
    fn overflowing_knot_count_rejected() {
        assert!(matches!(
            BSplineBasis::clamped_uniform(4, usize::MAX, 0.0, 1.0),
            Err(FitError::InvalidConfig { .. })
        ));
        assert!(matches!(
            BSplineBasis::clamped_uniform(usize::MAX / 2, 2, 0.0, 1.0),
            Err(FitError::InvalidConfig { .. })
        ));
    }

    proptest! {
        #[test]
        fn basis_is_a_partition_of_unity(
            order in 1usize..6,
            breakpoints in 2usize..12,
            t in 0.0f64..=1.0,
        ) {
            let b = BSplineBasis::clamped_uniform(order, breakpoints, -3.0, 5.0).unwrap();
            let mut row = vec![0.0; b.coefficient_count()];
            b.eval_row(-3.0 + 8.0 * t, &mut row);
            let total: f64 = row.iter().sum();
            prop_assert!((total - 1.0).abs() < 1e-12);
            prop_assert!(row.iter().all(|&v| v >= -1e-15));
        }
    }
}

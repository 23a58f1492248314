//! Reductions, tolerant comparison, and linear search.

use numy_core::TensorError;

/// Absolute tolerance used by [`equal`] for values near zero.
pub const EQUAL_ABS_TOLERANCE: f64 = 4.0 * f64::EPSILON;

/// Relative tolerance used by [`equal`]: roughly four units in the last place.
pub const EQUAL_REL_TOLERANCE: f64 = 4.0 * f64::EPSILON;

/// Sum of all elements (0 for an empty slice).
pub fn sum(a: &[f64]) -> f64 {
    a.iter().sum()
}

/// Index of the largest element. The first occurrence wins on ties.
pub fn max_index(a: &[f64]) -> Result<usize, TensorError> {
    extreme_index(a, |candidate, best| candidate > best)
}

/// Index of the smallest element. The first occurrence wins on ties.
pub fn min_index(a: &[f64]) -> Result<usize, TensorError> {
    extreme_index(a, |candidate, best| candidate < best)
}

/// Largest element.
pub fn max(a: &[f64]) -> Result<f64, TensorError> {
    max_index(a).map(|i| a[i])
}

/// Smallest element.
pub fn min(a: &[f64]) -> Result<f64, TensorError> {
    min_index(a).map(|i| a[i])
}

// Strict comparison keeps the earliest extreme; NaN never replaces the
// current best.
fn extreme_index(a: &[f64], better: impl Fn(f64, f64) -> bool) -> Result<usize, TensorError> {
    let (&first, rest) = a.split_first().ok_or(TensorError::EmptyBuffer)?;
    let mut best = first;
    let mut pos = 0;
    for (i, &v) in rest.iter().enumerate() {
        if better(v, best) {
            best = v;
            pos = i + 1;
        }
    }
    Ok(pos)
}

/// Whether two values are equal within [`EQUAL_ABS_TOLERANCE`] or
/// [`EQUAL_REL_TOLERANCE`]. NaN is never equal to anything.
pub fn almost_equal(x: f64, y: f64) -> bool {
    if x == y {
        return true;
    }
    let diff = (x - y).abs();
    if !diff.is_finite() {
        return false;
    }
    diff <= EQUAL_ABS_TOLERANCE || diff <= EQUAL_REL_TOLERANCE * x.abs().max(y.abs())
}

/// Pairwise tolerant equality over the shorter operand.
pub fn equal(a: &[f64], b: &[f64]) -> bool {
    a.iter().zip(b).all(|(&x, &y)| almost_equal(x, y))
}

/// First index holding exactly `value`.
pub fn find(a: &[f64], value: f64) -> Option<usize> {
    a.iter().position(|&x| x == value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extreme_indices_prefer_first_occurrence() {
        let a = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(max_index(&a).unwrap(), 4);
        assert_eq!(min_index(&a).unwrap(), 1);
        assert_eq!(max(&a).unwrap(), 5.0);
        assert_eq!(min(&a).unwrap(), 1.0);

        let ties = [2.0, 7.0, 7.0, 2.0];
        assert_eq!(max_index(&ties).unwrap(), 1);
        assert_eq!(min_index(&ties).unwrap(), 0);
    }

    #[test]
    fn extremes_of_empty_fail() {
        assert_eq!(max(&[]), Err(TensorError::EmptyBuffer));
        assert_eq!(min_index(&[]), Err(TensorError::EmptyBuffer));
    }

    #[test]
    fn sum_adds_everything() {
        assert_eq!(sum(&[1.0, 2.0, 3.5]), 6.5);
        assert_eq!(sum(&[]), 0.0);
    }

    #[test]
    fn equal_tolerates_rounding_not_real_differences() {
        assert!(equal(&[0.1 + 0.2, 1.0], &[0.3, 1.0]));
        assert!(!equal(&[1.0, 2.0], &[1.0, 2.001]));
        assert!(equal(&[1.0, 2.0, 99.0], &[1.0, 2.0]));
        assert!(!equal(&[f64::NAN], &[f64::NAN]));
        assert!(equal(&[f64::INFINITY], &[f64::INFINITY]));
        assert!(!equal(&[f64::INFINITY], &[f64::NEG_INFINITY]));
    }

    #[test]
    fn find_is_exact() {
        let a = [1.0, 2.0, 0.30000000000000004, 2.0];
        assert_eq!(find(&a, 2.0), Some(1));
        assert_eq!(find(&a, 0.3), None);
        assert_eq!(find(&a, 9.0), None);
    }
}

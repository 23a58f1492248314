//! Whole-buffer reordering.

/// Sort ascending in place using IEEE-754 total order, so NaNs are placed
/// deterministically (negative NaN first, positive NaN last).
pub fn sort(a: &mut [f64]) {
    a.sort_by(f64::total_cmp);
}

/// Reverse in place.
pub fn reverse(a: &mut [f64]) {
    a.reverse();
}

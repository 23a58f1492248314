//! In-place elementwise arithmetic.
//!
//! Binary operations write into the first operand and cover
//! `min(a.len(), b.len())` elements; the tail of the longer operand is left
//! untouched. Each returns the number of elements processed.

fn zip_in_place(a: &mut [f64], b: &[f64], op: impl Fn(&mut f64, f64)) -> usize {
    let n = a.len().min(b.len());
    for (x, &y) in a[..n].iter_mut().zip(&b[..n]) {
        op(x, y);
    }
    n
}

/// `a[i] += b[i]`.
pub fn add(a: &mut [f64], b: &[f64]) -> usize {
    zip_in_place(a, b, |x, y| *x += y)
}

/// `a[i] -= b[i]`.
pub fn sub(a: &mut [f64], b: &[f64]) -> usize {
    zip_in_place(a, b, |x, y| *x -= y)
}

/// `a[i] *= b[i]`.
pub fn mul(a: &mut [f64], b: &[f64]) -> usize {
    zip_in_place(a, b, |x, y| *x *= y)
}

/// `a[i] /= b[i]`. Division by zero follows IEEE-754 (±inf or NaN).
pub fn div(a: &mut [f64], b: &[f64]) -> usize {
    zip_in_place(a, b, |x, y| *x /= y)
}

/// `a[i] = factor_a * a[i] + factor_b * b[i]`.
pub fn axpby(a: &mut [f64], b: &[f64], factor_a: f64, factor_b: f64) -> usize {
    zip_in_place(a, b, |x, y| *x = factor_a * *x + factor_b * y)
}

/// Sum of pairwise products over the shorter operand.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Multiply every element by `k`.
pub fn scale(a: &mut [f64], k: f64) {
    a.iter_mut().for_each(|x| *x *= k);
}

/// Add `k` to every element.
pub fn offset(a: &mut [f64], k: f64) {
    a.iter_mut().for_each(|x| *x += k);
}

/// Flip the sign of every element.
pub fn negate(a: &mut [f64]) {
    a.iter_mut().for_each(|x| *x = -*x);
}

/// Step function: elements below `cutoff` become 0, the rest 1.
pub fn heaviside(a: &mut [f64], cutoff: f64) {
    a.iter_mut()
        .for_each(|x| *x = if *x < cutoff { 0.0 } else { 1.0 });
}

/// Logistic function `1 / (1 + e^-x)` applied elementwise.
pub fn sigmoid(a: &mut [f64]) {
    a.iter_mut().for_each(|x| *x = 1.0 / (1.0 + (-*x).exp()));
}

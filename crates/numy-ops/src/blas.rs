//! Level-1 BLAS style helpers.

use numy_core::TensorError;

/// Result of constructing a Givens plane rotation (`drotg`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GivensRotation {
    /// Length of the rotated vector, signed like the dominant input.
    pub r: f64,
    /// Reconstruction parameter for `c` and `s`.
    pub z: f64,
    /// Cosine of the rotation angle.
    pub c: f64,
    /// Sine of the rotation angle.
    pub s: f64,
}

/// Construct the rotation that zeroes `b` in the vector `(a, b)`:
/// `[c s; -s c] * [a; b] = [r; 0]`.
pub fn drotg(a: f64, b: f64) -> GivensRotation {
    let roe = if a.abs() > b.abs() { a } else { b };
    let scale = a.abs() + b.abs();
    if scale == 0.0 {
        return GivensRotation {
            r: 0.0,
            z: 0.0,
            c: 1.0,
            s: 0.0,
        };
    }
    let r = scale.copysign(roe) * ((a / scale).powi(2) + (b / scale).powi(2)).sqrt();
    let c = a / r;
    let s = b / r;
    let z = if a.abs() > b.abs() {
        s
    } else if c != 0.0 {
        1.0 / c
    } else {
        1.0
    };
    GivensRotation { r, z, c, s }
}

// First index touched by an `n`-element BLAS walk with increment `inc`;
// negative increments walk backwards from the far end.
fn blas_start(n: usize, inc: isize) -> usize {
    if inc < 0 {
        (n - 1) * inc.unsigned_abs()
    } else {
        0
    }
}

fn blas_check(name: &str, len: usize, n: usize, inc: isize) -> Result<(), TensorError> {
    if inc == 0 {
        return Err(TensorError::invalid_argument(format!(
            "{name} increment must be non-zero"
        )));
    }
    let needed = (n - 1)
        .checked_mul(inc.unsigned_abs())
        .and_then(|span| span.checked_add(1))
        .ok_or_else(|| TensorError::invalid_argument(format!("{name} extent overflows")))?;
    if needed > len {
        return Err(TensorError::invalid_argument(format!(
            "{name} needs {needed} elements, buffer has {len}"
        )));
    }
    Ok(())
}

/// Copy `n` elements of `x` (increment `incx`) into `y` (increment `incy`).
///
/// Unlike [`copy_range`](crate::range::copy_range) this follows BLAS
/// conventions: negative increments traverse backwards and the requested
/// extent must fit in both buffers.
pub fn dcopy(
    n: usize,
    x: &[f64],
    incx: isize,
    y: &mut [f64],
    incy: isize,
) -> Result<usize, TensorError> {
    if n == 0 {
        return Ok(0);
    }
    blas_check("x", x.len(), n, incx)?;
    blas_check("y", y.len(), n, incy)?;
    let mut ix = blas_start(n, incx) as isize;
    let mut iy = blas_start(n, incy) as isize;
    for _ in 0..n {
        y[iy as usize] = x[ix as usize];
        ix += incx;
        iy += incy;
    }
    Ok(n)
}

//! Dense least squares via Householder QR.
//!
//! Matrices are row-major `f64` slices with explicit dimensions. The
//! factorisation never forms `AᵀA`, so conditioning is that of `A` itself.

use numy_core::TensorError;

/// Columns whose remaining norm falls below this fraction of the largest
/// column norm are treated as linearly dependent.
pub const RANK_TOLERANCE: f64 = 1e-12;

/// Solution of `min ‖A·X − B‖₂` for an `rows × cols` system with `nrhs`
/// right-hand sides.
#[derive(Clone, Debug, PartialEq)]
pub struct LeastSquares {
    /// `cols × nrhs` row-major solution.
    pub solution: Vec<f64>,
    /// `cols × cols` row-major upper-triangular factor `R`.
    pub r: Vec<f64>,
    /// Residual sum of squares, one entry per right-hand side.
    pub residual_ss: Vec<f64>,
}

fn check_dims(
    a: &[f64],
    rows: usize,
    cols: usize,
    b: &[f64],
    nrhs: usize,
) -> Result<(), TensorError> {
    if rows == 0 || cols == 0 || nrhs == 0 {
        return Err(TensorError::invalid_argument(format!(
            "empty system: {rows}x{cols} with {nrhs} right-hand sides"
        )));
    }
    if rows < cols {
        return Err(TensorError::invalid_argument(format!(
            "underdetermined system: {rows} rows < {cols} columns"
        )));
    }
    let a_len = rows
        .checked_mul(cols)
        .ok_or_else(|| TensorError::invalid_argument("matrix size overflows"))?;
    let b_len = rows
        .checked_mul(nrhs)
        .ok_or_else(|| TensorError::invalid_argument("right-hand side size overflows"))?;
    if a.len() < a_len {
        return Err(TensorError::invalid_argument(format!(
            "matrix has {} elements, {rows}x{cols} needs {a_len}",
            a.len()
        )));
    }
    if b.len() < b_len {
        return Err(TensorError::invalid_argument(format!(
            "right-hand side has {} elements, {rows}x{nrhs} needs {b_len}",
            b.len()
        )));
    }
    Ok(())
}

// Apply `I - beta·v·vᵀ` to rows `k..` of column `col` in a row-major matrix.
fn reflect(m: &mut [f64], stride: usize, col: usize, k: usize, v: &[f64], beta: f64) {
    let dot: f64 = v
        .iter()
        .enumerate()
        .map(|(idx, vi)| vi * m[(k + idx) * stride + col])
        .sum();
    let factor = beta * dot;
    for (idx, vi) in v.iter().enumerate() {
        m[(k + idx) * stride + col] -= factor * vi;
    }
}

/// Solve the overdetermined system `A·X ≈ B` in the least-squares sense.
///
/// `a` is `rows × cols` and `b` is `rows × nrhs`, both row-major; only the
/// leading `rows * cols` and `rows * nrhs` elements are read. Requires
/// `rows ≥ cols` and full column rank; a rank-deficient `A` is a
/// [`TensorError::Numerical`] failure rather than a minimum-norm solution.
pub fn least_squares(
    a: &[f64],
    rows: usize,
    cols: usize,
    b: &[f64],
    nrhs: usize,
) -> Result<LeastSquares, TensorError> {
    check_dims(a, rows, cols, b, nrhs)?;
    let mut qr = a[..rows * cols].to_vec();
    let mut rhs = b[..rows * nrhs].to_vec();

    let scale = (0..cols)
        .map(|j| (0..rows).map(|i| qr[i * cols + j].powi(2)).sum::<f64>().sqrt())
        .fold(0.0, f64::max);
    if !scale.is_finite() || scale == 0.0 {
        return Err(TensorError::Numerical {
            reason: "design matrix is zero or non-finite".into(),
        });
    }
    let tol = RANK_TOLERANCE * scale;

    let mut v = Vec::with_capacity(rows);
    for k in 0..cols {
        let norm = (k..rows)
            .map(|i| qr[i * cols + k].powi(2))
            .sum::<f64>()
            .sqrt();
        if norm <= tol {
            return Err(TensorError::Numerical {
                reason: format!("rank-deficient system at column {k}"),
            });
        }
        let x0 = qr[k * cols + k];
        let alpha = if x0 >= 0.0 { -norm } else { norm };
        v.clear();
        v.push(x0 - alpha);
        v.extend((k + 1..rows).map(|i| qr[i * cols + k]));
        // |x0 - alpha| >= norm > 0, so the reflector is well defined.
        let beta = 2.0 / v.iter().map(|x| x * x).sum::<f64>();

        qr[k * cols + k] = alpha;
        for i in k + 1..rows {
            qr[i * cols + k] = 0.0;
        }
        for col in k + 1..cols {
            reflect(&mut qr, cols, col, k, &v, beta);
        }
        for col in 0..nrhs {
            reflect(&mut rhs, nrhs, col, k, &v, beta);
        }
    }

    let mut r = vec![0.0; cols * cols];
    for i in 0..cols {
        r[i * cols + i..(i + 1) * cols].copy_from_slice(&qr[i * cols + i..(i + 1) * cols]);
    }

    let mut solution = vec![0.0; cols * nrhs];
    for j in 0..nrhs {
        for c in (0..cols).rev() {
            let tail: f64 = (c + 1..cols)
                .map(|n| r[c * cols + n] * solution[n * nrhs + j])
                .sum();
            solution[c * nrhs + j] = (rhs[c * nrhs + j] - tail) / r[c * cols + c];
        }
    }

    let residual_ss = (0..nrhs)
        .map(|j| (cols..rows).map(|i| rhs[i * nrhs + j].powi(2)).sum())
        .collect();

    Ok(LeastSquares {
        solution,
        r,
        residual_ss,
    })
}

/// Inverse of an `n × n` row-major upper-triangular matrix.
pub fn upper_triangular_inverse(r: &[f64], n: usize) -> Result<Vec<f64>, TensorError> {
    if r.len() < n * n {
        return Err(TensorError::invalid_argument(format!(
            "triangular factor has {} elements, needs {}",
            r.len(),
            n * n
        )));
    }
    if let Some(i) = (0..n).find(|&i| r[i * n + i] == 0.0) {
        return Err(TensorError::Numerical {
            reason: format!("singular triangular factor at diagonal {i}"),
        });
    }
    let mut inv = vec![0.0; n * n];
    for e in 0..n {
        for i in (0..=e).rev() {
            let identity = if i == e { 1.0 } else { 0.0 };
            let tail: f64 = (i + 1..=e).map(|k| r[i * n + k] * inv[k * n + e]).sum();
            inv[i * n + e] = (identity - tail) / r[i * n + i];
        }
    }
    Ok(inv)
}

/// `(AᵀA)⁻¹ = R⁻¹R⁻ᵀ` from the QR factor `R` of `A`.
pub fn covariance_from_r(r: &[f64], n: usize) -> Result<Vec<f64>, TensorError> {
    let inv = upper_triangular_inverse(r, n)?;
    let mut cov = vec![0.0; n * n];
    for i in 0..n {
        for j in i..n {
            let v: f64 = (j..n).map(|k| inv[i * n + k] * inv[j * n + k]).sum();
            cov[i * n + j] = v;
            cov[j * n + i] = v;
        }
    }
    Ok(cov)
}

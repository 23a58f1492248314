//! BLAS and LAPACK style FFI over registered tensors.

use numy_core::{Tensor, TensorError};
use numy_registry::{BufferHandle, PairMut};
use tracing::debug;

use crate::buffers::write_optional;
use crate::context::registry;
use crate::status::NumyStatus;

/// Construct a Givens rotation zeroing `b` in `(a, b)`.
///
/// On return `*a` holds `r` and `*b` holds the reconstruction value `z`;
/// the cosine and sine go to `c_out` and `s_out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_blas_drotg(a: *mut f64, b: *mut f64, c_out: *mut f64, s_out: *mut f64) -> i32 {
    ffi_guard!({
        if a.is_null() || b.is_null() || c_out.is_null() || s_out.is_null() {
            return NumyStatus::InvalidArgument as i32;
        }
        // SAFETY: all four pointers checked non-null and valid per caller contract.
        unsafe {
            let rot = numy_ops::drotg(*a, *b);
            *a = rot.r;
            *b = rot.z;
            *c_out = rot.c;
            *s_out = rot.s;
        }
        NumyStatus::Ok as i32
    })
}

/// Copy `n` elements from tensor `x` (increment `incx`) into tensor `y`
/// (increment `incy`). Negative increments walk backwards. The extent must
/// fit in both tensors.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_blas_dcopy(
    n: usize,
    x: u64,
    incx: i64,
    y: u64,
    incy: i64,
    copied_out: *mut usize,
) -> i32 {
    ffi_guard!({
        let (Ok(incx), Ok(incy)) = (isize::try_from(incx), isize::try_from(incy)) else {
            return NumyStatus::InvalidArgument as i32;
        };
        let registry = ffi_try!(registry());
        let copied = ffi_try!(registry.with_operands(
            BufferHandle::from_raw(y),
            BufferHandle::from_raw(x),
            |dst, src| numy_ops::dcopy(n, src.data(), incx, dst.data_mut(), incy),
        ));
        let copied = ffi_try!(copied);
        // SAFETY: copied_out is null or valid per caller contract.
        unsafe { write_optional(copied_out, copied) };
        NumyStatus::Ok as i32
    })
}

fn rhs_dims(b: &Tensor) -> (usize, usize) {
    if b.rank() == 1 {
        (b.element_count(), 1)
    } else {
        (b.nr_rows(), b.nr_cols())
    }
}

fn solve_into(a: &Tensor, b: &mut Tensor) -> Result<f64, TensorError> {
    let (rows, cols) = (a.nr_rows(), a.nr_cols());
    let (b_rows, nrhs) = rhs_dims(b);
    if b_rows != rows {
        return Err(TensorError::invalid_argument(format!(
            "matrix has {rows} rows, right-hand side has {b_rows}"
        )));
    }
    let ls = numy_ops::least_squares(a.data(), rows, cols, b.data(), nrhs)?;
    b.data_mut()[..ls.solution.len()].copy_from_slice(&ls.solution);
    debug!(rows, cols, nrhs, "least-squares solve");
    Ok(ls.residual_ss.iter().sum())
}

/// Least-squares solve of `A·X ≈ B`, overwriting the leading `cols × nrhs`
/// elements of `B` with `X`.
///
/// `A` is viewed as `nr_rows × nr_cols` row-major. A vector `B` is a single
/// right-hand side; otherwise `B` is `nr_rows × nr_cols` with one column per
/// right-hand side. `residual_out` (nullable) receives the residual sum of
/// squares summed over right-hand sides. `A` and `B` must be distinct.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_lapack_dgels(a: u64, b: u64, residual_out: *mut f64) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        let solved = ffi_try!(registry.with_pair(
            BufferHandle::from_raw(a),
            BufferHandle::from_raw(b),
            |pair| match pair {
                PairMut::Distinct(a, b) => solve_into(a, b),
                PairMut::Same(_) => Err(TensorError::invalid_argument(
                    "matrix and right-hand side must be distinct tensors",
                )),
            },
        ));
        let residual = ffi_try!(solved);
        // SAFETY: residual_out is null or valid per caller contract.
        unsafe { write_optional(residual_out, residual) };
        NumyStatus::Ok as i32
    })
}

//! B-spline fitter FFI.
//!
//! Fitters live in their own handle table, independent of the tensor
//! registry. Sample data is passed as tensor handles and snapshotted
//! before fitting, so no tensor lock is held during the solve.

use std::sync::{Arc, Mutex};

use numy_fit::{FitState, SplineConfig, SplineFitter, DEFAULT_ORDER};
use numy_registry::{BufferHandle, HandleTable};
use tracing::debug;

use crate::buffers::{copy_to_caller, write_out};
use crate::status::NumyStatus;
use crate::tensor::read_all;

static FITTERS: Mutex<HandleTable<Arc<Mutex<SplineFitter>>>> = Mutex::new(HandleTable::new());

/// Lifecycle state of a fitter.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumyFitState {
    /// Created; knots not yet placed.
    Initialized = 0,
    /// Knots placed; ready to fit.
    KnotsPlaced = 1,
    /// A fit is available.
    Fitted = 2,
}

impl From<FitState> for NumyFitState {
    fn from(s: FitState) -> Self {
        match s {
            FitState::Initialized => NumyFitState::Initialized,
            FitState::KnotsPlaced => NumyFitState::KnotsPlaced,
            FitState::Fitted => NumyFitState::Fitted,
        }
    }
}

/// Goodness-of-fit statistics of the last fit.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NumyFitResult {
    /// Weighted residual sum of squares.
    pub chi_square: f64,
    /// Weighted total sum of squares.
    pub total_sum_squares: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Samples minus coefficients.
    pub degrees_of_freedom: u64,
}

fn get_fitter(handle: u64) -> Result<Arc<Mutex<SplineFitter>>, NumyStatus> {
    let table = FITTERS.lock().map_err(|_| NumyStatus::InternalError)?;
    table
        .get(BufferHandle::from_raw(handle))
        .cloned()
        .ok_or(NumyStatus::InvalidHandle)
}

// ── FFI functions ───────────────────────────────────────────────

/// Create a fitter with `ncoeffs` basis functions of the given `order`
/// (0 selects cubic).
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_bspline_create(ncoeffs: usize, order: usize, handle_out: *mut u64) -> i32 {
    ffi_guard!({
        if handle_out.is_null() {
            return NumyStatus::InvalidArgument as i32;
        }
        let order = if order == 0 { DEFAULT_ORDER } else { order };
        let fitter = ffi_try!(SplineFitter::new(SplineConfig::new(ncoeffs).with_order(order)));
        let handle = ffi_lock!(FITTERS).insert(Arc::new(Mutex::new(fitter)));
        debug!(%handle, ncoeffs, order, "spline fitter created");
        // SAFETY: handle_out checked non-null above.
        ffi_try!(unsafe { write_out(handle_out, handle.into_raw()) });
        NumyStatus::Ok as i32
    })
}

/// Destroy a fitter.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_bspline_destroy(handle: u64) -> i32 {
    ffi_guard!({
        match ffi_lock!(FITTERS).remove(BufferHandle::from_raw(handle)) {
            Some(_) => NumyStatus::Ok as i32,
            None => NumyStatus::InvalidHandle as i32,
        }
    })
}

/// Place a clamped uniform knot vector over `[lower, upper]`. Discards
/// any previous fit.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_bspline_place_uniform_knots(handle: u64, lower: f64, upper: f64) -> i32 {
    ffi_guard!({
        let fitter = ffi_try!(get_fitter(handle));
        let mut fitter = ffi_lock!(fitter);
        ffi_try!(fitter.place_uniform_knots(lower, upper));
        NumyStatus::Ok as i32
    })
}

/// Fit to the samples held in tensors `x` and `y`, weighted by tensor `w`
/// when `use_weights` is set.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_bspline_fit(handle: u64, x: u64, y: u64, w: u64, use_weights: bool) -> i32 {
    ffi_guard!({
        let fitter = ffi_try!(get_fitter(handle));
        let xs = ffi_try!(read_all(x));
        let ys = ffi_try!(read_all(y));
        let ws = if use_weights {
            Some(ffi_try!(read_all(w)))
        } else {
            None
        };
        let mut fitter = ffi_lock!(fitter);
        ffi_try!(fitter.fit(&xs, &ys, ws.as_deref()));
        NumyStatus::Ok as i32
    })
}

/// Statistics of the last fit.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_bspline_result(handle: u64, out: *mut NumyFitResult) -> i32 {
    ffi_guard!({
        let fitter = ffi_try!(get_fitter(handle));
        let fitter = ffi_lock!(fitter);
        let Some(fit) = fitter.result() else {
            return NumyStatus::InvalidState as i32;
        };
        let value = NumyFitResult {
            chi_square: fit.chi_square,
            total_sum_squares: fit.total_sum_squares,
            r_squared: fit.r_squared,
            degrees_of_freedom: fit.degrees_of_freedom as u64,
        };
        // SAFETY: out is valid per caller contract.
        ffi_try!(unsafe { write_out(out, value) });
        NumyStatus::Ok as i32
    })
}

/// Copy the fitted coefficients into `buf`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_bspline_coefficients(
    handle: u64,
    buf: *mut f64,
    cap: usize,
    len_out: *mut usize,
) -> i32 {
    ffi_guard!({
        let fitter = ffi_try!(get_fitter(handle));
        let fitter = ffi_lock!(fitter);
        let Some(fit) = fitter.result() else {
            return NumyStatus::InvalidState as i32;
        };
        // SAFETY: buf is valid for cap writes per caller contract.
        ffi_try!(unsafe { copy_to_caller(&fit.coefficients, buf, cap, len_out) });
        NumyStatus::Ok as i32
    })
}

/// Copy the row-major `ncoeffs × ncoeffs` covariance matrix into `buf`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_bspline_covariance(
    handle: u64,
    buf: *mut f64,
    cap: usize,
    len_out: *mut usize,
) -> i32 {
    ffi_guard!({
        let fitter = ffi_try!(get_fitter(handle));
        let fitter = ffi_lock!(fitter);
        let Some(fit) = fitter.result() else {
            return NumyStatus::InvalidState as i32;
        };
        // SAFETY: buf is valid for cap writes per caller contract.
        ffi_try!(unsafe { copy_to_caller(&fit.covariance, buf, cap, len_out) });
        NumyStatus::Ok as i32
    })
}

/// Evaluate the fitted spline at `x`, writing the value and its standard
/// error.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_bspline_eval(
    handle: u64,
    x: f64,
    value_out: *mut f64,
    err_out: *mut f64,
) -> i32 {
    ffi_guard!({
        if value_out.is_null() || err_out.is_null() {
            return NumyStatus::InvalidArgument as i32;
        }
        let fitter = ffi_try!(get_fitter(handle));
        let (value, err) = ffi_try!(ffi_lock!(fitter).eval(x));
        // SAFETY: both pointers checked non-null above.
        unsafe {
            *value_out = value;
            *err_out = err;
        }
        NumyStatus::Ok as i32
    })
}

/// Current lifecycle state.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_bspline_state(handle: u64, out: *mut NumyFitState) -> i32 {
    ffi_guard!({
        let fitter = ffi_try!(get_fitter(handle));
        let state = ffi_lock!(fitter).state();
        // SAFETY: out is valid per caller contract.
        ffi_try!(unsafe { write_out(out, NumyFitState::from(state)) });
        NumyStatus::Ok as i32
    })
}

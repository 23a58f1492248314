//! C ABI for numy.
//!
//! Every exported function returns an `i32` [`NumyStatus`] (0 on success,
//! negative on failure) and writes results through caller-supplied
//! out-pointers. Bodies run under a panic guard, so a Rust panic surfaces
//! as [`NumyStatus::Panicked`] instead of unwinding into the host.
//!
//! Tensors and spline fitters live behind opaque `u64` handles. A module
//! must be loaded with [`numy_load`] before any tensor call. The host owns
//! each tensor handle and releases it with [`numy_tensor_destroy`], usually
//! from its garbage collector; a second destroy of the same handle is
//! `InvalidHandle` and never frees twice.
//!
//! This is the only crate in the workspace that contains `unsafe` code.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

/// Run an FFI body, mapping a caught panic to `NumyStatus::Panicked`.
macro_rules! ffi_guard {
    ($body:block) => {{
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| -> i32 { $body })) {
            Ok(status) => status,
            Err(_) => $crate::status::NumyStatus::Panicked as i32,
        }
    }};
}

/// Lock a mutex, returning `NumyStatus::InternalError` from the enclosing
/// FFI body if it is poisoned.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $crate::status::NumyStatus::InternalError as i32,
        }
    };
}

/// Unwrap a `Result`, returning the status of its error from the enclosing
/// FFI body.
macro_rules! ffi_try {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => return $crate::status::NumyStatus::from(&e) as i32,
        }
    };
}

mod buffers;
pub mod blas;
pub mod context;
pub mod fit;
pub mod io;
pub mod status;
pub mod tensor;
pub mod vector;

pub use blas::{numy_blas_dcopy, numy_blas_drotg, numy_lapack_dgels};
pub use context::{
    numy_init_logging, numy_load, numy_registry_stats, numy_terms, numy_unload, numy_upgrade,
    numy_version, NumyAtomFn, NumyConfig, NumyRegistryStats, NumyTerms,
};
pub use fit::{
    numy_bspline_coefficients, numy_bspline_covariance, numy_bspline_create,
    numy_bspline_destroy, numy_bspline_eval, numy_bspline_fit, numy_bspline_place_uniform_knots,
    numy_bspline_result, numy_bspline_state, NumyFitResult, NumyFitState,
};
pub use io::{numy_tensor_load_from_file, numy_tensor_save_to_file};
pub use status::NumyStatus;
pub use tensor::{
    numy_data_copy_all, numy_tensor_assign, numy_tensor_create, numy_tensor_create_map,
    numy_tensor_data, numy_tensor_destroy, numy_tensor_fill, numy_tensor_from_data,
    numy_tensor_nr_dimensions, numy_tensor_nrelm, numy_tensor_shape, numy_vector_get_at,
    numy_vector_set_at, NumyArg, NumyArgKind,
};
pub use vector::*;

//! Raw pointer helpers shared by the FFI modules.

#![allow(unsafe_code)]

use crate::status::NumyStatus;

/// Borrow `len` elements at `ptr` as a slice. A zero length yields an
/// empty slice regardless of `ptr`; a null `ptr` with non-zero length is
/// `InvalidArgument`.
///
/// # Safety
///
/// If `len > 0` and `ptr` is non-null, `ptr` must point to `len`
/// initialised, aligned values that stay valid and unaliased by writers
/// for `'a`.
pub(crate) unsafe fn input_slice<'a, T>(ptr: *const T, len: usize) -> Result<&'a [T], NumyStatus> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(NumyStatus::InvalidArgument);
    }
    // SAFETY: non-null and valid for `len` reads per caller contract.
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

/// Mutable counterpart of [`input_slice`].
///
/// # Safety
///
/// If `len > 0` and `ptr` is non-null, `ptr` must point to `len` aligned,
/// writable values not accessed through any other path for `'a`.
pub(crate) unsafe fn output_slice<'a, T>(ptr: *mut T, len: usize) -> Result<&'a mut [T], NumyStatus> {
    if len == 0 {
        return Ok(&mut []);
    }
    if ptr.is_null() {
        return Err(NumyStatus::InvalidArgument);
    }
    // SAFETY: non-null and valid for `len` writes per caller contract.
    Ok(unsafe { std::slice::from_raw_parts_mut(ptr, len) })
}

/// Store `value` through a required out-pointer.
///
/// # Safety
///
/// A non-null `out` must be valid for one aligned write.
pub(crate) unsafe fn write_out<T>(out: *mut T, value: T) -> Result<(), NumyStatus> {
    if out.is_null() {
        return Err(NumyStatus::InvalidArgument);
    }
    // SAFETY: non-null and writable per caller contract.
    unsafe { *out = value };
    Ok(())
}

/// Store `value` through an out-pointer the caller may leave null.
///
/// # Safety
///
/// A non-null `out` must be valid for one aligned write.
pub(crate) unsafe fn write_optional<T>(out: *mut T, value: T) {
    if !out.is_null() {
        // SAFETY: non-null and writable per caller contract.
        unsafe { *out = value };
    }
}

/// Copy `src` into the caller buffer `buf` of capacity `cap`.
///
/// The required length is always reported through `len_out` (if
/// non-null), so callers can size a retry after `BufferTooSmall`.
///
/// # Safety
///
/// `buf` must be valid for `cap` writes; a non-null `len_out` must be
/// valid for one write.
pub(crate) unsafe fn copy_to_caller<T: Copy>(
    src: &[T],
    buf: *mut T,
    cap: usize,
    len_out: *mut usize,
) -> Result<(), NumyStatus> {
    // SAFETY: forwarded caller contract.
    unsafe { write_optional(len_out, src.len()) };
    if cap < src.len() {
        return Err(NumyStatus::BufferTooSmall);
    }
    // SAFETY: forwarded caller contract.
    let dst = unsafe { output_slice(buf, src.len())? };
    dst.copy_from_slice(src);
    Ok(())
}

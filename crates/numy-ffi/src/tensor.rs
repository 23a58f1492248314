//! Tensor construction, destruction and element access FFI.

use std::ffi::{c_char, CStr};

use numy_core::{ArgValue, ConstructArgs, Shape, Tensor};
use numy_registry::{BufferHandle, PairMut};
use tracing::warn;

use crate::buffers::{copy_to_caller, input_slice, write_optional, write_out};
use crate::context::registry;
use crate::status::NumyStatus;

/// Kind of value carried by a [`NumyArg`].
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumyArgKind {
    /// `int_value` is set.
    Int = 0,
    /// `float_value` is set.
    Float = 1,
    /// `atom` points to a NUL-terminated name.
    Atom = 2,
    /// `list` points to `list_len` integers.
    IntList = 3,
}

/// One value of a construction map passed to [`numy_tensor_create_map`].
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct NumyArg {
    /// Which field holds the value.
    pub kind: NumyArgKind,
    /// Integer payload for [`NumyArgKind::Int`].
    pub int_value: i64,
    /// Float payload for [`NumyArgKind::Float`].
    pub float_value: f64,
    /// List payload for [`NumyArgKind::IntList`].
    pub list: *const i64,
    /// Length of `list`.
    pub list_len: usize,
    /// Atom name for [`NumyArgKind::Atom`].
    pub atom: *const c_char,
}

/// Decode a NUL-terminated string.
///
/// # Safety
///
/// A non-null `ptr` must point to a NUL-terminated string.
#[allow(unsafe_code)]
pub(crate) unsafe fn c_str<'a>(ptr: *const c_char) -> Result<&'a str, NumyStatus> {
    if ptr.is_null() {
        return Err(NumyStatus::InvalidArgument);
    }
    // SAFETY: non-null and NUL-terminated per caller contract.
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| NumyStatus::BadArgument)
}

/// # Safety
///
/// Pointers inside `arg` must be valid for their declared lengths.
#[allow(unsafe_code)]
unsafe fn decode_arg(arg: &NumyArg) -> Result<ArgValue, NumyStatus> {
    Ok(match arg.kind {
        NumyArgKind::Int => ArgValue::Int(arg.int_value),
        NumyArgKind::Float => ArgValue::Float(arg.float_value),
        // SAFETY: forwarded caller contract.
        NumyArgKind::Atom => ArgValue::Atom(unsafe { c_str(arg.atom)? }.to_owned()),
        NumyArgKind::IntList => {
            // SAFETY: forwarded caller contract.
            let items = unsafe { input_slice(arg.list, arg.list_len)? };
            ArgValue::List(items.iter().map(|&d| ArgValue::Int(d)).collect())
        }
    })
}

// ── FFI functions ───────────────────────────────────────────────

/// Create a zero-filled tensor with the given extents.
///
/// `dims` holds `rank` signed extents so that non-positive values can be
/// rejected rather than wrapped.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_tensor_create(dims: *const i64, rank: usize, handle_out: *mut u64) -> i32 {
    ffi_guard!({
        if handle_out.is_null() {
            return NumyStatus::InvalidArgument as i32;
        }
        let registry = ffi_try!(registry());
        // SAFETY: dims is valid for rank reads per caller contract.
        let dims = ffi_try!(unsafe { input_slice(dims, rank) });
        let shape = match Shape::new(dims) {
            Ok(shape) => shape,
            Err(e) => {
                warn!(?dims, error = %e, "tensor construction rejected");
                return NumyStatus::from(&e) as i32;
            }
        };
        let handle = ffi_try!(registry.allocate(shape));
        // SAFETY: handle_out checked non-null above.
        unsafe { *handle_out = handle.into_raw() };
        NumyStatus::Ok as i32
    })
}

/// Create a tensor from a keyed construction map.
///
/// `keys[i]` names `values[i]`. The only required key is `"shape"`, an
/// [`NumyArgKind::IntList`] of positive extents; other keys are ignored.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_tensor_create_map(
    keys: *const *const c_char,
    values: *const NumyArg,
    n: usize,
    handle_out: *mut u64,
) -> i32 {
    ffi_guard!({
        if handle_out.is_null() {
            return NumyStatus::InvalidArgument as i32;
        }
        let registry = ffi_try!(registry());
        // SAFETY: keys and values are valid for n reads per caller contract.
        let keys = ffi_try!(unsafe { input_slice(keys, n) });
        // SAFETY: as above.
        let values = ffi_try!(unsafe { input_slice(values, n) });
        let mut args = ConstructArgs::new();
        for (&key, value) in keys.iter().zip(values) {
            // SAFETY: each key is a NUL-terminated string per caller contract.
            let key = ffi_try!(unsafe { c_str(key) });
            // SAFETY: embedded pointers valid per caller contract.
            let value = ffi_try!(unsafe { decode_arg(value) });
            args = args.with(key, value);
        }
        let handle = match registry.allocate_from_args(&args) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "tensor construction from map rejected");
                return NumyStatus::from(&e) as i32;
            }
        };
        // SAFETY: handle_out checked non-null above.
        unsafe { *handle_out = handle.into_raw() };
        NumyStatus::Ok as i32
    })
}

/// Create a vector tensor holding a copy of `values`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_tensor_from_data(values: *const f64, n: usize, handle_out: *mut u64) -> i32 {
    ffi_guard!({
        if handle_out.is_null() {
            return NumyStatus::InvalidArgument as i32;
        }
        let registry = ffi_try!(registry());
        // SAFETY: values is valid for n reads per caller contract.
        let values = ffi_try!(unsafe { input_slice(values, n) });
        let tensor = ffi_try!(Tensor::from_slice(values));
        let handle = ffi_try!(registry.insert(tensor));
        // SAFETY: handle_out checked non-null above.
        unsafe { *handle_out = handle.into_raw() };
        NumyStatus::Ok as i32
    })
}

/// Destroy a tensor. A second destroy of the same handle is `InvalidHandle`;
/// a corrupt header is `MemoryCorruption` and the storage is leaked.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_tensor_destroy(handle: u64) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        ffi_try!(registry.destroy(BufferHandle::from_raw(handle)));
        NumyStatus::Ok as i32
    })
}

/// Set every element to `value`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_tensor_fill(handle: u64, value: f64) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        ffi_try!(registry.with_tensor_mut(BufferHandle::from_raw(handle), |t| t.fill(value)));
        NumyStatus::Ok as i32
    })
}

/// Copy the leading elements into `buf`.
///
/// `max_count < 1` requests the whole payload. `len_out` receives the
/// number of elements the request needs, also on `BufferTooSmall`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_tensor_data(
    handle: u64,
    max_count: i64,
    buf: *mut f64,
    cap: usize,
    len_out: *mut usize,
) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        let limit = usize::try_from(max_count).ok();
        let result = ffi_try!(registry.with_tensor(BufferHandle::from_raw(handle), |t| {
            // SAFETY: buf is valid for cap writes per caller contract.
            unsafe { copy_to_caller(t.read(limit), buf, cap, len_out) }
        }));
        ffi_try!(result);
        NumyStatus::Ok as i32
    })
}

/// Overwrite the leading elements with `values`; extra input is ignored.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_tensor_assign(
    handle: u64,
    values: *const f64,
    n: usize,
    assigned_out: *mut usize,
) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        // SAFETY: values is valid for n reads per caller contract.
        let values = ffi_try!(unsafe { input_slice(values, n) });
        let assigned = ffi_try!(
            registry.with_tensor_mut(BufferHandle::from_raw(handle), |t| t.assign(values))
        );
        // SAFETY: assigned_out is null or valid.
        unsafe { write_optional(assigned_out, assigned) };
        NumyStatus::Ok as i32
    })
}

/// Number of elements.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_tensor_nrelm(handle: u64, out: *mut u64) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        let count = ffi_try!(
            registry.with_tensor(BufferHandle::from_raw(handle), |t| t.element_count() as u64)
        );
        // SAFETY: out is valid per caller contract.
        ffi_try!(unsafe { write_out(out, count) });
        NumyStatus::Ok as i32
    })
}

/// Number of dimensions.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_tensor_nr_dimensions(handle: u64, out: *mut u32) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        let rank = ffi_try!(registry.with_tensor(BufferHandle::from_raw(handle), |t| t.rank() as u32));
        // SAFETY: out is valid per caller contract.
        ffi_try!(unsafe { write_out(out, rank) });
        NumyStatus::Ok as i32
    })
}

/// Copy the extents into `buf`; `rank_out` receives the rank.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_tensor_shape(
    handle: u64,
    buf: *mut u32,
    cap: usize,
    rank_out: *mut usize,
) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        let result = ffi_try!(registry.with_tensor(BufferHandle::from_raw(handle), |t| {
            // SAFETY: buf is valid for cap writes per caller contract.
            unsafe { copy_to_caller(t.shape().dims(), buf, cap, rank_out) }
        }));
        ffi_try!(result);
        NumyStatus::Ok as i32
    })
}

/// Raw copy of the overlapping payload bytes from `src` into `dst`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_data_copy_all(dst: u64, src: u64, bytes_out: *mut usize) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        let dst = BufferHandle::from_raw(dst);
        let src = BufferHandle::from_raw(src);
        let bytes = ffi_try!(registry.with_pair(dst, src, |pair| match pair {
            PairMut::Distinct(d, s) => d.copy_all_from(s),
            PairMut::Same(t) => t.byte_size(),
        }));
        // SAFETY: bytes_out is null or valid.
        unsafe { write_optional(bytes_out, bytes) };
        NumyStatus::Ok as i32
    })
}

/// Read the element at `index`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_get_at(handle: u64, index: usize, value_out: *mut f64) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        let value = ffi_try!(registry.with_tensor(BufferHandle::from_raw(handle), |t| t.get(index)));
        let value = ffi_try!(value);
        // SAFETY: value_out is valid per caller contract.
        ffi_try!(unsafe { write_out(value_out, value) });
        NumyStatus::Ok as i32
    })
}

/// Overwrite the element at `index`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_set_at(handle: u64, index: usize, value: f64) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        let result = ffi_try!(
            registry.with_tensor_mut(BufferHandle::from_raw(handle), |t| t.set(index, value))
        );
        ffi_try!(result);
        NumyStatus::Ok as i32
    })
}

/// Snapshot of a tensor payload.
pub(crate) fn read_all(handle: u64) -> Result<Vec<f64>, NumyStatus> {
    registry()?
        .with_tensor(BufferHandle::from_raw(handle), |t| t.data().to_vec())
        .map_err(|e| NumyStatus::from(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ensure_loaded;
    use std::ffi::CString;

    fn create(dims: &[i64]) -> Result<u64, i32> {
        let mut h = 0u64;
        match numy_tensor_create(dims.as_ptr(), dims.len(), &mut h) {
            0 => Ok(h),
            status => Err(status),
        }
    }

    #[test]
    fn create_reports_shape_and_count() {
        ensure_loaded();
        let h = create(&[2, 3, 4]).unwrap();

        let mut n = 0u64;
        assert_eq!(numy_tensor_nrelm(h, &mut n), 0);
        assert_eq!(n, 24);
        let mut rank = 0u32;
        assert_eq!(numy_tensor_nr_dimensions(h, &mut rank), 0);
        assert_eq!(rank, 3);

        let mut dims = [0u32; 4];
        let mut len = 0usize;
        assert_eq!(numy_tensor_shape(h, dims.as_mut_ptr(), dims.len(), &mut len), 0);
        assert_eq!(&dims[..len], &[2, 3, 4]);

        assert_eq!(numy_tensor_destroy(h), 0);
    }

    #[test]
    fn create_rejects_bad_shapes() {
        ensure_loaded();
        assert_eq!(create(&[]), Err(NumyStatus::BadArgument as i32));
        assert_eq!(create(&[3, 0]), Err(NumyStatus::BadArgument as i32));
        assert_eq!(create(&[-2]), Err(NumyStatus::BadArgument as i32));
        assert_eq!(
            numy_tensor_create([2i64].as_ptr(), 1, std::ptr::null_mut()),
            NumyStatus::InvalidArgument as i32
        );
    }

    #[test]
    fn create_map_requires_shape_list() {
        ensure_loaded();
        let shape_key = CString::new("shape").unwrap();
        let other_key = CString::new("dtype").unwrap();
        let atom = CString::new("f64").unwrap();
        let extents = [4i64, 2];
        let list = NumyArg {
            kind: NumyArgKind::IntList,
            int_value: 0,
            float_value: 0.0,
            list: extents.as_ptr(),
            list_len: extents.len(),
            atom: std::ptr::null(),
        };
        let dtype = NumyArg {
            kind: NumyArgKind::Atom,
            atom: atom.as_ptr(),
            ..list
        };

        let keys = [shape_key.as_ptr(), other_key.as_ptr()];
        let values = [list, dtype];
        let mut h = 0u64;
        assert_eq!(numy_tensor_create_map(keys.as_ptr(), values.as_ptr(), 2, &mut h), 0);
        let mut n = 0u64;
        assert_eq!(numy_tensor_nrelm(h, &mut n), 0);
        assert_eq!(n, 8);
        assert_eq!(numy_tensor_destroy(h), 0);

        let keys = [other_key.as_ptr()];
        let values = [dtype];
        assert_eq!(
            numy_tensor_create_map(keys.as_ptr(), values.as_ptr(), 1, &mut h),
            NumyStatus::BadArgument as i32
        );

        let scalar = NumyArg {
            kind: NumyArgKind::Int,
            int_value: 3,
            ..list
        };
        let keys = [shape_key.as_ptr()];
        let values = [scalar];
        assert_eq!(
            numy_tensor_create_map(keys.as_ptr(), values.as_ptr(), 1, &mut h),
            NumyStatus::BadArgument as i32
        );
    }

    #[test]
    fn data_assign_and_element_access() {
        ensure_loaded();
        let h = create(&[5]).unwrap();
        let mut assigned = 0usize;
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(numy_tensor_assign(h, values.as_ptr(), values.len(), &mut assigned), 0);
        assert_eq!(assigned, 5);

        let mut buf = [0.0f64; 5];
        let mut len = 0usize;
        assert_eq!(numy_tensor_data(h, 3, buf.as_mut_ptr(), buf.len(), &mut len), 0);
        assert_eq!(len, 3);
        assert_eq!(&buf[..3], &[1.0, 2.0, 3.0]);

        assert_eq!(
            numy_tensor_data(h, 0, buf.as_mut_ptr(), 2, &mut len),
            NumyStatus::BufferTooSmall as i32
        );
        assert_eq!(len, 5);

        assert_eq!(numy_vector_set_at(h, 4, -1.5), 0);
        let mut v = 0.0;
        assert_eq!(numy_vector_get_at(h, 4, &mut v), 0);
        assert_eq!(v, -1.5);
        assert_eq!(
            numy_vector_get_at(h, 5, &mut v),
            NumyStatus::InvalidArgument as i32
        );

        assert_eq!(numy_tensor_fill(h, 7.0), 0);
        assert_eq!(read_all(h).unwrap(), vec![7.0; 5]);
        assert_eq!(numy_tensor_destroy(h), 0);
    }

    #[test]
    fn copy_all_copies_overlapping_bytes() {
        ensure_loaded();
        let mut src = 0u64;
        let values = [1.0, 2.0, 3.0];
        assert_eq!(numy_tensor_from_data(values.as_ptr(), 3, &mut src), 0);
        let dst = create(&[2]).unwrap();

        let mut bytes = 0usize;
        assert_eq!(numy_data_copy_all(dst, src, &mut bytes), 0);
        assert_eq!(bytes, 16);
        assert_eq!(read_all(dst).unwrap(), vec![1.0, 2.0]);

        assert_eq!(numy_tensor_destroy(src), 0);
        assert_eq!(numy_tensor_destroy(dst), 0);
    }

    #[test]
    fn double_destroy_is_invalid_handle() {
        ensure_loaded();
        let h = create(&[1]).unwrap();
        assert_eq!(numy_tensor_destroy(h), 0);
        assert_eq!(numy_tensor_destroy(h), NumyStatus::InvalidHandle as i32);
        assert_eq!(numy_tensor_fill(h, 1.0), NumyStatus::InvalidHandle as i32);
    }
}

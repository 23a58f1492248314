//! Tensor persistence FFI.

use std::ffi::c_char;

use numy_registry::BufferHandle;

use crate::buffers::write_out;
use crate::context::registry;
use crate::status::NumyStatus;
use crate::tensor::c_str;

/// Write the tensor behind `handle` to `path` (NUL-terminated UTF-8).
///
/// Succeeds only once header and payload are fully written and synced.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_tensor_save_to_file(handle: u64, path: *const c_char) -> i32 {
    ffi_guard!({
        // SAFETY: path is a NUL-terminated string per caller contract.
        let path = ffi_try!(unsafe { c_str(path) });
        let registry = ffi_try!(registry());
        let saved = ffi_try!(registry.with_tensor(BufferHandle::from_raw(handle), |t| {
            numy_io::save(path, t)
        }));
        ffi_try!(saved);
        NumyStatus::Ok as i32
    })
}

/// Load a tensor saved by [`numy_tensor_save_to_file`] and register it.
///
/// A missing or unreadable file is `Io`; a truncated or inconsistent one
/// is `CorruptFile`. The registry's element cap is checked against the
/// header before the payload is allocated.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_tensor_load_from_file(path: *const c_char, handle_out: *mut u64) -> i32 {
    ffi_guard!({
        if handle_out.is_null() {
            return NumyStatus::InvalidArgument as i32;
        }
        // SAFETY: path is a NUL-terminated string per caller contract.
        let path = ffi_try!(unsafe { c_str(path) });
        let registry = ffi_try!(registry());
        let pending = ffi_try!(numy_io::open(path));
        ffi_try!(registry.check_size(pending.shape().element_count()));
        let tensor = ffi_try!(pending.read());
        let handle = ffi_try!(registry.insert(tensor));
        // SAFETY: handle_out checked non-null above.
        ffi_try!(unsafe { write_out(handle_out, handle.into_raw()) });
        NumyStatus::Ok as i32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ensure_loaded;
    use crate::tensor::{
        numy_tensor_create, numy_tensor_destroy, numy_tensor_from_data, numy_vector_set_at,
        read_all,
    };
    use std::ffi::CString;

    fn c_path(path: &std::path::Path) -> CString {
        CString::new(path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn save_then_load_round_trips() {
        ensure_loaded();
        let dir = tempfile::tempdir().unwrap();
        let path = c_path(&dir.path().join("t.bin"));

        let dims = [2i64, 3];
        let mut h = 0u64;
        assert_eq!(numy_tensor_create(dims.as_ptr(), 2, &mut h), 0);
        assert_eq!(numy_vector_set_at(h, 5, 42.0), 0);
        assert_eq!(numy_tensor_save_to_file(h, path.as_ptr()), 0);

        let mut loaded = 0u64;
        assert_eq!(numy_tensor_load_from_file(path.as_ptr(), &mut loaded), 0);
        assert_ne!(loaded, h);
        assert_eq!(read_all(loaded).unwrap(), read_all(h).unwrap());

        numy_tensor_destroy(h);
        numy_tensor_destroy(loaded);
    }

    #[test]
    fn missing_file_is_io_and_garbage_is_corrupt() {
        ensure_loaded();
        let dir = tempfile::tempdir().unwrap();
        let missing = c_path(&dir.path().join("missing.bin"));
        let mut h = 0u64;
        assert_eq!(
            numy_tensor_load_from_file(missing.as_ptr(), &mut h),
            NumyStatus::Io as i32
        );

        let garbage_path = dir.path().join("garbage.bin");
        std::fs::write(&garbage_path, b"not a tensor").unwrap();
        let garbage = c_path(&garbage_path);
        assert_eq!(
            numy_tensor_load_from_file(garbage.as_ptr(), &mut h),
            NumyStatus::CorruptFile as i32
        );
    }

    #[test]
    fn short_file_with_huge_header_is_corrupt() {
        ensure_loaded();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.bin");
        let mut shape = [0u32; numy_core::MAX_RANK];
        shape[0] = 1 << 28;
        let mut bytes = Vec::new();
        numy_io::TensorHeader {
            tag: numy_core::TENSOR_TAG,
            rank: 1,
            shape,
            element_count: 1 << 28,
            byte_size: 1 << 31,
        }
        .encode(&mut bytes)
        .unwrap();
        std::fs::write(&path, &bytes).unwrap();

        let mut h = 0u64;
        assert_eq!(
            numy_tensor_load_from_file(c_path(&path).as_ptr(), &mut h),
            NumyStatus::CorruptFile as i32
        );
    }

    #[test]
    fn save_of_stale_handle_fails() {
        ensure_loaded();
        let dir = tempfile::tempdir().unwrap();
        let path = c_path(&dir.path().join("stale.bin"));
        let values = [1.0];
        let mut h = 0u64;
        assert_eq!(numy_tensor_from_data(values.as_ptr(), 1, &mut h), 0);
        assert_eq!(numy_tensor_destroy(h), 0);
        assert_eq!(
            numy_tensor_save_to_file(h, path.as_ptr()),
            NumyStatus::InvalidHandle as i32
        );
        assert_eq!(
            numy_tensor_save_to_file(h, std::ptr::null()),
            NumyStatus::InvalidArgument as i32
        );
    }
}

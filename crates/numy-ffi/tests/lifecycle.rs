//! Module load, upgrade and unload through the C ABI.
//!
//! The module context is process-global, so the whole sequence runs in a
//! single test.

use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

use numy_ffi::{
    numy_load, numy_registry_stats, numy_tensor_create, numy_tensor_destroy,
    numy_tensor_load_from_file, numy_tensor_nrelm, numy_terms, numy_unload, numy_upgrade,
    numy_vector_equal, NumyConfig, NumyRegistryStats, NumyStatus, NumyTerms,
};

extern "C" fn make_atom(name: *const c_char, user_data: *mut c_void) -> u64 {
    // SAFETY: the library passes a NUL-terminated name and our own user_data.
    let (name, base) = unsafe { (CStr::from_ptr(name), &*(user_data as *const AtomicU64)) };
    let base = base.load(Ordering::SeqCst);
    match name.to_bytes() {
        b"ok" => base,
        b"true" => base + 1,
        b"false" => base + 2,
        _ => 0,
    }
}

fn create(dims: &[i64]) -> Result<u64, i32> {
    let mut h = 0u64;
    match numy_tensor_create(dims.as_ptr(), dims.len(), &mut h) {
        0 => Ok(h),
        status => Err(status),
    }
}

#[test]
fn load_upgrade_unload() {
    let mut h = 0u64;
    assert_eq!(
        numy_tensor_create([1i64].as_ptr(), 1, &mut h),
        NumyStatus::NotLoaded as i32
    );
    assert_eq!(numy_unload(ptr::null_mut()), NumyStatus::NotLoaded as i32);

    let base = AtomicU64::new(100);
    let config = NumyConfig {
        max_live_buffers: 3,
        max_elements: 1000,
    };
    let user_data = &base as *const AtomicU64 as *mut c_void;
    assert_eq!(numy_load(&config, Some(make_atom), user_data), 0);

    let mut terms = NumyTerms::default();
    assert_eq!(numy_terms(&mut terms), 0);
    assert_eq!(
        terms,
        NumyTerms {
            ok: 100,
            true_term: 101,
            false_term: 102
        }
    );

    let a = create(&[4]).unwrap();
    let b = create(&[2, 2]).unwrap();
    assert_eq!(create(&[2000]), Err(NumyStatus::CapacityExceeded as i32));
    let c = create(&[1]).unwrap();
    assert_eq!(create(&[1]), Err(NumyStatus::CapacityExceeded as i32));
    assert_eq!(numy_tensor_destroy(c), 0);

    // A file over the element cap is refused before its payload is read.
    let dir = tempfile::tempdir().unwrap();
    let big_path = dir.path().join("big.bin");
    numy_io::save(&big_path, &numy_core::Tensor::from_dims(&[2000]).unwrap()).unwrap();
    let big_path = CString::new(big_path.to_str().unwrap()).unwrap();
    let mut loaded = 0u64;
    assert_eq!(
        numy_tensor_load_from_file(big_path.as_ptr(), &mut loaded),
        NumyStatus::CapacityExceeded as i32
    );

    let mut out = 0u64;
    assert_eq!(numy_vector_equal(a, b, &mut out), 0);
    assert_eq!(out, 101);

    // Upgrade re-interns atoms but keeps every handle alive.
    base.store(200, Ordering::SeqCst);
    assert_eq!(numy_upgrade(Some(make_atom), user_data), 0);
    assert_eq!(numy_terms(&mut terms), 0);
    assert_eq!(terms.true_term, 201);
    let mut n = 0u64;
    assert_eq!(numy_tensor_nrelm(b, &mut n), 0);
    assert_eq!(n, 4);

    let mut stats = NumyRegistryStats::default();
    assert_eq!(numy_registry_stats(&mut stats), 0);
    assert_eq!(stats.allocated, 3);
    assert_eq!(stats.destroyed, 1);
    assert_eq!(stats.live, 2);

    let mut freed = 0u64;
    assert_eq!(numy_unload(&mut freed), 0);
    assert_eq!(freed, 2);
    assert_eq!(numy_tensor_nrelm(a, &mut n), NumyStatus::NotLoaded as i32);

    // A fresh load starts with an empty registry.
    assert_eq!(numy_load(ptr::null(), None, ptr::null_mut()), 0);
    assert_eq!(numy_registry_stats(&mut stats), 0);
    assert_eq!(stats, NumyRegistryStats::default());
    assert_eq!(numy_terms(&mut terms), 0);
    assert_eq!((terms.true_term, terms.false_term), (1, 0));
    assert_eq!(numy_unload(&mut freed), 0);
    assert_eq!(freed, 0);

    // Zero limits mean unlimited.
    let unlimited = NumyConfig::default();
    assert_eq!(numy_load(&unlimited, None, ptr::null_mut()), 0);
    let big = create(&[2000]).unwrap();
    assert_eq!(numy_tensor_destroy(big), 0);
    assert_eq!(numy_unload(ptr::null_mut()), 0);
}

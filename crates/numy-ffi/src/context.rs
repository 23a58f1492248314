//! Module lifecycle FFI: load, upgrade, unload, version and logging.
//!
//! One [`ModuleContext`] lives in a global slot. Tensor calls briefly lock
//! the slot to clone the registry `Arc`, then work without holding it.

use std::ffi::{c_char, c_void, CString};
use std::sync::{Arc, Mutex};

use numy_registry::{
    BufferRegistry, CachedTerms, HostEnv, ModuleContext, RegistryConfig, StaticTerms, Term,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::buffers::{copy_to_caller, write_optional, write_out};
use crate::status::NumyStatus;

static CONTEXT: Mutex<Option<ModuleContext>> = Mutex::new(None);

/// Environment variable holding the log filter for [`numy_init_logging`].
pub const LOG_ENV: &str = "NUMY_LOG";

/// Registry limits passed to [`numy_load`]. Zero means unlimited.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NumyConfig {
    /// Maximum number of simultaneously live tensors.
    pub max_live_buffers: u64,
    /// Maximum element count of a single tensor.
    pub max_elements: u64,
}

/// Host callback interning an atom: receives a NUL-terminated name and the
/// `user_data` given at load, returns the host term.
pub type NumyAtomFn = extern "C" fn(name: *const c_char, user_data: *mut c_void) -> u64;

/// Atoms cached at load.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NumyTerms {
    /// The `ok` atom.
    pub ok: u64,
    /// The `true` atom.
    pub true_term: u64,
    /// The `false` atom.
    pub false_term: u64,
}

/// Registry counters.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NumyRegistryStats {
    /// Tensors ever registered.
    pub allocated: u64,
    /// Tensors destroyed cleanly.
    pub destroyed: u64,
    /// Tensors leaked because their header was corrupt.
    pub leaked: u64,
    /// Tensors currently live.
    pub live: u64,
}

struct CallbackEnv {
    make_atom: NumyAtomFn,
    user_data: *mut c_void,
}

impl HostEnv for CallbackEnv {
    fn make_atom(&self, name: &str) -> Term {
        match CString::new(name) {
            Ok(c) => (self.make_atom)(c.as_ptr(), self.user_data),
            Err(_) => 0,
        }
    }
}

fn with_env<R>(
    make_atom: Option<NumyAtomFn>,
    user_data: *mut c_void,
    f: impl FnOnce(&dyn HostEnv) -> R,
) -> R {
    match make_atom {
        Some(make_atom) => f(&CallbackEnv {
            make_atom,
            user_data,
        }),
        None => f(&StaticTerms),
    }
}

/// Registry of the loaded module.
pub(crate) fn registry() -> Result<Arc<BufferRegistry>, NumyStatus> {
    let slot = CONTEXT.lock().map_err(|_| NumyStatus::InternalError)?;
    slot.as_ref()
        .map(|ctx| Arc::clone(ctx.registry()))
        .ok_or(NumyStatus::NotLoaded)
}

/// Atoms cached by the loaded module.
pub(crate) fn terms() -> Result<CachedTerms, NumyStatus> {
    let slot = CONTEXT.lock().map_err(|_| NumyStatus::InternalError)?;
    slot.as_ref()
        .map(ModuleContext::terms)
        .ok_or(NumyStatus::NotLoaded)
}

// ── FFI functions ───────────────────────────────────────────────

/// Load the module: create the tensor registry and intern atoms.
///
/// `config` may be null for defaults. `make_atom` may be null, in which
/// case `ok` and `false` are 0 and `true` is 1. Fails with `InvalidState`
/// if a module is already loaded.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_load(
    config: *const NumyConfig,
    make_atom: Option<NumyAtomFn>,
    user_data: *mut c_void,
) -> i32 {
    ffi_guard!({
        let config = if config.is_null() {
            RegistryConfig::default()
        } else {
            // SAFETY: non-null config points to a valid NumyConfig.
            let raw = unsafe { *config };
            RegistryConfig::from_raw(raw.max_live_buffers, raw.max_elements)
        };
        let mut slot = ffi_lock!(CONTEXT);
        if slot.is_some() {
            return NumyStatus::InvalidState as i32;
        }
        let ctx = ffi_try!(with_env(make_atom, user_data, |env| ModuleContext::load(env, config)));
        *slot = Some(ctx);
        NumyStatus::Ok as i32
    })
}

/// Hot upgrade: a new context takes over the live registry, so every
/// outstanding tensor handle stays valid. Atoms are re-interned.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_upgrade(make_atom: Option<NumyAtomFn>, user_data: *mut c_void) -> i32 {
    ffi_guard!({
        let mut slot = ffi_lock!(CONTEXT);
        let Some(old) = slot.take() else {
            return NumyStatus::NotLoaded as i32;
        };
        *slot = Some(with_env(make_atom, user_data, |env| {
            ModuleContext::upgrade(&old, env)
        }));
        NumyStatus::Ok as i32
    })
}

/// Unload the module, destroying every tensor still registered.
///
/// `freed_out` (nullable) receives the number of tensors freed.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_unload(freed_out: *mut u64) -> i32 {
    ffi_guard!({
        let Some(ctx) = ffi_lock!(CONTEXT).take() else {
            return NumyStatus::NotLoaded as i32;
        };
        let freed = ffi_try!(ctx.unload());
        // SAFETY: freed_out is null or valid per caller contract.
        unsafe { write_optional(freed_out, freed as u64) };
        NumyStatus::Ok as i32
    })
}

/// Write the library version as a NUL-terminated string into `buf`.
///
/// `len_out` (nullable) receives the length including the terminator.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_version(buf: *mut c_char, cap: usize, len_out: *mut usize) -> i32 {
    ffi_guard!({
        let version = concat!(env!("CARGO_PKG_VERSION"), "\0");
        let bytes: Vec<c_char> = version.bytes().map(|b| b as c_char).collect();
        // SAFETY: buf is valid for cap writes per caller contract.
        ffi_try!(unsafe { copy_to_caller(&bytes, buf, cap, len_out) });
        NumyStatus::Ok as i32
    })
}

/// Install a `tracing` subscriber filtered by the `NUMY_LOG` environment
/// variable (default `warn`). Repeated calls are no-ops.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_init_logging() -> i32 {
    ffi_guard!({
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .is_err()
        {
            warn!("numy_init_logging: a global subscriber is already installed");
        }
        NumyStatus::Ok as i32
    })
}

/// Read the atoms cached at load.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_terms(out: *mut NumyTerms) -> i32 {
    ffi_guard!({
        let t = ffi_try!(terms());
        let value = NumyTerms {
            ok: t.ok,
            true_term: t.true_term,
            false_term: t.false_term,
        };
        // SAFETY: out is valid per caller contract.
        ffi_try!(unsafe { write_out(out, value) });
        NumyStatus::Ok as i32
    })
}

/// Read the registry counters.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_registry_stats(out: *mut NumyRegistryStats) -> i32 {
    ffi_guard!({
        let s = ffi_try!(registry()).stats();
        let value = NumyRegistryStats {
            allocated: s.allocated,
            destroyed: s.destroyed,
            leaked: s.leaked,
            live: s.live as u64,
        };
        // SAFETY: out is valid per caller contract.
        ffi_try!(unsafe { write_out(out, value) });
        NumyStatus::Ok as i32
    })
}

#[cfg(test)]
pub(crate) fn ensure_loaded() {
    let status = numy_load(std::ptr::null(), None, std::ptr::null_mut());
    assert!(status == NumyStatus::Ok as i32 || status == NumyStatus::InvalidState as i32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_round_trip() {
        let mut len = 0usize;
        assert_eq!(
            numy_version(std::ptr::null_mut(), 0, &mut len),
            NumyStatus::BufferTooSmall as i32
        );
        assert_eq!(len, env!("CARGO_PKG_VERSION").len() + 1);

        let mut buf = vec![0 as c_char; len];
        assert_eq!(numy_version(buf.as_mut_ptr(), len, &mut len), 0);
        // SAFETY: buf holds a NUL-terminated string written above.
        #[allow(unsafe_code)]
        let s = unsafe { std::ffi::CStr::from_ptr(buf.as_ptr()) };
        assert_eq!(s.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn logging_init_is_idempotent() {
        assert_eq!(numy_init_logging(), 0);
        assert_eq!(numy_init_logging(), 0);
    }

    #[test]
    fn terms_available_after_load() {
        ensure_loaded();
        let mut t = NumyTerms::default();
        assert_eq!(numy_terms(&mut t), 0);
        assert_eq!(t.true_term, 1);
        assert_eq!(numy_terms(std::ptr::null_mut()), NumyStatus::InvalidArgument as i32);
    }

    #[test]
    fn double_load_is_invalid_state() {
        ensure_loaded();
        assert_eq!(
            numy_load(std::ptr::null(), None, std::ptr::null_mut()),
            NumyStatus::InvalidState as i32
        );
    }
}

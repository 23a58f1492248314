//! C-compatible status codes.
//!
//! [`NumyStatus`] is a `repr(i32)` enum covering every failure the engine
//! reports. Conversions from each crate's error type are provided so FFI
//! bodies can propagate with `ffi_try!`.

use numy_core::TensorError;
use numy_fit::FitError;
use numy_io::PersistError;
use numy_registry::{ConfigError, RegistryError};

/// C-compatible status code returned by all FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumyStatus {
    /// Success.
    Ok = 0,
    /// Handle is invalid or was already destroyed.
    InvalidHandle = -1,
    /// Argument has the wrong type or shape (empty shape, missing key,
    /// non-integer extent).
    BadArgument = -2,
    /// Argument is null, out of range, or otherwise invalid.
    InvalidArgument = -3,
    /// Reduction over an empty buffer.
    EmptyBuffer = -4,
    /// Persisted tensor is truncated or inconsistent.
    CorruptFile = -5,
    /// Storage allocation failed.
    AllocationFailed = -6,
    /// File could not be opened, created or written.
    Io = -7,
    /// No module context is loaded.
    NotLoaded = -8,
    /// Operation not allowed in the current lifecycle state.
    InvalidState = -9,
    /// Numerical kernel failed (singular or rank-deficient system).
    Numerical = -10,
    /// Caller-provided buffer is too small.
    BufferTooSmall = -11,
    /// Configured live-buffer or element limit reached.
    CapacityExceeded = -12,
    /// Configuration validation error.
    ConfigError = -13,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -20,
    /// A tensor header was corrupt; its storage has been leaked.
    MemoryCorruption = -100,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&NumyStatus> for NumyStatus {
    fn from(s: &NumyStatus) -> Self {
        *s
    }
}

impl From<&TensorError> for NumyStatus {
    fn from(e: &TensorError) -> Self {
        match e {
            TensorError::BadArgument { .. } => NumyStatus::BadArgument,
            TensorError::InvalidArgument { .. } => NumyStatus::InvalidArgument,
            TensorError::EmptyBuffer => NumyStatus::EmptyBuffer,
            TensorError::AllocationFailure { .. } => NumyStatus::AllocationFailed,
            TensorError::TagMismatch { .. } => NumyStatus::MemoryCorruption,
            TensorError::Numerical { .. } => NumyStatus::Numerical,
        }
    }
}

impl From<&ConfigError> for NumyStatus {
    fn from(_e: &ConfigError) -> Self {
        NumyStatus::ConfigError
    }
}

impl From<&RegistryError> for NumyStatus {
    fn from(e: &RegistryError) -> Self {
        match e {
            RegistryError::InvalidHandle { .. } => NumyStatus::InvalidHandle,
            RegistryError::MemoryCorruption { .. } => NumyStatus::MemoryCorruption,
            RegistryError::CapacityExceeded { .. } | RegistryError::TooLarge { .. } => {
                NumyStatus::CapacityExceeded
            }
            RegistryError::Tensor(t) => NumyStatus::from(t),
            RegistryError::Config(c) => NumyStatus::from(c),
            RegistryError::Poisoned => NumyStatus::InternalError,
        }
    }
}

impl From<&PersistError> for NumyStatus {
    fn from(e: &PersistError) -> Self {
        match e {
            PersistError::Io(_) => NumyStatus::Io,
            PersistError::CorruptFile { .. } => NumyStatus::CorruptFile,
            PersistError::Tensor(t) => NumyStatus::from(t),
        }
    }
}

impl From<&FitError> for NumyStatus {
    fn from(e: &FitError) -> Self {
        match e {
            FitError::InvalidConfig { .. } => NumyStatus::ConfigError,
            FitError::InvalidState { .. } => NumyStatus::InvalidState,
            FitError::InvalidArgument { .. } => NumyStatus::InvalidArgument,
            FitError::Tensor(t) => NumyStatus::from(t),
        }
    }
}

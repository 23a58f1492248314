//! Registry error type.

use numy_core::TensorError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::handle::BufferHandle;

/// Failures of registry and module-lifecycle operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The handle was never issued, or its buffer was already destroyed.
    #[error("invalid or stale buffer handle {handle}")]
    InvalidHandle {
        /// The rejected handle.
        handle: BufferHandle,
    },
    /// A registered buffer's header tag was overwritten. Its storage is
    /// leaked rather than freed.
    #[error("memory corruption in buffer {handle}: tag {found:#x}")]
    MemoryCorruption {
        /// The handle whose header was corrupt.
        handle: BufferHandle,
        /// The tag that was found instead of the sentinel.
        found: u64,
    },
    /// The configured live-buffer cap is reached.
    #[error("live buffer limit of {limit} reached")]
    CapacityExceeded {
        /// The configured cap.
        limit: usize,
    },
    /// A buffer exceeds the configured per-buffer element cap.
    #[error("buffer of {elements} elements exceeds limit of {limit}")]
    TooLarge {
        /// Requested element count.
        elements: usize,
        /// The configured cap.
        limit: usize,
    },
    /// Construction or access failed inside the tensor itself.
    #[error(transparent)]
    Tensor(#[from] TensorError),
    /// The registry configuration is invalid.
    #[error("invalid registry config: {0}")]
    Config(#[from] ConfigError),
    /// A lock was poisoned by a panic on another thread.
    #[error("registry lock poisoned")]
    Poisoned,
}

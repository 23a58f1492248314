//! Error types for tensor construction and element access.
//!
//! Each variant corresponds to one entry of the engine-wide failure
//! taxonomy. Higher layers (registry, persistence, fitting) wrap
//! [`TensorError`] in their own enums and the FFI crate maps every one of
//! them onto a stable status code.

use thiserror::Error;

/// Errors raised while constructing or accessing a [`Tensor`](crate::Tensor).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TensorError {
    /// Wrong type or shape of an argument coming from the host boundary
    /// (empty shape, non-positive extent, missing `shape` key).
    #[error("bad argument: {reason}")]
    BadArgument {
        /// Human-readable description of the rejected input.
        reason: String,
    },
    /// A structurally valid argument whose value is out of range
    /// (zero stride, index past the end, rank or size overflow).
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Human-readable description of the rejected value.
        reason: String,
    },
    /// A reduction that needs at least one element saw none.
    #[error("operation requires a non-empty buffer")]
    EmptyBuffer,
    /// The allocator could not provide storage for the tensor payload.
    #[error("failed to allocate {bytes} bytes of tensor storage")]
    AllocationFailure {
        /// Number of payload bytes requested.
        bytes: usize,
    },
    /// The header sentinel does not match [`TENSOR_TAG`](crate::TENSOR_TAG).
    #[error("tensor tag mismatch: found {found:#x}")]
    TagMismatch {
        /// The tag value that was found.
        found: u64,
    },
    /// A numerical kernel could not produce a result (e.g. singular system).
    #[error("numerical failure: {reason}")]
    Numerical {
        /// Description of the failure.
        reason: String,
    },
}

impl TensorError {
    /// Shorthand for [`TensorError::BadArgument`].
    pub fn bad_argument(reason: impl Into<String>) -> Self {
        Self::BadArgument {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`TensorError::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

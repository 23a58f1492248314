//! Persistence error type.

use std::io;

use numy_core::TensorError;
use thiserror::Error;

/// Failures while saving or loading a tensor.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The file could not be opened, created, written or flushed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The stream ended early or its header is inconsistent.
    #[error("corrupt tensor file: {reason}")]
    CorruptFile {
        /// What failed validation.
        reason: String,
    },
    /// The decoded tensor could not be materialised.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

impl PersistError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptFile {
            reason: reason.into(),
        }
    }

    /// Classify a read failure: truncation means a corrupt file, anything
    /// else is a genuine I/O error.
    pub(crate) fn from_read(e: io::Error, what: &str) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Self::corrupt(format!("truncated while reading {what}"))
        } else {
            Self::Io(e)
        }
    }
}

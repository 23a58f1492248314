//! Fitting error type.

use numy_core::TensorError;
use thiserror::Error;

use crate::fitter::FitState;

/// Failures of spline configuration, knot placement, fitting or evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FitError {
    /// Order and coefficient count do not describe a usable basis.
    #[error("invalid spline config: {reason}")]
    InvalidConfig {
        /// Which constraint failed.
        reason: String,
    },
    /// The operation is not allowed in the fitter's current state.
    #[error("{operation} not allowed in state {state:?}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// State the fitter was in.
        state: FitState,
    },
    /// Sample data or an evaluation point was rejected.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the input.
        reason: String,
    },
    /// The least-squares kernel failed, e.g. on a rank-deficient design.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

impl FitError {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

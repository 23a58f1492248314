//! Smoothing B-spline fits.
//!
//! The abscissa range is split into uniformly spaced breakpoints, turned
//! into a clamped knot vector, and a weighted least-squares fit of the
//! resulting basis to `(x, y, w)` samples yields coefficients, their
//! covariance and goodness-of-fit statistics. The curve need not pass
//! through any sample.
//!
//! - [`BSplineBasis`]: knot vector and Cox–de Boor evaluation
//! - [`SplineFitter`]: `Initialized → KnotsPlaced → Fitted` state machine
//! - [`SplineConfig`]: order and coefficient count

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bspline;
pub mod config;
pub mod error;
pub mod fitter;

pub use bspline::BSplineBasis;
pub use config::{SplineConfig, DEFAULT_ORDER, MAX_COEFFICIENTS, MAX_ORDER};
pub use error::FitError;
pub use fitter::{FitState, SplineFitResult, SplineFitter};

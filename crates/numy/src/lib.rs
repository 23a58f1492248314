//! numy: a native tensor engine for host runtimes.
//!
//! This is the facade crate that re-exports the public API of the numy
//! sub-crates. Hosts that link through C use `numy-ffi` instead.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use numy::prelude::*;
//!
//! let registry = Arc::new(BufferRegistry::new(RegistryConfig::default())?);
//!
//! // A host-held tensor: the last clone to drop frees it exactly once.
//! let v = TensorResource::adopt(&registry, Tensor::from_slice(&[3.0, 1.0, 2.0])?)?;
//! v.with_mut(|t| numy::ops::sort(t.data_mut()))?;
//! assert_eq!(v.with(|t| t.data().to_vec())?, vec![1.0, 2.0, 3.0]);
//!
//! // Fit a cubic B-spline to a straight line.
//! let x: Vec<f64> = (0..30).map(|i| i as f64 / 10.0).collect();
//! let y: Vec<f64> = x.iter().map(|v| 2.0 * v - 1.0).collect();
//! let mut fitter = SplineFitter::new(SplineConfig::new(6))?;
//! fitter.place_uniform_knots(0.0, 2.9)?;
//! let fit = fitter.fit(&x, &y, None)?;
//! assert!((fit.r_squared - 1.0).abs() < 1e-9);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `numy-core` | `Tensor`, `Shape`, construction arguments, `TensorError` |
//! | [`ops`] | `numy-ops` | Array algorithms, set algebra, BLAS helpers, least squares |
//! | [`registry`] | `numy-registry` | Handle registry, host resources, module context |
//! | [`io`] | `numy-io` | Binary tensor persistence |
//! | [`fit`] | `numy-fit` | B-spline basis and weighted fitting |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Tensor and shape types (`numy-core`).
pub use numy_core as types;

/// Array operations over `f64` slices (`numy-ops`).
///
/// Includes [`ops::least_squares`] for dense overdetermined systems.
pub use numy_ops as ops;

/// Handle registry and host-facing resources (`numy-registry`).
///
/// [`registry::BufferRegistry`] owns every live tensor;
/// [`registry::TensorResource`] ties one to host reference counting.
pub use numy_registry as registry;

/// Tensor persistence (`numy-io`).
pub use numy_io as io;

/// B-spline fitting (`numy-fit`).
pub use numy_fit as fit;

/// Common imports for typical numy usage.
///
/// ```rust
/// use numy::prelude::*;
/// ```
pub mod prelude {
    // Tensors
    pub use numy_core::{ConstructArgs, Shape, Tensor, MAX_RANK};

    // Registry
    pub use numy_registry::{
        BufferHandle, BufferRegistry, ModuleContext, RegistryConfig, TensorResource,
    };

    // Fitting
    pub use numy_fit::{FitState, SplineConfig, SplineFitResult, SplineFitter};

    // Errors
    pub use numy_core::TensorError;
    pub use numy_fit::FitError;
    pub use numy_io::PersistError;
    pub use numy_registry::RegistryError;
}

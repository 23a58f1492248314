//! Stateless array algorithms for numy tensors.
//!
//! Every function works on plain `f64` slices so it can be driven from a
//! resolved [`Tensor`](numy_core::Tensor) payload, a host-owned buffer, or a
//! test vector alike. Binary operations run over the shorter of the two
//! operands and report how many elements they touched.
//!
//! # Modules
//!
//! - [`elementwise`]: in-place arithmetic, scalar transforms, `dot`, `axpby`
//! - [`reduce`]: sums, extrema, tolerant equality, search
//! - [`order`]: sort and reverse
//! - [`range`]: strided copies and range swaps
//! - [`set`]: merge-based set algebra over sorted sequences
//! - [`blas`]: level-1 BLAS style helpers (`drotg`, `dcopy`)
//! - [`linalg`]: Householder QR least squares and covariance

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod blas;
pub mod elementwise;
pub mod linalg;
pub mod order;
pub mod range;
pub mod reduce;
pub mod set;

pub use blas::{dcopy, drotg, GivensRotation};
pub use elementwise::{
    add, axpby, div, dot, heaviside, mul, negate, offset, scale, sigmoid, sub,
};
pub use linalg::{covariance_from_r, least_squares, upper_triangular_inverse, LeastSquares};
pub use order::{reverse, sort};
pub use range::{copy_range, swap_ranges, swap_ranges_within, StridedRange};
pub use reduce::{equal, find, max, max_index, min, min_index, sum};
pub use set::{set_op, SetOp};

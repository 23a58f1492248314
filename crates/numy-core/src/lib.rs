//! Core types for the numy tensor engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! dense numeric buffer ([`Tensor`]), its validated [`Shape`], and the
//! [`TensorError`] type shared by the rest of the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod shape;
pub mod tensor;

pub use error::TensorError;
pub use shape::{ArgValue, ConstructArgs, Shape, MAX_RANK};
pub use tensor::{Tensor, ELEMENT_SIZE, TENSOR_TAG};

//! Binary persistence for numy tensors.
//!
//! - [`codec`] encodes and decodes the format on any `Read`/`Write`
//! - [`save`] and [`load`] apply it to files
//!
//! # Format
//!
//! ```text
//! [tag u64] [rank u32] [shape 32 x u32] [element_count u32] [byte_size u32]
//! [payload: element_count x f64]
//! ```
//!
//! All fields are little-endian. Shape slots past `rank` are zero. The
//! header is always [`HEADER_LEN`] bytes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod file;

pub use codec::{read_payload, read_tensor, write_tensor, TensorHeader};
pub use error::PersistError;
pub use file::{load, open, save, PendingLoad};

/// Encoded header size in bytes.
pub const HEADER_LEN: usize = 8 + 4 + 4 * numy_core::MAX_RANK + 4 + 4;

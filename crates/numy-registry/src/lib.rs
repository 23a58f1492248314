//! Ownership bookkeeping for natively allocated numy tensors.
//!
//! A host runtime never sees a [`Tensor`](numy_core::Tensor) directly: it
//! holds a [`BufferHandle`] issued by a [`BufferRegistry`], or a
//! [`TensorResource`] that destroys its buffer exactly once when the last
//! clone is dropped. [`ModuleContext`] ties a registry to a loaded module
//! instance and survives hot upgrades.
//!
//! [`TensorResource`] is the release path for Rust hosts. Hosts linking
//! through the C ABI keep raw handles and release each one with
//! `numy_tensor_destroy`, typically from their own garbage-collector
//! finalizer; the registry guarantees that destroy frees a buffer once.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod error;
pub mod handle;
pub mod registry;
pub mod resource;

pub use config::{ConfigError, RegistryConfig};
pub use context::{CachedTerms, HostEnv, ModuleContext, StaticTerms, Term, RESOURCE_TYPE_NAME};
pub use error::RegistryError;
pub use handle::{BufferHandle, HandleTable};
pub use registry::{BufferRegistry, PairMut, RegistryStats, TensorCell};
pub use resource::TensorResource;

//! Test fixtures for numy development.
//!
//! Deterministic tensors, sample sets and permutations shared by the unit,
//! integration and benchmark suites, plus a [`TestRegistryBuilder`] for
//! registries with preconfigured limits and contents.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Arc;

use numy_core::{Shape, Tensor};
use numy_registry::{BufferHandle, BufferRegistry, RegistryConfig};

pub use fixtures::{linear_samples, noisy_samples, permutation, quadratic_samples, Samples};

/// Builder for registries pre-populated with ramp tensors.
#[derive(Default)]
pub struct TestRegistryBuilder {
    config: RegistryConfig,
    shapes: Vec<Vec<i64>>,
}

impl TestRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_live_buffers(mut self, limit: usize) -> Self {
        self.config.max_live_buffers = Some(limit);
        self
    }

    pub fn max_elements(mut self, limit: usize) -> Self {
        self.config.max_elements = Some(limit);
        self
    }

    /// Register a ramp tensor of the given extents at build time.
    pub fn with_tensor(mut self, dims: &[i64]) -> Self {
        self.shapes.push(dims.to_vec());
        self
    }

    /// Build the registry. Panics if a fixture shape is invalid.
    pub fn build(self) -> (Arc<BufferRegistry>, Vec<BufferHandle>) {
        let registry = Arc::new(BufferRegistry::new(self.config).unwrap());
        let handles = self
            .shapes
            .iter()
            .map(|dims| registry.insert(ramp_tensor(dims)).unwrap())
            .collect();
        (registry, handles)
    }
}

/// Tensor of the given extents holding `0, 1, 2, ...` in storage order.
pub fn ramp_tensor(dims: &[i64]) -> Tensor {
    let shape = Shape::new(dims).unwrap();
    let data = (0..shape.element_count()).map(|i| i as f64).collect();
    Tensor::from_parts(shape, data).unwrap()
}

/// Vector tensor holding `values`.
pub fn vector(values: &[f64]) -> Tensor {
    Tensor::from_slice(values).unwrap()
}

//! Reference-counted host references to registered tensors.

use std::sync::Arc;

use numy_core::{Shape, Tensor};
use tracing::debug;

use crate::error::RegistryError;
use crate::handle::BufferHandle;
use crate::registry::BufferRegistry;

struct ResourceInner {
    registry: Arc<BufferRegistry>,
    handle: BufferHandle,
}

impl Drop for ResourceInner {
    fn drop(&mut self) {
        // destroy() already logs stale handles and corruption.
        if let Err(e) = self.registry.destroy(self.handle) {
            debug!(handle = %self.handle, error = %e, "resource release did not free a buffer");
        }
    }
}

/// A host-side reference to one registered tensor.
///
/// Clones share a single reference count. When the last clone is dropped
/// the buffer is destroyed through its registry, exactly once.
///
/// For Rust hosts only; C hosts hold bare handles and call
/// `numy_tensor_destroy` themselves.
#[derive(Clone)]
pub struct TensorResource {
    inner: Arc<ResourceInner>,
}

impl TensorResource {
    /// Allocate a zeroed tensor in `registry` and wrap it.
    pub fn create(registry: &Arc<BufferRegistry>, shape: Shape) -> Result<Self, RegistryError> {
        let handle = registry.allocate(shape)?;
        Ok(Self::wrap(registry, handle))
    }

    /// Register `tensor` in `registry` and wrap it.
    pub fn adopt(registry: &Arc<BufferRegistry>, tensor: Tensor) -> Result<Self, RegistryError> {
        let handle = registry.insert(tensor)?;
        Ok(Self::wrap(registry, handle))
    }

    fn wrap(registry: &Arc<BufferRegistry>, handle: BufferHandle) -> Self {
        Self {
            inner: Arc::new(ResourceInner {
                registry: Arc::clone(registry),
                handle,
            }),
        }
    }

    /// Handle of the underlying buffer.
    pub fn handle(&self) -> BufferHandle {
        self.inner.handle
    }

    /// The registry that owns the buffer.
    pub fn registry(&self) -> &Arc<BufferRegistry> {
        &self.inner.registry
    }

    /// Number of live clones of this reference.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Run `f` on a shared view of the tensor.
    pub fn with<R>(&self, f: impl FnOnce(&Tensor) -> R) -> Result<R, RegistryError> {
        self.inner.registry.with_tensor(self.inner.handle, f)
    }

    /// Run `f` on an exclusive view of the tensor.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Tensor) -> R) -> Result<R, RegistryError> {
        self.inner.registry.with_tensor_mut(self.inner.handle, f)
    }
}

impl std::fmt::Debug for TensorResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensorResource")
            .field("handle", &self.inner.handle)
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_clone_destroys_once() {
        let reg = Arc::new(BufferRegistry::default());
        let r1 = TensorResource::create(&reg, Shape::vector(3).unwrap()).unwrap();
        let h = r1.handle();
        let r2 = r1.clone();
        let r3 = r2.clone();
        assert_eq!(r1.ref_count(), 3);

        drop(r1);
        drop(r3);
        assert!(reg.contains(h));
        assert_eq!(reg.stats().destroyed, 0);

        drop(r2);
        assert!(!reg.contains(h));
        assert_eq!(reg.stats().destroyed, 1);
    }

    #[test]
    fn clones_see_the_same_payload() {
        let reg = Arc::new(BufferRegistry::default());
        let r = TensorResource::adopt(&reg, Tensor::from_slice(&[1.0, 2.0]).unwrap()).unwrap();
        let alias = r.clone();
        r.with_mut(|t| t.fill(9.0)).unwrap();
        assert_eq!(alias.with(|t| t.data().to_vec()).unwrap(), vec![9.0, 9.0]);
    }

    #[test]
    fn explicit_destroy_before_drop_is_tolerated() {
        let reg = Arc::new(BufferRegistry::default());
        let r = TensorResource::create(&reg, Shape::vector(1).unwrap()).unwrap();
        reg.destroy(r.handle()).unwrap();
        assert!(matches!(
            r.with(|_| ()),
            Err(RegistryError::InvalidHandle { .. })
        ));
        drop(r);
        assert_eq!(reg.stats().destroyed, 1);
    }
}

//! The buffer registry: handle issue, resolution and single destruction.
//!
//! The handle table sits behind one `Mutex` that is held only to look up,
//! insert or remove an entry. Each tensor has its own `Mutex`, so
//! operations on different buffers run concurrently. Two-operand
//! operations lock their tensors in ascending handle order; a call that
//! names the same handle twice locks it once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use numy_core::{ConstructArgs, Shape, Tensor, TENSOR_TAG};
use tracing::{debug, error, warn};

use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::handle::{BufferHandle, HandleTable};

/// Shared cell holding one registered tensor.
pub type TensorCell = Arc<Mutex<Tensor>>;

/// Counters exposed by [`BufferRegistry::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Buffers ever registered.
    pub allocated: u64,
    /// Buffers destroyed cleanly.
    pub destroyed: u64,
    /// Buffers found corrupt on destroy and leaked.
    pub leaked: u64,
    /// Buffers currently live.
    pub live: usize,
}

/// The two operands of a pairwise operation, after locking.
pub enum PairMut<'a> {
    /// Two distinct buffers.
    Distinct(&'a mut Tensor, &'a mut Tensor),
    /// Both operands name the same buffer.
    Same(&'a mut Tensor),
}

/// Owner of every live tensor, addressed by [`BufferHandle`].
pub struct BufferRegistry {
    table: Mutex<HandleTable<TensorCell>>,
    config: RegistryConfig,
    allocated: AtomicU64,
    destroyed: AtomicU64,
    leaked: AtomicU64,
}

fn lock_cell(cell: &TensorCell) -> Result<MutexGuard<'_, Tensor>, RegistryError> {
    cell.lock().map_err(|_| RegistryError::Poisoned)
}

fn check_header(tensor: &Tensor, handle: BufferHandle) -> Result<(), RegistryError> {
    if tensor.tag() == TENSOR_TAG {
        return Ok(());
    }
    error!(%handle, found = tensor.tag(), "tensor header corrupt");
    Err(RegistryError::MemoryCorruption {
        handle,
        found: tensor.tag(),
    })
}

impl BufferRegistry {
    /// Create an empty registry after validating `config`.
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        config.validate()?;
        Ok(Self {
            table: Mutex::new(HandleTable::new()),
            config,
            allocated: AtomicU64::new(0),
            destroyed: AtomicU64::new(0),
            leaked: AtomicU64::new(0),
        })
    }

    /// The limits this registry enforces.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn table(&self) -> Result<MutexGuard<'_, HandleTable<TensorCell>>, RegistryError> {
        self.table.lock().map_err(|_| RegistryError::Poisoned)
    }

    /// Whether a buffer of `elements` fits the per-buffer element cap.
    ///
    /// Lets callers reject an oversized tensor before building it.
    pub fn check_size(&self, elements: usize) -> Result<(), RegistryError> {
        match self.config.max_elements {
            Some(limit) if elements > limit => Err(RegistryError::TooLarge { elements, limit }),
            _ => Ok(()),
        }
    }

    /// Allocate a zeroed tensor for `shape` and register it.
    pub fn allocate(&self, shape: Shape) -> Result<BufferHandle, RegistryError> {
        self.check_size(shape.element_count())?;
        let tensor = Tensor::new(shape)?;
        self.insert(tensor)
    }

    /// Validate a host construction map and allocate.
    pub fn allocate_from_args(&self, args: &ConstructArgs) -> Result<BufferHandle, RegistryError> {
        self.allocate(args.shape()?)
    }

    /// Register an already built tensor.
    pub fn insert(&self, tensor: Tensor) -> Result<BufferHandle, RegistryError> {
        tensor.check_tag()?;
        let elements = tensor.element_count();
        self.check_size(elements)?;
        let handle = {
            let mut table = self.table()?;
            if let Some(limit) = self.config.max_live_buffers {
                if table.len() >= limit {
                    return Err(RegistryError::CapacityExceeded { limit });
                }
            }
            table.insert(Arc::new(Mutex::new(tensor)))
        };
        self.allocated.fetch_add(1, Ordering::Relaxed);
        debug!(%handle, elements, "tensor registered");
        Ok(handle)
    }

    /// The cell behind a live handle.
    ///
    /// The returned `Arc` keeps the storage alive even if the handle is
    /// destroyed while the caller still holds it.
    pub fn resolve(&self, handle: BufferHandle) -> Result<TensorCell, RegistryError> {
        self.table()?
            .get(handle)
            .cloned()
            .ok_or(RegistryError::InvalidHandle { handle })
    }

    /// Whether `handle` currently names a live buffer.
    pub fn contains(&self, handle: BufferHandle) -> bool {
        self.table()
            .map(|t| t.get(handle).is_some())
            .unwrap_or(false)
    }

    /// Run `f` on a shared view of the tensor behind `handle`.
    pub fn with_tensor<R>(
        &self,
        handle: BufferHandle,
        f: impl FnOnce(&Tensor) -> R,
    ) -> Result<R, RegistryError> {
        let cell = self.resolve(handle)?;
        let guard = lock_cell(&cell)?;
        check_header(&guard, handle)?;
        Ok(f(&guard))
    }

    /// Run `f` on an exclusive view of the tensor behind `handle`.
    pub fn with_tensor_mut<R>(
        &self,
        handle: BufferHandle,
        f: impl FnOnce(&mut Tensor) -> R,
    ) -> Result<R, RegistryError> {
        let cell = self.resolve(handle)?;
        let mut guard = lock_cell(&cell)?;
        check_header(&guard, handle)?;
        Ok(f(&mut guard))
    }

    /// Lock both operands of a pairwise operation and hand them to `f`.
    ///
    /// Distinct buffers are locked in ascending handle order, so two
    /// threads running `(a, b)` and `(b, a)` cannot deadlock. The operands
    /// are passed to `f` in argument order regardless.
    pub fn with_pair<R>(
        &self,
        a: BufferHandle,
        b: BufferHandle,
        f: impl FnOnce(PairMut<'_>) -> R,
    ) -> Result<R, RegistryError> {
        if a == b {
            let cell = self.resolve(a)?;
            let mut guard = lock_cell(&cell)?;
            check_header(&guard, a)?;
            return Ok(f(PairMut::Same(&mut *guard)));
        }
        let cell_a = self.resolve(a)?;
        let cell_b = self.resolve(b)?;
        let (first, second) = if a < b {
            (&cell_a, &cell_b)
        } else {
            (&cell_b, &cell_a)
        };
        let mut g1 = lock_cell(first)?;
        let mut g2 = lock_cell(second)?;
        let (ta, tb) = if a < b {
            (&mut *g1, &mut *g2)
        } else {
            (&mut *g2, &mut *g1)
        };
        check_header(ta, a)?;
        check_header(tb, b)?;
        Ok(f(PairMut::Distinct(ta, tb)))
    }

    /// Pairwise operation that mutates `a` and reads `b`.
    ///
    /// When both handles are equal, `b` is a snapshot taken before `f`
    /// runs, so `f` sees the original operand values throughout.
    pub fn with_operands<R>(
        &self,
        a: BufferHandle,
        b: BufferHandle,
        f: impl FnOnce(&mut Tensor, &Tensor) -> R,
    ) -> Result<R, RegistryError> {
        self.with_pair(a, b, |pair| match pair {
            PairMut::Distinct(x, y) => f(x, y),
            PairMut::Same(x) => {
                let snapshot = x.clone();
                f(x, &snapshot)
            }
        })
    }

    /// Remove and free the buffer behind `handle`, exactly once.
    ///
    /// A second call with the same handle is [`RegistryError::InvalidHandle`].
    /// If the header tag is wrong the buffer is leaked, never freed, and
    /// [`RegistryError::MemoryCorruption`] is returned.
    pub fn destroy(&self, handle: BufferHandle) -> Result<(), RegistryError> {
        let removed = self.table()?.remove(handle);
        let Some(cell) = removed else {
            warn!(%handle, "destroy of stale or unknown handle");
            return Err(RegistryError::InvalidHandle { handle });
        };
        let found = match cell.lock() {
            Ok(t) => t.tag(),
            Err(poisoned) => poisoned.into_inner().tag(),
        };
        if found != TENSOR_TAG {
            error!(%handle, found, "tensor header corrupt on destroy; leaking storage");
            self.leaked.fetch_add(1, Ordering::Relaxed);
            std::mem::forget(cell);
            return Err(RegistryError::MemoryCorruption { handle, found });
        }
        self.destroyed.fetch_add(1, Ordering::Relaxed);
        debug!(%handle, "tensor destroyed");
        Ok(())
    }

    /// Destroy every live buffer. Returns how many were freed cleanly;
    /// corrupt buffers are leaked and logged.
    pub fn destroy_all(&self) -> Result<usize, RegistryError> {
        let handles = self.table()?.handles();
        let mut freed = 0;
        for handle in handles {
            match self.destroy(handle) {
                Ok(()) => freed += 1,
                Err(RegistryError::MemoryCorruption { .. } | RegistryError::InvalidHandle { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(freed)
    }

    /// Number of live buffers.
    pub fn live_count(&self) -> Result<usize, RegistryError> {
        Ok(self.table()?.len())
    }

    /// Snapshot of the allocation counters.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            allocated: self.allocated.load(Ordering::Relaxed),
            destroyed: self.destroyed.load(Ordering::Relaxed),
            leaked: self.leaked.load(Ordering::Relaxed),
            live: self.live_count().unwrap_or(0),
        }
    }
}

impl Default for BufferRegistry {
    fn default() -> Self {
        Self {
            table: Mutex::new(HandleTable::new()),
            config: RegistryConfig::default(),
            allocated: AtomicU64::new(0),
            destroyed: AtomicU64::new(0),
            leaked: AtomicU64::new(0),
        }
    }
}

impl std::fmt::Debug for BufferRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferRegistry")
            .field("config", self.config())
            .field("stats", &self.stats())
            .finish()
    }
}

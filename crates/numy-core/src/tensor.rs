//! The dense numeric buffer.
//!
//! A [`Tensor`] owns a zero-initialised, row-major `f64` payload described
//! by a validated [`Shape`]. The header carries a sentinel tag so that code
//! receiving a tensor through an opaque handle can detect type confusion
//! or a corrupted header before touching the payload.

use crate::error::TensorError;
use crate::shape::{Shape, MAX_RANK};

/// Sentinel stored in every live tensor header.
pub const TENSOR_TAG: u64 = 0xbadc_01dc_0ffe;

/// Size in bytes of one tensor element.
pub const ELEMENT_SIZE: usize = std::mem::size_of::<f64>();

/// A dense, shape-tagged, exclusively owned `f64` buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    tag: u64,
    shape: Shape,
    data: Vec<f64>,
}

impl Tensor {
    /// Allocate a zero-filled tensor for `shape`.
    ///
    /// Performs exactly one allocation. Returns
    /// [`TensorError::AllocationFailure`] instead of aborting when the
    /// allocator refuses the request.
    pub fn new(shape: Shape) -> Result<Self, TensorError> {
        let n = shape.element_count();
        let mut data = Vec::new();
        data.try_reserve_exact(n)
            .map_err(|_| TensorError::AllocationFailure {
                bytes: shape.byte_size(),
            })?;
        data.resize(n, 0.0);
        Ok(Self {
            tag: TENSOR_TAG,
            shape,
            data,
        })
    }

    /// Validate `dims` and allocate in one step.
    pub fn from_dims(dims: &[i64]) -> Result<Self, TensorError> {
        Self::new(Shape::new(dims)?)
    }

    /// A one-dimensional tensor holding a copy of `values`.
    ///
    /// Empty input is rejected: a tensor always has at least one element.
    pub fn from_slice(values: &[f64]) -> Result<Self, TensorError> {
        let mut t = Self::new(Shape::vector(values.len())?)?;
        t.data.copy_from_slice(values);
        Ok(t)
    }

    /// Adopt an existing payload. `data.len()` must equal the shape's
    /// element count.
    pub fn from_parts(shape: Shape, data: Vec<f64>) -> Result<Self, TensorError> {
        if data.len() != shape.element_count() {
            return Err(TensorError::invalid_argument(format!(
                "payload has {} elements, shape requires {}",
                data.len(),
                shape.element_count()
            )));
        }
        Ok(Self {
            tag: TENSOR_TAG,
            shape,
            data,
        })
    }

    /// The header sentinel.
    pub fn tag(&self) -> u64 {
        self.tag
    }

    /// Fails with [`TensorError::TagMismatch`] unless the header carries
    /// [`TENSOR_TAG`].
    pub fn check_tag(&self) -> Result<(), TensorError> {
        if self.tag == TENSOR_TAG {
            Ok(())
        } else {
            Err(TensorError::TagMismatch { found: self.tag })
        }
    }

    /// Whether the header is consistent: correct tag, `0 < rank < MAX_RANK`,
    /// and a payload of exactly `element_count` elements.
    pub fn is_valid(&self) -> bool {
        let rank = self.shape.rank();
        self.tag == TENSOR_TAG
            && rank > 0
            && rank < MAX_RANK
            && self.data.len() == self.shape.element_count()
    }

    /// Overwrite the header tag.
    ///
    /// Exists so corruption handling can be exercised from tests in other
    /// crates; nothing in the engine calls it.
    #[doc(hidden)]
    pub fn overwrite_tag(&mut self, tag: u64) {
        self.tag = tag;
    }

    /// The validated shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Total number of elements.
    pub fn element_count(&self) -> usize {
        self.data.len()
    }

    /// Payload size in bytes.
    pub fn byte_size(&self) -> usize {
        self.shape.byte_size()
    }

    /// Column count of the 2-D view: the first extent.
    pub fn nr_cols(&self) -> usize {
        self.shape.dims()[0] as usize
    }

    /// Row count of the 2-D view: 1 for vectors, otherwise the second extent.
    pub fn nr_rows(&self) -> usize {
        match self.shape.dims() {
            [_] => 1,
            [_, rows, ..] => *rows as usize,
            [] => 0,
        }
    }

    /// Read-only payload.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable payload.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the tensor, returning its payload.
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Set every element to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Leading elements for export to the host.
    ///
    /// `None` or a zero limit returns the whole payload; otherwise at most
    /// `max_count` elements.
    pub fn read(&self, max_count: Option<usize>) -> &[f64] {
        match max_count {
            Some(n) if n > 0 => &self.data[..n.min(self.data.len())],
            _ => &self.data,
        }
    }

    /// Copy `values` into the leading elements; extra input is ignored.
    /// Returns the number of elements written.
    pub fn assign(&mut self, values: &[f64]) -> usize {
        let n = values.len().min(self.data.len());
        self.data[..n].copy_from_slice(&values[..n]);
        n
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Result<f64, TensorError> {
        self.data.get(index).copied().ok_or_else(|| {
            TensorError::invalid_argument(format!(
                "index {index} out of bounds for {} elements",
                self.data.len()
            ))
        })
    }

    /// Overwrite the element at `index`.
    pub fn set(&mut self, index: usize, value: f64) -> Result<(), TensorError> {
        let len = self.data.len();
        let slot = self.data.get_mut(index).ok_or_else(|| {
            TensorError::invalid_argument(format!("index {index} out of bounds for {len} elements"))
        })?;
        *slot = value;
        Ok(())
    }

    /// Raw copy of `min(self.byte_size, src.byte_size)` bytes from `src`.
    /// Returns the number of bytes copied.
    pub fn copy_all_from(&mut self, src: &Tensor) -> usize {
        let n = self.data.len().min(src.data.len());
        self.data[..n].copy_from_slice(&src.data[..n]);
        n * ELEMENT_SIZE
    }
}

//! Validated tensor shapes and the host-side construction arguments.
//!
//! A [`Shape`] can only be obtained through a fallible constructor that
//! checks every extent and the element-count arithmetic before anything is
//! allocated. Nothing downstream accepts a partially validated shape.

use smallvec::SmallVec;

use crate::error::TensorError;
use crate::tensor::ELEMENT_SIZE;

/// Number of extent slots in a tensor header. Valid tensors have a rank
/// strictly below this value.
pub const MAX_RANK: usize = 32;

/// Ordered per-dimension extents of a tensor.
///
/// Invariants (enforced by [`Shape::new`]): `1 <= rank < MAX_RANK`, every
/// extent is positive, and both the element count and the payload size in
/// bytes fit in a `u32`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: SmallVec<[u32; 4]>,
    element_count: u32,
}

impl Shape {
    /// Validate raw extents coming from an untrusted source.
    ///
    /// Empty input and non-positive extents are [`TensorError::BadArgument`];
    /// too many dimensions or an element count whose byte size overflows
    /// `u32` are [`TensorError::InvalidArgument`].
    pub fn new(dims: &[i64]) -> Result<Self, TensorError> {
        if dims.is_empty() {
            return Err(TensorError::bad_argument("shape must not be empty"));
        }
        if dims.len() >= MAX_RANK {
            return Err(TensorError::invalid_argument(format!(
                "rank {} exceeds the maximum of {}",
                dims.len(),
                MAX_RANK - 1
            )));
        }

        let mut extents: SmallVec<[u32; 4]> = SmallVec::with_capacity(dims.len());
        let mut count: u32 = 1;
        for (axis, &d) in dims.iter().enumerate() {
            if d <= 0 {
                return Err(TensorError::bad_argument(format!(
                    "extent {d} on axis {axis} is not positive"
                )));
            }
            let extent = u32::try_from(d).map_err(|_| {
                TensorError::invalid_argument(format!("extent {d} on axis {axis} overflows u32"))
            })?;
            count = count.checked_mul(extent).ok_or_else(|| {
                TensorError::invalid_argument("element count overflows u32".to_string())
            })?;
            extents.push(extent);
        }

        if count.checked_mul(ELEMENT_SIZE as u32).is_none() {
            return Err(TensorError::invalid_argument(format!(
                "{count} elements overflow the u32 byte size"
            )));
        }

        Ok(Self {
            dims: extents,
            element_count: count,
        })
    }

    /// Convenience constructor for already-unsigned extents.
    pub fn from_extents(extents: &[u32]) -> Result<Self, TensorError> {
        let dims: SmallVec<[i64; 4]> = extents.iter().map(|&e| i64::from(e)).collect();
        Self::new(&dims)
    }

    /// One-dimensional shape of `len` elements.
    pub fn vector(len: usize) -> Result<Self, TensorError> {
        let len = i64::try_from(len)
            .map_err(|_| TensorError::invalid_argument(format!("length {len} overflows")))?;
        Self::new(&[len])
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// The extents as a slice.
    pub fn dims(&self) -> &[u32] {
        &self.dims
    }

    /// Product of all extents.
    pub fn element_count(&self) -> usize {
        self.element_count as usize
    }

    /// Payload size in bytes (`element_count * 8`).
    pub fn byte_size(&self) -> usize {
        self.element_count() * ELEMENT_SIZE
    }
}

/// A value inside a host construction map.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    /// Host integer.
    Int(i64),
    /// Host float.
    Float(f64),
    /// Host atom or symbol.
    Atom(String),
    /// Ordered host sequence.
    List(Vec<ArgValue>),
}

/// The structured map passed to tensor construction.
///
/// Exactly one key is required: `"shape"`, a non-empty list of positive
/// integers. Other keys are ignored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstructArgs {
    entries: Vec<(String, ArgValue)>,
}

impl ConstructArgs {
    /// An empty argument map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the common `%{shape: [...]}` map.
    pub fn with_shape(dims: &[i64]) -> Self {
        Self::new().with(
            "shape",
            ArgValue::List(dims.iter().map(|&d| ArgValue::Int(d)).collect()),
        )
    }

    /// Insert or replace an entry.
    pub fn with(mut self, key: impl Into<String>, value: ArgValue) -> Self {
        let key = key.into();
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, value));
        self
    }

    /// Look up an entry by key.
    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Number of entries in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Extract and validate the `"shape"` entry.
    pub fn shape(&self) -> Result<Shape, TensorError> {
        if self.is_empty() {
            return Err(TensorError::bad_argument("construction map is empty"));
        }
        let value = self
            .get("shape")
            .ok_or_else(|| TensorError::bad_argument("missing required key \"shape\""))?;
        let ArgValue::List(items) = value else {
            return Err(TensorError::bad_argument("\"shape\" must be a list"));
        };
        let mut dims: SmallVec<[i64; 4]> = SmallVec::with_capacity(items.len());
        for item in items {
            match item {
                ArgValue::Int(d) => dims.push(*d),
                other => {
                    return Err(TensorError::bad_argument(format!(
                        "shape entries must be integers, got {other:?}"
                    )))
                }
            }
        }
        Shape::new(&dims)
    }
}

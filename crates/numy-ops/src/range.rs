//! Strided copies and range swaps with externally supplied geometry.
//!
//! Offsets, strides and counts arrive from the host and are never trusted:
//! every operation clamps to what both buffers can actually provide and
//! reports the amount of work really done instead of failing on a partial
//! overlap.

use numy_core::TensorError;

/// Start position and step of a strided walk through a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StridedRange {
    /// Index of the first visited element.
    pub offset: usize,
    /// Distance between visited elements. Must be non-zero.
    pub stride: usize,
}

impl StridedRange {
    /// Build a range, rejecting a zero stride.
    pub fn new(offset: usize, stride: usize) -> Result<Self, TensorError> {
        if stride == 0 {
            return Err(TensorError::invalid_argument("stride must be non-zero"));
        }
        Ok(Self { offset, stride })
    }

    /// Contiguous range starting at `offset`.
    pub fn contiguous(offset: usize) -> Self {
        Self { offset, stride: 1 }
    }

    /// Number of in-bounds positions `offset, offset + stride, ...` in a
    /// buffer of `len` elements.
    pub fn available(&self, len: usize) -> usize {
        if self.stride == 0 || self.offset >= len {
            return 0;
        }
        (len - self.offset).div_ceil(self.stride)
    }

    fn index(&self, i: usize) -> usize {
        self.offset + i * self.stride
    }
}

/// Copy up to `count` elements from `src` into `dst` following the given
/// strides.
///
/// The number copied is `min(count, dst_range.available(dst.len()),
/// src_range.available(src.len()))` and is returned.
///
/// `available` rounds up: a range reaches every index `offset + i * stride`
/// below `len`, so length 5 with stride 2 gives 3 positions (0, 2, 4)
/// where the truncating `(len - offset) / stride` would give 2.
pub fn copy_range(
    dst: &mut [f64],
    dst_range: StridedRange,
    src: &[f64],
    src_range: StridedRange,
    count: usize,
) -> Result<usize, TensorError> {
    if dst_range.stride == 0 || src_range.stride == 0 {
        return Err(TensorError::invalid_argument("stride must be non-zero"));
    }
    let n = count
        .min(dst_range.available(dst.len()))
        .min(src_range.available(src.len()));
    for i in 0..n {
        dst[dst_range.index(i)] = src[src_range.index(i)];
    }
    Ok(n)
}

/// Swap the suffix of `a` starting at `offset_a` with the suffix of `b`
/// starting at `offset_b`, over the shorter of the two tails.
///
/// Returns the number of element pairs swapped (0 when either offset is
/// past the end).
pub fn swap_ranges(a: &mut [f64], offset_a: usize, b: &mut [f64], offset_b: usize) -> usize {
    let tail_a = a.get_mut(offset_a..).unwrap_or_default();
    let tail_b = b.get_mut(offset_b..).unwrap_or_default();
    let n = tail_a.len().min(tail_b.len());
    tail_a[..n].swap_with_slice(&mut tail_b[..n]);
    n
}

/// [`swap_ranges`] where both operands are the same buffer.
///
/// Pairs are swapped one at a time in ascending order, which keeps the
/// result deterministic when the two ranges overlap.
pub fn swap_ranges_within(data: &mut [f64], offset_a: usize, offset_b: usize) -> usize {
    let len = data.len();
    if offset_a >= len || offset_b >= len {
        return 0;
    }
    let n = (len - offset_a).min(len - offset_b);
    if offset_a != offset_b {
        for i in 0..n {
            data.swap(offset_a + i, offset_b + i);
        }
    }
    n
}

//! Array operation FFI.
//!
//! Two-operand operations run over the shorter operand and report the
//! number of elements processed. Passing the same handle twice is allowed:
//! mutating operations then read the second operand as it was before the
//! call.

use numy_core::{Tensor, TensorError};
use numy_ops::set::merge_sorted;
use numy_ops::{SetOp, StridedRange};
use numy_registry::{BufferHandle, BufferRegistry, PairMut, RegistryError};

use crate::buffers::{copy_to_caller, write_optional, write_out};
use crate::context::{registry, terms};
use crate::status::NumyStatus;

/// Set operation selector for [`numy_vector_set_op`].
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumySetOp {
    /// Elements in either operand.
    Union = 0,
    /// Elements in both operands.
    Intersection = 1,
    /// Elements of the first operand absent from the second.
    Difference = 2,
    /// Elements in exactly one operand.
    SymmetricDifference = 3,
}

impl From<NumySetOp> for SetOp {
    fn from(op: NumySetOp) -> Self {
        match op {
            NumySetOp::Union => SetOp::Union,
            NumySetOp::Intersection => SetOp::Intersection,
            NumySetOp::Difference => SetOp::Difference,
            NumySetOp::SymmetricDifference => SetOp::SymmetricDifference,
        }
    }
}

fn read_pair<R>(
    registry: &BufferRegistry,
    a: u64,
    b: u64,
    f: impl FnOnce(&[f64], &[f64]) -> R,
) -> Result<R, RegistryError> {
    registry.with_pair(
        BufferHandle::from_raw(a),
        BufferHandle::from_raw(b),
        |pair| match pair {
            PairMut::Distinct(x, y) => f(x.data(), y.data()),
            PairMut::Same(x) => f(x.data(), x.data()),
        },
    )
}

fn update_pair<R>(
    registry: &BufferRegistry,
    a: u64,
    b: u64,
    f: impl FnOnce(&mut Tensor, &Tensor) -> R,
) -> Result<R, RegistryError> {
    registry.with_operands(BufferHandle::from_raw(a), BufferHandle::from_raw(b), f)
}

fn update_one(handle: u64, f: impl FnOnce(&mut [f64])) -> i32 {
    let registry = ffi_try!(registry());
    ffi_try!(registry.with_tensor_mut(BufferHandle::from_raw(handle), |t| f(t.data_mut())));
    NumyStatus::Ok as i32
}

#[allow(unsafe_code)]
fn binary(a: u64, b: u64, count_out: *mut usize, op: fn(&mut [f64], &[f64]) -> usize) -> i32 {
    let registry = ffi_try!(registry());
    let n = ffi_try!(update_pair(&registry, a, b, |x, y| op(x.data_mut(), y.data())));
    // SAFETY: count_out is null or valid per caller contract.
    unsafe { write_optional(count_out, n) };
    NumyStatus::Ok as i32
}

#[allow(unsafe_code)]
fn reduce<T>(
    handle: u64,
    out: *mut T,
    f: impl FnOnce(&[f64]) -> Result<T, TensorError>,
) -> i32 {
    let registry = ffi_try!(registry());
    let value = ffi_try!(registry.with_tensor(BufferHandle::from_raw(handle), |t| f(t.data())));
    let value = ffi_try!(value);
    // SAFETY: out is valid per caller contract.
    ffi_try!(unsafe { write_out(out, value) });
    NumyStatus::Ok as i32
}

// ── FFI functions ───────────────────────────────────────────────

/// `a[i] += b[i]`. `count_out` (nullable) receives the element count.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_add(a: u64, b: u64, count_out: *mut usize) -> i32 {
    ffi_guard!({ binary(a, b, count_out, numy_ops::add) })
}

/// `a[i] -= b[i]`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_sub(a: u64, b: u64, count_out: *mut usize) -> i32 {
    ffi_guard!({ binary(a, b, count_out, numy_ops::sub) })
}

/// `a[i] *= b[i]`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_mul(a: u64, b: u64, count_out: *mut usize) -> i32 {
    ffi_guard!({ binary(a, b, count_out, numy_ops::mul) })
}

/// `a[i] /= b[i]`. Division by zero follows IEEE-754.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_div(a: u64, b: u64, count_out: *mut usize) -> i32 {
    ffi_guard!({ binary(a, b, count_out, numy_ops::div) })
}

/// `a[i] = fa * a[i] + fb * b[i]`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_axpby(
    a: u64,
    b: u64,
    fa: f64,
    fb: f64,
    count_out: *mut usize,
) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        let n = ffi_try!(update_pair(&registry, a, b, |x, y| {
            numy_ops::axpby(x.data_mut(), y.data(), fa, fb)
        }));
        // SAFETY: count_out is null or valid per caller contract.
        unsafe { write_optional(count_out, n) };
        NumyStatus::Ok as i32
    })
}

/// Dot product over the shorter operand.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_dot(a: u64, b: u64, out: *mut f64) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        let value = ffi_try!(read_pair(&registry, a, b, numy_ops::dot));
        // SAFETY: out is valid per caller contract.
        ffi_try!(unsafe { write_out(out, value) });
        NumyStatus::Ok as i32
    })
}

/// Tolerant element-wise equality over the shorter operand. Writes the
/// host `true` or `false` term into `out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_equal(a: u64, b: u64, out: *mut u64) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        let terms = ffi_try!(terms());
        let equal = ffi_try!(read_pair(&registry, a, b, numy_ops::equal));
        // SAFETY: out is valid per caller contract.
        ffi_try!(unsafe { write_out(out, terms.boolean(equal)) });
        NumyStatus::Ok as i32
    })
}

/// Multiply every element by `k`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_scale(handle: u64, k: f64) -> i32 {
    ffi_guard!({ update_one(handle, |d| numy_ops::scale(d, k)) })
}

/// Add `k` to every element.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_offset(handle: u64, k: f64) -> i32 {
    ffi_guard!({ update_one(handle, |d| numy_ops::offset(d, k)) })
}

/// Negate every element.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_negate(handle: u64) -> i32 {
    ffi_guard!({ update_one(handle, numy_ops::negate) })
}

/// Step function: 0 below `cutoff`, else 1.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_heaviside(handle: u64, cutoff: f64) -> i32 {
    ffi_guard!({ update_one(handle, |d| numy_ops::heaviside(d, cutoff)) })
}

/// Logistic sigmoid of every element.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_sigmoid(handle: u64) -> i32 {
    ffi_guard!({ update_one(handle, numy_ops::sigmoid) })
}

/// Sort ascending by IEEE-754 total order.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_sort(handle: u64) -> i32 {
    ffi_guard!({ update_one(handle, numy_ops::sort) })
}

/// Reverse element order.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_reverse(handle: u64) -> i32 {
    ffi_guard!({ update_one(handle, numy_ops::reverse) })
}

/// Sum of all elements.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_sum(handle: u64, out: *mut f64) -> i32 {
    ffi_guard!({ reduce(handle, out, |d| Ok(numy_ops::sum(d))) })
}

/// Largest element.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_max(handle: u64, out: *mut f64) -> i32 {
    ffi_guard!({ reduce(handle, out, numy_ops::max) })
}

/// Smallest element.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_min(handle: u64, out: *mut f64) -> i32 {
    ffi_guard!({ reduce(handle, out, numy_ops::min) })
}

/// Index of the first largest element.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_max_index(handle: u64, out: *mut usize) -> i32 {
    ffi_guard!({ reduce(handle, out, numy_ops::max_index) })
}

/// Index of the first smallest element.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_min_index(handle: u64, out: *mut usize) -> i32 {
    ffi_guard!({ reduce(handle, out, numy_ops::min_index) })
}

/// First index holding exactly `value`, or -1.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_find(handle: u64, value: f64, index_out: *mut i64) -> i32 {
    ffi_guard!({
        reduce(handle, index_out, |d| {
            Ok(numy_ops::find(d, value).map_or(-1, |i| i as i64))
        })
    })
}

/// Strided copy of up to `count` elements from `src` into `dst`.
///
/// `copied_out` (nullable) receives the number actually copied, which is
/// bounded by what both strided ranges can reach. A zero stride is
/// `InvalidArgument`.
#[no_mangle]
#[allow(unsafe_code, clippy::too_many_arguments)]
pub extern "C" fn numy_vector_copy_range(
    dst: u64,
    src: u64,
    count: usize,
    dst_offset: usize,
    dst_stride: usize,
    src_offset: usize,
    src_stride: usize,
    copied_out: *mut usize,
) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        let dst_range = ffi_try!(StridedRange::new(dst_offset, dst_stride));
        let src_range = ffi_try!(StridedRange::new(src_offset, src_stride));
        let copied = ffi_try!(update_pair(&registry, dst, src, |d, s| {
            numy_ops::copy_range(d.data_mut(), dst_range, s.data(), src_range, count)
        }));
        let copied = ffi_try!(copied);
        // SAFETY: copied_out is null or valid per caller contract.
        unsafe { write_optional(copied_out, copied) };
        NumyStatus::Ok as i32
    })
}

/// Swap the suffix of `a` from `offset_a` with the suffix of `b` from
/// `offset_b`, over the shorter tail.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_swap_ranges(
    a: u64,
    b: u64,
    offset_a: usize,
    offset_b: usize,
    swapped_out: *mut usize,
) -> i32 {
    ffi_guard!({
        let registry = ffi_try!(registry());
        let swapped = ffi_try!(registry.with_pair(
            BufferHandle::from_raw(a),
            BufferHandle::from_raw(b),
            |pair| match pair {
                PairMut::Distinct(x, y) => {
                    numy_ops::swap_ranges(x.data_mut(), offset_a, y.data_mut(), offset_b)
                }
                PairMut::Same(x) => numy_ops::swap_ranges_within(x.data_mut(), offset_a, offset_b),
            },
        ));
        // SAFETY: swapped_out is null or valid per caller contract.
        unsafe { write_optional(swapped_out, swapped) };
        NumyStatus::Ok as i32
    })
}

/// Set operation on two tensors.
///
/// Both operands are sorted in place. The strictly increasing result is
/// copied into `buf`; `len_out` receives its length, also on
/// `BufferTooSmall`. `op` is a [`NumySetOp`] value.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn numy_vector_set_op(
    a: u64,
    b: u64,
    op: i32,
    buf: *mut f64,
    cap: usize,
    len_out: *mut usize,
) -> i32 {
    ffi_guard!({
        let op = ffi_try!(SetOp::try_from(op));
        let registry = ffi_try!(registry());
        let result = ffi_try!(registry.with_pair(
            BufferHandle::from_raw(a),
            BufferHandle::from_raw(b),
            |pair| match pair {
                PairMut::Distinct(x, y) => numy_ops::set_op(x.data_mut(), y.data_mut(), op),
                PairMut::Same(x) => {
                    numy_ops::sort(x.data_mut());
                    merge_sorted(x.data(), x.data(), op)
                }
            },
        ));
        // SAFETY: buf is valid for cap writes per caller contract.
        ffi_try!(unsafe { copy_to_caller(&result, buf, cap, len_out) });
        NumyStatus::Ok as i32
    })
}

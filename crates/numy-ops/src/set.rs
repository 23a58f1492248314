//! Merge-based set algebra.
//!
//! Both operands are sorted in place (the host observes this), then walked
//! once in lockstep. Results are strictly increasing: duplicates within or
//! across operands collapse to a single element. Ordering and equality use
//! IEEE-754 total order, so `-0.0` and `0.0` are distinct members and NaNs
//! compare equal to themselves.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use numy_core::TensorError;

use crate::order::sort;

/// Which classical set operation to compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SetOp {
    /// Elements in either operand.
    Union,
    /// Elements in both operands.
    Intersection,
    /// Elements of the first operand absent from the second.
    Difference,
    /// Elements in exactly one operand.
    SymmetricDifference,
}

impl SetOp {
    /// Host-facing name of the operation.
    pub fn name(self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Intersection => "intersection",
            Self::Difference => "difference",
            Self::SymmetricDifference => "symmetric_difference",
        }
    }
}

impl fmt::Display for SetOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SetOp {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "union" => Ok(Self::Union),
            "intersection" => Ok(Self::Intersection),
            "difference" => Ok(Self::Difference),
            "symmetric_difference" => Ok(Self::SymmetricDifference),
            other => Err(TensorError::bad_argument(format!(
                "unknown set operation {other:?}"
            ))),
        }
    }
}

impl TryFrom<i32> for SetOp {
    type Error = TensorError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Union),
            1 => Ok(Self::Intersection),
            2 => Ok(Self::Difference),
            3 => Ok(Self::SymmetricDifference),
            other => Err(TensorError::bad_argument(format!(
                "unknown set operation code {other}"
            ))),
        }
    }
}

/// Sort `a` and `b` in place, then return `a <op> b` as a fresh,
/// strictly increasing sequence.
pub fn set_op(a: &mut [f64], b: &mut [f64], op: SetOp) -> Vec<f64> {
    sort(a);
    sort(b);
    merge_sorted(a, b, op)
}

/// Set operation over operands that are already sorted by total order.
pub fn merge_sorted(a: &[f64], b: &[f64], op: SetOp) -> Vec<f64> {
    let keep_a_only = matches!(
        op,
        SetOp::Union | SetOp::Difference | SetOp::SymmetricDifference
    );
    let keep_b_only = matches!(op, SetOp::Union | SetOp::SymmetricDifference);
    let keep_both = matches!(op, SetOp::Union | SetOp::Intersection);

    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].total_cmp(&b[j]) {
            Ordering::Less => {
                if keep_a_only {
                    push_unique(&mut out, a[i]);
                }
                i = skip_run(a, i);
            }
            Ordering::Greater => {
                if keep_b_only {
                    push_unique(&mut out, b[j]);
                }
                j = skip_run(b, j);
            }
            Ordering::Equal => {
                if keep_both {
                    push_unique(&mut out, a[i]);
                }
                i = skip_run(a, i);
                j = skip_run(b, j);
            }
        }
    }
    if keep_a_only {
        a[i..].iter().for_each(|&v| push_unique(&mut out, v));
    }
    if keep_b_only {
        b[j..].iter().for_each(|&v| push_unique(&mut out, v));
    }
    out
}

// Index just past the run of values equal to `s[i]`.
fn skip_run(s: &[f64], i: usize) -> usize {
    let v = s[i];
    i + s[i..]
        .iter()
        .take_while(|x| x.total_cmp(&v) == Ordering::Equal)
        .count()
}

fn push_unique(out: &mut Vec<f64>, v: f64) {
    if out
        .last()
        .is_none_or(|last| last.total_cmp(&v) != Ordering::Equal)
    {
        out.push(v);
    }
}

//! Row-major / column-major data layout conversion.
//!
//! Dense tensors are stored in row-major (C) order, while MAT-files expect
//! column-major (Fortran) order.

use ndarray::ArrayViewD;

/// Column-major flat copy of an array.
///
/// Row-major (C order): last axis varies fastest.
/// Column-major (Fortran order): first axis varies fastest.
///
/// Reversing the axes and walking the result in logical order visits the
/// elements in column-major order of the original.
pub(crate) fn to_col_major<T: Clone>(arr: ArrayViewD<'_, T>) -> Vec<T> {
    arr.reversed_axes().iter().cloned().collect()
}

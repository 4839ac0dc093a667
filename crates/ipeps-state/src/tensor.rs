//! Dense tensor enum over the two supported element types.
//!
//! [`DenseTensor`] wraps either an `f64` or a `Complex64` row-major array.
//! The variant is chosen at decode time from the resolved [`Dtype`].

use ndarray::{ArrayD, IxDyn};
use num_complex::Complex64;
use std::fmt;
use std::str::FromStr;

use crate::error::StateError;

/// Element type tag of a serialized tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    Float64,
    Complex128,
}

impl Dtype {
    /// Canonical (numpy) name of the element type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float64 => "float64",
            Self::Complex128 => "complex128",
        }
    }

    /// Number of value tokens an entry line carries for this dtype.
    pub fn value_tokens(&self) -> usize {
        match self {
            Self::Float64 => 1,
            Self::Complex128 => 2,
        }
    }

    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        match self {
            Self::Float64 => std::mem::size_of::<f64>(),
            Self::Complex128 => std::mem::size_of::<Complex64>(),
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a dtype tag, ignoring case.
impl FromStr for Dtype {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "float64" => Ok(Self::Float64),
            "complex128" => Ok(Self::Complex128),
            _ => Err(StateError::UnknownDtype(s.to_string())),
        }
    }
}

/// ndarray requires the product of the non-zero axis lengths to fit in
/// `isize`; the allocation itself must stay below `isize::MAX` bytes.
fn check_allocatable(dtype: Dtype, dims: &[usize]) -> crate::error::Result<()> {
    let fits = dims
        .iter()
        .filter(|&&d| d != 0)
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .and_then(|n| n.checked_mul(dtype.element_size()))
        .is_some_and(|bytes| bytes <= isize::MAX as usize);
    if fits {
        Ok(())
    } else {
        Err(StateError::invalid_field(
            "dims",
            format!("shape {:?} of {} elements is too large to allocate", dims, dtype),
        ))
    }
}

/// Dense row-major tensor, real or complex.
#[derive(Debug, Clone, PartialEq)]
pub enum DenseTensor {
    F64(ArrayD<f64>),
    C64(ArrayD<Complex64>),
}

impl DenseTensor {
    /// Zero-filled tensor of the given dtype and shape.
    ///
    /// Fails with [`StateError::InvalidField`] on `dims` when the element
    /// count or the byte size of the buffer does not fit in `isize`.
    pub fn zeros(dtype: Dtype, dims: &[usize]) -> crate::error::Result<Self> {
        check_allocatable(dtype, dims)?;
        Ok(match dtype {
            Dtype::Float64 => Self::F64(ArrayD::zeros(IxDyn(dims))),
            Dtype::Complex128 => Self::C64(ArrayD::zeros(IxDyn(dims))),
        })
    }

    pub fn dtype(&self) -> Dtype {
        match self {
            Self::F64(_) => Dtype::Float64,
            Self::C64(_) => Dtype::Complex128,
        }
    }

    pub fn dims(&self) -> &[usize] {
        match self {
            Self::F64(a) => a.shape(),
            Self::C64(a) => a.shape(),
        }
    }

    pub fn rank(&self) -> usize {
        self.dims().len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::F64(a) => a.len(),
            Self::C64(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_f64(&self) -> bool {
        matches!(self, Self::F64(_))
    }

    pub fn is_c64(&self) -> bool {
        matches!(self, Self::C64(_))
    }

    /// Get as f64 array if possible (returns None for C64).
    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            Self::F64(a) => Some(a),
            Self::C64(_) => None,
        }
    }

    /// Get as Complex64 array if already C64.
    pub fn as_c64(&self) -> Option<&ArrayD<Complex64>> {
        match self {
            Self::F64(_) => None,
            Self::C64(a) => Some(a),
        }
    }

    /// Promote to Complex64 if not already.
    pub fn to_c64(&self) -> ArrayD<Complex64> {
        match self {
            Self::F64(a) => a.mapv(|x| Complex64::new(x, 0.0)),
            Self::C64(a) => a.clone(),
        }
    }
}

impl From<ArrayD<f64>> for DenseTensor {
    fn from(a: ArrayD<f64>) -> Self {
        Self::F64(a)
    }
}

impl From<ArrayD<Complex64>> for DenseTensor {
    fn from(a: ArrayD<Complex64>) -> Self {
        Self::C64(a)
    }
}

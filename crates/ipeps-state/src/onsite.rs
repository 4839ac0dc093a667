//! On-site tensor construction from the five iPESS simplex tensors.
//!
//! ```text
//!             l   u
//!              \ /
//!              T_u                       u
//!               | i                      |
//!          m == B_c               l -- [ m n o ] -- r
//!               | j                      |
//!              T_d                       d
//!            k /   \ x
//!     n == B_b       B_a == o      A[(m, n, o), u, l, d, r]
//!          /           \
//!         d             r
//! ```
//!
//! Axis conventions (labels, not storage order):
//! `T_u(i, u, l)`, `B_c(m, j, i)`, `T_d(j, k, x)`, `B_b(n, k, d)`, `B_a(o, x, r)`.
//! The labels `i, j, k, x` are summed over; the physical axes `(m, n, o)` are
//! merged row-major into one axis with `m` slowest and `o` fastest.

use ndarray::{Array2, ArrayD, ArrayView, ArrayViewD, Dimension, IxDyn, LinalgScalar, ShapeError};
use num_complex::Complex64;
use tracing::debug;

use crate::error::{Result, StateError};
use crate::tensor::DenseTensor;

/// Role of a tensor within the iPESS set, in serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpessRole {
    TU,
    TD,
    BA,
    BB,
    BC,
}

impl IpessRole {
    pub const ALL: [IpessRole; 5] = [Self::TU, Self::TD, Self::BA, Self::BB, Self::BC];

    /// JSON key / output array name.
    pub fn key(&self) -> &'static str {
        match self {
            Self::TU => "T_u",
            Self::TD => "T_d",
            Self::BA => "B_a",
            Self::BB => "B_b",
            Self::BC => "B_c",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.key() == key)
    }
}

/// The five decoded simplex tensors of a single-site iPESS state.
#[derive(Debug, Clone, PartialEq)]
pub struct IpessTensors {
    pub t_u: DenseTensor,
    pub t_d: DenseTensor,
    pub b_a: DenseTensor,
    pub b_b: DenseTensor,
    pub b_c: DenseTensor,
}

impl IpessTensors {
    pub fn get(&self, role: IpessRole) -> &DenseTensor {
        match role {
            IpessRole::TU => &self.t_u,
            IpessRole::TD => &self.t_d,
            IpessRole::BA => &self.b_a,
            IpessRole::BB => &self.b_b,
            IpessRole::BC => &self.b_c,
        }
    }

    /// Tensors paired with their roles, in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = (IpessRole, &DenseTensor)> {
        IpessRole::ALL.into_iter().map(move |role| (role, self.get(role)))
    }

    /// Check ranks and the sizes of every contracted axis.
    pub fn validate(&self) -> Result<()> {
        for (role, t) in self.iter() {
            if t.rank() != 3 {
                return Err(StateError::RankMismatch {
                    role: role.key(),
                    rank: t.rank(),
                });
            }
        }
        // (label, left role, left axis, right role, right axis)
        let shared = [
            ('i', IpessRole::TU, 0, IpessRole::BC, 2),
            ('j', IpessRole::BC, 1, IpessRole::TD, 0),
            ('k', IpessRole::TD, 1, IpessRole::BB, 1),
            ('x', IpessRole::TD, 2, IpessRole::BA, 1),
        ];
        for (label, left, left_axis, right, right_axis) in shared {
            let left_size = self.get(left).dims()[left_axis];
            let right_size = self.get(right).dims()[right_axis];
            if left_size != right_size {
                return Err(StateError::AxisMismatch {
                    label,
                    left_role: left.key(),
                    left_size,
                    right_role: right.key(),
                    right_size,
                });
            }
        }
        Ok(())
    }
}

/// Build the rank-5 on-site tensor `A[(m, n, o), u, l, d, r]`.
///
/// If any of the five tensors is complex the result is complex.
pub fn build_onsite_tensor(tensors: &IpessTensors) -> Result<DenseTensor> {
    tensors.validate()?;

    let all_f64 = tensors.iter().all(|(_, t)| t.is_f64());
    let onsite = match (
        all_f64,
        tensors.t_u.as_f64(),
        tensors.b_c.as_f64(),
        tensors.t_d.as_f64(),
        tensors.b_b.as_f64(),
        tensors.b_a.as_f64(),
    ) {
        (true, Some(t_u), Some(b_c), Some(t_d), Some(b_b), Some(b_a)) => DenseTensor::F64(
            contract_onsite(t_u.view(), b_c.view(), t_d.view(), b_b.view(), b_a.view())?,
        ),
        _ => {
            let [t_u, b_c, t_d, b_b, b_a]: [ArrayD<Complex64>; 5] = [
                tensors.t_u.to_c64(),
                tensors.b_c.to_c64(),
                tensors.t_d.to_c64(),
                tensors.b_b.to_c64(),
                tensors.b_a.to_c64(),
            ];
            DenseTensor::C64(contract_onsite(
                t_u.view(),
                b_c.view(),
                t_d.view(),
                b_b.view(),
                b_a.view(),
            )?)
        }
    };
    debug!(dims = ?onsite.dims(), dtype = %onsite.dtype(), "built on-site tensor");
    Ok(onsite)
}

/// Pairwise contraction of validated rank-3 operands.
///
/// 1. `W(m, j, u, l)    = B_c(m, j, i) T_u(i, u, l)`
/// 2. `V(j, x, n, d)    = T_d(j, k, x) B_b(n, k, d)`
/// 3. `U(j, n, d, o, r) = V(j, x, n, d) B_a(o, x, r)`
/// 4. `A(m, u, l, n, d, o, r) = W(m, j, u, l) U(j, n, d, o, r)`
///
/// then permute to `(m, n, o, u, l, d, r)` and merge `(m, n, o)`.
fn contract_onsite<T: LinalgScalar>(
    t_u: ArrayViewD<'_, T>,
    b_c: ArrayViewD<'_, T>,
    t_d: ArrayViewD<'_, T>,
    b_b: ArrayViewD<'_, T>,
    b_a: ArrayViewD<'_, T>,
) -> std::result::Result<ArrayD<T>, ShapeError> {
    let [i, u, l] = dims3(&t_u);
    let [m, j, _] = dims3(&b_c);
    let [_, k, x] = dims3(&t_d);
    let [n, _, d] = dims3(&b_b);
    let [o, _, r] = dims3(&b_a);

    // 1. (m j, i) x (i, u l)
    let w = matrix(b_c, m * j, i)?.dot(&matrix(t_u, i, u * l)?);

    // 2. (j x, k) x (k, n d)
    let t_d_jxk = t_d.permuted_axes(IxDyn(&[0, 2, 1]));
    let b_b_knd = b_b.permuted_axes(IxDyn(&[1, 0, 2]));
    let v = matrix(t_d_jxk, j * x, k)?.dot(&matrix(b_b_knd, k, n * d)?);

    // 3. (j n d, x) x (x, o r)
    let v = reshape(v.view(), &[j, x, n, d])?.permuted_axes(IxDyn(&[0, 2, 3, 1]));
    let b_a_xor = b_a.permuted_axes(IxDyn(&[1, 0, 2]));
    let uu = matrix(v.view(), j * n * d, x)?.dot(&matrix(b_a_xor, x, o * r)?);

    // 4. (m u l, j) x (j, n d o r)
    let w = reshape(w.view(), &[m, j, u, l])?.permuted_axes(IxDyn(&[0, 2, 3, 1]));
    let a = matrix(w.view(), m * u * l, j)?.dot(&matrix(uu.view(), j, n * d * o * r)?);

    // (m, u, l, n, d, o, r) -> (m, n, o, u, l, d, r) -> (m n o, u, l, d, r)
    let a = reshape(a.view(), &[m, u, l, n, d, o, r])?.permuted_axes(IxDyn(&[0, 3, 5, 1, 2, 4, 6]));
    reshape(a.view(), &[m * n * o, u, l, d, r])
}

fn dims3<T>(a: &ArrayViewD<'_, T>) -> [usize; 3] {
    let s = a.shape();
    [s[0], s[1], s[2]]
}

/// Row-major copy of `a` as a `rows x cols` matrix.
fn matrix<T: Clone, D: Dimension>(
    a: ArrayView<'_, T, D>,
    rows: usize,
    cols: usize,
) -> std::result::Result<Array2<T>, ShapeError> {
    Array2::from_shape_vec((rows, cols), a.iter().cloned().collect())
}

/// Row-major copy of `a` with a new shape of the same size.
fn reshape<T: Clone, D: Dimension>(
    a: ArrayView<'_, T, D>,
    dims: &[usize],
) -> std::result::Result<ArrayD<T>, ShapeError> {
    ArrayD::from_shape_vec(IxDyn(dims), a.iter().cloned().collect())
}

//! Sparse-entry JSON tensor decoding.
//!
//! A serialized tensor is a JSON object
//!
//! ```text
//! {
//!   "dims":    [d0, d1, ...],           (optional, see shape rules)
//!   "dtype":   "float64" | "complex128", (optional, see dtype rules)
//!   "entries": ["i0 i1 ... re", ...]     (or "i0 i1 ... re im" for complex)
//! }
//! ```
//!
//! Each entry lists the zero-based multi-index of a non-zero element
//! followed by its value. Shape and dtype are resolved by trying an ordered
//! chain of rules ([`SHAPE_RULES`], [`DTYPE_RULES`]); each rule either
//! resolves, declines, or fails.
//!
//! # Duplicate entries
//!
//! Entries hitting the same index are *summed* for `float64` tensors but
//! *overwrite* each other for `complex128` tensors (last one wins).

use num_complex::Complex64;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StateError};
use crate::tensor::{DenseTensor, Dtype};

/// Rank assumed by the legacy `physDim`/`auxDim` layout and by token-count
/// dtype inference.
pub const LEGACY_RANK: usize = 5;

/// Optional fields; when present they must not be `null`.
const OPTIONAL_FIELDS: [&str; 5] = ["dims", "dtype", "physDim", "auxDim", "entries"];

/// Deserialized (not yet materialized) sparse tensor description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SparseTensorSpec {
    pub dims: Option<Vec<usize>>,
    pub dtype: Option<String>,
    #[serde(rename = "physDim")]
    pub phys_dim: Option<usize>,
    #[serde(rename = "auxDim")]
    pub aux_dim: Option<usize>,
    pub entries: Option<Vec<String>>,
}

impl SparseTensorSpec {
    /// Read the tensor description out of a JSON object.
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(StateError::invalid_field("tensor", "expected a JSON object"));
        }
        if let Some(field) = OPTIONAL_FIELDS
            .into_iter()
            .find(|field| value.get(*field).is_some_and(Value::is_null))
        {
            return Err(StateError::invalid_field(field, "must not be null"));
        }
        Self::deserialize(value).map_err(|e| StateError::invalid_field("tensor", e.to_string()))
    }

    /// Entry lines, or an error if the field is absent.
    pub fn entries(&self) -> Result<&[String]> {
        self.entries
            .as_deref()
            .ok_or(StateError::MissingField { field: "entries" })
    }

    /// Resolve shape and dtype, then fill a dense tensor from the entries.
    pub fn decode(&self) -> Result<DenseTensor> {
        let dims = resolve_shape(self)?;
        let dtype = resolve_dtype(self, &dims)?;
        let entries = self.entries()?;
        debug!(?dims, %dtype, entries = entries.len(), "decoding sparse tensor");
        materialize(entries, &dims, dtype)
    }
}

/// Decode a JSON tensor description into a dense tensor.
pub fn decode(value: &Value) -> Result<DenseTensor> {
    SparseTensorSpec::from_value(value)?.decode()
}

/// A shape rule returns `Ok(None)` when it does not apply.
pub type ShapeRule = fn(&SparseTensorSpec) -> Result<Option<Vec<usize>>>;

/// A dtype rule sees the already resolved shape.
pub type DtypeRule = fn(&SparseTensorSpec, &[usize]) -> Result<Option<Dtype>>;

/// Shape rules in order of precedence.
pub const SHAPE_RULES: &[(&str, ShapeRule)] = &[
    ("explicit dims", shape_from_dims),
    ("uniform auxiliary dimension", shape_from_uniform_aux),
];

/// Dtype rules in order of precedence.
pub const DTYPE_RULES: &[(&str, DtypeRule)] = &[
    ("explicit dtype", dtype_from_field),
    ("legacy token count", dtype_from_token_count),
];

/// Use the `dims` field verbatim.
pub fn shape_from_dims(spec: &SparseTensorSpec) -> Result<Option<Vec<usize>>> {
    Ok(spec.dims.clone())
}

/// Rank-5 `[physDim, auxDim, auxDim, auxDim, auxDim]`.
pub fn shape_from_uniform_aux(spec: &SparseTensorSpec) -> Result<Option<Vec<usize>>> {
    Ok(match (spec.phys_dim, spec.aux_dim) {
        (Some(phys), Some(aux)) => Some(vec![phys, aux, aux, aux, aux]),
        _ => None,
    })
}

/// Use the `dtype` field, lowercased.
pub fn dtype_from_field(spec: &SparseTensorSpec, _dims: &[usize]) -> Result<Option<Dtype>> {
    spec.dtype.as_deref().map(str::parse::<Dtype>).transpose()
}

/// Infer the dtype of a rank-5 tensor from the token count of its first entry.
pub fn dtype_from_token_count(spec: &SparseTensorSpec, dims: &[usize]) -> Result<Option<Dtype>> {
    if dims.len() != LEGACY_RANK {
        return Ok(None);
    }
    let first = spec
        .entries()?
        .first()
        .ok_or_else(|| StateError::UnresolvedDtype {
            reason: "no \"dtype\" field and no entries to infer it from".to_string(),
        })?;
    let n = first.split_whitespace().count();
    [Dtype::Complex128, Dtype::Float64]
        .into_iter()
        .find(|dtype| n == LEGACY_RANK + dtype.value_tokens())
        .map(Some)
        .ok_or_else(|| StateError::UnresolvedDtype {
            reason: format!(
                "first entry has {} tokens, expected {} (float64) or {} (complex128)",
                n,
                LEGACY_RANK + Dtype::Float64.value_tokens(),
                LEGACY_RANK + Dtype::Complex128.value_tokens()
            ),
        })
}

pub fn resolve_shape(spec: &SparseTensorSpec) -> Result<Vec<usize>> {
    for (name, rule) in SHAPE_RULES {
        if let Some(dims) = rule(spec)? {
            debug!(rule = name, ?dims, "resolved shape");
            return Ok(dims);
        }
    }
    Err(StateError::UnresolvedShape)
}

pub fn resolve_dtype(spec: &SparseTensorSpec, dims: &[usize]) -> Result<Dtype> {
    for (name, rule) in DTYPE_RULES {
        if let Some(dtype) = rule(spec, dims)? {
            debug!(rule = name, %dtype, "resolved dtype");
            return Ok(dtype);
        }
    }
    Err(StateError::UnresolvedDtype {
        reason: format!(
            "no \"dtype\" field and rank {} is not {} (token-count inference only applies to rank {})",
            dims.len(),
            LEGACY_RANK,
            LEGACY_RANK
        ),
    })
}

/// Fill a zero tensor of shape `dims` from entry lines.
///
/// `float64` entries accumulate; `complex128` entries overwrite.
pub fn materialize(entries: &[String], dims: &[usize], dtype: Dtype) -> Result<DenseTensor> {
    match DenseTensor::zeros(dtype, dims)? {
        DenseTensor::F64(mut x) => {
            for (position, entry) in entries.iter().enumerate() {
                let (index, value) = parse_real_entry(position, entry, dims)?;
                x[index.as_slice()] += value;
            }
            Ok(DenseTensor::F64(x))
        }
        DenseTensor::C64(mut x) => {
            for (position, entry) in entries.iter().enumerate() {
                let (index, value) = parse_complex_entry(position, entry, dims)?;
                x[index.as_slice()] = value;
            }
            Ok(DenseTensor::C64(x))
        }
    }
}

/// `rank + 1` tokens: index then value.
/// `rank + 2` tokens: index, value, and one trailing token that is ignored.
fn parse_real_entry(position: usize, entry: &str, dims: &[usize]) -> Result<(Vec<usize>, f64)> {
    let tokens: Vec<&str> = entry.split_whitespace().collect();
    let rank = dims.len();
    let k = if tokens.len() == rank + 1 {
        1
    } else if tokens.len() == rank + 2 {
        2
    } else {
        return Err(malformed(
            position,
            entry,
            format!(
                "expected {} or {} tokens, found {}",
                rank + 1,
                rank + 2,
                tokens.len()
            ),
        ));
    };
    let index = parse_index(position, entry, &tokens[..rank], dims)?;
    let value = parse_value(position, entry, tokens[tokens.len() - k])?;
    Ok((index, value))
}

/// Exactly `rank + 2` tokens: index, real part, imaginary part.
fn parse_complex_entry(
    position: usize,
    entry: &str,
    dims: &[usize],
) -> Result<(Vec<usize>, Complex64)> {
    let tokens: Vec<&str> = entry.split_whitespace().collect();
    let rank = dims.len();
    let expected = rank + Dtype::Complex128.value_tokens();
    if tokens.len() != expected {
        return Err(malformed(
            position,
            entry,
            format!("expected {} tokens, found {}", expected, tokens.len()),
        ));
    }
    let index = parse_index(position, entry, &tokens[..rank], dims)?;
    let re = parse_value(position, entry, tokens[rank])?;
    let im = parse_value(position, entry, tokens[rank + 1])?;
    Ok((index, Complex64::new(re, im)))
}

fn parse_index(position: usize, entry: &str, tokens: &[&str], dims: &[usize]) -> Result<Vec<usize>> {
    let index = tokens
        .iter()
        .map(|tok| {
            tok.parse::<usize>().map_err(|_| {
                malformed(
                    position,
                    entry,
                    format!("index token {:?} is not a non-negative integer", tok),
                )
            })
        })
        .collect::<Result<Vec<usize>>>()?;
    if index.iter().zip(dims).any(|(&i, &d)| i >= d) {
        return Err(StateError::IndexOutOfBounds {
            position,
            index,
            dims: dims.to_vec(),
        });
    }
    Ok(index)
}

fn parse_value(position: usize, entry: &str, token: &str) -> Result<f64> {
    token
        .parse::<f64>()
        .map_err(|_| malformed(position, entry, format!("value token {:?} is not a number", token)))
}

fn malformed(position: usize, entry: &str, reason: String) -> StateError {
    StateError::MalformedEntry {
        position,
        entry: entry.to_string(),
        reason,
    }
}

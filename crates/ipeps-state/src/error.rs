//! Error types for state decoding and on-site tensor construction.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`StateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing JSON fields, bad dtype, bad entries.
    Format,
    /// Input that is well formed but not handled (multi-site states).
    Unsupported,
    /// Contraction axis mismatch in the on-site builder.
    Shape,
    /// The state file could not be read or parsed as JSON.
    Io,
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Missing field {field:?}")]
    MissingField { field: &'static str },

    #[error("Invalid field {field:?}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Unknown dtype {0:?} (expected \"float64\" or \"complex128\")")]
    UnknownDtype(String),

    #[error("Cannot resolve tensor shape: neither \"dims\" nor both \"physDim\" and \"auxDim\" present")]
    UnresolvedShape,

    #[error("Cannot resolve tensor dtype: {reason}")]
    UnresolvedDtype { reason: String },

    #[error("Malformed entry {position} ({entry:?}): {reason}")]
    MalformedEntry {
        position: usize,
        entry: String,
        reason: String,
    },

    #[error("Entry {position}: index {index:?} out of bounds for shape {dims:?}")]
    IndexOutOfBounds {
        position: usize,
        index: Vec<usize>,
        dims: Vec<usize>,
    },

    #[error("Document has neither a \"sites\" nor an \"ipess_tensors\" field")]
    UnknownLayout,

    #[error("\"sites\" is empty")]
    EmptySites,

    #[error("Multi-site dense states are not supported ({count} sites)")]
    MultiSite { count: usize },

    #[error("iPESS tensor set mismatch: missing {missing:?}, unexpected {unexpected:?}")]
    TensorSetKeys {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Tensor {role} has rank {rank}, expected 3")]
    RankMismatch { role: &'static str, rank: usize },

    #[error("Dimension mismatch on contracted axis {label:?}: {left_role} has size {left_size} but {right_role} has size {right_size}")]
    AxisMismatch {
        label: char,
        left_role: &'static str,
        left_size: usize,
        right_role: &'static str,
        right_size: usize,
    },

    #[error("Reshape failed during contraction: {0}")]
    Reshape(#[from] ndarray::ShapeError),

    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MultiSite { .. } => ErrorKind::Unsupported,
            Self::RankMismatch { .. } | Self::AxisMismatch { .. } | Self::Reshape(_) => {
                ErrorKind::Shape
            }
            Self::Read { .. } | Self::Json { .. } => ErrorKind::Io,
            _ => ErrorKind::Format,
        }
    }

    pub(crate) fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StateError>;

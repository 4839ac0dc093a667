//! Single-site state loaders.
//!
//! Two document layouts are recognized:
//!
//! - `{"sites": [<tensor>]}`: one dense on-site tensor (iPEPS).
//! - `{"ipess_tensors": {"T_u": .., "T_d": .., "B_a": .., "B_b": .., "B_c": ..}}`:
//!   five simplex tensors contracted into an on-site tensor (iPESS).

use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, StateError};
use crate::onsite::{build_onsite_tensor, IpessRole, IpessTensors};
use crate::sparse::decode;
use crate::tensor::DenseTensor;

/// Array name of the on-site tensor in every output.
pub const ONSITE_KEY: &str = "A";

/// Top-level layout of a state document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateLayout {
    Ipeps,
    Ipess,
}

/// Read and parse a whole state file.
pub fn read_state_document(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| StateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| StateError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// `sites` takes precedence over `ipess_tensors`.
pub fn detect_layout(document: &Value) -> Result<StateLayout> {
    if document.get("sites").is_some() {
        Ok(StateLayout::Ipeps)
    } else if document.get("ipess_tensors").is_some() {
        Ok(StateLayout::Ipess)
    } else {
        Err(StateError::UnknownLayout)
    }
}

/// Decode the single on-site tensor of a `sites` document.
pub fn peps_from_document(document: &Value) -> Result<DenseTensor> {
    let sites = document
        .get("sites")
        .ok_or(StateError::MissingField { field: "sites" })?
        .as_array()
        .ok_or_else(|| StateError::invalid_field("sites", "expected an array"))?;
    match sites.as_slice() {
        [] => Err(StateError::EmptySites),
        [site] => decode(site),
        _ => Err(StateError::MultiSite { count: sites.len() }),
    }
}

/// Decoded iPESS tensors together with the on-site tensor built from them.
#[derive(Debug, Clone, PartialEq)]
pub struct IpessState {
    pub onsite: DenseTensor,
    pub tensors: IpessTensors,
}

/// Decode the five tensors of an `ipess_tensors` document and build the on-site tensor.
pub fn pess_from_document(document: &Value) -> Result<IpessState> {
    let raw = document
        .get("ipess_tensors")
        .ok_or(StateError::MissingField {
            field: "ipess_tensors",
        })?
        .as_object()
        .ok_or_else(|| StateError::invalid_field("ipess_tensors", "expected an object"))?;
    check_tensor_keys(raw)?;

    let mut decoded = Vec::with_capacity(IpessRole::ALL.len());
    for role in IpessRole::ALL {
        let value = raw
            .get(role.key())
            .ok_or(StateError::MissingField { field: role.key() })?;
        let tensor = decode(value)?;
        debug!(role = role.key(), dims = ?tensor.dims(), dtype = %tensor.dtype(), "decoded iPESS tensor");
        decoded.push(tensor);
    }
    let [t_u, t_d, b_a, b_b, b_c]: [DenseTensor; 5] = decoded
        .try_into()
        .map_err(|_| StateError::invalid_field("ipess_tensors", "expected five tensors"))?;
    let tensors = IpessTensors {
        t_u,
        t_d,
        b_a,
        b_b,
        b_c,
    };
    let onsite = build_onsite_tensor(&tensors)?;
    Ok(IpessState { onsite, tensors })
}

/// The key set must be exactly `{T_u, T_d, B_a, B_b, B_c}`.
fn check_tensor_keys(raw: &Map<String, Value>) -> Result<()> {
    let missing: Vec<String> = IpessRole::ALL
        .iter()
        .filter(|role| !raw.contains_key(role.key()))
        .map(|role| role.key().to_string())
        .collect();
    let unexpected: Vec<String> = raw
        .keys()
        .filter(|key| IpessRole::from_key(key).is_none())
        .cloned()
        .collect();
    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(StateError::TensorSetKeys {
            missing,
            unexpected,
        })
    }
}

/// Load the dense on-site tensor of a single-site iPEPS state file.
pub fn load_peps_dense(path: impl AsRef<Path>) -> Result<DenseTensor> {
    let document = read_state_document(path)?;
    info!("Processed format detected: single dense tensor");
    peps_from_document(&document)
}

/// Load an iPESS state file; returns the on-site tensor and the five simplex tensors.
pub fn load_pess_dense(path: impl AsRef<Path>) -> Result<IpessState> {
    let document = read_state_document(path)?;
    info!("Processed format detected: iPESS simplex tensors");
    pess_from_document(&document)
}

/// A loaded state of either layout.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedState {
    Ipeps(DenseTensor),
    Ipess(IpessState),
}

impl LoadedState {
    pub fn layout(&self) -> StateLayout {
        match self {
            Self::Ipeps(_) => StateLayout::Ipeps,
            Self::Ipess(_) => StateLayout::Ipess,
        }
    }

    pub fn onsite(&self) -> &DenseTensor {
        match self {
            Self::Ipeps(a) => a,
            Self::Ipess(state) => &state.onsite,
        }
    }

    /// Arrays to write, in output order: `A` first, then the iPESS tensors.
    pub fn named_arrays(&self) -> Vec<(&'static str, &DenseTensor)> {
        match self {
            Self::Ipeps(a) => vec![(ONSITE_KEY, a)],
            Self::Ipess(state) => std::iter::once((ONSITE_KEY, &state.onsite))
                .chain(state.tensors.iter().map(|(role, t)| (role.key(), t)))
                .collect(),
        }
    }
}

/// Parse a document and dispatch on its layout.
pub fn state_from_document(document: &Value) -> Result<LoadedState> {
    match detect_layout(document)? {
        StateLayout::Ipeps => peps_from_document(document).map(LoadedState::Ipeps),
        StateLayout::Ipess => pess_from_document(document).map(LoadedState::Ipess),
    }
}

/// Read a state file of either layout.
pub fn load_state(path: impl AsRef<Path>) -> Result<LoadedState> {
    let path = path.as_ref();
    let document = read_state_document(path)?;
    let layout = detect_layout(&document)?;
    info!(path = %path.display(), ?layout, "loading state");
    state_from_document(&document)
}

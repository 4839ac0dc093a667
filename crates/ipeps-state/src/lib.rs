//! Dense tensors from sparse-entry JSON iPEPS / iPESS states.
//!
//! This crate reads the JSON state format used by iPEPS simulation codes, in
//! which every tensor is stored as a shape, a dtype tag and a list of
//! non-zero entries, and turns it into dense `ndarray` arrays.
//!
//! # Overview
//!
//! - [`decode`]: one sparse tensor description → [`DenseTensor`]
//! - [`build_onsite_tensor`]: five iPESS simplex tensors → rank-5 on-site tensor
//! - [`load_state`]: a state file of either layout → [`LoadedState`]
//!
//! # Example
//!
//! ```
//! use ipeps_state::{decode, Dtype};
//! use serde_json::json;
//!
//! let t = decode(&json!({
//!     "dims": [2, 2],
//!     "dtype": "complex128",
//!     "entries": ["0 1 1.0 -1.0"]
//! }))
//! .unwrap();
//! assert_eq!(t.dtype(), Dtype::Complex128);
//! assert_eq!(t.dims(), &[2, 2]);
//! ```

pub mod error;
pub mod onsite;
pub mod sparse;
pub mod state;
pub mod tensor;

pub use error::{ErrorKind, Result, StateError};
pub use onsite::{build_onsite_tensor, IpessRole, IpessTensors};
pub use sparse::{decode, SparseTensorSpec};
pub use state::{
    detect_layout, load_peps_dense, load_pess_dense, load_state, read_state_document,
    state_from_document, IpessState, LoadedState, StateLayout, ONSITE_KEY,
};
pub use tensor::{DenseTensor, Dtype};

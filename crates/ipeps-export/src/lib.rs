//! Output writers for dense iPEPS tensors.
//!
//! Every writer takes a list of `(name, tensor)` pairs and stores them as
//! named arrays in a single file:
//!
//! - [`OutputFormat::Npz`]: NumPy `.npz` archive (one `<name>.npy` member per array)
//! - [`OutputFormat::Mat`]: MATLAB Level 5 `.mat` file, column-major doubles
//! - `OutputFormat::Hdf5` (feature `hdf5`): one dataset per array
//!
//! # Data layout
//!
//! Tensors are held in row-major (C order). `.npz` and HDF5 keep that order;
//! `.mat` output is converted to column-major (Fortran order) as MATLAB expects.

#[cfg(feature = "hdf5")]
mod h5;
mod layout;
mod mat;
mod npz;

use anyhow::Result;
use ipeps_state::{DenseTensor, LoadedState};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Container format of the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Npz,
    Mat,
    #[cfg(feature = "hdf5")]
    Hdf5,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Npz => "npz",
            Self::Mat => "mat",
            #[cfg(feature = "hdf5")]
            Self::Hdf5 => "h5",
        }
    }

    /// Output path used when none is given: `A.<ext>`.
    pub fn default_file_name(&self) -> String {
        format!("A.{}", self.extension())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Write named arrays to `path` in the given format.
pub fn write_arrays(
    path: impl AsRef<Path>,
    format: OutputFormat,
    arrays: &[(&str, &DenseTensor)],
) -> Result<()> {
    let path = path.as_ref();
    match format {
        OutputFormat::Npz => npz::write_npz(path, arrays)?,
        OutputFormat::Mat => mat::write_mat(path, arrays)?,
        #[cfg(feature = "hdf5")]
        OutputFormat::Hdf5 => h5::write_hdf5(path, arrays)?,
    }
    let names: Vec<&str> = arrays.iter().map(|(name, _)| *name).collect();
    info!(path = %path.display(), %format, ?names, "wrote arrays");
    Ok(())
}

/// Write every array of a loaded state (`A`, plus the iPESS tensors if present).
pub fn write_state(path: impl AsRef<Path>, format: OutputFormat, state: &LoadedState) -> Result<()> {
    write_arrays(path, format, &state.named_arrays())
}

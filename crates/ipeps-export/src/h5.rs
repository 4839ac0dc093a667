//! HDF5 output: one row-major dataset per array at the file root.
//!
//! ```text
//! /
//!   A      dataset, @dtype = "float64" | "complex128"
//!   T_u    ...
//! ```

use anyhow::{Context, Result};
use hdf5::types::VarLenUnicode;
use hdf5::{Dataset, File};
use ipeps_state::DenseTensor;
use std::path::Path;
use std::str::FromStr;

pub(crate) fn write_hdf5(path: &Path, arrays: &[(&str, &DenseTensor)]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    for (name, tensor) in arrays {
        let ds = match tensor {
            DenseTensor::F64(a) => {
                let ds = file.new_dataset::<f64>().shape(a.shape()).create(*name)?;
                ds.as_writer().write(a)?;
                ds
            }
            DenseTensor::C64(a) => {
                let ds = file
                    .new_dataset::<num_complex::Complex64>()
                    .shape(a.shape())
                    .create(*name)?;
                ds.as_writer().write(a)?;
                ds
            }
        };
        write_dtype_attr(&ds, tensor.dtype().as_str())
            .with_context(|| format!("Failed to write array {:?}", name))?;
    }
    Ok(())
}

fn write_dtype_attr(ds: &Dataset, dtype: &str) -> Result<()> {
    let attr = ds.new_attr::<VarLenUnicode>().shape(()).create("dtype")?;
    attr.as_writer()
        .write_scalar(&VarLenUnicode::from_str(dtype)?)?;
    Ok(())
}

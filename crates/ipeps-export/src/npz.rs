//! NumPy `.npz` array archives.

use anyhow::{Context, Result};
use ipeps_state::DenseTensor;
use ndarray_npy::NpzWriter;
use std::fs::File;
use std::path::Path;

/// Write `arrays` as `<name>.npy` members of an uncompressed `.npz` archive,
/// the layout `numpy.savez` produces.
pub(crate) fn write_npz(path: &Path, arrays: &[(&str, &DenseTensor)]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut npz = NpzWriter::new(file);
    for (name, tensor) in arrays {
        let written = match tensor {
            DenseTensor::F64(a) => npz.add_array(*name, a),
            DenseTensor::C64(a) => npz.add_array(*name, a),
        };
        written
            .with_context(|| format!("Failed to write array {:?} to {}", name, path.display()))?;
    }
    npz.finish()
        .with_context(|| format!("Failed to finish {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};
    use ndarray_npy::NpzReader;
    use num_complex::Complex64;

    #[test]
    fn test_npz_members_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A.npz");

        let real = DenseTensor::F64(
            ArrayD::from_shape_vec(IxDyn(&[2, 3]), (0..6).map(|i| i as f64).collect()).unwrap(),
        );
        let mut c = ArrayD::<Complex64>::zeros(IxDyn(&[2]));
        c[[1]] = Complex64::new(0.5, -1.5);
        let complex = DenseTensor::C64(c);

        write_npz(&path, &[("A", &real), ("T_u", &complex)]).unwrap();

        let mut npz = NpzReader::new(File::open(&path).unwrap()).unwrap();
        let names = npz.names().unwrap();
        let member = |key: &str| {
            names
                .iter()
                .find(|n| n.trim_end_matches(".npy") == key)
                .cloned()
                .unwrap()
        };
        assert_eq!(names.len(), 2);

        let a: ArrayD<f64> = npz.by_name(&member("A")).unwrap();
        assert_eq!(a.shape(), &[2, 3]);
        assert_eq!(a[[1, 2]], 5.0);
        let t: ArrayD<Complex64> = npz.by_name(&member("T_u")).unwrap();
        assert_eq!(t[[1]], Complex64::new(0.5, -1.5));
    }
}

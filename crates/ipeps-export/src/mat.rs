//! MATLAB Level 5 MAT-file output (uncompressed, little-endian).
//!
//! File layout:
//! ```text
//! header (128 bytes)
//!   text            116 bytes, space padded
//!   subsys offset     8 bytes, zero
//!   version           u16 = 0x0100
//!   endian indicator  "IM"
//! miMATRIX element per array
//!   array flags     miUINT32 [class | complex flag, 0]
//!   dimensions      miINT32  [d0, d1, ...]
//!   array name      miINT8
//!   real part       miDOUBLE (column-major)
//!   imaginary part  miDOUBLE (complex arrays only)
//! ```
//! Every data element is padded to an 8-byte boundary.

use anyhow::{ensure, Context, Result};
use ipeps_state::DenseTensor;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::layout::to_col_major;

const HEADER_TEXT_LEN: usize = 116;
const VERSION: u16 = 0x0100;

const MI_INT8: u32 = 1;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;

const MX_DOUBLE_CLASS: u32 = 6;
const FLAG_COMPLEX: u32 = 0x0800;

/// Longest variable name MATLAB accepts.
const MAX_NAME_LEN: usize = 63;

/// Write `arrays` as double-precision variables of a MAT-file.
pub(crate) fn write_mat(path: &Path, arrays: &[(&str, &DenseTensor)]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    out.write_all(&header())?;
    for (name, tensor) in arrays {
        let element = matrix_element(name, tensor)
            .with_context(|| format!("Failed to encode array {:?}", name))?;
        out.write_all(&element)?;
    }
    out.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn header() -> [u8; 128] {
    let mut header = [b' '; 128];
    let text = format!(
        "MATLAB 5.0 MAT-file, Platform: {}, Created by: ipeps-export {}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );
    let n = text.len().min(HEADER_TEXT_LEN);
    header[..n].copy_from_slice(&text.as_bytes()[..n]);
    header[HEADER_TEXT_LEN..HEADER_TEXT_LEN + 8].fill(0);
    header[124..126].copy_from_slice(&VERSION.to_le_bytes());
    header[126..128].copy_from_slice(b"IM");
    header
}

/// MATLAB variable name rules: a letter followed by letters, digits or underscores.
fn check_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    ensure!(
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && name.len() <= MAX_NAME_LEN,
        "{:?} is not a valid MAT-file variable name",
        name
    );
    Ok(())
}

/// MAT-files have no arrays below rank 2: scalars become 1x1, vectors 1xn.
fn mat_dims(dims: &[usize]) -> Result<Vec<i32>> {
    let dims = match dims {
        [] => vec![1, 1],
        [n] => vec![1, *n],
        _ => dims.to_vec(),
    };
    dims.iter()
        .map(|&d| i32::try_from(d).with_context(|| format!("Dimension {} too large", d)))
        .collect()
}

fn matrix_element(name: &str, tensor: &DenseTensor) -> Result<Vec<u8>> {
    check_name(name)?;
    let dims = mat_dims(tensor.dims())?;

    let mut body = Vec::new();
    let flags = MX_DOUBLE_CLASS | if tensor.is_c64() { FLAG_COMPLEX } else { 0 };
    push_element(&mut body, MI_UINT32, &le_bytes(&[flags, 0], u32::to_le_bytes))?;
    push_element(&mut body, MI_INT32, &le_bytes(&dims, i32::to_le_bytes))?;
    push_element(&mut body, MI_INT8, name.as_bytes())?;
    match tensor {
        DenseTensor::F64(a) => {
            let data = to_col_major(a.view());
            push_element(&mut body, MI_DOUBLE, &le_bytes(&data, f64::to_le_bytes))?;
        }
        DenseTensor::C64(a) => {
            let data = to_col_major(a.view());
            let re: Vec<f64> = data.iter().map(|z| z.re).collect();
            let im: Vec<f64> = data.iter().map(|z| z.im).collect();
            push_element(&mut body, MI_DOUBLE, &le_bytes(&re, f64::to_le_bytes))?;
            push_element(&mut body, MI_DOUBLE, &le_bytes(&im, f64::to_le_bytes))?;
        }
    }

    let mut element = Vec::with_capacity(body.len() + 8);
    push_element(&mut element, MI_MATRIX, &body)?;
    Ok(element)
}

/// Append a tagged data element, padded to 8 bytes.
fn push_element(buf: &mut Vec<u8>, data_type: u32, data: &[u8]) -> Result<()> {
    let len = u32::try_from(data.len())
        .with_context(|| format!("Data element of {} bytes exceeds the MAT v5 limit", data.len()))?;
    buf.extend_from_slice(&data_type.to_le_bytes());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(data);
    buf.resize(buf.len() + (8 - data.len() % 8) % 8, 0);
    Ok(())
}

fn le_bytes<T: Copy, const N: usize>(values: &[T], to_bytes: fn(T) -> [u8; N]) -> Vec<u8> {
    values.iter().flat_map(|&v| to_bytes(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};
    use num_complex::Complex64;

    /// A decoded miMATRIX element.
    #[derive(Debug)]
    struct MatVar {
        name: String,
        flags: u32,
        dims: Vec<i32>,
        re: Vec<f64>,
        im: Option<Vec<f64>>,
    }

    fn u32_at(b: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(b[at..at + 4].try_into().unwrap())
    }

    /// Split a byte run into (type, payload) data elements.
    fn elements(mut b: &[u8]) -> Vec<(u32, &[u8])> {
        let mut out = Vec::new();
        while !b.is_empty() {
            let ty = u32_at(b, 0);
            let len = u32_at(b, 4) as usize;
            out.push((ty, &b[8..8 + len]));
            let padded = len + (8 - len % 8) % 8;
            b = &b[8 + padded..];
        }
        out
    }

    fn doubles(b: &[u8]) -> Vec<f64> {
        b.chunks(8)
            .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
            .collect()
    }

    fn read_mat(bytes: &[u8]) -> Vec<MatVar> {
        assert_eq!(&bytes[126..128], b"IM");
        assert_eq!(u16::from_le_bytes([bytes[124], bytes[125]]), 0x0100);
        elements(&bytes[128..])
            .into_iter()
            .map(|(ty, body)| {
                assert_eq!(ty, MI_MATRIX);
                let sub = elements(body);
                MatVar {
                    flags: u32_at(sub[0].1, 0),
                    dims: sub[1]
                        .1
                        .chunks(4)
                        .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
                        .collect(),
                    name: String::from_utf8(sub[2].1.to_vec()).unwrap(),
                    re: doubles(sub[3].1),
                    im: sub.get(4).map(|(_, b)| doubles(b)),
                }
            })
            .collect()
    }

    #[test]
    fn test_header() {
        let h = header();
        assert!(h.starts_with(b"MATLAB 5.0 MAT-file"));
        assert_eq!(&h[116..124], &[0u8; 8]);
    }

    #[test]
    fn test_write_real_and_complex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A.mat");

        let real = DenseTensor::F64(
            ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap(),
        );
        let mut c = ArrayD::<Complex64>::zeros(IxDyn(&[2, 1, 2]));
        c[[0, 0, 1]] = Complex64::new(1.0, -1.0);
        c[[1, 0, 0]] = Complex64::new(2.0, 3.0);
        let complex = DenseTensor::C64(c);

        write_mat(&path, &[("A", &real), ("T_u", &complex)]).unwrap();
        let vars = read_mat(&std::fs::read(&path).unwrap());
        assert_eq!(vars.len(), 2);

        assert_eq!(vars[0].name, "A");
        assert_eq!(vars[0].flags, MX_DOUBLE_CLASS);
        assert_eq!(vars[0].dims, vec![2, 3]);
        assert_eq!(vars[0].re, vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
        assert!(vars[0].im.is_none());

        assert_eq!(vars[1].name, "T_u");
        assert_eq!(vars[1].flags, MX_DOUBLE_CLASS | FLAG_COMPLEX);
        assert_eq!(vars[1].dims, vec![2, 1, 2]);
        // column-major: (0,0,0) (1,0,0) (0,0,1) (1,0,1)
        assert_eq!(vars[1].re, vec![0.0, 2.0, 1.0, 0.0]);
        assert_eq!(vars[1].im, Some(vec![0.0, 3.0, -1.0, 0.0]));
    }

    #[test]
    fn test_low_rank_dims() {
        assert_eq!(mat_dims(&[]).unwrap(), vec![1, 1]);
        assert_eq!(mat_dims(&[4]).unwrap(), vec![1, 4]);
        assert_eq!(mat_dims(&[4, 1, 2]).unwrap(), vec![4, 1, 2]);
    }

    #[test]
    fn test_name_validation() {
        assert!(check_name("A").is_ok());
        assert!(check_name("B_c").is_ok());
        assert!(check_name("_x").is_err());
        assert!(check_name("1a").is_err());
        assert!(check_name("").is_err());
        assert!(check_name("a-b").is_err());
    }

    #[test]
    fn test_element_padding() {
        let mut buf = Vec::new();
        push_element(&mut buf, MI_INT8, b"T_u").unwrap();
        assert_eq!(buf.len(), 16);
        assert_eq!(u32_at(&buf, 4), 3);
    }
}

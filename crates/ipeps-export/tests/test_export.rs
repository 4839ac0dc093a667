use approx::assert_abs_diff_eq;
use ipeps_export::{write_state, OutputFormat};
use ipeps_state::state_from_document;
use ndarray::ArrayD;
use ndarray_npy::NpzReader;
use serde_json::json;
use std::fs::File;

fn unit_tensor(value: f64) -> serde_json::Value {
    json!({"dims": [1, 1, 1], "dtype": "float64", "entries": [format!("0 0 0 {}", value)]})
}

fn member_names(path: &std::path::Path) -> Vec<String> {
    let mut npz = NpzReader::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = npz
        .names()
        .unwrap()
        .into_iter()
        .map(|n| n.trim_end_matches(".npy").to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_default_file_names() {
    assert_eq!(OutputFormat::Npz.default_file_name(), "A.npz");
    assert_eq!(OutputFormat::Mat.default_file_name(), "A.mat");
}

#[test]
fn test_write_ipess_state_npz() {
    let state = state_from_document(&json!({"ipess_tensors": {
        "T_u": unit_tensor(2.0),
        "T_d": unit_tensor(3.0),
        "B_a": unit_tensor(0.5),
        "B_b": unit_tensor(1.0),
        "B_c": unit_tensor(-1.0),
    }}))
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.npz");
    write_state(&path, OutputFormat::Npz, &state).unwrap();

    assert_eq!(
        member_names(&path),
        vec!["A", "B_a", "B_b", "B_c", "T_d", "T_u"]
    );

    let mut npz = NpzReader::new(File::open(&path).unwrap()).unwrap();
    let name = npz
        .names()
        .unwrap()
        .into_iter()
        .find(|n| n.trim_end_matches(".npy") == "A")
        .unwrap();
    let a: ArrayD<f64> = npz.by_name(&name).unwrap();
    assert_eq!(a.shape(), &[1, 1, 1, 1, 1]);
    assert_abs_diff_eq!(a[[0, 0, 0, 0, 0]], -3.0, epsilon = 1e-14);
}

#[test]
fn test_write_single_site_mat() {
    let state = state_from_document(&json!({"sites": [
        {"physDim": 2, "auxDim": 1, "entries": ["1 0 0 0 0 1.0 -1.0"]}
    ]}))
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.mat");
    write_state(&path, OutputFormat::Mat, &state).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"MATLAB 5.0 MAT-file"));
    // header + one miMATRIX: tag(8) + flags(16) + dims(8 + 24) + name(16) + re(8 + 16) + im(8 + 16)
    assert_eq!(bytes.len(), 128 + 8 + 16 + 32 + 16 + 24 + 24);
    // complex double class
    let flags = u32::from_le_bytes(bytes[144..148].try_into().unwrap());
    assert_eq!(flags, 0x0800 | 6);
}

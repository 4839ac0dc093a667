//! Command-line conversion of JSON iPEPS / iPESS states to array files.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ipeps_export::{write_state, OutputFormat};
use ipeps_state::load_state;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ipeps-convert")]
#[command(about = "Convert a sparse JSON iPEPS/iPESS state into dense arrays")]
pub struct Args {
    /// State to parse
    #[arg(long)]
    pub instate: PathBuf,

    /// Output file name [default: A.<format>]
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Desired output format
    #[arg(long, value_enum, default_value_t = FormatArg::Npz)]
    pub format: FormatArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    /// NumPy array archive
    #[value(alias = "archive")]
    Npz,
    /// MATLAB Level 5 MAT-file
    #[value(alias = "matrixfile")]
    Mat,
    /// HDF5 file, one dataset per array
    #[cfg(feature = "hdf5")]
    #[value(name = "hdf5", alias = "h5")]
    Hdf5,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Npz => OutputFormat::Npz,
            FormatArg::Mat => OutputFormat::Mat,
            #[cfg(feature = "hdf5")]
            FormatArg::Hdf5 => OutputFormat::Hdf5,
        }
    }
}

impl Args {
    /// `--out`, or `A.<ext>` for the chosen format.
    pub fn output_path(&self) -> PathBuf {
        self.out.clone().unwrap_or_else(|| {
            PathBuf::from(OutputFormat::from(self.format).default_file_name())
        })
    }
}

/// Load the input state and write it out; returns the path written.
pub fn run(args: &Args) -> Result<PathBuf> {
    let state = load_state(&args.instate)
        .with_context(|| format!("Failed to load state from {}", args.instate.display()))?;
    let onsite = state.onsite();
    info!(layout = ?state.layout(), dims = ?onsite.dims(), dtype = %onsite.dtype(), "on-site tensor");
    let out = args.output_path();
    write_state(&out, args.format.into(), &state)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["ipeps-convert", "--instate", "state.json"]).unwrap();
        assert_eq!(args.instate, PathBuf::from("state.json"));
        assert_eq!(args.format, FormatArg::Npz);
        assert_eq!(args.output_path(), PathBuf::from("A.npz"));
    }

    #[test]
    fn test_format_aliases() {
        let args = Args::try_parse_from([
            "ipeps-convert",
            "--instate",
            "s.json",
            "--format",
            "matrixfile",
        ])
        .unwrap();
        assert_eq!(args.format, FormatArg::Mat);
        assert_eq!(args.output_path(), PathBuf::from("A.mat"));

        let args = Args::try_parse_from([
            "ipeps-convert",
            "--instate",
            "s.json",
            "--format",
            "archive",
            "--out",
            "x.npz",
        ])
        .unwrap();
        assert_eq!(args.format, FormatArg::Npz);
        assert_eq!(args.output_path(), PathBuf::from("x.npz"));
    }

    #[test]
    fn test_argument_errors() {
        assert!(Args::try_parse_from(["ipeps-convert"]).is_err());
        assert!(Args::try_parse_from(["ipeps-convert", "--instate", "s.json", "--bogus"]).is_err());
        assert!(Args::try_parse_from([
            "ipeps-convert",
            "--instate",
            "s.json",
            "--format",
            "csv"
        ])
        .is_err());
        // no prefix matching of long options
        assert!(Args::try_parse_from(["ipeps-convert", "--inst", "s.json"]).is_err());
    }
}

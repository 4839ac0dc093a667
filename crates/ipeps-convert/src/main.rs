//! `ipeps-convert --instate <state.json> [--out <file>] [--format npz|mat]`
//!
//! Log output goes to stderr and is filtered through `RUST_LOG` (default `info`).

use anyhow::Result;
use clap::Parser;
use ipeps_convert::{run, Args};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let out = run(&args)?;
    tracing::info!("Wrote {}", out.display());
    Ok(())
}

//! Command-line argument parsing for the two drivers

use crate::backend::BackendKind;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Compute one-/two-electron integrals for a molecule and dump them to HDF5
#[derive(Parser, Debug)]
#[command(name = "dump-integrals", author, version, about, long_about = None)]
pub struct DumpArgs {
    /// Path to the YAML configuration file
    pub config_file: PathBuf,

    /// Override the Gaussian basis set named in the configuration
    pub basis_set_name: Option<String>,

    /// Archive path, or an existing directory for the canonically named
    /// archive (default: canonical name in the working directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the integral backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Override the Python interpreter running the backend
    #[arg(long)]
    pub python: Option<String>,

    /// Override the deflate level of the tensors (0 disables compression)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub compression: Option<u8>,

    /// Write the log to this file instead of stdout
    #[arg(long)]
    pub log_file: Option<String>,
}

/// Run an SCF calculation on the system and basis stored in an integral archive
#[derive(Parser, Debug)]
#[command(name = "run-scf", author, version, about, long_about = None)]
pub struct RunScfArgs {
    /// Path to the HDF5 integral archive
    pub archive: PathBuf,

    /// Restricted (true) or unrestricted (false) SCF
    #[arg(default_value = "true", value_parser = parse_restricted, action = ArgAction::Set)]
    pub restricted: bool,

    /// SCF backend (default: pyscf for gaussian, molsturm for sturmian archives)
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Python interpreter running the backend
    #[arg(long)]
    pub python: Option<String>,

    /// Load the stored tensors and check their shapes and symmetry first
    #[arg(long)]
    pub verify_integrals: bool,

    /// Write the log to this file instead of stdout
    #[arg(long)]
    pub log_file: Option<String>,
}

/// Only the literal strings `true` and `false` are accepted.
pub fn parse_restricted(value: &str) -> Result<bool, String> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!(
            "restricted must be either 'true' or 'false', got '{other}'"
        )),
    }
}

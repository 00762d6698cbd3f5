//! The two driver applications
//!
//! `dump-integrals` turns a YAML configuration into an integral archive,
//! `run-scf` hands the system and basis stored in an archive to an SCF solver.

mod dump;
mod scf;

#[cfg(test)]
mod tests;

pub use dump::DumpApplication;
pub use scf::{ScfApplication, SYMMETRY_TOLERANCE};

use crate::backend::{PythonRuntime, DEFAULT_INTERPRETER};
use crate::config::DumpConfig;
use color_eyre::eyre::{Result, WrapErr};
use std::fs;
use std::path::Path;
use tracing::info;

fn load_config(path: &Path) -> Result<DumpConfig> {
    info!("Reading configuration from: {}", path.display());
    let config_content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", path.display()))?;

    DumpConfig::from_yaml(&config_content).wrap_err("Failed to parse configuration file")
}

/// Command-line interpreter, then configuration, then `python3`.
fn python_runtime(cli: Option<&str>, config: Option<&str>) -> PythonRuntime {
    PythonRuntime::new(cli.or(config).unwrap_or(DEFAULT_INTERPRETER))
}

//! Integral dump command-line interface
//!
//! Reads a YAML configuration, computes the integrals with the selected
//! backend and writes them to an HDF5 archive.

use color_eyre::eyre::Result;
use integral_dump::app::DumpApplication;

fn main() -> Result<()> {
    color_eyre::install()?;

    DumpApplication::from_cli()?.run()?;
    Ok(())
}

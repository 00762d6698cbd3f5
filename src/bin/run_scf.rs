//! SCF runner for integral archives

use color_eyre::eyre::Result;
use integral_dump::app::ScfApplication;

fn main() -> Result<()> {
    color_eyre::install()?;

    ScfApplication::from_cli()?.run()?;
    Ok(())
}

//! Human-readable summaries of archives and SCF runs

use crate::archive::TensorInfo;
use crate::backend::ScfOutcome;
use crate::model::{Discretisation, MolecularSystem, SymmetryReport};
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

/// Print the nuclear framework and occupation of `system` to a writer
pub fn write_system_table<W: Write>(writer: &mut W, system: &MolecularSystem) -> io::Result<()> {
    writeln!(
        writer,
        "System: {} atoms, {} electrons (alpha={}, beta={}), charge {}, multiplicity {}",
        system.n_atoms(),
        system.n_electrons(),
        system.n_alpha(),
        system.n_beta(),
        system.charge(),
        system.multiplicity()
    )?;
    for (i, (coord, symbol)) in system
        .coordinates()
        .iter()
        .zip(system.element_symbols())
        .enumerate()
    {
        writeln!(
            writer,
            "  Atom {}: {:<2} at [{:.6}, {:.6}, {:.6}]",
            i + 1,
            symbol,
            coord.x,
            coord.y,
            coord.z
        )?;
    }
    Ok(())
}

pub fn log_archive_summary(
    path: &Path,
    system: &MolecularSystem,
    discretisation: &Discretisation,
    tensors: &[TensorInfo],
) {
    info!("Archive: {}", path.display());

    let mut table = Vec::new();
    if write_system_table(&mut table, system).is_ok() {
        for line in String::from_utf8_lossy(&table).lines() {
            info!("{}", line);
        }
    }

    info!("Discretisation: {}", discretisation);
    info!("  real harmonics: {}", discretisation.has_real_harmonics());
    if let Some(labels) = discretisation.nlm_basis() {
        info!("  {} labelled basis functions", labels.len());
    }

    info!("Integral tensors:");
    for tensor in tensors {
        info!("  {:<20} {:?} at {}", tensor.name.key(), tensor.shape, tensor.location);
    }
}

/// Log the largest symmetry deviation of each tensor. Returns whether all of
/// them are within `tolerance`.
pub fn log_symmetry_report(report: &SymmetryReport, tolerance: f64) -> bool {
    for (name, deviation) in &report.deviations {
        info!("  {:<20} max asymmetry {:.3e}", name.key(), deviation);
    }
    let symmetric = report.is_symmetric(tolerance);
    if symmetric {
        info!("Integral tensors are symmetric within {:.1e}", tolerance);
    } else {
        warn!(
            "Integral tensors deviate from the expected symmetry by up to {:.3e}",
            report.max_deviation()
        );
    }
    symmetric
}

/// Pass the solver's own report through unchanged
pub fn print_scf_report<W: Write>(writer: &mut W, outcome: &ScfOutcome) -> io::Result<()> {
    writer.write_all(outcome.report.as_bytes())?;
    writer.flush()
}

use super::python_runtime;
use crate::archive::ArchiveReader;
use crate::backend::{BackendKind, ScfMode, ScfOutcome, ScfSolver};
use crate::config::RunScfArgs;
use crate::io::{log_archive_summary, log_symmetry_report, print_scf_report, setup_output};
use crate::model::{Discretisation, MolecularSystem};
use clap::Parser;
use color_eyre::eyre::{bail, Result, WrapErr};
use tracing::info;

/// Largest tolerated asymmetry of stored tensors under `--verify-integrals`.
pub const SYMMETRY_TOLERANCE: f64 = 1e-8;

pub struct ScfApplication {
    args: RunScfArgs,
}

impl ScfApplication {
    pub fn from_cli() -> Result<Self> {
        Ok(Self::new(RunScfArgs::parse()))
    }

    pub fn new(args: RunScfArgs) -> Self {
        Self { args }
    }

    pub fn mode(&self) -> ScfMode {
        ScfMode::from_restricted(self.args.restricted)
    }

    pub fn run(self) -> Result<ScfOutcome> {
        setup_output(self.args.log_file.as_deref());

        let (system, discretisation) = self.load()?;
        let kind = self
            .args
            .backend
            .unwrap_or_else(|| BackendKind::default_for(&discretisation));
        let solver = kind.scf_solver(python_runtime(self.args.python.as_deref(), None));
        self.solve(solver.as_ref(), &system, &discretisation)
    }

    pub fn run_with(&self, solver: &dyn ScfSolver) -> Result<ScfOutcome> {
        let (system, discretisation) = self.load()?;
        self.solve(solver, &system, &discretisation)
    }

    /// Read system and discretisation, optionally verifying the stored
    /// tensors. The archive is closed again before any solver starts.
    fn load(&self) -> Result<(MolecularSystem, Discretisation)> {
        let reader = ArchiveReader::open(&self.args.archive)
            .wrap_err_with(|| format!("Cannot open integral archive {}", self.args.archive.display()))?;
        let (system, discretisation) = reader
            .read_metadata()
            .wrap_err("Failed to read system and discretisation")?;
        log_archive_summary(reader.path(), &system, &discretisation, &reader.list_tensors());

        if self.args.verify_integrals {
            info!("Verifying stored integral tensors");
            let integrals = reader
                .read_integrals()
                .wrap_err("Stored integral tensors are malformed")?;
            if !log_symmetry_report(&integrals.check_symmetry(), SYMMETRY_TOLERANCE) {
                bail!(
                    "Integral tensors in {} fail the symmetry check",
                    self.args.archive.display()
                );
            }
        }

        Ok((system, discretisation))
    }

    fn solve(
        &self,
        solver: &dyn ScfSolver,
        system: &MolecularSystem,
        discretisation: &Discretisation,
    ) -> Result<ScfOutcome> {
        let mode = self.mode();
        info!("Starting {} SCF with {}", mode, solver.name());

        let outcome = solver
            .run(system, discretisation, mode)
            .wrap_err_with(|| format!("SCF with {} failed", solver.name()))?;
        print_scf_report(&mut std::io::stdout().lock(), &outcome)?;
        Ok(outcome)
    }
}

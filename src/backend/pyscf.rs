use super::python::{Job, PythonRuntime, Task};
use super::{ensure_supported, BasisInfo, IntegralBackend, ScfMode, ScfOutcome, ScfSolver};
use crate::error::{ArchiveError, Result};
use crate::model::{Discretisation, IntegralTensorSet, MolecularSystem};
use std::fmt;
use tracing::info;

const NAME: &str = "pyscf";
const DRIVER: &str = include_str!("scripts/pyscf_driver.py");

/// Hartree-Fock flavour handed to PySCF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PyscfMethod {
    Rhf,
    Rohf,
    Uhf,
}

impl PyscfMethod {
    /// One electron or zero spin is always run as RHF and may not be asked
    /// for unrestricted. Open shells get ROHF or UHF.
    pub fn select(system: &MolecularSystem, mode: ScfMode) -> Result<Self> {
        if system.n_electrons() == 1 || system.is_closed_shell() {
            if !mode.is_restricted() {
                return Err(ArchiveError::Argument(
                    "closed-shell systems are always restricted".to_string(),
                ));
            }
            return Ok(PyscfMethod::Rhf);
        }
        Ok(match mode {
            ScfMode::Restricted => PyscfMethod::Rohf,
            ScfMode::Unrestricted => PyscfMethod::Uhf,
        })
    }

    /// Class name in `pyscf.scf`.
    pub fn as_str(self) -> &'static str {
        match self {
            PyscfMethod::Rhf => "RHF",
            PyscfMethod::Rohf => "ROHF",
            PyscfMethod::Uhf => "UHF",
        }
    }
}

impl fmt::Display for PyscfMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PySCF driver. Gaussian basis sets only.
#[derive(Debug, Clone, Default)]
pub struct PyscfBackend {
    runtime: PythonRuntime,
}

impl PyscfBackend {
    pub fn new(runtime: PythonRuntime) -> Self {
        Self { runtime }
    }
}

impl IntegralBackend for PyscfBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn supports(&self, discretisation: &Discretisation) -> bool {
        matches!(discretisation, Discretisation::Gaussian { .. })
    }

    fn construct_basis(
        &self,
        system: &MolecularSystem,
        discretisation: &Discretisation,
    ) -> Result<BasisInfo> {
        ensure_supported(self, discretisation)?;
        let job = Job::new(Task::Basis, system, discretisation);
        self.runtime.run(NAME, DRIVER, &job)?.basis_info()
    }

    fn compute_integrals(
        &self,
        system: &MolecularSystem,
        discretisation: &Discretisation,
    ) -> Result<(BasisInfo, IntegralTensorSet)> {
        ensure_supported(self, discretisation)?;
        let job = Job::new(Task::Integrals, system, discretisation);
        let run = self.runtime.run(NAME, DRIVER, &job)?;
        Ok((run.basis_info()?, run.tensors()?))
    }
}

impl ScfSolver for PyscfBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(
        &self,
        system: &MolecularSystem,
        discretisation: &Discretisation,
        mode: ScfMode,
    ) -> Result<ScfOutcome> {
        ensure_supported(self, discretisation)?;
        let method = PyscfMethod::select(system, mode)?;
        info!("Running {} {} for {}", NAME, method, discretisation);

        let job = Job::new(Task::Scf, system, discretisation).with_method(method.as_str());
        let run = self.runtime.run(NAME, DRIVER, &job)?;
        Ok(ScfOutcome {
            solver: NAME,
            report: run.stdout,
        })
    }
}

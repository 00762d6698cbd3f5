use super::python::{Job, PythonRuntime, Task};
use super::{BasisInfo, IntegralBackend, ScfMode, ScfOutcome, ScfSolver};
use crate::error::Result;
use crate::model::{Discretisation, IntegralTensorSet, MolecularSystem};
use tracing::info;

const NAME: &str = "molsturm";
const DRIVER: &str = include_str!("scripts/molsturm_driver.py");

/// molsturm driver, for Gaussian and atomic Sturmian bases alike.
///
/// molsturm chooses the SCF flavour itself, so the requested [`ScfMode`] is
/// only reported.
#[derive(Debug, Clone, Default)]
pub struct MolsturmBackend {
    runtime: PythonRuntime,
}

impl MolsturmBackend {
    pub fn new(runtime: PythonRuntime) -> Self {
        Self { runtime }
    }
}

impl IntegralBackend for MolsturmBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn supports(&self, _discretisation: &Discretisation) -> bool {
        true
    }

    fn construct_basis(
        &self,
        system: &MolecularSystem,
        discretisation: &Discretisation,
    ) -> Result<BasisInfo> {
        let job = Job::new(Task::Basis, system, discretisation);
        self.runtime.run(NAME, DRIVER, &job)?.basis_info()
    }

    fn compute_integrals(
        &self,
        system: &MolecularSystem,
        discretisation: &Discretisation,
    ) -> Result<(BasisInfo, IntegralTensorSet)> {
        let job = Job::new(Task::Integrals, system, discretisation);
        let run = self.runtime.run(NAME, DRIVER, &job)?;
        Ok((run.basis_info()?, run.tensors()?))
    }
}

impl ScfSolver for MolsturmBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(
        &self,
        system: &MolecularSystem,
        discretisation: &Discretisation,
        mode: ScfMode,
    ) -> Result<ScfOutcome> {
        info!(
            "Running {} SCF for {} (requested {}, flavour chosen by {})",
            NAME, discretisation, mode, NAME
        );

        let job = Job::new(Task::Scf, system, discretisation);
        let run = self.runtime.run(NAME, DRIVER, &job)?;
        Ok(ScfOutcome {
            solver: NAME,
            report: run.stdout,
        })
    }
}

//! External collaborators
//!
//! Basis construction, integral evaluation and the SCF procedure itself are
//! delegated to quantum-chemistry packages. The traits below are the seams the
//! applications talk to; the concrete drivers run those packages as Python
//! subprocesses.

mod molsturm;
mod pyscf;
mod python;


pub use molsturm::MolsturmBackend;
pub use pyscf::{PyscfBackend, PyscfMethod};
pub use python::{load_npy, PythonRuntime, DEFAULT_INTERPRETER};

use crate::error::{ArchiveError, Result};
use crate::model::{Discretisation, IntegralTensorSet, MolecularSystem, Nlm};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a backend reports about the basis it built for a system.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisInfo {
    pub n_basis: usize,
    pub has_real_harmonics: bool,
    /// Per-function `(n, l, m)` labels, only for atomic Sturmian bases.
    pub nlm_basis: Option<Vec<Nlm>>,
}

impl BasisInfo {
    /// Carry the properties of the constructed basis over to `discretisation`.
    ///
    /// Labels are only attached to Sturmian discretisations, and only when
    /// their count matches the basis size.
    pub fn refine(&self, discretisation: Discretisation) -> Result<Discretisation> {
        let refined = discretisation.with_real_harmonics(self.has_real_harmonics);
        match &self.nlm_basis {
            Some(labels) if labels.len() != self.n_basis => Err(ArchiveError::schema(
                "discretisation/nlm_basis",
                format!(
                    "backend reported {} labels for {} basis functions",
                    labels.len(),
                    self.n_basis
                ),
            )),
            Some(labels) => Ok(refined.with_nlm_basis(labels.clone())),
            None => Ok(refined),
        }
    }
}

/// Builds bases and evaluates the four integral tensors over them.
pub trait IntegralBackend {
    fn name(&self) -> &'static str;

    fn supports(&self, discretisation: &Discretisation) -> bool;

    fn construct_basis(
        &self,
        system: &MolecularSystem,
        discretisation: &Discretisation,
    ) -> Result<BasisInfo>;

    fn compute_integrals(
        &self,
        system: &MolecularSystem,
        discretisation: &Discretisation,
    ) -> Result<(BasisInfo, IntegralTensorSet)>;
}

/// Restricted or unrestricted treatment of the spin orbitals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScfMode {
    Restricted,
    Unrestricted,
}

impl ScfMode {
    pub fn from_restricted(restricted: bool) -> Self {
        if restricted {
            ScfMode::Restricted
        } else {
            ScfMode::Unrestricted
        }
    }

    pub fn is_restricted(self) -> bool {
        self == ScfMode::Restricted
    }
}

impl fmt::Display for ScfMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScfMode::Restricted => write!(f, "restricted"),
            ScfMode::Unrestricted => write!(f, "unrestricted"),
        }
    }
}

/// Output of an SCF run, passed through without interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScfOutcome {
    pub solver: &'static str,
    pub report: String,
}

pub trait ScfSolver {
    fn name(&self) -> &'static str;

    fn run(
        &self,
        system: &MolecularSystem,
        discretisation: &Discretisation,
        mode: ScfMode,
    ) -> Result<ScfOutcome>;
}

/// Selects one of the bundled subprocess drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Pyscf,
    Molsturm,
}

impl BackendKind {
    /// PySCF only knows Gaussian bases, so Sturmian work goes to molsturm.
    pub fn default_for(discretisation: &Discretisation) -> Self {
        match discretisation {
            Discretisation::Gaussian { .. } => BackendKind::Pyscf,
            Discretisation::AtomicSturmian { .. } => BackendKind::Molsturm,
        }
    }

    pub fn integral_backend(self, runtime: PythonRuntime) -> Box<dyn IntegralBackend> {
        match self {
            BackendKind::Pyscf => Box::new(PyscfBackend::new(runtime)),
            BackendKind::Molsturm => Box::new(MolsturmBackend::new(runtime)),
        }
    }

    pub fn scf_solver(self, runtime: PythonRuntime) -> Box<dyn ScfSolver> {
        match self {
            BackendKind::Pyscf => Box::new(PyscfBackend::new(runtime)),
            BackendKind::Molsturm => Box::new(MolsturmBackend::new(runtime)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Pyscf => write!(f, "pyscf"),
            BackendKind::Molsturm => write!(f, "molsturm"),
        }
    }
}

/// Fail early when `backend` cannot handle `discretisation`.
pub(crate) fn ensure_supported(
    backend: &dyn IntegralBackend,
    discretisation: &Discretisation,
) -> Result<()> {
    if backend.supports(discretisation) {
        Ok(())
    } else {
        Err(ArchiveError::Argument(format!(
            "backend '{}' cannot handle {} discretisations",
            backend.name(),
            discretisation.tag()
        )))
    }
}

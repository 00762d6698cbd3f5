//! Data model of an integral archive
//!
//! A molecular system, the integral tensors computed for it, and the basis
//! family those tensors were evaluated in.

mod discretisation;
mod system;
mod tensors;


pub use discretisation::{Discretisation, Nlm, ATOMIC_STURMIAN_TAG, GAUSSIAN_TAG};
pub use system::MolecularSystem;
pub use tensors::{IntegralTensorSet, SymmetryReport, TensorName};

use crate::error::{ArchiveError, Result};

/// Everything persisted in one archive file.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegralArchive {
    pub system: MolecularSystem,
    pub integrals: IntegralTensorSet,
    pub discretisation: Discretisation,
}

impl IntegralArchive {
    pub fn new(
        system: MolecularSystem,
        integrals: IntegralTensorSet,
        discretisation: Discretisation,
    ) -> Result<Self> {
        let archive = Self {
            system,
            integrals,
            discretisation,
        };
        archive.validate()?;
        Ok(archive)
    }

    /// Check the discretisation and that any basis labels match the tensors.
    /// The fields are public, so writers call this again before persisting.
    pub fn validate(&self) -> Result<()> {
        self.discretisation.validate()?;
        if let Some(labels) = self.discretisation.nlm_basis() {
            if labels.len() != self.integrals.n_basis() {
                return Err(ArchiveError::schema(
                    "discretisation/nlm_basis",
                    format!(
                        "{} basis labels for {} basis functions",
                        labels.len(),
                        self.integrals.n_basis()
                    ),
                ));
            }
        }
        Ok(())
    }
}

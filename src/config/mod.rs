//! Configuration for integral dumps
//!
//! A dump is described by a YAML file holding the geometry, the electron
//! occupation and the discretisation. Optional fields are filled by
//! `with_defaults`, and command-line values take precedence over both.

mod args;

pub use args::{parse_restricted, DumpArgs, RunScfArgs};

use crate::backend::{BackendKind, DEFAULT_INTERPRETER};
use crate::error::{ArchiveError, Result};
use crate::model::{Discretisation, MolecularSystem};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_COMPRESSION: u8 = 4;

/// Main configuration structure for integral dumps
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DumpConfig {
    pub geometry: Vec<Atom>,
    /// Explicit `[alpha, beta]` occupation. Takes precedence over
    /// `charge` and `multiplicity`.
    pub electrons: Option<[usize; 2]>,
    pub charge: Option<i32>,
    pub multiplicity: Option<usize>,
    pub discretisation: DiscretisationConfig,
    pub backend: Option<BackendKind>,
    pub output: Option<PathBuf>,
    pub compression: Option<u8>,
    pub python: Option<String>,
}

/// Atomic position configuration, in Bohr
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Atom {
    pub element: String,
    pub coords: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum DiscretisationConfig {
    #[serde(rename = "gaussian")]
    Gaussian {
        basis_set_name: String,
        has_real_harmonics: Option<bool>,
    },
    #[serde(rename = "sturmian/atomic")]
    AtomicSturmian {
        k_exp: f64,
        n_max: u32,
        l_max: u32,
        /// Defaults to `l_max`.
        m_max: Option<u32>,
        has_real_harmonics: Option<bool>,
    },
}

impl DiscretisationConfig {
    pub fn with_defaults(self) -> Self {
        match self {
            DiscretisationConfig::Gaussian {
                basis_set_name,
                has_real_harmonics,
            } => DiscretisationConfig::Gaussian {
                basis_set_name,
                has_real_harmonics: has_real_harmonics.or(Some(true)),
            },
            DiscretisationConfig::AtomicSturmian {
                k_exp,
                n_max,
                l_max,
                m_max,
                has_real_harmonics,
            } => DiscretisationConfig::AtomicSturmian {
                k_exp,
                n_max,
                l_max,
                m_max: m_max.or(Some(l_max)),
                has_real_harmonics: has_real_harmonics.or(Some(true)),
            },
        }
    }

    /// Replace the Gaussian basis set name. Sturmian configurations have no
    /// basis set name to override.
    pub fn override_basis_set(self, name: &str) -> Result<Self> {
        match self {
            DiscretisationConfig::Gaussian {
                has_real_harmonics,
                ..
            } => Ok(DiscretisationConfig::Gaussian {
                basis_set_name: name.to_string(),
                has_real_harmonics,
            }),
            DiscretisationConfig::AtomicSturmian { .. } => Err(ArchiveError::Argument(format!(
                "basis set '{name}' given, but the configuration uses a sturmian/atomic discretisation"
            ))),
        }
    }

    pub fn to_discretisation(&self) -> Result<Discretisation> {
        let discretisation = match self {
            DiscretisationConfig::Gaussian {
                basis_set_name,
                has_real_harmonics,
            } => Discretisation::gaussian(basis_set_name.trim())
                .with_real_harmonics(has_real_harmonics.unwrap_or(true)),
            DiscretisationConfig::AtomicSturmian {
                k_exp,
                n_max,
                l_max,
                m_max,
                has_real_harmonics,
            } => Discretisation::atomic_sturmian(*k_exp, *n_max, *l_max, m_max.unwrap_or(*l_max))
                .with_real_harmonics(has_real_harmonics.unwrap_or(true)),
        };
        discretisation.validate()?;
        Ok(discretisation)
    }
}

impl DumpConfig {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.electrons.is_none() {
            self.charge = self.charge.or(Some(0));
            self.multiplicity = self.multiplicity.or(Some(1));
        }
        self.discretisation = self.discretisation.with_defaults();
        if self.backend.is_none() {
            // the default backend only depends on the discretisation family
            if let Ok(discretisation) = self.discretisation.to_discretisation() {
                self.backend = Some(BackendKind::default_for(&discretisation));
            }
        }
        if self.compression.is_none() {
            self.compression = Some(DEFAULT_COMPRESSION);
        }
        if self.python.is_none() {
            self.python = Some(DEFAULT_INTERPRETER.to_string());
        }
        self
    }

    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yml::Error> {
        serde_yml::from_str::<DumpConfig>(content).map(DumpConfig::with_defaults)
    }

    pub fn to_system(&self) -> Result<MolecularSystem> {
        let symbols: Vec<&str> = self.geometry.iter().map(|a| a.element.as_str()).collect();
        let coords: Vec<Vector3<f64>> = self
            .geometry
            .iter()
            .map(|a| Vector3::new(a.coords[0], a.coords[1], a.coords[2]))
            .collect();

        match self.electrons {
            Some([alpha, beta]) => MolecularSystem::from_symbols(&symbols, coords, (alpha, beta)),
            None => MolecularSystem::from_charge_and_multiplicity(
                &symbols,
                coords,
                self.charge.unwrap_or(0),
                self.multiplicity.unwrap_or(1),
            ),
        }
    }

    pub fn to_discretisation(&self) -> Result<Discretisation> {
        self.discretisation.to_discretisation()
    }

    /// Backend named in the configuration, or the default for its
    /// discretisation family.
    pub fn backend_kind(&self) -> Result<BackendKind> {
        match self.backend {
            Some(kind) => Ok(kind),
            None => Ok(BackendKind::default_for(&self.to_discretisation()?)),
        }
    }
}

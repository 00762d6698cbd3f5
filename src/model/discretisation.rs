use crate::error::{ArchiveError, Result};
use serde::Serialize;
use std::fmt;

pub const GAUSSIAN_TAG: &str = "gaussian";
pub const ATOMIC_STURMIAN_TAG: &str = "sturmian/atomic";

/// Quantum-number label `(n, l, m)` of one atomic Sturmian basis function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Nlm {
    pub n: u32,
    pub l: u32,
    pub m: i32,
}

impl Nlm {
    pub fn new(n: u32, l: u32, m: i32) -> Self {
        Self { n, l, m }
    }
}

impl fmt::Display for Nlm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.n, self.l, self.m)
    }
}

/// Basis family used to discretise the electronic problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Discretisation {
    #[serde(rename = "gaussian")]
    Gaussian {
        basis_set_name: String,
        has_real_harmonics: bool,
    },
    #[serde(rename = "sturmian/atomic")]
    AtomicSturmian {
        k_exp: f64,
        n_max: u32,
        l_max: u32,
        m_max: u32,
        nlm_basis: Option<Vec<Nlm>>,
        has_real_harmonics: bool,
    },
}

impl Discretisation {
    pub fn gaussian(basis_set_name: impl Into<String>) -> Self {
        Discretisation::Gaussian {
            basis_set_name: basis_set_name.into(),
            has_real_harmonics: true,
        }
    }

    pub fn atomic_sturmian(k_exp: f64, n_max: u32, l_max: u32, m_max: u32) -> Self {
        Discretisation::AtomicSturmian {
            k_exp,
            n_max,
            l_max,
            m_max,
            nlm_basis: None,
            has_real_harmonics: true,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Discretisation::Gaussian { .. } => GAUSSIAN_TAG,
            Discretisation::AtomicSturmian { .. } => ATOMIC_STURMIAN_TAG,
        }
    }

    pub fn has_real_harmonics(&self) -> bool {
        match self {
            Discretisation::Gaussian {
                has_real_harmonics, ..
            }
            | Discretisation::AtomicSturmian {
                has_real_harmonics, ..
            } => *has_real_harmonics,
        }
    }

    pub fn basis_set_name(&self) -> Option<&str> {
        match self {
            Discretisation::Gaussian { basis_set_name, .. } => Some(basis_set_name),
            Discretisation::AtomicSturmian { .. } => None,
        }
    }

    pub fn nlm_basis(&self) -> Option<&[Nlm]> {
        match self {
            Discretisation::AtomicSturmian {
                nlm_basis: Some(labels),
                ..
            } => Some(labels),
            _ => None,
        }
    }

    pub fn with_real_harmonics(mut self, real: bool) -> Self {
        match &mut self {
            Discretisation::Gaussian {
                has_real_harmonics, ..
            }
            | Discretisation::AtomicSturmian {
                has_real_harmonics, ..
            } => *has_real_harmonics = real,
        }
        self
    }

    /// Attach explicit basis-function labels. Gaussian descriptors carry no
    /// labels and are returned unchanged.
    pub fn with_nlm_basis(mut self, labels: Vec<Nlm>) -> Self {
        if let Discretisation::AtomicSturmian { nlm_basis, .. } = &mut self {
            *nlm_basis = Some(labels);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Discretisation::Gaussian { basis_set_name, .. } => {
                if basis_set_name.trim().is_empty() {
                    return Err(ArchiveError::schema(
                        "discretisation/basis_set_name",
                        "basis set name is empty",
                    ));
                }
            }
            Discretisation::AtomicSturmian {
                k_exp,
                n_max,
                l_max,
                m_max,
                nlm_basis,
                ..
            } => {
                if !k_exp.is_finite() || *k_exp <= 0.0 {
                    return Err(ArchiveError::schema(
                        "discretisation/k_exp",
                        format!("exponent must be positive, got {k_exp}"),
                    ));
                }
                if *n_max == 0 || l_max >= n_max {
                    return Err(ArchiveError::schema(
                        "discretisation/l_max",
                        format!("require 0 <= l_max < n_max, got n_max={n_max} l_max={l_max}"),
                    ));
                }
                if m_max > l_max {
                    return Err(ArchiveError::schema(
                        "discretisation/m_max",
                        format!("require m_max <= l_max, got l_max={l_max} m_max={m_max}"),
                    ));
                }
                if let Some(labels) = nlm_basis {
                    if let Some(bad) = labels.iter().find(|nlm| {
                        nlm.n == 0
                            || nlm.n > *n_max
                            || nlm.l >= nlm.n
                            || nlm.l > *l_max
                            || nlm.m.unsigned_abs() > nlm.l.min(*m_max)
                    }) {
                        return Err(ArchiveError::schema(
                            "discretisation/nlm_basis",
                            format!("label {bad} lies outside n_max={n_max} l_max={l_max} m_max={m_max}"),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Discretisation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discretisation::Gaussian { basis_set_name, .. } => {
                write!(f, "{GAUSSIAN_TAG} ({basis_set_name})")
            }
            Discretisation::AtomicSturmian {
                k_exp,
                n_max,
                l_max,
                m_max,
                ..
            } => write!(
                f,
                "{ATOMIC_STURMIAN_TAG} (k_exp={k_exp}, n_max={n_max}, l_max={l_max}, m_max={m_max})"
            ),
        }
    }
}

//! Deterministic archive file names

use crate::model::{Discretisation, MolecularSystem};

/// Canonical archive name for a system/basis pair.
///
/// Element symbols are lowercased and concatenated in atom order. Gaussian
/// archives append the basis set name, atomic Sturmian archives append the
/// zero-padded `n_max`, `l_max`, `m_max` and the exponent to four decimals.
pub fn default_archive_name(system: &MolecularSystem, discretisation: &Discretisation) -> String {
    let symbols: String = system
        .element_symbols()
        .iter()
        .map(|s| s.to_lowercase())
        .collect();

    match discretisation {
        Discretisation::Gaussian { basis_set_name, .. } => {
            format!("integrals_{}_{}.hdf5", symbols, sanitise(basis_set_name))
        }
        Discretisation::AtomicSturmian {
            k_exp,
            n_max,
            l_max,
            m_max,
            ..
        } => format!(
            "integrals_{}_{:02}{:02}{:02}_{:.4}.hdf5",
            symbols, n_max, l_max, m_max, k_exp
        ),
    }
}

// "6-31G*" stays readable, "def2/J" must not introduce a directory
fn sanitise(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ' ' => '_',
            c => c,
        })
        .collect()
}

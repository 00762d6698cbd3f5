//! HDF5 integral archive
//!
//! Layout of an archive file:
//!
//! ```text
//! integrals/electron_repulsion   f64 [n, n, n, n]
//! integrals/nuclear_attraction   f64 [n, n]
//! integrals/kinetic              f64 [n, n]
//! integrals/overlap              f64 [n, n]
//! system/nelec                   i64 [2]         (alpha, beta)
//! system/atom_numbers            i64 [n_atoms]
//! system/coords                  f64 [n_atoms, 3] (Bohr)
//! discretisation/type            str [1]         "gaussian" | "sturmian/atomic"
//! discretisation/basis_type      str [1]         same as type
//! discretisation/...             variant fields
//! metadata/generator             str [1]
//! metadata/format_version        i64 scalar
//! ```
//!
//! Readers ignore any group or dataset they do not know about. Files from the
//! early dump scripts keep the tensors at the root (`electron_repulsion_bbbb`,
//! `kinetic_bb`, ...) and lack `has_real_harmonics`; they read as real
//! harmonics.

mod reader;
mod writer;


pub use reader::{read_metadata, ArchiveReader, TensorInfo};
pub use writer::{ArchiveWriter, WriterOptions};

pub const INTEGRALS_GROUP: &str = "integrals";
pub const SYSTEM_GROUP: &str = "system";
pub const DISCRETISATION_GROUP: &str = "discretisation";
pub const METADATA_GROUP: &str = "metadata";

pub const FORMAT_VERSION: i64 = 1;

pub(crate) const NELEC: &str = "system/nelec";
pub(crate) const ATOM_NUMBERS: &str = "system/atom_numbers";
pub(crate) const COORDS: &str = "system/coords";
pub(crate) const DISCRETISATION_TYPE: &str = "discretisation/type";
pub(crate) const DISCRETISATION_BASIS_TYPE: &str = "discretisation/basis_type";
pub(crate) const BASIS_SET_NAME: &str = "discretisation/basis_set_name";
pub(crate) const HAS_REAL_HARMONICS: &str = "discretisation/has_real_harmonics";
pub(crate) const K_EXP: &str = "discretisation/k_exp";
pub(crate) const N_MAX: &str = "discretisation/n_max";
pub(crate) const L_MAX: &str = "discretisation/l_max";
pub(crate) const M_MAX: &str = "discretisation/m_max";
pub(crate) const NLM_BASIS: &str = "discretisation/nlm_basis";

/// Last path component of a `group/dataset` field path.
pub(crate) fn leaf(field: &str) -> &str {
    field.rsplit('/').next().unwrap_or(field)
}

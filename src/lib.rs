//! Integral dumps in HDF5
//!
//! Molecular integrals (overlap, kinetic, nuclear attraction and electron
//! repulsion) together with the system and basis they belong to are stored
//! in self-describing HDF5 archives. Integral evaluation and the SCF
//! procedure are delegated to external packages through [`backend`].

pub mod app;
pub mod archive;
pub mod backend;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod naming;

pub use archive::{read_metadata, ArchiveReader, ArchiveWriter, WriterOptions};
pub use error::{ArchiveError, Result};
pub use model::{Discretisation, IntegralArchive, IntegralTensorSet, MolecularSystem, Nlm, TensorName};
pub use naming::default_archive_name;

//! Error taxonomy for archive handling and the external collaborators

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive not found or unreadable: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("malformed archive field '{field}': {details}")]
    Schema { field: String, details: String },

    #[error("unsupported discretisation type '{0}' (expected 'gaussian' or 'sturmian/atomic')")]
    UnsupportedVariant(String),

    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("invalid molecular system: {0}")]
    InvalidSystem(String),

    #[error("HDF5 operation failed: {source}")]
    Hdf5 {
        #[from]
        source: hdf5::Error,
    },

    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("{backend} failed: {details}")]
    Backend {
        backend: &'static str,
        details: String,
    },

    #[error("failed to encode or decode job file: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("failed to read numpy array '{}': {details}", path.display())]
    Npy { path: PathBuf, details: String },
}

impl ArchiveError {
    pub fn schema(field: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
            details: details.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::schema(field, "required field is absent")
    }

    pub fn backend(backend: &'static str, details: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            details: details.into(),
        }
    }

    pub fn invalid_system(details: impl Into<String>) -> Self {
        Self::InvalidSystem(details.into())
    }
}

impl From<tempfile::PersistError> for ArchiveError {
    fn from(e: tempfile::PersistError) -> Self {
        ArchiveError::Io { source: e.error }
    }
}

impl From<tempfile::PathPersistError> for ArchiveError {
    fn from(e: tempfile::PathPersistError) -> Self {
        ArchiveError::Io { source: e.error }
    }
}

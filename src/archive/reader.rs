use super::{
    ATOM_NUMBERS, BASIS_SET_NAME, COORDS, DISCRETISATION_BASIS_TYPE, DISCRETISATION_TYPE,
    HAS_REAL_HARMONICS, INTEGRALS_GROUP, K_EXP, L_MAX, M_MAX, NELEC, NLM_BASIS, N_MAX,
};
use crate::error::{ArchiveError, Result};
use crate::model::{
    Discretisation, IntegralArchive, IntegralTensorSet, MolecularSystem, Nlm, TensorName,
    ATOMIC_STURMIAN_TAG, GAUSSIAN_TAG,
};
use hdf5::types::{TypeDescriptor, VarLenAscii, VarLenUnicode};
use nalgebra::Vector3;
use ndarray::{ArrayD, Ix2, Ix4};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a tensor lives inside an archive and its stored shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    pub name: TensorName,
    pub location: String,
    pub shape: Vec<usize>,
}

/// Read-only view of a persisted archive.
///
/// The HDF5 handle is held for the lifetime of the reader and released when
/// it is dropped.
pub struct ArchiveReader {
    path: PathBuf,
    file: hdf5::File,
}

/// Open `path`, reconstruct the system and discretisation, and close the file.
pub fn read_metadata(path: impl AsRef<Path>) -> Result<(MolecularSystem, Discretisation)> {
    ArchiveReader::open(path)?.read_metadata()
}

impl ArchiveReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ArchiveError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file = hdf5::File::open(path).map_err(|e| {
            debug!("Opening {} failed: {}", path.display(), e);
            ArchiveError::NotFound {
                path: path.to_path_buf(),
            }
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// System and discretisation, without touching the integral tensors.
    pub fn read_metadata(&self) -> Result<(MolecularSystem, Discretisation)> {
        Ok((self.read_system()?, self.read_discretisation()?))
    }

    pub fn read_system(&self) -> Result<MolecularSystem> {
        let nelec = self.read_ints(NELEC)?;
        if nelec.len() != 2 {
            return Err(ArchiveError::schema(
                NELEC,
                format!("expected (alpha, beta), found {} values", nelec.len()),
            ));
        }
        let alpha = to_count(NELEC, nelec[0])?;
        let beta = to_count(NELEC, nelec[1])?;

        let atom_numbers_ds = self.dataset(ATOM_NUMBERS)?;
        if atom_numbers_ds.ndim() != 1 {
            return Err(ArchiveError::schema(
                ATOM_NUMBERS,
                format!("expected a 1-D array, found shape {:?}", atom_numbers_ds.shape()),
            ));
        }
        let atomic_numbers = self
            .read_ints(ATOM_NUMBERS)?
            .into_iter()
            .map(|z| {
                u32::try_from(z)
                    .map_err(|_| ArchiveError::schema(ATOM_NUMBERS, format!("invalid atomic number {z}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let coordinates = self.read_coordinates(atomic_numbers.len())?;

        MolecularSystem::new(atomic_numbers, coordinates, (alpha, beta)).map_err(|e| match e {
            ArchiveError::InvalidSystem(details) => ArchiveError::schema("system", details),
            other => other,
        })
    }

    pub fn read_discretisation(&self) -> Result<Discretisation> {
        let tag = if self.exists(DISCRETISATION_TYPE) {
            self.read_string(DISCRETISATION_TYPE)?
        } else if self.exists(DISCRETISATION_BASIS_TYPE) {
            self.read_string(DISCRETISATION_BASIS_TYPE)?
        } else {
            return Err(ArchiveError::missing(DISCRETISATION_TYPE));
        };

        let discretisation = match tag.as_str() {
            GAUSSIAN_TAG => Discretisation::Gaussian {
                basis_set_name: self.read_string(BASIS_SET_NAME)?,
                has_real_harmonics: self.read_has_real_harmonics()?,
            },
            ATOMIC_STURMIAN_TAG => Discretisation::AtomicSturmian {
                k_exp: self.read_f64(K_EXP)?,
                n_max: self.read_u32(N_MAX)?,
                l_max: self.read_u32(L_MAX)?,
                m_max: self.read_u32(M_MAX)?,
                nlm_basis: if self.exists(NLM_BASIS) {
                    Some(self.read_nlm_basis()?)
                } else {
                    None
                },
                has_real_harmonics: self.read_has_real_harmonics()?,
            },
            other => return Err(ArchiveError::UnsupportedVariant(other.to_string())),
        };
        discretisation.validate()?;

        debug!("Read discretisation {} from {}", discretisation, self.path.display());
        Ok(discretisation)
    }

    /// Location and shape of every tensor present, without loading any data.
    pub fn list_tensors(&self) -> Vec<TensorInfo> {
        TensorName::ALL
            .into_iter()
            .filter_map(|name| {
                let location = self.tensor_location(name)?;
                let shape = self.file.dataset(&location).ok()?.shape();
                Some(TensorInfo {
                    name,
                    location,
                    shape,
                })
            })
            .collect()
    }

    /// Load one tensor. Falls back to the root-level names of early dump scripts
    /// when the `integrals` group does not hold it.
    pub fn read_tensor(&self, name: TensorName) -> Result<ArrayD<f64>> {
        let location = self
            .tensor_location(name)
            .ok_or_else(|| ArchiveError::missing(format!("{INTEGRALS_GROUP}/{}", name.key())))?;
        let dataset = self.dataset(&location)?;
        let shape = dataset.shape();
        let square = shape.windows(2).all(|w| w[0] == w[1]);
        if shape.len() != name.rank() || !square {
            return Err(ArchiveError::schema(
                location,
                format!("expected a rank-{} tensor with equal extents, found shape {shape:?}", name.rank()),
            ));
        }

        dataset
            .read_dyn::<f64>()
            .map_err(|e| ArchiveError::schema(location, e.to_string()))
    }

    pub fn read_integrals(&self) -> Result<IntegralTensorSet> {
        let matrix = |name: TensorName| {
            self.read_tensor(name)?
                .into_dimensionality::<Ix2>()
                .map_err(|e| ArchiveError::schema(name.key(), e.to_string()))
        };
        let eri = self
            .read_tensor(TensorName::ElectronRepulsion)?
            .into_dimensionality::<Ix4>()
            .map_err(|e| ArchiveError::schema(TensorName::ElectronRepulsion.key(), e.to_string()))?;

        IntegralTensorSet::new(
            matrix(TensorName::Overlap)?,
            matrix(TensorName::Kinetic)?,
            matrix(TensorName::NuclearAttraction)?,
            eri,
        )
    }

    pub fn read_archive(&self) -> Result<IntegralArchive> {
        let (system, discretisation) = self.read_metadata()?;
        IntegralArchive::new(system, self.read_integrals()?, discretisation)
    }

    /// Archives from the early dump scripts keep their tensors at the file
    /// root and never recorded the harmonics convention. Both backends used
    /// real harmonics then, so those files default to `true`. Archives with
    /// an `integrals` group must carry the field.
    fn read_has_real_harmonics(&self) -> Result<bool> {
        if self.exists(HAS_REAL_HARMONICS) || self.exists(INTEGRALS_GROUP) {
            return self.read_bool(HAS_REAL_HARMONICS);
        }
        debug!(
            "{} has the root-level tensor layout, assuming real harmonics",
            self.path.display()
        );
        Ok(true)
    }

    fn tensor_location(&self, name: TensorName) -> Option<String> {
        let current = format!("{INTEGRALS_GROUP}/{}", name.key());
        if self.exists(&current) {
            Some(current)
        } else if self.exists(name.legacy_key()) {
            Some(name.legacy_key().to_string())
        } else {
            None
        }
    }

    fn read_coordinates(&self, n_atoms: usize) -> Result<Vec<Vector3<f64>>> {
        let dataset = self.dataset(COORDS)?;
        let shape = dataset.shape();
        // single-atom dumps may carry a flat [x, y, z]
        let flat_single_atom = n_atoms == 1 && shape == [3];
        if shape != [n_atoms, 3] && !flat_single_atom {
            return Err(ArchiveError::schema(
                COORDS,
                format!("expected shape [{n_atoms}, 3], found {shape:?}"),
            ));
        }

        let values = dataset
            .read_raw::<f64>()
            .map_err(|e| ArchiveError::schema(COORDS, e.to_string()))?;
        Ok(values
            .chunks_exact(3)
            .map(|xyz| Vector3::new(xyz[0], xyz[1], xyz[2]))
            .collect())
    }

    fn read_nlm_basis(&self) -> Result<Vec<Nlm>> {
        let dataset = self.dataset(NLM_BASIS)?;
        let shape = dataset.shape();
        if shape.len() != 2 || shape[1] != 3 {
            return Err(ArchiveError::schema(
                NLM_BASIS,
                format!("expected shape [n_bas, 3], found {shape:?}"),
            ));
        }
        let values = self.read_ints(NLM_BASIS)?;
        values
            .chunks_exact(3)
            .map(|row| {
                let n = u32::try_from(row[0]);
                let l = u32::try_from(row[1]);
                let m = i32::try_from(row[2]);
                match (n, l, m) {
                    (Ok(n), Ok(l), Ok(m)) => Ok(Nlm::new(n, l, m)),
                    _ => Err(ArchiveError::schema(
                        NLM_BASIS,
                        format!("invalid label ({}, {}, {})", row[0], row[1], row[2]),
                    )),
                }
            })
            .collect()
    }

    fn dataset(&self, field: &str) -> Result<hdf5::Dataset> {
        if !self.exists(field) {
            return Err(ArchiveError::missing(field));
        }
        self.file
            .dataset(field)
            .map_err(|e| ArchiveError::schema(field, e.to_string()))
    }

    // walk the path one link at a time; asking HDF5 about a link below a
    // missing group is an error rather than `false`
    fn exists(&self, field: &str) -> bool {
        let mut prefix = String::with_capacity(field.len());
        for part in field.split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            if !self.file.link_exists(&prefix) {
                return false;
            }
        }
        true
    }

    // HDF5 converts floats to integers on read, so check the stored class first
    fn integer_dataset(&self, field: &str, accept_boolean: bool) -> Result<hdf5::Dataset> {
        let dataset = self.dataset(field)?;
        let descriptor = dataset
            .dtype()
            .and_then(|dtype| dtype.to_descriptor())
            .map_err(|e| ArchiveError::schema(field, e.to_string()))?;
        match descriptor {
            TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => Ok(dataset),
            TypeDescriptor::Boolean if accept_boolean => Ok(dataset),
            other => Err(ArchiveError::schema(
                field,
                format!("expected integers, found {other:?}"),
            )),
        }
    }

    fn read_ints(&self, field: &str) -> Result<Vec<i64>> {
        self.integer_dataset(field, false)?
            .read_raw::<i64>()
            .map_err(|e| ArchiveError::schema(field, format!("not an integer array: {e}")))
    }

    fn read_single<T: hdf5::H5Type>(&self, field: &str) -> Result<T> {
        single(field, self.dataset(field)?)
    }

    fn read_f64(&self, field: &str) -> Result<f64> {
        self.read_single::<f64>(field)
    }

    fn read_u32(&self, field: &str) -> Result<u32> {
        let value: i64 = single(field, self.integer_dataset(field, false)?)?;
        u32::try_from(value)
            .map_err(|_| ArchiveError::schema(field, format!("expected a non-negative integer, found {value}")))
    }

    fn read_bool(&self, field: &str) -> Result<bool> {
        match single::<u8>(field, self.integer_dataset(field, true)?)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ArchiveError::schema(field, format!("expected 0 or 1, found {other}"))),
        }
    }

    // strings are returned exactly as stored, minus fixed-length NUL padding
    fn read_string(&self, field: &str) -> Result<String> {
        let value = match self.read_single::<VarLenUnicode>(field) {
            Ok(s) => s.as_str().to_string(),
            Err(_) => self.read_single::<VarLenAscii>(field)?.as_str().to_string(),
        };
        Ok(value.trim_end_matches('\0').to_string())
    }
}

fn single<T: hdf5::H5Type>(field: &str, dataset: hdf5::Dataset) -> Result<T> {
    let mut values = dataset
        .read_raw::<T>()
        .map_err(|e| ArchiveError::schema(field, e.to_string()))?;
    if values.len() != 1 {
        return Err(ArchiveError::schema(
            field,
            format!("expected a single value, found {}", values.len()),
        ));
    }
    Ok(values.remove(0))
}

fn to_count(field: &str, value: i64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| ArchiveError::schema(field, format!("electron count must be non-negative, found {value}")))
}

use super::{
    leaf, ATOM_NUMBERS, BASIS_SET_NAME, COORDS, DISCRETISATION_BASIS_TYPE, DISCRETISATION_GROUP,
    DISCRETISATION_TYPE, FORMAT_VERSION, HAS_REAL_HARMONICS, INTEGRALS_GROUP, K_EXP, L_MAX,
    METADATA_GROUP, M_MAX, NELEC, NLM_BASIS, N_MAX, SYSTEM_GROUP,
};
use crate::error::{ArchiveError, Result};
use crate::model::{Discretisation, IntegralArchive, IntegralTensorSet, MolecularSystem, TensorName};
use crate::naming::default_archive_name;
use hdf5::types::VarLenUnicode;
use ndarray::{arr0, arr1, Array1, Array2, ArrayViewD};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Storage options for newly written archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Deflate level (0-9) for the integral tensors; `None` stores them uncompressed.
    pub compression: Option<u8>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            compression: Some(4),
        }
    }
}

impl WriterOptions {
    pub fn uncompressed() -> Self {
        WriterOptions { compression: None }
    }

    /// A level of 0 disables compression, levels above 9 are clamped.
    pub fn with_compression(level: u8) -> Self {
        WriterOptions {
            compression: (level > 0).then_some(level.min(9)),
        }
    }
}

/// Writes [`IntegralArchive`]s to HDF5 files.
///
/// Contents are written to a temporary file next to the destination and
/// renamed into place once complete, so a failed write never leaves a
/// half-written archive under the destination name.
#[derive(Debug, Clone, Default)]
pub struct ArchiveWriter {
    options: WriterOptions,
}

impl ArchiveWriter {
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> WriterOptions {
        self.options
    }

    /// Validate and write the three parts of an archive. Returns the path written.
    pub fn write_parts(
        &self,
        system: MolecularSystem,
        integrals: IntegralTensorSet,
        discretisation: Discretisation,
        path: Option<&Path>,
    ) -> Result<PathBuf> {
        let archive = IntegralArchive::new(system, integrals, discretisation)?;
        self.write(&archive, path)
    }

    /// Write `archive` into `directory` under its canonical name.
    pub fn write_in_dir(&self, archive: &IntegralArchive, directory: &Path) -> Result<PathBuf> {
        let name = default_archive_name(&archive.system, &archive.discretisation);
        self.write(archive, Some(&directory.join(name)))
    }

    /// Write `archive` to `path`, or to its canonical name in the working
    /// directory when no path is given. Returns the path written.
    pub fn write(&self, archive: &IntegralArchive, path: Option<&Path>) -> Result<PathBuf> {
        archive.validate()?;

        let destination = match path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(default_archive_name(
                &archive.system,
                &archive.discretisation,
            )),
        };
        let directory = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let staging = tempfile::Builder::new()
            .prefix(".integrals-")
            .suffix(".hdf5.partial")
            .tempfile_in(directory)?
            .into_temp_path();
        debug!("Staging archive at {}", staging.display());

        {
            let file = hdf5::File::create(&staging)?;
            write_contents(&file, archive, &self.options)?;
            file.flush()?;
        }
        staging.persist(&destination)?;

        info!(
            "Wrote {} archive with {} basis functions to {}",
            archive.discretisation.tag(),
            archive.integrals.n_basis(),
            destination.display()
        );
        Ok(destination)
    }
}

fn write_contents(file: &hdf5::File, archive: &IntegralArchive, options: &WriterOptions) -> Result<()> {
    let integrals = file.create_group(INTEGRALS_GROUP)?;
    for name in TensorName::ALL {
        write_tensor(&integrals, name.key(), archive.integrals.get(name), options)?;
    }

    let system = file.create_group(SYSTEM_GROUP)?;
    write_system(&system, &archive.system)?;

    let discretisation = file.create_group(DISCRETISATION_GROUP)?;
    write_discretisation(&discretisation, &archive.discretisation)?;

    let metadata = file.create_group(METADATA_GROUP)?;
    write_string(
        &metadata,
        "generator",
        concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")),
    )?;
    metadata
        .new_dataset_builder()
        .with_data(&arr0(FORMAT_VERSION))
        .create("format_version")?;

    Ok(())
}

fn write_tensor(
    group: &hdf5::Group,
    key: &str,
    data: ArrayViewD<'_, f64>,
    options: &WriterOptions,
) -> Result<()> {
    let builder = group.new_dataset_builder().with_data(&data);
    match options.compression.filter(|_| hdf5::filters::deflate_available()) {
        Some(level) => builder.deflate(level).create(key)?,
        None => builder.create(key)?,
    };
    debug!("Stored integrals/{} with shape {:?}", key, data.shape());
    Ok(())
}

fn write_system(group: &hdf5::Group, system: &MolecularSystem) -> Result<()> {
    let (alpha, beta) = system.electron_counts();
    group
        .new_dataset_builder()
        .with_data(&arr1(&[alpha as i64, beta as i64]))
        .create(leaf(NELEC))?;

    let atom_numbers: Array1<i64> = system.atomic_numbers().iter().map(|&z| i64::from(z)).collect();
    group
        .new_dataset_builder()
        .with_data(&atom_numbers)
        .create(leaf(ATOM_NUMBERS))?;

    let coordinates = system.coordinates();
    let coords = Array2::from_shape_fn((coordinates.len(), 3), |(i, k)| coordinates[i][k]);
    group
        .new_dataset_builder()
        .with_data(&coords)
        .create(leaf(COORDS))?;

    Ok(())
}

fn write_discretisation(group: &hdf5::Group, discretisation: &Discretisation) -> Result<()> {
    let tag = discretisation.tag();
    write_string(group, leaf(DISCRETISATION_TYPE), tag)?;
    write_string(group, leaf(DISCRETISATION_BASIS_TYPE), tag)?;
    write_scalar(
        group,
        leaf(HAS_REAL_HARMONICS),
        u8::from(discretisation.has_real_harmonics()),
    )?;

    match discretisation {
        Discretisation::Gaussian { basis_set_name, .. } => {
            write_string(group, leaf(BASIS_SET_NAME), basis_set_name)?;
        }
        Discretisation::AtomicSturmian {
            k_exp,
            n_max,
            l_max,
            m_max,
            nlm_basis,
            ..
        } => {
            write_scalar(group, leaf(K_EXP), *k_exp)?;
            write_scalar(group, leaf(N_MAX), i64::from(*n_max))?;
            write_scalar(group, leaf(L_MAX), i64::from(*l_max))?;
            write_scalar(group, leaf(M_MAX), i64::from(*m_max))?;
            if let Some(labels) = nlm_basis {
                let table = Array2::from_shape_fn((labels.len(), 3), |(i, k)| match k {
                    0 => i64::from(labels[i].n),
                    1 => i64::from(labels[i].l),
                    _ => i64::from(labels[i].m),
                });
                group
                    .new_dataset_builder()
                    .with_data(&table)
                    .create(leaf(NLM_BASIS))?;
            }
        }
    }
    Ok(())
}

fn write_scalar<T: hdf5::H5Type + Clone>(group: &hdf5::Group, name: &str, value: T) -> Result<()> {
    group
        .new_dataset_builder()
        .with_data(&arr0(value))
        .create(name)?;
    Ok(())
}

// one-element variable-length UTF-8 array, the layout h5py produces for
// `np.array([value], dtype=h5py.special_dtype(vlen=str))`
fn write_string(group: &hdf5::Group, name: &str, value: &str) -> Result<()> {
    let encoded: VarLenUnicode = value
        .parse()
        .map_err(|e| ArchiveError::schema(name, format!("cannot encode '{value}': {e}")))?;
    group
        .new_dataset_builder()
        .with_data(&arr1(&[encoded]))
        .create(name)?;
    Ok(())
}

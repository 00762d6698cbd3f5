//! Running Python driver scripts
//!
//! A driver run is a scratch directory holding `driver.py` and `job.json`.
//! The interpreter is started inside it and the driver leaves its results
//! there: `basis.json` for the basis report and one `<tensor>.npy` per
//! integral tensor.

use super::BasisInfo;
use crate::error::{ArchiveError, Result};
use crate::model::{Discretisation, IntegralTensorSet, MolecularSystem, Nlm, TensorName};
use ndarray::{Array, ArrayD, Dimension, Ix2, Ix4, IxDyn, ShapeBuilder};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, warn};

pub const DEFAULT_INTERPRETER: &str = "python3";

const SCRIPT_FILE: &str = "driver.py";
const JOB_FILE: &str = "job.json";
const BASIS_FILE: &str = "basis.json";

/// The interpreter used to run driver scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonRuntime {
    interpreter: String,
}

impl Default for PythonRuntime {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETER)
    }
}

impl PythonRuntime {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// The program to spawn. Bare names are looked up on `PATH`; anything
    /// with a directory part is made absolute, as the driver runs inside its
    /// scratch directory.
    pub(crate) fn program(&self) -> std::io::Result<PathBuf> {
        let path = Path::new(&self.interpreter);
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::canonicalize(path),
            _ => Ok(path.to_path_buf()),
        }
    }

    /// Run `script` on `job` in a fresh scratch directory.
    ///
    /// A non-zero exit status is reported as a backend failure carrying the
    /// driver's stderr.
    pub(crate) fn run(&self, backend: &'static str, script: &str, job: &Job<'_>) -> Result<ScriptRun> {
        let dir = tempfile::Builder::new()
            .prefix("integral-dump-")
            .tempdir()?;
        fs::write(dir.path().join(SCRIPT_FILE), script)?;
        let mut writer = BufWriter::new(File::create(dir.path().join(JOB_FILE))?);
        serde_json::to_writer_pretty(&mut writer, job)?;
        writer.flush()?;
        drop(writer);

        debug!(
            "Running {} {} task in {} with {}",
            backend,
            job.task.as_str(),
            dir.path().display(),
            self.interpreter
        );
        let start_error =
            |e: std::io::Error| ArchiveError::backend(backend, format!("cannot start '{}': {e}", self.interpreter));
        let output = Command::new(self.program().map_err(start_error)?)
            .arg(SCRIPT_FILE)
            .arg(JOB_FILE)
            .current_dir(dir.path())
            .output()
            .map_err(start_error)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(ArchiveError::backend(
                backend,
                format!("driver exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        if !stderr.trim().is_empty() {
            warn!("{} driver wrote to stderr:\n{}", backend, stderr.trim_end());
        }

        Ok(ScriptRun { dir, stdout })
    }
}

/// A finished driver run. The scratch directory lives as long as this value.
pub(crate) struct ScriptRun {
    dir: TempDir,
    pub stdout: String,
}

impl ScriptRun {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn basis_info(&self) -> Result<BasisInfo> {
        let file = File::open(self.path().join(BASIS_FILE))?;
        let report: BasisReport = serde_json::from_reader(BufReader::new(file))?;
        report.into_basis_info()
    }

    pub fn tensors(&self) -> Result<IntegralTensorSet> {
        IntegralTensorSet::new(
            self.tensor::<Ix2>(TensorName::Overlap)?,
            self.tensor::<Ix2>(TensorName::Kinetic)?,
            self.tensor::<Ix2>(TensorName::NuclearAttraction)?,
            self.tensor::<Ix4>(TensorName::ElectronRepulsion)?,
        )
    }

    fn tensor<D: Dimension>(&self, name: TensorName) -> Result<Array<f64, D>> {
        let path = self.path().join(format!("{}.npy", name.key()));
        load_npy(&path)?
            .into_dimensionality::<D>()
            .map_err(|e| ArchiveError::Npy {
                path,
                details: format!("unexpected rank for {name}: {e}"),
            })
    }
}

/// Read a float64 `.npy` file into a row-major array.
pub fn load_npy(path: impl AsRef<Path>) -> Result<ArrayD<f64>> {
    let path = path.as_ref();
    let npy_error = |details: String| ArchiveError::Npy {
        path: path.to_path_buf(),
        details,
    };

    let bytes = fs::read(path).map_err(|e| npy_error(e.to_string()))?;
    let npy = npyz::NpyFile::new(&bytes[..]).map_err(|e| npy_error(e.to_string()))?;
    let shape: Vec<usize> = npy.shape().iter().map(|&x| x as usize).collect();
    let fortran = matches!(npy.order(), npyz::Order::Fortran);
    let data: Vec<f64> = npy.into_vec().map_err(|e| npy_error(e.to_string()))?;

    let array = if fortran {
        ArrayD::from_shape_vec(IxDyn(&shape).f(), data)
            .map(|a| a.as_standard_layout().into_owned())
    } else {
        ArrayD::from_shape_vec(IxDyn(&shape), data)
    };
    array.map_err(|e| npy_error(e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Task {
    Basis,
    Integrals,
    Scf,
}

impl Task {
    pub fn as_str(self) -> &'static str {
        match self {
            Task::Basis => "basis",
            Task::Integrals => "integrals",
            Task::Scf => "scf",
        }
    }
}

/// Contents of `job.json`.
#[derive(Debug, Serialize)]
pub(crate) struct Job<'a> {
    pub task: Task,
    pub system: JobSystem,
    pub discretisation: &'a Discretisation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<&'static str>,
}

impl<'a> Job<'a> {
    pub fn new(task: Task, system: &MolecularSystem, discretisation: &'a Discretisation) -> Self {
        Self {
            task,
            system: JobSystem::from(system),
            discretisation,
            method: None,
        }
    }

    pub fn with_method(mut self, method: &'static str) -> Self {
        self.method = Some(method);
        self
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JobSystem {
    pub atomic_numbers: Vec<u32>,
    pub coordinates: Vec<[f64; 3]>,
    pub electrons: [usize; 2],
    pub charge: i64,
    pub spin: usize,
}

impl From<&MolecularSystem> for JobSystem {
    fn from(system: &MolecularSystem) -> Self {
        let (alpha, beta) = system.electron_counts();
        Self {
            atomic_numbers: system.atomic_numbers().to_vec(),
            coordinates: system.coordinates().iter().map(|c| [c.x, c.y, c.z]).collect(),
            electrons: [alpha, beta],
            charge: system.charge(),
            spin: system.spin(),
        }
    }
}

/// Contents of `basis.json`.
#[derive(Debug, Deserialize)]
pub(crate) struct BasisReport {
    pub n_basis: usize,
    pub has_real_harmonics: bool,
    #[serde(default)]
    pub nlm_basis: Option<Vec<[i64; 3]>>,
}

impl BasisReport {
    pub fn into_basis_info(self) -> Result<BasisInfo> {
        let nlm_basis = self
            .nlm_basis
            .map(|rows| {
                rows.into_iter()
                    .map(|[n, l, m]| match (u32::try_from(n), u32::try_from(l), i32::try_from(m)) {
                        (Ok(n), Ok(l), Ok(m)) => Ok(Nlm::new(n, l, m)),
                        _ => Err(ArchiveError::schema(
                            "discretisation/nlm_basis",
                            format!("backend reported invalid label ({n}, {l}, {m})"),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;

        Ok(BasisInfo {
            n_basis: self.n_basis,
            has_real_harmonics: self.has_real_harmonics,
            nlm_basis,
        })
    }
}

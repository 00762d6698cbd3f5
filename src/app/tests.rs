use super::*;
use crate::archive::{read_metadata, ArchiveReader, ArchiveWriter};
use crate::backend::{BasisInfo, IntegralBackend, ScfMode, ScfOutcome, ScfSolver};
use crate::config::{DumpArgs, RunScfArgs};
use crate::error::ArchiveError;
use crate::model::{Discretisation, IntegralTensorSet, MolecularSystem, Nlm};
use clap::Parser;
use nalgebra::Vector3;
use ndarray::{Array2, Array4};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WATER: &str = r#"
geometry:
  - element: O
    coords: [0.0, 0.0, 0.0]
  - element: H
    coords: [0.0, 0.0, 1.795239827225189]
  - element: H
    coords: [1.693194615993441, 0.0, -0.599043184453037]
electrons: [5, 5]
discretisation:
  type: gaussian
  basis_set_name: cc-pvdz
"#;

const OXYGEN: &str = r#"
geometry:
  - element: O
    coords: [0.0, 0.0, 0.0]
electrons: [5, 3]
discretisation:
  type: sturmian/atomic
  k_exp: 3.638
  n_max: 2
  l_max: 1
  m_max: 1
"#;

fn symmetric_tensors(n: usize) -> IntegralTensorSet {
    let matrix = Array2::from_shape_fn((n, n), |(i, j)| 1.0 / (1.0 + (i + j) as f64));
    let eri = Array4::from_shape_fn((n, n, n, n), |(i, j, k, l)| {
        0.1 * ((i + 1) * (j + 1) + (k + 1) * (l + 1)) as f64
    });
    IntegralTensorSet::new(Array2::eye(n), matrix.clone(), -matrix, eri).unwrap()
}

/// Returns fixed tensors and labels without any external process.
struct MockBackend {
    n_basis: usize,
    reported_n_basis: usize,
    labels: Option<Vec<Nlm>>,
    gaussian_only: bool,
}

impl MockBackend {
    fn gaussian(n_basis: usize) -> Self {
        Self {
            n_basis,
            reported_n_basis: n_basis,
            labels: None,
            gaussian_only: true,
        }
    }

    fn sturmian() -> Self {
        let labels = vec![
            Nlm::new(1, 0, 0),
            Nlm::new(2, 0, 0),
            Nlm::new(2, 1, -1),
            Nlm::new(2, 1, 0),
            Nlm::new(2, 1, 1),
        ];
        Self {
            n_basis: labels.len(),
            reported_n_basis: labels.len(),
            labels: Some(labels),
            gaussian_only: false,
        }
    }

    fn info(&self) -> BasisInfo {
        BasisInfo {
            n_basis: self.reported_n_basis,
            has_real_harmonics: self.labels.is_none(),
            nlm_basis: self.labels.clone(),
        }
    }
}

impl IntegralBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn supports(&self, discretisation: &Discretisation) -> bool {
        !self.gaussian_only || matches!(discretisation, Discretisation::Gaussian { .. })
    }

    fn construct_basis(&self, _: &MolecularSystem, _: &Discretisation) -> crate::Result<BasisInfo> {
        Ok(self.info())
    }

    fn compute_integrals(
        &self,
        _: &MolecularSystem,
        _: &Discretisation,
    ) -> crate::Result<(BasisInfo, IntegralTensorSet)> {
        Ok((self.info(), symmetric_tensors(self.n_basis)))
    }
}

/// Records what it was asked to solve.
#[derive(Default)]
struct MockSolver {
    calls: RefCell<Vec<(MolecularSystem, Discretisation, ScfMode)>>,
    fail: bool,
}

impl ScfSolver for MockSolver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn run(
        &self,
        system: &MolecularSystem,
        discretisation: &Discretisation,
        mode: ScfMode,
    ) -> crate::Result<ScfOutcome> {
        if self.fail {
            return Err(ArchiveError::backend("mock", "SCF not converged"));
        }
        self.calls
            .borrow_mut()
            .push((system.clone(), discretisation.clone(), mode));
        Ok(ScfOutcome {
            solver: "mock",
            report: "converged\n".to_string(),
        })
    }
}

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("config.yaml");
    std::fs::write(&path, content).unwrap();
    path
}

fn dump_args(config: &Path, extra: &[&str]) -> DumpArgs {
    let mut argv = vec!["dump-integrals".to_string(), config.display().to_string()];
    argv.extend(extra.iter().map(|s| s.to_string()));
    DumpArgs::try_parse_from(argv).unwrap()
}

fn scf_args(archive: &Path, extra: &[&str]) -> RunScfArgs {
    let mut argv = vec!["run-scf".to_string(), archive.display().to_string()];
    argv.extend(extra.iter().map(|s| s.to_string()));
    RunScfArgs::try_parse_from(argv).unwrap()
}

#[test]
fn test_dump_gaussian_archive() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), WATER);
    let output = dir.path().join("water.hdf5");
    let out_arg = output.display().to_string();

    let app = DumpApplication::new(dump_args(&config, &["--output", &out_arg])).unwrap();
    let path = app.run_with(&MockBackend::gaussian(4)).unwrap();
    assert_eq!(path, output);

    let archive = ArchiveReader::open(&path).unwrap().read_archive().unwrap();
    assert_eq!(archive.system.atomic_numbers(), &[8, 1, 1]);
    assert_eq!(archive.discretisation, Discretisation::gaussian("cc-pvdz"));
    assert_eq!(archive.integrals, symmetric_tensors(4));
}

#[test]
fn test_dump_into_directory_uses_canonical_name() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), WATER);
    let out_dir = dir.path().join("archives");
    std::fs::create_dir(&out_dir).unwrap();
    let out_arg = out_dir.display().to_string();

    let app = DumpApplication::new(dump_args(&config, &["--output", &out_arg])).unwrap();
    let path = app.run_with(&MockBackend::gaussian(3)).unwrap();
    assert_eq!(path, out_dir.join("integrals_ohh_cc-pvdz.hdf5"));
    assert!(read_metadata(&path).is_ok());
}

#[test]
fn test_dump_basis_override() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), WATER);
    let output = dir.path().join("water.hdf5");
    let out_arg = output.display().to_string();

    let app = DumpApplication::new(dump_args(&config, &["sto-3g", "--output", &out_arg])).unwrap();
    let path = app.run_with(&MockBackend::gaussian(2)).unwrap();

    let (_, discretisation) = read_metadata(&path).unwrap();
    assert_eq!(discretisation.basis_set_name(), Some("sto-3g"));
}

#[test]
fn test_dump_basis_override_rejected_for_sturmian() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), OXYGEN);

    let err = DumpApplication::new(dump_args(&config, &["sto-3g"]))
        .err()
        .unwrap();
    assert!(matches!(
        err.downcast_ref::<ArchiveError>(),
        Some(ArchiveError::Argument(_))
    ));
}

#[test]
fn test_dump_sturmian_attaches_labels() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), OXYGEN);
    let output = dir.path().join("oxygen.hdf5");
    let out_arg = output.display().to_string();

    let app = DumpApplication::new(dump_args(&config, &["--output", &out_arg])).unwrap();
    assert_eq!(app.backend_kind().unwrap(), crate::backend::BackendKind::Molsturm);
    let path = app.run_with(&MockBackend::sturmian()).unwrap();

    let (system, discretisation) = read_metadata(&path).unwrap();
    assert_eq!(system.electron_counts(), (5, 3));
    assert_eq!(discretisation.nlm_basis().map(|l| l.len()), Some(5));
    assert!(!discretisation.has_real_harmonics());
}

#[test]
fn test_dump_rejects_unsupported_backend() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), OXYGEN);

    let app = DumpApplication::new(dump_args(&config, &[])).unwrap();
    let err = app.run_with(&MockBackend::gaussian(5)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ArchiveError>(),
        Some(ArchiveError::Argument(_))
    ));
}

#[test]
fn test_dump_rejects_inconsistent_basis_size() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), WATER);
    let output = dir.path().join("water.hdf5");
    let out_arg = output.display().to_string();

    let backend = MockBackend {
        reported_n_basis: 3,
        ..MockBackend::gaussian(4)
    };
    let app = DumpApplication::new(dump_args(&config, &["--output", &out_arg])).unwrap();
    assert!(app.run_with(&backend).is_err());
    assert!(!output.exists());
}

#[test]
fn test_dump_missing_config() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.yaml");
    assert!(DumpApplication::new(dump_args(&missing, &[])).is_err());
}

fn stored_water_archive(dir: &Path, tensors: IntegralTensorSet) -> PathBuf {
    let system = MolecularSystem::from_symbols(
        &["O", "H", "H"],
        vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.795239827225189),
            Vector3::new(1.693194615993441, 0.0, -0.599043184453037),
        ],
        (5, 5),
    )
    .unwrap();
    ArchiveWriter::default()
        .write_parts(
            system,
            tensors,
            Discretisation::gaussian("cc-pvdz"),
            Some(&dir.join("water.hdf5")),
        )
        .unwrap()
}

#[test]
fn test_scf_receives_archive_contents() {
    let dir = TempDir::new().unwrap();
    let path = stored_water_archive(dir.path(), symmetric_tensors(3));

    let solver = MockSolver::default();
    let app = ScfApplication::new(scf_args(&path, &["--verify-integrals"]));
    let outcome = app.run_with(&solver).unwrap();
    assert_eq!(outcome.report, "converged\n");

    let calls = solver.calls.borrow();
    assert_eq!(calls.len(), 1);
    let (system, discretisation, mode) = &calls[0];
    assert_eq!(system.electron_counts(), (5, 5));
    assert_eq!(discretisation.basis_set_name(), Some("cc-pvdz"));
    assert_eq!(*mode, ScfMode::Restricted);
}

#[test]
fn test_scf_unrestricted_flag() {
    let dir = TempDir::new().unwrap();
    let path = stored_water_archive(dir.path(), symmetric_tensors(2));

    let solver = MockSolver::default();
    let app = ScfApplication::new(scf_args(&path, &["false"]));
    assert_eq!(app.mode(), ScfMode::Unrestricted);
    app.run_with(&solver).unwrap();
    assert_eq!(solver.calls.borrow()[0].2, ScfMode::Unrestricted);
}

#[test]
fn test_scf_verification_rejects_asymmetric_tensors() {
    let dir = TempDir::new().unwrap();
    let mut kinetic = Array2::<f64>::eye(2);
    kinetic[[0, 1]] = 0.5;
    let tensors = IntegralTensorSet::new(
        Array2::eye(2),
        kinetic,
        Array2::eye(2),
        Array4::zeros((2, 2, 2, 2)),
    )
    .unwrap();
    let path = stored_water_archive(dir.path(), tensors);

    let solver = MockSolver::default();
    assert!(ScfApplication::new(scf_args(&path, &["--verify-integrals"]))
        .run_with(&solver)
        .is_err());
    assert!(solver.calls.borrow().is_empty());

    // without verification the solver runs anyway
    ScfApplication::new(scf_args(&path, &[]))
        .run_with(&solver)
        .unwrap();
    assert_eq!(solver.calls.borrow().len(), 1);
}

#[test]
fn test_scf_missing_archive() {
    let dir = TempDir::new().unwrap();
    let solver = MockSolver::default();
    let err = ScfApplication::new(scf_args(&dir.path().join("absent.hdf5"), &[]))
        .run_with(&solver)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ArchiveError>(),
        Some(ArchiveError::NotFound { .. })
    ));
}

#[test]
fn test_scf_solver_failure_propagates() {
    let dir = TempDir::new().unwrap();
    let path = stored_water_archive(dir.path(), symmetric_tensors(2));

    let solver = MockSolver {
        fail: true,
        ..MockSolver::default()
    };
    let err = ScfApplication::new(scf_args(&path, &[]))
        .run_with(&solver)
        .unwrap_err();
    assert!(format!("{err:?}").contains("SCF not converged"));
}

#[test]
fn test_python_runtime_precedence() {
    assert_eq!(python_runtime(Some("a"), Some("b")).interpreter(), "a");
    assert_eq!(python_runtime(None, Some("b")).interpreter(), "b");
    assert_eq!(python_runtime(None, None).interpreter(), "python3");
}

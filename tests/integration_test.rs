//! Integration tests through the public API
//!
//! The example configurations under `example/` are parsed and turned into
//! archives with synthetic tensors. Tests that need the Python packages are
//! ignored by default.

use integral_dump::archive::ArchiveReader;
use integral_dump::backend::BackendKind;
use integral_dump::config::DumpConfig;
use integral_dump::{
    default_archive_name, read_metadata, ArchiveError, ArchiveWriter, Discretisation,
    IntegralArchive, IntegralTensorSet, TensorName, WriterOptions,
};
use ndarray::{Array2, Array4};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn example_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("example")
        .join(filename)
}

fn load_example(filename: &str) -> DumpConfig {
    let content = fs::read_to_string(example_path(filename)).unwrap();
    DumpConfig::from_yaml(&content).unwrap()
}

fn tensors(n: usize) -> IntegralTensorSet {
    let h = Array2::from_shape_fn((n, n), |(i, j)| -1.0 / (1.0 + i as f64 + j as f64));
    let eri = Array4::from_shape_fn((n, n, n, n), |(i, j, k, l)| {
        let ij = (i.max(j) * (i.max(j) + 1) / 2 + i.min(j)) as f64;
        let kl = (k.max(l) * (k.max(l) + 1) / 2 + k.min(l)) as f64;
        1.0 / (1.0 + ij + kl) + 1e-3 * ij * kl
    });
    IntegralTensorSet::new(Array2::eye(n), h.mapv(f64::abs), h, eri).unwrap()
}

#[test]
fn test_water_example() {
    let config = load_example("h2o_ccpvdz.yaml");
    let system = config.to_system().unwrap();
    let discretisation = config.to_discretisation().unwrap();

    assert_eq!(config.backend_kind().unwrap(), BackendKind::Pyscf);
    assert_eq!(system.atomic_numbers(), &[8, 1, 1]);
    assert_eq!(
        default_archive_name(&system, &discretisation),
        "integrals_ohh_cc-pvdz.hdf5"
    );
}

#[test]
fn test_sturmian_example() {
    let config = load_example("o_sturmian.yaml");
    let system = config.to_system().unwrap();
    let discretisation = config.to_discretisation().unwrap();

    assert_eq!(config.backend_kind().unwrap(), BackendKind::Molsturm);
    assert_eq!(system.electron_counts(), (5, 3));
    assert_eq!(
        default_archive_name(&system, &discretisation),
        "integrals_o_050303_3.6380.hdf5"
    );
}

#[test]
fn test_charge_multiplicity_example() {
    let config = load_example("lih_sto3g.yaml");
    let system = config.to_system().unwrap();

    assert_eq!(system.electron_counts(), (2, 1));
    assert_eq!(system.charge(), 1);
    assert_eq!(config.backend_kind().unwrap(), BackendKind::Pyscf);
}

#[test]
fn test_water_archive_through_public_api() {
    let dir = TempDir::new().unwrap();
    let config = load_example("h2o_ccpvdz.yaml");
    let archive = IntegralArchive::new(
        config.to_system().unwrap(),
        tensors(6),
        config.to_discretisation().unwrap(),
    )
    .unwrap();

    let path = ArchiveWriter::new(WriterOptions::with_compression(6))
        .write_in_dir(&archive, dir.path())
        .unwrap();
    assert_eq!(path, dir.path().join("integrals_ohh_cc-pvdz.hdf5"));

    let (system, discretisation) = read_metadata(&path).unwrap();
    assert_eq!(system, archive.system);
    assert_eq!(discretisation, archive.discretisation);

    let reader = ArchiveReader::open(&path).unwrap();
    let listed: Vec<TensorName> = reader.list_tensors().iter().map(|t| t.name).collect();
    assert_eq!(listed.len(), 4);
    for name in TensorName::ALL {
        assert!(listed.contains(&name));
        assert_eq!(reader.read_tensor(name).unwrap(), archive.integrals.get(name));
    }
    assert_eq!(reader.read_archive().unwrap(), archive);
}

#[test]
fn test_sturmian_archive_through_public_api() {
    let dir = TempDir::new().unwrap();
    let config = load_example("o_sturmian.yaml");
    let archive = IntegralArchive::new(
        config.to_system().unwrap(),
        tensors(3),
        config.to_discretisation().unwrap(),
    )
    .unwrap();

    let path = ArchiveWriter::new(WriterOptions::uncompressed())
        .write_in_dir(&archive, dir.path())
        .unwrap();
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("integrals_o_050303_3.6380.hdf5")
    );

    let restored = ArchiveReader::open(&path).unwrap().read_archive().unwrap();
    assert_eq!(restored, archive);
    match restored.discretisation {
        Discretisation::AtomicSturmian {
            k_exp,
            n_max,
            l_max,
            m_max,
            ..
        } => {
            assert_eq!(k_exp.to_bits(), 3.638f64.to_bits());
            assert_eq!((n_max, l_max, m_max), (5, 3, 3));
        }
        other => panic!("expected a sturmian discretisation, got {other}"),
    }
}

#[test]
fn test_missing_archive() {
    let dir = TempDir::new().unwrap();
    let err = read_metadata(dir.path().join("absent.hdf5")).unwrap_err();
    assert!(matches!(err, ArchiveError::NotFound { .. }));
}

#[test]
#[ignore = "requires python3 with pyscf"]
fn test_dump_and_scf_with_pyscf() {
    use clap::Parser;
    use integral_dump::app::{DumpApplication, ScfApplication};
    use integral_dump::config::{DumpArgs, RunScfArgs};

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("water.hdf5");
    let args = DumpArgs::try_parse_from([
        "dump-integrals",
        example_path("h2o_ccpvdz.yaml").to_str().unwrap(),
        "sto-3g",
        "--output",
        output.to_str().unwrap(),
    ])
    .unwrap();
    let path = DumpApplication::new(args).unwrap().run().unwrap();

    let reader = ArchiveReader::open(&path).unwrap();
    assert_eq!(reader.read_integrals().unwrap().n_basis(), 7);
    drop(reader);

    let args = RunScfArgs::try_parse_from(["run-scf", path.to_str().unwrap(), "true", "--verify-integrals"])
        .unwrap();
    let outcome = ScfApplication::new(args).run().unwrap();
    assert!(outcome.report.contains("converged SCF energy"));
}

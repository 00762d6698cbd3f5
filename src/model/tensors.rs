use crate::error::{ArchiveError, Result};
use ndarray::{Array2, Array4, ArrayViewD};
use rayon::prelude::*;
use std::fmt;

/// The four operator tensors stored in an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TensorName {
    ElectronRepulsion,
    NuclearAttraction,
    Kinetic,
    Overlap,
}

impl TensorName {
    pub const ALL: [TensorName; 4] = [
        TensorName::ElectronRepulsion,
        TensorName::NuclearAttraction,
        TensorName::Kinetic,
        TensorName::Overlap,
    ];

    /// Dataset name inside the `integrals` group.
    pub fn key(self) -> &'static str {
        match self {
            TensorName::ElectronRepulsion => "electron_repulsion",
            TensorName::NuclearAttraction => "nuclear_attraction",
            TensorName::Kinetic => "kinetic",
            TensorName::Overlap => "overlap",
        }
    }

    /// Root-level dataset name used by the early dump scripts.
    pub fn legacy_key(self) -> &'static str {
        match self {
            TensorName::ElectronRepulsion => "electron_repulsion_bbbb",
            TensorName::NuclearAttraction => "nuclear_attraction_bb",
            TensorName::Kinetic => "kinetic_bb",
            TensorName::Overlap => "overlap_bb",
        }
    }

    pub fn rank(self) -> usize {
        match self {
            TensorName::ElectronRepulsion => 4,
            _ => 2,
        }
    }
}

impl fmt::Display for TensorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Overlap, kinetic, nuclear-attraction and electron-repulsion integrals in a
/// common basis of `n_basis` functions. ERIs are in chemists' notation `(ij|kl)`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegralTensorSet {
    overlap: Array2<f64>,
    kinetic: Array2<f64>,
    nuclear_attraction: Array2<f64>,
    electron_repulsion: Array4<f64>,
}

impl IntegralTensorSet {
    pub fn new(
        overlap: Array2<f64>,
        kinetic: Array2<f64>,
        nuclear_attraction: Array2<f64>,
        electron_repulsion: Array4<f64>,
    ) -> Result<Self> {
        let n = overlap.nrows();
        for (name, shape) in [
            (TensorName::Overlap, overlap.shape()),
            (TensorName::Kinetic, kinetic.shape()),
            (TensorName::NuclearAttraction, nuclear_attraction.shape()),
            (TensorName::ElectronRepulsion, electron_repulsion.shape()),
        ] {
            let expected = vec![n; name.rank()];
            if shape != expected.as_slice() {
                return Err(ArchiveError::schema(
                    format!("integrals/{name}"),
                    format!("shape {shape:?} does not match n_basis = {n}"),
                ));
            }
        }

        Ok(Self {
            overlap,
            kinetic,
            nuclear_attraction,
            electron_repulsion,
        })
    }

    pub fn n_basis(&self) -> usize {
        self.overlap.nrows()
    }

    pub fn overlap(&self) -> &Array2<f64> {
        &self.overlap
    }

    pub fn kinetic(&self) -> &Array2<f64> {
        &self.kinetic
    }

    pub fn nuclear_attraction(&self) -> &Array2<f64> {
        &self.nuclear_attraction
    }

    pub fn electron_repulsion(&self) -> &Array4<f64> {
        &self.electron_repulsion
    }

    pub fn get(&self, name: TensorName) -> ArrayViewD<'_, f64> {
        match name {
            TensorName::ElectronRepulsion => self.electron_repulsion.view().into_dyn(),
            TensorName::NuclearAttraction => self.nuclear_attraction.view().into_dyn(),
            TensorName::Kinetic => self.kinetic.view().into_dyn(),
            TensorName::Overlap => self.overlap.view().into_dyn(),
        }
    }

    /// Largest deviation from the expected permutation symmetry of every tensor.
    pub fn check_symmetry(&self) -> SymmetryReport {
        let deviations = TensorName::ALL
            .into_iter()
            .map(|name| {
                let deviation = match name {
                    TensorName::ElectronRepulsion => eri_asymmetry(&self.electron_repulsion),
                    TensorName::NuclearAttraction => matrix_asymmetry(&self.nuclear_attraction),
                    TensorName::Kinetic => matrix_asymmetry(&self.kinetic),
                    TensorName::Overlap => matrix_asymmetry(&self.overlap),
                };
                (name, deviation)
            })
            .collect();
        SymmetryReport { deviations }
    }
}

#[derive(Debug, Clone)]
pub struct SymmetryReport {
    pub deviations: Vec<(TensorName, f64)>,
}

impl SymmetryReport {
    pub fn max_deviation(&self) -> f64 {
        self.deviations.iter().map(|(_, d)| *d).fold(0.0, f64::max)
    }

    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        self.max_deviation() <= tolerance
    }
}

fn matrix_asymmetry(matrix: &Array2<f64>) -> f64 {
    let n = matrix.nrows();
    let mut worst = 0.0f64;
    for i in 0..n {
        for j in 0..i {
            worst = worst.max((matrix[[i, j]] - matrix[[j, i]]).abs());
        }
    }
    worst
}

// (ij|kl) = (ji|kl) = (ij|lk) = (kl|ij)
fn eri_asymmetry(eri: &Array4<f64>) -> f64 {
    let n = eri.shape()[0];
    (0..n)
        .into_par_iter()
        .map(|i| {
            let mut worst = 0.0f64;
            for j in 0..n {
                for k in 0..n {
                    for l in 0..n {
                        let v = eri[[i, j, k, l]];
                        worst = worst
                            .max((v - eri[[j, i, k, l]]).abs())
                            .max((v - eri[[i, j, l, k]]).abs())
                            .max((v - eri[[k, l, i, j]]).abs());
                    }
                }
            }
            worst
        })
        .reduce(|| 0.0, f64::max)
}

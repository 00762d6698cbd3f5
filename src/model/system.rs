use crate::error::{ArchiveError, Result};
use nalgebra::Vector3;
use periodic_table_on_an_enum::Element;

/// Nuclear framework and electron occupation of a molecule.
///
/// Coordinates are in Bohr. Electron counts are always stored explicitly as
/// `(alpha, beta)` with `alpha >= beta`, closed-shell systems included.
#[derive(Debug, Clone, PartialEq)]
pub struct MolecularSystem {
    atomic_numbers: Vec<u32>,
    coordinates: Vec<Vector3<f64>>,
    electron_counts: (usize, usize),
}

impl MolecularSystem {
    pub fn new(
        atomic_numbers: Vec<u32>,
        coordinates: Vec<Vector3<f64>>,
        electron_counts: (usize, usize),
    ) -> Result<Self> {
        if atomic_numbers.is_empty() {
            return Err(ArchiveError::invalid_system("system contains no atoms"));
        }
        if atomic_numbers.len() != coordinates.len() {
            return Err(ArchiveError::invalid_system(format!(
                "{} atomic numbers but {} coordinate triples",
                atomic_numbers.len(),
                coordinates.len()
            )));
        }
        for &z in &atomic_numbers {
            element_for(z)?;
        }
        if let Some(coord) = coordinates.iter().find(|c| c.iter().any(|x| !x.is_finite())) {
            return Err(ArchiveError::invalid_system(format!(
                "non-finite coordinate [{}, {}, {}]",
                coord.x, coord.y, coord.z
            )));
        }
        let (alpha, beta) = electron_counts;
        if alpha < beta {
            return Err(ArchiveError::invalid_system(format!(
                "electron counts must satisfy alpha >= beta, got ({alpha}, {beta})"
            )));
        }

        Ok(Self {
            atomic_numbers,
            coordinates,
            electron_counts,
        })
    }

    /// Build a system from element symbols; symbols are matched case-insensitively.
    pub fn from_symbols<S: AsRef<str>>(
        symbols: &[S],
        coordinates: Vec<Vector3<f64>>,
        electron_counts: (usize, usize),
    ) -> Result<Self> {
        let atomic_numbers = atomic_numbers_for(symbols)?;
        Self::new(atomic_numbers, coordinates, electron_counts)
    }

    /// Build a system whose electron counts follow from the total nuclear
    /// charge, the molecular charge and the spin multiplicity (2S+1).
    pub fn from_charge_and_multiplicity<S: AsRef<str>>(
        symbols: &[S],
        coordinates: Vec<Vector3<f64>>,
        charge: i32,
        multiplicity: usize,
    ) -> Result<Self> {
        let atomic_numbers = atomic_numbers_for(symbols)?;
        let nuclear: i64 = atomic_numbers.iter().map(|&z| i64::from(z)).sum();
        let n_electrons = nuclear - i64::from(charge);
        if n_electrons < 0 {
            return Err(ArchiveError::invalid_system(format!(
                "charge {charge} exceeds total nuclear charge {nuclear}"
            )));
        }
        if multiplicity == 0 {
            return Err(ArchiveError::invalid_system("multiplicity must be at least 1"));
        }

        let unpaired = i64::try_from(multiplicity - 1).map_err(|_| {
            ArchiveError::invalid_system(format!("multiplicity {multiplicity} is out of range"))
        })?;
        if unpaired > n_electrons || (n_electrons - unpaired) % 2 != 0 {
            return Err(ArchiveError::invalid_system(format!(
                "multiplicity {multiplicity} is incompatible with {n_electrons} electrons"
            )));
        }
        let beta = ((n_electrons - unpaired) / 2) as usize;
        let alpha = beta + unpaired as usize;

        Self::new(atomic_numbers, coordinates, (alpha, beta))
    }

    pub fn atomic_numbers(&self) -> &[u32] {
        &self.atomic_numbers
    }

    pub fn coordinates(&self) -> &[Vector3<f64>] {
        &self.coordinates
    }

    pub fn electron_counts(&self) -> (usize, usize) {
        self.electron_counts
    }

    pub fn n_alpha(&self) -> usize {
        self.electron_counts.0
    }

    pub fn n_beta(&self) -> usize {
        self.electron_counts.1
    }

    pub fn n_atoms(&self) -> usize {
        self.atomic_numbers.len()
    }

    pub fn n_electrons(&self) -> usize {
        self.electron_counts.0 + self.electron_counts.1
    }

    /// Number of unpaired electrons, `alpha - beta`.
    pub fn spin(&self) -> usize {
        self.electron_counts.0 - self.electron_counts.1
    }

    pub fn multiplicity(&self) -> usize {
        self.spin() + 1
    }

    pub fn is_closed_shell(&self) -> bool {
        self.spin() == 0
    }

    pub fn charge(&self) -> i64 {
        let nuclear: i64 = self.atomic_numbers.iter().map(|&z| i64::from(z)).sum();
        nuclear - self.n_electrons() as i64
    }

    pub fn elements(&self) -> Vec<Element> {
        // atomic numbers were checked on construction
        self.atomic_numbers
            .iter()
            .filter_map(|&z| Element::from_atomic_number(z as usize))
            .collect()
    }

    pub fn element_symbols(&self) -> Vec<&'static str> {
        self.elements().iter().map(|e| e.get_symbol()).collect()
    }
}

fn element_for(z: u32) -> Result<Element> {
    Element::from_atomic_number(z as usize)
        .ok_or_else(|| ArchiveError::invalid_system(format!("unknown atomic number {z}")))
}

fn atomic_numbers_for<S: AsRef<str>>(symbols: &[S]) -> Result<Vec<u32>> {
    symbols
        .iter()
        .map(|symbol| {
            let canonical = canonical_symbol(symbol.as_ref());
            Element::from_symbol(&canonical)
                .map(|e| e.get_atomic_number() as u32)
                .ok_or_else(|| {
                    ArchiveError::invalid_system(format!(
                        "invalid element symbol: {}",
                        symbol.as_ref()
                    ))
                })
        })
        .collect()
}

/// "he" / "HE" -> "He"
fn canonical_symbol(symbol: &str) -> String {
    let trimmed = symbol.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

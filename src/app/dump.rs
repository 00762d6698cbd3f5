use super::{load_config, python_runtime};
use crate::archive::{ArchiveWriter, WriterOptions};
use crate::model::IntegralArchive;
use crate::backend::{ensure_supported, BackendKind, IntegralBackend};
use crate::config::{DumpArgs, DumpConfig, DEFAULT_COMPRESSION};
use crate::io::{setup_output, write_system_table};
use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::path::PathBuf;
use tracing::info;

pub struct DumpApplication {
    args: DumpArgs,
    config: DumpConfig,
}

impl DumpApplication {
    pub fn from_cli() -> Result<Self> {
        Self::new(DumpArgs::parse())
    }

    /// Load the configuration named in `args` and apply the basis set override.
    pub fn new(args: DumpArgs) -> Result<Self> {
        let mut config = load_config(&args.config_file)?;
        if let Some(name) = &args.basis_set_name {
            config.discretisation = config
                .discretisation
                .override_basis_set(name)
                .wrap_err("Cannot apply the basis set given on the command line")?;
        }
        Ok(Self { args, config })
    }

    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    pub fn backend_kind(&self) -> Result<BackendKind> {
        match self.args.backend {
            Some(kind) => Ok(kind),
            None => Ok(self.config.backend_kind()?),
        }
    }

    pub fn run(self) -> Result<PathBuf> {
        setup_output(self.args.log_file.as_deref());

        let runtime = python_runtime(self.args.python.as_deref(), self.config.python.as_deref());
        let backend = self.backend_kind()?.integral_backend(runtime);
        self.run_with(backend.as_ref())
    }

    /// Compute the integrals with `backend` and write the archive. Returns
    /// the path written.
    pub fn run_with(&self, backend: &dyn IntegralBackend) -> Result<PathBuf> {
        let system = self
            .config
            .to_system()
            .wrap_err("Invalid geometry or electron configuration")?;
        let discretisation = self
            .config
            .to_discretisation()
            .wrap_err("Invalid discretisation")?;
        ensure_supported(backend, &discretisation)?;

        let mut table = Vec::new();
        write_system_table(&mut table, &system)?;
        for line in String::from_utf8_lossy(&table).lines() {
            info!("{}", line);
        }
        info!("Computing integrals with {} for {}", backend.name(), discretisation);

        let (basis, integrals) = backend
            .compute_integrals(&system, &discretisation)
            .wrap_err_with(|| format!("Integral evaluation with {} failed", backend.name()))?;
        if basis.n_basis != integrals.n_basis() {
            return Err(eyre!(
                "{} reported {} basis functions but returned tensors over {}",
                backend.name(),
                basis.n_basis,
                integrals.n_basis()
            ));
        }
        let discretisation = basis.refine(discretisation)?;

        let compression = self
            .args
            .compression
            .or(self.config.compression)
            .unwrap_or(DEFAULT_COMPRESSION);
        let writer = ArchiveWriter::new(WriterOptions::with_compression(compression));
        let output = self.args.output.as_ref().or(self.config.output.as_ref());

        // an existing directory receives the archive under its canonical name
        let path = match output {
            Some(dir) if dir.is_dir() => {
                let archive = IntegralArchive::new(system, integrals, discretisation)?;
                writer.write_in_dir(&archive, dir)
            }
            other => writer.write_parts(system, integrals, discretisation, other.map(PathBuf::as_path)),
        }
        .wrap_err("Failed to write the integral archive")?;
        info!("Integral archive written to {}", path.display());
        Ok(path)
    }
}

//! Input/Output operations for the integral drivers
//!
//! This module handles logging setup and human-readable summaries of
//! archives and SCF runs.

mod output;
mod summary;

pub use output::setup_output;
pub use summary::{log_archive_summary, log_symmetry_report, print_scf_report, write_system_table};

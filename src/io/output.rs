//! Logging setup

use std::fmt;
use std::fs::File;
use std::time::SystemTime as StdSystemTime;
use tracing::{debug, info};
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, EnvFilter, Registry,
};

/// Custom time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let now = StdSystemTime::now();
        let duration = now
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();

        let total_seconds = duration.as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// `RUST_LOG` if set, `info` otherwise.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Setup log output to a file or stdout.
///
/// Falls back to stdout when the log file cannot be created. Calling this
/// more than once keeps the first subscriber.
pub fn setup_output(log_file: Option<&str>) {
    let file = log_file.and_then(|path| match File::create(path) {
        Ok(file) => Some((path, file)),
        Err(e) => {
            eprintln!("Could not create log file {}: {}", path, e);
            None
        }
    });

    let installed = match file {
        Some((path, log)) => {
            let file_layer = layer()
                .with_writer(log)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(false);
            let result = Registry::default()
                .with(env_filter())
                .with(file_layer)
                .try_init();
            if result.is_ok() {
                info!("Log will be written to: {}", path);
            }
            result
        }
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default()
                .with(env_filter())
                .with(stdout_layer)
                .try_init()
        }
    };

    if let Err(e) = installed {
        debug!("Keeping the existing log subscriber: {}", e);
    }
}

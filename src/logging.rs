//! Run logging
//!
//! Every progress line goes to stdout and to a run log file. The log file is
//! truncated at the start of each run. Failing to open or write it never stops
//! the run.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default run log name, placed in the output directory
pub const LOG_FILE_NAME: &str = "ddlift.log";

pub fn default_log_path(output_dir: &Path) -> PathBuf {
    output_dir.join(LOG_FILE_NAME)
}

/// Create (or truncate) the run log
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    File::create(path)
}

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber: stdout plus the run log at `log_path`
///
/// `RUST_LOG` takes precedence over the `-v` level.
pub fn init(verbose: u8, log_path: &Path) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let console_layer = fmt::layer().with_target(false);

    let (file_layer, open_error) = match open_log_file(log_path) {
        Ok(file) => (
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if let Err(e) = installed {
        eprintln!("ddlift: failed to install logger: {}", e);
        return;
    }

    if let Some(e) = open_error {
        warn!(path = ?log_path, error = ?e, "Cannot open run log, logging to stdout only");
    }
}

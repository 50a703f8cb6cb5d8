use crate::error::{PressError, Result};
use indicatif::MultiProgress;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

static PROGRESS: Lazy<MultiProgress> = Lazy::new(MultiProgress::new);

pub fn set_quiet_mode(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

/// Quiet mode hides progress bars as well as info-level logs.
pub fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Shared progress display; every bar of a run is attached to it.
pub fn multi_progress() -> &'static MultiProgress {
    &PROGRESS
}

/// Stderr writer that hides the progress bars while a log line is printed,
/// so bars and log output never interleave on the terminal.
pub struct ProgressAwareWriter;

impl Write for ProgressAwareWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        PROGRESS.suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

fn default_directive(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Installs the global `tracing` subscriber writing to stderr through
/// [`ProgressAwareWriter`].
///
/// `RUST_LOG` takes precedence over `--quiet` / `--verbose`.
pub fn init_logging(quiet: bool, verbose: bool) -> Result<()> {
    set_quiet_mode(quiet);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(quiet, verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(|| ProgressAwareWriter)
        .with_target(false)
        .try_init()
        .map_err(|e| PressError::Config(format!("failed to initialise logging: {}", e)))
}

/// Output writing, progress bars and run reporting shared by both pipelines.
use crate::constants::PROGRESS_BAR_TEMPLATE;
use crate::error::{PressError, Result};
use crate::logger::{is_quiet, multi_progress};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Writes `bytes` to `path`, creating parent directories as needed and
/// replacing any existing file.
///
/// The data lands in a temporary file next to the destination first and is
/// renamed into place, so an interrupted run never leaves a truncated output.
///
/// # Arguments
/// * `path` - Destination file; missing parent directories are created
/// * `bytes` - Complete file contents
///
/// # Returns
/// * `Ok(())` once the file is in place, `Err(PressError::Write)` naming
///   `path` otherwise
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_err = |source: std::io::Error| PressError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_err)?;

    let mut temp = NamedTempFile::new_in(parent).map_err(write_err)?;
    temp.write_all(bytes).map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Compression ratio as a percentage; positive means the output is smaller.
pub fn calculate_compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    ((original_size as f64 - compressed_size as f64) / original_size as f64) * 100.0
}

/// Item-level progress bar attached to the shared display, hidden in quiet
/// mode.
///
/// # Arguments
/// * `len` - Number of items the run will process
/// * `message` - Label shown next to the bar
///
/// # Returns
/// * Configured `ProgressBar`, already registered with [`multi_progress`]
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    if is_quiet() {
        return ProgressBar::hidden();
    }

    let pb = multi_progress().add(ProgressBar::new(len));
    let style = ProgressStyle::with_template(PROGRESS_BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Counters shared by the worker threads of one run.
#[derive(Debug, Default)]
pub struct RunStats {
    compressed: AtomicUsize,
    kept_original: AtomicUsize,
    copied: AtomicUsize,
    failed: AtomicUsize,
    bytes_before: AtomicU64,
    bytes_after: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_compressed(&self, before: u64, after: u64) {
        self.compressed.fetch_add(1, Ordering::Relaxed);
        self.add_bytes(before, after);
    }

    pub fn record_kept_original(&self, size: u64) {
        self.kept_original.fetch_add(1, Ordering::Relaxed);
        self.add_bytes(size, size);
    }

    pub fn record_copied(&self, size: u64) {
        self.copied.fetch_add(1, Ordering::Relaxed);
        self.add_bytes(size, size);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn add_bytes(&self, before: u64, after: u64) {
        self.bytes_before.fetch_add(before, Ordering::Relaxed);
        self.bytes_after.fetch_add(after, Ordering::Relaxed);
    }

    pub fn summary(&self, elapsed: Duration) -> RunSummary {
        RunSummary {
            compressed: self.compressed.load(Ordering::Relaxed),
            kept_original: self.kept_original.load(Ordering::Relaxed),
            copied: self.copied.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bytes_before: self.bytes_before.load(Ordering::Relaxed),
            bytes_after: self.bytes_after.load(Ordering::Relaxed),
            elapsed,
        }
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub compressed: usize,
    pub kept_original: usize,
    pub copied: usize,
    pub failed: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn empty() -> Self {
        RunStats::new().summary(Duration::ZERO)
    }

    pub fn written(&self) -> usize {
        self.compressed + self.kept_original + self.copied
    }

    pub fn compression_ratio(&self) -> f64 {
        calculate_compression_ratio(self.bytes_before, self.bytes_after)
    }

    pub fn log(&self) {
        info!(
            written = self.written(),
            compressed = self.compressed,
            kept_original = self.kept_original,
            copied = self.copied,
            "Run complete in {:.2?}",
            self.elapsed
        );
        info!(
            "Total size: {} -> {} ({:.1}% saved)",
            format_file_size(self.bytes_before),
            format_file_size(self.bytes_after),
            self.compression_ratio()
        );
        if self.failed > 0 {
            warn!("{} item(s) failed and were skipped", self.failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_file_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_calculate_compression_ratio() {
        assert_eq!(calculate_compression_ratio(1000, 800), 20.0);
        assert_eq!(calculate_compression_ratio(1000, 1200), -20.0);
        assert_eq!(calculate_compression_ratio(1000, 1000), 0.0);
        assert_eq!(calculate_compression_ratio(0, 500), 0.0);
    }

    #[test]
    fn test_write_output_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("a").join("b").join("out.bin");

        write_output(&target, b"hello").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"hello");

        // existing directories are fine
        write_output(&temp_dir.path().join("a").join("other.bin"), b"x").unwrap();
    }

    #[test]
    fn test_write_output_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out.bin");

        write_output(&target, b"first version, longer").unwrap();
        write_output(&target, b"second").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"second");

        let leftovers = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_write_output_reports_path_on_failure() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();

        let result = write_output(&blocker.join("child.bin"), b"data");
        match result {
            Err(PressError::Write { path, .. }) => assert!(path.ends_with("child.bin")),
            other => panic!("expected write error, got {:?}", other),
        }
    }

    #[test]
    fn test_run_stats_summary() {
        let stats = RunStats::new();
        stats.record_compressed(1000, 400);
        stats.record_kept_original(200);
        stats.record_copied(50);
        stats.record_failed();

        let summary = stats.summary(Duration::from_secs(1));
        assert_eq!(summary.written(), 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.bytes_before, 1250);
        assert_eq!(summary.bytes_after, 650);
        assert!(summary.compression_ratio() > 0.0);
    }
}

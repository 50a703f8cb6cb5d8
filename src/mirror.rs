use crate::config::MirrorSettings;
use crate::error::{PressError, Result};
use crate::formats::ImageKind;
use crate::processing::{compress_image_bytes, effective_quality};
use crate::utils::{create_progress_bar, format_file_size, write_output, RunStats, RunSummary};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// A file found under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the source root; reproduced under the output root.
    pub relative: PathBuf,
}

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    Compressed {
        output: PathBuf,
        original_size: u64,
        compressed_size: u64,
        quality: u8,
    },
    /// Re-encoding did not shrink the file; the source bytes were written.
    KeptOriginal { output: PathBuf, size: u64 },
    /// Not an image (or not decodable); copied verbatim.
    Copied { output: PathBuf, size: u64 },
}

/// Recursively lists every regular file under `root`, sorted by relative
/// path. Unreadable entries are logged and skipped.
pub fn collect_source_files(root: &Path) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        return Err(PressError::SourceNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        let relative = match path.strip_prefix(root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => continue,
        };
        files.push(SourceFile { path, relative });
    }

    Ok(files)
}

/// Destination for a re-encoded image: the source's relative path under
/// `output_root`, with the extension swapped when converting.
pub fn compressed_output_path(file: &SourceFile, output_root: &Path, target: Option<ImageKind>) -> PathBuf {
    let mirrored = output_root.join(&file.relative);
    match target {
        Some(kind) => mirrored.with_extension(kind.extension()),
        None => mirrored,
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

/// Converted-output path for every file, in the same order as `files`.
///
/// Converting can map two sources onto one name (`pic.bmp` and `pic.tiff`
/// both become `pic.webp`), or onto the name of another source (`pic.webp`).
/// Every contested file keeps its full name and gets the new extension
/// appended instead (`pic.tiff.webp`). Names are compared case-insensitively.
pub fn plan_converted_outputs(
    files: &[SourceFile],
    output_root: &Path,
    target: Option<ImageKind>,
) -> Vec<PathBuf> {
    let Some(kind) = target else {
        return files.iter().map(|f| output_root.join(&f.relative)).collect();
    };

    // non-image files are always mirrored under their own name
    let candidates: Vec<PathBuf> = files
        .iter()
        .map(|f| match ImageKind::from_path(&f.relative) {
            Some(_) => f.relative.with_extension(kind.extension()),
            None => f.relative.clone(),
        })
        .collect();

    let mut taken: HashSet<String> = files.iter().map(|f| path_key(&f.relative)).collect();
    let mut claims: HashMap<String, usize> = HashMap::new();
    for candidate in &candidates {
        *claims.entry(path_key(candidate)).or_default() += 1;
    }

    // a file already carrying the target name keeps it; anyone else wanting
    // that name, or sharing a name with another converted file, is contested
    let contested: Vec<bool> = files
        .iter()
        .zip(&candidates)
        .map(|(file, candidate)| {
            let key = path_key(candidate);
            key != path_key(&file.relative) && (claims[&key] > 1 || taken.contains(&key))
        })
        .collect();

    for (candidate, &contested) in candidates.iter().zip(&contested) {
        if !contested {
            taken.insert(path_key(candidate));
        }
    }

    files
        .iter()
        .zip(candidates)
        .zip(contested)
        .map(|((file, candidate), contested)| {
            if !contested {
                return output_root.join(candidate);
            }

            let file_name = file.relative.file_name().unwrap_or_default().to_string_lossy();
            let mut renamed = file
                .relative
                .with_file_name(format!("{}.{}", file_name, kind.extension()));
            let mut counter = 2;
            while !taken.insert(path_key(&renamed)) {
                renamed = file.relative.with_file_name(format!(
                    "{}.{}.{}",
                    file_name,
                    counter,
                    kind.extension()
                ));
                counter += 1;
            }
            warn!(
                "Output name for {} is shared with another file; writing {}",
                file.relative.display(),
                renamed.display()
            );
            output_root.join(renamed)
        })
        .collect()
}

fn copy_verbatim(file: &SourceFile, bytes: &[u8], output_root: &Path) -> Result<MirrorOutcome> {
    let output = output_root.join(&file.relative);
    write_output(&output, bytes)?;
    Ok(MirrorOutcome::Copied {
        output,
        size: bytes.len() as u64,
    })
}

/// Mirrors one file into the output tree, writing a successful conversion to
/// [`compressed_output_path`].
pub fn mirror_file(file: &SourceFile, settings: &MirrorSettings) -> Result<MirrorOutcome> {
    let converted = compressed_output_path(
        file,
        &settings.output,
        settings.format.map(|f| f.kind()),
    );
    mirror_file_to(file, &converted, settings)
}

/// Mirrors one file into the output tree, writing a successful conversion to
/// `converted_output`.
///
/// The written file is never larger than the source: when the re-encoded
/// bytes are not strictly smaller, the source bytes are written under the
/// source's own name instead.
pub fn mirror_file_to(
    file: &SourceFile,
    converted_output: &Path,
    settings: &MirrorSettings,
) -> Result<MirrorOutcome> {
    let bytes = fs::read(&file.path)?;
    let original_size = bytes.len() as u64;

    let Some(source_kind) = ImageKind::from_path(&file.path) else {
        return copy_verbatim(file, &bytes, &settings.output);
    };

    let target_kind = settings.format.map(|f| f.kind());
    let output_kind = target_kind.unwrap_or(source_kind);
    // the size heuristic only applies to encoders that take a quality
    let quality = if output_kind.is_lossy() {
        effective_quality(
            original_size,
            settings.threshold,
            settings.quality,
            settings.aggressive_drop,
        )
    } else {
        settings.quality
    };
    if quality != settings.quality {
        info!(
            "Applying aggressive quality={} for large file > {}: {}",
            quality,
            format_file_size(settings.threshold),
            file.relative.display()
        );
    }

    let result = match compress_image_bytes(&bytes, output_kind, quality) {
        Ok(result) => result,
        Err(e) => {
            warn!(
                "Could not convert {} ({}); copying original",
                file.relative.display(),
                e
            );
            return copy_verbatim(file, &bytes, &settings.output);
        }
    };

    if result.keeps_original() {
        let output = settings.output.join(&file.relative);
        write_output(&output, &bytes)?;
        warn!(
            "Skipped compression for {}; compressed size {} >= original {}",
            file.relative.display(),
            format_file_size(result.compressed_size),
            format_file_size(original_size)
        );
        return Ok(MirrorOutcome::KeptOriginal {
            output,
            size: original_size,
        });
    }

    let output = converted_output.to_path_buf();
    write_output(&output, &result.data)?;
    debug!(
        "Compressed {} ({} -> {})",
        output.display(),
        format_file_size(original_size),
        format_file_size(result.compressed_size)
    );

    Ok(MirrorOutcome::Compressed {
        output,
        original_size,
        compressed_size: result.compressed_size,
        quality,
    })
}

fn is_same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// When the output root lives inside the source root, returns its path
/// relative to the source so a re-run does not feed on its own output.
fn nested_output_dir(source: &Path, output: &Path) -> Option<PathBuf> {
    let source = source.canonicalize().ok()?;
    let output = output.canonicalize().ok()?;
    output
        .strip_prefix(&source)
        .ok()
        .filter(|relative| !relative.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Runs the disk workflow over `settings.source`.
pub fn run_mirror_pipeline(settings: &MirrorSettings) -> Result<RunSummary> {
    let start_time = Instant::now();

    if is_same_dir(&settings.source, &settings.output) {
        return Err(PressError::Config(format!(
            "output directory {} must differ from the source directory",
            settings.output.display()
        )));
    }

    let mut files = collect_source_files(&settings.source)?;
    if let Some(nested) = nested_output_dir(&settings.source, &settings.output) {
        debug!("Excluding nested output directory {}", nested.display());
        files.retain(|file| !file.relative.starts_with(&nested));
    }
    if files.is_empty() {
        error!("No files found in {}", settings.source.display());
        return Ok(RunSummary::empty());
    }
    info!("Found {} files to process", files.len());

    fs::create_dir_all(&settings.output)
        .map_err(|source| PressError::Write {
            path: settings.output.clone(),
            source,
        })?;

    let stats = RunStats::new();
    let progress = create_progress_bar(files.len() as u64, "Processing files");

    let converted = plan_converted_outputs(
        &files,
        &settings.output,
        settings.format.map(|f| f.kind()),
    );

    files.par_iter().zip(&converted).for_each(|(file, converted_output)| {
        match mirror_file_to(file, converted_output, settings) {
            Ok(MirrorOutcome::Compressed {
                original_size,
                compressed_size,
                ..
            }) => stats.record_compressed(original_size, compressed_size),
            Ok(MirrorOutcome::KeptOriginal { size, .. }) => stats.record_kept_original(size),
            Ok(MirrorOutcome::Copied { output, size }) => {
                debug!("Copied {} to {}", file.path.display(), output.display());
                stats.record_copied(size);
            }
            Err(e) => {
                stats.record_failed();
                error!("Failed to process {}: {}", file.path.display(), e);
            }
        }
        progress.inc(1);
    });

    progress.finish_and_clear();
    info!("All files processed");
    Ok(stats.summary(start_time.elapsed()))
}

use crate::config::LinkSettings;
use crate::constants::IMAGE_FILE_PREFIX;
use crate::document::{parse_categories, read_document_text, Category};
use crate::error::Result;
use crate::fetch::{HttpFetcher, ImageFetcher};
use crate::formats::TargetFormat;
use crate::logger::multi_progress;
use crate::processing::{compress_image, decode_image, CompressionResult};
use crate::utils::{create_progress_bar, write_output, RunStats, RunSummary};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};

/// Turns a document heading into a single safe path component.
pub fn category_dir_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_end_matches(['.', ' ']).to_string();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Folder name for every category, in order. Headings that clean up to the
/// same name (`a/b` and `a_b`, or names differing only in case) get a `_2`,
/// `_3`, ... suffix so no category overwrites another's files.
pub fn unique_dir_names(categories: &[Category]) -> Vec<String> {
    let mut taken = HashSet::new();
    let mut names = Vec::with_capacity(categories.len());

    for category in categories {
        let base = category_dir_name(&category.name);
        let mut name = base.clone();
        let mut suffix = 2;
        while !taken.insert(name.to_lowercase()) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        if name != base {
            warn!(
                "Category '{}' collides with an earlier folder name; saving to '{}'",
                category.name, name
            );
        }
        names.push(name);
    }

    names
}

/// `<folder>/image_<index>.<ext>`, with `index` starting at 1.
pub fn link_output_path(folder: &Path, index: usize, format: TargetFormat) -> PathBuf {
    folder.join(format!(
        "{}{}.{}",
        IMAGE_FILE_PREFIX,
        index,
        format.extension()
    ))
}

/// Fetches, decodes and re-encodes a single URL.
pub fn fetch_and_encode(
    fetcher: &dyn ImageFetcher,
    url: &str,
    format: TargetFormat,
    quality: u8,
) -> Result<CompressionResult> {
    let bytes = fetcher.fetch(url)?;
    let img = decode_image(&bytes)?;
    compress_image(&img, bytes.len() as u64, format.kind(), quality)
}

/// Processes every URL of every category. Per-URL failures are logged and
/// counted; only failing to create the output tree aborts the run.
pub fn process_categories(
    categories: &[Category],
    output_root: &Path,
    format: TargetFormat,
    quality: u8,
    fetcher: &dyn ImageFetcher,
) -> Result<RunSummary> {
    let start_time = Instant::now();
    let stats = RunStats::new();

    fs::create_dir_all(output_root)?;

    let total: usize = categories.iter().map(|c| c.urls.len()).sum();
    let progress = create_progress_bar(total as u64, "Processing images");

    let dir_names = unique_dir_names(categories);
    for (category, dir_name) in categories.iter().zip(&dir_names) {
        let folder = output_root.join(dir_name);
        fs::create_dir_all(&folder)?;
        info!(
            "Processing category '{}' with {} images",
            category.name,
            category.urls.len()
        );

        category
            .urls
            .par_iter()
            .enumerate()
            .for_each(|(position, url)| {
                let index = position + 1;
                let path = link_output_path(&folder, index, format);
                let outcome = fetch_and_encode(fetcher, url, format, quality)
                    .and_then(|result| write_output(&path, &result.data).map(|_| result));

                match outcome {
                    Ok(result) => {
                        stats.record_compressed(result.original_size, result.compressed_size);
                        info!("Saved image to {}", path.display());
                    }
                    Err(e) => {
                        stats.record_failed();
                        error!(
                            "Failed to process image {}/{} in '{}' from {}: {}",
                            index,
                            category.urls.len(),
                            category.name,
                            url,
                            e
                        );
                    }
                }
                progress.inc(1);
            });
    }

    progress.finish_and_clear();
    Ok(stats.summary(start_time.elapsed()))
}

/// Runs the whole link workflow: read and parse the document, then download
/// and convert every listed image.
pub fn run_link_pipeline(settings: &LinkSettings) -> Result<RunSummary> {
    let text = read_document_text(&settings.document)?;
    let parsed = parse_categories(&text);

    for skipped in &parsed.skipped {
        warn!("{}", skipped);
    }
    for category in &parsed.categories {
        info!(
            "Extracted {} URLs for category '{}'",
            category.urls.len(),
            category.name
        );
    }

    if parsed.categories.is_empty() {
        error!(
            "No image data was extracted from {}",
            settings.document.display()
        );
        return Ok(RunSummary::empty());
    }

    let fetcher = HttpFetcher::new(settings.timeout)?.with_progress(multi_progress().clone());

    info!(
        "Converting {} images to {} (quality {}) under {}",
        parsed.url_count(),
        settings.format,
        settings.quality,
        settings.output.display()
    );

    process_categories(
        &parsed.categories,
        &settings.output,
        settings.format,
        settings.quality,
        &fetcher,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PressError;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::collections::HashMap;
    use std::io::Cursor;
    use tempfile::TempDir;

    struct MapFetcher(HashMap<String, Vec<u8>>);

    impl ImageFetcher for MapFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.0.get(url).cloned().ok_or_else(|| PressError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    fn png_bytes(seed: u8) -> Vec<u8> {
        let img = RgbImage::from_fn(24, 16, |x, y| Rgb([seed, x as u8 * 9, y as u8 * 11]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn category(name: &str, urls: &[&str]) -> Category {
        Category {
            name: name.to_string(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn test_category_dir_name() {
        assert_eq!(category_dir_name("Cats"), "Cats");
        assert_eq!(category_dir_name("  Big Cats  "), "Big Cats");
        assert_eq!(category_dir_name("a/b\\c"), "a_b_c");
        assert_eq!(category_dir_name(".."), "_");
        assert_eq!(category_dir_name(""), "_");
    }

    #[test]
    fn test_link_output_path() {
        let path = link_output_path(Path::new("out/Cats"), 3, TargetFormat::WebP);
        assert_eq!(path, PathBuf::from("out/Cats/image_3.webp"));
    }

    #[test]
    fn test_unique_dir_names() {
        let categories = vec![
            category("a/b", &[]),
            category("a_b", &[]),
            category("Cats.", &[]),
            category("Cats", &[]),
            category("cats", &[]),
            category("a_b", &[]),
        ];
        assert_eq!(
            unique_dir_names(&categories),
            vec!["a_b", "a_b_2", "Cats", "Cats_2", "cats_3", "a_b_3"]
        );
    }

    #[test]
    fn test_colliding_folder_names_keep_every_image() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = MapFetcher(HashMap::from([
            ("https://a.example/1".to_string(), png_bytes(1)),
            ("https://b.example/1".to_string(), png_bytes(2)),
        ]));
        let categories = vec![
            category("a/b", &["https://a.example/1"]),
            category("a_b", &["https://b.example/1"]),
        ];

        let summary =
            process_categories(&categories, temp_dir.path(), TargetFormat::Png, 80, &fetcher)
                .unwrap();

        assert_eq!(summary.written(), 2);
        let first = fs::read(temp_dir.path().join("a_b/image_1.png")).unwrap();
        let second = fs::read(temp_dir.path().join("a_b_2/image_1.png")).unwrap();
        assert_ne!(first, second);
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_two_categories_three_files() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = MapFetcher(HashMap::from([
            ("https://a.example/1".to_string(), png_bytes(1)),
            ("https://a.example/2".to_string(), png_bytes(2)),
            ("https://b.example/1".to_string(), png_bytes(3)),
        ]));
        let categories = vec![
            category("Cats", &["https://a.example/1", "https://a.example/2"]),
            category("Dogs", &["https://b.example/1"]),
        ];

        let summary =
            process_categories(&categories, temp_dir.path(), TargetFormat::WebP, 95, &fetcher)
                .unwrap();

        assert_eq!(summary.written(), 3);
        assert_eq!(summary.failed, 0);
        assert!(temp_dir.path().join("Cats/image_1.webp").is_file());
        assert!(temp_dir.path().join("Cats/image_2.webp").is_file());
        assert!(temp_dir.path().join("Dogs/image_1.webp").is_file());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 2);

        let written = fs::read(temp_dir.path().join("Dogs/image_1.webp")).unwrap();
        assert!(decode_image(&written).is_ok());
    }

    #[test]
    fn test_failures_keep_numbering_stable() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = MapFetcher(HashMap::from([
            ("https://a.example/ok".to_string(), png_bytes(1)),
            ("https://a.example/garbage".to_string(), b"<html>".to_vec()),
            ("https://a.example/ok2".to_string(), png_bytes(2)),
        ]));
        let categories = vec![
            category(
                "Mixed",
                &[
                    "https://a.example/ok",
                    "https://a.example/missing",
                    "https://a.example/garbage",
                    "https://a.example/ok2",
                ],
            ),
            category("Empty", &["https://a.example/missing"]),
        ];

        let summary =
            process_categories(&categories, temp_dir.path(), TargetFormat::Png, 80, &fetcher)
                .unwrap();

        assert_eq!(summary.written(), 2);
        assert_eq!(summary.failed, 3);
        assert!(temp_dir.path().join("Mixed/image_1.png").is_file());
        assert!(!temp_dir.path().join("Mixed/image_2.png").exists());
        assert!(!temp_dir.path().join("Mixed/image_3.png").exists());
        assert!(temp_dir.path().join("Mixed/image_4.png").is_file());
        assert!(temp_dir.path().join("Empty").is_dir());
    }

    #[test]
    fn test_run_link_pipeline_missing_document() {
        let settings = LinkSettings {
            document: PathBuf::from("/nonexistent/images.docx"),
            output: PathBuf::from("/nonexistent/out"),
            format: TargetFormat::WebP,
            quality: 95,
            timeout: std::time::Duration::from_secs(1),
        };
        let result = run_link_pipeline(&settings);
        assert!(matches!(result, Err(PressError::DocumentNotFound(_))));
    }

    #[test]
    fn test_run_link_pipeline_without_categories() {
        let temp_dir = TempDir::new().unwrap();
        let document = temp_dir.path().join("links.txt");
        fs::write(&document, "Heading only\nAnother heading\n").unwrap();

        let settings = LinkSettings {
            document,
            output: temp_dir.path().join("out"),
            format: TargetFormat::WebP,
            quality: 95,
            timeout: std::time::Duration::from_secs(1),
        };
        let summary = run_link_pipeline(&settings).unwrap();
        assert_eq!(summary.written(), 0);
        assert!(!temp_dir.path().join("out").exists());
    }
}

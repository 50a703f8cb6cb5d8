pub mod cli;
pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod fetch;
pub mod formats;
pub mod links;
pub mod logger;
pub mod mirror;
pub mod processing;
pub mod utils;

pub use config::{FileConfig, LinkSettings, MirrorSettings};
pub use document::{parse_categories, read_document_text, Category, ParsedDocument};
pub use error::{PressError, Result};
pub use fetch::{HttpFetcher, ImageFetcher};
pub use formats::{ImageKind, TargetFormat};
pub use links::{process_categories, run_link_pipeline};
pub use mirror::{
    collect_source_files, mirror_file, plan_converted_outputs, run_mirror_pipeline, MirrorOutcome,
    SourceFile,
};
pub use processing::{
    compress_image, compress_image_bytes, decode_image, effective_quality, encode_image,
    CompressionResult,
};
pub use utils::{write_output, RunSummary};

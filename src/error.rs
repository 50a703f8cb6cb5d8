use std::path::PathBuf;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PressError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("HTTP status {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid image dimensions: {0}x{1}. Maximum allowed: {2}x{2}")]
    InvalidDimensions(u32, u32, u32),

    #[error("Failed to encode {format}: {reason}")]
    Encode { format: String, reason: String },

    #[error("Skipped block '{heading}': {reason}")]
    Parse { heading: String, reason: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    InvalidQuality(u8),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Document not found: {0}")]
    DocumentNotFound(PathBuf),

    #[error("Failed to read document archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Malformed document XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PressError {
    /// Errors that abort a whole run. Everything else is handled at the
    /// per-item boundary: logged, counted, and the run moves on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PressError::InvalidQuality(_)
                | PressError::UnsupportedFormat(_)
                | PressError::SourceNotFound(_)
                | PressError::DocumentNotFound(_)
                | PressError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PressError>;

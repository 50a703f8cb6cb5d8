/// Image format model
///
/// `ImageKind` covers every format the pipelines read or write; `TargetFormat`
/// is the narrower set a run may convert into.
use crate::error::{PressError, Result};
use image::ImageFormat;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Formats recognised as images by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Png,
    WebP,
    Bmp,
    Gif,
    Tiff,
}

impl ImageKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "webp" => Some(ImageKind::WebP),
            "bmp" => Some(ImageKind::Bmp),
            "gif" => Some(ImageKind::Gif),
            "tiff" => Some(ImageKind::Tiff),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::WebP => "webp",
            ImageKind::Bmp => "bmp",
            ImageKind::Gif => "gif",
            ImageKind::Tiff => "tiff",
        }
    }

    pub fn to_image_format(&self) -> ImageFormat {
        match self {
            ImageKind::Jpeg => ImageFormat::Jpeg,
            ImageKind::Png => ImageFormat::Png,
            ImageKind::WebP => ImageFormat::WebP,
            ImageKind::Bmp => ImageFormat::Bmp,
            ImageKind::Gif => ImageFormat::Gif,
            ImageKind::Tiff => ImageFormat::Tiff,
        }
    }

    /// Whether the encoder for this format takes a quality setting.
    pub fn is_lossy(&self) -> bool {
        matches!(self, ImageKind::Jpeg | ImageKind::WebP)
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageKind::Jpeg => "JPEG",
            ImageKind::Png => "PNG",
            ImageKind::WebP => "WebP",
            ImageKind::Bmp => "BMP",
            ImageKind::Gif => "GIF",
            ImageKind::Tiff => "TIFF",
        };
        write!(f, "{}", name)
    }
}

/// Formats a run can convert into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    WebP,
    Png,
}

impl TargetFormat {
    pub fn extension(&self) -> &'static str {
        self.kind().extension()
    }

    pub fn kind(&self) -> ImageKind {
        match self {
            TargetFormat::WebP => ImageKind::WebP,
            TargetFormat::Png => ImageKind::Png,
        }
    }

    pub fn format_names() -> Vec<&'static str> {
        vec!["webp", "png"]
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind(), f)
    }
}

impl FromStr for TargetFormat {
    type Err = PressError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "webp" => Ok(TargetFormat::WebP),
            "png" => Ok(TargetFormat::Png),
            _ => Err(PressError::UnsupportedFormat(format!(
                "{} (expected one of: {})",
                s,
                TargetFormat::format_names().join(", ")
            ))),
        }
    }
}

/// Parses an optional target where `none` means "keep the source format".
pub fn parse_optional_target(s: &str) -> Result<Option<TargetFormat>> {
    match s.trim().to_lowercase().as_str() {
        "none" | "keep" | "" => Ok(None),
        _ => TargetFormat::from_str(s).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_kind_from_extension() {
        assert_eq!(ImageKind::from_extension("jpg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_extension("JPEG"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_extension("Png"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_extension("tiff"), Some(ImageKind::Tiff));
        assert_eq!(ImageKind::from_extension("txt"), None);
        assert_eq!(ImageKind::from_extension("avif"), None);
    }

    #[test]
    fn test_image_kind_from_path() {
        assert_eq!(
            ImageKind::from_path(Path::new("a/b/photo.GIF")),
            Some(ImageKind::Gif)
        );
        assert_eq!(ImageKind::from_path(Path::new("README")), None);
        assert_eq!(ImageKind::from_path(Path::new("notes.md")), None);
    }

    #[test]
    fn test_lossy_formats() {
        assert!(ImageKind::Jpeg.is_lossy());
        assert!(ImageKind::WebP.is_lossy());
        assert!(!ImageKind::Png.is_lossy());
        assert!(!ImageKind::Bmp.is_lossy());
    }

    #[test]
    fn test_target_format_from_str() {
        assert_eq!(TargetFormat::from_str("webp").unwrap(), TargetFormat::WebP);
        assert_eq!(TargetFormat::from_str("PNG").unwrap(), TargetFormat::Png);
        assert!(matches!(
            TargetFormat::from_str("jpeg"),
            Err(PressError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_parse_optional_target() {
        assert_eq!(parse_optional_target("none").unwrap(), None);
        assert_eq!(parse_optional_target("NONE").unwrap(), None);
        assert_eq!(
            parse_optional_target("webp").unwrap(),
            Some(TargetFormat::WebP)
        );
        assert!(parse_optional_target("gif").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", TargetFormat::WebP), "WebP");
        assert_eq!(format!("{}", ImageKind::Jpeg), "JPEG");
        assert_eq!(TargetFormat::Png.extension(), "png");
    }
}

use crate::constants::{
    LIBDEFLATER_HIGH_LEVEL, LIBDEFLATER_LOW_LEVEL, MAX_IMAGE_DIMENSION, MAX_QUALITY, MIN_QUALITY,
    OXIPNG_PRESET, ZOPFLI_ITERATIONS,
};
use crate::error::{PressError, Result};
use crate::formats::ImageKind;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageReader};
use oxipng::{Deflaters, Options};
use std::io::Cursor;
use std::num::NonZeroU8;

/// Outcome of re-encoding one image in memory.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub data: Vec<u8>,
    pub format: ImageKind,
    pub original_size: u64,
    pub compressed_size: u64,
}

impl CompressionResult {
    /// True when the re-encoded bytes are no smaller than the source, in
    /// which case the source bytes must be persisted instead.
    pub fn keeps_original(&self) -> bool {
        self.compressed_size >= self.original_size
    }
}

pub fn validate_quality(quality: u8) -> Result<u8> {
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        return Err(PressError::InvalidQuality(quality));
    }
    Ok(quality)
}

/// Two-branch step function: files strictly larger than `threshold` bytes
/// are encoded `aggressive_drop` points lower, never below 1.
pub fn effective_quality(original_size: u64, threshold: u64, quality: u8, aggressive_drop: u8) -> u8 {
    if original_size > threshold {
        quality.saturating_sub(aggressive_drop).max(MIN_QUALITY)
    } else {
        quality
    }
}

/// Decodes image bytes, sniffing the format from content rather than trusting
/// a file extension.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    let (width, height) = img.dimensions();
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(PressError::InvalidDimensions(
            width,
            height,
            MAX_IMAGE_DIMENSION,
        ));
    }

    Ok(img)
}

/// Encodes `img` as `format`.
///
/// # Arguments
/// * `img` - Decoded image
/// * `format` - Output format
/// * `quality` - 1-100; honoured by the lossy encoders, selects the deflate
///   strength for PNG, ignored by the other formats
///
/// # Returns
/// * Encoded bytes, or `Err(PressError::Encode)` naming the format
pub fn encode_image(img: &DynamicImage, format: ImageKind, quality: u8) -> Result<Vec<u8>> {
    let encode_err = |reason: String| PressError::Encode {
        format: format.to_string(),
        reason,
    };

    match format {
        ImageKind::Jpeg => {
            // JPEG carries no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let mut buffer = Vec::new();
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
            rgb.write_with_encoder(encoder)
                .map_err(|e| encode_err(e.to_string()))?;
            Ok(buffer)
        }
        ImageKind::WebP => {
            let rgba = img.to_rgba8();
            let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
            let memory = encoder
                .encode_simple(false, f32::from(quality))
                .map_err(|e| encode_err(format!("{:?}", e)))?;
            Ok(memory.to_vec())
        }
        ImageKind::Png => {
            let mut raw = Vec::new();
            img.write_to(&mut Cursor::new(&mut raw), image::ImageFormat::Png)
                .map_err(|e| encode_err(e.to_string()))?;
            oxipng::optimize_from_memory(&raw, &png_options(quality))
                .map_err(|e| encode_err(e.to_string()))
        }
        ImageKind::Bmp | ImageKind::Gif => {
            // neither encoder accepts 16-bit or float buffers
            let eight_bit = if img.color().has_alpha() || format == ImageKind::Gif {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            let mut buffer = Vec::new();
            eight_bit.write_to(&mut Cursor::new(&mut buffer), format.to_image_format())
                .map_err(|e| encode_err(e.to_string()))?;
            Ok(buffer)
        }
        ImageKind::Tiff => {
            let mut buffer = Vec::new();
            img.write_to(&mut Cursor::new(&mut buffer), format.to_image_format())
                .map_err(|e| encode_err(e.to_string()))?;
            Ok(buffer)
        }
    }
}

fn png_options(quality: u8) -> Options {
    let mut options = Options::from_preset(OXIPNG_PRESET);

    options.deflate = if quality >= 90 {
        match NonZeroU8::new(ZOPFLI_ITERATIONS) {
            Some(iterations) => Deflaters::Zopfli { iterations },
            None => Deflaters::Libdeflater {
                compression: LIBDEFLATER_HIGH_LEVEL,
            },
        }
    } else if quality >= 70 {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_HIGH_LEVEL,
        }
    } else {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_LOW_LEVEL,
        }
    };

    options
}

/// Re-encodes an already decoded image and records both sizes.
pub fn compress_image(
    img: &DynamicImage,
    original_size: u64,
    format: ImageKind,
    quality: u8,
) -> Result<CompressionResult> {
    let data = encode_image(img, format, quality)?;
    let compressed_size = data.len() as u64;

    Ok(CompressionResult {
        data,
        format,
        original_size,
        compressed_size,
    })
}

/// The shared "compress one image to target format" operation: decode,
/// re-encode, measure.
pub fn compress_image_bytes(
    bytes: &[u8],
    format: ImageKind,
    quality: u8,
) -> Result<CompressionResult> {
    let img = decode_image(bytes)?;
    compress_image(&img, bytes.len() as u64, format, quality)
}

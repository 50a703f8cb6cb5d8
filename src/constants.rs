pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

// Link workflow defaults
pub const DEFAULT_DOCUMENT: &str = "images.docx";
pub const DEFAULT_LINKS_OUTPUT: &str = "images4";
pub const DEFAULT_LINKS_QUALITY: u8 = 95;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

// Disk workflow defaults
pub const DEFAULT_MIRROR_SOURCE: &str = "sourceImages";
pub const DEFAULT_MIRROR_OUTPUT: &str = "compressedImages";
pub const DEFAULT_MIRROR_QUALITY: u8 = 85;
/// 1.2 MiB, floored. For integer sizes `size > 1.2 MiB` and
/// `size > DEFAULT_THRESHOLD` agree.
pub const DEFAULT_THRESHOLD: u64 = 1_258_291;
pub const DEFAULT_AGGRESSIVE_DROP: u8 = 20;

pub const IMAGE_FILE_PREFIX: &str = "image_";

pub const MAX_IMAGE_DIMENSION: u32 = 20_000;

pub const OXIPNG_PRESET: u8 = 4;
pub const ZOPFLI_ITERATIONS: u8 = 15;
pub const LIBDEFLATER_HIGH_LEVEL: u8 = 12;
pub const LIBDEFLATER_LOW_LEVEL: u8 = 8;

pub const USER_AGENT: &str = concat!("img-press/", env!("CARGO_PKG_VERSION"));
pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;
/// Upper bound on the buffer reserved up front from a Content-Length header.
pub const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
pub const DOWNLOAD_BAR_TEMPLATE: &str =
    "  {msg} [{bar:30.green/white}] {bytes}/{total_bytes} ({bytes_per_sec})";
pub const DOWNLOAD_SPINNER_TEMPLATE: &str = "  {spinner:.green} {msg} {bytes} ({bytes_per_sec})";

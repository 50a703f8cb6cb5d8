use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "img-press",
    about = "Batch-convert images from URL lists or directory trees into WebP/PNG",
    long_about = "img-press converts images in bulk. The `links` workflow reads a document of \
                  category headings and quoted URL lists, downloads every image and re-encodes it \
                  into a per-category folder. The `mirror` workflow walks a directory tree and \
                  writes a compressed copy with the same layout, never letting a file grow.",
    version,
    after_help = "EXAMPLES:\n  \
    img-press links images.docx ./images4 -f webp -q 95\n  \
    img-press mirror ./sourceImages ./compressedImages -f webp -q 85\n  \
    img-press mirror ./photos ./out --threshold 2000000 --drop 30\n  \
    img-press -c press.toml mirror"
)]
pub struct Args {
    #[arg(
        short = 'c',
        long,
        global = true,
        help = "TOML configuration file",
        long_help = "Read defaults from a TOML file with [links] and [mirror] tables. \
                     Command-line flags take precedence over values from the file."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'j',
        long,
        global = true,
        help = "Number of parallel threads (default: auto)",
        long_help = "Number of worker threads. If not specified, uses number of CPU cores."
    )]
    pub threads: Option<usize>,

    #[arg(long, global = true, conflicts_with = "verbose", help = "Only print warnings and errors")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Print debug-level logs")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Download images listed in a document and convert them",
        long_about = "Read a .docx or plain-text document made of heading lines each followed by a \
                      bracketed list of quoted URLs. Every image is downloaded, re-encoded and \
                      saved as <OUTPUT>/<heading>/image_<n>.<ext>."
    )]
    Links(LinksArgs),

    #[command(
        about = "Compress a directory tree into a mirrored output tree",
        long_about = "Walk SOURCE recursively and write every file to the same relative path under \
                      OUTPUT. Images are re-encoded (with lower quality above the size threshold); \
                      when re-encoding does not shrink a file the original is kept. Other files are \
                      copied verbatim."
    )]
    Mirror(MirrorArgs),
}

#[derive(ClapArgs, Debug, Default, Clone)]
pub struct LinksArgs {
    #[arg(help = "Document with category headings and URL lists (default: images.docx)")]
    pub document: Option<PathBuf>,

    #[arg(help = "Output root directory (default: images4)")]
    pub output: Option<PathBuf>,

    #[arg(short = 'f', long, help = "Output format (webp, png; default: webp)")]
    pub format: Option<String>,

    #[arg(
        short = 'q',
        long,
        help = "Encoding quality (1-100, default: 95)",
        long_help = "Quality for WebP output. For PNG: >=90 uses Zopfli, >=70 uses high \
                     compression, <70 uses standard compression."
    )]
    pub quality: Option<u8>,

    #[arg(long, help = "Per-request HTTP timeout in seconds (default: 10)")]
    pub timeout: Option<u64>,
}

#[derive(ClapArgs, Debug, Default, Clone)]
pub struct MirrorArgs {
    #[arg(help = "Source directory (default: sourceImages)")]
    pub source: Option<PathBuf>,

    #[arg(help = "Destination directory (default: compressedImages)")]
    pub output: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        help = "Output format (none, webp, png; default: none)",
        long_help = "Convert all images to the given format. `none` keeps each file's own format."
    )]
    pub format: Option<String>,

    #[arg(short = 'q', long, help = "Base quality for JPEG/WebP (1-100, default: 85)")]
    pub quality: Option<u8>,

    #[arg(
        long,
        help = "Size in bytes above which quality is lowered (default: 1258291)"
    )]
    pub threshold: Option<u64>,

    #[arg(
        long = "drop",
        help = "Quality points removed for files above the threshold (default: 20)"
    )]
    pub aggressive_drop: Option<u8>,
}

//! Layered run configuration: command-line flag, then TOML file, then the
//! built-in defaults.

use crate::cli::{LinksArgs, MirrorArgs};
use crate::constants::{
    DEFAULT_AGGRESSIVE_DROP, DEFAULT_DOCUMENT, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_LINKS_OUTPUT,
    DEFAULT_LINKS_QUALITY, DEFAULT_MIRROR_OUTPUT, DEFAULT_MIRROR_QUALITY, DEFAULT_MIRROR_SOURCE,
    DEFAULT_THRESHOLD,
};
use crate::error::{PressError, Result};
use crate::formats::{parse_optional_target, TargetFormat};
use crate::processing::validate_quality;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub links: LinksSection,
    #[serde(default)]
    pub mirror: MirrorSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinksSection {
    pub document: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub quality: Option<u8>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MirrorSection {
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub quality: Option<u8>,
    pub threshold: Option<u64>,
    pub aggressive_drop: Option<u8>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PressError::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)
            .map_err(|e| PressError::Config(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Validated settings for one run of the link workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSettings {
    pub document: PathBuf,
    pub output: PathBuf,
    pub format: TargetFormat,
    pub quality: u8,
    pub timeout: Duration,
}

impl LinkSettings {
    pub fn resolve(args: &LinksArgs, file: &LinksSection) -> Result<Self> {
        let format = match args.format.as_deref().or(file.format.as_deref()) {
            Some(name) => TargetFormat::from_str(name)?,
            None => TargetFormat::WebP,
        };
        let quality = validate_quality(
            args.quality
                .or(file.quality)
                .unwrap_or(DEFAULT_LINKS_QUALITY),
        )?;
        let timeout_secs = args
            .timeout
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(PressError::Config("timeout must be at least 1 second".to_string()));
        }

        Ok(Self {
            document: pick_path(&args.document, &file.document, DEFAULT_DOCUMENT),
            output: pick_path(&args.output, &file.output, DEFAULT_LINKS_OUTPUT),
            format,
            quality,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Validated settings for one run of the disk workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorSettings {
    pub source: PathBuf,
    pub output: PathBuf,
    /// `None` keeps each file's own format.
    pub format: Option<TargetFormat>,
    pub quality: u8,
    pub threshold: u64,
    pub aggressive_drop: u8,
}

impl MirrorSettings {
    pub fn resolve(args: &MirrorArgs, file: &MirrorSection) -> Result<Self> {
        let format = match args.format.as_deref().or(file.format.as_deref()) {
            Some(name) => parse_optional_target(name)?,
            None => None,
        };
        let quality = validate_quality(
            args.quality
                .or(file.quality)
                .unwrap_or(DEFAULT_MIRROR_QUALITY),
        )?;

        Ok(Self {
            source: pick_path(&args.source, &file.source, DEFAULT_MIRROR_SOURCE),
            output: pick_path(&args.output, &file.output, DEFAULT_MIRROR_OUTPUT),
            format,
            quality,
            threshold: args.threshold.or(file.threshold).unwrap_or(DEFAULT_THRESHOLD),
            aggressive_drop: args
                .aggressive_drop
                .or(file.aggressive_drop)
                .unwrap_or(DEFAULT_AGGRESSIVE_DROP),
        })
    }
}

fn pick_path(flag: &Option<PathBuf>, file: &Option<PathBuf>, default: &str) -> PathBuf {
    flag.clone()
        .or_else(|| file.clone())
        .unwrap_or_else(|| PathBuf::from(default))
}

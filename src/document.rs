//! Reading the link document and extracting categories of image URLs.
//!
//! The expected layout is a heading line followed by a bracketed list of
//! quoted URLs:
//!
//! ```text
//! Landscapes
//! [ "https://example.com/a.jpg", "https://example.com/b.png" ]
//! ```
//!
//! The list may span several lines and may use typographic quotes, as word
//! processors tend to substitute them.

use crate::error::{PressError, Result};
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

const DOCX_BODY_PART: &str = "word/document.xml";

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[“"](https?://[^"”]+)[”"]"#).expect("valid URL pattern"));

/// A named, ordered list of image URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub urls: Vec<String>,
}

/// Result of parsing a document: the usable categories plus one `Parse`
/// error per block that had to be skipped.
#[derive(Debug, Default)]
pub struct ParsedDocument {
    pub categories: Vec<Category>,
    pub skipped: Vec<PressError>,
}

impl ParsedDocument {
    pub fn url_count(&self) -> usize {
        self.categories.iter().map(|c| c.urls.len()).sum()
    }

    fn push_urls(&mut self, name: String, urls: Vec<String>) {
        match self.categories.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.urls.extend(urls),
            None => self.categories.push(Category { name, urls }),
        }
    }

    fn skip(&mut self, heading: &str, reason: &str) {
        self.skipped.push(PressError::Parse {
            heading: heading.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Loads the document as plain text. `.docx` files are unpacked and their
/// paragraphs joined with newlines; anything else is read as UTF-8.
pub fn read_document_text(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(PressError::DocumentNotFound(path.to_path_buf()));
    }

    let is_docx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("docx"))
        .unwrap_or(false);

    if is_docx {
        read_docx_text(path)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_docx_text(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut xml = String::new();
    archive.by_name(DOCX_BODY_PART)?.read_to_string(&mut xml)?;
    docx_xml_to_text(&xml)
}

/// Flattens WordprocessingML into one line per paragraph.
///
/// Only `<w:t>` runs contribute text; `<w:tab/>` becomes a tab and
/// `<w:br/>` a line break. A paragraph nested inside another one (text
/// boxes) is emitted as its own line ahead of the enclosing paragraph.
pub fn docx_xml_to_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut lines: Vec<String> = Vec::new();
    let mut open_paragraphs: Vec<String> = Vec::new();
    let mut text_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => open_paragraphs.push(String::new()),
                b"t" => text_depth += 1,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(line) = open_paragraphs.pop() {
                        lines.push(line);
                    }
                }
                b"t" => text_depth = text_depth.saturating_sub(1),
                _ => {}
            },
            Event::Empty(e) => {
                let name = e.local_name();
                match (name.as_ref(), open_paragraphs.last_mut()) {
                    (b"p", _) => lines.push(String::new()),
                    (b"tab", Some(line)) => line.push('\t'),
                    (b"br" | b"cr", Some(line)) => line.push('\n'),
                    _ => {}
                }
            }
            Event::Text(t) if text_depth > 0 => {
                if let Some(line) = open_paragraphs.last_mut() {
                    line.push_str(&t.unescape()?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}

/// Extracts every quoted http(s) URL from an array block.
pub fn extract_urls(array_text: &str) -> Vec<String> {
    URL_PATTERN
        .captures_iter(array_text)
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

/// Splits document text into heading/array blocks.
///
/// Malformed blocks never abort parsing; each is recorded in
/// [`ParsedDocument::skipped`] and contributes no URLs. A heading seen twice
/// accumulates URLs from both blocks.
pub fn parse_categories(text: &str) -> ParsedDocument {
    let mut parsed = ParsedDocument::default();
    let mut pending_heading: Option<String> = None;
    let mut lines = text.lines();

    while let Some(raw) = lines.next() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if !line.starts_with('[') {
            if let Some(previous) = pending_heading.replace(line.to_string()) {
                parsed.skip(&previous, "heading has no URL array");
            }
            continue;
        }

        let mut block = line.to_string();
        while !block.contains(']') {
            match lines.next() {
                Some(next) => {
                    block.push('\n');
                    block.push_str(next);
                }
                None => break,
            }
        }

        let Some(heading) = pending_heading.take() else {
            parsed.skip("", "URL array without a heading");
            continue;
        };

        let Some(end) = block.find(']') else {
            parsed.skip(&heading, "unterminated URL array");
            continue;
        };

        let urls = extract_urls(&block[..=end]);
        if urls.is_empty() {
            parsed.skip(&heading, "no URLs found");
            continue;
        }

        parsed.push_urls(heading, urls);
    }

    if let Some(heading) = pending_heading {
        parsed.skip(&heading, "heading has no URL array");
    }

    parsed
}

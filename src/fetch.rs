use crate::constants::{
    DOWNLOAD_BAR_TEMPLATE, DOWNLOAD_CHUNK_SIZE, DOWNLOAD_SPINNER_TEMPLATE, MAX_PREALLOCATION,
    USER_AGENT,
};
use crate::error::{PressError, Result};
use crate::logger::is_quiet;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use std::io::Read;
use std::time::Duration;
use tracing::debug;

/// Source of raw image bytes for the link workflow.
pub trait ImageFetcher: Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher with a per-request timeout.
pub struct HttpFetcher {
    client: Client,
    progress: Option<MultiProgress>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PressError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            progress: None,
        })
    }

    /// Attaches per-download byte bars to an existing progress display.
    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    fn download_bar(&self, total: Option<u64>) -> ProgressBar {
        let Some(progress) = self.progress.as_ref().filter(|_| !is_quiet()) else {
            return ProgressBar::hidden();
        };

        let (bar, template) = match total {
            Some(len) => (ProgressBar::new(len), DOWNLOAD_BAR_TEMPLATE),
            None => (ProgressBar::new_spinner(), DOWNLOAD_SPINNER_TEMPLATE),
        };
        if let Ok(style) = ProgressStyle::with_template(template) {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.set_message("Downloading");
        progress.add(bar)
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let fetch_err = |source: Box<dyn std::error::Error + Send + Sync>| PressError::Fetch {
            url: url.to_string(),
            source,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_err(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PressError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total = response.content_length();
        let bar = self.download_bar(total);
        let capacity = total.unwrap_or(0).min(MAX_PREALLOCATION) as usize;
        let mut buffer = Vec::with_capacity(capacity);
        let mut chunk = vec![0u8; DOWNLOAD_CHUNK_SIZE];

        loop {
            let read = match response.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    bar.finish_and_clear();
                    return Err(fetch_err(Box::new(e)));
                }
            };
            buffer.extend_from_slice(&chunk[..read]);
            bar.inc(read as u64);
        }
        bar.finish_and_clear();

        debug!(url, bytes = buffer.len(), "Downloaded");
        Ok(buffer)
    }
}

//! HTTP transport for package archives and checksum documents.
//!
//! Downloads stream into a sibling `.part` file which is renamed onto the
//! destination only after the last byte is flushed, so an interrupted run
//! never leaves a truncated archive under the cache name. There is no retry:
//! a failed download is reported once and the caller decides what to do.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::catalog::USER_AGENT;
use crate::errors::GovmError;

/// Progress event emitted during downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Download has started.
    Started {
        /// The URL being downloaded.
        url: String,
        /// Total size in bytes from `Content-Length`, 0 when unknown.
        total: u64,
    },
    /// Download progress update.
    Progress {
        /// Bytes downloaded so far.
        downloaded: u64,
        /// Total size in bytes, 0 when unknown.
        total: u64,
        /// Current download speed in bytes per second.
        speed: u64,
    },
    /// Download completed and the file is in place.
    Completed,
    /// Download failed.
    Failed {
        /// Error description.
        #[allow(dead_code)]
        error: String,
    },
}

/// Callback type for receiving progress updates during downloads.
///
/// Wrapped in `Arc` so it can be shared across async boundaries.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Network access used by the acquisition pipeline.
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// Streams `url` into `dest`, reporting progress through `progress`.
    ///
    /// On success `dest` holds the complete body. On failure `dest` is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GovmError::DownloadFailed`] for any transport, HTTP status or
    /// write failure.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<(), GovmError>;

    /// Fetches a small text document, e.g. a checksum file.
    ///
    /// # Errors
    ///
    /// Returns [`GovmError::DownloadFailed`] on transport or HTTP failure.
    async fn fetch_text(&self, url: &str) -> Result<String, GovmError>;
}

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Minimum interval between progress callback invocations in milliseconds.
const PROGRESS_CALLBACK_INTERVAL_MS: u128 = 100;

/// Minimum interval between CLI progress redraws in milliseconds.
const CLI_PROGRESS_INTERVAL_MS: u128 = 250;

/// [`Fetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the default timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`GovmError::DownloadFailed`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, GovmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                GovmError::download_failed_with_source("", "failed to create HTTP client", e)
            })?;
        Ok(Self { client })
    }

    async fn stream_to(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<&ProgressCallback>,
    ) -> Result<u64, GovmError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GovmError::download_failed_with_source(url, "failed to connect", e))?;

        if !response.status().is_success() {
            return Err(GovmError::download_failed(
                url,
                format!("HTTP error {}", response.status()),
            ));
        }

        let total = response.content_length().unwrap_or(0);
        if let Some(cb) = progress {
            cb(ProgressEvent::Started {
                url: url.to_string(),
                total,
            });
        }

        let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
            GovmError::download_failed_with_source(
                url,
                format!("failed to create {}", dest.display()),
                e,
            )
        })?;

        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;
        let start_time = Instant::now();
        let mut last_callback_time = Instant::now();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| GovmError::download_failed_with_source(url, "failed to read body", e))?;
            file.write_all(&chunk).await.map_err(|e| {
                GovmError::download_failed_with_source(
                    url,
                    format!("failed to write {}", dest.display()),
                    e,
                )
            })?;
            downloaded += chunk.len() as u64;

            if let Some(cb) = progress {
                let now = Instant::now();
                if now.duration_since(last_callback_time).as_millis()
                    >= PROGRESS_CALLBACK_INTERVAL_MS
                {
                    cb(ProgressEvent::Progress {
                        downloaded,
                        total,
                        speed: bytes_per_second(downloaded, start_time.elapsed()),
                    });
                    last_callback_time = now;
                }
            }
        }

        file.flush().await.map_err(|e| {
            GovmError::download_failed_with_source(
                url,
                format!("failed to flush {}", dest.display()),
                e,
            )
        })?;

        if let Some(cb) = progress {
            cb(ProgressEvent::Progress {
                downloaded,
                total,
                speed: bytes_per_second(downloaded, start_time.elapsed()),
            });
        }

        Ok(downloaded)
    }
}

impl Fetcher for HttpFetcher {
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<(), GovmError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                GovmError::download_failed_with_source(
                    url,
                    format!("failed to create directory {}", parent.display()),
                    e,
                )
            })?;
        }

        let part = part_path(dest);
        debug!(url, part = %part.display(), "downloading");

        match self.stream_to(url, &part, progress.as_ref()).await {
            Ok(bytes) => {
                tokio::fs::rename(&part, dest).await.map_err(|e| {
                    GovmError::download_failed_with_source(
                        url,
                        format!("failed to rename {} to {}", part.display(), dest.display()),
                        e,
                    )
                })?;
                info!(url, bytes, dest = %dest.display(), "download complete");
                if let Some(cb) = &progress {
                    cb(ProgressEvent::Completed);
                }
                Ok(())
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                if let Some(cb) = &progress {
                    cb(ProgressEvent::Failed {
                        error: e.to_string(),
                    });
                }
                Err(e)
            }
        }
    }

    async fn fetch_text(&self, url: &str) -> Result<String, GovmError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GovmError::download_failed_with_source(url, "failed to connect", e))?;

        if !response.status().is_success() {
            return Err(GovmError::download_failed(
                url,
                format!("HTTP error {}", response.status()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| GovmError::download_failed_with_source(url, "failed to read body", e))
    }
}

/// Returns the in-progress sibling of `dest` (`<name>.part`).
#[must_use]
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn bytes_per_second(downloaded: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (downloaded as f64 / secs) as u64
    } else {
        0
    }
}

/// Progress callback that draws a single updating line on stdout.
#[must_use]
pub fn cli_progress() -> ProgressCallback {
    let last_draw = std::sync::Mutex::new(None::<Instant>);
    Arc::new(move |event| match event {
        ProgressEvent::Started { url, total } => {
            if total > 0 {
                println!("Downloading {url} ({})", format_bytes(total));
            } else {
                println!("Downloading {url}");
            }
        }
        ProgressEvent::Progress {
            downloaded,
            total,
            speed,
        } => {
            let Ok(mut last) = last_draw.lock() else {
                return;
            };
            let now = Instant::now();
            let due = last.is_none_or(|t| {
                now.duration_since(t).as_millis() >= CLI_PROGRESS_INTERVAL_MS
            });
            if due || (total > 0 && downloaded >= total) {
                print!("\r{}", progress_line(downloaded, total, speed));
                let _ = std::io::stdout().flush();
                *last = Some(now);
            }
        }
        ProgressEvent::Completed | ProgressEvent::Failed { .. } => println!(),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn progress_line(downloaded: u64, total: u64, speed: u64) -> String {
    let percent = if total > 0 {
        (downloaded as f64 / total as f64 * 100.0).min(100.0) as u8
    } else {
        0
    };
    format!(
        "{}/{} ({percent}%) {}     ",
        format_bytes(downloaded),
        format_bytes(total),
        format_speed(speed)
    )
}

/// Formats bytes into a human-readable string (KB, MB, GB).
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Formats speed (bytes/sec) into a human-readable string.
#[allow(clippy::cast_precision_loss)]
fn format_speed(speed: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let speed = speed as f64;
    if speed >= MB {
        format!("{:.2} MB/s", speed / MB)
    } else if speed >= KB {
        format!("{:.2} KB/s", speed / KB)
    } else {
        format!("{speed:.0} B/s")
    }
}

//! Package acquisition: integrity policy, cache reuse, download, verification.
//!
//! The integrity policy is settled before any bytes move, so a declined
//! unverified package never reaches the network. Cached archives are verified
//! exactly like fresh ones; a mismatch removes the cache file.

use std::path::Path;

use tracing::{debug, info, warn};

use super::catalog::PackageDescriptor;
use super::download::{Fetcher, ProgressCallback};
use super::verify::{ChecksumAlgorithm, parse_checksum_document, verify_checksum};
use crate::errors::GovmError;

/// Asks whether an unverifiable package may be installed anyway.
pub trait UnverifiedConsent {
    /// Returns `Ok(true)` to proceed, `Ok(false)` to decline.
    ///
    /// # Errors
    ///
    /// Returns an error when consent cannot be asked at all, e.g. because
    /// there is no terminal.
    fn confirm_unverified(&self, package: &PackageDescriptor) -> anyhow::Result<bool>;
}

/// Consent capability for non-interactive runs: it can never ask.
#[derive(Debug, Default, Clone, Copy)]
pub struct RefuseUnverified;

impl UnverifiedConsent for RefuseUnverified {
    fn confirm_unverified(&self, package: &PackageDescriptor) -> anyhow::Result<bool> {
        anyhow::bail!(
            "cannot confirm unverified package {} without a terminal",
            package.file_name
        )
    }
}

/// How the acquired archive will be checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityPolicy {
    /// Verify against the declared checksum or checksum source.
    Verify,
    /// Install without verification.
    Skip,
    /// The user declined an unverifiable package; stop before downloading.
    Declined,
}

/// Where the archive came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// The cache file already existed; nothing was fetched.
    Hit,
    /// The archive was downloaded into the cache.
    Downloaded,
}

/// Acquires one package into its cache path.
pub struct AcquisitionPipeline<'a, F: Fetcher> {
    fetcher: &'a F,
    consent: &'a dyn UnverifiedConsent,
    progress: Option<ProgressCallback>,
}

impl<'a, F: Fetcher> AcquisitionPipeline<'a, F> {
    /// Creates a pipeline over `fetcher`, asking `consent` about unverifiable packages.
    pub fn new(fetcher: &'a F, consent: &'a dyn UnverifiedConsent) -> Self {
        Self {
            fetcher,
            consent,
            progress: None,
        }
    }

    /// Reports download progress through `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Decides the integrity policy for `package`.
    ///
    /// `skip_checksum` bypasses verification without consulting anyone.
    ///
    /// # Errors
    ///
    /// Returns [`GovmError::ChecksumUnverifiable`] when the package is
    /// unverifiable and consent cannot be asked.
    pub fn policy(
        &self,
        package: &PackageDescriptor,
        skip_checksum: bool,
    ) -> Result<IntegrityPolicy, GovmError> {
        if skip_checksum {
            debug!(file = %package.file_name, "checksum verification skipped by request");
            return Ok(IntegrityPolicy::Skip);
        }
        if !package.is_unverifiable() {
            return Ok(IntegrityPolicy::Verify);
        }

        match self.consent.confirm_unverified(package) {
            Ok(true) => {
                warn!(file = %package.file_name, "installing without checksum verification");
                Ok(IntegrityPolicy::Skip)
            }
            Ok(false) => Ok(IntegrityPolicy::Declined),
            Err(e) => {
                debug!(error = %e, "consent unavailable");
                Err(GovmError::checksum_unverifiable(&package.file_name))
            }
        }
    }

    /// Ensures the archive is present at `cache_path`.
    ///
    /// # Errors
    ///
    /// Returns [`GovmError::DownloadFailed`] if the download fails.
    pub async fn fetch(
        &self,
        package: &PackageDescriptor,
        cache_path: &Path,
    ) -> Result<CacheStatus, GovmError> {
        if cache_path.is_file() {
            info!(path = %cache_path.display(), "using cached archive");
            return Ok(CacheStatus::Hit);
        }

        self.fetcher
            .download(&package.url, cache_path, self.progress.clone())
            .await?;
        Ok(CacheStatus::Downloaded)
    }

    /// Verifies the archive at `cache_path`, deleting it on mismatch.
    ///
    /// # Errors
    ///
    /// - [`GovmError::UnsupportedAlgorithm`] for an unknown algorithm
    /// - [`GovmError::DownloadFailed`] if the checksum source cannot be read
    /// - [`GovmError::ChecksumUnverifiable`] if there is nothing to verify against
    /// - [`GovmError::ChecksumMismatch`] if the digest differs
    pub async fn verify(
        &self,
        package: &PackageDescriptor,
        cache_path: &Path,
    ) -> Result<(), GovmError> {
        let algorithm: ChecksumAlgorithm = package.algorithm.parse()?;
        let expected = self.expected_checksum(package).await?;

        let path = cache_path.to_path_buf();
        let hashed =
            tokio::task::spawn_blocking(move || verify_checksum(&path, &expected, algorithm))
                .await
                .map_err(|e| {
                    GovmError::io_error("checksum task failed", std::io::Error::other(e))
                })?;

        match hashed {
            Err(e @ GovmError::ChecksumMismatch { .. }) => {
                if let Err(remove) = std::fs::remove_file(cache_path) {
                    warn!(
                        path = %cache_path.display(),
                        error = %remove,
                        "failed to remove corrupt archive"
                    );
                }
                Err(e)
            }
            other => {
                if other.is_ok() {
                    debug!(file = %package.file_name, %algorithm, "checksum verified");
                }
                other
            }
        }
    }

    async fn expected_checksum(&self, package: &PackageDescriptor) -> Result<String, GovmError> {
        if let Some(checksum) = &package.checksum {
            return Ok(checksum.clone());
        }
        let Some(url) = &package.checksum_url else {
            return Err(GovmError::checksum_unverifiable(&package.file_name));
        };

        let text = self.fetcher.fetch_text(url).await?;
        parse_checksum_document(&text)
            .map(str::to_string)
            .ok_or_else(|| GovmError::download_failed(url, "checksum document is empty"))
    }
}

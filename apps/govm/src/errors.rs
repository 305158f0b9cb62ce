//! Error types for the govm CLI.
//!
//! `GovmError` enumerates every failure the install/activate pipeline can
//! report. Pipeline components return it directly so callers can match on the
//! kind; command handlers wrap it in `anyhow::Error`, and `main` downcasts it
//! back when deciding how to report a failure.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed source error carried by variants that wrap a collaborator failure.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Consolidated error type for govm operations.
#[derive(Debug, Error)]
pub enum GovmError {
    /// The running OS/architecture has no Go distribution naming.
    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform {
        /// Rust target OS name.
        os: String,
        /// Rust target architecture name.
        arch: String,
    },

    /// No catalog release matches the requested identifier.
    #[error("version not found: {requested}")]
    VersionNotFound {
        /// The identifier as the user typed it.
        requested: String,
    },

    /// No mirror could provide a usable release catalog.
    #[error("catalog error: {message}")]
    CatalogError {
        /// Description of the catalog failure.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxedSource>,
    },

    /// The resolved release has no archive for this OS/architecture.
    #[error("no compatible package for go{version} on {platform}")]
    NoCompatiblePackage {
        /// Resolved version identifier.
        version: String,
        /// Platform string, e.g. `linux-amd64`.
        platform: String,
    },

    /// The selection strategy failed or returned an invalid index.
    #[error("package selection failed: {message}")]
    SelectionFailed {
        /// Description of the failure.
        message: String,
    },

    /// The version directory already exists.
    #[error("{version:?} version has been installed")]
    AlreadyInstalled {
        /// The installed version identifier.
        version: String,
    },

    /// The package carries no checksum and consent to proceed could not be obtained.
    #[error("checksum file not found for {file}; rerun with --skip-checksum to install unverified")]
    ChecksumUnverifiable {
        /// Package file name.
        file: String,
    },

    /// The archive digest does not match the declared checksum.
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        /// The cache file that failed verification (already deleted).
        path: PathBuf,
        /// The declared checksum.
        expected: String,
        /// The computed checksum.
        actual: String,
    },

    /// The declared checksum algorithm is not supported.
    #[error("unsupported checksum algorithm: {name}")]
    UnsupportedAlgorithm {
        /// Algorithm name as declared by the catalog.
        name: String,
    },

    /// Fetching a package or checksum document failed.
    #[error("download failed for {url}: {message}")]
    DownloadFailed {
        /// The URL being fetched.
        url: String,
        /// Description of the failure.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxedSource>,
    },

    /// Unpacking or promoting the archive failed.
    #[error("extraction failed for {}: {message}", archive.display())]
    ExtractionFailed {
        /// The archive being installed.
        archive: PathBuf,
        /// Description of the failure.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxedSource>,
    },

    /// The active link could not be switched. The install itself is intact.
    #[error("activation failed for {}: {message}", target.display())]
    ActivationFailed {
        /// The version directory that should have become active.
        target: PathBuf,
        /// Description of the failure.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxedSource>,
    },

    /// A command referenced a version that is not installed.
    #[error("version {version} is not installed")]
    NotInstalled {
        /// The requested version identifier.
        version: String,
    },

    /// Error reading or writing files.
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl GovmError {
    /// Creates a new `UnsupportedPlatform` error.
    #[must_use]
    pub fn unsupported_platform(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Creates a new `VersionNotFound` error.
    #[must_use]
    pub fn version_not_found(requested: impl Into<String>) -> Self {
        Self::VersionNotFound {
            requested: requested.into(),
        }
    }

    /// Creates a new `CatalogError`.
    #[must_use]
    pub fn catalog_error(message: impl Into<String>) -> Self {
        Self::CatalogError {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `NoCompatiblePackage` error.
    #[must_use]
    pub fn no_compatible_package(version: impl Into<String>, platform: impl Into<String>) -> Self {
        Self::NoCompatiblePackage {
            version: version.into(),
            platform: platform.into(),
        }
    }

    /// Creates a new `SelectionFailed` error.
    #[must_use]
    pub fn selection_failed(message: impl Into<String>) -> Self {
        Self::SelectionFailed {
            message: message.into(),
        }
    }

    /// Creates a new `AlreadyInstalled` error.
    #[must_use]
    pub fn already_installed(version: impl Into<String>) -> Self {
        Self::AlreadyInstalled {
            version: version.into(),
        }
    }

    /// Creates a new `ChecksumUnverifiable` error.
    #[must_use]
    pub fn checksum_unverifiable(file: impl Into<String>) -> Self {
        Self::ChecksumUnverifiable { file: file.into() }
    }

    /// Creates a new `ChecksumMismatch` error.
    #[must_use]
    pub fn checksum_mismatch(
        path: PathBuf,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::ChecksumMismatch {
            path,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new `UnsupportedAlgorithm` error.
    #[must_use]
    pub fn unsupported_algorithm(name: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm { name: name.into() }
    }

    /// Creates a new `DownloadFailed` error.
    #[must_use]
    pub fn download_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `DownloadFailed` error with a source error.
    #[must_use]
    pub fn download_failed_with_source(
        url: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<BoxedSource>,
    ) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a new `ExtractionFailed` error.
    #[must_use]
    pub fn extraction_failed(archive: PathBuf, message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            archive,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `ExtractionFailed` error with a source error.
    #[must_use]
    pub fn extraction_failed_with_source(
        archive: PathBuf,
        message: impl Into<String>,
        source: impl Into<BoxedSource>,
    ) -> Self {
        Self::ExtractionFailed {
            archive,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a new `ActivationFailed` error.
    #[must_use]
    pub fn activation_failed(target: PathBuf, message: impl Into<String>) -> Self {
        Self::ActivationFailed {
            target,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `ActivationFailed` error with a source error.
    #[must_use]
    pub fn activation_failed_with_source(
        target: PathBuf,
        message: impl Into<String>,
        source: impl Into<BoxedSource>,
    ) -> Self {
        Self::ActivationFailed {
            target,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a new `NotInstalled` error.
    #[must_use]
    pub fn not_installed(version: impl Into<String>) -> Self {
        Self::NotInstalled {
            version: version.into(),
        }
    }

    /// Creates a new `IoError` from an I/O error with context.
    #[must_use]
    pub fn io_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            message: message.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_installed_quotes_version() {
        let err = GovmError::already_installed("1.21.3");
        assert_eq!(err.to_string(), "\"1.21.3\" version has been installed");
    }

    #[test]
    fn no_compatible_package_names_platform() {
        let err = GovmError::no_compatible_package("1.21.3", "plan9-amd64");
        assert_eq!(
            err.to_string(),
            "no compatible package for go1.21.3 on plan9-amd64"
        );
    }

    #[test]
    fn checksum_mismatch_displays_both_values() {
        let err = GovmError::checksum_mismatch(PathBuf::from("/tmp/go.tar.gz"), "abc123", "def456");
        assert_eq!(
            err.to_string(),
            "checksum mismatch for /tmp/go.tar.gz: expected abc123, got def456"
        );
    }

    #[test]
    fn download_failed_displays_url_and_message() {
        let err = GovmError::download_failed("https://example.com/go.tar.gz", "HTTP 404");
        assert_eq!(
            err.to_string(),
            "download failed for https://example.com/go.tar.gz: HTTP 404"
        );
    }

    #[test]
    fn download_failed_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::other("connection reset");
        let err = GovmError::download_failed_with_source("https://example.com", "stream", io);
        assert!(err.source().is_some());
    }

    #[test]
    fn checksum_unverifiable_suggests_skip_flag() {
        let err = GovmError::checksum_unverifiable("go1.4.linux-amd64.tar.gz");
        assert!(err.to_string().contains("--skip-checksum"));
    }

    #[test]
    fn not_installed_displays_version() {
        let err = GovmError::not_installed("1.20");
        assert_eq!(err.to_string(), "version 1.20 is not installed");
    }
}

//! Checksum verification for downloaded archives.
//!
//! Supports the digests Go mirrors publish: SHA-256 (the feed default) and
//! SHA-512. Expected values are compared case-insensitively.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use sha2::{Digest, Sha256, Sha512};

use crate::errors::GovmError;

/// Digest algorithm named by a package descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
}

impl FromStr for ChecksumAlgorithm {
    type Err = GovmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(GovmError::unsupported_algorithm(s)),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

/// Computes the digest of a file as a lowercase hex string.
///
/// # Errors
///
/// Returns [`GovmError::IoError`] if the file cannot be opened or read.
pub fn compute_digest(file_path: &Path, algorithm: ChecksumAlgorithm) -> Result<String, GovmError> {
    match algorithm {
        ChecksumAlgorithm::Sha256 => hash_file::<Sha256>(file_path),
        ChecksumAlgorithm::Sha512 => hash_file::<Sha512>(file_path),
    }
}

fn hash_file<D: Digest>(file_path: &Path) -> Result<String, GovmError> {
    let mut file = std::fs::File::open(file_path).map_err(|e| {
        GovmError::io_error(
            format!("failed to open file for checksum: {}", file_path.display()),
            e,
        )
    })?;

    let mut hasher = D::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| {
            GovmError::io_error(
                format!("failed to read file for checksum: {}", file_path.display()),
                e,
            )
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Checks a file against an expected hex digest.
///
/// The file is left in place either way; deciding what to do with a corrupt
/// file is up to the caller.
///
/// # Errors
///
/// Returns [`GovmError::ChecksumMismatch`] when the digests differ, or
/// [`GovmError::IoError`] when the file cannot be read.
pub fn verify_checksum(
    file_path: &Path,
    expected: &str,
    algorithm: ChecksumAlgorithm,
) -> Result<(), GovmError> {
    let computed = compute_digest(file_path, algorithm)?;
    let expected = expected.trim();

    if !computed.eq_ignore_ascii_case(expected) {
        return Err(GovmError::checksum_mismatch(
            file_path.to_path_buf(),
            expected,
            computed,
        ));
    }

    Ok(())
}

/// Extracts the checksum from a checksum document.
///
/// Both bare digests and `sha256sum` style lines (`<digest>  <file>`) are
/// accepted: the first whitespace-separated token wins.
#[must_use]
pub fn parse_checksum_document(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

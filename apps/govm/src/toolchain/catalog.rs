//! Release catalog for govm.
//!
//! Resolves a requested version identifier into a [`VersionDescriptor`] and
//! the archive packages published for the current platform.
//!
//! ## Feed Format
//!
//! Mirrors serve the Go download feed (`<mirror>?mode=json&include=all`):
//!
//! ```json
//! [
//!   {
//!     "version": "go1.21.3",
//!     "stable": true,
//!     "files": [
//!       {
//!         "filename": "go1.21.3.linux-amd64.tar.gz",
//!         "os": "linux",
//!         "arch": "amd64",
//!         "sha256": "1241381b...",
//!         "kind": "archive"
//!       }
//!     ]
//!   }
//! ]
//! ```
//!
//! Files may additionally carry `checksum_url` and `algorithm`; packages are
//! downloaded from `<mirror><filename>`.

use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Platform;
use super::paths::is_version_name;
use crate::errors::GovmError;

/// Request timeout for catalog fetches in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// User-Agent header for HTTP requests.
pub const USER_AGENT: &str = concat!("govm/", env!("CARGO_PKG_VERSION"));

/// Only packages of this kind can be unpacked into the version tree.
const ARCHIVE_KIND: &str = "archive";

/// Checksum algorithm assumed when a feed entry declares none.
const DEFAULT_ALGORITHM: &str = "SHA256";

/// A resolved toolchain version for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    /// Version identifier without the `go` prefix, e.g. `1.21.3`.
    pub version: String,
    /// Go OS name.
    pub os: String,
    /// Go architecture name.
    pub arch: String,
}

impl VersionDescriptor {
    /// Creates a descriptor for `version` on `platform`.
    #[must_use]
    pub fn new(version: impl Into<String>, platform: Platform) -> Self {
        Self {
            version: version.into(),
            os: platform.os().to_string(),
            arch: platform.arch().to_string(),
        }
    }
}

impl fmt::Display for VersionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "go{} {}/{}", self.version, self.os, self.arch)
    }
}

/// One downloadable archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Archive file name.
    pub file_name: String,
    /// Download URL.
    pub url: String,
    /// Declared checksum, hex encoded.
    pub checksum: Option<String>,
    /// URL of a document holding the checksum.
    pub checksum_url: Option<String>,
    /// Checksum algorithm name, e.g. `SHA256`.
    pub algorithm: String,
}

impl PackageDescriptor {
    /// A package with neither a checksum nor a checksum source cannot be verified.
    #[must_use]
    pub fn is_unverifiable(&self) -> bool {
        self.checksum.is_none() && self.checksum_url.is_none()
    }
}

/// Output of version resolution: the version and its candidate packages,
/// already filtered for the requested platform.
#[derive(Debug, Clone)]
pub struct ResolvedVersion {
    /// The resolved version.
    pub descriptor: VersionDescriptor,
    /// Candidate archives in feed order.
    pub packages: Vec<PackageDescriptor>,
}

/// Source of available versions and their packages.
#[allow(async_fn_in_trait)]
pub trait VersionCatalog {
    /// Resolves `requested` for `platform`.
    ///
    /// # Errors
    ///
    /// Returns [`GovmError::VersionNotFound`] when nothing matches, or
    /// [`GovmError::CatalogError`] when the catalog cannot be read.
    async fn resolve(
        &self,
        requested: &str,
        platform: Platform,
    ) -> Result<ResolvedVersion, GovmError>;
}

/// Release entry in the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Release {
    /// Version with `go` prefix, e.g. `go1.21.3`.
    pub version: String,
    /// Whether this is a stable release.
    #[serde(default)]
    pub stable: bool,
    /// Published files.
    #[serde(default)]
    pub files: Vec<ReleaseFile>,
}

impl Release {
    /// Version identifier without the `go` prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        strip_go_prefix(&self.version)
    }
}

/// File entry in the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseFile {
    /// Archive or installer file name.
    pub filename: String,
    /// Go OS name.
    #[serde(default)]
    pub os: String,
    /// Go architecture name.
    #[serde(default)]
    pub arch: String,
    /// Hex SHA-256 digest; empty when unknown.
    #[serde(default)]
    pub sha256: String,
    /// `archive`, `installer` or `source`.
    #[serde(default)]
    pub kind: String,
    /// Where to fetch the checksum when it is not inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_url: Option<String>,
    /// Algorithm of `sha256`/`checksum_url` when it is not SHA-256.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
}

/// A parsed version request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionQuery {
    /// Highest stable release.
    Latest,
    /// One specific release. `1.21` falls back to the `1.21` family if no
    /// release is named exactly `1.21`.
    Exact(String),
    /// Highest stable release of a family, written `1.21.x`.
    Family(String),
}

impl VersionQuery {
    /// Parses a user-supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GovmError::VersionNotFound`] for an empty identifier.
    pub fn parse(raw: &str) -> Result<Self, GovmError> {
        let trimmed = strip_go_prefix(raw.trim());
        if trimmed.is_empty() {
            return Err(GovmError::version_not_found(raw));
        }
        if trimmed.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        if let Some(family) = trimmed.strip_suffix(".x") {
            return Ok(Self::Family(family.to_string()));
        }
        Ok(Self::Exact(trimmed.to_string()))
    }
}

/// Finds the release matching `query`.
///
/// Releases whose name is not a usable version directory name are never
/// candidates.
#[must_use]
pub fn find_release<'a>(releases: &'a [Release], query: &VersionQuery) -> Option<&'a Release> {
    let usable = || releases.iter().filter(|r| is_version_name(r.name()));
    match query {
        VersionQuery::Latest => highest(usable().filter(|r| r.stable)),
        VersionQuery::Exact(name) => usable()
            .find(|r| r.name() == name.as_str())
            .or_else(|| {
                is_family_name(name)
                    .then(|| find_release(releases, &VersionQuery::Family(name.clone())))
                    .flatten()
            }),
        VersionQuery::Family(family) => {
            let prefix = format!("{family}.");
            highest(usable().filter(|r| {
                r.stable && (r.name() == family.as_str() || r.name().starts_with(&prefix))
            }))
        }
    }
}

/// Builds the candidate packages of `release` for `platform`.
///
/// Only archives are considered; installers and source tarballs cannot be
/// unpacked into the version tree.
#[must_use]
pub fn packages_for(
    release: &Release,
    base_url: &str,
    platform: Platform,
) -> Vec<PackageDescriptor> {
    release
        .files
        .iter()
        .filter(|f| f.kind == ARCHIVE_KIND && f.os == platform.os() && f.arch == platform.arch())
        .map(|f| PackageDescriptor {
            file_name: f.filename.clone(),
            url: format!("{base_url}{}", f.filename),
            checksum: Some(f.sha256.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            checksum_url: f.checksum_url.clone().filter(|u| !u.trim().is_empty()),
            algorithm: f
                .algorithm
                .clone()
                .unwrap_or_else(|| DEFAULT_ALGORITHM.to_string()),
        })
        .collect()
}

/// Orders two Go version names (`1.21.3`, `1.21rc2`, `1.9`).
///
/// Names that cannot be parsed sort below parseable ones and lexically among
/// themselves.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_go_version(a), parse_go_version(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Parses a Go version name into a semver value.
///
/// `1.21` becomes `1.21.0` and `1.21rc2` becomes `1.21.0-rc2`, so release
/// candidates order before the final release.
#[must_use]
pub fn parse_go_version(raw: &str) -> Option<semver::Version> {
    let name = strip_go_prefix(raw);
    let split = name
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(name.len());
    let (numeric, pre) = name.split_at(split);

    let mut parts = numeric.split('.').map(str::parse::<u64>);
    let major = parts.next()?.ok()?;
    let minor = parts.next().transpose().ok()?.unwrap_or(0);
    let patch = parts.next().transpose().ok()?.unwrap_or(0);
    if parts.next().is_some() {
        return None;
    }

    let mut version = semver::Version::new(major, minor, patch);
    if !pre.is_empty() {
        version.pre = semver::Prerelease::new(pre).ok()?;
    }
    Some(version)
}

/// Strips a leading `go` from a version identifier (`go1.21.3` -> `1.21.3`).
#[must_use]
pub fn strip_go_prefix(raw: &str) -> &str {
    raw.strip_prefix("go").unwrap_or(raw)
}

/// `1.21` style names: exactly two numeric components.
fn is_family_name(name: &str) -> bool {
    let mut parts = name.split('.');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(major), Some(minor), None)
            if !major.is_empty()
                && !minor.is_empty()
                && major.bytes().all(|b| b.is_ascii_digit())
                && minor.bytes().all(|b| b.is_ascii_digit())
    )
}

fn highest<'a>(releases: impl Iterator<Item = &'a Release>) -> Option<&'a Release> {
    releases.max_by(|a, b| compare_versions(a.name(), b.name()))
}

/// Catalog backed by the HTTP download feed of one or more mirrors.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    mirrors: Vec<String>,
    client: reqwest::Client,
}

impl HttpCatalog {
    /// Creates a catalog over `mirrors`, tried in order.
    ///
    /// # Errors
    ///
    /// Returns [`GovmError::CatalogError`] if the HTTP client cannot be built.
    pub fn new(mirrors: Vec<String>) -> Result<Self, GovmError> {
        if mirrors.is_empty() {
            return Err(GovmError::catalog_error("no mirrors configured"));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GovmError::CatalogError {
                message: "failed to create HTTP client".to_string(),
                source: Some(e.into()),
            })?;
        Ok(Self { mirrors, client })
    }

    /// Fetches the feed from the first mirror that answers.
    async fn fetch_releases(&self) -> Result<(&str, Vec<Release>), GovmError> {
        let mut failures = Vec::new();
        for mirror in &self.mirrors {
            match self.fetch_feed(mirror).await {
                Ok(releases) => {
                    debug!(mirror = %mirror, releases = releases.len(), "catalog loaded");
                    return Ok((mirror.as_str(), releases));
                }
                Err(e) => {
                    warn!(mirror = %mirror, error = %e, "mirror unavailable");
                    failures.push(format!("{mirror}: {e}"));
                }
            }
        }
        Err(GovmError::catalog_error(format!(
            "no mirror could be reached:\n  {}",
            failures.join("\n  ")
        )))
    }

    async fn fetch_feed(&self, mirror: &str) -> anyhow::Result<Vec<Release>> {
        use anyhow::{Context, bail};

        let url = feed_url(mirror);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch catalog from {url}"))?;

        if !response.status().is_success() {
            bail!("HTTP error {}", response.status());
        }

        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response from {url}"))?;

        serde_json::from_str(&text).with_context(|| format!("Failed to parse catalog from {url}"))
    }
}

impl VersionCatalog for HttpCatalog {
    async fn resolve(
        &self,
        requested: &str,
        platform: Platform,
    ) -> Result<ResolvedVersion, GovmError> {
        let query = VersionQuery::parse(requested)?;
        let (mirror, releases) = self.fetch_releases().await?;
        let release =
            find_release(&releases, &query).ok_or_else(|| GovmError::version_not_found(requested))?;

        Ok(ResolvedVersion {
            descriptor: VersionDescriptor::new(release.name(), platform),
            packages: packages_for(release, mirror, platform),
        })
    }
}

/// Feed URL for a mirror base URL.
#[must_use]
pub fn feed_url(mirror: &str) -> String {
    format!("{mirror}?mode=json&include=all")
}

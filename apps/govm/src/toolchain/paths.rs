//! Path management for govm.
//!
//! The default root directory is `~/.govm/` (`%APPDATA%\govm` on Windows),
//! which can be overridden by setting the `GOVM_HOME` environment variable.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.govm/                    # Root directory (or GOVM_HOME)
//!   versions/                 # Installed toolchain versions
//!     1.21.3/                 # One directory per installed version
//!     go/                     # Extraction staging name, never "installed"
//!   downloads/                # Archive cache
//!     go1.21.3.linux-amd64.tar.gz
//!   go -> versions/1.21.3     # Active link (symlink or junction)
//! ```

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use super::catalog::{VersionDescriptor, compare_versions};

/// Name of the top-level directory every Go archive extracts to.
pub const STAGING_DIR_NAME: &str = "go";

/// Name of the active link inside the root directory.
pub const ACTIVE_LINK_NAME: &str = "go";

/// Manages paths for toolchain installations.
#[derive(Debug, Clone)]
pub struct GovmPaths {
    /// Root directory for all govm data.
    pub root: PathBuf,
    /// Directory containing installed versions.
    pub versions: PathBuf,
    /// Directory for cached archives.
    pub downloads: PathBuf,
    /// The active toolchain link.
    pub active: PathBuf,
}

impl GovmPaths {
    /// Creates paths rooted at `home`, or at the platform default when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined. A relative
    /// `home` is resolved against the current directory.
    pub fn new(home: Option<PathBuf>) -> Result<Self> {
        let root = match home {
            Some(root) => root,
            None => default_root()?,
        };
        let root = std::path::absolute(&root)
            .with_context(|| format!("Failed to resolve root directory: {}", root.display()))?;
        Ok(Self::with_root(root))
    }

    /// Creates paths with a specific root directory.
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            versions: root.join("versions"),
            downloads: root.join("downloads"),
            active: root.join(ACTIVE_LINK_NAME),
            root,
        }
    }

    /// Returns the installed directory for a version.
    #[must_use]
    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.versions.join(version)
    }

    /// Returns the fixed directory name archives extract to before promotion.
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.versions.join(STAGING_DIR_NAME)
    }

    /// Returns the cache file for a version's archive.
    ///
    /// The name depends only on the version, OS, architecture and extension,
    /// so repeated runs agree on it and reuse earlier downloads.
    #[must_use]
    pub fn cache_path(&self, descriptor: &VersionDescriptor, extension: &str) -> PathBuf {
        self.downloads.join(format!(
            "go{}.{}-{}.{extension}",
            descriptor.version, descriptor.os, descriptor.arch
        ))
    }

    /// Checks whether a version directory exists.
    #[must_use]
    pub fn is_version_installed(&self, version: &str) -> bool {
        is_version_name(version) && self.version_dir(version).is_dir()
    }

    /// Lists installed versions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the versions directory cannot be read.
    pub fn list_installed_versions(&self) -> Result<Vec<String>> {
        if !self.versions.exists() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        let entries = std::fs::read_dir(&self.versions).with_context(|| {
            format!(
                "Failed to read versions directory: {}",
                self.versions.display()
            )
        })?;

        for entry in entries {
            let entry = entry.with_context(|| "Failed to read directory entry")?;
            let path = entry.path();
            if path.is_dir()
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
                && name != STAGING_DIR_NAME
            {
                versions.push(name.to_string());
            }
        }

        versions.sort_by(|a, b| compare_versions(a, b));
        Ok(versions)
    }

    /// Returns the version the active link points at, if it points into the
    /// versions directory.
    #[must_use]
    pub fn active_version(&self) -> Option<String> {
        let target = std::fs::read_link(&self.active).ok()?;
        version_of(&self.versions, &target)
    }
}

/// Whether `name` can name a directory under `versions/`: exactly one plain
/// path component, and not the staging name.
#[must_use]
pub fn is_version_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(first)), None) if first != STAGING_DIR_NAME
    )
}

/// Returns the default root directory for the current platform.
fn default_root() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        Ok(dirs::data_dir()
            .context("Cannot determine AppData directory. Set GOVM_HOME environment variable.")?
            .join("govm"))
    }
    #[cfg(not(windows))]
    {
        Ok(dirs::home_dir()
            .context("Cannot determine home directory. Set GOVM_HOME environment variable.")?
            .join(".govm"))
    }
}

/// Extracts the version name from a link target inside `versions`.
fn version_of(versions: &Path, target: &Path) -> Option<String> {
    // Windows junction targets may carry a `\\?\` verbatim prefix.
    let target = target
        .to_str()
        .and_then(|s| s.strip_prefix(r"\\?\"))
        .map_or_else(|| target.to_path_buf(), PathBuf::from);

    if target.parent()? != versions {
        return None;
    }
    let name = target.file_name()?.to_str()?;
    (name != STAGING_DIR_NAME).then(|| name.to_string())
}

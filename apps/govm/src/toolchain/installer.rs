//! Promotion of a verified archive into the version tree.
//!
//! Archives unpack to `<versions>/go` and become visible under
//! `<versions>/<version>` through a single rename. A failed extraction can
//! leave the staging directory behind; the next install removes it first.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::archive::Unarchiver;
use super::catalog::VersionDescriptor;
use super::paths::{GovmPaths, is_version_name};
use crate::errors::GovmError;

/// Installs archives into the version tree.
pub struct InstallationManager<'a> {
    paths: &'a GovmPaths,
    unarchiver: &'a dyn Unarchiver,
}

impl<'a> InstallationManager<'a> {
    /// Creates a manager over `paths` using `unarchiver` for extraction.
    #[must_use]
    pub fn new(paths: &'a GovmPaths, unarchiver: &'a dyn Unarchiver) -> Self {
        Self { paths, unarchiver }
    }

    /// Fails with [`GovmError::AlreadyInstalled`] if the version directory exists.
    ///
    /// # Errors
    ///
    /// See above. A name that is not a single path component (`..`, `a/b`,
    /// an absolute path) is [`GovmError::VersionNotFound`].
    pub fn ensure_not_installed(&self, version: &str) -> Result<(), GovmError> {
        if !is_version_name(version) {
            return Err(GovmError::version_not_found(version));
        }
        if self.paths.is_version_installed(version) {
            return Err(GovmError::already_installed(version));
        }
        Ok(())
    }

    /// Extracts `archive` and promotes it to the version directory.
    ///
    /// Returns the installed directory.
    ///
    /// # Errors
    ///
    /// - [`GovmError::AlreadyInstalled`] if the version exists; nothing is written
    /// - [`GovmError::ExtractionFailed`] if unpacking or promotion fails
    /// - [`GovmError::IoError`] if the stale staging directory cannot be removed
    pub fn install(
        &self,
        descriptor: &VersionDescriptor,
        archive: &Path,
    ) -> Result<PathBuf, GovmError> {
        self.ensure_not_installed(&descriptor.version)?;

        let staging = self.paths.staging_dir();
        remove_stale_staging(&staging)?;

        std::fs::create_dir_all(&self.paths.versions).map_err(|e| {
            GovmError::io_error(
                format!(
                    "failed to create directory {}",
                    self.paths.versions.display()
                ),
                e,
            )
        })?;

        debug!(archive = %archive.display(), dest = %self.paths.versions.display(), "extracting");
        self.unarchiver
            .unarchive(archive, &self.paths.versions)
            .map_err(|e| {
                GovmError::extraction_failed_with_source(
                    archive.to_path_buf(),
                    "failed to unpack archive",
                    e,
                )
            })?;

        if !staging.is_dir() {
            return Err(GovmError::extraction_failed(
                archive.to_path_buf(),
                format!("archive did not contain a top-level {} directory", staging.display()),
            ));
        }

        let target = self.paths.version_dir(&descriptor.version);
        std::fs::rename(&staging, &target).map_err(|e| {
            GovmError::extraction_failed_with_source(
                archive.to_path_buf(),
                format!(
                    "failed to rename {} to {}",
                    staging.display(),
                    target.display()
                ),
                e,
            )
        })?;

        info!(version = %descriptor.version, path = %target.display(), "installed");
        Ok(target)
    }

    /// Removes an installed version directory.
    ///
    /// # Errors
    ///
    /// Returns [`GovmError::NotInstalled`] if the version is absent, or
    /// [`GovmError::IoError`] if it cannot be removed.
    pub fn remove(&self, version: &str) -> Result<(), GovmError> {
        if !self.paths.is_version_installed(version) {
            return Err(GovmError::not_installed(version));
        }
        let dir = self.paths.version_dir(version);
        std::fs::remove_dir_all(&dir)
            .map_err(|e| GovmError::io_error(format!("failed to remove {}", dir.display()), e))?;
        info!(version, "removed");
        Ok(())
    }
}

fn remove_stale_staging(staging: &Path) -> Result<(), GovmError> {
    match std::fs::remove_dir_all(staging) {
        Ok(()) => {
            debug!(path = %staging.display(), "removed stale staging directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GovmError::io_error(
            format!("failed to remove {}", staging.display()),
            e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::archive::ArchiveExtractor;
    use crate::toolchain::{Platform, testing};
    use assert_fs::TempDir;

    const LINUX: Platform = Platform::new("linux", "amd64");

    struct Failing;

    impl Unarchiver for Failing {
        fn unarchive(&self, _archive: &Path, dest_dir: &Path) -> anyhow::Result<()> {
            // Simulate a partial write before the failure.
            std::fs::create_dir_all(dest_dir.join("go").join("src"))?;
            anyhow::bail!("unexpected end of archive")
        }
    }

    struct Empty;

    impl Unarchiver for Empty {
        fn unarchive(&self, _archive: &Path, _dest_dir: &Path) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn setup() -> (TempDir, GovmPaths, PathBuf) {
        let temp = TempDir::new().expect("temp dir");
        let paths = GovmPaths::with_root(temp.path().to_path_buf());
        std::fs::create_dir_all(&paths.downloads).expect("dirs");
        let archive = paths.downloads.join("go1.21.3.linux-amd64.tar.gz");
        testing::write_go_tar_gz(&archive, "1.21.3");
        (temp, paths, archive)
    }

    #[test]
    fn install_promotes_staging_to_version_dir() {
        let (_temp, paths, archive) = setup();
        let manager = InstallationManager::new(&paths, &ArchiveExtractor);

        let installed = manager
            .install(&VersionDescriptor::new("1.21.3", LINUX), &archive)
            .expect("install");

        assert_eq!(installed, paths.version_dir("1.21.3"));
        assert!(installed.join("bin").join("go").is_file());
        assert!(!paths.staging_dir().exists());
    }

    #[test]
    fn existing_version_is_rejected_without_writes() {
        let (_temp, paths, archive) = setup();
        let existing = paths.version_dir("1.21.3");
        std::fs::create_dir_all(&existing).expect("create");
        std::fs::write(existing.join("marker"), b"keep").expect("marker");
        std::fs::create_dir_all(paths.staging_dir()).expect("stale staging");

        let manager = InstallationManager::new(&paths, &ArchiveExtractor);
        let err = manager
            .install(&VersionDescriptor::new("1.21.3", LINUX), &archive)
            .unwrap_err();

        assert!(matches!(err, GovmError::AlreadyInstalled { .. }));
        assert_eq!(std::fs::read(existing.join("marker")).expect("read"), b"keep");
        assert!(paths.staging_dir().exists(), "nothing may be touched");
    }

    #[test]
    fn extraction_failure_leaves_no_version_dir_and_clears_legacy_staging() {
        let (_temp, paths, archive) = setup();
        let legacy = paths.staging_dir().join("legacy-file");
        std::fs::create_dir_all(paths.staging_dir()).expect("staging");
        std::fs::write(&legacy, b"old").expect("legacy");

        let manager = InstallationManager::new(&paths, &Failing);
        let err = manager
            .install(&VersionDescriptor::new("1.21.3", LINUX), &archive)
            .unwrap_err();

        assert!(matches!(err, GovmError::ExtractionFailed { .. }));
        assert!(!paths.version_dir("1.21.3").exists());
        assert!(!legacy.exists());
    }

    #[test]
    fn archive_without_go_directory_fails() {
        let (_temp, paths, archive) = setup();
        let manager = InstallationManager::new(&paths, &Empty);

        let err = manager
            .install(&VersionDescriptor::new("1.21.3", LINUX), &archive)
            .unwrap_err();

        assert!(matches!(err, GovmError::ExtractionFailed { .. }));
        assert!(!paths.version_dir("1.21.3").exists());
    }

    #[test]
    fn escaping_version_name_is_rejected_before_writes() {
        let (_temp, paths, archive) = setup();
        let manager = InstallationManager::new(&paths, &ArchiveExtractor);

        for name in ["..", ".", "../escaped", "/tmp/escaped", "a/b"] {
            let err = manager
                .install(&VersionDescriptor::new(name, LINUX), &archive)
                .unwrap_err();
            assert!(matches!(err, GovmError::VersionNotFound { .. }), "{name}");
        }
        assert!(!paths.versions.exists(), "nothing may be extracted");
    }

    #[test]
    fn remove_refuses_names_outside_versions() {
        let (temp, paths, _archive) = setup();
        std::fs::create_dir_all(paths.version_dir("1.21.3")).expect("create");
        let outside = temp.path().parent().expect("parent").join(format!(
            "{}-precious",
            temp.path().file_name().expect("name").to_string_lossy()
        ));
        std::fs::create_dir_all(&outside).expect("create outside");
        let manager = InstallationManager::new(&paths, &ArchiveExtractor);

        for name in ["..", ".", "1.21.3/..", outside.to_str().expect("utf-8")] {
            let err = manager.remove(name).unwrap_err();
            assert!(matches!(err, GovmError::NotInstalled { .. }), "{name}");
        }

        assert!(paths.version_dir("1.21.3").is_dir());
        assert!(paths.downloads.is_dir());
        assert!(outside.is_dir());
        std::fs::remove_dir_all(&outside).expect("cleanup");
    }

    #[test]
    fn remove_deletes_installed_version() {
        let (_temp, paths, _archive) = setup();
        std::fs::create_dir_all(paths.version_dir("1.20").join("bin")).expect("create");
        let manager = InstallationManager::new(&paths, &ArchiveExtractor);

        manager.remove("1.20").expect("remove");
        assert!(!paths.version_dir("1.20").exists());

        let err = manager.remove("1.20").unwrap_err();
        assert!(matches!(err, GovmError::NotInstalled { .. }));
    }
}

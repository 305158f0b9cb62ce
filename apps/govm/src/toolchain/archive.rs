//! Archive extraction for Go distributions.
//!
//! Go archives always unpack to a single top-level `go/` directory. The
//! layout is kept exactly as published; promoting `go/` to its version name
//! is the installer's job.

use std::path::{Component, Path};

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use tar::Archive;

/// Unpacks an archive into a directory. A pure format transform.
pub trait Unarchiver {
    /// Extracts `archive` into `dest_dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive is unreadable or malformed, an entry
    /// would escape `dest_dir`, or a file cannot be written.
    fn unarchive(&self, archive: &Path, dest_dir: &Path) -> Result<()>;
}

/// [`Unarchiver`] for `.tar.gz`/`.tgz` and `.zip`, chosen by file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveExtractor;

impl Unarchiver for ArchiveExtractor {
    fn unarchive(&self, archive: &Path, dest_dir: &Path) -> Result<()> {
        let name = archive.to_string_lossy();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            extract_tar_gz(archive, dest_dir)
        } else if name.ends_with(".zip") {
            extract_zip(archive, dest_dir)
        } else {
            bail!("Unsupported archive format: {}", archive.display())
        }
    }
}

/// Rejects absolute entries and entries with `..` components.
fn ensure_relative(entry_path: &Path) -> Result<()> {
    if entry_path.is_absolute()
        || entry_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
    {
        bail!(
            "Refusing to extract path with parent directory or absolute reference: {}",
            entry_path.display()
        );
    }
    Ok(())
}

/// Extracts a tar.gz archive, keeping entry paths and permissions.
///
/// # Errors
///
/// Returns an error if the archive cannot be read or an entry cannot be written.
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);

    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read tar entries: {}", archive_path.display()))?
    {
        let mut entry = entry
            .with_context(|| format!("Failed to read tar entry: {}", archive_path.display()))?;

        let entry_path = entry
            .path()
            .with_context(|| "Failed to get entry path")?
            .into_owned();
        ensure_relative(&entry_path)?;

        let output_path = dest_dir.join(&entry_path);

        if entry.header().entry_type().is_dir() {
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("Failed to create directory: {}", output_path.display())
            })?;
        } else {
            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
            entry
                .unpack(&output_path)
                .with_context(|| format!("Failed to extract: {}", output_path.display()))?;
        }
    }

    Ok(())
}

/// Extracts a ZIP archive, applying stored Unix modes where present.
///
/// # Errors
///
/// Returns an error if the archive cannot be read or an entry cannot be written.
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {}", archive_path.display()))?;

    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read archive entry {i}"))?;

        // None for names that would escape the archive root
        let entry_path = entry
            .enclosed_name()
            .with_context(|| format!("Invalid entry path in archive: {}", entry.name()))?;
        ensure_relative(&entry_path)?;

        let output_path = dest_dir.join(&entry_path);

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("Failed to create directory: {}", output_path.display())
            })?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let mut outfile = std::fs::File::create(&output_path)
            .with_context(|| format!("Failed to create file: {}", output_path.display()))?;
        std::io::copy(&mut entry, &mut outfile)
            .with_context(|| format!("Failed to extract: {}", output_path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&output_path, std::fs::Permissions::from_mode(mode))
                .with_context(|| format!("Failed to set permissions: {}", output_path.display()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::testing;
    use assert_fs::TempDir;
    use std::io::Write;

    #[test]
    fn tar_gz_keeps_top_level_go_directory() {
        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("go1.21.3.linux-amd64.tar.gz");
        testing::write_go_tar_gz(&archive, "1.21.3");
        let dest = temp.path().join("versions");

        ArchiveExtractor.unarchive(&archive, &dest).expect("Should extract");

        assert!(dest.join("go").join("bin").join("go").is_file());
        assert_eq!(
            std::fs::read_to_string(dest.join("go").join("VERSION")).expect("read"),
            "go1.21.3\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn tar_gz_preserves_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("go.tar.gz");
        testing::write_go_tar_gz(&archive, "1.21.3");
        let dest = temp.path().join("out");

        ArchiveExtractor.unarchive(&archive, &dest).expect("Should extract");

        let mode = std::fs::metadata(dest.join("go/bin/go"))
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn zip_keeps_layout() {
        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("go1.21.3.windows-amd64.zip");
        testing::write_go_zip(&archive, "1.21.3");
        let dest = temp.path().join("versions");

        ArchiveExtractor.unarchive(&archive, &dest).expect("Should extract");

        assert!(dest.join("go").join("VERSION").is_file());
        assert!(dest.join("go").join("bin").join("go").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn zip_applies_unix_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("go.zip");
        testing::write_go_zip(&archive, "1.21.3");
        let dest = temp.path().join("out");

        ArchiveExtractor.unarchive(&archive, &dest).expect("Should extract");

        let mode = std::fs::metadata(dest.join("go/bin/go"))
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn zip_entry_escaping_destination_is_rejected() {
        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("evil.zip");
        {
            let file = std::fs::File::create(&archive).expect("Should create file");
            let mut zip = zip::ZipWriter::new(file);
            zip.start_file("../evil.txt", zip::write::SimpleFileOptions::default())
                .expect("Should start file");
            zip.write_all(b"pwned").expect("Should write");
            zip.finish().expect("Should finish");
        }
        let dest = temp.path().join("out");

        let result = ArchiveExtractor.unarchive(&archive, &dest);

        assert!(result.is_err());
        assert!(!temp.path().join("evil.txt").exists());
    }

    #[test]
    fn corrupt_archive_fails() {
        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("broken.tar.gz");
        std::fs::write(&archive, b"definitely not gzip").expect("write");

        assert!(
            ArchiveExtractor
                .unarchive(&archive, &temp.path().join("out"))
                .is_err()
        );
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let temp = TempDir::new().expect("temp dir");
        let archive = temp.path().join("go.pkg");
        std::fs::write(&archive, b"xar").expect("write");

        let err = ArchiveExtractor
            .unarchive(&archive, &temp.path().join("out"))
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported archive format"));
    }

    #[test]
    fn ensure_relative_rejects_parent_and_absolute() {
        assert!(ensure_relative(Path::new("go/bin/go")).is_ok());
        assert!(ensure_relative(Path::new("go/../../etc/passwd")).is_err());
        #[cfg(unix)]
        assert!(ensure_relative(Path::new("/etc/passwd")).is_err());
    }
}

//! Platform detection for govm.
//!
//! Maps the compile-time Rust target onto the OS and architecture names used
//! by Go distribution archives (`linux-amd64`, `darwin-arm64`, ...).

use std::fmt;

use crate::errors::GovmError;

/// An OS/architecture pair in Go naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    os: &'static str,
    arch: &'static str,
}

impl Platform {
    /// Creates a platform from Go OS/architecture names.
    #[must_use]
    pub const fn new(os: &'static str, arch: &'static str) -> Self {
        Self { os, arch }
    }

    /// Detects the current platform.
    ///
    /// # Errors
    ///
    /// Returns [`GovmError::UnsupportedPlatform`] when the running target has
    /// no Go distribution counterpart.
    pub fn detect() -> Result<Self, GovmError> {
        Self::from_rust_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Translates Rust `target_os`/`target_arch` names into a Go platform.
    ///
    /// # Errors
    ///
    /// Returns [`GovmError::UnsupportedPlatform`] for unknown names.
    pub fn from_rust_target(os: &str, arch: &str) -> Result<Self, GovmError> {
        let go_os = match os {
            "linux" => "linux",
            "macos" => "darwin",
            "windows" => "windows",
            "freebsd" => "freebsd",
            _ => return Err(GovmError::unsupported_platform(os, arch)),
        };
        let go_arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            "arm" => "armv6l",
            "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
            "s390x" => "s390x",
            "riscv64" => "riscv64",
            "loongarch64" => "loong64",
            _ => return Err(GovmError::unsupported_platform(os, arch)),
        };
        Ok(Self::new(go_os, go_arch))
    }

    /// Go OS name (`GOOS`).
    #[must_use]
    pub fn os(self) -> &'static str {
        self.os
    }

    /// Go architecture name as it appears in archive file names.
    #[must_use]
    pub fn arch(self) -> &'static str {
        self.arch
    }

    /// Returns whether this platform is Windows.
    #[must_use]
    pub fn is_windows(self) -> bool {
        self.os == "windows"
    }

    /// Archive extension published for this platform, without a leading dot.
    #[must_use]
    pub fn archive_extension(self) -> &'static str {
        if self.is_windows() { "zip" } else { "tar.gz" }
    }

    /// Executable suffix for binaries on this platform.
    #[must_use]
    pub fn executable_extension(self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_targets_map_to_go_names() {
        let linux = Platform::from_rust_target("linux", "x86_64").expect("supported");
        assert_eq!((linux.os(), linux.arch()), ("linux", "amd64"));

        let mac = Platform::from_rust_target("macos", "aarch64").expect("supported");
        assert_eq!((mac.os(), mac.arch()), ("darwin", "arm64"));

        let win = Platform::from_rust_target("windows", "x86").expect("supported");
        assert_eq!((win.os(), win.arch()), ("windows", "386"));
    }

    #[test]
    fn unknown_target_is_rejected() {
        let err = Platform::from_rust_target("haiku", "x86_64").unwrap_err();
        assert!(matches!(err, GovmError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn display_joins_os_and_arch() {
        assert_eq!(Platform::new("linux", "arm64").to_string(), "linux-arm64");
    }

    #[test]
    fn archive_extension_is_zip_only_on_windows() {
        assert_eq!(Platform::new("windows", "amd64").archive_extension(), "zip");
        assert_eq!(Platform::new("linux", "amd64").archive_extension(), "tar.gz");
        assert_eq!(Platform::new("darwin", "arm64").archive_extension(), "tar.gz");
    }

    #[test]
    fn executable_extension_correct_for_each_os() {
        assert_eq!(Platform::new("windows", "amd64").executable_extension(), ".exe");
        assert_eq!(Platform::new("linux", "amd64").executable_extension(), "");
    }

    #[test]
    fn detect_matches_from_rust_target() {
        let detected = Platform::detect();
        let expected = Platform::from_rust_target(std::env::consts::OS, std::env::consts::ARCH);
        assert_eq!(detected.ok(), expected.ok());
    }
}

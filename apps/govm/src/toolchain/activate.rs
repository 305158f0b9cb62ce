//! The active toolchain link.
//!
//! `<home>/go` points at one installed version directory. Switching removes
//! the old link and creates a new one with the first [`LinkStrategy`] of the
//! platform's [`LinkPolicy`] that succeeds. Anything at the link path that is
//! not a link is left alone and reported.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use super::Platform;
use crate::errors::GovmError;

/// One way of creating a directory link.
pub trait LinkStrategy {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Creates `link` pointing at the directory `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be created.
    fn link(&self, target: &Path, link: &Path) -> Result<()>;
}

/// Directory symbolic link.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymlinkStrategy;

impl LinkStrategy for SymlinkStrategy {
    fn name(&self) -> &'static str {
        "symlink"
    }

    fn link(&self, target: &Path, link: &Path) -> Result<()> {
        #[cfg(unix)]
        std::os::unix::fs::symlink(target, link)?;
        #[cfg(windows)]
        std::os::windows::fs::symlink_dir(target, link)?;
        Ok(())
    }
}

/// NTFS directory junction created with `mklink /j`. Needs no privileges.
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct JunctionStrategy;

#[cfg(windows)]
impl LinkStrategy for JunctionStrategy {
    fn name(&self) -> &'static str {
        "junction"
    }

    fn link(&self, target: &Path, link: &Path) -> Result<()> {
        let output = Command::new("cmd")
            .arg("/c")
            .arg("mklink")
            .arg("/j")
            .arg(link)
            .arg(target)
            .output()
            .context("Failed to run mklink")?;
        if !output.status.success() {
            bail!(
                "mklink /j exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// Ordered link strategies, tried until one succeeds.
pub struct LinkPolicy {
    strategies: Vec<Box<dyn LinkStrategy>>,
}

impl LinkPolicy {
    /// Creates a policy from an explicit strategy list.
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn LinkStrategy>>) -> Self {
        Self { strategies }
    }

    /// Junction then symlink on Windows, symlink elsewhere.
    #[must_use]
    pub fn for_current_platform() -> Self {
        #[cfg(windows)]
        {
            Self::new(vec![Box::new(JunctionStrategy), Box::new(SymlinkStrategy)])
        }
        #[cfg(not(windows))]
        {
            Self::new(vec![Box::new(SymlinkStrategy)])
        }
    }
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// The active link path.
    pub link: PathBuf,
    /// The version directory it points at.
    pub target: PathBuf,
    /// Name of the strategy that created the link.
    pub strategy: &'static str,
    /// Version reported by the toolchain, if the probe succeeded.
    pub reported: Option<String>,
}

/// Owner of the single active link.
pub struct ActivationSwitch {
    link: PathBuf,
    policy: LinkPolicy,
}

impl ActivationSwitch {
    /// Creates a switch managing `link`.
    #[must_use]
    pub fn new(link: PathBuf, policy: LinkPolicy) -> Self {
        Self { link, policy }
    }

    /// The managed link path.
    #[must_use]
    pub fn link(&self) -> &Path {
        &self.link
    }

    /// Points the active link at `target`.
    ///
    /// Returns the name of the strategy that created the link. On failure the
    /// link is absent or unchanged and `target` itself is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GovmError::ActivationFailed`] if `target` is not a directory,
    /// the link path holds something other than a link, or every strategy fails.
    pub fn activate(&self, target: &Path) -> Result<&'static str, GovmError> {
        if !target.is_dir() {
            return Err(GovmError::activation_failed(
                target.to_path_buf(),
                "target is not an installed version directory",
            ));
        }

        // Symlink targets resolve against the link's directory, not the cwd.
        let target = &std::path::absolute(target).map_err(|e| {
            GovmError::activation_failed_with_source(
                target.to_path_buf(),
                "cannot resolve target path",
                e,
            )
        })?;

        self.remove_link().map_err(|e| {
            GovmError::activation_failed_with_source(target.clone(), e.to_string(), e)
        })?;

        let mut failures = Vec::new();
        for strategy in &self.policy.strategies {
            match strategy.link(target, &self.link) {
                Ok(()) => {
                    info!(
                        link = %self.link.display(),
                        target = %target.display(),
                        strategy = strategy.name(),
                        "activated"
                    );
                    return Ok(strategy.name());
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "link strategy failed");
                    failures.push(format!("{}: {e}", strategy.name()));
                }
            }
        }

        Err(GovmError::activation_failed(
            target.to_path_buf(),
            if failures.is_empty() {
                "no link strategy configured".to_string()
            } else {
                failures.join("; ")
            },
        ))
    }

    /// Runs `probe` against the active link.
    ///
    /// Probe failures are logged and never affect the activation.
    pub fn smoke_test(&self, probe: &dyn VersionProbe) -> Option<String> {
        match probe.probe(&self.link) {
            Ok(version) => Some(version),
            Err(e) => {
                warn!(
                    link = %self.link.display(),
                    error = %format!("{e:#}"),
                    "version probe failed"
                );
                None
            }
        }
    }

    /// Returns where the active link points, if it exists.
    #[must_use]
    pub fn current_target(&self) -> Option<PathBuf> {
        std::fs::read_link(&self.link).ok()
    }

    /// Removes the active link. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`GovmError::ActivationFailed`] if the link path holds a real
    /// file or directory, or the link cannot be removed.
    pub fn deactivate(&self) -> Result<(), GovmError> {
        self.remove_link().map_err(|e| {
            GovmError::activation_failed_with_source(self.link.clone(), e.to_string(), e)
        })
    }

    fn remove_link(&self) -> std::io::Result<()> {
        let metadata = match std::fs::symlink_metadata(&self.link) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        if !metadata.file_type().is_symlink() {
            return Err(std::io::Error::other(format!(
                "{} exists and is not a link; move it away to let govm manage it",
                self.link.display()
            )));
        }

        debug!(link = %self.link.display(), "removing active link");
        // Directory links and junctions on Windows are removed as directories.
        std::fs::remove_file(&self.link).or_else(|e| {
            if cfg!(windows) {
                std::fs::remove_dir(&self.link)
            } else {
                Err(e)
            }
        })
    }
}

/// Reports the version of a toolchain.
pub trait VersionProbe {
    /// Returns the version line of the toolchain rooted at `toolchain`.
    ///
    /// # Errors
    ///
    /// Returns an error if the toolchain cannot be run or answers garbage.
    fn probe(&self, toolchain: &Path) -> Result<String>;
}

/// Runs `bin/go version`.
#[derive(Debug, Clone, Copy)]
pub struct GoVersionProbe {
    exe_suffix: &'static str,
}

impl GoVersionProbe {
    /// Creates a probe for binaries built for `platform`.
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            exe_suffix: platform.executable_extension(),
        }
    }
}

impl VersionProbe for GoVersionProbe {
    fn probe(&self, toolchain: &Path) -> Result<String> {
        let go = toolchain.join("bin").join(format!("go{}", self.exe_suffix));
        let output = Command::new(&go)
            .arg("version")
            .output()
            .with_context(|| format!("Failed to run {}", go.display()))?;

        if !output.status.success() {
            bail!("{} version exited with {}", go.display(), output.status);
        }

        let stdout = String::from_utf8(output.stdout).context("go version printed non-UTF-8")?;
        parse_go_version_output(&stdout)
            .with_context(|| format!("Unexpected go version output: {}", stdout.trim()))
    }
}

/// Strips the `go version ` prefix: `go version go1.21.3 linux/amd64`
/// becomes `go1.21.3 linux/amd64`.
fn parse_go_version_output(output: &str) -> Option<String> {
    let rest = output.trim().strip_prefix("go version ")?.trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

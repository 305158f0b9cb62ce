//! Uninstall command for the govm CLI.
//!
//! Removes an installed version. Removing the active version also removes
//! the active link so it never dangles.

use anyhow::Result;
use clap::Args;

use crate::config::Settings;
use crate::toolchain::GovmPaths;
use crate::toolchain::activate::{ActivationSwitch, LinkPolicy};
use crate::toolchain::archive::ArchiveExtractor;
use crate::toolchain::catalog::strip_go_prefix;
use crate::toolchain::installer::InstallationManager;

/// Arguments for the uninstall command.
#[derive(Args)]
pub struct UninstallArgs {
    /// Version to remove (e.g., "1.21.3" or "go1.21.3").
    pub version: String,
}

/// Executes the uninstall command.
///
/// # Errors
///
/// Returns an error if the version is not installed or cannot be removed.
pub fn execute(args: &UninstallArgs) -> Result<()> {
    let settings = Settings::from_env();
    let paths = GovmPaths::new(settings.home)?;
    let version = strip_go_prefix(args.version.trim());
    let manager = InstallationManager::new(&paths, &ArchiveExtractor);

    if paths.active_version().as_deref() == Some(version) {
        ActivationSwitch::new(paths.active.clone(), LinkPolicy::for_current_platform())
            .deactivate()?;
        println!("Deactivated go{version}");
    }

    manager.remove(version)?;
    println!("Uninstalled go{version}");
    Ok(())
}

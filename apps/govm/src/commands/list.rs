//! List command for the govm CLI.
//!
//! Displays installed Go versions and marks the active one.
//!
//! ## Output Format
//!
//! ```text
//!   1.20.14
//! * 1.21.3
//! ```

use anyhow::Result;

use crate::config::Settings;
use crate::toolchain::GovmPaths;

/// Executes the list command.
///
/// # Errors
///
/// Returns an error if the versions directory cannot be read.
pub fn execute() -> Result<()> {
    let settings = Settings::from_env();
    let paths = GovmPaths::new(settings.home)?;
    let versions = paths.list_installed_versions()?;

    if versions.is_empty() {
        println!("No Go versions installed.");
        println!();
        println!("Run 'govm install <version>' to install one.");
        return Ok(());
    }

    let active = paths.active_version();
    for version in &versions {
        let marker = if active.as_deref() == Some(version.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {version}");
    }
    Ok(())
}

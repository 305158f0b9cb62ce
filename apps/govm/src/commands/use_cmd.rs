//! Use command for the govm CLI.
//!
//! Points the active link at an already installed version.
//!
//! ## Usage
//!
//! ```bash
//! govm use 1.21.3
//! ```

use anyhow::Result;
use clap::Args;

use crate::config::Settings;
use crate::errors::GovmError;
use crate::toolchain::activate::{ActivationSwitch, GoVersionProbe, LinkPolicy};
use crate::toolchain::catalog::strip_go_prefix;
use crate::toolchain::{GovmPaths, Platform};

/// Arguments for the use command.
#[derive(Args)]
pub struct UseArgs {
    /// Installed version to activate (e.g., "1.21.3" or "go1.21.3").
    pub version: String,
}

/// Executes the use command.
///
/// # Errors
///
/// Returns an error if the version is not installed or the active link
/// cannot be switched.
pub fn execute(args: &UseArgs) -> Result<()> {
    let settings = Settings::from_env();
    let platform = Platform::detect()?;
    let paths = GovmPaths::new(settings.home)?;
    let version = strip_go_prefix(args.version.trim());

    if !paths.is_version_installed(version) {
        return Err(GovmError::not_installed(version).into());
    }

    let switch = ActivationSwitch::new(paths.active.clone(), LinkPolicy::for_current_platform());
    let target = paths.version_dir(version);
    if switch.current_target().as_deref() == Some(target.as_path()) {
        println!("go{version} is already active");
    } else {
        switch.activate(&target)?;
    }

    match switch.smoke_test(&GoVersionProbe::new(platform)) {
        Some(reported) => println!("Now using {reported}"),
        None => println!("Now using go{version}"),
    }
    Ok(())
}

//! Install command for the govm CLI.
//!
//! Resolves a Go version against the release feed, downloads and verifies the
//! archive, installs it under the versions directory and makes it active.
//!
//! ## Usage
//!
//! ```bash
//! govm install 1.21.3          # Install and activate go1.21.3
//! govm install 1.21.x          # Newest stable 1.21 release
//! govm install latest          # Newest stable release
//! govm install 1.21.3 --skip-checksum --no-activate
//! ```

use anyhow::Result;
use clap::Args;

use crate::config::Settings;
use crate::picker::TerminalPicker;
use crate::toolchain::catalog::HttpCatalog;
use crate::toolchain::download::{HttpFetcher, cli_progress};
use crate::toolchain::orchestrator::{InstallOrchestrator, InstallOutcome, InstallRequest};
use crate::toolchain::{GovmPaths, Platform};

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Version to install (e.g., "1.21.3", "go1.21.3", "1.21.x" or "latest").
    pub version: String,

    /// Skip checksum verification of the downloaded archive.
    #[clap(long = "skip-checksum")]
    pub skip_checksum: bool,

    /// Install without switching the active version.
    #[clap(long = "no-activate", visible_alias = "nouse")]
    pub no_activate: bool,
}

/// Executes the install command.
///
/// # Process
///
/// 1. Resolve the version for the current platform
/// 2. Pick a package when several match (interactive when a terminal is attached)
/// 3. Reuse the cached archive or download it
/// 4. Verify its checksum unless skipped or declined
/// 5. Extract into the versions directory
/// 6. Point the active link at the new version
///
/// # Errors
///
/// Returns an error if any stage fails; see [`crate::errors::GovmError`].
pub async fn execute(args: &InstallArgs) -> Result<()> {
    let settings = Settings::from_env();
    let platform = Platform::detect()?;
    let paths = GovmPaths::new(settings.home.clone())?;

    let catalog = HttpCatalog::new(settings.mirrors.clone())?;
    let fetcher = HttpFetcher::new()?;
    let picker = TerminalPicker::new();

    let mut orchestrator =
        InstallOrchestrator::new(&catalog, &fetcher, &paths, platform).with_progress(cli_progress());
    if settings.interactive {
        orchestrator = orchestrator.with_selection(&picker).with_consent(&picker);
    }

    let request = InstallRequest {
        version: args.version.clone(),
        skip_checksum: args.skip_checksum,
        activate: !args.no_activate,
    };

    match orchestrator.install(&request).await? {
        InstallOutcome::Installed {
            version,
            path,
            activation,
        } => {
            println!("Installed {version} to {}", path.display());
            if let Some(activation) = activation {
                println!(
                    "Linked {} -> {} ({})",
                    activation.link.display(),
                    activation.target.display(),
                    activation.strategy
                );
                let using = activation.reported.unwrap_or_else(|| version.to_string());
                println!("Now using {using}");
            } else {
                println!();
                println!("Run 'govm use {}' to activate it.", version.version);
            }
        }
        InstallOutcome::Declined { version } => {
            println!("Installation of {version} cancelled.");
        }
    }

    Ok(())
}

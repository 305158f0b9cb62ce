#![warn(clippy::pedantic)]

//! # govm: Go toolchain version manager
//!
//! Installs Go releases side by side under one root directory and switches a
//! single active link between them.
//!
//! ## Subcommands
//!
//! - `install` - Download, verify, install and activate a version
//! - `use` - Activate an installed version
//! - `list` - List installed versions
//! - `uninstall` - Remove an installed version
//!
//! ## Examples
//!
//! Install and activate the newest 1.21 release:
//! ```bash
//! govm install 1.21.x
//! ```
//!
//! Switch back to an older version:
//! ```bash
//! govm use 1.20.14
//! ```

mod commands;
mod config;
mod errors;
mod picker;
mod toolchain;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{install, list, uninstall, use_cmd};
use errors::GovmError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Go toolchain version manager.
#[derive(Parser)]
#[command(
    name = "govm",
    author,
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GOVM_GIT_COMMIT"), ")"),
    about = "Install and switch between Go toolchain versions",
    after_help = "\
LAYOUT:
    $GOVM_HOME/versions/<version>   Installed toolchains
    $GOVM_HOME/downloads            Cached archives
    $GOVM_HOME/go                   Link to the active toolchain (add go/bin to PATH)

ENVIRONMENT VARIABLES:
    GOVM_HOME               Root directory (default: ~/.govm)
    GOVM_MIRROR             Comma-separated download mirrors (default: https://go.dev/dl/)
    GOVM_NONINTERACTIVE     Never prompt; pick the first package and refuse unverified ones
    RUST_LOG                Log filter, overrides -v/-q"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[clap(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the govm CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Install a Go version.
    ///
    /// Resolves the version against the release feed, downloads and verifies
    /// the archive, extracts it and makes it the active version.
    Install(install::InstallArgs),

    /// Activate an installed Go version.
    Use(use_cmd::UseArgs),

    /// List installed Go versions.
    ///
    /// The active version is marked with an asterisk.
    #[command(visible_alias = "ls")]
    List,

    /// Remove an installed Go version.
    #[command(visible_alias = "rm")]
    Uninstall(uninstall::UninstallArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Initializes stderr logging. `RUST_LOG` takes precedence over the flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if quiet {
            "error"
        } else {
            match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        };
        EnvFilter::new(level)
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Prints an error and returns the exit code.
///
/// [`GovmError`]s carry their own user-facing message; anything else is
/// printed with its context chain.
fn handle_error(e: &anyhow::Error) -> i32 {
    if let Some(err) = e.downcast_ref::<GovmError>() {
        eprintln!("Error: {err}");
    } else {
        eprintln!("Error: {e:#}");
    }
    1
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Install(args) => install::execute(&args).await,
        Commands::Use(args) => use_cmd::execute(&args),
        Commands::List => list::execute(),
        Commands::Uninstall(args) => uninstall::execute(&args),
    }
}

//! Command modules for the govm CLI.
//!
//! ## Toolchain Commands
//!
//! - [`install`] - Download, verify, install and activate a Go version
//! - [`use_cmd`] - Activate an installed version
//! - [`list`] - List installed versions
//! - [`uninstall`] - Remove an installed version

pub mod install;
pub mod list;
pub mod uninstall;
pub mod use_cmd;

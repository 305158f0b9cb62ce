//! Go toolchain installation and activation.
//!
//! ## Module Structure
//!
//! - [`platform`] - OS and architecture detection in Go naming
//! - [`paths`] - Home directory layout and cache paths
//! - [`catalog`] - Release feed and version resolution
//! - [`select`] - Choosing one package among candidates
//! - [`download`] - HTTP downloads with progress tracking
//! - [`verify`] - SHA-256/SHA-512 checksum verification
//! - [`acquire`] - Cache reuse, download and integrity policy
//! - [`archive`] - ZIP and tar.gz extraction
//! - [`installer`] - Promotion into the version tree
//! - [`activate`] - The active toolchain link
//! - [`orchestrator`] - The install workflow

pub mod acquire;
pub mod activate;
pub mod archive;
pub mod catalog;
pub mod download;
pub mod installer;
pub mod orchestrator;
pub mod paths;
pub mod platform;
pub mod select;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

pub use paths::GovmPaths;
pub use platform::Platform;

//! The install workflow.
//!
//! [`InstallOrchestrator`] walks one request through
//! `Resolving → Selecting → Acquiring → Verifying → Extracting → Activating → Done`.
//! Every stage is a hard gate: the first failure moves the orchestrator to
//! [`Stage::Error`] and is returned unchanged.

use std::cell::Cell;
use std::fmt;
use std::path::PathBuf;

use tracing::{debug, error, info};

use super::Platform;
use super::acquire::{AcquisitionPipeline, IntegrityPolicy, RefuseUnverified, UnverifiedConsent};
use super::activate::{Activation, ActivationSwitch, GoVersionProbe, LinkPolicy, VersionProbe};
use super::archive::{ArchiveExtractor, Unarchiver};
use super::catalog::{VersionCatalog, VersionDescriptor};
use super::download::{Fetcher, ProgressCallback};
use super::installer::InstallationManager;
use super::paths::GovmPaths;
use super::select::{FirstCandidate, PackageSelector, SelectionStrategy};
use crate::errors::GovmError;

/// Workflow stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    Selecting,
    Acquiring,
    Verifying,
    Extracting,
    Activating,
    Done,
    Error,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resolving => "resolving",
            Self::Selecting => "selecting",
            Self::Acquiring => "acquiring",
            Self::Verifying => "verifying",
            Self::Extracting => "extracting",
            Self::Activating => "activating",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// What to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    /// Version identifier as typed (`1.21.3`, `go1.21.3`, `1.21.x`, `latest`).
    pub version: String,
    /// Bypass checksum verification.
    pub skip_checksum: bool,
    /// Switch the active link after installing.
    pub activate: bool,
}

/// How an install request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The version is installed, and activated if requested.
    Installed {
        version: VersionDescriptor,
        path: PathBuf,
        activation: Option<Activation>,
    },
    /// The user declined to install an unverifiable package. Nothing was
    /// downloaded or written.
    Declined { version: VersionDescriptor },
}

/// Sequences resolution, selection, acquisition, installation and activation.
pub struct InstallOrchestrator<'a, C: VersionCatalog, F: Fetcher> {
    catalog: &'a C,
    fetcher: &'a F,
    paths: &'a GovmPaths,
    platform: Platform,
    selection: &'a dyn SelectionStrategy,
    consent: &'a dyn UnverifiedConsent,
    unarchiver: &'a dyn Unarchiver,
    probe: Box<dyn VersionProbe + 'a>,
    switch: ActivationSwitch,
    progress: Option<ProgressCallback>,
    stage: Cell<Stage>,
}

impl<'a, C: VersionCatalog, F: Fetcher> InstallOrchestrator<'a, C, F> {
    /// Creates an orchestrator with scripted defaults: first candidate,
    /// unverified packages refused, tar.gz/zip extraction, `go version` probe
    /// and the platform link policy.
    pub fn new(catalog: &'a C, fetcher: &'a F, paths: &'a GovmPaths, platform: Platform) -> Self {
        Self {
            catalog,
            fetcher,
            paths,
            platform,
            selection: &FirstCandidate,
            consent: &RefuseUnverified,
            unarchiver: &ArchiveExtractor,
            probe: Box::new(GoVersionProbe::new(platform)),
            switch: ActivationSwitch::new(
                paths.active.clone(),
                LinkPolicy::for_current_platform(),
            ),
            progress: None,
            stage: Cell::new(Stage::Resolving),
        }
    }

    /// Uses `strategy` when several packages match.
    #[must_use]
    pub fn with_selection(mut self, strategy: &'a dyn SelectionStrategy) -> Self {
        self.selection = strategy;
        self
    }

    /// Asks `consent` before installing unverifiable packages.
    #[must_use]
    pub fn with_consent(mut self, consent: &'a dyn UnverifiedConsent) -> Self {
        self.consent = consent;
        self
    }

    /// Extracts archives with `unarchiver`.
    #[cfg(test)]
    #[must_use]
    pub fn with_unarchiver(mut self, unarchiver: &'a dyn Unarchiver) -> Self {
        self.unarchiver = unarchiver;
        self
    }

    /// Smoke-tests activations with `probe`.
    #[cfg(test)]
    #[must_use]
    pub fn with_probe(mut self, probe: impl VersionProbe + 'a) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Reports download progress through `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Creates the active link with `policy`.
    #[cfg(test)]
    #[must_use]
    pub fn with_links(mut self, policy: LinkPolicy) -> Self {
        self.switch = ActivationSwitch::new(self.paths.active.clone(), policy);
        self
    }

    /// The stage the workflow is in, or ended in.
    pub fn stage(&self) -> Stage {
        self.stage.get()
    }

    /// Runs the workflow for `request`.
    ///
    /// # Errors
    ///
    /// Returns the [`GovmError`] of the first failing stage.
    pub async fn install(&self, request: &InstallRequest) -> Result<InstallOutcome, GovmError> {
        match self.run(request).await {
            Ok(outcome) => {
                self.enter(Stage::Done);
                Ok(outcome)
            }
            Err(e) => {
                error!(stage = %self.stage(), error = %e, "install failed");
                self.stage.set(Stage::Error);
                Err(e)
            }
        }
    }

    fn enter(&self, stage: Stage) {
        debug!(from = %self.stage(), to = %stage, "stage transition");
        self.stage.set(stage);
    }

    async fn run(&self, request: &InstallRequest) -> Result<InstallOutcome, GovmError> {
        let installer = InstallationManager::new(self.paths, self.unarchiver);

        self.enter(Stage::Resolving);
        let resolved = self.catalog.resolve(&request.version, self.platform).await?;
        let descriptor = resolved.descriptor;
        info!(requested = %request.version, resolved = %descriptor, "version resolved");
        installer.ensure_not_installed(&descriptor.version)?;

        self.enter(Stage::Selecting);
        let package = PackageSelector::new(self.selection).select(
            resolved.packages,
            &descriptor.version,
            &self.platform.to_string(),
        )?;

        self.enter(Stage::Acquiring);
        let pipeline = AcquisitionPipeline::new(self.fetcher, self.consent)
            .with_progress(self.progress.clone());
        let policy = pipeline.policy(&package, request.skip_checksum)?;
        if policy == IntegrityPolicy::Declined {
            info!(file = %package.file_name, "unverified package declined");
            return Ok(InstallOutcome::Declined {
                version: descriptor,
            });
        }

        let cache = self
            .paths
            .cache_path(&descriptor, self.platform.archive_extension());
        let status = pipeline.fetch(&package, &cache).await?;
        debug!(?status, path = %cache.display(), "archive acquired");

        self.enter(Stage::Verifying);
        if policy == IntegrityPolicy::Verify {
            pipeline.verify(&package, &cache).await?;
        } else {
            debug!(file = %package.file_name, "verification skipped");
        }

        self.enter(Stage::Extracting);
        let path = run_blocking(|| installer.install(&descriptor, &cache))?;

        let activation = if request.activate {
            self.enter(Stage::Activating);
            let strategy = self.switch.activate(&path)?;
            Some(Activation {
                link: self.switch.link().to_path_buf(),
                target: path.clone(),
                strategy,
                reported: self.switch.smoke_test(self.probe.as_ref()),
            })
        } else {
            None
        };

        Ok(InstallOutcome::Installed {
            version: descriptor,
            path,
            activation,
        })
    }
}

/// Runs synchronous filesystem work, handing the worker thread over to it
/// on a multi-threaded runtime.
fn run_blocking<T>(work: impl FnOnce() -> T) -> T {
    use tokio::runtime::{Handle, RuntimeFlavor};

    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}

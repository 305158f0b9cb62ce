//! Package selection.
//!
//! When a release publishes more than one archive for the current platform
//! (older macOS builds, for instance), the choice is delegated to a
//! [`SelectionStrategy`]. The selector itself never touches the terminal.

use anyhow::Result;
use tracing::debug;

use super::catalog::PackageDescriptor;
use crate::errors::GovmError;

/// One entry offered to a selection strategy.
#[derive(Debug, Clone, Copy)]
pub struct Choice<'a> {
    /// The candidate package.
    pub package: &'a PackageDescriptor,
    /// Set on the first candidate only.
    pub is_default: bool,
}

/// Picks one of several candidate packages.
pub trait SelectionStrategy {
    /// Returns the index of the chosen entry in `choices`.
    ///
    /// # Errors
    ///
    /// Returns an error if no choice could be made, e.g. the user cancelled.
    fn choose(&self, choices: &[Choice<'_>]) -> Result<usize>;
}

/// Scripted strategy that always takes the default (first) candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstCandidate;

impl SelectionStrategy for FirstCandidate {
    fn choose(&self, choices: &[Choice<'_>]) -> Result<usize> {
        Ok(choices.iter().position(|c| c.is_default).unwrap_or(0))
    }
}

/// Chooses exactly one package from the platform-compatible candidates.
pub struct PackageSelector<'a> {
    strategy: &'a dyn SelectionStrategy,
}

impl<'a> PackageSelector<'a> {
    /// Creates a selector delegating ambiguous choices to `strategy`.
    #[must_use]
    pub fn new(strategy: &'a dyn SelectionStrategy) -> Self {
        Self { strategy }
    }

    /// Selects one package.
    ///
    /// A single candidate is returned without consulting the strategy.
    ///
    /// # Errors
    ///
    /// - [`GovmError::NoCompatiblePackage`] when `candidates` is empty
    /// - [`GovmError::SelectionFailed`] when the strategy fails or returns an
    ///   index outside the list
    pub fn select(
        &self,
        mut candidates: Vec<PackageDescriptor>,
        version: &str,
        platform: &str,
    ) -> Result<PackageDescriptor, GovmError> {
        match candidates.len() {
            0 => Err(GovmError::no_compatible_package(version, platform)),
            1 => Ok(candidates.remove(0)),
            count => {
                let choices: Vec<Choice<'_>> = candidates
                    .iter()
                    .enumerate()
                    .map(|(i, package)| Choice {
                        package,
                        is_default: i == 0,
                    })
                    .collect();

                let index = self
                    .strategy
                    .choose(&choices)
                    .map_err(|e| GovmError::selection_failed(e.to_string()))?;
                if index >= count {
                    return Err(GovmError::selection_failed(format!(
                        "index {index} out of range for {count} packages"
                    )));
                }

                debug!(index, file = %candidates[index].file_name, "package selected");
                Ok(candidates.swap_remove(index))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn package(name: &str) -> PackageDescriptor {
        PackageDescriptor {
            file_name: name.to_string(),
            url: format!("https://go.dev/dl/{name}"),
            checksum: None,
            checksum_url: None,
            algorithm: "SHA256".to_string(),
        }
    }

    fn three() -> Vec<PackageDescriptor> {
        vec![package("a.tar.gz"), package("b.tar.gz"), package("c.tar.gz")]
    }

    struct Fixed {
        index: usize,
        calls: Cell<usize>,
    }

    impl Fixed {
        fn new(index: usize) -> Self {
            Self {
                index,
                calls: Cell::new(0),
            }
        }
    }

    impl SelectionStrategy for Fixed {
        fn choose(&self, _choices: &[Choice<'_>]) -> Result<usize> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.index)
        }
    }

    struct Cancel;

    impl SelectionStrategy for Cancel {
        fn choose(&self, _choices: &[Choice<'_>]) -> Result<usize> {
            anyhow::bail!("selection cancelled")
        }
    }

    #[test]
    fn empty_candidates_fail_with_no_compatible_package() {
        let strategy = Fixed::new(0);
        let err = PackageSelector::new(&strategy)
            .select(Vec::new(), "1.21.3", "linux-amd64")
            .unwrap_err();

        assert!(matches!(err, GovmError::NoCompatiblePackage { .. }));
        assert_eq!(strategy.calls.get(), 0);
    }

    #[test]
    fn single_candidate_is_selected_without_strategy() {
        let strategy = Fixed::new(5);
        let selected = PackageSelector::new(&strategy)
            .select(vec![package("only.tar.gz")], "1.21.3", "linux-amd64")
            .expect("select");

        assert_eq!(selected.file_name, "only.tar.gz");
        assert_eq!(strategy.calls.get(), 0);
    }

    #[test]
    fn index_zero_selects_first_candidate() {
        let candidates = three();
        let first = candidates[0].clone();
        let strategy = Fixed::new(0);

        let selected = PackageSelector::new(&strategy)
            .select(candidates, "1.4.2", "darwin-amd64")
            .expect("select");

        assert_eq!(selected, first);
        assert_eq!(strategy.calls.get(), 1);
    }

    #[test]
    fn first_candidate_strategy_picks_default() {
        let candidates = three();
        let first = candidates[0].clone();

        let selected = PackageSelector::new(&FirstCandidate)
            .select(candidates, "1.4.2", "darwin-amd64")
            .expect("select");

        assert_eq!(selected, first);
    }

    #[test]
    fn strategy_sees_first_entry_flagged_default() {
        struct Inspect;
        impl SelectionStrategy for Inspect {
            fn choose(&self, choices: &[Choice<'_>]) -> Result<usize> {
                let defaults: Vec<bool> = choices.iter().map(|c| c.is_default).collect();
                assert_eq!(defaults, vec![true, false, false]);
                Ok(2)
            }
        }

        let selected = PackageSelector::new(&Inspect)
            .select(three(), "1.4.2", "darwin-amd64")
            .expect("select");
        assert_eq!(selected.file_name, "c.tar.gz");
    }

    #[test]
    fn out_of_range_index_fails() {
        let strategy = Fixed::new(3);
        let err = PackageSelector::new(&strategy)
            .select(three(), "1.4.2", "darwin-amd64")
            .unwrap_err();
        assert!(matches!(err, GovmError::SelectionFailed { .. }));
    }

    #[test]
    fn strategy_error_becomes_selection_failed() {
        let err = PackageSelector::new(&Cancel)
            .select(three(), "1.4.2", "darwin-amd64")
            .unwrap_err();
        assert!(err.to_string().contains("selection cancelled"));
    }
}

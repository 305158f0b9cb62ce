//! Environment-driven settings for govm.
//!
//! ## Environment Variables
//!
//! - `GOVM_HOME`: root directory for versions, downloads and the active link
//! - `GOVM_MIRROR`: comma-separated list of download mirrors, tried in order
//! - `GOVM_NONINTERACTIVE`: when set (any value), never prompt; scripted
//!   defaults are used for package selection and unverified packages are refused

use std::io::IsTerminal;
use std::path::PathBuf;

/// Environment variable overriding the root directory.
pub const HOME_ENV: &str = "GOVM_HOME";

/// Environment variable holding the mirror list.
pub const MIRROR_ENV: &str = "GOVM_MIRROR";

/// Separator between entries of [`MIRROR_ENV`].
pub const MIRROR_SEP: char = ',';

/// Environment variable forcing non-interactive mode.
pub const NONINTERACTIVE_ENV: &str = "GOVM_NONINTERACTIVE";

/// Mirror used when [`MIRROR_ENV`] is unset or empty.
pub const DEFAULT_MIRROR: &str = "https://go.dev/dl/";

/// Settings consumed by the commands before the install pipeline starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Explicit root directory, if `GOVM_HOME` is set.
    pub home: Option<PathBuf>,
    /// Catalog mirrors in priority order. Never empty.
    pub mirrors: Vec<String>,
    /// Whether interactive prompts may be shown.
    pub interactive: bool,
}

impl Settings {
    /// Reads settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let home = std::env::var_os(HOME_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let mirrors = parse_mirrors(std::env::var(MIRROR_ENV).ok().as_deref());
        let interactive = std::env::var_os(NONINTERACTIVE_ENV).is_none()
            && std::io::stdin().is_terminal()
            && std::io::stdout().is_terminal();

        Self {
            home,
            mirrors,
            interactive,
        }
    }
}

/// Splits a mirror list, dropping blank entries and normalising each base URL
/// to end with `/`. Falls back to [`DEFAULT_MIRROR`] when nothing usable remains.
#[must_use]
pub fn parse_mirrors(raw: Option<&str>) -> Vec<String> {
    let mirrors: Vec<String> = raw
        .unwrap_or_default()
        .split(MIRROR_SEP)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            if m.ends_with('/') {
                m.to_string()
            } else {
                format!("{m}/")
            }
        })
        .collect();

    if mirrors.is_empty() {
        vec![DEFAULT_MIRROR.to_string()]
    } else {
        mirrors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn parse_mirrors_defaults_when_unset() {
        assert_eq!(parse_mirrors(None), vec![DEFAULT_MIRROR.to_string()]);
        assert_eq!(parse_mirrors(Some("")), vec![DEFAULT_MIRROR.to_string()]);
        assert_eq!(parse_mirrors(Some(" , ,")), vec![DEFAULT_MIRROR.to_string()]);
    }

    #[test]
    fn parse_mirrors_keeps_order_and_adds_trailing_slash() {
        let mirrors = parse_mirrors(Some("https://golang.google.cn/dl, https://go.dev/dl/"));
        assert_eq!(
            mirrors,
            vec![
                "https://golang.google.cn/dl/".to_string(),
                "https://go.dev/dl/".to_string(),
            ]
        );
    }

    #[test]
    #[serial]
    fn from_env_reads_home_and_mirrors() {
        // SAFETY: serialized with other env-mutating tests and restored below.
        unsafe {
            std::env::set_var(HOME_ENV, "/opt/govm");
            std::env::set_var(MIRROR_ENV, "http://mirror.local/go");
            std::env::set_var(NONINTERACTIVE_ENV, "1");
        }

        let settings = Settings::from_env();

        unsafe {
            std::env::remove_var(HOME_ENV);
            std::env::remove_var(MIRROR_ENV);
            std::env::remove_var(NONINTERACTIVE_ENV);
        }

        assert_eq!(settings.home, Some(PathBuf::from("/opt/govm")));
        assert_eq!(settings.mirrors, vec!["http://mirror.local/go/".to_string()]);
        assert!(!settings.interactive);
    }

    #[test]
    #[serial]
    fn from_env_ignores_empty_home() {
        // SAFETY: serialized with other env-mutating tests and restored below.
        unsafe {
            std::env::set_var(HOME_ENV, "");
        }

        let settings = Settings::from_env();

        unsafe {
            std::env::remove_var(HOME_ENV);
        }

        assert_eq!(settings.home, None);
    }
}

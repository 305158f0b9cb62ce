//! Interactive terminal prompts.
//!
//! [`TerminalPicker`] backs both interactive decisions of the install
//! workflow: choosing among several packages and confirming an install that
//! cannot be verified. It is only used when stdin and stdout are terminals.

mod menu;
mod terminal;
mod theme;

use anyhow::{Result, bail};
use crossterm::event::{self, Event, KeyEventKind};

use crate::toolchain::acquire::UnverifiedConsent;
use crate::toolchain::catalog::PackageDescriptor;
use crate::toolchain::select::{Choice, SelectionStrategy};
use menu::{KeyOutcome, MenuState};
use terminal::InlineTerminal;
use theme::Theme;

const SELECT_PROMPT: &str = "Please select the package you want to install.";
const UNVERIFIED_PROMPT: &str = "Checksum file not found, do you want to continue?";
const YES: &str = "yes";
const NO: &str = "no";

/// Keyboard-driven menu drawn inline in the terminal.
#[derive(Debug, Clone)]
pub struct TerminalPicker {
    theme: Theme,
}

impl Default for TerminalPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalPicker {
    /// Creates a picker with the detected color theme.
    #[must_use]
    pub fn new() -> Self {
        Self {
            theme: Theme::detect(),
        }
    }

    /// Shows `items` under `title` and returns the confirmed index.
    fn pick(&self, title: &str, items: Vec<String>, default: usize) -> Result<usize> {
        let mut state = MenuState::new(items, default);
        let mut guard = InlineTerminal::new(state.height())?;

        loop {
            guard
                .terminal
                .draw(|frame| menu::render(frame, frame.area(), &self.theme, title, &state))?;

            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                match state.handle_key(key.code, key.modifiers) {
                    KeyOutcome::Continue => {}
                    KeyOutcome::Select(index) => return Ok(index),
                    KeyOutcome::Cancel => bail!("selection cancelled"),
                }
            }
        }
    }
}

impl SelectionStrategy for TerminalPicker {
    fn choose(&self, choices: &[Choice<'_>]) -> Result<usize> {
        let default = choices.iter().position(|c| c.is_default).unwrap_or(0);
        let items = choices
            .iter()
            .map(|c| c.package.file_name.clone())
            .collect();
        let index = self.pick(SELECT_PROMPT, items, default)?;
        println!("{SELECT_PROMPT} {}", choices[index].package.file_name);
        Ok(index)
    }
}

impl UnverifiedConsent for TerminalPicker {
    fn confirm_unverified(&self, package: &PackageDescriptor) -> Result<bool> {
        let index = self.pick(
            &format!("{UNVERIFIED_PROMPT} ({})", package.file_name),
            vec![YES.to_string(), NO.to_string()],
            1,
        )?;
        let answer = if index == 0 { YES } else { NO };
        println!("{UNVERIFIED_PROMPT} {answer}");
        Ok(index == 0)
    }
}

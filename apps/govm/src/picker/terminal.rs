//! Inline terminal setup and cleanup for the picker.
//!
//! The menu is drawn in an inline viewport below the cursor so earlier
//! command output stays on screen. Raw mode is restored on drop, even when
//! the picker exits through an error.

use std::io::{self, Stdout};

use anyhow::{Context, Result};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, TerminalOptions, Viewport, backend::CrosstermBackend};

/// Terminal backend used by the picker.
pub type PickerTerminal = Terminal<CrosstermBackend<Stdout>>;

/// RAII guard for an inline viewport in raw mode.
pub struct InlineTerminal {
    /// The ratatui terminal instance.
    pub terminal: PickerTerminal,
}

impl InlineTerminal {
    /// Enables raw mode and reserves `height` rows below the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode cannot be enabled or the viewport cannot
    /// be created (e.g. stdout is not a terminal).
    pub fn new(height: u16) -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;

        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::with_options(
            backend,
            TerminalOptions {
                viewport: Viewport::Inline(height),
            },
        );

        match terminal {
            Ok(terminal) => Ok(Self { terminal }),
            Err(e) => {
                let _ = disable_raw_mode();
                Err(e).context("failed to create terminal")
            }
        }
    }
}

impl Drop for InlineTerminal {
    fn drop(&mut self) {
        let _ = self.terminal.clear();
        let _ = disable_raw_mode();
    }
}

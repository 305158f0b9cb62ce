//! Single-choice menu state and rendering.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::theme::Theme;

/// What a key press did to the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Keep waiting for input.
    Continue,
    /// The user confirmed the item at this index.
    Select(usize),
    /// The user backed out.
    Cancel,
}

/// Menu state for keyboard navigation.
#[derive(Debug, Clone)]
pub struct MenuState {
    items: Vec<String>,
    default: usize,
    selected: usize,
}

impl MenuState {
    /// Creates a menu with the cursor on `default` (clamped to the list).
    #[must_use]
    pub fn new(items: Vec<String>, default: usize) -> Self {
        let default = default.min(items.len().saturating_sub(1));
        Self {
            items,
            default,
            selected: default,
        }
    }

    /// Rows needed to draw the menu: items plus border and key hint.
    #[must_use]
    pub fn height(&self) -> u16 {
        u16::try_from(self.items.len()).unwrap_or(u16::MAX).saturating_add(3)
    }

    /// Moves selection up (wraps around).
    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        if self.selected == 0 {
            self.selected = self.items.len() - 1;
        } else {
            self.selected -= 1;
        }
    }

    /// Moves selection down (wraps around).
    pub fn next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1) % self.items.len();
        }
    }

    /// Applies one key press.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> KeyOutcome {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return KeyOutcome::Cancel;
        }
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => self.next(),
            KeyCode::Enter if !self.items.is_empty() => return KeyOutcome::Select(self.selected),
            KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Cancel,
            KeyCode::Char(c) => {
                // Digits jump straight to an item, 1-based.
                if let Some(index) = c.to_digit(10).and_then(|d| (d as usize).checked_sub(1))
                    && index < self.items.len()
                {
                    self.selected = index;
                }
            }
            _ => {}
        }
        KeyOutcome::Continue
    }
}

/// Renders the menu with `title` as the prompt.
pub fn render(frame: &mut Frame, area: Rect, theme: &Theme, title: &str, state: &MenuState) {
    let mut lines: Vec<Line> = state
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let is_selected = idx == state.selected;
            let prefix = if is_selected { "> " } else { "  " };
            let style = if is_selected {
                Style::default()
                    .fg(theme.selected)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text)
            };

            let mut spans = vec![
                Span::styled(prefix, style),
                Span::styled(format!("{}) ", idx + 1), Style::default().fg(theme.muted)),
                Span::styled(item.as_str(), style),
            ];
            if idx == state.default {
                spans.push(Span::styled(" (default)", Style::default().fg(theme.muted)));
            }
            Line::from(spans)
        })
        .collect();

    lines.push(Line::from(vec![
        Span::styled("[Up/Down] ", Style::default().fg(theme.highlight)),
        Span::styled("Navigate", Style::default().fg(theme.muted)),
        Span::raw("  "),
        Span::styled("[Enter] ", Style::default().fg(theme.highlight)),
        Span::styled("Confirm", Style::default().fg(theme.muted)),
        Span::raw("  "),
        Span::styled("[Esc] ", Style::default().fg(theme.highlight)),
        Span::styled("Cancel", Style::default().fg(theme.muted)),
    ]));

    let widget = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(
                format!(" {title} "),
                Style::default().fg(theme.highlight),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );

    frame.render_widget(widget, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn menu(default: usize) -> MenuState {
        MenuState::new(
            vec![
                "go1.4.2.darwin-amd64-osx10.6.tar.gz".to_string(),
                "go1.4.2.darwin-amd64-osx10.8.tar.gz".to_string(),
                "go1.4.2.darwin-amd64.tar.gz".to_string(),
            ],
            default,
        )
    }

    fn press(state: &mut MenuState, code: KeyCode) -> KeyOutcome {
        state.handle_key(code, KeyModifiers::NONE)
    }

    #[test]
    fn cursor_starts_on_default() {
        assert_eq!(menu(0).selected, 0);
        assert_eq!(menu(2).selected, 2);
        assert_eq!(menu(9).selected, 2);
    }

    #[test]
    fn previous_wraps_from_zero() {
        let mut state = menu(0);
        state.previous();
        assert_eq!(state.selected, 2);
    }

    #[test]
    fn next_wraps_at_end() {
        let mut state = menu(0);
        for _ in 0..3 {
            state.next();
        }
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn enter_selects_cursor_row() {
        let mut state = menu(0);
        assert_eq!(press(&mut state, KeyCode::Down), KeyOutcome::Continue);
        assert_eq!(press(&mut state, KeyCode::Enter), KeyOutcome::Select(1));
    }

    #[test]
    fn digit_jumps_to_item() {
        let mut state = menu(0);
        press(&mut state, KeyCode::Char('3'));
        assert_eq!(state.selected, 2);
        press(&mut state, KeyCode::Char('7'));
        assert_eq!(state.selected, 2);
        press(&mut state, KeyCode::Char('0'));
        assert_eq!(state.selected, 2);
    }

    #[test]
    fn escape_and_ctrl_c_cancel() {
        let mut state = menu(0);
        assert_eq!(press(&mut state, KeyCode::Esc), KeyOutcome::Cancel);
        assert_eq!(
            state.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            KeyOutcome::Cancel
        );
    }

    #[test]
    fn empty_menu_never_selects() {
        let mut state = MenuState::new(Vec::new(), 0);
        state.next();
        state.previous();
        assert_eq!(press(&mut state, KeyCode::Enter), KeyOutcome::Continue);
    }

    #[test]
    fn height_counts_border_and_hint() {
        assert_eq!(menu(0).height(), 6);
    }

    #[test]
    fn render_shows_items_and_default_marker() {
        let state = menu(1);
        let mut terminal = Terminal::new(TestBackend::new(80, 6)).expect("Should create terminal");

        terminal
            .draw(|frame| {
                render(
                    frame,
                    frame.area(),
                    &Theme::dark(),
                    "Please select the package you want to install.",
                    &state,
                );
            })
            .expect("Should render");

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Please select the package"));
        assert!(text.contains("> 2) go1.4.2.darwin-amd64-osx10.8.tar.gz (default)"));
        assert!(text.contains("[Enter] Confirm"));
    }
}

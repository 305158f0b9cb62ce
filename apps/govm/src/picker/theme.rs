//! Colors for the picker.
//!
//! Dark by default; a light palette is chosen when `COLORFGBG` reports a
//! light background.

use ratatui::style::Color;

/// Picker color palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Key hints and the prompt title.
    pub highlight: Color,
    /// The row under the cursor.
    pub selected: Color,
    /// Borders.
    pub border: Color,
    /// Secondary text such as the default marker.
    pub muted: Color,
    /// Regular rows.
    pub text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Palette for dark terminal backgrounds.
    #[must_use]
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            selected: Color::LightBlue,
            border: Color::DarkGray,
            muted: Color::DarkGray,
            text: Color::White,
        }
    }

    /// Palette for light terminal backgrounds.
    #[must_use]
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            selected: Color::DarkGray,
            border: Color::Gray,
            muted: Color::Gray,
            text: Color::Black,
        }
    }

    /// Picks a palette from `COLORFGBG`, falling back to dark.
    #[must_use]
    pub fn detect() -> Self {
        std::env::var("COLORFGBG")
            .ok()
            .and_then(|value| from_colorfgbg(&value))
            .unwrap_or_else(Self::dark)
    }
}

/// Parses `foreground;background[;...]`. ANSI backgrounds 7 and 8-15 are light.
fn from_colorfgbg(value: &str) -> Option<Theme> {
    let background: u8 = value.split(';').nth(1)?.trim().parse().ok()?;
    if background >= 8 || background == 7 {
        Some(Theme::light())
    } else {
        Some(Theme::dark())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_dark() {
        assert_eq!(Theme::default(), Theme::dark());
    }

    #[test]
    fn colorfgbg_dark_background() {
        assert_eq!(from_colorfgbg("15;0"), Some(Theme::dark()));
        assert_eq!(from_colorfgbg("7;4"), Some(Theme::dark()));
        assert_eq!(from_colorfgbg("15;0;extra"), Some(Theme::dark()));
    }

    #[test]
    fn colorfgbg_light_background() {
        assert_eq!(from_colorfgbg("0;7"), Some(Theme::light()));
        assert_eq!(from_colorfgbg("0;15"), Some(Theme::light()));
    }

    #[test]
    fn colorfgbg_invalid_format() {
        assert_eq!(from_colorfgbg(""), None);
        assert_eq!(from_colorfgbg("15"), None);
        assert_eq!(from_colorfgbg("default;default"), None);
    }
}

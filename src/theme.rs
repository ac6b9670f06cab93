//! Theme and styling for the TUI
//!
//! The palette lives in [`Colors`]. A [`Theme`] is a plain struct of styles
//! resolved once from the configured theme name and handed to the renderer,
//! so no styling state is global.

use crate::app::batch::Outcome;
use ratatui::style::{Color, Modifier, Style};
use tracing::warn;

/// Core color palette
pub struct Colors;

impl Colors {
    pub const BG_PRIMARY: Color = Color::Rgb(20, 20, 30);
    pub const BG_DANGER: Color = Color::Rgb(30, 20, 20);
    pub const FG_PRIMARY: Color = Color::White;
    pub const FG_SECONDARY: Color = Color::Gray;
    pub const FG_MUTED: Color = Color::DarkGray;

    /// Borders, titles, highlights
    pub const PRIMARY: Color = Color::Cyan;
    /// Selected rows, emphasis
    pub const SECONDARY: Color = Color::Yellow;
    /// Status badge background
    pub const ACCENT: Color = Color::Rgb(125, 86, 244);

    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;
    pub const INFO: Color = Color::Blue;

    pub const SELECTED_FG: Color = Color::Black;
    pub const SELECTED_BG: Color = Color::Yellow;
}

/// UI dimension constants
pub struct UiConstants;

impl UiConstants {
    /// Rows moved by PgUp/PgDn
    pub const PAGE_SCROLL_SIZE: usize = 10;
    /// Batch log lines shown on the finished screen
    pub const LOG_TAIL: usize = 12;
    pub const HEADER_HEIGHT: u16 = 3;
    pub const NAV_BAR_HEIGHT: u16 = 1;
}

/// Styles used by every screen, resolved from a theme name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: String,
    pub title: Style,
    pub badge: Style,
    pub text: Style,
    pub muted: Style,
    pub border: Style,
    pub cursor: Style,
    pub checked: Style,
    pub installed: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    pub nav_hint: Style,
    pub danger_panel: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::colored()
    }
}

impl Theme {
    /// Names accepted in the `theme` config key
    pub const NAMES: [&'static str; 2] = ["default", "mono"];

    /// Resolve a theme by name; unknown names fall back to `default`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" | "" => Self::colored(),
            "mono" => Self::mono(),
            other => {
                warn!("Unknown theme '{}', using default", other);
                Self::colored()
            }
        }
    }

    fn colored() -> Self {
        Self {
            name: "default".to_string(),
            title: Style::default()
                .fg(Colors::FG_PRIMARY)
                .bg(Colors::ACCENT)
                .add_modifier(Modifier::BOLD),
            badge: Style::default().fg(Colors::FG_PRIMARY).bg(Color::Rgb(242, 93, 148)),
            text: Style::default().fg(Colors::FG_PRIMARY),
            muted: Style::default().fg(Colors::FG_MUTED),
            border: Style::default().fg(Colors::PRIMARY),
            cursor: Style::default()
                .fg(Colors::SELECTED_FG)
                .bg(Colors::SELECTED_BG)
                .add_modifier(Modifier::BOLD),
            checked: Style::default()
                .fg(Colors::SECONDARY)
                .add_modifier(Modifier::BOLD),
            installed: Style::default().fg(Colors::SUCCESS),
            success: Style::default().fg(Colors::SUCCESS),
            warning: Style::default().fg(Colors::WARNING),
            error: Style::default().fg(Colors::ERROR),
            info: Style::default().fg(Colors::INFO),
            nav_hint: Style::default().fg(Colors::FG_SECONDARY),
            danger_panel: Style::default().bg(Colors::BG_DANGER),
        }
    }

    fn mono() -> Self {
        let plain = Style::default();
        Self {
            name: "mono".to_string(),
            title: plain.add_modifier(Modifier::BOLD | Modifier::REVERSED),
            badge: plain.add_modifier(Modifier::REVERSED),
            text: plain,
            muted: plain.add_modifier(Modifier::DIM),
            border: plain,
            cursor: plain.add_modifier(Modifier::REVERSED),
            checked: plain.add_modifier(Modifier::BOLD),
            installed: plain,
            success: plain.add_modifier(Modifier::BOLD),
            warning: plain.add_modifier(Modifier::UNDERLINED),
            error: plain.add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            info: plain,
            nav_hint: plain.add_modifier(Modifier::DIM),
            danger_panel: plain,
        }
    }

    /// Style for a manifest risk level; unknown levels render as plain text
    pub fn risk_style(&self, level: &str) -> Style {
        match level {
            "SAFE" => self.success,
            "RISKY" => self.warning,
            "DANGER" => self.error,
            _ => self.muted,
        }
    }

    /// Style for a batch log tag
    pub fn outcome_style(&self, outcome: Outcome) -> Style {
        match outcome {
            Outcome::DryRun => self.info,
            Outcome::Skip => self.warning,
            Outcome::Fail => self.error,
            Outcome::Success => self.success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_resolves_known_themes() {
        assert_eq!(Theme::from_name("default").name, "default");
        assert_eq!(Theme::from_name("MONO").name, "mono");
        for name in Theme::NAMES {
            assert_eq!(Theme::from_name(name).name, name);
        }
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        assert_eq!(Theme::from_name("solarized"), Theme::default());
    }

    #[test]
    fn test_risk_styles_differ() {
        let theme = Theme::default();
        assert_ne!(theme.risk_style("SAFE"), theme.risk_style("DANGER"));
        assert_eq!(theme.risk_style("whatever"), theme.muted);
    }

    #[test]
    fn test_outcome_styles() {
        let theme = Theme::default();
        assert_eq!(theme.outcome_style(Outcome::Fail), theme.error);
        assert_eq!(theme.outcome_style(Outcome::Success), theme.success);
    }
}

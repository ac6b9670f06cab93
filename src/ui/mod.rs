//! User interface rendering module
//!
//! - `header` - title bar, status line and navigation bar
//! - `screens` - one screen per workflow mode

mod header;
pub mod screens;

use crate::app::{AppMode, AppState};
use crate::components::help_overlay::HelpOverlay;
use crate::components::keybindings::KeybindingContext;
use crate::theme::{Theme, UiConstants};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

/// UI renderer for the application. Holds the theme resolved at startup.
pub struct UiRenderer {
    theme: Theme,
}

impl Default for UiRenderer {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl UiRenderer {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    /// Render the complete UI for the current state
    pub fn render(&self, f: &mut Frame, state: &AppState, keybinding_ctx: &KeybindingContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(UiConstants::HEADER_HEIGHT),
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(UiConstants::NAV_BAR_HEIGHT),
            ])
            .split(f.area());

        header::render_header(f, chunks[0], state, &self.theme);

        let content_area = chunks[1];
        match state.mode {
            AppMode::Listing | AppMode::Searching => {
                screens::render_package_list(f, content_area, state, &self.theme)
            }
            AppMode::Confirming => screens::render_confirm(f, content_area, state, &self.theme),
            AppMode::Executing => screens::render_progress(f, content_area, state, &self.theme),
            AppMode::Finished => screens::render_finished(f, content_area, state, &self.theme),
        }

        header::render_status(f, chunks[2], state, &self.theme);
        header::render_nav_bar(f, chunks[3], state, keybinding_ctx, &self.theme);

        // Help sits on top of everything
        if state.help_visible {
            HelpOverlay::new(state.mode, keybinding_ctx, &self.theme).render(
                f,
                f.area(),
                &self.theme,
            );
        }
    }
}

//! Help overlay component
//!
//! Draws the context-sensitive key reference in a centered floating window.

use super::keybindings::{HelpSection, KeybindingContext};
use crate::app::AppMode;
use crate::theme::Theme;
use ratatui::{
    Frame,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

const WIDTH_PERCENT: u16 = 60;
const HEIGHT_PERCENT: u16 = 70;
const MIN_WIDTH: u16 = 44;
const MIN_HEIGHT: u16 = 15;
const MAX_WIDTH: u16 = 72;
const MAX_HEIGHT: u16 = 34;

/// Help overlay component
pub struct HelpOverlay {
    content: Vec<Line<'static>>,
}

impl HelpOverlay {
    pub fn new(mode: AppMode, keybinding_ctx: &KeybindingContext, theme: &Theme) -> Self {
        let sections = keybinding_ctx.get_help_content(mode);
        Self {
            content: Self::build_content(&sections, mode, theme),
        }
    }

    fn build_content(sections: &[HelpSection], mode: AppMode, theme: &Theme) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = vec![
            Line::from(Span::styled(
                "  adb-cleaner help  ",
                theme.border.add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Current: ", theme.muted),
                Span::styled(mode.to_string(), theme.checked),
            ]),
            Line::from(""),
        ];

        for section in sections {
            lines.push(Line::from(Span::styled(
                format!("  {}  ", section.title),
                theme.success.add_modifier(Modifier::BOLD),
            )));
            for (key, description) in &section.items {
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(
                        format!("{:<10}", key),
                        theme.border.add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(description.clone(), theme.text),
                ]));
            }
            lines.push(Line::from(""));
        }
        lines
    }

    /// Number of content lines
    pub fn line_count(&self) -> usize {
        self.content.len()
    }

    pub fn render(&self, f: &mut Frame, parent: Rect, theme: &Theme) {
        let area = floating_rect(parent);
        f.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border)
            .title(" Help ")
            .title_bottom(Line::from(" Press ? or Esc to close ").centered());
        let paragraph = Paragraph::new(self.content.clone())
            .block(block)
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }
}

/// Centered rect sized by percentage and clamped to the window limits
fn floating_rect(parent: Rect) -> Rect {
    let width = percent_of(parent.width, WIDTH_PERCENT)
        .clamp(MIN_WIDTH, MAX_WIDTH)
        .min(parent.width);
    let height = percent_of(parent.height, HEIGHT_PERCENT)
        .clamp(MIN_HEIGHT, MAX_HEIGHT)
        .min(parent.height);
    Rect::new(
        parent.x + (parent.width - width) / 2,
        parent.y + (parent.height - height) / 2,
        width,
        height,
    )
}

fn percent_of(value: u16, percent: u16) -> u16 {
    // Widen so huge terminals cannot overflow
    (u32::from(value) * u32::from(percent) / 100) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floating_rect_is_centered_and_clamped() {
        let rect = floating_rect(Rect::new(0, 0, 200, 60));
        assert_eq!(rect.width, MAX_WIDTH);
        assert_eq!(rect.height, MAX_HEIGHT);
        assert_eq!(rect.x, (200 - MAX_WIDTH) / 2);

        let tiny = floating_rect(Rect::new(0, 0, 20, 8));
        assert_eq!((tiny.width, tiny.height), (20, 8));
    }

    #[test]
    fn test_floating_rect_on_very_large_terminal() {
        // 1200 * 60 does not fit in a u16
        let rect = floating_rect(Rect::new(0, 0, 1200, 50));
        assert_eq!((rect.width, rect.height), (MAX_WIDTH, MAX_HEIGHT));
        assert_eq!(rect.x, (1200 - MAX_WIDTH) / 2);
    }

    #[test]
    fn test_content_lists_mode_bindings() {
        let overlay = HelpOverlay::new(
            AppMode::Confirming,
            &KeybindingContext::new(),
            &Theme::default(),
        );
        let text: String = overlay
            .content
            .iter()
            .flat_map(|l| l.spans.iter().map(|s| s.content.to_string()))
            .collect();
        assert!(text.contains("Toggle simulate"));
        assert!(text.contains("Confirming"));
        assert!(overlay.line_count() > 4);
    }
}

//! Header, status line and navigation bar

use crate::app::AppState;
use crate::components::keybindings::KeybindingContext;
use crate::theme::Theme;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

const TITLE: &str = " adb-cleaner ";

/// Render the title bar: tool name, device, Android version and selection badge
pub fn render_header(f: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let badge = format!(
        " Selected {}/{} ",
        state.selected_count,
        state.catalog.count_total()
    );
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(TITLE.len() as u16),
            Constraint::Min(1),
            Constraint::Length(badge.len() as u16),
        ])
        .split(inner);

    f.render_widget(Paragraph::new(Span::styled(TITLE, theme.title)), chunks[0]);
    f.render_widget(
        Paragraph::new(device_line(state, theme)).alignment(Alignment::Center),
        chunks[1],
    );
    f.render_widget(
        Paragraph::new(Span::styled(badge, theme.badge)).alignment(Alignment::Right),
        chunks[2],
    );
}

fn device_line<'a>(state: &'a AppState, theme: &Theme) -> Line<'a> {
    let device = &state.device;
    let name = match (device.manufacturer.is_empty(), device.model.is_empty()) {
        (true, true) => device.id.clone(),
        (false, true) => device.manufacturer.clone(),
        (true, false) => device.model.clone(),
        (false, false) => format!("{} {}", device.manufacturer, device.model),
    };

    let mut spans = vec![Span::styled(name, theme.text)];
    if !device.android_version.is_empty() {
        spans.push(Span::styled(
            format!("  Android {}", device.android_version),
            theme.muted,
        ));
    }
    spans.push(Span::styled(format!("  user {}", device.user_id), theme.muted));
    if state.simulate_only {
        spans.push(Span::styled("  SIMULATE", theme.warning));
    }
    Line::from(spans)
}

/// Render the one-line status message
pub fn render_status(f: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let status = Paragraph::new(Span::styled(state.status_message.as_str(), theme.info));
    f.render_widget(status, area);
}

/// Render the navigation bar
pub fn render_nav_bar(
    f: &mut Frame,
    area: Rect,
    state: &AppState,
    keybinding_ctx: &KeybindingContext,
    theme: &Theme,
) {
    let mut spans = Vec::new();
    for item in keybinding_ctx.get_nav_items(state.mode) {
        if !spans.is_empty() {
            spans.push(Span::styled(" | ", theme.muted));
        }
        spans.push(Span::styled(item.key_display, theme.checked));
        spans.push(Span::styled(format!(" {}", item.action_label), theme.nav_hint));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

//! Screens for each workflow mode.
//!
//! - `Listing` / `Searching` - the filterable package list with a details pane
//! - `Confirming` - selection summary, simulate banner
//! - `Executing` - progress gauge and live batch log
//! - `Finished` - counters and the tail of the log

use crate::app::{AppMode, AppState, LogLine};
use crate::catalog::Package;
use crate::theme::{Theme, UiConstants};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
};

/// Selected names shown on the confirm screen before truncating
const CONFIRM_PREVIEW: usize = 8;

// ============================================================================
// Listing / Searching
// ============================================================================

/// Render the package list. In `Searching` a query bar sits above the list.
pub fn render_package_list(f: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let searching = state.mode == AppMode::Searching;
    let show_query = searching || !state.search_query.is_empty();

    let mut constraints = Vec::with_capacity(3);
    if show_query {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(3));
    constraints.push(Constraint::Length(4));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let (list_area, details_area) = if show_query {
        render_search_bar(f, chunks[0], state, theme, searching);
        (chunks[1], chunks[2])
    } else {
        (chunks[0], chunks[1])
    };

    if state.view.is_empty() {
        let message = if state.catalog.count_total() == 0 {
            "  The manifest has no packages."
        } else {
            "  No packages match the current filter."
        };
        let empty = Paragraph::new(Span::styled(message, theme.warning))
            .block(list_block(state, theme));
        f.render_widget(empty, list_area);
    } else {
        let items: Vec<ListItem> = state
            .visible_packages()
            .map(|(_, package)| package_item(package, theme))
            .collect();
        let list = List::new(items)
            .block(list_block(state, theme))
            .highlight_style(theme.cursor)
            .highlight_symbol("> ");

        let mut list_state = ListState::default();
        list_state.select(Some(state.cursor));
        f.render_stateful_widget(list, list_area, &mut list_state);
    }

    render_details(f, details_area, state.cursor_package(), theme);
}

fn render_search_bar(f: &mut Frame, area: Rect, state: &AppState, theme: &Theme, active: bool) {
    let cursor = if active { "_" } else { "" };
    let bar = Paragraph::new(Line::from(vec![
        Span::styled("Search: ", theme.muted),
        Span::styled(format!("{}{}", state.search_query, cursor), theme.text),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(if active { theme.checked } else { theme.border }),
    );
    f.render_widget(bar, area);
}

fn list_block<'a>(state: &AppState, theme: &Theme) -> Block<'a> {
    let mut title = format!(" Packages {}/{} ", state.view.len(), state.catalog.count_total());
    if let Some(category) = &state.category_filter {
        title.push_str(&format!("[{}] ", category));
    }
    if let Some(risk) = &state.risk_filter {
        title.push_str(&format!("[{}] ", risk));
    }
    Block::default()
        .borders(Borders::ALL)
        .border_style(if state.is_filtered() { theme.checked } else { theme.border })
        .title(title)
}

fn package_item<'a>(package: &'a Package, theme: &Theme) -> ListItem<'a> {
    let check = if package.selected { "[x] " } else { "[ ] " };
    let mut spans = vec![
        Span::styled(
            check,
            if package.selected { theme.checked } else { theme.muted },
        ),
        Span::styled(
            package.name.as_str(),
            if package.installed { theme.installed } else { theme.text },
        ),
    ];
    if !package.risk_level.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            package.risk_level.as_str(),
            theme.risk_style(&package.risk_level),
        ));
    }
    if !package.category.is_empty() {
        spans.push(Span::styled(format!("  {}", package.category), theme.muted));
    }
    if !package.installed {
        spans.push(Span::styled("  (not installed)", theme.muted));
    }
    ListItem::new(Line::from(spans))
}

fn render_details(f: &mut Frame, area: Rect, package: Option<&Package>, theme: &Theme) {
    let lines = match package {
        Some(package) => {
            let description = if package.description.is_empty() {
                "No description"
            } else {
                package.description.as_str()
            };
            vec![
                Line::from(Span::styled(
                    package.name.as_str(),
                    theme.text.add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(description, theme.text)),
            ]
        }
        None => vec![Line::from(Span::styled("Nothing selected", theme.muted))],
    };
    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(" Details "),
        );
    f.render_widget(details, area);
}

// ============================================================================
// Confirming
// ============================================================================

pub fn render_confirm(f: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let mut lines = Vec::new();
    if state.simulate_only {
        lines.push(Line::from(Span::styled(
            "  SIMULATE ONLY: no package will be removed  ",
            theme.warning.add_modifier(Modifier::BOLD | Modifier::REVERSED),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "  WARNING: selected packages will be uninstalled for this user  ",
            theme.error.add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Selected packages: ", theme.muted),
        Span::styled(
            state.selected_count.to_string(),
            theme.checked,
        ),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Target user: ", theme.muted),
        Span::styled(state.device.user_id.as_str(), theme.text),
    ]));
    lines.push(Line::from(""));

    let selected = state.catalog.selected();
    for package in selected.iter().take(CONFIRM_PREVIEW) {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(package.name.as_str(), theme.text),
            Span::raw("  "),
            Span::styled(
                package.risk_level.as_str(),
                theme.risk_style(&package.risk_level),
            ),
        ]));
    }
    if selected.len() > CONFIRM_PREVIEW {
        lines.push(Line::from(Span::styled(
            format!("  ... and {} more", selected.len() - CONFIRM_PREVIEW),
            theme.muted,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" [Enter] ", theme.checked),
        Span::raw("Start  "),
        Span::styled(" [Tab] ", theme.checked),
        Span::raw("Toggle simulate  "),
        Span::styled(" [Esc] ", theme.checked),
        Span::raw("Back"),
    ]));

    let panel_style = if state.simulate_only {
        theme.text
    } else {
        theme.danger_panel
    };
    let confirm = Paragraph::new(lines)
        .style(panel_style)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(" Confirm "),
        );
    f.render_widget(confirm, area);
}

// ============================================================================
// Executing / Finished
// ============================================================================

pub fn render_progress(f: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let done = state.log.len();
    let total = state.batch_total;
    let ratio = if total == 0 {
        1.0
    } else {
        (done as f64 / total as f64).clamp(0.0, 1.0)
    };
    let title = if state.simulate_only {
        " Uninstalling (simulate) "
    } else {
        " Uninstalling "
    };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(title),
        )
        .gauge_style(theme.info)
        .ratio(ratio)
        .label(format!("{}/{}", done, total));
    f.render_widget(gauge, chunks[0]);

    render_log(f, chunks[1], &state.log, theme, usize::MAX);
}

pub fn render_finished(f: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(3)])
        .split(area);

    let summary = state.summary.unwrap_or_default();
    let lines = vec![
        Line::from(Span::styled(
            "Batch complete",
            theme.text.add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(format!("Success: {}  ", summary.success), theme.success),
            Span::styled(format!("Failed: {}  ", summary.failed), theme.error),
            Span::styled(format!("Skipped: {}", summary.skipped), theme.warning),
        ]),
        Line::from(""),
        Line::from(Span::styled("Press Enter to exit", theme.muted)),
    ];
    let panel = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border)
            .title(" Summary "),
    );
    f.render_widget(panel, chunks[0]);

    render_log(f, chunks[1], &state.log, theme, UiConstants::LOG_TAIL);
}

/// Render the last lines of the batch log, at most `limit` and no more than fit
fn render_log(f: &mut Frame, area: Rect, log: &[LogLine], theme: &Theme, limit: usize) {
    let visible = (area.height.saturating_sub(2) as usize).min(limit);
    let start = log.len().saturating_sub(visible);
    let lines: Vec<Line> = log[start..]
        .iter()
        .map(|line| log_line(line, theme))
        .collect();

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border)
            .title(" Log "),
    );
    f.render_widget(widget, area);
}

fn log_line<'a>(line: &'a LogLine, theme: &Theme) -> Line<'a> {
    let mut spans = vec![
        Span::styled(
            format!("[{}]", line.outcome),
            theme.outcome_style(line.outcome),
        ),
        Span::raw(" "),
        Span::styled(line.package.as_str(), theme.text),
    ];
    if let Some(detail) = &line.detail {
        spans.push(Span::styled(format!(": {}", detail), theme.muted));
    }
    Line::from(spans)
}

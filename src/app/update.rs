//! Pure state transitions.
//!
//! [`update`] applies one [`Message`] to the state and returns the side
//! effect the driver should perform. It never touches the terminal, the
//! file system or the device.

use super::batch::{BatchSummary, LogLine};
use super::state::{AppMode, AppState};
use crate::components::keybindings::KeyAction;
use crate::theme::UiConstants;
use std::path::PathBuf;
use tracing::debug;

const SAFE_LEVEL: &str = "SAFE";

/// Input to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Action(KeyAction),
    /// No input arrived within the poll interval
    Tick,
    BatchProgress(LogLine),
    BatchFinished(BatchSummary),
    BackupSaved(PathBuf),
    BackupRestored { path: PathBuf, matched: usize },
    BackupFailed(String),
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    StartBatch,
    SaveBackup,
    RestoreBackup,
    Quit,
}

pub fn update(state: &mut AppState, message: Message) -> Effect {
    match message {
        Message::Action(action) => handle_action(state, action),
        Message::Tick => Effect::None,
        Message::BatchProgress(line) => {
            state.log.push(line);
            Effect::None
        }
        Message::BatchFinished(summary) => {
            state.summary = Some(summary);
            state.mode = AppMode::Finished;
            state.status_message = format!(
                "Done: {} succeeded, {} failed, {} skipped",
                summary.success, summary.failed, summary.skipped
            );
            Effect::None
        }
        Message::BackupSaved(path) => {
            state.status_message = format!("Backup saved to {}", path.display());
            Effect::None
        }
        Message::BackupRestored { path, matched } => {
            state.refresh_counts();
            state.status_message =
                format!("Restored {} selections from {}", matched, path.display());
            Effect::None
        }
        Message::BackupFailed(reason) => {
            state.status_message = format!("Backup failed: {}", reason);
            Effect::None
        }
    }
}

fn handle_action(state: &mut AppState, action: KeyAction) -> Effect {
    if action == KeyAction::Quit {
        return Effect::Quit;
    }
    if state.mode == AppMode::Executing {
        return Effect::None;
    }
    if state.help_visible {
        if matches!(action, KeyAction::Help | KeyAction::Cancel) {
            state.help_visible = false;
        }
        return Effect::None;
    }

    match state.mode {
        AppMode::Listing => handle_listing(state, action),
        AppMode::Searching => handle_searching(state, action),
        AppMode::Confirming => handle_confirming(state, action),
        AppMode::Finished => match action {
            KeyAction::Confirm => Effect::Quit,
            KeyAction::Help => {
                state.help_visible = true;
                Effect::None
            }
            _ => Effect::None,
        },
        AppMode::Executing => Effect::None,
    }
}

fn handle_listing(state: &mut AppState, action: KeyAction) -> Effect {
    match action {
        KeyAction::NavigateUp
        | KeyAction::NavigateDown
        | KeyAction::PageUp
        | KeyAction::PageDown
        | KeyAction::Home
        | KeyAction::End => navigate(state, action),
        KeyAction::Toggle => {
            if let Some(index) = state.cursor_index() {
                state.catalog.toggle(index);
                state.refresh_counts();
            }
        }
        KeyAction::SelectAll => {
            state.catalog.select_all();
            after_bulk(state, "Selected all packages");
        }
        KeyAction::DeselectAll => {
            state.catalog.deselect_all();
            after_bulk(state, "Cleared selection");
        }
        KeyAction::SelectInstalled => {
            state.catalog.select_installed();
            after_bulk(state, "Selected installed packages");
        }
        KeyAction::SelectSafe => {
            state.catalog.select_by_risk_level(SAFE_LEVEL);
            after_bulk(state, "Selected SAFE packages");
        }
        KeyAction::Search => {
            state.mode = AppMode::Searching;
            state.status_message = "Type to search, Esc when done".to_string();
        }
        KeyAction::CycleCategory => {
            let values = state.catalog.distinct_categories();
            state.category_filter = next_filter(&values, state.category_filter.as_deref());
            state.refresh_view();
            state.status_message = filter_status("Category", state.category_filter.as_deref());
        }
        KeyAction::CycleRisk => {
            let values = state.catalog.distinct_risk_levels();
            state.risk_filter = next_filter(&values, state.risk_filter.as_deref());
            state.refresh_view();
            state.status_message = filter_status("Risk level", state.risk_filter.as_deref());
        }
        KeyAction::SaveBackup => return Effect::SaveBackup,
        KeyAction::RestoreBackup => return Effect::RestoreBackup,
        KeyAction::Confirm => {
            state.mode = AppMode::Confirming;
        }
        KeyAction::Help => state.help_visible = true,
        _ => {}
    }
    Effect::None
}

fn handle_searching(state: &mut AppState, action: KeyAction) -> Effect {
    match action {
        KeyAction::Input(c) => {
            state.search_query.push(c);
            state.cursor = 0;
            state.refresh_view();
        }
        KeyAction::DeleteChar => {
            state.search_query.pop();
            state.cursor = 0;
            state.refresh_view();
        }
        KeyAction::NavigateUp | KeyAction::NavigateDown => navigate(state, action),
        KeyAction::Cancel | KeyAction::Confirm => {
            state.mode = AppMode::Listing;
            state.status_message = format!("{} matching packages", state.view.len());
        }
        _ => {}
    }
    Effect::None
}

fn handle_confirming(state: &mut AppState, action: KeyAction) -> Effect {
    match action {
        KeyAction::ToggleSimulate => {
            state.simulate_only = !state.simulate_only;
            debug!("Simulate only: {}", state.simulate_only);
            Effect::None
        }
        KeyAction::Confirm => {
            state.mode = AppMode::Executing;
            state.log.clear();
            state.summary = None;
            state.batch_total = state.selected_count;
            state.status_message = format!("Processing {} packages", state.batch_total);
            Effect::StartBatch
        }
        KeyAction::Cancel => {
            state.mode = AppMode::Listing;
            Effect::None
        }
        KeyAction::Help => {
            state.help_visible = true;
            Effect::None
        }
        _ => Effect::None,
    }
}

fn navigate(state: &mut AppState, action: KeyAction) {
    let last = state.view.len().saturating_sub(1);
    let page = UiConstants::PAGE_SCROLL_SIZE;
    state.cursor = match action {
        KeyAction::NavigateUp => state.cursor.saturating_sub(1),
        KeyAction::NavigateDown => (state.cursor + 1).min(last),
        KeyAction::PageUp => state.cursor.saturating_sub(page),
        KeyAction::PageDown => (state.cursor + page).min(last),
        KeyAction::Home => 0,
        KeyAction::End => last,
        _ => state.cursor,
    };
}

fn after_bulk(state: &mut AppState, message: &str) {
    state.refresh_view();
    state.refresh_counts();
    state.status_message = format!("{} ({} selected)", message, state.selected_count);
}

/// Next value in `values` after `current`; past the end wraps to no filter
fn next_filter(values: &[String], current: Option<&str>) -> Option<String> {
    match current {
        None => values.first().cloned(),
        Some(current) => values
            .iter()
            .position(|v| v == current)
            .and_then(|i| values.get(i + 1))
            .cloned(),
    }
}

fn filter_status(label: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("{} filter: {}", label, value),
        None => format!("{} filter cleared", label),
    }
}

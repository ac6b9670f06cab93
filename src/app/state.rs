//! Application state definitions
//!
//! `AppState` is everything the renderer needs and everything `update`
//! mutates. It owns the catalog; the driver owns the device bridge.

use super::batch::{BatchSummary, LogLine};
use crate::adb::Device;
use crate::catalog::{Catalog, Package};
use strum::Display;

/// Workflow modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
pub enum AppMode {
    /// Browsing and selecting packages
    #[default]
    Listing,
    /// Typing a search query
    Searching,
    /// Reviewing the selection before the batch starts
    Confirming,
    /// Batch in progress, no input is read
    Executing,
    /// Batch done, showing the summary
    Finished,
}

/// Main application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub mode: AppMode,
    pub catalog: Catalog,
    pub device: Device,
    /// Catalog indices currently displayed
    pub view: Vec<usize>,
    /// Position inside `view`
    pub cursor: usize,
    pub search_query: String,
    pub category_filter: Option<String>,
    pub risk_filter: Option<String>,
    /// Session-wide dry-run flag, flipped from the confirm screen
    pub simulate_only: bool,
    pub selected_count: usize,
    /// Live batch log
    pub log: Vec<LogLine>,
    /// Packages in the running batch
    pub batch_total: usize,
    pub summary: Option<BatchSummary>,
    pub status_message: String,
    pub help_visible: bool,
}

impl AppState {
    pub fn new(catalog: Catalog, device: Device, simulate_only: bool) -> Self {
        let mut state = Self {
            mode: AppMode::Listing,
            catalog,
            device,
            view: Vec::new(),
            cursor: 0,
            search_query: String::new(),
            category_filter: None,
            risk_filter: None,
            simulate_only,
            selected_count: 0,
            log: Vec::new(),
            batch_total: 0,
            summary: None,
            status_message: String::new(),
            help_visible: false,
        };
        state.refresh_view();
        state.refresh_counts();
        state.status_message = format!(
            "{} packages loaded, {} installed",
            state.catalog.count_total(),
            state.catalog.count_installed()
        );
        state
    }

    /// Recompute the view from the query and filters, clamping the cursor
    pub fn refresh_view(&mut self) {
        self.view = self.catalog.filter_indices(
            &self.search_query,
            self.category_filter.as_deref(),
            self.risk_filter.as_deref(),
        );
        self.clamp_cursor();
    }

    pub fn refresh_counts(&mut self) {
        self.selected_count = self.catalog.count_selected();
    }

    pub fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.view.len().saturating_sub(1));
    }

    /// Catalog index under the cursor
    pub fn cursor_index(&self) -> Option<usize> {
        self.view.get(self.cursor).copied()
    }

    pub fn cursor_package(&self) -> Option<&Package> {
        self.cursor_index().and_then(|i| self.catalog.get(i))
    }

    /// Packages in the current view, in view order
    pub fn visible_packages(&self) -> impl Iterator<Item = (usize, &Package)> {
        self.view
            .iter()
            .filter_map(move |&i| self.catalog.get(i).map(|p| (i, p)))
    }

    /// Whether a filter narrows the list
    pub fn is_filtered(&self) -> bool {
        !self.search_query.is_empty() || self.category_filter.is_some() || self.risk_filter.is_some()
    }
}

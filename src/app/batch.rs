//! Sequential uninstall batch.
//!
//! A [`BatchRun`] snapshots the selected packages when it is created and
//! processes them one [`BatchRun::step`] at a time, so the driver loop can
//! repaint between packages. Per-package errors are folded into the
//! counters; nothing here aborts the batch.

use crate::adb::DeviceBridge;
use crate::catalog::Catalog;
use std::fmt;
use strum::{Display, EnumString};
use tracing::{info, warn};

/// Outcome tag of one batch step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Outcome {
    #[strum(serialize = "DRY-RUN")]
    DryRun,
    #[strum(serialize = "SKIP")]
    Skip,
    #[strum(serialize = "FAIL")]
    Fail,
    #[strum(serialize = "SUCCESS")]
    Success,
}

/// Human-readable record of one processed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub outcome: Outcome,
    pub package: String,
    pub detail: Option<String>,
}

impl LogLine {
    fn new(outcome: Outcome, package: &str) -> Self {
        Self {
            outcome,
            package: package.to_string(),
            detail: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.outcome, self.package)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

/// Final counters of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.success + self.failed + self.skipped
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::DryRun | Outcome::Success => self.success += 1,
            Outcome::Skip => self.skipped += 1,
            Outcome::Fail => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone)]
struct BatchItem {
    name: String,
    installed: bool,
}

/// An in-progress batch over a snapshot of the selection
#[derive(Debug, Clone)]
pub struct BatchRun {
    items: Vec<BatchItem>,
    position: usize,
    simulate_only: bool,
    user_id: String,
    summary: BatchSummary,
}

impl BatchRun {
    /// Snapshot the selected packages of `catalog` in catalog order
    pub fn new(catalog: &Catalog, simulate_only: bool, user_id: impl Into<String>) -> Self {
        let items = catalog
            .selected()
            .into_iter()
            .map(|p| BatchItem {
                name: p.name.clone(),
                installed: p.installed,
            })
            .collect::<Vec<_>>();
        info!(
            "Starting batch of {} package(s){}",
            items.len(),
            if simulate_only { " (simulate only)" } else { "" }
        );
        Self {
            items,
            position: 0,
            simulate_only,
            user_id: user_id.into(),
            summary: BatchSummary::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Packages processed so far
    pub fn completed(&self) -> usize {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.position >= self.items.len()
    }

    pub fn summary(&self) -> BatchSummary {
        self.summary
    }

    /// Process the next package. Returns `None` once every package is done.
    pub fn step(&mut self, bridge: &dyn DeviceBridge) -> Option<LogLine> {
        let item = self.items.get(self.position)?;
        self.position += 1;

        let line = process_item(item, bridge, self.simulate_only, &self.user_id);
        self.summary.record(line.outcome);
        match line.outcome {
            Outcome::Fail => warn!("{}", line),
            _ => info!("{}", line),
        }
        Some(line)
    }
}

fn process_item(
    item: &BatchItem,
    bridge: &dyn DeviceBridge,
    simulate_only: bool,
    user_id: &str,
) -> LogLine {
    if simulate_only {
        return LogLine::new(Outcome::DryRun, &item.name);
    }
    if !item.installed {
        return LogLine::new(Outcome::Skip, &item.name).with_detail("not installed");
    }

    // The device may have changed since the last refresh
    match bridge.is_installed(&item.name) {
        Ok(true) => {}
        Ok(false) => {
            return LogLine::new(Outcome::Skip, &item.name).with_detail("no longer installed");
        }
        Err(e) => return LogLine::new(Outcome::Skip, &item.name).with_detail(e.to_string()),
    }

    match bridge.uninstall(&item.name, user_id) {
        Ok(true) => LogLine::new(Outcome::Success, &item.name),
        Ok(false) => LogLine::new(Outcome::Fail, &item.name).with_detail("device reported failure"),
        Err(e) => LogLine::new(Outcome::Fail, &item.name).with_detail(e.to_string()),
    }
}

/// Run a whole batch to completion, collecting every log line
pub fn run_batch(
    catalog: &Catalog,
    bridge: &dyn DeviceBridge,
    simulate_only: bool,
    user_id: &str,
) -> (BatchSummary, Vec<LogLine>) {
    let mut run = BatchRun::new(catalog, simulate_only, user_id);
    let mut lines = Vec::with_capacity(run.len());
    while let Some(line) = run.step(bridge) {
        lines.push(line);
    }
    (run.summary(), lines)
}

//! Application module
//!
//! # Module Structure
//! - `state` - `AppState` and `AppMode`
//! - `update` - the pure transition function and its `Message`/`Effect` types
//! - `batch` - the sequential uninstall executor
//! - Main module - `App`, the driver loop that owns the terminal and the device

pub mod batch;
mod state;
mod update;

pub use batch::{BatchRun, BatchSummary, LogLine, Outcome, run_batch};
pub use state::{AppMode, AppState};
pub use update::{Effect, Message, update};

use crate::adb::DeviceBridge;
use crate::catalog::Catalog;
use crate::components::keybindings::KeybindingContext;
use crate::config::AppConfig;
use crate::error::{CleanerError, Result};
use crate::theme::Theme;
use crate::ui::UiRenderer;
use crossterm::event::{Event, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::Backend};
use std::time::Duration;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Main application struct
pub struct App<B: DeviceBridge> {
    state: AppState,
    bridge: B,
    config: AppConfig,
    ui_renderer: UiRenderer,
    keybinding_context: KeybindingContext,
    /// Batch being stepped while in `Executing`
    batch: Option<BatchRun>,
}

impl<B: DeviceBridge> App<B> {
    pub fn new(state: AppState, bridge: B, config: AppConfig) -> Self {
        let theme = Theme::from_name(&config.theme);
        Self {
            state,
            bridge,
            config,
            ui_renderer: UiRenderer::new(theme),
            keybinding_context: KeybindingContext::new(),
            batch: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn is_batch_running(&self) -> bool {
        self.batch.is_some()
    }

    /// Run the main application loop until the session ends
    pub fn run<T: Backend>(&mut self, terminal: &mut Terminal<T>) -> Result<()> {
        info!("Starting main application loop");

        loop {
            terminal
                .draw(|f| {
                    self.ui_renderer
                        .render(f, &self.state, &self.keybinding_context)
                })
                .map_err(|e| CleanerError::terminal(format!("draw failed: {}", e)))?;

            let quit = if self.batch.is_some() {
                // Only a quit key is honoured between packages
                self.step_batch();
                self.read_input(Duration::ZERO)?.unwrap_or(false)
            } else {
                match self.read_input(POLL_INTERVAL)? {
                    Some(quit) => quit,
                    None => self.dispatch(Message::Tick),
                }
            };

            if quit {
                info!("Session ended in {} mode", self.state.mode);
                return Ok(());
            }
        }
    }

    /// Wait up to `timeout` for one terminal event and handle it.
    /// `None` when nothing arrived, otherwise whether the session should end.
    fn read_input(&mut self, timeout: Duration) -> Result<Option<bool>> {
        let ready = crossterm::event::poll(timeout)
            .map_err(|e| CleanerError::terminal(format!("poll failed: {}", e)))?;
        if !ready {
            return Ok(None);
        }
        let event = crossterm::event::read()
            .map_err(|e| CleanerError::terminal(format!("read failed: {}", e)))?;
        Ok(Some(match event {
            Event::Key(key) => self.handle_key_event(key),
            _ => false,
        }))
    }

    /// Resolve and apply one key event. Returns true when the session should end.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        match self.keybinding_context.resolve(self.state.mode, &key) {
            Some(action) => {
                debug!("Key {:?} -> {:?} in {}", key.code, action, self.state.mode);
                self.dispatch(Message::Action(action))
            }
            None => false,
        }
    }

    /// Feed a message through `update` and perform the resulting effect.
    /// Returns true on `Effect::Quit`.
    pub fn dispatch(&mut self, message: Message) -> bool {
        let effect = update(&mut self.state, message);
        self.apply_effect(effect)
    }

    fn apply_effect(&mut self, effect: Effect) -> bool {
        match effect {
            Effect::None => false,
            Effect::Quit => {
                if let Some(run) = &self.batch {
                    warn!(
                        "Quit during batch after {} of {} packages",
                        run.completed(),
                        run.len()
                    );
                }
                true
            }
            Effect::StartBatch => {
                self.batch = Some(BatchRun::new(
                    &self.state.catalog,
                    self.state.simulate_only,
                    self.config.user_id.clone(),
                ));
                false
            }
            Effect::SaveBackup => {
                let message = match self.state.catalog.save_backup(&self.config.backup_dir) {
                    Ok(path) => Message::BackupSaved(path),
                    Err(e) => {
                        warn!("Backup save failed: {}", e);
                        Message::BackupFailed(e.to_string())
                    }
                };
                self.dispatch(message)
            }
            Effect::RestoreBackup => {
                let message = self.restore_latest_backup();
                self.dispatch(message)
            }
        }
    }

    fn restore_latest_backup(&mut self) -> Message {
        let latest = match Catalog::latest_backup(&self.config.backup_dir) {
            Ok(Some(path)) => path,
            Ok(None) => {
                return Message::BackupFailed(format!(
                    "no backups in {}",
                    self.config.backup_dir.display()
                ));
            }
            Err(e) => return Message::BackupFailed(e.to_string()),
        };
        match self.state.catalog.load_backup(&latest) {
            Ok(matched) => Message::BackupRestored {
                path: latest,
                matched,
            },
            Err(e) => {
                warn!("Backup restore failed: {}", e);
                Message::BackupFailed(e.to_string())
            }
        }
    }

    /// Process one package of the running batch
    pub fn step_batch(&mut self) {
        let Some(run) = self.batch.as_mut() else {
            return;
        };
        match run.step(&self.bridge) {
            Some(line) => {
                self.dispatch(Message::BatchProgress(line));
            }
            None => {
                let summary = run.summary();
                self.batch = None;
                info!(
                    "Batch finished: {} succeeded, {} failed, {} skipped",
                    summary.success, summary.failed, summary.skipped
                );
                self.dispatch(Message::BatchFinished(summary));
            }
        }
    }

    /// Consume the app, returning the final state
    pub fn into_state(self) -> AppState {
        self.state
    }
}

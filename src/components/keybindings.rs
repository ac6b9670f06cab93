//! Keybinding system for context-aware keyboard shortcuts
//!
//! Maps raw key events to [`KeyAction`]s based on the current workflow mode
//! and supplies the nav bar and help overlay with display text.

use crate::app::AppMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Actions that can be triggered by keybindings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    NavigateUp,
    NavigateDown,
    PageUp,
    PageDown,
    Home,
    End,
    Toggle,
    SelectAll,
    DeselectAll,
    SelectInstalled,
    SelectSafe,
    Search,
    CycleCategory,
    CycleRisk,
    SaveBackup,
    RestoreBackup,
    ToggleSimulate,
    Confirm,
    Cancel,
    Help,
    Quit,
    /// Character typed into the search query
    Input(char),
    DeleteChar,
}

/// A keybinding definition
#[derive(Debug, Clone)]
pub struct Keybinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    pub action: KeyAction,
    pub display: String,
    pub description: String,
}

impl Keybinding {
    /// Create a new keybinding with no modifiers
    pub fn new(key: KeyCode, action: KeyAction, display: &str, description: &str) -> Self {
        Self::with_modifiers(key, KeyModifiers::NONE, action, display, description)
    }

    pub fn with_modifiers(
        key: KeyCode,
        modifiers: KeyModifiers,
        action: KeyAction,
        display: &str,
        description: &str,
    ) -> Self {
        Self {
            key,
            modifiers,
            action,
            display: display.to_string(),
            description: description.to_string(),
        }
    }

    fn matches(&self, event: &KeyEvent) -> bool {
        // Shift is implied by the character itself ('?' on most layouts)
        let modifiers = event.modifiers.difference(KeyModifiers::SHIFT);
        self.key == event.code && self.modifiers == modifiers
    }
}

/// Context-aware keybinding registry
pub struct KeybindingContext {
    mode_bindings: HashMap<AppMode, Vec<Keybinding>>,
    /// Available in every mode that reads input, except while searching
    global_bindings: Vec<Keybinding>,
    interrupt: Keybinding,
}

impl Default for KeybindingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl KeybindingContext {
    pub fn new() -> Self {
        let mut ctx = Self {
            mode_bindings: HashMap::new(),
            global_bindings: Vec::new(),
            interrupt: Keybinding::with_modifiers(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL,
                KeyAction::Quit,
                "Ctrl+C",
                "Quit",
            ),
        };
        ctx.register_defaults();
        ctx
    }

    fn register_defaults(&mut self) {
        self.global_bindings = vec![
            Keybinding::new(KeyCode::Char('?'), KeyAction::Help, "?", "Help"),
            Keybinding::new(KeyCode::Char('q'), KeyAction::Quit, "Q", "Quit"),
        ];

        self.mode_bindings.insert(
            AppMode::Listing,
            vec![
                Keybinding::new(KeyCode::Up, KeyAction::NavigateUp, "Up", "Move up"),
                Keybinding::new(KeyCode::Down, KeyAction::NavigateDown, "Down", "Move down"),
                Keybinding::new(KeyCode::PageUp, KeyAction::PageUp, "PgUp", "Page up"),
                Keybinding::new(KeyCode::PageDown, KeyAction::PageDown, "PgDn", "Page down"),
                Keybinding::new(KeyCode::Home, KeyAction::Home, "Home", "Go to first"),
                Keybinding::new(KeyCode::End, KeyAction::End, "End", "Go to last"),
                Keybinding::new(KeyCode::Char(' '), KeyAction::Toggle, "Space", "Toggle package"),
                Keybinding::new(KeyCode::F(1), KeyAction::SelectAll, "F1", "Select all"),
                Keybinding::new(KeyCode::F(2), KeyAction::DeselectAll, "F2", "Select none"),
                Keybinding::new(KeyCode::F(3), KeyAction::SelectInstalled, "F3", "Select installed"),
                Keybinding::new(KeyCode::F(4), KeyAction::SelectSafe, "F4", "Select SAFE"),
                Keybinding::new(KeyCode::F(5), KeyAction::Search, "F5", "Search"),
                Keybinding::new(KeyCode::Char('/'), KeyAction::Search, "/", "Search"),
                Keybinding::new(KeyCode::Char('c'), KeyAction::CycleCategory, "C", "Cycle category"),
                Keybinding::new(KeyCode::Char('r'), KeyAction::CycleRisk, "R", "Cycle risk level"),
                Keybinding::new(KeyCode::Char('b'), KeyAction::SaveBackup, "B", "Save backup"),
                Keybinding::new(KeyCode::Char('l'), KeyAction::RestoreBackup, "L", "Load last backup"),
                Keybinding::new(KeyCode::Enter, KeyAction::Confirm, "Enter", "Uninstall selected"),
                Keybinding::new(KeyCode::Esc, KeyAction::Cancel, "Esc", "Close help"),
            ],
        );

        self.mode_bindings.insert(
            AppMode::Searching,
            vec![
                Keybinding::new(KeyCode::Up, KeyAction::NavigateUp, "Up", "Move up"),
                Keybinding::new(KeyCode::Down, KeyAction::NavigateDown, "Down", "Move down"),
                Keybinding::new(KeyCode::Backspace, KeyAction::DeleteChar, "Bksp", "Delete character"),
                Keybinding::new(KeyCode::Esc, KeyAction::Cancel, "Esc", "Done"),
                Keybinding::new(KeyCode::Enter, KeyAction::Confirm, "Enter", "Done"),
            ],
        );

        self.mode_bindings.insert(
            AppMode::Confirming,
            vec![
                Keybinding::new(KeyCode::Tab, KeyAction::ToggleSimulate, "Tab", "Toggle simulate"),
                Keybinding::new(KeyCode::Enter, KeyAction::Confirm, "Enter", "Start"),
                Keybinding::new(KeyCode::Esc, KeyAction::Cancel, "Esc", "Back"),
            ],
        );

        // The batch cannot be paused; quitting ends the session after the current package
        self.mode_bindings.insert(
            AppMode::Executing,
            vec![Keybinding::new(KeyCode::Char('q'), KeyAction::Quit, "Q", "Quit")],
        );

        self.mode_bindings.insert(
            AppMode::Finished,
            vec![Keybinding::new(KeyCode::Enter, KeyAction::Confirm, "Enter", "Exit")],
        );
    }

    /// Whether `q` and `?` apply in `mode`
    fn uses_globals(mode: AppMode) -> bool {
        !matches!(mode, AppMode::Searching | AppMode::Executing)
    }

    /// Get keybindings for a specific mode (includes global bindings)
    pub fn get_bindings(&self, mode: AppMode) -> Vec<&Keybinding> {
        let mut bindings: Vec<&Keybinding> = Vec::new();
        if let Some(mode_bindings) = self.mode_bindings.get(&mode) {
            bindings.extend(mode_bindings.iter());
        }
        if Self::uses_globals(mode) {
            bindings.extend(self.global_bindings.iter());
        }
        bindings.push(&self.interrupt);
        bindings
    }

    /// Translate a key event into an action for `mode`
    pub fn resolve(&self, mode: AppMode, event: &KeyEvent) -> Option<KeyAction> {
        if self.interrupt.matches(event) {
            return Some(KeyAction::Quit);
        }

        if mode == AppMode::Searching {
            if let KeyCode::Char(c) = event.code {
                if !event.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
                    return Some(KeyAction::Input(c));
                }
            }
        }

        self.get_bindings(mode)
            .into_iter()
            .find(|b| b.matches(event))
            .map(|b| b.action)
    }

    /// Get navigation bar items for display
    pub fn get_nav_items(&self, mode: AppMode) -> Vec<NavBarItem> {
        let bindings = self.get_bindings(mode);

        let priority_actions = match mode {
            AppMode::Listing => vec![
                KeyAction::NavigateUp,
                KeyAction::Toggle,
                KeyAction::SelectAll,
                KeyAction::DeselectAll,
                KeyAction::SelectInstalled,
                KeyAction::SelectSafe,
                KeyAction::Search,
                KeyAction::Confirm,
                KeyAction::Help,
                KeyAction::Quit,
            ],
            AppMode::Searching => vec![
                KeyAction::NavigateUp,
                KeyAction::DeleteChar,
                KeyAction::Cancel,
            ],
            AppMode::Confirming => vec![
                KeyAction::ToggleSimulate,
                KeyAction::Confirm,
                KeyAction::Cancel,
                KeyAction::Quit,
            ],
            AppMode::Executing => vec![KeyAction::Quit],
            AppMode::Finished => vec![KeyAction::Confirm, KeyAction::Quit],
        };

        let mut items: Vec<NavBarItem> = Vec::new();
        for action in priority_actions {
            // Up/Down share one nav bar slot
            if action == KeyAction::NavigateUp {
                items.push(NavBarItem {
                    key_display: "Up/Dn".to_string(),
                    action_label: "Move".to_string(),
                });
                continue;
            }
            if let Some(binding) = bindings.iter().find(|b| b.action == action) {
                items.push(NavBarItem {
                    key_display: binding.display.clone(),
                    action_label: binding.description.clone(),
                });
            }
        }
        items
    }

    /// Get full help content for a mode (for help overlay)
    pub fn get_help_content(&self, mode: AppMode) -> Vec<HelpSection> {
        let groups: [(&str, fn(KeyAction) -> bool); 4] = [
            ("Navigation", |a| {
                matches!(
                    a,
                    KeyAction::NavigateUp
                        | KeyAction::NavigateDown
                        | KeyAction::PageUp
                        | KeyAction::PageDown
                        | KeyAction::Home
                        | KeyAction::End
                )
            }),
            ("Selection", |a| {
                matches!(
                    a,
                    KeyAction::Toggle
                        | KeyAction::SelectAll
                        | KeyAction::DeselectAll
                        | KeyAction::SelectInstalled
                        | KeyAction::SelectSafe
                        | KeyAction::Search
                        | KeyAction::CycleCategory
                        | KeyAction::CycleRisk
                        | KeyAction::DeleteChar
                )
            }),
            ("Actions", |a| {
                matches!(
                    a,
                    KeyAction::SaveBackup
                        | KeyAction::RestoreBackup
                        | KeyAction::ToggleSimulate
                        | KeyAction::Confirm
                        | KeyAction::Cancel
                )
            }),
            ("General", |a| matches!(a, KeyAction::Help | KeyAction::Quit)),
        ];

        let bindings = self.get_bindings(mode);
        groups
            .iter()
            .filter_map(|(title, belongs)| {
                let items: Vec<(String, String)> = bindings
                    .iter()
                    .filter(|b| belongs(b.action))
                    .map(|b| (b.display.clone(), b.description.clone()))
                    .collect();
                (!items.is_empty()).then(|| HelpSection {
                    title: title.to_string(),
                    items,
                })
            })
            .collect()
    }
}

/// Navigation bar item for display
#[derive(Debug, Clone)]
pub struct NavBarItem {
    pub key_display: String,
    pub action_label: String,
}

/// Help section for the help overlay
#[derive(Debug, Clone)]
pub struct HelpSection {
    pub title: String,
    pub items: Vec<(String, String)>,
}

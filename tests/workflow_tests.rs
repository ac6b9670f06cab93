//! Batch execution and driver tests against an in-memory device
//!
//! `FakeDevice` implements `DeviceBridge` and records every call so the
//! tests can assert which packages reached the device.

use adb_cleaner::adb::{Device, DeviceBridge};
use adb_cleaner::app::{App, AppMode, AppState, BatchRun, BatchSummary, Outcome, run_batch};
use adb_cleaner::catalog::Catalog;
use adb_cleaner::config::AppConfig;
use adb_cleaner::error::{CleanerError, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::cell::RefCell;
use std::collections::HashSet;
use tempfile::TempDir;

#[derive(Default)]
struct FakeDevice {
    installed: HashSet<String>,
    /// Uninstall answers `Failure`
    refuses: HashSet<String>,
    /// Uninstall cannot be run at all
    broken: HashSet<String>,
    calls: RefCell<Vec<String>>,
}

impl FakeDevice {
    fn with_installed(names: &[&str]) -> Self {
        Self {
            installed: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl DeviceBridge for FakeDevice {
    fn is_installed(&self, package: &str) -> Result<bool> {
        self.calls.borrow_mut().push(format!("check {}", package));
        Ok(self.installed.contains(package))
    }

    fn uninstall(&self, package: &str, user_id: &str) -> Result<bool> {
        self.calls
            .borrow_mut()
            .push(format!("uninstall {} --user {}", package, user_id));
        if self.broken.contains(package) {
            return Err(CleanerError::device("cannot run adb"));
        }
        Ok(!self.refuses.contains(package))
    }
}

fn installed_catalog(manifest: &str, installed: &[&str]) -> Catalog {
    let mut catalog = Catalog::parse(manifest);
    let set: HashSet<String> = installed.iter().map(|n| n.to_string()).collect();
    catalog.refresh_installed(&set);
    catalog
}

// =============================================================================
// Batch
// =============================================================================

#[test]
fn test_simulate_only_touches_nothing() {
    let mut catalog = installed_catalog("com.foo\n", &["com.foo"]);
    catalog.select_all();
    let device = FakeDevice::with_installed(&["com.foo"]);

    let (summary, lines) = run_batch(&catalog, &device, true, "0");
    assert_eq!(
        summary,
        BatchSummary {
            success: 1,
            failed: 0,
            skipped: 0
        }
    );
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].to_string(), "[DRY-RUN] com.foo");
    assert!(device.calls().is_empty());
}

#[test]
fn test_not_installed_is_skipped_without_device_calls() {
    let mut catalog = installed_catalog("com.bar\n", &[]);
    catalog.select_all();
    let device = FakeDevice::default();

    let (summary, lines) = run_batch(&catalog, &device, false, "0");
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.total(), 1);
    assert_eq!(lines[0].outcome, Outcome::Skip);
    assert!(device.calls().is_empty());
}

#[test]
fn test_removed_since_refresh_is_skipped() {
    let mut catalog = installed_catalog("com.gone\n", &["com.gone"]);
    catalog.select_all();
    let device = FakeDevice::default();

    let (summary, lines) = run_batch(&catalog, &device, false, "0");
    assert_eq!(summary.skipped, 1);
    assert_eq!(lines[0].to_string(), "[SKIP] com.gone: no longer installed");
    assert_eq!(device.calls(), vec!["check com.gone"]);
}

#[test]
fn test_device_refusal_is_failure() {
    let mut catalog = installed_catalog("com.baz\n", &["com.baz"]);
    catalog.select_all();
    let mut device = FakeDevice::with_installed(&["com.baz"]);
    device.refuses.insert("com.baz".to_string());

    let (summary, lines) = run_batch(&catalog, &device, false, "0");
    assert_eq!(summary.failed, 1);
    assert_eq!(lines[0].outcome, Outcome::Fail);
    assert!(lines[0].to_string().starts_with("[FAIL] com.baz"));
}

#[test]
fn test_errors_do_not_abort_batch() {
    let manifest = "a.one\nb.two\nc.three\nd.four\n";
    let mut catalog = installed_catalog(manifest, &["a.one", "b.two", "c.three"]);
    catalog.select_all();
    let mut device = FakeDevice::with_installed(&["a.one", "b.two", "c.three"]);
    device.broken.insert("b.two".to_string());
    device.refuses.insert("c.three".to_string());

    let (summary, lines) = run_batch(&catalog, &device, false, "10");
    assert_eq!(
        summary,
        BatchSummary {
            success: 1,
            failed: 2,
            skipped: 1
        }
    );
    assert_eq!(summary.total(), catalog.count_selected());
    assert_eq!(
        lines[1].to_string(),
        "[FAIL] b.two: Device error: cannot run adb"
    );
    assert!(device.calls().contains(&"uninstall a.one --user 10".to_string()));
    assert!(!device.calls().iter().any(|c| c.contains("d.four")));
}

#[test]
fn test_batch_uses_selection_snapshot_in_catalog_order() {
    let mut catalog = installed_catalog("a.one\nb.two\nc.three\n", &["a.one", "c.three"]);
    catalog.toggle(2);
    catalog.toggle(0);
    let device = FakeDevice::with_installed(&["a.one", "c.three"]);

    let mut run = BatchRun::new(&catalog, false, "0");
    catalog.deselect_all();
    assert_eq!(run.len(), 2);

    let first = run.step(&device).expect("first line");
    assert_eq!(first.package, "a.one");
    assert_eq!(run.completed(), 1);
    let second = run.step(&device).expect("second line");
    assert_eq!(second.package, "c.three");
    assert!(run.step(&device).is_none());
    assert!(run.is_finished());
    assert_eq!(run.summary().success, 2);
}

#[test]
fn test_empty_selection_finishes_immediately() {
    let catalog = installed_catalog("a.one\n", &["a.one"]);
    let device = FakeDevice::default();
    let (summary, lines) = run_batch(&catalog, &device, false, "0");
    assert_eq!(summary, BatchSummary::default());
    assert!(lines.is_empty());
}

// =============================================================================
// Driver
// =============================================================================

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn app_in(dir: &TempDir, catalog: Catalog, device: FakeDevice) -> App<FakeDevice> {
    let config = AppConfig {
        log_dir: dir.path().join("logs"),
        backup_dir: dir.path().join("backups"),
        ..AppConfig::default()
    };
    let device_info = Device {
        id: "emulator-5554".to_string(),
        user_id: config.user_id.clone(),
        ..Device::default()
    };
    App::new(AppState::new(catalog, device_info, false), device, config)
}

#[test]
fn test_full_session_through_keys() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = installed_catalog(
        "com.foo # Foo | Bloat | SAFE\ncom.bar # Bar | Bloat | RISKY\n",
        &["com.foo", "com.bar"],
    );
    let mut app = app_in(&dir, catalog, FakeDevice::with_installed(&["com.foo", "com.bar"]));

    assert!(!app.handle_key_event(key(KeyCode::F(4))));
    assert_eq!(app.state().selected_count, 1);

    app.handle_key_event(key(KeyCode::Enter));
    assert_eq!(app.state().mode, AppMode::Confirming);
    app.handle_key_event(key(KeyCode::Enter));
    assert_eq!(app.state().mode, AppMode::Executing);
    assert!(app.is_batch_running());

    // Only quit keys act while the batch runs
    assert!(!app.handle_key_event(key(KeyCode::Char(' '))));
    assert!(!app.handle_key_event(key(KeyCode::Esc)));
    assert_eq!(app.state().mode, AppMode::Executing);

    while app.is_batch_running() {
        app.step_batch();
    }
    let state = app.state();
    assert_eq!(state.mode, AppMode::Finished);
    assert_eq!(state.log.len(), 1);
    assert_eq!(state.log[0].to_string(), "[SUCCESS] com.foo");
    assert_eq!(state.summary.map(|s| s.success), Some(1));

    assert!(app.handle_key_event(key(KeyCode::Enter)));
}

#[test]
fn test_ctrl_c_quits() {
    let dir = TempDir::new().expect("tempdir");
    let mut app = app_in(&dir, Catalog::parse("a.one\n"), FakeDevice::default());
    app.handle_key_event(key(KeyCode::F(5)));
    assert_eq!(app.state().mode, AppMode::Searching);
    assert!(!app.handle_key_event(key(KeyCode::Char('q'))));
    assert_eq!(app.state().search_query, "q");
    assert!(app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
}

#[test]
fn test_quit_keys_end_a_running_batch() {
    for quit_key in [
        KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        key(KeyCode::Char('q')),
    ] {
        let dir = TempDir::new().expect("tempdir");
        let catalog = installed_catalog("a.one\nb.two\n", &["a.one", "b.two"]);
        let device = FakeDevice::with_installed(&["a.one", "b.two"]);
        let mut app = app_in(&dir, catalog, device);

        app.handle_key_event(key(KeyCode::F(1)));
        app.handle_key_event(key(KeyCode::Enter));
        app.handle_key_event(key(KeyCode::Enter));
        assert_eq!(app.state().mode, AppMode::Executing);
        app.step_batch();

        assert!(app.handle_key_event(quit_key));
        let state = app.into_state();
        assert_eq!(state.mode, AppMode::Executing);
        assert_eq!(state.log.len(), 1);
        assert_eq!(state.summary, None);
    }
}

#[test]
fn test_backup_save_and_restore_through_keys() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = installed_catalog("a.one\nb.two\nc.three\n", &[]);
    let mut app = app_in(&dir, catalog, FakeDevice::default());

    app.handle_key_event(key(KeyCode::Down));
    app.handle_key_event(key(KeyCode::Char(' ')));
    app.handle_key_event(key(KeyCode::Char('b')));
    assert!(app.state().status_message.starts_with("Backup saved to"));
    assert!(
        Catalog::latest_backup(dir.path().join("backups"))
            .expect("list backups")
            .is_some()
    );

    app.handle_key_event(key(KeyCode::F(2)));
    assert_eq!(app.state().selected_count, 0);

    app.handle_key_event(key(KeyCode::Char('l')));
    assert_eq!(app.state().selected_count, 1);
    assert!(app.state().catalog.packages()[1].selected);
    assert!(app.state().status_message.starts_with("Restored 1"));
}

#[test]
fn test_restore_without_backups_reports_failure() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("backups")).expect("mkdir");
    let mut app = app_in(&dir, Catalog::parse("a.one\n"), FakeDevice::default());

    app.handle_key_event(key(KeyCode::Char('l')));
    assert!(app.state().status_message.starts_with("Backup failed: no backups"));
    assert_eq!(app.state().selected_count, 0);
}

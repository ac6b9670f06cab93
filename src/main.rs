//! adb-cleaner - main entry point
//!
//! Startup order: configuration, logging, signal handling, device discovery,
//! manifest, live package state. Any failure before the terminal is taken
//! over is fatal and printed as-is.

use adb_cleaner::adb::{AdbClient, PackageScope};
use adb_cleaner::app::{App, AppMode, AppState};
use adb_cleaner::catalog::Catalog;
use adb_cleaner::cli::Cli;
use adb_cleaner::config::AppConfig;
use adb_cleaner::error::CleanerError;
use adb_cleaner::process_guard::{self, ProcessGuard};
use anyhow::{Context, Result};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::stdout;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "adb-cleaner.log";

/// Log to `<log_dir>/adb-cleaner.log`; the terminal belongs to the TUI.
/// `RUST_LOG` overrides the default `info` filter.
fn init_logging(log_dir: &Path) -> Result<()> {
    let path = log_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| CleanerError::io("open", &path, e))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    if cli.write_config {
        config.save(&cli.config)?;
        println!("Wrote configuration to {}", cli.config.display());
        return Ok(());
    }

    init_logging(&config.log_dir)?;
    info!("adb-cleaner {} starting", env!("CARGO_PKG_VERSION"));

    // adb children are still reaped through the guard's Drop if this fails
    if let Err(e) = process_guard::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }
    let guard = ProcessGuard::new();

    let client = AdbClient::new(config.adb_path.as_str());
    if !client.is_available() {
        return Err(CleanerError::device(format!(
            "adb not found or not working (adbPath = \"{}\")",
            config.adb_path
        ))
        .into());
    }

    let device = client
        .connected_device(&config.user_id)
        .context("Failed to detect an Android device")?;
    info!(
        "Connected to {} {} ({}), Android {}",
        device.manufacturer, device.model, device.id, device.android_version
    );
    let client = client.with_serial(device.id.as_str());

    let mut catalog = Catalog::load(&config.packages_file).with_context(|| {
        format!(
            "Failed to load package list from {}",
            config.packages_file.display()
        )
    })?;

    let installed: HashSet<String> = client
        .list_packages(PackageScope::All)
        .context("Failed to list installed packages")?
        .into_iter()
        .collect();
    debug!("{} packages installed on device", installed.len());
    catalog.refresh_installed(&installed);

    if config.auto_select_safe {
        catalog.select_by_risk_level("SAFE");
        info!("Pre-selected {} SAFE packages", catalog.count_selected());
    }

    let state = AppState::new(catalog, device, cli.dry_run);
    let mut app = App::new(state, client, config);
    let result = run_tui(&mut app);
    let state = app.into_state();
    debug!("{} adb children running at exit", guard.child_count());
    result?;

    print_summary(&state);
    Ok(())
}

/// Take over the terminal, run the app and always restore the terminal
fn run_tui(app: &mut App<AdbClient>) -> Result<()> {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(stdout(), crossterm::terminal::LeaveAlternateScreen);
        default_hook(info);
    }));

    enable_raw_mode().context("Failed to enable raw mode")?;
    crossterm::execute!(stdout(), crossterm::terminal::EnterAlternateScreen)
        .context("Failed to enter alternate screen")?;

    let result = Terminal::new(CrosstermBackend::new(stdout()))
        .context("Failed to create terminal")
        .and_then(|mut terminal| app.run(&mut terminal).map_err(Into::into));

    let _ = disable_raw_mode();
    let _ = crossterm::execute!(stdout(), crossterm::terminal::LeaveAlternateScreen);

    result
}

fn print_summary(state: &AppState) {
    match state.summary {
        Some(summary) => {
            let mode = if state.simulate_only { " (simulated)" } else { "" };
            println!(
                "Done{}: {} succeeded, {} failed, {} skipped",
                mode, summary.success, summary.failed, summary.skipped
            );
        }
        None if state.mode == AppMode::Executing => println!(
            "Interrupted after {} of {} packages; see the log for details.",
            state.log.len(),
            state.batch_total
        ),
        None => println!("No packages were uninstalled."),
    }
}

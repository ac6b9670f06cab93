//! adb-cleaner library
//!
//! Package catalog, selection workflow and adb device bridge behind the
//! `adb-cleaner` terminal interface.

pub mod adb;
pub mod app;
pub mod catalog;
pub mod cli;
pub mod components;
pub mod config;
pub mod error;
pub mod process_guard;
pub mod theme;
pub mod ui;

// Re-export main types for convenience
pub use adb::{AdbClient, Device, DeviceBridge, PackageScope};
pub use app::{App, AppMode, AppState, BatchSummary, Effect, LogLine, Message, Outcome, update};
pub use catalog::{Catalog, Package};
pub use config::AppConfig;
pub use error::{CleanerError, Result};
pub use process_guard::{ChildRegistry, CommandProcessGroup, ProcessGuard};

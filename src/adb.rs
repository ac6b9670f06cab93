//! Device bridge adapter around the `adb` executable.
//!
//! Each method maps to exactly one blocking `adb` invocation, run through
//! [`run_guarded`] so the child lives in its own process group and is
//! cleaned up if the tool is interrupted. Output parsing lives in small pure
//! functions so it can be tested without a device.

use crate::error::{CleanerError, Result};
use crate::process_guard::run_guarded;
use std::collections::HashMap;
use std::process::Command;
use strum::{Display, EnumString};
use tracing::{debug, warn};

const PACKAGE_PREFIX: &str = "package:";

/// Information about the connected device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Device {
    /// adb serial
    pub id: String,
    pub manufacturer: String,
    pub model: String,
    pub android_version: String,
    /// User profile targeted by uninstall calls
    pub user_id: String,
}

/// Which packages `pm list packages` should report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum PackageScope {
    All,
    System,
    ThirdParty,
}

impl PackageScope {
    fn pm_flag(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::System => Some("-s"),
            Self::ThirdParty => Some("-3"),
        }
    }
}

/// Captured result of one adb call
#[derive(Debug, Clone)]
pub struct AdbOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

/// The subset of device operations the uninstall batch depends on
pub trait DeviceBridge {
    /// Whether `package` is currently installed on the device
    fn is_installed(&self, package: &str) -> Result<bool>;

    /// Remove `package` for `user_id`; `Ok(false)` when the device refused
    fn uninstall(&self, package: &str, user_id: &str) -> Result<bool>;
}

/// Client for a single adb executable, optionally pinned to one serial
#[derive(Debug, Clone)]
pub struct AdbClient {
    adb_path: String,
    serial: Option<String>,
}

impl AdbClient {
    pub fn new(adb_path: impl Into<String>) -> Self {
        let adb_path = adb_path.into();
        Self {
            adb_path: if adb_path.is_empty() {
                "adb".to_string()
            } else {
                adb_path
            },
            serial: None,
        }
    }

    /// Target a specific device serial for every later call
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        let serial = serial.into();
        self.serial = (!serial.is_empty()).then_some(serial);
        self
    }

    pub fn adb_path(&self) -> &str {
        &self.adb_path
    }

    fn run(&self, args: &[&str]) -> Result<AdbOutput> {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(serial) = &self.serial {
            cmd.args(["-s", serial]);
        }
        cmd.args(args);
        debug!("Running: {} {}", self.adb_path, args.join(" "));

        let output = run_guarded(&mut cmd).map_err(|e| {
            CleanerError::device(format!("cannot run {}: {}", self.adb_path, e))
        })?;

        Ok(AdbOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        })
    }

    /// Run and require a zero exit status
    fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if output.success {
            Ok(output.stdout)
        } else {
            // adb prints some errors to stdout
            let reason = if output.stderr.trim().is_empty() {
                output.stdout
            } else {
                output.stderr
            };
            Err(CleanerError::device(format!(
                "adb {} failed: {}",
                args.join(" "),
                reason.trim()
            )))
        }
    }

    fn shell(&self, args: &[&str]) -> Result<String> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("shell");
        full.extend_from_slice(args);
        self.run_checked(&full)
    }

    /// `adb version` runs and exits cleanly
    pub fn is_available(&self) -> bool {
        match self.run(&["version"]) {
            Ok(output) => output.success,
            Err(e) => {
                debug!("adb not available: {}", e);
                false
            }
        }
    }

    /// Find the first authorized device and read its identifying properties
    pub fn connected_device(&self, user_id: &str) -> Result<Device> {
        let listing = self.run_checked(&["devices"])?;
        let id = parse_devices(&listing)
            .into_iter()
            .find(|(_, state)| state == "device")
            .map(|(serial, _)| serial)
            .ok_or_else(|| CleanerError::device("no device found or device not authorized"))?;

        let pinned = self.clone().with_serial(id.clone());
        let prop = |key: &str| match pinned.shell(&["getprop", key]) {
            Ok(value) => value.trim().to_string(),
            Err(e) => {
                warn!("getprop {} failed: {}", key, e);
                String::new()
            }
        };

        Ok(Device {
            manufacturer: prop("ro.product.manufacturer"),
            model: prop("ro.product.model"),
            android_version: prop("ro.build.version.release"),
            user_id: user_id.to_string(),
            id,
        })
    }

    /// Installed package names for `scope`
    pub fn list_packages(&self, scope: PackageScope) -> Result<Vec<String>> {
        let mut args = vec!["pm", "list", "packages"];
        if let Some(flag) = scope.pm_flag() {
            args.push(flag);
        }
        let out = self.shell(&args)?;
        Ok(parse_package_list(&out))
    }

    /// `versionName`/`versionCode` as reported by `dumpsys package`
    pub fn package_info(&self, package: &str) -> Result<HashMap<String, String>> {
        let out = self.shell(&["dumpsys", "package", package])?;
        Ok(parse_package_info(&out))
    }
}

impl DeviceBridge for AdbClient {
    fn is_installed(&self, package: &str) -> Result<bool> {
        // pm filters by substring, so look for the exact line
        let out = self.shell(&["pm", "list", "packages", package])?;
        Ok(parse_package_list(&out).iter().any(|p| p == package))
    }

    fn uninstall(&self, package: &str, user_id: &str) -> Result<bool> {
        let output = self.run(&["shell", "pm", "uninstall", "--user", user_id, package])?;
        let combined = format!("{}{}", output.stdout, output.stderr);
        if output.success || combined.contains("Success") {
            return Ok(true);
        }
        if combined.contains("Failure") {
            warn!("Device refused to uninstall {}: {}", package, combined.trim());
            return Ok(false);
        }
        Err(CleanerError::operation(format!(
            "uninstall {} failed: {}",
            package,
            combined.trim()
        )))
    }
}

/// Parse `adb devices` output into `(serial, state)` pairs
pub fn parse_devices(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of devices"))
        .filter(|line| !line.starts_with('*'))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            let state = parts.next()?;
            Some((serial.to_string(), state.to_string()))
        })
        .collect()
}

/// Parse `pm list packages` output, keeping `package:`-prefixed lines only
pub fn parse_package_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix(PACKAGE_PREFIX))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Extract `versionName` and `versionCode` from `dumpsys package` output
pub fn parse_package_info(output: &str) -> HashMap<String, String> {
    let mut info = HashMap::new();
    for line in output.lines() {
        for key in ["versionName", "versionCode"] {
            let marker = format!("{}=", key);
            if let Some(pos) = line.find(&marker) {
                let value = line[pos + marker.len()..]
                    .split_whitespace()
                    .next()
                    .unwrap_or_default();
                info.entry(key.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
    }
    info
}

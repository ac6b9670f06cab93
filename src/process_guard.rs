//! Lifecycle management for adb child processes
//!
//! Every adb invocation is spawned in its own process group with a parent
//! death signal, tracked while it runs, and forgotten once reaped. If the
//! tool is interrupted (SIGINT, SIGTERM, SIGHUP) or the session guard is
//! dropped while a call is in flight, the tracked groups receive SIGTERM
//! and, after a grace period, SIGKILL.

use nix::libc;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::collections::HashMap;
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Grace period between SIGTERM and SIGKILL on shutdown
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

static REGISTRY: OnceLock<Arc<Mutex<ChildRegistry>>> = OnceLock::new();

/// In-flight adb children, keyed by PID (which is also their PGID)
#[derive(Debug, Default)]
pub struct ChildRegistry {
    children: HashMap<u32, String>,
    shut_down: bool,
}

impl ChildRegistry {
    /// Process-wide registry shared by `run_guarded`, the guard and the
    /// signal watcher
    pub fn global() -> Arc<Mutex<ChildRegistry>> {
        Arc::clone(REGISTRY.get_or_init(|| Arc::new(Mutex::new(ChildRegistry::default()))))
    }

    pub fn register(&mut self, pid: u32, label: impl Into<String>) {
        let label = label.into();
        debug!("Tracking PID {} ({})", pid, label);
        self.children.insert(pid, label);
    }

    pub fn unregister(&mut self, pid: u32) {
        if self.children.remove(&pid).is_some() {
            debug!("Released PID {}", pid);
        }
    }

    pub fn count(&self) -> usize {
        self.children.len()
    }

    /// Terminate every tracked process group.
    ///
    /// SIGTERM first, then SIGKILL for groups still alive when `grace`
    /// runs out. Only the first call does anything.
    pub fn shutdown(&mut self, grace: Duration) {
        if std::mem::replace(&mut self.shut_down, true) || self.children.is_empty() {
            return;
        }

        info!("Stopping {} running adb call(s)", self.children.len());
        for (&pid, label) in &self.children {
            debug!("SIGTERM -> group {} ({})", pid, label);
            signal_group(pid, Signal::SIGTERM);
        }

        let deadline = Instant::now() + grace;
        let mut remaining: Vec<u32> = self.children.keys().copied().collect();
        while !remaining.is_empty() && Instant::now() < deadline {
            remaining.retain(|&pid| is_alive(pid));
            std::thread::sleep(Duration::from_millis(50));
        }

        for pid in remaining.into_iter().filter(|&pid| is_alive(pid)) {
            warn!("PID {} survived SIGTERM, killing its group", pid);
            signal_group(pid, Signal::SIGKILL);
        }
        self.children.clear();
    }
}

/// Signal the group led by `pgid`, falling back to the process alone
fn signal_group(pgid: u32, signal: Signal) {
    let raw = pgid as i32;
    if kill(Pid::from_raw(-raw), signal).is_err() {
        let _ = kill(Pid::from_raw(raw), signal);
    }
}

/// A PID counts as alive until it is gone or a zombie
fn is_alive(pid: u32) -> bool {
    if kill(Pid::from_raw(pid as i32), None).is_err() {
        return false;
    }
    // Third field of /proc/<pid>/stat is the state letter
    std::fs::read_to_string(format!("/proc/{}/stat", pid))
        .ok()
        .and_then(|stat| stat.split_whitespace().nth(2).map(|s| !matches!(s, "Z" | "X")))
        .unwrap_or(true)
}

/// Session guard: stops in-flight adb calls when dropped
pub struct ProcessGuard {
    registry: Arc<Mutex<ChildRegistry>>,
}

impl ProcessGuard {
    pub fn new() -> Self {
        Self {
            registry: ChildRegistry::global(),
        }
    }

    /// adb calls currently in flight
    pub fn child_count(&self) -> usize {
        self.registry.lock().map(|r| r.count()).unwrap_or(0)
    }
}

impl Default for ProcessGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.lock() {
            registry.shutdown(SHUTDOWN_GRACE);
        }
    }
}

/// Watch SIGINT, SIGTERM and SIGHUP on a background thread.
///
/// On the first signal the watcher leaves raw mode and the alternate
/// screen, stops running adb calls and exits with `128 + signal`.
pub fn init_signal_handlers() -> std::io::Result<()> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;
    std::thread::Builder::new()
        .name("signal-watch".to_string())
        .spawn(move || {
            let Some(sig) = signals.forever().next() else {
                return;
            };
            info!("Caught signal {}, exiting", sig);
            let _ = crossterm::terminal::disable_raw_mode();
            let _ = crossterm::execute!(
                std::io::stdout(),
                crossterm::terminal::LeaveAlternateScreen
            );
            if let Ok(mut registry) = ChildRegistry::global().lock() {
                registry.shutdown(SHUTDOWN_GRACE);
            }
            std::process::exit(128 + sig);
        })?;
    Ok(())
}

/// Run a command as the leader of a fresh process group that dies with us
pub trait CommandProcessGroup {
    fn in_new_process_group(&mut self) -> &mut Self;
}

impl CommandProcessGroup for Command {
    fn in_new_process_group(&mut self) -> &mut Self {
        use std::os::unix::process::CommandExt;
        // SAFETY: setpgid and prctl are async-signal-safe
        unsafe {
            self.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .map_err(std::io::Error::other)?;
                match libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) {
                    -1 => Err(std::io::Error::last_os_error()),
                    _ => Ok(()),
                }
            });
        }
        self
    }
}

/// Spawn `cmd` in its own process group, track it until it exits and
/// return its captured output.
pub fn run_guarded(cmd: &mut Command) -> std::io::Result<Output> {
    let label = cmd.get_program().to_string_lossy().into_owned();
    let child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .in_new_process_group()
        .spawn()?;

    let pid = child.id();
    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.register(pid, label);
    }
    let output = child.wait_with_output();
    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.unregister(pid);
    }
    output
}

//! Terminal process supervision.
//!
//! Detects whether the terminal is already running, and launches it when
//! permitted. Detection scans the live process table for a name or
//! executable path containing `terminal` and `meta` (case-insensitive).
//! The heuristic is inherently approximate: an unrelated process with a
//! similar name can false-positive, and a localized terminal build can
//! false-negative. Platform-specific install locations are confined to
//! [`default_install_paths`](TerminalSupervisor::default_install_paths).

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::System;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Grace period after spawning the terminal before reporting success.
///
/// Launch is optimistic: there is no ready signal to poll for, the terminal
/// simply needs time to bring its bridge up.
pub const LAUNCH_GRACE: Duration = Duration::from_secs(10);

// ============================================================================
// ProcessDescriptor
// ============================================================================

/// Snapshot of the terminal process.
///
/// Refreshed on demand, never cached beyond a single probe.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessDescriptor {
    /// Process id.
    pub pid: u32,

    /// Executable path, when the process table exposes it.
    pub executable_path: Option<PathBuf>,

    /// Whether the process was alive at probe time.
    pub is_running: bool,

    /// Process start time, when known.
    pub started_at: Option<DateTime<Utc>>,
}

// ============================================================================
// TerminalSupervisor
// ============================================================================

/// Detects and launches the terminal process.
pub struct TerminalSupervisor {
    /// Process table snapshot, refreshed per probe.
    system: Mutex<System>,

    /// Post-spawn grace period; shortened in tests.
    launch_grace: Duration,
}

impl Default for TerminalSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSupervisor {
    /// Creates a supervisor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            launch_grace: LAUNCH_GRACE,
        }
    }

    /// Overrides the post-spawn grace period.
    #[inline]
    #[must_use]
    pub fn with_launch_grace(mut self, grace: Duration) -> Self {
        self.launch_grace = grace;
        self
    }

    /// Ensures the terminal is running.
    ///
    /// Idempotent: when a matching process already exists its descriptor is
    /// returned and nothing is launched.
    ///
    /// # Errors
    ///
    /// - [`Error::TerminalNotRunning`] if not running and `launch_if_missing`
    ///   is false
    /// - [`Error::ExecutableNotFound`] if no executable candidate exists
    /// - [`Error::SpawnFailed`] if the process cannot be spawned
    pub async fn ensure_running(
        &self,
        launch_if_missing: bool,
        executable_hint: Option<&Path>,
    ) -> Result<ProcessDescriptor> {
        if let Some(descriptor) = self.find_terminal() {
            debug!(pid = descriptor.pid, "terminal already running");
            return Ok(descriptor);
        }

        if !launch_if_missing {
            warn!("terminal not running and auto-launch disabled");
            return Err(Error::TerminalNotRunning);
        }

        let executable = Self::resolve_executable(executable_hint)?;
        self.launch(&executable).await
    }

    /// Scans the process table for a terminal process.
    ///
    /// Returns the first match; `None` when nothing matches the heuristic.
    #[must_use]
    pub fn find_terminal(&self) -> Option<ProcessDescriptor> {
        let mut system = self.system.lock();
        system.refresh_processes();

        for (pid, process) in system.processes() {
            let exe = process.exe().map(|p| p.to_string_lossy().to_string());
            if !matches_terminal(process.name(), exe.as_deref()) {
                continue;
            }

            return Some(ProcessDescriptor {
                pid: pid.as_u32(),
                executable_path: process.exe().map(Path::to_path_buf),
                is_running: true,
                started_at: DateTime::from_timestamp(process.start_time() as i64, 0),
            });
        }
        None
    }

    /// Resolves the terminal executable: explicit hint first, then the
    /// platform default install locations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExecutableNotFound`] listing every path checked.
    pub fn resolve_executable(hint: Option<&Path>) -> Result<PathBuf> {
        Self::resolve_from(hint, &Self::default_install_paths())
    }

    fn resolve_from(hint: Option<&Path>, defaults: &[PathBuf]) -> Result<PathBuf> {
        let mut searched = Vec::new();

        if let Some(hint) = hint {
            if hint.is_file() {
                return Ok(hint.to_path_buf());
            }
            searched.push(hint.to_path_buf());
        }

        for candidate in defaults {
            if candidate.is_file() {
                return Ok(candidate.clone());
            }
            searched.push(candidate.clone());
        }

        Err(Error::executable_not_found(searched))
    }

    /// Platform default install locations.
    ///
    /// The only place in the crate with OS-specific path branches.
    #[must_use]
    pub fn default_install_paths() -> Vec<PathBuf> {
        if cfg!(target_os = "windows") {
            vec![
                PathBuf::from(r"C:\Program Files\MetaTrader 5\terminal64.exe"),
                PathBuf::from(r"C:\Program Files (x86)\MetaTrader 5\terminal64.exe"),
            ]
        } else if cfg!(target_os = "macos") {
            vec![PathBuf::from(
                "/Applications/MetaTrader 5.app/Contents/MacOS/MetaTrader 5",
            )]
        } else {
            vec![PathBuf::from("/opt/metatrader5/terminal64.exe")]
        }
    }

    /// Spawns the terminal and waits out the grace period.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SpawnFailed`] if the binary cannot be spawned.
    pub async fn launch(&self, executable: &Path) -> Result<ProcessDescriptor> {
        let child = Command::new(executable)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(Error::spawn_failed)?;

        let pid = child.id().unwrap_or_default();
        info!(pid, executable = %executable.display(), "terminal spawned, waiting grace period");

        tokio::time::sleep(self.launch_grace).await;

        Ok(ProcessDescriptor {
            pid,
            executable_path: Some(executable.to_path_buf()),
            is_running: true,
            started_at: Some(Utc::now()),
        })
    }
}

// ============================================================================
// Detection Heuristic
// ============================================================================

/// Name/path heuristic for terminal processes.
///
/// A match requires both `terminal` and `meta` (case-insensitive) in the
/// process name or in its executable path.
fn matches_terminal(name: &str, exe: Option<&str>) -> bool {
    let name = name.to_lowercase();
    if name.contains("terminal") && name.contains("meta") {
        return true;
    }
    if let Some(exe) = exe {
        let exe = exe.to_lowercase();
        return exe.contains("terminal") && exe.contains("meta");
    }
    false
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_matches_by_name() {
        assert!(matches_terminal("MetaTrader-Terminal64.exe", None));
        assert!(matches_terminal("terminal64_metatrader", None));
        assert!(!matches_terminal("terminal", None));
        assert!(!matches_terminal("metapad", None));
    }

    #[test]
    fn test_heuristic_matches_by_executable_path() {
        assert!(matches_terminal(
            "wine64",
            Some("/home/u/MetaTrader 5/terminal64.exe")
        ));
        assert!(!matches_terminal("wine64", Some("/usr/bin/wine64")));
        assert!(!matches_terminal("wine64", None));
    }

    #[test]
    fn test_resolve_prefers_existing_hint() {
        let tmp = tempfile::NamedTempFile::new().expect("tempfile");
        let resolved =
            TerminalSupervisor::resolve_from(Some(tmp.path()), &[]).expect("resolve");
        assert_eq!(resolved, tmp.path());
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().expect("tempfile");
        let missing = PathBuf::from("/definitely/not/here/terminal64.exe");

        let resolved =
            TerminalSupervisor::resolve_from(Some(&missing), &[tmp.path().to_path_buf()])
                .expect("resolve");
        assert_eq!(resolved, tmp.path());
    }

    #[test]
    fn test_resolve_reports_all_searched_paths() {
        let hint = PathBuf::from("/missing/hint");
        let fallback = PathBuf::from("/missing/fallback");

        let err =
            TerminalSupervisor::resolve_from(Some(&hint), std::slice::from_ref(&fallback))
                .unwrap_err();
        match err {
            Error::ExecutableNotFound { searched } => {
                assert_eq!(searched, vec![hint, fallback]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_install_paths_are_nonempty() {
        assert!(!TerminalSupervisor::default_install_paths().is_empty());
    }

    #[test]
    fn test_find_terminal_does_not_panic() {
        let supervisor = TerminalSupervisor::new();
        let _ = supervisor.find_terminal();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_spawns_and_waits_grace() {
        let supervisor =
            TerminalSupervisor::new().with_launch_grace(Duration::from_millis(10));
        let descriptor = supervisor.launch(Path::new("/bin/true")).await.expect("launch");
        assert!(descriptor.is_running);
        assert_eq!(
            descriptor.executable_path.as_deref(),
            Some(Path::new("/bin/true"))
        );
    }

    #[tokio::test]
    async fn test_launch_missing_binary_is_spawn_failed() {
        let supervisor =
            TerminalSupervisor::new().with_launch_grace(Duration::from_millis(10));
        let err = supervisor
            .launch(Path::new("/definitely/not/here"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SpawnFailed { .. }));
    }
}

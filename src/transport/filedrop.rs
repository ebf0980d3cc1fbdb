//! Shared-directory mailbox transport.
//!
//! A request is a file written into a shared directory; the terminal answers
//! by dropping a correspondingly named response file. One background worker
//! polls the directory and resolves waiting senders, so callers block on a
//! completion channel instead of running their own sleep loops.
//!
//! # File Convention
//!
//! | File | Writer |
//! |------|--------|
//! | `request_<id>.json` | Host (this transport, atomic write) |
//! | `response_<id>.json` | Terminal |
//!
//! On a match both files are deleted. On timeout only the request file is
//! removed; a response arriving late is orphaned (ids are never reused, so
//! it can never be claimed by a newer request) and the worker sweeps it on
//! a later pass.
//!
//! Unlike the message channel, any number of requests may be in flight at
//! once; responses are matched solely by correlation id.

// ============================================================================
// Imports
// ============================================================================

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tempfile::NamedTempFile;
use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{CommandRequest, CommandResponse};

use super::{Transport, TransportKind};

// ============================================================================
// Constants
// ============================================================================

/// Poll cadence of the background worker.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bounded wait for the worker to stop during close.
const WORKER_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// Types
// ============================================================================

/// Map of request ids to completion channels.
type WaiterMap = FxHashMap<RequestId, oneshot::Sender<Result<CommandResponse>>>;

// ============================================================================
// FileDropTransport
// ============================================================================

/// Asynchronous file-based mailbox transport.
///
/// [`connect`] creates the directory and spawns the poll worker; [`close`]
/// signals the worker, joins it with a bounded wait, and fails any still
/// pending sends with [`Error::Cancelled`].
///
/// [`connect`]: FileDropTransport::connect
/// [`close`]: FileDropTransport::close
pub struct FileDropTransport {
    /// Shared mailbox directory.
    dir: PathBuf,

    /// Pending sends awaiting their response file.
    waiters: Arc<Mutex<WaiterMap>>,

    /// Stop signal for the worker.
    shutdown: Arc<Notify>,

    /// Set when the mailbox directory became unusable.
    failed: Arc<AtomicBool>,

    /// Poll worker handle.
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl FileDropTransport {
    /// Creates an unconnected transport over the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            waiters: Arc::new(Mutex::new(WaiterMap::default())),
            shutdown: Arc::new(Notify::new()),
            failed: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Returns the mailbox directory.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of sends currently awaiting a response file.
    #[inline]
    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.waiters.lock().len()
    }

    fn request_path(&self, id: RequestId) -> PathBuf {
        self.dir.join(format!("request_{id}.json"))
    }

    /// Writes the request record atomically: temp file in the same
    /// directory, then rename.
    fn write_request(&self, request: &CommandRequest, path: &Path) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(request)?)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Fails every waiter with an error from `make_error`.
    fn fail_all(waiters: &Mutex<WaiterMap>, make_error: impl Fn() -> Error) {
        let drained: Vec<_> = {
            let mut guard = waiters.lock();
            guard.drain().collect()
        };
        let count = drained.len();

        for (_, tx) in drained {
            let _ = tx.send(Err(make_error()));
        }

        if count > 0 {
            debug!(count, "failed pending file-drop requests");
        }
    }

    /// One directory pass: resolve matched waiters, sweep orphans.
    fn scan(dir: &Path, waiters: &Mutex<WaiterMap>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(id_str) = name
                .strip_prefix("response_")
                .and_then(|s| s.strip_suffix(".json"))
            else {
                continue;
            };
            let Ok(id) = id_str.parse::<RequestId>() else {
                continue;
            };

            let path = entry.path();
            let Some(tx) = waiters.lock().remove(&id) else {
                // Its request timed out; nobody can ever claim this.
                debug!(%id, "sweeping orphaned response file");
                let _ = std::fs::remove_file(&path);
                continue;
            };

            let result = Self::read_response(&path, id);
            let _ = std::fs::remove_file(&path);
            let _ = std::fs::remove_file(dir.join(format!("request_{id}.json")));
            let _ = tx.send(result);
        }
        Ok(())
    }

    fn read_response(path: &Path, id: RequestId) -> Result<CommandResponse> {
        let raw = std::fs::read_to_string(path)?;
        let mut response: CommandResponse = serde_json::from_str(&raw)
            .map_err(|e| Error::invalid_payload(format!("response file: {e}")))?;
        // The file name is authoritative for pairing.
        response.id = id;
        Ok(response)
    }

    /// Background poll loop.
    async fn poll_loop(
        dir: PathBuf,
        waiters: Arc<Mutex<WaiterMap>>,
        shutdown: Arc<Notify>,
        failed: Arc<AtomicBool>,
    ) {
        let mut ticker = interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.notified() => break,
                _ = ticker.tick() => {
                    if let Err(e) = Self::scan(&dir, &waiters) {
                        if !dir.is_dir() {
                            // The mailbox itself is gone; nothing can complete.
                            error!(dir = %dir.display(), "drop directory lost, stopping worker");
                            failed.store(true, Ordering::SeqCst);
                            Self::fail_all(&waiters, || Error::ConnectionClosed);
                            break;
                        }
                        warn!(dir = %dir.display(), error = %e, "drop directory scan failed");
                    }
                }
            }
        }

        debug!(dir = %dir.display(), "file-drop worker stopped");
    }
}

// ============================================================================
// Transport Implementation
// ============================================================================

#[async_trait]
impl Transport for FileDropTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::FileDrop
    }

    async fn connect(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::connect(format!("drop directory {}: {e}", self.dir.display())))?;
        self.failed.store(false, Ordering::SeqCst);

        let mut worker = self.worker.lock();
        if worker.as_ref().is_some_and(|h| !h.is_finished()) {
            return Ok(());
        }

        *worker = Some(tokio::spawn(Self::poll_loop(
            self.dir.clone(),
            Arc::clone(&self.waiters),
            Arc::clone(&self.shutdown),
            Arc::clone(&self.failed),
        )));

        debug!(dir = %self.dir.display(), "file-drop transport connected");
        Ok(())
    }

    async fn send(&self, request: &CommandRequest) -> Result<CommandResponse> {
        if self.failed.load(Ordering::SeqCst) {
            return Err(Error::NotConnected);
        }
        if self.worker.lock().is_none() {
            return Err(Error::NotConnected);
        }

        // Register before writing so a fast response is never mistaken for
        // an orphan.
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().insert(request.id, tx);

        let request_path = self.request_path(request.id);
        if let Err(e) = self.write_request(request, &request_path) {
            self.waiters.lock().remove(&request.id);
            return Err(e);
        }

        match timeout(request.timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                self.waiters.lock().remove(&request.id);
                let _ = std::fs::remove_file(&request_path);
                Err(Error::timeout(request.timeout_ms()))
            }
        }
    }

    async fn close(&self) {
        let handle = self.worker.lock().take();
        if let Some(mut handle) = handle {
            self.shutdown.notify_one();
            if timeout(WORKER_JOIN_TIMEOUT, &mut handle).await.is_err() {
                warn!("file-drop worker did not stop in time, aborting");
                handle.abort();
            }
        }

        Self::fail_all(&self.waiters, || Error::Cancelled);
        debug!(dir = %self.dir.display(), "file-drop transport closed");
    }
}

// ============================================================================
// Tests
// ============================================================================

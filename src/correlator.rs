//! Request correlation and lifecycle tracking.
//!
//! The correlator issues correlation ids, keeps the outstanding-request
//! table, and guarantees that every submitted request resolves exactly once:
//! with the transport's verdict, with [`Error::Cancelled`] on shutdown, or
//! with [`Error::Expired`] when even the transport's own timeout failed to
//! fire. Entries are inserted on the calling path and removed on the
//! completion path, under one mutex.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{Command, CommandRequest, CommandResponse};
use crate::transport::Transport;

// ============================================================================
// Constants
// ============================================================================

/// Slack added to the request timeout before the deadline backstop fires.
///
/// Transports enforce the timeout themselves; the backstop only exists so a
/// misbehaving transport can never hang a caller forever.
const DEADLINE_GRACE: Duration = Duration::from_millis(500);

// ============================================================================
// PendingEntry
// ============================================================================

/// Bookkeeping for one outstanding request.
///
/// Held from send time until the matching response, the deadline, or a
/// cancellation, whichever occurs first; never more than one of them
/// resolves the caller.
struct PendingEntry {
    /// Wire command name, for diagnostics.
    command: String,

    /// Fires the waiting submit with `Cancelled`.
    cancel: oneshot::Sender<()>,
}

// ============================================================================
// RequestCorrelator
// ============================================================================

/// Tracks outstanding requests across whichever transport is active.
#[derive(Default)]
pub struct RequestCorrelator {
    /// Outstanding requests by id.
    pending: Mutex<FxHashMap<RequestId, PendingEntry>>,
}

impl RequestCorrelator {
    /// Creates an empty correlator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests currently outstanding.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Submits a command through the given transport and waits for its
    /// response.
    ///
    /// Generates the request id, registers the pending entry, delegates to
    /// the transport, and resolves exactly once. Callers observe an
    /// identical blocking contract for every transport kind; the file-drop
    /// poll loop is hidden behind the transport's own completion channel.
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] if [`cancel_all`](Self::cancel_all) ran first
    /// - [`Error::Expired`] if the deadline backstop fired
    /// - any transport error, verbatim
    pub async fn submit(
        &self,
        transport: Arc<dyn Transport>,
        command: &Command,
        timeout: Duration,
    ) -> Result<CommandResponse> {
        let request = CommandRequest::new(command, timeout);
        let id = request.id;
        let deadline = timeout + DEADLINE_GRACE;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.pending.lock().insert(
            id,
            PendingEntry {
                command: request.command.clone(),
                cancel: cancel_tx,
            },
        );
        trace!(%id, command = %request.command, "request registered");

        let result = tokio::select! {
            result = transport.send(&request) => result,
            _ = cancel_rx => Err(Error::Cancelled),
            _ = tokio::time::sleep(deadline) => {
                warn!(%id, command = %request.command, "deadline backstop fired");
                Err(Error::expired(id, deadline.as_millis() as u64))
            }
        };

        self.pending.lock().remove(&id);
        result
    }

    /// Fails every outstanding request with [`Error::Cancelled`].
    ///
    /// Called on shutdown; each pending caller resolves promptly instead of
    /// waiting out its deadline.
    pub fn cancel_all(&self) {
        let drained: Vec<_> = {
            let mut pending = self.pending.lock();
            pending.drain().collect()
        };
        let count = drained.len();

        for (id, entry) in drained {
            debug!(%id, command = %entry.command, "cancelling pending request");
            let _ = entry.cancel.send(());
        }

        if count > 0 {
            debug!(count, "cancelled pending requests");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::transport::TransportKind;

    /// Transport double: answers after `delay`, or never when `delay` is
    /// `None`. Ignores the request timeout to exercise the backstop.
    struct ScriptedTransport {
        delay: Option<Duration>,
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        fn kind(&self) -> TransportKind {
            TransportKind::Http
        }

        async fn connect(&self) -> Result<()> {
            Ok(())
        }

        async fn send(&self, request: &CommandRequest) -> Result<CommandResponse> {
            match self.delay {
                Some(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(CommandResponse::from_reply(
                        request.id,
                        json!({"status": "ok"}),
                    ))
                }
                None => {
                    // Never resolves.
                    std::future::pending().await
                }
            }
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn test_submit_resolves_and_clears_entry() {
        let correlator = RequestCorrelator::new();
        let transport: Arc<dyn Transport> = Arc::new(ScriptedTransport {
            delay: Some(Duration::from_millis(10)),
        });

        let response = correlator
            .submit(transport, &Command::Ping, Duration::from_secs(1))
            .await
            .expect("submit");
        assert!(response.success);
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_backstop_fires_when_transport_hangs() {
        let correlator = RequestCorrelator::new();
        let transport: Arc<dyn Transport> = Arc::new(ScriptedTransport { delay: None });

        let err = correlator
            .submit(transport, &Command::Ping, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Expired { .. }));
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_all_fails_every_pending_request() {
        let correlator = Arc::new(RequestCorrelator::new());
        let transport: Arc<dyn Transport> = Arc::new(ScriptedTransport { delay: None });

        let mut handles = Vec::new();
        for _ in 0..5 {
            let correlator = Arc::clone(&correlator);
            let transport = Arc::clone(&transport);
            handles.push(tokio::spawn(async move {
                correlator
                    .submit(transport, &Command::Ping, Duration::from_secs(30))
                    .await
            }));
        }

        // Let every submit register its entry.
        while correlator.pending_count() < 5 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        correlator.cancel_all();

        for handle in handles {
            let err = handle.await.expect("join").unwrap_err();
            assert!(matches!(err, Error::Cancelled));
        }
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_all_on_empty_table_is_noop() {
        let correlator = RequestCorrelator::new();
        correlator.cancel_all();
        assert_eq!(correlator.pending_count(), 0);
    }
}

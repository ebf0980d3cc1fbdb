//! Transport layer.
//!
//! This module handles communication between the host and the terminal over
//! whichever channel is actually usable at runtime.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                          ┌──────────────────┐
//! │  BridgeManager   │   MessageChannel (TCP)   │  Terminal bridge │
//! │                  │◄────────────────────────►│                  │
//! │  probe order:    │        HTTP API          │  (MT5 Expert     │
//! │  channel > http  │◄────────────────────────►│   Advisor or     │
//! │  > file drop     │    shared directory      │   REST gateway)  │
//! │                  │◄────────────────────────►│                  │
//! └──────────────────┘                          └──────────────────┘
//! ```
//!
//! All three implementations answer with the same [`CommandResponse`] record
//! and the same error taxonomy, so the manager applies one fallback policy
//! regardless of which transport failed.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | Persistent framed-TCP request/reply channel |
//! | `http` | Stateless HTTP transport with retry |
//! | `filedrop` | Shared-directory mailbox with a background poller |

// ============================================================================
// Submodules
// ============================================================================

/// Persistent framed-TCP request/reply channel.
pub mod channel;

/// Shared-directory mailbox transport.
pub mod filedrop;

/// Stateless HTTP transport.
pub mod http;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::protocol::{CommandRequest, CommandResponse};

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::MessageChannelTransport;
pub use filedrop::FileDropTransport;
pub use http::HttpTransport;

// ============================================================================
// TransportKind
// ============================================================================

/// One concrete mechanism for exchanging requests with the terminal.
///
/// Ordered by probe priority; the ordering is a fixed policy constant, not
/// configurable per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// Synchronous request/reply over a persistent socket.
    MessageChannel,
    /// Stateless request/response over HTTP.
    Http,
    /// Asynchronous file-based mailbox.
    FileDrop,
}

impl TransportKind {
    /// Fixed probe order: message channel, then HTTP, then file drop.
    pub const PRIORITY: [Self; 3] = [Self::MessageChannel, Self::Http, Self::FileDrop];
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessageChannel => f.write_str("message-channel"),
            Self::Http => f.write_str("http"),
            Self::FileDrop => f.write_str("file-drop"),
        }
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// One concrete channel to the terminal.
///
/// Implementations are selected once at probe time; domain code calls
/// through this trait and never branches on the concrete kind.
///
/// # Contract
///
/// - `send` resolves within the request's timeout, with either a response
///   or a transport error, never a permanent hang.
/// - `close` releases every transport resource and may be called more than
///   once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns which kind of transport this is.
    fn kind(&self) -> TransportKind;

    /// Establishes the channel.
    ///
    /// Idempotent for stateless transports; for the message channel this
    /// (re)opens the socket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`](crate::Error::Connect) if the channel
    /// cannot be established.
    async fn connect(&self) -> Result<()>;

    /// Sends one request and waits for its response.
    ///
    /// # Errors
    ///
    /// Returns a transport error ([`Error::Timeout`](crate::Error::Timeout),
    /// [`Error::Exhausted`](crate::Error::Exhausted), ...) on failure; a
    /// terminal-level rejection is a successful send with
    /// `response.success == false`.
    async fn send(&self, request: &CommandRequest) -> Result<CommandResponse>;

    /// Releases the transport's resources unconditionally.
    async fn close(&self);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order_is_fixed() {
        assert_eq!(
            TransportKind::PRIORITY,
            [
                TransportKind::MessageChannel,
                TransportKind::Http,
                TransportKind::FileDrop,
            ]
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(TransportKind::MessageChannel.to_string(), "message-channel");
        assert_eq!(TransportKind::Http.to_string(), "http");
        assert_eq!(TransportKind::FileDrop.to_string(), "file-drop");
    }
}

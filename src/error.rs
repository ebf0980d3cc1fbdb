//! Error types for the MT5 terminal bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use mt5_bridge::{BridgeManager, Result};
//!
//! async fn example(manager: &BridgeManager) -> Result<()> {
//!     let account = manager.get_account_info().await?;
//!     println!("balance: {}", account["balance"]);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::Validation`] |
//! | Process launch | [`Error::ExecutableNotFound`], [`Error::SpawnFailed`], [`Error::TerminalNotRunning`] |
//! | Connection | [`Error::Connect`], [`Error::NotConnected`], [`Error::ConnectionClosed`], [`Error::NoTransportAvailable`] |
//! | Transport | [`Error::Timeout`], [`Error::Exhausted`], [`Error::Http`], [`Error::InvalidPayload`], [`Error::Protocol`], [`Error::UnknownCommand`] |
//! | Correlation | [`Error::Cancelled`], [`Error::Expired`] |
//! | Domain | [`Error::CommandRejected`] |
//! | External | [`Error::Io`], [`Error::Json`] |
//!
//! All three transports share this single taxonomy, which is what lets
//! [`BridgeManager`](crate::BridgeManager) apply one fallback policy
//! regardless of which transport failed.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when bridge configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Malformed domain input, rejected before any transport call.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the invalid input.
        message: String,
    },

    // ========================================================================
    // Process Launch Errors
    // ========================================================================
    /// Terminal executable not found.
    ///
    /// Returned when neither the configured hint nor any default install
    /// location holds an accessible executable.
    #[error("Terminal executable not found (searched {searched:?})")]
    ExecutableNotFound {
        /// Paths that were checked.
        searched: Vec<PathBuf>,
    },

    /// Failed to spawn the terminal process.
    #[error("Failed to launch terminal: {message}")]
    SpawnFailed {
        /// Description of the launch failure.
        message: String,
    },

    /// Terminal process is not running and auto-launch is disabled.
    #[error("Terminal not running and auto-launch disabled")]
    TerminalNotRunning,

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport could not be established.
    #[error("Connection failed: {message}")]
    Connect {
        /// Description of the connection error.
        message: String,
    },

    /// No transport is currently active.
    ///
    /// Returned when a domain call arrives before `initialize()` succeeded
    /// or after the active transport was lost.
    #[error("Not connected to terminal")]
    NotConnected,

    /// Connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Every transport candidate failed to answer the liveness probe.
    #[error("No transport available")]
    NoTransportAvailable,

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Request timed out at the transport level.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Retryable HTTP failures exhausted the retry budget.
    #[error("HTTP retries exhausted after {attempts} attempts: {message}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Description of the last failure.
        message: String,
    },

    /// Non-retryable HTTP status code.
    #[error("HTTP status {status}")]
    Http {
        /// The HTTP status code.
        status: u16,
    },

    /// Response body could not be decoded.
    #[error("Invalid payload: {message}")]
    InvalidPayload {
        /// Description of the decode failure.
        message: String,
    },

    /// Protocol violation or unexpected reply shape.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Command has no mapping on this transport.
    #[error("Unknown command: {command}")]
    UnknownCommand {
        /// The unrecognized command name.
        command: String,
    },

    // ========================================================================
    // Correlation Errors
    // ========================================================================
    /// Request cancelled by shutdown.
    #[error("Request cancelled")]
    Cancelled,

    /// Pending request exceeded its deadline without any transport verdict.
    #[error("Request {request_id} expired after {timeout_ms}ms")]
    Expired {
        /// The request ID that expired.
        request_id: RequestId,
        /// Milliseconds waited before expiry.
        timeout_ms: u64,
    },

    // ========================================================================
    // Domain Errors
    // ========================================================================
    /// The terminal answered but rejected the command.
    #[error("Command rejected: {message}")]
    CommandRejected {
        /// Error message reported by the terminal.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a validation error.
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates an executable-not-found error.
    #[inline]
    pub fn executable_not_found(searched: Vec<PathBuf>) -> Self {
        Self::ExecutableNotFound { searched }
    }

    /// Creates a spawn-failed error.
    #[inline]
    pub fn spawn_failed(err: IoError) -> Self {
        Self::SpawnFailed {
            message: err.to_string(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    /// Creates a transport timeout error.
    #[inline]
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Creates a retry-exhausted error.
    #[inline]
    pub fn exhausted(attempts: u32, message: impl Into<String>) -> Self {
        Self::Exhausted {
            attempts,
            message: message.into(),
        }
    }

    /// Creates an HTTP status error.
    #[inline]
    pub fn http(status: u16) -> Self {
        Self::Http { status }
    }

    /// Creates an invalid payload error.
    #[inline]
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an unknown command error.
    #[inline]
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Creates an expired request error.
    #[inline]
    pub fn expired(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::Expired {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a command-rejected error.
    #[inline]
    pub fn command_rejected(message: impl Into<String>) -> Self {
        Self::CommandRejected {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout or deadline-expiry error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Expired { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::NotConnected
                | Self::ConnectionClosed
                | Self::NoTransportAvailable
        )
    }

    /// Returns `true` if this is a transport-level error.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Exhausted { .. }
                | Self::Http { .. }
                | Self::InvalidPayload { .. }
                | Self::Protocol { .. }
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry or after re-probing.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Expired { .. }
                | Self::Exhausted { .. }
                | Self::NotConnected
                | Self::ConnectionClosed
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

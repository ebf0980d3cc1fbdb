//! Request and Response record types.
//!
//! A [`CommandRequest`] is immutable once created: the correlation id, the
//! wire command name, the payload and the creation timestamp are fixed at
//! construction. A [`CommandResponse`] is produced exactly once per request,
//! or the request expires.
//!
//! # Format
//!
//! File-drop record (request file):
//!
//! ```json
//! {
//!   "id": "uuid",
//!   "command": "get_market_data",
//!   "data": { "symbol": "EURUSD", "timeframe": "M1", "count": 100 },
//!   "timestamp": "2024-06-01T12:00:00Z"
//! }
//! ```
//!
//! The message channel sends the same record without the `id` field (the
//! channel's strict request/reply alternation pairs messages by order, not
//! by id); HTTP does not serialize the record at all.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

use super::Command;

// ============================================================================
// CommandRequest
// ============================================================================

/// A command request addressed to the terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Unique identifier for request/response correlation.
    pub id: RequestId,

    /// Wire command name, e.g. `get_account_info`.
    pub command: String,

    /// Command payload.
    pub data: Value,

    /// Creation time, ISO-8601 on the wire.
    pub timestamp: DateTime<Utc>,

    /// Per-request timeout. Local bookkeeping, never serialized.
    #[serde(skip)]
    pub timeout: Duration,
}

impl CommandRequest {
    /// Creates a new request with an auto-generated id.
    #[must_use]
    pub fn new(command: &Command, timeout: Duration) -> Self {
        Self {
            id: RequestId::generate(),
            command: command.name().to_string(),
            data: command.data(),
            timestamp: Utc::now(),
            timeout,
        }
    }

    /// Returns the timeout in whole milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

// ============================================================================
// CommandResponse
// ============================================================================

/// A response from the terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Matches the originating request id.
    pub id: RequestId,

    /// Whether the terminal accepted the command.
    #[serde(default = "default_success")]
    pub success: bool,

    /// Response payload.
    #[serde(default)]
    pub data: Value,

    /// Error message reported by the terminal, if any.
    #[serde(default)]
    pub error: Option<String>,
}

fn default_success() -> bool {
    true
}

impl CommandResponse {
    /// Wraps an arbitrary JSON reply under the originating request id.
    ///
    /// The message channel and HTTP transports answer with free-form JSON
    /// objects; a present, non-null `error` key marks failure, otherwise an
    /// explicit `success` key decides and a missing one means success.
    #[must_use]
    pub fn from_reply(id: RequestId, reply: Value) -> Self {
        let error = reply
            .get("error")
            .filter(|v| !v.is_null())
            .map(|v| match v.as_str() {
                Some(s) => s.to_string(),
                None => v.to_string(),
            });

        let success = match &error {
            Some(_) => false,
            None => reply.get("success").and_then(Value::as_bool).unwrap_or(true),
        };

        Self {
            id,
            success,
            data: reply,
            error,
        }
    }

    /// Extracts the payload, turning a terminal rejection into an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandRejected`] if the terminal reported failure.
    pub fn into_result(self) -> Result<Value> {
        if self.success {
            Ok(self.data)
        } else {
            let message = self
                .error
                .unwrap_or_else(|| "terminal reported failure".to_string());
            Err(Error::command_rejected(message))
        }
    }

    /// Gets a string value from the payload.
    ///
    /// Returns an empty string if the key is missing or not a string.
    #[inline]
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Gets a u64 value from the payload.
    ///
    /// Returns 0 if the key is missing or not a number.
    #[inline]
    #[must_use]
    pub fn get_u64(&self, key: &str) -> u64 {
        self.data
            .get(key)
            .and_then(Value::as_u64)
            .unwrap_or_default()
    }

    /// Gets an f64 value from the payload.
    ///
    /// Returns 0.0 if the key is missing or not a number.
    #[inline]
    #[must_use]
    pub fn get_f64(&self, key: &str) -> f64 {
        self.data
            .get(key)
            .and_then(Value::as_f64)
            .unwrap_or_default()
    }

    /// Gets a boolean value from the payload.
    ///
    /// Returns false if the key is missing or not a boolean.
    #[inline]
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        self.data
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Persistent framed-TCP request/reply channel.
//!
//! The bridge side of the terminal exposes a request/reply socket: exactly
//! one request in flight, exactly one reply per request, in order. Skipping
//! a reply would desynchronize the pairing, so a timed-out connection is
//! discarded and must be re-established with [`connect`].
//!
//! # Framing
//!
//! Each message is an ASCII decimal byte length, a newline, then that many
//! bytes of UTF-8 JSON:
//!
//! ```text
//! 53\n
//! {"command":"ping","data":{},"timestamp":"2024-06-01..."}
//! ```
//!
//! The request payload carries `{command, data, timestamp}`; the reply is an
//! arbitrary JSON object interpreted by the caller.
//!
//! [`connect`]: MessageChannelTransport::connect

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{CommandRequest, CommandResponse};

use super::{Transport, TransportKind};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for establishing the TCP connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum accepted reply frame size.
const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

// ============================================================================
// Wire Types
// ============================================================================

/// Request view serialized onto the channel.
///
/// The correlation id stays local: the channel pairs messages by strict
/// alternation, not by id.
#[derive(Serialize)]
struct WireRequest<'a> {
    command: &'a str,
    data: &'a Value,
    timestamp: DateTime<Utc>,
}

/// Split stream halves; the reply side is buffered for length-line reads.
struct Framed {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

// ============================================================================
// MessageChannelTransport
// ============================================================================

/// Synchronous request/reply transport over a persistent TCP connection.
///
/// Concurrent senders queue on an async mutex, which serializes them FIFO:
/// the channel never has more than one request in flight. A send that times
/// out poisons the connection: the stream is dropped and further sends fail
/// with [`Error::NotConnected`] until [`connect`] re-establishes it.
///
/// [`connect`]: MessageChannelTransport::connect
pub struct MessageChannelTransport {
    /// Remote address, `host:port`.
    addr: String,

    /// Current connection; `None` when unconnected or poisoned.
    stream: Mutex<Option<Framed>>,
}

impl MessageChannelTransport {
    /// Creates an unconnected transport for the given address.
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            stream: Mutex::new(None),
        }
    }

    /// Returns the configured remote address.
    #[inline]
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Writes one length-prefixed frame.
    async fn write_frame(writer: &mut OwnedWriteHalf, payload: &[u8]) -> std::io::Result<()> {
        writer
            .write_all(format!("{}\n", payload.len()).as_bytes())
            .await?;
        writer.write_all(payload).await?;
        writer.flush().await
    }

    /// Reads one length-prefixed frame.
    async fn read_frame(reader: &mut BufReader<OwnedReadHalf>) -> Result<Vec<u8>> {
        let mut length_line = String::new();
        let read = reader.read_line(&mut length_line).await?;
        if read == 0 {
            return Err(Error::ConnectionClosed);
        }

        let length: usize = length_line
            .trim()
            .parse()
            .map_err(|_| Error::protocol(format!("invalid frame length: {length_line:?}")))?;
        if length > MAX_FRAME_BYTES {
            return Err(Error::protocol(format!(
                "frame of {length} bytes exceeds limit"
            )));
        }

        let mut payload = vec![0u8; length];
        reader.read_exact(&mut payload).await?;
        Ok(payload)
    }
}

// ============================================================================
// Transport Implementation
// ============================================================================

#[async_trait]
impl Transport for MessageChannelTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::MessageChannel
    }

    async fn connect(&self) -> Result<()> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| Error::connect(format!("connect to {} timed out", self.addr)))?
            .map_err(|e| Error::connect(format!("connect to {} failed: {e}", self.addr)))?;

        let _ = stream.set_nodelay(true);
        let (read, writer) = stream.into_split();

        let mut guard = self.stream.lock().await;
        *guard = Some(Framed {
            reader: BufReader::new(read),
            writer,
        });

        debug!(addr = %self.addr, "message channel connected");
        Ok(())
    }

    async fn send(&self, request: &CommandRequest) -> Result<CommandResponse> {
        // The lock is the queue of senders: strict FIFO, one in flight.
        let mut guard = self.stream.lock().await;
        let framed = guard.as_mut().ok_or(Error::NotConnected)?;

        let wire = WireRequest {
            command: &request.command,
            data: &request.data,
            timestamp: request.timestamp,
        };
        let payload = serde_json::to_vec(&wire)?;

        let write_result = Self::write_frame(&mut framed.writer, &payload).await;
        if let Err(e) = write_result {
            warn!(addr = %self.addr, error = %e, "channel write failed");
            *guard = None;
            return Err(Error::ConnectionClosed);
        }

        let read_result = timeout(request.timeout, Self::read_frame(&mut framed.reader)).await;
        let reply = match read_result {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                // Read-side failure desynchronizes the pairing.
                warn!(addr = %self.addr, error = %e, "channel read failed");
                *guard = None;
                return Err(e);
            }
            Err(_) => {
                // The reply, if it ever arrives, can no longer be paired.
                warn!(
                    addr = %self.addr,
                    timeout_ms = request.timeout_ms(),
                    "channel request timed out, connection discarded"
                );
                *guard = None;
                return Err(Error::timeout(request.timeout_ms()));
            }
        };

        let value: Value = serde_json::from_slice(&reply)
            .map_err(|e| Error::invalid_payload(format!("reply is not valid JSON: {e}")))?;
        if !value.is_object() {
            return Err(Error::protocol("reply is not a JSON object"));
        }

        Ok(CommandResponse::from_reply(request.id, value))
    }

    async fn close(&self) {
        let mut guard = self.stream.lock().await;
        if guard.take().is_some() {
            debug!(addr = %self.addr, "message channel closed");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! MT5 Bridge - Transport-agnostic MetaTrader 5 terminal client.
//!
//! This library connects a trading-automation host to a MetaTrader 5
//! terminal that offers no single reliable communication channel: the
//! terminal may expose a request/reply socket, a REST gateway, or only a
//! shared drop directory, and may not even be running.
//!
//! # Architecture
//!
//! The manager discovers a usable channel at runtime and falls back
//! deterministically through a fixed priority list:
//!
//! - **Message channel**: persistent framed-TCP request/reply socket
//! - **HTTP**: stateless REST calls with pooling and retry
//! - **File drop**: shared-directory mailbox polled by a background worker
//!
//! Key design principles:
//!
//! - One [`BridgeManager`] instance owns all connection state; no globals
//! - A single [`Transport`] trait selected once at probe time; domain
//!   methods never branch on transport kind
//! - Every request is tracked by a [`RequestCorrelator`] so deadlines are
//!   honored even when a transport never answers
//! - [`TerminalSupervisor`] detects and, when permitted, launches the
//!   terminal process
//!
//! # Quick Start
//!
//! ```no_run
//! use mt5_bridge::{BridgeManager, OrderRequest, OrderSide, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = BridgeManager::builder()
//!         .http_base_url("http://127.0.0.1:8082")
//!         .auto_launch(false)
//!         .build()?;
//!
//!     let kind = manager.initialize().await?;
//!     println!("connected via {kind}");
//!
//!     let account = manager.get_account_info().await?;
//!     println!("balance: {}", account["balance"]);
//!
//!     let order = OrderRequest::market("EURUSD", OrderSide::Buy, 0.1);
//!     let verdict = manager.place_order(order).await?;
//!     println!("ticket: {}", verdict["ticket"]);
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`manager`] | Facade: probing, state machine, domain operations |
//! | [`transport`] | The [`Transport`] trait and its three implementations |
//! | [`correlator`] | Outstanding-request tracking and cancellation |
//! | [`supervisor`] | Terminal process detection and launch |
//! | [`monitor`] | Host resource sampling for health reports |
//! | [`protocol`] | Command and request/response records |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Correlation id type |

// ============================================================================
// Modules
// ============================================================================

/// Outstanding-request tracking and cancellation.
pub mod correlator;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe request identifiers.
pub mod identifiers;

/// Bridge manager: transport selection, lifecycle, domain API.
pub mod manager;

/// Host resource monitoring.
pub mod monitor;

/// Bridge protocol message types.
pub mod protocol;

/// Terminal process supervision.
pub mod supervisor;

/// Transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Manager types
pub use manager::{BridgeBuilder, BridgeHealth, BridgeManager, ConnectionState, DegradeReason};

// Transport types
pub use transport::{
    FileDropTransport, HttpTransport, MessageChannelTransport, Transport, TransportKind,
};

// Correlation types
pub use correlator::RequestCorrelator;

// Supervision types
pub use supervisor::{ProcessDescriptor, TerminalSupervisor};

// Monitoring types
pub use monitor::{
    AlertKind, HealthStatus, ResourceAlert, ResourceMonitor, ResourceReport, ResourceThresholds,
    SystemResources,
};

// Protocol types
pub use protocol::{Command, CommandRequest, CommandResponse, HistoryFilter, OrderRequest, OrderSide};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::RequestId;

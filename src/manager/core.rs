//! Bridge coordinator and state machine.
//!
//! The [`BridgeManager`] owns the transport-selection policy, the single
//! active transport, and the transport-independent domain API. One manager
//! instance owns all connection state; there are no ambient globals.
//!
//! # State Machine
//!
//! ```text
//! Uninitialized --initialize()--> Probing(kind) --ping ok--> Connected(kind)
//!                                      |
//!                                      +--all kinds fail--> Degraded(reason)
//!
//! Connected --shutdown()--> Closed
//! ```
//!
//! Probing tries transports strictly in priority order (message channel,
//! HTTP, file drop) and stops at the first successful ping. The manager
//! does not re-probe on a timer; callers decide when to call
//! [`initialize`](BridgeManager::initialize) again.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock as AsyncRwLock;
use tracing::{debug, info, warn};

use crate::correlator::RequestCorrelator;
use crate::error::{Error, Result};
use crate::monitor::{ResourceMonitor, ResourceReport};
use crate::protocol::{Command, CommandRequest, CommandResponse, HistoryFilter, OrderRequest};
use crate::supervisor::TerminalSupervisor;
use crate::transport::{
    FileDropTransport, HttpTransport, MessageChannelTransport, Transport, TransportKind,
};

use super::builder::{BridgeBuilder, BridgeOptions};

// ============================================================================
// Constants
// ============================================================================

/// Probe ping timeout for the message channel.
const PROBE_TIMEOUT_CHANNEL: Duration = Duration::from_secs(5);

/// Probe ping timeout for HTTP.
const PROBE_TIMEOUT_HTTP: Duration = Duration::from_secs(2);

/// Probe ping timeout for the file drop.
const PROBE_TIMEOUT_FILEDROP: Duration = Duration::from_secs(5);

// ============================================================================
// ConnectionState
// ============================================================================

/// Why the manager is degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    /// Every transport candidate failed its liveness probe.
    NoTransportAvailable,
}

/// Lifecycle state of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ConnectionState {
    /// `initialize()` has not run.
    Uninitialized,
    /// Currently probing the given transport kind.
    Probing(TransportKind),
    /// Connected through the given transport kind.
    Connected(TransportKind),
    /// No transport is usable.
    Degraded(DegradeReason),
    /// Shut down.
    Closed,
}

// ============================================================================
// BridgeHealth
// ============================================================================

/// Connection state plus host resource report, for status rendering.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeHealth {
    /// Manager lifecycle state.
    pub state: ConnectionState,

    /// Host resource sample and threshold verdict.
    pub resources: ResourceReport,
}

// ============================================================================
// BridgeManager
// ============================================================================

/// Transport-agnostic facade over the terminal bridge.
///
/// Domain operations are implemented once against the correlator and the
/// active transport; they never branch on which transport kind is active.
///
/// # Example
///
/// ```no_run
/// use mt5_bridge::BridgeManager;
///
/// # async fn example() -> mt5_bridge::Result<()> {
/// let manager = BridgeManager::builder().auto_launch(false).build()?;
/// let kind = manager.initialize().await?;
/// println!("connected via {kind}");
///
/// let account = manager.get_account_info().await?;
/// println!("balance: {}", account["balance"]);
///
/// manager.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct BridgeManager {
    /// Validated configuration.
    options: BridgeOptions,

    /// Terminal process supervision.
    supervisor: TerminalSupervisor,

    /// Outstanding-request tracking.
    correlator: RequestCorrelator,

    /// Host resource sampling for `health()`.
    monitor: ResourceMonitor,

    /// Lifecycle state.
    state: RwLock<ConnectionState>,

    /// Active transport. Domain calls take read; probing and shutdown take
    /// write, so a call during a swap blocks briefly or observes
    /// `NotConnected`, never a half-initialized transport.
    active: AsyncRwLock<Option<Arc<dyn Transport>>>,
}

// ============================================================================
// BridgeManager - Construction
// ============================================================================

impl BridgeManager {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    pub(crate) fn new(options: BridgeOptions) -> Self {
        Self {
            options,
            supervisor: TerminalSupervisor::new(),
            correlator: RequestCorrelator::new(),
            monitor: ResourceMonitor::new(),
            state: RwLock::new(ConnectionState::Uninitialized),
            active: AsyncRwLock::new(None),
        }
    }
}

// ============================================================================
// BridgeManager - Lifecycle
// ============================================================================

impl BridgeManager {
    /// Ensures the terminal is up and probes transports in priority order.
    ///
    /// Individual probe failures are recovered locally by advancing to the
    /// next candidate; only the terminal "no transport available" outcome is
    /// surfaced. A supervisor failure is logged and probing proceeds, since
    /// the terminal may still be reachable remotely.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoTransportAvailable`] when every candidate failed,
    /// leaving the manager `Degraded`.
    pub async fn initialize(&self) -> Result<TransportKind> {
        match self
            .supervisor
            .ensure_running(
                self.options.auto_launch,
                self.options.executable_hint.as_deref(),
            )
            .await
        {
            Ok(descriptor) => debug!(pid = descriptor.pid, "terminal process available"),
            Err(e) => warn!(error = %e, "terminal process unavailable, probing anyway"),
        }

        for kind in TransportKind::PRIORITY {
            *self.state.write() = ConnectionState::Probing(kind);

            let transport = match self.build_transport(kind) {
                Ok(transport) => transport,
                Err(e) => {
                    debug!(%kind, error = %e, "transport construction failed");
                    continue;
                }
            };

            if let Err(e) = self.probe(&transport, kind).await {
                debug!(%kind, error = %e, "transport probe failed");
                transport.close().await;
                continue;
            }

            {
                let mut active = self.active.write().await;
                if let Some(old) = active.take() {
                    old.close().await;
                }
                *active = Some(transport);
            }
            *self.state.write() = ConnectionState::Connected(kind);
            info!(%kind, "bridge connected");
            return Ok(kind);
        }

        *self.state.write() = ConnectionState::Degraded(DegradeReason::NoTransportAvailable);
        warn!("no transport available");
        Err(Error::NoTransportAvailable)
    }

    /// Shuts the manager down.
    ///
    /// Fails every pending request with [`Error::Cancelled`] and releases
    /// the active transport's resources unconditionally. Idempotent.
    pub async fn shutdown(&self) {
        *self.state.write() = ConnectionState::Closed;
        self.correlator.cancel_all();

        let transport = self.active.write().await.take();
        if let Some(transport) = transport {
            transport.close().await;
        }

        info!("bridge shut down");
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Returns the active transport kind, if connected.
    #[inline]
    #[must_use]
    pub fn transport_kind(&self) -> Option<TransportKind> {
        match self.state() {
            ConnectionState::Connected(kind) => Some(kind),
            _ => None,
        }
    }

    /// Number of requests currently outstanding.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlator.pending_count()
    }

    /// Returns connection state plus a host resource report.
    #[must_use]
    pub fn health(&self) -> BridgeHealth {
        BridgeHealth {
            state: self.state(),
            resources: self.monitor.check_thresholds(),
        }
    }

    fn build_transport(&self, kind: TransportKind) -> Result<Arc<dyn Transport>> {
        Ok(match kind {
            TransportKind::MessageChannel => {
                Arc::new(MessageChannelTransport::new(self.options.channel_addr.clone()))
            }
            TransportKind::Http => {
                let mut transport = HttpTransport::new(
                    self.options.http_base_url.clone(),
                    self.options.api_key.clone(),
                )?;
                if let Some(base) = self.options.http_backoff_base {
                    transport = transport.with_backoff_base(base);
                }
                Arc::new(transport)
            }
            TransportKind::FileDrop => {
                Arc::new(FileDropTransport::new(self.options.drop_dir.clone()))
            }
        })
    }

    async fn probe(&self, transport: &Arc<dyn Transport>, kind: TransportKind) -> Result<()> {
        transport.connect().await?;

        let timeout = self.options.probe_timeout.unwrap_or(match kind {
            TransportKind::MessageChannel => PROBE_TIMEOUT_CHANNEL,
            TransportKind::Http => PROBE_TIMEOUT_HTTP,
            TransportKind::FileDrop => PROBE_TIMEOUT_FILEDROP,
        });

        let ping = CommandRequest::new(&Command::Ping, timeout);
        let response = transport.send(&ping).await?;
        if !response.success {
            return Err(Error::connect(format!(
                "ping rejected: {}",
                response.error.unwrap_or_default()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// BridgeManager - Domain Operations
// ============================================================================

impl BridgeManager {
    /// Validates and submits one command through the active transport.
    async fn submit(&self, command: Command) -> Result<CommandResponse> {
        command.validate()?;

        let transport = {
            let guard = self.active.read().await;
            guard.as_ref().map(Arc::clone).ok_or(Error::NotConnected)?
        };

        self.correlator
            .submit(transport, &command, self.options.request_timeout)
            .await
    }

    /// Checks terminal liveness.
    pub async fn ping(&self) -> Result<bool> {
        Ok(self.submit(Command::Ping).await?.success)
    }

    /// Returns terminal/server status.
    pub async fn get_status(&self) -> Result<Value> {
        self.submit(Command::GetStatus).await?.into_result()
    }

    /// Returns account information.
    pub async fn get_account_info(&self) -> Result<Value> {
        self.submit(Command::GetAccountInfo).await?.into_result()
    }

    /// Returns the account balance.
    pub async fn get_account_balance(&self) -> Result<f64> {
        let account = self.get_account_info().await?;
        account
            .get("balance")
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::invalid_payload("account info missing balance"))
    }

    /// Returns the account equity.
    pub async fn get_account_equity(&self) -> Result<f64> {
        let account = self.get_account_info().await?;
        account
            .get("equity")
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::invalid_payload("account info missing equity"))
    }

    /// Returns candle data for a symbol.
    pub async fn get_market_data(
        &self,
        symbol: impl Into<String>,
        timeframe: impl Into<String>,
        count: u32,
    ) -> Result<Value> {
        self.submit(Command::GetMarketData {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
            count,
        })
        .await?
        .into_result()
    }

    /// Returns static information about one symbol.
    pub async fn get_symbol_info(&self, symbol: impl Into<String>) -> Result<Value> {
        self.submit(Command::GetSymbolInfo {
            symbol: symbol.into(),
        })
        .await?
        .into_result()
    }

    /// Returns all tradable symbols.
    pub async fn get_symbols(&self) -> Result<Vec<String>> {
        let value = self.submit(Command::GetSymbols).await?.into_result()?;
        Ok(value
            .get("symbols")
            .and_then(Value::as_array)
            .map(|symbols| {
                symbols
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Places a trade order and returns the terminal's verdict.
    pub async fn place_order(&self, order: OrderRequest) -> Result<Value> {
        self.submit(Command::PlaceOrder(order)).await?.into_result()
    }

    /// Returns all open positions.
    pub async fn get_positions(&self) -> Result<Vec<Value>> {
        let value = self.submit(Command::GetPositions).await?.into_result()?;
        Ok(extract_array(&value, "positions"))
    }

    /// Returns one open position by ticket.
    pub async fn get_position(&self, ticket: u64) -> Result<Value> {
        self.submit(Command::GetPosition { ticket })
            .await?
            .into_result()
    }

    /// Closes one open position.
    pub async fn close_position(&self, ticket: u64) -> Result<Value> {
        self.submit(Command::ClosePosition { ticket })
            .await?
            .into_result()
    }

    /// Closes every open position, returning the tickets actually closed.
    ///
    /// Per-position failures are logged and skipped so one stuck position
    /// does not block the rest.
    pub async fn close_all_positions(&self) -> Result<Vec<u64>> {
        let mut closed = Vec::new();
        for position in self.get_positions().await? {
            let Some(ticket) = position.get("ticket").and_then(Value::as_u64) else {
                continue;
            };
            match self.close_position(ticket).await {
                Ok(_) => closed.push(ticket),
                Err(e) => warn!(ticket, error = %e, "failed to close position"),
            }
        }
        Ok(closed)
    }

    /// Returns all pending orders.
    pub async fn get_orders(&self) -> Result<Vec<Value>> {
        let value = self.submit(Command::GetOrders).await?.into_result()?;
        Ok(extract_array(&value, "orders"))
    }

    /// Cancels one pending order.
    pub async fn cancel_order(&self, ticket: u64) -> Result<Value> {
        self.submit(Command::CancelOrder { ticket })
            .await?
            .into_result()
    }

    /// Cancels every pending order, returning the tickets actually
    /// cancelled.
    pub async fn cancel_all_orders(&self) -> Result<Vec<u64>> {
        let mut cancelled = Vec::new();
        for order in self.get_orders().await? {
            let Some(ticket) = order.get("ticket").and_then(Value::as_u64) else {
                continue;
            };
            match self.cancel_order(ticket).await {
                Ok(_) => cancelled.push(ticket),
                Err(e) => warn!(ticket, error = %e, "failed to cancel order"),
            }
        }
        Ok(cancelled)
    }

    /// Returns historical deals.
    pub async fn get_history_deals(&self, filter: HistoryFilter) -> Result<Vec<Value>> {
        let value = self
            .submit(Command::GetHistoryDeals(filter))
            .await?
            .into_result()?;
        Ok(extract_array(&value, "deals"))
    }

    /// Returns historical orders.
    pub async fn get_history_orders(&self, filter: HistoryFilter) -> Result<Vec<Value>> {
        let value = self
            .submit(Command::GetHistoryOrders(filter))
            .await?
            .into_result()?;
        Ok(extract_array(&value, "orders"))
    }
}

/// Pulls a named array out of a payload, defaulting to empty.
fn extract_array(value: &Value, key: &str) -> Vec<Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use url::Url;

    use crate::protocol::OrderSide;

    fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Reads one HTTP request (headers + content-length body) and returns it.
    async fn read_http_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 16384];
        loop {
            let n = stream.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            if let Some(pos) = find_subslice(&data, b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&data[..pos]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() - (pos + 4) >= content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).to_string()
    }

    /// Fake REST gateway routing the fixed path table.
    async fn spawn_gateway() -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let raw = read_http_request(&mut stream).await;
                    let request_line = raw.lines().next().unwrap_or_default();

                    let body = if request_line.contains("/api/v1/ping") {
                        json!({"status": "ok"})
                    } else if request_line.contains("/api/v1/account") {
                        json!({"balance": 10000.5, "equity": 10100.25})
                    } else if request_line.contains("/api/v1/status") {
                        json!({"status": "connected"})
                    } else if request_line.contains("/api/v1/trade/order") {
                        json!({"ticket": 555})
                    } else if request_line.contains("/api/v1/trade/positions") {
                        json!({"positions": [{"ticket": 1, "symbol": "EURUSD"}]})
                    } else if request_line.contains("/api/v1/trade/position/") {
                        json!({"success": true})
                    } else if request_line.contains("/api/v1/market/symbols") {
                        json!({"symbols": ["EURUSD", "GBPUSD"]})
                    } else {
                        json!({"error": "no such route"})
                    };

                    let payload = body.to_string();
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                         Content-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                        payload.len()
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Url::parse(&format!("http://{addr}/")).expect("url")
    }

    /// Reserves an address with nothing listening on it.
    async fn dead_addr() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();
        drop(listener);
        addr
    }

    fn manager_for(
        channel: String,
        http: &Url,
        drop_dir: &std::path::Path,
    ) -> Arc<BridgeManager> {
        Arc::new(
            BridgeManager::builder()
                .channel_addr(channel)
                .http_base_url(http.as_str())
                .drop_dir(drop_dir)
                .auto_launch(false)
                .probe_timeout(Duration::from_millis(300))
                .http_backoff_base(Duration::from_millis(10))
                .request_timeout(Duration::from_secs(10))
                .build()
                .expect("build"),
        )
    }

    #[tokio::test]
    async fn test_probing_falls_back_to_http_in_priority_order() {
        let gateway = spawn_gateway().await;
        let tmp = TempDir::new().expect("tempdir");
        let manager = manager_for(dead_addr().await, &gateway, tmp.path());

        let kind = manager.initialize().await.expect("initialize");
        assert_eq!(kind, TransportKind::Http);
        assert_eq!(
            manager.state(),
            ConnectionState::Connected(TransportKind::Http)
        );
        assert_eq!(manager.transport_kind(), Some(TransportKind::Http));

        manager.shutdown().await;
        assert_eq!(manager.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_initialize_with_everything_down_degrades() {
        let dead_http = Url::parse(&format!("http://{}/", dead_addr().await)).expect("url");
        let tmp = TempDir::new().expect("tempdir");
        let manager = manager_for(dead_addr().await, &dead_http, tmp.path());

        let err = manager.initialize().await.unwrap_err();
        assert!(matches!(err, Error::NoTransportAvailable));
        assert_eq!(
            manager.state(),
            ConnectionState::Degraded(DegradeReason::NoTransportAvailable)
        );
    }

    #[tokio::test]
    async fn test_domain_operations_share_one_facade() {
        let gateway = spawn_gateway().await;
        let tmp = TempDir::new().expect("tempdir");
        let manager = manager_for(dead_addr().await, &gateway, tmp.path());
        manager.initialize().await.expect("initialize");

        assert!(manager.ping().await.expect("ping"));

        let status = manager.get_status().await.expect("status");
        assert_eq!(status["status"], "connected");

        let balance = manager.get_account_balance().await.expect("balance");
        assert!((balance - 10000.5).abs() < f64::EPSILON);

        let equity = manager.get_account_equity().await.expect("equity");
        assert!((equity - 10100.25).abs() < f64::EPSILON);

        let ticket = manager
            .place_order(OrderRequest::market("EURUSD", OrderSide::Buy, 0.1))
            .await
            .expect("order");
        assert_eq!(ticket["ticket"], 555);

        let positions = manager.get_positions().await.expect("positions");
        assert_eq!(positions.len(), 1);

        let symbols = manager.get_symbols().await.expect("symbols");
        assert_eq!(symbols, vec!["EURUSD".to_string(), "GBPUSD".to_string()]);

        let closed = manager.close_all_positions().await.expect("close all");
        assert_eq!(closed, vec![1]);

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_validation_fails_before_any_transport_call() {
        let gateway = spawn_gateway().await;
        let tmp = TempDir::new().expect("tempdir");
        let manager = manager_for(dead_addr().await, &gateway, tmp.path());
        manager.initialize().await.expect("initialize");

        let err = manager
            .place_order(OrderRequest::market("EURUSD", OrderSide::Buy, -1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let err = manager.close_position(0).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_domain_call_before_initialize_is_not_connected() {
        let tmp = TempDir::new().expect("tempdir");
        let manager = BridgeManager::builder()
            .drop_dir(tmp.path())
            .auto_launch(false)
            .build()
            .expect("build");

        let err = manager.get_status().await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));
        assert_eq!(manager.state(), ConnectionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_all_pending_requests() {
        let dead_http = Url::parse(&format!("http://{}/", dead_addr().await)).expect("url");
        let tmp = TempDir::new().expect("tempdir");

        // Terminal double: answers ping request files, ignores the rest.
        let dir = tmp.path().to_path_buf();
        tokio::spawn(async move {
            loop {
                if let Ok(entries) = std::fs::read_dir(&dir) {
                    for entry in entries.flatten() {
                        let name = entry.file_name().to_string_lossy().to_string();
                        if !name.starts_with("request_") {
                            continue;
                        }
                        let Ok(raw) = std::fs::read_to_string(entry.path()) else {
                            continue;
                        };
                        let Ok(record) = serde_json::from_str::<Value>(&raw) else {
                            continue;
                        };
                        if record["command"] == "ping" {
                            let id = record["id"].as_str().unwrap_or_default().to_string();
                            let response = json!({
                                "id": id,
                                "success": true,
                                "data": {"status": "ok"},
                            });
                            let _ = std::fs::write(
                                dir.join(format!("response_{id}.json")),
                                response.to_string(),
                            );
                        }
                    }
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        });

        let manager = manager_for(dead_addr().await, &dead_http, tmp.path());
        let kind = manager.initialize().await.expect("initialize");
        assert_eq!(kind, TransportKind::FileDrop);

        // Park N requests the terminal double never answers.
        let mut handles = Vec::new();
        for _ in 0..3 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move { manager.get_status().await }));
        }
        while manager.pending_count() < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        manager.shutdown().await;

        for handle in handles {
            let err = handle.await.expect("join").unwrap_err();
            assert!(matches!(err, Error::Cancelled));
        }
        assert_eq!(manager.pending_count(), 0);
        assert_eq!(manager.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_health_reports_state_and_resources() {
        let tmp = TempDir::new().expect("tempdir");
        let manager = BridgeManager::builder()
            .drop_dir(tmp.path())
            .auto_launch(false)
            .build()
            .expect("build");

        let health = manager.health();
        assert_eq!(health.state, ConnectionState::Uninitialized);
        assert!(health.resources.resources.memory_total > 0);
    }
}

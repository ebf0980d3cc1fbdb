//! Stateless HTTP transport.
//!
//! Each send is an independent HTTP call against the terminal's REST
//! gateway, using a pooled client. Transient failures (network errors and
//! statuses 429/500/502/503/504) are retried with exponential backoff;
//! everything else surfaces immediately.
//!
//! # Route Table
//!
//! | Command | Route |
//! |---------|-------|
//! | `ping` | `GET /api/v1/ping` |
//! | `get_status` | `GET /api/v1/status` |
//! | `get_account_info` | `GET /api/v1/account` |
//! | `get_market_data` | `GET /api/v1/market/data?symbol&timeframe&count` |
//! | `get_symbol_info` | `GET /api/v1/market/symbol?symbol` |
//! | `get_symbols` | `GET /api/v1/market/symbols` |
//! | `place_order` | `POST /api/v1/trade/order` |
//! | `get_positions` | `GET /api/v1/trade/positions` |
//! | `get_position` | `GET /api/v1/trade/position/{ticket}` |
//! | `close_position` | `DELETE /api/v1/trade/position/{ticket}` |
//! | `get_orders` | `GET /api/v1/trade/orders` |
//! | `cancel_order` | `DELETE /api/v1/trade/order/{ticket}` |
//! | `get_history_deals` | `GET /api/v1/history/deals` |
//! | `get_history_orders` | `GET /api/v1/history/orders` |

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{Value, json};
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{CommandRequest, CommandResponse};

use super::{Transport, TransportKind};

// ============================================================================
// Constants
// ============================================================================

/// Retries after the initial attempt.
const MAX_RETRIES: u32 = 3;

/// Base backoff delay; doubles per retry.
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Status codes considered transient.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

// ============================================================================
// Route
// ============================================================================

/// Resolved HTTP call for one command.
struct Route {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl Route {
    fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    fn with_query(mut self, data: &Value) -> Self {
        if let Some(map) = data.as_object() {
            for (key, value) in map {
                if value.is_null() {
                    continue;
                }
                let rendered = match value.as_str() {
                    Some(s) => s.to_string(),
                    None => value.to_string(),
                };
                self.query.push((key.clone(), rendered));
            }
        }
        self
    }
}

/// Extracts the ticket a routed command refers to.
fn ticket_of(data: &Value) -> Result<u64> {
    data.get("ticket")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::validation("ticket missing from command payload"))
}

/// Maps a command onto the fixed route table.
fn route_for(request: &CommandRequest) -> Result<Route> {
    let data = &request.data;
    let route = match request.command.as_str() {
        "ping" => Route::get("/api/v1/ping"),
        "get_status" => Route::get("/api/v1/status"),
        "get_account_info" => Route::get("/api/v1/account"),
        "get_market_data" => Route::get("/api/v1/market/data").with_query(data),
        "get_symbol_info" => Route::get("/api/v1/market/symbol").with_query(data),
        "get_symbols" => Route::get("/api/v1/market/symbols"),
        "place_order" => {
            let mut route = Route::get("/api/v1/trade/order");
            route.method = Method::POST;
            route.body = Some(data.clone());
            route
        }
        "get_positions" => Route::get("/api/v1/trade/positions"),
        "get_position" => Route::get(format!("/api/v1/trade/position/{}", ticket_of(data)?)),
        "close_position" => Route::delete(format!("/api/v1/trade/position/{}", ticket_of(data)?)),
        "get_orders" => Route::get("/api/v1/trade/orders"),
        "cancel_order" => Route::delete(format!("/api/v1/trade/order/{}", ticket_of(data)?)),
        "get_history_deals" => Route::get("/api/v1/history/deals").with_query(data),
        "get_history_orders" => Route::get("/api/v1/history/orders").with_query(data),
        other => return Err(Error::unknown_command(other)),
    };
    Ok(route)
}

// ============================================================================
// HttpTransport
// ============================================================================

/// Stateless request/response transport over HTTP with connection pooling.
pub struct HttpTransport {
    /// Pooled HTTP client.
    client: Client,

    /// Gateway base URL.
    base_url: Url,

    /// Optional bearer token.
    api_key: Option<String>,

    /// Backoff base; shortened in tests.
    backoff_base: Duration,
}

impl HttpTransport {
    /// Creates a transport against the given gateway base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the HTTP client cannot be constructed.
    pub fn new(base_url: Url, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::connect(format!("http client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_key,
            backoff_base: BACKOFF_BASE,
        })
    }

    /// Overrides the retry backoff base.
    #[inline]
    #[must_use]
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Returns the gateway base URL.
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Decodes a successful HTTP response body.
    ///
    /// An empty body is an empty success payload, not an error.
    async fn decode(
        &self,
        request: &CommandRequest,
        response: reqwest::Response,
    ) -> Result<CommandResponse> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::invalid_payload(format!("reading body: {e}")))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(CommandResponse {
                id: request.id,
                success: true,
                data: json!({}),
                error: None,
            });
        }

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| Error::invalid_payload(format!("body is not valid JSON: {e}")))?;

        Ok(CommandResponse::from_reply(request.id, value))
    }
}

// ============================================================================
// Transport Implementation
// ============================================================================

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    async fn connect(&self) -> Result<()> {
        // Stateless: liveness is established by the probe ping.
        Ok(())
    }

    async fn send(&self, request: &CommandRequest) -> Result<CommandResponse> {
        let route = route_for(request)?;
        let url = self
            .base_url
            .join(&route.path)
            .map_err(|e| Error::config(format!("bad route {}: {e}", route.path)))?;

        let mut attempts = 0u32;
        let mut last_failure;

        loop {
            attempts += 1;

            let mut builder = self
                .client
                .request(route.method.clone(), url.clone())
                .timeout(request.timeout);
            if !route.query.is_empty() {
                builder = builder.query(&route.query);
            }
            if let Some(body) = &route.body {
                builder = builder.json(body);
            }
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }

            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return self.decode(request, response).await;
                    }
                    if !RETRYABLE_STATUSES.contains(&status.as_u16()) {
                        return Err(Error::http(status.as_u16()));
                    }
                    last_failure = format!("status {}", status.as_u16());
                }
                // A timed-out request is reported as such, not retried:
                // retrying would blow the caller's deadline.
                Err(e) if e.is_timeout() => return Err(Error::timeout(request.timeout_ms())),
                Err(e) => last_failure = e.to_string(),
            }

            if attempts > MAX_RETRIES {
                warn!(command = %request.command, attempts, "http retries exhausted");
                return Err(Error::exhausted(attempts, last_failure));
            }

            let backoff = self.backoff_base * 2u32.pow(attempts - 1);
            debug!(
                command = %request.command,
                attempt = attempts,
                backoff_ms = backoff.as_millis() as u64,
                failure = %last_failure,
                "retrying http request"
            );
            sleep(backoff).await;
        }
    }

    async fn close(&self) {
        // The pooled client releases its connections on drop.
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Instant;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    use crate::protocol::{Command, OrderRequest, OrderSide};

    fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Serves the given `(status, body)` list, one response per connection,
    /// and forwards each raw request to the returned receiver.
    async fn spawn_http_server(
        responses: Vec<(u16, String)>,
    ) -> (Url, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.expect("accept");

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

                let _ = tx.send(String::from_utf8_lossy(&data).to_string());

                let response = format!(
                    "HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        let url = Url::parse(&format!("http://{addr}/")).expect("url");
        (url, rx)
    }

    fn request(command: &Command) -> CommandRequest {
        CommandRequest::new(command, Duration::from_secs(5))
    }

    fn fast_transport(url: Url, api_key: Option<String>) -> HttpTransport {
        HttpTransport::new(url, api_key)
            .expect("transport")
            .with_backoff_base(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_ping_success() {
        let (url, mut rx) =
            spawn_http_server(vec![(200, r#"{"status":"ok"}"#.to_string())]).await;
        let transport = fast_transport(url, None);

        let response = transport.send(&request(&Command::Ping)).await.expect("send");
        assert!(response.success);
        assert_eq!(response.get_string("status"), "ok");

        let raw = rx.recv().await.expect("captured request");
        assert!(raw.starts_with("GET /api/v1/ping"));
    }

    #[tokio::test]
    async fn test_retries_transient_statuses_then_succeeds() {
        let (url, mut rx) = spawn_http_server(vec![
            (503, String::new()),
            (503, String::new()),
            (200, r#"{"status":"ok"}"#.to_string()),
        ])
        .await;
        let transport = fast_transport(url, None);

        let started = Instant::now();
        let response = transport.send(&request(&Command::Ping)).await.expect("send");
        assert!(response.success);

        // Third attempt carries the success; backoff slept 10ms + 20ms.
        assert!(started.elapsed() >= Duration::from_millis(25));
        for _ in 0..3 {
            assert!(rx.recv().await.is_some());
        }
    }

    #[tokio::test]
    async fn test_exhausted_after_retry_budget() {
        let (url, _rx) = spawn_http_server(vec![
            (503, String::new()),
            (503, String::new()),
            (503, String::new()),
            (503, String::new()),
        ])
        .await;
        let transport = fast_transport(url, None);

        let err = transport.send(&request(&Command::Ping)).await.unwrap_err();
        assert!(matches!(err, Error::Exhausted { attempts: 4, .. }));
    }

    #[tokio::test]
    async fn test_non_retryable_status_surfaces_immediately() {
        let (url, mut rx) = spawn_http_server(vec![(404, String::new())]).await;
        let transport = fast_transport(url, None);

        let err = transport.send(&request(&Command::Ping)).await.unwrap_err();
        assert!(matches!(err, Error::Http { status: 404 }));

        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err(), "must not retry a 404");
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_success_payload() {
        let (url, _rx) = spawn_http_server(vec![(200, String::new())]).await;
        let transport = fast_transport(url, None);

        let response = transport.send(&request(&Command::Ping)).await.expect("send");
        assert!(response.success);
        assert_eq!(response.data, json!({}));
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_invalid_payload() {
        let (url, _rx) = spawn_http_server(vec![(200, "not json".to_string())]).await;
        let transport = fast_transport(url, None);

        let err = transport.send(&request(&Command::Ping)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPayload { .. }));
    }

    #[tokio::test]
    async fn test_place_order_issues_single_post_with_body() {
        let (url, mut rx) = spawn_http_server(vec![(200, r#"{"ticket":12345}"#.to_string())]).await;
        let transport = fast_transport(url, None);

        let order = OrderRequest::market("EURUSD", OrderSide::Buy, 0.1);
        let response = transport
            .send(&request(&Command::PlaceOrder(order)))
            .await
            .expect("send");
        assert_eq!(response.get_u64("ticket"), 12345);

        let raw = rx.recv().await.expect("captured request");
        assert!(raw.starts_with("POST /api/v1/trade/order"));
        assert!(raw.contains(r#""symbol":"EURUSD""#));
        assert!(raw.contains(r#""type":"BUY""#));
        assert!(raw.contains(r#""volume":0.1"#));
        assert!(rx.try_recv().is_err(), "exactly one request expected");
    }

    #[tokio::test]
    async fn test_market_data_query_parameters() {
        let (url, mut rx) = spawn_http_server(vec![(200, r#"{"candles":[]}"#.to_string())]).await;
        let transport = fast_transport(url, None);

        let command = Command::GetMarketData {
            symbol: "EURUSD".into(),
            timeframe: "M1".into(),
            count: 100,
        };
        transport.send(&request(&command)).await.expect("send");

        let raw = rx.recv().await.expect("captured request");
        let request_line = raw.lines().next().expect("request line");
        assert!(request_line.starts_with("GET /api/v1/market/data?"));
        assert!(request_line.contains("symbol=EURUSD"));
        assert!(request_line.contains("timeframe=M1"));
        assert!(request_line.contains("count=100"));
    }

    #[tokio::test]
    async fn test_close_position_routes_by_ticket() {
        let (url, mut rx) = spawn_http_server(vec![(200, r#"{"success":true}"#.to_string())]).await;
        let transport = fast_transport(url, None);

        transport
            .send(&request(&Command::ClosePosition { ticket: 777 }))
            .await
            .expect("send");

        let raw = rx.recv().await.expect("captured request");
        assert!(raw.starts_with("DELETE /api/v1/trade/position/777"));
    }

    #[tokio::test]
    async fn test_bearer_token_header() {
        let (url, mut rx) = spawn_http_server(vec![(200, String::new())]).await;
        let transport = fast_transport(url, Some("secret-key".into()));

        transport.send(&request(&Command::Ping)).await.expect("send");

        let raw = rx.recv().await.expect("captured request").to_lowercase();
        assert!(raw.contains("authorization: bearer secret-key"));
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            // Accept and read, never answer.
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let url = Url::parse(&format!("http://{addr}/")).expect("url");
        let transport = fast_transport(url, None);

        let req = CommandRequest::new(&Command::Ping, Duration::from_millis(100));
        let err = transport.send(&req).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_unmapped_command_is_rejected() {
        let transport = fast_transport(Url::parse("http://127.0.0.1:1/").expect("url"), None);

        let mut req = request(&Command::Ping);
        req.command = "bogus_command".into();

        let err = transport.send(&req).await.unwrap_err();
        assert!(matches!(err, Error::UnknownCommand { .. }));
    }
}

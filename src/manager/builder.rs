//! Builder pattern for bridge configuration.
//!
//! Provides a fluent API for configuring and creating [`BridgeManager`]
//! instances.
//!
//! # Example
//!
//! ```no_run
//! use mt5_bridge::BridgeManager;
//!
//! # fn example() -> mt5_bridge::Result<()> {
//! let manager = BridgeManager::builder()
//!     .channel_addr("127.0.0.1:5555")
//!     .http_base_url("http://127.0.0.1:8082")
//!     .auto_launch(false)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

use super::core::BridgeManager;

// ============================================================================
// Defaults
// ============================================================================

/// Default message-channel address.
const DEFAULT_CHANNEL_ADDR: &str = "127.0.0.1:5555";

/// Default HTTP gateway base URL.
const DEFAULT_HTTP_BASE_URL: &str = "http://127.0.0.1:8082/";

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Platform-default drop directory.
fn default_drop_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("mt5-bridge")
        .join("drop")
}

// ============================================================================
// BridgeOptions
// ============================================================================

/// Validated bridge configuration.
#[derive(Debug, Clone)]
pub(crate) struct BridgeOptions {
    /// Message-channel address, `host:port`.
    pub channel_addr: String,

    /// HTTP gateway base URL.
    pub http_base_url: Url,

    /// Optional bearer token for the HTTP gateway.
    pub api_key: Option<String>,

    /// File-drop mailbox directory.
    pub drop_dir: PathBuf,

    /// Launch the terminal when it is not running.
    pub auto_launch: bool,

    /// Explicit terminal executable path.
    pub executable_hint: Option<PathBuf>,

    /// Per-request timeout for domain operations.
    pub request_timeout: Duration,

    /// Probe ping timeout override; per-kind defaults when unset.
    pub probe_timeout: Option<Duration>,

    /// HTTP retry backoff base override.
    pub http_backoff_base: Option<Duration>,
}

// ============================================================================
// BridgeBuilder
// ============================================================================

/// Builder for configuring a [`BridgeManager`] instance.
///
/// Use [`BridgeManager::builder()`] to create a new builder. Every field has
/// a sensible default; `build()` validates the result.
#[derive(Debug, Default, Clone)]
pub struct BridgeBuilder {
    channel_addr: Option<String>,
    http_base_url: Option<String>,
    api_key: Option<String>,
    drop_dir: Option<PathBuf>,
    auto_launch: Option<bool>,
    executable_hint: Option<PathBuf>,
    request_timeout: Option<Duration>,
    probe_timeout: Option<Duration>,
    http_backoff_base: Option<Duration>,
}

impl BridgeBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message-channel address (`host:port`).
    #[inline]
    #[must_use]
    pub fn channel_addr(mut self, addr: impl Into<String>) -> Self {
        self.channel_addr = Some(addr.into());
        self
    }

    /// Sets the HTTP gateway base URL.
    #[inline]
    #[must_use]
    pub fn http_base_url(mut self, url: impl Into<String>) -> Self {
        self.http_base_url = Some(url.into());
        self
    }

    /// Sets the bearer token sent to the HTTP gateway.
    #[inline]
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the file-drop mailbox directory.
    ///
    /// Defaults to a `mt5-bridge/drop` directory under the platform's local
    /// data directory.
    #[inline]
    #[must_use]
    pub fn drop_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.drop_dir = Some(dir.into());
        self
    }

    /// Enables or disables launching the terminal when it is not running.
    ///
    /// Enabled by default.
    #[inline]
    #[must_use]
    pub fn auto_launch(mut self, enabled: bool) -> Self {
        self.auto_launch = Some(enabled);
        self
    }

    /// Sets an explicit terminal executable path, tried before the platform
    /// default install locations.
    #[inline]
    #[must_use]
    pub fn executable_hint(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_hint = Some(path.into());
        self
    }

    /// Sets the per-request timeout for domain operations.
    #[inline]
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Overrides the probe ping timeout for every transport kind.
    #[inline]
    #[must_use]
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Overrides the HTTP retry backoff base.
    #[inline]
    #[must_use]
    pub fn http_backoff_base(mut self, base: Duration) -> Self {
        self.http_backoff_base = Some(base);
        self
    }

    /// Builds the manager with validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a malformed channel address, HTTP base
    /// URL, or zero request timeout.
    pub fn build(self) -> Result<BridgeManager> {
        let channel_addr = self
            .channel_addr
            .unwrap_or_else(|| DEFAULT_CHANNEL_ADDR.to_string());
        if !channel_addr.contains(':') {
            return Err(Error::config(format!(
                "channel address must be host:port, got {channel_addr:?}"
            )));
        }

        let raw_url = self
            .http_base_url
            .unwrap_or_else(|| DEFAULT_HTTP_BASE_URL.to_string());
        let http_base_url = Url::parse(&raw_url)
            .map_err(|e| Error::config(format!("invalid HTTP base URL {raw_url:?}: {e}")))?;

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        if request_timeout.is_zero() {
            return Err(Error::config("request timeout must be non-zero"));
        }

        let options = BridgeOptions {
            channel_addr,
            http_base_url,
            api_key: self.api_key,
            drop_dir: self.drop_dir.unwrap_or_else(default_drop_dir),
            auto_launch: self.auto_launch.unwrap_or(true),
            executable_hint: self.executable_hint,
            request_timeout,
            probe_timeout: self.probe_timeout,
            http_backoff_base: self.http_backoff_base,
        };

        Ok(BridgeManager::new(options))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build() {
        let manager = BridgeBuilder::new().build().expect("build");
        assert_eq!(
            manager.state(),
            crate::manager::ConnectionState::Uninitialized
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = BridgeBuilder::new()
            .http_base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_channel_addr_requires_port() {
        let err = BridgeBuilder::new()
            .channel_addr("localhost")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = BridgeBuilder::new()
            .request_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_default_drop_dir_is_namespaced() {
        let dir = default_drop_dir();
        assert!(dir.ends_with("mt5-bridge/drop"));
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = BridgeBuilder::new().channel_addr("127.0.0.1:5556");
        let cloned = builder.clone();
        assert_eq!(builder.channel_addr, cloned.channel_addr);
    }
}

//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization
//! - Manager construction from flags

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use mt5_bridge::{BridgeManager, Result};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub auto_launch: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            auto_launch: args.iter().any(|a| a == "--auto-launch"),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "mt5_bridge=debug"
    } else {
        "mt5_bridge=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Build a manager from the default local endpoints.
///
/// Override the HTTP gateway with `MT5_BRIDGE_HTTP_URL` and the message
/// channel with `MT5_BRIDGE_CHANNEL_ADDR`.
pub fn build_manager(args: &Args) -> Result<BridgeManager> {
    let mut builder = BridgeManager::builder().auto_launch(args.auto_launch);

    if let Ok(url) = std::env::var("MT5_BRIDGE_HTTP_URL") {
        builder = builder.http_base_url(url);
    }
    if let Ok(addr) = std::env::var("MT5_BRIDGE_CHANNEL_ADDR") {
        builder = builder.channel_addr(addr);
    }

    builder.build()
}

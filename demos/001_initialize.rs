//! Transport probing and lifecycle.
//!
//! Demonstrates:
//! - Building a manager with the validating builder
//! - Probing transports in priority order
//! - Reading connection state and health
//! - Clean shutdown
//!
//! Usage:
//!   cargo run --example 001_initialize
//!   cargo run --example 001_initialize -- --debug
//!   cargo run --example 001_initialize -- --auto-launch

mod common;

// ============================================================================
// Imports
// ============================================================================

use common::Args;
use mt5_bridge::Result;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== 001: Initialize ===\n");

    // ========================================================================
    // Build Manager
    // ========================================================================

    println!("[1] Building manager...");
    let manager = common::build_manager(&args)?;
    println!("    ✓ Manager ready (state: {:?})\n", manager.state());

    // ========================================================================
    // Probe Transports
    // ========================================================================

    println!("[2] Probing transports (channel > http > file drop)...");
    let kind = manager.initialize().await?;
    println!("    ✓ Connected via {kind}\n");

    // ========================================================================
    // Health
    // ========================================================================

    println!("[3] Health report...");
    let health = manager.health();
    println!("    State:  {:?}", health.state);
    println!(
        "    CPU:    {:.1}%  Memory: {:.1}%",
        health.resources.resources.cpu_percent, health.resources.resources.memory_percent
    );
    for alert in &health.resources.alerts {
        println!("    ⚠ {}", alert.message);
    }
    println!();

    // ========================================================================
    // Shutdown
    // ========================================================================

    println!("[4] Shutting down...");
    manager.shutdown().await;
    println!("    ✓ Done (state: {:?})", manager.state());

    Ok(())
}

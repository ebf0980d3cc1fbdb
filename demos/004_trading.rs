//! Order placement and position management.
//!
//! Demonstrates:
//! - Placing a market order with stops
//! - Listing open positions
//! - Closing a position by ticket
//! - History queries
//!
//! Usage:
//!   cargo run --example 004_trading
//!   cargo run --example 004_trading -- --debug
//!
//! CAUTION: places a real order against whatever terminal answers the probe.
//! Point the bridge at a demo account.

mod common;

// ============================================================================
// Imports
// ============================================================================

use common::Args;
use mt5_bridge::{HistoryFilter, OrderRequest, OrderSide, Result};

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
    println!("=== 004: Trading ===\n");

    let manager = common::build_manager(&args)?;
    let kind = manager.initialize().await?;
    println!("[1] Connected via {kind}\n");

    // ========================================================================
    // Place Order
    // ========================================================================

    println!("[2] Placing market order (EURUSD BUY 0.01)...");
    let order = OrderRequest::market("EURUSD", OrderSide::Buy, 0.01)
        .with_sl(1.0500)
        .with_tp(1.1500)
        .with_comment("mt5-bridge demo");
    let verdict = manager.place_order(order).await?;
    println!("    ✓ Ticket: {}\n", verdict["ticket"]);

    // ========================================================================
    // Positions
    // ========================================================================

    println!("[3] Open positions...");
    let positions = manager.get_positions().await?;
    println!("    {} open", positions.len());
    for position in &positions {
        println!("    - {position}");
    }
    println!();

    if let Some(ticket) = positions
        .first()
        .and_then(|p| p.get("ticket"))
        .and_then(|t| t.as_u64())
    {
        println!("[4] Closing position {ticket}...");
        manager.close_position(ticket).await?;
        println!("    ✓ Closed\n");
    }

    // ========================================================================
    // History
    // ========================================================================

    println!("[5] Recent deals...");
    let deals = manager.get_history_deals(HistoryFilter::default()).await?;
    println!("    {} deals", deals.len());
    for deal in deals.iter().take(5) {
        println!("    - {deal}");
    }
    println!();

    manager.shutdown().await;
    println!("✓ Done");

    Ok(())
}

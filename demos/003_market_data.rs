//! Market data queries.
//!
//! Demonstrates:
//! - Listing tradable symbols
//! - Static symbol information
//! - Candle data for a symbol/timeframe
//!
//! Usage:
//!   cargo run --example 003_market_data
//!   cargo run --example 003_market_data -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use common::Args;
use mt5_bridge::Result;

// ============================================================================
// Constants
// ============================================================================

const SYMBOL: &str = "EURUSD";
const TIMEFRAME: &str = "M1";
const CANDLES: u32 = 10;

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
    println!("=== 003: Market Data ===\n");

    let manager = common::build_manager(&args)?;
    let kind = manager.initialize().await?;
    println!("[1] Connected via {kind}\n");

    println!("[2] Tradable symbols...");
    let symbols = manager.get_symbols().await?;
    println!("    {} symbols", symbols.len());
    for symbol in symbols.iter().take(10) {
        println!("    - {symbol}");
    }
    println!();

    println!("[3] Symbol info for {SYMBOL}...");
    let info = manager.get_symbol_info(SYMBOL).await?;
    println!("    {info}\n");

    println!("[4] Last {CANDLES} {TIMEFRAME} candles for {SYMBOL}...");
    let candles = manager.get_market_data(SYMBOL, TIMEFRAME, CANDLES).await?;
    println!("    {candles}\n");

    manager.shutdown().await;
    println!("✓ Done");

    Ok(())
}

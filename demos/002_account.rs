//! Account and status queries.
//!
//! Demonstrates:
//! - Terminal status
//! - Full account record
//! - Balance and equity conveniences
//!
//! Usage:
//!   cargo run --example 002_account
//!   cargo run --example 002_account -- --debug

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
    println!("=== 002: Account ===\n");

    let manager = common::build_manager(&args)?;
    let kind = manager.initialize().await?;
    println!("[1] Connected via {kind}\n");

    println!("[2] Terminal status...");
    let status = manager.get_status().await?;
    println!("    {status}\n");

    println!("[3] Account info...");
    let account = manager.get_account_info().await?;
    println!("    {account}\n");

    println!("[4] Balance / equity...");
    let balance = manager.get_account_balance().await?;
    let equity = manager.get_account_equity().await?;
    println!("    Balance: {balance:.2}");
    println!("    Equity:  {equity:.2}\n");

    manager.shutdown().await;
    println!("✓ Done");

    Ok(())
}

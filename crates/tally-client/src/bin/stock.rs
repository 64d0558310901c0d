//! # Stock Viewer
//!
//! Fetches the stock list the POS would load and prints it.
//!
//! ## Usage
//! ```bash
//! # Print every item
//! TALLY_TOKEN=... cargo run -p tally-client --features cli --bin stock
//!
//! # Filter like the POS search box
//! TALLY_TOKEN=... cargo run -p tally-client --features cli --bin stock -- --search coffee
//!
//! # Only items at or below their reorder threshold
//! TALLY_TOKEN=... cargo run -p tally-client --features cli --bin stock -- --low
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tally_client::{load_inventory, ClientConfig, HttpBackend, PosBackend, SessionContext};
use tally_core::InventoryItem;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut search: Option<String> = None;
    let mut low_only = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--search" | "-s" => {
                if i + 1 < args.len() {
                    search = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--low" | "-l" => low_only = true,
            "--help" | "-h" => {
                println!("Tally POS Stock Viewer");
                println!();
                println!("Usage: stock [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>   Config file (default: platform config dir)");
                println!("  -s, --search <TEXT>   Only items matching the POS search");
                println!("  -l, --low             Only items at or below min stock");
                println!("  -h, --help            Show this help message");
                println!();
                println!("The bearer token is read from TALLY_TOKEN.");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = ClientConfig::load(config_path)?;
    let session = SessionContext::from_env("TALLY_TOKEN")?;
    let backend: Arc<dyn PosBackend> = Arc::new(HttpBackend::new(&config)?);

    info!(url = %config.api.base_url, "Fetching stock");
    let inventory = load_inventory(backend.as_ref(), &session).await?;

    let items: Vec<&InventoryItem> = match &search {
        Some(query) => inventory.search(query),
        None => inventory.items().iter().collect(),
    };

    println!("{:<8} {:<14} {:<36} {:>10} {:>6}", "ID", "SKU", "NAME", "PRICE", "STOCK");
    let mut shown = 0;
    for item in items.into_iter().filter(|item| !low_only || item.is_low_stock()) {
        let marker = if item.is_low_stock() { "  ⚠ low" } else { "" };
        println!(
            "{:<8} {:<14} {:<36} {:>10} {:>6}{}",
            item.id,
            item.sku,
            item.name,
            item.unit_price.to_string(),
            item.quantity_available,
            marker
        );
        shown += 1;
    }

    println!();
    println!(
        "{} shown, {} total, {} low on stock",
        shown,
        inventory.len(),
        inventory.low_stock().len()
    );
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug and above
/// - Default: INFO, DEBUG for tally_client
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally_client=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

//! Cafeteria Dashboard API Server Binary
//!
//! Run with: `cargo run --bin cafeteria-server`

use cafeteria::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tracing is initialized in run_server(); RUST_LOG controls the level:
    //   RUST_LOG=debug cargo run --bin cafeteria-server
    let config = ServerConfig::from_env();

    println!("Starting Cafeteria Dashboard API Server...");
    println!("   Host: {}", config.host);
    println!("   Port: {}", config.port);
    println!("   Database: {}", config.database_path);
    println!("   Table: {}", config.table);
    println!();
    println!("Available endpoints:");
    println!("  GET  /health                 - Health check");
    println!("  GET  /filters                - Filter choices");
    println!("  GET  /dashboard              - Meal, gender and monthly summaries");
    println!("  GET  /export/:table          - CSV download (category|gender|timeseries|transactions)");
    println!("  POST /dataset/reload         - Re-read the transaction table");
    println!();

    run_server(config).await?;

    Ok(())
}

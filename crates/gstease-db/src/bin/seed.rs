//! # Seed Data Generator
//!
//! Populates the database with a small catalog and a few customers for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed ./gstease_dev.db
//! cargo run -p gstease-db --bin seed
//!
//! # Specify database path
//! cargo run -p gstease-db --bin seed -- --db ./data/gstease.db
//! ```
//!
//! ## Generated Data
//! - Products across the common GST slabs (0%, 5%, 12%, 18%, 28%), some of
//!   them already at or below their low-stock threshold
//! - One B2B customer with a GSTIN, one B2C walk-in customer

use std::env;

use gstease_core::{GstRate, Money};
use gstease_db::{reference, Database, DbConfig, NewCustomer, NewProduct};
use tracing::{info, warn};

/// (name, HSN code, unit, price in paise, GST bps, opening stock)
const PRODUCTS: &[(&str, &str, &str, i64, u32, i64)] = &[
    ("Basmati Rice 5kg", "1006", "bag", 64_900, 500, 40),
    ("Toor Dal 1kg", "0713", "pkt", 15_500, 0, 60),
    ("Sunflower Oil 1L", "1512", "btl", 17_900, 500, 8),
    ("Ghee 500ml", "0405", "jar", 32_000, 1200, 25),
    ("Basmati Biscuits", "1905", "pkt", 3_000, 1800, 120),
    ("Steel Tiffin Box", "7323", "pcs", 45_000, 1200, 5),
    ("LED Bulb 9W", "8539", "pcs", 9_900, 1200, 3),
    ("Ceiling Fan", "8414", "pcs", 229_900, 1800, 12),
    ("Mobile Charger", "8504", "pcs", 59_900, 1800, 0),
    ("Air Conditioner 1.5T", "8415", "pcs", 3_499_900, 2800, 4),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./gstease_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("GST Ease Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./gstease_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, "Seeding database");
    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let mut inserted = 0;
    for (name, hsn, unit, price, bps, stock) in PRODUCTS {
        let new = NewProduct::new(*name, Money::from_paise(*price), GstRate::from_bps(*bps))
            .hsn_code(*hsn)
            .unit(*unit)
            .opening_stock(*stock);

        match db.products().insert(&new).await {
            Ok(product) => {
                inserted += 1;
                // One purchase so the history view has something to show
                if product.stock_quantity > 0 {
                    db.stock()
                        .add(&product.id, 1, reference::PURCHASE_ORDER, Some("PO-SEED"))
                        .await?;
                }
            }
            Err(e) => warn!(name = %name, error = %e, "Failed to insert product"),
        }
    }

    db.customers()
        .insert(
            &NewCustomer::new("Sharma Electronics")
                .email("accounts@sharma-electronics.example")
                .state("Maharashtra")
                .business("27AAPFU0939F1ZV"),
        )
        .await?;
    db.customers()
        .insert(&NewCustomer::new("Walk-in Customer").state("Maharashtra"))
        .await?;

    let low = db.products().low_stock().await?;
    info!(products = inserted, customers = 2, low_stock = low.len(), "Seed complete");

    Ok(())
}

//! # Seed Data Generator
//!
//! Populates the database with a small rental catalog for development.
//!
//! ## Usage
//! ```bash
//! # Default database, 40 orders
//! cargo run -p rental-db --bin seed
//!
//! # Custom amount of orders
//! cargo run -p rental-db --bin seed -- --orders 200
//!
//! # Specify database path
//! cargo run -p rental-db --bin seed -- --db ./data/rental.db
//! ```
//!
//! ## Generated Data
//! - Single products across audio, lighting and stage categories
//! - Packs bundling those products at fixed per-pack quantities
//! - Orders over the next 60 days, in every lifecycle state

use chrono::{Duration, Utc};
use rental_core::{ComponentSpec, DateRange, OrderStatus, Product, ProductStatus};
use rental_db::{Database, DbConfig, NewOrderItem};
use std::env;

/// (sku, name, price per day in cents, units owned)
const CATALOG: &[(&str, &str, i64, i64)] = &[
    ("AUD-SPK-15", "Active Speaker 15\"", 3500, 8),
    ("AUD-SUB-18", "Subwoofer 18\"", 5000, 4),
    ("AUD-MIX-12", "Mixer 12 Channels", 4000, 3),
    ("AUD-MIC-58", "Dynamic Microphone", 800, 20),
    ("AUD-MIC-HF", "Wireless Microphone", 2500, 6),
    ("LGT-PAR-LED", "LED Par", 1200, 24),
    ("LGT-MOV-HD", "Moving Head", 4500, 6),
    ("LGT-SMK-01", "Smoke Machine", 3000, 2),
    ("STG-PLT-2x1", "Stage Platform 2x1m", 2000, 16),
    ("STG-STD-SPK", "Speaker Stand", 500, 16),
];

/// (sku, name, pack price per day in cents, [(component sku, quantity per pack)])
const PACKS: &[(&str, &str, i64, &[(&str, i64)])] = &[
    (
        "PCK-DJ",
        "DJ Set",
        9900,
        &[("AUD-SPK-15", 2), ("AUD-MIX-12", 1), ("STG-STD-SPK", 2)],
    ),
    (
        "PCK-CONF",
        "Conference Pack",
        6900,
        &[("AUD-SPK-15", 2), ("AUD-MIC-HF", 2), ("AUD-MIX-12", 1)],
    ),
    (
        "PCK-PARTY",
        "Party Lights",
        7500,
        &[("LGT-PAR-LED", 8), ("LGT-MOV-HD", 2), ("LGT-SMK-01", 1)],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut order_count: usize = 40;
    let mut db_path = String::from("./rental_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--orders" | "-o" => {
                if i + 1 < args.len() {
                    order_count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Rental Engine Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -o, --orders <N>   Number of orders to generate (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: ./rental_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Rental Engine Seed Data Generator");
    println!("====================================");
    println!("Database: {}", db_path);
    println!("Orders:   {}", order_count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalog
    for (sku, name, price, stock) in CATALOG {
        db.products().insert(&product(sku, name, *price, *stock, false)).await?;
    }
    println!("✓ Inserted {} products", CATALOG.len());

    // Packs
    for (sku, name, price, components) in PACKS {
        db.products().insert(&product(sku, name, *price, 0, true)).await?;
        let specs: Vec<ComponentSpec> = components
            .iter()
            .map(|(component, qty)| ComponentSpec {
                component_id: component.to_lowercase(),
                quantity_per_pack: *qty,
            })
            .collect();
        db.components().replace_components(&sku.to_lowercase(), &specs).await?;
    }
    println!("✓ Inserted {} packs", PACKS.len());

    // Orders, spread deterministically over the next 60 days
    let today = Utc::now().date_naive();
    let statuses = [
        OrderStatus::Pending,
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    for n in 0..order_count {
        let (sku, _, _, stock) = CATALOG[(n * 7) % CATALOG.len()];
        let start = today + Duration::days(((n * 13) % 60) as i64);
        let end = start + Duration::days(((n % 4) + 1) as i64);
        let quantity = ((n % 3) as i64 + 1).min(stock);

        let item = NewOrderItem {
            product_id: sku.to_lowercase(),
            quantity,
            range: DateRange::new(start, end)?,
        };
        db.orders()
            .create_order(statuses[n % statuses.len()], &[item])
            .await?;
    }
    println!("✓ Generated {} orders", order_count);

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

/// Products use the lowercased SKU as both id and slug, so packs can name
/// their components without a lookup.
fn product(sku: &str, name: &str, price_per_day_cents: i64, real_stock: i64, is_pack: bool) -> Product {
    let now = Utc::now();
    Product {
        id: sku.to_lowercase(),
        sku: sku.to_string(),
        slug: sku.to_lowercase(),
        name: name.to_string(),
        price_per_day_cents,
        real_stock,
        stock: real_stock,
        available_stock: real_stock,
        is_pack,
        is_active: true,
        status: ProductStatus::Available,
        created_at: now,
        updated_at: now,
    }
}

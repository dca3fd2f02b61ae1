//! # Seed Data Generator
//!
//! Populates a development database with a small store: products, a few
//! customers and a supplier.
//!
//! ## Usage
//! ```bash
//! # Seed ./depot_dev.db
//! cargo run -p depot-db --bin seed
//!
//! # Specify database path
//! cargo run -p depot-db --bin seed -- --db ./data/depot.db
//! ```
//!
//! Products get a barcode `740{seq:010}`, a cost of 70% of the price and a
//! starting stock between 0 and 60, recorded as an `entry` movement.

use std::env;

use depot_db::{CustomerInput, Database, DbConfig, NewProduct, NewSupplier};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (name, price in cents)
const PRODUCTS: &[(&str, i64)] = &[
    ("Aceite Ideal 1L", 2_450),
    ("Arroz Gallo Dorado 1lb", 700),
    ("Azucar blanca 1lb", 550),
    ("Frijol negro 1lb", 900),
    ("Harina Maseca 1kg", 1_250),
    ("Cafe Incasa 200g", 2_500),
    ("Leche Dos Pinos 1L", 1_200),
    ("Huevos carton 30", 4_200),
    ("Sal Marina 500g", 300),
    ("Pasta Ina 200g", 450),
    ("Sardinas 155g", 950),
    ("Gaseosa 3L", 2_100),
    ("Agua pura 600ml", 500),
    ("Jabon de ropa 500g", 1_100),
    ("Papel higienico 4 rollos", 1_600),
    ("Consome de pollo 12 cubos", 800),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Tienda La Esquina", "5555-0101"),
    ("Abarroteria Don Pepe", "5555-0202"),
    ("Comedor Mary", "5555-0303"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./depot_dev.db");

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
                println!("Depot POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./depot_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding database");
    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    for (seq, (name, price_cents)) in PRODUCTS.iter().enumerate() {
        let input = NewProduct {
            name: name.to_string(),
            barcode: Some(format!("740{:010}", seq + 1)),
            cost_cents: price_cents * 70 / 100,
            price_cents: *price_cents,
            initial_stock: ((seq * 17) % 61) as i64,
        };
        if let Err(e) = db.products().create(&input).await {
            warn!(name = %name, error = %e, "Failed to create product");
        }
    }

    for (name, phone) in CUSTOMERS {
        db.customers()
            .create(&CustomerInput {
                name: name.to_string(),
                phone: Some(phone.to_string()),
                ..Default::default()
            })
            .await?;
    }

    db.suppliers()
        .create(&NewSupplier {
            name: "Distribuidora Central".to_string(),
            contact: Some("Ventas".to_string()),
            phone: Some("2222-0000".to_string()),
            ..Default::default()
        })
        .await?;

    info!(
        products = db.products().count().await?,
        customers = CUSTOMERS.len(),
        "Seed complete"
    );
    db.close().await;
    Ok(())
}

//! # Seed Data Generator
//!
//! Populates the database with a small catalog, a few clients and sample
//! orders for development.
//!
//! ## Usage
//! ```bash
//! # Default database path
//! cargo run -p facture-db --bin seed
//!
//! # Specify database path
//! cargo run -p facture-db --bin seed -- --db ./data/facture.db
//!
//! # Skip the sample orders
//! cargo run -p facture-db --bin seed -- --no-orders
//! ```
//!
//! Everything goes through the services, so the seeded rows obey the same
//! validation, numbering and invoice rules as real traffic.

use std::env;
use std::sync::Arc;

use anyhow::Context;
use facture_core::{OrderStatus, PaymentMethod, Product, SystemClock};
use facture_db::{
    CategoryInput, ClientInput, Database, DbConfig, LineRequest, NewOrder, ProductInput, Services,
};

/// Categories with their products: (name, price in cents, stock).
const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Papeterie",
        &[
            ("Ramette papier A4", 549, 120),
            ("Stylo bille bleu", 120, 500),
            ("Cahier grands carreaux", 345, 80),
            ("Classeur à levier", 429, 40),
            ("Surligneurs (x4)", 599, 3),
        ],
    ),
    (
        "Informatique",
        &[
            ("Clé USB 64 Go", 1290, 25),
            ("Souris sans fil", 2490, 12),
            ("Clavier AZERTY", 3490, 0),
            ("Câble HDMI 2 m", 990, 30),
        ],
    ),
    (
        "Mobilier",
        &[
            ("Bureau chêne 140 cm", 24900, 4),
            ("Chaise ergonomique", 18900, 6),
            ("Lampe de bureau LED", 3990, 15),
        ],
    ),
];

/// (email, last name, first name, city)
const CLIENTS: &[(&str, &str, &str, &str)] = &[
    ("alice.martin@example.fr", "Martin", "Alice", "Lyon"),
    ("paul.durand@example.fr", "Durand", "Paul", "Nantes"),
    ("chloe.bernard@example.fr", "Bernard", "Chloé", "Lille"),
    ("hugo.petit@example.fr", "Petit", "Hugo", "Bordeaux"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./data/facture.db");
    let mut with_orders = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--no-orders" => with_orders = false,
            "--help" | "-h" => {
                println!("Facture Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./data/facture.db)");
                println!("      --no-orders    Only seed catalog and clients");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    println!("🌱 Facture Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("opening database")?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let services = Services::new(db.clone(), Arc::new(SystemClock));

    // Catalog
    let mut products: Vec<Product> = Vec::new();
    for (category_name, items) in CATALOG {
        let category = services
            .catalog
            .create_category(CategoryInput {
                name: category_name.to_string(),
                description: None,
                is_active: Some(true),
            })
            .await
            .with_context(|| format!("creating category {}", category_name))?;

        for (name, price_cents, stock) in items.iter() {
            let product = services
                .catalog
                .create_product(ProductInput {
                    category_id: Some(category.id.clone()),
                    name: name.to_string(),
                    description: None,
                    price_cents: *price_cents,
                    stock_quantity: *stock,
                    low_stock_threshold: 5,
                    is_available: *stock > 0,
                })
                .await
                .with_context(|| format!("creating product {}", name))?;
            products.push(product);
        }
    }
    println!("✓ {} categories, {} products", CATALOG.len(), products.len());

    // Clients
    let mut client_ids = Vec::new();
    for (email, last_name, first_name, city) in CLIENTS {
        let client = services
            .clients
            .create_client(ClientInput {
                email: email.to_string(),
                last_name: last_name.to_string(),
                first_name: first_name.to_string(),
                phone: None,
                address: Some(format!("1 place de la Mairie, {}", city)),
                role: None,
            })
            .await
            .with_context(|| format!("creating client {}", email))?;
        client_ids.push(client.id);
    }
    println!("✓ {} clients", client_ids.len());

    if with_orders {
        let orderable: Vec<&Product> = products.iter().filter(|p| p.is_available).collect();
        let mut created = 0;

        for (index, client_id) in client_ids.iter().enumerate() {
            let lines = orderable
                .iter()
                .skip(index)
                .step_by(3)
                .take(3)
                .enumerate()
                .map(|(n, product)| LineRequest {
                    product_id: product.id.clone(),
                    quantity: n as i64 + 1,
                })
                .collect::<Vec<_>>();

            let details = services
                .orders
                .create_order_with_lines(NewOrder {
                    client_id: client_id.clone(),
                    tax_rate_bps: None,
                    comment: None,
                    lines,
                })
                .await?;
            created += 1;

            // A mix of states: paid, paid and delivered, still pending.
            match index % 3 {
                0 => {
                    services.orders.change_status(&details.order.id, OrderStatus::Paid).await?;
                    services
                        .orders
                        .change_payment_method(&details.order.id, PaymentMethod::Card)
                        .await?;
                }
                1 => {
                    services.orders.change_status(&details.order.id, OrderStatus::Paid).await?;
                    services
                        .orders
                        .change_status(&details.order.id, OrderStatus::Delivered)
                        .await?;
                }
                _ => {}
            }
        }
        println!("✓ {} orders with invoices", created);
    }

    let stats = services.invoices.stats().await?;
    println!();
    println!(
        "  Invoices: {} ({} paid, {} pending)",
        stats.total_invoices, stats.paid_invoices, stats.pending_invoices
    );
    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

//! # Seed Data Generator
//!
//! Populates the database with demo master data and a batch of documents
//! for development.
//!
//! ## Usage
//! ```bash
//! # Seed with defaults
//! cargo run -p kasira-db --bin seed
//!
//! # Specify database path and sale count
//! cargo run -p kasira-db --bin seed -- --db ./data/kasira.db --sales 200
//! ```
//!
//! Seeds a small grocery catalogue, a handful of suppliers and members,
//! one restocking purchase per supplier, and a spread of paid sales over
//! the last 30 days.

use chrono::{Duration, Utc};
use std::env;

use kasira_core::money::Money;
use kasira_core::pricing::LineInput;
use kasira_core::types::{DocumentStatus, PaymentMethod};
use kasira_db::service::catalog::{NewItem, NewMember, NewSupplier};
use kasira_db::service::purchase::CreatePurchase;
use kasira_db::service::sale::CreateSale;
use kasira_db::{Database, DbConfig};

/// (name, sell price in minor units, minimum stock)
const ITEMS: &[(&str, i64, i64)] = &[
    ("Rice 5kg", 65_000, 10),
    ("Cooking Oil 1L", 18_000, 20),
    ("Sugar 1kg", 14_000, 15),
    ("Wheat Flour 1kg", 12_000, 10),
    ("Instant Noodles", 3_000, 50),
    ("Sweetened Condensed Milk", 11_000, 20),
    ("Ground Coffee 200g", 25_000, 10),
    ("Tea Bags 25s", 9_000, 10),
    ("Dish Soap 800ml", 15_000, 10),
    ("Laundry Detergent 1kg", 22_000, 10),
    ("Drinking Water 600ml", 3_500, 60),
    ("Eggs 1kg", 28_000, 15),
];

const SUPPLIERS: &[&str] = &["Toko Grosir Makmur", "CV Sumber Pangan", "UD Berkah Jaya"];

const MEMBERS: &[&str] = &["Budi Santoso", "Siti Aminah", "Agus Wijaya", "Dewi Lestari"];

const PAYMENT_METHODS: &[PaymentMethod] =
    &[PaymentMethod::Cash, PaymentMethod::Cash, PaymentMethod::Transfer, PaymentMethod::Card];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut sale_count: usize = 100;
    let mut db_path = String::from("./kasira_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sale_count = args[i + 1].parse().unwrap_or(100);
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
                println!("Kasira Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sales <N>    Number of sales to generate (default: 100)");
                println!("  -d, --db <PATH>    Database file path (default: ./kasira_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Kasira Seed Data Generator");
    println!("=============================");
    println!("Database: {db_path}");
    println!("Sales:    {sale_count}");
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let catalog = db.catalog();

    if !catalog.list_items(&Default::default()).await?.is_empty() {
        println!("⚠ Database already has items");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Master data
    let mut item_codes = Vec::new();
    for (name, price, min_stock) in ITEMS {
        let item = catalog
            .create_item(NewItem {
                name: name.to_string(),
                description: None,
                sell_price: Money::from_minor(*price),
                opening_stock: 0,
                min_stock: *min_stock,
            })
            .await?;
        item_codes.push(item.code);
    }
    println!("✓ {} items", item_codes.len());

    let mut supplier_ids = Vec::new();
    for name in SUPPLIERS {
        let supplier = catalog
            .create_supplier(NewSupplier {
                name: name.to_string(),
                contact: None,
                address: None,
            })
            .await?;
        supplier_ids.push(supplier.id);
    }
    println!("✓ {} suppliers", supplier_ids.len());

    let mut member_codes = Vec::new();
    for name in MEMBERS {
        let member = catalog
            .create_member(NewMember {
                name: name.to_string(),
                phone: None,
                address: None,
            })
            .await?;
        member_codes.push(member.code);
    }
    println!("✓ {} members", member_codes.len());

    // One big restocking purchase per supplier, 35 days back so the sale
    // spread below always has stock
    let today = Utc::now().date_naive();
    let purchases = db.purchase_service();
    for (idx, supplier_id) in supplier_ids.iter().enumerate() {
        let lines: Vec<LineInput> = item_codes
            .iter()
            .skip(idx)
            .step_by(supplier_ids.len())
            .map(|code| LineInput {
                item_code: code.clone(),
                quantity: 500,
                unit_price: Money::from_minor(8_000),
                discount_bps: 0,
            })
            .collect();

        purchases
            .create(CreatePurchase {
                supplier_id: supplier_id.clone(),
                txn_date: today - Duration::days(35),
                lines,
                discount: Money::zero(),
                status: DocumentStatus::Paid,
                created_by: "seed".to_string(),
            })
            .await?;
    }
    println!("✓ {} restocking purchases", supplier_ids.len());

    // Sales spread over the last 30 days
    let sales = db.sale_service();
    let start = std::time::Instant::now();
    for n in 0..sale_count {
        let item = &item_codes[n % item_codes.len()];
        let day = today - Duration::days((n % 30) as i64);
        let member = if n % 3 == 0 {
            Some(member_codes[n % member_codes.len()].clone())
        } else {
            None
        };

        sales
            .create(CreateSale {
                member_code: member,
                customer_name: None,
                txn_date: day,
                lines: vec![LineInput {
                    item_code: item.clone(),
                    quantity: (n % 4 + 1) as i64,
                    unit_price: Money::from_minor(ITEMS[n % ITEMS.len()].1),
                    discount_bps: if n % 5 == 0 { 500 } else { 0 },
                }],
                discount: Money::zero(),
                payment_method: PAYMENT_METHODS[n % PAYMENT_METHODS.len()],
                status: DocumentStatus::Paid,
                created_by: "seed".to_string(),
            })
            .await?;

        if (n + 1) % 50 == 0 {
            println!("  Generated {} sales...", n + 1);
        }
    }
    println!("✓ {} sales in {:?}", sale_count, start.elapsed());

    // Sanity check the aggregates
    let report = db.reports().summarize(&Default::default()).await;
    let totals = report.totals;
    println!();
    println!("Summary:");
    println!("  Paid sales:     {} ({})", totals.sales_count, totals.sales_total);
    println!("  Paid purchases: {} ({})", totals.purchases_count, totals.purchases_total);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

//! # Seed Data Generator
//!
//! Populates a database with sample inventory and sales for development.
//!
//! ## Usage
//! ```bash
//! # Default: ./hisaab_dev.db, 30 sales
//! cargo run -p hisaab-db --bin seed
//!
//! # Custom sale count and database path
//! cargo run -p hisaab-db --bin seed -- --sales 200 --db ./data/hisaab.db
//! ```
//!
//! ## Generated Data
//! - One item per (brand, category, size): code `{BRAND}-{CAT}-{SIZE}`,
//!   MRP ₹40 - ₹2,000, GST 5% / 12% / 18% / 28%, stock 50 - 249
//! - Sales recorded through the reconciliation engine, so every sale has
//!   already taken its units out of stock

use anyhow::Context;
use chrono::{Duration, Local};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hisaab_core::{ItemInput, Money, Percentage, SaleInput};
use hisaab_db::{Database, DbConfig, DbError};

/// Brands and the code prefix used for their items.
const BRANDS: &[(&str, &str)] = &[
    ("SKF", "SKF"),
    ("FAG", "FAG"),
    ("NBC", "NBC"),
    ("Timken", "TMK"),
];

/// Categories with their code prefix and sub-categories (sizes).
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    ("Ball Bearing", "BB", &["6201", "6202", "6203", "6204", "6205"]),
    ("Taper Bearing", "TB", &["30203", "30204", "32205"]),
    ("Oil Seal", "OS", &["25x40x7", "30x47x7", "35x52x7"]),
    ("V Belt", "VB", &["A-32", "A-45", "B-50"]),
];

/// GST rates in basis points.
const GST_RATES: &[u32] = &[500, 1200, 1800, 2800];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut sales: usize = 30;
    let mut db_path = String::from("./hisaab_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sales" | "-s" => {
                if let Some(value) = args.get(i + 1) {
                    sales = value.parse().context("--sales expects a number")?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    db_path = value.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("hisaab seed data generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sales <N>    Number of sales to record (default: 30)");
                println!("  -d, --db <PATH>    Database file path (default: ./hisaab_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, sales, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    let existing = db.items().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has items, skipping seed");
        warn!("Delete the database file to regenerate");
        db.close().await;
        return Ok(());
    }

    // Items
    let mut codes = Vec::new();
    for (brand_idx, (brand, brand_code)) in BRANDS.iter().enumerate() {
        for (cat_idx, (category, cat_code, sizes)) in CATEGORIES.iter().enumerate() {
            for (size_idx, size) in sizes.iter().enumerate() {
                let seed = brand_idx * 100 + cat_idx * 10 + size_idx;
                let input = generate_item(brand, brand_code, category, cat_code, size, seed);

                match db.items().create(&input).await {
                    Ok(item) => codes.push(item.code),
                    Err(e) => warn!(code = %input.code, error = %e, "Failed to insert item"),
                }
            }
        }
    }
    info!(items = codes.len(), "Items created");

    // Sales
    if codes.is_empty() {
        anyhow::bail!("no items were created");
    }

    let today = Local::now().date_naive();
    let mut recorded = 0;
    for n in 0..sales {
        let code = &codes[(n * 7) % codes.len()];
        let item = db
            .items()
            .find_by_code(code)
            .await?
            .with_context(|| format!("item {code} vanished"))?;

        let input = SaleInput {
            date: Some(today - Duration::days((n % 30) as i64)),
            code: item.code.clone(),
            hsn_code: item.hsn_code.clone(),
            company_name: Some(item.company_name.clone()),
            category: item.category.clone(),
            subcategory: item.sub_category.clone(),
            purchase_price: item.purchase_price,
            selling_price_mrp: item.selling_price_mrp,
            quantity: Some(1 + (n % 5) as i64),
            discount: Percentage::from_bps(((n % 3) * 500) as u32),
            total_amount: None,
        };

        match db.sales().record(input).await {
            Ok(_) => recorded += 1,
            Err(DbError::Domain(e)) => warn!(code = %item.code, error = %e, "Sale skipped"),
            Err(e) => return Err(e.into()),
        }
    }

    info!(recorded, "Sales recorded");
    info!("Seed complete");

    db.close().await;
    Ok(())
}

/// Builds one item with deterministic pseudo-random figures.
fn generate_item(
    brand: &str,
    brand_code: &str,
    category: &str,
    cat_code: &str,
    size: &str,
    seed: usize,
) -> ItemInput {
    let mrp_rupees = 40 + ((seed * 37) % 1961) as i64;
    let mrp = Money::from_rupees(mrp_rupees);

    // Cost is 60-80% of MRP
    let cost_pct = 60 + (seed % 21) as i64;
    let purchase_price = Money::from_paise(mrp.paise() * cost_pct / 100);

    ItemInput {
        code: format!("{}-{}-{}", brand_code, cat_code, size.replace(['x', '-'], "")),
        hsn_code: Some(if cat_code == "VB" { "4010" } else { "8482" }.to_string()),
        company_name: brand.to_string(),
        category: category.to_string(),
        sub_category: size.to_string(),
        quantity: Some(50 + (seed % 200) as i64),
        purchase_price,
        selling_price_mrp: mrp,
        gst_rate: Percentage::from_bps(GST_RATES[seed % GST_RATES.len()]),
        rack_no: Some(format!("R{}", 1 + seed % 12)),
    }
}

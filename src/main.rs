use anyhow::Result;
use std::env;

use price_tracker::{
    list_recent_prices, market_count, open_database, price_count, product_count, register_market,
    register_price, register_product, Config, DEFAULT_RECENT_LIMIT,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config = Config::from_env();

    match args.get(1).map(String::as_str) {
        Some("init") => run_init(&config)?,
        Some("add-market") => run_add_market(&config, &args[2..])?,
        Some("add-product") => run_add_product(&config, &args[2..])?,
        Some("add-price") => run_add_price(&config, &args[2..])?,
        Some("help") | Some("--help") => print_usage(),
        _ => run_dashboard(&config)?,
    }

    Ok(())
}

fn print_usage() {
    println!("price-tracker - supermarket price tracking");
    println!();
    println!("Usage:");
    println!("  price-tracker                              Show the dashboard");
    println!("  price-tracker init                         Create the database schema");
    println!("  price-tracker add-market <name>            Register a market");
    println!("  price-tracker add-product <name> [brand]   Register a product");
    println!("  price-tracker add-price <product-id> <market-id> <amount>");
    println!();
    println!("Environment:");
    println!("  PRICE_TRACKER_DB     Database file (default: prices.db)");
    println!("  PRICE_TRACKER_ADDR   Server bind address (default: 0.0.0.0:3000)");
}

fn run_init(config: &Config) -> Result<()> {
    println!("🔧 Setting up database at {:?}...", config.db_path);
    open_database(&config.db_path)?;
    println!("✓ Schema ready");
    Ok(())
}

fn run_dashboard(config: &Config) -> Result<()> {
    let conn = open_database(&config.db_path)?;

    println!("🛒 Price Tracker");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "  {} markets, {} products, {} price observations",
        market_count(&conn)?,
        product_count(&conn)?,
        price_count(&conn)?
    );

    let recent = list_recent_prices(&conn, DEFAULT_RECENT_LIMIT)?;
    if recent.is_empty() {
        println!("\n  No prices recorded yet.");
        println!("  Run: price-tracker add-price <product-id> <market-id> <amount>");
        return Ok(());
    }

    println!("\n  Most recent observations:");
    for obs in recent {
        let brand = obs.brand.as_deref().unwrap_or("-");
        println!(
            "  {:>8.2}  {} ({}) @ {}  [{}]",
            obs.amount,
            obs.product_name,
            brand,
            obs.market_name,
            obs.recorded_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

fn run_add_market(config: &Config, args: &[String]) -> Result<()> {
    let Some(name) = args.first() else {
        println!("Usage: price-tracker add-market <name>");
        return Ok(());
    };

    let conn = open_database(&config.db_path)?;
    match register_market(&conn, name) {
        Ok(market) => println!("✓ Registered market '{}' (id {})", market.name, market.id),
        Err(e) if e.is_recoverable() => println!("⚠ {}", e),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

fn run_add_product(config: &Config, args: &[String]) -> Result<()> {
    let Some(name) = args.first() else {
        println!("Usage: price-tracker add-product <name> [brand]");
        return Ok(());
    };
    let brand = args.get(1).map(String::as_str);

    let conn = open_database(&config.db_path)?;
    match register_product(&conn, name, brand) {
        Ok(product) => println!("✓ Registered product '{}' (id {})", product.name, product.id),
        Err(e) if e.is_recoverable() => println!("⚠ {}", e),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

fn run_add_price(config: &Config, args: &[String]) -> Result<()> {
    let (Some(product_id), Some(market_id), Some(amount)) =
        (args.first(), args.get(1), args.get(2))
    else {
        println!("Usage: price-tracker add-price <product-id> <market-id> <amount>");
        return Ok(());
    };

    let Ok(product_id) = product_id.parse::<i64>() else {
        println!("⚠ product-id must be an integer");
        return Ok(());
    };
    let Ok(market_id) = market_id.parse::<i64>() else {
        println!("⚠ market-id must be an integer");
        return Ok(());
    };

    let conn = open_database(&config.db_path)?;
    match register_price(&conn, product_id, market_id, amount) {
        Ok(price) => println!("✓ Recorded price {:.2} (id {})", price.amount, price.id),
        Err(e) if e.is_recoverable() => println!("⚠ {}", e),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

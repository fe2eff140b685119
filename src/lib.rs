// Price Tracker - Core Library
// Exposes all modules for use in the CLI, the web server, and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod queries;
pub mod registry;

// Re-export commonly used types
pub use config::Config;
pub use db::{open_database, setup_database};
pub use entities::{Market, Price, PriceObservation, Product};
pub use error::RegistryError;
pub use queries::{
    find_market_by_id, find_price_by_id, find_product_by_id, list_markets, list_products,
    list_recent_prices, market_count, price_count, product_count, DEFAULT_RECENT_LIMIT,
};
pub use registry::{register_market, register_price, register_product};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Price Entity - a timestamped observation of a product's price at a market
//
// Prices are immutable once recorded. Multiple observations for the same
// product/market pair are expected; that is the price history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    /// SQLite rowid, assigned at insert time
    pub id: i64,
    /// Observed amount, non-negative
    pub amount: f64,
    /// When the observation was recorded (set by the registry, UTC)
    pub recorded_at: DateTime<Utc>,
    /// References products.id
    pub product_id: i64,
    /// References markets.id
    pub market_id: i64,
}

/// Read-side row: a price joined with its product and market names,
/// as shown on the dashboard and returned by the JSON API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub id: i64,
    pub product_name: String,
    pub brand: Option<String>,
    pub market_name: String,
    pub amount: f64,
    pub recorded_at: DateTime<Utc>,
}

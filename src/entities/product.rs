// Product Entity - a purchasable item tracked across markets
// Append-only: created once via the registry, never updated or deleted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// SQLite rowid, assigned at insert time
    pub id: i64,
    /// Unique, case-sensitive display name
    pub name: String,
    /// Optional brand, stored as-is (NULL when absent or blank)
    pub brand: Option<String>,
}

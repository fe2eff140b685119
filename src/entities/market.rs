// Market Entity - a retail location where prices are observed
// Append-only: created once via the registry, never updated or deleted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// SQLite rowid, assigned at insert time
    pub id: i64,
    /// Unique, case-sensitive display name
    pub name: String,
}

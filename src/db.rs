use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the database file and prepare it for use.
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    setup_database(&conn)?;
    Ok(conn)
}

/// Create the schema if it does not exist yet. Safe to call on every startup.
pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // Foreign keys are off by default in SQLite; prices reference both
    // products and markets, so enforcement has to be switched on per
    // connection.
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Markets Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS markets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    // ==========================================================================
    // Products Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            brand TEXT
        )",
        [],
    )?;

    // ==========================================================================
    // Prices Table (append-only observation log)
    // recorded_at is RFC 3339 UTC text; lexicographic order matches time order
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS prices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            amount REAL NOT NULL,
            recorded_at TEXT NOT NULL,
            product_id INTEGER NOT NULL REFERENCES products(id),
            market_id INTEGER NOT NULL REFERENCES markets(id)
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_prices_recorded_at ON prices(recorded_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_prices_product ON prices(product_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_prices_market ON prices(market_id)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        // Second run against the same connection must not fail
        setup_database(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'table' AND name IN ('markets', 'products', 'prices')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        // Direct insert bypassing the registry still cannot dangle
        let result = conn.execute(
            "INSERT INTO prices (amount, recorded_at, product_id, market_id)
             VALUES (1.0, '2024-01-01T00:00:00Z', 999, 999)",
            [],
        );
        assert!(result.is_err());
    }
}
